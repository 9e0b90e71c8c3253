pub mod classifier;
pub mod downloader;
pub mod listing_scanner;
pub mod pdf_locator;
pub mod result_reporter;
pub mod retry;

pub use classifier::CriticalErrorClassifier;
pub use downloader::Downloader;
pub use listing_scanner::ListingScanner;
pub use pdf_locator::{PdfLocation, PdfLocator};
pub use result_reporter::ResultReporter;
pub use retry::RetryExecutor;
