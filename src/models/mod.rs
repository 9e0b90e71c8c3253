pub mod book;
pub mod ledger;
pub mod product;

pub use book::{BookEntry, BookResult, ExtractionMode};
pub use ledger::{LedgerSummary, ResultLedger};
pub use product::ProductTarget;
