pub mod logging;
pub mod naming;

pub use logging::truncate_text;
