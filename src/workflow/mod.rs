pub mod book_ctx;
pub mod book_flow;

pub use book_ctx::BookCtx;
pub use book_flow::{BookFlow, BookStage};
