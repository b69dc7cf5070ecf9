//! Run reporting - terminal tables, run summary, and JSON export

pub mod export;
pub mod summary;
pub mod tables;

pub use export::*;
pub use summary::RunSummary;
pub use tables::*;
