//! Pipeline module - loading, cleaning, analysis, and feature preparation

pub mod eda;
pub mod features;
pub mod hypothesis;
pub mod loader;
pub mod preprocess;
pub mod stats;

pub use eda::*;
pub use features::*;
pub use hypothesis::*;
pub use loader::*;
pub use preprocess::*;
pub use stats::*;
