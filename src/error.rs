//! Typed error kinds for the analysis pipeline.
//!
//! Most functions return `anyhow::Result`; the variants here are the failure
//! modes callers are expected to distinguish (configuration, missing file,
//! out-of-order calls, violated test preconditions). Everything else is
//! propagated as plain context-wrapped errors.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClaimlensError {
    /// No input path was supplied anywhere (constructor or call site).
    #[error("no input path specified for loading data")]
    MissingInput,

    /// The input path does not resolve to an existing file.
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// An operation that requires prior setup was invoked out of order.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A two-sample t-test was fed a feature without exactly two groups.
    #[error("t-test requires exactly 2 groups in '{feature}', found {count}")]
    GroupCount { feature: String, count: usize },

    /// A contingency table too degenerate to test (zero degrees of freedom).
    #[error("chi-square test on '{feature}' has zero degrees of freedom")]
    DegenerateTable { feature: String },
}
