//! Policy dataset loader for pipe-delimited flat files

use anyhow::{Context, Result};
use polars::prelude::*;
use std::path::{Path, PathBuf};

use crate::error::ClaimlensError;

/// Field separator used by the portfolio extracts.
pub const SEPARATOR: u8 = b'|';

/// Holds the portfolio dataset and its source path.
///
/// The store owns its own copy of the data; downstream stages clone the
/// frame rather than aliasing it.
#[derive(Debug, Default)]
pub struct PolicyStore {
    path: Option<PathBuf>,
    df: Option<DataFrame>,
}

impl PolicyStore {
    /// Create a store with an optional default input path.
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path, df: None }
    }

    /// Load the default input path into memory.
    pub fn load(&mut self) -> Result<DataFrame> {
        let path = self
            .path
            .clone()
            .ok_or(ClaimlensError::MissingInput)?;
        self.load_from(&path)
    }

    /// Load a pipe-delimited file into memory, replacing any held dataset.
    pub fn load_from(&mut self, path: &Path) -> Result<DataFrame> {
        let df = read_portfolio(path)?;
        self.df = Some(df.clone());
        Ok(df)
    }

    /// The currently held dataset, if any file has been loaded.
    pub fn data(&self) -> Option<&DataFrame> {
        self.df.as_ref()
    }

    /// Replace the held dataset (used after downstream cleaning).
    pub fn set_data(&mut self, df: DataFrame) {
        self.df = Some(df);
    }

    /// Serialize the held dataset pipe-delimited, creating parent
    /// directories as needed.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        let df = self.df.as_mut().ok_or_else(|| {
            ClaimlensError::InvalidState("no data loaded to save".to_string())
        })?;
        write_portfolio(df, path)
    }
}

/// Read a pipe-delimited file fully into memory.
pub fn read_portfolio(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(ClaimlensError::FileNotFound {
            path: path.to_path_buf(),
        }
        .into());
    }

    let df = LazyCsvReader::new(path)
        .with_separator(SEPARATOR)
        .with_has_header(true)
        .finish()
        .with_context(|| format!("Failed to open file: {}", path.display()))?
        .collect()
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    Ok(df)
}

/// Write a dataset pipe-delimited, creating intermediate directories.
pub fn write_portfolio(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }

    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    CsvWriter::new(&mut file)
        .with_separator(SEPARATOR)
        .finish(df)
        .with_context(|| format!("Failed to write file: {}", path.display()))?;

    Ok(())
}
