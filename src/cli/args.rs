//! Command-line argument definitions using clap

use clap::Parser;
use std::path::PathBuf;

/// Claimlens - explore, test, and model an insurance claims portfolio
#[derive(Parser, Debug)]
#[command(name = "claimlens")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Input portfolio file (pipe-delimited, header row required)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Directory for charts and the JSON run export
    #[arg(short, long, default_value = "claimlens-out")]
    pub output_dir: PathBuf,

    /// Segment columns for loss-ratio breakdowns (comma-separated)
    #[arg(long, value_delimiter = ',', default_value = "Province,VehicleType,Gender")]
    pub segments: Vec<String>,

    /// First postal code for the zip-code risk and margin tests.
    /// Both --zip-a and --zip-b must be given for those tests to run.
    #[arg(long)]
    pub zip_a: Option<String>,

    /// Second postal code for the zip-code risk and margin tests
    #[arg(long)]
    pub zip_b: Option<String>,

    /// Held-out fraction for the stratified train/test split
    #[arg(long, default_value = "0.2", value_parser = validate_test_size)]
    pub test_size: f64,

    /// Number of features shown in the attribution summary
    #[arg(long, default_value = "10")]
    pub top_n: usize,

    /// Treat a zero CustomValueEstimate as missing during cleaning.
    /// Off by default; zero is a legitimate placeholder in some feeds.
    #[arg(long, default_value = "false")]
    pub remap_zero_custom_value: bool,

    /// Write the cleaned dataset to this pipe-delimited file
    #[arg(long)]
    pub save_cleaned: Option<PathBuf>,

    /// Skip chart rendering
    #[arg(long, default_value = "false")]
    pub no_plots: bool,
}

/// Validator for the test_size parameter
fn validate_test_size(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if !(value > 0.0 && value < 1.0) {
        Err(format!(
            "test_size must be strictly between 0.0 and 1.0, got {}",
            value
        ))
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_test_size_validator() {
        assert!(validate_test_size("0.2").is_ok());
        assert!(validate_test_size("0").is_err());
        assert!(validate_test_size("1.0").is_err());
        assert!(validate_test_size("abc").is_err());
    }
}
