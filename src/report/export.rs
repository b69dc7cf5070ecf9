//! JSON export of a full analysis run

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::model::{ClassificationReport, RegressionReport};
use crate::pipeline::eda::{BivariateSummary, LossRatioReport};
use crate::pipeline::hypothesis::{KpiSummary, TestOutcome};
use crate::pipeline::preprocess::MissingEntry;

/// Metadata about the analysis run.
#[derive(Serialize)]
pub struct RunMetadata {
    /// Timestamp of the analysis (ISO 8601 format)
    pub timestamp: String,
    pub claimlens_version: String,
    pub input_file: String,
    pub test_size: f64,
}

impl RunMetadata {
    pub fn new(version: &str, input_file: String, test_size: f64) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            claimlens_version: version.to_string(),
            input_file,
            test_size,
        }
    }
}

/// Per-model held-out evaluation, keyed by model name.
#[derive(Serialize)]
pub struct ModelEvaluations {
    pub classification: Vec<(String, ClassificationReport)>,
    pub regression: Vec<(String, RegressionReport)>,
}

/// Top-feature attribution scores for the interpreted model.
#[derive(Serialize)]
pub struct AttributionExport {
    pub model: String,
    pub strategy: String,
    pub top_features: Vec<(String, f64)>,
}

/// Complete run export.
#[derive(Serialize)]
pub struct RunExport {
    pub metadata: RunMetadata,
    pub missing: Vec<MissingEntry>,
    pub loss_ratios: LossRatioReport,
    pub bivariate: BivariateSummary,
    pub kpis: KpiSummary,
    pub tests: Vec<TestOutcome>,
    pub evaluations: ModelEvaluations,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribution: Option<AttributionExport>,
}

/// Write the export next to the other run artifacts.
pub fn write_export(export: &RunExport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create export directory: {}", parent.display())
            })?;
        }
    }
    let json = serde_json::to_string_pretty(export).context("serializing run export")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write export: {}", path.display()))?;
    Ok(())
}
