//! comfy-table renderings of pipeline summaries

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Table};

use crate::model::{ClassificationReport, RegressionReport};
use crate::pipeline::eda::VariabilityRow;
use crate::pipeline::hypothesis::{KpiSummary, TestOutcome};
use crate::pipeline::preprocess::MissingEntry;

fn base_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(
        headers
            .iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );
    table
}

/// Print a table indented to match the step output.
pub fn print_indented(table: &Table) {
    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}

pub fn missing_table(entries: &[MissingEntry]) -> Table {
    let mut table = base_table(&["Column", "Missing", "Percent"]);
    for entry in entries {
        table.add_row(vec![
            Cell::new(&entry.column),
            Cell::new(entry.count),
            Cell::new(format!("{:.2}%", entry.percent)),
        ]);
    }
    table
}

pub fn variability_table(rows: &[VariabilityRow]) -> Table {
    let mut table = base_table(&["Column", "Mean", "Median", "Std", "CV"]);
    for row in rows {
        table.add_row(vec![
            Cell::new(&row.column),
            Cell::new(format!("{:.2}", row.mean)),
            Cell::new(format!("{:.2}", row.median)),
            Cell::new(format!("{:.2}", row.std)),
            Cell::new(format!("{:.2}", row.cv)),
        ]);
    }
    table
}

pub fn kpi_table(kpis: &KpiSummary) -> Table {
    let mut table = base_table(&["KPI", "Value"]);
    table.add_row(vec![
        Cell::new("Claim Frequency"),
        Cell::new(format!("{:.4}", kpis.claim_frequency)),
    ]);
    table.add_row(vec![
        Cell::new("Claim Severity"),
        Cell::new(format!("{:.2}", kpis.claim_severity)),
    ]);
    table.add_row(vec![
        Cell::new("Average Margin"),
        Cell::new(format!("{:.2}", kpis.average_margin)),
    ]);
    table
}

pub fn test_table(outcomes: &[&TestOutcome]) -> Table {
    let mut table = base_table(&["Test", "Feature", "Statistic", "P-Value", "Conclusion"]);
    for outcome in outcomes {
        table.add_row(vec![
            Cell::new(&outcome.test),
            Cell::new(&outcome.feature),
            Cell::new(format!("{:.4}", outcome.statistic)),
            Cell::new(format!("{:.4}", outcome.p_value)),
            Cell::new(if outcome.reject_null {
                "reject H0"
            } else {
                "fail to reject H0"
            }),
        ]);
    }
    table
}

pub fn classification_table(rows: &[(String, ClassificationReport)]) -> Table {
    let mut table = base_table(&["Model", "Accuracy", "Precision", "Recall", "F1", "ROC AUC"]);
    for (name, report) in rows {
        table.add_row(vec![
            Cell::new(name),
            Cell::new(format!("{:.4}", report.accuracy)),
            Cell::new(format!("{:.4}", report.precision)),
            Cell::new(format!("{:.4}", report.recall)),
            Cell::new(format!("{:.4}", report.f1)),
            Cell::new(format!("{:.4}", report.roc_auc)),
        ]);
    }
    table
}

pub fn regression_table(rows: &[(String, RegressionReport)]) -> Table {
    let mut table = base_table(&["Model", "RMSE", "R²"]);
    for (name, report) in rows {
        table.add_row(vec![
            Cell::new(name),
            Cell::new(format!("{:.2}", report.rmse)),
            Cell::new(format!("{:.4}", report.r_squared)),
        ]);
    }
    table
}

pub fn attribution_table(rows: &[(String, f64)]) -> Table {
    let mut table = base_table(&["Feature", "Mean |Attribution|"]);
    for (name, score) in rows {
        table.add_row(vec![Cell::new(name), Cell::new(format!("{:.4}", score))]);
    }
    table
}
