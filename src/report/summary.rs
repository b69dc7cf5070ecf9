//! End-of-run summary display

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;

/// What the pipeline run did, displayed once everything finishes.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub rows: usize,
    pub initial_columns: usize,
    pub cleaned_columns: usize,
    pub encoded_features: usize,
    pub tests_run: usize,
    pub tests_rejected: usize,
    pub models_trained: usize,
    pub plots_written: usize,
}

impl RunSummary {
    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("▣").cyan(),
            style("RUN SUMMARY").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        table.add_row(vec![Cell::new("Rows"), Cell::new(self.rows)]);
        table.add_row(vec![
            Cell::new("Columns (raw)"),
            Cell::new(self.initial_columns),
        ]);
        table.add_row(vec![
            Cell::new("Columns (cleaned)"),
            Cell::new(self.cleaned_columns),
        ]);
        table.add_row(vec![
            Cell::new("Encoded features"),
            Cell::new(self.encoded_features).fg(Color::Cyan),
        ]);
        table.add_row(vec![
            Cell::new("Hypothesis tests (rejected H0)"),
            Cell::new(format!("{} ({})", self.tests_run, self.tests_rejected)),
        ]);
        table.add_row(vec![
            Cell::new("Models trained"),
            Cell::new(self.models_trained)
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
        ]);
        table.add_row(vec![
            Cell::new("Plots written"),
            Cell::new(self.plots_written),
        ]);

        for line in table.to_string().lines() {
            println!("    {}", line);
        }
    }
}
