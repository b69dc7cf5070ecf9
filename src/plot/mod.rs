//! Chart rendering for analyzer summaries
//!
//! Consumes the tabular outputs of the EDA and interpretation stages and
//! writes PNG files via the plotters bitmap backend. Nothing here computes
//! statistics; every function takes an already-aggregated table. Charts
//! are drawn without text so the crate needs no system font stack; the
//! category order and values are mirrored in the terminal tables and the
//! JSON export.

use std::path::Path;

use anyhow::{Context, Result};
use plotters::prelude::*;

use crate::pipeline::eda::{MonthlyPoint, SegmentBreakdown};

const CHART_SIZE: (u32, u32) = (960, 540);

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create plot directory: {}", parent.display())
            })?;
        }
    }
    Ok(())
}

/// Vertical bars for a labelled series, with an optional horizontal
/// reference line. Bars appear in the order of `rows`.
fn bar_chart(path: &Path, rows: &[(String, f64)], reference: Option<f64>) -> Result<()> {
    ensure_parent(path)?;

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let n = rows.len().max(1);
    let y_min = rows.iter().map(|r| r.1).fold(0.0f64, f64::min) * 1.1;
    let y_max = rows
        .iter()
        .map(|r| r.1)
        .chain(reference)
        .fold(0.0f64, f64::max)
        .max(1e-9)
        * 1.1;

    let mut chart = ChartBuilder::on(&root)
        .margin(16)
        .build_cartesian_2d(0f64..n as f64, y_min..y_max)?;
    chart.configure_mesh().x_labels(0).y_labels(0).draw()?;

    chart.draw_series(rows.iter().enumerate().map(|(i, (_, value))| {
        let x = i as f64;
        Rectangle::new(
            [(x + 0.15, 0.0f64.min(*value)), (x + 0.85, 0.0f64.max(*value))],
            BLUE.mix(0.6).filled(),
        )
    }))?;

    if let Some(level) = reference {
        chart.draw_series(LineSeries::new(
            vec![(0.0, level), (n as f64, level)],
            RED.stroke_width(2),
        ))?;
    }

    root.present()
        .with_context(|| format!("Failed to write chart: {}", path.display()))?;
    Ok(())
}

/// Loss ratio per category for one segment column, with the portfolio's
/// overall ratio as a reference line.
pub fn loss_ratio_chart(segment: &SegmentBreakdown, overall: f64, path: &Path) -> Result<()> {
    let rows: Vec<(String, f64)> = segment
        .rows
        .iter()
        .map(|r| (r.category.clone(), r.loss_ratio))
        .collect();
    bar_chart(path, &rows, Some(overall))
}

/// Monthly premium and claim totals (upper panel) and the loss-ratio
/// trend (lower panel).
pub fn monthly_trend_chart(monthly: &[MonthlyPoint], path: &Path) -> Result<()> {
    ensure_parent(path)?;

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let (upper, lower) = root.split_vertically(0.55);

    let n = monthly.len().max(1);

    let money_max = monthly
        .iter()
        .flat_map(|m| [m.premium, m.claims])
        .fold(0.0f64, f64::max)
        .max(1e-9)
        * 1.1;

    let mut money = ChartBuilder::on(&upper)
        .margin(16)
        .build_cartesian_2d(0f64..(n - 1).max(1) as f64, 0f64..money_max)?;
    money.configure_mesh().x_labels(0).y_labels(0).draw()?;
    money.draw_series(LineSeries::new(
        monthly.iter().enumerate().map(|(i, m)| (i as f64, m.premium)),
        BLUE.stroke_width(2),
    ))?;
    money.draw_series(LineSeries::new(
        monthly.iter().enumerate().map(|(i, m)| (i as f64, m.claims)),
        RED.stroke_width(2),
    ))?;

    let ratio_max = monthly
        .iter()
        .map(|m| m.loss_ratio)
        .filter(|v| v.is_finite())
        .fold(0.0f64, f64::max)
        .max(1e-9)
        * 1.1;

    let mut ratio = ChartBuilder::on(&lower)
        .margin(16)
        .build_cartesian_2d(0f64..(n - 1).max(1) as f64, 0f64..ratio_max)?;
    ratio.configure_mesh().x_labels(0).y_labels(0).draw()?;
    ratio.draw_series(LineSeries::new(
        monthly
            .iter()
            .enumerate()
            .filter(|(_, m)| m.loss_ratio.is_finite())
            .map(|(i, m)| (i as f64, m.loss_ratio)),
        RED.stroke_width(2),
    ))?;

    root.present()
        .with_context(|| format!("Failed to write chart: {}", path.display()))?;
    Ok(())
}

/// Monthly premium/claims Spearman correlation for the top postal codes.
pub fn zip_correlation_chart(correlations: &[(String, f64)], path: &Path) -> Result<()> {
    bar_chart(path, correlations, None)
}

/// Mean absolute attribution of the top features.
pub fn attribution_chart(rows: &[(String, f64)], path: &Path) -> Result<()> {
    bar_chart(path, rows, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::eda::SegmentRow;
    use tempfile::TempDir;

    #[test]
    fn test_charts_render_to_files() {
        let dir = TempDir::new().unwrap();

        let segment = SegmentBreakdown {
            column: "Province".to_string(),
            rows: vec![
                SegmentRow {
                    category: "A".to_string(),
                    premium: 1000.0,
                    claims: 400.0,
                    loss_ratio: 0.4,
                },
                SegmentRow {
                    category: "B".to_string(),
                    premium: 800.0,
                    claims: 100.0,
                    loss_ratio: 0.125,
                },
            ],
        };
        let segment_path = dir.path().join("loss_ratio.png");
        loss_ratio_chart(&segment, 0.3, &segment_path).unwrap();
        assert!(segment_path.exists());

        let monthly = vec![
            MonthlyPoint {
                month: "2015-01-01".to_string(),
                premium: 1000.0,
                claims: 200.0,
                loss_ratio: 0.2,
            },
            MonthlyPoint {
                month: "2015-02-01".to_string(),
                premium: 1200.0,
                claims: 700.0,
                loss_ratio: 0.58,
            },
        ];
        let trend_path = dir.path().join("nested/monthly.png");
        monthly_trend_chart(&monthly, &trend_path).unwrap();
        assert!(trend_path.exists());

        let corr_path = dir.path().join("corr.png");
        zip_correlation_chart(
            &[("1000".to_string(), -0.5), ("2000".to_string(), 0.9)],
            &corr_path,
        )
        .unwrap();
        assert!(corr_path.exists());
    }

    #[test]
    fn test_bar_chart_handles_empty_input() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.png");
        bar_chart(&path, &[], None).unwrap();
        assert!(path.exists());
    }
}
