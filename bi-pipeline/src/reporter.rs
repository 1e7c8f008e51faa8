use plotters::prelude::*;
use shared::PipelineError;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::models::{CategoryRevenue, MonthlyRevenue};
use crate::queries::QueryOutcome;

pub const MONTHLY_REVENUE_CHART: &str = "monthly_revenue.svg";
pub const TOP_CATEGORIES_CHART: &str = "top_10_categories.svg";

const REVENUE_AXIS: &str = "Total revenue (millions)";

#[derive(Debug)]
pub enum ChartOutcome {
    Saved(PathBuf),
    Skipped(String),
    Failed(PipelineError),
}

/// Line chart of revenue per month.
pub fn render_monthly_revenue(outcome: &QueryOutcome<MonthlyRevenue>, path: &Path) -> ChartOutcome {
    match chart_rows(outcome, "monthly revenue") {
        Ok(rows) => finish(draw_revenue_line(rows, path), path),
        Err(skipped) => skipped,
    }
}

/// Horizontal bar chart of the top categories, highest revenue on top.
pub fn render_top_categories(outcome: &QueryOutcome<CategoryRevenue>, path: &Path) -> ChartOutcome {
    match chart_rows(outcome, "top categories") {
        Ok(rows) => finish(draw_category_bars(rows, path), path),
        Err(skipped) => skipped,
    }
}

fn chart_rows<'a, R>(outcome: &'a QueryOutcome<R>, name: &str) -> Result<&'a [R], ChartOutcome> {
    let reason = match outcome {
        QueryOutcome::Rows(rows) if !rows.is_empty() => return Ok(rows.as_slice()),
        QueryOutcome::Rows(_) => format!("no {} rows", name),
        QueryOutcome::Failed(e) => format!("{} query failed: {}", name, e),
    };
    info!("Skipping {} chart: {}", name, reason);
    Err(ChartOutcome::Skipped(reason))
}

fn finish(result: Result<(), PipelineError>, path: &Path) -> ChartOutcome {
    match result {
        Ok(()) => {
            info!("Chart saved to {}", path.display());
            ChartOutcome::Saved(path.to_path_buf())
        }
        Err(e) => {
            error!("Error creating chart {}: {}", path.display(), e);
            ChartOutcome::Failed(e)
        }
    }
}

fn draw_revenue_line(rows: &[MonthlyRevenue], path: &Path) -> Result<(), PipelineError> {
    let root = SVGBackend::new(path, (1400, 700)).into_drawing_area();
    root.fill(&WHITE).map_err(render_error)?;

    let top = axis_top(rows.iter().map(|r| r.revenue));
    let mut chart = ChartBuilder::on(&root)
        .caption("Total revenue by month", ("sans-serif", 32))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(90)
        .build_cartesian_2d((0..rows.len()).into_segmented(), 0.0..top)
        .map_err(render_error)?;

    let month_label = |x: &SegmentValue<usize>| match x {
        SegmentValue::Exact(i) | SegmentValue::CenterOf(i) => {
            rows.get(*i).map(|r| r.month.clone()).unwrap_or_default()
        }
        SegmentValue::Last => String::new(),
    };
    chart
        .configure_mesh()
        .x_labels(rows.len())
        .x_label_formatter(&month_label)
        .y_label_formatter(&|v| millions(*v))
        .x_desc("Month")
        .y_desc(REVENUE_AXIS)
        .draw()
        .map_err(render_error)?;

    let points = || {
        rows.iter()
            .enumerate()
            .map(|(i, r)| (SegmentValue::CenterOf(i), r.revenue))
    };
    chart
        .draw_series(LineSeries::new(points(), &BLUE))
        .map_err(render_error)?;
    chart
        .draw_series(points().map(|p| Circle::new(p, 4, BLUE.filled())))
        .map_err(render_error)?;

    root.present().map_err(render_error)?;
    Ok(())
}

fn draw_category_bars(rows: &[CategoryRevenue], path: &Path) -> Result<(), PipelineError> {
    let root = SVGBackend::new(path, (1200, 800)).into_drawing_area();
    root.fill(&WHITE).map_err(render_error)?;

    let slots = rows.len();
    let top = axis_top(rows.iter().map(|r| r.revenue));
    let mut chart = ChartBuilder::on(&root)
        .caption("Top 10 product categories by revenue", ("sans-serif", 32))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(240)
        .build_cartesian_2d(0.0..top, (0..slots).into_segmented())
        .map_err(render_error)?;

    // Slot 0 is the bottom of the axis, so rank 0 goes in the last slot.
    let category_label = |y: &SegmentValue<usize>| match y {
        SegmentValue::Exact(slot) | SegmentValue::CenterOf(slot) => slots
            .checked_sub(slot + 1)
            .and_then(|rank| rows.get(rank))
            .map(|r| r.category.clone())
            .unwrap_or_default(),
        SegmentValue::Last => String::new(),
    };
    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(slots)
        .y_label_formatter(&category_label)
        .x_label_formatter(&|v| millions(*v))
        .x_desc(REVENUE_AXIS)
        .y_desc("Product category")
        .draw()
        .map_err(render_error)?;

    chart
        .draw_series(rows.iter().enumerate().map(|(rank, row)| {
            let slot = slots - 1 - rank;
            let mut bar = Rectangle::new(
                [
                    (0.0, SegmentValue::Exact(slot)),
                    (row.revenue, SegmentValue::Exact(slot + 1)),
                ],
                Palette99::pick(rank).filled(),
            );
            bar.set_margin(6, 6, 0, 0);
            bar
        }))
        .map_err(render_error)?;

    root.present().map_err(render_error)?;
    Ok(())
}

fn axis_top(values: impl Iterator<Item = f64>) -> f64 {
    let max = values.fold(0.0, f64::max);
    if max > 0.0 {
        max * 1.1
    } else {
        1.0
    }
}

fn millions(value: f64) -> String {
    format!("{:.1}M", value / 1_000_000.0)
}

fn render_error<E: std::fmt::Display>(e: E) -> PipelineError {
    PipelineError::Render(e.to_string())
}
