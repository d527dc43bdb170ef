//! Chart export to PNG via the plotters bitmap backend.

use color_eyre::Result;
use std::path::Path;

use crate::chart::{ChartArtifact, ChartType};

/// Write a prepared chart to a PNG file: captioned with the chart title,
/// axes labeled with the x/y column names.
pub fn write_chart_png(path: &Path, artifact: &ChartArtifact, size: (u32, u32)) -> Result<()> {
    use plotters::prelude::*;

    if artifact.points.is_empty() {
        return Err(color_eyre::eyre::eyre!("No data to export"));
    }

    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let (x_min, x_max) = artifact.x_bounds;
    let (y_min, y_max) = artifact.y_bounds;

    let mut chart = ChartBuilder::on(&root)
        .caption(artifact.title.as_str(), ("sans-serif", 20))
        .margin(30)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc(artifact.x_label.as_str())
        .y_desc(artifact.y_label.as_str())
        .draw()?;

    let color = BLUE;
    match artifact.chart_type {
        ChartType::Line => {
            chart.draw_series(LineSeries::new(artifact.points.iter().copied(), color))?;
        }
        ChartType::Scatter => {
            chart.draw_series(PointSeries::of_element(
                artifact.points.iter().copied(),
                3,
                color,
                &|c, s, _| EmptyElement::at(c) + Circle::new((0, 0), s, color.filled()),
            ))?;
        }
        ChartType::Bar => {
            let half_width = bar_half_width(&artifact.points, x_min, x_max);
            chart.draw_series(artifact.points.iter().map(|&(x, y)| {
                Rectangle::new([(x - half_width, 0.0), (x + half_width, y)], color.filled())
            }))?;
        }
    }

    root.present()?;
    Ok(())
}

/// Bar half-width in data units: 70% slot width, bounded away from zero.
fn bar_half_width(points: &[(f64, f64)], x_min: f64, x_max: f64) -> f64 {
    let n = points.len().max(1) as f64;
    let span = if x_max > x_min { x_max - x_min } else { 1.0 };
    (span / n * 0.7 / 2.0).max(span * 0.002)
}

/// File name for an exported chart, derived from its type and axis labels:
/// `line_a_vs_b.png`. Unsafe path characters are replaced.
pub fn export_file_name(artifact: &ChartArtifact) -> String {
    let sanitize = |s: &str| -> String {
        s.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c.to_ascii_lowercase()
                } else {
                    '_'
                }
            })
            .collect()
    };
    format!(
        "{}_{}_vs_{}.png",
        artifact.chart_type.as_str().to_lowercase(),
        sanitize(&artifact.x_label),
        sanitize(&artifact.y_label)
    )
}
