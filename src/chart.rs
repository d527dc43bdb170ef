//! Chart preparation: select the x/y columns, cast to f64, and convert to
//! points with axis bounds. Rendering happens in the UI (ratatui) and in
//! `chart_export` (plotters PNG).

use color_eyre::eyre::eyre;
use color_eyre::Result;
use polars::prelude::*;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ChartType {
    #[default]
    Line,
    Scatter,
    Bar,
}

impl ChartType {
    pub const ALL: [Self; 3] = [Self::Line, Self::Scatter, Self::Bar];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Line => "Line",
            Self::Scatter => "Scatter",
            Self::Bar => "Bar",
        }
    }
}

/// A single chart request: type plus the current axis selection.
#[derive(Debug, Clone)]
pub struct ChartSpec {
    pub chart_type: ChartType,
    pub x: String,
    pub y: String,
}

impl ChartSpec {
    pub fn title(&self) -> String {
        format!(
            "{} Graph Of {} Vs {}",
            self.chart_type.as_str(),
            self.x,
            self.y
        )
    }
}

/// A prepared chart: points in data space plus labels and axis bounds.
#[derive(Debug, Clone)]
pub struct ChartArtifact {
    pub chart_type: ChartType,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<(f64, f64)>,
    pub x_bounds: (f64, f64),
    pub y_bounds: (f64, f64),
}

/// Prepare a chart from the table. X and Y are cast to f64 with no
/// type validation; cast failure from the engine propagates to the caller.
/// Rows where either value is null or non-finite are dropped.
pub fn prepare_chart(df: &DataFrame, spec: &ChartSpec) -> Result<ChartArtifact> {
    let cast_axis = |name: &str| -> Result<Series> {
        let series = df
            .column(name)
            .map_err(|e| eyre!("Chart '{}': {}", spec.title(), e))?
            .as_materialized_series()
            .strict_cast(&DataType::Float64)
            .map_err(|e| eyre!("Chart '{}': {}", spec.title(), e))?;
        Ok(series)
    };
    let xs = cast_axis(&spec.x)?;
    let xs = xs.f64()?;
    let ys = cast_axis(&spec.y)?;
    let ys = ys.f64()?;

    let mut points = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        if let (Some(x), Some(y)) = (xs.get(i), ys.get(i)) {
            if x.is_finite() && y.is_finite() {
                points.push((x, y));
            }
        }
    }

    let (x_min, x_max) = points
        .iter()
        .map(|&(x, _)| x)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(a, b), x| {
            (a.min(x), b.max(x))
        });
    let (y_min, y_max) = points
        .iter()
        .map(|&(_, y)| y)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(a, b), y| {
            (a.min(y), b.max(y))
        });

    // Degenerate bounds (no points, or a single value) widen to a unit span.
    let x_bounds = if x_max > x_min {
        (x_min, x_max)
    } else if x_min.is_finite() {
        (x_min - 0.5, x_min + 0.5)
    } else {
        (0.0, 1.0)
    };
    // Bar charts draw from the zero baseline; keep 0 inside the y bounds.
    let y_floor = if spec.chart_type == ChartType::Bar {
        0.0_f64.min(y_min)
    } else {
        y_min
    };
    let y_bounds = if y_max > y_floor {
        (y_floor, y_max)
    } else if y_floor.is_finite() {
        (y_floor - 0.5, y_floor + 0.5)
    } else {
        (0.0, 1.0)
    };

    Ok(ChartArtifact {
        chart_type: spec.chart_type,
        title: spec.title(),
        x_label: spec.x.clone(),
        y_label: spec.y.clone(),
        points,
        x_bounds,
        y_bounds,
    })
}

/// Format a numeric axis tick (compact notation for very large/small values).
pub fn format_axis_label(v: f64) -> String {
    if v.abs() >= 1e6 || (v.abs() < 1e-2 && v != 0.0) {
        format!("{:.2e}", v)
    } else {
        format!("{:.2}", v)
    }
}
