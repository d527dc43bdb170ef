//! The render cycle: a pure function from (parsed table, current selections)
//! to the list of artifacts displayed this cycle. Recomputed from scratch on
//! every interaction event; no state is carried between cycles.

use color_eyre::Result;
use polars::prelude::*;

use crate::chart::{prepare_chart, ChartArtifact, ChartSpec, ChartType};
use crate::preview::preview;
use crate::summary::{
    categorical_summary, overview, structural_summary, CategoricalColumnSummary, TableOverview,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    Error,
}

/// One displayed artifact. The UI renders these in order, top to bottom.
#[derive(Debug, Clone)]
pub enum Artifact {
    Banner {
        severity: Severity,
        text: String,
    },
    /// A stringified table view. `rows` is capped for display; `total_rows`
    /// is the table's true height.
    DataTable {
        title: String,
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
        total_rows: usize,
    },
    Overview(TableOverview),
    StructuralSummary(String),
    CategoricalSummary(Vec<CategoricalColumnSummary>),
    Chart(ChartArtifact),
}

/// Everything the user has currently selected.
#[derive(Debug, Default, Clone)]
pub struct Selections {
    /// Columns chosen for the focused preview; empty means "no filter".
    pub columns: Vec<String>,
    /// X-axis column; defaults to the table's first column when unset.
    pub x_axis: Option<String>,
    /// Y-axis column; defaults to the table's first column when unset.
    pub y_axis: Option<String>,
    /// Chart requests active this cycle, in trigger order.
    pub charts: Vec<ChartType>,
}

/// Row caps applied when materializing tables for display.
#[derive(Debug, Clone, Copy)]
pub struct DisplayLimits {
    pub table_rows: usize,
    pub preview_rows: usize,
}

impl Default for DisplayLimits {
    fn default() -> Self {
        Self {
            table_rows: 100,
            preview_rows: 5,
        }
    }
}

/// Compute every artifact for the current cycle.
///
/// A load error short-circuits to a single error banner; every downstream
/// section is skipped. Chart preparation errors propagate to the caller
/// (the host surfaces them as a crash), matching the unvalidated-axis
/// contract.
pub fn render_cycle(
    table: Option<&DataFrame>,
    load_error: Option<&str>,
    selections: &Selections,
    limits: DisplayLimits,
) -> Result<Vec<Artifact>> {
    if let Some(message) = load_error {
        return Ok(vec![Artifact::Banner {
            severity: Severity::Error,
            text: format!("Error reading file: {}", message),
        }]);
    }
    let Some(df) = table else {
        return Ok(vec![Artifact::Banner {
            severity: Severity::Info,
            text: "Open a CSV or Excel file to get started".to_string(),
        }]);
    };

    let mut artifacts = vec![Artifact::Banner {
        severity: Severity::Success,
        text: "File loaded successfully".to_string(),
    }];

    artifacts.push(data_table("Data", df, limits.table_rows)?);
    artifacts.push(Artifact::Overview(overview(df)?));
    artifacts.push(Artifact::StructuralSummary(structural_summary(df)));

    let categorical = categorical_summary(df)?;
    if categorical.is_empty() {
        artifacts.push(Artifact::Banner {
            severity: Severity::Info,
            text: "No non-numerical (categorical or boolean) columns found".to_string(),
        });
    } else {
        artifacts.push(Artifact::CategoricalSummary(categorical));
    }

    let p = preview(df, &selections.columns, limits.preview_rows)?;
    if let Some(notice) = p.notice {
        artifacts.push(Artifact::Banner {
            severity: Severity::Info,
            text: notice,
        });
    }
    artifacts.push(data_table("Preview", &p.frame, limits.preview_rows)?);

    if df.width() > 0 {
        let first_column = df.get_column_names()[0].to_string();
        let x = selections.x_axis.clone().unwrap_or_else(|| first_column.clone());
        let y = selections.y_axis.clone().unwrap_or(first_column);
        for &chart_type in &selections.charts {
            let spec = ChartSpec {
                chart_type,
                x: x.clone(),
                y: y.clone(),
            };
            artifacts.push(Artifact::Chart(prepare_chart(df, &spec)?));
        }
    }

    Ok(artifacts)
}

/// Materialize the first `rows` rows of a frame as display strings.
fn data_table(title: &str, df: &DataFrame, rows: usize) -> Result<Artifact> {
    let head = df.head(Some(rows));
    let columns: Vec<String> = head
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();
    let mut out_rows = Vec::with_capacity(head.height());
    for i in 0..head.height() {
        let mut row = Vec::with_capacity(head.width());
        for column in head.get_columns() {
            row.push(format_cell(&column.get(i)?));
        }
        out_rows.push(row);
    }
    Ok(Artifact::DataTable {
        title: title.to_string(),
        columns,
        rows: out_rows,
        total_rows: df.height(),
    })
}

/// Display form of a single cell; nulls render empty, strings unquoted.
fn format_cell(value: &AnyValue) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Boolean(b) => b.to_string(),
        other => other.to_string(),
    }
}
