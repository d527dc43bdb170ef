//! Focused column preview: the first rows of the table restricted to the
//! user's column selection.

use color_eyre::Result;
use polars::prelude::*;

/// Preview of a table restricted to selected columns. When no columns are
/// selected the whole table is previewed and `notice` explains why.
pub struct Preview {
    pub notice: Option<String>,
    pub frame: DataFrame,
}

/// First `rows` rows restricted to `selected` columns. Display order follows
/// the table's own column order, not selection order. An empty selection
/// previews the full table with an informational notice.
pub fn preview(df: &DataFrame, selected: &[String], rows: usize) -> Result<Preview> {
    if selected.is_empty() {
        return Ok(Preview {
            notice: Some("No columns selected. Showing the full table.".to_string()),
            frame: df.head(Some(rows)),
        });
    }
    let ordered: Vec<&str> = df
        .get_column_names()
        .iter()
        .map(|n| n.as_str())
        .filter(|n| selected.iter().any(|s| s == n))
        .collect();
    let frame = df.select(ordered)?.head(Some(rows));
    Ok(Preview {
        notice: None,
        frame,
    })
}
