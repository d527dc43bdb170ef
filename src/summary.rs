//! Descriptive summaries over a parsed table: overview counts, a
//! pandas-info style structural summary, and categorical statistics for
//! boolean/string columns.

use color_eyre::Result;
use polars::prelude::*;
use std::collections::HashMap;

/// Whole-table counts displayed unconditionally after a successful load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOverview {
    pub rows: usize,
    pub columns: usize,
    /// Total null cells across the whole table.
    pub missing_values: usize,
    /// Rows for which at least one other identical row exists; both members
    /// of a duplicate pair count.
    pub duplicate_rows: usize,
}

pub fn overview(df: &DataFrame) -> Result<TableOverview> {
    Ok(TableOverview {
        rows: df.height(),
        columns: df.width(),
        missing_values: missing_values(df),
        duplicate_rows: duplicate_rows(df)?,
    })
}

fn missing_values(df: &DataFrame) -> usize {
    df.get_columns().iter().map(|c| c.null_count()).sum()
}

/// Count rows belonging to fully-duplicate groups via a group-by over every
/// column, summing the sizes of groups larger than one.
fn duplicate_rows(df: &DataFrame) -> Result<usize> {
    if df.width() == 0 || df.height() == 0 {
        return Ok(0);
    }
    let keys: Vec<Expr> = df
        .get_column_names()
        .iter()
        .map(|name| col(name.as_str()))
        .collect();
    // Count column name must not collide with a table column.
    let mut count_name = String::from("__group_len");
    while df.get_column_names().iter().any(|n| n.as_str() == count_name) {
        count_name.push('_');
    }
    let counts = df
        .clone()
        .lazy()
        .group_by(keys)
        .agg([len().alias(count_name.as_str())])
        .select([col(count_name.as_str())])
        .collect()?;
    let group_lens = counts.column(&count_name)?.u32()?;
    let total = group_lens
        .into_iter()
        .flatten()
        .filter(|&n| n > 1)
        .map(|n| n as usize)
        .sum();
    Ok(total)
}

/// Per-column line of the structural summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub non_null: usize,
    pub dtype: String,
}

pub fn column_info(df: &DataFrame) -> Vec<ColumnInfo> {
    df.get_columns()
        .iter()
        .map(|c| ColumnInfo {
            name: c.name().to_string(),
            non_null: c.len() - c.null_count(),
            dtype: c.dtype().to_string(),
        })
        .collect()
}

/// Preformatted structural summary: per-column index, name, non-null count,
/// and dtype.
pub fn structural_summary(df: &DataFrame) -> String {
    let infos = column_info(df);
    let name_width = infos
        .iter()
        .map(|i| i.name.len())
        .chain(std::iter::once("Column".len()))
        .max()
        .unwrap_or(6);
    let mut out = format!("{} rows, {} columns\n", df.height(), df.width());
    out.push_str(&format!(
        " #   {:<name_width$}  Non-Null  Dtype\n",
        "Column"
    ));
    out.push_str(&format!(
        "---  {:-<name_width$}  --------  -----\n",
        ""
    ));
    for (idx, info) in infos.iter().enumerate() {
        out.push_str(&format!(
            "{:<3}  {:<name_width$}  {:<8}  {}\n",
            idx, info.name, info.non_null, info.dtype
        ));
    }
    out
}

/// describe()-style statistics for one boolean or string column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoricalColumnSummary {
    pub name: String,
    /// Non-null values.
    pub count: usize,
    /// Distinct non-null values.
    pub unique: usize,
    /// Most frequent non-null value; ties break toward the earliest row.
    pub top: Option<String>,
    /// Occurrences of `top`.
    pub freq: usize,
}

fn is_categorical(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Boolean | DataType::String)
}

/// Statistics restricted to boolean/string columns, in table column order.
/// Empty when the table has no such columns.
pub fn categorical_summary(df: &DataFrame) -> Result<Vec<CategoricalColumnSummary>> {
    let mut summaries = Vec::new();
    for column in df.get_columns() {
        if !is_categorical(column.dtype()) {
            continue;
        }
        let values: Vec<Option<String>> = match column.dtype() {
            DataType::Boolean => column
                .bool()?
                .into_iter()
                .map(|v| v.map(|b| b.to_string()))
                .collect(),
            DataType::String => column
                .str()?
                .into_iter()
                .map(|v| v.map(|s| s.to_string()))
                .collect(),
            _ => unreachable!(),
        };
        summaries.push(summarize_values(column.name().as_str(), &values));
    }
    Ok(summaries)
}

fn summarize_values(name: &str, values: &[Option<String>]) -> CategoricalColumnSummary {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values.iter().flatten() {
        *counts.entry(value.as_str()).or_insert(0) += 1;
    }
    let count = values.iter().flatten().count();
    let max_freq = counts.values().copied().max().unwrap_or(0);
    // Walk values in row order so ties resolve deterministically.
    let top = values
        .iter()
        .flatten()
        .find(|v| counts.get(v.as_str()) == Some(&max_freq))
        .cloned();
    CategoricalColumnSummary {
        name: name.to_string(),
        count,
        unique: counts.len(),
        top,
        freq: max_freq,
    }
}
