//! File ingestion: format dispatch on the file-name suffix, then CSV (polars)
//! or Excel (calamine) parsing into an eager DataFrame.

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;

/// Tabular file format, resolved once from the file-name suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Xls,
    Xlsx,
    Unsupported,
}

impl FileFormat {
    /// Detect the format from the lower-cased suffix after the last `.`.
    /// Names without a suffix are `Unsupported`.
    pub fn from_name(name: &str) -> Self {
        let Some((_, ext)) = name.rsplit_once('.') else {
            return Self::Unsupported;
        };
        match ext.to_lowercase().as_str() {
            "csv" => Self::Csv,
            "xls" => Self::Xls,
            "xlsx" => Self::Xlsx,
            _ => Self::Unsupported,
        }
    }
}

/// Options applied when reading a file.
#[derive(Debug, Default, Clone)]
pub struct OpenOptions {
    pub delimiter: Option<u8>,
    pub has_header: Option<bool>,
    pub skip_rows: Option<usize>,
    /// Read as this format instead of dispatching on the file-name suffix.
    pub format: Option<FileFormat>,
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_has_header(mut self, has_header: bool) -> Self {
        self.has_header = Some(has_header);
        self
    }

    pub fn with_skip_rows(mut self, skip_rows: usize) -> Self {
        self.skip_rows = Some(skip_rows);
        self
    }

    pub fn with_format(mut self, format: FileFormat) -> Self {
        self.format = Some(format);
        self
    }
}

/// An uploaded file: raw bytes plus the name they arrived under.
/// Discarded once the table is parsed.
pub struct TableSource {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl TableSource {
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| eyre!("Invalid file name: {}", path.display()))?
            .to_string();
        let bytes = std::fs::read(path)?;
        Ok(Self { name, bytes })
    }

    pub fn format(&self) -> FileFormat {
        FileFormat::from_name(&self.name)
    }
}

/// Parse the source into a DataFrame according to its detected format.
/// Unsupported suffixes and malformed content both surface as errors;
/// no partial table is produced.
pub fn read_table(source: &TableSource, options: &OpenOptions) -> Result<DataFrame> {
    match options.format.unwrap_or_else(|| source.format()) {
        FileFormat::Csv => read_csv(&source.bytes, options),
        FileFormat::Xls | FileFormat::Xlsx => read_excel(&source.bytes),
        FileFormat::Unsupported => {
            let suffix = source
                .name
                .rsplit_once('.')
                .map(|(_, ext)| ext)
                .unwrap_or("");
            if suffix.is_empty() {
                Err(eyre!("Unsupported file format: no file extension"))
            } else {
                Err(eyre!("Unsupported file format: .{}", suffix))
            }
        }
    }
}

fn read_csv(bytes: &[u8], options: &OpenOptions) -> Result<DataFrame> {
    let mut read_options = CsvReadOptions::default();
    if let Some(skip_rows) = options.skip_rows {
        read_options.skip_rows = skip_rows;
    }
    if let Some(has_header) = options.has_header {
        read_options.has_header = has_header;
    }
    if let Some(delimiter) = options.delimiter {
        read_options = read_options.map_parse_options(|opts| opts.with_separator(delimiter));
    }
    let df = CsvReader::new(Cursor::new(bytes))
        .with_options(read_options)
        .finish()?;
    Ok(df)
}

/// Inferred column type for Excel sheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExcelColType {
    Int64,
    Float64,
    Boolean,
    Utf8,
}

/// Read the first worksheet: first row as header, remaining rows as data,
/// per-column type inference.
fn read_excel(bytes: &[u8]) -> Result<DataFrame> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| eyre!("Excel: {}", e))?;
    let sheet_names = workbook.sheet_names().to_vec();
    if sheet_names.is_empty() {
        return Err(eyre!("Excel file has no worksheets"));
    }
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| eyre!("Excel: no first sheet"))?
        .map_err(|e| eyre!("Excel: {}", e))?;

    let rows: Vec<Vec<Data>> = range.rows().map(|r| r.to_vec()).collect();
    if rows.is_empty() {
        return Ok(DataFrame::empty());
    }

    let headers: Vec<String> = rows[0]
        .iter()
        .map(|c| calamine::DataType::as_string(c).unwrap_or_else(|| c.to_string()))
        .collect();
    let mut columns: Vec<Column> = Vec::with_capacity(headers.len());
    for (col_idx, header) in headers.iter().enumerate() {
        let cells: Vec<Option<&Data>> = rows[1..].iter().map(|row| row.get(col_idx)).collect();
        let name = if header.is_empty() {
            format!("column_{}", col_idx + 1)
        } else {
            header.clone()
        };
        let series = excel_column_to_series(name.as_str(), &cells, excel_infer_column_type(&cells));
        columns.push(series.into());
    }
    Ok(DataFrame::new(columns)?)
}

/// Infer a column type from its cells. Any string cell makes the column
/// Utf8; whole-number float columns narrow to Int64.
fn excel_infer_column_type(cells: &[Option<&Data>]) -> ExcelColType {
    use calamine::DataType as CalamineTrait;
    let mut has_float = false;
    let mut has_int = false;
    let mut has_bool = false;
    for cell in cells.iter().flatten() {
        if CalamineTrait::is_string(*cell) {
            return ExcelColType::Utf8;
        }
        if CalamineTrait::is_float(*cell) {
            has_float = true;
        }
        if CalamineTrait::is_int(*cell) {
            has_int = true;
        }
        if CalamineTrait::is_bool(*cell) {
            has_bool = true;
        }
    }
    if has_float {
        let all_whole = cells.iter().flatten().all(|cell| {
            CalamineTrait::as_f64(*cell)
                .is_none_or(|f| f.is_finite() && (f - f.trunc()).abs() < 1e-10)
        });
        if all_whole && !has_bool {
            ExcelColType::Int64
        } else {
            ExcelColType::Float64
        }
    } else if has_int {
        ExcelColType::Int64
    } else if has_bool {
        ExcelColType::Boolean
    } else {
        ExcelColType::Utf8
    }
}

/// Build a polars Series from a column of calamine cells; cells that do not
/// convert to the inferred type become nulls.
fn excel_column_to_series(name: &str, cells: &[Option<&Data>], col_type: ExcelColType) -> Series {
    use calamine::DataType as CalamineTrait;
    match col_type {
        ExcelColType::Int64 => {
            let v: Vec<Option<i64>> = cells
                .iter()
                .map(|c| c.and_then(|cell| CalamineTrait::as_i64(cell)))
                .collect();
            Series::new(name.into(), v)
        }
        ExcelColType::Float64 => {
            let v: Vec<Option<f64>> = cells
                .iter()
                .map(|c| c.and_then(|cell| CalamineTrait::as_f64(cell)))
                .collect();
            Series::new(name.into(), v)
        }
        ExcelColType::Boolean => {
            let v: Vec<Option<bool>> = cells
                .iter()
                .map(|c| c.and_then(|cell| CalamineTrait::get_bool(cell)))
                .collect();
            Series::new(name.into(), v)
        }
        ExcelColType::Utf8 => {
            let v: Vec<Option<String>> = cells
                .iter()
                .map(|c| {
                    c.and_then(|cell| {
                        if CalamineTrait::is_empty(cell) {
                            None
                        } else {
                            CalamineTrait::as_string(cell)
                        }
                    })
                })
                .collect();
            Series::new(name.into(), v)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_detection() {
        assert_eq!(FileFormat::from_name("data.csv"), FileFormat::Csv);
        assert_eq!(FileFormat::from_name("data.CSV"), FileFormat::Csv);
        assert_eq!(FileFormat::from_name("report.xls"), FileFormat::Xls);
        assert_eq!(FileFormat::from_name("report.xlsx"), FileFormat::Xlsx);
        assert_eq!(FileFormat::from_name("a.b.xlsx"), FileFormat::Xlsx);
        assert_eq!(FileFormat::from_name("notes.txt"), FileFormat::Unsupported);
        assert_eq!(FileFormat::from_name("noext"), FileFormat::Unsupported);
    }

    fn csv_source(name: &str, body: &str) -> TableSource {
        TableSource {
            name: name.to_string(),
            bytes: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn read_csv_counts_match_content() {
        let source = csv_source("data.csv", "id,flag\n1,true\n2,false\n2,true\n");
        let df = read_table(&source, &OpenOptions::new()).unwrap();
        assert_eq!(df.height(), 3);
        assert_eq!(df.width(), 2);
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(names, vec!["id", "flag"]);
    }

    #[test]
    fn read_csv_with_delimiter_and_no_header() {
        let source = csv_source("data.csv", "1;10\n2;20\n");
        let options = OpenOptions::new()
            .with_delimiter(b';')
            .with_has_header(false);
        let df = read_table(&source, &options).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 2);
    }

    #[test]
    fn read_csv_skip_rows() {
        let source = csv_source("data.csv", "garbage line\nid,flag\n1,true\n");
        let options = OpenOptions::new().with_skip_rows(1);
        let df = read_table(&source, &options).unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(df.width(), 2);
    }

    #[test]
    fn unsupported_extension_is_an_error() {
        let source = csv_source("data.txt", "id\n1\n");
        let err = read_table(&source, &OpenOptions::new()).unwrap_err();
        assert!(err.to_string().contains("Unsupported file format"));
    }

    #[test]
    fn missing_extension_is_an_error() {
        let source = csv_source("data", "id\n1\n");
        let err = read_table(&source, &OpenOptions::new()).unwrap_err();
        assert!(err.to_string().contains("Unsupported file format"));
    }

    #[test]
    fn format_override_beats_the_suffix() {
        let source = csv_source("data.bin", "id\n1\n2\n");
        let options = OpenOptions::new().with_format(FileFormat::Csv);
        let df = read_table(&source, &options).unwrap();
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn malformed_excel_is_an_error() {
        let source = TableSource {
            name: "data.xlsx".to_string(),
            bytes: b"this is not a spreadsheet".to_vec(),
        };
        assert!(read_table(&source, &OpenOptions::new()).is_err());
    }

    #[test]
    fn excel_type_inference() {
        let ints = [Data::Int(1), Data::Int(2)];
        let cells: Vec<Option<&Data>> = ints.iter().map(Some).collect();
        assert_eq!(excel_infer_column_type(&cells), ExcelColType::Int64);

        let whole_floats = [Data::Float(1.0), Data::Float(2.0)];
        let cells: Vec<Option<&Data>> = whole_floats.iter().map(Some).collect();
        assert_eq!(excel_infer_column_type(&cells), ExcelColType::Int64);

        let floats = [Data::Float(1.5), Data::Float(2.0)];
        let cells: Vec<Option<&Data>> = floats.iter().map(Some).collect();
        assert_eq!(excel_infer_column_type(&cells), ExcelColType::Float64);

        let bools = [Data::Bool(true), Data::Bool(false)];
        let cells: Vec<Option<&Data>> = bools.iter().map(Some).collect();
        assert_eq!(excel_infer_column_type(&cells), ExcelColType::Boolean);

        let mixed = [Data::Int(1), Data::String("x".to_string())];
        let cells: Vec<Option<&Data>> = mixed.iter().map(Some).collect();
        assert_eq!(excel_infer_column_type(&cells), ExcelColType::Utf8);
    }

    #[test]
    fn excel_cells_to_series_with_nulls() {
        let data = [Data::Int(1), Data::Empty, Data::Int(3)];
        let cells: Vec<Option<&Data>> = data.iter().map(Some).collect();
        let s = excel_column_to_series("n", &cells, ExcelColType::Int64);
        assert_eq!(s.len(), 3);
        assert_eq!(s.null_count(), 1);
    }

    #[test]
    fn excel_empty_string_cells_become_nulls() {
        let data = [Data::String("a".to_string()), Data::Empty];
        let cells: Vec<Option<&Data>> = data.iter().map(Some).collect();
        let s = excel_column_to_series("n", &cells, ExcelColType::Utf8);
        assert_eq!(s.len(), 2);
        assert_eq!(s.null_count(), 1);
        assert_eq!(s.str().unwrap().get(0), Some("a"));
    }
}
