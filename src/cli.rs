use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::ingest::{FileFormat, OpenOptions};

/// Explicit file format override for when the extension lies.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum FormatArg {
    Csv,
    Xls,
    Xlsx,
}

impl From<FormatArg> for FileFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Csv => FileFormat::Csv,
            FormatArg::Xls => FileFormat::Xls,
            FormatArg::Xlsx => FileFormat::Xlsx,
        }
    }
}

/// Command-line arguments for tablens.
#[derive(Parser, Debug)]
#[command(version, about = "tablens")]
pub struct Args {
    /// CSV or Excel file to inspect
    pub path: PathBuf,

    /// Specify the delimiter to use when reading a CSV file
    #[arg(long = "delimiter")]
    pub delimiter: Option<u8>,

    /// Specify that the file has no header row
    #[arg(long = "no-header", action)]
    pub no_header: bool,

    /// Skip this many rows when reading a CSV file
    #[arg(long = "skip-rows")]
    pub skip_rows: Option<usize>,

    /// Read the file as this format instead of detecting from the extension
    #[arg(long = "format", value_enum)]
    pub format: Option<FormatArg>,

    /// Directory to write exported chart PNGs into
    #[arg(long = "export-dir")]
    pub export_dir: Option<PathBuf>,
}

impl From<&Args> for OpenOptions {
    fn from(args: &Args) -> Self {
        let mut opts = OpenOptions::new();
        if let Some(delimiter) = args.delimiter {
            opts = opts.with_delimiter(delimiter);
        }
        if args.no_header {
            opts = opts.with_has_header(false);
        }
        if let Some(skip_rows) = args.skip_rows {
            opts = opts.with_skip_rows(skip_rows);
        }
        if let Some(format) = args.format {
            opts = opts.with_format(format.into());
        }
        opts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_to_open_options() {
        let args = Args {
            path: PathBuf::new(),
            delimiter: Some(b';'),
            no_header: true,
            skip_rows: Some(2),
            format: None,
            export_dir: None,
        };
        let opts: OpenOptions = (&args).into();
        assert_eq!(opts.delimiter, Some(b';'));
        assert_eq!(opts.has_header, Some(false));
        assert_eq!(opts.skip_rows, Some(2));
    }

    #[test]
    fn defaults_leave_options_unset() {
        let args = Args::parse_from(["tablens", "data.csv"]);
        let opts: OpenOptions = (&args).into();
        assert!(opts.delimiter.is_none());
        assert!(opts.has_header.is_none());
        assert!(opts.skip_rows.is_none());
    }

    #[test]
    fn format_override_parses() {
        let args = Args::parse_from(["tablens", "data.bin", "--format", "xlsx"]);
        assert_eq!(args.format, Some(FormatArg::Xlsx));
        let opts: OpenOptions = (&args).into();
        assert_eq!(opts.format, Some(FileFormat::Xlsx));
    }
}
