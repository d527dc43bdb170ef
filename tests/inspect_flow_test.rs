//! End-to-end flow: write a file to disk, ingest it, run a render cycle,
//! and export a chart.

use polars::prelude::DataType;
use std::io::Write as _;
use std::path::PathBuf;

use tablens::chart::{prepare_chart, ChartSpec, ChartType};
use tablens::chart_export::{export_file_name, write_chart_png};
use tablens::ingest::{read_table, OpenOptions, TableSource};
use tablens::inspect::{render_cycle, Artifact, DisplayLimits, Selections, Severity};

fn write_fixture(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut f = std::fs::File::create(&path).expect("create fixture");
    f.write_all(body.as_bytes()).expect("write fixture");
    path
}

#[test]
fn csv_upload_to_artifacts() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = write_fixture(
        &dir,
        "people.csv",
        "name,age,active\nalice,34,true\nbob,28,false\nalice,34,true\n",
    );

    let source = TableSource::from_path(&path).expect("source");
    let df = read_table(&source, &OpenOptions::new()).expect("read");
    assert_eq!(df.height(), 3);
    assert_eq!(df.width(), 3);

    let selections = Selections {
        columns: vec!["age".to_string()],
        x_axis: Some("age".to_string()),
        y_axis: Some("age".to_string()),
        charts: vec![ChartType::Line, ChartType::Scatter, ChartType::Bar],
    };
    let artifacts = render_cycle(Some(&df), None, &selections, DisplayLimits::default())
        .expect("render cycle");

    // Success banner first, then the full table.
    assert!(matches!(
        &artifacts[0],
        Artifact::Banner {
            severity: Severity::Success,
            ..
        }
    ));

    let overview = artifacts
        .iter()
        .find_map(|a| match a {
            Artifact::Overview(o) => Some(o.clone()),
            _ => None,
        })
        .expect("overview");
    assert_eq!(overview.rows, 3);
    assert_eq!(overview.columns, 3);
    assert_eq!(overview.missing_values, 0);
    // Rows 1 and 3 are identical; both count.
    assert_eq!(overview.duplicate_rows, 2);

    let categorical = artifacts
        .iter()
        .find_map(|a| match a {
            Artifact::CategoricalSummary(c) => Some(c.clone()),
            _ => None,
        })
        .expect("categorical summary");
    let names: Vec<&str> = categorical.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["name", "active"]);
    assert_eq!(categorical[0].top.as_deref(), Some("alice"));
    assert_eq!(categorical[0].freq, 2);

    let preview = artifacts
        .iter()
        .find_map(|a| match a {
            Artifact::DataTable { title, columns, .. } if title == "Preview" => {
                Some(columns.clone())
            }
            _ => None,
        })
        .expect("preview");
    assert_eq!(preview, vec!["age"]);

    let charts: Vec<_> = artifacts
        .iter()
        .filter_map(|a| match a {
            Artifact::Chart(c) => Some(c),
            _ => None,
        })
        .collect();
    assert_eq!(charts.len(), 3);
    assert_eq!(charts[0].title, "Line Graph Of age Vs age");
    assert_eq!(charts[1].title, "Scatter Graph Of age Vs age");
    assert_eq!(charts[2].title, "Bar Graph Of age Vs age");
    for chart in &charts {
        assert_eq!(chart.x_label, "age");
        assert_eq!(chart.y_label, "age");
    }
}

#[test]
fn xlsx_upload_to_table_with_inferred_dtypes() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join("simple.xlsx");

    let source = TableSource::from_path(&path).expect("source");
    let df = read_table(&source, &OpenOptions::new()).expect("read");
    assert_eq!(df.height(), 3);
    assert_eq!(df.width(), 4);

    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();
    assert_eq!(names, vec!["name", "count", "score", "active"]);
    assert_eq!(df.column("name").expect("name").dtype(), &DataType::String);
    // Whole-number floats narrow to integers.
    assert_eq!(df.column("count").expect("count").dtype(), &DataType::Int64);
    assert_eq!(df.column("score").expect("score").dtype(), &DataType::Float64);
    assert_eq!(
        df.column("active").expect("active").dtype(),
        &DataType::Boolean
    );

    let artifacts = render_cycle(
        Some(&df),
        None,
        &Selections::default(),
        DisplayLimits::default(),
    )
    .expect("render cycle");
    let overview = artifacts
        .iter()
        .find_map(|a| match a {
            Artifact::Overview(o) => Some(o.clone()),
            _ => None,
        })
        .expect("overview");
    assert_eq!(overview.rows, 3);
    assert_eq!(overview.columns, 4);
    assert_eq!(overview.missing_values, 0);

    let categorical = artifacts
        .iter()
        .find_map(|a| match a {
            Artifact::CategoricalSummary(c) => Some(c.clone()),
            _ => None,
        })
        .expect("categorical summary");
    let names: Vec<&str> = categorical.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["name", "active"]);
}

#[test]
fn unsupported_upload_yields_error_banner_and_nothing_else() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = write_fixture(&dir, "people.parquet", "not really parquet");

    let source = TableSource::from_path(&path).expect("source");
    let error = read_table(&source, &OpenOptions::new()).unwrap_err();

    let artifacts = render_cycle(
        None,
        Some(&error.to_string()),
        &Selections::default(),
        DisplayLimits::default(),
    )
    .expect("render cycle");
    assert_eq!(artifacts.len(), 1);
    match &artifacts[0] {
        Artifact::Banner { severity, text } => {
            assert_eq!(*severity, Severity::Error);
            assert!(text.contains("Unsupported file format"));
        }
        other => panic!("expected an error banner, got {:?}", other),
    }
}

#[test]
fn chart_export_roundtrip_from_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = write_fixture(&dir, "series.csv", "t,v\n0,1.5\n1,2.5\n2,2.0\n3,4.0\n");

    let source = TableSource::from_path(&path).expect("source");
    let df = read_table(&source, &OpenOptions::new()).expect("read");
    let spec = ChartSpec {
        chart_type: ChartType::Line,
        x: "t".to_string(),
        y: "v".to_string(),
    };
    let artifact = prepare_chart(&df, &spec).expect("prepare chart");
    assert_eq!(artifact.points.len(), 4);

    let out = dir.path().join(export_file_name(&artifact));
    write_chart_png(&out, &artifact, (640, 480)).expect("export png");
    let bytes = std::fs::read(&out).expect("read png");
    assert!(bytes.len() > 8);
    assert_eq!(&bytes[..4], b"\x89PNG");
}

#[test]
fn semicolon_csv_with_options() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = write_fixture(&dir, "export.csv", "1;one\n2;two\n3;three\n");

    let source = TableSource::from_path(&path).expect("source");
    let options = OpenOptions::new()
        .with_delimiter(b';')
        .with_has_header(false);
    let df = read_table(&source, &options).expect("read");
    assert_eq!(df.height(), 3);
    assert_eq!(df.width(), 2);

    let artifacts = render_cycle(
        Some(&df),
        None,
        &Selections::default(),
        DisplayLimits::default(),
    )
    .expect("render cycle");
    let categorical = artifacts
        .iter()
        .find_map(|a| match a {
            Artifact::CategoricalSummary(c) => Some(c.clone()),
            _ => None,
        })
        .expect("categorical summary");
    assert_eq!(categorical.len(), 1);
    assert_eq!(categorical[0].unique, 3);
    assert_eq!(categorical[0].freq, 1);
}
