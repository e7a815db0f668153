mod common;

use color_eyre::Result;
use datadash::{load_table, OpenOptions};
use polars::prelude::*;

#[test]
fn test_csv_keeps_headers_and_column_order() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = common::write_csv(dir.path(), "sales.csv", &mut common::sales_frame());

    let df = load_table(&path, &OpenOptions::new())?;

    assert_eq!(df.shape(), (5, 4));
    let names: Vec<String> = df.get_column_names().iter().map(|n| n.to_string()).collect();
    assert_eq!(names, ["Region", "Q1", "Q2", "Q3"]);
    assert_eq!(df.column("Q1")?.null_count(), 1);
    assert_eq!(df.column("Q2")?.dtype(), &DataType::Float64);
    Ok(())
}

#[test]
fn test_tsv_uses_tab_separator() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = common::write_tsv(dir.path(), "sales.tsv", &mut common::sales_frame());

    let df = load_table(&path, &OpenOptions::new())?;

    assert_eq!(df.width(), 4);
    assert_eq!(df.column("Region")?.str()?.get(4), Some("Central"));
    Ok(())
}

#[test]
fn test_headerless_file_gets_generated_names() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("raw.csv");
    std::fs::write(&path, "A,1,2\nB,3,4\n")?;

    let df = load_table(&path, &OpenOptions::new().with_has_header(false))?;

    assert_eq!(df.shape(), (2, 3));
    assert_eq!(df.get_column_names()[0].as_str(), "column_1");
    Ok(())
}

#[test]
fn test_custom_delimiter() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("semi.csv");
    std::fs::write(&path, "Region;Q1\nA;1\nB;2\n")?;

    let df = load_table(&path, &OpenOptions::new().with_delimiter(b';'))?;

    assert_eq!(df.shape(), (2, 2));
    Ok(())
}

#[test]
fn test_nan_cells_load_as_missing() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("nan.csv");
    std::fs::write(&path, "Region,Q1\nA,NaN\nB,4.5\n")?;

    let df = load_table(&path, &OpenOptions::new())?;

    assert_eq!(df.column("Q1")?.null_count(), 1);
    assert_eq!(df.column("Q1")?.f64()?.get(1), Some(4.5));
    Ok(())
}

fn workbook_fixture() -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/regions.xlsx")
}

fn column_as_f64(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df.column(name)?.cast(&DataType::Float64)?;
    Ok(column.f64()?.into_iter().collect())
}

#[test]
fn test_workbook_reads_first_sheet_by_default() -> Result<()> {
    let df = load_table(&workbook_fixture(), &OpenOptions::new())?;

    let names: Vec<String> = df.get_column_names().iter().map(|n| n.to_string()).collect();
    assert_eq!(names, ["Region", "Q1", "Q2"]);
    assert_eq!(df.height(), 3);
    assert_eq!(df.column("Region")?.str()?.get(2), Some("C"));
    assert_eq!(column_as_f64(&df, "Q1")?, [Some(10.0), Some(5.0), Some(100.0)]);
    Ok(())
}

#[test]
fn test_workbook_sheet_by_index() -> Result<()> {
    let df = load_table(&workbook_fixture(), &OpenOptions::new().with_sheet("1"))?;

    assert_eq!(df.shape(), (2, 2));
    assert_eq!(column_as_f64(&df, "Cost")?, [Some(2.5), Some(7.25)]);
    Ok(())
}

#[test]
fn test_workbook_sheet_by_name() -> Result<()> {
    let df = load_table(&workbook_fixture(), &OpenOptions::new().with_sheet("Costs"))?;

    assert_eq!(df.shape(), (2, 2));
    assert_eq!(df.column("Region")?.str()?.get(1), Some("B"));
    Ok(())
}

#[test]
fn test_workbook_missing_sheet_is_an_error() {
    let by_index = load_table(&workbook_fixture(), &OpenOptions::new().with_sheet("5"));
    assert!(by_index.is_err());
    let by_name = load_table(&workbook_fixture(), &OpenOptions::new().with_sheet("Budget"));
    assert!(by_name.is_err());
}
