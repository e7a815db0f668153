#![allow(dead_code)]

use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Quarterly sales by region, with gaps in the value columns.
pub fn sales_frame() -> DataFrame {
    df!(
        "Region" => ["North", "South", "East", "West", "Central"],
        "Q1" => [Some(120.0), Some(80.0), None, Some(40.0), Some(95.0)],
        "Q2" => [Some(130.0), None, Some(60.0), Some(45.0), Some(90.0)],
        "Q3" => [Some(110.0), Some(85.0), Some(70.0), None, Some(100.0)]
    )
    .unwrap()
}

/// Write `df` as CSV under `dir` and return its path.
pub fn write_csv(dir: &Path, name: &str, df: &mut DataFrame) -> PathBuf {
    let path = dir.join(name);
    let mut file = File::create(&path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();
    path
}

/// Write `df` as tab-separated text under `dir` and return its path.
pub fn write_tsv(dir: &Path, name: &str, df: &mut DataFrame) -> PathBuf {
    let path = dir.join(name);
    let mut file = File::create(&path).unwrap();
    CsvWriter::new(&mut file)
        .with_separator(b'\t')
        .finish(df)
        .unwrap();
    path
}
