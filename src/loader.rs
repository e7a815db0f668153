//! Reading a spreadsheet from disk into a `DataFrame`.

use calamine::{open_workbook_auto, Data, Reader};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use polars::prelude::*;
use std::collections::HashSet;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use crate::console::Console;
use crate::error::{LoadError, PromptError};
use crate::error_display::user_message_from_load;
use crate::nulls::nan_to_null;
use crate::{FileFormat, OpenOptions};

/// A table together with the path it was read from.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub frame: DataFrame,
    pub path: PathBuf,
}

impl LoadedTable {
    pub fn rows(&self) -> usize {
        self.frame.height()
    }
}

/// What the non-blank cells of a worksheet column hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Whole,
    Real,
    Flag,
    Text,
    Day,
    Moment,
}

/// Read the table at `path`. Excel workbooks go through calamine, delimited text
/// through the Polars CSV reader.
pub fn load_table(path: &Path, options: &OpenOptions) -> Result<DataFrame, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }
    let format = FileFormat::from_path(path)
        .ok_or_else(|| LoadError::UnsupportedFormat(path.to_path_buf()))?;
    let df = match format {
        FileFormat::Excel => read_excel(path, options.sheet.as_deref())?,
        FileFormat::Csv | FileFormat::Tsv => read_delimited(path, format, options)?,
    };
    let df = nan_to_null(&df)?;
    tracing::debug!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "loaded table"
    );
    Ok(df)
}

/// Ask for a path until a table loads. Not-found and parse failures are reported
/// and the question is asked again.
pub fn prompt_for_table<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    options: &OpenOptions,
) -> Result<LoadedTable, PromptError> {
    let loaded = console.ask_until("Enter Excel file path (.xlsx): ", |c, answer| {
        let path = PathBuf::from(answer);
        match load_table(&path, options) {
            Ok(frame) => Ok(Some(LoadedTable { frame, path })),
            Err(e) if e.is_not_found() => {
                c.say("Error: File not found. Please try again.")?;
                Ok(None)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "load failed");
                c.say(format!("Error loading file: {}", user_message_from_load(&e)))?;
                Ok(None)
            }
        }
    })?;
    console.say("File loaded successfully.")?;
    Ok(loaded)
}

fn read_delimited(
    path: &Path,
    format: FileFormat,
    options: &OpenOptions,
) -> Result<DataFrame, LoadError> {
    let separator = options
        .delimiter
        .or_else(|| format.delimiter())
        .unwrap_or(b',');
    let mut read_options = CsvReadOptions::default();
    if let Some(has_header) = options.has_header {
        read_options.has_header = has_header;
    }
    read_options = read_options
        .map_parse_options(|opts| opts.with_separator(separator).with_try_parse_dates(true));
    let df = read_options
        .try_into_reader_with_file_path(Some(path.into()))?
        .finish()?;
    Ok(df)
}

/// Read one worksheet (first by default; `sheet` selects by 0-based index or name).
/// The first row holds the headers.
fn read_excel(path: &Path, sheet: Option<&str>) -> Result<DataFrame, LoadError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| LoadError::Excel(format!("Excel: {}", e)))?;
    if workbook.sheet_names().is_empty() {
        return Err(LoadError::Excel("Excel file has no worksheets".to_string()));
    }
    let range = match sheet {
        Some(sel) => match sel.parse::<usize>() {
            Ok(idx) => workbook
                .worksheet_range_at(idx)
                .ok_or_else(|| LoadError::Excel(format!("Excel: no sheet at index {}", idx)))?
                .map_err(|e| LoadError::Excel(format!("Excel: {}", e)))?,
            Err(_) => workbook
                .worksheet_range(sel)
                .map_err(|e| LoadError::Excel(format!("Excel: {}", e)))?,
        },
        None => workbook
            .worksheet_range_at(0)
            .ok_or_else(|| LoadError::Excel("Excel: no first sheet".to_string()))?
            .map_err(|e| LoadError::Excel(format!("Excel: {}", e)))?,
    };
    let rows: Vec<Vec<Data>> = range.rows().map(|r| r.to_vec()).collect();
    frame_from_cells(&rows)
}

/// Build a frame from a grid of cells whose first row is the header. Blank headers
/// get positional names and repeated ones a numeric suffix.
pub(crate) fn frame_from_cells(rows: &[Vec<Data>]) -> Result<DataFrame, LoadError> {
    let Some((header_row, body)) = rows.split_first() else {
        return Ok(DataFrame::empty());
    };
    let headers = header_row
        .iter()
        .enumerate()
        .map(|(col_idx, header)| {
            let header =
                calamine::DataType::as_string(header).unwrap_or_else(|| header.to_string());
            if header.trim().is_empty() {
                format!("column_{}", col_idx + 1)
            } else {
                header
            }
        })
        .collect();
    let mut columns = Vec::with_capacity(header_row.len());
    for (col_idx, name) in unique_headers(headers).iter().enumerate() {
        let cells: Vec<Option<&Data>> = body.iter().map(|row| row.get(col_idx)).collect();
        let series = column_to_series(name, &cells, infer_kind(&cells))?;
        columns.push(series.into());
    }
    Ok(DataFrame::new(columns)?)
}

/// `Sales, Sales, Sales` becomes `Sales, Sales.1, Sales.2`. A suffix already taken
/// by another header is skipped.
fn unique_headers(headers: Vec<String>) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::with_capacity(headers.len());
    let mut unique = Vec::with_capacity(headers.len());
    for header in headers {
        let mut name = header.clone();
        let mut suffix = 1;
        while taken.contains(&name) {
            name = format!("{}.{}", header, suffix);
            suffix += 1;
        }
        taken.insert(name.clone());
        unique.push(name);
    }
    unique
}

// Largest magnitude an f64 holds without losing integer precision.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

const SECONDS_PER_DAY: i64 = 86_400;

fn is_blank(cell: &Data) -> bool {
    matches!(cell, Data::Empty | Data::Error(_))
}

fn present<'a>(cell: &Option<&'a Data>) -> Option<&'a Data> {
    cell.filter(|c| !is_blank(c))
}

/// Numbers are whole or real, booleans stay booleans, and a column whose every value
/// is a date, a timestamp or an ISO date string becomes a date column. Anything mixed
/// is text. A column with no values reads as missing numbers.
fn infer_kind(cells: &[Option<&Data>]) -> CellKind {
    let values: Vec<&Data> = cells
        .iter()
        .flatten()
        .copied()
        .filter(|cell| !is_blank(cell))
        .collect();
    if values.is_empty() {
        return CellKind::Real;
    }
    if values.iter().all(|cell| matches!(cell, Data::Bool(_))) {
        return CellKind::Flag;
    }
    if values.iter().all(|cell| matches!(cell, Data::Int(_) | Data::Float(_))) {
        let whole = values.iter().all(|cell| match cell {
            Data::Float(f) => f.fract() == 0.0 && f.abs() <= MAX_EXACT_INTEGER,
            _ => true,
        });
        return if whole { CellKind::Whole } else { CellKind::Real };
    }
    let moments: Option<Vec<NaiveDateTime>> = values.iter().map(|cell| moment_of(cell)).collect();
    match moments {
        Some(moments) if moments.iter().all(|dt| dt.time() == NaiveTime::MIN) => CellKind::Day,
        Some(_) => CellKind::Moment,
        None => CellKind::Text,
    }
}

/// The timestamp held by a date cell or a date-like string.
fn moment_of(cell: &Data) -> Option<NaiveDateTime> {
    use calamine::DataType as _;
    match cell {
        Data::DateTime(_) => cell.as_datetime(),
        Data::DateTimeIso(text) | Data::String(text) => parse_moment(text),
        _ => None,
    }
}

fn parse_moment(text: &str) -> Option<NaiveDateTime> {
    const LAYOUTS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    let text = text.trim();
    LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(text, layout).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .map(|day| day.and_time(NaiveTime::MIN))
        })
}

fn column_to_series(name: &str, cells: &[Option<&Data>], kind: CellKind) -> Result<Series, LoadError> {
    use calamine::DataType as _;
    let name = PlSmallStr::from(name);
    let series = match kind {
        CellKind::Whole => Series::new(
            name,
            cells
                .iter()
                .map(|c| present(c).and_then(|d| d.as_i64()))
                .collect::<Vec<_>>(),
        ),
        CellKind::Real => Series::new(
            name,
            cells
                .iter()
                .map(|c| present(c).and_then(|d| d.as_f64()))
                .collect::<Vec<_>>(),
        ),
        CellKind::Flag => Series::new(
            name,
            cells
                .iter()
                .map(|c| present(c).and_then(|d| d.get_bool()))
                .collect::<Vec<_>>(),
        ),
        CellKind::Text => Series::new(
            name,
            cells
                .iter()
                .map(|c| present(c).and_then(|d| d.as_string()))
                .collect::<Vec<_>>(),
        ),
        CellKind::Day => {
            let days: Vec<Option<i32>> = cells
                .iter()
                .map(|c| {
                    present(c)
                        .and_then(moment_of)
                        .and_then(|dt| i32::try_from(dt.and_utc().timestamp().div_euclid(SECONDS_PER_DAY)).ok())
                })
                .collect();
            Series::new(name, days).cast(&DataType::Date)?
        }
        CellKind::Moment => {
            let micros: Vec<Option<i64>> = cells
                .iter()
                .map(|c| present(c).and_then(moment_of).map(|dt| dt.and_utc().timestamp_micros()))
                .collect();
            Series::new(name, micros)
                .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?
        }
    };
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Data {
        Data::String(v.to_string())
    }

    #[test]
    fn test_frame_from_cells_preserves_headers_and_order() {
        let rows = vec![
            vec![s("Region"), s("Q1"), s("Q2")],
            vec![s("A"), Data::Float(10.0), Data::Float(20.5)],
            vec![s("B"), Data::Float(5.0), Data::Empty],
        ];
        let df = frame_from_cells(&rows).unwrap();
        assert_eq!(df.shape(), (2, 3));
        let names: Vec<&str> = df.get_column_names().iter().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["Region", "Q1", "Q2"]);
        assert_eq!(df.column("Q1").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("Q2").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("Q2").unwrap().null_count(), 1);
    }

    #[test]
    fn test_blank_header_gets_positional_name() {
        let rows = vec![vec![s("id"), Data::Empty], vec![Data::Int(1), Data::Int(2)]];
        let df = frame_from_cells(&rows).unwrap();
        assert!(df.column("column_2").is_ok());
    }

    #[test]
    fn test_repeated_headers_get_suffixes() {
        let rows = vec![
            vec![s("Sales"), s("Sales"), s("Sales.1"), s("Sales")],
            vec![Data::Int(1), Data::Int(2), Data::Int(3), Data::Int(4)],
        ];
        let df = frame_from_cells(&rows).unwrap();
        let names: Vec<&str> = df.get_column_names().iter().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["Sales", "Sales.1", "Sales.1.1", "Sales.2"]);
        assert_eq!(df.column("Sales.2").unwrap().i64().unwrap().get(0), Some(4));
    }

    #[test]
    fn test_empty_column_is_numeric_and_missing() {
        let rows = vec![vec![s("x")], vec![Data::Empty], vec![Data::Empty]];
        let df = frame_from_cells(&rows).unwrap();
        let col = df.column("x").unwrap();
        assert_eq!(col.dtype(), &DataType::Float64);
        assert_eq!(col.null_count(), 2);
    }

    #[test]
    fn test_mixed_column_becomes_text() {
        let rows = vec![vec![s("mixed")], vec![Data::Int(1)], vec![s("two")]];
        let df = frame_from_cells(&rows).unwrap();
        assert_eq!(df.column("mixed").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_iso_strings_become_dates() {
        let rows = vec![vec![s("day")], vec![s("2024-01-02")], vec![s("2024-03-04")]];
        let df = frame_from_cells(&rows).unwrap();
        assert_eq!(df.column("day").unwrap().dtype(), &DataType::Date);
    }

    #[test]
    fn test_timestamps_with_time_of_day_stay_datetimes() {
        let rows = vec![
            vec![s("at"), s("ok")],
            vec![s("2024-01-02 08:30:00"), Data::Bool(true)],
            vec![s("2024-01-03"), Data::Empty],
        ];
        let df = frame_from_cells(&rows).unwrap();
        assert!(matches!(
            df.column("at").unwrap().dtype(),
            DataType::Datetime(TimeUnit::Microseconds, None)
        ));
        assert_eq!(df.column("ok").unwrap().dtype(), &DataType::Boolean);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = load_table(Path::new("definitely/missing.xlsx"), &OpenOptions::new())
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::write(&path, b"\x00\x01").unwrap();
        let err = load_table(&path, &OpenOptions::new()).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_corrupt_workbook_is_reported_not_found_is_not() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"not a zip archive").unwrap();
        let err = load_table(&path, &OpenOptions::new()).unwrap_err();
        assert!(!err.is_not_found());
        assert!(matches!(err, LoadError::Excel(_)));
    }
}
