//! Typed failures for the menu handlers.
//!
//! Every handler reports these to the console and returns to its prompt; none of
//! them end the session.

use polars::prelude::PolarsError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure reading a table from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("unsupported file type: {}", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error("{0}")]
    Excel(String),
    #[error(transparent)]
    Polars(#[from] PolarsError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl LoadError {
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Io(e) => e.kind() == io::ErrorKind::NotFound,
            Self::Polars(PolarsError::IO { error, .. }) => error.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

/// Failure applying a fill strategy. The input table is left untouched.
#[derive(Debug, Error)]
pub enum FillError {
    #[error("column '{column}' has type {dtype} which cannot be filled with {value}")]
    Unsupported {
        column: String,
        dtype: String,
        value: &'static str,
    },
    #[error(transparent)]
    Polars(#[from] PolarsError),
}

/// Failure building or drawing a chart.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no rows to plot")]
    NoEntries,
    #[error("no value columns selected")]
    NoValueColumns,
    #[error("column not found: {0}")]
    UnknownColumn(String),
    #[error("column '{column}' is not numeric ({dtype})")]
    NonNumeric { column: String, dtype: String },
    #[error("pie wedge '{label}' has a negative or undefined total")]
    InvalidWedge { label: String },
    #[error("a {width}x{height} pixel chart is too large to draw; chart fewer entries")]
    TooLarge { width: u64, height: u64 },
    #[error("{0}")]
    Draw(String),
    #[error(transparent)]
    Polars(#[from] PolarsError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Failure talking to the console.
#[derive(Debug, Error)]
pub enum PromptError {
    /// Standard input reached end of file.
    #[error("input closed")]
    Closed,
    /// The retry policy ran out while waiting for a valid answer.
    #[error("no valid answer to '{prompt}' after {attempts} attempts")]
    AttemptsExhausted { prompt: String, attempts: usize },
    #[error(transparent)]
    Io(#[from] io::Error),
}
