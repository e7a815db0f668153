//! Short console messages for typed errors.
//!
//! Polars and io errors are matched by variant and kind so the dashboard can print
//! one readable line after its own prefix.

use polars::prelude::PolarsError;
use std::io::{self, ErrorKind};

use crate::error::{FillError, LoadError, RenderError};

/// One line describing a polars failure.
pub fn user_message_from_polars(err: &PolarsError) -> String {
    match err {
        PolarsError::ColumnNotFound(name) => format!("no column named {}", name),
        PolarsError::IO { error, msg } => {
            let detail = msg.as_ref().map(|m| m.to_string());
            user_message_from_io(error.as_ref(), detail.as_deref())
        }
        PolarsError::NoData(msg) => format!("the file has no data ({})", first_line(msg)),
        PolarsError::SchemaMismatch(msg) | PolarsError::ShapeMismatch(msg) => {
            format!("rows do not line up: {}", first_line(msg))
        }
        PolarsError::InvalidOperation(msg) | PolarsError::ComputeError(msg) => first_line(msg),
        PolarsError::Context { error, msg } => {
            format!("{}: {}", first_line(msg), user_message_from_polars(error))
        }
        other => first_line(&other.to_string()),
    }
}

/// One line describing an io failure, with `context` appended when given.
pub fn user_message_from_io(err: &io::Error, context: Option<&str>) -> String {
    let base = match err.kind() {
        ErrorKind::NotFound => "file not found".to_string(),
        ErrorKind::PermissionDenied => "permission denied".to_string(),
        ErrorKind::IsADirectory => "path is a directory".to_string(),
        ErrorKind::InvalidData | ErrorKind::InvalidInput | ErrorKind::UnexpectedEof => {
            "the file is damaged or not in the expected format".to_string()
        }
        _ => first_line(&err.to_string()),
    };
    match context.filter(|c| !c.is_empty()) {
        Some(ctx) => format!("{} ({})", base, first_line(ctx)),
        None => base,
    }
}

/// Message printed after `Error loading file: `.
pub fn user_message_from_load(err: &LoadError) -> String {
    match err {
        LoadError::Polars(pe) => user_message_from_polars(pe),
        LoadError::Io(e) => user_message_from_io(e, None),
        other => other.to_string(),
    }
}

/// Message printed after `Error filling nulls: `.
pub fn user_message_from_fill(err: &FillError) -> String {
    match err {
        FillError::Polars(pe) => user_message_from_polars(pe),
        other => other.to_string(),
    }
}

/// Message printed after `Visualization error: `.
pub fn user_message_from_render(err: &RenderError) -> String {
    match err {
        RenderError::Polars(pe) => user_message_from_polars(pe),
        RenderError::Io(e) => user_message_from_io(e, None),
        other => other.to_string(),
    }
}

// Polars messages can carry multi-line hints; keep the console to one line.
fn first_line(msg: &str) -> String {
    msg.lines()
        .next()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or("An error occurred")
        .to_string()
}
