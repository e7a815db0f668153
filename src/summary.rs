//! "Basic Analysis": shape, sample rows, types and descriptive statistics.

use polars::prelude::*;
use std::io::{BufRead, Write};

use crate::console::Console;
use crate::error::PromptError;
use crate::error_display::user_message_from_polars;
use crate::nulls::handle_nulls;
use crate::statistics::describe;

/// Print the overview of `df`, then run the missing-value handler.
/// Returns the table the session should keep.
pub fn basic_understanding<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    df: &DataFrame,
    head_rows: usize,
) -> Result<DataFrame, PromptError> {
    console.section("=== Basic Data Understanding ===")?;
    console.say(format!("Dataset shape: {}", shape_text(df)))?;

    console.section(format!("First {} rows:", head_rows.min(df.height())))?;
    console.say(df.head(Some(head_rows)))?;

    console.section("Data types:")?;
    for line in dtype_lines(df) {
        console.say(line)?;
    }

    console.section("Descriptive statistics:")?;
    match describe(df) {
        Ok(summary) => console.say(summary)?,
        Err(e) => {
            tracing::warn!(error = %e, "describe failed");
            console.say(format!(
                "Could not compute statistics: {}",
                user_message_from_polars(&e)
            ))?;
        }
    }

    handle_nulls(console, df)
}

/// `(rows, cols)`.
pub fn shape_text(df: &DataFrame) -> String {
    let (rows, cols) = df.shape();
    format!("({}, {})", rows, cols)
}

fn dtype_lines(df: &DataFrame) -> Vec<String> {
    let width = df
        .get_column_names()
        .iter()
        .map(|n| n.len())
        .max()
        .unwrap_or(0);
    df.get_columns()
        .iter()
        .map(|c| format!("{:<width$}    {}", c.name(), c.dtype(), width = width))
        .collect()
}
