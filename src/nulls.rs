//! Missing-value report and fill strategies.

use polars::prelude::*;
use std::fmt;
use std::io::{BufRead, Write};

use crate::console::Console;
use crate::error::{FillError, PromptError};
use crate::error_display::user_message_from_fill;
use crate::statistics::is_numeric_type;

/// How missing values are replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillStrategy {
    /// Every missing value becomes zero (or the zero of the column's type).
    Zero,
    /// Numeric columns take their mean; other columns are left alone.
    Mean,
    /// Numeric columns take their median; other columns are left alone.
    Median,
    /// Last valid value carried down.
    Forward,
    /// Next valid value carried up.
    Backward,
}

impl FillStrategy {
    pub const ALL: [Self; 5] = [
        Self::Zero,
        Self::Mean,
        Self::Median,
        Self::Forward,
        Self::Backward,
    ];

    /// Menu index `0`-`4`.
    pub fn from_choice(choice: &str) -> Option<Self> {
        match choice.trim() {
            "0" => Some(Self::Zero),
            "1" => Some(Self::Mean),
            "2" => Some(Self::Median),
            "3" => Some(Self::Forward),
            "4" => Some(Self::Backward),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Zero => "Zero fill",
            Self::Mean => "Mean",
            Self::Median => "Median",
            Self::Forward => "Forward fill",
            Self::Backward => "Backward fill",
        }
    }
}

impl fmt::Display for FillStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Missing-value count of every column, in column order. Float NaN counts as missing.
pub fn null_counts(df: &DataFrame) -> Vec<(String, usize)> {
    df.get_columns()
        .iter()
        .map(|c| (c.name().to_string(), c.null_count() + nan_count(c)))
        .collect()
}

pub fn total_nulls(df: &DataFrame) -> usize {
    df.get_columns()
        .iter()
        .map(|c| c.null_count() + nan_count(c))
        .sum()
}

fn nan_count(c: &Column) -> usize {
    if !matches!(c.dtype(), DataType::Float32 | DataType::Float64) {
        return 0;
    }
    match c.cast(&DataType::Float64) {
        Ok(values) => values
            .f64()
            .map(|ca| ca.iter().filter(|v| v.is_some_and(f64::is_nan)).count())
            .unwrap_or(0),
        Err(_) => 0,
    }
}

/// Replace NaN in float columns with nulls, so every later step sees one kind of
/// missing value.
pub fn nan_to_null(df: &DataFrame) -> PolarsResult<DataFrame> {
    if df.get_columns().iter().all(|c| nan_count(c) == 0) {
        return Ok(df.clone());
    }
    let columns = df
        .get_columns()
        .iter()
        .map(|c| {
            if nan_count(c) == 0 {
                return Ok(c.clone());
            }
            let values = c.cast(&DataType::Float64)?;
            let cleaned: Float64Chunked = values
                .f64()?
                .iter()
                .map(|v| v.filter(|x| !x.is_nan()))
                .collect();
            cleaned
                .with_name(c.name().clone())
                .into_series()
                .cast(c.dtype())
                .map(Column::from)
        })
        .collect::<PolarsResult<Vec<_>>>()?;
    DataFrame::new(columns)
}

/// Apply `strategy` to a copy of `df`. On error `df` is untouched and nothing is returned.
pub fn apply_fill(df: &DataFrame, strategy: FillStrategy) -> Result<DataFrame, FillError> {
    let cleaned = nan_to_null(df)?;
    let df = &cleaned;
    let filled = match strategy {
        FillStrategy::Zero => {
            let exprs = df
                .get_columns()
                .iter()
                .map(|c| zero_fill_expr(c.name().as_str(), c.dtype()))
                .collect::<Result<Vec<_>, _>>()?;
            df.clone().lazy().with_columns(exprs).collect()?
        }
        FillStrategy::Mean | FillStrategy::Median => {
            let exprs: Vec<Expr> = df
                .get_columns()
                .iter()
                .filter(|c| is_numeric_type(c.dtype()))
                .map(|c| {
                    let e = col(c.name().clone());
                    let stat = if strategy == FillStrategy::Mean {
                        e.clone().mean()
                    } else {
                        e.clone().median()
                    };
                    e.fill_null(stat)
                })
                .collect();
            if exprs.is_empty() {
                df.clone()
            } else {
                df.clone().lazy().with_columns(exprs).collect()?
            }
        }
        FillStrategy::Forward | FillStrategy::Backward => {
            let fill = if strategy == FillStrategy::Forward {
                FillNullStrategy::Forward(None)
            } else {
                FillNullStrategy::Backward(None)
            };
            let columns = df
                .get_columns()
                .iter()
                .map(|c| {
                    c.as_materialized_series()
                        .fill_null(fill)
                        .map(Column::from)
                })
                .collect::<PolarsResult<Vec<_>>>()?;
            DataFrame::new(columns)?
        }
    };
    tracing::debug!(
        strategy = %strategy,
        before = total_nulls(df),
        after = total_nulls(&filled),
        "filled missing values"
    );
    Ok(filled)
}

fn zero_fill_expr(name: &str, dtype: &DataType) -> Result<Expr, FillError> {
    let e = col(name);
    let zero = match dtype {
        DataType::String => lit("0"),
        DataType::Boolean => lit(false),
        dt if is_numeric_type(dt) => lit(0).cast(dt.clone()),
        DataType::Date | DataType::Datetime(_, _) | DataType::Null => {
            lit(0).cast(dtype.clone())
        }
        other => {
            return Err(FillError::Unsupported {
                column: name.to_string(),
                dtype: other.to_string(),
                value: "zero",
            })
        }
    };
    Ok(e.fill_null(zero))
}

/// Print the columns that have missing values. Returns the total missing count.
pub fn report_nulls<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    df: &DataFrame,
) -> Result<usize, PromptError> {
    let counts = null_counts(df);
    console.section("Null values per column:")?;
    let missing: Vec<&(String, usize)> = counts.iter().filter(|(_, n)| *n > 0).collect();
    if missing.is_empty() {
        console.say("No null values found")?;
        return Ok(0);
    }
    let width = missing.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    for (name, n) in &missing {
        console.say(format!("{:<width$}    {}", name, n, width = width))?;
    }
    Ok(missing.iter().map(|(_, n)| n).sum())
}

/// Print the missing-value report and, if the user agrees, apply a fill strategy.
/// Returns the table to keep using: the filled one, or `df` unchanged.
pub fn handle_nulls<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    df: &DataFrame,
) -> Result<DataFrame, PromptError> {
    if report_nulls(console, df)? == 0 {
        return Ok(df.clone());
    }

    console.say("")?;
    let answer = console.prompt("Do you want to handle null values? (yes/no): ")?;
    if answer.to_lowercase() != "yes" {
        return Ok(df.clone());
    }

    let menu = FillStrategy::ALL
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}) {}", i, s))
        .collect::<Vec<_>>()
        .join(" ");
    console.section(format!("Fill methods: {}", menu))?;
    let choice = console.prompt("Select fill method (0-4): ")?;
    let Some(strategy) = FillStrategy::from_choice(&choice) else {
        console.say("Invalid selection. No changes made.")?;
        return Ok(df.clone());
    };
    match apply_fill(df, strategy) {
        Ok(filled) => Ok(filled),
        Err(e) => {
            tracing::warn!(strategy = %strategy, error = %e, "fill failed");
            console.say(format!("Error filling nulls: {}", user_message_from_fill(&e)))?;
            Ok(df.clone())
        }
    }
}
