//! Ranking rows by their total and turning the top entries into a chart.

use polars::prelude::*;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::chart_export::{render_chart, ChartSize};
use crate::console::Console;
use crate::error::{PromptError, RenderError};
use crate::error_display::user_message_from_render;
use crate::selector::ColumnSelection;
use crate::widgets::ChartViewer;

/// Name of the derived row-wise total column.
pub const TOTAL_COLUMN: &str = "Total";

/// Output settings for chart files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartOptions {
    pub output_dir: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Used when the top-N answer is blank or not a number.
    pub default_top_n: usize,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            width: 1200,
            height: 700,
            default_top_n: 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Subplots,
    GroupedBars,
    HorizontalBars,
    Pie,
}

impl ChartKind {
    pub const ALL: [Self; 4] = [
        Self::Subplots,
        Self::GroupedBars,
        Self::HorizontalBars,
        Self::Pie,
    ];

    /// Menu index `1`-`4`.
    pub fn from_choice(choice: &str) -> Option<Self> {
        match choice.trim() {
            "1" => Some(Self::Subplots),
            "2" => Some(Self::GroupedBars),
            "3" => Some(Self::HorizontalBars),
            "4" => Some(Self::Pie),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Subplots => "Subplots",
            Self::GroupedBars => "Grouped Bars",
            Self::HorizontalBars => "Horizontal Bars",
            Self::Pie => "Pie Chart",
        }
    }

    /// File written into the output directory; overwritten on every render.
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Subplots => "subplots.png",
            Self::GroupedBars => "grouped_bars.png",
            Self::HorizontalBars => "horizontal_bars.png",
            Self::Pie => "pie_chart.png",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Subplots => "Top Entries - Individual Breakdown",
            Self::GroupedBars => "Top Entries - Grouped Comparison",
            Self::HorizontalBars => "Top Entries - Horizontal Breakdown",
            Self::Pie => "Top Entries - Total Distribution",
        }
    }
}

/// A copy of `df` with [`TOTAL_COLUMN`] appended: the row-wise sum of `value_columns`
/// as `Float64`, missing and NaN values counted as zero. A column listed twice is
/// summed twice.
pub fn with_total(df: &DataFrame, value_columns: &[String]) -> Result<DataFrame, RenderError> {
    if value_columns.is_empty() {
        return Err(RenderError::NoValueColumns);
    }
    let schema = df.schema();
    for name in value_columns {
        let dtype = schema
            .get(name.as_str())
            .ok_or_else(|| RenderError::UnknownColumn(name.clone()))?;
        if !is_summable(dtype) {
            return Err(RenderError::NonNumeric {
                column: name.clone(),
                dtype: dtype.to_string(),
            });
        }
    }
    let total = value_columns
        .iter()
        .map(|name| {
            col(name.as_str())
                .cast(DataType::Float64)
                .fill_nan(lit(0.0))
                .fill_null(lit(0.0))
        })
        .reduce(|acc, e| acc + e)
        .ok_or(RenderError::NoValueColumns)?;
    Ok(df
        .clone()
        .lazy()
        .with_column(total.alias(TOTAL_COLUMN))
        .collect()?)
}

fn is_summable(dtype: &DataType) -> bool {
    crate::statistics::is_numeric_type(dtype) || matches!(dtype, DataType::Boolean)
}

/// The first `min(n, rows)` rows by descending total. Rows with equal totals keep
/// their original order.
pub fn top_n(df: &DataFrame, n: usize) -> Result<DataFrame, RenderError> {
    let n = IdxSize::try_from(n).unwrap_or(IdxSize::MAX);
    Ok(df
        .clone()
        .lazy()
        .sort_by_exprs(
            [col(TOTAL_COLUMN)],
            SortMultipleOptions::default()
                .with_order_descending(true)
                .with_nulls_last(true)
                .with_maintain_order(true),
        )
        .limit(n)
        .collect()?)
}

/// Blank or unparsable answers fall back to `default`.
pub fn parse_top_n(input: &str, default: usize) -> usize {
    input.trim().parse().unwrap_or(default)
}

/// One `(id, variable, value)` row of the long-form table.
#[derive(Debug, Clone, PartialEq)]
pub struct MeltRecord {
    pub id: String,
    pub variable: String,
    pub value: f64,
}

/// The ranked entries every renderer draws from.
#[derive(Debug, Clone, PartialEq)]
pub struct TopEntries {
    pub id_column: String,
    /// Identifier of each entry, rank order.
    pub labels: Vec<String>,
    pub value_columns: Vec<String>,
    /// `values[entry][column]`, missing values as zero.
    pub values: Vec<Vec<f64>>,
    pub totals: Vec<f64>,
}

impl TopEntries {
    /// Collect the entries of a frame produced by [`top_n`].
    pub fn from_frame(
        top: &DataFrame,
        id_column: &str,
        value_columns: &[String],
    ) -> Result<Self, RenderError> {
        let id = top
            .column(id_column)
            .map_err(|_| RenderError::UnknownColumn(id_column.to_string()))?
            .cast(&DataType::String)?;
        let labels = id
            .str()?
            .iter()
            .map(|v| v.unwrap_or("null").to_string())
            .collect::<Vec<_>>();

        let per_column = value_columns
            .iter()
            .map(|name| float_values(top, name))
            .collect::<Result<Vec<_>, _>>()?;
        let values = (0..top.height())
            .map(|row| per_column.iter().map(|c| c[row]).collect())
            .collect();
        let totals = float_values(top, TOTAL_COLUMN)?;

        Ok(Self {
            id_column: id_column.to_string(),
            labels,
            value_columns: value_columns.to_vec(),
            values,
            totals,
        })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Long form: every entry for the first value column, then the second, and so on.
    pub fn melt(&self) -> Vec<MeltRecord> {
        self.value_columns
            .iter()
            .enumerate()
            .flat_map(|(c, variable)| {
                self.labels.iter().zip(&self.values).map(move |(id, row)| MeltRecord {
                    id: id.clone(),
                    variable: variable.clone(),
                    value: row[c],
                })
            })
            .collect()
    }
}

fn float_values(df: &DataFrame, name: &str) -> Result<Vec<f64>, RenderError> {
    let column = df
        .column(name)
        .map_err(|_| RenderError::UnknownColumn(name.to_string()))?
        .cast(&DataType::Float64)?;
    Ok(column.f64()?.iter().map(|v| v.unwrap_or(0.0)).collect())
}

/// A chart written to disk.
#[derive(Debug, Clone)]
pub struct RenderedChart {
    pub kind: ChartKind,
    pub path: PathBuf,
    pub entries: TopEntries,
}

/// Rank `df` by the selected columns and draw the top `n` entries as `kind`.
pub fn build_chart(
    df: &DataFrame,
    selection: &ColumnSelection,
    n: usize,
    kind: ChartKind,
    options: &ChartOptions,
) -> Result<RenderedChart, RenderError> {
    let totals = with_total(df, &selection.value_columns)?;
    let top = top_n(&totals, n)?;
    let entries = TopEntries::from_frame(&top, &selection.id_column, &selection.value_columns)?;
    if entries.is_empty() {
        return Err(RenderError::NoEntries);
    }
    let path = options.output_dir.join(kind.file_name());
    let size = ChartSize {
        width: options.width,
        height: options.height,
    };
    render_chart(kind, &entries, &path, size)?;
    tracing::debug!(
        kind = kind.label(),
        entries = entries.len(),
        path = %path.display(),
        "chart written"
    );
    Ok(RenderedChart {
        kind,
        path,
        entries,
    })
}

/// Ask for N and the chart type, render, then hand the chart to `viewer`.
/// Returns the written file, or `None` when nothing was drawn.
pub fn create_visualizations<R: BufRead, W: Write, V: ChartViewer + ?Sized>(
    console: &mut Console<R, W>,
    df: &DataFrame,
    selection: &ColumnSelection,
    options: &ChartOptions,
    viewer: &mut V,
) -> Result<Option<PathBuf>, PromptError> {
    let answer = console.prompt(&format!(
        "Number of top entries to display (default {}): ",
        options.default_top_n
    ))?;
    let n = parse_top_n(&answer, options.default_top_n);

    console.section("Visualization options:")?;
    for (i, kind) in ChartKind::ALL.iter().enumerate() {
        console.say(format!("{}. {}", i + 1, kind.label()))?;
    }
    let choice = console.prompt("Select visualization (1-4): ")?;
    let Some(kind) = ChartKind::from_choice(&choice) else {
        console.say("Invalid choice. No visualization created.")?;
        return Ok(None);
    };

    let chart = match build_chart(df, selection, n, kind, options) {
        Ok(chart) => chart,
        Err(e) => {
            tracing::warn!(kind = kind.label(), error = %e, "render failed");
            console.say(format!("Visualization error: {}", user_message_from_render(&e)))?;
            return Ok(None);
        }
    };
    console.say(format!("Saved {}", chart.path.display()))?;
    if let Err(e) = viewer.show(&chart) {
        tracing::warn!(error = %e, "chart preview failed");
        console.say(format!("Visualization error: {}", user_message_from_render(&e)))?;
    }
    Ok(Some(chart.path))
}
