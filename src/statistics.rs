use polars::prelude::*;
use std::collections::HashMap;

/// Row labels of the describe table, in display order.
pub const DESCRIBE_ROWS: [&str; 11] = [
    "count", "unique", "top", "freq", "mean", "std", "min", "25%", "50%", "75%", "max",
];

pub struct ColumnStatistics {
    pub name: String,
    pub dtype: DataType,
    pub count: usize,
    pub null_count: usize,
    pub numeric_stats: Option<NumericStatistics>,
    pub categorical_stats: Option<CategoricalStatistics>,
}

pub struct NumericStatistics {
    pub mean: Option<f64>,
    pub std: Option<f64>, // Sample std (ddof=1)
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

pub struct CategoricalStatistics {
    pub unique_count: usize,
    pub top: Option<String>,
    pub freq: usize,
}

impl ColumnStatistics {
    /// Cell of the describe table for `row` (one of [`DESCRIBE_ROWS`]).
    pub fn cell(&self, row: &str) -> Option<String> {
        if row == "count" {
            return Some(self.count.to_string());
        }
        if let Some(cat) = &self.categorical_stats {
            return match row {
                "unique" => Some(cat.unique_count.to_string()),
                "top" => cat.top.clone(),
                "freq" => cat.top.as_ref().map(|_| cat.freq.to_string()),
                _ => None,
            };
        }
        let num = self.numeric_stats.as_ref()?;
        let value = match row {
            "mean" => num.mean,
            "std" => num.std,
            "min" => num.min,
            "25%" => num.q25,
            "50%" => num.median,
            "75%" => num.q75,
            "max" => num.max,
            _ => None,
        };
        value.map(format_stat)
    }
}

pub fn is_numeric_type(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Statistics for every column of `df`, in column order.
pub fn compute_statistics(df: &DataFrame) -> Result<Vec<ColumnStatistics>, PolarsError> {
    df.get_columns()
        .iter()
        .map(|column| {
            let series = column.as_materialized_series();
            let dtype = series.dtype().clone();
            let null_count = series.null_count();
            let numeric = is_numeric_type(&dtype);
            Ok(ColumnStatistics {
                name: series.name().to_string(),
                count: series.len() - null_count,
                null_count,
                numeric_stats: if numeric {
                    Some(compute_numeric_stats(series))
                } else {
                    None
                },
                categorical_stats: if numeric {
                    None
                } else {
                    Some(compute_categorical_stats(series)?)
                },
                dtype,
            })
        })
        .collect()
}

/// Summary table: a `statistic` column with [`DESCRIBE_ROWS`] and one text column per
/// input column. Cells that do not apply to a column's type are null.
pub fn describe(df: &DataFrame) -> Result<DataFrame, PolarsError> {
    let stats = compute_statistics(df)?;
    let mut columns: Vec<Column> = Vec::with_capacity(stats.len() + 1);
    columns.push(Series::new("statistic".into(), DESCRIBE_ROWS.to_vec()).into());
    for stat in &stats {
        let cells: Vec<Option<String>> = DESCRIBE_ROWS.iter().map(|row| stat.cell(row)).collect();
        columns.push(Series::new(stat.name.as_str().into(), cells).into());
    }
    DataFrame::new(columns)
}

// Helper function to convert numeric series to Vec<f64>, dropping nulls and NaN
fn get_numeric_values_as_f64(series: &Series) -> Vec<f64> {
    match series.cast(&DataType::Float64) {
        Ok(cast_series) => match cast_series.f64() {
            Ok(ca) => ca.iter().flatten().filter(|v| !v.is_nan()).collect(),
            Err(_) => Vec::new(),
        },
        Err(_) => Vec::new(),
    }
}

fn compute_numeric_stats(series: &Series) -> NumericStatistics {
    let mut values = get_numeric_values_as_f64(series);
    values.sort_by(|a, b| a.total_cmp(b));
    let n = values.len();
    let mean = (n > 0).then(|| values.iter().sum::<f64>() / n as f64);
    let std = mean.filter(|_| n > 1).map(|m| {
        let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
        (ss / (n - 1) as f64).sqrt()
    });
    NumericStatistics {
        mean,
        std,
        min: values.first().copied(),
        q25: quantile_linear(&values, 0.25),
        median: quantile_linear(&values, 0.5),
        q75: quantile_linear(&values, 0.75),
        max: values.last().copied(),
    }
}

/// Linear-interpolated quantile of already sorted values.
pub fn quantile_linear(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let pos = q.clamp(0.0, 1.0) * last as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

fn compute_categorical_stats(series: &Series) -> Result<CategoricalStatistics, PolarsError> {
    let strings = series.cast(&DataType::String)?;
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();
    for value in strings.str()?.iter().flatten() {
        let entry = counts.entry(value).or_insert_with(|| {
            first_seen.push(value);
            0
        });
        *entry += 1;
    }
    // Ties go to the value seen first.
    let mut top: Option<(&str, usize)> = None;
    for value in &first_seen {
        let n = counts[value];
        if top.is_none_or(|(_, best)| n > best) {
            top = Some((value, n));
        }
    }
    Ok(CategoricalStatistics {
        unique_count: counts.len(),
        top: top.map(|(v, _)| v.to_string()),
        freq: top.map_or(0, |(_, n)| n),
    })
}

/// Up to six significant digits, no trailing zeros.
pub fn format_stat(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value == value.trunc() && value.abs() < 1e15 {
        return format!("{:.1}", value);
    }
    let magnitude = value.abs().log10().floor() as i32;
    let decimals = (5 - magnitude).clamp(0, 12) as usize;
    let s = format!("{:.*}", decimals, value);
    let s = s.trim_end_matches('0');
    s.trim_end_matches('.').to_string()
}
