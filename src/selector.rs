//! Interactive choice of the identifier column and the value columns.

use polars::prelude::*;
use std::io::{BufRead, Write};

use crate::console::Console;
use crate::error::PromptError;

/// Columns chosen for a chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSelection {
    /// Labels each entry.
    pub id_column: String,
    /// Summed into the total, in the order given. May repeat a column.
    pub value_columns: Vec<String>,
}

/// Split `input` on commas and keep the trimmed names present in `columns`,
/// in input order with duplicates kept.
pub fn parse_value_columns(input: &str, columns: &[String]) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|name| columns.iter().any(|c| c == name))
        .map(str::to_string)
        .collect()
}

/// List the columns and ask until a valid identifier and at least one value column
/// have been given.
pub fn select_columns<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    df: &DataFrame,
) -> Result<ColumnSelection, PromptError> {
    let columns: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();

    console.section("Available columns:")?;
    for name in &columns {
        console.say(format!("- {}", name))?;
    }

    let id_column = console.ask_until("Select ID column: ", |c, answer| {
        if columns.iter().any(|name| name == answer) {
            Ok(Some(answer.to_string()))
        } else {
            c.say("Invalid column. Try again.")?;
            Ok(None)
        }
    })?;

    let value_columns = console.ask_until("Select value columns (comma-separated): ", |c, answer| {
        let picked = parse_value_columns(answer, &columns);
        if picked.is_empty() {
            c.say("No valid columns selected. Try again.")?;
            Ok(None)
        } else {
            Ok(Some(picked))
        }
    })?;

    tracing::debug!(id = %id_column, values = ?value_columns, "columns selected");
    Ok(ColumnSelection {
        id_column,
        value_columns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::{RetryPolicy, ScriptedConsole};

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn frame() -> DataFrame {
        df!(
            "Region" => ["A", "B"],
            "Q1" => [1i64, 2],
            "Q2" => [3i64, 4]
        )
        .unwrap()
    }

    #[test]
    fn test_parse_value_columns_filters_and_keeps_order() {
        let cols = names(&["Region", "Q1", "Q2"]);
        assert_eq!(parse_value_columns(" Q2 , Q1", &cols), names(&["Q2", "Q1"]));
        assert_eq!(parse_value_columns("Q1,Q9,Q1", &cols), names(&["Q1", "Q1"]));
        assert!(parse_value_columns("", &cols).is_empty());
        assert!(parse_value_columns(",,", &cols).is_empty());
    }

    #[test]
    fn test_parse_value_columns_is_case_sensitive() {
        let cols = names(&["Q1"]);
        assert!(parse_value_columns("q1", &cols).is_empty());
    }

    #[test]
    fn test_select_columns_reprompts_on_bad_id() {
        let mut console = ScriptedConsole::scripted(
            &["region", "Nope", " Region ", "Q1, Q2"],
            RetryPolicy::MaxAttempts(5),
        );
        let selection = select_columns(&mut console, &frame()).unwrap();
        assert_eq!(selection.id_column, "Region");
        assert_eq!(selection.value_columns, names(&["Q1", "Q2"]));
        let text = console.transcript();
        assert_eq!(text.matches("Invalid column. Try again.").count(), 2);
        assert_eq!(text.matches("Select ID column: ").count(), 3);
    }

    #[test]
    fn test_select_columns_reprompts_on_empty_values() {
        let mut console = ScriptedConsole::scripted(
            &["Region", "Q7", "Q2"],
            RetryPolicy::MaxAttempts(5),
        );
        let selection = select_columns(&mut console, &frame()).unwrap();
        assert_eq!(selection.value_columns, names(&["Q2"]));
        assert!(console
            .transcript()
            .contains("No valid columns selected. Try again."));
    }

    #[test]
    fn test_select_columns_lists_columns() {
        let mut console = ScriptedConsole::scripted(&["Q1", "Q1"], RetryPolicy::Unbounded);
        select_columns(&mut console, &frame()).unwrap();
        let text = console.transcript();
        assert!(text.contains("Available columns:\n- Region\n- Q1\n- Q2\n"));
    }
}
