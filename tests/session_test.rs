mod common;

use color_eyre::Result;
use datadash::console::ScriptedConsole;
use datadash::widgets::NoPreview;
use datadash::{run_dashboard, OpenOptions, RetryPolicy, Session, SessionOptions};

#[test]
fn test_load_analyze_visualize_exit() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = common::write_csv(dir.path(), "sales.csv", &mut common::sales_frame());
    let path_text = path.display().to_string();
    let script = [
        "1",
        path_text.as_str(),
        "2",
        "yes",
        "1",
        "3",
        "Territory",
        "Region",
        "Q1, Q2",
        "",
        "7",
        "4",
    ];
    let mut console = ScriptedConsole::scripted(&script, RetryPolicy::Unbounded);
    let mut options = SessionOptions::default();
    options.chart.output_dir = dir.path().join("charts");

    let session = run_dashboard(&mut console, Session::new(), &options, &mut NoPreview)?;

    let text = console.transcript();
    assert!(text.contains("File loaded successfully."));
    assert!(text.contains("Dataset shape: (5, 4)"));
    assert!(text.contains("Null values per column:"));
    assert!(text.contains("Invalid column. Try again."));
    assert!(text.contains("Invalid choice. No visualization created."));
    assert!(text.ends_with("Exiting program. Goodbye!\n"));

    let table = session.table().expect("table stays loaded");
    let q1 = table.frame.column("Q1")?.f64()?;
    assert_eq!(q1.null_count(), 0);
    assert_eq!(q1.get(2), Some(83.75));
    assert!(!dir.path().join("charts").exists());
    Ok(())
}

#[test]
fn test_declining_fill_keeps_missing_values() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = common::write_csv(dir.path(), "sales.csv", &mut common::sales_frame());
    let mut console = ScriptedConsole::scripted(&["2", "no", "4"], RetryPolicy::Unbounded);
    let mut preload = ScriptedConsole::scripted(&[], RetryPolicy::Unbounded);
    let session = Session::preload(&mut preload, &path, &OpenOptions::new())?;

    let session = run_dashboard(
        &mut console,
        session,
        &SessionOptions::default(),
        &mut NoPreview,
    )?;

    let table = session.table().expect("preloaded table");
    assert_eq!(table.frame.column("Q2")?.null_count(), 1);
    assert!(preload.transcript().contains("File loaded successfully."));
    Ok(())
}

#[test]
fn test_bounded_retries_return_to_menu() -> Result<()> {
    let mut console = ScriptedConsole::scripted(
        &["1", "/missing/a.xlsx", "/missing/b.xlsx", "/missing/c.xlsx", "4"],
        RetryPolicy::MaxAttempts(3),
    );
    let session = run_dashboard(
        &mut console,
        Session::new(),
        &SessionOptions::default(),
        &mut NoPreview,
    )?;

    assert!(session.table().is_none());
    let text = console.transcript();
    assert_eq!(text.matches("Error: File not found. Please try again.").count(), 3);
    assert!(text.contains("after 3 attempts. Returning to the menu."));
    assert!(text.ends_with("Exiting program. Goodbye!\n"));
    Ok(())
}
