use clap::Parser;
use color_eyre::Result;
use datadash::widgets::{ChartViewer, NoPreview, TerminalPreview};
use datadash::{
    logging, run_dashboard, AppConfig, Args, ConfigManager, RetryPolicy, Session,
    SessionOptions, StdConsole, APP_NAME,
};

fn handle_early_exit_flags(args: &Args) -> Result<Option<()>> {
    if args.generate_config {
        let config_manager = ConfigManager::new(APP_NAME)?;
        let path = config_manager.write_default_config(args.force)?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(Some(()));
    }

    Ok(None)
}

fn chart_viewer(args: &Args, config: &AppConfig) -> Box<dyn ChartViewer> {
    if config.chart.preview && !args.no_preview {
        Box::new(TerminalPreview)
    } else {
        Box::new(NoPreview)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    color_eyre::install()?;

    if let Some(()) = handle_early_exit_flags(&args)? {
        return Ok(());
    }

    let config = AppConfig::load(APP_NAME)?;
    logging::init(&config.logging.level, args.debug)?;

    let options = SessionOptions::from_args_and_config(&args, &config);
    let mut viewer = chart_viewer(&args, &config);
    let mut console = StdConsole::stdio(RetryPolicy::from_max_attempts(
        config.prompt.max_attempts,
    ));

    let session = match &args.path {
        Some(path) => Session::preload(&mut console, path, &options.open)?,
        None => Session::new(),
    };
    run_dashboard(&mut console, session, &options, viewer.as_mut())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_preview_flag_selects_file_only_viewer() {
        let args = Args::parse_from(["datadash", "--no-preview"]);
        let config = AppConfig::default();
        // Would block on a key press if the terminal preview were chosen.
        let mut viewer = chart_viewer(&args, &config);
        let chart = datadash::visualize::RenderedChart {
            kind: datadash::visualize::ChartKind::Pie,
            path: "pie_chart.png".into(),
            entries: datadash::visualize::TopEntries {
                id_column: "id".to_string(),
                labels: vec!["a".to_string()],
                value_columns: vec!["v".to_string()],
                values: vec![vec![1.0]],
                totals: vec![1.0],
            },
        };
        assert!(viewer.show(&chart).is_ok());
    }
}
