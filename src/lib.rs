use std::path::PathBuf;

pub mod chart_export;
pub mod config;
pub mod console;
pub mod error;
pub mod error_display;
pub mod loader;
pub mod logging;
pub mod nulls;
pub mod selector;
pub mod session;
pub mod statistics;
pub mod summary;
pub mod visualize;
pub mod widgets;

pub use config::{AppConfig, ConfigManager};
pub use console::{Console, RetryPolicy, StdConsole};
pub use datadash_cli::{Args, FileFormat};
pub use error::{FillError, LoadError, PromptError, RenderError};
pub use loader::{load_table, LoadedTable};
pub use session::{run_dashboard, Session, SessionOptions};
pub use visualize::ChartOptions;

/// Application name, used for the config directory.
pub const APP_NAME: &str = "datadash";

/// How a table file is read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenOptions {
    /// Worksheet by 0-based index or name; the first sheet when unset.
    pub sheet: Option<String>,
    /// Delimited text only; `None` means the file has a header row.
    pub has_header: Option<bool>,
    /// Delimited text only; `None` uses the format's default separator.
    pub delimiter: Option<u8>,
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_has_header(mut self, has_header: bool) -> Self {
        self.has_header = Some(has_header);
        self
    }

    /// Create OpenOptions from CLI args and config, with CLI args taking precedence
    pub fn from_args_and_config(args: &Args, config: &AppConfig) -> Self {
        let mut opts = OpenOptions::new();
        opts.sheet = args
            .sheet
            .clone()
            .or_else(|| config.file_loading.sheet.clone());
        opts.delimiter = args
            .delimiter
            .or(config.file_loading.delimiter)
            .filter(char::is_ascii)
            .map(|c| c as u8);
        opts.has_header = if args.no_header {
            Some(false)
        } else {
            config.file_loading.has_header
        };
        opts
    }
}

impl From<&Args> for OpenOptions {
    fn from(args: &Args) -> Self {
        Self::from_args_and_config(args, &AppConfig::default())
    }
}

impl SessionOptions {
    /// Merge CLI args over config.
    pub fn from_args_and_config(args: &Args, config: &AppConfig) -> Self {
        let output_dir = args
            .output_dir
            .clone()
            .or_else(|| config.chart.output_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            open: OpenOptions::from_args_and_config(args, config),
            head_rows: config.analysis.head_rows,
            chart: ChartOptions {
                output_dir,
                width: config.chart.width,
                height: config.chart.height,
                default_top_n: args
                    .top_n
                    .filter(|n| *n > 0)
                    .unwrap_or(config.chart.default_top_n),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_args_override_config() {
        let mut config = AppConfig::default();
        config.file_loading.sheet = Some("1".to_string());
        config.file_loading.delimiter = Some(';');
        config.chart.output_dir = Some(PathBuf::from("from-config"));
        let args = Args::parse_from([
            "datadash",
            "--sheet",
            "Totals",
            "--output-dir",
            "charts",
            "--top-n",
            "7",
            "--no-header",
        ]);
        let opts = SessionOptions::from_args_and_config(&args, &config);
        assert_eq!(opts.open.sheet.as_deref(), Some("Totals"));
        assert_eq!(opts.open.delimiter, Some(b';'));
        assert_eq!(opts.open.has_header, Some(false));
        assert_eq!(opts.chart.output_dir, PathBuf::from("charts"));
        assert_eq!(opts.chart.default_top_n, 7);
        assert_eq!(opts.head_rows, 5);
    }

    #[test]
    fn test_config_used_without_args() {
        let mut config = AppConfig::default();
        config.chart.output_dir = Some(PathBuf::from("from-config"));
        config.file_loading.has_header = Some(true);
        let args = Args::parse_from(["datadash"]);
        let opts = SessionOptions::from_args_and_config(&args, &config);
        assert_eq!(opts.chart.output_dir, PathBuf::from("from-config"));
        assert_eq!(opts.chart.default_top_n, 4);
        assert_eq!(opts.open.has_header, Some(true));
        assert_eq!(opts.open.sheet, None);
    }

    #[test]
    fn test_args_to_open_options() {
        let args = Args::parse_from(["datadash", "--delimiter", "|", "--no-header"]);
        let opts: OpenOptions = (&args).into();
        assert_eq!(opts.delimiter, Some(b'|'));
        assert_eq!(opts.has_header, Some(false));
    }
}
