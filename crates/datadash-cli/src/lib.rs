//! Shared CLI definitions for datadash.
//!
//! Used by the main application and by the build script (manpage).

use clap::Parser;
use std::path::{Path, PathBuf};

/// File format for input tables. Detected from the file extension when loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Excel or OpenDocument workbook (.xls, .xlsx, .xlsm, .xlsb, .ods)
    Excel,
    /// Comma-separated values
    Csv,
    /// Tab-separated values
    Tsv,
}

impl FileFormat {
    /// Detect file format from path extension. Returns None when extension is missing or unknown.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Parse format from extension string (e.g. "xlsx", "csv").
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "xls" | "xlsx" | "xlsm" | "xlsb" | "ods" => Some(Self::Excel),
            "csv" => Some(Self::Csv),
            "tsv" => Some(Self::Tsv),
            _ => None,
        }
    }

    /// Default field separator for delimited formats.
    pub fn delimiter(self) -> Option<u8> {
        match self {
            Self::Csv => Some(b','),
            Self::Tsv => Some(b'\t'),
            Self::Excel => None,
        }
    }
}

/// Command-line arguments for datadash
#[derive(Clone, Parser, Debug)]
#[command(
    name = "datadash",
    version,
    about = "Interactive spreadsheet summaries and top-N charts",
    long_about = "Load a spreadsheet, inspect descriptive statistics, fill missing values \
                  and render one of four charts of the top rows by a computed total.\n\n\
                  Without PATH the session starts with the load prompt available from the menu."
)]
pub struct Args {
    /// Spreadsheet to load before the menu is shown
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Worksheet to read from Excel files, by 0-based index or name (default: first sheet)
    #[arg(long = "sheet", value_name = "SHEET")]
    pub sheet: Option<String>,

    /// Specify that delimited text files have no header row
    #[arg(long = "no-header", action)]
    pub no_header: bool,

    /// Field delimiter for delimited text files (single ASCII character)
    #[arg(long = "delimiter", value_name = "CHAR")]
    pub delimiter: Option<char>,

    /// Directory where chart images are written (default: current directory)
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Default number of top entries to chart when the prompt is left blank
    #[arg(long = "top-n", value_name = "N")]
    pub top_n: Option<usize>,

    /// Do not open the interactive chart display after saving an image
    #[arg(long = "no-preview", action)]
    pub no_preview: bool,

    /// Enable debug logging on stderr
    #[arg(long = "debug", action)]
    pub debug: bool,

    /// Write a commented default configuration file and exit
    #[arg(long = "generate-config", action)]
    pub generate_config: bool,

    /// Overwrite an existing configuration file (used with --generate-config)
    #[arg(long = "force", action, requires = "generate_config")]
    pub force: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_file_format_from_path() {
        assert_eq!(
            FileFormat::from_path(Path::new("sales.XLSX")),
            Some(FileFormat::Excel)
        );
        assert_eq!(
            FileFormat::from_path(Path::new("data/sales.csv")),
            Some(FileFormat::Csv)
        );
        assert_eq!(FileFormat::from_path(Path::new("notes")), None);
        assert_eq!(FileFormat::from_path(Path::new("a.parquet")), None);
    }

    #[test]
    fn test_args_parse_defaults() {
        let args = Args::parse_from(["datadash"]);
        assert!(args.path.is_none());
        assert!(!args.no_preview);
        assert!(!args.generate_config);
    }

    #[test]
    fn test_args_parse_flags() {
        let args = Args::parse_from([
            "datadash",
            "book.xlsx",
            "--sheet",
            "Q3",
            "--top-n",
            "6",
            "--no-preview",
        ]);
        assert_eq!(args.path, Some(PathBuf::from("book.xlsx")));
        assert_eq!(args.sheet.as_deref(), Some("Q3"));
        assert_eq!(args.top_n, Some(6));
        assert!(args.no_preview);
    }

    #[test]
    fn test_force_requires_generate_config() {
        assert!(Args::try_parse_from(["datadash", "--force"]).is_err());
        assert!(Args::try_parse_from(["datadash", "--generate-config", "--force"]).is_ok());
    }

    #[test]
    fn test_command_is_valid() {
        Args::command().debug_assert();
    }
}
