use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Locates `config.toml` under the platform config directory (or a directory
/// given explicitly) and writes the commented template there.
#[derive(Clone)]
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Use `config_dir` as is. Tests point this at a temporary directory.
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// `<platform config dir>/<app_name>`.
    pub fn new(app_name: &str) -> Result<Self> {
        let base = dirs::config_dir().ok_or_else(|| eyre!("No config directory on this platform"))?;
        Ok(Self::with_dir(base.join(app_name)))
    }

    pub fn config_path(&self, file_name: &str) -> PathBuf {
        self.config_dir.join(file_name)
    }

    /// Write the template to `config.toml`. An existing file is only replaced when
    /// `force` is set.
    pub fn write_default_config(&self, force: bool) -> Result<PathBuf> {
        let path = self.config_path(CONFIG_FILE);
        if path.exists() && !force {
            return Err(eyre!(
                "{} already exists; pass --force to replace it",
                path.display()
            ));
        }
        std::fs::create_dir_all(&self.config_dir)
            .wrap_err_with(|| format!("Could not create {}", self.config_dir.display()))?;
        std::fs::write(&path, DEFAULT_CONFIG_TEMPLATE)
            .wrap_err_with(|| format!("Could not write {}", path.display()))?;
        Ok(path)
    }
}

const CONFIG_FILE: &str = "config.toml";

/// Settings read from `config.toml`. Every field has a default, so any subset may be given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Template format; only `0.1.x` is accepted.
    pub version: String,
    pub file_loading: FileLoadingConfig,
    pub analysis: AnalysisConfig,
    pub chart: ChartConfig,
    pub prompt: PromptConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FileLoadingConfig {
    pub sheet: Option<String>,
    pub has_header: Option<bool>,
    pub delimiter: Option<char>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub head_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub default_top_n: usize,
    pub width: u32,
    pub height: u32,
    pub output_dir: Option<PathBuf>,
    pub preview: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromptConfig {
    pub max_attempts: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: "0.1".to_string(),
            file_loading: FileLoadingConfig::default(),
            analysis: AnalysisConfig::default(),
            chart: ChartConfig::default(),
            prompt: PromptConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self { head_rows: 5 }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            default_top_n: 4,
            width: 1200,
            height: 700,
            output_dir: None,
            preview: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl AppConfig {
    /// Defaults overlaid with the user's `config.toml`, validated.
    pub fn load(app_name: &str) -> Result<Self> {
        let config_manager = ConfigManager::new(app_name)?;
        Self::load_from(&config_manager)
    }

    /// Load from the `config.toml` managed by `config_manager`. A missing file yields
    /// the defaults; an unreadable or invalid one is an error.
    pub fn load_from(config_manager: &ConfigManager) -> Result<Self> {
        let mut config = AppConfig::default();
        if let Some(user_config) = Self::load_user_config(config_manager)? {
            config.merge(user_config);
        }
        config.validate()?;
        Ok(config)
    }

    fn load_user_config(config_manager: &ConfigManager) -> Result<Option<AppConfig>> {
        let path = config_manager.config_path(CONFIG_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path)
            .wrap_err_with(|| format!("Could not read {}", path.display()))?;
        let parsed = toml::from_str(&text)
            .wrap_err_with(|| format!("Invalid configuration in {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded user config");
        Ok(Some(parsed))
    }

    /// Overlay the values in `other` that differ from the defaults.
    pub fn merge(&mut self, other: AppConfig) {
        if other.version != AppConfig::default().version {
            self.version = other.version;
        }

        self.file_loading.merge(other.file_loading);
        self.analysis.merge(other.analysis);
        self.chart.merge(other.chart);
        self.prompt.merge(other.prompt);
        self.logging.merge(other.logging);
    }

    pub fn validate(&self) -> Result<()> {
        if !self.version.starts_with("0.1") {
            return Err(eyre!(
                "Unsupported config version: {}. Expected 0.1.x",
                self.version
            ));
        }

        if self.chart.default_top_n == 0 {
            return Err(eyre!("chart.default_top_n must be greater than 0"));
        }

        if self.chart.width < 200 || self.chart.height < 200 {
            return Err(eyre!(
                "chart.width and chart.height must be at least 200 pixels (got {}x{})",
                self.chart.width,
                self.chart.height
            ));
        }

        if self.prompt.max_attempts == Some(0) {
            return Err(eyre!("prompt.max_attempts must be greater than 0"));
        }

        if let Some(delimiter) = self.file_loading.delimiter {
            if !delimiter.is_ascii() {
                return Err(eyre!(
                    "file_loading.delimiter must be a single ASCII character, got '{}'",
                    delimiter
                ));
            }
        }

        match self.logging.level.to_ascii_lowercase().as_str() {
            "error" | "warn" | "info" | "debug" | "trace" | "off" => {}
            _ => {
                return Err(eyre!(
                    "Invalid logging.level: {}. Must be one of error, warn, info, debug, trace, off",
                    self.logging.level
                ))
            }
        }

        Ok(())
    }
}

impl FileLoadingConfig {
    pub fn merge(&mut self, other: Self) {
        if other.sheet.is_some() {
            self.sheet = other.sheet;
        }
        if other.has_header.is_some() {
            self.has_header = other.has_header;
        }
        if other.delimiter.is_some() {
            self.delimiter = other.delimiter;
        }
    }
}

impl AnalysisConfig {
    pub fn merge(&mut self, other: Self) {
        let default = AnalysisConfig::default();
        if other.head_rows != default.head_rows {
            self.head_rows = other.head_rows;
        }
    }
}

impl ChartConfig {
    pub fn merge(&mut self, other: Self) {
        let default = ChartConfig::default();
        if other.default_top_n != default.default_top_n {
            self.default_top_n = other.default_top_n;
        }
        if other.width != default.width {
            self.width = other.width;
        }
        if other.height != default.height {
            self.height = other.height;
        }
        if other.output_dir.is_some() {
            self.output_dir = other.output_dir;
        }
        if other.preview != default.preview {
            self.preview = other.preview;
        }
    }
}

impl PromptConfig {
    pub fn merge(&mut self, other: Self) {
        if other.max_attempts.is_some() {
            self.max_attempts = other.max_attempts;
        }
    }
}

impl LoggingConfig {
    pub fn merge(&mut self, other: Self) {
        let default = LoggingConfig::default();
        if other.level != default.level {
            self.level = other.level;
        }
    }
}

const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("../config/default.toml");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template_parses_to_defaults() {
        let parsed: AppConfig = toml::from_str(DEFAULT_CONFIG_TEMPLATE).unwrap();
        assert_eq!(parsed, AppConfig::default());
        parsed.validate().unwrap();
    }

    #[test]
    fn test_merge_prefers_other() {
        let mut base = AppConfig::default();
        let other: AppConfig = toml::from_str(
            r#"
            [chart]
            default_top_n = 6
            output_dir = "out"
            preview = false

            [file_loading]
            sheet = "Sales"
            "#,
        )
        .unwrap();
        base.merge(other);
        assert_eq!(base.chart.default_top_n, 6);
        assert_eq!(base.chart.output_dir, Some(PathBuf::from("out")));
        assert!(!base.chart.preview);
        assert_eq!(base.chart.width, 1200);
        assert_eq!(base.file_loading.sheet.as_deref(), Some("Sales"));
        assert_eq!(base.analysis.head_rows, 5);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.chart.default_top_n = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.prompt.max_attempts = Some(0);
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.version = "2.0".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_write_default_config_respects_force() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_dir(dir.path().join("datadash"));
        let path = manager.write_default_config(false).unwrap();
        assert!(path.exists());
        assert!(manager.write_default_config(false).is_err());
        assert!(manager.write_default_config(true).is_ok());
    }

    #[test]
    fn test_load_from_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_dir(dir.path().to_path_buf());
        assert_eq!(AppConfig::load_from(&manager).unwrap(), AppConfig::default());
    }
}
