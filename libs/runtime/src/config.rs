use anyhow::{bail, Context, Result};
use listing_query_core::FieldOptions;
use listing_query_engine::PaginationConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::home_dir::resolve_home_dir;

/// Logging section that catches every target without its own section.
pub const DEFAULT_SECTION: &str = "default";

const DEFAULT_SUBDIR: &str = ".listing-query";

/// Application configuration: home dir, logging, the pagination clamp and
/// optionally the field rules of the listing being served.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Normalized to an absolute path on load. Empty selects `~/.listing-query`.
    #[serde(default)]
    pub home_dir: String,
    pub logging: Option<LoggingConfig>,
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub fields: Option<FieldOptions>,
}

/// Target prefix (e.g. `"listing_query_engine"`) → section. The
/// [`DEFAULT_SECTION`] key is the catch-all.
pub type LoggingConfig = HashMap<String, Section>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Section {
    pub console_level: String, // "info", "debug", "off", ...
    /// Empty disables file output for this section.
    pub file: String,
    pub file_level: String,
    /// Rotated files kept besides the active one.
    pub max_backups: Option<usize>,
    pub max_size_mb: Option<u64>,
}

pub fn default_logging_config() -> LoggingConfig {
    let mut logging = HashMap::new();
    logging.insert(
        DEFAULT_SECTION.to_string(),
        Section {
            console_level: "info".to_string(),
            file: "logs/listing-query.log".to_string(),
            file_level: "debug".to_string(),
            max_backups: Some(3),
            max_size_mb: Some(100),
        },
    );
    logging
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            home_dir: String::new(),
            logging: Some(default_logging_config()),
            pagination: PaginationConfig::default(),
            fields: None,
        }
    }
}

impl AppConfig {
    /// Defaults → YAML file → `APP__` environment (`APP__PAGINATION__MAX_LIMIT=50`).
    /// Normalizes `home_dir`, repairs the pagination clamp and validates field rules.
    pub fn load_layered<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        use figment::{
            providers::{Env, Format, Serialized, Yaml},
            Figment,
        };

        let path = config_path.as_ref();
        if !path.is_file() {
            bail!("config file not found: {}", path.display());
        }

        // Optional sections stay None unless the file or env sets them.
        let base = AppConfig {
            logging: None,
            ..AppConfig::default()
        };

        let mut config: AppConfig = Figment::new()
            .merge(Serialized::defaults(base))
            .merge(Yaml::file(path))
            .merge(Env::prefixed("APP__").split("__"))
            .extract()
            .with_context(|| format!("failed to load config from {}", path.display()))?;

        config.finish().context("invalid configuration")?;
        Ok(config)
    }

    /// Load `config_path` if given, otherwise the built-in defaults.
    pub fn load_or_default<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_layered(path),
            None => {
                let mut c = Self::default();
                c.finish().context("invalid default configuration")?;
                Ok(c)
            }
        }
    }

    fn finish(&mut self) -> Result<()> {
        let raw = Some(self.home_dir.clone());
        let resolved = resolve_home_dir(raw, DEFAULT_SUBDIR, true)
            .context("failed to resolve home_dir")?;
        self.home_dir = resolved.to_string_lossy().into_owned();

        self.pagination = self.pagination.normalized();

        if let Some(fields) = &self.fields {
            fields.validate()?;
        }
        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("failed to serialize config to YAML")
    }

    /// `-v` raises the default console level to debug, `-vv` to trace.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        let level = match args.verbose {
            0 => return,
            1 => "debug",
            _ => "trace",
        };
        let logging = self.logging.get_or_insert_with(default_logging_config);
        logging
            .entry(DEFAULT_SECTION.to_string())
            .or_default()
            .console_level = level.to_string();
    }
}

#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config: Option<String>,
    pub print_config: bool,
    pub verbose: u8,
}
