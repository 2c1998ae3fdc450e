//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use lg_core::ChartParams;
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the lodging log database.
    pub database_path: PathBuf,
    /// Directory that relative output paths resolve against.
    pub output_dir: PathBuf,
    /// Chart sizes.
    #[serde(default)]
    pub chart: ChartParams,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("output_dir", &self.output_dir)
            .field("chart.cell_size", &self.chart.cell_size)
            .finish_non_exhaustive()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("lodging.db"),
            output_dir: PathBuf::from("."),
            chart: ChartParams::default(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // LG_DATABASE_PATH, LG_OUTPUT_DIR, LG_CHART__CELL_SIZE, ...
        figment = figment.merge(Env::prefixed("LG_").split("__"));

        figment.extract()
    }

    /// Resolves an output path against `output_dir`. Absolute paths are kept.
    #[must_use]
    pub fn output_path(&self, path: &Path) -> PathBuf {
        self.output_dir.join(path)
    }
}

/// Returns the platform-specific config directory for lg.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("lg"))
}

/// Returns the platform-specific data directory for lg.
///
/// On Linux: `~/.local/share/lg`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("lg"))
}
