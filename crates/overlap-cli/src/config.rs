//! Configuration loading.
//!
//! Sources, later ones winning: built-in defaults, the TOML file passed with
//! `--config`, then `OVERLAP_*` environment variables with `__` separating
//! nested keys (e.g. `OVERLAP_PRORATION__HOURS_PER_DAY=7.5`).

use std::path::Path;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use overlap_engine::{ProrationConfig, SeverityPolicy};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Defaults and holidays used by `aggregate`.
    #[serde(default)]
    pub proration: ProrationConfig,
    /// Severity table used by `participants`.
    #[serde(default)]
    pub severity: SeverityPolicy,
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("OVERLAP_").split("__"));

        figment.extract()
    }
}
