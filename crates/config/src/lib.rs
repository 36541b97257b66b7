//! Layered configuration.
//!
//! Values are merged, later layers winning:
//!
//! 1. built-in defaults rooted in the platform data directory,
//! 2. `hoard.toml`, `hoard.yaml` and `hoard.json` in the platform config
//!    directory (each optional),
//! 3. an explicitly requested file (must exist; format from its extension),
//! 4. `HOARD_` environment variables, nested with `__`
//!    (`HOARD_BACKUP__MAX_AUTOMATIC=5`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::{OptionExt, ResultExt};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use hoard_compress::Compression;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APPLICATION: &str = "hoard";
const ENV_PREFIX: &str = "HOARD_";
/// Every optional data category in the legacy flag layout.
const ALL_FLAGS: u32 = 0x1F;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub stores: StoresConfig,
    pub backup: BackupConfig,
    /// JSON file holding the host application's preferences.
    pub preferences: PathBuf,
}

/// Locations of the two library databases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoresConfig {
    pub manga: PathBuf,
    pub anime: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupConfig {
    /// Root of the snapshot backend. Automatic snapshots go to `automatic/` below it.
    pub directory: PathBuf,
    /// How many automatic snapshots to keep, including the newest one.
    pub max_automatic: u32,
    pub compression: Compression,
    /// Default capture flags (legacy bit layout).
    pub flags: u32,
}

impl Config {
    /// Defaults with every path below `base`.
    pub fn defaults_in(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        Self {
            stores: StoresConfig { manga: base.join("manga.db"), anime: base.join("anime.db") },
            backup: BackupConfig {
                directory: base.join("snapshots"),
                max_automatic: 2,
                compression: Compression::Gzip,
                flags: ALL_FLAGS,
            },
            preferences: base.join("preferences.json"),
        }
    }

    /// Load the configuration from every layer.
    ///
    /// `explicit` names an additional config file that must exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let dirs = ProjectDirs::from("", "", APPLICATION).ok_or_raise(|| ErrorKind::NoProjectDirs)?;
        let figment = Self::figment(dirs.data_dir(), dirs.config_dir(), explicit)?;
        Self::from_figment(&figment)
    }

    /// Build the layered provider without extracting it.
    pub fn figment(data_dir: &Path, config_dir: &Path, explicit: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Self::defaults_in(data_dir)))
            .merge(Toml::file(config_dir.join("hoard.toml")))
            .merge(Yaml::file(config_dir.join("hoard.yaml")))
            .merge(Json::file(config_dir.join("hoard.json")));
        if let Some(path) = explicit {
            if !path.is_file() {
                exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
            }
            tracing::debug!(path = %path.display(), "merging explicit config file");
            figment = match path.extension().and_then(|ext| ext.to_str()) {
                Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path)),
                Some("json") => figment.merge(Json::file_exact(path)),
                _ => figment.merge(Toml::file_exact(path)),
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Extract and validate a configuration from a provider.
    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Extract)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.backup.max_automatic == 0 {
            exn::bail!(ErrorKind::Invalid("backup.max_automatic must be at least 1".to_string()));
        }
        if !self.backup.directory.is_absolute() {
            exn::bail!(ErrorKind::Invalid(format!(
                "backup.directory must be absolute, got {}",
                self.backup.directory.display()
            )));
        }
        if self.backup.flags & !ALL_FLAGS != 0 {
            tracing::warn!(flags = self.backup.flags, "ignoring unknown capture flag bits");
        }
        Ok(())
    }
}
