//! Configuration file management for tutorplan.
//!
//! Provides a TOML-based config file at `~/.config/tutorplan/config.toml` and
//! a resolution chain: CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use tutorplan_core::plan::SectionSplit;
use tutorplan_core::plan::request::{DEFAULT_CAP_MINUTES, DEFAULT_WEEKS};
use tutorplan_db::config::DbConfig;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    #[serde(default)]
    pub planner: PlannerSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

/// Plan parameters used when a command or request leaves them out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerSection {
    pub weeks: i64,
    pub cap_per_week_minutes: f64,
    /// Fraction of the weekly cap given to Reading/Writing; Math gets the rest.
    pub rw_split: f64,
}

impl Default for PlannerSection {
    fn default() -> Self {
        Self {
            weeks: DEFAULT_WEEKS,
            cap_per_week_minutes: DEFAULT_CAP_MINUTES,
            rw_split: 0.5,
        }
    }
}

impl PlannerSection {
    pub fn split(&self) -> SectionSplit {
        SectionSplit::from_rw(self.rw_split)
    }
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the tutorplan config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/tutorplan` or
/// `~/.config/tutorplan`, never the platform-specific `dirs::config_dir()`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("tutorplan");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("tutorplan")
}

/// Return the path to the tutorplan config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    save_config_to(config, &config_path())
}

pub fn save_config_to(config: &ConfigFile, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    // The database URL may carry a password.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug, Clone)]
pub struct TutorplanConfig {
    pub db_config: DbConfig,
    pub planner: PlannerSection,
}

impl TutorplanConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - DB URL: `cli_db_url` > `TUTORPLAN_DATABASE_URL` env > `config_file.database.url` > `DbConfig::DEFAULT_URL`
    /// - Planner defaults: `config_file.planner` > built-in defaults
    pub fn resolve(cli_db_url: Option<&str>) -> Result<Self> {
        let file_config = match load_config() {
            Ok(cfg) => Some(cfg),
            Err(_) if !config_path().exists() => None,
            Err(e) => return Err(e),
        };
        Self::resolve_with(cli_db_url, file_config)
    }

    fn resolve_with(cli_db_url: Option<&str>, file_config: Option<ConfigFile>) -> Result<Self> {
        let db_url = if let Some(url) = cli_db_url {
            url.to_string()
        } else if let Ok(url) = std::env::var(DbConfig::ENV_VAR) {
            url
        } else if let Some(ref cfg) = file_config {
            cfg.database.url.clone()
        } else {
            DbConfig::DEFAULT_URL.to_string()
        };

        let planner = file_config.map(|c| c.planner).unwrap_or_default();
        if !planner.split().is_valid() {
            bail!(
                "planner.rw_split must be between 0.0 and 1.0, got {}",
                planner.rw_split
            );
        }

        Ok(Self {
            db_config: DbConfig::new(db_url),
            planner,
        })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
