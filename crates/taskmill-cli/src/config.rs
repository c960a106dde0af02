//! Configuration file management for taskmill.
//!
//! Provides a TOML-based config file at `~/.config/taskmill/config.toml` and
//! a resolution chain: `--config` flag > `TASKMILL_CONFIG` env var > default
//! path > empty config.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use taskmill_core::Params;

/// Env var naming an explicit config file.
pub const CONFIG_ENV: &str = "TASKMILL_CONFIG";

/// Env var overriding the extension manifest directory.
pub const EXTENSIONS_ENV: &str = "TASKMILL_EXTENSIONS_DIR";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Context values offered to every command.
    pub global: toml::Table,
    /// Context values for a single command, keyed by command name.
    pub commands: BTreeMap<String, toml::Table>,
    /// Plugin declarations: category -> name -> `module:attribute`.
    pub plugins: BTreeMap<String, BTreeMap<String, String>>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the taskmill config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/taskmill` or
/// `~/.config/taskmill`, also on macOS.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("taskmill");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("taskmill")
}

/// Return the default config file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Return the directory scanned for extension manifests.
pub fn extensions_dir() -> PathBuf {
    match std::env::var_os(EXTENSIONS_ENV) {
        Some(dir) => PathBuf::from(dir),
        None => config_dir().join("extensions.d"),
    }
}

/// Load and parse a config file. Returns an error if it does not exist.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug, Default)]
pub struct TaskmillConfig {
    /// The file the configuration was read from, if any.
    pub source: Option<PathBuf>,
    pub file: ConfigFile,
    pub extensions_dir: PathBuf,
}

impl TaskmillConfig {
    /// Resolve configuration using the chain: CLI flag > env var > default
    /// path > empty.
    ///
    /// An explicitly named file must exist; a missing default file just
    /// means an empty configuration.
    pub fn resolve(cli_path: Option<&Path>) -> Result<Self> {
        let explicit = cli_path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        let (source, file) = match explicit {
            Some(path) => {
                let file = load_config(&path)?;
                (Some(path), file)
            }
            None => {
                let path = config_path();
                if path.is_file() {
                    let file = load_config(&path)?;
                    (Some(path), file)
                } else {
                    tracing::debug!(path = %path.display(), "no config file, using defaults");
                    (None, ConfigFile::default())
                }
            }
        };

        Ok(Self {
            source,
            file,
            extensions_dir: extensions_dir(),
        })
    }

    /// Context for `command`: the `[global]` table overlaid with the
    /// command's own `[commands.<name>]` table.
    pub fn context_for(&self, command: &str) -> Result<Params> {
        let mut context = Params::from_toml(&self.file.global)
            .context("invalid value in [global] config section")?;
        if let Some(table) = self.file.commands.get(command) {
            let own = Params::from_toml(table)
                .with_context(|| format!("invalid value in [commands.{command}] config section"))?;
            context.extend(&own);
        }
        Ok(context)
    }

    /// Plugin declarations for `category` from the `[plugins.<category>]`
    /// table.
    pub fn plugins(&self, category: &str) -> Option<&BTreeMap<String, String>> {
        self.file.plugins.get(category)
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
