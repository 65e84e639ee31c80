//! Configuration loading and root folder resolution
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`MATHGEN_ROOT_FOLDER`)
//! 3. TOML config file (`root_folder` key)
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or unreadable TOML file is never fatal: a warning is logged and
//! compiled defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable overriding the root folder
pub const ENV_ROOT_FOLDER: &str = "MATHGEN_ROOT_FOLDER";
/// Environment variable overriding the remote base URL
pub const ENV_BASE_URL: &str = "MATHGEN_BASE_URL";
/// Environment variable overriding the fetch attempt ceiling
pub const ENV_MAX_FETCH_ATTEMPTS: &str = "MATHGEN_MAX_FETCH_ATTEMPTS";

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "mathgen.db";

/// Default Mathematics Genealogy Project host
pub const DEFAULT_BASE_URL: &str = "https://www.mathgenealogy.org";

/// Compiled defaults for the current platform
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
            log_level: "info".to_string(),
        }
    }
}

/// Logging section of the TOML config
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter level (overridden by RUST_LOG)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Remote record source settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the genealogy site (no trailing slash)
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// User-Agent header sent with every request
    pub user_agent: String,
    /// Maximum attempts for a single record fetch before giving up
    pub max_fetch_attempts: u32,
    /// First retry delay in milliseconds (doubled after each failure)
    pub initial_backoff_ms: u64,
    /// Upper bound for the retry delay in milliseconds
    pub max_backoff_ms: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            user_agent: format!("mathgen/{}", env!("CARGO_PKG_VERSION")),
            max_fetch_attempts: 5,
            initial_backoff_ms: 250,
            max_backoff_ms: 4000,
        }
    }
}

impl RemoteConfig {
    /// Apply `MATHGEN_BASE_URL` / `MATHGEN_MAX_FETCH_ATTEMPTS` on top of this config
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(url) = std::env::var(ENV_BASE_URL) {
            if !url.trim().is_empty() {
                self.base_url = url.trim().trim_end_matches('/').to_string();
            }
        }

        if let Ok(raw) = std::env::var(ENV_MAX_FETCH_ATTEMPTS) {
            let attempts: u32 = raw.trim().parse().map_err(|_| {
                Error::Config(format!(
                    "{} must be a positive integer, got {:?}",
                    ENV_MAX_FETCH_ATTEMPTS, raw
                ))
            })?;
            self.max_fetch_attempts = attempts;
        }

        self.validate()?;
        Ok(self)
    }

    /// Reject settings the sync engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.max_fetch_attempts == 0 {
            return Err(Error::Config(
                "max_fetch_attempts must be at least 1".to_string(),
            ));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "base_url must be an http(s) URL, got {:?}",
                self.base_url
            )));
        }
        Ok(())
    }
}

/// Contents of `<config dir>/mathgen/<module>.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub logging: LoggingConfig,
    pub remote: RemoteConfig,
}

/// Load a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Resolves the root folder and TOML config for a module
#[derive(Debug, Clone)]
pub struct RootFolderResolver {
    module_name: String,
    cli_override: Option<PathBuf>,
    config_file_override: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            cli_override: None,
            config_file_override: None,
        }
    }

    /// Root folder given on the command line (priority 1)
    pub fn with_cli_override(mut self, root_folder: Option<PathBuf>) -> Self {
        self.cli_override = root_folder;
        self
    }

    /// Explicit config file path instead of the platform location
    pub fn with_config_file(mut self, path: Option<PathBuf>) -> Self {
        self.config_file_override = path;
        self
    }

    /// Load the module's TOML config.
    ///
    /// No config file at all yields the defaults; an unreadable or malformed
    /// file is an error.
    pub fn try_load_config(&self) -> Result<TomlConfig> {
        let Some(path) = self.config_file_path() else {
            debug!(module = %self.module_name, "No config file found, using defaults");
            return Ok(TomlConfig::default());
        };

        let config = load_toml_config(&path)?;
        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Load the module's TOML config, falling back to defaults
    pub fn load_config(&self) -> TomlConfig {
        self.try_load_config().unwrap_or_else(|e| {
            warn!("{}; continuing with compiled defaults", e);
            TomlConfig::default()
        })
    }

    /// Resolve the root folder following the documented priority order
    pub fn resolve(&self) -> PathBuf {
        self.resolve_with_config(&self.load_config())
    }

    /// Same as [`resolve`](Self::resolve) with an already loaded config
    pub fn resolve_with_config(&self, config: &TomlConfig) -> PathBuf {
        if let Some(path) = &self.cli_override {
            return path.clone();
        }

        if let Ok(path) = std::env::var(ENV_ROOT_FOLDER) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        if let Some(root_folder) = &config.root_folder {
            return root_folder.clone();
        }

        CompiledDefaults::for_current_platform().root_folder
    }

    /// Config file location: explicit override, then user config, then /etc
    pub fn config_file_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config_file_override {
            return Some(path.clone());
        }

        let file_name = format!("{}.toml", self.module_name);
        let user_config = dirs::config_dir().map(|d| d.join("mathgen").join(&file_name));
        if let Some(path) = user_config {
            if path.exists() {
                return Some(path);
            }
        }

        if cfg!(unix) {
            let system_config = PathBuf::from("/etc/mathgen").join(&file_name);
            if system_config.exists() {
                return Some(system_config);
            }
        }

        None
    }
}

/// Prepares the resolved root folder
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    /// Create the root folder if missing (idempotent)
    pub fn ensure_directory_exists(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root_folder)?;
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE_NAME)
    }

    pub fn database_exists(&self) -> bool {
        self.database_path().exists()
    }
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "macos") {
        // ~/Library/Application Support/mathgen
        dirs::data_dir()
            .map(|d| d.join("mathgen"))
            .unwrap_or_else(|| PathBuf::from("./mathgen_data"))
    } else {
        // ~/.local/share/mathgen, %LOCALAPPDATA%\mathgen
        dirs::data_local_dir()
            .map(|d| d.join("mathgen"))
            .unwrap_or_else(|| PathBuf::from("./mathgen_data"))
    }
}
