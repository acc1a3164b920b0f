//! Configuration loading and root folder resolution
//!
//! Settings are resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or unreadable TOML file never aborts startup; the resolver logs a
//! warning and falls through to the next source.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Primary environment variable naming the root folder
pub const ENV_ROOT_FOLDER: &str = "AREV_ROOT_FOLDER";

/// Fallback environment variable naming the root folder
pub const ENV_ROOT: &str = "AREV_ROOT";

/// File name of the comment database inside the root folder
pub const DATABASE_FILE_NAME: &str = "comments.db";

/// Default HTTP port for the review service
pub const DEFAULT_PORT: u16 = 5780;

/// Default request body limit for uploads (256 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;

/// Built-in defaults used when no other source provides a value
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub port: u16,
    pub bind_address: String,
    pub max_upload_bytes: usize,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl CompiledDefaults {
    /// Defaults for the platform this binary was compiled for
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
            port: DEFAULT_PORT,
            bind_address: "127.0.0.1".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            log_level: default_log_level(),
            log_file: None,
        }
    }
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/arev (or /var/lib/arev for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("arev"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/arev"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/arev
        dirs::data_dir()
            .map(|d| d.join("arev"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/arev"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\arev
        dirs::data_local_dir()
            .map(|d| d.join("arev"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\arev"))
    } else {
        PathBuf::from("./arev_data")
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Bootstrap configuration loaded from TOML
///
/// Every field is optional; absent values fall through to compiled defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Folder holding the comment database
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_folder: Option<PathBuf>,

    /// HTTP server port
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Address the HTTP server binds to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind_address: Option<String>,

    /// Maximum accepted request body for `/process` uploads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_upload_bytes: Option<usize>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl TomlConfig {
    /// Load and parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load the first config file found for `module_name`
    ///
    /// Returns `None` when no file exists or the first existing file fails to
    /// parse (logged as a warning).
    pub fn load_for_module(module_name: &str) -> Option<Self> {
        let path = config_file_candidates(module_name)
            .into_iter()
            .find(|p| p.exists())?;

        match Self::load(&path) {
            Ok(config) => {
                debug!("Loaded config file: {}", path.display());
                Some(config)
            }
            Err(e) => {
                warn!("Ignoring config file {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// Config file locations searched for a module, most specific first
///
/// `<config_dir>/arev/<module>.toml`, then `<config_dir>/arev/config.toml`,
/// then `/etc/arev/config.toml` on Linux.
pub fn config_file_candidates(module_name: &str) -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(dir) = dirs::config_dir() {
        let arev_dir = dir.join("arev");
        candidates.push(arev_dir.join(format!("{}.toml", module_name)));
        candidates.push(arev_dir.join("config.toml"));
    }

    if cfg!(target_os = "linux") {
        candidates.push(PathBuf::from("/etc/arev/config.toml"));
    }

    candidates
}

/// Resolves the root folder following CLI > env > TOML > default
pub struct RootFolderResolver {
    module_name: String,
    cli_override: Option<PathBuf>,
    toml: Option<TomlConfig>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_override: None,
            toml: None,
        }
    }

    /// Use a command-line supplied root folder (highest priority)
    pub fn with_cli_override(mut self, path: Option<PathBuf>) -> Self {
        self.cli_override = path;
        self
    }

    /// Use an already-loaded TOML config instead of searching for one
    pub fn with_toml(mut self, toml: Option<TomlConfig>) -> Self {
        self.toml = toml;
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_override {
            return path.clone();
        }

        for var in [ENV_ROOT_FOLDER, ENV_ROOT] {
            if let Ok(path) = std::env::var(var) {
                if !path.is_empty() {
                    return PathBuf::from(path);
                }
            }
        }

        let from_toml = match &self.toml {
            Some(config) => config.root_folder.clone(),
            None => TomlConfig::load_for_module(&self.module_name).and_then(|c| c.root_folder),
        };
        if let Some(path) = from_toml {
            return path;
        }

        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Creates the root folder and locates the database inside it
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    /// Create the root folder (and parents) if missing; idempotent
    pub fn ensure_directory_exists(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root_folder)?;
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE_NAME)
    }
}

/// Command-line values that take precedence over the TOML file
///
/// Values bound through clap's `env` attribute arrive here as well.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub root_folder: Option<PathBuf>,
    pub port: Option<u16>,
    pub bind_address: Option<String>,
}

/// Fully resolved settings for the review service
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub root_folder: PathBuf,
    pub port: u16,
    pub bind_address: String,
    pub max_upload_bytes: usize,
    pub logging: LoggingConfig,
}

impl ServiceSettings {
    /// Resolve settings for `module_name`, searching for its TOML file
    pub fn resolve(module_name: &str, cli: CliOverrides) -> Self {
        Self::resolve_with(module_name, cli, TomlConfig::load_for_module(module_name))
    }

    /// Resolve settings against an explicit (possibly absent) TOML config
    pub fn resolve_with(module_name: &str, cli: CliOverrides, toml: Option<TomlConfig>) -> Self {
        let defaults = CompiledDefaults::for_current_platform();
        let toml = toml.unwrap_or_default();

        let root_folder = RootFolderResolver::new(module_name)
            .with_cli_override(cli.root_folder)
            .with_toml(Some(toml.clone()))
            .resolve();

        Self {
            root_folder,
            port: cli.port.or(toml.port).unwrap_or(defaults.port),
            bind_address: cli
                .bind_address
                .or(toml.bind_address)
                .unwrap_or(defaults.bind_address),
            max_upload_bytes: toml.max_upload_bytes.unwrap_or(defaults.max_upload_bytes),
            logging: toml.logging,
        }
    }
}
