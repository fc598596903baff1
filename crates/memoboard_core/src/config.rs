//! Application configuration and persisted UI preferences.
//!
//! Loads settings from a TOML file at `~/.memoboard/config.toml`. Every field
//! has a default, so a missing or partial file still yields a usable config.

use crate::model::memo::{MemoColor, OwnerId};
use crate::repo::change_feed::DEFAULT_CHANNEL_CAPACITY;
use crate::search::display::SortKey;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const CONFIG_DIR_NAME: &str = ".memoboard";
const CONFIG_FILE_NAME: &str = "config.toml";
const PREFERENCES_FILE_NAME: &str = "preferences.toml";

/// Configuration load/save error.
#[derive(Debug)]
pub enum ConfigError {
    NotFound(PathBuf),
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    Serialize(toml::ser::Error),
    /// A value parsed as TOML but is not meaningful.
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "configuration file not found: {}", path.display()),
            Self::Io { path, source } => write!(f, "failed to access {}: {source}", path.display()),
            Self::Parse { path, source } => {
                write!(f, "failed to parse {}: {source}", path.display())
            }
            Self::Serialize(err) => write!(f, "failed to serialize configuration: {err}"),
            Self::Invalid(message) => write!(f, "invalid configuration: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Serialize(err) => Some(err),
            Self::NotFound(_) | Self::Invalid(_) => None,
        }
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(value: toml::ser::Error) -> Self {
        Self::Serialize(value)
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Data directory (defaults to ~/.memoboard)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Database file name inside `data_dir`
    #[serde(default = "default_database_file")]
    pub database_file: String,

    /// Signed-in user; `None` until `init` runs
    #[serde(default)]
    pub owner: Option<OwnerId>,

    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub realtime: RealtimeConfig,

    #[serde(default)]
    pub board: BoardConfig,
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|p| p.join(CONFIG_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(CONFIG_DIR_NAME))
}

fn default_database_file() -> String {
    "memoboard.sqlite3".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            database_file: default_database_file(),
            owner: None,
            log: LogConfig::default(),
            realtime: RealtimeConfig::default(),
            board: BoardConfig::default(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// `trace|debug|info|warn|error`; build default when unset
    #[serde(default)]
    pub level: Option<String>,

    /// Log directory; `<data_dir>/logs` when unset
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Realtime channel configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Undelivered events buffered per subscriber before it lags
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

/// Board defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    #[serde(default)]
    pub default_sort: SortKey,

    /// Palette name or `#RRGGBB` used for new memos
    #[serde(default = "default_color_name")]
    pub default_color: String,
}

fn default_color_name() -> String {
    "yellow".to_string()
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            default_sort: SortKey::default(),
            default_color: default_color_name(),
        }
    }
}

impl BoardConfig {
    /// Parses `default_color`.
    pub fn color(&self) -> Result<MemoColor, ConfigError> {
        self.default_color
            .parse()
            .map_err(|err| ConfigError::Invalid(format!("board.default_color: {err}")))
    }
}

impl AppConfig {
    /// Load configuration from a TOML file. `~` is expanded.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = expand_path(path.as_ref());
        if !path.exists() {
            return Err(ConfigError::NotFound(path));
        }

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Load configuration, falling back to defaults only when the file is absent.
    ///
    /// Unreadable or malformed files are errors so callers never persist
    /// defaults over a user's file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        match Self::from_file(path) {
            Err(ConfigError::NotFound(_)) => Ok(Self::default()),
            other => other,
        }
    }

    /// Load configuration, falling back to defaults on any error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::from_file(path).unwrap_or_default()
    }

    /// Writes this configuration as pretty TOML, creating parent directories.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        write_file(&expand_path(path.as_ref()), &content)
    }

    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|p| p.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Data directory with `~` expanded.
    pub fn data_dir(&self) -> PathBuf {
        expand_path(&self.data_dir)
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir().join(&self.database_file)
    }

    pub fn log_dir(&self) -> PathBuf {
        match self.log.dir.as_deref() {
            Some(dir) => expand_path(dir),
            None => self.data_dir().join("logs"),
        }
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.data_dir().join(PREFERENCES_FILE_NAME)
    }
}

/// UI preferences kept next to the database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub dark_mode: bool,
}

impl Preferences {
    /// Reads preferences; a missing file yields defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        write_file(path.as_ref(), &content)
    }
}

/// Expands a leading `~` to the home directory.
pub fn expand_path(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

fn write_file(path: &Path, content: &str) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
