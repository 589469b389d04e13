use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub youtrack: YouTrackConfig,
    #[serde(default)]
    pub export: ExportSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
pub struct YouTrackConfig {
    pub base_url: String,
    pub project: String,
    /// Usually left empty here and supplied through YOUTRACK_TOKEN instead,
    /// so the config file can be committed without the secret.
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct ExportSettings {
    #[serde(default = "default_export_root")]
    pub root: String,
    /// Issue numbers are zero-padded to this width so folders sort by
    /// sequence. Raise it before a project passes 10^width issues.
    #[serde(default = "default_id_pad_width")]
    pub id_pad_width: usize,
    #[serde(default = "default_replace_spaces")]
    pub replace_spaces: bool,
    #[serde(default = "default_space_replacement")]
    pub space_replacement: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            root: default_export_root(),
            id_pad_width: default_id_pad_width(),
            replace_spaces: default_replace_spaces(),
            space_replacement: default_space_replacement(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub debug: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found at {path}. expected at $XDG_CONFIG_HOME/yt-export/config.toml or ~/.config/yt-export/config.toml")]
    MissingConfigFile { path: PathBuf },
    #[error("failed to resolve config path: HOME is not set and XDG_CONFIG_HOME is unset")]
    MissingHomeDirectory,
    #[error("failed to read config file at {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse TOML config at {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

pub fn load() -> Result<AppConfig, ConfigError> {
    let path = resolve_config_path()?;
    load_from(&path)
}

pub fn load_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let path = path.to_path_buf();
    let raw = std::fs::read_to_string(&path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ConfigError::MissingConfigFile { path: path.clone() }
        } else {
            ConfigError::ReadFailed {
                path: path.clone(),
                source,
            }
        }
    })?;

    let mut cfg = toml::from_str::<AppConfig>(&raw).map_err(|source| ConfigError::ParseFailed {
        path: path.clone(),
        source,
    })?;
    cfg.absorb_env_token(std::env::var("YOUTRACK_TOKEN").ok());
    cfg.validate()?;
    Ok(cfg)
}

pub fn resolve_config_path() -> Result<PathBuf, ConfigError> {
    let xdg_config_home = std::env::var_os("XDG_CONFIG_HOME");
    let home = std::env::var_os("HOME");
    resolve_config_path_from_env(xdg_config_home, home)
}

fn resolve_config_path_from_env(
    xdg_config_home: Option<OsString>,
    home: Option<OsString>,
) -> Result<PathBuf, ConfigError> {
    if let Some(dir) = xdg_config_home.filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(dir).join("yt-export").join("config.toml"));
    }

    let home = home
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::MissingHomeDirectory)?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("yt-export")
        .join("config.toml"))
}

impl AppConfig {
    /// A non-empty YOUTRACK_TOKEN from the environment wins over the TOML
    /// field.
    pub fn absorb_env_token(&mut self, env_token: Option<String>) {
        if let Some(token) = env_token.filter(|value| !value.trim().is_empty()) {
            self.youtrack.token = token;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.youtrack.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "youtrack.base_url must not be empty".into(),
            ));
        }
        if self.youtrack.project.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "youtrack.project must not be empty".into(),
            ));
        }
        if self.youtrack.token.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "youtrack.token must be set (or export YOUTRACK_TOKEN)".into(),
            ));
        }
        if self.export.root.trim().is_empty() {
            return Err(ConfigError::Invalid("export.root must not be empty".into()));
        }
        if self.export.id_pad_width == 0 {
            return Err(ConfigError::Invalid("export.id_pad_width must be > 0".into()));
        }

        Ok(())
    }
}

fn default_export_root() -> String {
    "exports".to_string()
}

const fn default_id_pad_width() -> usize {
    3
}

const fn default_replace_spaces() -> bool {
    true
}

fn default_space_replacement() -> String {
    "_".to_string()
}
