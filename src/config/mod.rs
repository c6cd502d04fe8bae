use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigPathError {
    #[error("neither XDG_CONFIG_HOME nor HOME is set")]
    MissingHomeDirectory,
}

const APP_DIR: &str = "scope-hunter";
const APP_CONFIG_FILE: &str = "config.json";

/// Settings from `config.json`; every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HunterConfig {
    /// Quiet period before an automatic pass fires.
    pub debounce_ms: u64,
    pub poll_interval_ms: u64,
    /// Re-inspect whenever the selection moves.
    pub instant_scoper: bool,
    /// Report every selection instead of only the first.
    pub multiselect: bool,
    pub show_color_scheme_info: bool,
    /// Also report extents as line/character positions.
    pub extent_line_char: bool,
    /// Lift schemes whose darkest background is below this luminance.
    pub brightness_floor: Option<u8>,
    pub desktop_notifications: bool,
    /// Directories holding one sub-directory per package.
    pub package_roots: Vec<PathBuf>,
}

impl Default for HunterConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 120,
            poll_interval_ms: 500,
            instant_scoper: false,
            multiselect: false,
            show_color_scheme_info: true,
            extent_line_char: false,
            brightness_floor: None,
            desktop_notifications: false,
            package_roots: Vec::new(),
        }
    }
}

pub fn load_app_config() -> HunterConfig {
    let (xdg_config_home, home) = config_env_dirs();
    load_app_config_with(xdg_config_home.as_deref(), home.as_deref())
}

fn load_app_config_with(xdg_config_home: Option<&Path>, home: Option<&Path>) -> HunterConfig {
    let path = match app_config_path(APP_DIR, APP_CONFIG_FILE, xdg_config_home, home) {
        Ok(p) => p,
        Err(_) => return HunterConfig::default(),
    };
    if !path.exists() {
        return HunterConfig::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
            tracing::warn!(?err, ?path, "failed to parse config.json; using defaults");
            HunterConfig::default()
        }),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read config.json; using defaults");
            HunterConfig::default()
        }
    }
}

pub fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub fn app_config_path(
    app_dir: &str,
    file_name: &str,
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let mut path = config_root(xdg_config_home, home)?;
    path.push(app_dir);
    path.push(file_name);
    Ok(path)
}

fn config_root(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    if let Some(xdg) = xdg_config_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigPathError::MissingHomeDirectory)?;
    Ok(home.join(".config"))
}
