use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::{AppConfig, StoreConfig};

/// Error type for config I/O
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config.toml: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("{0} already exists")]
    AlreadyExists(PathBuf),
}

/// `$XDG_CONFIG_HOME/planner/config.toml` or the platform equivalent
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("planner"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("config.toml")
}

/// Read the config. A missing file yields the defaults.
pub fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let text = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(toml::from_str(&text)?)
}

const CONFIG_TEMPLATE: &str = r##"# planner configuration

[store]
backend = "file"
path = '{data_path}'

# Talk to a JSON API instead:
# backend = "http"
# base_url = "http://localhost:8080/api"
# timeout_secs = 10

[ui]
show_key_hints = true
# kitty_keyboard = false          # Ctrl+Enter needs it in most terminals
#
# [ui.colors]
# background = "#0C001B"
# text = "#A09BFE"
# text_bright = "#FFFFFF"
# highlight = "#FB4196"
# dim = "#5A5580"
# red = "#FF4444"
# green = "#44FF88"
# pending = "#FFD700"

[log]
level = "info"
# file = "/tmp/planner.log"
"##;

/// The commented config `init` writes
pub fn default_config_text() -> String {
    let data_path = match AppConfig::default().store {
        StoreConfig::File { path } => path,
        StoreConfig::Http { .. } => PathBuf::from("planner.json"),
    };
    CONFIG_TEMPLATE.replace("{data_path}", &data_path.display().to_string())
}

/// Write a fresh commented config. Refuses to overwrite unless `force`.
pub fn write_default_config(path: &Path, force: bool) -> Result<AppConfig, ConfigError> {
    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists(path.to_path_buf()));
    }
    let text = default_config_text();
    let config: AppConfig = toml::from_str(&text)?;
    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        fs::create_dir_all(dir).map_err(|e| ConfigError::WriteError {
            path: dir.to_path_buf(),
            source: e,
        })?;
    }
    fs::write(path, text).map_err(|e| ConfigError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StoreConfig;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = read_config(&tmp.path().join("config.toml")).unwrap();
        assert!(config.ui.show_key_hints);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn http_backend_parses() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            r#"[store]
backend = "http"
base_url = "http://localhost:8080/api"

[ui]
kitty_keyboard = false

[log]
level = "planner::sync=debug"
"#,
        )
        .unwrap();
        let config = read_config(&path).unwrap();
        assert_eq!(
            config.store,
            StoreConfig::Http {
                base_url: "http://localhost:8080/api".into(),
                timeout_secs: 10,
            }
        );
        assert_eq!(config.ui.kitty_keyboard, Some(false));
        assert_eq!(config.log.level, "planner::sync=debug");
    }

    #[test]
    fn default_config_round_trips_and_is_not_overwritten() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("config.toml");
        let written = write_default_config(&path, false).unwrap();
        let read = read_config(&path).unwrap();
        assert_eq!(read.store, written.store);
        assert_eq!(read.store, AppConfig::default().store);
        assert!(read.ui.show_key_hints);
        assert!(matches!(
            write_default_config(&path, false),
            Err(ConfigError::AlreadyExists(_))
        ));
        assert!(write_default_config(&path, true).is_ok());
    }
}
