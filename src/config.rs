//! Where the tasks live, resolved from flags, environment and the config file.
//!
//! The optional config file is JSON at `<config_dir>/worktask/config.json`:
//!
//! ```json
//! { "api_url": "http://localhost:5000/api", "tracker": "Jira", "timeout_secs": 30 }
//! ```
//!
//! Command-line flags (and their env vars) beat the file, which beats the
//! built-in defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::db::connection;
use crate::error::{Result, WorktaskError};
use crate::import::DEFAULT_TRACKER;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const CONFIG_DIR: &str = "worktask";
const CONFIG_FILE: &str = "config.json";

/// Contents of the config file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub api_url: Option<String>,
    pub database: Option<PathBuf>,
    pub tracker: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Values given on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub api_url: Option<String>,
    pub db: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Http { base_url: String, timeout: Duration },
    Sqlite { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub backend: Backend,
    pub tracker: String,
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR).join(CONFIG_FILE))
}

pub fn load_file(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path).map_err(|e| {
        WorktaskError::config(format!("Cannot read config {}: {e}", path.display()))
    })?;
    serde_json::from_str(&raw)
        .map_err(|e| WorktaskError::config(format!("Invalid config {}: {e}", path.display())))
}

impl Settings {
    /// Resolve settings. An explicitly named config file must exist; the
    /// default one is optional.
    pub fn resolve(overrides: &Overrides) -> Result<Self> {
        let file = match &overrides.config {
            Some(path) => load_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => load_file(&path)?,
                _ => FileConfig::default(),
            },
        };
        Self::merge(overrides, file)
    }

    /// Apply precedence: flag or env, then file, then defaults.
    ///
    /// An explicit `--db` wins over an `api_url` that only comes from the
    /// file, so a local database can always be forced from the command line.
    pub fn merge(overrides: &Overrides, file: FileConfig) -> Result<Self> {
        let tracker = file
            .tracker
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TRACKER.to_string());
        let timeout = Duration::from_secs(file.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));

        let flag_url = non_blank(overrides.api_url.as_deref());
        let file_url = non_blank(file.api_url.as_deref());

        let backend = match (flag_url, &overrides.db, file_url) {
            (Some(url), _, _) => Backend::Http { base_url: url, timeout },
            (None, Some(path), _) => Backend::Sqlite { path: path.clone() },
            (None, None, Some(url)) => Backend::Http { base_url: url, timeout },
            (None, None, None) => Backend::Sqlite {
                path: match file.database {
                    Some(path) => path,
                    None => connection::default_db_path()?,
                },
            },
        };
        if let Backend::Http { base_url, .. } = &backend {
            if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                return Err(WorktaskError::config(format!(
                    "API URL must start with http:// or https://: {base_url}"
                )));
            }
        }

        debug!(?backend, %tracker, "resolved settings");
        Ok(Self { backend, tracker })
    }
}

fn non_blank(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn overrides() -> Overrides {
        Overrides::default()
    }

    #[test]
    fn test_flag_url_beats_file() {
        let o = Overrides {
            api_url: Some("http://flag/api".into()),
            ..overrides()
        };
        let file = FileConfig {
            api_url: Some("http://file/api".into()),
            timeout_secs: Some(5),
            ..Default::default()
        };
        let s = Settings::merge(&o, file).unwrap();
        assert_eq!(
            s.backend,
            Backend::Http {
                base_url: "http://flag/api".into(),
                timeout: Duration::from_secs(5)
            }
        );
        assert_eq!(s.tracker, "Jira");
    }

    #[test]
    fn test_db_flag_beats_file_url() {
        let o = Overrides {
            db: Some(PathBuf::from("/tmp/x.db")),
            ..overrides()
        };
        let file = FileConfig {
            api_url: Some("http://file/api".into()),
            tracker: Some("Linear".into()),
            ..Default::default()
        };
        let s = Settings::merge(&o, file).unwrap();
        assert_eq!(s.backend, Backend::Sqlite { path: "/tmp/x.db".into() });
        assert_eq!(s.tracker, "Linear");
    }

    #[test]
    fn test_file_database_used_without_flags() {
        let file = FileConfig {
            database: Some("/data/tasks.db".into()),
            ..Default::default()
        };
        let s = Settings::merge(&overrides(), file).unwrap();
        assert_eq!(s.backend, Backend::Sqlite { path: "/data/tasks.db".into() });
    }

    #[test]
    fn test_blank_url_falls_through() {
        let o = Overrides {
            api_url: Some("  ".into()),
            db: Some("/tmp/y.db".into()),
            ..overrides()
        };
        let s = Settings::merge(&o, FileConfig::default()).unwrap();
        assert!(matches!(s.backend, Backend::Sqlite { .. }));
    }

    #[test]
    fn test_bad_scheme_rejected() {
        let o = Overrides {
            api_url: Some("localhost:5000".into()),
            ..overrides()
        };
        let err = Settings::merge(&o, FileConfig::default()).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigError);
    }

    #[test]
    fn test_load_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert_eq!(load_file(&missing).unwrap_err().code, ErrorCode::ConfigError);

        let bad = dir.path().join("bad.json");
        fs::write(&bad, r#"{"api_url": 3}"#).unwrap();
        assert_eq!(load_file(&bad).unwrap_err().code, ErrorCode::ConfigError);

        let good = dir.path().join("good.json");
        fs::write(&good, r#"{"tracker": "GitHub", "timeout_secs": 10}"#).unwrap();
        let cfg = load_file(&good).unwrap();
        assert_eq!(cfg.tracker.as_deref(), Some("GitHub"));
        assert_eq!(cfg.timeout_secs, Some(10));
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let o = Overrides {
            config: Some("/definitely/not/here.json".into()),
            ..overrides()
        };
        assert_eq!(Settings::resolve(&o).unwrap_err().code, ErrorCode::ConfigError);
    }
}
