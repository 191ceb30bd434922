use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};

use crate::models::DEFAULT_BASE_URL;

const CONFIG_FILE: &str = "config.json";
const CACHE_SUBDIR: &str = "metric";
pub const ENV_CACHE: &str = "MARIAN_CACHE";
pub const ENV_BASE_URL: &str = "MARIAN_METRIC_BASE_URL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub cache_dir: PathBuf,
    pub base_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            base_url: DEFAULT_BASE_URL.into(),
        }
    }
}

impl Settings {
    /// Defaults, then `config.json` from the user config directory, then
    /// `MARIAN_CACHE` / `MARIAN_METRIC_BASE_URL`.
    pub fn load() -> Result<Self> {
        let path = resolve_config_path();
        let mut settings = load_settings(path.as_deref())?;
        settings.apply_overrides(|key| std::env::var(key).ok());
        Ok(settings)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let mut settings = load_settings(Some(path))?;
        settings.apply_overrides(|key| std::env::var(key).ok());
        Ok(settings)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup(ENV_CACHE).filter(|value| !value.is_empty()) {
            self.cache_dir = PathBuf::from(root).join(CACHE_SUBDIR);
        }
        if let Some(url) = lookup(ENV_BASE_URL).filter(|value| !value.is_empty()) {
            self.base_url = url;
        }
    }

    pub fn persist(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create dir {parent:?}"))?;
        }
        let serialized =
            serde_json::to_vec_pretty(self).context("serialize settings to json failed")?;
        fs::write(path, serialized).with_context(|| format!("write settings to {path:?}"))?;
        Ok(())
    }
}

fn default_cache_dir() -> PathBuf {
    BaseDirs::new()
        .map(|dirs| dirs.cache_dir().join("marian"))
        .unwrap_or_else(|| std::env::temp_dir().join("marian"))
        .join(CACHE_SUBDIR)
}

fn resolve_config_path() -> Option<PathBuf> {
    ProjectDirs::from("org", "Marian", "marian-metric-models")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let Some(path) = path.filter(|path| path.exists()) else {
        return Ok(Settings::default());
    };
    let bytes = fs::read(path).with_context(|| format!("failed reading {path:?}"))?;
    serde_json::from_slice(&bytes).context("config json could not be parsed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_metric_cache() {
        let settings = Settings::default();
        assert!(settings.cache_dir.ends_with("marian/metric"));
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_settings(Some(&dir.path().join("config.json"))).unwrap();
        assert_eq!(loaded, Settings::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"baseUrl": "http://mirror.local/metric"}"#).unwrap();
        let loaded = load_settings(Some(&path)).unwrap();
        assert_eq!(loaded.base_url, "http://mirror.local/metric");
        assert_eq!(loaded.cache_dir, Settings::default().cache_dir);
    }

    #[test]
    fn invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();
        assert!(load_settings(Some(&path)).is_err());
    }

    #[test]
    fn env_overrides_win() {
        let mut settings = Settings::default();
        settings.apply_overrides(|key| match key {
            ENV_CACHE => Some("/data/marian".into()),
            ENV_BASE_URL => Some("http://mirror.local".into()),
            _ => None,
        });
        assert_eq!(settings.cache_dir, PathBuf::from("/data/marian/metric"));
        assert_eq!(settings.base_url, "http://mirror.local");
    }

    #[test]
    fn persist_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.json");
        let settings = Settings {
            cache_dir: dir.path().join("cache"),
            base_url: "http://mirror.local".into(),
        };
        settings.persist(&path).unwrap();
        assert_eq!(load_settings(Some(&path)).unwrap(), settings);
    }
}
