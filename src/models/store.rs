use std::{
    fs,
    path::{Path, PathBuf},
};

use reqwest::blocking::Client;
use serde::Serialize;

use crate::core::settings::Settings;

use super::{
    download::{maybe_download_file, BarProgress, DownloadProgress},
    error::{IoContext, ModelError, ModelResult},
    extract::maybe_extract,
    registry::{self, KnownModel},
    sentinel,
};

pub const CHECKPOINT_PATTERN: (&str, &str) = ("model", ".npz");
pub const VOCAB_PATTERN: (&str, &str) = ("vocab", ".spm");

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelFiles {
    pub checkpoint: PathBuf,
    pub vocab: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ModelStatus {
    NotCached,
    Downloaded,
    Ready,
}

/// Local cache of metric checkpoints, laid out as
/// `<root>/<name>.tgz`, `<root>/<name>.tgz._OK`, `<root>/<name>/._EXTRACT_OK`.
pub struct ModelStore {
    root: PathBuf,
    base_url: String,
    client: Client,
}

impl ModelStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> ModelResult<Self> {
        let base_url = base_url.into();
        let client = Client::builder()
            .build()
            .map_err(|source| ModelError::Http {
                url: base_url.clone(),
                source,
            })?;
        Ok(Self {
            root: root.into(),
            base_url,
            client,
        })
    }

    pub fn from_settings(settings: &Settings) -> ModelResult<Self> {
        Self::new(settings.cache_dir.clone(), settings.base_url.clone())
    }

    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn known_models(&self) -> &'static [KnownModel] {
        registry::known_models()
    }

    /// Resolves `name` to its checkpoint and vocabulary, fetching and unpacking
    /// the archive on first use.
    pub fn resolve(&self, name: &str) -> ModelResult<ModelFiles> {
        self.resolve_with_progress(name, &mut BarProgress::new())
    }

    pub fn resolve_with_progress(
        &self,
        name: &str,
        progress: &mut dyn DownloadProgress,
    ) -> ModelResult<ModelFiles> {
        let model = registry::lookup(name)?;
        let url = model.url(&self.base_url);
        let local_file = self.archive_path(model);
        let local_dir = self.model_dir(model);

        maybe_download_file(&self.client, &url, &local_file, progress)?;
        maybe_extract(&local_file, &local_dir)?;
        locate_files(&local_dir)
    }

    pub fn status(&self, name: &str) -> ModelResult<ModelStatus> {
        let model = registry::lookup(name)?;
        let dir = self.model_dir(model);
        if dir.is_dir() && sentinel::extract_flag(&dir).exists() {
            return Ok(ModelStatus::Ready);
        }
        let archive = self.archive_path(model);
        if archive.exists() && sentinel::download_flag(&archive).exists() {
            return Ok(ModelStatus::Downloaded);
        }
        Ok(ModelStatus::NotCached)
    }

    /// Known models whose extracted directory is committed.
    pub fn cached_models(&self) -> Vec<&'static KnownModel> {
        registry::known_models()
            .iter()
            .filter(|model| matches!(self.status(model.name), Ok(ModelStatus::Ready)))
            .collect()
    }

    fn archive_path(&self, model: &KnownModel) -> PathBuf {
        self.root.join(model.archive_name())
    }

    fn model_dir(&self, model: &KnownModel) -> PathBuf {
        self.root.join(model.name)
    }
}

/// Finds the single `model*.npz` and single `vocab*.spm` in `dir`.
pub fn locate_files(dir: &Path) -> ModelResult<ModelFiles> {
    let checkpoint = find_unique(dir, CHECKPOINT_PATTERN, "model*.npz")?;
    let vocab = find_unique(dir, VOCAB_PATTERN, "vocab*.spm")?;
    Ok(ModelFiles { checkpoint, vocab })
}

fn find_unique(
    dir: &Path,
    (prefix, suffix): (&str, &str),
    label: &'static str,
) -> ModelResult<PathBuf> {
    let mut matches = Vec::new();
    for entry in fs::read_dir(dir).io_context("read model directory", dir)? {
        let entry = entry.io_context("read model directory entry in", dir)?;
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        if name.len() >= prefix.len() + suffix.len()
            && name.starts_with(prefix)
            && name.ends_with(suffix)
        {
            matches.push(entry.path());
        }
    }

    if matches.len() != 1 {
        return Err(ModelError::Integrity {
            dir: dir.to_path_buf(),
            pattern: label,
            found: matches.len(),
        });
    }
    Ok(matches.remove(0))
}
