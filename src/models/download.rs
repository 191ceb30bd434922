use std::{
    fs::{self, File},
    io::{Read, Write},
    path::Path,
};

use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;

use super::{
    error::{IoContext, ModelError, ModelResult},
    sentinel,
};

const CHUNK_SIZE: usize = 32 * 1024;

/// Receives byte counts while a download streams to disk.
pub trait DownloadProgress {
    fn start(&mut self, total: Option<u64>);
    fn advance(&mut self, bytes: u64);
    fn finish(&mut self);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl DownloadProgress for NoProgress {
    fn start(&mut self, _total: Option<u64>) {}
    fn advance(&mut self, _bytes: u64) {}
    fn finish(&mut self) {}
}

/// Terminal progress bar; falls back to a spinner when the server sends no
/// `Content-Length`.
#[derive(Default)]
pub struct BarProgress {
    bar: Option<ProgressBar>,
}

impl BarProgress {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DownloadProgress for BarProgress {
    fn start(&mut self, total: Option<u64>) {
        let bar = match total {
            Some(total) if total > 0 => {
                let bar = ProgressBar::new(total);
                bar.set_style(
                    ProgressStyle::default_bar()
                        .template(
                            "Downloading [{bar:30.green}] {bytes:>10}/{total_bytes:<10} {bytes_per_sec} {eta}",
                        )
                        .progress_chars("=> "),
                );
                bar
            }
            _ => {
                let bar = ProgressBar::new_spinner();
                bar.set_style(
                    ProgressStyle::default_spinner()
                        .template("Downloading {spinner:.green} {bytes:>10} {bytes_per_sec}"),
                );
                bar
            }
        };
        self.bar = Some(bar);
    }

    fn advance(&mut self, bytes: u64) {
        if let Some(bar) = &self.bar {
            bar.inc(bytes);
        }
    }

    fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    Cached,
    Downloaded { bytes: u64 },
}

/// Downloads `url` to `local_file` unless a previous download already
/// completed. The `._OK` sentinel is written only after the whole body is on
/// disk, so an interrupted or failed download is redone on the next call.
pub fn maybe_download_file(
    client: &Client,
    url: &str,
    local_file: &Path,
    progress: &mut dyn DownloadProgress,
) -> ModelResult<DownloadOutcome> {
    let flag = sentinel::download_flag(local_file);
    if local_file.exists() && flag.exists() {
        tracing::info!("Using cached file {}", local_file.display());
        return Ok(DownloadOutcome::Cached);
    }

    sentinel::clear(&flag)?;
    tracing::info!("Downloading {url} to {}", local_file.display());
    if let Some(parent) = local_file.parent() {
        fs::create_dir_all(parent).io_context("create download directory", parent)?;
    }

    let bytes = download_to_file(client, url, local_file, progress)?;
    sentinel::touch(&flag)?;
    Ok(DownloadOutcome::Downloaded { bytes })
}

fn download_to_file(
    client: &Client,
    url: &str,
    path: &Path,
    progress: &mut dyn DownloadProgress,
) -> ModelResult<u64> {
    let mut response = client.get(url).send().map_err(|source| ModelError::Http {
        url: url.to_string(),
        source,
    })?;
    let status = response.status();
    if !status.is_success() {
        return Err(ModelError::HttpStatus {
            url: url.to_string(),
            status,
        });
    }

    let mut file = File::create(path).io_context("create download file", path)?;
    let mut downloaded = 0u64;
    let mut buffer = vec![0u8; CHUNK_SIZE];
    progress.start(response.content_length());
    loop {
        let read = match response.read(&mut buffer) {
            Ok(read) => read,
            Err(error) => {
                progress.finish();
                return Err(error).io_context("read download chunk from", path);
            }
        };
        if read == 0 {
            break;
        }
        if let Err(error) = file.write_all(&buffer[..read]) {
            progress.finish();
            return Err(error).io_context("write download chunk to", path);
        }
        downloaded += read as u64;
        progress.advance(read as u64);
    }
    progress.finish();

    file.sync_all().io_context("sync download file", path)?;
    tracing::debug!(bytes = downloaded, "Download complete: {}", path.display());
    Ok(downloaded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cached_file_skips_network() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("bleurt20.tgz");
        fs::write(&target, b"archive").unwrap();
        sentinel::touch(&sentinel::download_flag(&target)).unwrap();

        // Nothing listens on port 9; a request would fail.
        let client = Client::new();
        let outcome = maybe_download_file(
            &client,
            "http://127.0.0.1:9/bleurt20.tgz",
            &target,
            &mut NoProgress,
        )
        .unwrap();
        assert_eq!(outcome, DownloadOutcome::Cached);
    }

    #[test]
    fn file_without_sentinel_is_not_a_cache_hit() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("bleurt20.tgz");
        fs::write(&target, b"partial").unwrap();

        let client = Client::new();
        let err = maybe_download_file(
            &client,
            "http://127.0.0.1:9/bleurt20.tgz",
            &target,
            &mut NoProgress,
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::Http { .. }));
        assert!(!sentinel::download_flag(&target).exists());
    }

    #[test]
    fn bar_progress_tolerates_unknown_length() {
        let mut progress = BarProgress::new();
        progress.start(None);
        progress.advance(10);
        progress.finish();
        progress.finish();
    }
}
