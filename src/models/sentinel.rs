//! Empty marker files that commit a multi-step cache operation.
//!
//! A sentinel is always the last thing written. Its absence means the work it
//! guards is incomplete and must be redone from scratch.

use std::{
    ffi::OsString,
    fs::{self, OpenOptions},
    io,
    path::{Path, PathBuf},
};

use super::error::{IoContext, ModelResult};

pub const DOWNLOAD_SUFFIX: &str = "._OK";
pub const EXTRACT_FLAG: &str = "._EXTRACT_OK";

/// `<file>._OK`, next to the downloaded file.
#[must_use]
pub fn download_flag(file: &Path) -> PathBuf {
    let mut name = file
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(DOWNLOAD_SUFFIX);
    file.with_file_name(name)
}

/// `._EXTRACT_OK` inside the extracted directory.
#[must_use]
pub fn extract_flag(dir: &Path) -> PathBuf {
    dir.join(EXTRACT_FLAG)
}

pub fn touch(path: &Path) -> ModelResult<()> {
    OpenOptions::new()
        .create(true)
        .write(true)
        .open(path)
        .io_context("create sentinel", path)?;
    Ok(())
}

/// Removes a leftover sentinel so the work it guards reads as incomplete
/// until it is committed again.
pub fn clear(path: &Path) -> ModelResult<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!("Removed stale sentinel {}", path.display());
            Ok(())
        }
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(error) => Err(error).io_context("remove sentinel", path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_flag_appends_suffix_to_full_name() {
        let flag = download_flag(Path::new("/cache/comet20-da.tgz"));
        assert_eq!(flag, PathBuf::from("/cache/comet20-da.tgz._OK"));
    }

    #[test]
    fn touch_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let flag = extract_flag(dir.path());
        touch(&flag).unwrap();
        touch(&flag).unwrap();
        assert!(flag.exists());
        assert_eq!(std::fs::metadata(&flag).unwrap().len(), 0);
    }

    #[test]
    fn clear_removes_flag_and_ignores_absence() {
        let dir = tempfile::tempdir().unwrap();
        let flag = download_flag(&dir.path().join("bleurt20.tgz"));
        clear(&flag).unwrap();
        touch(&flag).unwrap();
        clear(&flag).unwrap();
        assert!(!flag.exists());
    }
}
