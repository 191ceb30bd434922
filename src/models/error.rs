use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown model {name}; known models: {known}")]
    UnknownModel { name: String, known: String },

    #[error("request {url}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("download {url} failed with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("expected exactly one {pattern} file in {}, found {found}", dir.display())]
    Integrity {
        dir: PathBuf,
        pattern: &'static str,
        found: usize,
    },

    #[error("{} does not exist", .0.display())]
    MissingArchive(PathBuf),

    #[error("archive {} did not unpack into {}", archive.display(), expected.display())]
    ArchiveLayout { archive: PathBuf, expected: PathBuf },

    #[error("unsupported archive format: {}", .0.display())]
    UnsupportedArchive(PathBuf),

    #[error("{context} {}", path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type ModelResult<T> = Result<T, ModelError>;

pub(crate) trait IoContext<T> {
    fn io_context(self, context: &'static str, path: impl Into<PathBuf>) -> ModelResult<T>;
}

impl<T> IoContext<T> for io::Result<T> {
    fn io_context(self, context: &'static str, path: impl Into<PathBuf>) -> ModelResult<T> {
        self.map_err(|source| ModelError::Io {
            context,
            path: path.into(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integrity_message_names_pattern_and_count() {
        let err = ModelError::Integrity {
            dir: PathBuf::from("/cache/bleurt20"),
            pattern: "model*.npz",
            found: 2,
        };
        assert_eq!(
            err.to_string(),
            "expected exactly one model*.npz file in /cache/bleurt20, found 2"
        );
    }

    #[test]
    fn io_context_wraps_source() {
        let result: io::Result<()> = Err(io::Error::new(io::ErrorKind::NotFound, "gone"));
        let err = result.io_context("open archive", "/tmp/x.tgz").unwrap_err();
        assert_eq!(err.to_string(), "open archive /tmp/x.tgz");
        assert!(std::error::Error::source(&err).is_some());
    }
}
