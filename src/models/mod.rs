mod download;
mod error;
mod extract;
mod registry;
mod sentinel;
mod store;

pub use download::{
    maybe_download_file, BarProgress, DownloadOutcome, DownloadProgress, NoProgress,
};
pub use error::{ModelError, ModelResult};
pub use extract::{maybe_extract, ArchiveFormat};
pub use registry::{known_models, lookup, KnownModel, ModelKind, DEFAULT_BASE_URL};
pub use sentinel::{download_flag, extract_flag};
pub use store::{locate_files, ModelFiles, ModelStatus, ModelStore};
