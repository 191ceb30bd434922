//! Model cache and argument helpers for a wrapper around Marian's `evaluate`
//! command.
//!
//! [`ModelStore::resolve`] turns a known metric name into a checkpoint and
//! vocabulary on local disk, downloading and unpacking the model archive the
//! first time. [`CliOptions`] renders keyword options into the `--flag value`
//! form the engine expects.

pub mod core;
pub mod models;

pub use crate::core::{kwargs_to_cli, setup_logging, CliOptions, OptionValue, Settings};
pub use crate::models::{
    known_models, maybe_download_file, maybe_extract, KnownModel, ModelError, ModelFiles,
    ModelKind, ModelStatus, ModelStore,
};
