use std::{
    fs::{self, File},
    io::{self, Read},
    path::{Path, PathBuf},
};

use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use tar::Archive;
use zip::read::ZipArchive;

use super::{
    error::{IoContext, ModelError, ModelResult},
    sentinel,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    TarBz2,
    Tar,
    Zip,
}

impl ArchiveFormat {
    pub fn detect(path: &Path) -> ModelResult<Self> {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if name.ends_with(".tgz") || name.ends_with(".tar.gz") {
            Ok(ArchiveFormat::TarGz)
        } else if name.ends_with(".tar.bz2") || name.ends_with(".tbz2") {
            Ok(ArchiveFormat::TarBz2)
        } else if name.ends_with(".tar") {
            Ok(ArchiveFormat::Tar)
        } else if name.ends_with(".zip") {
            Ok(ArchiveFormat::Zip)
        } else {
            Err(ModelError::UnsupportedArchive(path.to_path_buf()))
        }
    }
}

/// Unpacks `archive` next to `outdir` unless `outdir` already carries the
/// extraction sentinel. The archive's top-level folder must be named like
/// `outdir`; if it is not, nothing is committed and an error is returned.
pub fn maybe_extract(archive: &Path, outdir: &Path) -> ModelResult<PathBuf> {
    if !archive.exists() {
        return Err(ModelError::MissingArchive(archive.to_path_buf()));
    }
    let flag = sentinel::extract_flag(outdir);
    if outdir.exists() && flag.exists() {
        tracing::debug!("Already extracted: {}", outdir.display());
        return Ok(outdir.to_path_buf());
    }

    remove_stale(outdir);
    tracing::info!("Extracting {} to {}", archive.display(), outdir.display());

    let parent = outdir
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).io_context("create extraction directory", parent)?;
    extract_archive(archive, parent)?;

    if !outdir.is_dir() {
        return Err(ModelError::ArchiveLayout {
            archive: archive.to_path_buf(),
            expected: outdir.to_path_buf(),
        });
    }
    sentinel::touch(&flag)?;
    Ok(outdir.to_path_buf())
}

fn remove_stale(outdir: &Path) {
    match fs::remove_dir_all(outdir) {
        Ok(()) => tracing::debug!("Removed stale directory {}", outdir.display()),
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => {
            tracing::warn!("Failed to remove stale directory {}: {error}", outdir.display())
        }
    }
}

fn extract_archive(archive: &Path, destination: &Path) -> ModelResult<()> {
    let format = ArchiveFormat::detect(archive)?;
    let file = File::open(archive).io_context("open archive", archive)?;
    match format {
        ArchiveFormat::TarGz => extract_tar(archive, GzDecoder::new(file), destination),
        ArchiveFormat::TarBz2 => extract_tar(archive, BzDecoder::new(file), destination),
        ArchiveFormat::Tar => extract_tar(archive, file, destination),
        ArchiveFormat::Zip => extract_zip(archive, file, destination),
    }
}

fn extract_tar<R: Read>(archive_path: &Path, reader: R, destination: &Path) -> ModelResult<()> {
    Archive::new(reader)
        .unpack(destination)
        .io_context("unpack tar archive", archive_path)
}

fn extract_zip(archive_path: &Path, file: File, destination: &Path) -> ModelResult<()> {
    let mut archive = ZipArchive::new(file)
        .map_err(io::Error::from)
        .io_context("open zip archive", archive_path)?;
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(io::Error::from)
            .io_context("read zip entry in", archive_path)?;
        let Some(relative) = entry.enclosed_name().map(Path::to_path_buf) else {
            tracing::warn!("Skipping unsafe zip entry {}", entry.name());
            continue;
        };
        let dest = destination.join(relative);
        if entry.is_dir() {
            fs::create_dir_all(&dest).io_context("create zip dir", &dest)?;
        } else {
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).io_context("create zip file parent", parent)?;
            }
            let mut outfile = File::create(&dest).io_context("create zip file", &dest)?;
            io::copy(&mut entry, &mut outfile).io_context("write zip file", &dest)?;
        }
    }
    Ok(())
}
