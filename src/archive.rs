// src/archive.rs

//! Package archive reading
//!
//! A `.nupkg` is a zip archive carrying exactly one `.nuspec` manifest plus
//! the package payload. The reader pulls out everything the indexer needs in
//! one pass: the archive's byte length, its SHA-512 content hash, the raw
//! manifest bytes, and the framework folder names found under `lib/` (used
//! later to derive target-framework coverage).

use crate::error::{Error, Result};
use crate::hash::{self, HashAlgorithm};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::ZipArchive;

/// File extension for package archives
pub const ARCHIVE_EXTENSION: &str = "nupkg";

/// Path segment marking library content inside an archive
const LIB_MARKER: &str = "lib";

/// Everything extracted from one package archive
#[derive(Debug)]
pub struct ArchiveContents {
    /// Exact archive length in bytes
    pub size: u64,
    /// Base64-encoded digest over the whole archive stream
    pub hash: String,
    /// Algorithm that produced `hash`
    pub hash_algorithm: HashAlgorithm,
    /// Raw bytes of the embedded manifest document
    pub manifest: Vec<u8>,
    /// Framework folder names found under `lib/`, one per matching entry.
    /// Duplicates are kept; the normalizer joins them as-is.
    pub lib_folders: Vec<String>,
}

/// Read one package archive from disk
pub fn read_archive(path: &Path) -> Result<ArchiveContents> {
    let mut file = File::open(path)?;
    let (hash, size) = hash::hash_reader(HashAlgorithm::Sha512, &mut file)?;
    file.seek(SeekFrom::Start(0))?;

    let mut archive = ZipArchive::new(file).map_err(|source| Error::Zip {
        path: path.to_path_buf(),
        source,
    })?;

    let mut lib_folders = Vec::new();
    let mut manifest_name: Option<String> = None;
    for i in 0..archive.len() {
        let entry = archive.by_index_raw(i).map_err(|source| Error::Zip {
            path: path.to_path_buf(),
            source,
        })?;
        let name = entry.name().to_string();

        if let Some(folder) = lib_folder_name(&name) {
            lib_folders.push(folder.to_string());
        }

        // First manifest entry wins; a second one is ignored.
        if manifest_name.is_none() && name.ends_with(".nuspec") {
            manifest_name = Some(name);
        }
    }

    let manifest_name = manifest_name.ok_or_else(|| {
        Error::format(format!("no .nuspec manifest found in {}", path.display()))
    })?;

    let mut manifest = Vec::new();
    archive
        .by_name(&manifest_name)
        .map_err(|source| Error::Zip {
            path: path.to_path_buf(),
            source,
        })?
        .read_to_end(&mut manifest)?;

    debug!(
        archive = %path.display(),
        size,
        folders = lib_folders.len(),
        "read package archive"
    );

    Ok(ArchiveContents {
        size,
        hash,
        hash_algorithm: HashAlgorithm::Sha512,
        manifest,
        lib_folders,
    })
}

/// Framework folder name for an entry path, if the path goes through `lib/`
///
/// `lib/net461/Foo.dll` yields `net461`; paths without a `lib` segment, or
/// with nothing after it, yield `None`.
fn lib_folder_name(entry_path: &str) -> Option<&str> {
    let mut segments = entry_path.split('/');
    while let Some(segment) = segments.next() {
        if segment == LIB_MARKER {
            return segments.next().filter(|s| !s.is_empty());
        }
    }
    None
}

/// Enumerate package archives in a directory, sorted by file name
pub fn list_archives(directory: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(directory)? {
        let path = entry?.path();
        if path.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(ARCHIVE_EXTENSION))
        {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}
