//! Outer archive inspection

use crate::{Error, Result};
use std::fs::File;
use std::path::Path;
use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

/// Open the outer archive and return the names of every member that is
/// itself a zip archive (`.zip` suffix, case-insensitive), in the order
/// they are stored in the archive.
///
/// The archive handle is closed before this function returns.
pub fn inner_archives(path: &Path) -> Result<Vec<String>> {
    debug!("Looking for zip members inside {:?}", path);

    let file = File::open(path).map_err(|source| Error::ArchiveOpen {
        path: path.to_owned(),
        source,
    })?;
    let mut archive = ZipArchive::new(file).map_err(|err| zip_error(path, err))?;

    let mut names = Vec::new();
    for i in 0..archive.len() {
        let member = archive.by_index(i).map_err(|err| zip_error(path, err))?;
        let name = member.name();
        if name.to_ascii_lowercase().ends_with(".zip") {
            names.push(name.to_owned());
        }
    }

    debug!("Found {} zip members in {:?}", names.len(), path);
    Ok(names)
}

fn zip_error(path: &Path, err: ZipError) -> Error {
    match err {
        ZipError::Io(source) => Error::ArchiveOpen {
            path: path.to_owned(),
            source,
        },
        other => Error::ArchiveCorrupt {
            archive: path.display().to_string(),
            message: other.to_string(),
        },
    }
}
