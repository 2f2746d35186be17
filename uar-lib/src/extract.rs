//! Streaming extraction from one inner archive

use crate::pattern::Pattern;
use crate::{Error, Result};
use std::fs::{self, File};
use std::io::{self, Read, Seek};
use std::path::Path;
use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

/// Extract every member of an in-memory zip archive whose name matches
/// `pattern` into the top level of `output_dir`. Returns the number of
/// files written.
///
/// Directory entries (empty basename) and non-matching members are
/// skipped. Members are written to `output_dir/<basename>`; when two
/// inner archives produce the same basename the last writer wins.
pub fn extract_members<R: Read + Seek>(
    reader: R,
    archive_name: &str,
    pattern: &Pattern,
    output_dir: &Path,
) -> Result<usize> {
    // Idempotent: the worker prepares the directory once per run, but
    // this function must also work standalone.
    fs::create_dir_all(output_dir).map_err(|source| Error::DirectoryPrepare {
        path: output_dir.to_owned(),
        source,
    })?;

    let mut archive = ZipArchive::new(reader).map_err(|err| corrupt(archive_name, err))?;

    let mut written = 0;
    for i in 0..archive.len() {
        let mut member = archive.by_index(i).map_err(|err| Error::MemberRead {
            member: format!("{}#{}", archive_name, i),
            message: err.to_string(),
        })?;
        let name = member.name().to_owned();

        // skip directory entries
        let basename = match basename(&name) {
            Some(base) => base,
            None => continue,
        };

        if !pattern.is_match(&name) {
            continue;
        }

        let dest = output_dir.join(basename);
        debug!("Extracting '{}' to {:?}", name, dest);

        let mut target = File::create(&dest).map_err(|source| Error::OutputWrite {
            path: dest.clone(),
            source,
        })?;
        io::copy(&mut member, &mut target).map_err(|err| Error::MemberRead {
            member: format!("{}/{}", archive_name, name),
            message: err.to_string(),
        })?;
        written += 1;
    }

    Ok(written)
}

/// Basename of a member name as stored (forward-slash separators).
/// Returns `None` for directory entries.
fn basename(name: &str) -> Option<&str> {
    let base = name.rsplit('/').next().unwrap_or(name);
    if base.is_empty() {
        None
    } else {
        Some(base)
    }
}

fn corrupt(archive_name: &str, err: ZipError) -> Error {
    Error::ArchiveCorrupt {
        archive: archive_name.to_string(),
        message: err.to_string(),
    }
}
