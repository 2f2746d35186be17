//! Post-processing passes over the output directory
//!
//! Both passes operate on the top level of the output directory only and
//! run after extraction has completed. Failures here leave the already
//! extracted files on disk; there is no rollback.

use crate::{Error, Result};
use regex::Regex;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

/// Strategy for deriving the subfolder name a file belongs to during
/// reorganization. The naming convention is a contract with the caller,
/// not something inferred from the files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GroupKey {
    /// First digit run enclosed in underscores, e.g. `img_001_warped.png`
    /// groups under `001`.
    #[default]
    NumericToken,
    /// Filename with its extension stripped.
    FileStem,
}

impl GroupKey {
    /// Derive the group key for a filename, or `None` when the filename
    /// does not follow the convention.
    pub fn derive(&self, filename: &str) -> Option<String> {
        match self {
            GroupKey::NumericToken => {
                static TOKEN: OnceLock<Regex> = OnceLock::new();
                let token = TOKEN.get_or_init(|| {
                    Regex::new(r"_(\d+)_").expect("numeric token pattern is valid")
                });
                token
                    .captures(filename)
                    .map(|caps| caps[1].to_string())
            }
            GroupKey::FileStem => Path::new(filename)
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .filter(|stem| !stem.is_empty()),
        }
    }
}

/// Decompress every file in the top level of `dir` in place: each
/// `file.gz` becomes `file` and the compressed original is removed once
/// the sibling is fully written.
///
/// Every file is required to carry the `.gz` suffix. That is a caller
/// contract, not auto-detection: enabling this pass asserts the whole
/// output directory is gzip-compressed.
pub fn decompress_gzipped(dir: &Path) -> Result<usize> {
    let mut decompressed = 0;

    for path in top_level_files(dir).map_err(|err| Error::Decompression {
        path: dir.to_owned(),
        message: err.to_string(),
    })? {
        let filename = filename_of(&path);
        let stem = filename
            .strip_suffix(".gz")
            .ok_or_else(|| Error::Decompression {
                path: path.clone(),
                message: "expected a .gz suffix".to_string(),
            })?;
        let target_path = dir.join(stem);

        debug!("Decompressing {:?}", path);
        let source = File::open(&path).map_err(|err| Error::Decompression {
            path: path.clone(),
            message: err.to_string(),
        })?;
        let mut decoder = flate2::read::GzDecoder::new(source);
        let mut target = File::create(&target_path).map_err(|source| Error::OutputWrite {
            path: target_path.clone(),
            source,
        })?;
        io::copy(&mut decoder, &mut target).map_err(|err| Error::Decompression {
            path: path.clone(),
            message: err.to_string(),
        })?;

        // The sibling is fully written, drop the compressed original
        debug!("Removing {:?}", path);
        fs::remove_file(&path).map_err(|err| Error::Decompression {
            path: path.clone(),
            message: err.to_string(),
        })?;
        decompressed += 1;
    }

    Ok(decompressed)
}

/// Move every file in the top level of `dir` into a subdirectory named
/// after its group key, creating each subdirectory at most once.
///
/// Files are processed one at a time in sorted order so key collisions
/// between files resolve deterministically: the first file creates the
/// subdirectory, later files with the same key reuse it.
pub fn reorganize(dir: &Path, strategy: GroupKey) -> Result<usize> {
    let mut files = top_level_files(dir).map_err(|err| Error::Reorganization {
        path: dir.to_owned(),
        message: err.to_string(),
    })?;
    files.sort();

    let mut moved = 0;
    for path in files {
        let filename = filename_of(&path);
        let key = strategy
            .derive(&filename)
            .ok_or_else(|| Error::Reorganization {
                path: path.clone(),
                message: format!("no group key in '{}'", filename),
            })?;

        let subdir = dir.join(&key);
        if !subdir.exists() {
            fs::create_dir(&subdir).map_err(|err| Error::Reorganization {
                path: subdir.clone(),
                message: err.to_string(),
            })?;
        }

        let target = subdir.join(&filename);
        debug!("Moving {:?} to {:?}", path, target);
        fs::rename(&path, &target).map_err(|err| Error::Reorganization {
            path: path.clone(),
            message: err.to_string(),
        })?;
        moved += 1;
    }

    Ok(moved)
}

/// Plain files in the top level of `dir`, non-recursive.
fn top_level_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    Ok(files)
}

fn filename_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
