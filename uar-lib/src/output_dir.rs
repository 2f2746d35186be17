//! Output directory lifecycle

use crate::{Error, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::debug;

const PREPARE_ATTEMPTS: usize = 5;
const PREPARE_BACKOFF: Duration = Duration::from_millis(100);

/// The output directory for an archive is the archive path with its
/// extension stripped.
pub fn output_dir_for(archive: &Path) -> PathBuf {
    archive.with_extension("")
}

/// Create a fresh, empty output directory.
///
/// A stale directory at the same path is removed first; the run never
/// merges into existing contents. Some platforms report the removal as
/// still in progress for a short while, so removal and creation are
/// retried in a bounded loop with a short backoff instead of recursing.
pub fn prepare(dir: &Path) -> Result<()> {
    let mut last_err: Option<io::Error> = None;

    for attempt in 0..PREPARE_ATTEMPTS {
        if attempt > 0 {
            thread::sleep(PREPARE_BACKOFF);
        }

        if dir.exists() {
            debug!("Output directory already exists, removing {:?}", dir);
            if let Err(err) = fs::remove_dir_all(dir) {
                last_err = Some(err);
                continue;
            }
        }

        match fs::create_dir(dir) {
            Ok(()) => {
                debug!("Created output directory {:?}", dir);
                return Ok(());
            }
            // The previous removal may not be visible yet
            Err(err) => last_err = Some(err),
        }
    }

    Err(Error::DirectoryPrepare {
        path: dir.to_owned(),
        source: last_err
            .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "retries exhausted")),
    })
}
