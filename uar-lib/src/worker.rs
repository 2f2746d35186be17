//! Background extraction worker
//!
//! Orchestrates the whole pipeline in one background thread: inspect the
//! outer archive, prepare the output directory, extract each inner
//! archive, then run the optional post-processing passes. Milestones are
//! emitted as [`ProgressEvent`]s; all blocking I/O happens on the worker
//! thread, never on the consumer's.

use crate::extract::extract_members;
use crate::pattern::Pattern;
use crate::postprocess::{self, GroupKey};
use crate::progress::{self, ProgressEvent, ProgressSender};
use crate::{inspect, output_dir, Error, Result};
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use tracing::{error, info};
use zip::ZipArchive;

/// Options for one extraction run, read once at start.
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Decompress every extracted `.gz` file in place.
    pub decompress_gzip: bool,
    /// Move each extracted file into a subfolder named after its group key.
    pub reorganize_into_folders: bool,
    /// How the group key is derived from a filename.
    pub group_key: GroupKey,
}

/// Single-shot background worker.
///
/// `start` moves the progress sender into the spawned thread, so the
/// channel disconnects exactly when the run is over and a second `start`
/// is rejected with [`Error::AlreadyRunning`].
pub struct ExtractionWorker {
    events: Option<ProgressSender>,
    handle: Option<JoinHandle<()>>,
}

impl ExtractionWorker {
    /// Create a worker that reports over `events`.
    pub fn new(events: ProgressSender) -> Self {
        Self {
            events: Some(events),
            handle: None,
        }
    }

    /// Start the extraction run in a background thread.
    ///
    /// The worker cannot be restarted; a second call fails with
    /// [`Error::AlreadyRunning`]. Every run ends with a terminal
    /// `Finished` or `Failed` event before the channel disconnects.
    pub fn start(
        &mut self,
        archive: PathBuf,
        pattern: Pattern,
        options: ExtractOptions,
    ) -> Result<()> {
        let events = self.events.take().ok_or(Error::AlreadyRunning)?;

        self.handle = Some(thread::spawn(move || {
            if let Err(err) = run(&archive, &pattern, &options, &events) {
                error!("Extraction of {:?} failed: {}", archive, err);
                let _ = events.send(ProgressEvent::Failed {
                    kind: err.kind(),
                    context: err.to_string(),
                });
            }
        }));
        Ok(())
    }

    /// Whether `start` has been called.
    pub fn is_started(&self) -> bool {
        self.events.is_none()
    }

    /// Wait for the background thread to finish. The run outcome is
    /// reported through the progress channel.
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Run the full pipeline synchronously without a consumer. Returns the
/// number of files extracted (before post-processing).
pub fn extract_nested(archive: &Path, pattern: &Pattern, options: &ExtractOptions) -> Result<usize> {
    // Progress events go nowhere; send errors on the dropped receiver
    // are ignored inside `run`.
    let (events, _) = progress::channel();
    run(archive, pattern, options, &events)
}

fn run(
    archive: &Path,
    pattern: &Pattern,
    options: &ExtractOptions,
    events: &ProgressSender,
) -> Result<usize> {
    let _ = events.send(ProgressEvent::Started);

    // Inspect before touching the filesystem: an unopenable archive must
    // not destroy a pre-existing output directory.
    let inner_archives = inspect::inner_archives(archive)?;
    let _ = events.send(ProgressEvent::TotalUnits(inner_archives.len()));

    let out_dir = output_dir::output_dir_for(archive);
    output_dir::prepare(&out_dir)?;

    let file = File::open(archive).map_err(|source| Error::ArchiveOpen {
        path: archive.to_owned(),
        source,
    })?;
    let mut outer = ZipArchive::new(file).map_err(|err| Error::ArchiveCorrupt {
        archive: archive.display().to_string(),
        message: err.to_string(),
    })?;

    let mut written = 0;
    for name in &inner_archives {
        info!("Extracting '{}'", name);
        let bytes = {
            let mut member = outer.by_name(name).map_err(|err| Error::MemberRead {
                member: name.clone(),
                message: err.to_string(),
            })?;
            let mut buf = Vec::with_capacity(member.size() as usize);
            member.read_to_end(&mut buf).map_err(|err| Error::MemberRead {
                member: name.clone(),
                message: err.to_string(),
            })?;
            buf
        };

        written += extract_members(Cursor::new(bytes), name, pattern, &out_dir)?;
        let _ = events.send(ProgressEvent::UnitCompleted);
    }

    if options.decompress_gzip {
        postprocess::decompress_gzipped(&out_dir)?;
        info!("Decompressed gzipped files");
    }

    if options.reorganize_into_folders {
        postprocess::reorganize(&out_dir, options.group_key)?;
        info!("Extracted files placed in their own folder");
    }

    info!("All files extracted to {:?}", out_dir);
    let _ = events.send(ProgressEvent::Finished);
    Ok(written)
}
