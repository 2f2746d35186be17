//! UAR - a library for extracting filtered results from nested zip archives
//!
//! This library extracts a pattern-filtered subset of files from zip
//! archives nested inside an outer zip archive, optionally decompresses
//! gzip-compressed outputs, and optionally reorganizes the extracted files
//! into per-item subfolders. A background worker runs the whole pipeline
//! and reports progress over an ordered channel so a consumer on another
//! thread can render it without ever blocking on archive I/O.

pub mod error;
pub mod extract;
pub mod inspect;
pub mod output_dir;
pub mod pattern;
pub mod postprocess;
pub mod progress;
pub mod worker;

pub use error::{Error, ErrorKind, Result};

// Re-export commonly used types
pub use pattern::Pattern;
pub use postprocess::GroupKey;
pub use progress::{ProgressEvent, ProgressReceiver, ProgressSender};
pub use worker::{extract_nested, ExtractOptions, ExtractionWorker};
