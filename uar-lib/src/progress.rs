//! Cross-thread progress reporting
//!
//! The extraction worker is the only producer and the presentation loop
//! the only consumer. Events travel one way, in the exact order they were
//! produced; the channel never reorders, coalesces, or drops them. The
//! buffer is unbounded so a slow consumer can drain at its own pace
//! without ever blocking the worker.

use crate::error::ErrorKind;
use crossbeam_channel::{unbounded, Receiver, Sender};

/// Milestone notification emitted by the extraction worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// The run has started.
    Started,
    /// The number of inner archives to extract is known.
    TotalUnits(usize),
    /// One inner archive has been fully extracted.
    UnitCompleted,
    /// The run finished successfully, post-processing included.
    Finished,
    /// The run ended in an unrecovered error.
    Failed { kind: ErrorKind, context: String },
}

pub type ProgressSender = Sender<ProgressEvent>;
pub type ProgressReceiver = Receiver<ProgressEvent>;

/// Create the event channel connecting a worker to its consumer.
///
/// The receiver disconnects once the worker has dropped its sender, which
/// happens only after the terminal `Finished` or `Failed` event is queued.
pub fn channel() -> (ProgressSender, ProgressReceiver) {
    unbounded()
}
