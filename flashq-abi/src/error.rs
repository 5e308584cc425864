use thiserror::Error;

/// The closed set of non-`Ok` outcomes a queue operation can return
/// (spec.md 7). `Ok` itself is represented by `Result::Ok`, not a variant
/// here, since that is the idiomatic Rust encoding of a status-code API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("argument is invalid for this operation")]
    InvalidArg,

    #[error("handle does not refer to a live open queue")]
    InvalidHandle,

    #[error("seek position is out of range")]
    InvalidSeek,

    #[error("a queue with this name already exists")]
    QueueExists,

    #[error("no queue with this name exists")]
    QueueMissing,

    #[error("queue is already open with an incompatible access/mode")]
    QueueOpened,

    #[error("no writer lock is held for this handle")]
    QueueClosed,

    /// Reserved: spec.md notes enqueue evicts the oldest entry instead of
    /// ever reporting the queue full, so this is never constructed by the
    /// engine. Kept so callers matching exhaustively don't need `#[non_exhaustive]`.
    #[error("queue is at capacity")]
    QueueIsFull,

    #[error("queue has no live entries")]
    QueueIsEmpty,

    #[error("queue is held by another opener in an incompatible mode")]
    QueueIsBusy,

    #[error("handle is read-only")]
    QueueReadOnly,

    #[error("handle is write-only")]
    QueueWriteOnly,

    #[error("queue was not created with RANDOM_ACCESS")]
    QueueNotSeekable,

    #[error("filesystem port operation failed")]
    FsAccessFail,

    #[error("handle table has no free slot")]
    HandleNotAvail,
}
