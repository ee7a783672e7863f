//! Error and result types shared by every job kind.

use thiserror::Error;

/// Everything that can go wrong while driving a job, plus the ambient
/// I/O errors surfaced by the `whole`-file convenience layer.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid arguments to a begin-function: unknown magic, `strong_len`
    /// out of range, etc. Detected at construction; no job is created.
    #[error("invalid parameter: {0}")]
    Param(String),

    /// Stream prefix was not in the accepted magic-number set.
    #[error("bad magic number in stream")]
    BadMagic,

    /// Structurally valid stream with an impossible value: unknown
    /// opcode, a block index beyond the signature, an overlong parameter.
    #[error("corrupt stream: {0}")]
    Corrupt(String),

    /// More input is needed to complete a record, but `eof_in` was set.
    #[error("input ended before a complete record was available")]
    InputEnded,

    /// Reserved for invariant violations; indicates a bug in this crate.
    #[error("internal error: {0}")]
    Internal(String),

    /// I/O failure from the ambient `whole`-file layer or a caller-supplied
    /// basis-read callback.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Outcome of a single job `iter` call (see e.g. [`crate::job::sig::SigJob::iter`]). Unlike [`Error`],
/// this is an ordinary control-flow signal, not a failure: `Blocked` is
/// always recoverable by supplying more input or output room and calling
/// `iter` again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunResult {
    /// The job has nothing left to do; it may be freed.
    Done,
    /// The job made whatever progress it could and needs more input
    /// buffer space, more output buffer space, or both.
    Blocked,
}
