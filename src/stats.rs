//! Per-job counters, accumulated across an operation and readable once
//! the job finishes (or at any point while it runs, for progress UIs).

use std::time::{Duration, Instant};

/// Counters accumulated by a running job. Every job kind carries one;
/// most fields are only ever touched by the kinds that produce the
/// corresponding commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stats {
    /// Number of LITERAL commands emitted (delta) or decoded (patch).
    pub literal_commands: u64,
    /// Total bytes carried by LITERAL commands.
    pub literal_bytes: u64,
    /// Number of COPY commands emitted (delta) or decoded (patch).
    pub copy_commands: u64,
    /// Total bytes carried by COPY commands.
    pub copy_bytes: u64,
    /// Number of signature entries produced (sig) or loaded (loadsig).
    pub sig_commands: u64,
    /// Weak-sum hits whose strong sum did not confirm.
    pub false_matches: u64,
    /// Block length the operation is running with, 0 if not applicable.
    pub block_len: u32,
    /// Total bytes read from `next_in` across the job's lifetime.
    pub in_bytes: u64,
    /// Total bytes written to `next_out` across the job's lifetime.
    pub out_bytes: u64,
    /// When the job was created, i.e. the wall-clock start of the
    /// operation. Not serialized: an `Instant` is only meaningful within
    /// the process that created it.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub started_at: Option<Instant>,
    /// Wall-clock time from job creation to the job reporting `Done`.
    /// `None` until the job finishes.
    pub elapsed: Option<Duration>,
}

impl Stats {
    /// A fresh, all-zero counter set with no start time recorded yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the wall-clock start of the operation. Called once, by
    /// each job kind's begin-function.
    pub(crate) fn mark_started(&mut self) {
        self.started_at = Some(Instant::now());
    }

    /// Records the wall-clock end of the operation, deriving `elapsed`
    /// from `started_at`. Called once, by the job runtime's `drive` when
    /// a job transitions to `Done`.
    pub(crate) fn mark_finished(&mut self) {
        if let Some(started_at) = self.started_at {
            self.elapsed = Some(started_at.elapsed());
        }
    }

    pub(crate) fn record_literal(&mut self, bytes: u64) {
        self.literal_commands += 1;
        self.literal_bytes += bytes;
    }

    pub(crate) fn record_copy(&mut self, bytes: u64) {
        self.copy_commands += 1;
        self.copy_bytes += bytes;
    }

    pub(crate) fn record_sig_entry(&mut self) {
        self.sig_commands += 1;
    }

    pub(crate) fn record_false_match(&mut self) {
        self.false_matches += 1;
    }
}
