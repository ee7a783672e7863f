//! Signature loader: `s_magic → s_header → s_entry*` (spec §4.7).
//!
//! Parses a signature stream back into an in-memory [`SignatureTable`].
//! The table outlives this job; the caller must call
//! [`SignatureTable::build_hash_table`] on it before using it for delta
//! generation (spec §3's loader/indexing split).

use super::{Buffers, Step, StateMachine, Tube};
use crate::error::{Error, Result};
use crate::magic::Magic;
use crate::signature::{SignatureEntry, SignatureTable};
use crate::stats::Stats;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Magic,
    Header,
    Entry,
    Done,
}

/// Reads a signature stream and builds the in-memory [`SignatureTable`]
/// it describes.
pub struct LoadSigJob {
    state: State,
    tube: Tube,
    stats: Stats,
    magic: Option<Magic>,
    strong_len: usize,
    table: Option<SignatureTable>,
}

impl LoadSigJob {
    /// Begins a loader job. Mirrors `loadsig_begin() -> (job, out_sig)`:
    /// the table is grown in place as entries stream in and is available
    /// via [`Self::into_table`] once the job reports `Done`.
    #[must_use]
    pub fn begin() -> Self {
        let mut stats = Stats::new();
        stats.mark_started();
        Self {
            state: State::Magic,
            tube: Tube::default(),
            stats,
            magic: None,
            strong_len: 0,
            table: None,
        }
    }

    /// Counters accumulated so far.
    #[must_use]
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Advances this job across one buffer pair.
    pub fn iter(&mut self, buffers: &mut Buffers) -> Result<crate::error::RunResult> {
        super::drive(self, buffers)
    }

    /// Takes ownership of the loaded table. Only meaningful once `iter`
    /// has returned `Done`; `None` beforehand or after a failed parse.
    #[must_use]
    pub fn into_table(self) -> Option<SignatureTable> {
        self.table
    }
}

impl StateMachine for LoadSigJob {
    fn tube_mut(&mut self) -> &mut Tube {
        &mut self.tube
    }

    fn stats_mut(&mut self) -> &mut Stats {
        &mut self.stats
    }

    fn step(&mut self, buffers: &mut Buffers) -> Result<Step> {
        match self.state {
            State::Magic => {
                let Some(bytes) = self.tube.take_exact(buffers, 4)? else {
                    return Ok(Step::Blocked);
                };
                self.stats.in_bytes += 4;
                let magic = Magic::from_be_bytes(bytes.try_into().unwrap())?;
                if magic.is_delta() {
                    return Err(Error::BadMagic);
                }
                self.magic = Some(magic);
                self.state = State::Header;
                log::trace!("loadsig: magic 0x{:08x} accepted", magic.as_u32());
                Ok(Step::Continue)
            }
            State::Header => {
                let Some(bytes) = self.tube.take_exact(buffers, 8)? else {
                    return Ok(Step::Blocked);
                };
                self.stats.in_bytes += 8;
                let magic = self.magic.expect("magic parsed before header");
                let block_len = u32::from_be_bytes(bytes[0..4].try_into().unwrap());
                let strong_len = u32::from_be_bytes(bytes[4..8].try_into().unwrap()) as usize;
                let table = SignatureTable::new(magic, block_len, strong_len).map_err(|e| {
                    Error::Corrupt(format!("invalid signature header: {e}"))
                })?;
                self.stats.block_len = block_len;
                self.strong_len = strong_len;
                self.table = Some(table);
                self.state = State::Entry;
                log::debug!("loadsig: header parsed, block_len={block_len}, strong_len={strong_len}");
                Ok(Step::Continue)
            }
            State::Entry => {
                let entry_size = 4 + self.strong_len;
                let Some(bytes) = self.tube.take_upto(buffers, entry_size) else {
                    return Ok(Step::Blocked);
                };
                if bytes.is_empty() {
                    self.state = State::Done;
                    log::debug!("loadsig: done, {} entries", self.stats.sig_commands);
                    return Ok(Step::Done);
                }
                if bytes.len() < entry_size {
                    return Err(Error::InputEnded);
                }
                self.stats.in_bytes += bytes.len() as u64;
                let weak = u32::from_be_bytes(bytes[0..4].try_into().unwrap());
                let strong = bytes[4..].to_vec();
                self.table
                    .as_mut()
                    .expect("table created in s_header")
                    .push(SignatureEntry { weak, strong });
                self.stats.record_sig_entry();
                Ok(Step::Continue)
            }
            State::Done => Ok(Step::Done),
        }
    }
}
