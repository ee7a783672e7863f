//! Signature producer: `s_header → s_generate → done` (spec §4.6).

use super::{Buffers, Step, StateMachine, Tube};
use crate::error::Result;
use crate::magic::{Magic, StrongKind, WeakKind};
use crate::stats::Stats;
use crate::strong::StrongSum;
use crate::weak::WeakSum;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Header,
    Generate,
    Done,
}

/// Reads the basis byte stream and emits a signature stream: the
/// 12-byte header followed by one `weak(4) | strong(strong_len)` entry
/// per block.
pub struct SigJob {
    magic: Magic,
    block_len: u32,
    strong_len: usize,
    weak_kind: WeakKind,
    strong_kind: StrongKind,
    state: State,
    tube: Tube,
    stats: Stats,
}

impl SigJob {
    /// Begins a signature job for the given algorithm pair and block
    /// parameters. Mirrors `sig_begin(block_len, strong_len, magic)`.
    pub fn begin(magic: Magic, block_len: u32, strong_len: usize) -> Result<Self> {
        // Constructing a `SignatureTable` validates block_len/strong_len
        // against the magic's algorithm pair without needing a second
        // copy of those checks here.
        let _ = crate::signature::SignatureTable::new(magic, block_len, strong_len)?;
        let mut stats = Stats { block_len, ..Stats::new() };
        stats.mark_started();
        Ok(Self {
            magic,
            block_len,
            strong_len,
            weak_kind: magic.weak_kind().expect("signature magic always carries a weak kind"),
            strong_kind: magic.strong_kind().expect("signature magic always carries a strong kind"),
            state: State::Header,
            tube: Tube::default(),
            stats,
        })
    }

    /// Counters accumulated so far.
    #[must_use]
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Advances this job across one buffer pair. See
    /// [`crate::job::StateMachine`] for the shared driving loop.
    pub fn iter(&mut self, buffers: &mut Buffers) -> Result<crate::error::RunResult> {
        super::drive(self, buffers)
    }
}

impl StateMachine for SigJob {
    fn tube_mut(&mut self) -> &mut Tube {
        &mut self.tube
    }

    fn stats_mut(&mut self) -> &mut Stats {
        &mut self.stats
    }

    fn step(&mut self, buffers: &mut Buffers) -> Result<Step> {
        match self.state {
            State::Header => {
                let mut header = Vec::with_capacity(12);
                header.extend_from_slice(&self.magic.as_u32().to_be_bytes());
                header.extend_from_slice(&self.block_len.to_be_bytes());
                header.extend_from_slice(&(self.strong_len as u32).to_be_bytes());
                self.tube.emit(buffers, &header);
                self.stats.out_bytes += header.len() as u64;
                self.state = State::Generate;
                log::trace!("sig: header emitted, block_len={}", self.block_len);
                Ok(Step::Continue)
            }
            State::Generate => {
                let Some(block) = self.tube.take_upto(buffers, self.block_len as usize) else {
                    return Ok(Step::Blocked);
                };
                self.stats.in_bytes += block.len() as u64;
                if block.is_empty() {
                    self.state = State::Done;
                    log::debug!("sig: done, {} entries", self.stats.sig_commands);
                    return Ok(Step::Done);
                }
                let weak = WeakSum::compute(self.weak_kind, &block);
                let strong = StrongSum::digest(self.strong_kind, self.magic.as_u32(), &block, self.strong_len);
                let mut entry = Vec::with_capacity(4 + strong.len());
                entry.extend_from_slice(&weak.to_be_bytes());
                entry.extend_from_slice(&strong);
                self.tube.emit(buffers, &entry);
                self.stats.out_bytes += entry.len() as u64;
                self.stats.record_sig_entry();
                if block.len() < self.block_len as usize {
                    self.state = State::Done;
                    log::debug!("sig: short final block, done");
                    return Ok(Step::Done);
                }
                Ok(Step::Continue)
            }
            State::Done => Ok(Step::Done),
        }
    }
}
