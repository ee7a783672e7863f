//! Delta producer: header, then a rolling scan of the new-file stream
//! against the signature table, emitting COPY/LITERAL/END (spec §4.8).

use super::{Buffers, Step, StateMachine, Tube};
use crate::error::{Error, Result};
use crate::magic::Magic;
use crate::opcode::{self, END_OPCODE};
use crate::signature::SignatureTable;
use crate::stats::Stats;
use crate::strong::StrongSum;
use crate::weak::WeakSum;

/// Pending literal bytes are flushed early once they reach this size, so
/// a long non-matching run doesn't grow the accumulator unboundedly.
const MAX_LITERAL_RUN: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Header,
    Scan,
    Done,
}

enum MatchOutcome {
    Hit(u32),
    FalseMatch,
    Miss,
}

/// Scans a new-file byte stream against an already-indexed
/// [`SignatureTable`] and emits the `COPY`/`LITERAL`/`END` command
/// stream that rebuilds it from the basis.
pub struct DeltaJob<'t> {
    table: &'t SignatureTable,
    block_len: usize,
    state: State,
    tube: Tube,
    stats: Stats,
    /// Current candidate window: exactly `block_len` bytes once filled,
    /// shorter only for the final window at end of stream.
    window: Vec<u8>,
    rolling: WeakSum,
    literal: Vec<u8>,
    /// A `COPY` already decided on but not yet written to `next_out`,
    /// held back so an immediately adjacent next `COPY` can be fused
    /// with it (spec §4.8 "Adjacent-COPY merging").
    pending_copy: Option<(u64, u64)>,
    /// `true` once the new-file stream is known to have no more bytes.
    finished_scanning: bool,
}

impl<'t> DeltaJob<'t> {
    /// Begins a delta job against an already hash-indexed signature
    /// table. Mirrors `delta_begin(sig)`.
    #[must_use]
    pub fn begin(table: &'t SignatureTable) -> Self {
        let block_len = table.block_len().max(1) as usize;
        let mut stats = Stats { block_len: table.block_len(), ..Stats::new() };
        stats.mark_started();
        Self {
            table,
            block_len,
            state: State::Header,
            tube: Tube::default(),
            stats,
            window: Vec::with_capacity(block_len),
            rolling: WeakSum::new(table.weak_kind()),
            literal: Vec::new(),
            pending_copy: None,
            finished_scanning: false,
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

    fn probe(&self, weak: u32, data: &[u8]) -> MatchOutcome {
        let candidates = self.table.candidates(weak);
        if candidates.is_empty() {
            return MatchOutcome::Miss;
        }
        let strong = StrongSum::digest(self.table.strong_kind(), self.table.magic(), data, self.table.strong_len());
        for idx in candidates {
            if self.table.entry(idx).is_some_and(|e| e.strong == strong) {
                return MatchOutcome::Hit(idx);
            }
        }
        MatchOutcome::FalseMatch
    }

    fn flush_pending_copy(&mut self, buffers: &mut Buffers) {
        if let Some((offset, length)) = self.pending_copy.take() {
            let (opcode, params) = opcode::encode_copy_header(offset, length);
            let mut cmd = Vec::with_capacity(1 + params.len());
            cmd.push(opcode);
            cmd.extend(params);
            self.tube.emit(buffers, &cmd);
            self.stats.out_bytes += cmd.len() as u64;
            self.stats.record_copy(length);
            log::trace!("delta: COPY(offset={offset}, length={length})");
        }
    }

    fn flush_literal(&mut self, buffers: &mut Buffers) {
        if self.literal.is_empty() {
            return;
        }
        let bytes = std::mem::take(&mut self.literal);
        let (opcode, params) = opcode::encode_literal_header(bytes.len() as u64);
        let mut cmd = Vec::with_capacity(1 + params.len() + bytes.len());
        cmd.push(opcode);
        cmd.extend(params);
        cmd.extend_from_slice(&bytes);
        self.tube.emit(buffers, &cmd);
        self.stats.out_bytes += cmd.len() as u64;
        self.stats.record_literal(bytes.len() as u64);
        log::trace!("delta: LITERAL({} bytes)", bytes.len());
    }

    fn extend_literal(&mut self, buffers: &mut Buffers, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        if self.pending_copy.is_some() {
            self.flush_pending_copy(buffers);
        }
        self.literal.extend_from_slice(bytes);
        if self.literal.len() >= MAX_LITERAL_RUN {
            self.flush_literal(buffers);
        }
    }

    fn emit_copy(&mut self, buffers: &mut Buffers, block_idx: u32, length: u64) {
        self.flush_literal(buffers);
        let offset = u64::from(block_idx) * self.block_len as u64;
        match self.pending_copy {
            Some((prev_offset, prev_len)) if prev_offset + prev_len == offset => {
                self.pending_copy = Some((prev_offset, prev_len + length));
            }
            _ => {
                self.flush_pending_copy(buffers);
                self.pending_copy = Some((offset, length));
            }
        }
    }

    fn fill_window(&mut self, buffers: &mut Buffers) -> Result<Step> {
        let need = self.block_len - self.window.len();
        match self.tube.take_some(buffers, need) {
            Some(bytes) => {
                self.stats.in_bytes += bytes.len() as u64;
                for &b in &bytes {
                    self.rolling.rollin(b);
                }
                self.window.extend_from_slice(&bytes);
                Ok(Step::Continue)
            }
            None => {
                if buffers.eof_in() {
                    self.finished_scanning = true;
                    Ok(Step::Continue)
                } else {
                    Ok(Step::Blocked)
                }
            }
        }
    }

    fn slide(&mut self, buffers: &mut Buffers) -> Result<Step> {
        match self.tube.take_some(buffers, 1) {
            Some(bytes) => {
                let incoming = bytes[0];
                self.stats.in_bytes += 1;
                let outgoing = self.window.remove(0);
                self.extend_literal(buffers, &[outgoing]);
                self.rolling.rotate(outgoing, incoming);
                self.window.push(incoming);
                Ok(Step::Continue)
            }
            None => {
                if buffers.eof_in() {
                    let window = std::mem::take(&mut self.window);
                    self.extend_literal(buffers, &window);
                    self.finished_scanning = true;
                    Ok(Step::Continue)
                } else {
                    Ok(Step::Blocked)
                }
            }
        }
    }

    fn step_scan(&mut self, buffers: &mut Buffers) -> Result<Step> {
        if !self.finished_scanning && self.window.len() < self.block_len {
            return self.fill_window(buffers);
        }

        if self.window.is_empty() {
            self.flush_pending_copy(buffers);
            self.flush_literal(buffers);
            self.tube.emit(buffers, &[END_OPCODE]);
            self.stats.out_bytes += 1;
            self.state = State::Done;
            log::debug!(
                "delta: done, {} copy / {} literal commands, {} false matches",
                self.stats.copy_commands, self.stats.literal_commands, self.stats.false_matches
            );
            return Ok(Step::Done);
        }

        let full = self.window.len() == self.block_len;
        let weak = if full {
            self.rolling.digest()
        } else {
            WeakSum::compute(self.table.weak_kind(), &self.window)
        };

        match self.probe(weak, &self.window) {
            MatchOutcome::Hit(idx) => {
                let length = self.window.len() as u64;
                self.emit_copy(buffers, idx, length);
                self.window.clear();
                self.rolling.reset();
                Ok(Step::Continue)
            }
            outcome => {
                if matches!(outcome, MatchOutcome::FalseMatch) {
                    self.stats.record_false_match();
                }
                if full {
                    self.slide(buffers)
                } else {
                    let window = std::mem::take(&mut self.window);
                    self.extend_literal(buffers, &window);
                    self.finished_scanning = true;
                    Ok(Step::Continue)
                }
            }
        }
    }
}

impl<'t> StateMachine for DeltaJob<'t> {
    fn tube_mut(&mut self) -> &mut Tube {
        &mut self.tube
    }

    fn stats_mut(&mut self) -> &mut Stats {
        &mut self.stats
    }

    fn step(&mut self, buffers: &mut Buffers) -> Result<Step> {
        match self.state {
            State::Header => {
                let header = Magic::Delta.as_u32().to_be_bytes();
                self.tube.emit(buffers, &header);
                self.stats.out_bytes += header.len() as u64;
                self.state = State::Scan;
                Ok(Step::Continue)
            }
            State::Scan => self.step_scan(buffers),
            State::Done => Ok(Step::Done),
        }
    }
}
