//! Patch applier: replays a `LITERAL`/`COPY`/`END` command stream against
//! a basis, calling back into caller-supplied basis storage for `COPY`
//! (spec §4.9). Generic over the basis reader so callers can back it
//! with a file, an in-memory buffer, or anything else seekable.

use super::{Buffers, Step, StateMachine, Tube};
use crate::error::{Error, Result};
use crate::opcode::{self, CommandKind};
use crate::stats::Stats;

/// Reads `length` bytes of the basis starting at `offset` into `buf`,
/// returning the number of bytes actually read (0 only at true end of
/// basis). Mirrors the C original's `patch_copy_cb` callback signature,
/// but as a Rust trait so it composes with closures and `Read + Seek`
/// adapters alike.
pub trait BasisRead {
    /// # Errors
    /// Returns an error if the basis cannot be read at `offset`.
    fn read_basis(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize>;
}

impl<F> BasisRead for F
where
    F: FnMut(u64, &mut [u8]) -> Result<usize>,
{
    fn read_basis(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        self(offset, buf)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Cmd,
    Literal { remaining: u64 },
    Copy { offset: u64, remaining: u64 },
    Done,
}

/// Applies a delta stream to a basis, producing the reconstructed file.
pub struct PatchJob<C> {
    state: State,
    tube: Tube,
    stats: Stats,
    basis: C,
    scratch: [u8; 8192],
}

impl<C: BasisRead> PatchJob<C> {
    /// Begins a patch job against the given basis-read callback.
    #[must_use]
    pub fn begin(basis: C) -> Self {
        let mut stats = Stats::new();
        stats.mark_started();
        Self {
            state: State::Cmd,
            tube: Tube::default(),
            stats,
            basis,
            scratch: [0; 8192],
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

    /// Recovers the basis reader, e.g. to close a file after patching.
    #[must_use]
    pub fn into_basis(self) -> C {
        self.basis
    }

    fn step_cmd(&mut self, buffers: &mut Buffers) -> Result<Step> {
        let Some(opcode_byte) = self.tube.take_some(buffers, 1) else {
            return if buffers.eof_in() {
                Err(Error::InputEnded)
            } else {
                Ok(Step::Blocked)
            };
        };
        let opcode_byte = opcode_byte[0];
        self.stats.in_bytes += 1;
        let descriptor = opcode::checked_descriptor(opcode_byte)?;

        match descriptor.kind {
            CommandKind::End => {
                self.state = State::Done;
                log::debug!(
                    "patch: done, {} literal / {} copy commands",
                    self.stats.literal_commands, self.stats.copy_commands
                );
                Ok(Step::Done)
            }
            CommandKind::Literal => {
                let length = if descriptor.immediate {
                    u64::from(opcode_byte)
                } else {
                    let Some(params) = self.tube.take_upto(buffers, descriptor.len_1 as usize)
                    else {
                        return Ok(Step::Blocked);
                    };
                    if params.len() < descriptor.len_1 as usize {
                        return Err(Error::InputEnded);
                    }
                    self.stats.in_bytes += params.len() as u64;
                    opcode::decode_param(&params, descriptor.len_1)
                };
                self.stats.record_literal(length);
                log::trace!("patch: LITERAL({length} bytes)");
                self.state = State::Literal { remaining: length };
                Ok(Step::Continue)
            }
            CommandKind::Copy => {
                let param_len = descriptor.len_1 as usize + descriptor.len_2 as usize;
                let Some(params) = self.tube.take_upto(buffers, param_len) else {
                    return Ok(Step::Blocked);
                };
                if params.len() < param_len {
                    return Err(Error::InputEnded);
                }
                self.stats.in_bytes += params.len() as u64;
                let (p1, p2) = params.split_at(descriptor.len_1 as usize);
                let offset = opcode::decode_param(p1, descriptor.len_1);
                let length = opcode::decode_param(p2, descriptor.len_2);
                self.stats.record_copy(length);
                log::trace!("patch: COPY(offset={offset}, length={length})");
                self.state = State::Copy { offset, remaining: length };
                Ok(Step::Continue)
            }
            CommandKind::Signature | CommandKind::Reserved => {
                Err(Error::Corrupt(format!("unexpected command byte 0x{opcode_byte:02x}")))
            }
        }
    }

    fn step_literal(&mut self, buffers: &mut Buffers, remaining: u64) -> Result<Step> {
        if remaining == 0 {
            self.state = State::Cmd;
            return Ok(Step::Continue);
        }
        if buffers.avail_out() == 0 {
            return Ok(Step::Blocked);
        }
        let chunk = (remaining as usize).min(buffers.avail_out());
        let Some(bytes) = self.tube.take_some(buffers, chunk) else {
            return if buffers.eof_in() {
                Err(Error::InputEnded)
            } else {
                Ok(Step::Blocked)
            };
        };
        self.stats.in_bytes += bytes.len() as u64;
        self.tube.emit(buffers, &bytes);
        self.stats.out_bytes += bytes.len() as u64;
        self.state = State::Literal { remaining: remaining - bytes.len() as u64 };
        Ok(Step::Continue)
    }

    fn step_copy(&mut self, buffers: &mut Buffers, offset: u64, remaining: u64) -> Result<Step> {
        if remaining == 0 {
            self.state = State::Cmd;
            return Ok(Step::Continue);
        }
        if buffers.avail_out() == 0 {
            return Ok(Step::Blocked);
        }
        let chunk = (remaining as usize).min(buffers.avail_out()).min(self.scratch.len());
        let n = self.basis.read_basis(offset, &mut self.scratch[..chunk])?;
        if n == 0 {
            return Err(Error::Corrupt("basis ended before a COPY was satisfied".into()));
        }
        let bytes = self.scratch[..n].to_vec();
        self.tube.emit(buffers, &bytes);
        self.stats.out_bytes += bytes.len() as u64;
        self.state = State::Copy {
            offset: offset + n as u64,
            remaining: remaining - n as u64,
        };
        Ok(Step::Continue)
    }
}

impl<C: BasisRead> StateMachine for PatchJob<C> {
    fn tube_mut(&mut self) -> &mut Tube {
        &mut self.tube
    }

    fn stats_mut(&mut self) -> &mut Stats {
        &mut self.stats
    }

    fn step(&mut self, buffers: &mut Buffers) -> Result<Step> {
        match self.state {
            State::Cmd => self.step_cmd(buffers),
            State::Literal { remaining } => self.step_literal(buffers, remaining),
            State::Copy { offset, remaining } => self.step_copy(buffers, offset, remaining),
            State::Done => Ok(Step::Done),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RunResult;
    use crate::opcode::END_OPCODE;

    fn run<C: BasisRead>(job: &mut PatchJob<C>, input: &[u8], out_chunk: usize, in_chunk: usize) -> Vec<u8> {
        let mut out = Vec::new();
        let mut offset = 0usize;
        loop {
            let end = (offset + in_chunk.max(1)).min(input.len());
            let eof = end == input.len();
            let mut consumed = 0usize;
            loop {
                let mut out_buf = vec![0u8; out_chunk.max(1)];
                let window = &input[offset..end];
                let mut buffers = Buffers::new(&window[consumed..], eof, &mut out_buf);
                let result = job.iter(&mut buffers).unwrap();
                consumed += buffers.bytes_consumed();
                out.extend_from_slice(&out_buf[..buffers.bytes_produced()]);
                if matches!(result, RunResult::Done) {
                    return out;
                }
                if buffers.bytes_consumed() == 0 && buffers.bytes_produced() == 0 {
                    break;
                }
            }
            offset = end;
            if eof {
                break;
            }
        }
        out
    }

    fn slice_basis(basis: &'static [u8]) -> impl BasisRead {
        move |offset: u64, buf: &mut [u8]| -> Result<usize> {
            let offset = offset as usize;
            if offset >= basis.len() {
                return Ok(0);
            }
            let n = buf.len().min(basis.len() - offset);
            buf[..n].copy_from_slice(&basis[offset..offset + n]);
            Ok(n)
        }
    }

    #[test]
    fn literal_then_copy_reconstructs_new_file() {
        let basis = b"abcdefgh" as &'static [u8];
        let mut stream = Vec::new();
        let (op, params) = opcode::encode_literal_header(2);
        stream.push(op);
        stream.extend(params);
        stream.extend_from_slice(b"XY");
        let (op, params) = opcode::encode_copy_header(2, 6);
        stream.push(op);
        stream.extend(params);
        stream.push(END_OPCODE);

        let mut job = PatchJob::begin(slice_basis(basis));
        let out = run(&mut job, &stream, 4096, 4096);
        assert_eq!(out, b"XYcdefgh");
        assert_eq!(job.stats().literal_commands, 1);
        assert_eq!(job.stats().copy_commands, 1);
    }

    #[test]
    fn one_byte_buffers_match_one_giant_buffer() {
        let basis = b"the quick brown fox jumps over the lazy dog" as &'static [u8];
        let mut stream = Vec::new();
        let (op, params) = opcode::encode_copy_header(0, 20);
        stream.push(op);
        stream.extend(params);
        let (op, params) = opcode::encode_literal_header(3);
        stream.push(op);
        stream.extend(params);
        stream.extend_from_slice(b"!!!");
        stream.push(END_OPCODE);

        let mut big = PatchJob::begin(slice_basis(basis));
        let big_out = run(&mut big, &stream, 4096, 4096);
        let mut small = PatchJob::begin(slice_basis(basis));
        let small_out = run(&mut small, &stream, 1, 1);
        assert_eq!(big_out, small_out);
        assert_eq!(&big_out[20..], b"!!!");
    }

    #[test]
    fn reserved_opcode_is_corrupt() {
        let stream = vec![0x55u8];
        let mut job = PatchJob::begin(slice_basis(b""));
        let mut out = [0u8; 16];
        let mut buffers = Buffers::new(&stream, true, &mut out);
        assert!(matches!(job.iter(&mut buffers), Err(Error::Corrupt(_))));
    }

    #[test]
    fn truncated_stream_is_input_ended() {
        let stream = vec![0x41u8];
        let mut job = PatchJob::begin(slice_basis(b""));
        let mut out = [0u8; 16];
        let mut buffers = Buffers::new(&stream, true, &mut out);
        assert!(matches!(job.iter(&mut buffers), Err(Error::InputEnded)));
    }

    #[test]
    fn basis_exhaustion_mid_copy_is_corrupt() {
        let basis = b"short" as &'static [u8];
        let mut stream = Vec::new();
        let (op, params) = opcode::encode_copy_header(0, 100);
        stream.push(op);
        stream.extend(params);
        stream.push(END_OPCODE);
        let mut job = PatchJob::begin(slice_basis(basis));
        let mut out = [0u8; 4096];
        let mut buffers = Buffers::new(&stream, true, &mut out);
        let result = job.iter(&mut buffers);
        assert!(matches!(result, Err(Error::Corrupt(_))));
    }
}
