//! One-shot convenience layer over `Read`/`Write` streams.
//!
//! The job types in [`crate::job`] are the actual implementation; these
//! functions just own a buffer pair and loop `iter()` to completion, the
//! way `librsync`'s own `whole` helpers sit on top of its streaming job
//! API. Nothing here is part of the wire format — callers who want
//! control over buffer chopping or partial progress should drive the
//! jobs directly instead.

use std::io::{Read, Seek, SeekFrom, Write};

use crate::error::{Error, Result, RunResult};
use crate::job::delta::DeltaJob;
use crate::job::loadsig::LoadSigJob;
use crate::job::patch::{BasisRead, PatchJob};
use crate::job::sig::SigJob;
use crate::job::Buffers;
use crate::magic::Magic;
use crate::signature::SignatureTable;
use crate::stats::Stats;
use crate::tunables::{input_buffer_len, output_buffer_len};

/// Reads into `buf`, retrying on `Interrupted`, and reports whether the
/// reader has reached end of stream.
fn fill_buffer<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<(usize, bool)> {
    let mut total = 0;
    loop {
        if total == buf.len() {
            return Ok((total, false));
        }
        match reader.read(&mut buf[total..]) {
            Ok(0) => return Ok((total, true)),
            Ok(n) => total += n,
            Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
}

/// Drives any `iter`-shaped job to completion over a `Read`/`Write`
/// pair: refills the input buffer whenever it runs dry, writes out
/// everything produced after each call, and stops once the job reports
/// `Done`. Returns nothing: the job itself accumulates the real
/// [`Stats`] as it runs, and every caller below reads them back off the
/// job with `job.stats()` once this returns.
fn drive_job<R, W, F>(reader: &mut R, writer: &mut W, mut iter: F) -> Result<()>
where
    R: Read,
    W: Write,
    F: FnMut(&mut Buffers) -> Result<RunResult>,
{
    let mut in_buf = vec![0u8; input_buffer_len()];
    let mut out_buf = vec![0u8; output_buffer_len()];
    let mut in_len = 0usize;
    let mut in_pos = 0usize;
    let mut eof = false;

    loop {
        if in_pos == in_len && !eof {
            let (n, reached_eof) = fill_buffer(reader, &mut in_buf)?;
            in_len = n;
            in_pos = 0;
            eof = reached_eof;
        }

        let mut buffers = Buffers::new(&in_buf[in_pos..in_len], eof, &mut out_buf);
        let result = iter(&mut buffers)?;
        let consumed = buffers.bytes_consumed();
        let produced = buffers.bytes_produced();
        in_pos += consumed;
        writer.write_all(&out_buf[..produced])?;

        if matches!(result, RunResult::Done) {
            return Ok(());
        }
        if in_pos == in_len && eof && consumed == 0 && produced == 0 {
            return Err(Error::InputEnded);
        }
    }
}

/// Reads a basis file from `basis` and writes its signature stream to
/// `out`, using `block_len`/`strong_len` under the given algorithm pair.
pub fn signature<R: Read, W: Write>(
    basis: &mut R,
    out: &mut W,
    magic: Magic,
    block_len: u32,
    strong_len: usize,
) -> Result<Stats> {
    let mut job = SigJob::begin(magic, block_len, strong_len)?;
    drive_job(basis, out, |buffers| job.iter(buffers))?;
    Ok(*job.stats())
}

/// Reads a signature stream from `sig` and returns the loaded,
/// hash-indexed table, ready for [`delta`].
pub fn load_signature<R: Read>(sig: &mut R) -> Result<SignatureTable> {
    let mut job = LoadSigJob::begin();
    let sink = std::io::sink();
    let mut sink = sink;
    drive_job(sig, &mut sink, |buffers| job.iter(buffers))?;
    let mut table = job
        .into_table()
        .ok_or_else(|| Error::Internal("loadsig job finished without a table".into()))?;
    table.build_hash_table();
    Ok(table)
}

/// Reads a new file from `new` and writes a delta stream to `out`,
/// against an already-indexed signature table.
pub fn delta<R: Read, W: Write>(table: &SignatureTable, new: &mut R, out: &mut W) -> Result<Stats> {
    let mut job = DeltaJob::begin(table);
    drive_job(new, out, |buffers| job.iter(buffers))?;
    Ok(*job.stats())
}

/// Reads a delta stream from `delta` and writes the reconstructed file
/// to `out`, calling back into `basis` for `COPY` commands.
pub fn patch<R: Read, W: Write, C: BasisRead>(
    delta: &mut R,
    out: &mut W,
    basis: C,
) -> Result<Stats> {
    let mut job = PatchJob::begin(basis);
    drive_job(delta, out, |buffers| job.iter(buffers))?;
    Ok(*job.stats())
}

/// A default basis-read callback over any `Read + Seek`: seeks to the
/// requested offset, then reads, looping internally on short reads so a
/// single call always returns either a full buffer or true EOF.
pub struct FileReadSeek<F> {
    file: F,
}

impl<F: Read + Seek> FileReadSeek<F> {
    /// Wraps a seekable reader (typically a `std::fs::File`) as a basis
    /// callback for [`patch`]/[`PatchJob`].
    #[must_use]
    pub fn new(file: F) -> Self {
        Self { file }
    }

    /// Recovers the wrapped reader.
    #[must_use]
    pub fn into_inner(self) -> F {
        self.file
    }
}

impl<F: Read + Seek> BasisRead for FileReadSeek<F> {
    fn read_basis(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        self.file.seek(SeekFrom::Start(offset))?;
        let (n, _eof) = fill_buffer(&mut self.file, buf)?;
        Ok(n)
    }
}

/// Renders bytes as a space-separated hex dump, for inspecting a
/// signature table or delta command in tests and examples. Not part of
/// the wire format.
#[must_use]
pub fn debug_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect::<Vec<_>>().join(" ")
}
