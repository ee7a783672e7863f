//! Process-wide scalar overrides and the sizing heuristics from spec §6.
//!
//! This is the entirety of this crate's mutable global state, besides
//! the `log` facade's own level (see [`crate::logging`]): two optional
//! I/O buffer-size overrides, read by the `whole`-file convenience
//! layer when a caller hasn't picked a buffer size of their own.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Default buffer size the `whole` layer uses when no override is set.
const DEFAULT_BUFFER_LEN: usize = 64 * 1024;

static INPUT_BUFFER_LEN: AtomicUsize = AtomicUsize::new(0);
static OUTPUT_BUFFER_LEN: AtomicUsize = AtomicUsize::new(0);

/// Overrides the buffer size the `whole` layer allocates for reading.
/// `0` restores the default.
pub fn set_input_buffer_len(len: usize) {
    INPUT_BUFFER_LEN.store(len, Ordering::Relaxed);
}

/// Overrides the buffer size the `whole` layer allocates for writing.
/// `0` restores the default.
pub fn set_output_buffer_len(len: usize) {
    OUTPUT_BUFFER_LEN.store(len, Ordering::Relaxed);
}

/// The input buffer size the `whole` layer should use right now.
#[must_use]
pub fn input_buffer_len() -> usize {
    match INPUT_BUFFER_LEN.load(Ordering::Relaxed) {
        0 => DEFAULT_BUFFER_LEN,
        n => n,
    }
}

/// The output buffer size the `whole` layer should use right now.
#[must_use]
pub fn output_buffer_len() -> usize {
    match OUTPUT_BUFFER_LEN.load(Ordering::Relaxed) {
        0 => DEFAULT_BUFFER_LEN,
        n => n,
    }
}

/// Recommends a `block_len` for a basis file of `old_fsize` bytes:
/// `sqrt(old_fsize * 8)`, rounded up to a power of two, clamped to a
/// sane range.
#[must_use]
pub fn recommended_block_len(old_fsize: u64) -> u32 {
    const MIN_BLOCK_LEN: u32 = 512;
    const MAX_BLOCK_LEN: u32 = 1 << 16;

    if old_fsize == 0 {
        return MIN_BLOCK_LEN;
    }
    #[allow(clippy::cast_precision_loss)]
    let approx = ((old_fsize as f64) * 8.0).sqrt();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let approx = approx.round() as u64;
    let mut power = MIN_BLOCK_LEN as u64;
    while power < approx && power < u64::from(MAX_BLOCK_LEN) {
        power *= 2;
    }
    power.clamp(u64::from(MIN_BLOCK_LEN), u64::from(MAX_BLOCK_LEN)) as u32
}

/// Recommends a `strong_len` keeping the per-block false-match
/// probability under 2⁻¹⁰ across a signature of `block_count` blocks:
/// enough bits that `block_count / 2^bits < 2^-10`, rounded up to whole
/// bytes, clamped to `max_len`.
#[must_use]
pub fn recommended_strong_len(block_count: u64, max_len: usize) -> usize {
    const TARGET_LOG2_FALSE_POSITIVE: u32 = 10;
    const MIN_STRONG_LEN: usize = 2;

    if block_count == 0 {
        return MIN_STRONG_LEN.min(max_len.max(1));
    }
    let block_bits = u64::BITS - block_count.leading_zeros();
    let needed_bits = u64::from(block_bits) + u64::from(TARGET_LOG2_FALSE_POSITIVE);
    let needed_bytes = needed_bits.div_ceil(8) as usize;
    needed_bytes.clamp(MIN_STRONG_LEN, max_len.max(MIN_STRONG_LEN)).min(max_len.max(1))
}
