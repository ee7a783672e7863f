//! The binary command protocol: a single descriptor table drives both
//! encoding and decoding of LITERAL/COPY/END commands, so the two code
//! paths cannot drift apart.

use crate::error::{Error, Result};
use std::sync::OnceLock;

/// What a command byte represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Stream terminator.
    End,
    /// Embed bytes verbatim.
    Literal,
    /// Reserved for a future whole-signature-embedding command; no byte
    /// in the current table maps to it.
    Signature,
    /// Copy bytes from the basis.
    Copy,
    /// Not assigned to any command; decoding one is always `RS_CORRUPT`.
    Reserved,
}

/// One row of the opcode table.
#[derive(Debug, Clone, Copy)]
pub struct Descriptor {
    /// What this command byte represents.
    pub kind: CommandKind,
    /// Bytes used by the first parameter (0, 1, 2, 4, or 8).
    pub len_1: u8,
    /// Bytes used by the second parameter (0 for everything but `COPY`).
    pub len_2: u8,
    /// `true` if the command byte itself *is* the first parameter's
    /// value (the short form for `LITERAL` lengths 1..=64).
    pub immediate: bool,
    /// `1 + len_1 + len_2`, the number of bytes the runtime must
    /// accumulate atomically before a statefun can decode this command.
    pub total_size: usize,
}

const WIDTHS: [u8; 4] = [1, 2, 4, 8];

fn build_table() -> [Descriptor; 256] {
    let reserved = Descriptor {
        kind: CommandKind::Reserved,
        len_1: 0,
        len_2: 0,
        immediate: false,
        total_size: 1,
    };
    let mut table = [reserved; 256];

    table[0] = Descriptor {
        kind: CommandKind::End,
        len_1: 0,
        len_2: 0,
        immediate: false,
        total_size: 1,
    };

    // Immediate-mode LITERAL: the opcode byte itself is the length, 1..=64.
    for opcode in 1..=64usize {
        table[opcode] = Descriptor {
            kind: CommandKind::Literal,
            len_1: 0,
            len_2: 0,
            immediate: true,
            total_size: 1,
        };
    }

    // Wide-form LITERAL: explicit length parameter of each width.
    for (i, &width) in WIDTHS.iter().enumerate() {
        table[0x41 + i] = Descriptor {
            kind: CommandKind::Literal,
            len_1: width,
            len_2: 0,
            immediate: false,
            total_size: 1 + width as usize,
        };
    }

    // COPY: every (offset width, length width) combination.
    let mut opcode = 0x45usize;
    for &w1 in &WIDTHS {
        for &w2 in &WIDTHS {
            table[opcode] = Descriptor {
                kind: CommandKind::Copy,
                len_1: w1,
                len_2: w2,
                immediate: false,
                total_size: 1 + w1 as usize + w2 as usize,
            };
            opcode += 1;
        }
    }

    table
}

fn table() -> &'static [Descriptor; 256] {
    static TABLE: OnceLock<[Descriptor; 256]> = OnceLock::new();
    TABLE.get_or_init(build_table)
}

/// Looks up the descriptor for a command byte.
#[must_use]
pub fn descriptor(command_byte: u8) -> Descriptor {
    table()[command_byte as usize]
}

/// Rejects `RESERVED` command bytes with `RS_CORRUPT`, as the loader and
/// patch applier must.
pub fn checked_descriptor(command_byte: u8) -> Result<Descriptor> {
    let d = descriptor(command_byte);
    if d.kind == CommandKind::Reserved {
        return Err(Error::Corrupt(format!(
            "command byte 0x{command_byte:02x} is reserved"
        )));
    }
    Ok(d)
}

/// Smallest width in `{1, 2, 4, 8}` able to hold `value`.
#[must_use]
pub fn min_width(value: u64) -> u8 {
    if value <= u64::from(u8::MAX) {
        1
    } else if value <= u64::from(u16::MAX) {
        2
    } else if value <= u64::from(u32::MAX) {
        4
    } else {
        8
    }
}

/// Parses a big-endian unsigned integer of the given width (1, 2, 4, or
/// 8 bytes) from the front of `bytes`.
///
/// # Panics
/// Panics if `bytes` is shorter than `width` or `width` is not one of
/// the four supported widths; callers only ever invoke this with a
/// slice sized exactly to a descriptor's `len_1`/`len_2`.
#[must_use]
pub fn decode_param(bytes: &[u8], width: u8) -> u64 {
    match width {
        0 => 0,
        1 => u64::from(bytes[0]),
        2 => u64::from(u16::from_be_bytes(bytes[..2].try_into().unwrap())),
        4 => u64::from(u32::from_be_bytes(bytes[..4].try_into().unwrap())),
        8 => u64::from_be_bytes(bytes[..8].try_into().unwrap()),
        _ => unreachable!("descriptor widths are always 0, 1, 2, 4, or 8"),
    }
}

/// Encodes a big-endian unsigned integer into exactly `width` bytes.
fn encode_param(value: u64, width: u8) -> Vec<u8> {
    match width {
        0 => Vec::new(),
        1 => vec![value as u8],
        2 => (value as u16).to_be_bytes().to_vec(),
        4 => (value as u32).to_be_bytes().to_vec(),
        8 => value.to_be_bytes().to_vec(),
        _ => unreachable!("descriptor widths are always 0, 1, 2, 4, or 8"),
    }
}

/// Picks the minimum-length encoding for a `LITERAL` of `length` bytes:
/// the immediate form for `1..=64`, otherwise the narrowest explicit
/// width that holds `length`.
///
/// # Panics
/// Panics if `length` is 0: callers never emit a zero-length literal.
#[must_use]
pub fn encode_literal_header(length: u64) -> (u8, Vec<u8>) {
    assert!(length > 0, "a LITERAL command always carries at least one byte");
    if length <= 64 {
        return (length as u8, Vec::new());
    }
    let width = min_width(length);
    let opcode = match width {
        1 => 0x41,
        2 => 0x42,
        4 => 0x43,
        8 => 0x44,
        _ => unreachable!(),
    };
    (opcode, encode_param(length, width))
}

/// Picks the minimum-length encoding for `COPY(offset, length)`: the
/// narrowest width for each parameter independently, which always
/// minimizes their joint size.
#[must_use]
pub fn encode_copy_header(offset: u64, length: u64) -> (u8, Vec<u8>) {
    let w1 = min_width(offset);
    let w2 = min_width(length);
    let opcode = 0x45 + WIDTHS.iter().position(|&w| w == w1).unwrap() * WIDTHS.len()
        + WIDTHS.iter().position(|&w| w == w2).unwrap();
    let mut params = encode_param(offset, w1);
    params.extend(encode_param(length, w2));
    (opcode as u8, params)
}

/// The single zero byte that terminates every delta stream.
pub const END_OPCODE: u8 = 0x00;
