//! The six "Concrete scenarios" enumerated verbatim, each as its own test.

use netdelta::job::loadsig::LoadSigJob;
use netdelta::magic::Magic;
use netdelta::opcode::{self, END_OPCODE};
use netdelta::whole::{self, FileReadSeek};
use std::io::Cursor;

fn sig_to_table(old: &[u8], magic: Magic, block_len: u32, strong_len: usize) -> netdelta::signature::SignatureTable {
    let mut sig_bytes = Vec::new();
    whole::signature(&mut Cursor::new(old), &mut sig_bytes, magic, block_len, strong_len).unwrap();
    whole::load_signature(&mut Cursor::new(&sig_bytes)).unwrap()
}

#[test]
fn scenario_1_identical_files_become_one_copy() {
    let old = b"abcdefgh";
    let new = b"abcdefgh";
    let table = sig_to_table(old, Magic::SigRabinKarpBlake2b, 4, 8);

    let mut delta = Vec::new();
    whole::delta(&table, &mut Cursor::new(&new[..]), &mut delta).unwrap();

    let mut expected = Magic::Delta.as_u32().to_be_bytes().to_vec();
    let (op, params) = opcode::encode_copy_header(0, 8);
    expected.push(op);
    expected.extend(params);
    expected.push(END_OPCODE);
    assert_eq!(delta, expected);
    assert!(delta.len() >= 10 && delta.len() <= 14);
}

#[test]
fn scenario_2_prefix_change_becomes_literal_then_copy() {
    let old = b"abcdefgh";
    let new = b"XYcdefgh";
    let table = sig_to_table(old, Magic::SigRabinKarpBlake2b, 2, 8);

    let mut delta = Vec::new();
    whole::delta(&table, &mut Cursor::new(&new[..]), &mut delta).unwrap();

    let mut expected = Magic::Delta.as_u32().to_be_bytes().to_vec();
    let (op, params) = opcode::encode_literal_header(2);
    expected.push(op);
    expected.extend(params);
    expected.extend_from_slice(b"XY");
    let (op, params) = opcode::encode_copy_header(2, 6);
    expected.push(op);
    expected.extend(params);
    expected.push(END_OPCODE);
    assert_eq!(delta, expected);
}

#[test]
fn scenario_3_empty_basis_has_zero_entries_and_all_literal_delta() {
    let old: &[u8] = b"";
    let new = b"hello";

    let mut sig_bytes = Vec::new();
    whole::signature(&mut Cursor::new(old), &mut sig_bytes, Magic::SigRabinKarpBlake2b, 8, 8).unwrap();
    let table = whole::load_signature(&mut Cursor::new(&sig_bytes)).unwrap();
    assert_eq!(table.len(), 0);

    let mut delta = Vec::new();
    whole::delta(&table, &mut Cursor::new(&new[..]), &mut delta).unwrap();

    let mut expected = Magic::Delta.as_u32().to_be_bytes().to_vec();
    let (op, params) = opcode::encode_literal_header(5);
    expected.push(op);
    expected.extend(params);
    expected.extend_from_slice(b"hello");
    expected.push(END_OPCODE);
    assert_eq!(delta, expected);
}

#[test]
fn scenario_4_empty_new_file_is_just_end_and_patches_to_empty() {
    let old = b"hello";
    let new: &[u8] = b"";
    let table = sig_to_table(old, Magic::SigRabinKarpBlake2b, 8, 8);

    let mut delta = Vec::new();
    whole::delta(&table, &mut Cursor::new(new), &mut delta).unwrap();

    let expected: Vec<u8> = Magic::Delta
        .as_u32()
        .to_be_bytes()
        .into_iter()
        .chain([END_OPCODE])
        .collect();
    assert_eq!(delta, expected);

    let mut reconstructed = Vec::new();
    whole::patch(
        &mut Cursor::new(&delta),
        &mut reconstructed,
        FileReadSeek::new(Cursor::new(old)),
    )
    .unwrap();
    assert!(reconstructed.is_empty());
}

#[test]
fn scenario_5_single_flipped_byte_in_a_million_is_cheap() {
    let block_len = 1024u32;
    let mut old = vec![0u8; 1_000_000];
    let mut seed: u64 = 0x2463_8a11;
    for byte in &mut old {
        seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
        *byte = (seed >> 56) as u8;
    }
    let mut new = old.clone();
    new[500_000] ^= 0xFF;

    let table = sig_to_table(&old, Magic::SigRabinKarpBlake2b, block_len, 16);
    let mut delta = Vec::new();
    let stats = whole::delta(&table, &mut Cursor::new(&new), &mut delta).unwrap();

    assert!(stats.copy_commands <= 2, "got {} COPY commands", stats.copy_commands);
    assert_eq!(stats.literal_commands, 1);
    assert_eq!(stats.literal_bytes, 1);

    let mut reconstructed = Vec::new();
    whole::patch(
        &mut Cursor::new(&delta),
        &mut reconstructed,
        FileReadSeek::new(Cursor::new(&old)),
    )
    .unwrap();
    assert_eq!(reconstructed, new);
}

#[test]
fn scenario_6_bad_signature_magic_yields_bad_magic_with_no_output() {
    let bytes = 0xDEAD_BEEFu32.to_be_bytes();
    let mut job = LoadSigJob::begin();
    let mut out = [0u8; 16];
    let mut buffers = netdelta::job::Buffers::new(&bytes, true, &mut out);
    let err = job.iter(&mut buffers).unwrap_err();
    assert!(matches!(err, netdelta::error::Error::BadMagic));
    assert_eq!(buffers.bytes_produced(), 0);
}
