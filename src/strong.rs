//! Strong (cryptographic) hashes used to confirm a weak-sum candidate.
//!
//! Both variants present the same streaming shape: `new`, `update`,
//! `finalize`. BLAKE2b is keyed with the stream's magic bytes for domain
//! separation (two signature formats with the same weak sum but
//! different purposes should not be able to collide on strong sums).
//! MD4 is unkeyed and kept for backward compatibility only — it must
//! never be used with untrusted data.

use blake2::Blake2bMac512;
use blake2::digest::Mac;
use digest::Digest;

/// Capability set shared by both strong-hash variants, mirroring the
/// streaming hashers used elsewhere in this crate's surrounding
/// ecosystem (update incrementally, finalize once).
pub trait StrongDigest: Sized {
    /// Value used to parameterise a new hasher (a key for keyed hashes,
    /// `()` for unkeyed ones).
    type Seed;

    /// Longest digest this algorithm can ever produce.
    const MAX_LEN: usize;

    /// Creates a hasher with the given seed.
    fn with_seed(seed: Self::Seed) -> Self;

    /// Feeds additional bytes into the digest state.
    fn update(&mut self, data: &[u8]);

    /// Finalises the digest, returning up to [`Self::MAX_LEN`] bytes.
    fn finalize(self) -> Vec<u8>;
}

/// MD4, provided for backward compatibility only. Never use with
/// untrusted data: MD4 is cryptographically broken.
#[derive(Clone)]
pub struct Md4Hash(md4::Md4);

impl StrongDigest for Md4Hash {
    type Seed = ();
    const MAX_LEN: usize = 16;

    fn with_seed((): Self::Seed) -> Self {
        Self(md4::Md4::new())
    }

    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.0, data);
    }

    fn finalize(self) -> Vec<u8> {
        self.0.finalize().to_vec()
    }
}

/// BLAKE2b, keyed by the magic bytes of the stream format for domain
/// separation.
#[derive(Clone)]
pub struct Blake2bHash(Blake2bMac512);

impl StrongDigest for Blake2bHash {
    type Seed = [u8; 4];
    const MAX_LEN: usize = 32;

    fn with_seed(seed: Self::Seed) -> Self {
        Self(Blake2bMac512::new_from_slice(&seed).expect("4-byte key is always valid"))
    }

    fn update(&mut self, data: &[u8]) {
        Mac::update(&mut self.0, data);
    }

    fn finalize(self) -> Vec<u8> {
        self.0.finalize().into_bytes().to_vec()
    }
}

/// A strong hash of either variant, chosen once at job creation by the
/// stream's magic number, carrying the truncation length (`strong_len`)
/// the signature was built with.
#[derive(Clone)]
pub enum StrongSum {
    /// MD4, unkeyed.
    Md4(Md4Hash),
    /// BLAKE2b, keyed by the owning stream's magic bytes.
    Blake2b(Blake2bHash),
}

impl StrongSum {
    /// Creates a fresh hasher for `kind`, keyed by `magic` when the
    /// algorithm supports keying.
    #[must_use]
    pub fn new(kind: crate::magic::StrongKind, magic: u32) -> Self {
        match kind {
            crate::magic::StrongKind::Md4 => Self::Md4(Md4Hash::with_seed(())),
            crate::magic::StrongKind::Blake2b => {
                Self::Blake2b(Blake2bHash::with_seed(magic.to_be_bytes()))
            }
        }
    }

    /// Feeds additional bytes into the digest state.
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Self::Md4(h) => h.update(data),
            Self::Blake2b(h) => h.update(data),
        }
    }

    /// Finalises the digest and truncates it to `strong_len` bytes.
    ///
    /// # Panics
    /// Panics if `strong_len` exceeds the algorithm's maximum digest
    /// length; callers validate this at signature-construction time.
    #[must_use]
    pub fn finalize(self, strong_len: usize) -> Vec<u8> {
        let full = match self {
            Self::Md4(h) => {
                assert!(strong_len <= Md4Hash::MAX_LEN);
                h.finalize()
            }
            Self::Blake2b(h) => {
                assert!(strong_len <= Blake2bHash::MAX_LEN);
                h.finalize()
            }
        };
        full[..strong_len].to_vec()
    }

    /// One-shot convenience: hashes `data` and truncates to `strong_len`.
    #[must_use]
    pub fn digest(kind: crate::magic::StrongKind, magic: u32, data: &[u8], strong_len: usize) -> Vec<u8> {
        let mut hasher = Self::new(kind, magic);
        hasher.update(data);
        hasher.finalize(strong_len)
    }
}
