//! In-memory signature: the sequence of (weak, strong) entries over the
//! basis file, plus the hash index that makes delta generation's
//! candidate lookup O(1).

use crate::error::{Error, Result};
use crate::magic::{Magic, StrongKind, WeakKind};

/// One block's signature: its position is implicit (index into
/// [`SignatureTable::entries`]); block *i* covers basis bytes
/// `[i*block_len, i*block_len + block_len)`, except possibly the last
/// block, which may be short.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SignatureEntry {
    /// Rolling checksum of the block.
    pub weak: u32,
    /// Strong hash of the block, already truncated to `strong_len` bytes.
    pub strong: Vec<u8>,
}

const MIN_TABLE_SIZE: usize = 16;

/// Open-addressed hash index over weak sums. `None` is the empty-slot
/// sentinel; occupied slots hold a block index into the owning
/// [`SignatureTable::entries`].
#[derive(Debug, Clone, Default)]
struct HashIndex {
    slots: Vec<Option<u32>>,
    mask: usize,
}

impl HashIndex {
    fn build(entries: &[SignatureEntry]) -> Self {
        let size = table_size_for(entries.len());
        let mask = size - 1;
        let mut slots = vec![None; size];
        for (block_index, entry) in entries.iter().enumerate() {
            let mut slot = natural_slot(entry.weak, mask);
            while slots[slot].is_some() {
                slot = (slot + 1) & mask;
            }
            slots[slot] = Some(block_index as u32);
        }
        Self { slots, mask }
    }

    /// Block indices whose entry's weak sum equals `weak`, in insertion
    /// (bucket) order. Stops at the first empty slot past the natural
    /// position, which open addressing guarantees bounds every run.
    fn candidates<'e>(&self, weak: u32, entries: &'e [SignatureEntry]) -> Vec<u32> {
        if self.slots.is_empty() {
            return Vec::new();
        }
        let mut out = Vec::new();
        let mut slot = natural_slot(weak, self.mask);
        loop {
            match self.slots[slot] {
                None => break,
                Some(block_index) => {
                    if entries[block_index as usize].weak == weak {
                        out.push(block_index);
                    }
                }
            }
            slot = (slot + 1) & self.mask;
        }
        out
    }
}

fn table_size_for(entry_count: usize) -> usize {
    let mut size = MIN_TABLE_SIZE;
    while size < entry_count.saturating_mul(2) {
        size *= 2;
    }
    size
}

fn natural_slot(weak: u32, mask: usize) -> usize {
    (weak as usize) & mask
}

/// The in-memory signature of a basis file: an ordered sequence of block
/// entries plus (once built) a hash index for fast weak-sum lookup.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SignatureTable {
    magic: u32,
    block_len: u32,
    strong_len: usize,
    entries: Vec<SignatureEntry>,
    #[cfg_attr(feature = "serde", serde(skip))]
    index: Option<HashIndexSerdeShim>,
}

// The hash index is a derived cache, not wire data; serde round trips
// drop it and `build_hash_table` is cheap to call again after loading.
#[derive(Debug, Clone, Default)]
struct HashIndexSerdeShim(HashIndex);

impl SignatureTable {
    /// Creates an empty table for the given algorithm choice and block
    /// parameters. Used by the loader as entries stream in, and by the
    /// signature producer when driving the `whole`-file convenience
    /// layer in memory.
    pub fn new(magic: Magic, block_len: u32, strong_len: usize) -> Result<Self> {
        if magic.is_delta() {
            return Err(Error::Param("signature table needs a signature magic".into()));
        }
        if block_len == 0 || block_len > (1 << 16) {
            return Err(Error::Param(format!("block_len {block_len} out of range")));
        }
        let Some(strong_kind) = magic.strong_kind() else {
            return Err(Error::Param("missing strong kind for magic".into()));
        };
        if strong_len == 0 || strong_len > strong_kind.max_len() {
            return Err(Error::Param(format!(
                "strong_len {strong_len} out of range for this algorithm"
            )));
        }
        Ok(Self {
            magic: magic.as_u32(),
            block_len,
            strong_len,
            entries: Vec::new(),
            index: None,
        })
    }

    /// This table's magic number.
    #[must_use]
    pub const fn magic(&self) -> u32 {
        self.magic
    }

    /// Block length entries were computed with.
    #[must_use]
    pub const fn block_len(&self) -> u32 {
        self.block_len
    }

    /// Strong-hash truncation length entries carry.
    #[must_use]
    pub const fn strong_len(&self) -> usize {
        self.strong_len
    }

    /// The weak-sum algorithm this table's magic selects.
    #[must_use]
    pub fn weak_kind(&self) -> WeakKind {
        Magic::from_u32(self.magic)
            .ok()
            .and_then(Magic::weak_kind)
            .expect("magic was validated at construction")
    }

    /// The strong-hash algorithm this table's magic selects.
    #[must_use]
    pub fn strong_kind(&self) -> StrongKind {
        Magic::from_u32(self.magic)
            .ok()
            .and_then(Magic::strong_kind)
            .expect("magic was validated at construction")
    }

    /// Appends one entry in block order. Invalidates any previously
    /// built index (the caller must call [`Self::build_hash_table`]
    /// again before using this table for delta generation).
    pub fn push(&mut self, entry: SignatureEntry) {
        self.entries.push(entry);
        self.index = None;
    }

    /// Number of block entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if there are no entries (an empty basis file).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry for a given block index.
    #[must_use]
    pub fn entry(&self, block_index: u32) -> Option<&SignatureEntry> {
        self.entries.get(block_index as usize)
    }

    /// All entries, in block order.
    #[must_use]
    pub fn entries(&self) -> &[SignatureEntry] {
        &self.entries
    }

    /// Builds (or rebuilds) the weak-sum hash index. Idempotent: calling
    /// this twice on the same entries is not an error and yields
    /// behaviorally identical lookups.
    pub fn build_hash_table(&mut self) {
        self.index = Some(HashIndexSerdeShim(HashIndex::build(&self.entries)));
    }

    /// Block indices whose weak sum equals `weak`, in bucket (insertion)
    /// order. Empty if the index has not been built yet or if no entry
    /// shares this weak sum.
    #[must_use]
    pub fn candidates(&self, weak: u32) -> Vec<u32> {
        match &self.index {
            Some(shim) => shim.0.candidates(weak, &self.entries),
            None => Vec::new(),
        }
    }

    /// Finds the block index whose weak sum is `weak` and whose strong
    /// sum (computed over `data` using this table's algorithm) matches,
    /// walking candidates in bucket order and stopping at the first
    /// strong-sum match.
    #[must_use]
    pub fn find_block(&self, weak: u32, data: &[u8]) -> Option<u32> {
        let candidates = self.candidates(weak);
        if candidates.is_empty() {
            return None;
        }
        let strong = crate::strong::StrongSum::digest(self.strong_kind(), self.magic, data, self.strong_len);
        candidates
            .into_iter()
            .find(|&idx| self.entries[idx as usize].strong == strong)
    }
}
