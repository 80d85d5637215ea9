//! ## Sparse register encoding
//!
//! Low cardinalities are tracked at a higher temporary precision `p' = 25`
//! instead of paying for the full dense array up front. Each observation is
//! packed into a single 32-bit entry:
//!
//! - 0..5 bits    - register value (trailing-zero run length plus one)
//! - 6..30 bits   - 25-bit register index (low 25 bits of the hash)
//! - 31 bit       - zero
//!
//! Entries are staged in an append-only `temp_list` and periodically merged
//! into `sparse_list`, which is kept sorted ascending by index with at most
//! one entry per index (the maximum value seen). Because the value occupies
//! the low bits, a plain ascending sort over packed entries groups each index
//! run with its maximum last, so compaction is a sort plus a single pass.

use std::mem::size_of;

use crate::dense::DenseRegister;
use crate::register::{rank, RegisterOps};

/// Sparse addressing precision: number of hash bits used as register index.
pub(crate) const P_PRIME: u32 = 25;
/// Width of the packed value field.
pub(crate) const Q_PRIME: u32 = 6;

const VALUE_MASK: u32 = (1 << Q_PRIME) - 1;
const INDEX_MASK: u32 = (1 << P_PRIME) - 1;

/// Ordered collection of packed (index, value) pairs at precision `p'`,
/// with an append-only staging buffer.
#[derive(Debug, Clone)]
pub(crate) struct SparseRegister {
    /// Sorted ascending by index, unique per index, maximum value per index.
    sparse_list: Vec<u32>,
    /// Staged insertions, not yet merged into `sparse_list`.
    temp_list: Vec<u32>,
    /// Soft cap on `temp_list` before a merge-compaction runs.
    temp_cap: usize,
}

impl SparseRegister {
    pub(crate) fn new(p: u32) -> Self {
        Self {
            sparse_list: Vec::new(),
            temp_list: Vec::new(),
            temp_cap: (1usize << p) / 4,
        }
    }

    /// Pack an (index, value) pair into a single entry.
    #[inline]
    pub(crate) fn pack(idx: u32, value: u8) -> u32 {
        (idx << Q_PRIME) | (value as u32 & VALUE_MASK)
    }

    /// Split a packed entry back into its (index, value) pair.
    #[inline]
    pub(crate) fn unpack(entry: u32) -> (u32, u8) {
        (entry >> Q_PRIME, (entry & VALUE_MASK) as u8)
    }

    /// Compute the packed sparse encoding of a 64-bit hash: the low `p'`
    /// bits become the index, the remaining `64 - p'` bits carry the run.
    #[inline]
    pub(crate) fn encode_hash(hash: u64) -> u32 {
        let idx = (hash as u32) & INDEX_MASK;
        Self::pack(idx, rank(hash >> P_PRIME, 64 - P_PRIME))
    }

    /// Stage an (index, value) pair directly; used by external rehydration.
    pub(crate) fn set(&mut self, idx: u32, value: u8) -> bool {
        self.stage(Self::pack(idx & INDEX_MASK, value))
    }

    #[inline]
    fn stage(&mut self, entry: u32) -> bool {
        self.temp_list.push(entry);
        if self.temp_list.len() >= self.temp_cap {
            self.compact()
        } else {
            true
        }
    }

    /// Merge the staging buffer into `sparse_list`, restoring the
    /// sorted-unique-maximum invariant. Returns `true` when the compact list
    /// changed (a new index appeared or some index rose to a higher value).
    pub(crate) fn compact(&mut self) -> bool {
        if self.temp_list.is_empty() {
            return false;
        }
        let merged = merge_compact(&self.sparse_list, &self.temp_list);
        self.temp_list.clear();
        let changed = merged != self.sparse_list;
        self.sparse_list = merged;
        changed
    }

    /// Compacted view of all entries without mutating the register.
    pub(crate) fn compacted(&self) -> Vec<u32> {
        if self.temp_list.is_empty() {
            self.sparse_list.clone()
        } else {
            merge_compact(&self.sparse_list, &self.temp_list)
        }
    }

    /// Number of unique indices. Cheap once compacted; pays one compaction
    /// pass otherwise.
    pub(crate) fn count_distinct(&self) -> usize {
        if self.temp_list.is_empty() {
            self.sparse_list.len()
        } else {
            self.compacted().len()
        }
    }

    /// Upper bound on the number of unique indices, for threshold checks
    /// that should not pay for a compaction.
    #[inline]
    pub(crate) fn size_upper_bound(&self) -> usize {
        self.sparse_list.len() + self.temp_list.len()
    }

    /// Union with `other`, keeping the per-index maximum.
    pub(crate) fn merge(&mut self, other: &SparseRegister) {
        self.temp_list.extend_from_slice(&other.sparse_list);
        self.temp_list.extend_from_slice(&other.temp_list);
        self.compact();
    }

    /// Project every entry down to dense precision. Duplicate projections
    /// are harmless because the dense `set` keeps the maximum, so staged
    /// entries do not need compacting first.
    pub(crate) fn project_into(&self, dense: &mut DenseRegister) {
        for &entry in self.sparse_list.iter().chain(self.temp_list.iter()) {
            project_entry(entry, dense);
        }
    }
}

/// Project one packed sparse entry at precision `p'` down to a dense slot at
/// precision `p`. The dense index is the low `p` bits of the sparse index
/// (the same bits dense addressing extracts from the hash). The remaining
/// high `p' - p` index bits are exactly the hash bits the dense encoding
/// folds into its run: when any of them is set the dense run ends inside
/// them, otherwise the run continues through all of them into the sparse
/// value.
pub(crate) fn project_entry(entry: u32, dense: &mut DenseRegister) {
    let (idx, value) = SparseRegister::unpack(entry);
    let p = dense.precision();
    let dense_idx = (idx & ((1 << p) - 1)) as usize;
    let r_bits = idx >> p;
    let dense_value = if r_bits != 0 {
        (r_bits.trailing_zeros() + 1) as u8
    } else {
        value + (P_PRIME - p) as u8
    };
    dense.set(dense_idx, dense_value);
}

/// Merge a sorted compact run with staged entries into a fresh compact run.
/// For one index, a higher value compares greater, so after an ascending
/// sort the maximum is the last entry of each index run.
fn merge_compact(base: &[u32], staged: &[u32]) -> Vec<u32> {
    let mut merged = Vec::with_capacity(base.len() + staged.len());
    merged.extend_from_slice(base);
    merged.extend_from_slice(staged);
    merged.sort_unstable();

    let mut compact: Vec<u32> = Vec::with_capacity(merged.len());
    for entry in merged {
        match compact.last_mut() {
            Some(last) if *last >> Q_PRIME == entry >> Q_PRIME => *last = entry,
            _ => compact.push(entry),
        }
    }
    compact
}

impl RegisterOps for SparseRegister {
    #[inline]
    fn add(&mut self, hash: u64) -> bool {
        self.stage(Self::encode_hash(hash))
    }

    fn size_of(&self) -> usize {
        (self.sparse_list.capacity() + self.temp_list.capacity()) * size_of::<u32>()
    }
}

impl PartialEq for SparseRegister {
    /// Equality is defined on compacted state only; how entries are split
    /// between the compact list and the staging buffer is irrelevant.
    fn eq(&self, other: &Self) -> bool {
        self.compacted() == other.compacted()
    }
}
