use enum_dispatch::enum_dispatch;

use crate::dense::DenseRegister;
use crate::sparse::SparseRegister;

/// Register encodings supported by [`HyperLogLog`](crate::HyperLogLog).
///
/// An estimator starts out in either encoding (`Sparse` by default) and may
/// transition `Sparse` to `Dense` exactly once; `Dense` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Sparse,
    Dense,
}

/// Operations shared by both register encodings.
#[enum_dispatch(Register)]
pub(crate) trait RegisterOps {
    /// Route a 64-bit hash value into the register. Returns `true` when the
    /// observable register state changed (or, for staged sparse insertions,
    /// may have changed).
    fn add(&mut self, hash: u64) -> bool;

    /// Heap memory held by the register, in bytes.
    fn size_of(&self) -> usize;
}

/// Tagged union over the two register encodings. Exactly one encoding is
/// live at any time, so "the other register is null" never needs checking.
#[derive(Debug, Clone, PartialEq)]
#[enum_dispatch]
pub(crate) enum Register {
    Sparse(SparseRegister),
    Dense(DenseRegister),
}

/// Length of the trailing run of zeros in `w` plus one, where `w` holds
/// `width` significant bits. `rank(0, width) == width + 1` keeps the rule
/// total for hashes whose upper bits are all zero.
#[inline]
pub(crate) fn rank(w: u64, width: u32) -> u8 {
    if w == 0 {
        (width + 1) as u8
    } else {
        (w.trailing_zeros() + 1) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank() {
        assert_eq!(rank(1, 50), 1);
        assert_eq!(rank(0b1000, 50), 4);
        assert_eq!(rank(u64::MAX, 39), 1);
        // all-zero input counts the full word width
        assert_eq!(rank(0, 50), 51);
        assert_eq!(rank(0, 39), 40);
    }
}
