use thiserror::Error;

/// Errors reported by estimator construction and combination.
///
/// All variants are immediate caller errors; none of them is transient or
/// retryable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// Register-index bit count outside the supported `[4, 16]` range.
    #[error("invalid precision {p}, expected a value in [4, 16]")]
    InvalidPrecision { p: u32 },

    /// Attempt to merge estimators built with different parameters.
    #[error("cannot merge estimators with precision {lhs_p} vs {rhs_p} and hash bits {lhs_hash_bits} vs {rhs_hash_bits}")]
    IncompatibleMerge {
        lhs_p: u32,
        rhs_p: u32,
        lhs_hash_bits: u32,
        rhs_hash_bits: u32,
    },

    /// Dense register arrays of different lengths on merge or bulk load.
    #[error("register size mismatch, expected {expected} slots, got {got}")]
    RegisterSizeMismatch { expected: usize, got: usize },
}
