//! Streaming cardinality estimator over 64-bit hash values.
//!
//! # Data-structure design rationale
//!
//! ## Dual-encoding registers
//! An estimator owns exactly one register at a time:
//! - `Sparse` tracks observations as packed (index, value) pairs at the
//!   higher temporary precision `p' = 25`, so low cardinalities are counted
//!   almost exactly while memory stays proportional to the number of
//!   distinct indices seen.
//! - `Dense` is the classic `2^p`-slot array used once the sparse list would
//!   outgrow its memory advantage.
//!
//! The transition is one-way: when the sparse list exceeds the promotion
//! threshold, every sparse entry is projected down to dense precision and
//! the sparse storage is dropped.
//!
//! ## Constant-time estimation inputs
//! The dense register maintains its zero-slot count and per-slot `2^(-v)`
//! terms incrementally, so `count` costs one index-ordered pass over cached
//! terms and no recomputation of powers.
//!
//! ## Estimation
//! The dense estimate is the bias-corrected harmonic mean
//! `alpha * m^2 / sum`, replaced by linear counting over the zero slots in
//! the short range and stretched by a hash-saturation correction when the
//! configured hash domain is narrower than 64 bits. Sparse estimates use
//! linear counting at precision `p'` directly.
//!
//! ## Expected error
//! The relative standard error is `1.04 / sqrt(2^p)`:
//! p = 10: 3.25%, p = 12: 1.62%, p = 14: 0.81%, p = 16: 0.41%.

use std::fmt::{Debug, Formatter};
use std::hash::{BuildHasher, BuildHasherDefault, Hash, Hasher};
use std::mem::size_of;

use wyhash::WyHash;

use crate::builder::HyperLogLogBuilder;
use crate::dense::DenseRegister;
use crate::error::Error;
use crate::register::{Encoding, Register, RegisterOps};
use crate::sparse::{project_entry, SparseRegister, P_PRIME};

/// HyperLogLog cardinality estimator with sparse and dense register
/// encodings.
///
/// The estimator consumes 64-bit hash values via [`add`](Self::add); the
/// generic [`insert`](Self::insert) wrapper hashes arbitrary items with `H`
/// (wyhash by default) and delegates. Estimates are cached and only
/// recomputed after a mutation.
pub struct HyperLogLog<H: Hasher + Default = WyHash> {
    /// Register-index bit count; `m = 2^p` dense registers.
    p: u32,
    /// Effective hash width in bits, capped at 128.
    hash_bits: u32,
    /// Whether an external serializer bit-packs the dense registers.
    bit_pack: bool,
    /// Precomputed `alpha * m^2` bias-correction factor.
    alpha_mm: f64,
    /// Sparse size above which the register is promoted to dense.
    promotion_threshold: usize,
    /// The live register; exactly one encoding at a time.
    register: Register,
    /// Last computed cardinality; cleared by register mutations.
    cached_count: Option<u64>,
    /// Zero-sized build hasher for the generic insert wrapper.
    build_hasher: BuildHasherDefault<H>,
}

impl HyperLogLog<WyHash> {
    /// Create an estimator with the default configuration: precision 14,
    /// 64-bit hashing, sparse initial encoding, bit-packing on.
    pub fn new() -> Self {
        Self::with_config(14, 64, Encoding::Sparse, true)
    }

    /// Start building an estimator with non-default parameters.
    pub fn builder() -> HyperLogLogBuilder<WyHash> {
        HyperLogLogBuilder::default()
    }
}

impl<H: Hasher + Default> HyperLogLog<H> {
    /// Construct from already-validated parameters.
    pub(crate) fn with_config(p: u32, hash_bits: u32, encoding: Encoding, bit_pack: bool) -> Self {
        let m = 1usize << p;
        let alpha = match hash_bits {
            0..=16 => 0.673,
            17..=32 => 0.697,
            33..=64 => 0.709,
            _ => 0.7213 / (1.0 + 1.079 / m as f64),
        };
        let register = match encoding {
            Encoding::Sparse => Register::Sparse(SparseRegister::new(p)),
            Encoding::Dense => Register::Dense(DenseRegister::new(p)),
        };
        Self {
            p,
            hash_bits,
            bit_pack,
            alpha_mm: alpha * (m as f64) * (m as f64),
            promotion_threshold: if bit_pack { (m * 6 / 8) / 5 } else { m / 3 },
            register,
            cached_count: None,
            build_hasher: BuildHasherDefault::default(),
        }
    }

    /// Hash an item with `H` and submit the 64-bit hash value.
    #[inline]
    pub fn insert<T: Hash + ?Sized>(&mut self, item: &T) {
        let mut hasher = self.build_hasher.build_hasher();
        item.hash(&mut hasher);
        self.add(hasher.finish());
    }

    /// Submit a 64-bit hash value.
    #[inline]
    pub fn add(&mut self, hash: u64) {
        if self.register.add(hash) {
            self.cached_count = None;
        }
        self.maybe_promote();
    }

    /// Estimated number of distinct hash values submitted so far.
    ///
    /// Returns the cached value when no mutation happened since the last
    /// call; otherwise compacts the sparse register (if live), recomputes,
    /// and refreshes the cache.
    pub fn count(&mut self) -> u64 {
        if let Some(count) = self.cached_count {
            return count;
        }
        if let Register::Sparse(sparse) = &mut self.register {
            sparse.compact();
        }
        let count = self.compute_count();
        self.cached_count = Some(count);
        count
    }

    /// Relative standard error of dense estimates, `1.04 / sqrt(m)`.
    pub fn standard_error(&self) -> f64 {
        1.04 / ((1u64 << self.p) as f64).sqrt()
    }

    /// The live register encoding.
    pub fn encoding(&self) -> Encoding {
        match self.register {
            Register::Sparse(_) => Encoding::Sparse,
            Register::Dense(_) => Encoding::Dense,
        }
    }

    /// Register-index bit count.
    pub fn precision(&self) -> u32 {
        self.p
    }

    /// Effective hash width in bits.
    pub fn hash_bits(&self) -> u32 {
        self.hash_bits
    }

    /// Whether an external serializer is expected to bit-pack the dense
    /// registers.
    pub fn bit_packed(&self) -> bool {
        self.bit_pack
    }

    /// Memory footprint in bytes, including heap-owned register storage.
    pub fn size_of(&self) -> usize {
        size_of::<Self>() + self.register.size_of()
    }

    /// Fold `other` into `self`. Both estimators must share precision and
    /// hash width. A sparse peer is never mutated; a sparse receiver
    /// promotes to dense when the peer is dense or the union outgrows the
    /// threshold.
    pub fn merge(&mut self, other: &Self) -> Result<(), Error> {
        if self.p != other.p || self.hash_bits != other.hash_bits {
            return Err(Error::IncompatibleMerge {
                lhs_p: self.p,
                rhs_p: other.p,
                lhs_hash_bits: self.hash_bits,
                rhs_hash_bits: other.hash_bits,
            });
        }
        match (&mut self.register, &other.register) {
            (Register::Sparse(lhs), Register::Sparse(rhs)) => lhs.merge(rhs),
            (Register::Dense(lhs), Register::Dense(rhs)) => lhs.merge(rhs)?,
            (Register::Dense(lhs), Register::Sparse(rhs)) => rhs.project_into(lhs),
            (Register::Sparse(lhs), Register::Dense(rhs)) => {
                let mut dense = DenseRegister::new(self.p);
                lhs.project_into(&mut dense);
                dense.merge(rhs)?;
                self.register = Register::Dense(dense);
            }
        }
        self.cached_count = None;
        self.maybe_promote();
        Ok(())
    }

    /// Dense register values in index order, for external serializers.
    /// `None` while the sparse encoding is live.
    pub fn dense_register(&self) -> Option<&[u8]> {
        match &self.register {
            Register::Dense(dense) => Some(dense.registers()),
            Register::Sparse(_) => None,
        }
    }

    /// Compacted sparse entries (value in the low 6 bits, 25-bit index
    /// above), for external serializers. `None` once dense.
    pub fn sparse_register(&self) -> Option<Vec<u32>> {
        match &self.register {
            Register::Sparse(sparse) => Some(sparse.compacted()),
            Register::Dense(_) => None,
        }
    }

    /// Bulk-load dense register values, slot by slot through the monotone
    /// guard. A sparse estimator promotes first, since dense state has no
    /// sparse representation. `bytes` must hold exactly `2^p` values.
    pub fn set_dense_register(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let m = 1usize << self.p;
        if bytes.len() != m {
            return Err(Error::RegisterSizeMismatch {
                expected: m,
                got: bytes.len(),
            });
        }
        self.promote();
        if let Register::Dense(dense) = &mut self.register {
            for (idx, &value) in bytes.iter().enumerate() {
                dense.set(idx, value);
            }
        }
        self.cached_count = None;
        Ok(())
    }

    /// Bulk-load packed sparse entries through the sparse set path. A dense
    /// estimator projects each entry down instead, mirroring the
    /// dense-with-sparse merge arm.
    pub fn set_sparse_register(&mut self, entries: &[u32]) {
        match &mut self.register {
            Register::Sparse(sparse) => {
                for &entry in entries {
                    let (idx, value) = SparseRegister::unpack(entry);
                    sparse.set(idx, value);
                }
            }
            Register::Dense(dense) => {
                for &entry in entries {
                    project_entry(entry, dense);
                }
            }
        }
        self.cached_count = None;
        self.maybe_promote();
    }

    /// Seed the count cache, letting a deserializer hand back a previously
    /// computed cardinality without touching the registers. The next
    /// mutation clears it like any cached count.
    pub fn set_count(&mut self, count: u64) {
        self.cached_count = Some(count);
    }

    /// Promote to dense when the sparse register outgrew the threshold.
    /// The cheap size upper bound avoids compacting on every call; the
    /// exact size is re-checked after a compaction before committing.
    fn maybe_promote(&mut self) {
        if let Register::Sparse(sparse) = &mut self.register {
            if sparse.size_upper_bound() <= self.promotion_threshold {
                return;
            }
            sparse.compact();
            if sparse.count_distinct() > self.promotion_threshold {
                self.promote();
            }
        }
    }

    /// Unconditionally switch to the dense encoding, projecting any sparse
    /// content down. No-op when already dense.
    fn promote(&mut self) {
        if let Register::Sparse(sparse) = &self.register {
            let mut dense = DenseRegister::new(self.p);
            sparse.project_into(&mut dense);
            self.register = Register::Dense(dense);
        }
    }

    /// Uncached estimate for the current register state.
    fn compute_count(&self) -> u64 {
        match &self.register {
            Register::Sparse(sparse) => {
                let m_prime = 1u64 << P_PRIME;
                linear_count(m_prime, m_prime - sparse.count_distinct() as u64)
            }
            Register::Dense(dense) => self.estimate_dense(dense),
        }
    }

    fn estimate_dense(&self, dense: &DenseRegister) -> u64 {
        let m = dense.len() as u64;
        let zeros = dense.num_zeros() as u64;
        let mut estimate = (self.alpha_mm / dense.sum_inverse_pow2()) as u64;

        if (estimate as f64) <= 2.5 * (m as f64) {
            // short-range bias: prefer linear counting while zero slots remain
            if zeros > 0 {
                estimate = linear_count(m, zeros);
            }
        } else if self.hash_bits < 64 {
            // a narrow hash domain saturates: collisions pull the raw estimate
            // below the true cardinality, compensated by the log stretch
            let pow = 1u64 << self.hash_bits;
            // the inner comparison carries over the original integer
            // expression, where 1 / 30 truncates to zero, so the float
            // comparison is the effective gate and the inner one is redundant
            if (estimate as f64) > 0.033333 * (pow as f64) && estimate > (1u64 / 30) * pow {
                estimate = (-(pow as f64) * (1.0 - (estimate as f64) / (pow as f64)).ln()) as u64;
            }
        }
        estimate
    }
}

/// Linear counting estimate: `round(size * ln(size / zeros))`. Callers
/// guarantee `zeros > 0`.
#[inline]
fn linear_count(size: u64, zeros: u64) -> u64 {
    ((size as f64) * ((size as f64) / (zeros as f64)).ln()).round() as u64
}

impl Default for HyperLogLog<WyHash> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Hasher + Default> Clone for HyperLogLog<H> {
    fn clone(&self) -> Self {
        Self {
            p: self.p,
            hash_bits: self.hash_bits,
            bit_pack: self.bit_pack,
            alpha_mm: self.alpha_mm,
            promotion_threshold: self.promotion_threshold,
            register: self.register.clone(),
            cached_count: self.cached_count,
            build_hasher: BuildHasherDefault::default(),
        }
    }
}

impl<H: Hasher + Default> PartialEq for HyperLogLog<H> {
    /// Estimators compare equal when their configuration and register
    /// contents match; sparse registers compare on compacted state.
    fn eq(&self, other: &Self) -> bool {
        self.p == other.p
            && self.hash_bits == other.hash_bits
            && self.bit_pack == other.bit_pack
            && self.register == other.register
    }
}

impl<H: Hasher + Default> Debug for HyperLogLog<H> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{ encoding: {:?}, estimate: {}, size: {} }}",
            self.encoding(),
            self.compute_count(),
            self.size_of()
        )
    }
}
