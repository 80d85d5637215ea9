//! Estimator construction with parameter validation.

use std::hash::Hasher;
use std::marker::PhantomData;

use wyhash::WyHash;

use crate::error::Error;
use crate::estimator::HyperLogLog;
use crate::register::Encoding;

/// Builder for [`HyperLogLog`] estimators.
///
/// Defaults match [`HyperLogLog::new`]: precision 14, 64 hash bits, sparse
/// initial encoding, bit-packing on.
pub struct HyperLogLogBuilder<H: Hasher + Default = WyHash> {
    p: u32,
    hash_bits: u32,
    encoding: Encoding,
    bit_pack: bool,
    hasher: PhantomData<H>,
}

impl<H: Hasher + Default> Default for HyperLogLogBuilder<H> {
    fn default() -> Self {
        Self {
            p: 14,
            hash_bits: 64,
            encoding: Encoding::Sparse,
            bit_pack: true,
            hasher: PhantomData,
        }
    }
}

impl<H: Hasher + Default> HyperLogLogBuilder<H> {
    /// Register-index bit count; the estimator uses `2^p` dense registers.
    /// Valid values are in `[4, 16]`, checked by [`build`](Self::build).
    pub fn precision(mut self, p: u32) -> Self {
        self.p = p;
        self
    }

    /// Effective hash width in bits. Values above 128 are capped at 128;
    /// widths of 64 and above count with full 64-bit semantics.
    pub fn hash_bits(mut self, bits: u32) -> Self {
        self.hash_bits = bits;
        self
    }

    /// Initial register encoding.
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Whether an external serializer is expected to bit-pack the dense
    /// registers. Packing admits a later sparse-to-dense switch, so it
    /// lowers the promotion threshold.
    pub fn bit_packing(mut self, enabled: bool) -> Self {
        self.bit_pack = enabled;
        self
    }

    /// Validate the parameters and construct the estimator.
    pub fn build(self) -> Result<HyperLogLog<H>, Error> {
        if !(4..=16).contains(&self.p) {
            return Err(Error::InvalidPrecision { p: self.p });
        }
        Ok(HyperLogLog::with_config(
            self.p,
            self.hash_bits.min(128),
            self.encoding,
            self.bit_pack,
        ))
    }
}
