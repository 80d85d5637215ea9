//! # Serde module for HyperLogLog
//!
//! Serialization flattens the estimator into a 5-tuple:
//! `(p, hash_bits, bit_pack, Option<dense bytes>, Option<sparse entries>)`.
//! Exactly one of the two payload options is `Some`, matching the live
//! register encoding; the sparse payload is the compacted entry list.
//!
//! Deserialization rebuilds the estimator through the public bulk-load
//! surface, so every loaded slot passes the same monotone guard as live
//! insertions and the register invariants hold by construction.

use std::hash::Hasher;

use serde::de::Error as _;
use serde::ser::SerializeTuple;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::builder::HyperLogLogBuilder;
use crate::estimator::HyperLogLog;
use crate::register::Encoding;

impl<H: Hasher + Default> Serialize for HyperLogLog<H> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut tup = serializer.serialize_tuple(5)?;
        tup.serialize_element(&self.precision())?;
        tup.serialize_element(&self.hash_bits())?;
        tup.serialize_element(&self.bit_packed())?;
        tup.serialize_element(&self.dense_register())?;
        tup.serialize_element(&self.sparse_register())?;
        tup.end()
    }
}

impl<'de, H: Hasher + Default> Deserialize<'de> for HyperLogLog<H> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (p, hash_bits, bit_pack, dense, sparse): (
            u32,
            u32,
            bool,
            Option<Vec<u8>>,
            Option<Vec<u32>>,
        ) = Deserialize::deserialize(deserializer)?;

        let encoding = if dense.is_some() {
            Encoding::Dense
        } else {
            Encoding::Sparse
        };
        let mut estimator = HyperLogLogBuilder::<H>::default()
            .precision(p)
            .hash_bits(hash_bits)
            .encoding(encoding)
            .bit_packing(bit_pack)
            .build()
            .map_err(D::Error::custom)?;

        if let Some(bytes) = dense {
            estimator
                .set_dense_register(&bytes)
                .map_err(D::Error::custom)?;
        } else if let Some(entries) = sparse {
            estimator.set_sparse_register(&entries);
        }

        Ok(estimator)
    }
}
