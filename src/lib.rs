//! `hyperloglog` is a Rust crate for estimating the number of distinct
//! elements in a stream or dataset using sub-linear memory.
//!
//! The estimator keeps `2^p` registers and answers with a bounded relative
//! standard error of `1.04 / sqrt(2^p)`. Low cardinalities are tracked in a
//! compact sparse encoding at a higher temporary precision and promoted to
//! the dense register array exactly once, when the sparse list outgrows its
//! memory advantage. Estimators with equal parameters can be merged without
//! losing accuracy.
//!
//! The core consumes 64-bit hash values; hashing of arbitrary items is a
//! thin wrapper around it. See [`estimator`] for the data-structure design.
//!
//! An estimator is a single-threaded mutable value: no operation blocks or
//! performs I/O, and sharing one instance across threads is the caller's
//! job (a mutex around the instance suffices).
mod builder;
mod dense;
pub mod estimator;
mod error;
mod register;
#[cfg(feature = "with_serde")]
mod serde;
mod sparse;

pub use builder::HyperLogLogBuilder;
pub use error::Error;
pub use estimator::HyperLogLog;
pub use register::Encoding;
