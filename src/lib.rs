//! Adaptive dynamic bit vector with rank/select support.
//!
//! An ordered sequence of bits that keeps each region in whichever internal
//! shape its traffic deserves: small mutable leaves, preprocessed read-only
//! blocks, or a weight-balanced tree over both. Updates expand the block
//! they land in; read-heavy subtrees collapse back into blocks; sparse
//! subtrees are rebuilt compactly. Space stays close to the payload while
//! every operation stays poly-logarithmic.
//!
//! The entry point is [`HybridBitVector`].

/// Raw bit motion between word buffers: range copy, masks, prefix popcount
pub mod bits;

/// Benchmark and sanity drivers for the binary
pub mod commands;

/// Configuration for command line arguments of the driver binary
pub mod config;

/// The adaptive hybrid tree and its public handle `HybridBitVector`
pub mod hybrid;

/// Bounded mutable bit array `Leaf`, the leaf form of the hybrid tree
pub mod leaf;

/// Immutable bit vector `StaticVector` with a two-level rank directory
pub mod static_vector;

/// Contains traits shared by `Leaf` and `StaticVector`
pub mod traits;

pub use hybrid::{HybridBitVector, DEFAULT_THETA};
pub use leaf::Leaf;
pub use static_vector::StaticVector;
pub use traits::{DynBitVec, StaticBitVec};
