//! Error taxonomy for tree construction, proofs, and serialization.

use thiserror::Error;

/// Errors surfaced by tree, proof, and leaf-encoding operations.
///
/// All fallible operations return these directly; there is no internal
/// retry or recovery.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Construction or rendering was given zero leaves.
    #[error("expected non-zero number of leaves")]
    EmptyTree,

    /// A byte string was not exactly 32 bytes where a node value is
    /// required.
    #[error("expected 32 bytes")]
    InvalidNodeLength,

    /// A string is not valid hex.
    #[error("invalid hex string")]
    InvalidHex,

    /// The index refers to an internal node, not a leaf.
    #[error("index is not a leaf")]
    NotALeaf,

    #[error("index out of bounds")]
    IndexOutOfBounds,

    #[error("leaf is not in tree")]
    LeafNotInTree,

    /// A multi-proof was requested with repeated indices.
    #[error("cannot prove duplicated index")]
    DuplicatedIndex,

    /// A serialized tree carries a format tag this facade does not read.
    #[error("invalid tree format")]
    InvalidFormat,

    /// Structural or relational checks failed on load or during
    /// multi-proof reconstruction.
    #[error("invariant violation")]
    Invariant,

    /// A record value is incompatible with its declared type tag.
    #[error("abi encoding error")]
    AbiEncode,

    /// The leaf-encoding schema names an unknown type tag.
    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    /// Schema and record have different lengths.
    #[error("mismatched leaf encoding count")]
    MismatchedCount,
}
