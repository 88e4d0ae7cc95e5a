//! Commutative Keccak-256 Merkle trees with on-chain compatible proofs.
//!
//! An issuer builds a tree over a set of records, publishes the root
//! on-chain, and hands each record holder an inclusion proof to present to
//! the verifier contract. Two facades cover the common cases:
//! - [`SimpleMerkleTree`]: leaves are raw 32-byte values
//! - [`StandardMerkleTree`]: leaves are ABI-encoded structured records
//!
//! Internal nodes hash the *sorted* pair of their children, so proofs
//! carry no left/right orientation and verify with the widely deployed
//! on-chain multi-proof protocol. Leaves are double-hashed to keep a
//! 64-byte preimage from being reinterpreted as an internal node pair.
//!
//! Trees are immutable once built and safe to share across threads for
//! concurrent reads.

mod bytes;
mod error;
mod hash;
mod multiproof;
mod simple;
mod standard;
mod tree;

pub mod abi;

pub use bytes::Bytes32;
pub use error::Error;
pub use hash::{hash_leaf, hash_node, keccak256};
pub use multiproof::{get_multi_proof, process_multi_proof, MultiProof};
pub use simple::{verify_simple, SimpleMerkleTree, SimpleTreeData, SimpleValue};
pub use standard::{verify_standard, StandardMerkleTree, StandardTreeData, StandardValue};
pub use tree::{get_proof, is_valid_tree, make_tree, process_proof, render_tree, tree_leaves};

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
