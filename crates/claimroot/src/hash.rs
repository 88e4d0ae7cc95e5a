//! Keccak-256 hash primitives.

use tiny_keccak::{Hasher, Keccak};

use crate::Bytes32;

/// Keccak-256 (the legacy pre-NIST variant, not SHA3-256) of the input.
pub fn keccak256(data: &[u8]) -> Bytes32 {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    Bytes32::new(output)
}

/// Leaf hash: `keccak256(keccak256(data))`.
///
/// The double hash keeps a 64-byte leaf preimage from doubling as a
/// sorted pair of internal nodes.
pub fn hash_leaf(data: &[u8]) -> Bytes32 {
    keccak256(keccak256(data).as_bytes())
}

/// Commutative pair hash: `keccak256(min(a, b) || max(a, b))`.
pub fn hash_node(a: Bytes32, b: Bytes32) -> Bytes32 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut hasher = Keccak::v256();
    hasher.update(lo.as_bytes());
    hasher.update(hi.as_bytes());
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    Bytes32::new(output)
}
