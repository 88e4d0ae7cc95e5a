//! Multi-leaf proofs with the flag-encoded reconstruction protocol.
//!
//! Generation walks a descending-index work queue over the tree: each
//! step either pairs a node with a sibling that is already scheduled for
//! reconstruction (flag `true`) or pulls the sibling from the tree into
//! `proof` (flag `false`). Verification replays the flags against a FIFO
//! queue seeded with the leaves. The FIFO discipline is load-bearing; a
//! LIFO pairs the wrong nodes on anything non-trivial.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::tree::{check_leaf, parent, sibling};
use crate::{hash_node, Bytes32, Error, Result};

/// Compact inclusion certificate for a set of leaves.
///
/// `leaves` are ordered by descending tree index as of generation time;
/// the verifier's reconstruction depends on that order. Every generated
/// proof satisfies `leaves.len() + proof.len() == proof_flags.len() + 1`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiProof {
    pub leaves: Vec<Bytes32>,
    pub proof: Vec<Bytes32>,
    pub proof_flags: Vec<bool>,
}

/// Generates a proof covering the leaves at the given tree indices.
pub fn get_multi_proof(tree: &[Bytes32], indices: &[usize]) -> Result<MultiProof> {
    for &i in indices {
        check_leaf(tree.len(), i)?;
    }

    let mut sorted = indices.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    if sorted.windows(2).any(|w| w[0] == w[1]) {
        return Err(Error::DuplicatedIndex);
    }

    // Work queue of node indices, kept in descending order so siblings
    // are always adjacent at the head.
    let mut queue: VecDeque<usize> = sorted.iter().copied().collect();
    let mut proof = Vec::new();
    let mut proof_flags = Vec::new();

    while let Some(&j) = queue.front() {
        if j == 0 {
            break;
        }
        queue.pop_front();
        let s = sibling(j);
        let p = parent(j);

        if queue.front() == Some(&s) {
            proof_flags.push(true);
            queue.pop_front();
        } else {
            proof_flags.push(false);
            proof.push(tree[s]);
        }

        let pos = queue.partition_point(|&x| x > p);
        queue.insert(pos, p);
    }

    if queue.len() != 1 {
        // Only reachable with empty input: the queue never bubbled up to
        // the root, so the verifier gets the root as a trailing proof
        // entry instead.
        proof.push(tree[0]);
    }

    let leaves = sorted.iter().map(|&i| tree[i]).collect();
    Ok(MultiProof {
        leaves,
        proof,
        proof_flags,
    })
}

/// Recomputes the root a [`MultiProof`] commits to.
///
/// Fails with [`Error::Invariant`] when the structural invariant does not
/// hold or the flags walk off either the queue or the proof.
pub fn process_multi_proof(mp: &MultiProof) -> Result<Bytes32> {
    if mp.leaves.len() + mp.proof.len() != mp.proof_flags.len() + 1 {
        return Err(Error::Invariant);
    }

    let mut queue: VecDeque<Bytes32> = mp.leaves.iter().copied().collect();
    let mut proof_iter = mp.proof.iter();

    for &flag in &mp.proof_flags {
        let a = queue.pop_front().ok_or(Error::Invariant)?;
        let b = if flag {
            queue.pop_front().ok_or(Error::Invariant)?
        } else {
            *proof_iter.next().ok_or(Error::Invariant)?
        };
        queue.push_back(hash_node(a, b));
    }

    if queue.len() == 1 {
        return Ok(queue[0]);
    }
    // Trailing-root proofs reconstruct nothing; the single unread proof
    // entry is the root itself.
    if queue.is_empty() {
        if let Some(&tail) = proof_iter.next() {
            return Ok(tail);
        }
    }
    Err(Error::Invariant)
}
