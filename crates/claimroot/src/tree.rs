//! Array-layout binary Merkle tree.
//!
//! A tree over `n` leaves is a flat `Vec<Bytes32>` of length `2n-1` in
//! heap order: the root at index 0, node `i` with children `2i+1` and
//! `2i+2`. Leaves occupy the tail positions `n-1..=2n-2`, with leaf 0 at
//! the last position. The layout keeps sibling/parent lookups to pure
//! index arithmetic with no per-node allocation.

use crate::{hash_node, Bytes32, Error, Result};

pub(crate) fn left_child(i: usize) -> usize {
    2 * i + 1
}

pub(crate) fn right_child(i: usize) -> usize {
    2 * i + 2
}

pub(crate) fn parent(i: usize) -> usize {
    (i - 1) / 2
}

pub(crate) fn sibling(i: usize) -> usize {
    ((i + 1) ^ 1) - 1
}

fn is_internal_node(len: usize, i: usize) -> bool {
    left_child(i) < len
}

fn is_leaf_node(len: usize, i: usize) -> bool {
    i < len && !is_internal_node(len, i)
}

pub(crate) fn check_leaf(len: usize, i: usize) -> Result<()> {
    if i >= len {
        return Err(Error::IndexOutOfBounds);
    }
    if !is_leaf_node(len, i) {
        return Err(Error::NotALeaf);
    }
    Ok(())
}

/// Builds the array-layout tree from leaf hashes.
///
/// Leaf `i` lands at position `2n-2-i`. Callers wanting an input-order
/// independent root sort the leaves first; the facades do this when
/// constructed with `sort_leaves`.
pub fn make_tree(leaves: &[Bytes32]) -> Result<Vec<Bytes32>> {
    if leaves.is_empty() {
        return Err(Error::EmptyTree);
    }
    let len = 2 * leaves.len() - 1;
    let mut tree = vec![Bytes32::ZERO; len];
    for (i, leaf) in leaves.iter().enumerate() {
        tree[len - 1 - i] = *leaf;
    }
    for i in (0..len - leaves.len()).rev() {
        tree[i] = hash_node(tree[left_child(i)], tree[right_child(i)]);
    }
    Ok(tree)
}

/// Sibling path from the leaf at `index` up to the root (root excluded).
pub fn get_proof(tree: &[Bytes32], index: usize) -> Result<Vec<Bytes32>> {
    check_leaf(tree.len(), index)?;
    let mut proof = Vec::new();
    let mut current = index;
    while current > 0 {
        proof.push(tree[sibling(current)]);
        current = parent(current);
    }
    Ok(proof)
}

/// Folds a leaf through a sibling path, yielding the implied root.
///
/// No position information is needed: the pair hash is commutative.
pub fn process_proof(leaf: Bytes32, proof: &[Bytes32]) -> Bytes32 {
    proof.iter().fold(leaf, |acc, sib| hash_node(acc, *sib))
}

/// Checks that `tree` is a structurally complete Merkle tree whose every
/// internal node hashes its children.
///
/// A node with only a left child (even-length array) is invalid.
pub fn is_valid_tree(tree: &[Bytes32]) -> bool {
    if tree.is_empty() {
        return false;
    }
    for i in 0..tree.len() {
        let (l, r) = (left_child(i), right_child(i));
        if r >= tree.len() {
            if l < tree.len() {
                return false;
            }
            continue;
        }
        if tree[i] != hash_node(tree[l], tree[r]) {
            return false;
        }
    }
    true
}

/// Renders the tree as an ASCII diagram, one `index) hash` line per node.
///
/// Debugging aid; the exact format is not a stable interface.
pub fn render_tree(tree: &[Bytes32]) -> Result<String> {
    if tree.is_empty() {
        return Err(Error::EmptyTree);
    }

    let mut stack: Vec<(usize, Vec<usize>)> = vec![(0, Vec::new())];
    let mut lines = Vec::new();

    while let Some((idx, path)) = stack.pop() {
        let mut line = String::new();
        if let Some((&last, rest)) = path.split_last() {
            for &p in rest {
                line.push_str(["   ", "│  "][p]);
            }
            line.push_str(["└─ ", "├─ "][last]);
        }
        line.push_str(&format!("{}) {}", idx, tree[idx]));
        lines.push(line);

        if right_child(idx) < tree.len() {
            let mut right_path = path.clone();
            right_path.push(0);
            stack.push((right_child(idx), right_path));
            let mut left_path = path;
            left_path.push(1);
            stack.push((left_child(idx), left_path));
        }
    }

    Ok(lines.join("\n"))
}

/// Iterates `(tree_index, value)` over the leaf positions of `tree`.
pub fn tree_leaves(tree: &[Bytes32]) -> impl Iterator<Item = (usize, Bytes32)> + '_ {
    let len = tree.len();
    tree.iter()
        .enumerate()
        .filter(move |(i, _)| is_leaf_node(len, *i))
        .map(|(i, v)| (i, *v))
}

#[cfg(test)]
pub(crate) fn test_leaves(n: usize) -> Vec<Bytes32> {
    (0..n).map(|i| crate::keccak256(&[i as u8])).collect()
}
