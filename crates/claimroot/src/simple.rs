//! Merkle tree over raw 32-byte leaf values.

use serde::{Deserialize, Serialize};

use crate::tree::{get_proof, is_valid_tree, make_tree, render_tree};
use crate::{
    get_multi_proof, hash_leaf, process_multi_proof, process_proof, Bytes32, Error, MultiProof,
    Result,
};

const SIMPLE_FORMAT: &str = "simple-v1";

/// A leaf value paired with its position in the flat tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleValue {
    pub value: Bytes32,
    pub tree_index: usize,
}

/// On-disk shape of a [`SimpleMerkleTree`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimpleTreeData {
    pub format: String,
    pub tree: Vec<Bytes32>,
    pub values: Vec<SimpleValue>,
}

/// Merkle tree whose leaves are caller-supplied 32-byte values.
///
/// Each value is double-hashed into its leaf, so a proof consumer only
/// needs the raw value and the sibling path. Immutable after
/// construction.
pub struct SimpleMerkleTree {
    tree: Vec<Bytes32>,
    values: Vec<SimpleValue>,
}

impl SimpleMerkleTree {
    /// Builds a tree over `values`.
    ///
    /// With `sort_leaves` the leaves are ordered by their hash, making
    /// the root independent of input order. Values keep their original
    /// positions for [`SimpleMerkleTree::at`] and the dump format; only
    /// `tree_index` reflects the sort.
    pub fn new(values: &[Bytes32], sort_leaves: bool) -> Result<Self> {
        let mut items: Vec<(Bytes32, Bytes32, usize)> = values
            .iter()
            .enumerate()
            .map(|(i, v)| (*v, hash_leaf(v.as_bytes()), i))
            .collect();

        if sort_leaves {
            items.sort_by(|a, b| a.1.cmp(&b.1));
        }

        let leaves: Vec<Bytes32> = items.iter().map(|it| it.1).collect();
        let tree = make_tree(&leaves)?;

        let mut vals = vec![
            SimpleValue {
                value: Bytes32::ZERO,
                tree_index: 0,
            };
            items.len()
        ];
        for (pos, (value, _, orig)) in items.iter().enumerate() {
            vals[*orig] = SimpleValue {
                value: *value,
                tree_index: tree.len() - 1 - pos,
            };
        }

        Ok(Self { tree, values: vals })
    }

    /// Loads a tree from its serialized form, revalidating everything.
    pub fn load(data: SimpleTreeData) -> Result<Self> {
        if data.format != SIMPLE_FORMAT {
            return Err(Error::InvalidFormat);
        }
        let tree = Self {
            tree: data.tree,
            values: data.values,
        };
        tree.validate()?;
        Ok(tree)
    }

    pub fn root(&self) -> Bytes32 {
        self.tree[0]
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The value at external index `i`, in original input order.
    pub fn at(&self, i: usize) -> Option<Bytes32> {
        self.values.get(i).map(|v| v.value)
    }

    /// Iterates `(index, value)` pairs in original input order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, Bytes32)> + '_ {
        self.values.iter().enumerate().map(|(i, v)| (i, v.value))
    }

    /// Re-derives every leaf from its value and checks the full tree.
    pub fn validate(&self) -> Result<()> {
        for v in &self.values {
            if v.tree_index >= self.tree.len() {
                return Err(Error::IndexOutOfBounds);
            }
            if self.tree[v.tree_index] != hash_leaf(v.value.as_bytes()) {
                return Err(Error::Invariant);
            }
        }
        if !is_valid_tree(&self.tree) {
            return Err(Error::Invariant);
        }
        Ok(())
    }

    fn leaf_index(&self, leaf: Bytes32) -> Result<usize> {
        let h = hash_leaf(leaf.as_bytes());
        for (i, v) in self.values.iter().enumerate() {
            if self.tree[v.tree_index] == h && v.value == leaf {
                return Ok(i);
            }
        }
        Err(Error::LeafNotInTree)
    }

    /// Proof for the given value; `LeafNotInTree` when absent.
    pub fn get_proof(&self, leaf: Bytes32) -> Result<Vec<Bytes32>> {
        let i = self.leaf_index(leaf)?;
        self.get_proof_by_index(i)
    }

    /// Proof for the value at external index `i`.
    pub fn get_proof_by_index(&self, i: usize) -> Result<Vec<Bytes32>> {
        let v = self.values.get(i).ok_or(Error::IndexOutOfBounds)?;
        get_proof(&self.tree, v.tree_index)
    }

    /// Whether `proof` shows `leaf` to be part of this tree.
    pub fn verify(&self, leaf: Bytes32, proof: &[Bytes32]) -> bool {
        process_proof(hash_leaf(leaf.as_bytes()), proof) == self.root()
    }

    /// Multi-proof for the given values.
    pub fn get_multi_proof(&self, leaves: &[Bytes32]) -> Result<MultiProof> {
        let indices = leaves
            .iter()
            .map(|&leaf| self.leaf_index(leaf))
            .collect::<Result<Vec<_>>>()?;
        self.get_multi_proof_by_indices(&indices)
    }

    /// Multi-proof for the values at the given external indices.
    ///
    /// The returned `leaves` hold the original (pre-hash) values in
    /// descending tree-index order, so verifiers re-derive each leaf
    /// hash.
    pub fn get_multi_proof_by_indices(&self, indices: &[usize]) -> Result<MultiProof> {
        let mut entries = Vec::with_capacity(indices.len());
        for &i in indices {
            let v = self.values.get(i).ok_or(Error::IndexOutOfBounds)?;
            entries.push((v.tree_index, v.value));
        }
        let tree_indices: Vec<usize> = entries.iter().map(|e| e.0).collect();
        let mut mp = get_multi_proof(&self.tree, &tree_indices)?;

        // swap the hashed leaves for the raw values, in the same
        // descending tree-index order the proof was generated with
        entries.sort_by(|a, b| b.0.cmp(&a.0));
        mp.leaves = entries.into_iter().map(|e| e.1).collect();
        Ok(mp)
    }

    /// Checks a multi-proof whose `leaves` are raw values.
    pub fn verify_multi_proof(&self, mp: &MultiProof) -> Result<bool> {
        let hashed = MultiProof {
            leaves: mp
                .leaves
                .iter()
                .map(|leaf| hash_leaf(leaf.as_bytes()))
                .collect(),
            proof: mp.proof.clone(),
            proof_flags: mp.proof_flags.clone(),
        };
        Ok(process_multi_proof(&hashed)? == self.root())
    }

    /// Serializes the tree.
    pub fn dump(&self) -> SimpleTreeData {
        SimpleTreeData {
            format: SIMPLE_FORMAT.to_string(),
            tree: self.tree.clone(),
            values: self.values.clone(),
        }
    }

    /// ASCII rendering of the underlying tree.
    pub fn render(&self) -> Result<String> {
        render_tree(&self.tree)
    }
}

/// Root-only verification: no tree instance required.
pub fn verify_simple(root: Bytes32, leaf: Bytes32, proof: &[Bytes32]) -> bool {
    process_proof(hash_leaf(leaf.as_bytes()), proof) == root
}
