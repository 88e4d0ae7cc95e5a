//! Merkle tree over ABI-encoded structured records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::abi::encode_and_hash;
use crate::tree::{get_proof, is_valid_tree, make_tree, render_tree};
use crate::{
    get_multi_proof, process_multi_proof, process_proof, Bytes32, Error, MultiProof, Result,
};

const STANDARD_FORMAT: &str = "standard-v1";

/// A record paired with its position in the flat tree.
///
/// Record scalars stay in their JSON form; the leaf-encoding schema of
/// the owning tree gives them meaning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardValue {
    pub value: Vec<Value>,
    pub tree_index: usize,
}

/// On-disk shape of a [`StandardMerkleTree`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardTreeData {
    pub format: String,
    pub leaf_encoding: Vec<String>,
    pub tree: Vec<Bytes32>,
    pub values: Vec<StandardValue>,
}

/// Merkle tree whose leaves are typed records.
///
/// Each record is encoded through the leaf-encoding schema
/// (see [`crate::abi`]) and double-hashed into its leaf, matching what an
/// on-chain verifier recomputes from calldata. Immutable after
/// construction.
pub struct StandardMerkleTree {
    tree: Vec<Bytes32>,
    values: Vec<StandardValue>,
    leaf_encoding: Vec<String>,
}

impl StandardMerkleTree {
    /// Builds a tree over `values` interpreted through `leaf_encoding`.
    ///
    /// With `sort_leaves` the leaves are ordered by their hash, making
    /// the root independent of input order.
    pub fn new(
        values: Vec<Vec<Value>>,
        leaf_encoding: Vec<String>,
        sort_leaves: bool,
    ) -> Result<Self> {
        let mut items = Vec::with_capacity(values.len());
        for (i, v) in values.into_iter().enumerate() {
            let h = encode_and_hash(&leaf_encoding, &v)?;
            items.push((v, h, i));
        }

        if sort_leaves {
            items.sort_by(|a, b| a.1.cmp(&b.1));
        }

        let leaves: Vec<Bytes32> = items.iter().map(|it| it.1).collect();
        let tree = make_tree(&leaves)?;

        let mut vals = vec![
            StandardValue {
                value: Vec::new(),
                tree_index: 0,
            };
            items.len()
        ];
        for (pos, (value, _, orig)) in items.into_iter().enumerate() {
            vals[orig] = StandardValue {
                value,
                tree_index: tree.len() - 1 - pos,
            };
        }

        Ok(Self {
            tree,
            values: vals,
            leaf_encoding,
        })
    }

    /// Loads a tree from its serialized form, revalidating everything.
    pub fn load(data: StandardTreeData) -> Result<Self> {
        if data.format != STANDARD_FORMAT {
            return Err(Error::InvalidFormat);
        }
        let tree = Self {
            tree: data.tree,
            values: data.values,
            leaf_encoding: data.leaf_encoding,
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

    /// The schema records are encoded with.
    pub fn leaf_encoding(&self) -> &[String] {
        &self.leaf_encoding
    }

    /// The record at external index `i`, in original input order.
    pub fn at(&self, i: usize) -> Option<&[Value]> {
        self.values.get(i).map(|v| v.value.as_slice())
    }

    /// Iterates `(index, record)` pairs in original input order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[Value])> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(|(i, v)| (i, v.value.as_slice()))
    }

    /// Re-encodes every record and checks the full tree.
    pub fn validate(&self) -> Result<()> {
        for v in &self.values {
            if v.tree_index >= self.tree.len() {
                return Err(Error::IndexOutOfBounds);
            }
            if self.tree[v.tree_index] != encode_and_hash(&self.leaf_encoding, &v.value)? {
                return Err(Error::Invariant);
            }
        }
        if !is_valid_tree(&self.tree) {
            return Err(Error::Invariant);
        }
        Ok(())
    }

    fn leaf_index(&self, leaf: &[Value]) -> Result<usize> {
        let h = encode_and_hash(&self.leaf_encoding, leaf)?;
        for (i, v) in self.values.iter().enumerate() {
            if self.tree[v.tree_index] == h {
                return Ok(i);
            }
        }
        Err(Error::LeafNotInTree)
    }

    /// Proof for the given record; `LeafNotInTree` when absent.
    pub fn get_proof(&self, leaf: &[Value]) -> Result<Vec<Bytes32>> {
        let i = self.leaf_index(leaf)?;
        self.get_proof_by_index(i)
    }

    /// Proof for the record at external index `i`.
    pub fn get_proof_by_index(&self, i: usize) -> Result<Vec<Bytes32>> {
        let v = self.values.get(i).ok_or(Error::IndexOutOfBounds)?;
        get_proof(&self.tree, v.tree_index)
    }

    /// Whether `proof` shows `leaf` to be part of this tree.
    pub fn verify(&self, leaf: &[Value], proof: &[Bytes32]) -> Result<bool> {
        let h = encode_and_hash(&self.leaf_encoding, leaf)?;
        Ok(process_proof(h, proof) == self.root())
    }

    /// Multi-proof for the records at the given external indices.
    ///
    /// The returned `leaves` are the records' leaf hashes in descending
    /// tree-index order, ready for the core verifier.
    pub fn get_multi_proof_by_indices(&self, indices: &[usize]) -> Result<MultiProof> {
        let tree_indices = indices
            .iter()
            .map(|&i| {
                self.values
                    .get(i)
                    .map(|v| v.tree_index)
                    .ok_or(Error::IndexOutOfBounds)
            })
            .collect::<Result<Vec<_>>>()?;
        get_multi_proof(&self.tree, &tree_indices)
    }

    /// Checks a multi-proof produced by
    /// [`StandardMerkleTree::get_multi_proof_by_indices`].
    pub fn verify_multi_proof(&self, mp: &MultiProof) -> Result<bool> {
        Ok(process_multi_proof(mp)? == self.root())
    }

    /// Serializes the tree.
    pub fn dump(&self) -> StandardTreeData {
        StandardTreeData {
            format: STANDARD_FORMAT.to_string(),
            leaf_encoding: self.leaf_encoding.clone(),
            tree: self.tree.clone(),
            values: self.values.clone(),
        }
    }

    /// ASCII rendering of the underlying tree.
    pub fn render(&self) -> Result<String> {
        render_tree(&self.tree)
    }
}

/// Root-only verification for a typed record: no tree instance required.
pub fn verify_standard(
    root: Bytes32,
    leaf_encoding: &[String],
    leaf: &[Value],
    proof: &[Bytes32],
) -> Result<bool> {
    let h = encode_and_hash(leaf_encoding, leaf)?;
    Ok(process_proof(h, proof) == root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Vec<String> {
        vec!["address".to_string(), "uint256".to_string()]
    }

    fn pad_addr(n: usize) -> String {
        const DIGITS: &[u8] = b"0123456789abcdef";
        let hex: String = (0..40).map(|i| DIGITS[(n + i) % 16] as char).collect();
        format!("0x{hex}")
    }

    fn airdrop_records(n: usize) -> Vec<Vec<Value>> {
        (1..=n)
            .map(|i| vec![json!(pad_addr(i)), json!(i * 100)])
            .collect()
    }

    #[test]
    fn test_new_and_verify() {
        let records = airdrop_records(8);
        let tree = StandardMerkleTree::new(records.clone(), schema(), true).unwrap();
        assert_eq!(tree.len(), 8);
        for record in &records {
            let proof = tree.get_proof(record).unwrap();
            assert!(tree.verify(record, &proof).unwrap());
        }
    }

    #[test]
    fn test_single_record() {
        let tree = StandardMerkleTree::new(airdrop_records(1), schema(), true).unwrap();
        assert_eq!(tree.len(), 1);
        tree.validate().unwrap();
    }

    #[test]
    fn test_unsorted_mode() {
        let records = airdrop_records(4);
        let tree = StandardMerkleTree::new(records.clone(), schema(), false).unwrap();
        tree.validate().unwrap();
        for record in &records {
            let proof = tree.get_proof(record).unwrap();
            assert!(tree.verify(record, &proof).unwrap());
        }
    }

    #[test]
    fn test_sorted_root_is_permutation_invariant() {
        let records = airdrop_records(6);
        let mut reversed = records.clone();
        reversed.reverse();
        let a = StandardMerkleTree::new(records, schema(), true).unwrap();
        let b = StandardMerkleTree::new(reversed, schema(), true).unwrap();
        assert_eq!(a.root(), b.root());
    }

    #[test]
    fn test_leaf_encoding_accessor() {
        let tree = StandardMerkleTree::new(airdrop_records(2), schema(), true).unwrap();
        assert_eq!(tree.leaf_encoding(), schema().as_slice());
    }

    #[test]
    fn test_at_and_iter_keep_input_order() {
        let records = airdrop_records(4);
        let tree = StandardMerkleTree::new(records.clone(), schema(), true).unwrap();
        for (i, record) in records.iter().enumerate() {
            assert_eq!(tree.at(i), Some(record.as_slice()));
        }
        assert_eq!(tree.at(4), None);
        assert_eq!(tree.iter().count(), 4);
    }

    #[test]
    fn test_get_proof_by_index_bounds() {
        let tree = StandardMerkleTree::new(airdrop_records(4), schema(), true).unwrap();
        for i in 0..4 {
            let proof = tree.get_proof_by_index(i).unwrap();
            let record = tree.at(i).unwrap().to_vec();
            assert!(tree.verify(&record, &proof).unwrap());
        }
        assert_eq!(
            tree.get_proof_by_index(4),
            Err(Error::IndexOutOfBounds)
        );
    }

    #[test]
    fn test_leaf_not_in_tree() {
        let tree = StandardMerkleTree::new(airdrop_records(4), schema(), true).unwrap();
        let stranger = vec![
            json!("0x9999999999999999999999999999999999999999"),
            json!(9999),
        ];
        assert_eq!(tree.get_proof(&stranger), Err(Error::LeafNotInTree));
    }

    #[test]
    fn test_static_verify_accepts_and_rejects() {
        let records = airdrop_records(4);
        let tree = StandardMerkleTree::new(records.clone(), schema(), true).unwrap();
        let proof = tree.get_proof(&records[0]).unwrap();
        assert!(verify_standard(tree.root(), &schema(), &records[0], &proof).unwrap());

        // a root from a different record set must reject the proof
        let other = StandardMerkleTree::new(airdrop_records(5), schema(), true).unwrap();
        assert!(!verify_standard(other.root(), &schema(), &records[0], &proof).unwrap());
    }

    #[test]
    fn test_multi_proof() {
        let tree = StandardMerkleTree::new(airdrop_records(8), schema(), true).unwrap();
        let mp = tree.get_multi_proof_by_indices(&[0, 2, 5]).unwrap();
        assert_eq!(mp.leaves.len(), 3);
        assert_eq!(mp.leaves.len() + mp.proof.len(), mp.proof_flags.len() + 1);
        assert!(tree.verify_multi_proof(&mp).unwrap());

        assert_eq!(
            tree.get_multi_proof_by_indices(&[0, 42]),
            Err(Error::IndexOutOfBounds)
        );
    }

    #[test]
    fn test_dump_load_roundtrip() {
        let tree = StandardMerkleTree::new(airdrop_records(4), schema(), true).unwrap();

        let js = serde_json::to_string_pretty(&tree.dump()).unwrap();
        assert!(js.contains("\"leafEncoding\""));
        assert!(js.contains("\"treeIndex\""));

        let data: StandardTreeData = serde_json::from_str(&js).unwrap();
        let loaded = StandardMerkleTree::load(data).unwrap();
        assert_eq!(loaded.root(), tree.root());
        assert_eq!(loaded.len(), tree.len());
        assert_eq!(loaded.leaf_encoding(), tree.leaf_encoding());
    }

    #[test]
    fn test_load_rejects_wrong_format() {
        for format in ["simple-v1", "nonstandard", ""] {
            let tree = StandardMerkleTree::new(airdrop_records(2), schema(), true).unwrap();
            let mut data = tree.dump();
            data.format = format.to_string();
            assert!(matches!(
                StandardMerkleTree::load(data),
                Err(Error::InvalidFormat)
            ));
        }
    }

    #[test]
    fn test_load_rejects_tampered_record() {
        let tree = StandardMerkleTree::new(airdrop_records(4), schema(), true).unwrap();
        let mut data = tree.dump();
        data.values[0].value[1] = json!(31337);
        assert!(matches!(
            StandardMerkleTree::load(data),
            Err(Error::Invariant)
        ));
    }

    #[test]
    fn test_schema_bytes32_and_uint() {
        let records = vec![
            vec![json!(format!("0x{}", "11".repeat(32))), json!(100)],
            vec![json!(format!("0x{}", "22".repeat(32))), json!(200)],
        ];
        let schema = vec!["bytes32".to_string(), "uint256".to_string()];
        let tree = StandardMerkleTree::new(records.clone(), schema, true).unwrap();
        for record in &records {
            let proof = tree.get_proof(record).unwrap();
            assert!(tree.verify(record, &proof).unwrap());
        }
    }

    #[test]
    fn test_schema_mixed_uint_widths() {
        let records = vec![
            vec![json!(100), json!(200), json!(50)],
            vec![json!(300), json!(400), json!(60)],
        ];
        let schema = vec![
            "uint256".to_string(),
            "uint128".to_string(),
            "uint64".to_string(),
        ];
        let tree = StandardMerkleTree::new(records.clone(), schema, true).unwrap();
        for record in &records {
            let proof = tree.get_proof(record).unwrap();
            assert!(tree.verify(record, &proof).unwrap());
        }
    }

    #[test]
    fn test_schema_bool_string_bytes_int() {
        let records = vec![
            vec![json!(true), json!("hello"), json!("0x1234"), json!(-100)],
            vec![json!(false), json!("world"), json!("0xabcd"), json!(200)],
        ];
        let schema = vec![
            "bool".to_string(),
            "string".to_string(),
            "bytes".to_string(),
            "int256".to_string(),
        ];
        let tree = StandardMerkleTree::new(records.clone(), schema, true).unwrap();
        for record in &records {
            let proof = tree.get_proof(record).unwrap();
            assert!(tree.verify(record, &proof).unwrap());
        }
    }

    #[test]
    fn test_unsupported_schema_tag() {
        let records = vec![vec![json!(1)]];
        let schema = vec!["tuple".to_string()];
        assert!(matches!(
            StandardMerkleTree::new(records, schema, true),
            Err(Error::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_hundred_records() {
        let tree = StandardMerkleTree::new(airdrop_records(100), schema(), true).unwrap();
        assert_eq!(tree.len(), 100);
        tree.validate().unwrap();
        for i in [0usize, 25, 50, 75, 99] {
            let proof = tree.get_proof_by_index(i).unwrap();
            let record = tree.at(i).unwrap().to_vec();
            assert!(tree.verify(&record, &proof).unwrap(), "i={i}");
        }
    }

    #[test]
    fn test_render() {
        let tree = StandardMerkleTree::new(airdrop_records(4), schema(), true).unwrap();
        assert!(tree.render().unwrap().contains("0) "));
    }
}
