//! ABI-style leaf encoding for structured records.
//!
//! A leaf-encoding schema is an ordered list of type tags
//! (`["address", "uint256"]`, ...). Every field encodes to exactly 32
//! bytes; the concatenation of all fields is double-hashed into the leaf.
//! Dynamic types (`string`, `bytes`) contribute the keccak of their
//! contents, so the word stays fixed-width.
//!
//! Record scalars arrive as [`serde_json::Value`]s, matching the
//! persisted tree format: integers may be JSON numbers or decimal /
//! `0x`-hex strings.

use alloy_primitives::{I256, U256};
use serde_json::Value;

use crate::{hash_leaf, keccak256, Bytes32, Error, Result};

/// Encodes one record through the schema and double-hashes it into a
/// leaf.
///
/// Fails with [`Error::MismatchedCount`] when schema and record lengths
/// differ, and with the per-field errors of [`encode_value`] otherwise.
pub fn encode_and_hash(types: &[String], values: &[Value]) -> Result<Bytes32> {
    if types.len() != values.len() {
        return Err(Error::MismatchedCount);
    }
    let mut buf = Vec::with_capacity(types.len() * 32);
    for (typ, val) in types.iter().zip(values) {
        buf.extend_from_slice(&encode_value(typ, val)?);
    }
    Ok(hash_leaf(&buf))
}

/// Encodes a single scalar to its 32-byte ABI word.
pub fn encode_value(typ: &str, val: &Value) -> Result<[u8; 32]> {
    match typ {
        "address" => encode_address(val),
        "bytes32" => encode_bytes32(val),
        "bool" => encode_bool(val),
        "string" => encode_string(val),
        "bytes" => encode_bytes(val),
        t if t.starts_with("uint") => encode_uint(val),
        t if t.starts_with("int") => encode_int(val),
        other => Err(Error::UnsupportedType(other.to_string())),
    }
}

fn encode_address(val: &Value) -> Result<[u8; 32]> {
    let s = val.as_str().ok_or(Error::AbiEncode)?;
    let data = hex::decode(s.strip_prefix("0x").unwrap_or(s)).map_err(|_| Error::AbiEncode)?;
    if data.len() != 20 {
        return Err(Error::AbiEncode);
    }
    let mut out = [0u8; 32];
    out[12..].copy_from_slice(&data);
    Ok(out)
}

fn encode_bytes32(val: &Value) -> Result<[u8; 32]> {
    let s = val.as_str().ok_or(Error::AbiEncode)?;
    Ok(Bytes32::from_hex(s)?.to_array())
}

fn encode_bool(val: &Value) -> Result<[u8; 32]> {
    let b = val.as_bool().ok_or(Error::AbiEncode)?;
    let mut out = [0u8; 32];
    out[31] = b as u8;
    Ok(out)
}

fn encode_string(val: &Value) -> Result<[u8; 32]> {
    let s = val.as_str().ok_or(Error::AbiEncode)?;
    Ok(keccak256(s.as_bytes()).to_array())
}

fn encode_bytes(val: &Value) -> Result<[u8; 32]> {
    let s = val.as_str().ok_or(Error::AbiEncode)?;
    let data = hex::decode(s.strip_prefix("0x").unwrap_or(s)).map_err(|_| Error::AbiEncode)?;
    Ok(keccak256(&data).to_array())
}

fn encode_uint(val: &Value) -> Result<[u8; 32]> {
    let n = match val {
        Value::Number(num) => {
            if let Some(u) = num.as_u64() {
                U256::from(u)
            } else {
                return Err(Error::AbiEncode);
            }
        }
        // U256 parsing takes decimal or 0x-prefixed hex
        Value::String(s) => s.trim().parse::<U256>().map_err(|_| Error::AbiEncode)?,
        _ => return Err(Error::AbiEncode),
    };
    Ok(n.to_be_bytes())
}

fn encode_int(val: &Value) -> Result<[u8; 32]> {
    let n = match val {
        Value::Number(num) => {
            if let Some(i) = num.as_i64() {
                I256::try_from(i).map_err(|_| Error::AbiEncode)?
            } else if let Some(u) = num.as_u64() {
                I256::try_from(u).map_err(|_| Error::AbiEncode)?
            } else {
                return Err(Error::AbiEncode);
            }
        }
        Value::String(s) => s.trim().parse::<I256>().map_err(|_| Error::AbiEncode)?,
        _ => return Err(Error::AbiEncode),
    };
    // two's complement, big-endian
    Ok(n.to_be_bytes())
}
