//! Fixed 32-byte node values.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Result};

/// A 32-byte value: a tree node, a proof entry, or a raw leaf.
///
/// Ordering is lexicographic over the raw bytes, which is the order the
/// commutative pair hash sorts by. The zero value is permitted.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Bytes32([u8; 32]);

impl Bytes32 {
    /// The all-zero value.
    pub const ZERO: Bytes32 = Bytes32([0u8; 32]);

    /// Wraps raw bytes.
    pub const fn new(bytes: [u8; 32]) -> Self {
        Bytes32(bytes)
    }

    /// Parses a hex string, with or without the `0x` prefix.
    ///
    /// Rejects non-hex input with [`Error::InvalidHex`] and any decoded
    /// length other than 32 with [`Error::InvalidNodeLength`].
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let data = hex::decode(s).map_err(|_| Error::InvalidHex)?;
        let bytes: [u8; 32] = data.try_into().map_err(|_| Error::InvalidNodeLength)?;
        Ok(Bytes32(bytes))
    }

    /// Like [`Bytes32::from_hex`] but panics on malformed input.
    ///
    /// This is the one caller-elected panicking path in the crate, meant
    /// for hex literals in tests and examples. Library code propagates
    /// [`Error`] instead.
    pub fn must_from_hex(s: &str) -> Self {
        match Self::from_hex(s) {
            Ok(b) => b,
            Err(err) => panic!("must_from_hex: {err}"),
        }
    }

    /// Lowercase hex with the `0x` prefix.
    pub fn hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_array(self) -> [u8; 32] {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl From<[u8; 32]> for Bytes32 {
    fn from(bytes: [u8; 32]) -> Self {
        Bytes32(bytes)
    }
}

impl AsRef<[u8]> for Bytes32 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Bytes32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Bytes32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for Bytes32 {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl Serialize for Bytes32 {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.hex())
    }
}

impl<'de> Deserialize<'de> for Bytes32 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct HexVisitor;

        impl Visitor<'_> for HexVisitor {
            type Value = Bytes32;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a 0x-prefixed 32-byte hex string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Bytes32, E> {
                Bytes32::from_hex(v).map_err(E::custom)
            }
        }

        deserializer.deserialize_str(HexVisitor)
    }
}
