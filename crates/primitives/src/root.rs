//! Merkle root digest committed on-chain for every flushed batch.

use std::{fmt, str::FromStr};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::ParseError;

/// Fixed-length digest summarizing one ordered batch of CIDs.
///
/// Rendered as lowercase hex everywhere it leaves the process (logs, dead-letter
/// records, the `OP_RETURN` payload is the raw 32 bytes).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MerkleRoot([u8; 32]);

impl MerkleRoot {
    /// Length of the digest in bytes.
    pub const LEN: usize = 32;

    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<[u8; 32]> for MerkleRoot {
    fn from(value: [u8; 32]) -> Self {
        Self(value)
    }
}

impl From<MerkleRoot> for [u8; 32] {
    fn from(value: MerkleRoot) -> Self {
        value.0
    }
}

impl AsRef<[u8; 32]> for MerkleRoot {
    fn as_ref(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for MerkleRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for MerkleRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MerkleRoot({})", self.to_hex())
    }
}

impl FromStr for MerkleRoot {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| ParseError::InvalidHex(e.to_string()))?;
        let actual = bytes.len();
        let buf: [u8; 32] = bytes.try_into().map_err(|_| ParseError::InvalidLength {
            expected: Self::LEN,
            actual,
        })?;
        Ok(Self(buf))
    }
}

impl Serialize for MerkleRoot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for MerkleRoot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_display_and_parse() {
        let root = MerkleRoot::new([0xab; 32]);
        let hex = root.to_string();
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c == 'a' || c == 'b'));
        assert_eq!(hex.parse::<MerkleRoot>().unwrap(), root);
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        let err = "abcd".parse::<MerkleRoot>().unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidLength {
                expected: 32,
                actual: 2
            }
        );
    }

    #[test]
    fn test_parse_rejects_non_hex() {
        let err = "zz".repeat(32).parse::<MerkleRoot>().unwrap_err();
        assert!(matches!(err, ParseError::InvalidHex(_)));
    }

    #[test]
    fn test_serde_as_hex_string() {
        let root = MerkleRoot::new([1; 32]);
        let json = serde_json::to_string(&root).unwrap();
        assert_eq!(json, format!("\"{}\"", "01".repeat(32)));
        let back: MerkleRoot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, root);
    }
}
