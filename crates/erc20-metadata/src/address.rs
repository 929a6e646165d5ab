use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AddressError;

/// A 20-byte EVM account address.
///
/// Parsing accepts any letter case; display uses the EIP-55 mixed-case
/// checksum. Equality and hashing operate on the raw bytes, so differently
/// cased spellings of the same address collapse to a single map key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 20]);

impl Address {
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// EIP-55 mixed-case checksum encoding.
    pub fn to_checksum(&self) -> String {
        use tiny_keccak::{Hasher, Keccak};

        let hex_addr = hex::encode(self.0);
        let mut hasher = Keccak::v256();
        hasher.update(hex_addr.as_bytes());
        let mut hash = [0u8; 32];
        hasher.finalize(&mut hash);

        let mut result = String::with_capacity(42);
        result.push_str("0x");
        for (i, c) in hex_addr.chars().enumerate() {
            let hash_nibble = if i % 2 == 0 {
                (hash[i / 2] >> 4) & 0x0f
            } else {
                hash[i / 2] & 0x0f
            };
            if hash_nibble >= 8 {
                result.push(c.to_ascii_uppercase());
            } else {
                result.push(c);
            }
        }
        result
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").ok_or(AddressError::MissingPrefix)?;
        if digits.len() != 40 {
            return Err(AddressError::BadLength(digits.len()));
        }
        let raw = hex::decode(digits).map_err(|_| AddressError::BadHex)?;
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&raw);
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_checksum())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        let lower: Address = "0x6b175474e89094c44da98b954eedeac495271d0f"
            .parse()
            .unwrap();
        let upper: Address = "0x6B175474E89094C44DA98B954EEDEAC495271D0F"
            .parse()
            .unwrap();
        let mixed: Address = "0x6B175474E89094C44Da98b954EedeAC495271d0F"
            .parse()
            .unwrap();
        assert_eq!(lower, upper);
        assert_eq!(lower, mixed);
    }

    #[test]
    fn test_checksum_round_trip() {
        // Known EIP-55 vectors (DAI and USDT mainnet contracts).
        let dai: Address = "0x6b175474e89094c44da98b954eedeac495271d0f"
            .parse()
            .unwrap();
        assert_eq!(
            dai.to_checksum(),
            "0x6B175474E89094C44Da98b954EedeAC495271d0F"
        );

        let usdt: Address = "0xdac17f958d2ee523a2206206994597c13d831ec7"
            .parse()
            .unwrap();
        assert_eq!(
            usdt.to_checksum(),
            "0xdAC17F958D2ee523a2206206994597C13D831ec7"
        );
    }

    #[test]
    fn test_rejects_malformed_input() {
        assert!("6b175474e89094c44da98b954eedeac495271d0f"
            .parse::<Address>()
            .is_err());
        assert!("0x6b17".parse::<Address>().is_err());
        assert!("0xzz175474e89094c44da98b954eedeac495271d0f"
            .parse::<Address>()
            .is_err());
        assert!("ETH".parse::<Address>().is_err());
    }

    #[test]
    fn test_serde_string_form() {
        let addr: Address = "0x6b175474e89094c44da98b954eedeac495271d0f"
            .parse()
            .unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"0x6B175474E89094C44Da98b954EedeAC495271d0F\"");
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
