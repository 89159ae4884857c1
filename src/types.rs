//! Domain types: addresses, hex quantities, transactions and blocks.
use std::{fmt, str::FromStr};

use num_bigint::BigUint;
use num_traits::{One, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{IndexerError, Result};

/// Arbitrary-precision non-negative integer, hex-encoded on the wire.
///
/// Wire form is `0x` followed by the minimal number of lowercase hex digits;
/// zero is `0x0`.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity(BigUint);

impl Quantity {
    /// The zero quantity (also the "never ran" checkpoint sentinel).
    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    /// Whether this is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// `self + 1`.
    pub fn next(&self) -> Self {
        Self(&self.0 + BigUint::one())
    }

    /// `self - other`, clamped at zero.
    pub fn saturating_sub(&self, other: &Quantity) -> Self {
        if self.0 <= other.0 {
            Self::zero()
        } else {
            Self(&self.0 - &other.0)
        }
    }

    /// Low 64 bits; anything above is truncated.
    pub fn low_u64(&self) -> u64 {
        self.0.iter_u64_digits().next().unwrap_or(0)
    }

    /// Parse the `0x`-prefixed wire form.
    pub fn from_hex(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(IndexerError::Decode("quantity must not be empty".into()));
        }
        let digits = s.strip_prefix("0x").ok_or_else(|| {
            IndexerError::Decode(format!("quantity {s:?} must start with 0x"))
        })?;
        if digits.is_empty() {
            return Err(IndexerError::Decode(
                "quantity digits must be present, zero is 0x0".into(),
            ));
        }
        if !digits
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        {
            return Err(IndexerError::Decode(format!(
                "quantity {s:?} must use lowercase hex digits"
            )));
        }
        if digits.len() > 1 && digits.starts_with('0') {
            return Err(IndexerError::Decode(format!("quantity {s:?} has leading zeroes")));
        }
        BigUint::parse_bytes(digits.as_bytes(), 16)
            .map(Self)
            .ok_or_else(|| IndexerError::Decode(format!("quantity {s:?} is not a hex number")))
    }

    /// Wire form, e.g. `0x41`.
    pub fn to_hex(&self) -> String {
        format!("0x{:x}", self.0)
    }
}

impl From<u64> for Quantity {
    fn from(v: u64) -> Self {
        Self(BigUint::from(v))
    }
}

impl FromStr for Quantity {
    type Err = IndexerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Quantity::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// 20-byte account address.
///
/// Parsing requires a `0x`/`0X` prefix and exactly 40 hex digits of either
/// case. The canonical text form is lowercase, so two spellings of the same
/// bytes compare and hash equal.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; 20]);

impl Address {
    /// Wrap raw bytes.
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl FromStr for Address {
    type Err = IndexerError;

    fn from_str(s: &str) -> Result<Self> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| IndexerError::InvalidAddress(format!("{s:?} must start with 0x")))?;
        if digits.len() != 40 {
            return Err(IndexerError::InvalidAddress(format!(
                "{s:?} must have 40 hex digits, got {}",
                digits.len()
            )));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| IndexerError::InvalidAddress(format!("{s:?}: {e}")))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A value transfer as seen by the indexer.
///
/// `to` is `None` for contract creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Sender.
    pub from: Address,
    /// Receiver, absent for contract creation.
    #[serde(default)]
    pub to: Option<Address>,
    /// Transferred value in wei.
    pub value: Quantity,
}

/// A block with its full transaction list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Block height.
    pub number: Quantity,
    /// Transactions in block order.
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}
