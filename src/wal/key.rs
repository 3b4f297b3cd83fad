//! Offset to object key mapping
//!
//! Keys are `<prefix>/<offset>` with the offset zero-padded to 20 digits,
//! the width of `u64::MAX`. Fixed width makes lexicographic key order equal
//! numeric offset order.

use super::errors::{WalError, WalResult};

/// Decimal digits in an encoded offset.
pub const OFFSET_DIGITS: usize = 20;

/// Maps offsets to object keys under one prefix and back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCodec {
    prefix: String,
}

impl KeyCodec {
    /// Create a codec for keys under `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The bare prefix, without the trailing separator.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The listing prefix covering every key of the log: `<prefix>/`.
    pub fn list_prefix(&self) -> String {
        format!("{}/", self.prefix)
    }

    /// Key for `offset`.
    pub fn encode(&self, offset: u64) -> String {
        format!("{}/{:0width$}", self.prefix, offset, width = OFFSET_DIGITS)
    }

    /// Offset encoded in `key`.
    ///
    /// The suffix after `<prefix>/` must consist of ASCII digits only; signs,
    /// whitespace, nested segments and values past `u64::MAX` are rejected.
    pub fn decode(&self, key: &str) -> WalResult<u64> {
        let digits = key
            .strip_prefix(self.prefix.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| WalError::parse(key, format!("missing prefix {:?}", self.list_prefix())))?;

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(WalError::parse(key, "offset is not an unsigned decimal"));
        }

        digits
            .parse::<u64>()
            .map_err(|e| WalError::parse(key, e.to_string()))
    }
}
