use std::fmt;
use std::str::FromStr;

use crate::error::{Result, StoreError};

/// Longest accepted player name
pub const MAX_KEY_LEN: usize = 16;

/// A player name that is safe to use as a file name.
///
/// Only ASCII letters, digits and `_` are accepted, which rules out path
/// separators, `..` and hidden files. Case is preserved: `Notch` and `notch`
/// are different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey(String);

impl IdentityKey {
    pub fn parse(raw: &str) -> Result<Self> {
        let valid = !raw.is_empty()
            && raw.len() <= MAX_KEY_LEN
            && raw.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_');

        if !valid {
            return Err(StoreError::InvalidKey(raw.to_string()));
        }

        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the file holding this key's texture
    pub fn file_name(&self) -> String {
        format!("{}.png", self.0)
    }
}

impl FromStr for IdentityKey {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for IdentityKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
