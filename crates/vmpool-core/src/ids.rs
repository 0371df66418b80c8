//! Core identifier types for vmpool.
//!
//! Bearer tokens are addressed by a `TokenId`. Ids minted by this service are
//! 32 lowercase hexadecimal characters drawn from the operating system CSPRNG,
//! but lookups accept any non-empty id so that tokens seeded by other pooling
//! components stay addressable.

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length in characters of a generated token id.
pub const TOKEN_ID_LEN: usize = 32;

/// A bearer token identifier.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TokenId(String);

impl TokenId {
    /// Wrap an existing token id.
    ///
    /// # Errors
    ///
    /// Returns `IdError::Empty` if the id is empty.
    pub fn new(id: impl Into<String>) -> Result<Self, IdError> {
        let id = id.into();
        if id.is_empty() {
            return Err(IdError::Empty);
        }
        Ok(Self(id))
    }

    /// Generate a new random `TokenId`.
    ///
    /// Draws 16 bytes from `OsRng` and hex-encodes them.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_ID_LEN / 2];
        OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Whether this id has the shape of a generated id.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == TOKEN_ID_LEN
            && self
                .0
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    }

    /// A short prefix of the id, safe to write to logs.
    #[must_use]
    pub fn redacted(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(8)
            .map_or(self.0.len(), |(idx, _)| idx);
        &self.0[..end]
    }

    /// Return the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return the id bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenId({}..)", self.redacted())
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TokenId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for TokenId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TokenId> for String {
    fn from(id: TokenId) -> Self {
        id.0
    }
}

impl AsRef<[u8]> for TokenId {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The identifier is empty.
    #[error("identifier must not be empty")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generated_ids_are_hex_and_sized() {
        for _ in 0..64 {
            let id = TokenId::generate();
            assert_eq!(id.as_str().len(), TOKEN_ID_LEN);
            assert!(id.is_well_formed(), "unexpected shape: {id}");
        }
    }

    #[test]
    fn generated_ids_are_unique() {
        let ids: HashSet<_> = (0..1000).map(|_| TokenId::generate()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn foreign_ids_are_accepted() {
        let id = TokenId::new("mytoken").unwrap();
        assert_eq!(id.as_str(), "mytoken");
        assert!(!id.is_well_formed());
    }

    #[test]
    fn uppercase_hex_is_not_well_formed() {
        let id = TokenId::new("ABCDEF0123456789ABCDEF0123456789").unwrap();
        assert!(!id.is_well_formed());
    }

    #[test]
    fn empty_id_rejected() {
        assert_eq!(TokenId::new(""), Err(IdError::Empty));
        assert!("".parse::<TokenId>().is_err());
    }

    #[test]
    fn redacted_prefix() {
        let id = TokenId::new("abcdefghijklmnop").unwrap();
        assert_eq!(id.redacted(), "abcdefgh");
        assert_eq!(format!("{id:?}"), "TokenId(abcdefgh..)");

        let short = TokenId::new("abc").unwrap();
        assert_eq!(short.redacted(), "abc");
    }

    #[test]
    fn token_id_serde_json() {
        let id = TokenId::generate();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let parsed: TokenId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn empty_id_fails_to_deserialize() {
        let result: Result<TokenId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }
}
