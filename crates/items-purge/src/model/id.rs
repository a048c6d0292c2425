//! Item and pile identifiers.
//!
//! Items and piles share one namespace: an item's pile field may name a
//! location ("Garage"), the reserved deleted pile, or another item's id when
//! that item physically holds it.

use std::borrow::Borrow;
use std::fmt;

use crate::error::ParseError;

/// An item or pile identifier, stored without surrounding quotes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(Box<str>);

impl Identifier {
    /// Creates an identifier from already-unquoted text.
    pub fn new(text: impl Into<Box<str>>) -> Self {
        Self(text.into())
    }

    /// Builds an identifier from a raw field value as it appears in the file.
    ///
    /// Surrounding double quotes are stripped; escapes inside are kept as-is
    /// so the identifier compares equal to any other spelling of the same
    /// raw text.
    pub fn from_raw(raw: &[u8], offset: usize) -> Result<Self, ParseError> {
        let inner = unquote(raw);
        if inner.is_empty() {
            return Err(ParseError::InvalidIdentifier { offset });
        }
        std::str::from_utf8(inner)
            .map(Self::new)
            .map_err(|_| ParseError::InvalidUtf8 {
                field: "identifier",
                offset,
            })
    }

    /// Returns the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Identifier {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Identifier {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Strips one pair of surrounding double quotes, if present.
pub fn unquote(raw: &[u8]) -> &[u8] {
    if raw.len() >= 2 && raw[0] == b'"' && raw[raw.len() - 1] == b'"' {
        &raw[1..raw.len() - 1]
    } else {
        raw
    }
}
