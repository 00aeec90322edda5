//! Opaque resource identifiers

use super::Kind;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Decoded form of a resource id: an element unique within its kind, and
/// the kind itself. On the wire the pair travels as base64 of
/// `{"e": element, "k": kind}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Id {
    #[serde(rename = "e", default, skip_serializing_if = "String::is_empty")]
    element: String,
    #[serde(rename = "k", default, skip_serializing_if = "Kind::is_empty")]
    kind: Kind,
}

impl Id {
    /// The id that every unparseable input decodes to.
    pub const INVALID: Id = Id {
        element: String::new(),
        kind: Kind::from_static(""),
    };

    /// New id with a random element.
    pub fn new(kind: Kind) -> Self {
        Self::with_element(kind, Uuid::new_v4().to_string())
    }

    pub fn with_element(kind: Kind, element: impl Into<String>) -> Self {
        Self {
            element: element.into(),
            kind,
        }
    }

    /// Decodes an encoded id. Never fails: malformed input yields [`Id::INVALID`].
    pub fn parse(encoded: &str) -> Self {
        let decoded = match STANDARD.decode(encoded.trim()) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!(id = %encoded, "id is not base64, {}", e);
                return Self::INVALID;
            }
        };
        match serde_json::from_slice::<Id>(&decoded) {
            Ok(id) if id.is_valid() => id,
            Ok(_) => Self::INVALID,
            Err(e) => {
                tracing::debug!(id = %encoded, "id is not a json pair, {}", e);
                Self::INVALID
            }
        }
    }

    pub fn element(&self) -> &str {
        &self.element
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    pub fn is_valid(&self) -> bool {
        !self.element.is_empty() && !self.kind.is_empty()
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_vec(self).map_err(|_| fmt::Error)?;
        f.write_str(&STANDARD.encode(json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_encoded_form() {
        let id = Id::with_element(Kind::ENTITY, "5b5b418e80847d00019b5e67");
        let raw = STANDARD.decode(id.to_string()).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&raw).unwrap();

        assert_eq!(json["e"], "5b5b418e80847d00019b5e67");
        assert_eq!(json["k"], "entity");
    }

    #[test]
    fn test_parse_recovers_pair() {
        let id = Id::new(Kind::LABEL);
        let parsed = Id::parse(&id.to_string());

        assert_eq!(parsed, id);
        assert_eq!(parsed.kind(), &Kind::LABEL);
    }

    #[test]
    fn test_parse_garbage_is_invalid() {
        for input in ["", "!!!", "bm90IGpzb24=", "e30="] {
            let parsed = Id::parse(input);
            assert_eq!(parsed, Id::INVALID, "input {:?}", input);
            assert!(!parsed.is_valid());
        }
    }

    #[test]
    fn test_same_element_different_kind_differs() {
        let a = Id::with_element(Kind::ENTITY, "x");
        let b = Id::with_element(Kind::LABEL, "x");
        assert_ne!(a, b);
        assert_ne!(a.to_string(), b.to_string());
    }
}
