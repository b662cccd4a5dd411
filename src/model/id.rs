use std::fmt::{Display, Formatter};

use data_encoding::HEXLOWER;
use serde::{Deserialize, Serialize};

/// An opaque question identifier, assigned by the service on creation and
/// immutable thereafter. Serializes as a plain string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(String);

impl QuestionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for QuestionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for QuestionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for QuestionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl AsRef<str> for QuestionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The shared tag linking a main question to all of its milestone questions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    /// Generate a fresh group identifier: 128 bits of entropy, hex-encoded,
    /// so collisions between independently created chains are negligible.
    pub fn random() -> Self {
        let bytes: [u8; 16] = rand::random();
        Self(HEXLOWER.encode(&bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for GroupId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for GroupId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for GroupId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// (De)serialisation for optional ids that the service encodes as empty
/// strings. `None` goes out as `""`; blank incoming values map back to `None`.
pub(crate) mod empty_as_none {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S, T>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: AsRef<str>,
    {
        match value {
            Some(inner) => serializer.serialize_str(inner.as_ref()),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: From<String>,
    {
        let raw = String::deserialize(deserializer)?;
        if raw.trim().is_empty() {
            Ok(None)
        } else {
            Ok(Some(T::from(raw)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_ids_are_unique_and_hex() {
        let first = GroupId::random();
        let second = GroupId::random();
        assert_ne!(first, second);
        assert_eq!(32, first.as_str().len());
        assert!(first.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }
}
