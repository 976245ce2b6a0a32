//! Clip identifiers

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Opaque name of an audio clip
///
/// Stable for the life of a session. Used as the key for stored positions and
/// for "is this the active clip" comparisons; never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipId(String);

impl ClipId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClipId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ClipId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&ClipId> for ClipId {
    fn from(id: &ClipId) -> Self {
        id.clone()
    }
}

impl Borrow<str> for ClipId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_clip_id_serializes_as_plain_string() {
        let id = ClipId::new("intro");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"intro\"");

        let parsed: ClipId = serde_json::from_str("\"outro\"").unwrap();
        assert_eq!(parsed.as_str(), "outro");
    }

    #[test]
    fn test_clip_id_map_lookup_by_str() {
        let mut map = HashMap::new();
        map.insert(ClipId::from("a"), 1);
        assert_eq!(map.get("a"), Some(&1));
        assert_eq!(map.get("b"), None);
    }
}
