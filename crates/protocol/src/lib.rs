use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// What kind of semantic-convention symbol a usage refers to.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    #[default]
    Attribute,
}

impl AttributeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AttributeKind::Attribute => "attribute",
        }
    }
}

/// One discovered usage of a semantic-convention attribute key.
///
/// Equality and hashing only consider `key` and `version`; two usages that
/// differ in `kind` alone describe the same dependency.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SemconvAttribute {
    #[serde(rename = "type")]
    pub kind: AttributeKind,
    pub key: String,
    pub version: String,
}

impl SemconvAttribute {
    pub fn attribute(key: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            kind: AttributeKind::Attribute,
            key: key.into(),
            version: version.into(),
        }
    }

    /// Composite ordering key: `key|version`.
    pub fn sort_key(&self) -> String {
        format!("{}|{}", self.key, self.version)
    }
}

impl PartialEq for SemconvAttribute {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.version == other.version
    }
}

impl Eq for SemconvAttribute {}

impl Hash for SemconvAttribute {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
        self.version.hash(state);
    }
}

/// Sorted, deduplicated set of attribute usages produced by one analysis run.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct SemconvDependencies {
    pub attributes: Vec<SemconvAttribute>,
}

impl SemconvDependencies {
    /// Builds the result from raw usages: sorts by `key|version` and collapses
    /// adjacent duplicates.
    pub fn from_usages(mut attributes: Vec<SemconvAttribute>) -> Self {
        attributes.sort_by_cached_key(SemconvAttribute::sort_key);
        attributes.dedup();
        Self { attributes }
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SemconvAttribute> {
        self.attributes.iter()
    }
}

pub fn serialize_json(value: &SemconvDependencies) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}

pub fn serialize_toml(value: &SemconvDependencies) -> Result<String> {
    toml::to_string_pretty(value).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn equality_ignores_kind() {
        let a = SemconvAttribute::attribute("http.method", "v1.20.0");
        let b = SemconvAttribute::attribute("http.method", "v1.20.0");
        assert_eq!(a, b);
        assert_ne!(a, SemconvAttribute::attribute("http.method", "v1.30.0"));
    }

    #[test]
    fn from_usages_sorts_by_composite_key_and_dedups() {
        let deps = SemconvDependencies::from_usages(vec![
            SemconvAttribute::attribute("user_agent.original", "v1.30.0"),
            SemconvAttribute::attribute("http.method", "v1.20.0"),
            SemconvAttribute::attribute("http.status_code", "v1.20.0"),
            SemconvAttribute::attribute("http.method", "v1.20.0"),
            SemconvAttribute::attribute("http.method", "v1.10.0"),
        ]);

        let keys: Vec<String> = deps.iter().map(SemconvAttribute::sort_key).collect();
        assert_eq!(
            keys,
            vec![
                "http.method|v1.10.0",
                "http.method|v1.20.0",
                "http.status_code|v1.20.0",
                "user_agent.original|v1.30.0",
            ]
        );
    }

    #[test]
    fn composite_key_ordering_is_string_ordering() {
        // '.' sorts before '|', so "a.b|v1" precedes "a|v1".
        let deps = SemconvDependencies::from_usages(vec![
            SemconvAttribute::attribute("a", "v1.0.0"),
            SemconvAttribute::attribute("a.b", "v1.0.0"),
        ]);
        assert_eq!(deps.attributes[0].key, "a.b");
        assert_eq!(deps.attributes[1].key, "a");
    }

    #[test]
    fn json_uses_type_field_for_kind() {
        let deps = SemconvDependencies::from_usages(vec![SemconvAttribute::attribute(
            "http.method",
            "v1.20.0",
        )]);
        let raw = serialize_json(&deps).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["attributes"][0]["type"], "attribute");
        assert_eq!(value["attributes"][0]["key"], "http.method");
        assert_eq!(value["attributes"][0]["version"], "v1.20.0");
    }

    #[test]
    fn toml_renders_attribute_tables() {
        let deps = SemconvDependencies::from_usages(vec![SemconvAttribute::attribute(
            "http.method",
            "v1.20.0",
        )]);
        let raw = serialize_toml(&deps).unwrap();
        assert!(raw.contains("[[attributes]]"), "unexpected toml: {raw}");
        assert!(raw.contains("key = \"http.method\""), "unexpected toml: {raw}");
        assert!(raw.contains("type = \"attribute\""), "unexpected toml: {raw}");
    }
}
