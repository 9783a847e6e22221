use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Alias token (`@`, `@components`, ...) to a path relative to the project root.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AliasMap(BTreeMap<String, String>);

impl AliasMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Entries of `other` override entries of `self` with the same key.
    pub fn merged_with(&self, other: &AliasMap) -> AliasMap {
        let mut merged = self.clone();
        merged
            .0
            .extend(other.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }

    pub fn map_values(&self, mut f: impl FnMut(&str) -> String) -> AliasMap {
        self.iter().map(|(k, v)| (k.to_string(), f(v))).collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AliasMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_prefers_other() {
        let base: AliasMap = [("@", "src"), ("@lib", "lib")].into_iter().collect();
        let other: AliasMap = [("@", "app")].into_iter().collect();
        let merged = base.merged_with(&other);
        assert_eq!(merged.get("@"), Some("app"));
        assert_eq!(merged.get("@lib"), Some("lib"));
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_serde_is_plain_table() {
        let map: AliasMap = [("@", "src")].into_iter().collect();
        assert_eq!(serde_json::to_string(&map).unwrap(), r#"{"@":"src"}"#);
    }
}
