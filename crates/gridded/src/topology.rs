//! Caller-supplied `grid_topology` overrides.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Reserved key naming the face/connectivity variable.
pub const FACES_KEY: &str = "faces";
/// Reserved key carrying a grid type alias.
pub const GRID_TYPE_KEY: &str = "grid_type";

/// Maps logical grid attribute names (`node_lon`, `faces`, `center_lat`, ...)
/// to the variable names actually present in a dataset.
///
/// Two keys are reserved: `faces` selects the unstructured path, and
/// `grid_type` holds a grid type alias rather than a variable name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GridTopology(BTreeMap<String, String>);

impl GridTopology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, var: impl Into<String>) -> Self {
        self.insert(key, var);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, var: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), var.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// True when the mapping names a face variable.
    pub fn has_faces(&self) -> bool {
        self.contains_key(FACES_KEY)
    }

    /// The grid type alias carried by the mapping, if any.
    pub fn grid_type(&self) -> Option<&str> {
        self.get(GRID_TYPE_KEY)
    }

    /// Iterate over (logical name, variable name), skipping `grid_type`.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .filter(|(k, _)| k.as_str() != GRID_TYPE_KEY)
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for GridTopology {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_keys() {
        let topo = GridTopology::new()
            .with("node_lon", "mesh_node_x")
            .with("faces", "mesh_face_nodes")
            .with("grid_type", "ugrid");
        assert!(topo.has_faces());
        assert_eq!(topo.grid_type(), Some("ugrid"));
        assert_eq!(topo.iter().count(), 2);
    }

    #[test]
    fn test_json_is_a_plain_map() {
        let topo: GridTopology =
            serde_json::from_str(r#"{"node_lon": "x", "node_lat": "y"}"#).unwrap();
        assert_eq!(topo.get("node_lat"), Some("y"));
        assert!(!topo.has_faces());
        assert_eq!(serde_json::to_string(&topo).unwrap(), r#"{"node_lat":"y","node_lon":"x"}"#);
    }

    #[test]
    fn test_from_iterator() {
        let topo: GridTopology = [("faces", "tri")].into_iter().collect();
        assert_eq!(topo.get("faces"), Some("tri"));
    }
}
