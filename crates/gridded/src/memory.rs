//! In-memory [`DataSource`] for programmatically built datasets.

use std::collections::BTreeMap;
use std::path::PathBuf;

use ndarray::{ArrayD, IxDyn};

use crate::error::{GriddedError, GriddedResult};
use crate::source::{AttrValue, DataSource};

#[derive(Debug, Clone)]
struct MemoryVariable {
    name: String,
    dimensions: Vec<String>,
    data: ArrayD<f64>,
    attributes: BTreeMap<String, AttrValue>,
}

/// A dataset held entirely in memory.
///
/// Variables keep insertion order, so "first variable matching" lookups
/// behave like they would against a file.
///
/// ```
/// use gridded::MemoryDataset;
/// use ndarray::arr1;
///
/// let ds = MemoryDataset::new()
///     .with_variable("lon", &["node"], arr1(&[0.0, 1.0]).into_dyn())
///     .with_variable("lat", &["node"], arr1(&[0.0, 0.0]).into_dyn());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryDataset {
    filepath: Option<PathBuf>,
    attributes: BTreeMap<String, AttrValue>,
    variables: Vec<MemoryVariable>,
}

impl MemoryDataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the path reported as this dataset's origin.
    pub fn with_filepath(mut self, path: impl Into<PathBuf>) -> Self {
        self.filepath = Some(path.into());
        self
    }

    /// Add a global attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Add (or replace) a variable.
    pub fn with_variable(mut self, name: impl Into<String>, dimensions: &[&str], data: ArrayD<f64>) -> Self {
        let name = name.into();
        let var = MemoryVariable {
            name: name.clone(),
            dimensions: dimensions.iter().map(|d| d.to_string()).collect(),
            data,
            attributes: BTreeMap::new(),
        };
        match self.variables.iter_mut().find(|v| v.name == name) {
            Some(existing) => *existing = var,
            None => self.variables.push(var),
        }
        self
    }

    /// Add a zero-size marker variable, as used for topology variables.
    pub fn with_marker_variable(self, name: impl Into<String>) -> Self {
        self.with_variable(name, &[], ArrayD::zeros(IxDyn(&[])))
    }

    /// Attach an attribute to an existing variable. Unknown variables are ignored.
    pub fn with_variable_attribute(
        mut self,
        var: &str,
        name: impl Into<String>,
        value: impl Into<AttrValue>,
    ) -> Self {
        if let Some(v) = self.variables.iter_mut().find(|v| v.name == var) {
            v.attributes.insert(name.into(), value.into());
        }
        self
    }

    fn get(&self, name: &str) -> Option<&MemoryVariable> {
        self.variables.iter().find(|v| v.name == name)
    }
}

impl DataSource for MemoryDataset {
    fn filepath(&self) -> Option<PathBuf> {
        self.filepath.clone()
    }

    fn variable_names(&self) -> Vec<String> {
        self.variables.iter().map(|v| v.name.clone()).collect()
    }

    fn has_variable(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    fn attribute(&self, name: &str) -> Option<AttrValue> {
        self.attributes.get(name).cloned()
    }

    fn variable_attributes(&self, var: &str) -> Option<BTreeMap<String, AttrValue>> {
        self.get(var).map(|v| v.attributes.clone())
    }

    fn variable_attribute(&self, var: &str, attr: &str) -> Option<AttrValue> {
        self.get(var)?.attributes.get(attr).cloned()
    }

    fn variable_dimensions(&self, var: &str) -> Option<Vec<String>> {
        self.get(var).map(|v| v.dimensions.clone())
    }

    fn variable_shape(&self, var: &str) -> Option<Vec<usize>> {
        self.get(var).map(|v| v.data.shape().to_vec())
    }

    fn read_f64(&self, var: &str) -> GriddedResult<ArrayD<f64>> {
        self.get(var)
            .map(|v| v.data.clone())
            .ok_or_else(|| GriddedError::variable_not_found(var))
    }

    fn read_i64(&self, var: &str) -> GriddedResult<ArrayD<i64>> {
        self.get(var)
            .map(|v| v.data.mapv(|x| x.round() as i64))
            .ok_or_else(|| GriddedError::variable_not_found(var))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};

    #[test]
    fn test_variable_order_is_insertion_order() {
        let ds = MemoryDataset::new()
            .with_variable("zeta", &["node"], arr1(&[0.0]).into_dyn())
            .with_variable("lon", &["node"], arr1(&[1.0]).into_dyn())
            .with_variable("lat", &["node"], arr1(&[2.0]).into_dyn());
        assert_eq!(ds.variable_names(), vec!["zeta", "lon", "lat"]);
    }

    #[test]
    fn test_variable_shape_from_data() {
        let ds = MemoryDataset::new()
            .with_variable("zeta", &["time", "node"], arr2(&[[0.0, 1.0, 2.0], [3.0, 4.0, 5.0]]).into_dyn());
        assert_eq!(ds.variable_shape("zeta"), Some(vec![2, 3]));
        assert_eq!(ds.variable_shape("missing"), None);
    }

    #[test]
    fn test_replacing_variable_keeps_position() {
        let ds = MemoryDataset::new()
            .with_variable("a", &["x"], arr1(&[0.0]).into_dyn())
            .with_variable("b", &["x"], arr1(&[0.0]).into_dyn())
            .with_variable("a", &["x"], arr1(&[5.0]).into_dyn());
        assert_eq!(ds.variable_names(), vec!["a", "b"]);
        assert_eq!(ds.read_f64("a").unwrap()[[0]], 5.0);
    }

    #[test]
    fn test_read_i64_rounds() {
        let ds = MemoryDataset::new().with_variable(
            "nv",
            &["three", "nele"],
            arr2(&[[1.0, 2.0], [2.0, 3.0], [3.0, 4.0]]).into_dyn(),
        );
        let nv = ds.read_i64("nv").unwrap();
        assert_eq!(nv.shape(), &[3, 2]);
        assert_eq!(nv[[2, 1]], 4);
    }

    #[test]
    fn test_missing_variable() {
        let ds = MemoryDataset::new();
        assert!(matches!(ds.read_f64("lon"), Err(GriddedError::VariableNotFound(_))));
        assert!(ds.variable_attributes("lon").is_none());
    }

    #[test]
    fn test_marker_variable_attributes() {
        let ds = MemoryDataset::new()
            .with_marker_variable("mesh")
            .with_variable_attribute("mesh", "cf_role", "mesh_topology");
        assert_eq!(ds.read_f64("mesh").unwrap().len(), 1);
        assert_eq!(
            ds.variable_attribute("mesh", "cf_role"),
            Some(AttrValue::Text("mesh_topology".to_string()))
        );
    }
}
