//! Data variables defined on a grid.

use std::collections::BTreeMap;

use ndarray::ArrayD;
use tracing::debug;

use crate::error::{GriddedError, GriddedResult};
use crate::grid::{Grid, HasNodes};
use crate::source::{AttrValue, DataSource};

/// Where on the mesh a variable's values live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Node,
    Face,
    Edge,
    Center,
    Unknown,
}

impl Location {
    /// Parse a UGRID/SGRID `location` attribute.
    pub fn from_attr(value: Option<&str>) -> Self {
        match value.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("node") => Self::Node,
            Some("face") => Self::Face,
            Some("edge") | Some("edge1") | Some("edge2") => Self::Edge,
            Some("center") | Some("cell") => Self::Center,
            _ => Self::Unknown,
        }
    }
}

/// A named array-valued quantity read from a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub data: ArrayD<f64>,
    pub dimensions: Vec<String>,
    pub attributes: BTreeMap<String, AttrValue>,
    pub location: Location,
}

impl Variable {
    /// Read `name` and its attributes from `source`.
    pub fn from_source<S: DataSource + ?Sized>(source: &S, name: &str) -> GriddedResult<Self> {
        let attributes = source
            .variable_attributes(name)
            .ok_or_else(|| GriddedError::variable_not_found(name))?;
        let dimensions = source.variable_dimensions(name).unwrap_or_default();
        let data = source.read_f64(name)?;
        let location = Location::from_attr(attributes.get("location").and_then(|v| v.as_str()));
        Ok(Self {
            name: name.to_string(),
            data,
            dimensions,
            attributes,
            location,
        })
    }

    fn text_attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(|v| v.as_str())
    }

    pub fn units(&self) -> Option<&str> {
        self.text_attr("units")
    }

    pub fn long_name(&self) -> Option<&str> {
        self.text_attr("long_name")
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }
}

/// Names of the variables in `source` that hold data on `grid`.
///
/// With a mesh name, a variable belongs to the grid when its `mesh`
/// (UGRID) or `grid` (SGRID) attribute names that mesh. Without one,
/// membership is decided by shape: the trailing dimensions match the node
/// or center shape, or the first or last dimension equals the face count.
/// The grid's own coordinate and connectivity variables, and topology
/// markers, are never listed.
pub fn find_variables<S: DataSource + ?Sized>(source: &S, grid: &Grid) -> Vec<String> {
    let consumed = &grid.meta().source_variables;
    let candidates = source
        .variable_names()
        .into_iter()
        .filter(|name| !consumed.contains(name))
        .filter(|name| !is_topology_marker(source, name));

    let found: Vec<String> = match grid.mesh_name() {
        Some(mesh) => candidates
            .filter(|name| {
                ["mesh", "grid"].iter().any(|key| {
                    source
                        .variable_attribute(name, key)
                        .and_then(|v| v.as_str().map(|s| s.trim() == mesh))
                        .unwrap_or(false)
                })
            })
            .collect(),
        None => candidates
            .filter(|name| shape_matches(source, name, grid))
            .collect(),
    };
    debug!(grid = grid.name(), count = found.len(), "Discovered grid variables");
    found
}

fn is_topology_marker<S: DataSource + ?Sized>(source: &S, name: &str) -> bool {
    source
        .variable_attribute(name, "cf_role")
        .and_then(|v| v.as_str().map(|role| role.contains("topology")))
        .unwrap_or(false)
}

fn shape_matches<S: DataSource + ?Sized>(source: &S, name: &str, grid: &Grid) -> bool {
    let Some(shape) = source.variable_shape(name) else {
        return false;
    };
    if shape.is_empty() {
        return false;
    }

    let ends_with = |target: &[usize]| !target.is_empty() && shape.ends_with(target);
    if ends_with(grid.shape()) {
        return true;
    }
    match grid {
        Grid::Unstructured(_) => grid
            .faces()
            .map(|f| f.nrows())
            .is_some_and(|n| shape.first() == Some(&n) || shape.last() == Some(&n)),
        Grid::Structured(g) => g.center_shape().is_some_and(ends_with),
    }
}
