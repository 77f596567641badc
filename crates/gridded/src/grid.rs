//! Grid variants and the capabilities they expose.
//!
//! [`Grid`] is a tagged union over [`UnstructuredGrid`] and
//! [`StructuredGrid`]. Both expose node coordinates ([`HasNodes`]); only
//! the unstructured variant has face connectivity ([`HasFaces`]).

use std::path::PathBuf;

use ndarray::{Array2, ArrayD};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::conventions::GridKind;
use crate::error::GriddedResult;
use crate::extract::{CoordinatePair, NodeCoordinates, StructuredAttrs, UnstructuredAttrs};
use crate::topology::GridTopology;

/// Identity and provenance shared by both grid kinds.
#[derive(Debug, Clone, PartialEq)]
pub struct GridMeta {
    pub name: String,
    pub id: Uuid,
    /// File the grid was constructed from, if any.
    pub filename: Option<PathBuf>,
    /// Name of the dataset's topology variable, if the dataset has one.
    pub mesh_name: Option<String>,
    /// Dataset variables the grid was built from.
    pub source_variables: Vec<String>,
    /// Attribute mapping the grid was built with, if one was given.
    pub topology: Option<GridTopology>,
}

impl GridMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: Uuid::new_v4(),
            filename: None,
            mesh_name: None,
            source_variables: Vec::new(),
            topology: None,
        }
    }
}

/// Grids that expose node coordinates.
pub trait HasNodes {
    fn nodes(&self) -> &NodeCoordinates;

    fn node_lon(&self) -> &ArrayD<f64> {
        &self.nodes().lon
    }

    fn node_lat(&self) -> &ArrayD<f64> {
        &self.nodes().lat
    }

    /// The node coordinate shape.
    fn shape(&self) -> &[usize] {
        self.nodes().shape()
    }
}

/// Grids that expose face connectivity.
pub trait HasFaces {
    /// (num_faces, vertices-per-face), 0-based node indices.
    fn faces(&self) -> &Array2<i64>;

    fn num_faces(&self) -> usize {
        self.faces().nrows()
    }
}

/// A triangular or polygonal mesh.
#[derive(Debug, Clone)]
pub struct UnstructuredGrid {
    pub meta: GridMeta,
    nodes: NodeCoordinates,
    faces: Array2<i64>,
}

impl UnstructuredGrid {
    pub fn new(meta: GridMeta, nodes: NodeCoordinates, faces: Array2<i64>) -> Self {
        Self { meta, nodes, faces }
    }

    pub(crate) fn from_attrs(mut meta: GridMeta, attrs: UnstructuredAttrs) -> Self {
        meta.filename = attrs.filename;
        meta.source_variables = attrs.source_variables;
        Self::new(meta, attrs.nodes, attrs.faces)
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.lon.len()
    }
}

impl HasNodes for UnstructuredGrid {
    fn nodes(&self) -> &NodeCoordinates {
        &self.nodes
    }
}

impl HasFaces for UnstructuredGrid {
    fn faces(&self) -> &Array2<i64> {
        &self.faces
    }
}

/// A curvilinear grid with optional staggered center and edge coordinates.
#[derive(Debug, Clone)]
pub struct StructuredGrid {
    pub meta: GridMeta,
    nodes: NodeCoordinates,
    pub center: Option<CoordinatePair>,
    pub edge1: Option<CoordinatePair>,
    pub edge2: Option<CoordinatePair>,
}

impl StructuredGrid {
    pub fn new(meta: GridMeta, nodes: NodeCoordinates) -> Self {
        Self {
            meta,
            nodes,
            center: None,
            edge1: None,
            edge2: None,
        }
    }

    pub(crate) fn from_attrs(mut meta: GridMeta, attrs: StructuredAttrs) -> Self {
        meta.filename = attrs.filename;
        meta.source_variables = attrs.source_variables;
        Self {
            meta,
            nodes: attrs.nodes,
            center: attrs.center,
            edge1: attrs.edge1,
            edge2: attrs.edge2,
        }
    }

    pub fn center_shape(&self) -> Option<&[usize]> {
        self.center.as_ref().map(|c| c.shape())
    }
}

impl HasNodes for StructuredGrid {
    fn nodes(&self) -> &NodeCoordinates {
        &self.nodes
    }
}

/// A grid of either kind.
#[derive(Debug, Clone)]
pub enum Grid {
    Unstructured(UnstructuredGrid),
    Structured(StructuredGrid),
}

impl Grid {
    pub fn kind(&self) -> GridKind {
        match self {
            Self::Unstructured(_) => GridKind::Unstructured,
            Self::Structured(_) => GridKind::Structured,
        }
    }

    pub fn meta(&self) -> &GridMeta {
        match self {
            Self::Unstructured(g) => &g.meta,
            Self::Structured(g) => &g.meta,
        }
    }

    pub fn meta_mut(&mut self) -> &mut GridMeta {
        match self {
            Self::Unstructured(g) => &mut g.meta,
            Self::Structured(g) => &mut g.meta,
        }
    }

    pub fn name(&self) -> &str {
        &self.meta().name
    }

    pub fn id(&self) -> Uuid {
        self.meta().id
    }

    pub fn filename(&self) -> Option<&PathBuf> {
        self.meta().filename.as_ref()
    }

    pub fn mesh_name(&self) -> Option<&str> {
        self.meta().mesh_name.as_deref()
    }

    /// Face connectivity, for grids that have it.
    pub fn faces(&self) -> Option<&Array2<i64>> {
        match self {
            Self::Unstructured(g) => Some(g.faces()),
            Self::Structured(_) => None,
        }
    }

    pub fn as_unstructured(&self) -> Option<&UnstructuredGrid> {
        match self {
            Self::Unstructured(g) => Some(g),
            Self::Structured(_) => None,
        }
    }

    pub fn as_structured(&self) -> Option<&StructuredGrid> {
        match self {
            Self::Structured(g) => Some(g),
            Self::Unstructured(_) => None,
        }
    }

    /// Describe this grid for later reconstruction with
    /// [`GridFactory::from_saved`](crate::factory::GridFactory::from_saved).
    pub fn to_saved(&self) -> SavedGrid {
        let meta = self.meta();
        SavedGrid {
            filename: meta.filename.clone().unwrap_or_default(),
            id: Some(meta.id),
            name: Some(meta.name.clone()),
            grid_type: Some(self.kind().as_str().to_string()),
            grid_topology: meta.topology.clone(),
            mesh_name: meta.mesh_name.clone(),
        }
    }
}

impl HasNodes for Grid {
    fn nodes(&self) -> &NodeCoordinates {
        match self {
            Self::Unstructured(g) => g.nodes(),
            Self::Structured(g) => g.nodes(),
        }
    }
}

/// Grids compare by their defining arrays: faces when both have them,
/// node coordinates otherwise. Names, ids and filenames are ignored.
impl PartialEq for Grid {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        match (self.faces(), other.faces()) {
            (Some(a), Some(b)) => a == b,
            _ => self.nodes() == other.nodes(),
        }
    }
}

impl From<UnstructuredGrid> for Grid {
    fn from(g: UnstructuredGrid) -> Self {
        Self::Unstructured(g)
    }
}

impl From<StructuredGrid> for Grid {
    fn from(g: StructuredGrid) -> Self {
        Self::Structured(g)
    }
}

/// The saved form of a grid: enough to re-derive it from its file and
/// restore its identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedGrid {
    pub filename: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_topology: Option<GridTopology>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh_name: Option<String>,
}

impl SavedGrid {
    pub fn new(filename: impl Into<PathBuf>) -> Self {
        Self {
            filename: filename.into(),
            id: None,
            name: None,
            grid_type: None,
            grid_topology: None,
            mesh_name: None,
        }
    }

    pub fn from_json(json: &str) -> GriddedResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> GriddedResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};

    fn nodes(lon: &[f64], lat: &[f64]) -> NodeCoordinates {
        CoordinatePair::new(arr1(lon).into_dyn(), arr1(lat).into_dyn()).unwrap()
    }

    fn ugrid(name: &str, lon: &[f64], faces: Array2<i64>) -> Grid {
        let lat = vec![0.0; lon.len()];
        UnstructuredGrid::new(GridMeta::new(name), nodes(lon, &lat), faces).into()
    }

    #[test]
    fn test_equal_faces_ignore_other_attributes() {
        let faces = arr2(&[[0, 1, 2], [1, 2, 3]]);
        let a = ugrid("a", &[0.0, 1.0, 2.0, 3.0], faces.clone());
        let b = ugrid("b", &[9.0, 8.0, 7.0, 6.0], faces);
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_faces_unequal() {
        let a = ugrid("a", &[0.0; 4], arr2(&[[0, 1, 2], [1, 2, 3]]));
        let values = ugrid("b", &[0.0; 4], arr2(&[[0, 1, 2], [1, 3, 2]]));
        let shape = ugrid("c", &[0.0; 4], arr2(&[[0, 1, 2]]));
        assert_ne!(a, values);
        assert_ne!(a, shape);
    }

    #[test]
    fn test_structured_equality_uses_nodes() {
        let a: Grid = StructuredGrid::new(GridMeta::new("a"), nodes(&[0.0, 1.0], &[2.0, 3.0])).into();
        let b: Grid = StructuredGrid::new(GridMeta::new("b"), nodes(&[0.0, 1.0], &[2.0, 3.0])).into();
        let c: Grid = StructuredGrid::new(GridMeta::new("c"), nodes(&[0.0, 1.5], &[2.0, 3.0])).into();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_shape_is_node_shape() {
        let g: Grid = StructuredGrid::new(
            GridMeta::new("s"),
            CoordinatePair::new(arr2(&[[0.0, 1.0, 2.0]]).into_dyn(), arr2(&[[0.0, 1.0, 2.0]]).into_dyn())
                .unwrap(),
        )
        .into();
        assert_eq!(g.shape(), &[1, 3]);
        assert!(g.faces().is_none());
        assert_eq!(g.kind(), GridKind::Structured);
    }

    #[test]
    fn test_saved_grid_json() {
        let mut g = ugrid("mesh_grid", &[0.0, 1.0, 2.0], arr2(&[[0, 1, 2]]));
        g.meta_mut().filename = Some(PathBuf::from("/data/fvcom.nc"));
        let saved = g.to_saved();
        let json = saved.to_json().unwrap();
        let back = SavedGrid::from_json(&json).unwrap();
        assert_eq!(back.filename, PathBuf::from("/data/fvcom.nc"));
        assert_eq!(back.name.as_deref(), Some("mesh_grid"));
        assert_eq!(back.grid_type.as_deref(), Some("ugrid"));
        assert_eq!(back.id, Some(g.id()));
        assert_eq!(back.grid_topology, None);
    }

    #[test]
    fn test_saved_grid_keeps_topology() {
        let mut g = ugrid("mesh_grid", &[0.0, 1.0, 2.0], arr2(&[[0, 1, 2]]));
        let topology = GridTopology::new().with("node_lon", "x_node").with("faces", "element_nodes");
        g.meta_mut().topology = Some(topology.clone());

        let back = SavedGrid::from_json(&g.to_saved().to_json().unwrap()).unwrap();
        assert_eq!(back.grid_topology, Some(topology));
    }

    #[test]
    fn test_saved_grid_only_filename_required() {
        let saved = SavedGrid::from_json(r#"{"filename": "roms.nc"}"#).unwrap();
        assert_eq!(saved, SavedGrid::new("roms.nc"));
        assert!(SavedGrid::from_json(r#"{"name": "x"}"#).is_err());
    }
}
