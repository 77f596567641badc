//! Locating the coordinate and connectivity arrays a grid is built from.
//!
//! Each grid kind needs node coordinates. Unstructured grids additionally
//! need a face/connectivity array; structured grids pick up optional
//! center and edge coordinate pairs. Variables are found by the naming
//! tables in [`Conventions`], or taken directly from a [`GridTopology`]
//! mapping when the caller supplies one.

use std::path::PathBuf;

use ndarray::{Array2, ArrayD, Ix2};
use tracing::{debug, warn};

use crate::conventions::{Conventions, GridKind, NamePair};
use crate::error::{GriddedError, GriddedResult};
use crate::source::DataSource;
use crate::topology::{GridTopology, FACES_KEY};

const NODE_LON: &str = "node_lon";
const NODE_LAT: &str = "node_lat";

/// A longitude/latitude array pair of matching shape.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatePair {
    pub lon: ArrayD<f64>,
    pub lat: ArrayD<f64>,
}

impl CoordinatePair {
    /// Pair two arrays, rejecting mismatched shapes.
    pub fn new(lon: ArrayD<f64>, lat: ArrayD<f64>) -> GriddedResult<Self> {
        if lon.shape() != lat.shape() {
            return Err(GriddedError::invalid_shape(format!(
                "longitude shape {:?} does not match latitude shape {:?}",
                lon.shape(),
                lat.shape()
            )));
        }
        Ok(Self { lon, lat })
    }

    pub fn shape(&self) -> &[usize] {
        self.lon.shape()
    }
}

/// Node coordinates; their shape is the grid's nominal shape.
pub type NodeCoordinates = CoordinatePair;

/// Everything needed to build an unstructured grid.
#[derive(Debug, Clone)]
pub struct UnstructuredAttrs {
    pub filename: Option<PathBuf>,
    pub nodes: NodeCoordinates,
    /// (N, vertices-per-face), 0-based.
    pub faces: Array2<i64>,
    /// Dataset variables consumed to build the grid.
    pub source_variables: Vec<String>,
}

/// Everything needed to build a structured grid.
#[derive(Debug, Clone)]
pub struct StructuredAttrs {
    pub filename: Option<PathBuf>,
    pub nodes: NodeCoordinates,
    pub center: Option<CoordinatePair>,
    pub edge1: Option<CoordinatePair>,
    pub edge2: Option<CoordinatePair>,
    pub source_variables: Vec<String>,
}

/// Construction parameters for either grid kind.
#[derive(Debug, Clone)]
pub enum RequiredAttrs {
    Unstructured(UnstructuredAttrs),
    Structured(StructuredAttrs),
}

impl RequiredAttrs {
    pub fn kind(&self) -> GridKind {
        match self {
            Self::Unstructured(_) => GridKind::Unstructured,
            Self::Structured(_) => GridKind::Structured,
        }
    }
}

/// Extract the construction parameters for `kind`.
pub fn extract_required_attrs<S: DataSource + ?Sized>(
    source: &S,
    kind: GridKind,
    topology: Option<&GridTopology>,
    conventions: &Conventions,
) -> GriddedResult<RequiredAttrs> {
    match kind {
        GridKind::Unstructured => {
            extract_unstructured(source, topology, conventions).map(RequiredAttrs::Unstructured)
        }
        GridKind::Structured => {
            extract_structured(source, topology, conventions).map(RequiredAttrs::Structured)
        }
    }
}

pub fn extract_unstructured<S: DataSource + ?Sized>(
    source: &S,
    topology: Option<&GridTopology>,
    conventions: &Conventions,
) -> GriddedResult<UnstructuredAttrs> {
    let mut used = Vec::new();
    let nodes = find_node_coordinates(source, topology, conventions, &mut used)?;
    let faces = find_faces(source, topology, conventions, &mut used)?;
    Ok(UnstructuredAttrs {
        filename: source.filepath(),
        nodes,
        faces,
        source_variables: used,
    })
}

pub fn extract_structured<S: DataSource + ?Sized>(
    source: &S,
    topology: Option<&GridTopology>,
    conventions: &Conventions,
) -> GriddedResult<StructuredAttrs> {
    let mut used = Vec::new();
    let nodes = find_node_coordinates(source, topology, conventions, &mut used)?;
    let center = find_coordinate_pair(
        source,
        topology,
        ("center_lon", "center_lat"),
        &conventions.center_coord_names,
        &mut used,
    )?;
    let edge1 = find_coordinate_pair(
        source,
        topology,
        ("edge1_lon", "edge1_lat"),
        &conventions.edge1_coord_names,
        &mut used,
    )?;
    let edge2 = find_coordinate_pair(
        source,
        topology,
        ("edge2_lon", "edge2_lat"),
        &conventions.edge2_coord_names,
        &mut used,
    )?;
    Ok(StructuredAttrs {
        filename: source.filepath(),
        nodes,
        center,
        edge1,
        edge2,
        source_variables: used,
    })
}

/// Resolve node longitude/latitude arrays.
///
/// A topology mapping that names node variables is used as-is; one that
/// names none falls back to the naming conventions.
pub fn find_node_coordinates<S: DataSource + ?Sized>(
    source: &S,
    topology: Option<&GridTopology>,
    conventions: &Conventions,
    used: &mut Vec<String>,
) -> GriddedResult<NodeCoordinates> {
    if let Some(topo) = topology {
        if let Some(nodes) = nodes_from_topology(source, topo, conventions, used)? {
            return Ok(nodes);
        }
    }

    for pair in &conventions.node_coord_names {
        if source.has_variable(&pair.lon) && source.has_variable(&pair.lat) {
            debug!(lon = %pair.lon, lat = %pair.lat, "Found node coordinate pair");
            return read_pair(source, pair, used);
        }
    }

    for name in &conventions.composite_node_names {
        if source.has_variable(name) {
            debug!(var = %name, "Found composite node variable");
            return read_composite(source, name, used);
        }
    }

    Err(GriddedError::NodeCoordinatesNotFound)
}

fn nodes_from_topology<S: DataSource + ?Sized>(
    source: &S,
    topo: &GridTopology,
    conventions: &Conventions,
    used: &mut Vec<String>,
) -> GriddedResult<Option<NodeCoordinates>> {
    let lon_var = topo.get(NODE_LON);
    let lat_var = topo.get(NODE_LAT);
    if lon_var.is_some() || lat_var.is_some() {
        let lon = lon_var.map(|v| read_mapped(source, v, used)).transpose()?;
        let lat = lat_var.map(|v| read_mapped(source, v, used)).transpose()?;
        return match (lon, lat) {
            (Some(lon), Some(lat)) => CoordinatePair::new(lon, lat).map(Some),
            _ => Err(GriddedError::NodeCoordinatesNotFound),
        };
    }

    for key in &conventions.composite_node_names {
        if let Some(var) = topo.get(key) {
            require_variable(source, var)?;
            return read_composite(source, var, used).map(Some);
        }
    }
    Ok(None)
}

/// Resolve the face/connectivity array as (N, vertices-per-face), 0-based.
///
/// A (3, N) array is taken to be triangle-major: it is transposed and, unless
/// its `start_index` is 0, decremented. Other shapes are decremented only when
/// `start_index` is 1. Negative indices after adjustment are rejected.
pub fn find_faces<S: DataSource + ?Sized>(
    source: &S,
    topology: Option<&GridTopology>,
    conventions: &Conventions,
    used: &mut Vec<String>,
) -> GriddedResult<Array2<i64>> {
    let name = match topology.and_then(|t| t.get(FACES_KEY)) {
        Some(mapped) => {
            require_variable(source, mapped)?;
            mapped.to_string()
        }
        None => conventions
            .face_names
            .iter()
            .find(|n| source.has_variable(n))
            .cloned()
            .ok_or(GriddedError::FacesNotFound)?,
    };

    let raw = source.read_i64(&name)?;
    let faces = raw.into_dimensionality::<Ix2>().map_err(|_| {
        GriddedError::invalid_shape(format!("faces variable '{}' must be two-dimensional", name))
    })?;

    let start_index = source
        .variable_attribute(&name, "start_index")
        .and_then(|v| v.as_f64());
    let faces = if faces.nrows() == 3 {
        debug!(var = %name, ?start_index, "Transposing triangle-major faces to (N, 3)");
        let faces = faces.t().as_standard_layout().into_owned();
        if start_index == Some(0.0) {
            faces
        } else {
            faces.mapv(|i| i - 1)
        }
    } else if start_index == Some(1.0) {
        faces.mapv(|i| i - 1)
    } else {
        faces
    };

    if let Some(bad) = faces.iter().find(|&&i| i < 0) {
        return Err(GriddedError::invalid_shape(format!(
            "faces variable '{}' has negative node index {} after adjustment",
            name, bad
        )));
    }

    debug!(var = %name, num_faces = faces.nrows(), "Resolved faces");
    used.push(name);
    Ok(faces)
}

/// Resolve an optional coordinate pair for a structured grid location.
fn find_coordinate_pair<S: DataSource + ?Sized>(
    source: &S,
    topology: Option<&GridTopology>,
    keys: (&str, &str),
    candidates: &[NamePair],
    used: &mut Vec<String>,
) -> GriddedResult<Option<CoordinatePair>> {
    if let Some(topo) = topology {
        let lon = topo.get(keys.0);
        let lat = topo.get(keys.1);
        if lon.is_some() || lat.is_some() {
            let lon = lon.filter(|v| source.has_variable(v));
            let lat = lat.filter(|v| source.has_variable(v));
            return match (lon, lat) {
                (Some(lon), Some(lat)) => read_pair(source, &NamePair::new(lon, lat), used).map(Some),
                _ => {
                    warn!(lon_key = keys.0, lat_key = keys.1, "Incomplete coordinate mapping, skipping");
                    Ok(None)
                }
            };
        }
    }

    for pair in candidates {
        if source.has_variable(&pair.lon) && source.has_variable(&pair.lat) {
            return read_pair(source, pair, used).map(Some);
        }
    }
    Ok(None)
}

fn require_variable<S: DataSource + ?Sized>(source: &S, var: &str) -> GriddedResult<()> {
    if source.has_variable(var) {
        Ok(())
    } else {
        Err(GriddedError::variable_not_found(var))
    }
}

fn read_mapped<S: DataSource + ?Sized>(
    source: &S,
    var: &str,
    used: &mut Vec<String>,
) -> GriddedResult<ArrayD<f64>> {
    require_variable(source, var)?;
    let data = source.read_f64(var)?;
    used.push(var.to_string());
    Ok(data)
}

fn read_pair<S: DataSource + ?Sized>(
    source: &S,
    pair: &NamePair,
    used: &mut Vec<String>,
) -> GriddedResult<CoordinatePair> {
    let lon = read_mapped(source, &pair.lon, used)?;
    let lat = read_mapped(source, &pair.lat, used)?;
    CoordinatePair::new(lon, lat)
}

/// Split an (N, 2) node array into column 0 (lon) and column 1 (lat).
fn read_composite<S: DataSource + ?Sized>(
    source: &S,
    var: &str,
    used: &mut Vec<String>,
) -> GriddedResult<NodeCoordinates> {
    let data = read_mapped(source, var, used)?;
    if data.len() % 2 != 0 {
        return Err(GriddedError::invalid_shape(format!(
            "composite node variable '{}' has {} values, not divisible into (lon, lat) pairs",
            var,
            data.len()
        )));
    }
    let n = data.len() / 2;
    let nodes = Array2::from_shape_vec((n, 2), data.iter().copied().collect())
        .map_err(|e| GriddedError::invalid_shape(format!("{}: {}", var, e)))?;
    CoordinatePair::new(
        nodes.column(0).to_owned().into_dyn(),
        nodes.column(1).to_owned().into_dyn(),
    )
}
