//! Deciding whether a dataset holds an unstructured or a structured grid.
//!
//! Signals are checked in priority order:
//!
//! 1. an explicit grid type string from the caller
//! 2. a caller-supplied [`GridTopology`] mapping
//! 3. a dataset-level `grid_type` attribute
//! 4. a UGRID/SGRID topology variable (`cf_role` containing "topology")
//! 5. trial extraction by naming convention, unstructured first
//!
//! Only step 5 can fall through: an unstructured attempt that finds no
//! face variable moves on to the structured attempt. Any other failure
//! is a problem with the dataset itself and is returned as-is.

use tracing::debug;

use crate::conventions::{Conventions, GridKind};
use crate::error::{GriddedError, GriddedResult};
use crate::extract::{extract_structured, extract_unstructured};
use crate::source::DataSource;
use crate::topology::GridTopology;

/// Attribute name used at dataset level and inside topology mappings.
const GRID_TYPE_ATTR: &str = "grid_type";

/// Resolve the grid kind of a dataset.
pub fn resolve_grid_type<S: DataSource + ?Sized>(
    source: &S,
    topology: Option<&GridTopology>,
    grid_type: Option<&str>,
    conventions: &Conventions,
) -> GriddedResult<GridKind> {
    if let Some(requested) = grid_type {
        let kind = GridKind::from_alias(requested, conventions)
            .ok_or_else(|| GriddedError::UnsupportedGridType(requested.to_string()))?;
        debug!(grid_type = requested, %kind, "Grid kind from explicit grid_type");
        return Ok(kind);
    }

    if let Some(topo) = topology {
        let mapped_ugrid = topo
            .grid_type()
            .and_then(|t| GridKind::from_alias(t, conventions))
            == Some(GridKind::Unstructured);
        let kind = if topo.has_faces() || mapped_ugrid {
            GridKind::Unstructured
        } else {
            GridKind::Structured
        };
        debug!(%kind, "Grid kind from grid_topology mapping");
        return Ok(kind);
    }

    if let Some(kind) = source
        .attribute(GRID_TYPE_ATTR)
        .and_then(|v| v.as_str().and_then(|s| GridKind::from_alias(s, conventions)))
    {
        debug!(%kind, "Grid kind from dataset grid_type attribute");
        return Ok(kind);
    }

    if let Some(var) = find_topology_variable(source) {
        let attrs = source.variable_attributes(&var).unwrap_or_default();
        let kind = if attrs.contains_key("node_coordinates") && !attrs.contains_key("node_dimensions") {
            GridKind::Unstructured
        } else {
            GridKind::Structured
        };
        debug!(topology_var = %var, %kind, "Grid kind from topology variable");
        return Ok(kind);
    }

    infer_from_conventions(source, conventions)
}

/// The first variable whose `cf_role` attribute contains "topology".
pub fn find_topology_variable<S: DataSource + ?Sized>(source: &S) -> Option<String> {
    source.variable_names().into_iter().find(|name| {
        source
            .variable_attribute(name, "cf_role")
            .and_then(|v| v.as_str().map(|role| role.contains("topology")))
            .unwrap_or(false)
    })
}

fn infer_from_conventions<S: DataSource + ?Sized>(
    source: &S,
    conventions: &Conventions,
) -> GriddedResult<GridKind> {
    match extract_unstructured(source, None, conventions) {
        Ok(_) => {
            debug!("Grid kind inferred: unstructured attributes found");
            Ok(GridKind::Unstructured)
        }
        Err(GriddedError::FacesNotFound) => {
            debug!("No faces variable, trying structured attributes");
            extract_structured(source, None, conventions)?;
            debug!("Grid kind inferred: structured attributes found");
            Ok(GridKind::Structured)
        }
        Err(e) => Err(e),
    }
}
