//! Building grids from data sources.
//!
//! A [`GridFactory`] owns the naming conventions and the counters used to
//! generate default grid names (`UnstructuredGrid_0`, `StructuredGrid_0`,
//! ...). Keeping the counters on the factory instead of in global state
//! makes naming deterministic per factory.
//!
//! # Example
//!
//! ```rust,ignore
//! use gridded::{GridFactory, NetcdfSource};
//!
//! let mut factory = GridFactory::new();
//! let source = NetcdfSource::open("fvcom_output.nc")?;
//! let grid = factory.from_source(&source, None, None)?;
//! println!("{} {:?}", grid.name(), grid.shape());
//! ```

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info};

use crate::conventions::{Conventions, GridKind};
use crate::error::{GriddedError, GriddedResult};
use crate::extract::{extract_required_attrs, RequiredAttrs};
use crate::grid::{Grid, GridMeta, SavedGrid, StructuredGrid, UnstructuredGrid};
use crate::resolver::{find_topology_variable, resolve_grid_type};
use crate::source::DataSource;
use crate::topology::GridTopology;

/// Creates grids and hands out default names.
#[derive(Debug, Clone, Default)]
pub struct GridFactory {
    conventions: Conventions,
    counters: HashMap<GridKind, usize>,
}

impl GridFactory {
    /// Create a factory with the default naming conventions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a factory with custom naming conventions.
    pub fn with_conventions(conventions: Conventions) -> Self {
        Self {
            conventions,
            counters: HashMap::new(),
        }
    }

    /// Create a factory using conventions from `GRIDDED_CONVENTIONS`.
    pub fn from_env() -> GriddedResult<Self> {
        Ok(Self::with_conventions(Conventions::from_env()?))
    }

    pub fn conventions(&self) -> &Conventions {
        &self.conventions
    }

    /// Number of grids of `kind` that have taken a default name.
    pub fn count(&self, kind: GridKind) -> usize {
        self.counters.get(&kind).copied().unwrap_or(0)
    }

    fn next_name(&mut self, kind: GridKind) -> String {
        let count = self.counters.entry(kind).or_insert(0);
        let name = format!("{}_{}", kind.default_name_prefix(), count);
        *count += 1;
        name
    }

    /// Resolve and build the grid described by `source`.
    ///
    /// `topology` maps logical attribute names to dataset variables and
    /// takes precedence over discovered names; `grid_type` skips detection.
    pub fn from_source<S: DataSource + ?Sized>(
        &mut self,
        source: &S,
        topology: Option<&GridTopology>,
        grid_type: Option<&str>,
    ) -> GriddedResult<Grid> {
        self.build(source, topology, grid_type, None)
    }

    /// Like [`from_source`](Self::from_source) with an explicit grid name.
    pub fn from_source_named<S: DataSource + ?Sized>(
        &mut self,
        source: &S,
        topology: Option<&GridTopology>,
        grid_type: Option<&str>,
        name: impl Into<String>,
    ) -> GriddedResult<Grid> {
        self.build(source, topology, grid_type, Some(name.into()))
    }

    fn build<S: DataSource + ?Sized>(
        &mut self,
        source: &S,
        topology: Option<&GridTopology>,
        grid_type: Option<&str>,
        name: Option<String>,
    ) -> GriddedResult<Grid> {
        let kind = resolve_grid_type(source, topology, grid_type, &self.conventions)?;
        let attrs = extract_required_attrs(source, kind, topology, &self.conventions)?;

        // Names are only handed out once extraction has succeeded.
        let name = name.unwrap_or_else(|| self.next_name(kind));
        let mut meta = GridMeta::new(name);
        meta.mesh_name = find_topology_variable(source);
        meta.topology = topology.filter(|t| !t.is_empty()).cloned();

        let grid: Grid = match attrs {
            RequiredAttrs::Unstructured(a) => UnstructuredGrid::from_attrs(meta, a).into(),
            RequiredAttrs::Structured(a) => StructuredGrid::from_attrs(meta, a).into(),
        };
        info!(
            name = grid.name(),
            kind = %grid.kind(),
            shape = ?crate::grid::HasNodes::shape(&grid),
            "Built grid"
        );
        Ok(grid)
    }

    /// Rebuild a grid from its saved form.
    ///
    /// `open` turns the saved filename into a data source. The grid is
    /// re-derived from that source, then the saved name, id and mesh name
    /// are restored. A grid restored under its saved name does not consume a
    /// default name.
    pub fn from_saved<S, F>(&mut self, saved: &SavedGrid, open: F) -> GriddedResult<Grid>
    where
        S: DataSource,
        F: FnOnce(&Path) -> GriddedResult<S>,
    {
        if saved.filename.as_os_str().is_empty() {
            return Err(GriddedError::NoSourceProvided);
        }
        let source = open(&saved.filename)?;
        let mut grid = self.build(
            &source,
            saved.grid_topology.as_ref(),
            saved.grid_type.as_deref(),
            saved.name.clone(),
        )?;

        let meta = grid.meta_mut();
        if let Some(id) = saved.id {
            meta.id = id;
        }
        if saved.mesh_name.is_some() {
            meta.mesh_name = saved.mesh_name.clone();
        }
        if meta.filename.is_none() {
            meta.filename = Some(saved.filename.clone());
        }
        debug!(name = %meta.name, id = %meta.id, "Restored grid from saved form");
        Ok(grid)
    }

    /// Open a netCDF file (or OPeNDAP URL) and build its grid.
    #[cfg(feature = "netcdf")]
    pub fn from_netcdf(
        &mut self,
        location: impl AsRef<Path>,
        topology: Option<&GridTopology>,
        grid_type: Option<&str>,
    ) -> GriddedResult<Grid> {
        let source = crate::netcdf::NetcdfSource::open(location)?;
        self.from_source(&source, topology, grid_type)
    }

    /// [`from_saved`](Self::from_saved) reading the saved file with libnetcdf.
    #[cfg(feature = "netcdf")]
    pub fn from_saved_netcdf(&mut self, saved: &SavedGrid) -> GriddedResult<Grid> {
        self.from_saved(saved, |path| crate::netcdf::NetcdfSource::open(path))
    }
}
