//! The dataset facade: a grid plus the variables defined on it.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::error::{GriddedError, GriddedResult};
use crate::factory::GridFactory;
use crate::grid::Grid;
use crate::source::DataSource;
use crate::topology::GridTopology;
use crate::variable::{find_variables, Variable};

/// A complete dataset: a grid and the variables stored on it.
///
/// Built either from a data source (the grid is discovered and the
/// variables on its mesh are read) or from a grid and variables supplied
/// directly. When built from a source, grid and variables come from that
/// same source.
pub struct Dataset {
    source: Option<Box<dyn DataSource>>,
    filename: Option<PathBuf>,
    grid: Grid,
    variables: BTreeMap<String, Variable>,
}

impl fmt::Debug for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dataset")
            .field("has_source", &self.source.is_some())
            .field("filename", &self.filename)
            .field("grid", &self.grid.name())
            .field("variables", &self.variables.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Dataset {
    pub fn builder() -> DatasetBuilder {
        DatasetBuilder::default()
    }

    /// Open a netCDF file (or OPeNDAP URL) as a dataset.
    #[cfg(feature = "netcdf")]
    pub fn open(location: impl AsRef<std::path::Path>, factory: &mut GridFactory) -> GriddedResult<Self> {
        let source = crate::netcdf::NetcdfSource::open(location)?;
        Self::builder().source(source).build(factory)
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn variables(&self) -> &BTreeMap<String, Variable> {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    pub fn filename(&self) -> Option<&PathBuf> {
        self.filename.as_ref()
    }

    /// The data source this dataset was loaded from, if any.
    pub fn source(&self) -> Option<&dyn DataSource> {
        self.source.as_deref()
    }
}

/// Builder for [`Dataset`]. Supply a source, or a grid (with optional
/// variables), but not both.
#[derive(Default)]
pub struct DatasetBuilder {
    source: Option<Box<dyn DataSource>>,
    grid: Option<Grid>,
    variables: Option<BTreeMap<String, Variable>>,
    topology: Option<GridTopology>,
    grid_type: Option<String>,
}

impl DatasetBuilder {
    /// Load from a data source.
    pub fn source(mut self, source: impl DataSource + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Use a pre-built grid.
    pub fn grid(mut self, grid: Grid) -> Self {
        self.grid = Some(grid);
        self
    }

    /// Use pre-built variables.
    pub fn variables(mut self, variables: impl IntoIterator<Item = Variable>) -> Self {
        self.variables = Some(variables.into_iter().map(|v| (v.name.clone(), v)).collect());
        self
    }

    /// Topology mapping used when discovering the grid from a source.
    pub fn grid_topology(mut self, topology: GridTopology) -> Self {
        self.topology = Some(topology);
        self
    }

    /// Explicit grid type used when discovering the grid from a source.
    pub fn grid_type(mut self, grid_type: impl Into<String>) -> Self {
        self.grid_type = Some(grid_type.into());
        self
    }

    pub fn build(self, factory: &mut GridFactory) -> GriddedResult<Dataset> {
        match (self.source, self.grid, self.variables) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => Err(GriddedError::AmbiguousConstruction),
            (Some(source), None, None) => {
                let grid = factory.from_source(&*source, self.topology.as_ref(), self.grid_type.as_deref())?;
                let mut variables = BTreeMap::new();
                for name in find_variables(&*source, &grid) {
                    let var = Variable::from_source(&*source, &name)?;
                    variables.insert(name, var);
                }
                let filename = source.filepath();
                info!(
                    grid = grid.name(),
                    variables = variables.len(),
                    "Loaded dataset"
                );
                Ok(Dataset {
                    source: Some(source),
                    filename,
                    grid,
                    variables,
                })
            }
            (None, Some(grid), variables) => {
                debug!(grid = grid.name(), "Assembled dataset from supplied grid");
                Ok(Dataset {
                    source: None,
                    filename: None,
                    grid,
                    variables: variables.unwrap_or_default(),
                })
            }
            (None, None, _) => Err(GriddedError::NoSourceProvided),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDataset;
    use ndarray::{arr1, arr2};

    fn mesh() -> MemoryDataset {
        MemoryDataset::new()
            .with_filepath("mesh.nc")
            .with_variable("lon", &["node"], arr1(&[0.0, 1.0, 0.0]).into_dyn())
            .with_variable("lat", &["node"], arr1(&[0.0, 0.0, 1.0]).into_dyn())
            .with_variable("nv", &["three", "nele"], arr2(&[[1.0], [2.0], [3.0]]).into_dyn())
            .with_variable("h", &["node"], arr1(&[10.0, 12.0, 9.0]).into_dyn())
            .with_variable_attribute("h", "units", "m")
    }

    #[test]
    fn test_build_from_source() {
        let mut factory = GridFactory::new();
        let ds = Dataset::builder().source(mesh()).build(&mut factory).unwrap();
        assert_eq!(ds.filename().unwrap().to_str(), Some("mesh.nc"));
        assert_eq!(ds.variables().len(), 1);
        assert_eq!(ds.variable("h").unwrap().units(), Some("m"));
        assert!(ds.source().is_some());
    }

    #[test]
    fn test_build_from_grid_and_variables() {
        let mut factory = GridFactory::new();
        let source = mesh();
        let grid = factory.from_source(&source, None, None).unwrap();
        let h = Variable::from_source(&source, "h").unwrap();

        let ds = Dataset::builder().grid(grid.clone()).variables([h]).build(&mut factory).unwrap();
        assert_eq!(ds.grid(), &grid);
        assert!(ds.filename().is_none());
        assert!(ds.source().is_none());
        assert!(ds.variable("h").is_some());
    }

    #[test]
    fn test_mixed_construction_rejected() {
        let mut factory = GridFactory::new();
        let grid = factory.from_source(&mesh(), None, None).unwrap();
        let err = Dataset::builder().source(mesh()).grid(grid).build(&mut factory).unwrap_err();
        assert!(matches!(err, GriddedError::AmbiguousConstruction));

        let err = Dataset::builder()
            .source(mesh())
            .variables(Vec::new())
            .build(&mut factory)
            .unwrap_err();
        assert!(matches!(err, GriddedError::AmbiguousConstruction));
    }

    #[test]
    fn test_nothing_supplied() {
        let err = Dataset::builder().build(&mut GridFactory::new()).unwrap_err();
        assert!(matches!(err, GriddedError::NoSourceProvided));
    }

    #[test]
    fn test_explicit_grid_type_passed_through() {
        let mut factory = GridFactory::new();
        let err = Dataset::builder()
            .source(mesh())
            .grid_type("spectral")
            .build(&mut factory)
            .unwrap_err();
        assert!(matches!(err, GriddedError::UnsupportedGridType(_)));
    }
}
