//! UGRID/SGRID grid discovery and dataset loading.
//!
//! This crate turns a gridded dataset (typically netCDF output from an
//! ocean or atmosphere model) into an in-memory grid plus the variables
//! defined on it. It decides whether the dataset holds an unstructured
//! mesh (UGRID, FVCOM, ADCIRC) or a structured staggered grid (SGRID,
//! ROMS), then finds the coordinate and connectivity arrays that grid
//! needs.
//!
//! # Architecture
//!
//! ```text
//! DataSource (netCDF file, OPeNDAP URL, MemoryDataset)
//!      │
//!      ▼
//! resolve_grid_type()
//!      │
//!      ├─► explicit grid_type / topology["grid_type"]
//!      ├─► dataset "grid_type" attribute
//!      ├─► cf_role = *topology* variable
//!      └─► trial extraction (faces found => unstructured)
//!      │
//!      ▼
//! extract_required_attrs() ─► GridFactory ─► Grid
//!                                             │
//!                                             ▼
//!                              Dataset { grid, variables }
//! ```
//!
//! # Example
//!
//! ```
//! use gridded::{Dataset, GridFactory, GridKind, MemoryDataset};
//! use ndarray::{arr1, arr2};
//!
//! let source = MemoryDataset::new()
//!     .with_variable("lon", &["node"], arr1(&[0.0, 1.0, 0.0]).into_dyn())
//!     .with_variable("lat", &["node"], arr1(&[0.0, 0.0, 1.0]).into_dyn())
//!     .with_variable("nv", &["three", "nele"], arr2(&[[1.0], [2.0], [3.0]]).into_dyn());
//!
//! let mut factory = GridFactory::new();
//! let dataset = Dataset::builder().source(source).build(&mut factory).unwrap();
//! assert_eq!(dataset.grid().kind(), GridKind::Unstructured);
//! assert_eq!(dataset.grid().name(), "UnstructuredGrid_0");
//! ```

pub mod conventions;
pub mod dataset;
pub mod error;
pub mod extract;
pub mod factory;
pub mod grid;
pub mod memory;
#[cfg(feature = "netcdf")]
pub mod netcdf;
pub mod resolver;
pub mod source;
pub mod topology;
pub mod variable;

// Re-export commonly used types at crate root
pub use conventions::{Conventions, GridKind, NamePair, CONVENTIONS_ENV};
pub use dataset::{Dataset, DatasetBuilder};
pub use error::{GriddedError, GriddedResult};
pub use extract::{
    extract_required_attrs, CoordinatePair, NodeCoordinates, RequiredAttrs, StructuredAttrs,
    UnstructuredAttrs,
};
pub use factory::GridFactory;
pub use grid::{Grid, GridMeta, HasFaces, HasNodes, SavedGrid, StructuredGrid, UnstructuredGrid};
pub use memory::MemoryDataset;
#[cfg(feature = "netcdf")]
pub use netcdf::{open_dataset, silence_hdf5_errors, NetcdfSource};
pub use resolver::{find_topology_variable, resolve_grid_type};
pub use source::{AttrValue, DataSource};
pub use topology::GridTopology;
pub use variable::{find_variables, Location, Variable};
