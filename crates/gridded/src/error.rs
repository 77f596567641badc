//! Error types for grid discovery and dataset loading.

use thiserror::Error;

/// Result type for gridded operations.
pub type GriddedResult<T> = Result<T, GriddedError>;

/// Errors that can occur while resolving a grid from a dataset.
#[derive(Error, Debug)]
pub enum GriddedError {
    // === Resolution Errors ===
    /// An explicit grid type string matched none of the known aliases.
    #[error("unsupported grid type: {0}")]
    UnsupportedGridType(String),

    /// No coordinate pair or composite node variable matched.
    #[error("unable to find node coordinates")]
    NodeCoordinatesNotFound,

    /// Unstructured extraction found no face/connectivity variable.
    #[error("unable to find faces variable")]
    FacesNotFound,

    // === Construction Errors ===
    /// Neither a filename nor a dataset handle was given.
    #[error("no filename or dataset provided")]
    NoSourceProvided,

    /// A dataset handle and explicit grid/variables were both given.
    #[error("ambiguous construction: provide either a data source or a grid with variables, not both")]
    AmbiguousConstruction,

    // === Data Errors ===
    /// A variable named by a topology mapping or lookup is not in the dataset.
    #[error("variable not found: {0}")]
    VariableNotFound(String),

    /// An array does not have the shape its role requires.
    #[error("invalid shape: {0}")]
    InvalidShape(String),

    /// The underlying data source failed to read a variable.
    #[error("failed to read variable: {0}")]
    ReadFailed(String),

    /// Invalid naming-convention configuration.
    #[error("configuration error: {0}")]
    Config(String),

    // === Wrapped Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[cfg(feature = "netcdf")]
    #[error("NetCDF error: {0}")]
    NetCdf(#[from] netcdf::Error),
}

impl GriddedError {
    /// Create a VariableNotFound error.
    pub fn variable_not_found(name: impl Into<String>) -> Self {
        Self::VariableNotFound(name.into())
    }

    /// Create an InvalidShape error.
    pub fn invalid_shape(msg: impl Into<String>) -> Self {
        Self::InvalidShape(msg.into())
    }

    /// Create a ReadFailed error.
    pub fn read_failed(msg: impl Into<String>) -> Self {
        Self::ReadFailed(msg.into())
    }

    /// Create a Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True when the error means "this grid kind does not fit the dataset",
    /// as opposed to a malformed or unreadable dataset.
    pub fn is_extraction_miss(&self) -> bool {
        matches!(self, Self::FacesNotFound | Self::NodeCoordinatesNotFound)
    }
}
