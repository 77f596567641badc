//! The data-source capability grid discovery reads from.
//!
//! A [`DataSource`] is anything that can enumerate its variables, report
//! global and per-variable attributes, and read a variable as an array.
//! The native netCDF reader (feature `netcdf`) and [`MemoryDataset`]
//! both implement it.
//!
//! [`MemoryDataset`]: crate::memory::MemoryDataset

use std::collections::BTreeMap;
use std::path::PathBuf;

use ndarray::ArrayD;
use serde::{Deserialize, Serialize};

use crate::error::GriddedResult;

/// A netCDF attribute value, reduced to the two shapes discovery cares about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Text(String),
    Numbers(Vec<f64>),
}

impl AttrValue {
    /// The text value, if this is a text attribute.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Numbers(_) => None,
        }
    }

    /// The first numeric value, if this is a numeric attribute.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Numbers(v) => v.first().copied(),
            Self::Text(_) => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        Self::Numbers(vec![v])
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        Self::Numbers(vec![v as f64])
    }
}

impl From<Vec<f64>> for AttrValue {
    fn from(v: Vec<f64>) -> Self {
        Self::Numbers(v)
    }
}

/// Read access to a gridded dataset.
pub trait DataSource {
    /// Path or URL the dataset was opened from, if known.
    fn filepath(&self) -> Option<PathBuf>;

    /// Variable names in dataset order.
    fn variable_names(&self) -> Vec<String>;

    fn has_variable(&self, name: &str) -> bool {
        self.variable_names().iter().any(|n| n == name)
    }

    /// A global (dataset-level) attribute.
    fn attribute(&self, name: &str) -> Option<AttrValue>;

    /// All attributes of a variable, or `None` if the variable does not exist.
    fn variable_attributes(&self, var: &str) -> Option<BTreeMap<String, AttrValue>>;

    /// A single attribute of a variable.
    fn variable_attribute(&self, var: &str, attr: &str) -> Option<AttrValue> {
        self.variable_attributes(var)?.remove(attr)
    }

    /// Dimension names of a variable, or `None` if the variable does not exist.
    fn variable_dimensions(&self, var: &str) -> Option<Vec<String>>;

    /// Dimension lengths of a variable, without reading its data.
    fn variable_shape(&self, var: &str) -> Option<Vec<usize>>;

    /// Read a whole variable as floating point values.
    fn read_f64(&self, var: &str) -> GriddedResult<ArrayD<f64>>;

    /// Read a whole variable as integer values (connectivity arrays).
    fn read_i64(&self, var: &str) -> GriddedResult<ArrayD<i64>>;
}

impl<T: DataSource + ?Sized> DataSource for &T {
    fn filepath(&self) -> Option<PathBuf> {
        (**self).filepath()
    }

    fn variable_names(&self) -> Vec<String> {
        (**self).variable_names()
    }

    fn has_variable(&self, name: &str) -> bool {
        (**self).has_variable(name)
    }

    fn attribute(&self, name: &str) -> Option<AttrValue> {
        (**self).attribute(name)
    }

    fn variable_attributes(&self, var: &str) -> Option<BTreeMap<String, AttrValue>> {
        (**self).variable_attributes(var)
    }

    fn variable_attribute(&self, var: &str, attr: &str) -> Option<AttrValue> {
        (**self).variable_attribute(var, attr)
    }

    fn variable_dimensions(&self, var: &str) -> Option<Vec<String>> {
        (**self).variable_dimensions(var)
    }

    fn variable_shape(&self, var: &str) -> Option<Vec<usize>> {
        (**self).variable_shape(var)
    }

    fn read_f64(&self, var: &str) -> GriddedResult<ArrayD<f64>> {
        (**self).read_f64(var)
    }

    fn read_i64(&self, var: &str) -> GriddedResult<ArrayD<i64>> {
        (**self).read_i64(var)
    }
}

impl<T: DataSource + ?Sized> DataSource for Box<T> {
    fn filepath(&self) -> Option<PathBuf> {
        (**self).filepath()
    }

    fn variable_names(&self) -> Vec<String> {
        (**self).variable_names()
    }

    fn has_variable(&self, name: &str) -> bool {
        (**self).has_variable(name)
    }

    fn attribute(&self, name: &str) -> Option<AttrValue> {
        (**self).attribute(name)
    }

    fn variable_attributes(&self, var: &str) -> Option<BTreeMap<String, AttrValue>> {
        (**self).variable_attributes(var)
    }

    fn variable_attribute(&self, var: &str, attr: &str) -> Option<AttrValue> {
        (**self).variable_attribute(var, attr)
    }

    fn variable_dimensions(&self, var: &str) -> Option<Vec<String>> {
        (**self).variable_dimensions(var)
    }

    fn variable_shape(&self, var: &str) -> Option<Vec<usize>> {
        (**self).variable_shape(var)
    }

    fn read_f64(&self, var: &str) -> GriddedResult<ArrayD<f64>> {
        (**self).read_f64(var)
    }

    fn read_i64(&self, var: &str) -> GriddedResult<ArrayD<i64>> {
        (**self).read_i64(var)
    }
}
