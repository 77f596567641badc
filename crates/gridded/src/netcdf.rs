//! Native netCDF reading using the netcdf library.
//!
//! [`NetcdfSource`] wraps an open `netcdf::File` and implements
//! [`DataSource`] over it. Files, OPeNDAP URLs (when libnetcdf is built
//! with DAP support) and in-memory bytes can all be opened.
//!
//! # Notes
//!
//! The netcdf library requires a file path (it wraps libnetcdf/HDF5 which
//! need file handles). When reading from bytes, we write to a temp file
//! first. On Linux, we use `/dev/shm` (memory-backed tmpfs) to minimize
//! I/O latency.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Once;

use ndarray::{ArrayD, IxDyn};
use netcdf::types::{FloatType, IntType, NcVariableType};
use netcdf::AttributeValue;
use tracing::{debug, warn};

use crate::error::{GriddedError, GriddedResult};
use crate::source::{AttrValue, DataSource};

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints verbose error messages to stderr even when
/// errors are handled gracefully (e.g. when probing for optional
/// attributes that don't exist). This disables that output by calling
/// H5Eset_auto2 with null handlers. Safe to call multiple times.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and we're passing null pointers
        // to disable error output, which is a documented valid use.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// A dataset backed by libnetcdf.
pub struct NetcdfSource {
    file: netcdf::File,
    location: PathBuf,
    /// Temp file to remove on drop, for sources opened from bytes.
    temp_file: Option<PathBuf>,
}

impl NetcdfSource {
    /// Open a netCDF file or OPeNDAP URL.
    pub fn open(location: impl AsRef<Path>) -> GriddedResult<Self> {
        let location = location.as_ref();
        if location.as_os_str().is_empty() {
            return Err(GriddedError::NoSourceProvided);
        }
        silence_hdf5_errors();
        let file = netcdf::open(location)?;
        debug!(location = %location.display(), "Opened netCDF dataset");
        Ok(Self {
            file,
            location: location.to_path_buf(),
            temp_file: None,
        })
    }

    /// Wrap an already-open handle.
    pub fn from_file(file: netcdf::File) -> Self {
        let location = file.path().unwrap_or_default();
        Self {
            file,
            location,
            temp_file: None,
        }
    }

    /// Open a netCDF file held in memory.
    pub fn open_from_bytes(data: &[u8]) -> GriddedResult<Self> {
        silence_hdf5_errors();

        let temp_file = get_optimal_temp_dir().join(generate_temp_filename());
        let mut file = std::fs::File::create(&temp_file)?;
        file.write_all(data)?;
        drop(file);

        match netcdf::open(&temp_file) {
            Ok(nc) => Ok(Self {
                file: nc,
                location: temp_file.clone(),
                temp_file: Some(temp_file),
            }),
            Err(e) => {
                let _ = std::fs::remove_file(&temp_file);
                Err(e.into())
            }
        }
    }

    /// The underlying netcdf handle.
    pub fn file(&self) -> &netcdf::File {
        &self.file
    }

    fn variable(&self, name: &str) -> GriddedResult<netcdf::Variable<'_>> {
        self.file
            .variable(name)
            .ok_or_else(|| GriddedError::variable_not_found(name))
    }
}

impl Drop for NetcdfSource {
    fn drop(&mut self) {
        if let Some(path) = self.temp_file.take() {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!(path = %path.display(), error = %e, "Failed to remove temp netCDF file");
            }
        }
    }
}

/// Open `location` as a netCDF data source.
pub fn open_dataset(location: &str) -> GriddedResult<NetcdfSource> {
    if location.trim().is_empty() {
        return Err(GriddedError::NoSourceProvided);
    }
    NetcdfSource::open(location.trim())
}

impl DataSource for NetcdfSource {
    fn filepath(&self) -> Option<PathBuf> {
        Some(self.location.clone())
    }

    fn variable_names(&self) -> Vec<String> {
        self.file.variables().map(|v| v.name()).collect()
    }

    fn has_variable(&self, name: &str) -> bool {
        self.file.variable(name).is_some()
    }

    fn attribute(&self, name: &str) -> Option<AttrValue> {
        let attr = self.file.attributes().find(|a| a.name() == name)?;
        attr.value().ok().and_then(convert_attr)
    }

    fn variable_attributes(&self, var: &str) -> Option<BTreeMap<String, AttrValue>> {
        let var = self.file.variable(var)?;
        Some(
            var.attributes()
                .filter_map(|a| {
                    let value = a.value().ok().and_then(convert_attr)?;
                    Some((a.name().to_string(), value))
                })
                .collect(),
        )
    }

    fn variable_attribute(&self, var: &str, attr: &str) -> Option<AttrValue> {
        let var = self.file.variable(var)?;
        if !has_attr(&var, attr) {
            return None;
        }
        var.attribute_value(attr)?.ok().and_then(convert_attr)
    }

    fn variable_dimensions(&self, var: &str) -> Option<Vec<String>> {
        let var = self.file.variable(var)?;
        Some(var.dimensions().iter().map(|d| d.name()).collect())
    }

    fn variable_shape(&self, var: &str) -> Option<Vec<usize>> {
        let var = self.file.variable(var)?;
        Some(var.dimensions().iter().map(|d| d.len()).collect())
    }

    fn read_f64(&self, name: &str) -> GriddedResult<ArrayD<f64>> {
        let var = self.variable(name)?;
        let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
        let values: Vec<f64> = match var.vartype() {
            NcVariableType::Float(FloatType::F64) => var.get_values::<f64, _>(..)?,
            NcVariableType::Float(FloatType::F32) => widen(var.get_values::<f32, _>(..)?),
            NcVariableType::Int(IntType::I64) => var.get_values::<i64, _>(..)?.into_iter().map(|v| v as f64).collect(),
            NcVariableType::Int(IntType::U64) => var.get_values::<u64, _>(..)?.into_iter().map(|v| v as f64).collect(),
            NcVariableType::Int(IntType::I32) => widen(var.get_values::<i32, _>(..)?),
            NcVariableType::Int(IntType::U32) => widen(var.get_values::<u32, _>(..)?),
            NcVariableType::Int(IntType::I16) => widen(var.get_values::<i16, _>(..)?),
            NcVariableType::Int(IntType::U16) => widen(var.get_values::<u16, _>(..)?),
            NcVariableType::Int(IntType::I8) => widen(var.get_values::<i8, _>(..)?),
            NcVariableType::Int(IntType::U8) => widen(var.get_values::<u8, _>(..)?),
            other => {
                return Err(GriddedError::read_failed(format!(
                    "variable '{}' has non-numeric type {:?}",
                    name, other
                )))
            }
        };
        to_array(name, shape, values)
    }

    fn read_i64(&self, name: &str) -> GriddedResult<ArrayD<i64>> {
        let var = self.variable(name)?;
        let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
        let values: Vec<i64> = match var.vartype() {
            NcVariableType::Int(IntType::I64) => var.get_values::<i64, _>(..)?,
            NcVariableType::Int(IntType::U64) => var.get_values::<u64, _>(..)?.into_iter().map(|v| v as i64).collect(),
            NcVariableType::Int(IntType::I32) => widen(var.get_values::<i32, _>(..)?),
            NcVariableType::Int(IntType::U32) => widen(var.get_values::<u32, _>(..)?),
            NcVariableType::Int(IntType::I16) => widen(var.get_values::<i16, _>(..)?),
            NcVariableType::Int(IntType::U16) => widen(var.get_values::<u16, _>(..)?),
            NcVariableType::Int(IntType::I8) => widen(var.get_values::<i8, _>(..)?),
            NcVariableType::Int(IntType::U8) => widen(var.get_values::<u8, _>(..)?),
            // Some writers store connectivity as floats
            NcVariableType::Float(_) => self.read_f64(name)?.iter().map(|v| v.round() as i64).collect(),
            other => {
                return Err(GriddedError::read_failed(format!(
                    "variable '{}' has non-integer type {:?}",
                    name, other
                )))
            }
        };
        to_array(name, shape, values)
    }
}

/// Check if an attribute exists without triggering HDF5 errors.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

fn widen<T: Copy, U: From<T>>(values: Vec<T>) -> Vec<U> {
    values.into_iter().map(U::from).collect()
}

fn to_array<T>(name: &str, shape: Vec<usize>, values: Vec<T>) -> GriddedResult<ArrayD<T>> {
    ArrayD::from_shape_vec(IxDyn(&shape), values)
        .map_err(|e| GriddedError::read_failed(format!("variable '{}': {}", name, e)))
}

fn convert_attr(value: AttributeValue) -> Option<AttrValue> {
    let numbers = match value {
        AttributeValue::Str(s) => return Some(AttrValue::Text(s)),
        AttributeValue::Strs(v) => return Some(AttrValue::Text(v.join(" "))),
        AttributeValue::Double(v) => vec![v],
        AttributeValue::Doubles(v) => v,
        AttributeValue::Float(v) => vec![v as f64],
        AttributeValue::Floats(v) => widen(v),
        AttributeValue::Int(v) => vec![v as f64],
        AttributeValue::Ints(v) => widen(v),
        AttributeValue::Short(v) => vec![v as f64],
        AttributeValue::Shorts(v) => widen(v),
        AttributeValue::Longlong(v) => vec![v as f64],
        AttributeValue::Longlongs(v) => v.into_iter().map(|x| x as f64).collect(),
        AttributeValue::Schar(v) => vec![v as f64],
        AttributeValue::Uchar(v) => vec![v as f64],
        _ => return None,
    };
    Some(AttrValue::Numbers(numbers))
}

/// Get the optimal temp directory for netCDF byte loading.
///
/// On Linux, uses /dev/shm (memory-backed tmpfs) if available.
/// Falls back to the system temp directory otherwise.
fn get_optimal_temp_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        let shm_path = Path::new("/dev/shm");
        if shm_path.exists() && shm_path.is_dir() {
            // Verify we can write to /dev/shm
            let test_path = shm_path.join(format!(".gridded_test_{}", std::process::id()));
            if std::fs::write(&test_path, b"test").is_ok() {
                let _ = std::fs::remove_file(&test_path);
                return shm_path.to_path_buf();
            }
        }
    }

    std::env::temp_dir()
}

/// Unique temp file name from process ID, thread ID and a counter.
fn generate_temp_filename() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let pid = std::process::id();
    let tid = std::thread::current().id();
    let count = COUNTER.fetch_add(1, Ordering::Relaxed);

    format!("gridded_{}_{:?}_{}.nc", pid, tid, count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optimal_temp_dir() {
        let dir = get_optimal_temp_dir();
        assert!(dir.exists(), "Temp dir should exist");
    }

    #[test]
    fn test_temp_filename_uniqueness() {
        let name1 = generate_temp_filename();
        let name2 = generate_temp_filename();
        assert_ne!(name1, name2, "Temp filenames should be unique");
    }

    #[test]
    fn test_open_empty_location() {
        assert!(matches!(open_dataset("  "), Err(GriddedError::NoSourceProvided)));
    }

    #[test]
    fn test_open_from_garbage_bytes_cleans_up() {
        assert!(NetcdfSource::open_from_bytes(b"not a netcdf file").is_err());
    }

    #[test]
    fn test_convert_attr() {
        assert_eq!(
            convert_attr(AttributeValue::Str("mesh_topology".to_string())),
            Some(AttrValue::Text("mesh_topology".to_string()))
        );
        assert_eq!(convert_attr(AttributeValue::Int(1)), Some(AttrValue::Numbers(vec![1.0])));
        assert_eq!(
            convert_attr(AttributeValue::Floats(vec![0.5, 1.5])),
            Some(AttrValue::Numbers(vec![0.5, 1.5]))
        );
    }

    #[test]
    fn test_roundtrip_written_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tri.nc");
        {
            let mut file = netcdf::create(&path).unwrap();
            file.add_dimension("node", 3).unwrap();
            file.add_dimension("nele", 1).unwrap();
            file.add_dimension("three", 3).unwrap();
            {
                let mut lon = file.add_variable::<f64>("lon", &["node"]).unwrap();
                lon.put_values(&[0.0, 1.0, 0.0], ..).unwrap();
            }
            {
                let mut lat = file.add_variable::<f64>("lat", &["node"]).unwrap();
                lat.put_values(&[0.0, 0.0, 1.0], ..).unwrap();
            }
            let mut nv = file.add_variable::<i32>("nv", &["three", "nele"]).unwrap();
            nv.put_values(&[1, 2, 3], ..).unwrap();
            nv.put_attribute("long_name", "nodes surrounding element").unwrap();
        }

        let source = NetcdfSource::open(&path).unwrap();
        assert_eq!(source.variable_names().len(), 3);
        assert_eq!(source.read_i64("nv").unwrap().shape(), &[3, 1]);
        assert_eq!(source.variable_shape("nv"), Some(vec![3, 1]));
        assert_eq!(source.variable_shape("missing"), None);
        assert_eq!(
            source.variable_attribute("nv", "long_name").and_then(|v| v.as_str().map(String::from)),
            Some("nodes surrounding element".to_string())
        );
        assert_eq!(source.read_f64("lon").unwrap().len(), 3);
    }
}
