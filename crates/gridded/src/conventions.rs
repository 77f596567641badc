//! Grid kinds and the variable-naming conventions used to discover them.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GriddedError, GriddedResult};

/// Environment variable naming a YAML file with convention overrides.
pub const CONVENTIONS_ENV: &str = "GRIDDED_CONVENTIONS";

/// The two grid representations a dataset can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridKind {
    /// Triangular or polygonal mesh (UGRID).
    Unstructured,
    /// Curvilinear, possibly staggered grid (SGRID / ROMS).
    Structured,
}

impl GridKind {
    /// Match a grid type string against the alias lists (case-insensitive).
    pub fn from_alias(s: &str, conventions: &Conventions) -> Option<Self> {
        let s = s.trim().to_lowercase();
        if conventions.sgrid_aliases.iter().any(|a| a.eq_ignore_ascii_case(&s)) {
            Some(Self::Structured)
        } else if conventions.ugrid_aliases.iter().any(|a| a.eq_ignore_ascii_case(&s)) {
            Some(Self::Unstructured)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unstructured => "ugrid",
            Self::Structured => "sgrid",
        }
    }

    /// Prefix used for generated grid names.
    pub fn default_name_prefix(&self) -> &'static str {
        match self {
            Self::Unstructured => "UnstructuredGrid",
            Self::Structured => "StructuredGrid",
        }
    }
}

impl fmt::Display for GridKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A (longitude, latitude) variable-name pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamePair {
    pub lon: String,
    pub lat: String,
}

impl NamePair {
    pub fn new(lon: impl Into<String>, lat: impl Into<String>) -> Self {
        Self {
            lon: lon.into(),
            lat: lat.into(),
        }
    }
}

fn pairs(names: &[(&str, &str)]) -> Vec<NamePair> {
    names.iter().map(|(lon, lat)| NamePair::new(*lon, *lat)).collect()
}

fn strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Candidate names probed during grid discovery, in priority order.
///
/// The defaults cover UGRID, SGRID, FVCOM/ADCIRC and ROMS output. Any
/// table can be overridden from YAML; missing keys keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Conventions {
    /// Grid type strings meaning "structured".
    pub sgrid_aliases: Vec<String>,
    /// Grid type strings meaning "unstructured".
    pub ugrid_aliases: Vec<String>,
    /// Node longitude/latitude pairs.
    pub node_coord_names: Vec<NamePair>,
    /// Variables holding nodes as an (N, 2) array.
    pub composite_node_names: Vec<String>,
    /// Face/connectivity variables.
    pub face_names: Vec<String>,
    pub center_coord_names: Vec<NamePair>,
    pub edge1_coord_names: Vec<NamePair>,
    pub edge2_coord_names: Vec<NamePair>,
}

impl Default for Conventions {
    fn default() -> Self {
        Self {
            sgrid_aliases: strings(&["sgrid", "pygrid_s", "staggered", "curvilinear", "roms"]),
            ugrid_aliases: strings(&["ugrid", "pygrid_u", "triangular", "unstructured"]),
            node_coord_names: pairs(&[("node_lon", "node_lat"), ("lon", "lat"), ("lon_psi", "lat_psi")]),
            composite_node_names: strings(&["nodes", "node"]),
            face_names: strings(&["faces", "tris", "nv", "ele"]),
            center_coord_names: pairs(&[("center_lon", "center_lat"), ("lon_rho", "lat_rho")]),
            edge1_coord_names: pairs(&[("edge1_lon", "edge1_lat"), ("lon_u", "lat_u")]),
            edge2_coord_names: pairs(&[("edge2_lon", "edge2_lat"), ("lon_v", "lat_v")]),
        }
    }
}

impl Conventions {
    /// Load conventions from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> GriddedResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let conventions: Self = serde_yaml::from_str(&text)?;
        conventions.validate()?;
        debug!(path = %path.display(), "Loaded naming conventions");
        Ok(conventions)
    }

    /// Load conventions from the file named by `GRIDDED_CONVENTIONS`,
    /// or the defaults when it is unset.
    pub fn from_env() -> GriddedResult<Self> {
        match std::env::var(CONVENTIONS_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_yaml_file(path.trim()),
            _ => Ok(Self::default()),
        }
    }

    /// Validate the tables.
    pub fn validate(&self) -> GriddedResult<()> {
        if self.sgrid_aliases.is_empty() || self.ugrid_aliases.is_empty() {
            return Err(GriddedError::config("grid type alias lists must not be empty"));
        }
        if let Some(dup) = self
            .sgrid_aliases
            .iter()
            .find(|s| self.ugrid_aliases.iter().any(|u| u.eq_ignore_ascii_case(s)))
        {
            return Err(GriddedError::config(format!(
                "alias '{}' is listed for both grid kinds",
                dup
            )));
        }
        if self.node_coord_names.is_empty() && self.composite_node_names.is_empty() {
            return Err(GriddedError::config("no node coordinate names configured"));
        }
        if self.face_names.is_empty() {
            return Err(GriddedError::config("face_names must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_alias_matching_is_case_insensitive() {
        let c = Conventions::default();
        assert_eq!(GridKind::from_alias("ROMS", &c), Some(GridKind::Structured));
        assert_eq!(GridKind::from_alias("Curvilinear", &c), Some(GridKind::Structured));
        assert_eq!(GridKind::from_alias("UGRID", &c), Some(GridKind::Unstructured));
        assert_eq!(GridKind::from_alias("triangular", &c), Some(GridKind::Unstructured));
        assert_eq!(GridKind::from_alias("rectilinear", &c), None);
    }

    #[test]
    fn test_defaults_validate() {
        assert!(Conventions::default().validate().is_ok());
    }

    #[test]
    fn test_overlapping_aliases_rejected() {
        let mut c = Conventions::default();
        c.ugrid_aliases.push("ROMS".to_string());
        assert!(matches!(c.validate(), Err(GriddedError::Config(_))));
    }

    #[test]
    fn test_yaml_partial_override_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "face_names: [element_node_connectivity, nv]").unwrap();

        let c = Conventions::from_yaml_file(file.path()).unwrap();
        assert_eq!(c.face_names, vec!["element_node_connectivity", "nv"]);
        assert_eq!(c.node_coord_names, Conventions::default().node_coord_names);
    }

    #[test]
    fn test_yaml_empty_faces_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "face_names: []").unwrap();
        assert!(Conventions::from_yaml_file(file.path()).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(GridKind::Structured.to_string(), "sgrid");
        assert_eq!(GridKind::Unstructured.to_string(), "ugrid");
    }
}
