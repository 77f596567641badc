//! In-memory datasets shaped like real model output.
//!
//! Each fixture mirrors the variable layout of a file family grid
//! discovery must handle: UGRID with a mesh topology variable, FVCOM with
//! 1-based `nv`, ROMS with rho/psi/u/v coordinates, and SGRID with a grid
//! topology variable.

use gridded::MemoryDataset;
use ndarray::arr1;

use crate::generators::{create_node_field, create_staggered_grid, create_triangle_mesh};

/// Node lattice used by the unstructured fixtures; 9 nodes, 8 faces.
pub const MESH_NX: usize = 3;
pub const MESH_NY: usize = 3;

/// Rho-point dimensions used by the structured fixtures.
pub const ROMS_ETA: usize = 4;
pub const ROMS_XI: usize = 5;

/// Number of time steps in every fixture.
pub const NUM_TIMES: usize = 2;

fn times() -> ndarray::ArrayD<f64> {
    arr1(&[0.0, 3600.0]).into_dyn()
}

/// A UGRID 1.0 file: `mesh` topology variable, `node_lon`/`node_lat`,
/// 0-based `faces`, and data variables tagged with `mesh = "mesh"`.
pub fn ugrid_triangle_mesh() -> MemoryDataset {
    let mesh = create_triangle_mesh(MESH_NX, MESH_NY);
    let n = mesh.num_nodes();
    let nf = mesh.num_faces();

    MemoryDataset::new()
        .with_filepath("ugrid_triangle_mesh.nc")
        .with_attribute("Conventions", "CF-1.6, UGRID-1.0")
        .with_marker_variable("mesh")
        .with_variable_attribute("mesh", "cf_role", "mesh_topology")
        .with_variable_attribute("mesh", "topology_dimension", 2.0)
        .with_variable_attribute("mesh", "node_coordinates", "node_lon node_lat")
        .with_variable_attribute("mesh", "face_node_connectivity", "faces")
        .with_variable("node_lon", &["nnodes"], mesh.lon.clone().into_dyn())
        .with_variable_attribute("node_lon", "standard_name", "longitude")
        .with_variable("node_lat", &["nnodes"], mesh.lat.clone().into_dyn())
        .with_variable_attribute("node_lat", "standard_name", "latitude")
        .with_variable("faces", &["nfaces", "three"], mesh.faces_ugrid().into_dyn())
        .with_variable_attribute("faces", "cf_role", "face_node_connectivity")
        .with_variable_attribute("faces", "start_index", 0.0)
        .with_variable("time", &["time"], times())
        .with_variable("depth", &["nnodes"], create_node_field(1, n).row(0).to_owned().into_dyn())
        .with_variable_attribute("depth", "mesh", "mesh")
        .with_variable_attribute("depth", "location", "node")
        .with_variable_attribute("depth", "units", "m")
        .with_variable("zeta", &["time", "nnodes"], create_node_field(NUM_TIMES, n).into_dyn())
        .with_variable_attribute("zeta", "mesh", "mesh")
        .with_variable_attribute("zeta", "location", "node")
        .with_variable_attribute("zeta", "units", "m")
        .with_variable("salinity", &["time", "nfaces"], create_node_field(NUM_TIMES, nf).into_dyn())
        .with_variable_attribute("salinity", "mesh", "mesh")
        .with_variable_attribute("salinity", "location", "face")
}

/// An FVCOM file: `lon`/`lat` nodes, `nv` stored (3, nele) 1-based, and
/// no topology variable.
pub fn fvcom_mesh() -> MemoryDataset {
    let mesh = create_triangle_mesh(MESH_NX, MESH_NY);
    let n = mesh.num_nodes();
    let nf = mesh.num_faces();

    MemoryDataset::new()
        .with_filepath("fvcom_estuary.nc")
        .with_attribute("source", "FVCOM_3.0")
        .with_variable("lon", &["node"], mesh.lon.clone().into_dyn())
        .with_variable_attribute("lon", "units", "degrees_east")
        .with_variable("lat", &["node"], mesh.lat.clone().into_dyn())
        .with_variable_attribute("lat", "units", "degrees_north")
        .with_variable("nv", &["three", "nele"], mesh.faces_fvcom().into_dyn())
        .with_variable_attribute("nv", "long_name", "nodes surrounding element")
        .with_variable("time", &["time"], times())
        .with_variable("h", &["node"], create_node_field(1, n).row(0).to_owned().into_dyn())
        .with_variable_attribute("h", "units", "m")
        .with_variable("zeta", &["time", "node"], create_node_field(NUM_TIMES, n).into_dyn())
        .with_variable_attribute("zeta", "units", "m")
        .with_variable("u", &["time", "nele"], create_node_field(NUM_TIMES, nf).into_dyn())
        .with_variable_attribute("u", "units", "meters s-1")
}

/// Like [`fvcom_mesh`] but with nodes stored in a single (N, 2) `nodes`
/// variable and 0-based (N, 3) `tris`.
pub fn composite_node_mesh() -> MemoryDataset {
    let mesh = create_triangle_mesh(MESH_NX, MESH_NY);
    let n = mesh.num_nodes();
    let nodes = ndarray::Array2::from_shape_fn((n, 2), |(i, c)| if c == 0 { mesh.lon[i] } else { mesh.lat[i] });

    MemoryDataset::new()
        .with_filepath("composite_nodes.nc")
        .with_variable("nodes", &["node", "two"], nodes.into_dyn())
        .with_variable("tris", &["ntri", "three"], mesh.faces_ugrid().into_dyn())
}

/// A ROMS history file: rho/psi/u/v coordinates, no topology variable
/// and no global grid type.
pub fn roms_grid() -> MemoryDataset {
    let grid = create_staggered_grid(ROMS_ETA, ROMS_XI);
    let rho = ["eta_rho", "xi_rho"];
    let field = create_node_field(NUM_TIMES, ROMS_ETA * ROMS_XI)
        .into_shape((NUM_TIMES, ROMS_ETA, ROMS_XI))
        .expect("field size matches rho shape");

    MemoryDataset::new()
        .with_filepath("roms_his.nc")
        .with_attribute("type", "ROMS/TOMS history file")
        .with_variable("ocean_time", &["ocean_time"], times())
        .with_variable("lon_rho", &rho, grid.rho.0.into_dyn())
        .with_variable("lat_rho", &rho, grid.rho.1.into_dyn())
        .with_variable("lon_psi", &["eta_psi", "xi_psi"], grid.psi.0.into_dyn())
        .with_variable("lat_psi", &["eta_psi", "xi_psi"], grid.psi.1.into_dyn())
        .with_variable("lon_u", &["eta_u", "xi_u"], grid.u.0.into_dyn())
        .with_variable("lat_u", &["eta_u", "xi_u"], grid.u.1.into_dyn())
        .with_variable("lon_v", &["eta_v", "xi_v"], grid.v.0.into_dyn())
        .with_variable("lat_v", &["eta_v", "xi_v"], grid.v.1.into_dyn())
        .with_variable("mask_rho", &rho, ndarray::Array2::<f64>::ones((ROMS_ETA, ROMS_XI)).into_dyn())
        .with_variable("temp", &["ocean_time", "eta_rho", "xi_rho"], field.into_dyn())
        .with_variable_attribute("temp", "units", "Celsius")
        .with_variable_attribute("temp", "location", "face")
}

/// An SGRID file: `grid` topology variable and SGRID coordinate names.
pub fn sgrid_with_topology() -> MemoryDataset {
    let grid = create_staggered_grid(ROMS_ETA, ROMS_XI);
    let center = ["eta_rho", "xi_rho"];

    MemoryDataset::new()
        .with_filepath("sgrid.nc")
        .with_attribute("Conventions", "CF-1.6, SGRID-0.3")
        .with_marker_variable("grid")
        .with_variable_attribute("grid", "cf_role", "grid_topology")
        .with_variable_attribute("grid", "topology_dimension", 2.0)
        .with_variable_attribute("grid", "node_dimensions", "xi_psi eta_psi")
        .with_variable_attribute("grid", "node_coordinates", "node_lon node_lat")
        .with_variable_attribute("grid", "face_dimensions", "xi_rho: xi_psi (padding: both) eta_rho: eta_psi (padding: both)")
        .with_variable("node_lon", &["eta_psi", "xi_psi"], grid.psi.0.into_dyn())
        .with_variable("node_lat", &["eta_psi", "xi_psi"], grid.psi.1.into_dyn())
        .with_variable("center_lon", &center, grid.rho.0.into_dyn())
        .with_variable("center_lat", &center, grid.rho.1.into_dyn())
        .with_variable("edge1_lon", &["eta_u", "xi_u"], grid.u.0.into_dyn())
        .with_variable("edge1_lat", &["eta_u", "xi_u"], grid.u.1.into_dyn())
        .with_variable("edge2_lon", &["eta_v", "xi_v"], grid.v.0.into_dyn())
        .with_variable("edge2_lat", &["eta_v", "xi_v"], grid.v.1.into_dyn())
        .with_variable("zeta", &["time", "eta_rho", "xi_rho"], ndarray::Array3::<f64>::zeros((NUM_TIMES, ROMS_ETA, ROMS_XI)).into_dyn())
        .with_variable_attribute("zeta", "grid", "grid")
        .with_variable_attribute("zeta", "location", "face")
        .with_variable("time", &["time"], times())
}
