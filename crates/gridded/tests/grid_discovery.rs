//! Integration tests for grid type resolution and attribute extraction
//! against datasets shaped like real UGRID, FVCOM, ROMS and SGRID output.

use gridded::{
    extract_required_attrs, resolve_grid_type, Conventions, DataSource, GridFactory, GridKind,
    GridTopology, GriddedError, HasFaces, HasNodes, MemoryDataset, RequiredAttrs,
};
use ndarray::{arr1, arr2, Array2, Ix2};
use test_utils::{
    assert_array_approx_eq, composite_node_mesh, create_staggered_grid, create_triangle_mesh,
    fvcom_mesh, roms_grid, sgrid_with_topology, ugrid_triangle_mesh, MESH_NX, MESH_NY,
};

fn resolve(source: &MemoryDataset) -> Result<GridKind, GriddedError> {
    resolve_grid_type(source, None, None, &Conventions::default())
}

// =============================================================================
// Resolution cascade
// =============================================================================

#[test]
fn test_ugrid_topology_variable_selects_unstructured() {
    assert_eq!(resolve(&ugrid_triangle_mesh()).unwrap(), GridKind::Unstructured);
}

#[test]
fn test_sgrid_topology_variable_selects_structured() {
    assert_eq!(resolve(&sgrid_with_topology()).unwrap(), GridKind::Structured);
}

#[test]
fn test_explicit_roms_overrides_topology_variable() {
    let kind = resolve_grid_type(&ugrid_triangle_mesh(), None, Some("roms"), &Conventions::default()).unwrap();
    assert_eq!(kind, GridKind::Structured);
}

#[test]
fn test_dataset_attribute_beats_topology_variable() {
    let ds = ugrid_triangle_mesh().with_attribute("grid_type", "curvilinear");
    assert_eq!(resolve(&ds).unwrap(), GridKind::Structured);
}

#[test]
fn test_unrecognized_dataset_attribute_falls_through() {
    let ds = fvcom_mesh().with_attribute("grid_type", "spectral");
    assert_eq!(resolve(&ds).unwrap(), GridKind::Unstructured);
}

#[test]
fn test_trial_extraction_without_any_metadata() {
    assert_eq!(resolve(&fvcom_mesh()).unwrap(), GridKind::Unstructured);
    assert_eq!(resolve(&composite_node_mesh()).unwrap(), GridKind::Unstructured);
    assert_eq!(resolve(&roms_grid()).unwrap(), GridKind::Structured);
}

#[test]
fn test_no_recognizable_names_fails() {
    let ds = MemoryDataset::new()
        .with_variable("x", &["n"], arr1(&[0.0, 1.0]).into_dyn())
        .with_variable("y", &["n"], arr1(&[0.0, 1.0]).into_dyn());
    assert!(matches!(resolve(&ds), Err(GriddedError::NodeCoordinatesNotFound)));
}

#[test]
fn test_unknown_explicit_type_rejected() {
    let err = resolve_grid_type(&fvcom_mesh(), None, Some("healpix"), &Conventions::default()).unwrap_err();
    assert!(matches!(err, GriddedError::UnsupportedGridType(ref t) if t == "healpix"));
}

// =============================================================================
// Node coordinates
// =============================================================================

#[test]
fn test_every_node_pair_reads_source_arrays() {
    let lon = arr1(&[-70.0, -69.9, -69.8]).into_dyn();
    let lat = arr1(&[41.0, 41.1, 41.2]).into_dyn();
    let faces = arr2(&[[0.0, 1.0, 2.0], [0.0, 2.0, 1.0]]).into_dyn();

    for pair in &Conventions::default().node_coord_names {
        let ds = MemoryDataset::new()
            .with_variable(pair.lon.as_str(), &["node"], lon.clone())
            .with_variable(pair.lat.as_str(), &["node"], lat.clone())
            .with_variable("faces", &["nface", "three"], faces.clone());
        let grid = GridFactory::new().from_source(&ds, None, Some("ugrid")).unwrap();
        assert_eq!(grid.node_lon(), &lon, "pair {}/{}", pair.lon, pair.lat);
        assert_eq!(grid.node_lat(), &lat, "pair {}/{}", pair.lon, pair.lat);
    }
}

#[test]
fn test_composite_nodes_split_into_columns() {
    let mesh = create_triangle_mesh(MESH_NX, MESH_NY);
    let grid = GridFactory::new().from_source(&composite_node_mesh(), None, None).unwrap();
    assert_array_approx_eq!(grid.node_lon(), &mesh.lon.clone().into_dyn(), 1e-12);
    assert_array_approx_eq!(grid.node_lat(), &mesh.lat.clone().into_dyn(), 1e-12);
    assert_eq!(grid.faces().unwrap(), &mesh.faces);
}

#[test]
fn test_topology_mapping_names_nodes() {
    let mesh = create_triangle_mesh(MESH_NX, MESH_NY);
    let ds = MemoryDataset::new()
        .with_variable("x_node", &["n"], mesh.lon.clone().into_dyn())
        .with_variable("y_node", &["n"], mesh.lat.clone().into_dyn())
        .with_variable("element_nodes", &["nele", "nv"], mesh.faces_ugrid().into_dyn());
    let topology = GridTopology::new()
        .with("node_lon", "x_node")
        .with("node_lat", "y_node")
        .with("faces", "element_nodes");

    let grid = GridFactory::new().from_source(&ds, Some(&topology), None).unwrap();
    assert_eq!(grid.kind(), GridKind::Unstructured);
    assert_eq!(grid.node_lon(), &mesh.lon.into_dyn());
    assert_eq!(grid.meta().source_variables, vec!["x_node", "y_node", "element_nodes"]);
}

#[test]
fn test_topology_mapping_missing_variable() {
    let topology = GridTopology::new().with("node_lon", "x_node").with("node_lat", "y_node");
    let err = GridFactory::new().from_source(&fvcom_mesh(), Some(&topology), Some("ugrid")).unwrap_err();
    assert!(matches!(err, GriddedError::VariableNotFound(ref v) if v == "x_node"));
}

#[test]
fn test_topology_mapping_missing_faces_variable() {
    let topology = GridTopology::new().with("faces", "element_nodes");
    let err = GridFactory::new().from_source(&fvcom_mesh(), Some(&topology), None).unwrap_err();
    assert!(matches!(err, GriddedError::VariableNotFound(ref v) if v == "element_nodes"));
}

#[test]
fn test_topology_mapping_missing_composite_nodes() {
    let topology = GridTopology::new().with("nodes", "mesh_points");
    let err = GridFactory::new().from_source(&fvcom_mesh(), Some(&topology), Some("ugrid")).unwrap_err();
    assert!(matches!(err, GriddedError::VariableNotFound(ref v) if v == "mesh_points"));
}

// =============================================================================
// Faces
// =============================================================================

#[test]
fn test_fvcom_faces_transposed_and_zero_based() {
    let ds = fvcom_mesh();
    let source = ds.read_i64("nv").unwrap().into_dimensionality::<Ix2>().unwrap();

    let grid = GridFactory::new().from_source(&ds, None, None).unwrap();
    let faces = grid.as_unstructured().unwrap().faces();
    assert_eq!(faces.shape(), &[source.ncols(), 3]);
    for i in 0..faces.nrows() {
        for j in 0..3 {
            assert_eq!(faces[[i, j]], source[[j, i]] - 1);
        }
    }
}

#[test]
fn test_ugrid_zero_based_faces_kept() {
    let mesh = create_triangle_mesh(MESH_NX, MESH_NY);
    let grid = GridFactory::new().from_source(&ugrid_triangle_mesh(), None, None).unwrap();
    assert_eq!(grid.faces().unwrap(), &mesh.faces);
    assert_eq!(grid.as_unstructured().unwrap().num_faces(), mesh.num_faces());
}

#[test]
fn test_one_based_start_index_is_decremented() {
    let ds = MemoryDataset::new()
        .with_variable("lon", &["node"], arr1(&[0.0, 1.0, 0.0, 1.0]).into_dyn())
        .with_variable("lat", &["node"], arr1(&[0.0, 0.0, 1.0, 1.0]).into_dyn())
        .with_variable("faces", &["nface", "three"], arr2(&[[1.0, 2.0, 4.0], [1.0, 4.0, 3.0]]).into_dyn())
        .with_variable_attribute("faces", "start_index", 1.0);
    let grid = GridFactory::new().from_source(&ds, None, None).unwrap();
    assert_eq!(grid.faces().unwrap(), &arr2(&[[0, 1, 3], [0, 3, 2]]));
}

#[test]
fn test_malformed_faces_do_not_fall_back_to_structured() {
    let ds = MemoryDataset::new()
        .with_variable("lon", &["node"], arr1(&[0.0, 1.0, 0.0]).into_dyn())
        .with_variable("lat", &["node"], arr1(&[0.0, 0.0, 1.0]).into_dyn())
        .with_variable("faces", &["n"], arr1(&[0.0, 1.0, 2.0]).into_dyn());
    assert!(matches!(resolve(&ds), Err(GriddedError::InvalidShape(_))));
}

// =============================================================================
// Structured attributes
// =============================================================================

#[test]
fn test_roms_grid_picks_up_staggered_coordinates() {
    let expected = create_staggered_grid(4, 5);
    let grid = GridFactory::new().from_source(&roms_grid(), None, None).unwrap();
    let structured = grid.as_structured().unwrap();

    assert_eq!(grid.shape(), &[3, 4]);
    assert_eq!(grid.node_lon(), &expected.psi.0.into_dyn());
    assert_eq!(structured.center.as_ref().unwrap().lat, expected.rho.1.into_dyn());
    assert_eq!(structured.edge1.as_ref().unwrap().shape(), &[4, 4]);
    assert_eq!(structured.edge2.as_ref().unwrap().shape(), &[3, 5]);
    assert!(grid.faces().is_none());
}

#[test]
fn test_sgrid_names_preferred_over_roms_names() {
    let attrs = extract_required_attrs(
        &sgrid_with_topology(),
        GridKind::Structured,
        None,
        &Conventions::default(),
    )
    .unwrap();
    let RequiredAttrs::Structured(attrs) = attrs else {
        panic!("expected structured attributes");
    };
    assert!(attrs.center.is_some() && attrs.edge1.is_some() && attrs.edge2.is_some());
    assert_eq!(
        attrs.source_variables[..2],
        ["node_lon".to_string(), "node_lat".to_string()]
    );
}

#[test]
fn test_structured_without_optional_pairs() {
    let psi = Array2::<f64>::zeros((2, 2)).into_dyn();
    let ds = MemoryDataset::new()
        .with_variable("lon_psi", &["eta_psi", "xi_psi"], psi.clone())
        .with_variable("lat_psi", &["eta_psi", "xi_psi"], psi);
    let grid = GridFactory::new().from_source(&ds, None, None).unwrap();
    let structured = grid.as_structured().unwrap();
    assert!(structured.center.is_none());
    assert!(structured.edge1.is_none());
    assert!(structured.edge2.is_none());
}

#[test]
fn test_structured_topology_skips_missing_pair() {
    let topology = GridTopology::new()
        .with("center_lon", "lon_rho")
        .with("center_lat", "not_in_file");
    let grid = GridFactory::new().from_source(&roms_grid(), Some(&topology), None).unwrap();
    assert_eq!(grid.kind(), GridKind::Structured);
    // Nodes fall back to conventions; the incomplete center pair is skipped.
    assert_eq!(grid.shape(), &[3, 4]);
    assert!(grid.as_structured().unwrap().center.is_none());
}
