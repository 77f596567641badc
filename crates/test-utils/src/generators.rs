//! Synthetic mesh and grid generators.
//!
//! These produce small, predictable coordinate and connectivity arrays so
//! tests can check exactly what grid discovery read back.

use ndarray::{Array1, Array2};

/// Longitude of the first node of every generated mesh.
pub const ORIGIN_LON: f64 = -70.0;
/// Latitude of the first node of every generated mesh.
pub const ORIGIN_LAT: f64 = 41.0;
/// Node spacing in degrees.
pub const SPACING: f64 = 0.1;

/// A triangulated rectangle.
#[derive(Debug, Clone)]
pub struct TriangleMesh {
    pub lon: Array1<f64>,
    pub lat: Array1<f64>,
    /// (num_faces, 3), 0-based node indices.
    pub faces: Array2<i64>,
}

impl TriangleMesh {
    pub fn num_nodes(&self) -> usize {
        self.lon.len()
    }

    pub fn num_faces(&self) -> usize {
        self.faces.nrows()
    }

    /// Faces as stored by FVCOM: (3, num_faces) with 1-based indices.
    pub fn faces_fvcom(&self) -> Array2<f64> {
        self.faces.t().mapv(|i| (i + 1) as f64)
    }

    /// Faces as stored by UGRID with `start_index = 0`.
    pub fn faces_ugrid(&self) -> Array2<f64> {
        self.faces.mapv(|i| i as f64)
    }
}

/// Creates a triangle mesh over an `nx` by `ny` lattice of nodes.
///
/// Node `k = row * nx + col` sits at
/// `(ORIGIN_LON + col * SPACING, ORIGIN_LAT + row * SPACING)`. Each lattice
/// cell is split into two triangles, so there are `2 * (nx - 1) * (ny - 1)`
/// faces.
///
/// # Example
///
/// ```
/// use test_utils::create_triangle_mesh;
///
/// let mesh = create_triangle_mesh(3, 3);
/// assert_eq!(mesh.num_nodes(), 9);
/// assert_eq!(mesh.num_faces(), 8);
/// assert_eq!(mesh.faces.row(0).to_vec(), vec![0, 1, 4]);
/// ```
pub fn create_triangle_mesh(nx: usize, ny: usize) -> TriangleMesh {
    let lon = Array1::from_shape_fn(nx * ny, |k| ORIGIN_LON + (k % nx) as f64 * SPACING);
    let lat = Array1::from_shape_fn(nx * ny, |k| ORIGIN_LAT + (k / nx) as f64 * SPACING);

    let mut faces = Vec::with_capacity(2 * nx.saturating_sub(1) * ny.saturating_sub(1) * 3);
    for row in 0..ny.saturating_sub(1) {
        for col in 0..nx.saturating_sub(1) {
            let a = (row * nx + col) as i64;
            let b = a + 1;
            let c = a + nx as i64;
            let d = c + 1;
            faces.extend_from_slice(&[a, b, d, a, d, c]);
        }
    }
    let n = faces.len() / 3;
    let faces = Array2::from_shape_vec((n, 3), faces).expect("face buffer is a multiple of 3");

    TriangleMesh { lon, lat, faces }
}

/// Coordinates of a staggered (Arakawa C) curvilinear grid.
#[derive(Debug, Clone)]
pub struct StaggeredGrid {
    /// Cell centers, (eta, xi).
    pub rho: (Array2<f64>, Array2<f64>),
    /// Cell corners, (eta - 1, xi - 1).
    pub psi: (Array2<f64>, Array2<f64>),
    /// West/east faces, (eta, xi - 1).
    pub u: (Array2<f64>, Array2<f64>),
    /// South/north faces, (eta - 1, xi).
    pub v: (Array2<f64>, Array2<f64>),
}

/// Creates a ROMS-style staggered grid with `eta` by `xi` rho points.
///
/// Rows are sheared slightly in longitude so the grid is curvilinear
/// rather than rectilinear. Corner and face points are averages of the
/// surrounding rho points.
pub fn create_staggered_grid(eta: usize, xi: usize) -> StaggeredGrid {
    let rho_lon = Array2::from_shape_fn((eta, xi), |(j, i)| {
        ORIGIN_LON + i as f64 * SPACING + j as f64 * SPACING * 0.1
    });
    let rho_lat = Array2::from_shape_fn((eta, xi), |(j, _)| ORIGIN_LAT + j as f64 * SPACING);

    let corner = |a: &Array2<f64>| {
        Array2::from_shape_fn((eta - 1, xi - 1), |(j, i)| {
            (a[[j, i]] + a[[j, i + 1]] + a[[j + 1, i]] + a[[j + 1, i + 1]]) / 4.0
        })
    };
    let u_point = |a: &Array2<f64>| Array2::from_shape_fn((eta, xi - 1), |(j, i)| (a[[j, i]] + a[[j, i + 1]]) / 2.0);
    let v_point = |a: &Array2<f64>| Array2::from_shape_fn((eta - 1, xi), |(j, i)| (a[[j, i]] + a[[j + 1, i]]) / 2.0);

    StaggeredGrid {
        psi: (corner(&rho_lon), corner(&rho_lat)),
        u: (u_point(&rho_lon), u_point(&rho_lat)),
        v: (v_point(&rho_lon), v_point(&rho_lat)),
        rho: (rho_lon, rho_lat),
    }
}

/// Creates a (time, location) field with predictable values.
///
/// Each value is `t * 1000 + n`, so `field[[t, n]]` identifies its own
/// position.
pub fn create_node_field(n_time: usize, n_points: usize) -> Array2<f64> {
    Array2::from_shape_fn((n_time, n_points), |(t, n)| (t * 1000 + n) as f64)
}
