//! Per-vertex normal computation.
//!
//! Must run after every topology change: normals computed before the tabs
//! are extruded would leave the tab vertices without normals and the shared
//! boundary rings with stale ones.

use glam::Vec3;

use crate::mesh::Mesh;

/// Squared distance under which seam vertices count as coincident
const SEAM_WELD_DISTANCE_SQ: f32 = 1e-6;

/// Sum of the unnormalized face normals around each vertex.
///
/// Each face contributes its cross product, so larger faces weigh more.
fn accumulate_face_normals(mesh: &Mesh) -> Vec<Vec3> {
    let mut sums = vec![Vec3::ZERO; mesh.positions.len()];
    for [a, b, c] in mesh.triangles() {
        let (a, b, c) = (a as usize, b as usize, c as usize);
        let p0 = mesh.positions[a];
        let face_normal = (mesh.positions[b] - p0).cross(mesh.positions[c] - p0);
        sums[a] += face_normal;
        sums[b] += face_normal;
        sums[c] += face_normal;
    }
    sums
}

/// Compute smooth vertex normals by averaging adjacent face normals.
///
/// Vertices with no non-degenerate faces get a zero normal.
pub fn compute_vertex_normals(mesh: &mut Mesh) {
    let sums = accumulate_face_normals(mesh);
    mesh.normals = sums.into_iter().map(Vec3::normalize_or_zero).collect();
}

/// Compute vertex normals, treating each ring's seam pair as one vertex.
///
/// The seam column duplicates column 0, so plain accumulation gives each copy
/// only the faces on its own side. Here the face sums of the first and last
/// vertex of every ring are combined before normalizing, which gives the same
/// normal a welded mesh would have. `ring_starts` lists the first vertex of
/// each ring of `ring_len` vertices. Pairs whose positions differ (a formula
/// opened the seam) keep their own normals.
pub fn compute_vertex_normals_with_seams(mesh: &mut Mesh, ring_starts: &[usize], ring_len: usize) {
    let mut sums = accumulate_face_normals(mesh);

    if ring_len >= 2 {
        for &first in ring_starts {
            let last = first + ring_len - 1;
            if last >= sums.len() {
                continue;
            }
            if mesh.positions[first].distance_squared(mesh.positions[last])
                > SEAM_WELD_DISTANCE_SQ
            {
                continue;
            }
            let merged = sums[first] + sums[last];
            sums[first] = merged;
            sums[last] = merged;
        }
    }

    mesh.normals = sums.into_iter().map(Vec3::normalize_or_zero).collect();
}
