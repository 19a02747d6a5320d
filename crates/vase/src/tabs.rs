//! Straight rim extrusions at the top and bottom of the surface.
//!
//! A tab copies a boundary ring, moves the copy along the height axis and
//! stitches the original ring to the copy with one quad per radial segment.
//! Formulas, waves and noise do not apply to the copy, so the rim walls are
//! vertical and print flat against a bed or lid.

use glam::Vec3;
use tracing::debug;

use crate::mesh::Mesh;

/// Which tabs to add and how tall they are.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TabSpec {
    pub radial_segments: u32,
    pub vertical_segments: u32,
    /// Height of the top tab, ignored unless positive
    pub top_height: f32,
    /// Height of the bottom tab, ignored unless positive
    pub bottom_height: f32,
}

impl TabSpec {
    fn ring_len(&self) -> usize {
        self.radial_segments as usize + 1
    }
}

/// Index of the first vertex of the copied ring, per tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TabRings {
    pub bottom: Option<usize>,
    pub top: Option<usize>,
}

/// Extrude the requested tabs from an untabbed surface grid.
///
/// Returns a fresh mesh holding every original vertex in its original slot,
/// the copied rings appended after them, and a rebuilt index buffer. Normals
/// are not carried over and must be recomputed.
pub fn extrude_tabs(surface: &Mesh, spec: &TabSpec) -> (Mesh, TabRings) {
    let ring_len = spec.ring_len();
    let radial = spec.radial_segments as usize;
    let top_start = spec.vertical_segments as usize * ring_len;

    let mut positions = surface.positions.clone();
    let mut indices = surface.indices.clone();
    let mut rings = TabRings::default();

    if spec.bottom_height > 0.0 {
        let base = append_ring(&mut positions, 0, ring_len, -spec.bottom_height);
        for i in 0..radial {
            let orig0 = i as u32;
            let orig1 = orig0 + 1;
            let new0 = (base + i) as u32;
            let new1 = new0 + 1;
            // The copy sits below the original ring
            indices.extend_from_slice(&[new0, orig0, new1, new1, orig0, orig1]);
        }
        rings.bottom = Some(base);
    }

    if spec.top_height > 0.0 {
        let base = append_ring(&mut positions, top_start, ring_len, spec.top_height);
        for i in 0..radial {
            let orig0 = (top_start + i) as u32;
            let orig1 = orig0 + 1;
            let new0 = (base + i) as u32;
            let new1 = new0 + 1;
            // The copy sits above the original ring
            indices.extend_from_slice(&[orig0, new0, orig1, orig1, new0, new1]);
        }
        rings.top = Some(base);
    }

    debug!(
        "Extruded tabs: bottom={:?}, top={:?}, {} -> {} vertices",
        rings.bottom,
        rings.top,
        surface.vertex_count(),
        positions.len()
    );

    (Mesh::new(positions, indices), rings)
}

/// Copy `len` vertices starting at `start`, shifted by `dy`, to the end of
/// `positions`. Returns the index of the first copied vertex.
fn append_ring(positions: &mut Vec<Vec3>, start: usize, len: usize, dy: f32) -> usize {
    let base = positions.len();
    let offset = Vec3::new(0.0, dy, 0.0);
    for k in start..start + len {
        let p = positions[k];
        positions.push(p + offset);
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::grid_indices;
    use std::f32::consts::TAU;

    /// Cylinder grid of radius 10 and height 20, no modulation.
    fn cylinder(radial: u32, vertical: u32) -> Mesh {
        let mut positions = Vec::new();
        for j in 0..=vertical {
            let y = 20.0 * j as f32 / vertical as f32;
            for i in 0..=radial {
                let angle = TAU * i as f32 / radial as f32;
                positions.push(Vec3::new(10.0 * angle.cos(), y, 10.0 * angle.sin()));
            }
        }
        Mesh::new(
            positions,
            grid_indices(radial as usize, vertical as usize),
        )
    }

    fn spec(radial: u32, vertical: u32, bottom: f32, top: f32) -> TabSpec {
        TabSpec {
            radial_segments: radial,
            vertical_segments: vertical,
            top_height: top,
            bottom_height: bottom,
        }
    }

    fn assert_outward(mesh: &Mesh, tris: &[[u32; 3]]) {
        for &[a, b, c] in tris {
            let (pa, pb, pc) = (
                mesh.positions[a as usize],
                mesh.positions[b as usize],
                mesh.positions[c as usize],
            );
            let normal = (pb - pa).cross(pc - pa);
            let centroid = (pa + pb + pc) / 3.0;
            assert!(normal.dot(Vec3::new(centroid.x, 0.0, centroid.z)) > 0.0);
        }
    }

    #[test]
    fn test_bottom_tab_adds_one_ring() {
        let surface = cylinder(8, 3);
        let (mesh, rings) = extrude_tabs(&surface, &spec(8, 3, 10.0, 0.0));

        assert_eq!(mesh.vertex_count(), surface.vertex_count() + 9);
        assert_eq!(mesh.triangle_count(), surface.triangle_count() + 16);
        assert_eq!(rings.bottom, Some(surface.vertex_count()));
        assert_eq!(rings.top, None);

        // Original buffers are preserved as a prefix
        assert_eq!(&mesh.positions[..surface.vertex_count()], &surface.positions[..]);
        assert_eq!(&mesh.indices[..surface.indices.len()], &surface.indices[..]);
        assert!(mesh.indices_in_range());

        for k in 0..9 {
            let original = surface.positions[k];
            let copy = mesh.positions[surface.vertex_count() + k];
            assert_eq!(copy, original - Vec3::new(0.0, 10.0, 0.0));
        }
    }

    #[test]
    fn test_top_tab_copies_top_ring() {
        let surface = cylinder(8, 3);
        let (mesh, rings) = extrude_tabs(&surface, &spec(8, 3, 0.0, 4.0));
        let base = rings.top.unwrap();
        for k in 0..9 {
            let original = surface.positions[3 * 9 + k];
            assert_eq!(mesh.positions[base + k], original + Vec3::new(0.0, 4.0, 0.0));
        }
        assert_eq!(mesh.triangle_count(), surface.triangle_count() + 16);
    }

    #[test]
    fn test_both_tabs() {
        let surface = cylinder(6, 2);
        let (mesh, rings) = extrude_tabs(&surface, &spec(6, 2, 1.0, 2.0));
        assert_eq!(mesh.vertex_count(), surface.vertex_count() + 14);
        assert_eq!(mesh.triangle_count(), surface.triangle_count() + 24);
        assert_eq!(rings.bottom, Some(21));
        assert_eq!(rings.top, Some(28));
        assert!(mesh.indices_in_range());
    }

    #[test]
    fn test_tab_walls_face_outward() {
        let surface = cylinder(8, 2);
        let (mesh, _) = extrude_tabs(&surface, &spec(8, 2, 3.0, 3.0));
        let tab_tris: Vec<[u32; 3]> = mesh.triangles().skip(surface.triangle_count()).collect();
        assert_eq!(tab_tris.len(), 32);
        assert_outward(&mesh, &tab_tris);
    }

    #[test]
    fn test_no_tabs_is_identity() {
        let surface = cylinder(5, 2);
        let tabs = spec(5, 2, 0.0, -1.0);
        let (mesh, rings) = extrude_tabs(&surface, &tabs);
        assert_eq!(mesh, surface);
        assert_eq!(rings, TabRings::default());
    }
}
