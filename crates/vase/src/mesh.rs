//! Flat triangle mesh produced by the generator.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Indexed triangle mesh with optional per-vertex normals.
///
/// The buffers are plain owned vectors with no scene-graph links, so topology
/// changes build a new mesh rather than mutating a shared one. `normals` is
/// either empty or parallel to `positions`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    /// Triangle list, three indices per triangle
    pub indices: Vec<u32>,
    pub normals: Vec<Vec3>,
}

impl Mesh {
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            indices,
            normals: Vec::new(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Whether normals have been computed for the current topology
    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty() && self.normals.len() == self.positions.len()
    }

    /// Iterate triangles as index triples.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Axis-aligned bounds as `(min, max)`, or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.positions.first()?;
        Some(
            self.positions
                .iter()
                .fold((first, first), |(min, max), &p| (min.min(p), max.max(p))),
        )
    }

    /// Whether every index refers to an existing vertex.
    pub fn indices_in_range(&self) -> bool {
        self.indices.len() % 3 == 0
            && self
                .indices
                .iter()
                .all(|&i| (i as usize) < self.positions.len())
    }

    /// Positions as raw bytes (12 bytes per vertex) for exporters and GPU upload.
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Normals as raw bytes (12 bytes per vertex).
    pub fn normal_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.normals)
    }

    /// Indices as raw native-endian bytes (4 bytes per index).
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> Mesh {
        Mesh::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 2.0, 0.0),
                Vec3::new(1.0, 2.0, -1.0),
            ],
            vec![0, 2, 1, 1, 2, 3],
        )
    }

    #[test]
    fn test_counts() {
        let mesh = quad();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert!(!mesh.has_normals());
        assert_eq!(
            mesh.triangles().collect::<Vec<_>>(),
            vec![[0, 2, 1], [1, 2, 3]]
        );
    }

    #[test]
    fn test_bounds() {
        let (min, max) = quad().bounds().unwrap();
        assert_eq!(min, Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(max, Vec3::new(1.0, 2.0, 0.0));
        assert!(Mesh::default().bounds().is_none());
    }

    #[test]
    fn test_index_range_check() {
        let mut mesh = quad();
        assert!(mesh.indices_in_range());
        mesh.indices.push(9);
        assert!(!mesh.indices_in_range());
    }

    #[test]
    fn test_byte_views() {
        let mesh = quad();
        assert_eq!(mesh.position_bytes().len(), 4 * 12);
        assert_eq!(mesh.index_bytes().len(), 6 * 4);
        assert!(mesh.normal_bytes().is_empty());
    }
}
