use glam::{Vec2, Vec3};

use crate::error::{BakeError, Result};

/// One self-consistent state of the tracked mesh.
///
/// Positions and texture coordinates are index-aligned, and every triangle
/// refers to a vertex inside the snapshot. Construction goes through
/// [`MeshSnapshot::new`], so a snapshot that exists is always consistent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshSnapshot {
    vertices: Vec<Vec3>,
    uvs: Vec<Vec2>,
    triangles: Vec<[u32; 3]>,
}

impl MeshSnapshot {
    pub fn new(vertices: Vec<Vec3>, uvs: Vec<Vec2>, triangles: Vec<[u32; 3]>) -> Result<Self> {
        if vertices.len() != uvs.len() {
            return Err(BakeError::invalid_geometry(format!(
                "{} vertices but {} texture coordinates",
                vertices.len(),
                uvs.len(),
            )));
        }

        let vertex_count = vertices.len();
        if let Some((i, triangle)) = triangles.iter()
            .enumerate()
            .find(|(_, t)| t.iter().any(|&index| index as usize >= vertex_count)) {
            return Err(BakeError::invalid_geometry(format!(
                "triangle {} {:?} references a vertex outside of 0..{}",
                i, triangle, vertex_count,
            )));
        }

        Ok(Self {
            vertices,
            uvs,
            triangles,
        })
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn uvs(&self) -> &[Vec2] {
        &self.uvs
    }

    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Triangle indices as a flat list, three per triangle.
    pub fn flat_indices(&self) -> Vec<u32> {
        self.triangles.iter().flatten().copied().collect()
    }

    /// Axis-aligned bounds of the vertices, or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let (first, rest) = self.vertices.split_first()?;
        Some(rest.iter().fold((*first, *first), |(min, max), v| (min.min(*v), max.max(*v))))
    }

    /// Area-weighted smooth vertex normals.
    ///
    /// Vertices which aren't referenced by any non-degenerate triangle get
    /// `Vec3::Z`.
    pub fn vertex_normals(&self) -> Vec<Vec3> {
        let mut normals = vec![Vec3::ZERO; self.vertices.len()];
        for [a, b, c] in self.triangles.iter().copied() {
            let (a, b, c) = (a as usize, b as usize, c as usize);
            let p0 = self.vertices[a];
            // Unnormalized, so larger triangles contribute more.
            let face_normal = (self.vertices[b] - p0).cross(self.vertices[c] - p0);
            normals[a] += face_normal;
            normals[b] += face_normal;
            normals[c] += face_normal;
        }

        normals.into_iter()
            .map(|n| n.try_normalize().unwrap_or(Vec3::Z))
            .collect()
    }
}

/// Groups a flat triangle index list into triangles.
pub fn triangles_from_flat(indices: &[u32]) -> Result<Vec<[u32; 3]>> {
    if indices.len() % 3 != 0 {
        return Err(BakeError::invalid_geometry(format!(
            "{} triangle indices is not a multiple of 3",
            indices.len(),
        )));
    }

    Ok(indices.chunks_exact(3)
        .map(|c| [c[0], c[1], c[2]])
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> MeshSnapshot {
        MeshSnapshot::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::new(1., 1., 0.), Vec3::Y],
            vec![Vec2::ZERO, Vec2::X, Vec2::ONE, Vec2::Y],
            vec![[0, 1, 2], [0, 2, 3]],
        ).unwrap()
    }

    #[test]
    fn rejects_uv_count_mismatch() {
        let err = MeshSnapshot::new(vec![Vec3::ZERO, Vec3::X], vec![Vec2::ZERO], vec![])
            .unwrap_err();
        assert!(matches!(err, BakeError::InvalidGeometry(_)));
    }

    #[test]
    fn rejects_out_of_bounds_triangle() {
        let err = MeshSnapshot::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![Vec2::ZERO; 3],
            vec![[0, 1, 3]],
        ).unwrap_err();
        assert!(matches!(err, BakeError::InvalidGeometry(_)));
    }

    #[test]
    fn empty_snapshot_is_valid() {
        let snapshot = MeshSnapshot::new(vec![], vec![], vec![]).unwrap();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.bounds(), None);
        assert_eq!(snapshot, MeshSnapshot::default());
    }

    #[test]
    fn flat_indices_must_form_triangles() {
        assert_eq!(triangles_from_flat(&[0, 1, 2, 2, 3, 0]).unwrap(), vec![[0, 1, 2], [2, 3, 0]]);
        assert!(matches!(triangles_from_flat(&[0, 1]), Err(BakeError::InvalidGeometry(_))));
    }

    #[test]
    fn flat_indices_round_trip_order() {
        assert_eq!(quad().flat_indices(), vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn bounds_cover_all_vertices() {
        let (min, max) = quad().bounds().unwrap();
        assert_eq!(min, Vec3::ZERO);
        assert_eq!(max, Vec3::new(1., 1., 0.));
    }

    #[test]
    fn normals_of_flat_quad_face_forward() {
        for normal in quad().vertex_normals() {
            assert!((normal - Vec3::Z).length() < 1e-6);
        }
    }

    #[test]
    fn unreferenced_vertex_gets_default_normal() {
        let snapshot = MeshSnapshot::new(vec![Vec3::ONE], vec![Vec2::ZERO], vec![]).unwrap();
        assert_eq!(snapshot.vertex_normals(), vec![Vec3::Z]);
    }
}
