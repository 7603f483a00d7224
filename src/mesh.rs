use ndarray::Array2;

use crate::types::{Mode, Real, Rgb, Vector};

/// A positioned, colored vertex.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub position: [Real; 3],
    pub color: Rgb,
}

/// How the vertices of a [`Geometry`] connect.
#[derive(Clone, Debug, PartialEq)]
pub enum Topology {
    /// Vertices form one polyline, in order.
    LineStrip,
    /// Vertices form a row-major `size × size` grid.
    Grid {
        size: usize,
        /// Triangle index triples into the vertex buffer, two per grid quad.
        tris: Vec<[u32; 3]>,
        /// Smooth per-vertex normals: `[[nx, ny, nz], ...]`
        normals: Vec<[Real; 3]>,
    },
}

/// Renderer-ready output of one pipeline run.
///
/// Built once and never mutated; a new run produces a new value.
///
/// Curve vertices sit at `(x, f(x), 0)`, surface vertices at `(x, y, f(x, y))`.
#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    pub mode: Mode,
    pub vertices: Vec<Vertex>,
    pub topology: Topology,
}

impl Geometry {
    /// A polyline through `positions`, in order.
    pub fn line_strip(positions: Vec<[Real; 3]>, colors: Vec<Rgb>) -> Self {
        debug_assert_eq!(positions.len(), colors.len());
        Self {
            mode: Mode::Curve,
            vertices: zip_vertices(positions, colors),
            topology: Topology::LineStrip,
        }
    }

    /// A `size × size` height-field mesh with smooth normals.
    ///
    /// `positions` must be row-major: vertex `r * size + c` neighbours
    /// `r * size + c + 1` along a row and `(r + 1) * size + c` along a column.
    /// Only [`assemble`](crate::pipeline::assemble) builds grids, from a
    /// [`Domain`](crate::domain::Domain) that guarantees `size * size` samples.
    ///
    /// ```text
    ///  up ──── d        a  = r*size + c    b = a + 1
    ///   │    ╱ │        up = a + size      d = a + size + 1
    ///   │  ╱   │
    ///   a ──── b        tris: [a, b, d], [a, d, up]
    /// ```
    pub(crate) fn grid(size: usize, positions: Vec<[Real; 3]>, colors: Vec<Rgb>) -> Self {
        debug_assert_eq!(positions.len(), size * size);
        debug_assert_eq!(positions.len(), colors.len());

        let tris = grid_triangles(size);
        let normals = smooth_normals(size, &positions, &tris);
        Self {
            mode: Mode::Surface,
            vertices: zip_vertices(positions, colors),
            topology: Topology::Grid {
                size,
                tris,
                normals,
            },
        }
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn positions(&self) -> Vec<[Real; 3]> {
        self.vertices.iter().map(|v| v.position).collect()
    }

    /// Colors with an opaque alpha channel appended.
    pub fn colors_rgba(&self) -> Vec<[Real; 4]> {
        self.vertices
            .iter()
            .map(|v| [v.color[0], v.color[1], v.color[2], 1.])
            .collect()
    }

    /// Per-vertex normals; `None` for a line strip.
    pub fn normals(&self) -> Option<&[[Real; 3]]> {
        match &self.topology {
            Topology::LineStrip => None,
            Topology::Grid { normals, .. } => Some(normals),
        }
    }

    /// Flat index buffer; `None` for a line strip.
    pub fn indices(&self) -> Option<Vec<u32>> {
        match &self.topology {
            Topology::LineStrip => None,
            Topology::Grid { tris, .. } => Some(tris.iter().flatten().copied().collect()),
        }
    }
}

fn zip_vertices(positions: Vec<[Real; 3]>, colors: Vec<Rgb>) -> Vec<Vertex> {
    positions
        .into_iter()
        .zip(colors)
        .map(|(position, color)| Vertex { position, color })
        .collect()
}

/// Two counter-clockwise (seen from +z) triangles per grid quad.
fn grid_triangles(size: usize) -> Vec<[u32; 3]> {
    let quads = size.saturating_sub(1);
    let mut tris = Vec::with_capacity(quads * quads * 2);
    for r in 0..quads {
        for c in 0..quads {
            let a = (r * size + c) as u32;
            let b = a + 1;
            let up = a + size as u32;
            let d = up + 1;
            tris.push([a, b, d]);
            tris.push([a, d, up]);
        }
    }
    tris
}

/// Unnormalized face normal; its length is twice the triangle's area.
fn face_normal(pa: [Real; 3], pb: [Real; 3], pc: [Real; 3]) -> Vector {
    let a = Vector::from(pa);
    let b = Vector::from(pb);
    let c = Vector::from(pc);
    (b - a).cross(&(c - b))
}

/// Area-weighted average of the face normals around each vertex.
///
/// Vertices whose faces cancel out (or that touch no face) point along +z.
fn smooth_normals(size: usize, positions: &[[Real; 3]], tris: &[[u32; 3]]) -> Vec<[Real; 3]> {
    let mut acc = Array2::<Vector>::from_elem((size, size), Vector::zeros());
    for tri in tris {
        let [ia, ib, ic] = tri.map(|i| i as usize);
        let n = face_normal(positions[ia], positions[ib], positions[ic]);
        for i in [ia, ib, ic] {
            acc[[i / size, i % size]] += n;
        }
    }

    // Iteration order of a standard-layout Array2 is row-major, matching `positions`.
    acc.iter()
        .map(|n| {
            let nrm = n.norm();
            if nrm == 0.0 || !nrm.is_finite() {
                [0., 0., 1.]
            } else {
                let unit = n.unscale(nrm);
                [unit.x, unit.y, unit.z]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_grid(size: usize) -> Geometry {
        let mut positions = Vec::new();
        for r in 0..size {
            for c in 0..size {
                positions.push([c as Real, r as Real, 0.]);
            }
        }
        Geometry::grid(size, positions, vec![[0.5; 3]; size * size])
    }

    #[test]
    fn grid_has_two_triangles_per_quad() {
        let geometry = flat_grid(4);
        assert_eq!(geometry.len(), 16);
        assert_eq!(geometry.indices().unwrap().len(), 3 * 2 * 9);
        let Topology::Grid { tris, .. } = &geometry.topology else {
            panic!("expected grid topology");
        };
        assert_eq!(tris[0], [0, 1, 5]);
        assert_eq!(tris[1], [0, 5, 4]);
    }

    #[test]
    fn flat_grid_normals_point_up() {
        let geometry = flat_grid(3);
        for n in geometry.normals().unwrap() {
            assert_eq!(*n, [0., 0., 1.]);
        }
    }

    #[test]
    fn sloped_grid_normals_lean_against_the_slope() {
        // z = x, so the surface normal is (-1, 0, 1) / sqrt(2) everywhere.
        let size = 3;
        let mut positions = Vec::new();
        for r in 0..size {
            for c in 0..size {
                positions.push([c as Real, r as Real, c as Real]);
            }
        }
        let geometry = Geometry::grid(size, positions, vec![[0.; 3]; size * size]);
        let s = std::f32::consts::FRAC_1_SQRT_2;
        for n in geometry.normals().unwrap() {
            assert!((n[0] + s).abs() < 1e-6);
            assert!(n[1].abs() < 1e-6);
            assert!((n[2] - s).abs() < 1e-6);
        }
    }

    #[test]
    fn line_strip_has_no_normals_or_indices() {
        let geometry = Geometry::line_strip(
            vec![[-6., 1., 0.], [6., 1., 0.]],
            vec![[0.2, 0.2, 0.2], [1., 1., 1.]],
        );
        assert_eq!(geometry.mode, Mode::Curve);
        assert!(geometry.normals().is_none());
        assert!(geometry.indices().is_none());
        assert_eq!(geometry.colors_rgba()[1], [1., 1., 1., 1.]);
    }

    #[test]
    fn face_normal_length_is_twice_the_area() {
        let n = face_normal([0., 0., 0.], [2., 0., 0.], [2., 3., 0.]);
        assert_eq!(n, Vector::new(0., 0., 6.));
        assert_eq!(face_normal([0.; 3], [1.; 3], [2.; 3]), Vector::zeros());
    }
}
