//! Vertex/edge/face topology of a solid with sampled geometry.
//!
//! Vertices are indexed points. Edges reference their endpoint vertices and
//! carry the curve between them. Faces reference an ordered boundary loop,
//! their bounding edges and optional interior samples. Curved geometry is
//! discretised on demand by [`SolidTopology::tessellate`].

use std::collections::HashMap;
use std::f64::consts::{FRAC_PI_2, TAU};

use super::core::{Point3, Tolerance, Vec3};

/// Upper bound on the segments a single arc is split into.
pub const MAX_ARC_SEGMENTS: usize = 1 << 16;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TopologyError {
    #[error("vertex {index} is not finite")]
    NonFiniteVertex { index: usize },
    #[error("edge {edge} references missing vertex {vertex}")]
    EdgeVertexOutOfRange { edge: usize, vertex: usize },
    #[error("face {face} references missing vertex {vertex}")]
    FaceVertexOutOfRange { face: usize, vertex: usize },
    #[error("face {face} references missing edge {edge}")]
    FaceEdgeOutOfRange { face: usize, edge: usize },
    #[error("face {face} has no boundary")]
    DegenerateFace { face: usize },
    #[error("edge {edge} has invalid arc geometry: {reason}")]
    InvalidArc { edge: usize, reason: &'static str },
    #[error("edge {edge} has non-finite polyline points")]
    NonFinitePolyline { edge: usize },
    #[error("tessellation precision must be finite and positive, got {precision}")]
    InvalidPrecision { precision: f64 },
    #[error("edge {edge} needs {segments} segments at this precision, limit is {limit}")]
    ArcTooFine {
        edge: usize,
        segments: usize,
        limit: usize,
    },
    #[error("{kind} mask has {found} entries, expected {expected}")]
    MaskLengthMismatch {
        kind: &'static str,
        expected: usize,
        found: usize,
    },
}

/// Geometry of an edge between its two endpoint vertices.
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeCurve {
    Line,
    /// Circular arc from start to end, counter-clockwise around `normal`.
    /// Equal endpoints describe a full circle.
    Arc { center: Point3, normal: Vec3 },
    /// Interior points between start and end.
    Polyline(Vec<Point3>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopoEdge {
    pub start: usize,
    pub end: usize,
    pub curve: EdgeCurve,
}

impl TopoEdge {
    #[must_use]
    pub const fn line(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            curve: EdgeCurve::Line,
        }
    }

    #[must_use]
    pub const fn arc(start: usize, end: usize, center: Point3, normal: Vec3) -> Self {
        Self {
            start,
            end,
            curve: EdgeCurve::Arc { center, normal },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TopoFace {
    /// Ordered vertex loop, counter-clockwise seen from outside.
    pub boundary: Vec<usize>,
    pub edges: Vec<usize>,
    /// Extra points on the face interior.
    pub surface_samples: Vec<Point3>,
}

/// Sampled points per edge and face at a given precision.
#[derive(Debug, Clone, PartialEq)]
pub struct Tessellation {
    pub edges: Vec<Vec<Point3>>,
    pub faces: Vec<Vec<Point3>>,
    /// Newell normal of each face loop, `None` for degenerate loops.
    pub face_loop_normals: Vec<Option<Vec3>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolidTopology {
    vertices: Vec<Point3>,
    edges: Vec<TopoEdge>,
    faces: Vec<TopoFace>,
    vertex_edges: Vec<Vec<usize>>,
    vertex_faces: Vec<Vec<usize>>,
    edge_faces: Vec<Vec<usize>>,
    face_vertices: Vec<Vec<usize>>,
}

impl SolidTopology {
    /// Validates indices and geometry and builds the adjacency tables.
    ///
    /// # Errors
    /// Returns the first invalid vertex, edge or face.
    pub fn new(
        vertices: Vec<Point3>,
        edges: Vec<TopoEdge>,
        faces: Vec<TopoFace>,
    ) -> Result<Self, TopologyError> {
        if let Some(index) = vertices.iter().position(|p| !p.is_finite()) {
            return Err(TopologyError::NonFiniteVertex { index });
        }
        for (index, edge) in edges.iter().enumerate() {
            validate_edge(index, edge, &vertices)?;
        }
        for (index, face) in faces.iter().enumerate() {
            if face.boundary.is_empty() && face.edges.is_empty() {
                return Err(TopologyError::DegenerateFace { face: index });
            }
            if let Some(&vertex) = face.boundary.iter().find(|&&v| v >= vertices.len()) {
                return Err(TopologyError::FaceVertexOutOfRange { face: index, vertex });
            }
            if let Some(&edge) = face.edges.iter().find(|&&e| e >= edges.len()) {
                return Err(TopologyError::FaceEdgeOutOfRange { face: index, edge });
            }
        }

        let mut vertex_edges = vec![Vec::new(); vertices.len()];
        for (index, edge) in edges.iter().enumerate() {
            push_unique(&mut vertex_edges[edge.start], index);
            push_unique(&mut vertex_edges[edge.end], index);
        }

        let mut vertex_faces = vec![Vec::new(); vertices.len()];
        let mut edge_faces = vec![Vec::new(); edges.len()];
        let mut face_vertices = Vec::with_capacity(faces.len());
        for (index, face) in faces.iter().enumerate() {
            let mut loop_vertices = Vec::new();
            for &vertex in &face.boundary {
                push_unique(&mut loop_vertices, vertex);
            }
            for &edge in &face.edges {
                push_unique(&mut edge_faces[edge], index);
                push_unique(&mut loop_vertices, edges[edge].start);
                push_unique(&mut loop_vertices, edges[edge].end);
            }
            for &vertex in &loop_vertices {
                push_unique(&mut vertex_faces[vertex], index);
            }
            face_vertices.push(loop_vertices);
        }

        Ok(Self {
            vertices,
            edges,
            faces,
            vertex_edges,
            vertex_faces,
            edge_faces,
            face_vertices,
        })
    }

    /// Builds a polyhedral solid from vertex loops.
    ///
    /// Vertices closer than `tol` are welded first. Edges are derived from
    /// consecutive loop vertices and shared between faces.
    ///
    /// # Errors
    /// Fails on out-of-range indices or loops with fewer than three distinct
    /// vertices after welding.
    pub fn from_polygons(
        vertices: Vec<Point3>,
        polygons: &[Vec<usize>],
        tol: Tolerance,
    ) -> Result<Self, TopologyError> {
        if let Some(index) = vertices.iter().position(|p| !p.is_finite()) {
            return Err(TopologyError::NonFiniteVertex { index });
        }

        let mut welded: Vec<Point3> = Vec::with_capacity(vertices.len());
        let mut remap = Vec::with_capacity(vertices.len());
        for &vertex in &vertices {
            let target = welded
                .iter()
                .position(|&existing| tol.approx_eq_point3(existing, vertex))
                .unwrap_or_else(|| {
                    welded.push(vertex);
                    welded.len() - 1
                });
            remap.push(target);
        }

        let mut edges = Vec::new();
        let mut edge_lookup: HashMap<(usize, usize), usize> = HashMap::new();
        let mut faces = Vec::with_capacity(polygons.len());

        for (face_index, polygon) in polygons.iter().enumerate() {
            let mut boundary: Vec<usize> = Vec::with_capacity(polygon.len());
            for &vertex in polygon {
                let mapped = *remap.get(vertex).ok_or(TopologyError::FaceVertexOutOfRange {
                    face: face_index,
                    vertex,
                })?;
                if boundary.last() != Some(&mapped) {
                    boundary.push(mapped);
                }
            }
            if boundary.len() > 1 && boundary.first() == boundary.last() {
                boundary.pop();
            }
            if boundary.len() < 3 {
                return Err(TopologyError::DegenerateFace { face: face_index });
            }

            let face_edges = (0..boundary.len())
                .map(|i| {
                    let a = boundary[i];
                    let b = boundary[(i + 1) % boundary.len()];
                    *edge_lookup.entry((a.min(b), a.max(b))).or_insert_with(|| {
                        edges.push(TopoEdge::line(a, b));
                        edges.len() - 1
                    })
                })
                .collect();

            faces.push(TopoFace {
                boundary,
                edges: face_edges,
                surface_samples: Vec::new(),
            });
        }

        Self::new(welded, edges, faces)
    }

    /// Axis-aligned box with 8 vertices, 12 edges and 6 faces.
    ///
    /// Vertex `i` takes the max coordinate on X, Y, Z for bits 0, 1, 2 of `i`.
    ///
    /// # Errors
    /// Fails when a corner is not finite.
    pub fn cuboid(min: Point3, max: Point3) -> Result<Self, TopologyError> {
        let corners = (0..8)
            .map(|i| {
                Point3::new(
                    if i & 1 == 0 { min.x } else { max.x },
                    if i & 2 == 0 { min.y } else { max.y },
                    if i & 4 == 0 { min.z } else { max.z },
                )
            })
            .collect();
        let polygons = [
            vec![0, 2, 3, 1],
            vec![4, 5, 7, 6],
            vec![0, 1, 5, 4],
            vec![2, 6, 7, 3],
            vec![0, 4, 6, 2],
            vec![1, 3, 7, 5],
        ];
        Self::from_polygons(corners, &polygons, Tolerance::default_geom())
    }

    /// Closed cylinder standing on `base` along +Z.
    ///
    /// Two vertices on the seam, two circular edges, one seam edge and three
    /// faces (bottom, top, side). Interior samples on the caps and the side
    /// are placed every quarter turn.
    ///
    /// # Errors
    /// Fails when the radius or height is not finite and positive.
    pub fn cylinder(base: Point3, radius: f64, height: f64) -> Result<Self, TopologyError> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(TopologyError::InvalidArc {
                edge: 0,
                reason: "radius must be finite and positive",
            });
        }
        if !(height.is_finite() && height > 0.0) {
            return Err(TopologyError::InvalidArc {
                edge: 2,
                reason: "height must be finite and positive",
            });
        }

        let top = base + Vec3::Z * height;
        let vertices = vec![base + Vec3::X * radius, top + Vec3::X * radius];
        let edges = vec![
            TopoEdge::arc(0, 0, base, -Vec3::Z),
            TopoEdge::arc(1, 1, top, Vec3::Z),
            TopoEdge::line(0, 1),
        ];

        let ring = |centre: Point3| -> Vec<Point3> {
            (0..4u32)
                .map(|k| {
                    let angle = f64::from(k) * FRAC_PI_2;
                    centre + Vec3::new(angle.cos(), angle.sin(), 0.0) * radius
                })
                .collect()
        };
        let middle = base + Vec3::Z * (0.5 * height);

        let faces = vec![
            TopoFace {
                boundary: vec![0],
                edges: vec![0],
                surface_samples: vec![base],
            },
            TopoFace {
                boundary: vec![1],
                edges: vec![1],
                surface_samples: vec![top],
            },
            TopoFace {
                boundary: vec![0, 1],
                edges: vec![0, 1, 2],
                surface_samples: ring(middle),
            },
        ];
        Self::new(vertices, edges, faces)
    }

    #[must_use]
    pub fn vertices(&self) -> &[Point3] {
        &self.vertices
    }

    #[must_use]
    pub fn edges(&self) -> &[TopoEdge] {
        &self.edges
    }

    #[must_use]
    pub fn faces(&self) -> &[TopoFace] {
        &self.faces
    }

    #[must_use]
    pub fn edges_of_vertex(&self, vertex: usize) -> &[usize] {
        self.vertex_edges.get(vertex).map(Vec::as_slice).unwrap_or_default()
    }

    #[must_use]
    pub fn faces_of_vertex(&self, vertex: usize) -> &[usize] {
        self.vertex_faces.get(vertex).map(Vec::as_slice).unwrap_or_default()
    }

    #[must_use]
    pub fn faces_of_edge(&self, edge: usize) -> &[usize] {
        self.edge_faces.get(edge).map(Vec::as_slice).unwrap_or_default()
    }

    /// Boundary loop vertices followed by any other edge endpoints.
    #[must_use]
    pub fn vertices_of_face(&self, face: usize) -> &[usize] {
        self.face_vertices.get(face).map(Vec::as_slice).unwrap_or_default()
    }

    /// Samples every edge and face so that curved edges deviate at most
    /// `precision` from their chords.
    ///
    /// # Errors
    /// Returns [`TopologyError::InvalidPrecision`] unless `precision` is
    /// finite and positive, and [`TopologyError::ArcTooFine`] when an arc
    /// would need more than [`MAX_ARC_SEGMENTS`] segments.
    pub fn tessellate(&self, precision: f64) -> Result<Tessellation, TopologyError> {
        if !(precision.is_finite() && precision > 0.0) {
            return Err(TopologyError::InvalidPrecision { precision });
        }

        let edge_points: Vec<Vec<Point3>> = self
            .edges
            .iter()
            .enumerate()
            .map(|(index, edge)| self.edge_points(index, edge, precision))
            .collect::<Result<_, _>>()?;

        let tol = Tolerance::default_geom();
        let mut face_points = Vec::with_capacity(self.faces.len());
        let mut face_loop_normals = Vec::with_capacity(self.faces.len());
        for face in &self.faces {
            let mut samples: Vec<Point3> = Vec::new();
            let mut push = |p: Point3| {
                if !samples.iter().any(|&q| tol.approx_eq_point3(p, q)) {
                    samples.push(p);
                }
            };
            for &vertex in &face.boundary {
                push(self.vertices[vertex]);
            }
            for &edge in &face.edges {
                for &p in &edge_points[edge] {
                    push(p);
                }
            }
            for &p in &face.surface_samples {
                push(p);
            }

            let loop_points: Vec<Point3> = if face.boundary.len() >= 3 {
                face.boundary.iter().map(|&v| self.vertices[v]).collect()
            } else {
                face.edges
                    .iter()
                    .flat_map(|&e| edge_points[e].iter().copied())
                    .collect()
            };
            face_loop_normals.push(newell_normal(&loop_points));
            face_points.push(samples);
        }

        log::debug!(
            "tessellate: {} edges, {} faces at precision {precision}",
            edge_points.len(),
            face_points.len()
        );

        Ok(Tessellation {
            edges: edge_points,
            faces: face_points,
            face_loop_normals,
        })
    }

    fn edge_points(
        &self,
        index: usize,
        edge: &TopoEdge,
        precision: f64,
    ) -> Result<Vec<Point3>, TopologyError> {
        let start = self.vertices[edge.start];
        let end = self.vertices[edge.end];
        match &edge.curve {
            EdgeCurve::Line => Ok(vec![start, end]),
            EdgeCurve::Polyline(points) => {
                let mut out = Vec::with_capacity(points.len() + 2);
                out.push(start);
                out.extend_from_slice(points);
                out.push(end);
                Ok(out)
            }
            EdgeCurve::Arc { center, normal } => {
                let segments = arc_segments(start, end, *center, *normal, precision);
                if segments > MAX_ARC_SEGMENTS {
                    return Err(TopologyError::ArcTooFine {
                        edge: index,
                        segments,
                        limit: MAX_ARC_SEGMENTS,
                    });
                }
                Ok(arc_points(start, end, *center, *normal, segments))
            }
        }
    }

    /// Edges touching at least one selected vertex.
    ///
    /// # Errors
    /// Fails when `mask` does not have one entry per vertex.
    pub fn edges_by_vertices_mask(&self, mask: &[bool]) -> Result<Vec<bool>, TopologyError> {
        check_mask("vertex", mask, self.vertices.len())?;
        Ok(self
            .edges
            .iter()
            .map(|edge| mask[edge.start] || mask[edge.end])
            .collect())
    }

    /// Faces touching at least one selected vertex.
    ///
    /// # Errors
    /// Fails when `mask` does not have one entry per vertex.
    pub fn faces_by_vertices_mask(&self, mask: &[bool]) -> Result<Vec<bool>, TopologyError> {
        check_mask("vertex", mask, self.vertices.len())?;
        Ok(self
            .face_vertices
            .iter()
            .map(|vertices| vertices.iter().any(|&v| mask[v]))
            .collect())
    }

    /// Endpoints of selected edges.
    ///
    /// # Errors
    /// Fails when `mask` does not have one entry per edge.
    pub fn vertices_by_edges_mask(&self, mask: &[bool]) -> Result<Vec<bool>, TopologyError> {
        check_mask("edge", mask, self.edges.len())?;
        Ok(self
            .vertex_edges
            .iter()
            .map(|edges| edges.iter().any(|&e| mask[e]))
            .collect())
    }

    /// Faces bounded by at least one selected edge.
    ///
    /// # Errors
    /// Fails when `mask` does not have one entry per edge.
    pub fn faces_by_edges_mask(&self, mask: &[bool]) -> Result<Vec<bool>, TopologyError> {
        check_mask("edge", mask, self.edges.len())?;
        Ok(self
            .faces
            .iter()
            .map(|face| face.edges.iter().any(|&e| mask[e]))
            .collect())
    }

    /// Vertices of selected faces.
    ///
    /// # Errors
    /// Fails when `mask` does not have one entry per face.
    pub fn vertices_by_faces_mask(&self, mask: &[bool]) -> Result<Vec<bool>, TopologyError> {
        check_mask("face", mask, self.faces.len())?;
        Ok(self
            .vertex_faces
            .iter()
            .map(|faces| faces.iter().any(|&f| mask[f]))
            .collect())
    }

    /// Edges of selected faces.
    ///
    /// # Errors
    /// Fails when `mask` does not have one entry per face.
    pub fn edges_by_faces_mask(&self, mask: &[bool]) -> Result<Vec<bool>, TopologyError> {
        check_mask("face", mask, self.faces.len())?;
        Ok(self
            .edge_faces
            .iter()
            .map(|faces| faces.iter().any(|&f| mask[f]))
            .collect())
    }
}

fn check_mask(kind: &'static str, mask: &[bool], expected: usize) -> Result<(), TopologyError> {
    if mask.len() == expected {
        Ok(())
    } else {
        Err(TopologyError::MaskLengthMismatch {
            kind,
            expected,
            found: mask.len(),
        })
    }
}

fn push_unique(list: &mut Vec<usize>, value: usize) {
    if !list.contains(&value) {
        list.push(value);
    }
}

fn validate_edge(index: usize, edge: &TopoEdge, vertices: &[Point3]) -> Result<(), TopologyError> {
    for vertex in [edge.start, edge.end] {
        if vertex >= vertices.len() {
            return Err(TopologyError::EdgeVertexOutOfRange { edge: index, vertex });
        }
    }
    match &edge.curve {
        EdgeCurve::Line => Ok(()),
        EdgeCurve::Polyline(points) => {
            if points.iter().all(|p| p.is_finite()) {
                Ok(())
            } else {
                Err(TopologyError::NonFinitePolyline { edge: index })
            }
        }
        EdgeCurve::Arc { center, normal } => {
            if !center.is_finite()
                || normal.normalized().is_none()
                || Tolerance::ZERO_LENGTH.is_zero_vec3(*normal)
            {
                return Err(TopologyError::InvalidArc {
                    edge: index,
                    reason: "center must be finite and normal non-zero",
                });
            }
            let radius = vertices[edge.start].distance_to(*center);
            let end_radius = vertices[edge.end].distance_to(*center);
            if radius <= Tolerance::ZERO_LENGTH.eps {
                return Err(TopologyError::InvalidArc {
                    edge: index,
                    reason: "start point lies on the center",
                });
            }
            if (radius - end_radius).abs() > Tolerance::LOOSE.relative_to(radius) {
                return Err(TopologyError::InvalidArc {
                    edge: index,
                    reason: "start and end are at different distances from the center",
                });
            }
            Ok(())
        }
    }
}

/// Local frame of an arc: radius, in-plane axes and counter-clockwise sweep.
fn arc_frame(start: Point3, end: Point3, center: Point3, normal: Vec3) -> Option<(f64, Vec3, Vec3, f64)> {
    let normal = normal.normalized()?;
    let radial = start.sub_point(center);
    let radius = radial.length();
    let x_axis = radial * (1.0 / radius);
    let y_axis = normal.cross(x_axis);

    let to_end = end.sub_point(center);
    let mut sweep = to_end.dot(y_axis).atan2(to_end.dot(x_axis));
    if sweep <= Tolerance::DEFAULT.eps {
        sweep += TAU;
    }
    Some((radius, x_axis, y_axis, sweep))
}

/// Number of segments that keeps the chord deviation at most `precision`.
fn arc_segments(start: Point3, end: Point3, center: Point3, normal: Vec3, precision: f64) -> usize {
    let Some((radius, _, _, sweep)) = arc_frame(start, end, center, normal) else {
        return 1;
    };
    let ratio = precision / radius;
    // 2·acos(1 - r) loses all digits once r drops below f64 resolution.
    let step = if ratio < 1e-6 {
        2.0 * (2.0 * ratio).sqrt()
    } else {
        2.0 * (1.0 - ratio).clamp(-1.0, 1.0).acos()
    }
    .min(FRAC_PI_2);
    let segments = (sweep / step).ceil();
    if segments.is_finite() && segments < usize::MAX as f64 {
        (segments as usize).max(1)
    } else {
        usize::MAX
    }
}

fn arc_points(start: Point3, end: Point3, center: Point3, normal: Vec3, segments: usize) -> Vec<Point3> {
    let Some((radius, x_axis, y_axis, sweep)) = arc_frame(start, end, center, normal) else {
        return vec![start, end];
    };

    let mut points = Vec::with_capacity(segments + 1);
    points.push(start);
    for k in 1..segments {
        let angle = sweep * k as f64 / segments as f64;
        let (s, c) = angle.sin_cos();
        points.push(center + (x_axis * c + y_axis * s) * radius);
    }
    points.push(end);
    points
}

/// Newell normal of a closed loop, `None` when the loop encloses no area.
#[must_use]
pub fn newell_normal(points: &[Point3]) -> Option<Vec3> {
    if points.len() < 3 {
        return None;
    }
    let mut normal = Vec3::ZERO;
    for (i, a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        normal = normal
            + Vec3::new(
                (a.y - b.y) * (a.z + b.z),
                (a.z - b.z) * (a.x + b.x),
                (a.x - b.x) * (a.y + b.y),
            );
    }
    normal.normalized()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_cube() -> SolidTopology {
        SolidTopology::cuboid(Point3::ORIGIN, Point3::new(1.0, 1.0, 1.0)).expect("cube")
    }

    #[test]
    fn cuboid_has_box_counts_and_outward_loops() {
        let cube = unit_cube();
        assert_eq!(cube.vertices().len(), 8);
        assert_eq!(cube.edges().len(), 12);
        assert_eq!(cube.faces().len(), 6);
        for edge in 0..12 {
            assert_eq!(cube.faces_of_edge(edge).len(), 2);
        }
        for vertex in 0..8 {
            assert_eq!(cube.edges_of_vertex(vertex).len(), 3);
            assert_eq!(cube.faces_of_vertex(vertex).len(), 3);
        }

        let tess = cube.tessellate(0.01).expect("tessellation");
        let centre = Point3::new(0.5, 0.5, 0.5);
        for (face, normal) in tess.face_loop_normals.iter().enumerate() {
            let normal = normal.expect("planar loop");
            let face_centre = tess.faces[face]
                .iter()
                .fold(Vec3::ZERO, |acc, p| acc + p.to_vec3())
                * (1.0 / tess.faces[face].len() as f64);
            assert!(normal.dot(face_centre - centre.to_vec3()) > 0.0, "face {face}");
        }
    }

    #[test]
    fn from_polygons_welds_and_shares_edges() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(2.0, 0.5, 0.0),
        ];
        let topo = SolidTopology::from_polygons(
            vertices,
            &[vec![0, 1, 2], vec![3, 5, 4]],
            Tolerance::default_geom(),
        )
        .expect("topology");
        assert_eq!(topo.vertices().len(), 4);
        assert_eq!(topo.edges().len(), 5);
        let shared = topo
            .edges()
            .iter()
            .position(|e| (e.start.min(e.end), e.start.max(e.end)) == (1, 2))
            .expect("shared edge");
        assert_eq!(topo.faces_of_edge(shared), &[0, 1]);
    }

    #[test]
    fn rejects_bad_indices() {
        let err = SolidTopology::new(
            vec![Point3::ORIGIN],
            vec![TopoEdge::line(0, 3)],
            Vec::new(),
        )
        .unwrap_err();
        assert_eq!(err, TopologyError::EdgeVertexOutOfRange { edge: 0, vertex: 3 });

        let err = SolidTopology::from_polygons(
            vec![Point3::ORIGIN, Point3::new(1.0, 0.0, 0.0)],
            &[vec![0, 1, 0]],
            Tolerance::default_geom(),
        )
        .unwrap_err();
        assert_eq!(err, TopologyError::DegenerateFace { face: 0 });
    }

    #[test]
    fn arc_tessellation_respects_precision() {
        let topo = SolidTopology::cylinder(Point3::ORIGIN, 2.0, 1.0).expect("cylinder");
        let precision = 0.01;
        let tess = topo.tessellate(precision).expect("tessellation");
        let circle = &tess.edges[0];
        assert!(circle.len() > 10);
        assert_eq!(circle.first(), circle.last());
        for pair in circle.windows(2) {
            let mid = pair[0].lerp(pair[1], 0.5);
            let sagitta = 2.0 - mid.to_vec3().length();
            assert!(sagitta <= precision + 1e-9);
        }

        let bottom = tess.face_loop_normals[0].expect("bottom normal");
        assert!((bottom + Vec3::Z).length() < 1e-9);
    }

    #[test]
    fn finer_precision_never_coarsens_arcs() {
        let topo = SolidTopology::cylinder(Point3::ORIGIN, 1.0, 1.0).expect("cylinder");
        let coarse = topo.tessellate(0.01).expect("coarse").edges[0].len();
        let fine = topo.tessellate(1e-7).expect("fine").edges[0].len();
        assert!(fine > coarse);
        assert!(fine <= MAX_ARC_SEGMENTS + 1);

        for precision in [1e-12, 1e-17] {
            assert!(matches!(
                topo.tessellate(precision),
                Err(TopologyError::ArcTooFine { edge: 0, limit: MAX_ARC_SEGMENTS, .. })
            ));
        }
    }

    #[test]
    fn invalid_precision_is_rejected() {
        let cube = unit_cube();
        for precision in [0.0, -1.0, f64::NAN] {
            assert!(matches!(
                cube.tessellate(precision),
                Err(TopologyError::InvalidPrecision { .. })
            ));
        }
    }

    #[test]
    fn mask_derivations_follow_incidence() {
        let cube = unit_cube();
        let mut faces = vec![false; 6];
        faces[1] = true;
        let vertices = cube.vertices_by_faces_mask(&faces).expect("vertices");
        assert_eq!(vertices.iter().filter(|&&v| v).count(), 4);
        let edges = cube.edges_by_faces_mask(&faces).expect("edges");
        assert_eq!(edges.iter().filter(|&&e| e).count(), 4);

        let mut single = vec![false; 8];
        single[0] = true;
        assert_eq!(
            cube.edges_by_vertices_mask(&single)
                .expect("edges")
                .iter()
                .filter(|&&e| e)
                .count(),
            3
        );
        assert_eq!(
            cube.faces_by_vertices_mask(&single)
                .expect("faces")
                .iter()
                .filter(|&&f| f)
                .count(),
            3
        );

        let err = cube.faces_by_edges_mask(&[true]).unwrap_err();
        assert_eq!(
            err,
            TopologyError::MaskLengthMismatch {
                kind: "edge",
                expected: 12,
                found: 1
            }
        );
    }
}
