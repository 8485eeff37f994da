//! Least-squares approximation of point sets by planes and lines.

use super::core::{Point3, Tolerance, Vec3};

/// Principal axes of a point set around its centroid.
///
/// Eigenpairs of the 3×3 covariance matrix, sorted by ascending eigenvalue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearApproximation {
    pub centroid: Point3,
    pub eigenvalues: [f64; 3],
    pub eigenvectors: [Vec3; 3],
}

/// Best-fit plane through a point set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FittedPlane {
    pub origin: Point3,
    pub normal: Vec3,
}

/// Best-fit line through a point set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FittedLine {
    pub origin: Point3,
    pub direction: Vec3,
}

/// Computes the centroid and principal axes of `points`.
///
/// Returns `None` for an empty slice or non-finite input.
#[must_use]
pub fn linear_approximation(points: &[Point3]) -> Option<LinearApproximation> {
    if points.is_empty() || points.iter().any(|p| !p.is_finite()) {
        return None;
    }

    let inv = 1.0 / points.len() as f64;
    let centroid = points
        .iter()
        .fold(Vec3::ZERO, |acc, p| acc + p.to_vec3())
        .mul_scalar(inv);
    let centroid = Point3::from(centroid);

    let mut xx = 0.0;
    let mut xy = 0.0;
    let mut xz = 0.0;
    let mut yy = 0.0;
    let mut yz = 0.0;
    let mut zz = 0.0;
    for point in points {
        let d = point.sub_point(centroid);
        xx += d.x * d.x;
        xy += d.x * d.y;
        xz += d.x * d.z;
        yy += d.y * d.y;
        yz += d.y * d.z;
        zz += d.z * d.z;
    }

    let (values, vectors) = jacobi_eigen_decomposition([[xx, xy, xz], [xy, yy, yz], [xz, yz, zz]]);

    let mut order = [0usize, 1, 2];
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    let column = |k: usize| Vec3::new(vectors[0][k], vectors[1][k], vectors[2][k]);

    Some(LinearApproximation {
        centroid,
        eigenvalues: order.map(|k| values[k] * inv),
        eigenvectors: order.map(|k| column(k).normalized().unwrap_or(Vec3::Z)),
    })
}

impl LinearApproximation {
    /// Plane spanned by the two largest principal axes.
    #[must_use]
    pub fn most_similar_plane(&self) -> FittedPlane {
        FittedPlane {
            origin: self.centroid,
            normal: self.eigenvectors[0],
        }
    }

    /// Line along the largest principal axis.
    ///
    /// `None` when all points coincide.
    #[must_use]
    pub fn most_similar_line(&self) -> Option<FittedLine> {
        if self.eigenvalues[2] <= Tolerance::ZERO_LENGTH.eps {
            return None;
        }
        Some(FittedLine {
            origin: self.centroid,
            direction: self.eigenvectors[2],
        })
    }
}

/// Symmetric 3×3 eigen-decomposition by cyclic Jacobi rotations.
///
/// Returns the eigenvalues and a matrix whose columns are the eigenvectors.
fn jacobi_eigen_decomposition(mut m: [[f64; 3]; 3]) -> ([f64; 3], [[f64; 3]; 3]) {
    const TOLERANCE: f64 = 1e-12;
    const MAX_ITERATIONS: usize = 64;

    let mut vectors = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

    for _ in 0..MAX_ITERATIONS {
        let (p, q) = [(0, 1), (0, 2), (1, 2)]
            .into_iter()
            .max_by(|a, b| m[a.0][a.1].abs().total_cmp(&m[b.0][b.1].abs()))
            .unwrap_or((0, 1));
        let apq = m[p][q];
        if apq.abs() < TOLERANCE {
            break;
        }

        let app = m[p][p];
        let aqq = m[q][q];
        let angle = 0.5 * (2.0 * apq).atan2(aqq - app);
        let (s, c) = angle.sin_cos();

        for k in 0..3 {
            if k == p || k == q {
                continue;
            }
            let mkp = m[k][p];
            let mkq = m[k][q];
            m[k][p] = c * mkp - s * mkq;
            m[p][k] = m[k][p];
            m[k][q] = c * mkq + s * mkp;
            m[q][k] = m[k][q];
        }
        m[p][p] = c * c * app - 2.0 * s * c * apq + s * s * aqq;
        m[q][q] = s * s * app + 2.0 * s * c * apq + c * c * aqq;
        m[p][q] = 0.0;
        m[q][p] = 0.0;

        for row in &mut vectors {
            let vp = row[p];
            let vq = row[q];
            row[p] = c * vp - s * vq;
            row[q] = s * vp + c * vq;
        }
    }

    ([m[0][0], m[1][1], m[2][2]], vectors)
}

/// Plane `n·p + d = 0` with unit normal `n`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneEquation {
    pub normal: Vec3,
    pub d: f64,
}

impl PlaneEquation {
    /// `None` when `normal` has zero length.
    #[must_use]
    pub fn from_normal_and_point(normal: Vec3, point: Point3) -> Option<Self> {
        let normal = normal.normalized()?;
        Some(Self {
            normal,
            d: -normal.dot(point.to_vec3()),
        })
    }

    #[must_use]
    pub fn signed_distance_to_point(&self, point: Point3) -> f64 {
        self.normal.dot(point.to_vec3()) + self.d
    }

    #[must_use]
    pub fn distance_to_point(&self, point: Point3) -> f64 {
        self.signed_distance_to_point(point).abs()
    }
}

/// Infinite line through `point` along the unit vector `direction`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineEquation {
    pub point: Point3,
    pub direction: Vec3,
}

impl LineEquation {
    /// `None` when `direction` has zero length.
    #[must_use]
    pub fn from_direction_and_point(direction: Vec3, point: Point3) -> Option<Self> {
        Some(Self {
            point,
            direction: direction.normalized()?,
        })
    }

    #[must_use]
    pub fn project_point(&self, point: Point3) -> Point3 {
        let t = point.sub_point(self.point).dot(self.direction);
        self.point + self.direction * t
    }

    #[must_use]
    pub fn distance_to_point(&self, point: Point3) -> f64 {
        point.distance_to(self.project_point(point))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_fit_recovers_tilted_plane() {
        let normal = Vec3::new(1.0, -2.0, 3.0).normalized().expect("normal");
        let origin = Point3::new(0.5, 1.0, -2.0);
        let u = normal.cross(Vec3::X).normalized().expect("u");
        let v = normal.cross(u);
        let points: Vec<Point3> = (0..5)
            .flat_map(|i| (0..4).map(move |j| (i as f64, j as f64 * 0.7)))
            .map(|(a, b)| origin + u * a + v * b)
            .collect();

        let plane = linear_approximation(&points)
            .expect("fit")
            .most_similar_plane();
        assert!(plane.normal.dot(normal).abs() > 1.0 - 1e-9);
        let equation = PlaneEquation::from_normal_and_point(plane.normal, plane.origin)
            .expect("plane");
        for p in &points {
            assert!(equation.distance_to_point(*p) < 1e-9);
        }
    }

    #[test]
    fn line_fit_follows_segment() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(2.0, 2.0, 0.0),
        ];
        let line = linear_approximation(&points)
            .and_then(|fit| fit.most_similar_line())
            .expect("line");
        let expected = Vec3::new(1.0, 1.0, 0.0).normalized().expect("dir");
        assert!(line.direction.dot(expected).abs() > 1.0 - 1e-9);
        assert!((line.origin.x - 1.0).abs() < 1e-12);
    }

    #[test]
    fn coincident_points_have_no_line() {
        let points = [Point3::new(1.0, 2.0, 3.0); 3];
        let fit = linear_approximation(&points).expect("fit");
        assert!(fit.most_similar_line().is_none());
        assert!(linear_approximation(&[]).is_none());
    }

    #[test]
    fn line_distance_is_perpendicular() {
        let line = LineEquation::from_direction_and_point(Vec3::Z * 3.0, Point3::ORIGIN)
            .expect("line");
        assert!((line.distance_to_point(Point3::new(3.0, 4.0, 10.0)) - 5.0).abs() < 1e-12);
        assert!(LineEquation::from_direction_and_point(Vec3::ZERO, Point3::ORIGIN).is_none());
    }
}
