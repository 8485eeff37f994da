//! Interpolating splines through ordered 3D control points.
//!
//! A [`Spline3`] passes through every control point. Each control point gets
//! a knot parameter in `[0, 1]` assigned by a [`Metric`], and the curve
//! between knots is either a straight segment ([`Interpolation::Linear`]) or
//! a natural cubic ([`Interpolation::Cubic`], zero curvature at both ends).
//!
//! Splines are the building block of [`super::SplineSurface`]; they are also
//! usable on their own for resampling polylines.

use serde::Deserialize;

use super::core::{Point3, Vec3};

/// Errors raised while constructing a spline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SplineError {
    #[error("spline needs at least {required} control points, got {provided}")]
    InsufficientPoints { provided: usize, required: usize },
    #[error("control points produce degenerate knots: {reason}")]
    DegenerateKnots { reason: String },
    #[error("knot count {knots} does not match control point count {points}")]
    KnotCountMismatch { points: usize, knots: usize },
    #[error("control points or knots contain NaN or Inf values")]
    NonFiniteInput,
}

/// Curve shape between consecutive control points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Interpolation {
    /// Straight segments between control points.
    Linear,
    /// Natural cubic spline (C2 continuous).
    #[default]
    Cubic,
}

impl Interpolation {
    /// Parses a node-parameter identifier (`"LIN"`, `"Linear"`, `"SPL"`, `"Cubic"`).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "lin" | "linear" => Some(Self::Linear),
            "spl" | "cubic" => Some(Self::Cubic),
            _ => None,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Linear => "Linear",
            Self::Cubic => "Cubic",
        }
    }
}

/// Distance metric used to assign knot parameters to control points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    /// Cumulative `|dx| + |dy| + |dz|`.
    Manhattan,
    /// Cumulative chord length.
    #[default]
    Euclidean,
    /// Uniform spacing, independent of point positions.
    Points,
    /// Cumulative `max(|dx|, |dy|, |dz|)`.
    Chebyshev,
}

impl Metric {
    /// Parses a node-parameter identifier (`"MANHATTAN"`, `"DISTANCE"`, `"POINTS"`, ...).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "manhattan" => Some(Self::Manhattan),
            "distance" | "euclidean" | "euclidan" => Some(Self::Euclidean),
            "points" => Some(Self::Points),
            "chebyshev" => Some(Self::Chebyshev),
            _ => None,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Manhattan => "Manhattan",
            Self::Euclidean => "Euclidean",
            Self::Points => "Points",
            Self::Chebyshev => "Chebyshev",
        }
    }

    fn segment_length(self, delta: Vec3) -> f64 {
        match self {
            Self::Manhattan => delta.x.abs() + delta.y.abs() + delta.z.abs(),
            Self::Euclidean => delta.length(),
            Self::Points => 1.0,
            Self::Chebyshev => delta.max_abs_component(),
        }
    }
}

/// Minimum number of control points a spline accepts.
pub const MIN_SPLINE_POINTS: usize = 2;

/// Computes normalized knot parameters for `points` under `metric`.
///
/// The first knot is always `0.0` and the last `1.0`. Consecutive knots must
/// be strictly increasing, so coincident consecutive points are rejected for
/// every metric except [`Metric::Points`].
///
/// # Errors
/// Returns an error for fewer than two points, non-finite coordinates, or
/// degenerate (non-increasing) knots.
pub fn metric_knots(points: &[Point3], metric: Metric) -> Result<Vec<f64>, SplineError> {
    if points.len() < MIN_SPLINE_POINTS {
        return Err(SplineError::InsufficientPoints {
            provided: points.len(),
            required: MIN_SPLINE_POINTS,
        });
    }
    if points.iter().any(|p| !p.is_finite()) {
        return Err(SplineError::NonFiniteInput);
    }

    let mut knots = Vec::with_capacity(points.len());
    knots.push(0.0);
    let mut total = 0.0;
    for pair in points.windows(2) {
        total += metric.segment_length(pair[1].sub_point(pair[0]));
        knots.push(total);
    }

    if !(total.is_finite() && total > 0.0) {
        return Err(SplineError::DegenerateKnots {
            reason: format!("total {} length is zero", metric.name()),
        });
    }

    for knot in &mut knots {
        *knot /= total;
    }
    validate_knots(&knots)?;
    Ok(knots)
}

fn validate_knots(knots: &[f64]) -> Result<(), SplineError> {
    if knots.iter().any(|k| !k.is_finite()) {
        return Err(SplineError::NonFiniteInput);
    }
    if let Some(index) = knots.windows(2).position(|w| w[1] <= w[0]) {
        return Err(SplineError::DegenerateKnots {
            reason: format!("coincident control points at index {} and {}", index, index + 1),
        });
    }
    Ok(())
}

/// Interpolating spline through 3D control points.
#[derive(Debug, Clone, PartialEq)]
pub struct Spline3 {
    points: Vec<Point3>,
    knots: Vec<f64>,
    interpolation: Interpolation,
    /// Second derivatives at the knots; empty for linear splines.
    second_derivatives: Vec<Vec3>,
}

impl Spline3 {
    /// Fits a spline through `points` with knots assigned by `metric`.
    ///
    /// # Errors
    /// See [`metric_knots`].
    pub fn fit(
        points: Vec<Point3>,
        interpolation: Interpolation,
        metric: Metric,
    ) -> Result<Self, SplineError> {
        let knots = metric_knots(&points, metric)?;
        Self::with_knots(points, knots, interpolation)
    }

    /// Builds a spline through `points` at explicit, strictly increasing `knots`.
    ///
    /// # Errors
    /// Returns an error when the counts differ, fewer than two points are
    /// given, or the knots are not strictly increasing.
    pub fn with_knots(
        points: Vec<Point3>,
        knots: Vec<f64>,
        interpolation: Interpolation,
    ) -> Result<Self, SplineError> {
        if points.len() < MIN_SPLINE_POINTS {
            return Err(SplineError::InsufficientPoints {
                provided: points.len(),
                required: MIN_SPLINE_POINTS,
            });
        }
        if knots.len() != points.len() {
            return Err(SplineError::KnotCountMismatch {
                points: points.len(),
                knots: knots.len(),
            });
        }
        if points.iter().any(|p| !p.is_finite()) {
            return Err(SplineError::NonFiniteInput);
        }
        validate_knots(&knots)?;

        let second_derivatives = match interpolation {
            Interpolation::Linear => Vec::new(),
            Interpolation::Cubic => natural_second_derivatives(&points, &knots),
        };

        Ok(Self {
            points,
            knots,
            interpolation,
            second_derivatives,
        })
    }

    /// Builds a spline from knots that were already validated by the caller.
    pub(crate) fn with_validated_knots(
        points: Vec<Point3>,
        knots: &[f64],
        interpolation: Interpolation,
    ) -> Self {
        debug_assert_eq!(points.len(), knots.len());
        let second_derivatives = match interpolation {
            Interpolation::Linear => Vec::new(),
            Interpolation::Cubic => natural_second_derivatives(&points, knots),
        };
        Self {
            points,
            knots: knots.to_vec(),
            interpolation,
            second_derivatives,
        }
    }

    #[must_use]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    #[must_use]
    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    #[must_use]
    pub const fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    /// Parameter domain `(first knot, last knot)`.
    #[must_use]
    pub fn domain(&self) -> (f64, f64) {
        (self.knots[0], self.knots[self.knots.len() - 1])
    }

    /// Evaluates the spline position. `t` is clamped to the domain.
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point3 {
        let (k, t) = self.locate(t);
        let p0 = self.points[k];
        let p1 = self.points[k + 1];
        let h = self.knots[k + 1] - self.knots[k];
        let b = (t - self.knots[k]) / h;

        match self.interpolation {
            Interpolation::Linear => p0.lerp(p1, b),
            Interpolation::Cubic => {
                let a = 1.0 - b;
                let m0 = self.second_derivatives[k];
                let m1 = self.second_derivatives[k + 1];
                let base = p0.to_vec3().mul_scalar(a) + p1.to_vec3().mul_scalar(b);
                let curvature = (m0.mul_scalar(a * a * a - a) + m1.mul_scalar(b * b * b - b))
                    .mul_scalar(h * h / 6.0);
                Point3::from(base + curvature)
            }
        }
    }

    /// First derivative with respect to the knot parameter. `t` is clamped.
    #[must_use]
    pub fn tangent_at(&self, t: f64) -> Vec3 {
        let (k, t) = self.locate(t);
        let p0 = self.points[k];
        let p1 = self.points[k + 1];
        let h = self.knots[k + 1] - self.knots[k];
        let chord = p1.sub_point(p0).mul_scalar(1.0 / h);

        match self.interpolation {
            Interpolation::Linear => chord,
            Interpolation::Cubic => {
                let b = (t - self.knots[k]) / h;
                let a = 1.0 - b;
                let m0 = self.second_derivatives[k];
                let m1 = self.second_derivatives[k + 1];
                chord - m0.mul_scalar((3.0 * a * a - 1.0) * h / 6.0)
                    + m1.mul_scalar((3.0 * b * b - 1.0) * h / 6.0)
            }
        }
    }

    /// Segment index and clamped parameter for `t`.
    fn locate(&self, t: f64) -> (usize, f64) {
        let (t0, t1) = self.domain();
        let t = if t.is_nan() { t0 } else { t.clamp(t0, t1) };
        let last_segment = self.knots.len() - 2;
        let k = self
            .knots
            .partition_point(|&knot| knot <= t)
            .saturating_sub(1)
            .min(last_segment);
        (k, t)
    }
}

/// Solves the natural cubic spline system for per-knot second derivatives
/// with the Thomas algorithm. End conditions: `M[0] = M[n-1] = 0`.
fn natural_second_derivatives(points: &[Point3], knots: &[f64]) -> Vec<Vec3> {
    let n = points.len();
    let mut m = vec![Vec3::ZERO; n];
    if n < 3 {
        return m;
    }

    let h: Vec<f64> = knots.windows(2).map(|w| w[1] - w[0]).collect();
    let slope = |i: usize| points[i + 1].sub_point(points[i]).mul_scalar(1.0 / h[i]);

    // Interior unknowns M[1..n-1].
    let interior = n - 2;
    let mut diag = vec![0.0; interior];
    let mut upper = vec![0.0; interior];
    let mut rhs = vec![Vec3::ZERO; interior];

    for row in 0..interior {
        let i = row + 1;
        diag[row] = 2.0 * (h[i - 1] + h[i]);
        upper[row] = h[i];
        rhs[row] = (slope(i) - slope(i - 1)).mul_scalar(6.0);
    }

    for row in 1..interior {
        let lower = h[row];
        let factor = lower / diag[row - 1];
        diag[row] -= factor * upper[row - 1];
        rhs[row] = rhs[row] - rhs[row - 1].mul_scalar(factor);
    }

    let mut next = Vec3::ZERO;
    for row in (0..interior).rev() {
        let value = (rhs[row] - next.mul_scalar(upper[row])).mul_scalar(1.0 / diag[row]);
        m[row + 1] = value;
        next = value;
    }
    m
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_points() -> Vec<Point3> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(3.0, 0.0, 0.0),
        ]
    }

    #[test]
    fn euclidean_knots_follow_chord_length() {
        let knots = metric_knots(&line_points(), Metric::Euclidean).expect("knots");
        assert_eq!(knots.len(), 3);
        assert!((knots[1] - 1.0 / 3.0).abs() < 1e-12);
        assert!((knots[2] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn points_metric_is_uniform() {
        let knots = metric_knots(&line_points(), Metric::Points).expect("knots");
        assert_eq!(knots, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn manhattan_and_chebyshev_differ_on_diagonals() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(3.0, 1.0, 0.0),
        ];
        let manhattan = metric_knots(&points, Metric::Manhattan).expect("knots");
        let chebyshev = metric_knots(&points, Metric::Chebyshev).expect("knots");
        assert!((manhattan[1] - 0.5).abs() < 1e-12);
        assert!((chebyshev[1] - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn coincident_points_are_rejected() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
        ];
        assert!(matches!(
            metric_knots(&points, Metric::Euclidean),
            Err(SplineError::DegenerateKnots { .. })
        ));
        assert!(metric_knots(&points, Metric::Points).is_ok());
    }

    #[test]
    fn single_point_is_insufficient() {
        let err = Spline3::fit(vec![Point3::ORIGIN], Interpolation::Cubic, Metric::Euclidean)
            .unwrap_err();
        assert_eq!(
            err,
            SplineError::InsufficientPoints {
                provided: 1,
                required: 2
            }
        );
    }

    #[test]
    fn splines_interpolate_control_points() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 2.0, 0.0),
            Point3::new(2.0, 0.5, 1.0),
            Point3::new(4.0, 1.0, 0.0),
        ];
        for interpolation in [Interpolation::Linear, Interpolation::Cubic] {
            let spline =
                Spline3::fit(points.clone(), interpolation, Metric::Euclidean).expect("spline");
            for (point, knot) in points.iter().zip(spline.knots()) {
                let evaluated = spline.point_at(*knot);
                assert!(evaluated.distance_to(*point) < 1e-9, "{interpolation:?} at {knot}");
            }
        }
    }

    #[test]
    fn cubic_through_collinear_uniform_points_is_linear() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(3.0, 0.0, 0.0),
        ];
        let spline = Spline3::fit(points, Interpolation::Cubic, Metric::Euclidean).expect("spline");
        let mid = spline.point_at(0.5);
        assert!((mid.x - 1.5).abs() < 1e-12);
        let tangent = spline.tangent_at(0.25);
        assert!((tangent.x - 3.0).abs() < 1e-9);
        assert!(tangent.y.abs() < 1e-12);
    }

    #[test]
    fn cubic_tangent_matches_finite_difference() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(2.0, 0.0, 0.5),
            Point3::new(3.0, 1.0, 0.0),
        ];
        let spline = Spline3::fit(points, Interpolation::Cubic, Metric::Euclidean).expect("spline");
        let t = 0.4;
        let h = 1e-6;
        let fd = spline
            .point_at(t + h)
            .sub_point(spline.point_at(t - h))
            .mul_scalar(0.5 / h);
        let analytic = spline.tangent_at(t);
        assert!((fd - analytic).length() < 1e-5);
    }

    #[test]
    fn parameters_outside_domain_are_clamped() {
        let spline =
            Spline3::fit(line_points(), Interpolation::Linear, Metric::Euclidean).expect("spline");
        assert_eq!(spline.point_at(-1.0), Point3::new(0.0, 0.0, 0.0));
        assert_eq!(spline.point_at(2.0), Point3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn interpolation_and_metric_names_parse() {
        assert_eq!(Interpolation::from_name("SPL"), Some(Interpolation::Cubic));
        assert_eq!(Interpolation::from_name("linear"), Some(Interpolation::Linear));
        assert_eq!(Metric::from_name("DISTANCE"), Some(Metric::Euclidean));
        assert_eq!(Metric::from_name("Chebyshev"), Some(Metric::Chebyshev));
        assert_eq!(Metric::from_name("bogus"), None);
    }
}
