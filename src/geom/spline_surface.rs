//! Spline surface interpolating a rectangular grid of samples.
//!
//! Every grid row becomes a V-direction [`Spline3`] with its own metric
//! knots. Evaluating at `(u, v)` samples each row spline at `v` and then
//! interpolates those points across rows at `u`. The cross-row knots are the
//! average of the per-column metric knots, so the U direction uses the same
//! parameterization for every `v`.

use super::core::{Point3, Vec3};
use super::grid::{GridError, PointGrid};
use super::spline::{Interpolation, Metric, SplineError, Spline3, metric_knots, MIN_SPLINE_POINTS};
use super::surface::Surface;

/// Parameter direction of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceDirection {
    U,
    V,
}

impl std::fmt::Display for SurfaceDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::U => f.write_str("U"),
            Self::V => f.write_str("V"),
        }
    }
}

/// Errors raised while constructing a [`SplineSurface`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SplineSurfaceError {
    #[error("invalid surface grid: {0}")]
    Grid(#[from] GridError),
    #[error(
        "surface grid of {rows}×{columns} points is too small (minimum {required}×{required})"
    )]
    InsufficientControlPoints {
        rows: usize,
        columns: usize,
        required: usize,
    },
    #[error("cannot fit {direction} spline {index}: {source}")]
    Spline {
        direction: SurfaceDirection,
        index: usize,
        #[source]
        source: SplineError,
    },
}

/// Interpolating surface through a [`PointGrid`].
#[derive(Debug, Clone)]
pub struct SplineSurface {
    rows: Vec<Spline3>,
    u_knots: Vec<f64>,
    interpolation: Interpolation,
    metric: Metric,
}

impl SplineSurface {
    /// Fits a surface through `grid`.
    ///
    /// # Errors
    /// Fails when the grid has fewer than 2×2 points or when any row or
    /// column produces degenerate knots under `metric`.
    pub fn new(
        grid: &PointGrid,
        interpolation: Interpolation,
        metric: Metric,
    ) -> Result<Self, SplineSurfaceError> {
        let (row_count, column_count) = grid.shape();
        if row_count < MIN_SPLINE_POINTS || column_count < MIN_SPLINE_POINTS {
            return Err(SplineSurfaceError::InsufficientControlPoints {
                rows: row_count,
                columns: column_count,
                required: MIN_SPLINE_POINTS,
            });
        }

        let rows = grid
            .iter_rows()
            .enumerate()
            .map(|(index, row)| {
                Spline3::fit(row.to_vec(), interpolation, metric).map_err(|source| {
                    SplineSurfaceError::Spline {
                        direction: SurfaceDirection::V,
                        index,
                        source,
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut u_knots = vec![0.0; row_count];
        for column in 0..column_count {
            let knots = metric_knots(&grid.column(column), metric).map_err(|source| {
                SplineSurfaceError::Spline {
                    direction: SurfaceDirection::U,
                    index: column,
                    source,
                }
            })?;
            for (sum, knot) in u_knots.iter_mut().zip(knots) {
                *sum += knot;
            }
        }
        let scale = 1.0 / column_count as f64;
        for knot in &mut u_knots {
            *knot *= scale;
        }

        log::debug!(
            "spline surface: {row_count}×{column_count} samples, {} / {}",
            interpolation.name(),
            metric.name()
        );

        Ok(Self {
            rows,
            u_knots,
            interpolation,
            metric,
        })
    }

    #[must_use]
    pub const fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    #[must_use]
    pub const fn metric(&self) -> Metric {
        self.metric
    }

    /// Knots assigned to the grid rows along U.
    #[must_use]
    pub fn u_knots(&self) -> &[f64] {
        &self.u_knots
    }

    fn across_rows(&self, points: Vec<Point3>) -> Spline3 {
        Spline3::with_validated_knots(points, &self.u_knots, self.interpolation)
    }
}

impl Surface for SplineSurface {
    fn point_at(&self, u: f64, v: f64) -> Point3 {
        let samples = self.rows.iter().map(|row| row.point_at(v)).collect();
        self.across_rows(samples).point_at(u)
    }

    // With fixed knots the interpolation is linear in its data, so the V
    // derivative is the cross-row spline through the row tangents.
    fn partial_derivatives_at(&self, u: f64, v: f64) -> (Vec3, Vec3) {
        let samples = self.rows.iter().map(|row| row.point_at(v)).collect();
        let du = self.across_rows(samples).tangent_at(u);

        let tangents = self
            .rows
            .iter()
            .map(|row| Point3::from(row.tangent_at(v)))
            .collect();
        let dv = self.across_rows(tangents).point_at(u).to_vec3();

        (du, dv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_grid(rows: usize, columns: usize) -> PointGrid {
        PointGrid::from_fn(rows, columns, |i, j| {
            Point3::new(
                i as f64 / (rows - 1) as f64,
                j as f64 / (columns - 1) as f64,
                0.0,
            )
        })
        .expect("grid")
    }

    #[test]
    fn flat_grid_evaluates_to_plane() {
        for interpolation in [Interpolation::Linear, Interpolation::Cubic] {
            let surface =
                SplineSurface::new(&flat_grid(3, 4), interpolation, Metric::Euclidean)
                    .expect("surface");
            let p = surface.point_at(0.3, 0.7);
            assert!((p.x - 0.3).abs() < 1e-9);
            assert!((p.y - 0.7).abs() < 1e-9);
            assert!(p.z.abs() < 1e-12);

            let normal = surface.normal_at(0.3, 0.7).expect("normal");
            assert!((normal - Vec3::Z).length() < 1e-9);
        }
    }

    #[test]
    fn surface_interpolates_samples() {
        let grid = PointGrid::from_fn(4, 4, |i, j| {
            let x = i as f64;
            let y = j as f64;
            Point3::new(x, y, (x * 0.7).sin() + (y * 0.4).cos())
        })
        .expect("grid");
        let surface =
            SplineSurface::new(&grid, Interpolation::Cubic, Metric::Points).expect("surface");
        for i in 0..4 {
            for j in 0..4 {
                let u = i as f64 / 3.0;
                let v = j as f64 / 3.0;
                let p = surface.point_at(u, v);
                let expected = grid.get(i, j).expect("sample");
                assert!(p.distance_to(expected) < 1e-9, "sample ({i}, {j})");
            }
        }
    }

    #[test]
    fn analytic_derivatives_match_finite_differences() {
        let grid = PointGrid::from_fn(4, 5, |i, j| {
            let x = i as f64 * 0.5;
            let y = j as f64 * 0.25;
            Point3::new(x, y, x * y + 0.1 * x * x)
        })
        .expect("grid");
        let surface =
            SplineSurface::new(&grid, Interpolation::Cubic, Metric::Points).expect("surface");
        let (du, dv) = surface.partial_derivatives_at(0.4, 0.6);

        let h = 1e-6;
        let fd_u = surface
            .point_at(0.4 + h, 0.6)
            .sub_point(surface.point_at(0.4 - h, 0.6))
            .mul_scalar(0.5 / h);
        let fd_v = surface
            .point_at(0.4, 0.6 + h)
            .sub_point(surface.point_at(0.4, 0.6 - h))
            .mul_scalar(0.5 / h);
        assert!((du - fd_u).length() < 1e-5);
        assert!((dv - fd_v).length() < 1e-5);
    }

    #[test]
    fn rejects_too_small_grids() {
        let grid = PointGrid::from_fn(1, 3, |_, j| Point3::new(0.0, j as f64, 0.0)).expect("grid");
        let err = SplineSurface::new(&grid, Interpolation::Linear, Metric::Euclidean).unwrap_err();
        assert_eq!(
            err,
            SplineSurfaceError::InsufficientControlPoints {
                rows: 1,
                columns: 3,
                required: 2
            }
        );
    }

    #[test]
    fn reports_degenerate_rows() {
        let grid = PointGrid::new(vec![
            vec![Point3::ORIGIN, Point3::ORIGIN],
            vec![Point3::new(1.0, 0.0, 0.0), Point3::new(1.0, 1.0, 0.0)],
        ])
        .expect("grid");
        let err = SplineSurface::new(&grid, Interpolation::Cubic, Metric::Euclidean).unwrap_err();
        assert!(matches!(
            err,
            SplineSurfaceError::Spline {
                direction: SurfaceDirection::V,
                index: 0,
                ..
            }
        ));
    }
}
