//! Bending point grids onto spline surfaces.
//!
//! The source grid is flattened onto two coordinate axes, rescaled to the
//! unit square and used as `(u, v)` parameters on a [`SplineSurface`] fitted
//! through the surface samples. The remaining coordinate becomes an offset
//! along the surface normal:
//!
//! ```text
//! out = S(u, v) + scale * z * N(u, v)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use nodegeo_engine::geom::{bend_along_surface, Axis, BendOptions, PointGrid};
//!
//! let options = BendOptions::default().orientation(Axis::Z).auto_scale(true);
//! let (bent, diag) = bend_along_surface(&source, &surface, options)?;
//! ```

use serde::Deserialize;

use super::core::{BBox, Tolerance};
use super::grid::{GridError, PointGrid};
use super::spline::{Interpolation, Metric};
use super::spline_surface::{SplineSurface, SplineSurfaceError};
use super::surface::Surface;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

// ============================================================================
// Error types
// ============================================================================

/// Errors that can occur while bending a grid onto a surface.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BendError {
    #[error(transparent)]
    Grid(#[from] GridError),

    /// The surface samples could not be interpolated.
    #[error(transparent)]
    Surface(#[from] SplineSurfaceError),

    /// All source points share the same coordinate on a UV axis.
    #[error("source grid has zero extent along the {axis} axis ({extent})")]
    DegenerateSpan { axis: Axis, extent: f64 },

    /// The surface normal is undefined at the parameter of a source point.
    #[error("surface normal is undefined for source point at row {row}, column {column}")]
    DegenerateNormal { row: usize, column: usize },

    /// A batch was requested with no sources or no surfaces.
    #[error("bend batch needs at least one source grid and one surface ({sources} sources, {surfaces} surfaces)")]
    EmptyBatch { sources: usize, surfaces: usize },
}

// ============================================================================
// Options
// ============================================================================

/// Coordinate axis used as the displacement direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum Axis {
    #[serde(alias = "x")]
    X,
    #[serde(alias = "y")]
    Y,
    #[default]
    #[serde(alias = "z")]
    Z,
}

impl Axis {
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "X" => Some(Self::X),
            "Y" => Some(Self::Y),
            "Z" => Some(Self::Z),
            _ => None,
        }
    }

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }

    /// The two axes spanning UV space when `self` is the displacement axis.
    #[must_use]
    pub const fn uv_axes(self) -> (Self, Self) {
        match self {
            Self::X => (Self::Y, Self::Z),
            Self::Y => (Self::X, Self::Z),
            Self::Z => (Self::X, Self::Y),
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::X => f.write_str("X"),
            Self::Y => f.write_str("Y"),
            Self::Z => f.write_str("Z"),
        }
    }
}

/// Options for [`bend_along_surface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BendOptions {
    /// Axis whose coordinate becomes the offset along the surface normal.
    pub orientation: Axis,
    /// Interpolation used for the surface splines.
    pub interpolation: Interpolation,
    /// Metric assigning knots to the surface samples.
    pub metric: Metric,
    /// Scale offsets by the ratio between surface and source extents.
    pub auto_scale: bool,
}

impl Default for BendOptions {
    fn default() -> Self {
        Self {
            orientation: Axis::Z,
            interpolation: Interpolation::Cubic,
            metric: Metric::Euclidean,
            auto_scale: false,
        }
    }
}

impl BendOptions {
    #[must_use]
    pub const fn orientation(mut self, axis: Axis) -> Self {
        self.orientation = axis;
        self
    }

    #[must_use]
    pub const fn interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    #[must_use]
    pub const fn metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    #[must_use]
    pub const fn auto_scale(mut self, enabled: bool) -> Self {
        self.auto_scale = enabled;
        self
    }
}

// ============================================================================
// Diagnostics
// ============================================================================

/// Summary of a bend evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BendDiagnostics {
    /// Number of source points that were bent.
    pub point_count: usize,
    /// Shape of the surface sample grid.
    pub surface_shape: (usize, usize),
    /// Factor applied to every normal offset.
    pub scale: f64,
    /// Smallest absolute normal offset.
    pub min_displacement: f64,
    /// Largest absolute normal offset.
    pub max_displacement: f64,
}

// ============================================================================
// UV mapping
// ============================================================================

/// Source grid flattened to the unit square.
#[derive(Debug, Clone, PartialEq)]
pub struct UvMapping {
    /// Extent of the source grid along the U axis.
    pub size_u: f64,
    /// Extent of the source grid along the V axis.
    pub size_v: f64,
    /// `(u, v)` per source point, shaped like the source grid.
    pub coords: Vec<Vec<(f64, f64)>>,
}

/// Projects `grid` onto the UV axes of `orientation` and rescales both
/// coordinates independently to `[0, 1]`.
///
/// # Errors
/// Returns [`BendError::DegenerateSpan`] when the grid has no extent along
/// one of the UV axes.
pub fn uv_coordinates(grid: &PointGrid, orientation: Axis) -> Result<UvMapping, BendError> {
    let (u_axis, v_axis) = orientation.uv_axes();
    let bbox = grid
        .bbox()
        .ok_or(BendError::Grid(GridError::Empty))?;

    let size_u = checked_extent(bbox, u_axis)?;
    let size_v = checked_extent(bbox, v_axis)?;
    let min_u = bbox.min.component(u_axis.index());
    let min_v = bbox.min.component(v_axis.index());

    let coords = grid
        .iter_rows()
        .map(|row| {
            row.iter()
                .map(|p| {
                    (
                        (p.component(u_axis.index()) - min_u) / size_u,
                        (p.component(v_axis.index()) - min_v) / size_v,
                    )
                })
                .collect()
        })
        .collect();

    Ok(UvMapping {
        size_u,
        size_v,
        coords,
    })
}

fn checked_extent(bbox: BBox, axis: Axis) -> Result<f64, BendError> {
    let extent = bbox.extent_along(axis.index());
    if !extent.is_finite() || Tolerance::ZERO_LENGTH.approx_eq_f64(extent, 0.0) {
        return Err(BendError::DegenerateSpan { axis, extent });
    }
    Ok(extent)
}

// ============================================================================
// Bend
// ============================================================================

/// Bends `source` onto the spline surface interpolating `surface`.
///
/// The output grid has the same shape as `source`.
///
/// # Errors
/// Fails when the surface grid cannot be interpolated, when the source grid
/// is flat along a UV axis, or when the surface normal is undefined at one of
/// the mapped parameters. No partial output is produced.
pub fn bend_along_surface(
    source: &PointGrid,
    surface: &PointGrid,
    options: BendOptions,
) -> Result<(PointGrid, BendDiagnostics), BendError> {
    let spline = SplineSurface::new(surface, options.interpolation, options.metric)?;
    let mapping = uv_coordinates(source, options.orientation)?;

    let scale = if options.auto_scale {
        auto_scale_factor(surface, &mapping, options.orientation)
    } else {
        1.0
    };

    let z_index = options.orientation.index();
    let mut min_displacement = f64::INFINITY;
    let mut max_displacement: f64 = 0.0;
    let mut rows = Vec::with_capacity(source.rows());

    for (row_index, (row, uv_row)) in source.iter_rows().zip(&mapping.coords).enumerate() {
        let mut out_row = Vec::with_capacity(row.len());
        for (column, (point, &(u, v))) in row.iter().zip(uv_row).enumerate() {
            let normal = spline
                .normal_at(u, v)
                .ok_or(BendError::DegenerateNormal {
                    row: row_index,
                    column,
                })?;
            let offset = scale * point.component(z_index);
            out_row.push(spline.point_at(u, v) + normal * offset);

            min_displacement = min_displacement.min(offset.abs());
            max_displacement = max_displacement.max(offset.abs());
        }
        rows.push(out_row);
    }

    let bent = PointGrid::new(rows)?;
    let diagnostics = BendDiagnostics {
        point_count: bent.len(),
        surface_shape: surface.shape(),
        scale,
        min_displacement,
        max_displacement,
    };
    log::debug!(
        "bend: {} points onto {}×{} surface, scale {:.6}",
        diagnostics.point_count,
        diagnostics.surface_shape.0,
        diagnostics.surface_shape.1,
        scale
    );

    Ok((bent, diagnostics))
}

fn auto_scale_factor(surface: &PointGrid, mapping: &UvMapping, orientation: Axis) -> f64 {
    let (u_axis, v_axis) = orientation.uv_axes();
    let Some(bbox) = surface.bbox() else {
        return 1.0;
    };
    let scale_u = bbox.extent_along(u_axis.index()) / mapping.size_u;
    let scale_v = bbox.extent_along(v_axis.index()) / mapping.size_v;
    let scale = (scale_u * scale_v).sqrt();
    if scale == 0.0 {
        log::warn!("bend: surface is flat along a UV axis, auto scale collapses offsets to zero");
    }
    scale
}

/// Bends every source grid onto its matching surface.
///
/// Lists of unequal length are matched long-repeat: the shorter list
/// repeats its last element.
///
/// # Errors
/// Returns the first error of any pair, or [`BendError::EmptyBatch`] when
/// either list is empty.
pub fn bend_batch(
    sources: &[PointGrid],
    surfaces: &[PointGrid],
    options: BendOptions,
) -> Result<Vec<(PointGrid, BendDiagnostics)>, BendError> {
    if sources.is_empty() || surfaces.is_empty() {
        return Err(BendError::EmptyBatch {
            sources: sources.len(),
            surfaces: surfaces.len(),
        });
    }

    let count = sources.len().max(surfaces.len());
    let pairs: Vec<(&PointGrid, &PointGrid)> = (0..count)
        .map(|i| {
            (
                &sources[i.min(sources.len() - 1)],
                &surfaces[i.min(surfaces.len() - 1)],
            )
        })
        .collect();

    bend_pairs(pairs, options)
}

#[cfg(feature = "parallel")]
fn bend_pairs(
    pairs: Vec<(&PointGrid, &PointGrid)>,
    options: BendOptions,
) -> Result<Vec<(PointGrid, BendDiagnostics)>, BendError> {
    pairs
        .into_par_iter()
        .map(|(source, surface)| bend_along_surface(source, surface, options))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn bend_pairs(
    pairs: Vec<(&PointGrid, &PointGrid)>,
    options: BendOptions,
) -> Result<Vec<(PointGrid, BendDiagnostics)>, BendError> {
    pairs
        .into_iter()
        .map(|(source, surface)| bend_along_surface(source, surface, options))
        .collect()
}
