mod bend;
mod core;
mod fit;
mod grid;
mod noise;
mod selection;
mod spline;
mod spline_surface;
mod surface;
mod topology;

pub use bend::{
    Axis, BendDiagnostics, BendError, BendOptions, UvMapping, bend_along_surface, bend_batch,
    uv_coordinates,
};
pub use core::{BBox, Point3, Tolerance, Vec3};
pub use fit::{
    FittedLine, FittedPlane, LineEquation, LinearApproximation, PlaneEquation,
    linear_approximation,
};
pub use grid::{GridError, PointGrid};
pub use noise::{cell_noise, cell_noise_vector};
pub use selection::{
    ElementKind, SelectOptions, SelectionCriterion, SelectionError, SelectionMasks,
    percent_threshold, select_elements,
};
pub use spline::{Interpolation, MIN_SPLINE_POINTS, Metric, Spline3, SplineError, metric_knots};
pub use spline_surface::{SplineSurface, SplineSurfaceError, SurfaceDirection};
pub use surface::Surface;
pub use topology::{
    EdgeCurve, SolidTopology, Tessellation, TopoEdge, TopoFace, TopologyError, newell_normal,
};
