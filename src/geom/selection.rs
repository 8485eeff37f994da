//! Selecting vertices, edges or faces of a solid by geometric criteria.
//!
//! One element kind is tested directly against the criterion. The masks of
//! the other two kinds are derived by incidence: an element is selected when
//! it touches at least one directly selected element.
//!
//! Percent-based criteria (side, normal, direction) measure one scalar per
//! sample and keep the top `percent` of the measured range:
//!
//! ```text
//! threshold = max - percent / 100 * (max - min)
//! ```
//!
//! so `percent = 0` keeps only the maximal elements and `percent = 100`
//! keeps everything. Distance criteria (sphere, plane, cylinder) keep samples
//! strictly closer than `radius`. For edges and faces every sample must pass,
//! or any sample when `include_partial` is set.

use serde::{Deserialize, Serialize};

use super::core::{Point3, Tolerance, Vec3};
use super::fit::{LineEquation, PlaneEquation, linear_approximation};
use super::topology::{SolidTopology, TopologyError};

/// Kind of solid element a selection is computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementKind {
    #[default]
    Vertices,
    Edges,
    Faces,
}

impl ElementKind {
    pub const ALL: [Self; 3] = [Self::Vertices, Self::Edges, Self::Faces];

    /// Parses `"VERTS"`, `"EDGES"`, `"FACES"` and their long forms.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "verts" | "vertices" | "vertex" => Some(Self::Vertices),
            "edges" | "edge" => Some(Self::Edges),
            "faces" | "face" => Some(Self::Faces),
            _ => None,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Vertices => "Vertices",
            Self::Edges => "Edges",
            Self::Faces => "Faces",
        }
    }

    /// Criteria that can be evaluated for this kind.
    #[must_use]
    pub const fn supported_criteria(self) -> &'static [SelectionCriterion] {
        use SelectionCriterion::{Cylinder, Direction, Normal, Plane, Side, Sphere};
        match self {
            Self::Vertices => &[Side, Sphere, Plane, Cylinder],
            Self::Edges => &[Side, Sphere, Plane, Cylinder, Direction],
            Self::Faces => &[Side, Normal, Sphere, Plane, Cylinder],
        }
    }

    #[must_use]
    pub fn supports(self, criterion: SelectionCriterion) -> bool {
        self.supported_criteria().contains(&criterion)
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Geometric test applied to the samples of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectionCriterion {
    /// Extent along `direction`.
    #[default]
    Side,
    /// Agreement of the face normal with `direction`.
    Normal,
    /// Distance to `center`.
    Sphere,
    /// Distance to the plane through `center` with normal `direction`.
    Plane,
    /// Distance to the axis through `center` along `direction`.
    Cylinder,
    /// Alignment of the edge with `direction`.
    Direction,
}

impl SelectionCriterion {
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "side" => Some(Self::Side),
            "normal" => Some(Self::Normal),
            "sphere" => Some(Self::Sphere),
            "plane" => Some(Self::Plane),
            "cylinder" => Some(Self::Cylinder),
            "direction" => Some(Self::Direction),
            _ => None,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Side => "Side",
            Self::Normal => "Normal",
            Self::Sphere => "Sphere",
            Self::Plane => "Plane",
            Self::Cylinder => "Cylinder",
            Self::Direction => "Direction",
        }
    }

    const fn uses_direction(self) -> bool {
        !matches!(self, Self::Sphere)
    }

    const fn uses_percent(self) -> bool {
        matches!(self, Self::Side | Self::Normal | Self::Direction)
    }
}

impl std::fmt::Display for SelectionCriterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SelectionError {
    #[error("criterion {criterion} is not available for {kind}")]
    UnsupportedCriterion {
        kind: ElementKind,
        criterion: SelectionCriterion,
    },
    #[error("selection direction must be finite and non-zero")]
    InvalidDirection,
    #[error("selection center must be finite")]
    InvalidCenter,
    #[error("percent must be within 0..=100, got {percent}")]
    InvalidPercent { percent: f64 },
    #[error("radius must be finite and non-negative, got {radius}")]
    InvalidRadius { radius: f64 },
    #[error("{kind} {index} has no defined {criterion} fit")]
    DegenerateElement {
        kind: ElementKind,
        criterion: SelectionCriterion,
        index: usize,
    },
    #[error(transparent)]
    Topology(#[from] TopologyError),
}

/// Parameters of [`select_elements`].
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SelectOptions {
    pub kind: ElementKind,
    pub criterion: SelectionCriterion,
    pub direction: Vec3,
    pub center: Point3,
    pub percent: f64,
    pub radius: f64,
    /// Maximum chord deviation when sampling curved edges.
    pub precision: f64,
    /// Accept edges and faces with at least one passing sample.
    pub include_partial: bool,
}

impl Default for SelectOptions {
    fn default() -> Self {
        Self {
            kind: ElementKind::Vertices,
            criterion: SelectionCriterion::Side,
            direction: Vec3::Z,
            center: Point3::ORIGIN,
            percent: 1.0,
            radius: 1.0,
            precision: 0.01,
            include_partial: false,
        }
    }
}

impl SelectOptions {
    #[must_use]
    pub fn new(kind: ElementKind, criterion: SelectionCriterion) -> Self {
        Self {
            kind,
            criterion,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn direction(mut self, direction: Vec3) -> Self {
        self.direction = direction;
        self
    }

    #[must_use]
    pub const fn center(mut self, center: Point3) -> Self {
        self.center = center;
        self
    }

    #[must_use]
    pub const fn percent(mut self, percent: f64) -> Self {
        self.percent = percent;
        self
    }

    #[must_use]
    pub const fn radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    #[must_use]
    pub const fn precision(mut self, precision: f64) -> Self {
        self.precision = precision;
        self
    }

    #[must_use]
    pub const fn include_partial(mut self, include: bool) -> Self {
        self.include_partial = include;
        self
    }
}

/// Vertex, edge and face masks aligned with the topology lists.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionMasks {
    pub vertices: Vec<bool>,
    pub edges: Vec<bool>,
    pub faces: Vec<bool>,
}

impl SelectionMasks {
    #[must_use]
    pub fn mask(&self, kind: ElementKind) -> &[bool] {
        match kind {
            ElementKind::Vertices => &self.vertices,
            ElementKind::Edges => &self.edges,
            ElementKind::Faces => &self.faces,
        }
    }

    #[must_use]
    pub fn count(&self, kind: ElementKind) -> usize {
        self.mask(kind).iter().filter(|&&selected| selected).count()
    }
}

/// `max - percent / 100 * (max - min)` over `values`, or `max` for a
/// constant set. `None` for an empty set.
#[must_use]
pub fn percent_threshold(values: &[f64], percent: f64) -> Option<f64> {
    let (min, max) = values
        .iter()
        .fold(None, |acc: Option<(f64, f64)>, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })?;
    if max <= min {
        return Some(max);
    }
    Some(max - percent * (max - min) * 0.01)
}

/// Evaluates `options` on `topology` and derives the two other masks.
///
/// # Errors
/// Fails when the criterion does not apply to the element kind, when a
/// parameter used by the criterion is out of range, or when a sampled
/// element has no defined fit.
pub fn select_elements(
    topology: &SolidTopology,
    options: &SelectOptions,
) -> Result<SelectionMasks, SelectionError> {
    validate(options)?;

    let samples = element_samples(topology, options)?;
    let primary: Vec<bool> = match options.criterion {
        SelectionCriterion::Side => {
            let direction = unit_direction(options)?;
            let values: Vec<Vec<f64>> = samples
                .points
                .iter()
                .map(|points| points.iter().map(|p| p.to_vec3().dot(direction)).collect())
                .collect();
            let flat: Vec<f64> = values.iter().flatten().copied().collect();
            let test = ThresholdTest::new(&flat, options.percent);
            values
                .iter()
                .map(|element| aggregate(options, element.iter().map(|&v| test.passes(v))))
                .collect()
        }
        SelectionCriterion::Normal => {
            let direction = unit_direction(options)?;
            let values = face_normal_scores(&samples, direction)?;
            let test = ThresholdTest::new(&values, options.percent);
            values.iter().map(|&v| test.passes(v)).collect()
        }
        SelectionCriterion::Direction => {
            let direction = unit_direction(options)?;
            let values = samples
                .points
                .iter()
                .enumerate()
                .map(|(index, points)| {
                    linear_approximation(points)
                        .and_then(|fit| fit.most_similar_line())
                        .map(|line| direction.dot(line.direction).abs())
                        .ok_or(SelectionError::DegenerateElement {
                            kind: options.kind,
                            criterion: options.criterion,
                            index,
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            let test = ThresholdTest::new(&values, options.percent);
            values.iter().map(|&v| test.passes(v)).collect()
        }
        SelectionCriterion::Sphere => {
            let radius_sq = options.radius * options.radius;
            distance_mask(&samples, options, |p| {
                p.distance_squared_to(options.center) < radius_sq
            })
        }
        SelectionCriterion::Plane => {
            let plane = PlaneEquation::from_normal_and_point(options.direction, options.center)
                .ok_or(SelectionError::InvalidDirection)?;
            distance_mask(&samples, options, |p| {
                plane.distance_to_point(p) < options.radius
            })
        }
        SelectionCriterion::Cylinder => {
            let axis = LineEquation::from_direction_and_point(options.direction, options.center)
                .ok_or(SelectionError::InvalidDirection)?;
            distance_mask(&samples, options, |p| {
                axis.distance_to_point(p) < options.radius
            })
        }
    };

    let masks = match options.kind {
        ElementKind::Vertices => SelectionMasks {
            edges: topology.edges_by_vertices_mask(&primary)?,
            faces: topology.faces_by_vertices_mask(&primary)?,
            vertices: primary,
        },
        ElementKind::Edges => SelectionMasks {
            vertices: topology.vertices_by_edges_mask(&primary)?,
            faces: topology.faces_by_edges_mask(&primary)?,
            edges: primary,
        },
        ElementKind::Faces => SelectionMasks {
            vertices: topology.vertices_by_faces_mask(&primary)?,
            edges: topology.edges_by_faces_mask(&primary)?,
            faces: primary,
        },
    };

    log::debug!(
        "select {} by {}: {} vertices, {} edges, {} faces",
        options.kind,
        options.criterion,
        masks.count(ElementKind::Vertices),
        masks.count(ElementKind::Edges),
        masks.count(ElementKind::Faces)
    );

    Ok(masks)
}

fn validate(options: &SelectOptions) -> Result<(), SelectionError> {
    if !options.kind.supports(options.criterion) {
        return Err(SelectionError::UnsupportedCriterion {
            kind: options.kind,
            criterion: options.criterion,
        });
    }
    if options.criterion.uses_direction() {
        unit_direction(options)?;
    }
    if options.criterion.uses_percent() {
        if !(options.percent.is_finite() && (0.0..=100.0).contains(&options.percent)) {
            return Err(SelectionError::InvalidPercent {
                percent: options.percent,
            });
        }
    } else {
        if !(options.radius.is_finite() && options.radius >= 0.0) {
            return Err(SelectionError::InvalidRadius {
                radius: options.radius,
            });
        }
        if !options.center.is_finite() {
            return Err(SelectionError::InvalidCenter);
        }
    }
    Ok(())
}

fn unit_direction(options: &SelectOptions) -> Result<Vec3, SelectionError> {
    if !options.direction.is_finite() {
        return Err(SelectionError::InvalidDirection);
    }
    options
        .direction
        .normalized()
        .ok_or(SelectionError::InvalidDirection)
}

struct ElementSamples {
    points: Vec<Vec<Point3>>,
    loop_normals: Vec<Option<Vec3>>,
}

fn element_samples(
    topology: &SolidTopology,
    options: &SelectOptions,
) -> Result<ElementSamples, SelectionError> {
    Ok(match options.kind {
        ElementKind::Vertices => ElementSamples {
            points: topology.vertices().iter().map(|&v| vec![v]).collect(),
            loop_normals: Vec::new(),
        },
        ElementKind::Edges => ElementSamples {
            points: topology.tessellate(options.precision)?.edges,
            loop_normals: Vec::new(),
        },
        ElementKind::Faces => {
            let tessellation = topology.tessellate(options.precision)?;
            ElementSamples {
                points: tessellation.faces,
                loop_normals: tessellation.face_loop_normals,
            }
        }
    })
}

// Fitted plane normal, flipped to agree with the face loop orientation.
fn face_normal_scores(samples: &ElementSamples, direction: Vec3) -> Result<Vec<f64>, SelectionError> {
    samples
        .points
        .iter()
        .enumerate()
        .map(|(index, points)| {
            let fit = linear_approximation(points).ok_or(SelectionError::DegenerateElement {
                kind: ElementKind::Faces,
                criterion: SelectionCriterion::Normal,
                index,
            })?;
            let mut normal = fit.most_similar_plane().normal;
            match samples.loop_normals.get(index).copied().flatten() {
                Some(reference) if normal.dot(reference) < 0.0 => normal = -normal,
                Some(_) => {}
                None => log::warn!("face {index} has no loop orientation, keeping fitted normal"),
            }
            Ok(direction.dot(normal))
        })
        .collect()
}

fn distance_mask(
    samples: &ElementSamples,
    options: &SelectOptions,
    inside: impl Fn(Point3) -> bool,
) -> Vec<bool> {
    samples
        .points
        .iter()
        .map(|points| aggregate(options, points.iter().map(|&p| inside(p))))
        .collect()
}

fn aggregate(options: &SelectOptions, mut results: impl Iterator<Item = bool>) -> bool {
    if options.include_partial {
        results.any(|passed| passed)
    } else {
        results.all(|passed| passed)
    }
}

struct ThresholdTest {
    threshold: f64,
    slack: f64,
}

impl ThresholdTest {
    fn new(values: &[f64], percent: f64) -> Self {
        let threshold = percent_threshold(values, percent).unwrap_or(f64::INFINITY);
        let magnitude = values.iter().fold(1.0_f64, |acc, v| acc.max(v.abs()));
        Self {
            threshold,
            slack: Tolerance::DEFAULT.relative_to(magnitude),
        }
    }

    fn passes(&self, value: f64) -> bool {
        value >= self.threshold - self.slack
    }
}
