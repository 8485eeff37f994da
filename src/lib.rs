#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod components;
pub mod geom;
pub mod graph;

use std::fmt;

use components::ComponentError;
use components::vector_math::VectorOp;
use geom::{
    BendDiagnostics, BendOptions, Point3, PointGrid, SelectOptions, SelectionMasks,
    SolidTopology, Tolerance, bend_batch, select_elements,
};
use graph::value::Value;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

cfg_if::cfg_if! {
    if #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))] {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            console_error_panic_hook::set_once();
            init_logger();
        }
    } else {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    if log::set_logger(&DEFAULT_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {
    // no-op fallback when debug logs are disabled
}

#[cfg(all(feature = "parallel", target_arch = "wasm32"))]
#[wasm_bindgen]
pub async fn initialize_parallel(worker_count: Option<u32>) -> Result<(), JsError> {
    let threads = worker_count
        .map(|count| count.max(1) as usize)
        .or_else(|| {
            std::thread::available_parallelism()
                .map(|value| value.get())
                .ok()
        })
        .unwrap_or(1);

    wasm_bindgen_rayon::init_thread_pool(threads)
        .await
        .map_err(|err| JsError::new(&format!("kon rayon threadpool niet initialiseren: {err}")))
}

#[macro_export]
macro_rules! debug_log {
    ($($t:tt)*) => {{
        #[cfg(feature = "debug_logs")]
        {
            #[cfg(target_arch = "wasm32")]
            {
                ::web_sys::console::log_1(&::wasm_bindgen::JsValue::from_str(&format!($($t)*)));
            }
            #[cfg(not(target_arch = "wasm32"))]
            {
                println!("{}", format!($($t)*));
            }
        }
    }};
}

// ============================================================================
// Request / response types
// ============================================================================

/// One grid (`[[x, y, z], ...]` per row) or a batch of grids.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum GridInput {
    Single(Vec<Vec<[f64; 3]>>),
    Batch(Vec<Vec<Vec<[f64; 3]>>>),
}

impl GridInput {
    fn into_grids(self) -> Result<Vec<PointGrid>, ComponentError> {
        let batch = match self {
            Self::Single(rows) => vec![rows],
            Self::Batch(grids) => grids,
        };
        batch
            .iter()
            .map(|rows| PointGrid::from_arrays(rows).map_err(ComponentError::from))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BendRequest {
    pub vertices: GridInput,
    pub surface: GridInput,
    #[serde(default)]
    pub options: BendOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BendDiagnosticsExport {
    pub point_count: usize,
    pub surface_shape: [usize; 2],
    pub scale: f64,
    pub min_displacement: f64,
    pub max_displacement: f64,
}

impl From<&BendDiagnostics> for BendDiagnosticsExport {
    fn from(diag: &BendDiagnostics) -> Self {
        Self {
            point_count: diag.point_count,
            surface_shape: [diag.surface_shape.0, diag.surface_shape.1],
            scale: diag.scale,
            min_displacement: diag.min_displacement,
            max_displacement: diag.max_displacement,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BendResponse {
    pub vertices: Vec<Vec<Vec<[f64; 3]>>>,
    pub diagnostics: Vec<BendDiagnosticsExport>,
}

/// Solid description accepted by `selectSolidElements`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SolidInput {
    Cuboid {
        min: [f64; 3],
        max: [f64; 3],
    },
    Cylinder {
        base: [f64; 3],
        radius: f64,
        height: f64,
    },
    Polygons {
        vertices: Vec<[f64; 3]>,
        faces: Vec<Vec<usize>>,
    },
}

impl SolidInput {
    fn build(self) -> Result<SolidTopology, ComponentError> {
        let solid = match self {
            Self::Cuboid { min, max } => SolidTopology::cuboid(min.into(), max.into())?,
            Self::Cylinder {
                base,
                radius,
                height,
            } => SolidTopology::cylinder(base.into(), radius, height)?,
            Self::Polygons { vertices, faces } => SolidTopology::from_polygons(
                vertices.into_iter().map(Point3::from).collect(),
                &faces,
                Tolerance::default_geom(),
            )?,
        };
        Ok(solid)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectRequest {
    pub solid: SolidInput,
    #[serde(default)]
    pub options: SelectOptions,
}

/// Operand of `vectorMath`: a number, an `[x, y, z]` triple or a nested list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    Number(f64),
    Triple([f64; 3]),
    List(Vec<Operand>),
}

impl From<Operand> for Value {
    fn from(operand: Operand) -> Self {
        match operand {
            Operand::Number(n) => Value::Number(n),
            Operand::Triple(v) => Value::Vector(v),
            Operand::List(items) => Value::List(items.into_iter().map(Value::from).collect()),
        }
    }
}

impl TryFrom<&Value> for Operand {
    type Error = ComponentError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Number(n) => Ok(Self::Number(*n)),
            Value::Point(v) | Value::Vector(v) => Ok(Self::Triple(*v)),
            Value::List(items) => items
                .iter()
                .map(Self::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::List),
            other => Err(ComponentError::new(format!(
                "kan {} niet als operand teruggeven",
                other.kind()
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorMathRequest {
    pub op: String,
    pub a: Operand,
    #[serde(default)]
    pub b: Option<Operand>,
}

// ============================================================================
// Native entry points
// ============================================================================

/// Bends every source grid onto its surface grid (long-repeat).
pub fn run_bend(request: BendRequest) -> Result<BendResponse, ComponentError> {
    let sources = request.vertices.into_grids()?;
    let surfaces = request.surface.into_grids()?;
    let results = bend_batch(&sources, &surfaces, request.options)?;

    Ok(BendResponse {
        vertices: results.iter().map(|(grid, _)| grid.to_arrays()).collect(),
        diagnostics: results
            .iter()
            .map(|(_, diag)| BendDiagnosticsExport::from(diag))
            .collect(),
    })
}

pub fn run_select(request: SelectRequest) -> Result<SelectionMasks, ComponentError> {
    let solid = request.solid.build()?;
    Ok(select_elements(&solid, &request.options)?)
}

pub fn run_vector_math(request: VectorMathRequest) -> Result<Operand, ComponentError> {
    let op = VectorOp::from_name(&request.op)
        .ok_or_else(|| ComponentError::new(format!("onbekende bewerking '{}'", request.op)))?;
    let a = Value::from(request.a);
    let b = request.b.map(Value::from);
    let result = op.apply(&a, b.as_ref())?;
    Operand::try_from(&result)
}

// ============================================================================
// JS boundary
// ============================================================================

#[wasm_bindgen(js_name = bendAlongSurface)]
pub fn bend_along_surface(request: JsValue) -> Result<JsValue, JsValue> {
    let request: BendRequest = serde_wasm_bindgen::from_value(request).map_err(to_js_error)?;
    let response = run_bend(request).map_err(to_js_error)?;
    debug_log!("bendAlongSurface: {} grids", response.vertices.len());
    serde_wasm_bindgen::to_value(&response).map_err(to_js_error)
}

#[wasm_bindgen(js_name = selectSolidElements)]
pub fn select_solid_elements(request: JsValue) -> Result<JsValue, JsValue> {
    let request: SelectRequest = serde_wasm_bindgen::from_value(request).map_err(to_js_error)?;
    let masks = run_select(request).map_err(to_js_error)?;
    debug_log!(
        "selectSolidElements: {}/{}/{} masks",
        masks.vertices.len(),
        masks.edges.len(),
        masks.faces.len()
    );
    serde_wasm_bindgen::to_value(&masks).map_err(to_js_error)
}

#[wasm_bindgen(js_name = vectorMath)]
pub fn vector_math(request: JsValue) -> Result<JsValue, JsValue> {
    let request: VectorMathRequest =
        serde_wasm_bindgen::from_value(request).map_err(to_js_error)?;
    let result = run_vector_math(request).map_err(to_js_error)?;
    serde_wasm_bindgen::to_value(&result).map_err(to_js_error)
}

fn to_js_error<E: fmt::Display>(error: E) -> JsValue {
    js_error(&error.to_string())
}

fn js_error(message: &str) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    {
        JsError::new(message).into()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
        JsValue::NULL
    }
}
