//! Select Solid Elements component.
//!
//! Alle ingangen mogen een losse waarde of een lijst zijn; lijsten worden
//! long-repeat gekoppeld (de kortste lijst herhaalt zijn laatste element).
//! Elke uitgang bevat één masker per gekoppelde combinatie.

use std::collections::BTreeMap;

use crate::geom::{ElementKind, SelectOptions, SelectionCriterion, select_elements};
use crate::graph::node::MetaMap;
use crate::graph::value::Value;

use super::coerce::{
    as_items, coerce_number, coerce_point, coerce_solid, coerce_vector, meta_boolean,
    meta_choice,
};
use super::{Component, ComponentError, ComponentResult};

const PIN_INPUT_SOLID: &str = "Solid";
const PIN_OUTPUT_VERTICES: &str = "VerticesMask";
const PIN_OUTPUT_EDGES: &str = "EdgesMask";
const PIN_OUTPUT_FACES: &str = "FacesMask";

/// Namen waaronder de component geregistreerd wordt.
pub const NAMES: &[&str] = &["Select Solid Elements", "SolidSelect", "Select Solid"];

/// Markerstruct voor de component.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ComponentImpl;

impl Component for ComponentImpl {
    fn evaluate(&self, inputs: &[Value], meta: &MetaMap) -> ComponentResult {
        let solids = inputs
            .first()
            .map(as_items)
            .filter(|items| !items.is_empty())
            .ok_or(ComponentError::MissingInput(PIN_INPUT_SOLID))?;

        let base = parse_options(meta)?;
        let directions = optional_items(inputs, 1);
        let centers = optional_items(inputs, 2);
        let percents = optional_items(inputs, 3);
        let radii = optional_items(inputs, 4);
        let precisions = optional_items(inputs, 5);

        let count = [
            solids.len(),
            directions.len(),
            centers.len(),
            percents.len(),
            radii.len(),
            precisions.len(),
        ]
        .into_iter()
        .max()
        .unwrap_or(1);

        let mut vertices = Vec::with_capacity(count);
        let mut edges = Vec::with_capacity(count);
        let mut faces = Vec::with_capacity(count);

        for index in 0..count {
            let solid = repeat_last(&solids, index)
                .ok_or(ComponentError::MissingInput(PIN_INPUT_SOLID))
                .and_then(coerce_solid)?;
            let mut options = base;
            if let Some(value) = repeat_last(&directions, index) {
                options = options.direction(coerce_vector(value)?);
            }
            if let Some(value) = repeat_last(&centers, index) {
                options = options.center(coerce_point(value)?);
            }
            if let Some(value) = repeat_last(&percents, index) {
                options = options.percent(coerce_number(value)?);
            }
            if let Some(value) = repeat_last(&radii, index) {
                options = options.radius(coerce_number(value)?);
            }
            if let Some(value) = repeat_last(&precisions, index) {
                options = options.precision(coerce_number(value)?);
            }

            let masks = select_elements(solid, &options)?;
            vertices.push(Value::from(masks.vertices));
            edges.push(Value::from(masks.edges));
            faces.push(Value::from(masks.faces));
        }

        let mut outputs = BTreeMap::new();
        outputs.insert(PIN_OUTPUT_VERTICES.to_owned(), Value::List(vertices));
        outputs.insert(PIN_OUTPUT_EDGES.to_owned(), Value::List(edges));
        outputs.insert(PIN_OUTPUT_FACES.to_owned(), Value::List(faces));
        Ok(outputs)
    }
}

fn parse_options(meta: &MetaMap) -> Result<SelectOptions, ComponentError> {
    let kind = meta_choice(meta, "Element", ElementKind::Vertices, ElementKind::from_name)?;
    let criterion = meta_choice(
        meta,
        "Criteria",
        SelectionCriterion::Side,
        SelectionCriterion::from_name,
    )?;
    let defaults = SelectOptions::new(kind, criterion);
    Ok(defaults.include_partial(meta_boolean(meta, "IncludePartial", defaults.include_partial)?))
}

/// Losse waarde of lijst; een lege lijst of een `Point`/`Vector` zonder
/// lijst telt als één element.
fn optional_items(inputs: &[Value], index: usize) -> Vec<&Value> {
    match inputs.get(index) {
        None => Vec::new(),
        Some(Value::List(values)) if is_number_triple(values) => vec![&inputs[index]],
        Some(value) => as_items(value),
    }
}

fn is_number_triple(values: &[Value]) -> bool {
    values.len() == 3 && values.iter().all(|v| matches!(v, Value::Number(_)))
}

fn repeat_last<'a>(items: &[&'a Value], index: usize) -> Option<&'a Value> {
    items.get(index).or_else(|| items.last()).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Point3, SolidTopology};
    use crate::graph::node::MetaValue;

    fn cube() -> Value {
        Value::from(
            SolidTopology::cuboid(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0))
                .unwrap(),
        )
    }

    fn count_true(value: &Value) -> usize {
        value
            .expect_list()
            .unwrap()
            .iter()
            .filter(|v| v.expect_boolean().unwrap())
            .count()
    }

    #[test]
    fn top_face_by_side() {
        let mut meta = MetaMap::new();
        meta.insert("Element".to_owned(), MetaValue::from("FACES"));
        meta.insert("Criteria".to_owned(), MetaValue::from("SIDE"));
        let inputs = [cube(), Value::Vector([0.0, 0.0, 1.0])];

        let outputs = ComponentImpl.evaluate(&inputs, &meta).unwrap();
        let faces = outputs[PIN_OUTPUT_FACES].expect_list().unwrap();
        assert_eq!(faces.len(), 1);
        assert_eq!(count_true(&faces[0]), 1);
        assert_eq!(count_true(&outputs[PIN_OUTPUT_VERTICES].expect_list().unwrap()[0]), 4);
    }

    #[test]
    fn radius_list_repeats_solid() {
        let mut meta = MetaMap::new();
        meta.insert("Criteria".to_owned(), MetaValue::from("SPHERE"));
        let inputs = [
            cube(),
            Value::List(vec![]),
            Value::Point([1.0, 1.0, 1.0]),
            Value::List(vec![]),
            Value::List(vec![Value::Number(0.5), Value::Number(3.0), Value::Number(4.0)]),
        ];

        let outputs = ComponentImpl.evaluate(&inputs, &meta).unwrap();
        let vertices = outputs[PIN_OUTPUT_VERTICES].expect_list().unwrap();
        assert_eq!(vertices.len(), 3);
        assert_eq!(count_true(&vertices[0]), 1);
        assert_eq!(count_true(&vertices[2]), 8);
    }

    #[test]
    fn unsupported_criterion_propagates() {
        let mut meta = MetaMap::new();
        meta.insert("Element".to_owned(), MetaValue::from("VERTS"));
        meta.insert("Criteria".to_owned(), MetaValue::from("NORMAL"));
        let err = ComponentImpl.evaluate(&[cube()], &meta).unwrap_err();
        assert!(err.message().starts_with("Selectie mislukt"));
    }

    #[test]
    fn missing_solid_is_reported() {
        let err = ComponentImpl.evaluate(&[], &MetaMap::new()).unwrap_err();
        assert_eq!(err, ComponentError::MissingInput("Solid"));
    }
}
