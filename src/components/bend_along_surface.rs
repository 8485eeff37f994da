//! Bend Along Surface component: buigt puntengrids langs een
//! spline-oppervlak.
//!
//! Ingangen: `Vertices` (grid of lijst van grids) en `Surface` (grid of
//! lijst van grids). Parameters: `Mode`, `Metric`, `Orientation` en
//! `AutoScale`. Uitgang `Vertices` is altijd een lijst van grids.

use std::collections::BTreeMap;

use crate::geom::{Axis, BendOptions, Interpolation, Metric, bend_batch};
use crate::graph::node::MetaMap;
use crate::graph::value::Value;

use super::coerce::{coerce_grids, meta_boolean, meta_choice};
use super::{Component, ComponentError, ComponentResult};

const PIN_INPUT_VERTICES: &str = "Vertices";
const PIN_INPUT_SURFACE: &str = "Surface";
const PIN_OUTPUT_VERTICES: &str = "Vertices";

/// Namen waaronder de component geregistreerd wordt.
pub const NAMES: &[&str] = &["Bend Along Surface", "BendAlongSurface", "Bend"];

/// Markerstruct voor de component.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ComponentImpl;

impl Component for ComponentImpl {
    fn evaluate(&self, inputs: &[Value], meta: &MetaMap) -> ComponentResult {
        let vertices = inputs
            .first()
            .ok_or(ComponentError::MissingInput(PIN_INPUT_VERTICES))?;
        let surface = inputs
            .get(1)
            .ok_or(ComponentError::MissingInput(PIN_INPUT_SURFACE))?;

        let sources = coerce_grids(vertices)?;
        let surfaces = coerce_grids(surface)?;
        let options = parse_options(meta)?;

        let results = bend_batch(&sources, &surfaces, options)?;
        let bent: Vec<Value> = results
            .iter()
            .map(|(grid, diagnostics)| {
                log::debug!(
                    "bend: {} punten, schaal {:.4}, verplaatsing {:.4}..{:.4}",
                    diagnostics.point_count,
                    diagnostics.scale,
                    diagnostics.min_displacement,
                    diagnostics.max_displacement
                );
                Value::from(grid)
            })
            .collect();

        let mut outputs = BTreeMap::new();
        outputs.insert(PIN_OUTPUT_VERTICES.to_owned(), Value::List(bent));
        Ok(outputs)
    }
}

fn parse_options(meta: &MetaMap) -> Result<BendOptions, ComponentError> {
    let defaults = BendOptions::default();
    Ok(defaults
        .interpolation(meta_choice(
            meta,
            "Mode",
            defaults.interpolation,
            Interpolation::from_name,
        )?)
        .metric(meta_choice(meta, "Metric", defaults.metric, Metric::from_name)?)
        .orientation(meta_choice(
            meta,
            "Orientation",
            defaults.orientation,
            Axis::from_name,
        )?)
        .auto_scale(meta_boolean(meta, "AutoScale", defaults.auto_scale)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::MetaValue;

    fn grid_value(rows: usize, columns: usize, z: f64) -> Value {
        Value::List(
            (0..rows)
                .map(|i| {
                    Value::List(
                        (0..columns)
                            .map(|j| {
                                Value::Point([
                                    i as f64 / (rows - 1) as f64,
                                    j as f64 / (columns - 1) as f64,
                                    z,
                                ])
                            })
                            .collect(),
                    )
                })
                .collect(),
        )
    }

    #[test]
    fn flat_surface_keeps_points() {
        let outputs = ComponentImpl
            .evaluate(&[grid_value(2, 3, 0.5), grid_value(3, 3, 0.0)], &MetaMap::new())
            .unwrap();
        let bent = outputs[PIN_OUTPUT_VERTICES].expect_list().unwrap();
        assert_eq!(bent.len(), 1);
        let expected = grid_value(2, 3, 0.5);
        let first = &bent[0].expect_list().unwrap()[1].expect_list().unwrap()[2];
        let want = &expected.expect_list().unwrap()[1].expect_list().unwrap()[2];
        let [a, b] = [first.expect_point().unwrap(), want.expect_point().unwrap()];
        for k in 0..3 {
            assert!((a[k] - b[k]).abs() < 1e-9);
        }
    }

    #[test]
    fn options_from_meta() {
        let mut meta = MetaMap::new();
        meta.insert("mode".to_owned(), MetaValue::from("LIN"));
        meta.insert("Metric".to_owned(), MetaValue::from("POINTS"));
        meta.insert("Orientation".to_owned(), MetaValue::from("x"));
        meta.insert("AutoScale".to_owned(), MetaValue::from(true));
        let options = parse_options(&meta).unwrap();
        assert_eq!(options.interpolation, Interpolation::Linear);
        assert_eq!(options.metric, Metric::Points);
        assert_eq!(options.orientation, Axis::X);
        assert!(options.auto_scale);
    }

    fn triple_grid(rows: usize, columns: usize, z: f64) -> Value {
        Value::List(
            (0..rows)
                .map(|i| {
                    Value::List(
                        (0..columns)
                            .map(|j| {
                                Value::List(vec![
                                    Value::Number(i as f64 / (rows - 1) as f64),
                                    Value::Number(j as f64 / (columns - 1) as f64),
                                    Value::Number(z),
                                ])
                            })
                            .collect(),
                    )
                })
                .collect(),
        )
    }

    #[test]
    fn number_triple_grids_are_points() {
        let outputs = ComponentImpl
            .evaluate(&[triple_grid(2, 2, 1.0), triple_grid(3, 3, 0.0)], &MetaMap::new())
            .unwrap();
        let bent = outputs[PIN_OUTPUT_VERTICES].expect_list().unwrap();
        assert_eq!(bent.len(), 1);
        let corner = bent[0].expect_list().unwrap()[1].expect_list().unwrap()[1]
            .expect_point()
            .unwrap();
        assert!((corner[0] - 1.0).abs() < 1e-9);
        assert!((corner[1] - 1.0).abs() < 1e-9);
        assert!((corner[2] - 1.0).abs() < 1e-9);

        let batch = Value::List(vec![triple_grid(2, 2, 1.0), triple_grid(3, 2, 0.5)]);
        let outputs = ComponentImpl
            .evaluate(&[batch, triple_grid(3, 3, 0.0)], &MetaMap::new())
            .unwrap();
        assert_eq!(outputs[PIN_OUTPUT_VERTICES].expect_list().unwrap().len(), 2);
    }

    #[test]
    fn missing_surface_is_reported() {
        let err = ComponentImpl
            .evaluate(&[grid_value(2, 2, 0.0)], &MetaMap::new())
            .unwrap_err();
        assert_eq!(err, ComponentError::MissingInput("Surface"));
    }
}
