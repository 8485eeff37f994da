//! Hulpfuncties voor het converteren van `Value`-types.

use crate::geom::{Point3, PointGrid, SolidTopology, Vec3};
use crate::graph::node::{MetaLookupExt, MetaMap, MetaValue};
use crate::graph::value::Value;

use super::ComponentError;

pub fn coerce_number(value: &Value) -> Result<f64, ComponentError> {
    match value {
        Value::Number(n) => Ok(*n),
        Value::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Text(s) => s.trim().parse().map_err(|_| {
            ComponentError::new(format!("Kon tekst '{}' niet naar een getal converteren", s))
        }),
        Value::List(l) if l.len() == 1 => coerce_number(&l[0]),
        other => Err(ComponentError::new(format!(
            "Verwachtte een getal, kreeg {}",
            other.kind()
        ))),
    }
}

/// Punten en vectoren zijn onderling uitwisselbaar; een lijst van drie
/// getallen wordt ook als coördinaat geaccepteerd.
pub fn coerce_triple(value: &Value) -> Result<[f64; 3], ComponentError> {
    match value {
        Value::Point(p) | Value::Vector(p) => Ok(*p),
        Value::List(l) if is_number_triple(l) => {
            Ok([
                coerce_number(&l[0])?,
                coerce_number(&l[1])?,
                coerce_number(&l[2])?,
            ])
        }
        Value::List(l) if l.len() == 1 => coerce_triple(&l[0]),
        other => Err(ComponentError::new(format!(
            "Verwachtte een punt of vector, kreeg {}",
            other.kind()
        ))),
    }
}

fn is_number_triple(values: &[Value]) -> bool {
    values.len() == 3 && values.iter().all(|v| matches!(v, Value::Number(_)))
}

/// Nesting-diepte waarin een lijst van drie getallen als punt telt.
fn point_depth(value: &Value) -> usize {
    match value {
        Value::List(values) if is_number_triple(values) => 0,
        Value::List(values) => 1 + values.iter().map(point_depth).max().unwrap_or(0),
        _ => 0,
    }
}

pub fn coerce_point(value: &Value) -> Result<Point3, ComponentError> {
    coerce_triple(value).map(Point3::from)
}

pub fn coerce_vector(value: &Value) -> Result<Vec3, ComponentError> {
    coerce_triple(value).map(Vec3::from)
}

pub fn coerce_solid(value: &Value) -> Result<&SolidTopology, ComponentError> {
    match value {
        Value::Solid(solid) => Ok(solid),
        Value::List(l) if l.len() == 1 => coerce_solid(&l[0]),
        other => Err(ComponentError::new(format!(
            "Verwachtte een solid, kreeg {}",
            other.kind()
        ))),
    }
}

/// Leest een lijst van rijen met punten als rechthoekig grid.
pub fn coerce_grid(value: &Value) -> Result<PointGrid, ComponentError> {
    let rows = value
        .expect_list()
        .map_err(|err| ComponentError::new(format!("Verwachtte een puntengrid: {err}")))?;
    let rows = rows
        .iter()
        .map(|row| {
            row.expect_list()
                .map_err(|err| ComponentError::new(format!("Verwachtte een rij punten: {err}")))?
                .iter()
                .map(coerce_point)
                .collect::<Result<Vec<_>, _>>()
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(PointGrid::new(rows)?)
}

/// Accepteert een los grid (diepte 2) of een lijst van grids (diepte 3).
pub fn coerce_grids(value: &Value) -> Result<Vec<PointGrid>, ComponentError> {
    match point_depth(value) {
        2 => Ok(vec![coerce_grid(value)?]),
        3 => value
            .expect_list()
            .map_err(|err| ComponentError::new(err.to_string()))?
            .iter()
            .map(coerce_grid)
            .collect(),
        depth => Err(ComponentError::new(format!(
            "Verwachtte een grid of lijst van grids, kreeg nesting-diepte {depth}"
        ))),
    }
}

/// Een losse waarde of de elementen van een lijst; de basis voor
/// long-repeat matching van ingangen.
#[must_use]
pub fn as_items(value: &Value) -> Vec<&Value> {
    match value {
        Value::List(values) => values.iter().collect(),
        other => vec![other],
    }
}

/// Leest een booleaanse parameter; ontbreekt de sleutel dan geldt `default`.
pub fn meta_boolean(meta: &MetaMap, key: &str, default: bool) -> Result<bool, ComponentError> {
    match meta.get_normalized(key) {
        None => Ok(default),
        Some(value) => value.as_boolean().ok_or_else(|| {
            ComponentError::new(format!("Parameter '{key}' verwacht een booleaanse waarde"))
        }),
    }
}

/// Leest een keuzeparameter via `parse`; ontbrekend geeft `default`.
pub fn meta_choice<T>(
    meta: &MetaMap,
    key: &str,
    default: T,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T, ComponentError> {
    match meta.get_normalized(key) {
        None => Ok(default),
        Some(MetaValue::Text(name)) => parse(name).ok_or_else(|| {
            ComponentError::new(format!("Onbekende waarde '{name}' voor parameter '{key}'"))
        }),
        Some(other) => Err(ComponentError::new(format!(
            "Parameter '{key}' verwacht tekst, kreeg {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triple_accepts_points_vectors_and_number_lists() {
        assert_eq!(coerce_triple(&Value::Vector([1.0, 2.0, 3.0])).unwrap(), [1.0, 2.0, 3.0]);
        let list = Value::List(vec![Value::Number(4.0), Value::Number(5.0), Value::Number(6.0)]);
        assert_eq!(coerce_triple(&list).unwrap(), [4.0, 5.0, 6.0]);
        assert!(coerce_triple(&Value::Number(1.0)).is_err());
    }

    #[test]
    fn grids_by_depth() {
        let row = Value::List(vec![Value::Point([0.0; 3]), Value::Point([1.0, 0.0, 0.0])]);
        let grid = Value::List(vec![row.clone(), row]);
        assert_eq!(coerce_grids(&grid).unwrap().len(), 1);
        let batch = Value::List(vec![grid.clone(), grid.clone(), grid]);
        assert_eq!(coerce_grids(&batch).unwrap().len(), 3);
        assert!(coerce_grids(&Value::Point([0.0; 3])).is_err());
    }

    #[test]
    fn grids_of_number_triples() {
        let triple = |x: f64, y: f64| {
            Value::List(vec![Value::Number(x), Value::Number(y), Value::Number(0.0)])
        };
        let grid = Value::List(vec![
            Value::List(vec![triple(0.0, 0.0), triple(0.0, 1.0)]),
            Value::List(vec![triple(1.0, 0.0), triple(1.0, 1.0)]),
        ]);
        let single = coerce_grids(&grid).unwrap();
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].shape(), (2, 2));
        assert_eq!(coerce_grids(&Value::List(vec![grid.clone(), grid])).unwrap().len(), 2);
    }

    #[test]
    fn ragged_grid_is_rejected() {
        let grid = Value::List(vec![
            Value::List(vec![Value::Point([0.0; 3]), Value::Point([1.0, 0.0, 0.0])]),
            Value::List(vec![Value::Point([0.0, 1.0, 0.0])]),
        ]);
        assert!(coerce_grid(&grid).is_err());
    }

    #[test]
    fn meta_choice_defaults_and_rejects() {
        let mut meta = MetaMap::new();
        assert_eq!(meta_choice(&meta, "Mode", 1, |_| Some(2)).unwrap(), 1);
        meta.insert("mode".to_owned(), MetaValue::from("bogus"));
        assert!(meta_choice(&meta, "Mode", 1, |_| None::<i32>).is_err());
    }
}
