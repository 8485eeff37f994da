//! Basis Value-enum waarin componentwaarden en -resultaten worden
//! opgeslagen.

use core::fmt;

use crate::geom::{Point3, PointGrid, SolidTopology};

/// Beschikbare waardetypes die tussen componenten worden doorgegeven.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Een enkele numerieke waarde.
    Number(f64),
    /// Een booleaanse waarde.
    Boolean(bool),
    /// Een tekstwaarde.
    Text(String),
    /// Een 3D-punt.
    Point([f64; 3]),
    /// Een 3D-vector.
    Vector([f64; 3]),
    /// Een solid met topologie (vertices, edges en faces).
    Solid(Box<SolidTopology>),
    /// Een lijst van waarden.
    List(Vec<Value>),
}

impl Value {
    /// Geeft de variantnaam terug. Wordt gebruikt in foutmeldingen.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Number(_) => ValueKind::Number,
            Self::Boolean(_) => ValueKind::Boolean,
            Self::Text(_) => ValueKind::Text,
            Self::Point(_) => ValueKind::Point,
            Self::Vector(_) => ValueKind::Vector,
            Self::Solid(_) => ValueKind::Solid,
            Self::List(_) => ValueKind::List,
        }
    }

    /// Verwacht een `Number` en retourneert de f64-waarde.
    pub fn expect_number(&self) -> Result<f64, ValueError> {
        match self {
            Self::Number(value) => Ok(*value),
            _ => Err(ValueError::type_mismatch("Number", self.kind())),
        }
    }

    /// Verwacht een `Boolean` en retourneert de waarde.
    pub fn expect_boolean(&self) -> Result<bool, ValueError> {
        match self {
            Self::Boolean(value) => Ok(*value),
            _ => Err(ValueError::type_mismatch("Boolean", self.kind())),
        }
    }

    /// Verwacht een `Text` en retourneert een verwijzing.
    pub fn expect_text(&self) -> Result<&str, ValueError> {
        match self {
            Self::Text(value) => Ok(value),
            _ => Err(ValueError::type_mismatch("Text", self.kind())),
        }
    }

    /// Verwacht een `Point` en retourneert de coördinaten.
    pub fn expect_point(&self) -> Result<[f64; 3], ValueError> {
        match self {
            Self::Point(point) => Ok(*point),
            _ => Err(ValueError::type_mismatch("Point", self.kind())),
        }
    }

    /// Verwacht een `Vector` en retourneert de componenten.
    pub fn expect_vector(&self) -> Result<[f64; 3], ValueError> {
        match self {
            Self::Vector(vector) => Ok(*vector),
            _ => Err(ValueError::type_mismatch("Vector", self.kind())),
        }
    }

    /// Verwacht een `Solid` en retourneert een verwijzing naar de topologie.
    pub fn expect_solid(&self) -> Result<&SolidTopology, ValueError> {
        match self {
            Self::Solid(solid) => Ok(solid),
            _ => Err(ValueError::type_mismatch("Solid", self.kind())),
        }
    }

    /// Verwacht een lijst en geeft een slice terug.
    pub fn expect_list(&self) -> Result<&[Value], ValueError> {
        match self {
            Self::List(values) => Ok(values),
            _ => Err(ValueError::type_mismatch("List", self.kind())),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<Point3> for Value {
    fn from(point: Point3) -> Self {
        Self::Point(point.to_array())
    }
}

impl From<SolidTopology> for Value {
    fn from(solid: SolidTopology) -> Self {
        Self::Solid(Box::new(solid))
    }
}

impl From<&PointGrid> for Value {
    /// Een grid wordt een lijst van rijen met punten.
    fn from(grid: &PointGrid) -> Self {
        Self::List(
            grid.iter_rows()
                .map(|row| Self::List(row.iter().map(|&p| Self::from(p)).collect()))
                .collect(),
        )
    }
}

impl From<Vec<bool>> for Value {
    fn from(mask: Vec<bool>) -> Self {
        Self::List(mask.into_iter().map(Self::Boolean).collect())
    }
}

/// Typefout voor wanneer een `Value` naar het verkeerde type wordt
/// geconverteerd.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueError {
    expected: &'static str,
    found: ValueKind,
}

impl ValueError {
    #[must_use]
    pub fn type_mismatch(expected: &'static str, found: ValueKind) -> Self {
        Self { expected, found }
    }

    /// Hulptoegang voor tests en foutafhandeling.
    #[must_use]
    pub fn expected(&self) -> &'static str {
        self.expected
    }

    #[must_use]
    pub fn found(&self) -> ValueKind {
        self.found
    }
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "verwachtte type `{}` maar kreeg `{}`",
            self.expected, self.found
        )
    }
}

impl std::error::Error for ValueError {}

/// Beschrijft het soort `Value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Number,
    Boolean,
    Text,
    Point,
    Vector,
    Solid,
    List,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Number => "Number",
            Self::Boolean => "Boolean",
            Self::Text => "Text",
            Self::Point => "Point",
            Self::Vector => "Vector",
            Self::Solid => "Solid",
            Self::List => "List",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::{Value, ValueError, ValueKind};
    use crate::geom::{Point3, PointGrid, SolidTopology};

    #[test]
    fn expect_number_accepts_number() {
        let value = Value::Number(42.0);
        assert_eq!(value.expect_number().unwrap(), 42.0);
    }

    #[test]
    fn expect_number_rejects_wrong_type() {
        let value = Value::Point([0.0, 0.0, 0.0]);
        let err = value.expect_number().unwrap_err();
        assert_eq!(err.expected(), "Number");
        assert_eq!(err.found(), ValueKind::Point);
        assert_eq!(err.to_string(), "verwachtte type `Number` maar kreeg `Point`");
    }

    #[test]
    fn expect_boolean_rejects_other_types() {
        let value = Value::Number(0.0);
        let err = value.expect_boolean().unwrap_err();
        assert_eq!(err.expected(), "Boolean");
        assert_eq!(err.found(), ValueKind::Number);
    }

    #[test]
    fn expect_solid_returns_reference() {
        let cube = SolidTopology::cuboid(Point3::ORIGIN, Point3::new(1.0, 1.0, 1.0)).unwrap();
        let value = Value::from(cube);
        assert_eq!(value.expect_solid().unwrap().faces().len(), 6);
        assert_eq!(value.kind(), ValueKind::Solid);
    }

    #[test]
    fn list_expectation_requires_list() {
        let value = Value::List(vec![Value::Number(1.0)]);
        assert_eq!(value.expect_list().unwrap().len(), 1);

        let non_list = Value::Number(3.0);
        assert!(matches!(non_list.expect_list(), Err(ValueError { .. })));
    }

    #[test]
    fn grid_becomes_nested_list() {
        let grid = PointGrid::from_fn(2, 3, |i, j| Point3::new(i as f64, j as f64, 0.0)).unwrap();
        let value = Value::from(&grid);
        let rows = value.expect_list().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].expect_list().unwrap()[2], Value::Point([1.0, 2.0, 0.0]));
    }
}
