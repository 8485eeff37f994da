//! Vector Math component: één component per bewerking, geselecteerd via
//! een dispatch-tabel.
//!
//! Elke bewerking beschrijft haar ingangssignatuur (`vv`, `v` of `vs`) en
//! uitgangstype (`s` of `v`). Ingangen worden recursief over geneste
//! lijsten toegepast; ongelijke lijsten worden long-repeat gekoppeld.

use std::collections::BTreeMap;
use std::fmt;

use crate::geom::{Point3, Vec3, cell_noise, cell_noise_vector};
use crate::graph::node::MetaMap;
use crate::graph::value::Value;

use super::coerce::{coerce_number, coerce_triple};
use super::{Component, ComponentError, ComponentResult};

const EPSILON: f64 = 1e-12;
/// ROUND accepts this many decimal digits in either direction.
const MAX_ROUND_DIGITS: i32 = 15;

const PIN_INPUT_A: &str = "A";
const PIN_INPUT_B: &str = "B";
const PIN_OUTPUT: &str = "Out";

/// Ingangssignatuur van een bewerking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signature {
    /// Twee vectoren.
    VectorVector,
    /// Eén vector.
    Vector,
    /// Een vector en een getal.
    VectorScalar,
}

impl Signature {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::VectorVector => "vv",
            Self::Vector => "v",
            Self::VectorScalar => "vs",
        }
    }

    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::Vector => 1,
            Self::VectorVector | Self::VectorScalar => 2,
        }
    }
}

/// Uitgangstype van een bewerking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Scalar,
    Vector,
}

impl OutputKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Scalar => "s",
            Self::Vector => "v",
        }
    }
}

/// Beschikbare vectorbewerkingen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VectorOp {
    Cross,
    Dot,
    Add,
    Sub,
    Length,
    Distance,
    Normalize,
    Negate,
    CellVector,
    CellScalar,
    AngleDegrees,
    Project,
    Reflect,
    Scalar,
    InverseScalar,
    AngleRadians,
    Round,
    ComponentWise,
}

impl VectorOp {
    /// Alle bewerkingen, gesorteerd op ordinaal.
    pub const ALL: [Self; 18] = [
        Self::Cross,
        Self::Dot,
        Self::Add,
        Self::Sub,
        Self::Length,
        Self::Distance,
        Self::Normalize,
        Self::Negate,
        Self::CellVector,
        Self::CellScalar,
        Self::AngleDegrees,
        Self::Project,
        Self::Reflect,
        Self::Scalar,
        Self::InverseScalar,
        Self::AngleRadians,
        Self::Round,
        Self::ComponentWise,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Cross => "CROSS",
            Self::Dot => "DOT",
            Self::Add => "ADD",
            Self::Sub => "SUB",
            Self::Length => "LEN",
            Self::Distance => "DISTANCE",
            Self::Normalize => "NORMALIZE",
            Self::Negate => "NEG",
            Self::CellVector => "CELL-V",
            Self::CellScalar => "CELL-S",
            Self::AngleDegrees => "ANGLE DEG",
            Self::Project => "PROJECT",
            Self::Reflect => "REFLECT",
            Self::Scalar => "SCALAR",
            Self::InverseScalar => "1/SCALAR",
            Self::AngleRadians => "ANGLE RAD",
            Self::Round => "ROUND",
            Self::ComponentWise => "COMPONENT-WISE",
        }
    }

    /// Positie in de keuzelijst.
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        match self {
            Self::Cross => 0,
            Self::Dot => 1,
            Self::Add => 2,
            Self::Sub => 3,
            Self::Length => 4,
            Self::Distance => 5,
            Self::Normalize => 6,
            Self::Negate => 7,
            Self::CellVector => 10,
            Self::CellScalar => 11,
            Self::AngleDegrees => 12,
            Self::Project => 13,
            Self::Reflect => 14,
            Self::Scalar => 15,
            Self::InverseScalar => 16,
            Self::AngleRadians => 17,
            Self::Round => 18,
            Self::ComponentWise => 19,
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Cross => "Cross product",
            Self::Dot => "Dot product",
            Self::Add => "Add",
            Self::Sub => "Sub",
            Self::Length => "Length",
            Self::Distance => "Distance",
            Self::Normalize => "Normalize",
            Self::Negate => "Negate",
            Self::CellVector => "Vector Cell Noise",
            Self::CellScalar => "Scalar Cell noise",
            Self::AngleDegrees => "Angle Degrees",
            Self::Project => "Project",
            Self::Reflect => "Reflect",
            Self::Scalar => "Multiply Scalar",
            Self::InverseScalar => "Multiply 1/Scalar",
            Self::AngleRadians => "Angle Radians",
            Self::Round => "Round s digits",
            Self::ComponentWise => "Component-wise U*V",
        }
    }

    #[must_use]
    pub const fn signature(self) -> Signature {
        match self {
            Self::Cross
            | Self::Dot
            | Self::Add
            | Self::Sub
            | Self::Distance
            | Self::AngleDegrees
            | Self::AngleRadians
            | Self::Project
            | Self::Reflect
            | Self::ComponentWise => Signature::VectorVector,
            Self::Length
            | Self::Normalize
            | Self::Negate
            | Self::CellScalar
            | Self::CellVector => Signature::Vector,
            Self::Scalar | Self::InverseScalar | Self::Round => Signature::VectorScalar,
        }
    }

    #[must_use]
    pub const fn output(self) -> OutputKind {
        match self {
            Self::Dot
            | Self::Distance
            | Self::AngleDegrees
            | Self::AngleRadians
            | Self::Length
            | Self::CellScalar => OutputKind::Scalar,
            _ => OutputKind::Vector,
        }
    }

    /// Zoekt een bewerking op naam (`"CROSS"`) of omschrijving (`"Cross product"`).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.into_iter().find(|op| {
            op.name().eq_ignore_ascii_case(name) || op.description().eq_ignore_ascii_case(name)
        })
    }

    /// Past de bewerking recursief toe op de ingangen.
    pub fn apply(self, a: &Value, b: Option<&Value>) -> Result<Value, ComponentError> {
        match self.signature() {
            Signature::Vector => self.apply_unary(a),
            Signature::VectorVector | Signature::VectorScalar => {
                let b = b.ok_or(ComponentError::MissingInput(PIN_INPUT_B))?;
                self.apply_binary(a, b)
            }
        }
    }

    fn apply_unary(self, value: &Value) -> Result<Value, ComponentError> {
        if is_vector_leaf(value) {
            return self.unary(Vec3::from(coerce_triple(value)?));
        }
        match value {
            Value::List(values) => values
                .iter()
                .map(|v| self.apply_unary(v))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            other => Err(ComponentError::new(format!(
                "{} verwacht een vector, kreeg {}",
                self.name(),
                other.kind()
            ))),
        }
    }

    fn apply_binary(self, a: &Value, b: &Value) -> Result<Value, ComponentError> {
        let a_leaf = is_vector_leaf(a);
        let b_leaf = match self.signature() {
            Signature::VectorScalar => matches!(b, Value::Number(_) | Value::Boolean(_)),
            _ => is_vector_leaf(b),
        };

        if a_leaf && b_leaf {
            let u = Vec3::from(coerce_triple(a)?);
            return match self.signature() {
                Signature::VectorScalar => self.with_scalar(u, coerce_number(b)?),
                _ => self.binary(u, Vec3::from(coerce_triple(b)?)),
            };
        }

        let left = operand_items(a, a_leaf, self)?;
        let right = operand_items(b, b_leaf, self)?;
        let count = left.len().max(right.len());
        (0..count)
            .map(|i| {
                let u = left.get(i).or_else(|| left.last()).copied();
                let v = right.get(i).or_else(|| right.last()).copied();
                match (u, v) {
                    (Some(u), Some(v)) => self.apply_binary(u, v),
                    _ => Err(ComponentError::new(format!(
                        "{} kreeg een lege lijst als operand",
                        self.name()
                    ))),
                }
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List)
    }

    fn unary(self, u: Vec3) -> Result<Value, ComponentError> {
        let value = match self {
            Self::Length => Value::Number(u.length()),
            Self::Normalize => vector(u.normalized().unwrap_or(Vec3::ZERO)),
            Self::Negate => vector(-u),
            Self::CellScalar => Value::Number(cell_noise(Point3::from(u))),
            Self::CellVector => vector(cell_noise_vector(Point3::from(u))),
            _ => return Err(self.signature_mismatch()),
        };
        Ok(value)
    }

    fn binary(self, u: Vec3, v: Vec3) -> Result<Value, ComponentError> {
        let value = match self {
            Self::Cross => vector(u.cross(v)),
            Self::Dot => Value::Number(u.dot(v)),
            Self::Add => vector(u + v),
            Self::Sub => vector(u - v),
            Self::Distance => Value::Number((u - v).length()),
            Self::AngleDegrees => Value::Number(angle_between(u, v).to_degrees()),
            Self::AngleRadians => Value::Number(angle_between(u, v)),
            Self::Project => {
                let denominator = v.length_squared();
                if denominator <= EPSILON {
                    return Err(ComponentError::new(
                        "PROJECT kan niet projecteren op een nulvector",
                    ));
                }
                vector(v * (u.dot(v) / denominator))
            }
            Self::Reflect => match v.normalized() {
                Some(n) => vector(u - n * (2.0 * u.dot(n))),
                None => vector(u),
            },
            Self::ComponentWise => vector(u.mul_components(v)),
            _ => return Err(self.signature_mismatch()),
        };
        Ok(value)
    }

    fn with_scalar(self, u: Vec3, s: f64) -> Result<Value, ComponentError> {
        let value = match self {
            Self::Scalar => vector(u * s),
            Self::InverseScalar => {
                if s == 0.0 {
                    return Err(ComponentError::new("1/SCALAR kan niet delen door nul"));
                }
                vector(u / s)
            }
            Self::Round => {
                if !s.is_finite() || s.round().abs() > f64::from(MAX_ROUND_DIGITS) {
                    return Err(ComponentError::new(format!(
                        "ROUND verwacht een aantal cijfers tussen -{MAX_ROUND_DIGITS} en {MAX_ROUND_DIGITS}, kreeg {s}"
                    )));
                }
                let factor = 10f64.powi(s.round() as i32);
                vector(Vec3::new(
                    (u.x * factor).round() / factor,
                    (u.y * factor).round() / factor,
                    (u.z * factor).round() / factor,
                ))
            }
            _ => return Err(self.signature_mismatch()),
        };
        Ok(value)
    }

    fn signature_mismatch(self) -> ComponentError {
        ComponentError::new(format!(
            "{} heeft signatuur '{}'",
            self.name(),
            self.signature().code()
        ))
    }
}

impl fmt::Display for VectorOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Component for VectorOp {
    fn evaluate(&self, inputs: &[Value], _meta: &MetaMap) -> ComponentResult {
        let a = inputs
            .first()
            .ok_or(ComponentError::MissingInput(PIN_INPUT_A))?;
        let result = self.apply(a, inputs.get(1))?;

        let mut outputs = BTreeMap::new();
        outputs.insert(PIN_OUTPUT.to_owned(), result);
        Ok(outputs)
    }
}

fn vector(v: Vec3) -> Value {
    Value::Vector(v.to_array())
}

fn angle_between(u: Vec3, v: Vec3) -> f64 {
    let denominator = u.length() * v.length();
    if denominator <= EPSILON {
        return 0.0;
    }
    (u.dot(v) / denominator).clamp(-1.0, 1.0).acos()
}

fn is_vector_leaf(value: &Value) -> bool {
    match value {
        Value::Point(_) | Value::Vector(_) => true,
        Value::List(values) => {
            values.len() == 3 && values.iter().all(|v| matches!(v, Value::Number(_)))
        }
        _ => false,
    }
}

fn operand_items(value: &Value, leaf: bool, op: VectorOp) -> Result<Vec<&Value>, ComponentError> {
    if leaf {
        return Ok(vec![value]);
    }
    match value {
        Value::List(values) => Ok(values.iter().collect()),
        other => Err(ComponentError::new(format!(
            "{} kan {} niet als operand gebruiken",
            op.name(),
            other.kind()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f64, y: f64, z: f64) -> Value {
        Value::Vector([x, y, z])
    }

    fn approx(value: &Value, expected: [f64; 3]) -> bool {
        let got = value.expect_vector().unwrap();
        got.iter().zip(expected).all(|(a, b)| (a - b).abs() < 1e-9)
    }

    #[test]
    fn all_is_sorted_by_ordinal() {
        assert!(VectorOp::ALL.windows(2).all(|w| w[0].ordinal() < w[1].ordinal()));
    }

    #[test]
    fn lookup_by_name_and_description() {
        assert_eq!(VectorOp::from_name("1/scalar"), Some(VectorOp::InverseScalar));
        assert_eq!(VectorOp::from_name("Cross product"), Some(VectorOp::Cross));
        assert_eq!(VectorOp::from_name("NOISE-V"), None);
    }

    #[test]
    fn cross_and_dot() {
        let cross = VectorOp::Cross.apply(&v(1.0, 0.0, 0.0), Some(&v(0.0, 1.0, 0.0))).unwrap();
        assert!(approx(&cross, [0.0, 0.0, 1.0]));
        let dot = VectorOp::Dot.apply(&v(1.0, 2.0, 3.0), Some(&v(4.0, 5.0, 6.0))).unwrap();
        assert_eq!(dot, Value::Number(32.0));
    }

    #[test]
    fn angle_and_projection() {
        let deg = VectorOp::AngleDegrees
            .apply(&v(1.0, 0.0, 0.0), Some(&v(0.0, 0.0, 2.0)))
            .unwrap();
        assert!((deg.expect_number().unwrap() - 90.0).abs() < 1e-9);
        let zero = VectorOp::AngleRadians.apply(&v(0.0, 0.0, 0.0), Some(&v(1.0, 0.0, 0.0)));
        assert_eq!(zero.unwrap(), Value::Number(0.0));

        let projected = VectorOp::Project
            .apply(&v(2.0, 3.0, 0.0), Some(&v(0.0, 5.0, 0.0)))
            .unwrap();
        assert!(approx(&projected, [0.0, 3.0, 0.0]));
        let reflected = VectorOp::Reflect
            .apply(&v(1.0, -1.0, 0.0), Some(&v(0.0, 2.0, 0.0)))
            .unwrap();
        assert!(approx(&reflected, [1.0, 1.0, 0.0]));
    }

    #[test]
    fn longest_list_repeats_last() {
        let a = Value::List(vec![v(1.0, 0.0, 0.0), v(2.0, 0.0, 0.0), v(3.0, 0.0, 0.0)]);
        let b = Value::List(vec![v(0.0, 1.0, 0.0)]);
        let sum = VectorOp::Add.apply(&a, Some(&b)).unwrap();
        let items = sum.expect_list().unwrap();
        assert_eq!(items.len(), 3);
        assert!(approx(&items[2], [3.0, 1.0, 0.0]));
    }

    #[test]
    fn nested_lists_recurse() {
        let a = Value::List(vec![Value::List(vec![v(3.0, 4.0, 0.0)]), Value::List(vec![])]);
        let lengths = VectorOp::Length.apply(&a, None).unwrap();
        assert_eq!(
            lengths,
            Value::List(vec![Value::List(vec![Value::Number(5.0)]), Value::List(vec![])])
        );
    }

    #[test]
    fn scalar_operations() {
        let scaled = VectorOp::Scalar.apply(&v(1.0, 2.0, 3.0), Some(&Value::Number(2.0))).unwrap();
        assert!(approx(&scaled, [2.0, 4.0, 6.0]));
        let rounded = VectorOp::Round
            .apply(&v(1.2345, -2.5551, 3.0), Some(&Value::Number(2.0)))
            .unwrap();
        assert!(approx(&rounded, [1.23, -2.56, 3.0]));
        let per_scalar = VectorOp::Scalar
            .apply(&v(1.0, 0.0, 0.0), Some(&Value::List(vec![Value::Number(1.0), Value::Number(3.0)])))
            .unwrap();
        assert_eq!(per_scalar.expect_list().unwrap().len(), 2);
    }

    #[test]
    fn errors_propagate() {
        let div = VectorOp::InverseScalar.apply(&v(1.0, 1.0, 1.0), Some(&Value::Number(0.0)));
        assert!(div.is_err());
        let missing = VectorOp::Cross.apply(&v(1.0, 0.0, 0.0), None);
        assert_eq!(missing.unwrap_err(), ComponentError::MissingInput("B"));
        let wrong = VectorOp::Length.apply(&Value::Text("x".to_owned()), None);
        assert!(wrong.is_err());
        let empty = VectorOp::Add.apply(&Value::List(vec![]), Some(&v(1.0, 0.0, 0.0)));
        assert!(empty.is_err());
        let nested = Value::List(vec![v(1.0, 0.0, 0.0), Value::Boolean(true)]);
        assert!(VectorOp::Normalize.apply(&nested, None).is_err());
    }

    #[test]
    fn round_rejects_digits_out_of_range() {
        let u = v(1.25, 0.0, -3.5);
        for digits in [400.0, -400.0, 16.0, f64::NAN, f64::INFINITY] {
            assert!(VectorOp::Round.apply(&u, Some(&Value::Number(digits))).is_err());
        }
        let edge = VectorOp::Round.apply(&u, Some(&Value::Number(-15.0))).unwrap();
        assert!(approx(&edge, [0.0, 0.0, 0.0]));
        let tens = VectorOp::Round.apply(&v(149.0, -151.0, 5.0), Some(&Value::Number(-2.0))).unwrap();
        assert!(approx(&tens, [100.0, -200.0, 0.0]));
    }

    #[test]
    fn normalize_zero_stays_zero() {
        let n = VectorOp::Normalize.apply(&v(0.0, 0.0, 0.0), None).unwrap();
        assert!(approx(&n, [0.0, 0.0, 0.0]));
    }

    #[test]
    fn component_output_pin() {
        let outputs = VectorOp::Negate
            .evaluate(&[v(1.0, -2.0, 0.5)], &MetaMap::new())
            .unwrap();
        assert!(approx(&outputs["Out"], [-1.0, 2.0, -0.5]));
    }
}
