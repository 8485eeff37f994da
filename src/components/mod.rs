//! Component registry en evaluatie-logica.

use std::collections::HashMap;
use std::fmt;

use crate::geom::{BendError, GridError, SelectionError, TopologyError};
use crate::graph::node::MetaMap;
use crate::graph::value::{Value, ValueError};

pub mod bend_along_surface;
pub mod coerce;
pub mod solid_select;
pub mod vector_math;

/// Output-map van een component: pinnickname → waarde.
pub type OutputMap = std::collections::BTreeMap<String, Value>;

/// Fouttype voor component-evaluaties.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentError {
    /// Een generieke fout met een bericht.
    Message(String),
    /// Een ontbrekende ingang.
    MissingInput(&'static str),
}

impl ComponentError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Message(s) => s,
            Self::MissingInput(s) => s,
        }
    }
}

impl fmt::Display for ComponentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message(s) => f.write_str(s),
            Self::MissingInput(s) => write!(f, "Ingang '{}' ontbreekt", s),
        }
    }
}

impl std::error::Error for ComponentError {}

impl From<ValueError> for ComponentError {
    fn from(err: ValueError) -> Self {
        Self::new(err.to_string())
    }
}

impl From<GridError> for ComponentError {
    fn from(err: GridError) -> Self {
        Self::new(format!("Ongeldig puntengrid: {err}"))
    }
}

impl From<BendError> for ComponentError {
    fn from(err: BendError) -> Self {
        Self::new(format!("Buigen langs oppervlak mislukt: {err}"))
    }
}

impl From<SelectionError> for ComponentError {
    fn from(err: SelectionError) -> Self {
        Self::new(format!("Selectie mislukt: {err}"))
    }
}

impl From<TopologyError> for ComponentError {
    fn from(err: TopologyError) -> Self {
        Self::new(format!("Ongeldige topologie: {err}"))
    }
}

/// Resultaat van een component-executie.
pub type ComponentResult = Result<OutputMap, ComponentError>;

/// Trait die alle componentimplementaties dienen te implementeren.
pub trait Component {
    fn evaluate(&self, inputs: &[Value], meta: &MetaMap) -> ComponentResult;
}

/// Beschikbare componenttypen binnen de registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    BendAlongSurface(bend_along_surface::ComponentImpl),
    SelectSolid(solid_select::ComponentImpl),
    VectorMath(vector_math::VectorOp),
}

impl ComponentKind {
    /// Zoekt een component op naam via de standaardregistry.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        ComponentRegistry::default().resolve(name)
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::BendAlongSurface(_) => "Bend Along Surface",
            Self::SelectSolid(_) => "Select Solid Elements",
            Self::VectorMath(op) => op.name(),
        }
    }

    pub fn evaluate(&self, inputs: &[Value], meta: &MetaMap) -> ComponentResult {
        log::debug!("evalueer component '{}' met {} ingangen", self.name(), inputs.len());
        match self {
            Self::BendAlongSurface(component) => component.evaluate(inputs, meta),
            Self::SelectSolid(component) => component.evaluate(inputs, meta),
            Self::VectorMath(component) => component.evaluate(inputs, meta),
        }
    }
}

/// Register van componenten, opvraagbaar op naam of afkorting.
#[derive(Debug, Clone)]
pub struct ComponentRegistry {
    by_name: HashMap<String, ComponentKind>,
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        let mut registry = Self::new();

        let bend = ComponentKind::BendAlongSurface(bend_along_surface::ComponentImpl);
        registry.register_names(bend_along_surface::NAMES, bend);

        let select = ComponentKind::SelectSolid(solid_select::ComponentImpl);
        registry.register_names(solid_select::NAMES, select);

        for op in vector_math::VectorOp::ALL {
            registry.register_names(&[op.name(), op.description()], ComponentKind::VectorMath(op));
        }

        registry
    }
}

impl ComponentRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_name: HashMap::new(),
        }
    }

    pub fn register_names(&mut self, names: &[&str], kind: ComponentKind) {
        for name in names {
            let key = normalize_name(name);
            self.by_name.insert(key, kind);
        }
    }

    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<ComponentKind> {
        self.by_name.get(&normalize_name(name)).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::{ComponentKind, ComponentRegistry, vector_math::VectorOp};

    #[test]
    fn lookup_by_name_and_nickname() {
        let registry = ComponentRegistry::default();

        let bend = registry.resolve("Bend Along Surface").unwrap();
        assert!(matches!(bend, ComponentKind::BendAlongSurface(_)));

        let select = registry.resolve("  solidselect ").unwrap();
        assert!(matches!(select, ComponentKind::SelectSolid(_)));

        let cross = registry.resolve("cross").unwrap();
        assert_eq!(cross, ComponentKind::VectorMath(VectorOp::Cross));

        assert!(registry.resolve("Extrude").is_none());
    }

    #[test]
    fn every_vector_op_is_registered() {
        for op in VectorOp::ALL {
            assert_eq!(
                ComponentKind::from_name(op.name()),
                Some(ComponentKind::VectorMath(op))
            );
        }
    }
}
