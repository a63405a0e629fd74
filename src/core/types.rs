use std::fmt;

use serde::{Deserialize, Serialize};

/// External identity assigned to one variable of the adapted component.
/// Used as the addressing key across the get/set boundary.
pub type ValueRef = u32;

/// Storage class of a variable: numeric scalar or untyped byte payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarshalKind {
    Primitive,
    Binary,
}

impl fmt::Display for MarshalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarshalKind::Primitive => write!(f, "primitive"),
            MarshalKind::Binary => write!(f, "binary"),
        }
    }
}

/// Direction of a variable, relative to the adapted component.
///
/// Tx variables flow towards the component (the component consumes them),
/// Rx variables flow from the component (the component produces them).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarshalDir {
    Local,
    RxOnly,
    TxRx,
    TxOnly,
    Parameter,
}

impl MarshalDir {
    /// Direction permits signal-to-target copy (the component reads the value).
    pub fn marshals_out(&self) -> bool {
        matches!(
            self,
            MarshalDir::TxRx | MarshalDir::TxOnly | MarshalDir::Parameter
        )
    }

    /// Direction permits target-to-signal copy (the component wrote the value).
    pub fn marshals_in(&self) -> bool {
        matches!(
            self,
            MarshalDir::TxRx | MarshalDir::RxOnly | MarshalDir::Local
        )
    }
}

impl fmt::Display for MarshalDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarshalDir::Local => write!(f, "local"),
            MarshalDir::RxOnly => write!(f, "rxonly"),
            MarshalDir::TxRx => write!(f, "txrx"),
            MarshalDir::TxOnly => write!(f, "txonly"),
            MarshalDir::Parameter => write!(f, "parameter"),
        }
    }
}

/// Scalar type of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarshalType {
    Int32,
    Double,
    Bool,
    String,
}

impl fmt::Display for MarshalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarshalType::Int32 => write!(f, "int32"),
            MarshalType::Double => write!(f, "double"),
            MarshalType::Bool => write!(f, "bool"),
            MarshalType::String => write!(f, "string"),
        }
    }
}

/// Canonical classification orderings. The classifier iterates these in
/// nesting order (kind, type, direction) so group ordering is deterministic
/// and independent of declaration order.
pub const KIND_ORDER: [MarshalKind; 2] = [MarshalKind::Primitive, MarshalKind::Binary];

pub const TYPE_ORDER: [MarshalType; 4] = [
    MarshalType::Int32,
    MarshalType::Double,
    MarshalType::Bool,
    MarshalType::String,
];

pub const DIR_ORDER: [MarshalDir; 5] = [
    MarshalDir::Local,
    MarshalDir::RxOnly,
    MarshalDir::TxRx,
    MarshalDir::TxOnly,
    MarshalDir::Parameter,
];

/// One raw variable declaration, as delivered by the declaration source.
///
/// Type and causality arrive as annotation strings; resolution into
/// [`Variable`] happens during classification. The engine never reads
/// configuration files itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableDecl {
    pub name: String,
    pub vref: ValueRef,
    pub variable_type: String,
    #[serde(default)]
    pub causality: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
}

impl VariableDecl {
    pub fn new(name: impl Into<String>, vref: ValueRef, variable_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vref,
            variable_type: variable_type.into(),
            causality: None,
            encoding: None,
        }
    }

    pub fn with_causality(mut self, causality: impl Into<String>) -> Self {
        self.causality = Some(causality.into());
        self
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }
}

/// One resolved interface point of the adapted component. Immutable after
/// resolution; consumed into a marshal group at table-build time.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub vref: ValueRef,
    pub kind: MarshalKind,
    pub dir: MarshalDir,
    pub ty: MarshalType,
    pub encoding: Option<String>,
}

impl Variable {
    /// Resolve a raw declaration. Returns `None` when the type or causality
    /// annotation is undecodable (the caller logs and drops the variable).
    pub fn resolve(decl: &VariableDecl) -> Option<Self> {
        if decl.name.is_empty() {
            return None;
        }
        let kind = decode_kind(&decl.variable_type)?;
        let ty = decode_type(&decl.variable_type)?;
        let dir = decode_dir(decl.causality.as_deref())?;
        Some(Self {
            name: decl.name.clone(),
            vref: decl.vref,
            kind,
            dir,
            ty,
            encoding: decl.encoding.clone(),
        })
    }
}

pub fn decode_kind(t: &str) -> Option<MarshalKind> {
    match t {
        "Real" | "Integer" | "Boolean" => Some(MarshalKind::Primitive),
        "String" => Some(MarshalKind::Binary),
        _ => None,
    }
}

pub fn decode_type(t: &str) -> Option<MarshalType> {
    match t {
        "Real" => Some(MarshalType::Double),
        "Integer" => Some(MarshalType::Int32),
        "Boolean" => Some(MarshalType::Bool),
        "String" => Some(MarshalType::String),
        _ => None,
    }
}

/// A missing causality defaults to `TxRx`; an unknown one is undecodable.
pub fn decode_dir(t: Option<&str>) -> Option<MarshalDir> {
    match t {
        None => Some(MarshalDir::TxRx),
        Some("input") => Some(MarshalDir::TxOnly),
        Some("output") => Some(MarshalDir::RxOnly),
        Some("inout") => Some(MarshalDir::TxRx),
        Some("parameter") => Some(MarshalDir::Parameter),
        Some("local") => Some(MarshalDir::Local),
        Some(_) => None,
    }
}
