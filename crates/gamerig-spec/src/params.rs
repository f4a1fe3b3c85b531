//! Rig-type parameter schema and the per-bone parameter store.
//!
//! Each rig type declares its parameters as a list of [`ParamDecl`]s. The
//! meta-skeleton stores whatever values the author set in an opaque
//! [`RigParameters`] map; [`ResolvedParams::resolve`] checks them against
//! the declarations and fills in defaults.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ErrorCategory;
use crate::layers::{LayerMask, LAYER_COUNT};

// =============================================================================
// Stored values
// =============================================================================

/// A stored parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    BoolVec(Vec<bool>),
    IntVec(Vec<i64>),
}

impl ParamValue {
    fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Bool(_) => "boolean",
            ParamValue::Int(_) => "integer",
            ParamValue::Float(_) => "float",
            ParamValue::Str(_) => "string",
            ParamValue::BoolVec(_) => "boolean vector",
            ParamValue::IntVec(_) => "integer vector",
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

impl From<Vec<i64>> for ParamValue {
    fn from(v: Vec<i64>) -> Self {
        ParamValue::IntVec(v)
    }
}

impl From<LayerMask> for ParamValue {
    fn from(v: LayerMask) -> Self {
        ParamValue::BoolVec(v.0.to_vec())
    }
}

/// Opaque per-bone key/value configuration store.
///
/// Keys that no declaration names are kept and ignored; they usually belong
/// to a different rig type the bone was tagged with before.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RigParameters(pub BTreeMap<String, ParamValue>);

impl RigParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.insert(name.into(), value.into());
    }

    /// Builder form of [`RigParameters::set`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.set(name, value);
        self
    }
}

// =============================================================================
// Declarations
// =============================================================================

/// Parameter type with its default and constraints.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamKind {
    Bool {
        default: bool,
    },
    Int {
        default: i64,
        min: Option<i64>,
        max: Option<i64>,
    },
    /// 32 layer toggles.
    Layers {
        default: LayerMask,
    },
    Enum {
        items: &'static [&'static str],
        default: &'static str,
    },
    IntVector {
        size: usize,
        default: i64,
        min: Option<i64>,
        max: Option<i64>,
    },
}

/// One declared parameter of a rig type.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDecl {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: ParamKind,
}

impl ParamDecl {
    pub fn bool(name: &'static str, default: bool, description: &'static str) -> Self {
        Self {
            name,
            description,
            kind: ParamKind::Bool { default },
        }
    }

    pub fn int(
        name: &'static str,
        default: i64,
        min: Option<i64>,
        max: Option<i64>,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            description,
            kind: ParamKind::Int { default, min, max },
        }
    }

    pub fn layers(name: &'static str, default_layer: usize, description: &'static str) -> Self {
        Self {
            name,
            description,
            kind: ParamKind::Layers {
                default: LayerMask::single(default_layer),
            },
        }
    }

    pub fn enumeration(
        name: &'static str,
        items: &'static [&'static str],
        default: &'static str,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            description,
            kind: ParamKind::Enum { items, default },
        }
    }

    pub fn int_vector(
        name: &'static str,
        size: usize,
        default: i64,
        min: Option<i64>,
        max: Option<i64>,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            description,
            kind: ParamKind::IntVector {
                size,
                default,
                min,
                max,
            },
        }
    }

    /// Short type label used in listings.
    pub fn type_label(&self) -> String {
        match &self.kind {
            ParamKind::Bool { .. } => "bool".to_string(),
            ParamKind::Int { min, max, .. } => match (min, max) {
                (Some(lo), Some(hi)) => format!("int [{}, {}]", lo, hi),
                (Some(lo), None) => format!("int >= {}", lo),
                (None, Some(hi)) => format!("int <= {}", hi),
                (None, None) => "int".to_string(),
            },
            ParamKind::Layers { .. } => "layers[32]".to_string(),
            ParamKind::Enum { items, .. } => format!("enum {{{}}}", items.join(", ")),
            ParamKind::IntVector { size, .. } => format!("int[{}]", size),
        }
    }
}

// =============================================================================
// Errors
// =============================================================================

/// A stored value that does not fit its declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("parameter '{name}' expects {expected}, got {actual}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("parameter '{name}' = {value} is out of range [{min}, {max}]")]
    OutOfRange {
        name: String,
        value: i64,
        min: String,
        max: String,
    },

    #[error("parameter '{name}' expects {expected} values, got {actual}")]
    WrongLength {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("parameter '{name}' has unknown item '{value}' (expected one of: {items})")]
    UnknownItem {
        name: String,
        value: String,
        items: String,
    },

    #[error("parameter '{name}' is not declared by this rig type")]
    Undeclared { name: String },
}

impl ErrorCategory for ParamError {
    fn code(&self) -> &'static str {
        match self {
            ParamError::TypeMismatch { .. } => "GAMERIG_010",
            ParamError::OutOfRange { .. } => "GAMERIG_011",
            ParamError::WrongLength { .. } => "GAMERIG_012",
            ParamError::UnknownItem { .. } => "GAMERIG_013",
            ParamError::Undeclared { .. } => "GAMERIG_014",
        }
    }

    fn category(&self) -> &'static str {
        "parameters"
    }
}

// =============================================================================
// Resolution
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Resolved {
    Bool(bool),
    Int(i64),
    Layers(LayerMask),
    Enum(String),
    IntVector(Vec<i64>),
}

/// Parameters checked against a rig type's declarations, defaults applied.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolvedParams {
    values: BTreeMap<&'static str, Resolved>,
}

fn check_bounds(name: &str, value: i64, min: Option<i64>, max: Option<i64>) -> Result<(), ParamError> {
    let below = min.is_some_and(|lo| value < lo);
    let above = max.is_some_and(|hi| value > hi);
    if below || above {
        return Err(ParamError::OutOfRange {
            name: name.to_string(),
            value,
            min: min.map_or_else(|| "-inf".to_string(), |v| v.to_string()),
            max: max.map_or_else(|| "inf".to_string(), |v| v.to_string()),
        });
    }
    Ok(())
}

fn mismatch(name: &str, expected: &'static str, actual: &ParamValue) -> ParamError {
    ParamError::TypeMismatch {
        name: name.to_string(),
        expected,
        actual: actual.type_name(),
    }
}

fn resolve_one(decl: &ParamDecl, stored: Option<&ParamValue>) -> Result<Resolved, ParamError> {
    let name = decl.name;
    match (&decl.kind, stored) {
        (ParamKind::Bool { default }, None) => Ok(Resolved::Bool(*default)),
        (ParamKind::Bool { .. }, Some(ParamValue::Bool(v))) => Ok(Resolved::Bool(*v)),
        (ParamKind::Bool { .. }, Some(ParamValue::Int(v))) => Ok(Resolved::Bool(*v != 0)),
        (ParamKind::Bool { .. }, Some(other)) => Err(mismatch(name, "boolean", other)),

        (ParamKind::Int { default, min, max }, stored) => {
            let value = match stored {
                None => *default,
                Some(ParamValue::Int(v)) => *v,
                Some(ParamValue::Float(f)) if f.fract() == 0.0 => *f as i64,
                Some(other) => return Err(mismatch(name, "integer", other)),
            };
            check_bounds(name, value, *min, *max)?;
            Ok(Resolved::Int(value))
        }

        (ParamKind::Layers { default }, None) => Ok(Resolved::Layers(*default)),
        (ParamKind::Layers { .. }, Some(ParamValue::BoolVec(v))) => {
            if v.len() != LAYER_COUNT {
                return Err(ParamError::WrongLength {
                    name: name.to_string(),
                    expected: LAYER_COUNT,
                    actual: v.len(),
                });
            }
            let mut mask = LayerMask::empty();
            for (i, &on) in v.iter().enumerate() {
                mask.set(i, on);
            }
            Ok(Resolved::Layers(mask))
        }
        (ParamKind::Layers { .. }, Some(other)) => Err(mismatch(name, "boolean vector", other)),

        (ParamKind::Enum { default, .. }, None) => Ok(Resolved::Enum(default.to_string())),
        (ParamKind::Enum { items, .. }, Some(ParamValue::Str(s))) => {
            if items.contains(&s.as_str()) {
                Ok(Resolved::Enum(s.clone()))
            } else {
                Err(ParamError::UnknownItem {
                    name: name.to_string(),
                    value: s.clone(),
                    items: items.join(", "),
                })
            }
        }
        (ParamKind::Enum { .. }, Some(other)) => Err(mismatch(name, "string", other)),

        (
            ParamKind::IntVector {
                size,
                default,
                min,
                max,
            },
            stored,
        ) => {
            let values = match stored {
                None => vec![*default; *size],
                Some(ParamValue::IntVec(v)) => v.clone(),
                Some(other) => return Err(mismatch(name, "integer vector", other)),
            };
            if values.len() != *size {
                return Err(ParamError::WrongLength {
                    name: name.to_string(),
                    expected: *size,
                    actual: values.len(),
                });
            }
            for &value in &values {
                check_bounds(name, value, *min, *max)?;
            }
            Ok(Resolved::IntVector(values))
        }
    }
}

impl ResolvedParams {
    /// Checks `stored` against `decls`, applying defaults for missing values.
    pub fn resolve(decls: &[ParamDecl], stored: &RigParameters) -> Result<Self, ParamError> {
        let mut values = BTreeMap::new();
        for decl in decls {
            values.insert(decl.name, resolve_one(decl, stored.get(decl.name))?);
        }
        Ok(Self { values })
    }

    fn lookup(&self, name: &str) -> Result<&Resolved, ParamError> {
        self.values.get(name).ok_or_else(|| ParamError::Undeclared {
            name: name.to_string(),
        })
    }

    pub fn bool(&self, name: &str) -> Result<bool, ParamError> {
        match self.lookup(name)? {
            Resolved::Bool(v) => Ok(*v),
            _ => Err(ParamError::Undeclared {
                name: name.to_string(),
            }),
        }
    }

    pub fn int(&self, name: &str) -> Result<i64, ParamError> {
        match self.lookup(name)? {
            Resolved::Int(v) => Ok(*v),
            _ => Err(ParamError::Undeclared {
                name: name.to_string(),
            }),
        }
    }

    pub fn layers(&self, name: &str) -> Result<LayerMask, ParamError> {
        match self.lookup(name)? {
            Resolved::Layers(v) => Ok(*v),
            _ => Err(ParamError::Undeclared {
                name: name.to_string(),
            }),
        }
    }

    pub fn enumeration(&self, name: &str) -> Result<&str, ParamError> {
        match self.lookup(name)? {
            Resolved::Enum(v) => Ok(v),
            _ => Err(ParamError::Undeclared {
                name: name.to_string(),
            }),
        }
    }

    pub fn int_vector(&self, name: &str) -> Result<&[i64], ParamError> {
        match self.lookup(name)? {
            Resolved::IntVector(v) => Ok(v),
            _ => Err(ParamError::Undeclared {
                name: name.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn decls() -> Vec<ParamDecl> {
        vec![
            ParamDecl::int("chain_length", 2, Some(2), None, "Number of bones in the chain"),
            ParamDecl::bool("stretchable", true, "Allow stretching"),
            ParamDecl::layers("fk_layers", 1, "Layers for the FK controls"),
            ParamDecl::enumeration("rotation_axis", &["automatic", "x", "y", "z"], "automatic", "Main rotation axis"),
            ParamDecl::int_vector("mid_ik_lens", 4, 0, Some(0), None, "Intermediate IK chain lengths"),
        ]
    }

    #[test]
    fn test_defaults_apply() {
        let params = ResolvedParams::resolve(&decls(), &RigParameters::new()).unwrap();
        assert_eq!(params.int("chain_length").unwrap(), 2);
        assert!(params.bool("stretchable").unwrap());
        assert_eq!(params.layers("fk_layers").unwrap(), LayerMask::single(1));
        assert_eq!(params.enumeration("rotation_axis").unwrap(), "automatic");
        assert_eq!(params.int_vector("mid_ik_lens").unwrap(), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_stored_values_from_json() {
        let stored: RigParameters = serde_json::from_str(
            r#"{"chain_length": 5, "stretchable": false, "mid_ik_lens": [2, 2, 0, 0], "other_rig_flag": "x"}"#,
        )
        .unwrap();
        let params = ResolvedParams::resolve(&decls(), &stored).unwrap();
        assert_eq!(params.int("chain_length").unwrap(), 5);
        assert!(!params.bool("stretchable").unwrap());
        assert_eq!(params.int_vector("mid_ik_lens").unwrap(), &[2, 2, 0, 0]);
    }

    #[test]
    fn test_out_of_range() {
        let stored = RigParameters::new().with("chain_length", 1i64);
        let err = ResolvedParams::resolve(&decls(), &stored).unwrap_err();
        assert_eq!(
            err.to_string(),
            "parameter 'chain_length' = 1 is out of range [2, inf]"
        );
        assert_eq!(err.code(), "GAMERIG_011");
    }

    #[test]
    fn test_type_mismatch_and_length() {
        let stored = RigParameters::new().with("stretchable", "yes");
        assert!(matches!(
            ResolvedParams::resolve(&decls(), &stored),
            Err(ParamError::TypeMismatch { .. })
        ));

        let stored = RigParameters::new().with("mid_ik_lens", vec![2i64, 2]);
        assert!(matches!(
            ResolvedParams::resolve(&decls(), &stored),
            Err(ParamError::WrongLength { expected: 4, actual: 2, .. })
        ));
    }

    #[test]
    fn test_unknown_enum_item() {
        let stored = RigParameters::new().with("rotation_axis", "w");
        let err = ResolvedParams::resolve(&decls(), &stored).unwrap_err();
        assert!(matches!(err, ParamError::UnknownItem { .. }));
    }

    #[test]
    fn test_undeclared_lookup() {
        let params = ResolvedParams::resolve(&decls(), &RigParameters::new()).unwrap();
        assert!(matches!(params.bool("primary_layers_extra"), Err(ParamError::Undeclared { .. })));
        assert!(params.int("stretchable").is_err());
    }

    #[test]
    fn test_type_label() {
        assert_eq!(decls()[0].type_label(), "int >= 2");
        assert_eq!(decls()[4].type_label(), "int[4]");
    }
}
