//! Drivers: computed bindings from custom properties to constraint influences.

use serde::{Deserialize, Serialize};

/// Address of a custom property on a pose bone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropertyPath {
    pub bone: String,
    pub property: String,
}

impl PropertyPath {
    pub fn new(bone: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            bone: bone.into(),
            property: property.into(),
        }
    }
}

impl std::fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pose.bones[\"{}\"][\"{}\"]", self.bone, self.property)
    }
}

/// What a driver writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum DriverTarget {
    /// Influence of a named constraint on a bone.
    ConstraintInfluence { bone: String, constraint: String },
    /// A custom property.
    Property { bone: String, property: String },
}

impl DriverTarget {
    pub fn influence(bone: impl Into<String>, constraint: impl Into<String>) -> Self {
        DriverTarget::ConstraintInfluence {
            bone: bone.into(),
            constraint: constraint.into(),
        }
    }

    /// Bone owning the driven value.
    pub fn bone(&self) -> &str {
        match self {
            DriverTarget::ConstraintInfluence { bone, .. } => bone,
            DriverTarget::Property { bone, .. } => bone,
        }
    }

    pub(crate) fn bone_mut(&mut self) -> &mut String {
        match self {
            DriverTarget::ConstraintInfluence { bone, .. } => bone,
            DriverTarget::Property { bone, .. } => bone,
        }
    }
}

/// How variables are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverKind {
    #[default]
    Average,
    Sum,
}

/// Single-property input of a driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DriverVariable {
    pub name: String,
    pub source: PropertyPath,
    /// Source bone must be re-resolved after bones are renamed.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub needs_remap: bool,
}

impl DriverVariable {
    pub fn new(name: impl Into<String>, source: PropertyPath) -> Self {
        Self {
            name: name.into(),
            source,
            needs_remap: false,
        }
    }
}

/// Linear remap `a + b * x` applied after combining variables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Polynomial {
    pub a: f64,
    pub b: f64,
}

impl Polynomial {
    /// `1 - x`
    pub const INVERT: Polynomial = Polynomial { a: 1.0, b: -1.0 };
    /// `x`
    pub const IDENTITY: Polynomial = Polynomial { a: 0.0, b: 1.0 };

    pub fn apply(&self, x: f64) -> f64 {
        self.a + self.b * x
    }
}

/// A driver writing one value from one or more custom properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Driver {
    pub target: DriverTarget,
    #[serde(default)]
    pub kind: DriverKind,
    pub variables: Vec<DriverVariable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifier: Option<Polynomial>,
}

impl Driver {
    /// Driver reading a single property into a constraint influence.
    pub fn influence(
        bone: impl Into<String>,
        constraint: impl Into<String>,
        kind: DriverKind,
        source: PropertyPath,
    ) -> Self {
        Self {
            target: DriverTarget::influence(bone, constraint),
            kind,
            variables: vec![DriverVariable::new("var", source)],
            modifier: None,
        }
    }

    pub fn with_modifier(mut self, modifier: Polynomial) -> Self {
        self.modifier = Some(modifier);
        self
    }

    /// Evaluates the driver, reading property values through `lookup`.
    ///
    /// Returns `None` when any variable cannot be read or there are no variables.
    pub fn evaluate(&self, lookup: impl Fn(&PropertyPath) -> Option<f64>) -> Option<f64> {
        if self.variables.is_empty() {
            return None;
        }
        let mut total = 0.0;
        for var in &self.variables {
            total += lookup(&var.source)?;
        }
        let combined = match self.kind {
            DriverKind::Sum => total,
            DriverKind::Average => total / self.variables.len() as f64,
        };
        Some(match &self.modifier {
            Some(poly) => poly.apply(combined),
            None => combined,
        })
    }

    /// Follows a bone rename on the driven side only.
    ///
    /// Variable sources keep the old name; callers that rename bones fix
    /// them afterwards through [`DriverVariable::needs_remap`].
    pub fn rename_target_bone(&mut self, old: &str, new: &str) {
        if self.target.bone() == old {
            *self.target.bone_mut() = new.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ik_fk(value: f64) -> impl Fn(&PropertyPath) -> Option<f64> {
        move |path: &PropertyPath| (path.property == "IK/FK").then_some(value)
    }

    #[test]
    fn test_inverted_driver() {
        let driver = Driver::influence(
            "ORG-forearm.L",
            "Copy Transforms.001",
            DriverKind::Average,
            PropertyPath::new("upper_arm_fk.L", "IK/FK"),
        )
        .with_modifier(Polynomial::INVERT);

        assert_eq!(driver.evaluate(ik_fk(0.0)), Some(1.0));
        assert_eq!(driver.evaluate(ik_fk(1.0)), Some(0.0));
        assert_eq!(driver.evaluate(ik_fk(0.25)), Some(0.75));
    }

    #[test]
    fn test_sum_driver_and_missing_property() {
        let mut driver = Driver::influence(
            "MCH-eyes_parent",
            "Copy Transforms",
            DriverKind::Sum,
            PropertyPath::new("eyes", "Eyes Follow"),
        );
        assert_eq!(driver.evaluate(|_| Some(0.4)), Some(0.4));
        assert_eq!(driver.evaluate(|_| None), None);

        driver.variables.clear();
        assert_eq!(driver.evaluate(|_| Some(1.0)), None);
    }

    #[test]
    fn test_property_path_display() {
        let path = PropertyPath::new("Bone_fk", "IK/FK");
        assert_eq!(path.to_string(), "pose.bones[\"Bone_fk\"][\"IK/FK\"]");
    }
}
