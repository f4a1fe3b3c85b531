//! Bone data shared by meta-skeletons and generated armatures.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constraint::Constraint;
use crate::layers::LayerMask;
use crate::math::{self, Vec3};
use crate::params::RigParameters;

fn default_true() -> bool {
    true
}

fn is_false(v: &bool) -> bool {
    !*v
}

/// Pose-bone rotation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RotationMode {
    #[default]
    Quaternion,
    Xyz,
    Xzy,
    Yxz,
    Yzx,
    Zxy,
    Zyx,
    AxisAngle,
}

/// A float custom property shown to animators as a slider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomProperty {
    pub value: f64,
    pub min: f64,
    pub max: f64,
    pub soft_min: f64,
    pub soft_max: f64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl CustomProperty {
    /// Property bounded to `[0, 1]` (hard and soft).
    pub fn unit(value: f64) -> Self {
        Self {
            value,
            min: 0.0,
            max: 1.0,
            soft_min: 0.0,
            soft_max: 1.0,
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the value, clamped to the hard bounds.
    pub fn set_value(&mut self, value: f64) {
        self.value = value.clamp(self.min, self.max);
    }
}

/// Pose-mode settings of a bone.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoseSettings {
    #[serde(default)]
    pub rotation_mode: RotationMode,
    #[serde(default)]
    pub lock_location: [bool; 3],
    #[serde(default)]
    pub lock_rotation: [bool; 3],
    #[serde(default, skip_serializing_if = "is_false")]
    pub lock_rotation_w: bool,
    #[serde(default)]
    pub lock_scale: [bool; 3],
    /// Stretch allowance inside an IK chain.
    #[serde(default)]
    pub ik_stretch: f64,
    /// Per-axis IK rotation locks.
    #[serde(default)]
    pub lock_ik: [bool; 3],
    /// Widget object displayed in place of the bone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_shape: Option<String>,
    /// Bone whose transform places the widget instead of the owner's.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_shape_transform: Option<String>,
    /// Colour group name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bone_group: Option<String>,
}

/// A bone with its edit-mode geometry and pose-mode data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Bone {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub head: Vec3,
    pub tail: Vec3,
    #[serde(default)]
    pub roll: f64,
    #[serde(default, skip_serializing_if = "is_false")]
    pub use_connect: bool,
    #[serde(default = "default_true")]
    pub use_deform: bool,
    #[serde(default)]
    pub layers: LayerMask,
    #[serde(default)]
    pub pose: PoseSettings,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, CustomProperty>,
    /// Rig type governing this bone (meta-skeleton only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rig_type: Option<String>,
    #[serde(default, skip_serializing_if = "RigParameters::is_empty")]
    pub parameters: RigParameters,
}

impl Bone {
    /// New deforming bone on layer 0.
    pub fn new(name: impl Into<String>, head: Vec3, tail: Vec3) -> Self {
        Self {
            name: name.into(),
            parent: None,
            head,
            tail,
            roll: 0.0,
            use_connect: false,
            use_deform: true,
            layers: LayerMask::first(),
            pose: PoseSettings::default(),
            constraints: Vec::new(),
            properties: BTreeMap::new(),
            rig_type: None,
            parameters: RigParameters::new(),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_connect(mut self, use_connect: bool) -> Self {
        self.use_connect = use_connect;
        self
    }

    pub fn with_roll(mut self, roll: f64) -> Self {
        self.roll = roll;
        self
    }

    pub fn with_rig_type(mut self, rig_type: impl Into<String>) -> Self {
        self.rig_type = Some(rig_type.into());
        self
    }

    pub fn with_parameters(mut self, parameters: RigParameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_rotation_mode(mut self, mode: RotationMode) -> Self {
        self.pose.rotation_mode = mode;
        self
    }

    pub fn with_layers(mut self, layers: LayerMask) -> Self {
        self.layers = layers;
        self
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Head-to-tail vector.
    pub fn vector(&self) -> Vec3 {
        math::sub(self.tail, self.head)
    }

    pub fn length(&self) -> f64 {
        math::length(self.vector())
    }

    /// Moves the tail along the bone direction so the bone is `length` long.
    ///
    /// Zero-length bones have no direction and are left unchanged.
    pub fn set_length(&mut self, length: f64) {
        if let Some(dir) = math::normalize(self.vector()) {
            self.tail = math::add(self.head, math::scale(dir, length));
        }
    }

    /// Reverses the bone in place, keeping its orientation about the axis.
    pub fn flip(&mut self) {
        std::mem::swap(&mut self.head, &mut self.tail);
        self.roll = -self.roll;
    }

    /// Rig type tag with all whitespace removed; `None` when that leaves nothing.
    pub fn rig_type_tag(&self) -> Option<String> {
        let tag: String = self
            .rig_type
            .as_deref()?
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        (!tag.is_empty()).then_some(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_set_length_keeps_direction() {
        let mut bone = Bone::new("Bone", [0.0, 0.0, 0.0], [0.0, 0.0, 2.0]);
        bone.set_length(0.5);
        assert_eq!(bone.tail, [0.0, 0.0, 0.5]);

        let mut degenerate = Bone::new("Bone", [1.0, 1.0, 1.0], [1.0, 1.0, 1.0]);
        degenerate.set_length(3.0);
        assert_eq!(degenerate.tail, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_flip() {
        let mut bone = Bone::new("Bone", [0.0, 0.0, 0.0], [0.0, 0.0, 1.0]).with_roll(0.3);
        bone.flip();
        assert_eq!(bone.head, [0.0, 0.0, 1.0]);
        assert_eq!(bone.tail, [0.0, 0.0, 0.0]);
        assert_eq!(bone.roll, -0.3);
    }

    #[test]
    fn test_rig_type_tag() {
        let bone = Bone::new("a", [0.0; 3], [0.0, 0.0, 1.0]);
        assert_eq!(bone.rig_type_tag(), None);
        assert_eq!(bone.clone().with_rig_type("  ").rig_type_tag(), None);
        assert_eq!(
            bone.with_rig_type(" limbs. arm ").rig_type_tag().as_deref(),
            Some("limbs.arm")
        );
    }

    #[test]
    fn test_bone_json_defaults() {
        let bone: Bone = serde_json::from_str(
            r#"{"name": "upper_arm.L", "head": [0, 0, 0], "tail": [0.2588, 0.0148, 0], "rig_type": "limbs.arm"}"#,
        )
        .unwrap();
        assert!(bone.use_deform);
        assert!(!bone.use_connect);
        assert_eq!(bone.layers, LayerMask::first());
        assert_eq!(bone.pose.rotation_mode, RotationMode::Quaternion);
    }

    #[test]
    fn test_rotation_mode_serde() {
        assert_eq!(serde_json::to_string(&RotationMode::Zxy).unwrap(), "\"ZXY\"");
        assert_eq!(
            serde_json::to_string(&RotationMode::AxisAngle).unwrap(),
            "\"AXIS_ANGLE\""
        );
    }

    #[test]
    fn test_custom_property_clamps() {
        let mut prop = CustomProperty::unit(1.0).with_description("Switch eyes follow to face");
        prop.set_value(2.0);
        assert_eq!(prop.value, 1.0);
        prop.set_value(-1.0);
        assert_eq!(prop.value, 0.0);
    }
}
