//! The meta-skeleton: the small annotated bone hierarchy a rigger authors.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::bone::{Bone, RotationMode};
use crate::driver::Driver;
use crate::error::SpecError;
use crate::layers::{ColorGroup, LayerInfo};
use crate::math::Vec3;

fn unit_scale() -> Vec3 {
    [1.0, 1.0, 1.0]
}

/// Object-level placement of an armature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectTransform {
    #[serde(default)]
    pub location: Vec3,
    #[serde(default)]
    pub rotation_mode: RotationMode,
    /// Quaternion (w, x, y, z).
    #[serde(default = "identity_quaternion")]
    pub rotation_quaternion: [f64; 4],
    #[serde(default)]
    pub rotation_euler: Vec3,
    #[serde(default = "unit_scale")]
    pub scale: Vec3,
}

fn identity_quaternion() -> [f64; 4] {
    [1.0, 0.0, 0.0, 0.0]
}

impl Default for ObjectTransform {
    fn default() -> Self {
        Self {
            location: [0.0; 3],
            rotation_mode: RotationMode::Quaternion,
            rotation_quaternion: identity_quaternion(),
            rotation_euler: [0.0; 3],
            scale: unit_scale(),
        }
    }
}

/// Input hierarchy of annotated bones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Metarig {
    pub name: String,
    /// Name of the generated rig object; `rig` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rig_name: Option<String>,
    /// Bones, parents listed before children.
    pub bones: Vec<Bone>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub drivers: Vec<Driver>,
    /// Metadata for layers 0..N.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub layers: Vec<LayerInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub colors: Vec<ColorGroup>,
    #[serde(default)]
    pub transform: ObjectTransform,
}

impl Metarig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rig_name: None,
            bones: Vec::new(),
            drivers: Vec::new(),
            layers: Vec::new(),
            colors: Vec::new(),
            transform: ObjectTransform::default(),
        }
    }

    pub fn with_bone(mut self, bone: Bone) -> Self {
        self.bones.push(bone);
        self
    }

    pub fn with_rig_name(mut self, rig_name: impl Into<String>) -> Self {
        self.rig_name = Some(rig_name.into());
        self
    }

    pub fn with_layer(mut self, layer: LayerInfo) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn with_color(mut self, color: ColorGroup) -> Self {
        self.colors.push(color);
        self
    }

    /// Appends every bone of `other`, used to assemble multi-rig meta-skeletons.
    pub fn merged(mut self, other: Metarig) -> Self {
        self.bones.extend(other.bones);
        self.drivers.extend(other.drivers);
        self
    }

    pub fn bone(&self, name: &str) -> Option<&Bone> {
        self.bones.iter().find(|b| b.name == name)
    }

    pub fn bone_mut(&mut self, name: &str) -> Option<&mut Bone> {
        self.bones.iter_mut().find(|b| b.name == name)
    }

    /// Index of bones by name.
    pub fn index(&self) -> HashMap<&str, usize> {
        self.bones
            .iter()
            .enumerate()
            .map(|(i, b)| (b.name.as_str(), i))
            .collect()
    }

    /// Bones carrying a non-empty rig type.
    pub fn rigged_bones(&self) -> impl Iterator<Item = &Bone> {
        self.bones.iter().filter(|b| b.rig_type_tag().is_some())
    }

    pub fn from_json(json: &str) -> Result<Self, SpecError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, SpecError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_value(&self) -> Result<serde_json::Value, SpecError> {
        Ok(serde_json::to_value(self)?)
    }
}
