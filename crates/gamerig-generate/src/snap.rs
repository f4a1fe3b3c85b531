//! FK/IK snap operators.
//!
//! Snapping copies world-space transform channels from one list of bones to
//! another at invocation time. It is an instantaneous pose edit, not a
//! constraint, and acts on an explicit [`PoseState`].

use std::collections::BTreeMap;

use gamerig_spec::{ErrorCategory, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ui::{OperatorArg, RigUi, UiItem};

// =============================================================================
// Pose state
// =============================================================================

/// World-space transform of a pose bone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translation: Vec3,
    /// Quaternion (w, x, y, z).
    pub rotation: [f64; 4],
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: [0.0; 3],
            rotation: [1.0, 0.0, 0.0, 0.0],
            scale: [1.0; 3],
        }
    }
}

/// Which channels a snap copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Channels {
    pub translation: bool,
    pub rotation: bool,
    pub scale: bool,
}

impl Channels {
    pub const ALL: Channels = Channels {
        translation: true,
        rotation: true,
        scale: true,
    };
    pub const ROTATION_SCALE: Channels = Channels {
        translation: false,
        rotation: true,
        scale: true,
    };
}

/// Current world-space transforms of the bones an operator touches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoseState {
    bones: BTreeMap<String, Transform>,
}

impl PoseState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, bone: impl Into<String>, transform: Transform) {
        self.bones.insert(bone.into(), transform);
    }

    pub fn with(mut self, bone: impl Into<String>, transform: Transform) -> Self {
        self.set(bone, transform);
        self
    }

    pub fn get(&self, bone: &str) -> Option<&Transform> {
        self.bones.get(bone)
    }

    /// Copies the selected channels of `source` onto `target`.
    pub fn match_pose(&mut self, target: &str, source: &str, channels: Channels) -> Result<(), SnapError> {
        let from = *self.get(source).ok_or_else(|| SnapError::MissingBone {
            bone: source.to_string(),
        })?;
        let to = self.bones.get_mut(target).ok_or_else(|| SnapError::MissingBone {
            bone: target.to_string(),
        })?;
        if channels.translation {
            to.translation = from.translation;
        }
        if channels.rotation {
            to.rotation = from.rotation;
        }
        if channels.scale {
            to.scale = from.scale;
        }
        Ok(())
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Failures invoking a snap operator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SnapError {
    #[error("unknown operator '{id}'")]
    UnknownOperator { id: String },

    #[error("operator '{operator}' is missing argument '{argument}'")]
    MissingArgument { operator: String, argument: String },

    #[error("operator '{operator}' argument '{argument}' has the wrong kind")]
    WrongArgumentKind { operator: String, argument: String },

    #[error("pose has no bone '{bone}'")]
    MissingBone { bone: String },
}

impl ErrorCategory for SnapError {
    fn code(&self) -> &'static str {
        match self {
            SnapError::UnknownOperator { .. } => "GAMERIG_301",
            SnapError::MissingArgument { .. } => "GAMERIG_302",
            SnapError::WrongArgumentKind { .. } => "GAMERIG_303",
            SnapError::MissingBone { .. } => "GAMERIG_304",
        }
    }

    fn category(&self) -> &'static str {
        "snap"
    }
}

// =============================================================================
// Operator declarations
// =============================================================================

/// What an operator does with its arguments.
///
/// Limb actions read six single-bone arguments in declaration order:
/// upper FK, lower FK, terminal FK, upper IK, lower IK, terminal IK.
/// Chain actions read two bone-list arguments: targets, then sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapAction {
    LimbFkToIk,
    LimbIkToFk,
    ChainMatch,
}

/// An operator a rig type contributes to the generated UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorDecl {
    /// Short name, e.g. `arm_fk2ik`.
    pub name: &'static str,
    pub label: &'static str,
    pub arguments: &'static [&'static str],
    pub action: SnapAction,
}

impl OperatorDecl {
    /// Host identifier of this operator for a given rig.
    pub fn id(&self, rig_id: &str) -> String {
        operator_id(self.name, rig_id)
    }
}

/// `pose.gamerig_<name>_<rig_id>`
pub fn operator_id(name: &str, rig_id: &str) -> String {
    format!("pose.gamerig_{}_{}", name, rig_id)
}

type Args = BTreeMap<String, OperatorArg>;

fn bone_arg<'a>(decl: &OperatorDecl, args: &'a Args, index: usize) -> Result<&'a str, SnapError> {
    let name = decl.arguments.get(index).copied().unwrap_or_default();
    match args.get(name) {
        Some(OperatorArg::Bone(bone)) => Ok(bone),
        Some(OperatorArg::Bones(_)) => Err(SnapError::WrongArgumentKind {
            operator: decl.name.to_string(),
            argument: name.to_string(),
        }),
        None => Err(SnapError::MissingArgument {
            operator: decl.name.to_string(),
            argument: name.to_string(),
        }),
    }
}

fn bones_arg<'a>(decl: &OperatorDecl, args: &'a Args, index: usize) -> Result<&'a [String], SnapError> {
    let name = decl.arguments.get(index).copied().unwrap_or_default();
    match args.get(name) {
        Some(OperatorArg::Bones(bones)) => Ok(bones),
        Some(OperatorArg::Bone(_)) => Err(SnapError::WrongArgumentKind {
            operator: decl.name.to_string(),
            argument: name.to_string(),
        }),
        None => Err(SnapError::MissingArgument {
            operator: decl.name.to_string(),
            argument: name.to_string(),
        }),
    }
}

impl SnapAction {
    fn execute(&self, decl: &OperatorDecl, args: &Args, pose: &mut PoseState) -> Result<(), SnapError> {
        match self {
            SnapAction::LimbFkToIk => {
                let [upper_fk, lower_fk, end_fk, upper_ik, lower_ik, end_ik] =
                    limb_args(decl, args)?;
                pose.match_pose(upper_fk, upper_ik, Channels::ALL)?;
                pose.match_pose(lower_fk, lower_ik, Channels::ROTATION_SCALE)?;
                pose.match_pose(end_fk, end_ik, Channels::ALL)
            }
            SnapAction::LimbIkToFk => {
                let [upper_fk, _, end_fk, upper_ik, _, end_ik] = limb_args(decl, args)?;
                pose.match_pose(end_ik, end_fk, Channels::ALL)?;
                pose.match_pose(upper_ik, upper_fk, Channels::ALL)
            }
            SnapAction::ChainMatch => {
                let targets = bones_arg(decl, args, 0)?;
                let sources = bones_arg(decl, args, 1)?;
                for (target, source) in targets.iter().zip(sources) {
                    pose.match_pose(target, source, Channels::ALL)?;
                }
                Ok(())
            }
        }
    }
}

fn limb_args<'a>(decl: &OperatorDecl, args: &'a Args) -> Result<[&'a str; 6], SnapError> {
    Ok([
        bone_arg(decl, args, 0)?,
        bone_arg(decl, args, 1)?,
        bone_arg(decl, args, 2)?,
        bone_arg(decl, args, 3)?,
        bone_arg(decl, args, 4)?,
        bone_arg(decl, args, 5)?,
    ])
}

// =============================================================================
// Registry
// =============================================================================

/// Operators registered by one generated rig, keyed by host identifier.
#[derive(Debug, Clone, Default)]
pub struct OperatorRegistry {
    rig_id: String,
    operators: BTreeMap<String, OperatorDecl>,
}

impl OperatorRegistry {
    /// Registers every operator the UI declares.
    pub fn from_ui(ui: &RigUi) -> Self {
        let operators = ui
            .operators
            .iter()
            .map(|decl| (decl.id(&ui.rig_id), decl.clone()))
            .collect();
        Self {
            rig_id: ui.rig_id.clone(),
            operators,
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.operators.keys().map(String::as_str)
    }

    pub fn get(&self, id: &str) -> Option<&OperatorDecl> {
        self.operators.get(id)
    }

    pub fn invoke(&self, id: &str, args: &Args, pose: &mut PoseState) -> Result<(), SnapError> {
        let decl = self.get(id).ok_or_else(|| SnapError::UnknownOperator { id: id.to_string() })?;
        decl.action.execute(decl, args, pose)
    }

    /// Invokes an operator button exactly as placed in the UI.
    pub fn invoke_item(&self, item: &UiItem, pose: &mut PoseState) -> Result<(), SnapError> {
        match item {
            UiItem::Operator {
                operator, arguments, ..
            } => self.invoke(&operator_id(operator, &self.rig_id), arguments, pose),
            UiItem::Property { bone, property, .. } => Err(SnapError::UnknownOperator {
                id: format!("{}[\"{}\"]", bone, property),
            }),
        }
    }
}
