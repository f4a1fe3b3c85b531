//! Arm: upper arm, forearm and hand with an IK hand control.

use gamerig_spec::{Bone, LayerMask, Metarig, ResolvedParams, RigParameters};

use super::{ctrl_name, Limb, LimbKind};
use crate::armature::{Armature, EditMode, PoseMode};
use crate::error::RigResult;
use crate::rigs::Rig;
use crate::snap::{OperatorDecl, SnapAction};
use crate::widgets::{WidgetLibrary, WidgetShape};

const ARGUMENTS: &[&str] = &["uarm_fk", "farm_fk", "hand_fk", "uarm_ik", "farm_ik", "hand_ik"];

/// FK->IK and IK->FK snapping for arms.
pub const OPERATORS: [OperatorDecl; 2] = [
    OperatorDecl {
        name: "arm_fk2ik",
        label: "Snap FK arm to IK",
        arguments: ARGUMENTS,
        action: SnapAction::LimbFkToIk,
    },
    OperatorDecl {
        name: "arm_ik2fk",
        label: "Snap IK arm to FK",
        arguments: ARGUMENTS,
        action: SnapAction::LimbIkToFk,
    },
];

pub fn construct(armature: &Armature, base: &str, params: &ResolvedParams) -> RigResult<Box<dyn Rig>> {
    Ok(Box::new(Limb::new(LimbKind::Arm, armature, base, params)?))
}

pub fn operators() -> Vec<OperatorDecl> {
    OPERATORS.to_vec()
}

/// IK hand control, a copy of the hand without a parent.
pub(super) fn create_terminal(limb: &mut Limb, edit: &mut EditMode<'_>) -> RigResult<()> {
    let hand = limb.org[2].clone();
    let key = limb.map.copy_bone(edit, &hand, &ctrl_name(&hand, "ik"))?;
    edit.set_parent(&limb.name(&key)?, None)?;
    limb.bones.terminals.push(key);
    Ok(())
}

pub(super) fn wire_terminal(
    limb: &mut Limb,
    _pose: &mut PoseMode<'_>,
    widgets: &mut WidgetLibrary,
) -> RigResult<()> {
    let hand = limb.name(&limb.bones.terminals[0])?;
    widgets.build(&hand, WidgetShape::Hand);
    Ok(())
}

/// Left arm with FK controls on layer 8.
pub fn sample() -> Metarig {
    let params = RigParameters::new()
        .with("fk_layers", LayerMask::single(8))
        .with("allow_ik_stretch", true);
    Metarig::new("metarig")
        .with_bone(
            Bone::new("upper_arm.L", [0.0, 0.0, 0.0], [0.2588, 0.0148, 0.0])
                .with_roll(1.5232)
                .with_rig_type("limbs.arm")
                .with_parameters(params),
        )
        .with_bone(
            Bone::new("forearm.L", [0.2588, 0.0148, 0.0], [0.4940, 0.0, 0.0])
                .with_roll(1.5232)
                .with_parent("upper_arm.L")
                .with_connect(true),
        )
        .with_bone(
            Bone::new("hand.L", [0.4940, 0.0, 0.0], [0.5657, 0.0, 0.0])
                .with_roll(-3.1196)
                .with_parent("forearm.L")
                .with_connect(true),
        )
}
