//! Leg: thigh, shin, foot and toe with IK foot and toe controls.

use gamerig_spec::{Bone, Metarig, ResolvedParams, RigParameters};

use super::{ctrl_name, Limb, LimbKind};
use crate::armature::{Armature, EditMode, PoseMode};
use crate::error::RigResult;
use crate::rigs::Rig;
use crate::snap::{OperatorDecl, SnapAction};
use crate::widgets::{WidgetLibrary, WidgetShape};

const ARGUMENTS: &[&str] = &["thigh_fk", "shin_fk", "foot_fk", "thigh_ik", "shin_ik", "foot_ik"];

/// FK->IK and IK->FK snapping for legs.
pub const OPERATORS: [OperatorDecl; 2] = [
    OperatorDecl {
        name: "leg_fk2ik",
        label: "Snap FK leg to IK",
        arguments: ARGUMENTS,
        action: SnapAction::LimbFkToIk,
    },
    OperatorDecl {
        name: "leg_ik2fk",
        label: "Snap IK leg to FK",
        arguments: ARGUMENTS,
        action: SnapAction::LimbIkToFk,
    },
];

pub fn construct(armature: &Armature, base: &str, params: &ResolvedParams) -> RigResult<Box<dyn Rig>> {
    Ok(Box::new(Limb::new(LimbKind::Leg, armature, base, params)?))
}

pub fn operators() -> Vec<OperatorDecl> {
    OPERATORS.to_vec()
}

/// IK foot control plus an IK toe control that rides on it.
pub(super) fn create_terminal(limb: &mut Limb, edit: &mut EditMode<'_>) -> RigResult<()> {
    let foot = limb.org[2].clone();
    let toe = limb.org[3].clone();
    let foot_key = limb.map.copy_bone(edit, &foot, &ctrl_name(&foot, "ik"))?;
    edit.set_parent(&limb.name(&foot_key)?, None)?;
    let toe_key = limb.map.copy_bone(edit, &toe, &ctrl_name(&toe, "ik"))?;
    limb.bones.terminals.push(foot_key);
    limb.bones.terminals.push(toe_key);
    Ok(())
}

pub(super) fn wire_terminal(
    limb: &mut Limb,
    pose: &mut PoseMode<'_>,
    widgets: &mut WidgetLibrary,
) -> RigResult<()> {
    let foot = limb.name(&limb.bones.terminals[0])?;
    let toe = limb.name(&limb.bones.terminals[1])?;
    let settings = pose.pose_mut(&toe)?;
    settings.lock_location = [true; 3];
    widgets.build(&foot, WidgetShape::Cube);
    widgets.build(&toe, WidgetShape::Limb);
    Ok(())
}

/// Left leg standing on the ground plane.
pub fn sample() -> Metarig {
    Metarig::new("metarig")
        .with_bone(
            Bone::new("thigh.L", [0.098, 0.013, 1.0], [0.098, -0.001, 0.55])
                .with_rig_type("limbs.leg")
                .with_parameters(RigParameters::new().with("rotation_axis", "x")),
        )
        .with_bone(
            Bone::new("shin.L", [0.098, -0.001, 0.55], [0.098, 0.03, 0.1])
                .with_parent("thigh.L")
                .with_connect(true),
        )
        .with_bone(
            Bone::new("foot.L", [0.098, 0.03, 0.1], [0.098, -0.09, 0.03])
                .with_parent("shin.L")
                .with_connect(true),
        )
        .with_bone(
            Bone::new("toe.L", [0.098, -0.09, 0.03], [0.098, -0.14, 0.03])
                .with_parent("foot.L")
                .with_connect(true),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::{GenerateConfig, Generator};
    use gamerig_spec::math::approx_eq;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_leg_terminals() {
        let rig = Generator::new(GenerateConfig::default().with_seed(1))
            .generate(&sample(), None)
            .unwrap();
        let arm = &rig.armature;
        let parent = |name: &str| arm.get(name).unwrap().parent.clone();

        assert_eq!(parent("toe_ik.L").as_deref(), Some("foot_ik.L"));
        assert_eq!(parent("MCH-thigh_ik_target.L").as_deref(), Some("foot_ik.L"));
        assert_eq!(parent("toe_fk.L").as_deref(), Some("MCH-toe_fk.L"));
        assert_eq!(parent("MCH-toe_fk.L").as_deref(), Some("foot_fk.L"));

        // The stretch helper ends at the foot.
        let stretch = arm.get("MCH-thigh_ik_stretch.L").unwrap();
        assert!(approx_eq(stretch.tail, [0.098, 0.03, 0.1], 1e-9));

        // Every original bone blends an IK and an FK copy.
        let toe = arm.get("ORG-toe.L").unwrap();
        assert_eq!(toe.constraints[0].subtarget.as_deref(), Some("toe_ik.L"));
        assert_eq!(toe.constraints[1].subtarget.as_deref(), Some("toe_fk.L"));
    }
}
