//! Topology of generated rigs: every generated bone has a finite ancestor
//! chain and every constraint, driver and parent reference resolves.

use gamerig_generate::rigs::{face, tentacle};
use gamerig_spec::naming::{is_mch, is_org};
use gamerig_tests::fixtures;
use gamerig_tests::topology::{ancestor_chain, assert_well_formed};
use pretty_assertions::assert_eq;

#[test]
fn leg_is_well_formed() {
    let rig = fixtures::generate(&fixtures::leg());
    assert_well_formed(&rig.armature);
    for name in ["thigh_fk.L", "thigh_ik.L", "foot_ik.L", "toe_ik.L", "MCH-thigh_ik_target.L"] {
        assert!(rig.armature.contains(name), "missing {}", name);
    }
}

#[test]
fn arm_pair_is_well_formed() {
    let rig = fixtures::generate(&fixtures::both_sides(&fixtures::arm()));
    assert_well_formed(&rig.armature);
    assert_eq!(rig.report.instances.len(), 2);
    assert_eq!(rig.armature.len(), 26);
}

#[test]
fn segmented_tentacle_is_well_formed() {
    let rig = fixtures::generate(&fixtures::segmented_tentacle());
    let arm = &rig.armature;
    assert_well_formed(arm);

    // Two segments: IK controls at both ends of each.
    for name in ["Bone_ik", "Bone_ik.001", "Bone_ik.002", "Bone_ik.004"] {
        assert!(arm.contains(name), "missing {}", name);
    }
    let first = arm.get("MCH-Bone_ik.001").unwrap();
    assert_eq!(first.constraints[0].subtarget.as_deref(), Some("Bone_ik.001"));
    let last = arm.get("MCH-Bone_ik.004").unwrap();
    assert_eq!(last.constraints[0].subtarget.as_deref(), Some("Bone_ik.004"));
}

#[test]
fn face_is_well_formed() {
    let rig = fixtures::generate(&face::sample());
    assert_well_formed(&rig.armature);
}

#[test]
fn generated_bones_root_at_declared_roots() {
    let rig = fixtures::generate(&tentacle::sample());
    let arm = &rig.armature;
    for bone in arm.bones() {
        let chain = ancestor_chain(arm, &bone.name).unwrap();
        let root = chain.last().cloned().unwrap_or_else(|| bone.name.clone());
        assert!(arm.get(&root).unwrap().parent.is_none());
    }
}

#[test]
fn original_and_mechanism_bones_are_hidden() {
    let rig = fixtures::generate(&fixtures::leg());
    let arm = &rig.armature;
    for bone in arm.bones() {
        if is_org(&bone.name) {
            assert_eq!(bone.layers.active().collect::<Vec<_>>(), vec![31], "{}", bone.name);
        } else if is_mch(&bone.name) {
            assert_eq!(bone.layers.active().collect::<Vec<_>>(), vec![30], "{}", bone.name);
        }
    }
    assert!(!arm.visible_layers.is_set(30));
    assert!(!arm.visible_layers.is_set(31));
    assert!(!arm.bones().iter().any(|b| b.name.starts_with("JIG-")));
}
