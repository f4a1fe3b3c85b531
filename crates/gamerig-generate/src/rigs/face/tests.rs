use super::*;
use crate::generate::{GenerateConfig, GeneratedRig, Generator};
use gamerig_spec::math::approx_eq;
use gamerig_spec::{Metarig, RigParameters};
use pretty_assertions::assert_eq;

fn generate(metarig: &Metarig) -> GeneratedRig {
    Generator::new(GenerateConfig::default().with_seed(11))
        .generate(metarig, None)
        .unwrap()
}

fn parent_of(rig: &GeneratedRig, name: &str) -> Option<String> {
    rig.armature.get(name).unwrap().parent.clone()
}

#[test]
fn test_controls_and_mechanism() {
    let rig = generate(&sample());
    let arm = &rig.armature;
    for name in [
        "eye.L",
        "eye.R",
        "eyes",
        "eye_master.L",
        "eye_master.R",
        "nose_master",
        "ear.L",
        "jaw_master",
        "tongue_master",
        "MCH-eye.L",
        "MCH-eye.L.001",
        "MCH-eyes_parent",
        "MCH-lid.T.L.003",
        "MCH-mouth_lock",
        "MCH-jaw_master.004",
        "MCH-tongue.002",
        "MCH-tongue_parent",
        "MCH-chin_parent",
        "MCH-chin",
        "MCH-target_nose",
        "lip.T",
        "lips.L",
        "nose.004",
        "chin.002",
        "tongue.003",
        "brow.B.L.004",
    ] {
        assert!(arm.contains(name), "missing {}", name);
    }
    assert!(!arm.contains("MCH-target_face"));
    assert!(!arm.contains("lip.T.R"));
    assert!(!arm.has_parent_cycle());

    let jaw = arm.get("jaw_master").unwrap();
    let left = arm.get("ORG-jaw.L").unwrap().head;
    let right = arm.get("ORG-jaw.R").unwrap().head;
    assert!(approx_eq(jaw.head, gamerig_spec::math::midpoint(left, right), 1e-9));

    let fan: Vec<f64> = ["MCH-mouth_lock", "MCH-jaw_master", "MCH-jaw_master.004"]
        .iter()
        .map(|n| arm.get(n).unwrap().length())
        .collect();
    assert!((fan[0] - jaw.length()).abs() < 1e-9);
    assert!((fan[2] - jaw.length() / 6.0).abs() < 1e-9);
}

#[test]
fn test_parenting() {
    let rig = generate(&sample());
    let parent = |name: &str| parent_of(&rig, name);

    assert_eq!(parent("eyes").as_deref(), Some("MCH-eyes_parent"));
    assert_eq!(parent("eye.L").as_deref(), Some("eyes"));
    assert_eq!(parent("MCH-eyes_parent"), None);
    assert_eq!(parent("MCH-eye.L").as_deref(), Some("eye_master.L"));
    assert_eq!(parent("MCH-lid.B.R").as_deref(), Some("eye_master.R"));
    assert_eq!(parent("lid.T.L.002").as_deref(), Some("eye_master.L"));
    assert_eq!(parent("nose_master").as_deref(), Some("MCH-jaw_master.004"));
    assert_eq!(parent("lips.L").as_deref(), Some("MCH-jaw_master.002"));
    assert_eq!(parent("lip.T").as_deref(), Some("MCH-jaw_master.003"));
    assert_eq!(parent("chin").as_deref(), Some("MCH-chin_parent"));
    assert_eq!(parent("chin.002").as_deref(), Some("lip.B"));
    assert_eq!(parent("tongue_master").as_deref(), Some("MCH-tongue_parent"));
    assert_eq!(parent("tongue.001").as_deref(), Some("MCH-tongue.001"));
    assert_eq!(parent("ear.L.003").as_deref(), Some("ear.L"));

    assert_eq!(parent("MCH-target_nose.001").as_deref(), Some("nose.001"));
    assert_eq!(parent("MCH-target_lip.T.R").as_deref(), Some("lip.T"));
    assert_eq!(parent("MCH-target_cheek.B.L").as_deref(), Some("lips.L"));
    assert_eq!(parent("MCH-target_cheek.T.R").as_deref(), Some("brow.T.R"));
    assert_eq!(parent("MCH-target_ear.L.001").as_deref(), Some("ear.L"));
    assert_eq!(parent("MCH-target_eye.L").as_deref(), Some("MCH-eye.L"));
    assert_eq!(parent("MCH-target_lid.T.L").as_deref(), Some("MCH-lid.T.L"));
    assert_eq!(parent("MCH-target_temple.L").as_deref(), Some("ORG-head"));

    // Lids leave their chains; every other original bone keeps its parent.
    assert_eq!(parent("ORG-lid.T.L.001").as_deref(), Some("ORG-head"));
    assert_eq!(parent("ORG-nose.001").as_deref(), Some("ORG-nose"));
}

#[test]
fn test_deformation_wiring() {
    let rig = generate(&sample());
    let arm = &rig.armature;
    let kinds = |name: &str| {
        arm.get(name)
            .unwrap()
            .constraints
            .iter()
            .map(|c| (c.kind.clone(), c.subtarget.clone().unwrap_or_default()))
            .collect::<Vec<_>>()
    };

    assert_eq!(
        kinds("MCH-target_nose"),
        vec![
            (ConstraintKind::damped_track(0.0), "nose.001".to_string()),
            (ConstraintKind::stretch_to(0.0), "nose.001".to_string()),
        ]
    );
    assert_eq!(kinds("MCH-target_temple.L")[0].1, "jaw.L");
    assert_eq!(
        kinds("MCH-target_lid.B.L")[0],
        (ConstraintKind::damped_track(1.0), "MCH-lid.B.L.001".to_string())
    );
    assert_eq!(kinds("MCH-target_lid.T.L.003")[0].1, "MCH-lid.B.L");
    assert_eq!(
        kinds("ORG-nose"),
        vec![(ConstraintKind::CopyTransforms, "MCH-target_nose".to_string())]
    );
    assert!(arm.get("ORG-head").unwrap().constraints.is_empty());
}

#[test]
fn test_mechanism_wiring() {
    let rig = generate(&sample());
    let arm = &rig.armature;

    let influences: Vec<f64> = tables::JAW_FAN
        .iter()
        .map(|(bone, _)| arm.get(bone).unwrap().constraints[0].influence)
        .collect();
    assert_eq!(influences, vec![0.20, 1.0, 0.75, 0.35, 0.10, 0.025]);
    let lock = &arm.get("MCH-jaw_master.002").unwrap().constraints[1];
    assert_eq!(lock.subtarget.as_deref(), Some("MCH-mouth_lock"));

    let tongue: Vec<f64> = ["MCH-tongue.001", "MCH-tongue.002"]
        .iter()
        .map(|n| arm.get(n).unwrap().constraints[0].influence)
        .collect();
    assert!((tongue[0] - 2.0 / 3.0).abs() < 1e-12);
    assert!((tongue[1] - 1.0 / 3.0).abs() < 1e-12);

    let follow = &arm.get("MCH-eye.L.001").unwrap().constraints[0];
    assert_eq!(follow.kind, ConstraintKind::copy_location(1.0));
    assert_eq!(follow.subtarget.as_deref(), Some("MCH-eye.L"));

    let nose = &arm.get("nose.003").unwrap().constraints[0];
    assert_eq!(
        nose.kind,
        ConstraintKind::CopyLocation {
            use_offset: true,
            invert: [true; 3],
            head_tail: 0.0
        }
    );
    assert_eq!(nose.influence, 0.5);

    // Right-side rows mirror the left-side table.
    let brow = &arm.get("brow.T.R.002").unwrap().constraints;
    assert_eq!(brow[0].subtarget.as_deref(), Some("brow.T.R.001"));
    assert_eq!(brow[1].subtarget.as_deref(), Some("brow.T.R.003"));
    let lip = &arm.get("lip.T.R.001").unwrap().constraints;
    assert_eq!(lip.last().unwrap().kind, ConstraintKind::CopyScale { use_offset: true });
    assert_eq!(lip.last().unwrap().subtarget.as_deref(), Some("lip.T"));
}

#[test]
fn test_follow_properties() {
    let rig = generate(&sample());
    let arm = &rig.armature;

    assert_eq!(arm.get("jaw_master").unwrap().properties["Mouth Lock"].value, 0.0);
    assert_eq!(arm.get("eyes").unwrap().properties["Eyes Follow"].value, 1.0);
    assert_eq!(arm.get("tongue_master").unwrap().properties["Tongue Follow"].value, 1.0);
    assert_eq!(arm.get("chin").unwrap().properties["Chin Follow"].value, 1.0);

    let mouth_lock: Vec<&str> = arm
        .drivers()
        .iter()
        .filter(|d| d.variables[0].source.property == "Mouth Lock")
        .map(|d| d.target.bone())
        .collect();
    assert_eq!(
        mouth_lock,
        vec!["MCH-jaw_master", "MCH-jaw_master.001", "MCH-jaw_master.002", "MCH-jaw_master.003"]
    );
    assert!(arm.drivers().iter().all(|d| d.kind == DriverKind::Sum));

    let fragment = rig.ui.fragments.iter().find(|f| f.rig_type == RIG_TYPE).unwrap();
    assert_eq!(fragment.items().count(), 4);
}

#[test]
fn test_tweak_layers_follow_parameters() {
    let mut metarig = sample();
    metarig.bones[0].parameters = RigParameters::new().with("secondary_layers_extra", false);
    let rig = generate(&metarig);
    let arm = &rig.armature;

    assert!(arm.contains("nose.002"));
    assert!(!arm.contains("nose.001"));
    assert!(arm.get("nose.002").unwrap().layers.is_set(1));
    // No tweak to stretch to leaves the target unconstrained.
    assert!(arm.get("MCH-target_nose").unwrap().constraints.is_empty());
}
