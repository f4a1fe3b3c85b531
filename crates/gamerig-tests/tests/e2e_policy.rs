//! Lenient and strict handling of rigs that cannot be built.

use gamerig_generate::rigs::tentacle;
use gamerig_generate::ui::UiFragment;
use gamerig_generate::widgets::WidgetLibrary;
use gamerig_generate::{
    Armature, EditMode, GenerateConfig, GenerateError, Generator, Phase, PosePosition, PoseMode, Rig,
    RigError, RigRegistry, RigResult, RigTypeEntry,
};
use gamerig_spec::{Bone, Constraint, ConstraintKind, ErrorCategory, Metarig, ResolvedParams, RigParameters};
use gamerig_tests::fixtures;
use pretty_assertions::assert_eq;

fn with_unknown_type() -> Metarig {
    fixtures::leg().with_bone(
        Bone::new("tail", [0.0, 0.2, 0.5], [0.0, 0.6, 0.5]).with_rig_type("spines.tail"),
    )
}

#[test]
fn lenient_skips_unknown_rig_type() {
    let rig = fixtures::generate(&with_unknown_type());
    assert_eq!(rig.report.instances.len(), 1);
    assert_eq!(rig.report.skipped.len(), 1);

    let skipped = &rig.report.skipped[0];
    assert_eq!(skipped.bone, "tail");
    assert_eq!(skipped.rig_type, "spines.tail");
    assert_eq!(skipped.code, "GAMERIG_202");

    // The bone itself is still carried over.
    assert!(rig.armature.contains("ORG-tail"));
    assert!(rig.armature.contains("thigh_ik.L"));
}

#[test]
fn strict_rejects_unknown_rig_type() {
    let err = Generator::new(GenerateConfig::default().strict())
        .generate(&with_unknown_type(), None)
        .unwrap_err();
    assert_eq!(err.code(), "GAMERIG_202");
    assert!(matches!(
        err,
        GenerateError::UnresolvedRigType { ref bone, ref rig_type } if bone == "tail" && rig_type == "spines.tail"
    ));
}

#[test]
fn short_tentacle_is_a_configuration_error() {
    // A one-bone chain cannot be split into FK and IK controls.
    let metarig = fixtures::tentacle(1, RigParameters::new());

    let rig = fixtures::generate(&metarig);
    assert!(rig.report.instances.is_empty());
    assert_eq!(rig.report.skipped[0].code, "GAMERIG_203");
    assert_eq!(rig.armature.bone_names(), vec!["ORG-Bone".to_string()]);

    let err = Generator::new(GenerateConfig::default().strict())
        .generate(&metarig, None)
        .unwrap_err();
    assert!(matches!(err, GenerateError::Configuration { .. }), "{}", err);
}

#[test]
fn skipped_rig_leaves_the_rest_intact() {
    let mut metarig = fixtures::both_sides(&fixtures::arm());
    let right = metarig.bone_mut("upper_arm.R").unwrap();
    right.rig_type = Some("limbs.wing".to_string());

    let rig = fixtures::generate(&metarig);
    assert_eq!(rig.report.instances.len(), 1);
    assert!(rig.armature.contains("upper_arm_fk.L"));
    assert!(!rig.armature.contains("upper_arm_fk.R"));
    assert!(rig.report.skipped.iter().all(|s| s.code != "GAMERIG_204"));
}

/// Creates a control, then wires a constraint to a bone that does not exist.
#[derive(Debug)]
struct DanglingTarget {
    base: String,
}

impl Rig for DanglingTarget {
    fn rig_type(&self) -> &str {
        "spines.dangling"
    }

    fn base_bone(&self) -> &str {
        &self.base
    }

    fn create_bones(&mut self, edit: &mut EditMode<'_>) -> RigResult<()> {
        edit.copy_bone(&self.base, "tail_ctrl")?;
        Ok(())
    }

    fn parent_bones(&mut self, edit: &mut EditMode<'_>) -> RigResult<()> {
        edit.set_parent("tail_ctrl", None)
    }

    fn wire(&mut self, pose: &mut PoseMode<'_>, _widgets: &mut WidgetLibrary) -> RigResult<()> {
        let track = Constraint::new(ConstraintKind::damped_track(0.0)).with_subtarget("MCH-tail_target");
        pose.add_constraint("tail_ctrl", track)?;
        Ok(())
    }

    fn ui(&self) -> UiFragment {
        UiFragment::new(self.rig_type(), &self.base)
    }
}

fn dangling(_: &Armature, base: &str, _: &ResolvedParams) -> RigResult<Box<dyn Rig>> {
    Ok(Box::new(DanglingTarget { base: base.to_string() }))
}

fn with_dangling_type() -> RigRegistry {
    let mut registry = RigRegistry::builtin();
    registry.register(RigTypeEntry {
        name: "spines.dangling",
        parameters: Vec::new,
        construct: dangling,
        operators: Vec::new,
        sample: tentacle::sample,
    });
    registry
}

#[test]
fn wiring_failure_aborts_in_both_policies() {
    let registry = with_dangling_type();
    // The tentacle sorts first, so it is fully wired before the failing rig.
    let metarig = tentacle::sample()
        .with_bone(Bone::new("tail", [0.0, 0.2, 0.0], [0.0, 0.6, 0.0]).with_rig_type("spines.dangling"));

    for config in [GenerateConfig::default(), GenerateConfig::default().strict()] {
        let err = Generator::with_registry(config, &registry)
            .generate(&metarig, None)
            .unwrap_err();
        assert_eq!(err.code(), "GAMERIG_204");
        let message = err.to_string();
        assert!(message.contains("'ORG-tail'") && message.contains("spines.dangling"), "{}", message);

        let GenerateError::MidGeneration {
            phase,
            bone,
            rig_type,
            source,
            partial,
        } = err
        else {
            panic!("expected a mid-generation failure");
        };
        assert_eq!(phase, Phase::Wiring);
        assert_eq!(bone, "ORG-tail");
        assert_eq!(rig_type, "spines.dangling");
        assert_eq!(source, RigError::missing_bone("MCH-tail_target"));

        // Nothing is rolled back: the tentacle's wiring and the failing
        // rig's own bones are still there.
        let partial = partial.expect("partial armature");
        assert_eq!(partial.pose_position, PosePosition::Pose);
        assert!(partial.contains("tail_ctrl"));
        assert!(partial.get("tail_ctrl").unwrap().constraints.is_empty());
        assert!(!partial.get("MCH-Bone_fk").unwrap().constraints.is_empty());
        assert!(partial.drivers().iter().any(|d| d.target.bone() == "ORG-Bone"));
    }
}
