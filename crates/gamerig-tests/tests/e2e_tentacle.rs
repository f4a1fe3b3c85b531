//! The three-bone tentacle scenario end to end: bone counts per class,
//! the IK/FK slider, the UI and the snap operators.

use gamerig_generate::rigs::tentacle;
use gamerig_generate::snap::{operator_id, PoseState, Transform};
use gamerig_generate::ui::{OperatorArg, UiItem};
use gamerig_spec::naming::{is_mch, is_org};
use gamerig_tests::fixtures;
use pretty_assertions::assert_eq;

#[test]
fn tentacle_bone_classes() {
    let rig = fixtures::generate(&tentacle::sample());
    let names = rig.armature.bone_names();

    let org: Vec<&String> = names.iter().filter(|n| is_org(n)).collect();
    let fk_ctrls: Vec<&String> = names.iter().filter(|n| n.starts_with("Bone_fk")).collect();
    let ik_ctrls: Vec<&String> = names.iter().filter(|n| n.starts_with("Bone_ik")).collect();
    let fk_mch: Vec<&String> = names.iter().filter(|n| n.starts_with("MCH-Bone_fk")).collect();
    let ik_mch: Vec<&String> = names.iter().filter(|n| n.starts_with("MCH-Bone_ik")).collect();

    assert_eq!(org.len(), 3);
    assert_eq!(fk_ctrls.len(), 4, "{:?}", fk_ctrls);
    assert_eq!(ik_ctrls.len(), 2, "{:?}", ik_ctrls);
    assert_eq!(fk_mch.len(), 4, "{:?}", fk_mch);
    assert_eq!(ik_mch.len(), 4, "{:?}", ik_mch);
    assert_eq!(names.len(), 17);
    assert!(names.iter().filter(|n| is_mch(n)).count() == 8);
}

#[test]
fn tentacle_switch_property() {
    let rig = fixtures::generate(&tentacle::sample());
    let first = rig.armature.get("Bone_fk").unwrap();
    let switch = &first.properties["IK/FK"];
    assert_eq!(switch.value, 1.0);
    assert_eq!((switch.min, switch.max), (0.0, 1.0));
    assert_eq!((switch.soft_min, switch.soft_max), (0.0, 1.0));
    assert!(!first.properties.contains_key("Rig/Phy"));
}

#[test]
fn tentacle_ui_lists_switch_and_snaps() {
    let rig = fixtures::generate(&tentacle::sample());
    let items = rig.ui.visible_items(&["Bone_fk.001"]);
    assert!(items.iter().any(|item| matches!(
        item,
        UiItem::Property { bone, property, .. } if bone == "Bone_fk" && property == "IK/FK"
    )));
    assert!(rig.ui.visible_items(&["ORG-Bone"]).is_empty());

    let ids: Vec<String> = rig.operators().ids().map(str::to_string).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.iter().all(|id| id.starts_with("pose.gamerig_") && id.ends_with(&rig.rig_id)));
    assert!(rig.script.contains("\"IK/FK\""));
}

#[test]
fn tentacle_snap_moves_controls() {
    let rig = fixtures::generate(&tentacle::sample());
    let registry = rig.operators();
    let items = rig.ui.visible_items(&["Bone_ik"]);
    let snaps: Vec<&UiItem> = items
        .into_iter()
        .filter(|item| matches!(item, UiItem::Operator { .. }))
        .collect();
    assert_eq!(snaps.len(), 2);

    // Put every bone an operator mentions somewhere distinct.
    let mut pose = PoseState::new();
    let mut offset = 0.0;
    for item in &snaps {
        let UiItem::Operator { arguments, .. } = item else {
            unreachable!()
        };
        for arg in arguments.values() {
            let bones = match arg {
                OperatorArg::Bone(b) => vec![b.clone()],
                OperatorArg::Bones(bs) => bs.clone(),
            };
            for bone in bones {
                offset += 1.0;
                pose.set(
                    bone,
                    Transform {
                        translation: [offset, 0.0, 0.0],
                        ..Transform::default()
                    },
                );
            }
        }
    }

    for item in snaps {
        let UiItem::Operator {
            operator,
            arguments,
            ..
        } = item
        else {
            unreachable!()
        };
        registry.invoke_item(item, &mut pose).unwrap();
        let decl = registry.get(&operator_id(operator, &rig.rig_id)).unwrap();
        let list = |name: &str| match &arguments[name] {
            OperatorArg::Bones(bs) => bs.clone(),
            OperatorArg::Bone(b) => vec![b.clone()],
        };
        let targets = list(decl.arguments[0]);
        let sources = list(decl.arguments[1]);
        for (target, source) in targets.iter().zip(&sources) {
            assert_eq!(pose.get(target), pose.get(source), "{} <- {}", target, source);
        }
    }
}
