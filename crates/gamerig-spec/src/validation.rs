//! Structural validation of meta-skeletons.

use std::collections::{HashMap, HashSet};

use crate::error::{ErrorCode, ValidationError, ValidationResult, ValidationWarning, WarningCode};
use crate::layers::LAYER_COUNT;
use crate::metarig::Metarig;

/// Validates a meta-skeleton before generation.
///
/// Checks that bone names are non-empty and unique, parents exist and form
/// no cycle, connected bones have a parent, constraint subtargets and driver
/// bones resolve, and layer metadata fits the armature.
pub fn validate_metarig(metarig: &Metarig) -> ValidationResult {
    let mut result = ValidationResult::success();

    if metarig.bones.is_empty() {
        result.add_error(ValidationError::new(
            ErrorCode::EmptyMetarig,
            "metarig has no bones",
        ));
        return result;
    }

    let mut names: HashSet<&str> = HashSet::new();
    for (i, bone) in metarig.bones.iter().enumerate() {
        if bone.name.is_empty() {
            result.add_error(ValidationError::with_path(
                ErrorCode::EmptyBoneName,
                "bone name is empty",
                format!("bones[{}].name", i),
            ));
        } else if !names.insert(bone.name.as_str()) {
            result.add_error(ValidationError::with_path(
                ErrorCode::DuplicateBoneName,
                format!("bone '{}' appears more than once", bone.name),
                format!("bones[{}].name", i),
            ));
        }
    }

    validate_parents(metarig, &names, &mut result);
    validate_references(metarig, &names, &mut result);
    validate_layers(metarig, &mut result);
    collect_warnings(metarig, &mut result);

    result
}

fn validate_parents(metarig: &Metarig, names: &HashSet<&str>, result: &mut ValidationResult) {
    let parents: HashMap<&str, &str> = metarig
        .bones
        .iter()
        .filter_map(|b| b.parent.as_deref().map(|p| (b.name.as_str(), p)))
        .collect();

    for (i, bone) in metarig.bones.iter().enumerate() {
        match bone.parent.as_deref() {
            Some(parent) if !names.contains(parent) => {
                result.add_error(ValidationError::with_path(
                    ErrorCode::UnknownParent,
                    format!("parent '{}' of bone '{}' does not exist", parent, bone.name),
                    format!("bones[{}].parent", i),
                ));
            }
            None if bone.use_connect => {
                result.add_error(ValidationError::with_path(
                    ErrorCode::ConnectedWithoutParent,
                    format!("bone '{}' is connected but has no parent", bone.name),
                    format!("bones[{}].use_connect", i),
                ));
            }
            _ => {}
        }

        if bone.length() <= f64::EPSILON {
            result.add_error(ValidationError::with_path(
                ErrorCode::ZeroLengthBone,
                format!("bone '{}' has zero length", bone.name),
                format!("bones[{}]", i),
            ));
        }

        // Walk up; more steps than there are bones means a loop.
        let mut current = bone.name.as_str();
        let mut steps = 0;
        while let Some(&parent) = parents.get(current) {
            steps += 1;
            if parent == bone.name || steps > metarig.bones.len() {
                result.add_error(ValidationError::with_path(
                    ErrorCode::ParentCycle,
                    format!("bone '{}' is its own ancestor", bone.name),
                    format!("bones[{}].parent", i),
                ));
                break;
            }
            current = parent;
        }
    }
}

fn validate_references(metarig: &Metarig, names: &HashSet<&str>, result: &mut ValidationResult) {
    for (i, bone) in metarig.bones.iter().enumerate() {
        for (j, constraint) in bone.constraints.iter().enumerate() {
            if let Some(target) = constraint.subtarget.as_deref() {
                if !names.contains(target) {
                    result.add_error(ValidationError::with_path(
                        ErrorCode::UnknownSubtarget,
                        format!(
                            "constraint '{}' on '{}' targets missing bone '{}'",
                            constraint.name, bone.name, target
                        ),
                        format!("bones[{}].constraints[{}].subtarget", i, j),
                    ));
                }
            }
        }
    }

    for (i, driver) in metarig.drivers.iter().enumerate() {
        if !names.contains(driver.target.bone()) {
            result.add_error(ValidationError::with_path(
                ErrorCode::UnknownDriverBone,
                format!("driver writes missing bone '{}'", driver.target.bone()),
                format!("drivers[{}].target", i),
            ));
        }
        for (j, var) in driver.variables.iter().enumerate() {
            if !names.contains(var.source.bone.as_str()) {
                result.add_error(ValidationError::with_path(
                    ErrorCode::UnknownDriverBone,
                    format!("driver variable reads missing bone '{}'", var.source.bone),
                    format!("drivers[{}].variables[{}]", i, j),
                ));
            }
        }
    }
}

fn validate_layers(metarig: &Metarig, result: &mut ValidationResult) {
    if metarig.layers.len() > LAYER_COUNT {
        result.add_error(ValidationError::with_path(
            ErrorCode::TooManyLayers,
            format!(
                "{} layer entries declared, armatures have {}",
                metarig.layers.len(),
                LAYER_COUNT
            ),
            "layers",
        ));
    }

    for (i, layer) in metarig.layers.iter().enumerate() {
        if layer.group as usize > metarig.colors.len() {
            result.add_error(ValidationError::with_path(
                ErrorCode::UnknownColorGroup,
                format!(
                    "layer '{}' uses colour group {} but only {} are defined",
                    layer.name,
                    layer.group,
                    metarig.colors.len()
                ),
                format!("layers[{}].group", i),
            ));
        }
        if layer.selset && layer.name.is_empty() {
            result.add_warning(ValidationWarning::with_path(
                WarningCode::UnnamedSelectionSet,
                "selection set requested for an unnamed layer, it will be skipped",
                format!("layers[{}]", i),
            ));
        }
    }
}

fn collect_warnings(metarig: &Metarig, result: &mut ValidationResult) {
    if metarig.rigged_bones().next().is_none() {
        result.add_warning(ValidationWarning::new(
            WarningCode::NoRigTypes,
            "no bone has a rig type; generation will only copy bones",
        ));
    }

    for (i, bone) in metarig.bones.iter().enumerate() {
        if let Some(raw) = bone.rig_type.as_deref() {
            if raw.chars().any(char::is_whitespace) {
                result.add_warning(ValidationWarning::with_path(
                    WarningCode::RigTypeWhitespace,
                    format!("rig type '{}' contains whitespace", raw),
                    format!("bones[{}].rig_type", i),
                ));
            }
        }
        if bone.rig_type_tag().is_none() && !bone.parameters.is_empty() {
            result.add_warning(ValidationWarning::with_path(
                WarningCode::OrphanParameters,
                format!("bone '{}' has parameters but no rig type", bone.name),
                format!("bones[{}].parameters", i),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bone::Bone;
    use crate::constraint::{Constraint, ConstraintKind};
    use crate::layers::{ColorGroup, LayerInfo};
    use pretty_assertions::assert_eq;

    fn chain() -> Metarig {
        Metarig::new("metarig")
            .with_bone(Bone::new("Bone", [0.0, 0.0, 0.0], [0.0, 0.0, 1.0]).with_rig_type("tentacle"))
            .with_bone(
                Bone::new("Bone.001", [0.0, 0.0, 1.0], [0.0, 0.0, 2.0])
                    .with_parent("Bone")
                    .with_connect(true),
            )
    }

    fn codes(result: &ValidationResult) -> Vec<ErrorCode> {
        result.errors.iter().map(|e| e.code).collect()
    }

    #[test]
    fn test_valid_chain() {
        let result = validate_metarig(&chain());
        assert!(result.is_ok(), "{:?}", result.errors);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_empty_metarig() {
        let result = validate_metarig(&Metarig::new("m"));
        assert_eq!(codes(&result), vec![ErrorCode::EmptyMetarig]);
    }

    #[test]
    fn test_duplicate_and_unknown_parent() {
        let metarig = chain()
            .with_bone(Bone::new("Bone", [0.0; 3], [1.0, 0.0, 0.0]))
            .with_bone(Bone::new("tip", [0.0; 3], [1.0, 0.0, 0.0]).with_parent("nowhere"));
        let result = validate_metarig(&metarig);
        assert_eq!(
            codes(&result),
            vec![ErrorCode::DuplicateBoneName, ErrorCode::UnknownParent]
        );
    }

    #[test]
    fn test_parent_cycle() {
        let metarig = Metarig::new("m")
            .with_bone(Bone::new("a", [0.0; 3], [0.0, 0.0, 1.0]).with_parent("b"))
            .with_bone(Bone::new("b", [0.0; 3], [0.0, 0.0, 1.0]).with_parent("a"));
        let result = validate_metarig(&metarig);
        assert!(codes(&result).contains(&ErrorCode::ParentCycle));
    }

    #[test]
    fn test_connected_without_parent_and_zero_length() {
        let metarig = Metarig::new("m")
            .with_bone(Bone::new("a", [0.0; 3], [0.0; 3]).with_connect(true).with_rig_type("face"));
        let result = validate_metarig(&metarig);
        assert_eq!(
            codes(&result),
            vec![ErrorCode::ConnectedWithoutParent, ErrorCode::ZeroLengthBone]
        );
    }

    #[test]
    fn test_unknown_subtarget() {
        let mut metarig = chain();
        metarig.bones[1]
            .constraints
            .push(Constraint::new(ConstraintKind::MaintainVolume).with_subtarget("ghost"));
        let result = validate_metarig(&metarig);
        assert_eq!(codes(&result), vec![ErrorCode::UnknownSubtarget]);
    }

    #[test]
    fn test_layer_color_group_range() {
        let metarig = chain()
            .with_layer(LayerInfo::new("Face").with_group(2))
            .with_color(ColorGroup {
                name: "Root".into(),
                normal: [0.4, 0.0, 0.7],
                select: [0.5, 0.2, 0.8],
                active: [0.6, 0.3, 0.9],
            });
        let result = validate_metarig(&metarig);
        assert_eq!(codes(&result), vec![ErrorCode::UnknownColorGroup]);
    }

    #[test]
    fn test_warnings() {
        let mut metarig = chain();
        metarig.bones[0].rig_type = Some("limbs. arm".into());
        metarig.bones[1].parameters.set("chain_length", 3i64);
        let result = validate_metarig(&metarig.with_layer(LayerInfo::new("").with_selset(true)));
        let warning_codes: Vec<WarningCode> = result.warnings.iter().map(|w| w.code).collect();
        assert_eq!(
            warning_codes,
            vec![
                WarningCode::UnnamedSelectionSet,
                WarningCode::RigTypeWhitespace,
                WarningCode::OrphanParameters
            ]
        );
    }
}
