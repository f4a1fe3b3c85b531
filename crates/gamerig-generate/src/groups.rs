//! Selection sets and bone colour groups derived from layer metadata.

use gamerig_spec::{ColorGroup, LayerInfo, LayerMask};
use serde::{Deserialize, Serialize};

use crate::armature::{Armature, PoseMode};
use crate::error::RigResult;

/// Named set of bones an animator can select at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSet {
    pub name: String,
    pub bones: Vec<String>,
}

/// One selection set per named layer flagged `selset`, listing the bones on
/// that layer in armature order. Empty sets are kept.
pub fn selection_sets(armature: &Armature, layers: &[LayerInfo]) -> Vec<SelectionSet> {
    layers
        .iter()
        .enumerate()
        .filter(|(_, info)| info.selset && !info.name.is_empty())
        .map(|(index, info)| SelectionSet {
            name: info.name.clone(),
            bones: armature
                .bones()
                .iter()
                .filter(|b| b.layers.is_set(index))
                .map(|b| b.name.clone())
                .collect(),
        })
        .collect()
}

/// Colour group of a bone: the group of its first active layer.
fn group_of<'a>(layers: &[LayerInfo], colors: &'a [ColorGroup], mask: &LayerMask) -> Option<&'a ColorGroup> {
    let layer = layers.get(mask.first_active()?)?;
    let index = usize::try_from(layer.group).ok()?.checked_sub(1)?;
    colors.get(index)
}

/// Assigns every bone to the colour group of its first active layer and
/// returns the groups in use, gamma corrected to sRGB.
pub fn assign_bone_groups(
    pose: &mut PoseMode<'_>,
    layers: &[LayerInfo],
    colors: &[ColorGroup],
) -> RigResult<Vec<ColorGroup>> {
    let assignments: Vec<(String, &ColorGroup)> = pose
        .bones()
        .iter()
        .filter_map(|b| group_of(layers, colors, &b.layers).map(|g| (b.name.clone(), g)))
        .collect();

    let mut used: Vec<ColorGroup> = Vec::new();
    for (bone, group) in assignments {
        pose.set_bone_group(&bone, &group.name)?;
        if !used.iter().any(|g| g.name == group.name) {
            used.push(group.gamma_corrected());
        }
    }
    Ok(used)
}
