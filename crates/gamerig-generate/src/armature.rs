//! Editable armature with explicit mode capability tokens.
//!
//! Bone creation and parenting are only reachable through an [`EditMode`]
//! guard, constraints, properties and drivers only through a [`PoseMode`]
//! guard. Both borrow the armature mutably, so at most one exists at a time,
//! and dropping either restores the mode that was active before.

use std::collections::{BTreeMap, HashMap};
use std::ops::Deref;

use gamerig_spec::naming::make_unique;
use gamerig_spec::{
    effective_weights, Bone, Constraint, CustomProperty, Driver, DriverTarget, LayerMask,
    ObjectTransform, PoseSettings, PropertyPath, Vec3,
};
use serde::{Deserialize, Serialize};

use crate::error::{RigError, RigResult};

/// Interaction mode of the armature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Object,
    Edit,
    Pose,
}

/// Whether the armature displays its pose or its rest position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PosePosition {
    #[default]
    Pose,
    Rest,
}

/// Serialized form of an [`Armature`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ArmatureData {
    name: String,
    bones: Vec<Bone>,
    #[serde(default)]
    drivers: Vec<Driver>,
    #[serde(default)]
    visible_layers: LayerMask,
    #[serde(default)]
    properties: BTreeMap<String, String>,
    #[serde(default)]
    pose_position: PosePosition,
    #[serde(default)]
    transform: ObjectTransform,
}

/// A generated armature: ordered bones plus drivers and object data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ArmatureData", into = "ArmatureData")]
pub struct Armature {
    pub name: String,
    bones: Vec<Bone>,
    index: HashMap<String, usize>,
    drivers: Vec<Driver>,
    /// Layers shown in the viewport.
    pub visible_layers: LayerMask,
    /// String properties on the armature data (e.g. the rig identifier).
    pub properties: BTreeMap<String, String>,
    pub pose_position: PosePosition,
    pub transform: ObjectTransform,
    mode: Mode,
}

impl From<ArmatureData> for Armature {
    fn from(data: ArmatureData) -> Self {
        let mut armature = Armature {
            name: data.name,
            bones: data.bones,
            index: HashMap::new(),
            drivers: data.drivers,
            visible_layers: data.visible_layers,
            properties: data.properties,
            pose_position: data.pose_position,
            transform: data.transform,
            mode: Mode::Object,
        };
        armature.reindex();
        armature
    }
}

impl From<Armature> for ArmatureData {
    fn from(armature: Armature) -> Self {
        ArmatureData {
            name: armature.name,
            bones: armature.bones,
            drivers: armature.drivers,
            visible_layers: armature.visible_layers,
            properties: armature.properties,
            pose_position: armature.pose_position,
            transform: armature.transform,
        }
    }
}

impl Armature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bones: Vec::new(),
            index: HashMap::new(),
            drivers: Vec::new(),
            visible_layers: LayerMask::first(),
            properties: BTreeMap::new(),
            pose_position: PosePosition::Pose,
            transform: ObjectTransform::default(),
            mode: Mode::Object,
        }
    }

    fn reindex(&mut self) {
        self.index = self
            .bones
            .iter()
            .enumerate()
            .map(|(i, b)| (b.name.clone(), i))
            .collect();
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn drivers(&self) -> &[Driver] {
        &self.drivers
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn bone(&self, name: &str) -> Option<&Bone> {
        self.index.get(name).map(|&i| &self.bones[i])
    }

    /// Like [`Armature::bone`] but failing with [`RigError::MissingBone`].
    pub fn get(&self, name: &str) -> RigResult<&Bone> {
        self.bone(name).ok_or_else(|| RigError::missing_bone(name))
    }

    pub fn bone_names(&self) -> Vec<String> {
        self.bones.iter().map(|b| b.name.clone()).collect()
    }

    /// Direct children in armature order.
    pub fn children(&self, name: &str) -> Vec<&Bone> {
        self.bones
            .iter()
            .filter(|b| b.parent.as_deref() == Some(name))
            .collect()
    }

    /// Names of the connected descendants of `name`, following the first
    /// connected child at each step.
    pub fn connected_chain(&self, name: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut current = name.to_string();
        while let Some(child) = self.children(&current).into_iter().find(|b| b.use_connect) {
            if chain.contains(&child.name) {
                break;
            }
            chain.push(child.name.clone());
            current = child.name.clone();
        }
        chain
    }

    /// Ancestors of `name`, nearest first.
    pub fn ancestors(&self, name: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut current = self.bone(name).and_then(|b| b.parent.clone());
        while let Some(parent) = current {
            if out.contains(&parent) || parent == name {
                break;
            }
            current = self.bone(&parent).and_then(|b| b.parent.clone());
            out.push(parent);
        }
        out
    }

    /// Top-most ancestor of `name`, `None` when the bone has no parent.
    pub fn top_ancestor(&self, name: &str) -> Option<String> {
        self.ancestors(name).pop()
    }

    pub fn depth(&self, name: &str) -> usize {
        self.ancestors(name).len()
    }

    /// Whether the parent pointers form a forest.
    pub fn has_parent_cycle(&self) -> bool {
        self.bones.iter().any(|bone| {
            let mut current = bone.parent.as_deref();
            let mut steps = 0;
            while let Some(parent) = current {
                steps += 1;
                if parent == bone.name || steps > self.bones.len() {
                    return true;
                }
                current = self.bone(parent).and_then(|b| b.parent.as_deref());
            }
            false
        })
    }

    /// Current value of a custom property.
    pub fn property(&self, path: &PropertyPath) -> Option<f64> {
        self.bone(&path.bone)?
            .properties
            .get(&path.property)
            .map(|p| p.value)
    }

    /// Sets a custom property value the way an animator drags its slider.
    pub fn set_property_value(&mut self, path: &PropertyPath, value: f64) -> RigResult<()> {
        let index = *self
            .index
            .get(&path.bone)
            .ok_or_else(|| RigError::missing_bone(&path.bone))?;
        let prop = self.bones[index]
            .properties
            .get_mut(&path.property)
            .ok_or_else(|| RigError::unknown_key(path.to_string()))?;
        prop.set_value(value);
        Ok(())
    }

    /// Influence of a constraint after applying any driver that targets it.
    pub fn evaluated_influence(&self, bone: &str, constraint: &Constraint) -> f64 {
        let driven = self.drivers.iter().find(|d| {
            matches!(&d.target, DriverTarget::ConstraintInfluence { bone: b, constraint: c }
                if b == bone && *c == constraint.name)
        });
        driven
            .and_then(|d| d.evaluate(|path| self.property(path)))
            .unwrap_or(constraint.influence)
    }

    /// Effective contribution of every constraint on `bone`, in stack order.
    ///
    /// Pairs each constraint with its weight per
    /// [`gamerig_spec::effective_weights`], using driver-evaluated influences.
    pub fn constraint_weights(&self, bone: &str) -> RigResult<Vec<(&Constraint, f64)>> {
        let owner = self.get(bone)?;
        let stack: Vec<_> = owner
            .constraints
            .iter()
            .map(|c| (&c.kind, self.evaluated_influence(bone, c)))
            .collect();
        let weights = effective_weights(&stack);
        Ok(owner.constraints.iter().zip(weights).collect())
    }

    // =========================================================================
    // Mode tokens
    // =========================================================================

    /// Enters edit mode until the returned guard is dropped.
    pub fn edit(&mut self) -> EditMode<'_> {
        let previous = self.mode;
        self.mode = Mode::Edit;
        EditMode {
            armature: self,
            previous,
        }
    }

    /// Enters pose mode until the returned guard is dropped.
    pub fn pose(&mut self) -> PoseMode<'_> {
        let previous = self.mode;
        self.mode = Mode::Pose;
        PoseMode {
            armature: self,
            previous,
        }
    }

    fn index_of(&self, name: &str) -> RigResult<usize> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| RigError::missing_bone(name))
    }

    fn bone_at(&mut self, name: &str) -> RigResult<&mut Bone> {
        let i = self.index_of(name)?;
        Ok(&mut self.bones[i])
    }
}

// =============================================================================
// Edit mode
// =============================================================================

/// Capability to create, remove, rename and reparent bones.
#[derive(Debug)]
pub struct EditMode<'a> {
    armature: &'a mut Armature,
    previous: Mode,
}

impl Deref for EditMode<'_> {
    type Target = Armature;

    fn deref(&self) -> &Armature {
        self.armature
    }
}

impl Drop for EditMode<'_> {
    fn drop(&mut self) {
        self.armature.mode = self.previous;
    }
}

impl EditMode<'_> {
    /// Adds `bone`, renaming it if the name is taken. Returns the final name.
    pub fn add_bone(&mut self, mut bone: Bone) -> String {
        bone.name = make_unique(&bone.name, |n| self.armature.contains(n));
        let name = bone.name.clone();
        self.armature.index.insert(name.clone(), self.armature.bones.len());
        self.armature.bones.push(bone);
        name
    }

    /// Creates an unparented bone. Returns the final name.
    pub fn new_bone(&mut self, name: &str, head: Vec3, tail: Vec3) -> String {
        self.add_bone(Bone::new(name, head, tail))
    }

    /// Duplicates `source` as `name`, uniquified against the armature.
    ///
    /// Copies geometry, parent, connection, deform flag, layers, pose locks,
    /// rotation mode and custom properties; constraints are not copied.
    pub fn copy_bone(&mut self, source: &str, name: &str) -> RigResult<String> {
        let src = self.armature.get(source)?;
        let mut copy = Bone::new(name, src.head, src.tail);
        copy.roll = src.roll;
        copy.parent = src.parent.clone();
        copy.use_connect = src.use_connect;
        copy.use_deform = src.use_deform;
        copy.layers = src.layers;
        copy.properties = src.properties.clone();
        copy.pose = PoseSettings {
            custom_shape: None,
            custom_shape_transform: None,
            bone_group: None,
            ..src.pose.clone()
        };
        Ok(self.add_bone(copy))
    }

    /// Removes a bone; its children move up to its parent.
    ///
    /// Constraints targeting the bone are dropped, and so are drivers that
    /// write to it, read from it or drive one of the dropped constraints.
    pub fn remove_bone(&mut self, name: &str) -> RigResult<Bone> {
        let i = self.armature.index_of(name)?;
        let removed = self.armature.bones.remove(i);
        let mut dropped = Vec::new();
        for bone in &mut self.armature.bones {
            if bone.parent.as_deref() == Some(name) {
                bone.parent = removed.parent.clone();
                bone.use_connect = false;
            }
            if bone.pose.custom_shape_transform.as_deref() == Some(name) {
                bone.pose.custom_shape_transform = None;
            }
            let owner = bone.name.as_str();
            bone.constraints.retain(|c| {
                let keep = c.subtarget.as_deref() != Some(name);
                if !keep {
                    dropped.push((owner.to_string(), c.name.clone()));
                }
                keep
            });
        }
        self.armature.drivers.retain(|d| {
            let drives_dropped = matches!(&d.target, DriverTarget::ConstraintInfluence { bone, constraint }
                if dropped.iter().any(|(b, c)| b == bone && c == constraint));
            d.target.bone() != name
                && !drives_dropped
                && d.variables.iter().all(|v| v.source.bone != name)
        });
        self.armature.reindex();
        Ok(removed)
    }

    /// Renames a bone and every parent pointer, constraint subtarget and
    /// driven target referring to it. Returns the final (uniquified) name.
    ///
    /// Driver variable sources are left alone.
    pub fn rename_bone(&mut self, old: &str, new: &str) -> RigResult<String> {
        let i = self.armature.index_of(old)?;
        if old == new {
            return Ok(new.to_string());
        }
        let new = make_unique(new, |n| self.armature.contains(n));
        self.armature.bones[i].name = new.clone();
        for bone in &mut self.armature.bones {
            if bone.parent.as_deref() == Some(old) {
                bone.parent = Some(new.clone());
            }
            for c in &mut bone.constraints {
                if c.subtarget.as_deref() == Some(old) {
                    c.subtarget = Some(new.clone());
                }
            }
            if bone.pose.custom_shape_transform.as_deref() == Some(old) {
                bone.pose.custom_shape_transform = Some(new.clone());
            }
        }
        for driver in &mut self.armature.drivers {
            driver.rename_target_bone(old, &new);
        }
        self.armature.index.remove(old);
        self.armature.index.insert(new.clone(), i);
        Ok(new)
    }

    /// Sets or clears the parent of `child`. Clearing also disconnects.
    pub fn set_parent(&mut self, child: &str, parent: Option<&str>) -> RigResult<()> {
        if let Some(parent) = parent {
            self.armature.get(parent)?;
            if parent == child || self.armature.ancestors(parent).iter().any(|a| a == child) {
                return Err(RigError::ParentCycle {
                    child: child.to_string(),
                    parent: parent.to_string(),
                });
            }
        }
        let bone = self.armature.bone_at(child)?;
        bone.parent = parent.map(str::to_string);
        if parent.is_none() {
            bone.use_connect = false;
        }
        Ok(())
    }

    pub fn set_connected(&mut self, name: &str, connected: bool) -> RigResult<()> {
        self.armature.bone_at(name)?.use_connect = connected;
        Ok(())
    }

    /// Sets the parent and connection flag together.
    pub fn attach(&mut self, child: &str, parent: &str, connected: bool) -> RigResult<()> {
        self.set_parent(child, Some(parent))?;
        self.set_connected(child, connected)
    }

    pub fn set_head(&mut self, name: &str, head: Vec3) -> RigResult<()> {
        self.armature.bone_at(name)?.head = head;
        Ok(())
    }

    pub fn set_tail(&mut self, name: &str, tail: Vec3) -> RigResult<()> {
        self.armature.bone_at(name)?.tail = tail;
        Ok(())
    }

    pub fn set_roll(&mut self, name: &str, roll: f64) -> RigResult<()> {
        self.armature.bone_at(name)?.roll = roll;
        Ok(())
    }

    pub fn set_length(&mut self, name: &str, length: f64) -> RigResult<()> {
        self.armature.bone_at(name)?.set_length(length);
        Ok(())
    }

    /// Scales the bone length by `factor`.
    pub fn scale_length(&mut self, name: &str, factor: f64) -> RigResult<()> {
        let bone = self.armature.bone_at(name)?;
        let length = bone.length() * factor;
        bone.set_length(length);
        Ok(())
    }

    pub fn flip_bone(&mut self, name: &str) -> RigResult<()> {
        self.armature.bone_at(name)?.flip();
        Ok(())
    }

    /// Adds a driver copied from the input skeleton.
    pub fn add_driver(&mut self, driver: Driver) {
        self.armature.drivers.push(driver);
    }

    /// Mutable access to all drivers, for post-generation remapping.
    pub fn drivers_mut(&mut self) -> &mut Vec<Driver> {
        &mut self.armature.drivers
    }
}

// =============================================================================
// Pose mode
// =============================================================================

/// Capability to add constraints, properties, drivers and pose settings.
#[derive(Debug)]
pub struct PoseMode<'a> {
    armature: &'a mut Armature,
    previous: Mode,
}

impl Deref for PoseMode<'_> {
    type Target = Armature;

    fn deref(&self) -> &Armature {
        self.armature
    }
}

impl Drop for PoseMode<'_> {
    fn drop(&mut self) {
        self.armature.mode = self.previous;
    }
}

impl PoseMode<'_> {
    /// Appends a constraint; the name is made unique on the owner. Returns it.
    pub fn add_constraint(&mut self, owner: &str, mut constraint: Constraint) -> RigResult<String> {
        if let Some(target) = constraint.subtarget.as_deref() {
            self.armature.get(target)?;
        }
        let bone = self.armature.bone_at(owner)?;
        constraint.name = make_unique(&constraint.name, |n| {
            bone.constraints.iter().any(|c| c.name == n)
        });
        let name = constraint.name.clone();
        bone.constraints.push(constraint);
        Ok(name)
    }

    /// Name of the constraint at `index` on `owner`.
    pub fn constraint_name(&self, owner: &str, index: usize) -> RigResult<String> {
        self.armature
            .get(owner)?
            .constraints
            .get(index)
            .map(|c| c.name.clone())
            .ok_or_else(|| RigError::unknown_key(format!("{}.constraints[{}]", owner, index)))
    }

    /// Removes and returns all constraints of `owner`.
    pub fn take_constraints(&mut self, owner: &str) -> RigResult<Vec<Constraint>> {
        Ok(std::mem::take(&mut self.armature.bone_at(owner)?.constraints))
    }

    /// Re-appends previously taken constraints, keeping their names unique.
    pub fn restore_constraints(&mut self, owner: &str, stashed: Vec<Constraint>) -> RigResult<()> {
        for constraint in stashed {
            let bone = self.armature.bone_at(owner)?;
            let mut constraint = constraint;
            constraint.name = make_unique(&constraint.name, |n| {
                bone.constraints.iter().any(|c| c.name == n)
            });
            bone.constraints.push(constraint);
        }
        Ok(())
    }

    pub fn set_property(&mut self, bone: &str, name: &str, property: CustomProperty) -> RigResult<()> {
        self.armature
            .bone_at(bone)?
            .properties
            .insert(name.to_string(), property);
        Ok(())
    }

    pub fn has_property(&self, bone: &str, name: &str) -> bool {
        self.armature
            .bone(bone)
            .is_some_and(|b| b.properties.contains_key(name))
    }

    /// Adds a driver after checking that its target and sources exist.
    pub fn add_driver(&mut self, driver: Driver) -> RigResult<()> {
        match &driver.target {
            DriverTarget::ConstraintInfluence { bone, constraint } => {
                let owner = self.armature.get(bone)?;
                if !owner.constraints.iter().any(|c| &c.name == constraint) {
                    return Err(RigError::unknown_key(format!("{}.{}", bone, constraint)));
                }
            }
            DriverTarget::Property { bone, .. } => {
                self.armature.get(bone)?;
            }
        }
        for var in &driver.variables {
            if !self.has_property(&var.source.bone, &var.source.property) {
                return Err(RigError::unknown_key(var.source.to_string()));
            }
        }
        self.armature.drivers.push(driver);
        Ok(())
    }

    pub fn pose_mut(&mut self, bone: &str) -> RigResult<&mut PoseSettings> {
        Ok(&mut self.armature.bone_at(bone)?.pose)
    }

    pub fn set_layers(&mut self, bone: &str, layers: LayerMask) -> RigResult<()> {
        self.armature.bone_at(bone)?.layers = layers;
        Ok(())
    }

    pub fn set_deform(&mut self, bone: &str, deform: bool) -> RigResult<()> {
        self.armature.bone_at(bone)?.use_deform = deform;
        Ok(())
    }

    pub fn set_custom_shape(&mut self, bone: &str, widget: &str) -> RigResult<()> {
        self.armature.bone_at(bone)?.pose.custom_shape = Some(widget.to_string());
        Ok(())
    }

    /// Displays the widget of `bone` at `placement`.
    pub fn set_custom_shape_transform(&mut self, bone: &str, placement: &str) -> RigResult<()> {
        self.armature.get(placement)?;
        self.armature.bone_at(bone)?.pose.custom_shape_transform = Some(placement.to_string());
        Ok(())
    }

    pub fn set_bone_group(&mut self, bone: &str, group: &str) -> RigResult<()> {
        self.armature.bone_at(bone)?.pose.bone_group = Some(group.to_string());
        Ok(())
    }

    /// Mutable access to all drivers, for post-generation remapping.
    pub fn drivers_mut(&mut self) -> &mut Vec<Driver> {
        &mut self.armature.drivers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamerig_spec::{ConstraintKind, DriverKind, Polynomial};
    use pretty_assertions::assert_eq;

    fn chain() -> Armature {
        let mut arm = Armature::new("rig");
        {
            let mut edit = arm.edit();
            edit.new_bone("a", [0.0, 0.0, 0.0], [0.0, 0.0, 1.0]);
            edit.new_bone("b", [0.0, 0.0, 1.0], [0.0, 0.0, 2.0]);
            edit.new_bone("c", [0.0, 0.0, 2.0], [0.0, 0.0, 3.0]);
            edit.attach("b", "a", true).unwrap();
            edit.attach("c", "b", true).unwrap();
        }
        arm
    }

    #[test]
    fn test_mode_guards_restore() {
        let mut arm = Armature::new("rig");
        assert_eq!(arm.mode(), Mode::Object);
        {
            let edit = arm.edit();
            assert_eq!(edit.mode(), Mode::Edit);
        }
        assert_eq!(arm.mode(), Mode::Object);
        {
            let pose = arm.pose();
            assert_eq!(pose.mode(), Mode::Pose);
        }
        assert_eq!(arm.mode(), Mode::Object);
    }

    #[test]
    fn test_copy_bone_uniquifies() {
        let mut arm = chain();
        let mut edit = arm.edit();
        assert_eq!(edit.copy_bone("a", "a").unwrap(), "a.001");
        assert_eq!(edit.copy_bone("a", "a").unwrap(), "a.002");
        assert_eq!(edit.copy_bone("b", "ctrl").unwrap(), "ctrl");
        assert_eq!(edit.get("ctrl").unwrap().parent.as_deref(), Some("a"));
        assert!(edit.copy_bone("missing", "x").is_err());
    }

    #[test]
    fn test_parent_cycle_rejected() {
        let mut arm = chain();
        let mut edit = arm.edit();
        let err = edit.set_parent("a", Some("c")).unwrap_err();
        assert_eq!(
            err,
            RigError::ParentCycle {
                child: "a".into(),
                parent: "c".into()
            }
        );
        assert!(edit.set_parent("a", Some("a")).is_err());
        drop(edit);
        assert!(!arm.has_parent_cycle());
    }

    #[test]
    fn test_chain_queries() {
        let arm = chain();
        assert_eq!(arm.connected_chain("a"), vec!["b", "c"]);
        assert_eq!(arm.ancestors("c"), vec!["b", "a"]);
        assert_eq!(arm.top_ancestor("c").as_deref(), Some("a"));
        assert_eq!(arm.top_ancestor("a"), None);
        assert_eq!(arm.depth("c"), 2);
    }

    #[test]
    fn test_rename_updates_references() {
        let mut arm = chain();
        {
            let mut pose = arm.pose();
            pose.add_constraint("c", Constraint::new(ConstraintKind::CopyTransforms).with_subtarget("b"))
                .unwrap();
        }
        let mut edit = arm.edit();
        assert_eq!(edit.rename_bone("b", "ORG-b").unwrap(), "ORG-b");
        assert_eq!(edit.get("c").unwrap().parent.as_deref(), Some("ORG-b"));
        assert_eq!(
            edit.get("c").unwrap().constraints[0].subtarget.as_deref(),
            Some("ORG-b")
        );
        assert!(!edit.contains("b"));
        // Renaming onto a taken name uniquifies.
        assert_eq!(edit.rename_bone("a", "c").unwrap(), "c.001");
    }

    #[test]
    fn test_remove_bone_reparents_children() {
        let mut arm = chain();
        let mut edit = arm.edit();
        edit.remove_bone("b").unwrap();
        let c = edit.get("c").unwrap();
        assert_eq!(c.parent.as_deref(), Some("a"));
        assert!(!c.use_connect);
        assert_eq!(edit.len(), 2);
    }

    #[test]
    fn test_remove_bone_prunes_references() {
        let mut arm = chain();
        {
            let mut pose = arm.pose();
            pose.set_property("a", "flex", CustomProperty::unit(0.5)).unwrap();
            pose.set_property("b", "bend", CustomProperty::unit(1.0)).unwrap();
            let on_b = pose
                .add_constraint("c", Constraint::new(ConstraintKind::CopyTransforms).with_subtarget("b"))
                .unwrap();
            let on_a = pose
                .add_constraint("c", Constraint::new(ConstraintKind::CopyTransforms).with_subtarget("a"))
                .unwrap();
            pose.add_driver(Driver::influence("c", &on_b, DriverKind::Average, PropertyPath::new("a", "flex")))
                .unwrap();
            pose.add_driver(Driver::influence("c", &on_a, DriverKind::Average, PropertyPath::new("b", "bend")))
                .unwrap();
            pose.add_driver(Driver::influence("c", &on_a, DriverKind::Average, PropertyPath::new("a", "flex")))
                .unwrap();
            pose.set_custom_shape_transform("c", "b").unwrap();
        }

        arm.edit().remove_bone("b").unwrap();
        let c = arm.get("c").unwrap();
        assert_eq!(c.constraints.len(), 1);
        assert_eq!(c.constraints[0].subtarget.as_deref(), Some("a"));
        assert_eq!(c.pose.custom_shape_transform, None);
        // Only the driver reading "a" into the surviving constraint is left.
        assert_eq!(arm.drivers().len(), 1);
        assert_eq!(arm.drivers()[0].variables[0].source, PropertyPath::new("a", "flex"));
        assert_eq!(arm.drivers()[0].target, DriverTarget::influence("c", "Copy Transforms.001"));
    }

    #[test]
    fn test_constraint_names_unique_per_owner() {
        let mut arm = chain();
        let mut pose = arm.pose();
        let first = pose
            .add_constraint("c", Constraint::new(ConstraintKind::CopyTransforms).with_subtarget("a"))
            .unwrap();
        let second = pose
            .add_constraint("c", Constraint::new(ConstraintKind::CopyTransforms).with_subtarget("b"))
            .unwrap();
        assert_eq!(first, "Copy Transforms");
        assert_eq!(second, "Copy Transforms.001");
        assert_eq!(pose.constraint_name("c", 1).unwrap(), second);
        assert!(pose.constraint_name("c", 2).is_err());
    }

    #[test]
    fn test_driver_checks_and_evaluation() {
        let mut arm = chain();
        {
            let mut pose = arm.pose();
            pose.set_property("a", "IK/FK", CustomProperty::unit(1.0)).unwrap();
            let ik = pose
                .add_constraint("c", Constraint::new(ConstraintKind::CopyTransforms).with_subtarget("a"))
                .unwrap();
            let fk = pose
                .add_constraint("c", Constraint::new(ConstraintKind::CopyTransforms).with_subtarget("b"))
                .unwrap();
            assert_ne!(ik, fk);
            pose.add_driver(
                Driver::influence("c", fk, DriverKind::Average, PropertyPath::new("a", "IK/FK"))
                    .with_modifier(Polynomial::INVERT),
            )
            .unwrap();
            assert!(pose
                .add_driver(Driver::influence(
                    "c",
                    "nope",
                    DriverKind::Sum,
                    PropertyPath::new("a", "IK/FK")
                ))
                .is_err());
        }
        let weights: Vec<f64> = arm.constraint_weights("c").unwrap().iter().map(|(_, w)| *w).collect();
        assert_eq!(weights, vec![1.0, 0.0]);

        arm.set_property_value(&PropertyPath::new("a", "IK/FK"), 0.0).unwrap();
        let weights: Vec<f64> = arm.constraint_weights("c").unwrap().iter().map(|(_, w)| *w).collect();
        assert_eq!(weights, vec![0.0, 1.0]);
    }

    #[test]
    fn test_serde_round_trip_rebuilds_index() {
        let arm = chain();
        let json = serde_json::to_string(&arm).unwrap();
        let parsed: Armature = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, arm);
        assert!(parsed.contains("c"));
    }
}
