//! Limb rig types: two-segment arm and three-segment leg with IK/FK switching.
//!
//! Both limbs share one topology:
//!
//! - an `MCH-<limb>_parent` bone locked to the root bone's rotation and
//!   scale (or to world rotation when the limb has no root),
//! - an FK chain with one control per original bone plus a small terminal
//!   mechanism bone,
//! - an IK chain: limb control, IK-solved mechanism bone, IK target and a
//!   stretch helper tracking the terminal IK control.
//!
//! Original bones copy the IK chain, then the FK chain; the FK copy is driven
//! by the `IK/FK` property through an inverting driver, so `IK/FK = 1` leaves
//! only the IK copy effective and `IK/FK = 0` only the FK copy.
//!
//! The [`arm`] and [`leg`] modules supply the terminal controls.

use gamerig_spec::math::add;
use gamerig_spec::naming::{basename, insert_before_first_period, mch};
use gamerig_spec::{
    Constraint, ConstraintKind, DriverKind, LayerMask, ParamDecl, Polynomial, ResolvedParams,
    RotationMode, Space,
};

use crate::armature::{Armature, EditMode, PoseMode};
use crate::error::{RigError, RigResult};
use crate::name_map::BoneNameMap;
use crate::rigs::{add_slider, constrain, drive_constraint, optional_layers, Rig};
use crate::snap::OperatorDecl;
use crate::ui::{OperatorArg, UiFragment, UiItem, UiSection};
use crate::widgets::{WidgetLibrary, WidgetShape};

pub mod arm;
pub mod leg;

/// Values of the `rotation_axis` parameter.
pub const ROTATION_AXES: &[&str] = &["automatic", "x", "y", "z"];

/// Which limb variant an instance builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimbKind {
    Arm,
    Leg,
}

impl LimbKind {
    pub fn rig_type(&self) -> &'static str {
        match self {
            LimbKind::Arm => "limbs.arm",
            LimbKind::Leg => "limbs.leg",
        }
    }

    /// Number of original bones in the chain.
    pub fn org_count(&self) -> usize {
        match self {
            LimbKind::Arm => 3,
            LimbKind::Leg => 4,
        }
    }

    fn operators(&self) -> [OperatorDecl; 2] {
        match self {
            LimbKind::Arm => arm::OPERATORS,
            LimbKind::Leg => leg::OPERATORS,
        }
    }
}

/// Parameters shared by both limb types.
pub fn parameters() -> Vec<ParamDecl> {
    vec![
        ParamDecl::enumeration(
            "rotation_axis",
            ROTATION_AXES,
            "automatic",
            "Axis the middle joint bends around",
        ),
        ParamDecl::bool("allow_ik_stretch", true, "Allow IK Stretch"),
        ParamDecl::bool("fk_extra_layers", true, "FK Extra Layers"),
        ParamDecl::layers("fk_layers", 1, "Layers for the FK controls to be on"),
    ]
}

/// Per-axis IK locks leaving only the bend axis free.
fn ik_locks(axis: &str) -> [bool; 3] {
    let free = match axis {
        "y" => 1,
        "z" => 2,
        _ => 0,
    };
    let mut locks = [true; 3];
    locks[free] = false;
    locks
}

/// `upper_arm.L` + `fk` -> `upper_arm_fk.L`
pub(crate) fn ctrl_name(org: &str, suffix: &str) -> String {
    insert_before_first_period(basename(org), &format!("_{}", suffix))
}

/// `upper_arm.L` + `ik` -> `MCH-upper_arm_ik.L`
pub(crate) fn mch_name(org: &str, suffix: &str) -> String {
    mch(&ctrl_name(org, suffix))
}

/// Logical keys of the generated bones.
#[derive(Debug, Clone, Default)]
struct LimbBones {
    parent: String,
    fk_ctrls: Vec<String>,
    fk_mch: String,
    ik_ctrl: String,
    mch_ik: String,
    mch_target: String,
    mch_stretch: String,
    /// Terminal IK controls; the first one owns the IK target.
    terminals: Vec<String>,
    socket: Option<String>,
}

/// A limb instance.
#[derive(Debug)]
pub struct Limb {
    kind: LimbKind,
    base: String,
    org: Vec<String>,
    root: Option<String>,
    rotation_axis: String,
    allow_ik_stretch: bool,
    fk_layers: Option<LayerMask>,
    map: BoneNameMap,
    bones: LimbBones,
}

impl Limb {
    pub fn new(
        kind: LimbKind,
        armature: &Armature,
        base: &str,
        params: &ResolvedParams,
    ) -> RigResult<Self> {
        let mut org = vec![base.to_string()];
        org.extend(armature.connected_chain(base));
        if org.len() < kind.org_count() {
            return Err(RigError::configuration(format!(
                "{}: bone '{}' needs a connected chain of {} bones, found {}",
                kind.rig_type(),
                base,
                kind.org_count(),
                org.len()
            )));
        }
        org.truncate(kind.org_count());

        let mut map = BoneNameMap::new();
        for name in &org {
            map.register(name.as_str(), name.as_str())?;
        }
        let root = armature.top_ancestor(base);
        if let Some(root) = &root {
            map.register(root.as_str(), root.as_str())?;
        }

        Ok(Self {
            kind,
            base: base.to_string(),
            org,
            root,
            rotation_axis: params.enumeration("rotation_axis")?.to_string(),
            allow_ik_stretch: params.bool("allow_ik_stretch")?,
            fk_layers: optional_layers(params, "fk_extra_layers", "fk_layers")?,
            map,
            bones: LimbBones::default(),
        })
    }

    fn name(&self, key: &str) -> RigResult<String> {
        self.map.resolve(key).map(str::to_string)
    }

    fn names(&self, keys: &[String]) -> RigResult<Vec<String>> {
        keys.iter().map(|k| self.name(k)).collect()
    }

    // =========================================================================
    // Bone creation
    // =========================================================================

    fn create_parent(&mut self, edit: &mut EditMode<'_>) -> RigResult<()> {
        let org0 = self.org[0].clone();
        let key = self.map.copy_bone(edit, &org0, &mch_name(&org0, "parent"))?;
        let name = self.name(&key)?;
        let length = edit.get(&org0)?.length();
        let head = edit.get(&name)?.head;
        edit.set_tail(&name, add(head, [0.0, 1.0, 0.0]))?;
        edit.set_roll(&name, 0.0)?;
        edit.set_length(&name, length / 4.0)?;
        self.bones.parent = key;
        Ok(())
    }

    fn create_fk(&mut self, edit: &mut EditMode<'_>) -> RigResult<()> {
        for org in self.org.clone() {
            let key = self.map.copy_bone(edit, &org, &ctrl_name(&org, "fk"))?;
            self.bones.fk_ctrls.push(key);
        }
        let last = self.org[self.org.len() - 1].clone();
        let key = self.map.copy_bone(edit, &last, &mch_name(&last, "fk"))?;
        edit.scale_length(&self.name(&key)?, 0.25)?;
        self.bones.fk_mch = key;
        Ok(())
    }

    fn create_ik(&mut self, edit: &mut EditMode<'_>) -> RigResult<()> {
        let org0 = self.org[0].clone();
        let requested = [
            ctrl_name(&org0, "ik"),
            mch_name(&org0, "ik"),
            mch_name(&org0, "ik_target"),
        ];
        let mut keys = Vec::new();
        for (i, requested) in requested.iter().enumerate() {
            let org = self.org[i].clone();
            let key = self.map.copy_bone(edit, &org, requested)?;
            if i == self.org.len() - 1 {
                edit.scale_length(&self.name(&key)?, 0.25)?;
            }
            keys.push(key);
        }
        self.bones.ik_ctrl = keys[0].clone();
        self.bones.mch_ik = keys[1].clone();
        self.bones.mch_target = keys[2].clone();

        let key = self.map.copy_bone(edit, &org0, &mch_name(&org0, "ik_stretch"))?;
        let end = match self.kind {
            LimbKind::Arm => &self.org[self.org.len() - 1],
            LimbKind::Leg => &self.org[self.org.len() - 2],
        };
        let tail = edit.get(end)?.head;
        edit.set_tail(&self.name(&key)?, tail)?;
        self.bones.mch_stretch = key;
        Ok(())
    }

    fn create_socket(&mut self, edit: &mut EditMode<'_>) -> RigResult<()> {
        let Some(root) = self.root.clone() else {
            return Ok(());
        };
        let terminal = self.name(&self.bones.terminals[0])?;
        let key = self.map.copy_bone(edit, &root, &mch(&format!("socket_{}", terminal)))?;
        let name = self.name(&key)?;
        edit.scale_length(&name, 0.25)?;
        edit.set_parent(&name, None)?;
        self.bones.socket = Some(key);
        Ok(())
    }

    // =========================================================================
    // Wiring
    // =========================================================================

    fn wire_parent(&mut self, pose: &mut PoseMode<'_>) -> RigResult<()> {
        let parent = self.name(&self.bones.parent)?;
        match &self.root {
            Some(root) => {
                constrain(pose, &parent, root, Constraint::new(ConstraintKind::CopyRotation { use_offset: false }))?;
                constrain(pose, &parent, root, Constraint::new(ConstraintKind::CopyScale { use_offset: false }))?;
            }
            None => {
                pose.add_constraint(
                    &parent,
                    Constraint::new(ConstraintKind::locked_rotation()).with_spaces(Space::World, Space::World),
                )?;
            }
        }
        Ok(())
    }

    fn wire_fk(&mut self, pose: &mut PoseMode<'_>, widgets: &mut WidgetLibrary) -> RigResult<()> {
        let ctrls = self.names(&self.bones.fk_ctrls)?;
        if let Some(root) = &self.root {
            let fk_mch = self.name(&self.bones.fk_mch)?;
            constrain(pose, &fk_mch, root, Constraint::new(ConstraintKind::CopyScale { use_offset: false }))?;
        }

        let settings = pose.pose_mut(&ctrls[2])?;
        settings.lock_location = [true; 3];
        settings.lock_scale = [true; 3];

        widgets.build(&ctrls[0], WidgetShape::Limb);
        widgets.build(&ctrls[1], WidgetShape::Limb);
        match self.kind {
            LimbKind::Arm => {
                widgets.build(
                    &ctrls[2],
                    WidgetShape::DirectedCircle {
                        radius: -0.4,
                        head_tail: 0.0,
                    },
                );
            }
            LimbKind::Leg => {
                widgets.build(&ctrls[2], WidgetShape::Limb);
                widgets.build(
                    &ctrls[3],
                    WidgetShape::DirectedCircle {
                        radius: -0.4,
                        head_tail: 0.5,
                    },
                );
            }
        }

        if let Some(layers) = self.fk_layers {
            for ctrl in &ctrls {
                pose.set_layers(ctrl, layers)?;
            }
        }
        Ok(())
    }

    fn wire_ik(&mut self, pose: &mut PoseMode<'_>, widgets: &mut WidgetLibrary) -> RigResult<()> {
        let ctrl = self.name(&self.bones.ik_ctrl)?;
        let mch_ik = self.name(&self.bones.mch_ik)?;
        let target = self.name(&self.bones.mch_target)?;

        constrain(
            pose,
            &mch_ik,
            &target,
            Constraint::new(ConstraintKind::ik(2, self.allow_ik_stretch)),
        )?;

        let settings = pose.pose_mut(&mch_ik)?;
        settings.ik_stretch = 0.1;
        settings.lock_ik = ik_locks(&self.rotation_axis);

        let settings = pose.pose_mut(&ctrl)?;
        settings.ik_stretch = 0.1;
        settings.lock_location = [true; 3];
        settings.lock_rotation = [false, false, true];
        settings.lock_scale = [true; 3];
        settings.rotation_mode = RotationMode::Zxy;
        widgets.build(&ctrl, WidgetShape::IkArrow);
        Ok(())
    }

    /// Follow property, IK/FK switch and the original bones' blend stacks.
    fn wire_switch(&mut self, pose: &mut PoseMode<'_>) -> RigResult<()> {
        let fk = self.names(&self.bones.fk_ctrls)?;
        let parent = self.name(&self.bones.parent)?;

        let follow = add_slider(pose, &fk[0], "FK Limb Follow", 0.0, "FK Limb Follow")?;
        let follow_constraint = pose.constraint_name(&parent, 0)?;
        drive_constraint(pose, &parent, &follow_constraint, DriverKind::Average, &follow, None)?;

        let switch = add_slider(pose, &fk[0], "IK/FK", 1.0, "IK/FK Switch")?;

        let mut ik_targets = vec![
            self.name(&self.bones.ik_ctrl)?,
            self.name(&self.bones.mch_ik)?,
            self.name(&self.bones.mch_target)?,
        ];
        if self.kind == LimbKind::Leg {
            ik_targets.push(self.name(&self.bones.terminals[1])?);
        }

        for ((org, ik), fk) in self.org.iter().zip(&ik_targets).zip(&fk) {
            constrain(pose, org, ik, Constraint::new(ConstraintKind::CopyTransforms))?;
            let fk_constraint = constrain(pose, org, fk, Constraint::new(ConstraintKind::CopyTransforms))?;
            drive_constraint(
                pose,
                org,
                &fk_constraint,
                DriverKind::Average,
                &switch,
                Some(Polynomial::INVERT),
            )?;
            pose.add_constraint(org, Constraint::new(ConstraintKind::MaintainVolume))?;
        }
        Ok(())
    }

    /// IK target, stretch helper, IK Stretch and IK Follow.
    fn wire_terminal(&mut self, pose: &mut PoseMode<'_>) -> RigResult<()> {
        let terminal = self.name(&self.bones.terminals[0])?;
        let target = self.name(&self.bones.mch_target)?;
        let stretch = self.name(&self.bones.mch_stretch)?;
        let master = self.name(&self.bones.fk_ctrls[0])?;

        constrain(pose, &target, &stretch, Constraint::new(ConstraintKind::copy_location(1.0)))?;
        constrain(pose, &stretch, &terminal, Constraint::new(ConstraintKind::damped_track(0.0)))?;
        constrain(pose, &stretch, &terminal, Constraint::new(ConstraintKind::stretch_to(0.0)))?;

        if self.allow_ik_stretch {
            let limit = pose.add_constraint(
                &stretch,
                Constraint::new(ConstraintKind::LimitScale {
                    use_min_y: true,
                    min_y: 0.0,
                    use_max_y: true,
                    max_y: 1.05,
                })
                .with_spaces(Space::World, Space::Local),
            )?;
            let prop = add_slider(pose, &master, "IK Stretch", 1.0, "IK Stretch")?;
            drive_constraint(pose, &stretch, &limit, DriverKind::Average, &prop, Some(Polynomial::INVERT))?;
        }

        if let (Some(root), Some(socket)) = (&self.root, &self.bones.socket) {
            let socket = self.name(socket)?;
            let follow = constrain(
                pose,
                &socket,
                root,
                Constraint::new(ConstraintKind::CopyTransforms).with_spaces(Space::World, Space::World),
            )?;
            let prop = add_slider(pose, &master, "IK Follow", 1.0, "IK Follow")?;
            drive_constraint(pose, &socket, &follow, DriverKind::Sum, &prop, None)?;
        }
        Ok(())
    }
}

impl Rig for Limb {
    fn rig_type(&self) -> &str {
        self.kind.rig_type()
    }

    fn base_bone(&self) -> &str {
        &self.base
    }

    fn create_bones(&mut self, edit: &mut EditMode<'_>) -> RigResult<()> {
        for org in &self.org[1..] {
            edit.set_parent(org, None)?;
        }
        self.create_parent(edit)?;
        self.create_fk(edit)?;
        self.create_ik(edit)?;
        match self.kind {
            LimbKind::Arm => arm::create_terminal(self, edit)?,
            LimbKind::Leg => leg::create_terminal(self, edit)?,
        }
        self.create_socket(edit)
    }

    fn parent_bones(&mut self, edit: &mut EditMode<'_>) -> RigResult<()> {
        let parent = self.name(&self.bones.parent)?;
        let org_parent = edit.get(&self.org[0])?.parent.clone();
        edit.set_parent(&parent, org_parent.as_deref())?;

        // FK chain; the last control hangs off the FK terminal helper.
        let ctrls = self.names(&self.bones.fk_ctrls)?;
        let fk_mch = self.name(&self.bones.fk_mch)?;
        let last = ctrls.len() - 1;
        edit.attach(&ctrls[0], &parent, false)?;
        for i in 1..last {
            edit.attach(&ctrls[i], &ctrls[i - 1], true)?;
        }
        edit.attach(&fk_mch, &ctrls[last - 1], true)?;
        edit.attach(&ctrls[last], &fk_mch, false)?;

        let ik_ctrl = self.name(&self.bones.ik_ctrl)?;
        edit.attach(&ik_ctrl, &parent, false)?;
        edit.attach(&self.name(&self.bones.mch_stretch)?, &parent, false)?;
        edit.attach(&self.name(&self.bones.mch_ik)?, &ik_ctrl, false)?;

        let terminals = self.names(&self.bones.terminals)?;
        match &self.bones.socket {
            Some(socket) => edit.attach(&terminals[0], &self.name(socket)?, false)?,
            None => edit.set_parent(&terminals[0], None)?,
        }
        edit.attach(&self.name(&self.bones.mch_target)?, &terminals[0], false)?;
        if let Some(toe) = terminals.get(1) {
            edit.attach(toe, &terminals[0], false)?;
        }

        for pair in self.org.windows(2) {
            edit.attach(&pair[1], &pair[0], true)?;
        }
        Ok(())
    }

    fn wire(&mut self, pose: &mut PoseMode<'_>, widgets: &mut WidgetLibrary) -> RigResult<()> {
        self.wire_parent(pose)?;
        self.wire_fk(pose, widgets)?;
        self.wire_ik(pose, widgets)?;
        self.wire_switch(pose)?;
        self.wire_terminal(pose)?;
        match self.kind {
            LimbKind::Arm => arm::wire_terminal(self, pose, widgets),
            LimbKind::Leg => leg::wire_terminal(self, pose, widgets),
        }
    }

    fn ui(&self) -> UiFragment {
        let mut fragment = UiFragment::new(self.rig_type(), &self.base);
        let resolve = |key: &String| self.map.resolve(key).map(str::to_string).unwrap_or_default();
        let fk: Vec<String> = self.bones.fk_ctrls.iter().map(resolve).collect();
        let Some(master) = fk.first().cloned() else {
            return fragment;
        };
        let ik_ctrl = resolve(&self.bones.ik_ctrl);
        let mch_ik = resolve(&self.bones.mch_ik);
        let terminals: Vec<String> = self.bones.terminals.iter().map(resolve).collect();

        let mut controls = vec![ik_ctrl.clone()];
        controls.extend(fk.iter().cloned());
        controls.extend(terminals.iter().cloned());

        let [fk2ik, ik2fk] = self.kind.operators();
        let bones = [
            fk[0].clone(),
            fk[1].clone(),
            fk[2].clone(),
            ik_ctrl,
            mch_ik.clone(),
            terminals[0].clone(),
        ];
        let arguments = |decl: &OperatorDecl| {
            decl.arguments
                .iter()
                .zip(bones.iter())
                .map(|(name, bone)| (*name, OperatorArg::Bone(bone.clone())))
                .collect::<Vec<_>>()
        };

        fragment.push(
            UiSection::when_selected(&controls)
                .with_item(UiItem::property(&master, "IK/FK", format!("IK/FK ({})", master)))
                .with_item(UiItem::operator(
                    fk2ik.name,
                    format!("Snap FK->IK ({})", master),
                    arguments(&fk2ik),
                ))
                .with_item(UiItem::operator(
                    ik2fk.name,
                    format!("Snap IK->FK ({})", master),
                    arguments(&ik2fk),
                )),
        );
        fragment.push(UiSection::when_selected(&[master.as_str()]).with_item(UiItem::property(
            &master,
            "FK Limb Follow",
            format!("FK Limb Follow ({})", master),
        )));

        let last_terminal = terminals.last().cloned().unwrap_or_default();
        let mut ik_section = UiSection::when_selected(&[
            last_terminal,
            mch_ik,
            resolve(&self.bones.mch_target),
        ]);
        if self.allow_ik_stretch {
            ik_section = ik_section.with_item(UiItem::property(
                &master,
                "IK Stretch",
                format!("IK Stretch ({})", master),
            ));
        }
        if self.root.is_some() {
            ik_section = ik_section.with_item(UiItem::property(
                &master,
                "IK Follow",
                format!("IK Follow ({})", master),
            ));
        }
        fragment.push(ik_section);
        fragment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_names() {
        assert_eq!(ctrl_name("ORG-upper_arm.L", "fk"), "upper_arm_fk.L");
        assert_eq!(mch_name("ORG-upper_arm.L", "ik_target"), "MCH-upper_arm_ik_target.L");
        assert_eq!(ctrl_name("ORG-spine", "fk"), "spine_fk");
    }

    #[test]
    fn test_ik_locks() {
        assert_eq!(ik_locks("automatic"), [false, true, true]);
        assert_eq!(ik_locks("x"), [false, true, true]);
        assert_eq!(ik_locks("z"), [true, true, false]);
    }

    #[test]
    fn test_short_chain_is_configuration_error() {
        let mut armature = Armature::new("rig");
        {
            let mut edit = armature.edit();
            edit.new_bone("ORG-upper_arm.L", [0.0; 3], [0.3, 0.0, 0.0]);
            edit.new_bone("ORG-forearm.L", [0.3, 0.0, 0.0], [0.5, 0.0, 0.0]);
            edit.attach("ORG-forearm.L", "ORG-upper_arm.L", true).unwrap();
        }
        let params = ResolvedParams::resolve(&parameters(), &Default::default()).unwrap();
        let err = Limb::new(LimbKind::Arm, &armature, "ORG-upper_arm.L", &params).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("found 2"));
    }
}
