//! Tentacle rig type: an arbitrary-length chain with FK controls and
//! partitioned IK.
//!
//! The `mid_ik_lens` parameter cuts the original chain into consecutive IK
//! segments. Every segment gets a start control (tracked by the first
//! mechanism bone of the segment) and an end control (solved by an IK
//! constraint whose `chain_count` is the segment length). The last segment
//! absorbs whatever the explicit lengths leave over.
//!
//! Original bones copy the FK mechanism chain, then the IK mechanism chain;
//! the IK copy's influence is the `IK/FK` property itself. Constraints the
//! original bones carried before generation are stashed, re-appended after
//! the blend and gated by a `Rig/Phy` property.

use gamerig_spec::{
    Bone, Constraint, ConstraintKind, DriverKind, LayerMask, Metarig, ParamDecl, Polynomial,
    PropertyPath, ResolvedParams, RigParameters,
};
use tracing::debug;

use super::limb::{ctrl_name, mch_name};
use crate::armature::{Armature, EditMode, PoseMode};
use crate::error::{RigError, RigResult};
use crate::name_map::BoneNameMap;
use crate::rigs::{add_slider, constrain, drive_constraint, optional_layers, Rig};
use crate::snap::{OperatorDecl, SnapAction};
use crate::ui::{OperatorArg, UiFragment, UiItem, UiSection};
use crate::widgets::{WidgetLibrary, WidgetShape};

pub const RIG_TYPE: &str = "tentacle";

/// Number of slots in `mid_ik_lens`.
pub const MID_IK_SLOTS: usize = 4;

/// FK->IK and IK->FK chain snapping.
pub const OPERATORS: [OperatorDecl; 2] = [
    OperatorDecl {
        name: "tentacle_fk2ik",
        label: "Snap FK controller to IK",
        arguments: &["fk_ctrls", "ik_chain"],
        action: SnapAction::ChainMatch,
    },
    OperatorDecl {
        name: "tentacle_ik2fk",
        label: "Snap IK controller to FK",
        arguments: &["ik_ctrls", "fk_chain"],
        action: SnapAction::ChainMatch,
    },
];

pub fn parameters() -> Vec<ParamDecl> {
    vec![
        ParamDecl::int("chain_length", 2, Some(2), None, "Length of Tentacle Rig Chain"),
        ParamDecl::int_vector(
            "mid_ik_lens",
            MID_IK_SLOTS,
            0,
            Some(0),
            None,
            "Lengths of Intermediate IK chain",
        ),
        ParamDecl::bool("stretchable", true, "Allow stretch to controllers"),
        ParamDecl::bool("fk_extra_layers", true, "FK Extra Layers"),
        ParamDecl::layers("fk_layers", 1, "Layers for the FK controls to be on"),
    ]
}

pub fn construct(armature: &Armature, base: &str, params: &ResolvedParams) -> RigResult<Box<dyn Rig>> {
    Ok(Box::new(Tentacle::new(armature, base, params)?))
}

pub fn operators() -> Vec<OperatorDecl> {
    OPERATORS.to_vec()
}

// =============================================================================
// IK partition
// =============================================================================

/// A run of original bones solved by one IK constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IkSegment {
    /// Index of the first original bone.
    pub start: usize,
    /// Number of bones; also the IK `chain_count`.
    pub len: usize,
}

impl IkSegment {
    pub fn end(&self) -> usize {
        self.start + self.len - 1
    }
}

/// Splits a chain of `chain_length` bones into IK segments.
///
/// Zero entries are skipped. An explicit length stops the partition once it
/// would leave fewer than two bones for the final segment, which takes the
/// remainder.
pub fn ik_partition(chain_length: usize, mid_ik_lens: &[i64]) -> Vec<IkSegment> {
    let mut segments = Vec::new();
    let mut start = 0;
    for &len in mid_ik_lens {
        if len <= 0 {
            continue;
        }
        let len = len as usize;
        if start + len + 2 >= chain_length {
            break;
        }
        segments.push(IkSegment { start, len });
        start += len;
    }
    segments.push(IkSegment {
        start,
        len: chain_length - start,
    });
    segments
}

// =============================================================================
// Rig
// =============================================================================

/// Logical keys of the generated bones.
#[derive(Debug, Clone, Default)]
struct TentacleBones {
    fk_master: String,
    fk_ctrls: Vec<String>,
    /// Start and end control of every segment, in segment order.
    ik_ctrls: Vec<String>,
    /// One mechanism bone per original bone plus a terminal.
    fk_chain: Vec<String>,
    ik_chain: Vec<String>,
}

#[derive(Debug)]
pub struct Tentacle {
    base: String,
    org: Vec<String>,
    segments: Vec<IkSegment>,
    stretchable: bool,
    fk_layers: Option<LayerMask>,
    map: BoneNameMap,
    bones: TentacleBones,
    has_rig_phy: bool,
}

impl Tentacle {
    pub fn new(armature: &Armature, base: &str, params: &ResolvedParams) -> RigResult<Self> {
        let chain_length = params.int("chain_length")?.max(0) as usize;
        let mid_ik_lens = params.int_vector("mid_ik_lens")?;
        if mid_ik_lens.contains(&1) {
            return Err(RigError::configuration(format!(
                "{}: bone '{}' has an intermediate IK length of 1, use 0 or at least 2",
                RIG_TYPE, base
            )));
        }

        let mut org = vec![base.to_string()];
        while org.len() < chain_length {
            let last = &org[org.len() - 1];
            let Some(child) = armature.children(last).into_iter().find(|b| b.use_connect) else {
                break;
            };
            org.push(child.name.clone());
        }
        if org.len() < chain_length {
            return Err(RigError::configuration(format!(
                "{}: bone '{}' needs a chain of {} bones, found {}",
                RIG_TYPE,
                base,
                chain_length,
                org.len()
            )));
        }

        let mut map = BoneNameMap::new();
        for name in &org {
            map.register(name.as_str(), name.as_str())?;
        }

        Ok(Self {
            base: base.to_string(),
            segments: ik_partition(org.len(), mid_ik_lens),
            org,
            stretchable: params.bool("stretchable")?,
            fk_layers: optional_layers(params, "fk_extra_layers", "fk_layers")?,
            map,
            bones: TentacleBones::default(),
            has_rig_phy: false,
        })
    }

    /// Partition the instance was built with.
    pub fn segments(&self) -> &[IkSegment] {
        &self.segments
    }

    fn name(&self, key: &str) -> RigResult<String> {
        self.map.resolve(key).map(str::to_string)
    }

    fn names(&self, keys: &[String]) -> RigResult<Vec<String>> {
        keys.iter().map(|k| self.name(k)).collect()
    }

    /// Flipped quarter-length copy of `org`, detached from its chain.
    fn create_ctrl(&mut self, edit: &mut EditMode<'_>, org: &str, suffix: &str) -> RigResult<String> {
        let key = self.map.copy_bone(edit, org, &ctrl_name(org, suffix))?;
        let name = self.name(&key)?;
        edit.set_connected(&name, false)?;
        edit.flip_bone(&name)?;
        edit.scale_length(&name, 0.25)?;
        Ok(key)
    }

    /// A copy of every original bone plus a flipped quarter-length terminal.
    fn create_mch_chain(&mut self, edit: &mut EditMode<'_>, suffix: &str) -> RigResult<Vec<String>> {
        let mut chain = Vec::new();
        for org in self.org.clone() {
            chain.push(self.map.copy_bone(edit, &org, &mch_name(&org, suffix))?);
        }
        let last = self.org[self.org.len() - 1].clone();
        let key = self.map.copy_bone(edit, &last, &mch_name(&last, &format!("{}_term", suffix)))?;
        let name = self.name(&key)?;
        edit.flip_bone(&name)?;
        edit.scale_length(&name, 0.25)?;
        chain.push(key);
        Ok(chain)
    }

    /// FK mechanism bones the IK controls snap to, two per segment.
    fn snap_targets(&self) -> Vec<&String> {
        self.segments
            .iter()
            .flat_map(|s| [&self.bones.fk_chain[s.start + 1], &self.bones.fk_chain[s.start + s.len]])
            .collect()
    }

    /// Tracks `target` from `owner`, stretching towards it when enabled.
    fn track(&self, pose: &mut PoseMode<'_>, owner: &str, target: &str) -> RigResult<()> {
        constrain(pose, owner, target, Constraint::new(ConstraintKind::damped_track(0.0)))?;
        if self.stretchable {
            constrain(pose, owner, target, Constraint::new(ConstraintKind::stretch_to(0.0)))?;
            pose.add_constraint(owner, Constraint::new(ConstraintKind::MaintainVolume))?;
            pose.pose_mut(owner)?.ik_stretch = 0.01;
        }
        Ok(())
    }

    fn wire_fk(&mut self, pose: &mut PoseMode<'_>, widgets: &mut WidgetLibrary) -> RigResult<()> {
        let ctrls = self.names(&self.bones.fk_ctrls)?;
        let chain = self.names(&self.bones.fk_chain)?;
        for (mch, ctrl) in chain.iter().zip(&ctrls) {
            self.track(pose, mch, ctrl)?;
        }

        let master = self.name(&self.bones.fk_master)?;
        widgets.build(
            &master,
            WidgetShape::DirectedCircle {
                radius: 1.0,
                head_tail: 0.0,
            },
        );
        for ctrl in &ctrls {
            widgets.build(ctrl, WidgetShape::Sphere);
        }
        if let Some(layers) = self.fk_layers {
            for bone in std::iter::once(&master).chain(&ctrls) {
                pose.set_layers(bone, layers)?;
            }
        }
        Ok(())
    }

    fn wire_ik(&mut self, pose: &mut PoseMode<'_>, widgets: &mut WidgetLibrary) -> RigResult<()> {
        let ctrls = self.names(&self.bones.ik_ctrls)?;
        let chain = self.names(&self.bones.ik_chain)?;
        for (segment, pair) in self.segments.iter().zip(ctrls.chunks(2)) {
            self.track(pose, &chain[segment.start], &pair[0])?;
            constrain(
                pose,
                &chain[segment.end()],
                &pair[1],
                Constraint::new(ConstraintKind::ik(segment.len as u32, self.stretchable)),
            )?;
        }
        for ctrl in &ctrls {
            widgets.build(ctrl, WidgetShape::Cube);
        }
        Ok(())
    }

    fn wire_switch(&mut self, pose: &mut PoseMode<'_>) -> RigResult<()> {
        let first_fk = self.name(&self.bones.fk_ctrls[0])?;
        let fk_chain = self.names(&self.bones.fk_chain)?;
        let ik_chain = self.names(&self.bones.ik_chain)?;
        let switch = add_slider(pose, &first_fk, "IK/FK", 1.0, "IK/FK Switch")?;

        for (i, org) in self.org.iter().enumerate() {
            let stashed = pose.take_constraints(org)?;
            constrain(pose, org, &fk_chain[i], Constraint::new(ConstraintKind::CopyTransforms))?;
            let ik = constrain(pose, org, &ik_chain[i], Constraint::new(ConstraintKind::CopyTransforms))?;
            drive_constraint(pose, org, &ik, DriverKind::Average, &switch, None)?;

            if stashed.is_empty() {
                continue;
            }
            let count = stashed.len();
            pose.restore_constraints(org, stashed)?;
            let rig_phy = if self.has_rig_phy {
                PropertyPath::new(first_fk.as_str(), "Rig/Phy")
            } else {
                self.has_rig_phy = true;
                add_slider(pose, &first_fk, "Rig/Phy", 0.0, "Rig/Phy Switch")?
            };
            let last = pose.constraint_name(org, 2 + count - 1)?;
            drive_constraint(pose, org, &last, DriverKind::Average, &rig_phy, Some(Polynomial::IDENTITY))?;
        }
        Ok(())
    }
}

impl Rig for Tentacle {
    fn rig_type(&self) -> &str {
        RIG_TYPE
    }

    fn base_bone(&self) -> &str {
        &self.base
    }

    fn create_bones(&mut self, edit: &mut EditMode<'_>) -> RigResult<()> {
        let org0 = self.org[0].clone();
        let key = self.map.copy_bone(edit, &org0, &ctrl_name(&org0, "fk_master"))?;
        edit.scale_length(&self.name(&key)?, 0.25)?;
        self.bones.fk_master = key;

        for org in self.org.clone() {
            let key = self.create_ctrl(edit, &org, "fk")?;
            self.bones.fk_ctrls.push(key);
        }

        for segment in self.segments.clone() {
            for index in [segment.start, segment.end()] {
                let org = self.org[index].clone();
                let key = self.create_ctrl(edit, &org, "ik")?;
                self.bones.ik_ctrls.push(key);
            }
        }

        self.bones.fk_chain = self.create_mch_chain(edit, "fk")?;
        self.bones.ik_chain = self.create_mch_chain(edit, "ik")?;
        debug!(
            base = %self.base,
            segments = self.segments.len(),
            "tentacle bones created"
        );
        Ok(())
    }

    fn parent_bones(&mut self, edit: &mut EditMode<'_>) -> RigResult<()> {
        let org_parent = edit.get(&self.org[0])?.parent.clone();

        let master = self.name(&self.bones.fk_master)?;
        edit.set_parent(&master, org_parent.as_deref())?;
        let ctrls = self.names(&self.bones.fk_ctrls)?;
        let mut previous = master;
        for ctrl in &ctrls {
            edit.attach(ctrl, &previous, false)?;
            previous = ctrl.clone();
        }

        // Segment start controls follow the previous segment's end control;
        // end controls float free.
        let ik_ctrls = self.names(&self.bones.ik_ctrls)?;
        for (i, ctrl) in ik_ctrls.iter().enumerate() {
            if i == 0 {
                edit.set_parent(ctrl, org_parent.as_deref())?;
            } else if i % 2 == 0 {
                edit.set_parent(ctrl, Some(ik_ctrls[i - 1].as_str()))?;
            } else {
                edit.set_parent(ctrl, None)?;
            }
        }

        for chain in [self.bones.fk_chain.clone(), self.bones.ik_chain.clone()] {
            let chain = self.names(&chain)?;
            edit.set_parent(&chain[0], org_parent.as_deref())?;
            for pair in chain.windows(2) {
                edit.set_parent(&pair[1], Some(pair[0].as_str()))?;
            }
        }
        Ok(())
    }

    fn wire(&mut self, pose: &mut PoseMode<'_>, widgets: &mut WidgetLibrary) -> RigResult<()> {
        self.wire_fk(pose, widgets)?;
        self.wire_ik(pose, widgets)?;
        self.wire_switch(pose)
    }

    fn ui(&self) -> UiFragment {
        let mut fragment = UiFragment::new(RIG_TYPE, &self.base);
        let resolve = |key: &String| self.map.resolve(key).map(str::to_string).unwrap_or_default();
        let fk: Vec<String> = self.bones.fk_ctrls.iter().map(resolve).collect();
        let Some(first) = fk.first().cloned() else {
            return fragment;
        };
        let ik: Vec<String> = self.bones.ik_ctrls.iter().map(resolve).collect();
        let ik_chain: Vec<String> = self.bones.ik_chain.iter().skip(1).map(resolve).collect();
        let fk_chain: Vec<String> = self.snap_targets().into_iter().map(resolve).collect();

        let mut controls = vec![resolve(&self.bones.fk_master)];
        controls.extend(fk.iter().cloned());
        controls.extend(ik.iter().cloned());

        let [fk2ik, ik2fk] = OPERATORS;
        let mut section = UiSection::when_selected(&controls)
            .with_item(UiItem::property(&first, "IK/FK", format!("IK/FK ({})", first)));
        if self.has_rig_phy {
            section = section.with_item(UiItem::property(
                &first,
                "Rig/Phy",
                format!("Rig/Phy ({})", first),
            ));
        }
        section = section
            .with_item(UiItem::operator(
                fk2ik.name,
                format!("Snap FK->IK ({})", first),
                [
                    (fk2ik.arguments[0], OperatorArg::Bones(fk.clone())),
                    (fk2ik.arguments[1], OperatorArg::Bones(ik_chain)),
                ],
            ))
            .with_item(UiItem::operator(
                ik2fk.name,
                format!("Snap IK->FK ({})", first),
                [
                    (ik2fk.arguments[0], OperatorArg::Bones(ik)),
                    (ik2fk.arguments[1], OperatorArg::Bones(fk_chain)),
                ],
            ));
        fragment.push(section);
        fragment
    }
}

/// Three-bone tentacle standing on the origin.
pub fn sample() -> Metarig {
    let params = RigParameters::new()
        .with("chain_length", 3)
        .with("stretchable", true);
    Metarig::new("metarig")
        .with_bone(
            Bone::new("Bone", [0.0, 0.0, 0.0], [0.0, 0.0, 0.3333])
                .with_rig_type(RIG_TYPE)
                .with_parameters(params),
        )
        .with_bone(
            Bone::new("Bone.001", [0.0, 0.0, 0.3333], [0.0, 0.0, 0.6667])
                .with_parent("Bone")
                .with_connect(true),
        )
        .with_bone(
            Bone::new("Bone.002", [0.0, 0.0, 0.6667], [0.0, 0.0, 1.0])
                .with_parent("Bone.001")
                .with_connect(true),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::{GenerateConfig, Generator};
    use gamerig_spec::math::approx_eq;
    use pretty_assertions::assert_eq;

    fn seg(start: usize, len: usize) -> IkSegment {
        IkSegment { start, len }
    }

    #[test]
    fn test_ik_partition() {
        assert_eq!(ik_partition(3, &[0, 0, 0, 0]), vec![seg(0, 3)]);
        assert_eq!(ik_partition(5, &[2, 2, 0, 0]), vec![seg(0, 2), seg(2, 3)]);
        assert_eq!(ik_partition(8, &[0, 2, 3, 0]), vec![seg(0, 2), seg(2, 3), seg(5, 3)]);
        // A length that would starve the last segment ends the partition.
        assert_eq!(ik_partition(4, &[2, 0, 0, 0]), vec![seg(0, 4)]);
    }

    #[test]
    fn test_length_one_is_configuration_error() {
        let mut armature = Armature::new("rig");
        armature.edit().new_bone("ORG-Bone", [0.0; 3], [0.0, 0.0, 1.0]);
        let stored = RigParameters::new().with("mid_ik_lens", vec![1, 0, 0, 0]);
        let params = ResolvedParams::resolve(&parameters(), &stored).unwrap();
        let err = Tentacle::new(&armature, "ORG-Bone", &params).unwrap_err();
        assert!(err.is_configuration());

        let params = ResolvedParams::resolve(&parameters(), &RigParameters::new()).unwrap();
        let err = Tentacle::new(&armature, "ORG-Bone", &params).unwrap_err();
        assert!(err.to_string().contains("found 1"));
    }

    #[test]
    fn test_chain_follows_connected_children() {
        let mut armature = Armature::new("rig");
        {
            let mut edit = armature.edit();
            edit.new_bone("ORG-Bone", [0.0; 3], [0.0, 0.0, 1.0]);
            edit.new_bone("ORG-fin", [0.0, 0.0, 1.0], [0.5, 0.0, 1.0]);
            edit.new_bone("ORG-Bone.001", [0.0, 0.0, 1.0], [0.0, 0.0, 2.0]);
            edit.set_parent("ORG-fin", Some("ORG-Bone")).unwrap();
            edit.attach("ORG-Bone.001", "ORG-Bone", true).unwrap();
        }
        let stored = RigParameters::new().with("chain_length", 2);
        let params = ResolvedParams::resolve(&parameters(), &stored).unwrap();
        let rig = Tentacle::new(&armature, "ORG-Bone", &params).unwrap();
        assert_eq!(rig.org, vec!["ORG-Bone", "ORG-Bone.001"]);

        // A loose child alone does not extend the chain.
        armature.edit().set_connected("ORG-Bone.001", false).unwrap();
        let err = Tentacle::new(&armature, "ORG-Bone", &params).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_sample_topology() {
        let rig = Generator::new(GenerateConfig::default().with_seed(3))
            .generate(&sample(), None)
            .unwrap();
        let arm = &rig.armature;
        let parent = |name: &str| arm.get(name).unwrap().parent.clone();

        assert_eq!(parent("Bone_fk_master"), None);
        assert_eq!(parent("Bone_fk").as_deref(), Some("Bone_fk_master"));
        assert_eq!(parent("Bone_fk.002").as_deref(), Some("Bone_fk.001"));
        assert_eq!(parent("Bone_ik"), None);
        assert_eq!(parent("Bone_ik.002"), None);
        assert_eq!(parent("MCH-Bone_ik_term.002").as_deref(), Some("MCH-Bone_ik.002"));

        // Controls sit at the far end of their original bone.
        let ctrl = arm.get("Bone_fk.001").unwrap();
        assert!(approx_eq(ctrl.head, [0.0, 0.0, 0.6667], 1e-9));
        assert!((ctrl.length() - 0.3334 / 4.0).abs() < 1e-9);

        let end = arm.get("MCH-Bone_ik.002").unwrap();
        assert_eq!(end.constraints[0].kind, ConstraintKind::ik(3, true));
        assert_eq!(end.constraints[0].subtarget.as_deref(), Some("Bone_ik.002"));
        let start = arm.get("MCH-Bone_ik").unwrap();
        assert_eq!(start.constraints[0].subtarget.as_deref(), Some("Bone_ik"));
        assert_eq!(start.pose.ik_stretch, 0.01);
    }

    #[test]
    fn test_stashed_constraints_gated_by_rig_phy() {
        let mut metarig = sample();
        let physics = Constraint::new(ConstraintKind::Opaque {
            host_type: "SPLINE_IK".into(),
            settings: Default::default(),
        });
        metarig.bones[1] = metarig.bones[1].clone().with_constraint(physics);

        let rig = Generator::new(GenerateConfig::default().with_seed(3))
            .generate(&metarig, None)
            .unwrap();
        let arm = &rig.armature;
        let first = arm.get("Bone_fk").unwrap();
        assert_eq!(first.properties["Rig/Phy"].value, 0.0);

        let org = arm.get("ORG-Bone.001").unwrap();
        let kinds: Vec<&str> = org.constraints.iter().map(|c| c.kind.display_name()).collect();
        assert_eq!(kinds, vec!["Copy Transforms", "Copy Transforms", "SPLINE_IK"]);
        let driver = arm
            .drivers()
            .iter()
            .find(|d| d.target.bone() == "ORG-Bone.001" && d.modifier == Some(Polynomial::IDENTITY))
            .unwrap();
        assert_eq!(driver.variables[0].source, PropertyPath::new("Bone_fk", "Rig/Phy"));

        // Bones without stashed constraints keep the plain blend stack.
        assert_eq!(arm.get("ORG-Bone").unwrap().constraints.len(), 2);
    }

    #[test]
    fn test_snap_arguments() {
        let rig = Generator::new(GenerateConfig::default().with_seed(3))
            .generate(&sample(), None)
            .unwrap();
        let ops: Vec<&UiItem> = rig
            .ui
            .fragments
            .iter()
            .flat_map(|f| f.items())
            .filter(|item| matches!(item, UiItem::Operator { .. }))
            .collect();
        let UiItem::Operator { arguments, .. } = ops[1] else {
            unreachable!()
        };
        assert_eq!(
            arguments["fk_chain"],
            OperatorArg::Bones(vec!["MCH-Bone_fk.001".into(), "MCH-Bone_fk_term.002".into()])
        );
    }
}
