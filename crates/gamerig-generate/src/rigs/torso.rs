//! Torso rig type: a connected spine split at two positions into hips, chest
//! and neck.
//!
//! `pivot_pos` and `neck_pos` are 1-based positions along the chain. Bones
//! below the pivot form the hips, bones from the pivot up to the neck form
//! the chest, and the rest form the neck with the last bone as the head.
//!
//! A `torso` control carries the hips and chest controls. Mechanism bones
//! spread each control's motion over its part of the spine, and every
//! original bone copies a tweak control, tracking (and optionally
//! stretching to) the next one. Two sliders on the torso control, `Head
//! Follow` and `Neck Follow`, decide how much the head and neck keep the
//! torso's rotation.

use gamerig_spec::math::{add, midpoint};
use gamerig_spec::naming::{basename, mch};
use gamerig_spec::{
    Bone, Constraint, ConstraintKind, DriverKind, LayerMask, Metarig, ParamDecl, Polynomial,
    PropertyPath, ResolvedParams, RigParameters, RotationMode, Space,
};
use tracing::debug;

use crate::armature::{Armature, EditMode, PoseMode};
use crate::error::{RigError, RigResult};
use crate::name_map::BoneNameMap;
use crate::rigs::{add_slider, constrain, drive_constraint, optional_layers, Rig};
use crate::snap::OperatorDecl;
use crate::ui::{UiFragment, UiItem, UiSection};
use crate::widgets::{WidgetLibrary, WidgetShape};

pub const RIG_TYPE: &str = "torso";

pub const HEAD_FOLLOW: &str = "Head Follow";
pub const NECK_FOLLOW: &str = "Neck Follow";
pub const TWEAK_STRETCH: &str = "Tweak Stretch";

pub fn parameters() -> Vec<ParamDecl> {
    vec![
        ParamDecl::int("neck_pos", 5, Some(0), None, "Neck start position"),
        ParamDecl::int(
            "pivot_pos",
            2,
            Some(0),
            None,
            "Position of the torso control and pivot point",
        ),
        ParamDecl::bool("stretchable_tweak", true, "Allow stretch to tweak controllers"),
        ParamDecl::bool("tweak_extra_layers", true, "Tweak controllers have own layer"),
        ParamDecl::layers("tweak_layers", 1, "Layers for the tweak controls to be on"),
    ]
}

pub fn construct(armature: &Armature, base: &str, params: &ResolvedParams) -> RigResult<Box<dyn Rig>> {
    Ok(Box::new(Torso::new(armature, base, params)?))
}

pub fn operators() -> Vec<OperatorDecl> {
    Vec::new()
}

/// Logical keys of the generated bones.
#[derive(Debug, Clone, Default)]
struct TorsoBones {
    torso: String,
    mch_pivot: String,

    neck: String,
    head: String,
    /// Tracks the head control; parent of the neck intermediaries.
    mch_stretch: String,
    mch_neck: String,
    mch_head: String,
    neck_mch: Vec<String>,
    neck_tweaks: Vec<String>,

    chest: String,
    chest_mch: Vec<String>,
    chest_tweaks: Vec<String>,
    chest_widget: String,

    hips: String,
    hips_mch: Vec<String>,
    hips_tweaks: Vec<String>,
    hips_widget: String,
}

#[derive(Debug)]
pub struct Torso {
    base: String,
    org: Vec<String>,
    /// Index of the first neck bone.
    neck_index: usize,
    /// Index of the first chest bone.
    pivot_index: usize,
    spine_length: f64,
    stretchable: bool,
    tweak_layers: Option<LayerMask>,
    map: BoneNameMap,
    bones: TorsoBones,
}

impl Torso {
    pub fn new(armature: &Armature, base: &str, params: &ResolvedParams) -> RigResult<Self> {
        let neck_pos = params.int("neck_pos")?;
        let pivot_pos = params.int("pivot_pos")?;
        if neck_pos <= 0 || pivot_pos <= 0 {
            return Err(RigError::configuration(format!(
                "{}: bone '{}' needs both neck and pivot positions",
                RIG_TYPE, base
            )));
        }
        if neck_pos <= pivot_pos {
            return Err(RigError::configuration(format!(
                "{}: bone '{}' has its neck ({}) at or below its pivot ({})",
                RIG_TYPE, base, neck_pos, pivot_pos
            )));
        }

        let mut org = vec![base.to_string()];
        org.extend(armature.connected_chain(base));
        let neck_index = (neck_pos - 1) as usize;
        let pivot_index = (pivot_pos - 1) as usize;
        // Five or more bones, with a hips bone below the pivot and a neck bone below the head.
        if org.len() <= 4 || neck_index < 2 || pivot_index < 1 || neck_index + 1 >= org.len() {
            return Err(RigError::configuration(format!(
                "{}: bone '{}' has an invalid structure: {} connected bones with neck at {} and pivot at {}",
                RIG_TYPE,
                base,
                org.len(),
                neck_pos,
                pivot_pos
            )));
        }

        let mut map = BoneNameMap::new();
        let mut spine_length = 0.0;
        for name in &org {
            spine_length += armature.get(name)?.length();
            map.register(name.as_str(), name.as_str())?;
        }

        Ok(Self {
            base: base.to_string(),
            org,
            neck_index,
            pivot_index,
            spine_length,
            stretchable: params.bool("stretchable_tweak")?,
            tweak_layers: optional_layers(params, "tweak_extra_layers", "tweak_layers")?,
            map,
            bones: TorsoBones::default(),
        })
    }

    fn name(&self, key: &str) -> RigResult<String> {
        self.map.resolve(key).map(str::to_string)
    }

    fn names(&self, keys: &[String]) -> RigResult<Vec<String>> {
        keys.iter().map(|k| self.name(k)).collect()
    }

    /// Loose copy of the bone behind `source`. Returns its key and name.
    fn copy(&mut self, edit: &mut EditMode<'_>, source: &str, requested: &str) -> RigResult<(String, String)> {
        let key = self.map.copy_bone(edit, source, requested)?;
        let name = self.name(&key)?;
        edit.set_connected(&name, false)?;
        Ok((key, name))
    }

    /// Tweak controls in chain order, ending with the head control.
    fn deform_tweaks(&self) -> Vec<&String> {
        let b = &self.bones;
        b.hips_tweaks
            .iter()
            .chain(&b.chest_tweaks)
            .chain(&b.neck_tweaks)
            .chain(std::iter::once(&b.head))
            .collect()
    }

    fn create_pivot(&mut self, edit: &mut EditMode<'_>) -> RigResult<()> {
        let pivot = self.org[self.pivot_index].clone();
        let (torso, torso_name) = self.copy(edit, &pivot, "torso")?;
        orient(edit, &torso_name, self.spine_length / 2.5, false)?;

        let (mch_pivot, mch_pivot_name) = self.copy(edit, &torso, &mch("pivot"))?;
        edit.scale_length(&mch_pivot_name, 0.25)?;

        // The control sits halfway along the lowest bone.
        let center = {
            let root = edit.get(&self.org[0])?;
            midpoint(root.head, root.tail)
        };
        let vector = edit.get(&torso_name)?.vector();
        edit.set_head(&torso_name, center)?;
        edit.set_tail(&torso_name, add(center, vector))?;

        self.bones.torso = torso;
        self.bones.mch_pivot = mch_pivot;
        Ok(())
    }

    fn create_neck(&mut self, edit: &mut EditMode<'_>) -> RigResult<()> {
        let neck: Vec<String> = self.org[self.neck_index..].to_vec();
        let (first, last) = (&neck[0], &neck[neck.len() - 1]);

        // The neck control spans every neck bone below the head.
        let (neck_key, neck_name) = self.copy(edit, first, "neck")?;
        let head_pos = edit.get(last)?.head;
        edit.set_tail(&neck_name, head_pos)?;
        let (head_key, _) = self.copy(edit, last, "head")?;

        let (stretch, _) = self.copy(edit, &neck_key, &mch("STR-neck"))?;
        let (mch_neck, mch_neck_name) = self.copy(edit, &neck_key, &mch("ROT-neck"))?;
        orient(edit, &mch_neck_name, self.spine_length / 10.0, false)?;
        let (mch_head, mch_head_name) = self.copy(edit, &head_key, &mch("ROT-head"))?;
        orient(edit, &mch_head_name, self.spine_length / 10.0, false)?;

        for org in &neck[1..neck.len() - 1] {
            let (key, name) = self.copy(edit, org, &mch(basename(org)))?;
            edit.scale_length(&name, 0.25)?;
            self.bones.neck_mch.push(key);
        }
        for org in &neck[..neck.len() - 1] {
            let key = self.create_tweak(edit, org)?;
            self.bones.neck_tweaks.push(key);
        }

        self.bones.neck = neck_key;
        self.bones.head = head_key;
        self.bones.mch_stretch = stretch;
        self.bones.mch_neck = mch_neck;
        self.bones.mch_head = mch_head;
        Ok(())
    }

    fn create_chest(&mut self, edit: &mut EditMode<'_>) -> RigResult<()> {
        let chest: Vec<String> = self.org[self.pivot_index..self.neck_index].to_vec();
        let (ctrl, ctrl_name) = self.copy(edit, &chest[0], "chest")?;
        orient(edit, &ctrl_name, self.spine_length / 3.0, false)?;
        let (widget, _) = self.copy(edit, &chest[chest.len() - 1], &mch("chest"))?;

        for org in &chest {
            let (key, name) = self.copy(edit, org, &mch(basename(org)))?;
            orient(edit, &name, self.spine_length / 10.0, false)?;
            self.bones.chest_mch.push(key);
            let tweak = self.create_tweak(edit, org)?;
            self.bones.chest_tweaks.push(tweak);
        }

        self.bones.chest = ctrl;
        self.bones.chest_widget = widget;
        Ok(())
    }

    fn create_hips(&mut self, edit: &mut EditMode<'_>) -> RigResult<()> {
        let hips: Vec<String> = self.org[..self.pivot_index].to_vec();
        let (ctrl, ctrl_name) = self.copy(edit, &hips[hips.len() - 1], "hips")?;
        orient(edit, &ctrl_name, self.spine_length / 4.0, true)?;
        let (widget, _) = self.copy(edit, &hips[0], &mch("hips"))?;

        for org in &hips {
            let (key, name) = self.copy(edit, org, &mch(basename(org)))?;
            orient(edit, &name, self.spine_length / 10.0, true)?;
            self.bones.hips_mch.push(key);
            let tweak = self.create_tweak(edit, org)?;
            self.bones.hips_tweaks.push(tweak);
        }

        self.bones.hips = ctrl;
        self.bones.hips_widget = widget;
        Ok(())
    }

    /// Half-length copy of `org`.
    fn create_tweak(&mut self, edit: &mut EditMode<'_>, org: &str) -> RigResult<String> {
        let (key, name) = self.copy(edit, org, &format!("tweak_{}", basename(org)))?;
        edit.scale_length(&name, 0.5)?;
        Ok(key)
    }

    fn attach(&self, edit: &mut EditMode<'_>, child: &str, parent: &str) -> RigResult<()> {
        edit.attach(&self.name(child)?, &self.name(parent)?, false)
    }

    fn wire_mechanism(&self, pose: &mut PoseMode<'_>) -> RigResult<()> {
        let b = &self.bones;
        let torso = self.name(&b.torso)?;
        let head = self.name(&b.head)?;

        // The first constraint of each is the one the follow sliders drive.
        for key in [&b.mch_head, &b.mch_neck] {
            let owner = self.name(key)?;
            constrain(pose, &owner, &torso, Constraint::new(ConstraintKind::CopyRotation { use_offset: false }))?;
            constrain(pose, &owner, &torso, Constraint::new(ConstraintKind::CopyScale { use_offset: false }))?;
        }
        constrain(
            pose,
            &self.name(&b.mch_stretch)?,
            &head,
            Constraint::new(ConstraintKind::damped_track(0.0)),
        )?;

        let neck_mch = self.names(&b.neck_mch)?;
        for (j, owner) in neck_mch.iter().enumerate() {
            let influence = (j + 1) as f64 / neck_mch.len() as f64;
            constrain(
                pose,
                owner,
                &head,
                Constraint::new(ConstraintKind::CopyRotation { use_offset: false }).with_influence(influence),
            )?;
        }

        for (ctrl, chain, tweaks) in [
            (&b.chest, &b.chest_mch, &b.chest_tweaks),
            (&b.hips, &b.hips_mch, &b.hips_tweaks),
        ] {
            let ctrl = self.name(ctrl)?;
            let factor = 1.0 / tweaks.len() as f64;
            for owner in self.names(chain)? {
                constrain(
                    pose,
                    &owner,
                    &ctrl,
                    Constraint::new(ConstraintKind::CopyTransforms)
                        .with_influence(factor)
                        .with_spaces(Space::Local, Space::Local),
                )?;
            }
        }

        let lowest = self.name(&b.hips_mch[b.hips_mch.len() - 1])?;
        constrain(
            pose,
            &self.name(&b.mch_pivot)?,
            &lowest,
            Constraint::new(ConstraintKind::CopyTransforms).with_spaces(Space::Local, Space::Local),
        )?;
        Ok(())
    }

    /// Original bones copy their tweak and aim at the next one.
    fn wire_deform(&self, pose: &mut PoseMode<'_>) -> RigResult<()> {
        let tweaks = self
            .deform_tweaks()
            .into_iter()
            .map(|k| self.name(k))
            .collect::<RigResult<Vec<_>>>()?;

        for (i, (org, tweak)) in self.org.iter().zip(&tweaks).enumerate() {
            constrain(pose, org, tweak, Constraint::new(ConstraintKind::CopyTransforms))?;
            if self.stretchable {
                add_slider(pose, tweak, TWEAK_STRETCH, 1.0, TWEAK_STRETCH)?;
            }
            let Some(next) = tweaks.get(i + 1) else {
                continue;
            };
            constrain(pose, org, next, Constraint::new(ConstraintKind::damped_track(0.0)))?;
            if self.stretchable {
                let stretch = constrain(pose, org, next, Constraint::new(ConstraintKind::stretch_to(0.0)))?;
                let source = PropertyPath::new(tweak.as_str(), TWEAK_STRETCH);
                drive_constraint(pose, org, &stretch, DriverKind::Sum, &source, None)?;
            }
        }

        let head = self.name(&self.bones.head)?;
        for tweak in tweaks.iter().filter(|t| **t != head) {
            pose.pose_mut(tweak)?.rotation_mode = RotationMode::Zxy;
        }
        Ok(())
    }

    fn wire_follow(&self, pose: &mut PoseMode<'_>) -> RigResult<()> {
        let torso = self.name(&self.bones.torso)?;
        let head_follow = add_slider(pose, &torso, HEAD_FOLLOW, 0.0, HEAD_FOLLOW)?;
        let neck_follow = add_slider(pose, &torso, NECK_FOLLOW, 0.5, NECK_FOLLOW)?;

        for (key, follow) in [(&self.bones.mch_head, head_follow), (&self.bones.mch_neck, neck_follow)] {
            let owner = self.name(key)?;
            let rotation = pose.constraint_name(&owner, 0)?;
            drive_constraint(pose, &owner, &rotation, DriverKind::Average, &follow, Some(Polynomial::INVERT))?;
        }
        Ok(())
    }

    fn wire_widgets(&self, pose: &mut PoseMode<'_>, widgets: &mut WidgetLibrary) -> RigResult<()> {
        let b = &self.bones;
        widgets.build(&self.name(&b.torso)?, WidgetShape::Torso);
        for key in [&b.neck, &b.chest, &b.hips] {
            widgets.build(
                &self.name(key)?,
                WidgetShape::DirectedCircle {
                    radius: 1.0,
                    head_tail: 0.5,
                },
            );
        }
        widgets.build(
            &self.name(&b.head)?,
            WidgetShape::DirectedCircle {
                radius: 0.75,
                head_tail: 1.0,
            },
        );
        pose.set_custom_shape_transform(&self.name(&b.chest)?, &self.name(&b.chest_widget)?)?;
        pose.set_custom_shape_transform(&self.name(&b.hips)?, &self.name(&b.hips_widget)?)?;

        let tweaks = b.neck_tweaks.iter().chain(&b.chest_tweaks).chain(&b.hips_tweaks);
        for key in tweaks {
            let tweak = self.name(key)?;
            let settings = pose.pose_mut(&tweak)?;
            settings.lock_rotation = [true, false, true];
            settings.lock_scale = [false, true, false];
            widgets.build(&tweak, WidgetShape::Sphere);
            if let Some(layers) = self.tweak_layers {
                pose.set_layers(&tweak, layers)?;
            }
        }
        Ok(())
    }
}

/// Points `name` along +Y with the given length, starting from its head,
/// or from its tail when `reverse` is set.
fn orient(edit: &mut EditMode<'_>, name: &str, length: f64, reverse: bool) -> RigResult<()> {
    let start = {
        let bone = edit.get(name)?;
        if reverse {
            bone.tail
        } else {
            bone.head
        }
    };
    edit.set_head(name, start)?;
    edit.set_tail(name, add(start, [0.0, length, 0.0]))
}

impl Rig for Torso {
    fn rig_type(&self) -> &str {
        RIG_TYPE
    }

    fn base_bone(&self) -> &str {
        &self.base
    }

    fn create_bones(&mut self, edit: &mut EditMode<'_>) -> RigResult<()> {
        self.create_pivot(edit)?;
        self.create_neck(edit)?;
        self.create_chest(edit)?;
        self.create_hips(edit)?;
        debug!(
            base = %self.base,
            hips = self.pivot_index,
            chest = self.neck_index - self.pivot_index,
            neck = self.org.len() - self.neck_index,
            "torso bones created"
        );
        Ok(())
    }

    fn parent_bones(&mut self, edit: &mut EditMode<'_>) -> RigResult<()> {
        let b = self.bones.clone();
        let root_parent = edit.get(&self.org[0])?.parent.clone();
        edit.set_parent(&self.name(&b.torso)?, root_parent.as_deref())?;

        self.attach(edit, &b.head, &b.mch_head)?;
        self.attach(edit, &b.mch_stretch, &b.neck)?;
        self.attach(edit, &b.neck, &b.mch_neck)?;
        self.attach(edit, &b.chest, &b.torso)?;
        self.attach(edit, &b.hips, &b.torso)?;

        self.attach(edit, &b.mch_head, &b.neck)?;
        for key in &b.neck_mch {
            self.attach(edit, key, &b.mch_stretch)?;
        }

        // Chest mechanism climbs from the torso up into the neck rotation.
        let mut previous = &b.torso;
        for key in b.chest_mch.iter().chain(std::iter::once(&b.mch_neck)) {
            self.attach(edit, key, previous)?;
            previous = key;
        }
        // Hips mechanism hangs down from the torso.
        let mut previous = &b.torso;
        for key in b.hips_mch.iter().rev() {
            self.attach(edit, key, previous)?;
            previous = key;
        }

        self.attach(edit, &b.mch_pivot, &b.chest_mch[0])?;
        self.attach(edit, &b.chest_widget, &b.chest_mch[b.chest_mch.len() - 1])?;
        self.attach(edit, &b.hips_widget, &b.hips_mch[0])?;

        for (i, key) in b.neck_tweaks.iter().enumerate() {
            let parent = if i == 0 { &b.neck } else { &b.neck_mch[i - 1] };
            self.attach(edit, key, parent)?;
        }
        for (i, (key, chain)) in b.chest_tweaks.iter().zip(&b.chest_mch).enumerate() {
            let parent = if i == 0 { &b.mch_pivot } else { chain };
            self.attach(edit, key, parent)?;
        }
        for (i, key) in b.hips_tweaks.iter().enumerate() {
            self.attach(edit, key, &b.hips_mch[i.saturating_sub(1)])?;
        }
        Ok(())
    }

    fn wire(&mut self, pose: &mut PoseMode<'_>, widgets: &mut WidgetLibrary) -> RigResult<()> {
        for key in self.map.keys().iter().filter(|k| !self.org.contains(k)) {
            pose.set_deform(&self.name(key)?, false)?;
        }
        self.wire_mechanism(pose)?;
        self.wire_deform(pose)?;
        self.wire_follow(pose)?;
        self.wire_widgets(pose, widgets)
    }

    fn ui(&self) -> UiFragment {
        let mut fragment = UiFragment::new(RIG_TYPE, &self.base);
        if self.bones.torso.is_empty() {
            return fragment;
        }
        let resolve = |key: &String| self.map.resolve(key).map(str::to_string).unwrap_or_default();
        let b = &self.bones;
        let torso = resolve(&b.torso);
        let controls: Vec<String> = [&b.head, &b.neck, &b.chest, &b.hips, &b.torso]
            .into_iter()
            .map(resolve)
            .collect();

        fragment.push(
            UiSection::when_selected(&controls)
                .with_item(UiItem::property(&torso, HEAD_FOLLOW, format!("{} ({})", HEAD_FOLLOW, torso)))
                .with_item(UiItem::property(&torso, NECK_FOLLOW, format!("{} ({})", NECK_FOLLOW, torso))),
        );
        if self.stretchable {
            for tweak in self.deform_tweaks().into_iter().map(resolve) {
                fragment.push(UiSection::when_selected(&[tweak.as_str()]).with_item(UiItem::property(
                    &tweak,
                    TWEAK_STRETCH,
                    format!("{} ({})", TWEAK_STRETCH, tweak),
                )));
            }
        }
        fragment
    }
}

/// Six-bone spine from the hips up to the head.
pub fn sample() -> Metarig {
    let params = RigParameters::new()
        .with("pivot_pos", 2)
        .with("neck_pos", 5)
        .with("stretchable_tweak", true)
        .with("tweak_layers", LayerMask::single(4));
    let chain = [
        ("hips", [0.0, 0.0552, -0.0007], [0.0, -0.0037, 0.2256]),
        ("waist", [0.0, -0.0037, 0.2256], [0.0, -0.0099, 0.3598]),
        ("chest", [0.0, -0.0099, 0.3598], [0.0, -0.0045, 0.4748]),
        ("upper_chest", [0.0, -0.0045, 0.4748], [0.0, 0.0114, 0.6476]),
        ("neck", [0.0, 0.0114, 0.6476], [0.0, -0.0247, 0.7707]),
        ("head", [0.0, -0.0247, 0.7707], [0.0, -0.0247, 0.9690]),
    ];

    let mut metarig = Metarig::new("metarig");
    let mut parent: Option<&str> = None;
    for (name, head, tail) in chain {
        let bone = match parent {
            None => Bone::new(name, head, tail)
                .with_rig_type(RIG_TYPE)
                .with_parameters(params.clone()),
            Some(parent) => Bone::new(name, head, tail).with_parent(parent).with_connect(true),
        };
        metarig = metarig.with_bone(bone);
        parent = Some(name);
    }
    metarig
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::{GenerateConfig, Generator};
    use gamerig_spec::math::approx_eq;
    use pretty_assertions::assert_eq;

    fn spine(bones: usize) -> Armature {
        let mut armature = Armature::new("rig");
        let mut edit = armature.edit();
        for i in 0..bones {
            let name = format!("ORG-spine.{:03}", i);
            edit.new_bone(&name, [0.0, 0.0, i as f64], [0.0, 0.0, (i + 1) as f64]);
            if i > 0 {
                edit.attach(&name, &format!("ORG-spine.{:03}", i - 1), true).unwrap();
            }
        }
        drop(edit);
        armature
    }

    fn build(armature: &Armature, stored: RigParameters) -> RigResult<Torso> {
        let params = ResolvedParams::resolve(&parameters(), &stored).unwrap();
        Torso::new(armature, "ORG-spine.000", &params)
    }

    #[test]
    fn test_position_errors() {
        let armature = spine(6);
        let positions = |neck: i64, pivot: i64| RigParameters::new().with("neck_pos", neck).with("pivot_pos", pivot);

        assert!(build(&armature, positions(5, 2)).is_ok());

        let err = build(&armature, positions(3, 3)).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("at or below its pivot"), "{}", err);
        assert!(build(&armature, positions(2, 4)).unwrap_err().is_configuration());

        let err = build(&armature, positions(0, 2)).unwrap_err();
        assert!(err.to_string().contains("needs both neck and pivot"), "{}", err);
    }

    #[test]
    fn test_structure_errors() {
        // Four bones cannot hold hips, chest, neck and head.
        let err = build(&spine(4), RigParameters::new().with("neck_pos", 3)).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("4 connected bones"), "{}", err);

        let armature = spine(6);
        // The pivot must leave a hips bone below it.
        let stored = RigParameters::new().with("pivot_pos", 1).with("neck_pos", 4);
        assert!(build(&armature, stored).unwrap_err().is_configuration());
        // The neck must start below the head.
        let stored = RigParameters::new().with("neck_pos", 6);
        assert!(build(&armature, stored).unwrap_err().is_configuration());
    }

    #[test]
    fn test_sample_topology() {
        let rig = Generator::new(GenerateConfig::default().with_seed(3))
            .generate(&sample(), None)
            .unwrap();
        let arm = &rig.armature;
        let parent = |name: &str| arm.get(name).unwrap().parent.clone();

        assert_eq!(parent("torso"), None);
        assert_eq!(parent("chest").as_deref(), Some("torso"));
        assert_eq!(parent("hips").as_deref(), Some("torso"));
        assert_eq!(parent("head").as_deref(), Some("MCH-ROT-head"));
        assert_eq!(parent("neck").as_deref(), Some("MCH-ROT-neck"));
        assert_eq!(parent("MCH-ROT-neck").as_deref(), Some("MCH-upper_chest"));
        assert_eq!(parent("MCH-waist").as_deref(), Some("torso"));
        assert_eq!(parent("MCH-pivot").as_deref(), Some("MCH-waist"));
        assert_eq!(parent("tweak_waist").as_deref(), Some("MCH-pivot"));
        assert_eq!(parent("tweak_chest").as_deref(), Some("MCH-chest.001"));
        assert_eq!(parent("tweak_neck").as_deref(), Some("neck"));

        // The torso control stands at the middle of the hips bone.
        let torso = arm.get("torso").unwrap();
        assert!(approx_eq(torso.head, [0.0, 0.02575, 0.11245], 1e-9));
        assert_eq!(torso.pose.custom_shape.as_deref(), Some("WGT-rig_torso"));
        assert_eq!(
            arm.get("chest").unwrap().pose.custom_shape_transform.as_deref(),
            Some("MCH-chest")
        );
        assert!(!torso.use_deform);

        let tweak = arm.get("tweak_waist").unwrap();
        assert!(tweak.layers.is_set(4));
        assert_eq!(tweak.pose.rotation_mode, RotationMode::Zxy);
        assert_eq!(tweak.pose.lock_rotation, [true, false, true]);

        // Each original bone follows its tweak and aims at the next one.
        let hips = arm.get("ORG-hips").unwrap();
        let kinds: Vec<&str> = hips.constraints.iter().map(|c| c.kind.display_name()).collect();
        assert_eq!(kinds, vec!["Copy Transforms", "Damped Track", "Stretch To"]);
        assert_eq!(hips.constraints[0].subtarget.as_deref(), Some("tweak_hips"));
        assert_eq!(hips.constraints[1].subtarget.as_deref(), Some("tweak_waist"));
        let head = arm.get("ORG-head").unwrap();
        assert_eq!(head.constraints.len(), 1);
        assert_eq!(head.constraints[0].subtarget.as_deref(), Some("head"));
    }

    /// Influence of the torso-following rotation on `bone`.
    fn follow_influence(arm: &Armature, bone: &str) -> f64 {
        let owner = arm.get(bone).unwrap();
        assert_eq!(owner.constraints[0].subtarget.as_deref(), Some("torso"));
        arm.evaluated_influence(bone, &owner.constraints[0])
    }

    #[test]
    fn test_follow_sliders_drive_rotation() {
        let mut rig = Generator::new(GenerateConfig::default().with_seed(3))
            .generate(&sample(), None)
            .unwrap();

        let torso = rig.armature.get("torso").unwrap();
        assert_eq!(torso.properties[HEAD_FOLLOW].value, 0.0);
        assert_eq!(torso.properties[NECK_FOLLOW].value, 0.5);
        assert_eq!(follow_influence(&rig.armature, "MCH-ROT-head"), 1.0);
        assert_eq!(follow_influence(&rig.armature, "MCH-ROT-neck"), 0.5);

        rig.armature
            .set_property_value(&PropertyPath::new("torso", HEAD_FOLLOW), 1.0)
            .unwrap();
        rig.armature
            .set_property_value(&PropertyPath::new("torso", NECK_FOLLOW), 0.0)
            .unwrap();
        assert_eq!(follow_influence(&rig.armature, "MCH-ROT-head"), 0.0);
        assert_eq!(follow_influence(&rig.armature, "MCH-ROT-neck"), 1.0);

        // The copy-scale constraints stay undriven.
        let scale = &rig.armature.get("MCH-ROT-head").unwrap().constraints[1];
        assert_eq!(rig.armature.evaluated_influence("MCH-ROT-head", scale), 1.0);
    }

    #[test]
    fn test_tweak_stretch_drivers() {
        let mut rig = Generator::new(GenerateConfig::default().with_seed(3))
            .generate(&sample(), None)
            .unwrap();
        let arm = &mut rig.armature;
        let stretch = arm.get("ORG-waist").unwrap().constraints[2].clone();
        assert_eq!(stretch.kind.display_name(), "Stretch To");
        assert_eq!(arm.evaluated_influence("ORG-waist", &stretch), 1.0);

        arm.set_property_value(&PropertyPath::new("tweak_waist", TWEAK_STRETCH), 0.25)
            .unwrap();
        assert_eq!(arm.evaluated_influence("ORG-waist", &stretch), 0.25);
        assert_eq!(arm.get("head").unwrap().properties[TWEAK_STRETCH].value, 1.0);

        let mut rigid = sample();
        rigid.bones[0].parameters.set("stretchable_tweak", false);
        let rig = Generator::new(GenerateConfig::default().with_seed(3))
            .generate(&rigid, None)
            .unwrap();
        let waist = rig.armature.get("ORG-waist").unwrap();
        assert_eq!(waist.constraints.len(), 2);
        assert!(!rig.armature.get("tweak_waist").unwrap().properties.contains_key(TWEAK_STRETCH));
    }

    #[test]
    fn test_ui_lists_follow_sliders() {
        let rig = Generator::new(GenerateConfig::default().with_seed(3))
            .generate(&sample(), None)
            .unwrap();
        let visible = rig.ui.visible_items(&["chest"]);
        let labels: Vec<String> = visible
            .iter()
            .filter_map(|item| match item {
                UiItem::Property { label, .. } => Some(label.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(labels, vec!["Head Follow (torso)", "Neck Follow (torso)"]);

        let visible = rig.ui.visible_items(&["tweak_neck"]);
        assert_eq!(visible.len(), 1);
    }
}
