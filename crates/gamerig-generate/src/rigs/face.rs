//! Face rig type.
//!
//! A face is discovered from its root bone by prefix-matched chain searches
//! ([`tables::CHAINS`]). Generation then builds:
//!
//! - controls: per-eye look targets with a shared `eyes` control and per-eye
//!   masters, a nose master, ear controls, a jaw master and a tongue master,
//! - tweaks: one sculpting handle per original bone (minus a fixed exception
//!   list), split between a primary and a secondary layer set,
//! - mechanism bones: eye trackers, lid pivots, a six-bone jaw fan, tongue
//!   followers and follow parents,
//! - one `MCH-target_<bone>` per original bone, which the original bone
//!   copies and which tracks and stretches to the next tweak.
//!
//! Four follow sliders drive mechanism constraints: `Mouth Lock` (jaw fan),
//! `Eyes Follow`, `Tongue Follow` and `Chin Follow`.

use gamerig_spec::math::{add, cross, length, midpoint, sub};
use gamerig_spec::naming::{basename, insert_before_first_period, left_to_right, mch, org, symmetrical_split};
use gamerig_spec::{
    Constraint, ConstraintKind, DriverKind, LayerMask, ParamDecl, ResolvedParams, Space, Vec3,
};
use tracing::debug;

use crate::armature::{Armature, EditMode, PoseMode};
use crate::error::RigResult;
use crate::name_map::BoneNameMap;
use crate::rigs::{add_slider, drive_constraint, optional_layers, Rig};
use crate::snap::OperatorDecl;
use crate::ui::{UiFragment, UiItem, UiSection};
use crate::widgets::{WidgetLibrary, WidgetShape};

mod sample;
pub mod tables;

pub use sample::sample;
use tables::SearchFrom;

pub const RIG_TYPE: &str = "face";

const TARGET_PREFIX: &str = "MCH-target_";

/// `nose` -> `MCH-target_nose`
pub fn mch_target(name: &str) -> String {
    if name.starts_with(TARGET_PREFIX) {
        name.to_string()
    } else {
        format!("{}{}", TARGET_PREFIX, name)
    }
}

pub fn parameters() -> Vec<ParamDecl> {
    vec![
        ParamDecl::bool("primary_layers_extra", true, "Create the primary tweaks"),
        ParamDecl::layers("primary_layers", 1, "Layers for the 1st tweak controls to be on"),
        ParamDecl::bool("secondary_layers_extra", true, "Create the secondary tweaks"),
        ParamDecl::layers("secondary_layers", 2, "Layers for the 2nd tweak controls to be on"),
    ]
}

pub fn construct(armature: &Armature, base: &str, params: &ResolvedParams) -> RigResult<Box<dyn Rig>> {
    Ok(Box::new(Face::new(armature, base, params)?))
}

/// The face declares no snap operators.
pub fn operators() -> Vec<OperatorDecl> {
    Vec::new()
}

/// Registers the chain of bones below `start` whose basenames begin with
/// `prefix`. Returns the last bone found, or `start` when there is none.
fn discover_chain(
    armature: &Armature,
    start: &str,
    prefix: &str,
    map: &mut BoneNameMap,
    keys: &mut Vec<String>,
) -> RigResult<String> {
    let mut current = start.to_string();
    for depth in 0..armature.len() {
        let next = armature
            .children(&current)
            .into_iter()
            .find(|b| basename(&b.name).starts_with(prefix))
            .map(|b| b.name.clone());
        let Some(child) = next else {
            break;
        };
        let key = match depth {
            0 => org(prefix),
            n => format!("{}.{:03}", org(prefix), n),
        };
        if !map.contains(&key) {
            map.register(key.clone(), child.as_str())?;
            keys.push(key);
        }
        current = child;
    }
    Ok(current)
}

// =============================================================================
// Bone groups
// =============================================================================

#[derive(Debug, Clone, Default)]
struct FaceCtrls {
    /// `eye.L`, `eye.R` and the shared `eyes` control.
    eyes: Vec<String>,
    eye_masters: Vec<String>,
    nose: Option<String>,
    ears: Vec<String>,
    jaw: Option<String>,
    tongue: Option<String>,
}

impl FaceCtrls {
    fn all(&self) -> Vec<String> {
        let mut out: Vec<String> = self.eyes.iter().chain(&self.eye_masters).cloned().collect();
        out.extend(self.nose.iter().cloned());
        out.extend(self.ears.iter().cloned());
        out.extend(self.jaw.iter().cloned());
        out.extend(self.tongue.iter().cloned());
        out
    }
}

#[derive(Debug, Clone, Default)]
struct FaceMch {
    /// Tracker and lid-follow bone per eye.
    eyes: Vec<[String; 2]>,
    eyes_parent: Option<String>,
    lids: Vec<String>,
    /// `MCH-mouth_lock` followed by the five jaw fan bones.
    jaw: Vec<String>,
    tongue: Vec<String>,
    tongue_parent: Option<String>,
    chin_parent: Option<String>,
    chin: Option<String>,
}

impl FaceMch {
    fn all(&self) -> Vec<String> {
        let mut out: Vec<String> = self.eyes.iter().flatten().cloned().collect();
        out.extend(self.eyes_parent.iter().cloned());
        out.extend(self.lids.iter().cloned());
        out.extend(self.jaw.iter().cloned());
        out.extend(self.tongue.iter().cloned());
        out.extend(self.tongue_parent.iter().cloned());
        out.extend(self.chin_parent.iter().cloned());
        out.extend(self.chin.iter().cloned());
        out
    }
}

// =============================================================================
// Rig
// =============================================================================

#[derive(Debug)]
pub struct Face {
    base: String,
    map: BoneNameMap,
    /// Original bone keys in discovery order, `ORG-face` first.
    org: Vec<String>,
    face_length: f64,
    primary_layers: Option<LayerMask>,
    secondary_layers: Option<LayerMask>,
    ctrls: FaceCtrls,
    tweaks: Vec<String>,
    mch: FaceMch,
    targets: Vec<String>,
    /// Follow sliders created during wiring: bone key, property.
    follow: Vec<(String, &'static str)>,
}

impl Face {
    pub fn new(armature: &Armature, base: &str, params: &ResolvedParams) -> RigResult<Self> {
        let face = org("face");
        let mut map = BoneNameMap::new();
        map.register(face.as_str(), base)?;
        let mut keys = vec![face];

        let mut previous = base.to_string();
        for &(prefix, from) in tables::CHAINS {
            let start = match from {
                SearchFrom::Root => base.to_string(),
                SearchFrom::Previous => previous,
            };
            previous = discover_chain(armature, &start, prefix, &mut map, &mut keys)?;
        }

        Ok(Self {
            base: base.to_string(),
            map,
            org: keys,
            face_length: armature.get(base)?.length(),
            primary_layers: optional_layers(params, "primary_layers_extra", "primary_layers")?,
            secondary_layers: optional_layers(params, "secondary_layers_extra", "secondary_layers")?,
            ctrls: FaceCtrls::default(),
            tweaks: Vec::new(),
            mch: FaceMch::default(),
            targets: Vec::new(),
            follow: Vec::new(),
        })
    }

    /// Logical keys of the discovered original bones.
    pub fn org_keys(&self) -> &[String] {
        &self.org
    }

    fn has(&self, key: &str) -> bool {
        self.map.contains(key)
    }

    fn name(&self, key: &str) -> RigResult<String> {
        self.map.resolve(key).map(str::to_string)
    }

    fn head(&self, edit: &EditMode<'_>, key: &str) -> RigResult<Vec3> {
        Ok(edit.get(self.map.resolve(key)?)?.head)
    }

    fn tail(&self, edit: &EditMode<'_>, key: &str) -> RigResult<Vec3> {
        Ok(edit.get(self.map.resolve(key)?)?.tail)
    }

    fn org_matching(&self, needle: &str) -> Vec<String> {
        self.org.iter().filter(|k| k.contains(needle)).cloned().collect()
    }

    /// Copies `source` as `requested` and detaches the copy.
    fn copy_detached(&mut self, edit: &mut EditMode<'_>, source: &str, requested: &str) -> RigResult<String> {
        let key = self.map.copy_bone(edit, source, requested)?;
        edit.set_parent(self.map.resolve(&key)?, None)?;
        Ok(key)
    }

    /// Moves the bone so it starts at `head` and points up by `height`.
    fn stand_at(&self, edit: &mut EditMode<'_>, key: &str, head: Vec3, height: f64) -> RigResult<()> {
        let name = self.map.resolve(key)?;
        edit.set_head(name, head)?;
        edit.set_tail(name, add(head, [0.0, 0.0, height]))
    }

    fn parent_if(&self, edit: &mut EditMode<'_>, child: &str, parent: &str) -> RigResult<()> {
        if self.has(child) && self.has(parent) {
            edit.set_parent(self.map.resolve(child)?, Some(self.map.resolve(parent)?))?;
        }
        Ok(())
    }

    fn has_parent(&self, edit: &EditMode<'_>, key: &str) -> RigResult<bool> {
        Ok(edit.get(self.map.resolve(key)?)?.parent.is_some())
    }

    /// Adds `constraints` from `owner` to `target` when the face has both.
    fn constrain_keys(
        &self,
        pose: &mut PoseMode<'_>,
        owner: &str,
        target: &str,
        constraints: impl IntoIterator<Item = Constraint>,
    ) -> RigResult<()> {
        if !(self.has(owner) && self.has(target)) {
            return Ok(());
        }
        let owner = self.map.resolve(owner)?;
        let target = self.map.resolve(target)?;
        for constraint in constraints {
            pose.add_constraint(owner, constraint.with_subtarget(target))?;
        }
        Ok(())
    }

    // =========================================================================
    // Bone creation
    // =========================================================================

    fn create_targets(&mut self, edit: &mut EditMode<'_>) -> RigResult<()> {
        for key in self.org[1..].to_vec() {
            let target = self.copy_detached(edit, &key, &mch_target(basename(&key)))?;
            self.targets.push(target);
        }
        Ok(())
    }

    fn create_eye_ctrls(&mut self, edit: &mut EditMode<'_>) -> RigResult<()> {
        let eyes: Vec<&str> = tables::EYE_BONES.iter().copied().filter(|k| self.has(k)).collect();
        let [left, right] = match eyes.as_slice() {
            [left, right, ..] => [*left, *right],
            _ => return Ok(()),
        };
        let distance = cross(sub(self.head(edit, left)?, self.head(edit, right)?), [0.0, 0.0, 1.0]);
        let eye_length = edit.get(self.map.resolve(left)?)?.length();

        let left_key = self.map.copy_bone(edit, left, basename(left))?;
        let right_key = self.map.copy_bone(edit, right, basename(right))?;
        let both_key = self.map.copy_bone(edit, left, "eyes")?;

        let left_head = add(self.tail(edit, left)?, distance);
        let right_head = add(self.tail(edit, right)?, distance);
        let both_head = midpoint(left_head, right_head);
        let height = eye_length * 0.75;
        self.stand_at(edit, &left_key, left_head, height)?;
        self.stand_at(edit, &right_key, right_head, height)?;
        self.stand_at(edit, &both_key, both_head, height)?;
        edit.set_length(self.map.resolve(&both_key)?, length(sub(left_head, both_head)) * 0.62)?;

        for eye in [left, right] {
            let master = self.map.copy_bone(edit, eye, &insert_before_first_period(basename(eye), "_master"))?;
            self.ctrls.eye_masters.push(master);
        }
        self.ctrls.eyes = vec![left_key, right_key, both_key];
        Ok(())
    }

    fn create_ctrls(&mut self, edit: &mut EditMode<'_>) -> RigResult<()> {
        self.create_eye_ctrls(edit)?;

        if self.has("ORG-nose.003") {
            let key = self.map.copy_bone(edit, "ORG-nose.003", "nose_master")?;
            let head = self.head(edit, &key)?;
            edit.set_tail(self.map.resolve(&key)?, add(head, [0.0, -self.face_length / 4.0, 0.0]))?;
            self.ctrls.nose = Some(key);
        }

        for ear in tables::EAR_BONES {
            if self.has(ear) {
                let key = self.map.copy_bone(edit, ear, basename(ear))?;
                self.ctrls.ears.push(key);
            }
        }

        let jaws: Vec<&str> = tables::JAW_BONES.iter().copied().filter(|k| self.has(k)).collect();
        match jaws.as_slice() {
            [left, right, jaw] => {
                let key = self.map.copy_bone(edit, jaw, &format!("{}_master", basename(jaw)))?;
                let head = midpoint(self.head(edit, left)?, self.head(edit, right)?);
                edit.set_head(self.map.resolve(&key)?, head)?;
                self.ctrls.jaw = Some(key);
            }
            [jaw] => {
                let key = self.map.copy_bone(edit, jaw, &format!("{}_master", basename(jaw)))?;
                self.ctrls.jaw = Some(key);
            }
            _ => {}
        }

        let mut tongues = self.org_matching("tongue");
        tongues.sort();
        if let Some(tongue) = tongues.first() {
            let key = self.map.copy_bone(edit, tongue, &format!("{}_master", basename(tongue)))?;
            edit.flip_bone(self.map.resolve(&key)?)?;
            self.ctrls.tongue = Some(key);
        }
        Ok(())
    }

    fn create_tweaks(&mut self, edit: &mut EditMode<'_>) -> RigResult<()> {
        let unique = |key: &str| {
            tables::TWEAK_UNIQUE
                .iter()
                .find(|(org, _)| *org == key)
                .map(|(_, tweak)| *tweak)
        };
        let excluded = |key: &str| {
            key.contains("temple") || tables::TWEAK_EXCEPTIONS.contains(&key) || unique(key).is_some()
        };

        let mut bones: Vec<String> = self.org.iter().filter(|k| !excluded(k)).cloned().collect();
        bones.sort();
        bones.extend(tables::TWEAK_UNIQUE.iter().map(|(org, _)| org.to_string()));

        let height = self.face_length / 7.0;
        for bone in bones {
            if !self.has(&bone) {
                continue;
            }
            let primary = tables::is_primary(basename(&bone));
            let enabled = if primary {
                self.primary_layers.is_some()
            } else {
                self.secondary_layers.is_some()
            };
            if !enabled {
                continue;
            }

            let requested = match unique(&bone) {
                Some(name) => name.to_string(),
                None => basename(&bone).to_string(),
            };
            let key = self.copy_detached(edit, &bone, &requested)?;
            let head = self.head(edit, &key)?;
            self.stand_at(edit, &key, head, height)?;
            self.tweaks.push(key.clone());

            if tables::TWEAK_TAILS.contains(&bone.as_str()) {
                let requested = tables::TAIL_NAMES
                    .iter()
                    .find(|(org, _)| *org == basename(&bone))
                    .map_or(key.as_str(), |(_, name)| *name)
                    .to_string();
                let tail_key = self.copy_detached(edit, &bone, &requested)?;
                let head = self.tail(edit, &bone)?;
                self.stand_at(edit, &tail_key, head, height)?;
                self.tweaks.push(tail_key);
            }
        }
        Ok(())
    }

    fn create_mch(&mut self, edit: &mut EditMode<'_>) -> RigResult<()> {
        let mut eyes = self.org_matching("eye");
        eyes.sort();
        for eye in &eyes {
            let tracker = self.copy_detached(edit, eye, &mch(basename(eye)))?;
            let follow = self.copy_detached(edit, eye, &tracker)?;
            let head = self.tail(edit, &follow)?;
            self.stand_at(edit, &follow, head, 0.005)?;
            self.mch.eyes.push([tracker, follow]);
        }

        if !eyes.is_empty() {
            let key = self.copy_detached(edit, &org("face"), &mch("eyes_parent"))?;
            edit.scale_length(self.map.resolve(&key)?, 0.25)?;
            self.mch.eyes_parent = Some(key);
        }

        let (lids_left, lids_right) = symmetrical_split(&self.org_matching("lid"));
        for (eye, lids) in eyes.iter().zip([lids_left, lids_right]) {
            for lid in lids {
                let key = self.copy_detached(edit, eye, &mch(basename(&lid)))?;
                let tail = self.head(edit, &lid)?;
                edit.set_tail(self.map.resolve(&key)?, tail)?;
                self.mch.lids.push(key);
            }
        }

        if let Some(jaw) = self.ctrls.jaw.clone() {
            let jaw_length = edit.get(self.map.resolve(&jaw)?)?.length();
            let step = jaw_length / 6.0;
            for i in 0..6 {
                let requested = if i == 0 { mch("mouth_lock") } else { mch(&jaw) };
                let key = self.copy_detached(edit, &jaw, &requested)?;
                edit.set_length(self.map.resolve(&key)?, jaw_length - step * i as f64)?;
                self.mch.jaw.push(key);
            }
        }

        if let Some(tongue) = self.ctrls.tongue.clone() {
            let mut tongues = self.org_matching("tongue");
            tongues.sort();
            for bone in tongues.iter().skip(1) {
                let key = self.copy_detached(edit, &tongue, &mch(basename(bone)))?;
                self.mch.tongue.push(key);
            }
            if let Some(jaw) = self.ctrls.jaw.clone() {
                let key = self.copy_detached(edit, &jaw, &mch("tongue_parent"))?;
                edit.scale_length(self.map.resolve(&key)?, 0.25)?;
                self.mch.tongue_parent = Some(key);
            }
        }

        if let (true, Some(jaw)) = (self.tweaks.iter().any(|t| t == "chin"), self.ctrls.jaw.clone()) {
            let key = self.copy_detached(edit, &jaw, &mch("chin_parent"))?;
            edit.scale_length(self.map.resolve(&key)?, 0.25)?;
            self.mch.chin_parent = Some(key);
            self.mch.chin = Some(self.copy_detached(edit, "chin", &mch("chin"))?);
        }
        Ok(())
    }

    // =========================================================================
    // Parenting
    // =========================================================================

    /// Deformation targets, lids and ears follow their tweaks and controls.
    fn parent_targets(&self, edit: &mut EditMode<'_>) -> RigResult<()> {
        let stem = |target: &str| target[TARGET_PREFIX.len()..].to_string();

        for target in &self.targets {
            let stem = stem(target);
            if self.tweaks.contains(&stem) {
                self.parent_if(edit, target, &stem)?;
            }
            if target.contains("eye") {
                self.parent_if(edit, target, &mch(&stem))?;
            }
        }

        for (_, lip) in tables::TWEAK_UNIQUE {
            for target in &self.targets {
                let stem = stem(target);
                if stem.len() > 2 && stem.get(..stem.len() - 2) == Some(*lip) {
                    self.parent_if(edit, target, lip)?;
                }
            }
        }

        for (lip, brow, side) in [("lips.L", "brow.T.L", "L"), ("lips.R", "brow.T.R", "R")] {
            self.parent_if(edit, &mch_target(&format!("cheek.B.{}", side)), lip)?;
            self.parent_if(edit, &mch_target(&format!("cheek.T.{}", side)), brow)?;
        }

        for ear in ["ear.L", "ear.R"] {
            for target in [mch_target(ear), mch_target(&format!("{}.001", ear))] {
                if self.targets.contains(&target) {
                    self.parent_if(edit, &target, ear)?;
                }
            }
        }
        for tweak in tables::EAR_TWEAKS_L {
            self.parent_if(edit, tweak, "ear.L")?;
            self.parent_if(edit, &left_to_right(tweak), "ear.R")?;
        }

        for target in self.targets.iter().filter(|t| t.contains("lid")) {
            self.parent_if(edit, target, &mch(&stem(target)))?;
        }
        Ok(())
    }

    fn parent_mch_and_ctrls(&self, edit: &mut EditMode<'_>) -> RigResult<()> {
        if let Some(eyes_parent) = &self.mch.eyes_parent {
            edit.set_parent(self.map.resolve(eyes_parent)?, None)?;
        }

        if let Some(jaw) = &self.ctrls.jaw {
            for bone in &self.mch.tongue {
                self.parent_if(edit, bone, jaw)?;
            }
        }
        if let Some(tongue) = &self.ctrls.tongue {
            match (&self.mch.tongue_parent, &self.ctrls.jaw) {
                (Some(parent), _) | (None, Some(parent)) => self.parent_if(edit, tongue, parent)?,
                (None, None) => {}
            }
        }

        if self.has("eyes") {
            self.parent_if(edit, "eyes", &mch("eyes_parent"))?;
            for eye in self.ctrls.eyes.iter().take(2) {
                self.parent_if(edit, eye, "eyes")?;
            }
        }

        // Lid and lower-brow tweaks, lid pivots and eye trackers ride on
        // their side's eye master.
        let mut riders: Vec<String> = self
            .tweaks
            .iter()
            .filter(|t| t.contains("lid") || t.contains("brow.B"))
            .cloned()
            .collect();
        riders.extend(self.mch.lids.iter().cloned());
        for pair in self.mch.eyes.iter().rev() {
            riders.extend(pair.iter().cloned());
        }
        let (left, right) = symmetrical_split(&riders);
        for bone in &left {
            self.parent_if(edit, bone, "eye_master.L")?;
        }
        for bone in &right {
            self.parent_if(edit, bone, "eye_master.R")?;
        }

        if let Some(nose) = &self.ctrls.nose {
            self.parent_if(edit, nose, "MCH-jaw_master.004")?;
        }
        Ok(())
    }

    fn parent_tweaks(&self, edit: &mut EditMode<'_>) -> RigResult<()> {
        for (parent, children) in tables::PARENT_GROUPS {
            for child in *children {
                self.parent_if(edit, child, parent)?;
            }
        }

        let target_jaw = mch_target("jaw");
        if self.has(&target_jaw) && !self.has_parent(edit, &target_jaw)? {
            self.parent_if(edit, &target_jaw, "jaw_master")?;
        }

        if let Some(chin_parent) = &self.mch.chin_parent {
            if self.has("ORG-chin") {
                edit.set_connected(self.map.resolve("ORG-chin")?, false)?;
            }
            for chin in ["chin", "chin.L", "chin.R"] {
                self.parent_if(edit, chin, chin_parent)?;
            }
        }

        for (child, parent) in tables::PARENT_OVERRIDES {
            self.parent_if(edit, child, parent)?;
        }
        Ok(())
    }

    // =========================================================================
    // Wiring
    // =========================================================================

    fn wire_widgets(&self, pose: &mut PoseMode<'_>, widgets: &mut WidgetLibrary) -> RigResult<()> {
        let shapes = self
            .ctrls
            .eyes
            .iter()
            .zip([WidgetShape::Eye, WidgetShape::Eye, WidgetShape::Eyes])
            .chain(self.ctrls.eye_masters.iter().map(|m| (m, WidgetShape::Square { size: 1.0 })))
            .chain(self.ctrls.nose.iter().map(|n| (n, WidgetShape::Square { size: 1.0 })))
            .chain(self.ctrls.ears.iter().map(|e| (e, WidgetShape::Ear)))
            .chain(self.ctrls.jaw.iter().map(|j| (j, WidgetShape::Jaw)))
            .chain(self.ctrls.tongue.iter().map(|t| (t, WidgetShape::Jaw)));
        for (key, shape) in shapes {
            widgets.build(self.map.resolve(key)?, shape);
        }

        for tweak in &self.tweaks {
            let name = self.map.resolve(tweak)?;
            let (layers, size) = if tables::is_primary(tweak) {
                (self.primary_layers, 1.5)
            } else {
                (self.secondary_layers, 1.0)
            };
            if let Some(layers) = layers {
                pose.set_layers(name, layers)?;
            }
            widgets.build(name, WidgetShape::Face { size });
        }
        Ok(())
    }

    /// Deformation targets track and stretch to the next tweak; lid targets
    /// aim at the tail of the next lid pivot.
    fn wire_targets(&self, pose: &mut PoseMode<'_>) -> RigResult<()> {
        let track = |head_tail: f64| {
            [
                Constraint::new(ConstraintKind::damped_track(head_tail)),
                Constraint::new(ConstraintKind::stretch_to(head_tail)),
            ]
        };

        for target in self.targets.iter().filter(|t| !t.contains("lid")) {
            let tweak = match tables::def_special(target) {
                Some(special) => special.to_string(),
                None => tables::next_tweak(&target[TARGET_PREFIX.len()..]),
            };
            self.constrain_keys(pose, target, &tweak, track(0.0))?;
        }

        let mut lid_targets: Vec<String> = self.targets.iter().filter(|t| t.contains("lid")).cloned().collect();
        lid_targets.sort();
        let mut lid_pivots = self.mch.lids.clone();
        lid_pivots.sort();
        let (targets_left, targets_right) = symmetrical_split(&lid_targets);
        let (mut pivots_left, mut pivots_right) = symmetrical_split(&lid_pivots);
        for pivots in [&mut pivots_left, &mut pivots_right] {
            if pivots.len() > 1 {
                pivots.rotate_left(1);
            }
        }
        let rows = targets_left.iter().zip(&targets_right).zip(pivots_left.iter().zip(&pivots_right));
        for ((left, right), (pivot_left, pivot_right)) in rows {
            self.constrain_keys(pose, left, pivot_left, track(1.0))?;
            self.constrain_keys(pose, right, pivot_right, track(1.0))?;
        }
        Ok(())
    }

    fn wire_mch(&self, pose: &mut PoseMode<'_>) -> RigResult<()> {
        let damped = || [Constraint::new(ConstraintKind::damped_track(0.0))];
        let copy = |influence: f64| [Constraint::new(ConstraintKind::CopyTransforms).with_influence(influence)];

        for pivot in &self.mch.lids {
            self.constrain_keys(pose, pivot, pivot.trim_start_matches("MCH-"), damped())?;
        }
        for [tracker, follow] in &self.mch.eyes {
            self.constrain_keys(pose, tracker, tracker.trim_start_matches("MCH-"), damped())?;
            self.constrain_keys(
                pose,
                follow,
                tracker,
                [Constraint::new(ConstraintKind::copy_location(1.0))],
            )?;
        }
        self.constrain_keys(pose, &mch("eyes_parent"), &org("face"), copy(1.0))?;

        for (bone, influence) in tables::JAW_FAN {
            self.constrain_keys(pose, bone, "jaw_master", copy(*influence))?;
        }
        if self.mch.jaw.len() > 2 {
            for bone in &self.mch.jaw[1..self.mch.jaw.len() - 1] {
                self.constrain_keys(pose, bone, &mch("mouth_lock"), copy(1.0))?;
            }
        }

        let count = self.mch.tongue.len();
        for (i, bone) in self.mch.tongue.iter().enumerate() {
            let influence = (count - i) as f64 / (count + 1) as f64;
            self.constrain_keys(pose, bone, "tongue_master", copy(influence))?;
        }
        self.constrain_keys(pose, &mch("tongue_parent"), &mch("jaw_master"), copy(1.0))?;
        self.constrain_keys(pose, &mch("chin_parent"), &mch("jaw_master"), copy(1.0))?;
        Ok(())
    }

    fn wire_tweaks(&self, pose: &mut PoseMode<'_>) -> RigResult<()> {
        let copy_location = |influence: f64, invert: bool| {
            [Constraint::new(ConstraintKind::CopyLocation {
                use_offset: true,
                invert: [invert; 3],
                head_tail: 0.0,
            })
            .with_influence(influence)
            .with_spaces(Space::Local, Space::Local)]
        };

        for (owner, target, influence) in tables::COPY_LOCATION_L {
            self.constrain_keys(pose, owner, target, copy_location(*influence, false))?;
            self.constrain_keys(
                pose,
                &left_to_right(owner),
                &left_to_right(target),
                copy_location(*influence, false),
            )?;
        }

        let rotation_scale = || {
            [
                Constraint::new(ConstraintKind::CopyRotation { use_offset: true })
                    .with_spaces(Space::Local, Space::Local),
                Constraint::new(ConstraintKind::CopyScale { use_offset: true })
                    .with_spaces(Space::Local, Space::Local),
            ]
        };
        for (owner, target) in tables::COPY_ROTATION_SCALE_L {
            self.constrain_keys(pose, owner, target, rotation_scale())?;
            self.constrain_keys(pose, &left_to_right(owner), target, rotation_scale())?;
        }

        for (owner, target, influence) in tables::NOSE_INVERTED {
            self.constrain_keys(pose, owner, target, copy_location(*influence, true))?;
        }
        Ok(())
    }

    fn wire_org(&self, pose: &mut PoseMode<'_>) -> RigResult<()> {
        for key in &self.org {
            self.constrain_keys(
                pose,
                key,
                &mch_target(basename(key)),
                [Constraint::new(ConstraintKind::CopyTransforms).with_spaces(Space::World, Space::World)],
            )?;
        }
        Ok(())
    }

    /// Creates the follow slider on `ctrl` and drives constraint `index` of
    /// each owner with it.
    fn wire_follow(
        &mut self,
        pose: &mut PoseMode<'_>,
        ctrl: &str,
        property: &'static str,
        value: f64,
        description: &str,
        owners: &[String],
        index: usize,
    ) -> RigResult<()> {
        let path = add_slider(pose, self.map.resolve(ctrl)?, property, value, description)?;
        for owner in owners {
            let owner = self.name(owner)?;
            let constraint = pose.constraint_name(&owner, index)?;
            drive_constraint(pose, &owner, &constraint, DriverKind::Sum, &path, None)?;
        }
        self.follow.push((ctrl.to_string(), property));
        Ok(())
    }

    fn wire_properties(&mut self, pose: &mut PoseMode<'_>) -> RigResult<()> {
        if let Some(jaw) = self.ctrls.jaw.clone() {
            if self.mch.jaw.len() > 2 {
                let fan = self.mch.jaw[1..self.mch.jaw.len() - 1].to_vec();
                self.wire_follow(pose, &jaw, "Mouth Lock", 0.0, "Mouth bones don't move if jaw moves", &fan, 1)?;
            }
        }
        if let (Some(eyes), Some(parent)) = (self.ctrls.eyes.get(2).cloned(), self.mch.eyes_parent.clone()) {
            self.wire_follow(pose, &eyes, "Eyes Follow", 1.0, "Switch eyes follow to face", &[parent], 0)?;
        }
        if let (Some(tongue), Some(parent)) = (self.ctrls.tongue.clone(), self.mch.tongue_parent.clone()) {
            self.wire_follow(
                pose,
                &tongue,
                "Tongue Follow",
                1.0,
                "Switch tongue follow to jaw or face",
                &[parent],
                0,
            )?;
        }
        if let Some(parent) = self.mch.chin_parent.clone() {
            self.wire_follow(pose, "chin", "Chin Follow", 1.0, "Switch chin follow to jaw or face", &[parent], 0)?;
        }
        Ok(())
    }
}

impl Rig for Face {
    fn rig_type(&self) -> &str {
        RIG_TYPE
    }

    fn base_bone(&self) -> &str {
        &self.base
    }

    fn create_bones(&mut self, edit: &mut EditMode<'_>) -> RigResult<()> {
        for key in self.org_matching("lid.") {
            edit.set_parent(self.map.resolve(&key)?, None)?;
        }
        self.create_targets(edit)?;
        self.create_ctrls(edit)?;
        self.create_tweaks(edit)?;
        self.create_mch(edit)?;
        debug!(
            base = %self.base,
            originals = self.org.len(),
            tweaks = self.tweaks.len(),
            "face bones created"
        );
        Ok(())
    }

    fn parent_bones(&mut self, edit: &mut EditMode<'_>) -> RigResult<()> {
        let face = org("face");
        let generated = self
            .ctrls
            .all()
            .into_iter()
            .chain(self.tweaks.iter().cloned())
            .chain(self.mch.all());
        for key in generated {
            self.parent_if(edit, &key, &face)?;
        }

        self.parent_targets(edit)?;
        self.parent_mch_and_ctrls(edit)?;
        self.parent_tweaks(edit)?;

        for key in self.targets.iter().chain(self.org[1..].iter()) {
            if !self.has_parent(edit, key)? {
                self.parent_if(edit, key, &face)?;
            }
        }
        Ok(())
    }

    fn wire(&mut self, pose: &mut PoseMode<'_>, widgets: &mut WidgetLibrary) -> RigResult<()> {
        self.wire_widgets(pose, widgets)?;
        self.wire_targets(pose)?;
        self.wire_mch(pose)?;
        self.wire_tweaks(pose)?;
        self.wire_org(pose)?;
        self.wire_properties(pose)
    }

    fn ui(&self) -> UiFragment {
        let mut fragment = UiFragment::new(RIG_TYPE, &self.base);
        let resolve = |key: &str| self.map.resolve(key).map(str::to_string).unwrap_or_default();
        let controls: Vec<String> = self
            .ctrls
            .all()
            .iter()
            .chain(&self.tweaks)
            .map(|k| resolve(k))
            .collect();

        let mut section = UiSection::when_selected(&controls);
        for (ctrl, property) in &self.follow {
            let bone = resolve(ctrl);
            let label = format!("{} ({})", property, bone);
            section = section.with_item(UiItem::property(&bone, property, label));
        }
        fragment.push(section);
        fragment
    }
}

#[cfg(test)]
mod tests;
