//! Generation orchestrator.
//!
//! Expands a meta-skeleton into a generated rig:
//!
//! 1. validate the meta-skeleton,
//! 2. copy its bones into a fresh armature and rename them into the
//!    `ORG-` class,
//! 3. construct one rig instance per tagged bone, root-most first,
//! 4. drive every instance through bone creation, then parenting, then
//!    wiring,
//! 5. clean up: deform flags, driver remapping, reserved layers, widgets,
//!    visible layers,
//! 6. assemble the UI, selection sets and bone groups.
//!
//! A failure after construction aborts the run without rolling back the
//! bones created so far. The error carries the partial armature with its
//! pose position restored; regenerating is the recovery path.

use std::time::Instant;

use gamerig_spec::hash::canonical_hash;
use gamerig_spec::naming::{is_jig, is_mch, is_org, org};
use gamerig_spec::validation::validate_metarig;
use gamerig_spec::{
    Bone, ColorGroup, ErrorCategory, LayerMask, Metarig, ResolvedParams, RigParameters, SpecError,
    MCH_LAYER, ORG_LAYER,
};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::armature::{Armature, PosePosition};
use crate::error::{GenerateError, RigError};
use crate::groups::{assign_bone_groups, selection_sets, SelectionSet};
use crate::registry::RigRegistry;
use crate::rigs::{Phase, Rig};
use crate::snap::OperatorRegistry;
use crate::ui::{layer_rows, RigUi};
use crate::widgets::{Widget, WidgetLibrary};

/// Armature property holding the rig identifier.
pub const RIG_ID_PROPERTY: &str = "gamerig_id";

/// Length of generated rig identifiers.
pub const RIG_ID_LEN: usize = 10;

const ID_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

// =============================================================================
// Configuration
// =============================================================================

/// How missing rig types and rig configuration errors are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Log, record in the report and skip the bone.
    #[default]
    Lenient,
    /// Abort the run.
    Strict,
}

fn default_true() -> bool {
    true
}

/// Generation options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerateConfig {
    #[serde(default)]
    pub policy: Policy,
    /// Seed for the rig identifier; random when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default = "default_true")]
    pub selection_sets: bool,
    #[serde(default = "default_true")]
    pub bone_groups: bool,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            policy: Policy::Lenient,
            seed: None,
            selection_sets: true,
            bone_groups: true,
        }
    }
}

impl GenerateConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    pub fn strict(self) -> Self {
        self.with_policy(Policy::Strict)
    }
}

// =============================================================================
// Output
// =============================================================================

/// A rig instance that took part in generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceSummary {
    pub bone: String,
    pub rig_type: String,
}

/// A tagged bone that was skipped under the lenient policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRig {
    pub bone: String,
    pub rig_type: String,
    pub code: String,
    pub reason: String,
}

/// Summary of a generation run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GenerationReport {
    pub rig_name: String,
    pub rig_id: String,
    pub instances: Vec<InstanceSummary>,
    pub bone_count: usize,
    pub skipped: Vec<SkippedRig>,
    /// Validation warnings on the input meta-skeleton.
    pub warnings: Vec<String>,
}

/// Everything one generation run produces.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedRig {
    pub armature: Armature,
    pub rig_id: String,
    pub ui: RigUi,
    /// Rendered control-panel script, named [`RigUi::script_name`].
    pub script: String,
    pub selection_sets: Vec<SelectionSet>,
    pub bone_groups: Vec<ColorGroup>,
    pub widgets: Vec<Widget>,
    pub report: GenerationReport,
}

/// Identifier-free view hashed by [`GeneratedRig::fingerprint`].
#[derive(Serialize)]
struct FingerprintView<'a> {
    armature: Armature,
    fragments: &'a [crate::ui::UiFragment],
    operators: Vec<&'static str>,
    selection_sets: &'a [SelectionSet],
    bone_groups: &'a [ColorGroup],
    widgets: &'a [Widget],
}

impl GeneratedRig {
    /// Snap operators declared by the generated UI.
    pub fn operators(&self) -> OperatorRegistry {
        OperatorRegistry::from_ui(&self.ui)
    }

    /// Hash of the generated rig with the rig identifier left out.
    pub fn fingerprint(&self) -> Result<String, SpecError> {
        let mut armature = self.armature.clone();
        armature.properties.remove(RIG_ID_PROPERTY);
        canonical_hash(&FingerprintView {
            armature,
            fragments: &self.ui.fragments,
            operators: self.ui.operators.iter().map(|op| op.name).collect(),
            selection_sets: &self.selection_sets,
            bone_groups: &self.bone_groups,
            widgets: &self.widgets,
        })
    }
}

// =============================================================================
// Generator
// =============================================================================

/// Draws a rig identifier of [`RIG_ID_LEN`] lowercase alphanumerics.
pub fn random_id(seed: Option<u64>) -> String {
    fn draw<R: Rng>(rng: &mut R) -> String {
        (0..RIG_ID_LEN)
            .map(|_| ID_CHARSET[rng.gen_range(0..ID_CHARSET.len())] as char)
            .collect()
    }
    match seed {
        Some(seed) => draw(&mut Pcg32::seed_from_u64(seed)),
        None => draw(&mut rand::thread_rng()),
    }
}

struct Instance {
    rig: Box<dyn Rig>,
}

impl Instance {
    fn fail(&self, phase: Phase, source: RigError, armature: &Armature) -> GenerateError {
        mid_generation(phase, self.rig.base_bone(), self.rig.rig_type(), source, Some(armature))
    }
}

fn mid_generation(
    phase: Phase,
    bone: &str,
    rig_type: &str,
    source: RigError,
    armature: Option<&Armature>,
) -> GenerateError {
    GenerateError::MidGeneration {
        phase,
        bone: bone.to_string(),
        rig_type: rig_type.to_string(),
        source,
        partial: armature.map(|a| Box::new(a.clone())),
    }
}

/// Expands meta-skeletons into rigs using a rig-type registry.
#[derive(Debug, Clone)]
pub struct Generator<'r> {
    config: GenerateConfig,
    registry: &'r RigRegistry,
}

impl Generator<'static> {
    /// Generator over the built-in rig types.
    pub fn new(config: GenerateConfig) -> Self {
        Self::with_registry(config, RigRegistry::global())
    }
}

impl<'r> Generator<'r> {
    pub fn with_registry(config: GenerateConfig, registry: &'r RigRegistry) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &GenerateConfig {
        &self.config
    }

    /// Generates a rig from `metarig`.
    ///
    /// When `previous` is a rig generated earlier from the same meta-skeleton
    /// its identifier is reused, so regenerating keeps operator and script
    /// names stable.
    pub fn generate(
        &self,
        metarig: &Metarig,
        previous: Option<&Armature>,
    ) -> Result<GeneratedRig, GenerateError> {
        let start = Instant::now();
        let warnings = validate_metarig(metarig).into_result().map_err(|errors| {
            GenerateError::InvalidMetarig {
                name: metarig.name.clone(),
                errors,
            }
        })?;
        for warning in &warnings {
            warn!(metarig = %metarig.name, "{}", warning);
        }

        let rig_name = metarig.rig_name.clone().unwrap_or_else(|| "rig".to_string());
        let rig_id = previous
            .and_then(|p| p.properties.get(RIG_ID_PROPERTY).cloned())
            .unwrap_or_else(|| random_id(self.config.seed));
        info!(rig = %rig_name, rig_id = %rig_id, bones = metarig.bones.len(), "generating rig");

        let mut armature = Armature::new(rig_name.as_str());
        armature.properties.insert(RIG_ID_PROPERTY.to_string(), rig_id.clone());
        let originals = copy_metarig(&mut armature, metarig)?;

        let mut report = GenerationReport {
            rig_name: rig_name.clone(),
            rig_id: rig_id.clone(),
            warnings: warnings.iter().map(ToString::to_string).collect(),
            ..GenerationReport::default()
        };

        let mut instances = self.construct(&armature, metarig, &originals, &mut report)?;

        let mut widgets = WidgetLibrary::new(rig_name.as_str());
        let rest_backup = armature.pose_position;
        armature.pose_position = PosePosition::Rest;
        if let Err(mut err) = run_phases(&mut armature, &mut instances, &mut widgets) {
            if let GenerateError::MidGeneration {
                partial: Some(partial),
                ..
            } = &mut err
            {
                partial.pose_position = rest_backup;
            }
            error!(rig = %rig_name, error = %err, "rig generation failed");
            return Err(err);
        }
        armature.pose_position = rest_backup;

        cleanup(&mut armature, metarig, &originals, &widgets)
            .map_err(|source| mid_generation(Phase::Wiring, &rig_name, "", source, Some(&armature)))?;

        let mut ui = RigUi::new(&rig_id);
        for (instance, entry) in instances
            .iter()
            .filter_map(|i| self.registry.get(i.rig.rig_type()).map(|e| (i, e)))
        {
            for decl in (entry.operators)() {
                ui.add_operator(decl);
            }
            ui.fragments.push(instance.rig.ui());
        }
        ui.layer_rows = layer_rows(&armature.visible_layers, &metarig.layers);
        let script = ui.render();

        let selection_sets = if self.config.selection_sets {
            selection_sets(&armature, &metarig.layers)
        } else {
            Vec::new()
        };
        let bone_groups = if self.config.bone_groups {
            let assigned = assign_bone_groups(&mut armature.pose(), &metarig.layers, &metarig.colors);
            assigned.map_err(|source| mid_generation(Phase::Wiring, &rig_name, "", source, Some(&armature)))?
        } else {
            Vec::new()
        };

        remove_jig_bones(&mut armature)
            .map_err(|source| mid_generation(Phase::Wiring, &rig_name, "", source, Some(&armature)))?;
        armature.pose_position = PosePosition::Pose;
        armature.transform = metarig.transform.clone();

        report.instances = instances
            .iter()
            .map(|i| InstanceSummary {
                bone: i.rig.base_bone().to_string(),
                rig_type: i.rig.rig_type().to_string(),
            })
            .collect();
        report.bone_count = armature.len();
        info!(
            rig = %rig_name,
            rig_id = %rig_id,
            rigs = report.instances.len(),
            bones = report.bone_count,
            skipped = report.skipped.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "rig generated"
        );

        Ok(GeneratedRig {
            armature,
            rig_id,
            ui,
            script,
            selection_sets,
            bone_groups,
            widgets: widgets.into_widgets(),
            report,
        })
    }

    /// Builds one rig instance per tagged bone in traversal order.
    fn construct(
        &self,
        armature: &Armature,
        metarig: &Metarig,
        originals: &[(String, String)],
        report: &mut GenerationReport,
    ) -> Result<Vec<Instance>, GenerateError> {
        let mut order: Vec<&(String, String)> = originals.iter().collect();
        order.sort_by(|a, b| a.1.cmp(&b.1));
        order.sort_by_key(|(_, name)| armature.depth(name));

        let mut instances = Vec::new();
        for (source, name) in order {
            let Some(tag) = metarig.bone(source).and_then(Bone::rig_type_tag) else {
                continue;
            };
            let Some(entry) = self.registry.get(&tag) else {
                let err = GenerateError::UnresolvedRigType {
                    bone: name.clone(),
                    rig_type: tag.clone(),
                };
                self.tolerate(err, report)?;
                continue;
            };

            let stored = metarig
                .bone(source)
                .map(|b| b.parameters.clone())
                .unwrap_or_else(RigParameters::new);
            let built = ResolvedParams::resolve(&(entry.parameters)(), &stored)
                .map_err(RigError::from)
                .and_then(|params| (entry.construct)(armature, name, &params));
            match built {
                Ok(rig) => {
                    debug!(bone = %name, rig_type = %tag, "rig constructed");
                    instances.push(Instance { rig });
                }
                Err(source) if source.is_configuration() => {
                    let err = GenerateError::Configuration {
                        bone: name.clone(),
                        rig_type: tag.clone(),
                        source,
                    };
                    self.tolerate(err, report)?;
                }
                Err(source) => {
                    return Err(mid_generation(Phase::Construction, name, &tag, source, Some(armature)))
                }
            }
        }
        Ok(instances)
    }

    /// Records `err` under the lenient policy, returns it under the strict one.
    fn tolerate(&self, err: GenerateError, report: &mut GenerationReport) -> Result<(), GenerateError> {
        if self.config.policy == Policy::Strict {
            return Err(err);
        }
        warn!("{}; skipping", err);
        let (bone, rig_type) = match &err {
            GenerateError::UnresolvedRigType { bone, rig_type }
            | GenerateError::Configuration { bone, rig_type, .. } => (bone.clone(), rig_type.clone()),
            _ => (String::new(), String::new()),
        };
        report.skipped.push(SkippedRig {
            bone,
            rig_type,
            code: err.code().to_string(),
            reason: err.to_string(),
        });
        Ok(())
    }
}

/// Copies the meta-skeleton into `armature` and renames every bone into the
/// `ORG-` class. Returns (input name, generated name) pairs in input order.
fn copy_metarig(armature: &mut Armature, metarig: &Metarig) -> Result<Vec<(String, String)>, GenerateError> {
    let invalid = |err: RigError| mid_generation(Phase::Construction, &metarig.name, "", err, None);

    let mut edit = armature.edit();
    for bone in &metarig.bones {
        let mut copy = bone.clone();
        copy.rig_type = None;
        copy.parameters = RigParameters::new();
        edit.add_bone(copy);
    }
    for driver in &metarig.drivers {
        let mut driver = driver.clone();
        for var in &mut driver.variables {
            var.needs_remap = true;
        }
        edit.add_driver(driver);
    }

    let mut originals = Vec::with_capacity(metarig.bones.len());
    for bone in &metarig.bones {
        let renamed = edit.rename_bone(&bone.name, &org(&bone.name)).map_err(invalid)?;
        originals.push((bone.name.clone(), renamed));
    }
    Ok(originals)
}

/// Runs every phase for every instance; each phase finishes for all
/// instances before the next begins.
fn run_phases(
    armature: &mut Armature,
    instances: &mut [Instance],
    widgets: &mut WidgetLibrary,
) -> Result<(), GenerateError> {
    {
        let mut edit = armature.edit();
        debug!(rigs = instances.len(), "{}", Phase::BoneCreation);
        for instance in instances.iter_mut() {
            if let Err(err) = instance.rig.create_bones(&mut edit) {
                return Err(instance.fail(Phase::BoneCreation, err, &edit));
            }
        }
        debug!(rigs = instances.len(), "{}", Phase::Parenting);
        for instance in instances.iter_mut() {
            if let Err(err) = instance.rig.parent_bones(&mut edit) {
                return Err(instance.fail(Phase::Parenting, err, &edit));
            }
        }
    }

    let mut pose = armature.pose();
    debug!(rigs = instances.len(), "{}", Phase::Wiring);
    for instance in instances.iter_mut() {
        if let Err(err) = instance.rig.wire(&mut pose, widgets) {
            return Err(instance.fail(Phase::Wiring, err, &pose));
        }
    }
    Ok(())
}

/// Post-generation fixups over the whole armature.
fn cleanup(
    armature: &mut Armature,
    metarig: &Metarig,
    originals: &[(String, String)],
    widgets: &WidgetLibrary,
) -> Result<(), RigError> {
    let input: Vec<&str> = metarig.bones.iter().map(|b| b.name.as_str()).collect();
    let names = armature.bone_names();

    let remapped: Vec<_> = armature
        .drivers()
        .iter()
        .map(|driver| {
            let mut driver = driver.clone();
            for var in driver.variables.iter_mut().filter(|v| v.needs_remap) {
                let owns = armature
                    .bone(&var.source.bone)
                    .is_some_and(|b| b.properties.contains_key(&var.source.property));
                if !owns {
                    var.source.bone = org(&var.source.bone);
                }
                var.needs_remap = false;
            }
            driver
        })
        .collect();

    let mut pose = armature.pose();
    *pose.drivers_mut() = remapped;

    for name in &names {
        if !(is_org(name) || input.contains(&name.as_str())) {
            pose.set_deform(name, false)?;
        }
    }
    for (_, name) in originals {
        pose.set_layers(name, LayerMask::single(ORG_LAYER))?;
    }
    for name in names.iter().filter(|n| is_mch(n)) {
        pose.set_layers(name, LayerMask::single(MCH_LAYER))?;
    }
    for widget in widgets.widgets() {
        if pose.contains(&widget.bone) {
            pose.set_custom_shape(&widget.bone, &widget.name)?;
        }
    }

    let mut visible = pose
        .bones()
        .iter()
        .fold(LayerMask::empty(), |acc, b| acc.union(&b.layers));
    visible.set(ORG_LAYER, false);
    visible.set(MCH_LAYER, false);
    drop(pose);
    armature.visible_layers = visible;
    Ok(())
}

fn remove_jig_bones(armature: &mut Armature) -> Result<(), RigError> {
    let jigs: Vec<String> = armature.bone_names().into_iter().filter(|n| is_jig(n)).collect();
    let mut edit = armature.edit();
    for name in jigs {
        edit.remove_bone(&name)?;
    }
    Ok(())
}
