//! Rig-type trait and the built-in rig types.
//!
//! A rig instance is constructed from one tagged bone of the meta-skeleton
//! and then driven through three mutation phases by the orchestrator:
//!
//! 1. [`Rig::create_bones`] duplicates original bones into controls,
//!    tweaks and mechanism bones (edit mode).
//! 2. [`Rig::parent_bones`] rewires parent pointers (edit mode).
//! 3. [`Rig::wire`] adds constraints, custom properties, drivers, pose
//!    settings and widgets (pose mode).
//!
//! Every instance finishes a phase before any instance starts the next one.

use std::fmt;

use gamerig_spec::{
    Constraint, CustomProperty, Driver, DriverKind, LayerMask, ParamError, Polynomial,
    PropertyPath, ResolvedParams,
};
use serde::{Deserialize, Serialize};

use crate::armature::{EditMode, PoseMode};
use crate::error::RigResult;
use crate::ui::UiFragment;
use crate::widgets::WidgetLibrary;

pub mod face;
pub mod limb;
pub mod tentacle;
pub mod torso;

/// Generation phase of a rig instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Construction,
    BoneCreation,
    Parenting,
    Wiring,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Construction => "construction",
            Phase::BoneCreation => "bone creation",
            Phase::Parenting => "parenting",
            Phase::Wiring => "constraint wiring",
        };
        f.write_str(name)
    }
}

/// A rig instance governing one tagged bone.
pub trait Rig: fmt::Debug {
    /// Type tag this instance was built for.
    fn rig_type(&self) -> &str;

    /// Name of the tagged bone.
    fn base_bone(&self) -> &str;

    fn create_bones(&mut self, edit: &mut EditMode<'_>) -> RigResult<()>;

    fn parent_bones(&mut self, edit: &mut EditMode<'_>) -> RigResult<()>;

    fn wire(&mut self, pose: &mut PoseMode<'_>, widgets: &mut WidgetLibrary) -> RigResult<()>;

    /// Panel contribution, valid after [`Rig::wire`].
    fn ui(&self) -> UiFragment;
}

// =============================================================================
// Shared helpers
// =============================================================================

/// Adds a `[0, 1]` slider property and returns its path.
pub(crate) fn add_slider(
    pose: &mut PoseMode<'_>,
    bone: &str,
    name: &str,
    value: f64,
    description: &str,
) -> RigResult<PropertyPath> {
    pose.set_property(
        bone,
        name,
        CustomProperty::unit(value).with_description(description),
    )?;
    Ok(PropertyPath::new(bone, name))
}

/// Drives the influence of `owner`'s constraint `constraint` from `source`.
pub(crate) fn drive_constraint(
    pose: &mut PoseMode<'_>,
    owner: &str,
    constraint: &str,
    kind: DriverKind,
    source: &PropertyPath,
    modifier: Option<Polynomial>,
) -> RigResult<()> {
    let mut driver = Driver::influence(owner, constraint, kind, source.clone());
    if let Some(modifier) = modifier {
        driver = driver.with_modifier(modifier);
    }
    pose.add_driver(driver)
}

/// Adds a constraint targeting `target` and returns its final name.
pub(crate) fn constrain(
    pose: &mut PoseMode<'_>,
    owner: &str,
    target: &str,
    constraint: Constraint,
) -> RigResult<String> {
    pose.add_constraint(owner, constraint.with_subtarget(target))
}

/// Layer mask gated by a boolean "extra layers" parameter.
pub(crate) fn optional_layers(
    params: &ResolvedParams,
    flag: &str,
    layers: &str,
) -> Result<Option<LayerMask>, ParamError> {
    if params.bool(flag)? {
        Ok(Some(params.layers(layers)?))
    } else {
        Ok(None)
    }
}
