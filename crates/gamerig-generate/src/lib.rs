//! GameRig Generator
//!
//! This crate expands an annotated meta-skeleton ([`gamerig_spec::Metarig`])
//! into a complete control rig: controls, mechanism bones, constraints,
//! drivers, widgets, layers and a control-panel description.
//!
//! # Overview
//!
//! Bones of the meta-skeleton tagged with a rig type each become one rig
//! instance. The built-in rig types are:
//!
//! - **limbs.arm** / **limbs.leg** - three-segment limbs with FK/IK switching
//! - **tentacle** - arbitrary-length chains with segmented IK and a physics slider
//! - **torso** - a spine with hips, chest, neck and head controls and follow sliders
//! - **face** - a full face with eye, jaw, tongue and lip mechanisms
//!
//! The [`Generator`] copies the meta-skeleton into a new [`Armature`],
//! renames the copied bones into the `ORG-` class and drives every instance
//! through bone creation, parenting and wiring.
//!
//! # Determinism
//!
//! Given the same meta-skeleton, the same configuration and the same seed,
//! generation produces the same armature and UI. Only the rig identifier is
//! random when no seed is configured; [`GeneratedRig::fingerprint`] ignores it.
//!
//! # Example
//!
//! ```
//! use gamerig_generate::{GenerateConfig, Generator};
//! use gamerig_generate::rigs::tentacle;
//!
//! let metarig = tentacle::sample();
//! let rig = Generator::new(GenerateConfig::default().with_seed(7))
//!     .generate(&metarig, None)
//!     .unwrap();
//!
//! assert!(rig.armature.contains("ORG-Bone"));
//! assert!(rig.armature.contains("Bone_fk_master"));
//! assert_eq!(rig.ui.script_name, format!("gamerig_ui_{}", rig.rig_id));
//! ```
//!
//! # Crate Structure
//!
//! - [`generate`] - the orchestrator and its configuration
//! - [`registry`] - rig-type registry
//! - [`rigs`] - the rig trait and built-in rig types
//! - [`armature`] - the armature under construction, with edit and pose modes
//! - [`name_map`] - per-instance logical bone keys
//! - [`ui`] - control-panel description and rendering
//! - [`snap`] - FK/IK snap operators
//! - [`widgets`] - control widget shapes
//! - [`groups`] - selection sets and bone colour groups

pub mod armature;
pub mod error;
pub mod generate;
pub mod groups;
pub mod name_map;
pub mod registry;
pub mod rigs;
pub mod snap;
pub mod ui;
pub mod widgets;

pub use armature::{Armature, EditMode, PoseMode, PosePosition};
pub use error::{GenerateError, RigError, RigResult};
pub use generate::{GenerateConfig, GeneratedRig, GenerationReport, Generator, Policy};
pub use name_map::BoneNameMap;
pub use registry::{RigRegistry, RigTypeEntry};
pub use rigs::{Phase, Rig};
pub use ui::RigUi;
