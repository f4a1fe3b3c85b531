//! GameRig Meta-Skeleton Library
//!
//! This crate provides the data model shared by the rig generator and its
//! front ends: meta-skeletons, bones, constraints, drivers, layer metadata,
//! rig-type parameter schemas, bone naming rules, validation, and hashing.
//!
//! # Overview
//!
//! A meta-skeleton ([`Metarig`]) is a small bone hierarchy where some bones
//! carry a `rig_type` tag and a parameter record. The generator in
//! `gamerig-generate` expands it into a full control rig; everything it
//! reads and writes is described by the types in this crate.
//!
//! # Example
//!
//! ```
//! use gamerig_spec::{Bone, Metarig, RigParameters};
//! use gamerig_spec::validation::validate_metarig;
//! use gamerig_spec::hash::metarig_hash;
//!
//! let metarig = Metarig::new("metarig")
//!     .with_bone(
//!         Bone::new("Bone", [0.0, 0.0, 0.0], [0.0, 0.0, 0.5])
//!             .with_rig_type("tentacle")
//!             .with_parameters(RigParameters::new().with("chain_length", 2i64)),
//!     )
//!     .with_bone(
//!         Bone::new("Bone.001", [0.0, 0.0, 0.5], [0.0, 0.0, 1.0])
//!             .with_parent("Bone")
//!             .with_connect(true),
//!     );
//!
//! assert!(validate_metarig(&metarig).is_ok());
//! assert_eq!(metarig_hash(&metarig).unwrap().len(), 64);
//! ```
//!
//! # Modules
//!
//! - [`naming`]: bone name classes, numbered variants, laterality
//! - [`bone`]: bones, pose settings, custom properties
//! - [`constraint`]: constraint kinds and stack weighting
//! - [`driver`]: drivers and property paths
//! - [`layers`]: layer masks, layer metadata, colour groups
//! - [`params`]: parameter declarations and resolution
//! - [`metarig`]: the meta-skeleton container
//! - [`validation`]: structural checks
//! - [`hash`]: canonical hashing
//! - [`math`]: vector helpers

pub mod bone;
pub mod constraint;
pub mod driver;
pub mod error;
pub mod hash;
pub mod layers;
pub mod math;
pub mod metarig;
pub mod naming;
pub mod params;
pub mod validation;

pub use bone::{Bone, CustomProperty, PoseSettings, RotationMode};
pub use constraint::{effective_weights, AngleRange, Constraint, ConstraintKind, Space};
pub use driver::{Driver, DriverKind, DriverTarget, DriverVariable, Polynomial, PropertyPath};
pub use error::{
    ErrorCategory, ErrorCode, SpecError, ValidationError, ValidationResult, ValidationWarning,
    WarningCode,
};
pub use layers::{ColorGroup, LayerInfo, LayerMask, LAYER_COUNT, MCH_LAYER, ORG_LAYER};
pub use math::Vec3;
pub use metarig::{Metarig, ObjectTransform};
pub use params::{ParamDecl, ParamError, ParamKind, ParamValue, ResolvedParams, RigParameters};
