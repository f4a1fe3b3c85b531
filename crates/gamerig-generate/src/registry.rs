//! Rig-type registry: maps type tags to their factories.

use std::fmt;
use std::sync::OnceLock;

use gamerig_spec::{Metarig, ParamDecl, ResolvedParams};

use crate::armature::Armature;
use crate::error::RigResult;
use crate::rigs::{face, limb, tentacle, torso, Rig};
use crate::snap::OperatorDecl;

/// Builds a rig instance for one tagged bone.
pub type ConstructFn = fn(&Armature, &str, &ResolvedParams) -> RigResult<Box<dyn Rig>>;

/// One registered rig type.
#[derive(Clone, Copy)]
pub struct RigTypeEntry {
    pub name: &'static str,
    /// Parameter declarations of the type.
    pub parameters: fn() -> Vec<ParamDecl>,
    pub construct: ConstructFn,
    /// Snap operators the type contributes to the UI.
    pub operators: fn() -> Vec<OperatorDecl>,
    /// Minimal meta-skeleton using the type.
    pub sample: fn() -> Metarig,
}

impl fmt::Debug for RigTypeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RigTypeEntry").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Registry of rig types, looked up by tag.
#[derive(Debug, Default)]
pub struct RigRegistry {
    entries: Vec<RigTypeEntry>,
}

impl RigRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in rig types.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(RigTypeEntry {
            name: limb::LimbKind::Arm.rig_type(),
            parameters: limb::parameters,
            construct: limb::arm::construct,
            operators: limb::arm::operators,
            sample: limb::arm::sample,
        });
        registry.register(RigTypeEntry {
            name: limb::LimbKind::Leg.rig_type(),
            parameters: limb::parameters,
            construct: limb::leg::construct,
            operators: limb::leg::operators,
            sample: limb::leg::sample,
        });
        registry.register(RigTypeEntry {
            name: tentacle::RIG_TYPE,
            parameters: tentacle::parameters,
            construct: tentacle::construct,
            operators: tentacle::operators,
            sample: tentacle::sample,
        });
        registry.register(RigTypeEntry {
            name: torso::RIG_TYPE,
            parameters: torso::parameters,
            construct: torso::construct,
            operators: torso::operators,
            sample: torso::sample,
        });
        registry.register(RigTypeEntry {
            name: face::RIG_TYPE,
            parameters: face::parameters,
            construct: face::construct,
            operators: face::operators,
            sample: face::sample,
        });
        registry
    }

    /// The process-wide built-in registry.
    pub fn global() -> &'static RigRegistry {
        static REGISTRY: OnceLock<RigRegistry> = OnceLock::new();
        REGISTRY.get_or_init(RigRegistry::builtin)
    }

    /// Registers a rig type; a later entry with the same name replaces the earlier one.
    pub fn register(&mut self, entry: RigTypeEntry) {
        self.entries.retain(|e| e.name != entry.name);
        self.entries.push(entry);
    }

    pub fn get(&self, name: &str) -> Option<&RigTypeEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Registered type tags in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.name).collect()
    }

    pub fn entries(&self) -> &[RigTypeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
