//! Pose-bone constraint types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// =============================================================================
// Spaces and ranges
// =============================================================================

/// Transform space a constraint reads its target in or writes its owner in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Space {
    #[default]
    World,
    Pose,
    Local,
    LocalWithParent,
}

impl Space {
    pub fn as_str(&self) -> &'static str {
        match self {
            Space::World => "WORLD",
            Space::Pose => "POSE",
            Space::Local => "LOCAL",
            Space::LocalWithParent => "LOCAL_WITH_PARENT",
        }
    }
}

/// Closed angle range in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AngleRange {
    pub min: f64,
    pub max: f64,
}

impl AngleRange {
    /// Range that pins the axis at zero.
    pub const LOCKED: AngleRange = AngleRange { min: 0.0, max: 0.0 };
}

// =============================================================================
// Constraint kinds
// =============================================================================

/// Typed constraint payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum ConstraintKind {
    /// Replaces the owner's whole transform with the target's.
    CopyTransforms,
    CopyLocation {
        #[serde(default)]
        use_offset: bool,
        /// Per-axis inversion (x, y, z).
        #[serde(default)]
        invert: [bool; 3],
        /// Point along the target bone, 0 = head, 1 = tail.
        #[serde(default)]
        head_tail: f64,
    },
    CopyRotation {
        #[serde(default)]
        use_offset: bool,
    },
    CopyScale {
        #[serde(default)]
        use_offset: bool,
    },
    DampedTrack {
        #[serde(default)]
        head_tail: f64,
    },
    StretchTo {
        #[serde(default)]
        head_tail: f64,
    },
    /// Inverse kinematics solved over `chain_count` bones ending at the owner.
    Ik {
        chain_count: u32,
        #[serde(default)]
        use_stretch: bool,
    },
    LimitScale {
        #[serde(default)]
        use_min_y: bool,
        #[serde(default)]
        min_y: f64,
        #[serde(default)]
        use_max_y: bool,
        #[serde(default)]
        max_y: f64,
    },
    LimitRotation {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        x: Option<AngleRange>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        y: Option<AngleRange>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        z: Option<AngleRange>,
    },
    MaintainVolume,
    /// Host constraint the generator carries but never interprets
    /// (physics, child-of, custom solvers).
    Opaque {
        host_type: String,
        #[serde(default)]
        settings: BTreeMap<String, serde_json::Value>,
    },
}

impl ConstraintKind {
    /// Default display name of a new constraint of this kind.
    pub fn display_name(&self) -> &str {
        match self {
            ConstraintKind::CopyTransforms => "Copy Transforms",
            ConstraintKind::CopyLocation { .. } => "Copy Location",
            ConstraintKind::CopyRotation { .. } => "Copy Rotation",
            ConstraintKind::CopyScale { .. } => "Copy Scale",
            ConstraintKind::DampedTrack { .. } => "Damped Track",
            ConstraintKind::StretchTo { .. } => "Stretch To",
            ConstraintKind::Ik { .. } => "IK",
            ConstraintKind::LimitScale { .. } => "Limit Scale",
            ConstraintKind::LimitRotation { .. } => "Limit Rotation",
            ConstraintKind::MaintainVolume => "Maintain Volume",
            ConstraintKind::Opaque { host_type, .. } => host_type,
        }
    }

    /// Whether the constraint overwrites the full owner transform.
    pub fn replaces_transform(&self) -> bool {
        matches!(self, ConstraintKind::CopyTransforms)
    }

    pub fn copy_location(head_tail: f64) -> Self {
        ConstraintKind::CopyLocation {
            use_offset: false,
            invert: [false; 3],
            head_tail,
        }
    }

    pub fn damped_track(head_tail: f64) -> Self {
        ConstraintKind::DampedTrack { head_tail }
    }

    pub fn stretch_to(head_tail: f64) -> Self {
        ConstraintKind::StretchTo { head_tail }
    }

    pub fn ik(chain_count: u32, use_stretch: bool) -> Self {
        ConstraintKind::Ik {
            chain_count,
            use_stretch,
        }
    }

    /// Rotation pinned to zero on all three axes.
    pub fn locked_rotation() -> Self {
        ConstraintKind::LimitRotation {
            x: Some(AngleRange::LOCKED),
            y: Some(AngleRange::LOCKED),
            z: Some(AngleRange::LOCKED),
        }
    }
}

// =============================================================================
// Constraint
// =============================================================================

fn default_influence() -> f64 {
    1.0
}

/// A constraint attached to a pose bone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Constraint {
    /// Name, unique among the owner's constraints.
    pub name: String,
    pub kind: ConstraintKind,
    /// Target bone in the same armature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtarget: Option<String>,
    #[serde(default = "default_influence")]
    pub influence: f64,
    #[serde(default)]
    pub target_space: Space,
    #[serde(default)]
    pub owner_space: Space,
}

impl Constraint {
    /// New constraint named after its kind, full influence, world spaces.
    pub fn new(kind: ConstraintKind) -> Self {
        Self {
            name: kind.display_name().to_string(),
            kind,
            subtarget: None,
            influence: 1.0,
            target_space: Space::World,
            owner_space: Space::World,
        }
    }

    pub fn with_subtarget(mut self, subtarget: impl Into<String>) -> Self {
        self.subtarget = Some(subtarget.into());
        self
    }

    pub fn with_influence(mut self, influence: f64) -> Self {
        self.influence = influence;
        self
    }

    pub fn with_spaces(mut self, target_space: Space, owner_space: Space) -> Self {
        self.target_space = target_space;
        self.owner_space = owner_space;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Actual contribution of each constraint in an ordered stack.
///
/// A transform-replacing constraint at position `i` with influence `infl_i`
/// is attenuated by every transform-replacing constraint evaluated after it:
/// `w_i = infl_i * prod_{j > i} (1 - infl_j)`. Other constraints get weight 0
/// and do not attenuate.
pub fn effective_weights(stack: &[(&ConstraintKind, f64)]) -> Vec<f64> {
    let mut weights = vec![0.0; stack.len()];
    let mut remaining = 1.0;
    for (i, (kind, influence)) in stack.iter().enumerate().rev() {
        if kind.replaces_transform() {
            let influence = influence.clamp(0.0, 1.0);
            weights[i] = influence * remaining;
            remaining *= 1.0 - influence;
        }
    }
    weights
}
