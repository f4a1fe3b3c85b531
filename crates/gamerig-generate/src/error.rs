//! Error types for rig generation.

use gamerig_spec::{ErrorCategory, ParamError, ValidationError};
use thiserror::Error;

use crate::armature::Armature;
use crate::rigs::Phase;

/// Result type for operations inside a rig instance.
pub type RigResult<T> = Result<T, RigError>;

/// Errors raised by armature edits and rig-type modules.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RigError {
    /// A rule referenced a logical key its rig never registered.
    #[error("unknown bone key '{key}'")]
    UnknownBoneKey { key: String },

    /// A logical key was registered twice.
    #[error("bone key '{key}' is already registered")]
    DuplicateKey { key: String },

    /// The armature has no bone with this name.
    #[error("bone '{name}' does not exist")]
    MissingBone { name: String },

    /// Reparenting would make a bone its own ancestor.
    #[error("parenting '{child}' under '{parent}' would form a cycle")]
    ParentCycle { child: String, parent: String },

    /// Structurally invalid rig configuration.
    #[error("{message}")]
    Configuration { message: String },

    /// A parameter did not match its declaration.
    #[error(transparent)]
    Parameter(#[from] ParamError),
}

impl RigError {
    pub fn unknown_key(key: impl Into<String>) -> Self {
        Self::UnknownBoneKey { key: key.into() }
    }

    pub fn missing_bone(name: impl Into<String>) -> Self {
        Self::MissingBone { name: name.into() }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Whether the error is a configuration problem rather than a contract violation.
    pub fn is_configuration(&self) -> bool {
        matches!(self, RigError::Configuration { .. } | RigError::Parameter(_))
    }
}

impl ErrorCategory for RigError {
    fn code(&self) -> &'static str {
        match self {
            RigError::UnknownBoneKey { .. } => "GAMERIG_101",
            RigError::DuplicateKey { .. } => "GAMERIG_102",
            RigError::MissingBone { .. } => "GAMERIG_103",
            RigError::ParentCycle { .. } => "GAMERIG_104",
            RigError::Configuration { .. } => "GAMERIG_105",
            RigError::Parameter(_) => "GAMERIG_106",
        }
    }

    fn category(&self) -> &'static str {
        "rig"
    }
}

/// Errors surfaced by [`crate::generate::Generator`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerateError {
    /// The meta-skeleton failed structural validation.
    #[error("metarig '{name}' failed validation with {} error(s)", errors.len())]
    InvalidMetarig {
        name: String,
        errors: Vec<ValidationError>,
    },

    /// A bone is tagged with a rig type nobody registered.
    #[error("bone '{bone}': rig type '{rig_type}' not found")]
    UnresolvedRigType { bone: String, rig_type: String },

    /// A rig instance rejected its parameters during construction.
    #[error("bone '{bone}' ({rig_type}): {source}")]
    Configuration {
        bone: String,
        rig_type: String,
        #[source]
        source: RigError,
    },

    /// A rig instance failed after bones started being created.
    #[error("generation failed during {phase} of bone '{bone}' ({rig_type}): {source}")]
    MidGeneration {
        phase: Phase,
        bone: String,
        rig_type: String,
        #[source]
        source: RigError,
        /// The armature as the run left it. Nothing is rolled back.
        partial: Option<Box<Armature>>,
    },
}

impl ErrorCategory for GenerateError {
    fn code(&self) -> &'static str {
        match self {
            GenerateError::InvalidMetarig { .. } => "GAMERIG_201",
            GenerateError::UnresolvedRigType { .. } => "GAMERIG_202",
            GenerateError::Configuration { .. } => "GAMERIG_203",
            GenerateError::MidGeneration { .. } => "GAMERIG_204",
        }
    }

    fn category(&self) -> &'static str {
        "generate"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RigError::unknown_key("MCH-jaw_master.004");
        assert_eq!(err.to_string(), "unknown bone key 'MCH-jaw_master.004'");
        assert_eq!(err.code(), "GAMERIG_101");

        let err = GenerateError::UnresolvedRigType {
            bone: "ORG-spine".into(),
            rig_type: "spines.tail".into(),
        };
        assert_eq!(err.to_string(), "bone 'ORG-spine': rig type 'spines.tail' not found");
    }

    #[test]
    fn test_configuration_classification() {
        assert!(RigError::configuration("chain too short").is_configuration());
        assert!(!RigError::missing_bone("x").is_configuration());
    }

    #[test]
    fn test_mid_generation_display() {
        let err = GenerateError::MidGeneration {
            phase: Phase::Parenting,
            bone: "ORG-head".into(),
            rig_type: "face".into(),
            source: RigError::ParentCycle {
                child: "a".into(),
                parent: "b".into(),
            },
            partial: None,
        };
        assert_eq!(
            err.to_string(),
            "generation failed during parenting of bone 'ORG-head' (face): parenting 'a' under 'b' would form a cycle"
        );
        assert_eq!(err.category(), "generate");
    }
}
