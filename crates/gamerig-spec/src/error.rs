//! Error types for meta-skeleton validation and processing.

use thiserror::Error;

/// Error codes for meta-skeleton validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Structural errors (E001-E009)
    /// E001: Meta-skeleton has no bones
    EmptyMetarig,
    /// E002: Bone name is empty
    EmptyBoneName,
    /// E003: Two bones share a name
    DuplicateBoneName,
    /// E004: Parent names a bone that does not exist
    UnknownParent,
    /// E005: Parent chain loops back on itself
    ParentCycle,
    /// E006: Connected bone has no parent
    ConnectedWithoutParent,
    /// E007: Bone has zero length
    ZeroLengthBone,

    // Layer metadata errors (E010-E013)
    /// E010: More layer entries than the armature has layers
    TooManyLayers,
    /// E011: Layer references a colour group that does not exist
    UnknownColorGroup,
    /// E012: Constraint subtarget names a bone that does not exist
    UnknownSubtarget,
    /// E013: Driver reads or writes a bone that does not exist
    UnknownDriverBone,
}

impl ErrorCode {
    /// Returns the error code string (e.g., "E001").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::EmptyMetarig => "E001",
            ErrorCode::EmptyBoneName => "E002",
            ErrorCode::DuplicateBoneName => "E003",
            ErrorCode::UnknownParent => "E004",
            ErrorCode::ParentCycle => "E005",
            ErrorCode::ConnectedWithoutParent => "E006",
            ErrorCode::ZeroLengthBone => "E007",
            ErrorCode::TooManyLayers => "E010",
            ErrorCode::UnknownColorGroup => "E011",
            ErrorCode::UnknownSubtarget => "E012",
            ErrorCode::UnknownDriverBone => "E013",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Warning codes for meta-skeleton validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningCode {
    /// W001: No bone carries a rig type, generation will only copy bones
    NoRigTypes,
    /// W002: Rig type tag contains whitespace that will be stripped
    RigTypeWhitespace,
    /// W003: Parameters present on a bone without a rig type
    OrphanParameters,
    /// W004: Layer has a selection set flag but no name
    UnnamedSelectionSet,
}

impl WarningCode {
    /// Returns the warning code string (e.g., "W001").
    pub fn code(&self) -> &'static str {
        match self {
            WarningCode::NoRigTypes => "W001",
            WarningCode::RigTypeWhitespace => "W002",
            WarningCode::OrphanParameters => "W003",
            WarningCode::UnnamedSelectionSet => "W004",
        }
    }
}

impl std::fmt::Display for WarningCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A validation error with code, message, and optional path into the meta-skeleton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The error code.
    pub code: ErrorCode,
    /// Human-readable error message.
    pub message: String,
    /// Path to the offending field (e.g., "bones\[3\].parent").
    pub path: Option<String>,
}

impl ValidationError {
    /// Creates a new validation error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    /// Creates a new validation error with a path.
    pub fn with_path(code: ErrorCode, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: Some(path.into()),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}: {} (at {})", self.code, self.message, path),
            None => write!(f, "{}: {}", self.code, self.message),
        }
    }
}

impl std::error::Error for ValidationError {}

/// A validation warning with code, message, and optional path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    pub code: WarningCode,
    pub message: String,
    pub path: Option<String>,
}

impl ValidationWarning {
    /// Creates a new validation warning.
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    /// Creates a new validation warning with a path.
    pub fn with_path(
        code: WarningCode,
        message: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            path: Some(path.into()),
        }
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}: {} (at {})", self.code, self.message, path),
            None => write!(f, "{}: {}", self.code, self.message),
        }
    }
}

/// Top-level error type for meta-skeleton operations.
#[derive(Debug, Error)]
pub enum SpecError {
    /// Meta-skeleton validation failed with one or more errors.
    #[error("metarig validation failed with {0} error(s)")]
    ValidationFailed(usize),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of meta-skeleton validation.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether validation passed (no errors).
    pub ok: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    /// Creates a successful validation result.
    pub fn success() -> Self {
        Self {
            ok: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Adds an error to the result.
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
        self.ok = false;
    }

    /// Adds a warning to the result.
    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Returns true if there are no errors.
    pub fn is_ok(&self) -> bool {
        self.ok
    }

    /// Converts to a Result, returning Err if there are errors.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, Vec<ValidationError>> {
        if self.ok {
            Ok(self.warnings)
        } else {
            Err(self.errors)
        }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::success()
    }
}

/// Common trait for engine errors.
///
/// Every error enum in the workspace exposes a stable code (e.g. "GAMERIG_101")
/// and a category, so the CLI can report failures uniformly.
pub trait ErrorCategory: std::error::Error {
    /// Stable code for programmatic handling.
    fn code(&self) -> &'static str;

    /// Human-readable message, by default the `Display` output.
    fn message(&self) -> String {
        self.to_string()
    }

    /// Category such as "naming", "parameters", "rig", "generate".
    fn category(&self) -> &'static str;
}

impl ErrorCategory for SpecError {
    fn code(&self) -> &'static str {
        match self {
            SpecError::ValidationFailed(_) => "GAMERIG_001",
            SpecError::JsonParse(_) => "GAMERIG_002",
            SpecError::Io(_) => "GAMERIG_003",
        }
    }

    fn category(&self) -> &'static str {
        "metarig"
    }
}
