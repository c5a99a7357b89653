// Karabiner Core Errors
// Build-time failures raised while assembling rules

use thiserror::Error;

/// A required piece of a mapping is missing or over-specified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("mapping has no input: call from() before build()")]
    MissingInput,

    #[error("mapping has more than one input: {0}")]
    AmbiguousInput(String),

    #[error("layer has no trigger key")]
    MissingTrigger,

    #[error("layer binding has no source key")]
    MissingSource,

    #[error("layer binding for '{0}' has no output")]
    MissingOutput(String),

    #[error("layer binding source '{0}' is the layer trigger itself")]
    SourceIsTrigger(String),

    #[error("output action has no slot set (expected one of key, consumer, shell, set_variable, mouse, button, software_function)")]
    EmptyOutput,

    #[error("output action slots are ambiguous: {0} are all set, expected exactly one")]
    AmbiguousOutput(String),

    #[error("{0} output cannot carry modifiers")]
    ModifiersNotAllowed(&'static str),

    #[error("simultaneous input needs at least 2 keys, got {0}")]
    ChordTooShort(usize),

    #[error("simultaneous input repeats key '{0}'")]
    ChordDuplicateKey(String),

    #[error("{condition} condition requires at least one {field}")]
    EmptyCondition {
        condition: &'static str,
        field: &'static str,
    },

    #[error("invalid application pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// The builder was asked for the wrong compiled form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IllegalLayerUsageError {
    #[error("builder has layer key '{0}' set; use build_layer() instead of build()")]
    SingleBuildOnLayer(String),

    #[error("layer source must be a single key, not {0}")]
    SourceNotSingleKey(&'static str),

    #[error("layer bindings use fixed simultaneous options; remove simultaneous_options()")]
    SimultaneousOptionsOnLayer,
}

/// A string did not name any member of a closed enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: '{name}'")]
pub struct UnknownIdentifierError {
    pub kind: &'static str,
    pub name: String,
}

impl UnknownIdentifierError {
    pub fn new(kind: &'static str, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

/// Errors surfaced to the rule author
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    IllegalLayerUsage(#[from] IllegalLayerUsageError),

    #[error(transparent)]
    UnknownIdentifier(#[from] UnknownIdentifierError),

    #[error("rule '{rule}', mapping #{position}: {source}")]
    InRule {
        rule: String,
        position: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Attach the rule description and 1-based mapping position.
    pub fn in_rule(self, rule: impl Into<String>, position: usize) -> Self {
        Error::InRule {
            rule: rule.into(),
            position,
            source: Box::new(self),
        }
    }

    /// The innermost error, with any rule context peeled off.
    pub fn root(&self) -> &Error {
        match self {
            Error::InRule { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn as_configuration(&self) -> Option<&ConfigurationError> {
        match self.root() {
            Error::Configuration(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_illegal_layer_usage(&self) -> Option<&IllegalLayerUsageError> {
        match self.root() {
            Error::IllegalLayerUsage(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_unknown_identifier(&self) -> Option<&UnknownIdentifierError> {
        match self.root() {
            Error::UnknownIdentifier(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
