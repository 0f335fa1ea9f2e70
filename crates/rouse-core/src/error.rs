#[derive(thiserror::Error, Debug)]
pub enum WakeError {
    #[error("Command name is already registered: '{0}'")]
    DuplicateCommand(String),

    #[error("Config identifier is already declared: '{0}'")]
    DuplicateConfig(String),

    #[error("Parameter name is already declared: '{0}'")]
    DuplicateParameter(String),

    #[error("'{0}' is a reserved config identifier")]
    ReservedIdentifier(String),

    #[error("Inline parameter '{name}': {reason}")]
    InlineDeclaration { name: String, reason: String },

    #[error("Parameter was never filled: '{0}'")]
    UnfilledParameter(String),

    #[error("Hook slot '{slot}' (leaf {position}): {reason}")]
    HookProtocol {
        slot: &'static str,
        position: usize,
        reason: String,
    },

    #[error("Malformed override '{token}': {reason}")]
    OverrideSyntax { token: String, reason: String },

    #[error("Unknown override prefix '{prefix}'. Options are: {options:?}")]
    UnknownConfig {
        prefix: String,
        options: Vec<String>,
    },

    #[error("Ambiguous override prefix '{prefix}': matches configs {matches:?}")]
    AmbiguousPrefix {
        prefix: String,
        matches: Vec<String>,
    },

    #[error("Non-exclusive override '{token}' matches configs {matches:?}")]
    NonExclusiveOverride {
        token: String,
        matches: Vec<String>,
    },

    #[error("Override defined multiple times: '{0}'")]
    DuplicateOverride(String),

    #[error("Config '{config}' cannot accept override: '{token}'")]
    UnacceptedOverride { config: String, token: String },

    #[error("Config '{config}': cannot coerce '{value}' to {expected} for field '{field}'")]
    TypeValidation {
        config: String,
        field: String,
        value: String,
        expected: &'static str,
    },

    #[error("Parameter name resolves more than once: '{0}'")]
    ParameterCollision(String),

    #[error("No command selected on the command line")]
    NoCommandSelected,

    #[error("Unrecognized command: '{0}'")]
    UnknownCommand(String),

    #[error("Config '{config}': file not found: {path}")]
    FileNotFound { config: String, path: String },

    #[error("Config '{config}' at '{path}': {reason}")]
    Persistence {
        config: String,
        path: String,
        reason: String,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
