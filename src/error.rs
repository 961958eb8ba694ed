//! Error taxonomy for the configuration engine.
//!
//! Every fallible operation in the engine surfaces one of these variants;
//! nothing is swallowed at a component boundary. The two validator-related
//! variants are deliberately distinct: [`EngineError::ValidationFailed`]
//! means the external checker rejected the mutated tree (and the transaction
//! rolled back), while [`EngineError::ValidatorUnavailable`] means the
//! checker itself could not run, so the mutation is still on disk and merely
//! unconfirmed.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors produced by the configuration engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A configuration file was missing, unreadable, or unwritable.
    #[error("cannot access configuration file {path}: {source}")]
    Access {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The external syntax check rejected the post-mutation configuration.
    /// All files touched by the transaction have been restored.
    #[error("configuration validation failed: {diagnostic}")]
    ValidationFailed { diagnostic: String },

    /// The external syntax checker could not be run at all. The mutation is
    /// left in place; its correctness is unconfirmed.
    #[error("syntax validator could not run: {0}")]
    ValidatorUnavailable(String),

    /// A caller-supplied directive pattern failed to compile. Rejected
    /// before any file I/O.
    #[error("invalid directive pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A required `Include` target did not resolve to any existing file.
    #[error("required include target not found: {0}")]
    MissingInclude(Utf8PathBuf),

    /// A settings key the engine depends on was not configured.
    #[error("setting {0:?} is not configured")]
    MissingSetting(String),
}

impl EngineError {
    /// Wraps an I/O error with the file it concerned.
    pub fn access(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Access {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias used throughout the engine.
pub type Result<T> = std::result::Result<T, EngineError>;
