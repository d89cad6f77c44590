//! Error taxonomy shared by the schema, the codec, and the config manager.
//!
//! Every internal cause (JSON library errors, file-system errors, lock
//! poisoning) is caught at the load/save boundary and reported as one of the
//! domain-level conditions of [`ConfigError`].  The original cause is kept as
//! the error `source` so diagnostics can walk the chain:
//!
//! ```text
//! ConfigError::Load { path, source }
//!   └─ LoadError::Field { name: "retries", source }
//!        └─ serde_json::Error("invalid type: string, expected u32")
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error returned by every config manager operation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A construction argument was missing or inconsistent.
    ///
    /// Reported immediately, before the backing file is touched.
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] ArgumentError),

    /// The initial load at construction time failed.  No manager is created.
    #[error("error loading configuration from {path}")]
    Load {
        path: PathBuf,
        #[source]
        source: LoadError,
    },

    /// Writing the current settings to the backing file failed.
    #[error("error saving configuration to {path}")]
    Save {
        path: PathBuf,
        #[source]
        source: SaveError,
    },

    /// The auto-save worker thread could not be started.
    #[error("failed to start auto-save worker: {0}")]
    AutoSaveSpawn(#[source] std::io::Error),
}

/// Construction argument errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgumentError {
    /// No settings object was supplied to the builder.
    #[error("no configuration target was supplied")]
    MissingTarget,

    /// No schema was supplied and none could be derived from the target type.
    #[error("no schema was supplied for the configuration target")]
    MissingSchema,

    /// Two descriptors in the schema share a member name.
    #[error("member `{name}` is declared more than once in the schema")]
    DuplicateField { name: String },
}

/// Causes of a failed load.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Opening or reading the backing file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Another writer already holds the backing file.
    #[error("backing file is held by another writer")]
    Locked,

    /// The file content is not valid JSON.
    #[error("malformed JSON: {0}")]
    Parse(#[source] serde_json::Error),

    /// The file is valid JSON but its top-level value is not an object.
    #[error("top-level JSON value is {found}, expected an object")]
    NotAnObject { found: &'static str },

    /// A value could not be decoded into its member's declared type.
    #[error("member `{name}` could not be decoded")]
    Field {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// The file was empty and the save that populates it failed.
    #[error("populating the empty backing file failed")]
    Bootstrap(#[source] SaveError),

    /// The settings lock was poisoned by a panicking writer.
    #[error("settings lock poisoned")]
    Poisoned,
}

/// Causes of a failed save.
#[derive(Debug, Error)]
pub enum SaveError {
    /// Truncating, writing, or flushing the backing file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A member value could not be encoded as JSON.
    #[error("member `{name}` could not be encoded")]
    Field {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// The member texts could not be assembled into the document.
    #[error("document could not be encoded")]
    Encode(#[source] serde_json::Error),

    /// The backing file handle has already been released.
    #[error("backing file has been closed")]
    Closed,

    /// The settings lock was poisoned by a panicking writer.
    #[error("settings lock poisoned")]
    Poisoned,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
