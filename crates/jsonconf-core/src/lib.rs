//! # jsonconf-core
//!
//! I/O-free building blocks for persisting a process-wide settings object as
//! a JSON document.
//!
//! This crate is used by the `jsonconf` crate, which adds the backing file,
//! the auto-save worker, and the `ConfigManager`.  Nothing here touches the
//! file system or spawns threads, so every piece can be tested in isolation.
//!
//! # Architecture overview (for beginners)
//!
//! Languages with runtime reflection can walk the members of a type and read
//! or write them by name.  Rust cannot, so the settings type declares its
//! persisted members up front:
//!
//! - **`schema`** – [`FieldDescriptor`] describes one member (name, accessors,
//!   the exclusion marker); [`ConfigSchema`] is the ordered list of them and
//!   implements the two core operations: taking a [`Snapshot`] of the current
//!   values (save) and applying a parsed document to a settings object (load).
//!
//! - **`codec`** – turns a snapshot into the indented JSON document written to
//!   disk and parses the document back into a [`Document`] of raw member
//!   values.
//!
//! - **`error`** – the error taxonomy shared by everything above and by the
//!   manager: invalid arguments, load errors, and save errors.

pub mod codec;
pub mod error;
pub mod schema;

// Re-export the most-used types at the crate root so callers can write
// `jsonconf_core::ConfigSchema` instead of `jsonconf_core::schema::ConfigSchema`.
pub use codec::{decode_document, encode_document, encode_member, Document, Escaping};
pub use error::{ArgumentError, ConfigError, LoadError, SaveError};
pub use schema::{ApplyReport, ConfigSchema, ConfigTarget, FieldDescriptor, Snapshot};
