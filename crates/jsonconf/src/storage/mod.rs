//! Storage infrastructure: the backing file and path resolution.
//!
//! This is the only module that touches the file system.  The manager hands
//! it fully encoded documents and receives raw text back; parsing and
//! encoding live in `jsonconf_core::codec`.

pub mod backing_file;

pub use backing_file::{base_dir, resolve_path, BackingFile, DEFAULT_FILE_NAME};
