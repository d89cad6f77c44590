//! The ordered schema of a settings type and the two operations over it.
//!
//! A [`ConfigSchema`] is the explicit stand-in for runtime reflection: an
//! ordered list of [`FieldDescriptor`]s, built once, that says which members
//! of the settings type are persisted and how.
//!
//! - [`ConfigSchema::snapshot`] reads every saved member into an ordered
//!   [`Snapshot`] (the body of a save).
//! - [`ConfigSchema::apply`] assigns values from a parsed [`Document`] to
//!   every loaded member that has a matching key (the body of a load).
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//!
//! use jsonconf_core::{ConfigSchema, ConfigTarget, FieldDescriptor};
//!
//! #[derive(Default)]
//! struct Settings {
//!     value1: i32,
//!     value2: HashMap<String, String>,
//!     value3: String,
//!     session_token: String,
//! }
//!
//! impl ConfigTarget for Settings {
//!     fn schema() -> ConfigSchema<Self> {
//!         ConfigSchema::<Self>::new()
//!             .field("Value1", |s| &s.value1, |s| &mut s.value1)
//!             .field("Value2", |s| &s.value2, |s| &mut s.value2)
//!             .field("Value3", |s| &s.value3, |s| &mut s.value3)
//!             .with(
//!                 FieldDescriptor::field("SessionToken", |s: &Self| &s.session_token, |s| {
//!                     &mut s.session_token
//!                 })
//!                 .ignored(),
//!             )
//!     }
//! }
//!
//! let schema = Settings::schema();
//! assert_eq!(schema.len(), 4);
//! ```

pub mod field;

use std::collections::HashSet;

use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::codec::Document;
use crate::error::{ArgumentError, LoadError, SaveError};
pub use field::FieldDescriptor;

/// A settings type that knows its own schema.
///
/// Implementing this lets the config manager derive the schema from the
/// target type alone, the way the member list of a type is implied by the
/// type itself.
pub trait ConfigTarget: Sized + Send + Sync + 'static {
    /// Returns the persisted members of `Self`, in save order.
    fn schema() -> ConfigSchema<Self>;
}

/// Ordered list of member descriptors for the settings type `T`.
pub struct ConfigSchema<T> {
    fields: Vec<FieldDescriptor<T>>,
}

impl<T: 'static> ConfigSchema<T> {
    /// An empty schema.
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Appends a readable and writable member.
    #[must_use]
    pub fn field<V, G, S>(self, name: impl Into<String>, get: G, set: S) -> Self
    where
        V: Serialize + DeserializeOwned + 'static,
        G: Fn(&T) -> &V + Send + Sync + 'static,
        S: Fn(&mut T) -> &mut V + Send + Sync + 'static,
    {
        self.with(FieldDescriptor::field(name, get, set))
    }

    /// Appends a member that is saved but never loaded.
    #[must_use]
    pub fn read_only<V, G>(self, name: impl Into<String>, get: G) -> Self
    where
        V: Serialize + 'static,
        G: Fn(&T) -> &V + Send + Sync + 'static,
    {
        self.with(FieldDescriptor::read_only(name, get))
    }

    /// Appends a member that is loaded but never saved.
    #[must_use]
    pub fn write_only<V, S>(self, name: impl Into<String>, set: S) -> Self
    where
        V: DeserializeOwned + 'static,
        S: Fn(&mut T) -> &mut V + Send + Sync + 'static,
    {
        self.with(FieldDescriptor::write_only(name, set))
    }

    /// Appends a prepared descriptor, e.g. one carrying the exclusion marker.
    #[must_use]
    pub fn with(mut self, descriptor: FieldDescriptor<T>) -> Self {
        self.fields.push(descriptor);
        self
    }

    pub fn fields(&self) -> &[FieldDescriptor<T>] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Checks that no member name is declared twice.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::DuplicateField`] naming the first repeat.
    pub fn validate(&self) -> Result<(), ArgumentError> {
        let mut seen = HashSet::with_capacity(self.fields.len());
        for field in &self.fields {
            if !seen.insert(field.name()) {
                return Err(ArgumentError::DuplicateField {
                    name: field.name().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Reads every saved member of `target`, in schema order.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError::Field`] for the first member whose value cannot be
    /// encoded as JSON (e.g. a map with non-string keys).
    pub fn snapshot(&self, target: &T) -> Result<Snapshot, SaveError> {
        let mut entries = Vec::with_capacity(self.fields.len());
        for field in self.fields.iter().filter(|f| f.is_saved()) {
            let value = field.read(target).map_err(|source| SaveError::Field {
                name: field.name().to_string(),
                source,
            })?;
            if let Some(text) = value {
                entries.push((field.name().to_string(), text));
            }
        }
        Ok(Snapshot { entries })
    }

    /// Assigns values from `document` to every loaded member with a matching key.
    ///
    /// Members without a key keep their current value.  Keys without a
    /// matching member are reported in [`ApplyReport::unknown_keys`] and
    /// otherwise ignored.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Field`] for the first value that cannot be decoded
    /// into its member's type.  Members assigned before the failure stay
    /// assigned.
    pub fn apply(
        &self,
        target: &mut T,
        mut document: Document,
    ) -> Result<ApplyReport, LoadError> {
        let mut report = ApplyReport::default();

        for field in &self.fields {
            let Some(value) = document.remove(field.name()) else {
                continue;
            };
            if !field.is_loaded() {
                debug!(member = field.name(), "skipping member excluded from load");
                report.skipped.push(field.name().to_string());
                continue;
            }
            field
                .write(target, &value)
                .map_err(|source| LoadError::Field {
                    name: field.name().to_string(),
                    source,
                })?;
            report.applied.push(field.name().to_string());
        }

        report.unknown_keys = document.into_keys().collect();
        Ok(report)
    }
}

impl<T: 'static> Default for ConfigSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> std::fmt::Debug for ConfigSchema<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(&self.fields).finish()
    }
}

/// What a load did with each key of the document.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ApplyReport {
    /// Members that were assigned, in schema order.
    pub applied: Vec<String>,
    /// Keys that matched an ignored or read-only member.
    pub skipped: Vec<String>,
    /// Keys with no matching member.
    pub unknown_keys: Vec<String>,
}

/// The saved members of a settings object at one instant, in schema order.
///
/// Each entry holds the member name and its value as indented JSON text;
/// [`encode_document`](crate::codec::encode_document) assembles them into
/// the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    entries: Vec<(String, String)>,
}

impl Snapshot {
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// The JSON text saved for member `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, text)| text.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
