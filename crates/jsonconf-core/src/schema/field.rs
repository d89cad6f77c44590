//! Field descriptors: one persisted member of a settings type.
//!
//! Rust has no runtime reflection, so the members of a settings struct are
//! described explicitly.  A [`FieldDescriptor`] pairs a member name (the JSON
//! key) with accessor closures that encode the member as JSON text and
//! decode JSON text back into it.
//!
//! # Accessors as lenses (for beginners)
//!
//! The constructors take closures that *borrow* into the settings struct
//! rather than copying values out:
//!
//! ```rust
//! use jsonconf_core::FieldDescriptor;
//!
//! struct Settings {
//!     retries: u32,
//! }
//!
//! let field = FieldDescriptor::field("retries", |s: &Settings| &s.retries, |s| &mut s.retries);
//! assert!(field.is_readable() && field.is_writable());
//! ```
//!
//! The closure `|s| &s.retries` says "given a settings struct, here is where
//! `retries` lives".  The descriptor then serializes or overwrites that
//! location with `serde_json`, using the member's own declared type.  The
//! value never passes through `serde_json::Value`, so every type `serde_json`
//! can write and read (including `u128` beyond the 64-bit range) round-trips.
//!
//! # Exclusion marker
//!
//! [`FieldDescriptor::ignored`] attaches the exclusion marker.  An ignored
//! member is never written by save and never overwritten by load, whatever
//! the file contains.  Attaching the marker twice is the same as once.

use std::fmt;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::value::RawValue;

use crate::codec::encode_member;

type Reader<T> = Box<dyn Fn(&T) -> serde_json::Result<String> + Send + Sync>;
type Writer<T> = Box<dyn Fn(&mut T, &RawValue) -> serde_json::Result<()> + Send + Sync>;

/// Describes one member of the settings type `T`.
pub struct FieldDescriptor<T> {
    name: String,
    reader: Option<Reader<T>>,
    writer: Option<Writer<T>>,
    ignored: bool,
}

impl<T: 'static> FieldDescriptor<T> {
    /// A readable and writable member: saved and loaded.
    pub fn field<V, G, S>(name: impl Into<String>, get: G, set: S) -> Self
    where
        V: Serialize + DeserializeOwned + 'static,
        G: Fn(&T) -> &V + Send + Sync + 'static,
        S: Fn(&mut T) -> &mut V + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            reader: Some(make_reader(get)),
            writer: Some(make_writer(set)),
            ignored: false,
        }
    }

    /// A member that is saved but never assigned by load.
    pub fn read_only<V, G>(name: impl Into<String>, get: G) -> Self
    where
        V: Serialize + 'static,
        G: Fn(&T) -> &V + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            reader: Some(make_reader(get)),
            writer: None,
            ignored: false,
        }
    }

    /// A member that is assigned by load but never written by save.
    pub fn write_only<V, S>(name: impl Into<String>, set: S) -> Self
    where
        V: DeserializeOwned + 'static,
        S: Fn(&mut T) -> &mut V + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            reader: None,
            writer: Some(make_writer(set)),
            ignored: false,
        }
    }

    /// Attaches the exclusion marker.
    #[must_use]
    pub fn ignored(mut self) -> Self {
        self.ignored = true;
        self
    }

    /// The member name, used verbatim as the JSON key.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_ignored(&self) -> bool {
        self.ignored
    }

    pub fn is_readable(&self) -> bool {
        self.reader.is_some()
    }

    pub fn is_writable(&self) -> bool {
        self.writer.is_some()
    }

    /// Eligible for save: readable and not ignored.
    pub fn is_saved(&self) -> bool {
        self.is_readable() && !self.ignored
    }

    /// Eligible for load: writable and not ignored.
    pub fn is_loaded(&self) -> bool {
        self.is_writable() && !self.ignored
    }

    /// Encodes the member's current value as indented JSON text.
    ///
    /// Returns `Ok(None)` for a member without a reader.
    pub fn read(&self, target: &T) -> serde_json::Result<Option<String>> {
        self.reader.as_ref().map(|read| read(target)).transpose()
    }

    /// Decodes `value` into the member's declared type and assigns it.
    ///
    /// The member is left untouched when decoding fails.  Returns `Ok(false)`
    /// for a member without a writer.
    pub fn write(&self, target: &mut T, value: &RawValue) -> serde_json::Result<bool> {
        match &self.writer {
            Some(write) => write(target, value).map(|()| true),
            None => Ok(false),
        }
    }
}

impl<T: 'static> fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("readable", &self.is_readable())
            .field("writable", &self.is_writable())
            .field("ignored", &self.ignored)
            .finish()
    }
}

fn make_reader<T, V, G>(get: G) -> Reader<T>
where
    T: 'static,
    V: Serialize + 'static,
    G: Fn(&T) -> &V + Send + Sync + 'static,
{
    Box::new(move |target: &T| encode_member(get(target)))
}

fn make_writer<T, V, S>(set: S) -> Writer<T>
where
    T: 'static,
    V: DeserializeOwned + 'static,
    S: Fn(&mut T) -> &mut V + Send + Sync + 'static,
{
    Box::new(move |target: &mut T, value: &RawValue| {
        // Decode first so a bad value never clobbers the member.
        let decoded: V = serde_json::from_str(value.get())?;
        *set(target) = decoded;
        Ok(())
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn raw(text: &str) -> Box<RawValue> {
        RawValue::from_string(text.to_string()).unwrap()
    }

    #[derive(Debug, Default)]
    struct Sample {
        count: i32,
        labels: HashMap<String, String>,
        token: String,
    }

    #[test]
    fn test_field_reads_current_value_as_json() {
        // Arrange
        let field = FieldDescriptor::field("count", |s: &Sample| &s.count, |s| &mut s.count);
        let sample = Sample {
            count: 7,
            ..Sample::default()
        };

        // Act
        let value = field.read(&sample).unwrap();

        // Assert
        assert_eq!(value.as_deref(), Some("7"));
    }

    #[test]
    fn test_field_write_assigns_decoded_value() {
        // Arrange
        let field = FieldDescriptor::field("labels", |s: &Sample| &s.labels, |s| &mut s.labels);
        let mut sample = Sample::default();

        // Act
        let written = field.write(&mut sample, &raw(r#"{ "1": "2" }"#)).unwrap();

        // Assert
        assert!(written);
        assert_eq!(sample.labels.get("1").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_field_write_with_wrong_type_leaves_member_untouched() {
        // Arrange
        let field = FieldDescriptor::field("count", |s: &Sample| &s.count, |s| &mut s.count);
        let mut sample = Sample {
            count: 3,
            ..Sample::default()
        };

        // Act
        let result = field.write(&mut sample, &raw(r#""not a number""#));

        // Assert
        assert!(result.is_err());
        assert_eq!(sample.count, 3);
    }

    #[test]
    fn test_field_round_trips_integers_beyond_64_bits() {
        // Arrange
        #[derive(Default)]
        struct Wide {
            big: u128,
            small: i128,
        }
        let big = FieldDescriptor::field("big", |w: &Wide| &w.big, |w| &mut w.big);
        let small = FieldDescriptor::field("small", |w: &Wide| &w.small, |w| &mut w.small);
        let source = Wide {
            big: u128::from(u64::MAX) + 1,
            small: i128::from(i64::MIN) - 1,
        };

        // Act
        let big_text = big.read(&source).unwrap().unwrap();
        let small_text = small.read(&source).unwrap().unwrap();
        let mut restored = Wide::default();
        big.write(&mut restored, &raw(&big_text)).unwrap();
        small.write(&mut restored, &raw(&small_text)).unwrap();

        // Assert
        assert_eq!(big_text, "18446744073709551616");
        assert_eq!(restored.big, source.big);
        assert_eq!(restored.small, source.small);
    }

    #[test]
    fn test_read_only_field_is_saved_but_not_loaded() {
        let field = FieldDescriptor::read_only("token", |s: &Sample| &s.token);
        assert!(field.is_saved());
        assert!(!field.is_loaded());

        let mut sample = Sample::default();
        assert!(!field.write(&mut sample, &raw(r#""x""#)).unwrap());
        assert!(sample.token.is_empty());
    }

    #[test]
    fn test_write_only_field_is_loaded_but_not_saved() {
        let field = FieldDescriptor::write_only("token", |s: &mut Sample| &mut s.token);
        assert!(field.is_loaded());
        assert!(!field.is_saved());
        assert_eq!(field.read(&Sample::default()).unwrap(), None);
    }

    #[test]
    fn test_ignored_marker_disables_save_and_load() {
        // Arrange / Act
        let field =
            FieldDescriptor::field("token", |s: &Sample| &s.token, |s| &mut s.token).ignored();

        // Assert
        assert!(field.is_ignored());
        assert!(!field.is_saved());
        assert!(!field.is_loaded());
    }

    #[test]
    fn test_ignored_marker_attached_twice_is_same_as_once() {
        let once = FieldDescriptor::field("count", |s: &Sample| &s.count, |s| &mut s.count).ignored();
        let twice = FieldDescriptor::field("count", |s: &Sample| &s.count, |s| &mut s.count)
            .ignored()
            .ignored();
        assert_eq!(once.is_ignored(), twice.is_ignored());
        assert_eq!(once.is_saved(), twice.is_saved());
    }

    #[test]
    fn test_debug_output_lists_flags() {
        let field = FieldDescriptor::read_only("count", |s: &Sample| &s.count);
        let text = format!("{field:?}");
        assert!(text.contains("\"count\""));
        assert!(text.contains("writable: false"));
    }
}
