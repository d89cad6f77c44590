//! Backing-file document codec.
//!
//! The backing file holds exactly one JSON object:
//!
//! ```json
//! {
//!   "Value1": 10,
//!   "Value2": {
//!     "1": "2"
//!   },
//!   "Value3": "test123"
//! }
//! ```
//!
//! - Keys are member names, in schema order.
//! - Values are the `serde_json` encoding of each member's declared type.
//! - Output is indented with two spaces and has no trailing newline.
//! - Non-ASCII text is written as raw UTF-8 under [`Escaping::Relaxed`] and as
//!   `\uXXXX` escapes under [`Escaping::Ascii`].
//!
//! Decoding accepts a leading UTF-8 byte order mark, which some editors add
//! when a user hand-edits the file.

pub mod formatter;

use std::collections::BTreeMap;
use std::io;

use serde::{ser::SerializeMap, Deserialize, Serialize, Serializer};
use serde_json::ser::PrettyFormatter;
use serde_json::value::RawValue;

use crate::error::LoadError;
use crate::schema::Snapshot;
pub use formatter::{escape_non_ascii, AsciiFormatter};

const INDENT: &str = "  ";
const BOM: char = '\u{feff}';

/// The top-level object of a parsed document, one raw JSON value per key.
///
/// Values stay as text until a member decodes them into its own type, so
/// numbers outside the 64-bit range reach `u128`/`i128` members intact.
pub type Document = BTreeMap<String, Box<RawValue>>;

/// How string content beyond the mandatory JSON escapes is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Escaping {
    /// Raw UTF-8; only quote, backslash, and control characters are escaped.
    #[default]
    Relaxed,
    /// Every non-ASCII character is escaped as `\uXXXX`.
    Ascii,
}

/// Encodes one member value as indented JSON text at nesting depth zero.
///
/// # Errors
///
/// Fails if the value cannot be represented in JSON (e.g. a map whose keys
/// are not strings).
pub fn encode_member<V: Serialize + ?Sized>(value: &V) -> serde_json::Result<String> {
    let mut out = Vec::with_capacity(32);
    let mut ser = serde_json::Serializer::with_formatter(
        &mut out,
        PrettyFormatter::with_indent(INDENT.as_bytes()),
    );
    value.serialize(&mut ser)?;
    String::from_utf8(out)
        .map_err(|e| serde_json::Error::io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

/// Encodes `snapshot` as the indented document body.
///
/// Each member's text is shifted one level deeper and, under
/// [`Escaping::Ascii`], stripped of non-ASCII characters before it is placed
/// under its key.
///
/// # Errors
///
/// Fails only if a member's text is not valid JSON, which
/// [`encode_member`] never produces.
pub fn encode_document(snapshot: &Snapshot, escaping: Escaping) -> serde_json::Result<Vec<u8>> {
    let members = snapshot
        .entries()
        .iter()
        .map(|(name, text)| {
            let text = match escaping {
                Escaping::Relaxed => nest(text),
                Escaping::Ascii => nest(&escape_non_ascii(text)),
            };
            Ok((name.as_str(), RawValue::from_string(text)?))
        })
        .collect::<serde_json::Result<Vec<_>>>()?;

    let mut out = Vec::with_capacity(128 * members.len().max(1));
    match escaping {
        Escaping::Relaxed => {
            let formatter = PrettyFormatter::with_indent(INDENT.as_bytes());
            let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
            Members(&members).serialize(&mut ser)?;
        }
        Escaping::Ascii => {
            let formatter = AsciiFormatter::with_indent(INDENT.as_bytes());
            let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
            Members(&members).serialize(&mut ser)?;
        }
    }
    Ok(out)
}

/// Parses the document body into its top-level object.
///
/// # Errors
///
/// - [`LoadError::Parse`] if `text` is not valid JSON.
/// - [`LoadError::NotAnObject`] if the top-level value is an array or scalar.
pub fn decode_document(text: &str) -> Result<Document, LoadError> {
    let text = text.strip_prefix(BOM).unwrap_or(text);
    let raw: &RawValue = serde_json::from_str(text).map_err(LoadError::Parse)?;
    let found = match raw.get().as_bytes().first() {
        Some(b'{') => return serde_json::from_str(raw.get()).map_err(LoadError::Parse),
        Some(b'[') => "an array",
        Some(b'"') => "a string",
        Some(b't' | b'f') => "a boolean",
        Some(b'n') => "null",
        _ => "a number",
    };
    Err(LoadError::NotAnObject { found })
}

/// Shifts member text one indentation level deeper.
///
/// JSON strings never contain a raw line break, so every `\n` in encoder
/// output is layout.
fn nest(text: &str) -> String {
    text.replace('\n', &format!("\n{INDENT}"))
}

/// Ordered top-level object; a `BTreeMap` would sort the keys.
struct Members<'a>(&'a [(&'a str, Box<RawValue>)]);

impl Serialize for Members<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::schema::ConfigSchema;

    #[derive(Default)]
    struct Settings {
        value1: i32,
        value2: HashMap<String, String>,
        value3: String,
    }

    fn schema() -> ConfigSchema<Settings> {
        ConfigSchema::new()
            .field("Value1", |s: &Settings| &s.value1, |s| &mut s.value1)
            .field("Value2", |s: &Settings| &s.value2, |s| &mut s.value2)
            .field("Value3", |s: &Settings| &s.value3, |s| &mut s.value3)
    }

    fn demo_settings() -> Settings {
        let mut settings = Settings {
            value1: 10,
            value3: "test123".to_string(),
            ..Settings::default()
        };
        settings.value2.insert("1".to_string(), "2".to_string());
        settings
    }

    // ── encode_document ──────────────────────────────────────────────────────

    #[test]
    fn test_encode_document_is_indented_in_schema_order() {
        // Arrange
        let snapshot = schema().snapshot(&demo_settings()).unwrap();

        // Act
        let bytes = encode_document(&snapshot, Escaping::Relaxed).unwrap();

        // Assert
        let expected = "{\n  \"Value1\": 10,\n  \"Value2\": {\n    \"1\": \"2\"\n  },\n  \"Value3\": \"test123\"\n}";
        assert_eq!(String::from_utf8(bytes).unwrap(), expected);
    }

    #[test]
    fn test_encode_document_relaxed_keeps_raw_utf8() {
        let settings = Settings {
            value3: "Grüße <&>".to_string(),
            ..Settings::default()
        };
        let snapshot = schema().snapshot(&settings).unwrap();
        let text = String::from_utf8(encode_document(&snapshot, Escaping::Relaxed).unwrap()).unwrap();
        assert!(text.contains("\"Grüße <&>\""));
    }

    #[test]
    fn test_encode_document_ascii_escapes_non_ascii() {
        let settings = Settings {
            value3: "Grüße".to_string(),
            ..Settings::default()
        };
        let snapshot = schema().snapshot(&settings).unwrap();
        let bytes = encode_document(&snapshot, Escaping::Ascii).unwrap();
        assert!(bytes.is_ascii());
        assert!(String::from_utf8(bytes).unwrap().contains(r#""Gr\u00fc\u00dfe""#));
    }

    #[test]
    fn test_encode_document_of_empty_snapshot_is_empty_object() {
        let schema: ConfigSchema<Settings> = ConfigSchema::new();
        let snapshot = schema.snapshot(&Settings::default()).unwrap();
        assert_eq!(encode_document(&snapshot, Escaping::Relaxed).unwrap(), b"{}");
    }

    #[test]
    fn test_encode_document_is_byte_identical_on_repeat() {
        // Arrange: a map with several keys exercises nested ordering.
        let mut settings = demo_settings();
        for i in 0..16 {
            settings.value2.insert(format!("k{i}"), i.to_string());
        }

        // Act
        let schema = schema();
        let first = encode_document(&schema.snapshot(&settings).unwrap(), Escaping::Relaxed).unwrap();
        let second = encode_document(&schema.snapshot(&settings).unwrap(), Escaping::Relaxed).unwrap();

        // Assert
        assert_eq!(first, second);
    }

    // ── decode_document ──────────────────────────────────────────────────────

    #[test]
    fn test_decode_document_returns_top_level_object() {
        let document = decode_document(r#"{ "Value1": 3, "Value2": { "a": [1, 2] } }"#).unwrap();
        assert_eq!(document.get("Value1").map(|v| v.get()), Some("3"));
        assert_eq!(document.get("Value2").map(|v| v.get()), Some(r#"{ "a": [1, 2] }"#));
    }

    #[test]
    fn test_decode_document_strips_byte_order_mark() {
        let document = decode_document("\u{feff}{\"Value1\": 3}").unwrap();
        assert_eq!(document.len(), 1);
    }

    #[test]
    fn test_decode_document_rejects_malformed_json() {
        let result = decode_document("{ \"Value1\": ");
        assert!(matches!(result, Err(LoadError::Parse(_))));
    }

    #[test]
    fn test_decode_document_rejects_top_level_array() {
        // Arrange / Act
        let result = decode_document("[1, 2, 3]");

        // Assert
        assert!(matches!(
            result,
            Err(LoadError::NotAnObject { found: "an array" })
        ));
    }

    #[test]
    fn test_decode_document_rejects_top_level_scalar() {
        let result = decode_document("42");
        assert!(matches!(
            result,
            Err(LoadError::NotAnObject { found: "a number" })
        ));
    }

    #[test]
    fn test_decode_document_keeps_last_of_duplicate_keys() {
        let document = decode_document(r#"{ "Value1": 1, "Value1": 2 }"#).unwrap();
        assert_eq!(document.get("Value1").map(|v| v.get()), Some("2"));
    }

    #[test]
    fn test_decode_document_names_each_scalar_kind() {
        for (text, kind) in [
            ("\"x\"", "a string"),
            ("true", "a boolean"),
            ("null", "null"),
            ("-1.5", "a number"),
        ] {
            let result = decode_document(text);
            assert!(
                matches!(result, Err(LoadError::NotAnObject { found }) if found == kind),
                "{text}"
            );
        }
    }

    #[test]
    fn test_decode_document_keeps_integers_beyond_64_bits() {
        // Arrange
        let big = u128::from(u64::MAX) + 1;
        let text = format!("{{ \"Big\": {big} }}");

        // Act
        let document = decode_document(&text).unwrap();

        // Assert
        let raw = document.get("Big").unwrap();
        assert_eq!(serde_json::from_str::<u128>(raw.get()).unwrap(), big);
    }

    // ── encode_member ────────────────────────────────────────────────────────

    #[test]
    fn test_encode_member_writes_128_bit_integers() {
        assert_eq!(encode_member(&u128::MAX).unwrap(), u128::MAX.to_string());
        assert_eq!(encode_member(&i128::MIN).unwrap(), i128::MIN.to_string());
    }

    #[test]
    fn test_encode_member_indents_nested_values() {
        let text = encode_member(&vec![1, 2]).unwrap();
        assert_eq!(text, "[\n  1,\n  2\n]");
    }

    #[test]
    fn test_encode_member_rejects_non_string_map_keys() {
        let mut grid = HashMap::new();
        grid.insert((1u8, 2u8), 3u8);
        assert!(encode_member(&grid).is_err());
    }

    #[test]
    fn test_encode_document_nests_arrays_one_level() {
        #[derive(Default)]
        struct Listed {
            tags: Vec<String>,
        }
        let schema = ConfigSchema::new().field("Tags", |s: &Listed| &s.tags, |s| &mut s.tags);
        let listed = Listed {
            tags: vec!["a".to_string(), "b".to_string()],
        };
        let bytes = encode_document(&schema.snapshot(&listed).unwrap(), Escaping::Relaxed).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "{\n  \"Tags\": [\n    \"a\",\n    \"b\"\n  ]\n}"
        );
    }

    #[test]
    fn test_encode_document_ascii_escapes_keys_and_nested_values() {
        #[derive(Default)]
        struct Labels {
            labels: HashMap<String, String>,
        }
        let schema =
            ConfigSchema::new().field("Étiquettes", |s: &Labels| &s.labels, |s| &mut s.labels);
        let mut labels = Labels::default();
        labels.labels.insert("clé".to_string(), "valeur".to_string());

        let bytes = encode_document(&schema.snapshot(&labels).unwrap(), Escaping::Ascii).unwrap();

        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "{\n  \"\\u00c9tiquettes\": {\n    \"cl\\u00e9\": \"valeur\"\n  }\n}"
        );
    }

    #[test]
    fn test_escaping_deserializes_from_lowercase_names() {
        let escaping: Escaping = serde_json::from_str("\"ascii\"").unwrap();
        assert_eq!(escaping, Escaping::Ascii);
        assert_eq!(Escaping::default(), Escaping::Relaxed);
    }
}
