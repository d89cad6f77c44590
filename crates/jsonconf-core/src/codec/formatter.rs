//! Pretty-printing formatter that escapes every non-ASCII character.
//!
//! `serde_json`'s own formatters write non-ASCII text as raw UTF-8 and only
//! escape what strict JSON requires (quote, backslash, control characters).
//! [`AsciiFormatter`] keeps the indented layout of
//! [`PrettyFormatter`](serde_json::ser::PrettyFormatter) but writes each
//! non-ASCII character as `\uXXXX`, using a UTF-16 surrogate pair for
//! characters outside the Basic Multilingual Plane:
//!
//! ```text
//! "café ☕"  →  "caf\u00e9 \u2615"
//! "😀"       →  "\ud83d\ude00"
//! ```

use std::io;

use serde_json::ser::{Formatter, PrettyFormatter};

/// Indented formatter with ASCII-only string output.
pub struct AsciiFormatter<'a> {
    pretty: PrettyFormatter<'a>,
}

impl<'a> AsciiFormatter<'a> {
    pub fn with_indent(indent: &'a [u8]) -> Self {
        Self {
            pretty: PrettyFormatter::with_indent(indent),
        }
    }
}

/// Replaces every non-ASCII character of `text` with `\uXXXX` escapes.
///
/// Applied to encoder output, this yields what [`AsciiFormatter`] would have
/// written: outside string literals JSON text is ASCII already.
pub fn escape_non_ascii(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    for ch in text.chars() {
        if ch.is_ascii() {
            out.push(ch);
            continue;
        }
        let mut units = [0u16; 2];
        for unit in ch.encode_utf16(&mut units) {
            out.push_str(&format!("\\u{unit:04x}"));
        }
    }
    out
}

impl Formatter for AsciiFormatter<'_> {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if fragment.is_ascii() {
            writer.write_all(fragment.as_bytes())
        } else {
            writer.write_all(escape_non_ascii(fragment).as_bytes())
        }
    }

    // The layout hooks below delegate to the pretty formatter.

    fn begin_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.pretty.begin_array(writer)
    }

    fn end_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.pretty.end_array(writer)
    }

    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.pretty.begin_array_value(writer, first)
    }

    fn end_array_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.pretty.end_array_value(writer)
    }

    fn begin_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.pretty.begin_object(writer)
    }

    fn end_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.pretty.end_object(writer)
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.pretty.begin_object_key(writer, first)
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.pretty.begin_object_value(writer)
    }

    fn end_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.pretty.end_object_value(writer)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
