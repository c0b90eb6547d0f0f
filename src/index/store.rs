//! The persisted plugin index document.

use std::io;
use std::path::Path;

use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter};
use serde_json::Value;

use super::manifest::{Manifest, INTERNAL_NAME};
use super::{IndexError, IndexResult};

/// Default index file name.
pub const INDEX_FILE: &str = "pluginmaster.json";

/// Indentation of the written document.
const INDENT: &[u8] = b"    ";

/// An ordered list of index entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PluginIndex {
    entries: Vec<Manifest>,
}

impl PluginIndex {
    /// Create an index from entries.
    pub fn new(entries: Vec<Manifest>) -> Self {
        Self { entries }
    }

    /// Load an existing index file.
    ///
    /// The file must exist and hold a JSON array of objects.
    pub fn load(path: &Path) -> IndexResult<Self> {
        if !path.exists() {
            return Err(IndexError::MissingIndex(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|source| IndexError::Io { path: path.to_path_buf(), source })?;

        let value: Value = serde_json::from_str(&content)
            .map_err(|source| IndexError::Parse { path: path.to_path_buf(), source })?;

        let Value::Array(items) = value else {
            return Err(IndexError::NotAnArray(path.to_path_buf()));
        };

        let entries = items
            .into_iter()
            .map(|item| match item {
                Value::Object(map) => Ok(Manifest::from(map)),
                _ => Err(IndexError::NotAnArray(path.to_path_buf())),
            })
            .collect::<IndexResult<Vec<_>>>()?;

        Ok(Self { entries })
    }

    /// Entries in index order.
    pub fn entries(&self) -> &[Manifest] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry with the given `InternalName`.
    pub fn find(&self, name: &str) -> Option<&Manifest> {
        self.entries.iter().find(|m| m.get(INTERNAL_NAME).and_then(Value::as_str) == Some(name))
    }

    /// `InternalName`s that appear more than once, in order of first repeat.
    pub fn duplicate_names(&self) -> Vec<String> {
        let mut seen = Vec::new();
        let mut duplicates = Vec::new();

        for name in self.entries.iter().filter_map(|m| m.get(INTERNAL_NAME)?.as_str()) {
            if seen.contains(&name) {
                if !duplicates.iter().any(|d: &String| d == name) {
                    duplicates.push(name.to_string());
                }
            } else {
                seen.push(name);
            }
        }

        duplicates
    }

    /// Render the index as JSON with four-space indentation.
    ///
    /// Non-ASCII characters are written as `\uXXXX` escapes.
    pub fn to_pretty_json(&self) -> IndexResult<Vec<u8>> {
        let mut buf = Vec::new();
        let formatter = AsciiFormatter(PrettyFormatter::with_indent(INDENT));
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.entries.serialize(&mut serializer)?;
        Ok(buf)
    }

    /// Overwrite the index file.
    ///
    /// The document is rendered before the file is opened, so a rendering
    /// failure leaves the old file untouched.
    pub fn write(&self, path: &Path) -> IndexResult<()> {
        let content = self.to_pretty_json()?;
        std::fs::write(path, content)
            .map_err(|source| IndexError::Io { path: path.to_path_buf(), source })
    }
}

/// Pretty formatter that escapes every non-ASCII character, using UTF-16
/// surrogate pairs outside the Basic Multilingual Plane.
struct AsciiFormatter<'a>(PrettyFormatter<'a>);

impl Formatter for AsciiFormatter<'_> {
    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_array(writer)
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.0.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_object(writer)
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.0.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_object_value(writer)
    }

    fn write_string_fragment<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        let mut units = [0u16; 2];
        let mut start = 0;

        for (i, ch) in fragment.char_indices() {
            if ch.is_ascii() {
                continue;
            }
            writer.write_all(&fragment.as_bytes()[start..i])?;
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{unit:04x}")?;
            }
            start = i + ch.len_utf8();
        }

        writer.write_all(&fragment.as_bytes()[start..])
    }
}
