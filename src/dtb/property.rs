// ABOUTME: Heuristic classification of raw property payloads into typed values
// ABOUTME: Decides between empty markers, strings, string lists, cell lists and opaque bytes

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Property value types in device tree
///
/// Serialized untagged: cells as an integer array, strings as a string or
/// string array, the empty marker as `""`. Translated `reg` pairs are also an
/// integer array, holding 64-bit values. Opaque bytes serialize as a dtc-style
/// bytestring such as `"[dc a6 32 01]"` so they never read as cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Zero-length payload, a presence flag
    #[serde(serialize_with = "serialize_empty")]
    Empty,
    /// Single string
    String(String),
    /// Multiple strings, or a name that is always surfaced as a list
    StringList(Vec<String>),
    /// Big-endian 32-bit cells in encoded order
    Cells(Vec<u32>),
    /// Flattened `(address, size)` pairs of a `reg` property, each field
    /// combined from its cells and translated into the root address space
    Reg(Vec<u64>),
    /// Payload that fits none of the other shapes
    #[serde(serialize_with = "serialize_bytestring")]
    Bytes(Vec<u8>),
}

fn serialize_empty<S: serde::Serializer>(serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str("")
}

fn serialize_bytestring<S: serde::Serializer>(
    bytes: &[u8],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&bytestring(bytes))
}

/// dtc bytestring notation: `[dc a6 32]`
fn bytestring(bytes: &[u8]) -> String {
    let hex: Vec<_> = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!("[{}]", hex.join(" "))
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Empty => write!(f, "<empty>"),
            PropertyValue::String(s) => write!(f, "\"{s}\""),
            PropertyValue::StringList(list) => {
                let quoted: Vec<_> = list.iter().map(|s| format!("\"{s}\"")).collect();
                write!(f, "[{}]", quoted.join(", "))
            }
            PropertyValue::Cells(cells) => {
                let hex: Vec<_> = cells.iter().map(|c| format!("0x{c:x}")).collect();
                write!(f, "<{}>", hex.join(" "))
            }
            PropertyValue::Reg(words) => {
                let hex: Vec<_> = words.iter().map(|w| format!("0x{w:x}")).collect();
                write!(f, "<{}>", hex.join(" "))
            }
            PropertyValue::Bytes(bytes) => f.write_str(&bytestring(bytes)),
        }
    }
}

/// Classifies raw property payloads.
///
/// The only context the decoder needs besides the bytes is the property name:
/// names in the list set always surface as a string list, even with one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDecoder {
    list_properties: HashSet<String>,
}

impl PropertyDecoder {
    /// Names that are lists by convention even when they hold one string
    pub const DEFAULT_LIST_PROPERTIES: &'static [&'static str] =
        &["compatible", "clock-output-names"];

    /// Create a decoder with a custom always-list set
    pub fn new<I, S>(list_properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            list_properties: list_properties.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `name` always decodes to a string list
    pub fn is_list_property(&self, name: &str) -> bool {
        self.list_properties.contains(name)
    }

    /// Classify one property payload
    pub fn decode(&self, name: &str, data: &[u8]) -> PropertyValue {
        if data.is_empty() {
            return PropertyValue::Empty;
        }

        if let Some(mut strings) = split_strings(data) {
            if strings.len() == 1 && !self.is_list_property(name) {
                return PropertyValue::String(strings.remove(0));
            }
            return PropertyValue::StringList(strings);
        }

        if let Some(cells) = decode_cells(data) {
            return PropertyValue::Cells(cells);
        }

        PropertyValue::Bytes(data.to_vec())
    }
}

impl Default for PropertyDecoder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LIST_PROPERTIES.iter().copied())
    }
}

/// Split a payload of NUL-terminated printable strings.
///
/// Returns `None` unless the payload ends in NUL, every string is non-empty
/// and every other byte is printable ASCII (tab, CR and LF allowed).
pub fn split_strings(data: &[u8]) -> Option<Vec<String>> {
    let (last, body) = data.split_last()?;
    if *last != 0 {
        return None;
    }

    let printable = |b: &u8| (32..=126).contains(b) || matches!(b, b'\t' | b'\n' | b'\r');

    body.split(|&b| b == 0)
        .map(|segment| {
            if segment.is_empty() || !segment.iter().all(printable) {
                return None;
            }
            core::str::from_utf8(segment).ok().map(str::to_string)
        })
        .collect()
}

/// Split a payload into big-endian u32 cells if its length allows it
pub fn decode_cells(data: &[u8]) -> Option<Vec<u32>> {
    if data.len() % 4 != 0 {
        return None;
    }
    Some(
        data.chunks_exact(4)
            .map(|chunk| u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect(),
    )
}
