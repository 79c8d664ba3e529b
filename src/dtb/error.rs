// ABOUTME: Error types for device tree blob decoding
// ABOUTME: Every structural fault carries the absolute byte offset where it was detected

use thiserror::Error;

/// Structural error raised while decoding a DTB.
///
/// Decoding is all-or-nothing: when one of these is returned no tree exists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// Invalid magic number in DTB header
    #[error("invalid magic number 0x{found:08x} at offset {offset}")]
    InvalidMagic { offset: usize, found: u32 },
    /// Header advertises a format version this decoder cannot walk
    #[error("unsupported DTB version {version} (last compatible {last_compatible}) at offset {offset}")]
    UnsupportedVersion {
        offset: usize,
        version: u32,
        last_compatible: u32,
    },
    /// Header fields are inconsistent with each other or with the buffer
    #[error("malformed DTB header at offset {offset}: {reason}")]
    MalformedHeader { offset: usize, reason: &'static str },
    /// A block or record runs past the end of the data
    #[error("truncated DTB: needed {needed} more bytes at offset {offset}")]
    Truncated { offset: usize, needed: usize },
    /// Structure block is not 4-byte aligned
    #[error("structure block misaligned at offset {offset}")]
    Misaligned { offset: usize },
    /// Unknown token in structure block
    #[error("invalid token 0x{value:08x} at offset {offset}")]
    InvalidToken { offset: usize, value: u32 },
    /// A known token appeared where the structure does not allow it
    #[error("unexpected {token} token at offset {offset}")]
    UnexpectedToken { offset: usize, token: &'static str },
    /// End-node token with no open node
    #[error("end-node token without matching begin-node at offset {offset}")]
    UnmatchedEndNode { offset: usize },
    /// End token reached while nodes were still open
    #[error("{open} node(s) still open at end token, offset {offset}")]
    UnclosedNode { offset: usize, open: usize },
    /// Property name offset points outside the strings block
    #[error("string table offset {name_offset} out of range at offset {offset}")]
    StringOffsetOutOfRange { offset: usize, name_offset: usize },
    /// Node or property name is unterminated or not valid UTF-8
    #[error("invalid name at offset {offset}")]
    InvalidName { offset: usize },
    /// Two sibling nodes share the same name
    #[error("duplicate node {path} at offset {offset}")]
    DuplicateNode { offset: usize, path: String },
    /// A node declares the same property twice
    #[error("duplicate property {name} at offset {offset}")]
    DuplicateProperty { offset: usize, name: String },
}

impl FormatError {
    /// Byte offset into the blob at which the fault was detected.
    pub fn offset(&self) -> usize {
        match self {
            FormatError::InvalidMagic { offset, .. }
            | FormatError::UnsupportedVersion { offset, .. }
            | FormatError::MalformedHeader { offset, .. }
            | FormatError::Truncated { offset, .. }
            | FormatError::Misaligned { offset }
            | FormatError::InvalidToken { offset, .. }
            | FormatError::UnexpectedToken { offset, .. }
            | FormatError::UnmatchedEndNode { offset }
            | FormatError::UnclosedNode { offset, .. }
            | FormatError::StringOffsetOutOfRange { offset, .. }
            | FormatError::InvalidName { offset }
            | FormatError::DuplicateNode { offset, .. }
            | FormatError::DuplicateProperty { offset, .. } => *offset,
        }
    }
}
