// ABOUTME: DTB structure block token definitions
// ABOUTME: Maps the big-endian token words onto the DtbToken enum

use super::error::FormatError;

/// Structure block markers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DtbToken {
    /// Opens a node; followed by its NUL-terminated, padded name
    BeginNode,
    /// Closes the innermost open node
    EndNode,
    /// Property record: length, name offset, payload
    Property,
    /// Ignored filler
    Nop,
    /// Terminates the structure block
    End,
}

impl DtbToken {
    pub const FDT_BEGIN_NODE: u32 = 0x1;
    pub const FDT_END_NODE: u32 = 0x2;
    pub const FDT_PROP: u32 = 0x3;
    pub const FDT_NOP: u32 = 0x4;
    pub const FDT_END: u32 = 0x9;

    /// Classify the word read at `offset`
    pub fn from_u32(value: u32, offset: usize) -> Result<Self, FormatError> {
        let token = match value {
            Self::FDT_BEGIN_NODE => DtbToken::BeginNode,
            Self::FDT_END_NODE => DtbToken::EndNode,
            Self::FDT_PROP => DtbToken::Property,
            Self::FDT_NOP => DtbToken::Nop,
            Self::FDT_END => DtbToken::End,
            _ => return Err(FormatError::InvalidToken { offset, value }),
        };
        Ok(token)
    }

    /// Short name used in diagnostics
    pub fn name(self) -> &'static str {
        match self {
            DtbToken::BeginNode => "begin-node",
            DtbToken::EndNode => "end-node",
            DtbToken::Property => "property",
            DtbToken::Nop => "nop",
            DtbToken::End => "end",
        }
    }

    /// Bytes needed to bring `offset` up to the next token boundary
    pub fn calculate_padding(offset: usize) -> usize {
        offset.next_multiple_of(4) - offset
    }
}
