// ABOUTME: Offset-tracking cursor over the DTB structure block
// ABOUTME: Reads tokens, aligned names and property records while remembering absolute positions

use super::error::FormatError;
use super::tokens::DtbToken;

/// Cursor over one block of the blob.
///
/// Positions are absolute offsets into the whole blob so errors can point at
/// the faulting byte.
#[derive(Debug, Clone)]
pub struct BlockReader<'a> {
    data: &'a [u8],
    pos: usize,
    end: usize,
}

/// Property record header that follows an FDT_PROP token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyRecord<'a> {
    /// Offset of the name within the strings block
    pub name_offset: usize,
    /// Payload bytes, without padding
    pub data: &'a [u8],
}

impl<'a> BlockReader<'a> {
    /// Create a reader over `data[range]`.
    pub fn new(data: &'a [u8], range: core::ops::Range<usize>) -> Self {
        let end = range.end.min(data.len());
        Self {
            data,
            pos: range.start.min(end),
            end,
        }
    }

    /// Current absolute offset.
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Bytes left in the block.
    pub fn remaining(&self) -> usize {
        self.end - self.pos
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], FormatError> {
        if self.remaining() < len {
            return Err(FormatError::Truncated {
                offset: self.pos,
                needed: len - self.remaining(),
            });
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn align(&mut self) -> Result<(), FormatError> {
        let padding = DtbToken::calculate_padding(self.pos);
        self.take(padding).map(|_| ())
    }

    /// Read one big-endian u32.
    pub fn read_u32(&mut self) -> Result<u32, FormatError> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read the next token, returning it with the offset it started at.
    pub fn read_token(&mut self) -> Result<(usize, DtbToken), FormatError> {
        let offset = self.pos;
        let value = self.read_u32()?;
        Ok((offset, DtbToken::from_u32(value, offset)?))
    }

    /// Read the NUL-terminated node name that follows FDT_BEGIN_NODE, then
    /// skip padding to the next 4-byte boundary.
    pub fn read_node_name(&mut self) -> Result<String, FormatError> {
        let offset = self.pos;
        let rest = &self.data[self.pos..self.end];
        let nul = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(FormatError::InvalidName { offset })?;
        let name = core::str::from_utf8(&rest[..nul])
            .map_err(|_| FormatError::InvalidName { offset })?
            .to_string();
        self.pos += nul + 1;
        self.align()?;
        Ok(name)
    }

    /// Read the length/name-offset pair and payload that follow FDT_PROP.
    pub fn read_property(&mut self) -> Result<PropertyRecord<'a>, FormatError> {
        let len = self.read_u32()? as usize;
        let name_offset = self.read_u32()? as usize;
        let data = self.take(len)?;
        self.align()?;
        Ok(PropertyRecord { name_offset, data })
    }
}

/// Resolve a property name from the strings block.
///
/// `record_offset` is the blob offset of the property record, used when the
/// name offset is out of range.
pub fn string_at(
    strings_block: &[u8],
    name_offset: usize,
    record_offset: usize,
) -> Result<String, FormatError> {
    let tail = strings_block
        .get(name_offset..)
        .filter(|tail| !tail.is_empty())
        .ok_or(FormatError::StringOffsetOutOfRange {
            offset: record_offset,
            name_offset,
        })?;
    let nul = tail
        .iter()
        .position(|&b| b == 0)
        .ok_or(FormatError::InvalidName {
            offset: record_offset,
        })?;
    core::str::from_utf8(&tail[..nul])
        .map(str::to_string)
        .map_err(|_| FormatError::InvalidName {
            offset: record_offset,
        })
}
