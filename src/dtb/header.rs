// ABOUTME: DTB header structure definitions and parsing
// ABOUTME: Handles the 40-byte device tree blob header format and block bounds checks

use super::error::FormatError;

/// The ten big-endian words at the start of every blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DtbHeader {
    pub magic: u32,
    /// Blob length claimed by the header
    pub totalsize: u32,
    pub off_dt_struct: u32,
    pub off_dt_strings: u32,
    /// Reservation block offset; reservations are not decoded
    pub off_mem_rsvmap: u32,
    pub version: u32,
    pub last_comp_version: u32,
    pub boot_cpuid_phys: u32,
    pub size_dt_strings: u32,
    /// Size of structure block (version 17 and later)
    pub size_dt_struct: u32,
}

impl DtbHeader {
    pub const MAGIC: u32 = 0xd00d_feed;

    /// Header size in bytes
    pub const SIZE: usize = 40;

    /// Oldest format version whose structure block this crate can walk
    pub const MIN_VERSION: u32 = 16;

    /// Newest format version this crate understands
    pub const MAX_COMPATIBLE_VERSION: u32 = 17;

    /// Read the header words, checking only length and magic
    pub fn parse(input: &[u8]) -> Result<(&[u8], Self), FormatError> {
        if input.len() < Self::SIZE {
            return Err(FormatError::Truncated {
                offset: input.len(),
                needed: Self::SIZE - input.len(),
            });
        }

        let mut fields = input[..Self::SIZE]
            .chunks_exact(4)
            .map(|chunk| u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
        let mut next = || fields.next().unwrap_or_default();

        let magic = next();
        if magic != Self::MAGIC {
            return Err(FormatError::InvalidMagic {
                offset: 0,
                found: magic,
            });
        }

        let header = DtbHeader {
            magic,
            totalsize: next(),
            off_dt_struct: next(),
            off_dt_strings: next(),
            off_mem_rsvmap: next(),
            version: next(),
            last_comp_version: next(),
            boot_cpuid_phys: next(),
            size_dt_strings: next(),
            size_dt_struct: next(),
        };

        Ok((&input[Self::SIZE..], header))
    }

    /// Check version and block placement against the buffer length.
    pub fn validate(&self, data_len: usize) -> Result<(), FormatError> {
        if self.version < Self::MIN_VERSION
            || self.last_comp_version > Self::MAX_COMPATIBLE_VERSION
        {
            return Err(FormatError::UnsupportedVersion {
                offset: 20,
                version: self.version,
                last_compatible: self.last_comp_version,
            });
        }

        let total = self.totalsize as usize;
        if total < Self::SIZE {
            return Err(FormatError::MalformedHeader {
                offset: 4,
                reason: "totalsize smaller than header",
            });
        }
        if total > data_len {
            return Err(FormatError::Truncated {
                offset: data_len,
                needed: total - data_len,
            });
        }

        let struct_range = self.struct_block_range();
        if struct_range.start < Self::SIZE || struct_range.end > total {
            return Err(FormatError::MalformedHeader {
                offset: 8,
                reason: "structure block outside blob",
            });
        }
        if struct_range.start % 4 != 0 {
            return Err(FormatError::Misaligned {
                offset: struct_range.start,
            });
        }

        let strings_range = self.strings_block_range();
        if strings_range.start < Self::SIZE || strings_range.end > total {
            return Err(FormatError::MalformedHeader {
                offset: 12,
                reason: "strings block outside blob",
            });
        }

        Ok(())
    }

    /// Byte range of the structure block.
    ///
    /// Version 16 blobs carry no structure size, so the block is assumed to run
    /// up to the strings block (or the end of the blob when strings come first).
    pub fn struct_block_range(&self) -> core::ops::Range<usize> {
        let start = self.off_dt_struct as usize;
        let end = if self.version >= 17 {
            start.saturating_add(self.size_dt_struct as usize)
        } else if self.off_dt_strings > self.off_dt_struct {
            self.off_dt_strings as usize
        } else {
            self.totalsize as usize
        };
        start..end
    }

    /// Byte range of the strings block.
    pub fn strings_block_range(&self) -> core::ops::Range<usize> {
        let start = self.off_dt_strings as usize;
        start..start.saturating_add(self.size_dt_strings as usize)
    }
}
