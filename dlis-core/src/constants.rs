//! Constants and limits for the DLIS v1 physical format

use serde::{Deserialize, Serialize};

/// Size of the storage unit label in bytes
pub const SUL_LEN: usize = 80;

/// Size of a visible record header: length (2) + padding marker (1) + version (1)
pub const VRH_LEN: usize = 4;

/// Size of a logical record segment header: length (2) + attributes (1) + type (1)
pub const LRSH_LEN: usize = 4;

/// Padding byte preceding the format version in a visible record header
pub const VR_PAD_MARKER: u8 = 0xFF;

/// The only format version this decoder accepts
pub const FORMAT_VERSION: u8 = 1;

/// Size of the segment checksum trailer in bytes
pub const CHECKSUM_LEN: usize = 2;

/// Size of the segment trailing-length trailer in bytes
pub const TRAILING_LENGTH_LEN: usize = 2;

/// Segment type code of frame data in indirectly formatted records
pub const IFLR_FDATA: u8 = 0;

/// Segment type code of unformatted data in indirectly formatted records
pub const IFLR_NOFORMAT: u8 = 1;

/// Segment attribute bitfield (stored as a single byte in the segment header)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentAttributes(u8);

impl SegmentAttributes {
    /// No flags set
    pub const NONE: u8 = 0b0000_0000;

    /// Segment belongs to an explicitly formatted logical record
    pub const EXPLICIT: u8 = 0b1000_0000;

    /// Segment continues a segment from a previous visible record
    pub const HAS_PREDECESSOR: u8 = 0b0100_0000;

    /// Segment continues into a segment of a following visible record
    pub const HAS_SUCCESSOR: u8 = 0b0010_0000;

    /// Segment body is encrypted
    pub const IS_ENCRYPTED: u8 = 0b0001_0000;

    /// Segment body starts with an encryption packet
    pub const HAS_ENCRYPTION_PACKET: u8 = 0b0000_1000;

    /// Segment carries a 2-byte checksum before the trailing length
    pub const HAS_CHECKSUM: u8 = 0b0000_0100;

    /// Segment ends with a 2-byte copy of its own length
    pub const HAS_TRAILING_LENGTH: u8 = 0b0000_0010;

    /// Segment body ends with pad bytes; the final pad byte holds their count
    pub const IS_PADDED: u8 = 0b0000_0001;

    /// Create new attributes from the raw byte
    pub const fn new(attrs: u8) -> Self {
        Self(attrs)
    }

    /// Get the raw attribute byte
    pub const fn as_u8(&self) -> u8 {
        self.0
    }

    /// Check if the segment belongs to an explicitly formatted record
    pub const fn is_explicit(&self) -> bool {
        (self.0 & Self::EXPLICIT) != 0
    }

    /// Check if the segment continues a previous segment
    pub const fn has_predecessor(&self) -> bool {
        (self.0 & Self::HAS_PREDECESSOR) != 0
    }

    /// Check if the segment continues into a following segment
    pub const fn has_successor(&self) -> bool {
        (self.0 & Self::HAS_SUCCESSOR) != 0
    }

    /// Check if the segment body is encrypted
    pub const fn is_encrypted(&self) -> bool {
        (self.0 & Self::IS_ENCRYPTED) != 0
    }

    /// Check if the segment body starts with an encryption packet
    pub const fn has_encryption_packet(&self) -> bool {
        (self.0 & Self::HAS_ENCRYPTION_PACKET) != 0
    }

    /// Check if the segment carries a checksum trailer
    pub const fn has_checksum(&self) -> bool {
        (self.0 & Self::HAS_CHECKSUM) != 0
    }

    /// Check if the segment ends with a trailing length
    pub const fn has_trailing_length(&self) -> bool {
        (self.0 & Self::HAS_TRAILING_LENGTH) != 0
    }

    /// Check if the segment body ends with pad bytes
    pub const fn is_padded(&self) -> bool {
        (self.0 & Self::IS_PADDED) != 0
    }
}

impl Default for SegmentAttributes {
    fn default() -> Self {
        Self(Self::NONE)
    }
}
