//! Error and warning types for DLIS decoding

/// Errors that can occur while decoding a DLIS byte stream
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DlisError {
    /// A read ran past the end of the addressed byte range
    #[error("read of {wanted} bytes at offset {at} exceeds {remaining} remaining")]
    OutOfBounds {
        /// Position the read started from.
        at: usize,
        /// The number of bytes requested.
        wanted: usize,
        /// The number of bytes actually left.
        remaining: usize,
    },

    /// The physical framing structure is corrupt; the file is unusable past
    /// this point
    #[error("malformed file: {0}")]
    MalformedFile(String),

    /// A single logical record has invalid internal structure
    #[error("malformed record structure: {0}")]
    MalformedStructure(String),

    /// Representation code outside the range defined by the standard
    #[error("invalid representation code {0}, expected 1 <= reprc <= 27")]
    UnsupportedRepresentationCode(u8),

    /// Frame data does not match the byte layout declared by its frame
    #[error("frame {frame}: layout declares {expected} bytes of channel data, record has {actual}")]
    FrameLayoutMismatch {
        /// The frame whose rows were being decoded.
        frame: String,
        /// Bytes the declared channel layout accounts for.
        expected: usize,
        /// Bytes the record body actually holds.
        actual: usize,
    },

    /// A referenced object or offset was never found in the storage unit
    #[error("unresolved reference to {kind} {name}")]
    UnresolvedReference {
        /// What kind of thing the reference points at.
        kind: &'static str,
        /// The identity that failed to resolve.
        name: String,
    },

    /// Segment checksum mismatch, reported only under
    /// [`DecodeOptions::verify_checksums`](crate::DecodeOptions)
    #[error("segment checksum mismatch: expected {expected:#06x}, got {actual:#06x}")]
    ChecksumMismatch {
        /// The checksum stored in the segment trailer.
        expected: u16,
        /// The checksum computed over the segment body.
        actual: u16,
    },
}

impl DlisError {
    /// Whether this error poisons the whole physical stream.
    ///
    /// Everything else is scoped to a single record, attribute or query and
    /// must not abort indexing of the rest of the file.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DlisError::MalformedFile(_))
    }
}

/// Recoverable conditions, attached to the record they occurred in
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Warning {
    /// An encrypted record was carried through without interpretation
    #[error("encrypted record at offset {offset} skipped")]
    SkippedEncryptedRecord {
        /// Offset of the record's first segment header.
        offset: usize,
    },

    /// A segment declared an encryption packet; the packet is not interpreted
    #[error("segment declares an encryption packet, left uninterpreted")]
    EncryptionPacket,

    /// SET:type not set, but must be non-null
    #[error("SET:type not set, but must be non-null")]
    SetTypeMissing,

    /// Template ATTRIB:label not set, but must be non-null
    #[error("template ATTRIB:label not set, but must be non-null")]
    TemplateLabelMissing,

    /// ABSATR component found in an object template
    #[error("ABSATR in object template - skipping")]
    AbsentInTemplate,

    /// OBJECT:name not set, but must be non-null
    #[error("OBJECT:name not set, but must be non-null")]
    ObjectNameMissing,

    /// ATTRIB:label set on an object attribute, but must be null
    #[error("ATTRIB:label set, but must be null - was {0}")]
    ObjectLabelSet(String),

    /// Storage unit label declares a layout other than record storage
    #[error("unknown storage set layout {0:?}, assuming record layout")]
    UnknownStorageSetLayout(String),
}
