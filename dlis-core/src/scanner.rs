//! Visible record walking and logical record reassembly
//!
//! The physical stream is a storage unit label followed by visible records;
//! each visible record holds logical record segments, and a logical record
//! is the concatenation of a segment chain that may cross visible record
//! boundaries. Segment interpretation depends on flags carried from the
//! previous segment, so the walk is strictly sequential.

use crate::constants::{
    SegmentAttributes, CHECKSUM_LEN, FORMAT_VERSION, LRSH_LEN, SUL_LEN, TRAILING_LENGTH_LEN,
    VRH_LEN, VR_PAD_MARKER,
};
use crate::cursor::Cursor;
use crate::error::{DlisError, Warning};
use crate::types::{LogicalRecord, RecordKind, StorageSetLayout, StorageUnitLabel};
use bytes::Bytes;

#[cfg(feature = "logging")]
use tracing::{debug, warn};

/// Knobs for the physical-layer walk
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    /// Verify segment checksums instead of accepting them unchecked
    pub verify_checksums: bool,
}

/// Parse the fixed 80-byte storage unit label at the start of a file.
///
/// The sequence number, version and maximum record length are ASCII fields;
/// a major version other than 1 is a [`DlisError::MalformedFile`]. A layout
/// other than `RECORD` is carried as [`StorageSetLayout::Unknown`] rather
/// than rejected.
pub fn parse_sul(data: &[u8]) -> Result<StorageUnitLabel, DlisError> {
    if data.len() < SUL_LEN {
        return Err(DlisError::MalformedFile(format!(
            "storage unit label needs {} bytes, file has {}",
            SUL_LEN,
            data.len()
        )));
    }

    let sequence = ascii_number(&data[0..4], "storage unit sequence number")?;

    let version = &data[4..9];
    if version[0] != b'V' || version[2] != b'.' {
        return Err(DlisError::MalformedFile(format!(
            "unparsable version field {:?} in storage unit label",
            String::from_utf8_lossy(version)
        )));
    }
    let major = ascii_number(&version[1..2], "major version")? as u8;
    let minor = ascii_number(&version[3..5], "minor version")? as u8;
    if major != 1 {
        return Err(DlisError::MalformedFile(format!(
            "unsupported DLIS version {major}.{minor:02}"
        )));
    }

    let layout_raw = trim_field(&data[9..15]);
    let layout = if layout_raw == "RECORD" {
        StorageSetLayout::Record
    } else {
        StorageSetLayout::Unknown(layout_raw.to_string())
    };

    let max_record_length = ascii_number(&data[15..20], "maximum record length")?;
    let identifier = trim_field(&data[20..SUL_LEN]).to_string();

    Ok(StorageUnitLabel {
        sequence,
        version: (major, minor),
        layout,
        max_record_length,
        identifier,
    })
}

fn trim_field(bytes: &[u8]) -> std::borrow::Cow<'_, str> {
    let text = String::from_utf8_lossy(bytes);
    match text {
        std::borrow::Cow::Borrowed(s) => {
            std::borrow::Cow::Borrowed(s.trim_matches(|c| c == ' ' || c == '\0'))
        }
        std::borrow::Cow::Owned(s) => {
            std::borrow::Cow::Owned(s.trim_matches(|c| c == ' ' || c == '\0').to_string())
        }
    }
}

fn ascii_number(bytes: &[u8], what: &str) -> Result<u32, DlisError> {
    trim_field(bytes).parse().map_err(|_| {
        DlisError::MalformedFile(format!(
            "{} is not numeric: {:?}",
            what,
            String::from_utf8_lossy(bytes)
        ))
    })
}

/// Lazy iterator over reassembled logical records.
///
/// The sequence is finite and not restartable: segment boundaries depend on
/// sequential header parsing, so each traversal constructs a fresh iterator
/// and walks from the start. Scoped record failures are yielded as errors
/// and the walk continues; a framing failure is yielded once and ends the
/// iterator. Dropping the iterator early is the only cancellation.
pub struct LogicalRecords {
    data: Bytes,
    options: DecodeOptions,
    pos: usize,
    vr_remaining: usize,
    record_offset: usize,
    done: bool,
}

impl LogicalRecords {
    /// Iterate the records of a complete storage unit. The 80-byte storage
    /// unit label is skipped, not validated; see [`parse_sul`].
    pub fn new(data: Bytes, options: DecodeOptions) -> Self {
        let pos = SUL_LEN.min(data.len());
        Self {
            data,
            options,
            pos,
            vr_remaining: 0,
            record_offset: 0,
            done: false,
        }
    }

    /// Iterate a byte range that starts directly at a visible record, with
    /// no storage unit label in front.
    pub fn without_label(data: Bytes, options: DecodeOptions) -> Self {
        Self {
            data,
            options,
            pos: 0,
            vr_remaining: 0,
            record_offset: 0,
            done: false,
        }
    }

    /// Offset of the record the iterator most recently started reading.
    /// Pairs an error item with the record it belongs to.
    pub fn record_offset(&self) -> usize {
        self.record_offset
    }
}

impl Iterator for LogicalRecords {
    type Item = Result<LogicalRecord, DlisError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        // advance into a visible record that still has segment bytes
        while self.vr_remaining == 0 {
            if self.pos >= self.data.len() {
                self.done = true;
                return None;
            }
            if let Err(e) = enter_visible_record(&self.data, &mut self.pos, &mut self.vr_remaining)
            {
                self.done = true;
                self.record_offset = self.pos;
                return Some(Err(e));
            }
        }

        self.record_offset = self.pos;
        match read_record(
            &self.data,
            &mut self.pos,
            &mut self.vr_remaining,
            self.options,
        ) {
            Ok(record) => {
                #[cfg(feature = "logging")]
                debug!(
                    "reassembled {:?} record at offset {} ({} body bytes)",
                    record.kind,
                    record.offset,
                    record.body.len()
                );
                Some(Ok(record))
            }
            Err(e) => {
                if e.is_fatal() {
                    self.done = true;
                }
                #[cfg(feature = "logging")]
                warn!("record at offset {} failed: {}", self.record_offset, e);
                Some(Err(e))
            }
        }
    }
}

/// Validate a visible record header and enter its body.
fn enter_visible_record(
    data: &Bytes,
    pos: &mut usize,
    vr_remaining: &mut usize,
) -> Result<(), DlisError> {
    let mut cursor = Cursor::new(&data[*pos..]);
    let (length, pad, version) = match (cursor.read_u16(), cursor.read_u8(), cursor.read_u8()) {
        (Ok(l), Ok(p), Ok(v)) => (usize::from(l), p, v),
        _ => {
            return Err(DlisError::MalformedFile(format!(
                "truncated visible record header at offset {pos}"
            )))
        }
    };

    if pad != VR_PAD_MARKER || version != FORMAT_VERSION {
        return Err(DlisError::MalformedFile(format!(
            "visible record at offset {pos} has format marker {pad:#04x} {version:#04x}, \
             expected 0xff 0x01"
        )));
    }
    if length < VRH_LEN {
        return Err(DlisError::MalformedFile(format!(
            "visible record at offset {pos} declares {length} bytes, shorter than its header"
        )));
    }
    if *pos + length > data.len() {
        return Err(DlisError::MalformedFile(format!(
            "visible record at offset {} declares {} bytes, only {} left",
            pos,
            length,
            data.len() - *pos
        )));
    }

    *pos += VRH_LEN;
    *vr_remaining = length - VRH_LEN;
    Ok(())
}

/// Reassemble one logical record from the segment chain starting at `pos`.
///
/// `pos` and `vr_remaining` always advance past the full chain, even when a
/// scoped error is returned, so the caller stays synchronized for the next
/// record.
pub(crate) fn read_record(
    data: &Bytes,
    pos: &mut usize,
    vr_remaining: &mut usize,
    options: DecodeOptions,
) -> Result<LogicalRecord, DlisError> {
    let offset = *pos;
    let residual = *vr_remaining;
    let mut body = Vec::new();
    let mut warnings = Vec::new();
    let mut checksum = None;
    let mut explicit = false;
    let mut encrypted = false;
    let mut type_code = 0u8;
    let mut first = true;
    let mut failure: Option<DlisError> = None;

    loop {
        if *vr_remaining == 0 {
            // the chain continues in the next visible record
            enter_visible_record(data, pos, vr_remaining)?;
        }

        let segment_offset = *pos;
        if *vr_remaining < LRSH_LEN {
            return Err(DlisError::MalformedFile(format!(
                "segment header at offset {segment_offset} crosses a visible record boundary"
            )));
        }

        let mut cursor = Cursor::new(&data[*pos..]);
        let (length, attrs, code) = match (cursor.read_u16(), cursor.read_u8(), cursor.read_u8()) {
            (Ok(l), Ok(a), Ok(c)) => (usize::from(l), SegmentAttributes::new(a), c),
            _ => {
                return Err(DlisError::MalformedFile(format!(
                    "truncated segment header at offset {segment_offset}"
                )))
            }
        };

        if length < LRSH_LEN {
            return Err(DlisError::MalformedFile(format!(
                "segment at offset {segment_offset} declares {length} bytes, \
                 shorter than its header"
            )));
        }
        if length > *vr_remaining {
            return Err(DlisError::MalformedFile(format!(
                "segment at offset {} declares {} bytes, visible record has {}",
                segment_offset, length, vr_remaining
            )));
        }

        if first {
            explicit = attrs.is_explicit();
            type_code = code;
            first = false;
        }
        if attrs.has_encryption_packet() && !attrs.is_encrypted() {
            warnings.push(Warning::EncryptionPacket);
        }

        let segment = &data[*pos + LRSH_LEN..*pos + length];
        *pos += length;
        *vr_remaining -= length;

        if attrs.is_encrypted() {
            // carried raw, trailers included; never interpreted
            encrypted = true;
            body.extend_from_slice(segment);
        } else {
            match strip_trailers(segment, segment_offset, attrs, options) {
                Ok((payload, segment_checksum)) => {
                    if segment_checksum.is_some() {
                        checksum = segment_checksum;
                    }
                    body.extend_from_slice(payload);
                }
                // keep consuming the chain so the walk stays synchronized
                Err(e) if failure.is_none() => failure = Some(e),
                Err(_) => {}
            }
        }

        if !attrs.has_successor() {
            break;
        }
    }

    if let Some(e) = failure {
        return Err(e);
    }

    if encrypted {
        warnings.push(Warning::SkippedEncryptedRecord { offset });
    }

    Ok(LogicalRecord {
        offset,
        kind: RecordKind::from_code(explicit, type_code),
        explicit,
        encrypted,
        body: Bytes::from(body),
        checksum,
        warnings,
        residual,
    })
}

/// Drop a segment's trailers in wire order: trailing length, checksum, then
/// pad bytes counted by the final pad byte. Returns the remaining payload
/// and the stored checksum, if any.
fn strip_trailers(
    segment: &[u8],
    segment_offset: usize,
    attrs: SegmentAttributes,
    options: DecodeOptions,
) -> Result<(&[u8], Option<u16>), DlisError> {
    let mut end = segment.len();
    let mut checksum = None;

    if attrs.has_trailing_length() {
        if end < TRAILING_LENGTH_LEN {
            return Err(DlisError::MalformedStructure(format!(
                "segment at offset {segment_offset} is too short for its trailing length"
            )));
        }
        end -= TRAILING_LENGTH_LEN;
    }

    if attrs.has_checksum() {
        if end < CHECKSUM_LEN {
            return Err(DlisError::MalformedStructure(format!(
                "segment at offset {segment_offset} is too short for its checksum"
            )));
        }
        let stored = u16::from_be_bytes([segment[end - 2], segment[end - 1]]);
        end -= CHECKSUM_LEN;
        if options.verify_checksums {
            let actual = segment_checksum(&segment[..end]);
            if actual != stored {
                return Err(DlisError::ChecksumMismatch {
                    expected: stored,
                    actual,
                });
            }
        }
        checksum = Some(stored);
    }

    if attrs.is_padded() {
        if end == 0 {
            return Err(DlisError::MalformedStructure(format!(
                "padded segment at offset {segment_offset} has an empty body"
            )));
        }
        let pad = usize::from(segment[end - 1]);
        if pad > end {
            return Err(DlisError::MalformedStructure(format!(
                "segment at offset {segment_offset} declares {pad} pad bytes, body has {end}"
            )));
        }
        end -= pad;
    }

    Ok((&segment[..end], checksum))
}

/// Ones'-complement sum of big-endian 16-bit words; an odd trailing byte is
/// zero-padded. Used only when checksum verification is opted into.
pub(crate) fn segment_checksum(body: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    let mut chunks = body.chunks_exact(2);
    for chunk in &mut chunks {
        sum += u32::from(u16::from_be_bytes([chunk[0], chunk[1]]));
    }
    if let &[last] = chunks.remainder() {
        sum += u32::from(u16::from_be_bytes([last, 0]));
    }
    while sum > 0xFFFF {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    sum as u16
}

/// Re-read a single logical record at a known offset.
///
/// `residual` is the number of visible record bytes that remained when the
/// record's first segment header was read, as captured during the initial
/// walk. Starting anywhere else desynchronizes the segment chain.
pub(crate) fn read_record_at(
    data: &Bytes,
    offset: usize,
    residual: usize,
    options: DecodeOptions,
) -> Result<LogicalRecord, DlisError> {
    let mut pos = offset;
    let mut vr_remaining = residual;
    read_record(data, &mut pos, &mut vr_remaining, options)
}
