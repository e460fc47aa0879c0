//! Indirectly formatted logical records: frame data
//!
//! A frame data body names its frame, carries a frame number, then packs one
//! slot per channel in the order the frame declares them. The byte layout is
//! fixed entirely by CHANNEL metadata decoded earlier, so a mismatch between
//! the declared widths and the record length signals metadata/data
//! desynchronization and is never papered over.

use crate::cursor::Cursor;
use crate::eflr::Object;
use crate::error::DlisError;
use crate::repcode::{self, RepCode};
use crate::types::{ObjectName, Value};
use serde::{Deserialize, Serialize};

/// Per-channel slice of a frame row layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSpec {
    /// Identity of the channel object
    pub name: ObjectName,
    /// Representation code of the channel's elements
    pub repcode: RepCode,
    /// Elements per row, the product of the channel's dimension
    pub count: u32,
    /// Units of the measured quantity, when declared
    pub units: Option<String>,
}

impl ChannelSpec {
    /// Derive the layout slice from a CHANNEL object.
    ///
    /// REPRESENTATION-CODE defaults to fsingl and DIMENSION to a single
    /// element when the object leaves them unset.
    pub fn from_object(object: &Object) -> Result<Self, DlisError> {
        let repcode = match first_u32(object, "REPRESENTATION-CODE") {
            Some(code) if code <= u32::from(u8::MAX) => RepCode::try_from(code as u8)?,
            Some(_) => return Err(DlisError::UnsupportedRepresentationCode(u8::MAX)),
            None => RepCode::Fsingl,
        };

        let count = object
            .attribute("DIMENSION")
            .and_then(|a| a.value.as_ref())
            .map(|dims| dims.iter().filter_map(Value::as_u32).product())
            .filter(|n| *n > 0)
            .unwrap_or(1);

        let units = object
            .attribute("UNITS")
            .and_then(|a| a.value.as_ref())
            .and_then(|v| v.first())
            .and_then(|v| v.as_str().map(str::to_owned));

        Ok(Self {
            name: object.name.clone(),
            repcode,
            count,
            units,
        })
    }

    /// Bytes one row slot occupies, when the code is fixed-width
    fn fixed_len(&self) -> Option<usize> {
        self.repcode.fixed_size().map(|w| w * self.count as usize)
    }
}

fn first_u32(object: &Object, label: &str) -> Option<u32> {
    object
        .attribute(label)?
        .value
        .as_ref()?
        .first()?
        .as_u32()
}

/// Channel references declared by a FRAME object, in declared order
pub fn frame_channel_names(frame: &Object) -> Vec<ObjectName> {
    frame
        .attribute("CHANNELS")
        .and_then(|a| a.value.as_ref())
        .map(|values| values.iter().filter_map(|v| v.as_name().cloned()).collect())
        .unwrap_or_default()
}

/// One decoded frame data record: a single row of the frame's table
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRow {
    /// Frame the row belongs to
    pub frame: ObjectName,
    /// Frame number carried by the record
    pub number: u32,
    /// One slot per channel, each holding that channel's elements. The
    /// first slot is the frame index.
    pub slots: Vec<Vec<Value>>,
}

/// Rows of one frame concatenated across records
#[derive(Debug, Clone, PartialEq)]
pub struct FrameTable {
    /// Channel layout the rows were decoded against, in declared order
    pub channels: Vec<ChannelSpec>,
    /// Rows in record order
    pub rows: Vec<FrameRow>,
}

impl FrameTable {
    /// All values of one channel across rows, flattened in row order
    pub fn column(&self, channel: usize) -> Vec<Value> {
        self.rows
            .iter()
            .flat_map(|row| row.slots[channel].iter().cloned())
            .collect()
    }
}

/// Read only the frame reference off a frame data body.
///
/// The catalog uses this to group records per frame without paying for a
/// full decode.
pub fn peek_frame_name(body: &[u8]) -> Result<ObjectName, DlisError> {
    repcode::read_obname(&mut Cursor::new(body))
}

/// Decode one frame data record against its frame's channel layout.
///
/// When every channel is fixed-width the declared byte total is checked
/// against the body up front; either way the decode must land exactly on
/// the record end, or the row is rejected with
/// [`DlisError::FrameLayoutMismatch`].
pub fn parse_fdata(body: &[u8], channels: &[ChannelSpec]) -> Result<FrameRow, DlisError> {
    let mut cursor = Cursor::new(body);
    let frame = repcode::read_obname(&mut cursor)?;
    let number = repcode::read_uvari(&mut cursor)?;

    let slots_start = cursor.position();
    let slot_bytes = cursor.remaining();

    if let Some(expected) = channels.iter().map(ChannelSpec::fixed_len).sum::<Option<usize>>() {
        if expected != slot_bytes {
            return Err(DlisError::FrameLayoutMismatch {
                frame: frame.to_string(),
                expected,
                actual: slot_bytes,
            });
        }
    }

    let mut slots = Vec::with_capacity(channels.len());
    for channel in channels {
        match channel.repcode.decode_array(&mut cursor, channel.count) {
            Ok(values) => slots.push(values),
            Err(DlisError::OutOfBounds { at, wanted, .. }) => {
                return Err(DlisError::FrameLayoutMismatch {
                    frame: frame.to_string(),
                    expected: at + wanted - slots_start,
                    actual: slot_bytes,
                })
            }
            Err(e) => return Err(e),
        }
    }

    if cursor.remaining() != 0 {
        return Err(DlisError::FrameLayoutMismatch {
            frame: frame.to_string(),
            expected: cursor.position() - slots_start,
            actual: slot_bytes,
        });
    }

    Ok(FrameRow {
        frame,
        number,
        slots,
    })
}
