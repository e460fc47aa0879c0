//! Decoded value and record types

use crate::error::Warning;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of an object within a storage unit: logging origin, copy number
/// and identifier.
///
/// `(set type, name)` is the global identity key; references between records
/// are stored as names and resolved through the catalog, never as direct
/// pointers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectName {
    /// Logging origin the object belongs to
    pub origin: u32,
    /// Copy number, distinguishing duplicated objects of one origin
    pub copy: u8,
    /// Object identifier
    pub identifier: String,
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}, {})", self.identifier, self.origin, self.copy)
    }
}

/// Reference to an object in another set
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    /// Type of the set holding the referenced object
    pub set_type: String,
    /// Identity of the referenced object
    pub name: ObjectName,
}

/// Reference to a single attribute of an object in another set
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeRef {
    /// Type of the set holding the referenced object
    pub set_type: String,
    /// Identity of the referenced object
    pub name: ObjectName,
    /// Label of the referenced attribute
    pub label: String,
}

/// Time zone nibble of a date-time value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeZone {
    /// Greenwich mean time
    Gmt,
    /// Local standard time
    LocalStandard,
    /// Local daylight savings time
    LocalDaylight,
    /// Reserved nibble value
    Other(u8),
}

impl From<u8> for TimeZone {
    fn from(nibble: u8) -> Self {
        match nibble {
            0 => TimeZone::Gmt,
            1 => TimeZone::LocalStandard,
            2 => TimeZone::LocalDaylight,
            n => TimeZone::Other(n),
        }
    }
}

/// Date-time as stored on the wire.
///
/// Years are absolute; the raw byte counts years since 1900.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateTime {
    /// Full year
    pub year: u16,
    /// Time zone of the stamp
    pub tz: TimeZone,
    /// Month, 1-12
    pub month: u8,
    /// Day of month, 1-31
    pub day: u8,
    /// Hour, 0-23
    pub hour: u8,
    /// Minute, 0-59
    pub minute: u8,
    /// Second, 0-59
    pub second: u8,
    /// Millisecond, 0-999
    pub millisecond: u16,
}

/// A single decoded value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// 1-byte signed integer
    I8(i8),
    /// 2-byte signed integer
    I16(i16),
    /// 4-byte signed integer
    I32(i32),
    /// 1-byte unsigned integer
    U8(u8),
    /// 2-byte unsigned integer
    U16(u16),
    /// 4-byte or variable-width unsigned integer
    U32(u32),
    /// Single-precision float
    F32(f32),
    /// Double-precision float
    F64(f64),
    /// Single-precision value with an absolute error bound
    F32Bound(f32, f32),
    /// Single-precision value with lower and upper error bounds
    F32Bound2(f32, f32, f32),
    /// Double-precision value with an absolute error bound
    F64Bound(f64, f64),
    /// Double-precision value with lower and upper error bounds
    F64Bound2(f64, f64, f64),
    /// Single-precision complex number, real then imaginary
    Complex32(f32, f32),
    /// Double-precision complex number, real then imaginary
    Complex64(f64, f64),
    /// Identifier, units or free-text string
    String(String),
    /// Date-time stamp
    DateTime(DateTime),
    /// Object identity
    Name(ObjectName),
    /// Reference to an object in another set
    ObjectRef(ObjectRef),
    /// Reference to an attribute of an object in another set
    AttributeRef(AttributeRef),
    /// Status flag
    Status(bool),
}

impl Value {
    /// Widen any non-negative integer variant to `u32`
    pub fn as_u32(&self) -> Option<u32> {
        match *self {
            Value::I8(v) => u32::try_from(v).ok(),
            Value::I16(v) => u32::try_from(v).ok(),
            Value::I32(v) => u32::try_from(v).ok(),
            Value::U8(v) => Some(u32::from(v)),
            Value::U16(v) => Some(u32::from(v)),
            Value::U32(v) => Some(v),
            _ => None,
        }
    }

    /// Widen any numeric variant to `f64`
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::I8(v) => Some(f64::from(v)),
            Value::I16(v) => Some(f64::from(v)),
            Value::I32(v) => Some(f64::from(v)),
            Value::U8(v) => Some(f64::from(v)),
            Value::U16(v) => Some(f64::from(v)),
            Value::U32(v) => Some(f64::from(v)),
            Value::F32(v) => Some(f64::from(v)),
            Value::F64(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow the string content of a string-valued variant
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the object identity of a name-valued variant
    pub fn as_name(&self) -> Option<&ObjectName> {
        match self {
            Value::Name(n) => Some(n),
            _ => None,
        }
    }
}

/// Layout declared by the storage unit label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageSetLayout {
    /// Record storage, the only layout defined for v1
    Record,
    /// Anything else, carried with the raw field text
    Unknown(String),
}

/// The fixed 80-byte ASCII header at the start of every storage unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageUnitLabel {
    /// Storage unit sequence number
    pub sequence: u32,
    /// Format version as (major, minor); major must be 1
    pub version: (u8, u8),
    /// Storage set layout
    pub layout: StorageSetLayout,
    /// Declared maximum visible record length
    pub max_record_length: u32,
    /// Storage set identifier, trailing blanks stripped
    pub identifier: String,
}

/// Classification of a logical record by its segment type code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordKind {
    /// File header set
    FileHeader,
    /// Origin set
    Origin,
    /// Axis set
    Axis,
    /// Channel set
    Channel,
    /// Frame set
    Frame,
    /// Static data set
    Static,
    /// Script set
    Script,
    /// Update set
    Update,
    /// Unformatted data identifier set
    Udi,
    /// Long name set
    LongName,
    /// Specification set
    Spec,
    /// Dictionary set
    Dict,
    /// Frame data
    FrameData,
    /// Unformatted data
    NoFormat,
    /// Reserved or undefined type code
    Unknown(u8),
}

impl RecordKind {
    /// Classify a segment type code given the record's explicit flag
    pub fn from_code(explicit: bool, code: u8) -> Self {
        if explicit {
            match code {
                0 => RecordKind::FileHeader,
                1 => RecordKind::Origin,
                2 => RecordKind::Axis,
                3 => RecordKind::Channel,
                4 => RecordKind::Frame,
                5 => RecordKind::Static,
                6 => RecordKind::Script,
                7 => RecordKind::Update,
                8 => RecordKind::Udi,
                9 => RecordKind::LongName,
                10 => RecordKind::Spec,
                11 => RecordKind::Dict,
                n => RecordKind::Unknown(n),
            }
        } else {
            match code {
                crate::constants::IFLR_FDATA => RecordKind::FrameData,
                crate::constants::IFLR_NOFORMAT => RecordKind::NoFormat,
                n => RecordKind::Unknown(n),
            }
        }
    }
}

/// A reassembled logical record
#[derive(Debug, Clone)]
pub struct LogicalRecord {
    /// Byte offset of the record's first segment header
    pub offset: usize,
    /// Classification derived from the explicit flag and type code
    pub kind: RecordKind,
    /// Whether the record is explicitly formatted
    pub explicit: bool,
    /// Whether any segment of the record was encrypted
    pub encrypted: bool,
    /// Concatenated segment bodies with per-segment trailers stripped.
    /// Encrypted bodies are carried raw, trailers included.
    pub body: Bytes,
    /// Checksum of the last segment that carried one; read, not verified,
    /// unless verification is opted into
    pub checksum: Option<u16>,
    /// Recoverable conditions observed while reassembling this record
    pub warnings: Vec<Warning>,
    /// Visible record bytes that remained when the first segment header was
    /// read; lets the catalog re-enter the stream at `offset`
    pub(crate) residual: usize,
}
