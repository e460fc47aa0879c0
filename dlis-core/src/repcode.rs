//! Representation codes and their decode rules
//!
//! The standard fixes 27 codes; dispatch is one closed enum with a decode
//! routine per variant. Byte layouts must match the standard exactly: the
//! legacy float formats decode to wrong magnitudes, not crashes, when the
//! formula is off, so every code is pinned by byte fixtures in the tests.

use crate::cursor::Cursor;
use crate::error::DlisError;
use crate::types::{AttributeRef, DateTime, ObjectName, ObjectRef, TimeZone, Value};
use serde::{Deserialize, Serialize};

/// A representation code as defined by the standard, 1 through 27
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum RepCode {
    /// Two-byte low-precision float
    Fshort = 1,
    /// IEEE 754 single precision
    Fsingl = 2,
    /// Single precision with an absolute error bound
    Fsing1 = 3,
    /// Single precision with lower and upper error bounds
    Fsing2 = 4,
    /// IBM System/360 hexadecimal float
    Isingl = 5,
    /// VAX F-floating
    Vsingl = 6,
    /// IEEE 754 double precision
    Fdoubl = 7,
    /// Double precision with an absolute error bound
    Fdoub1 = 8,
    /// Double precision with lower and upper error bounds
    Fdoub2 = 9,
    /// Single-precision complex
    Csingl = 10,
    /// Double-precision complex
    Cdoubl = 11,
    /// 1-byte signed integer
    Sshort = 12,
    /// 2-byte signed integer
    Snorm = 13,
    /// 4-byte signed integer
    Slong = 14,
    /// 1-byte unsigned integer
    Ushort = 15,
    /// 2-byte unsigned integer
    Unorm = 16,
    /// 4-byte unsigned integer
    Ulong = 17,
    /// Variable-width unsigned integer, 1, 2 or 4 bytes
    Uvari = 18,
    /// Length-prefixed restricted string
    Ident = 19,
    /// Length-prefixed free string
    Ascii = 20,
    /// Date-time stamp
    Dtime = 21,
    /// Logging origin number
    Origin = 22,
    /// Object identity
    Obname = 23,
    /// Object reference
    Objref = 24,
    /// Attribute reference
    Attref = 25,
    /// Status flag
    Status = 26,
    /// Units expression
    Units = 27,
}

impl TryFrom<u8> for RepCode {
    type Error = DlisError;

    fn try_from(code: u8) -> Result<Self, DlisError> {
        use RepCode::*;
        Ok(match code {
            1 => Fshort,
            2 => Fsingl,
            3 => Fsing1,
            4 => Fsing2,
            5 => Isingl,
            6 => Vsingl,
            7 => Fdoubl,
            8 => Fdoub1,
            9 => Fdoub2,
            10 => Csingl,
            11 => Cdoubl,
            12 => Sshort,
            13 => Snorm,
            14 => Slong,
            15 => Ushort,
            16 => Unorm,
            17 => Ulong,
            18 => Uvari,
            19 => Ident,
            20 => Ascii,
            21 => Dtime,
            22 => Origin,
            23 => Obname,
            24 => Objref,
            25 => Attref,
            26 => Status,
            27 => Units,
            n => return Err(DlisError::UnsupportedRepresentationCode(n)),
        })
    }
}

impl RepCode {
    /// Width in bytes for fixed-size codes, `None` for variable-width ones
    pub const fn fixed_size(&self) -> Option<usize> {
        use RepCode::*;
        match self {
            Sshort | Ushort | Status => Some(1),
            Fshort | Snorm | Unorm => Some(2),
            Fsingl | Isingl | Vsingl | Slong | Ulong => Some(4),
            Fdoubl | Fsing1 | Csingl | Dtime => Some(8),
            Fsing2 => Some(12),
            Fdoub1 | Cdoubl => Some(16),
            Fdoub2 => Some(24),
            Uvari | Ident | Ascii | Origin | Obname | Objref | Attref | Units => None,
        }
    }

    /// Decode one value of this code off the cursor
    pub fn decode(&self, cursor: &mut Cursor<'_>) -> Result<Value, DlisError> {
        use RepCode::*;
        Ok(match self {
            Fshort => Value::F32(read_fshort(cursor)?),
            Fsingl => Value::F32(cursor.read_f32()?),
            Fsing1 => Value::F32Bound(cursor.read_f32()?, cursor.read_f32()?),
            Fsing2 => Value::F32Bound2(
                cursor.read_f32()?,
                cursor.read_f32()?,
                cursor.read_f32()?,
            ),
            Isingl => Value::F32(read_isingl(cursor)?),
            Vsingl => Value::F32(read_vsingl(cursor)?),
            Fdoubl => Value::F64(cursor.read_f64()?),
            Fdoub1 => Value::F64Bound(cursor.read_f64()?, cursor.read_f64()?),
            Fdoub2 => Value::F64Bound2(
                cursor.read_f64()?,
                cursor.read_f64()?,
                cursor.read_f64()?,
            ),
            Csingl => Value::Complex32(cursor.read_f32()?, cursor.read_f32()?),
            Cdoubl => Value::Complex64(cursor.read_f64()?, cursor.read_f64()?),
            Sshort => Value::I8(cursor.read_i8()?),
            Snorm => Value::I16(cursor.read_i16()?),
            Slong => Value::I32(cursor.read_i32()?),
            Ushort => Value::U8(cursor.read_u8()?),
            Unorm => Value::U16(cursor.read_u16()?),
            Ulong => Value::U32(cursor.read_u32()?),
            Uvari | Origin => Value::U32(read_uvari(cursor)?),
            Ident | Units => Value::String(read_ident(cursor)?),
            Ascii => Value::String(read_ascii(cursor)?),
            Dtime => Value::DateTime(read_dtime(cursor)?),
            Obname => Value::Name(read_obname(cursor)?),
            Objref => Value::ObjectRef(read_objref(cursor)?),
            Attref => Value::AttributeRef(read_attref(cursor)?),
            Status => Value::Status(cursor.read_u8()? != 0),
        })
    }

    /// Decode `count` consecutive values of this code
    pub fn decode_array(
        &self,
        cursor: &mut Cursor<'_>,
        count: u32,
    ) -> Result<Vec<Value>, DlisError> {
        let mut out = Vec::with_capacity(count as usize);
        for _ in 0..count {
            out.push(self.decode(cursor)?);
        }
        Ok(out)
    }
}

/// Variable-width unsigned integer: the top bits of the first byte select a
/// 1, 2 or 4 byte encoding with 7, 14 or 30 value bits.
pub(crate) fn read_uvari(cursor: &mut Cursor<'_>) -> Result<u32, DlisError> {
    let first = cursor.read_u8()?;
    if first & 0x80 == 0 {
        return Ok(u32::from(first));
    }
    if first & 0x40 == 0 {
        let second = cursor.read_u8()?;
        return Ok(u32::from(first & 0x3F) << 8 | u32::from(second));
    }
    let rest = cursor.read_bytes(3)?;
    Ok(u32::from(first & 0x3F) << 24
        | u32::from(rest[0]) << 16
        | u32::from(rest[1]) << 8
        | u32::from(rest[2]))
}

/// Short string: 1-byte length then that many bytes
pub(crate) fn read_ident(cursor: &mut Cursor<'_>) -> Result<String, DlisError> {
    let len = usize::from(cursor.read_u8()?);
    Ok(String::from_utf8_lossy(cursor.read_bytes(len)?).into_owned())
}

/// Long string: variable-width length then that many bytes
fn read_ascii(cursor: &mut Cursor<'_>) -> Result<String, DlisError> {
    let len = read_uvari(cursor)? as usize;
    Ok(String::from_utf8_lossy(cursor.read_bytes(len)?).into_owned())
}

fn read_dtime(cursor: &mut Cursor<'_>) -> Result<DateTime, DlisError> {
    let b = cursor.read_bytes(6)?;
    let millisecond = cursor.read_u16()?;
    Ok(DateTime {
        year: 1900 + u16::from(b[0]),
        tz: TimeZone::from(b[1] >> 4),
        month: b[1] & 0x0F,
        day: b[2],
        hour: b[3],
        minute: b[4],
        second: b[5],
        millisecond,
    })
}

/// Object identity: origin, copy number, identifier
pub(crate) fn read_obname(cursor: &mut Cursor<'_>) -> Result<ObjectName, DlisError> {
    let origin = read_uvari(cursor)?;
    let copy = cursor.read_u8()?;
    let identifier = read_ident(cursor)?;
    Ok(ObjectName {
        origin,
        copy,
        identifier,
    })
}

fn read_objref(cursor: &mut Cursor<'_>) -> Result<ObjectRef, DlisError> {
    let set_type = read_ident(cursor)?;
    let name = read_obname(cursor)?;
    Ok(ObjectRef { set_type, name })
}

fn read_attref(cursor: &mut Cursor<'_>) -> Result<AttributeRef, DlisError> {
    let set_type = read_ident(cursor)?;
    let name = read_obname(cursor)?;
    let label = read_ident(cursor)?;
    Ok(AttributeRef {
        set_type,
        name,
        label,
    })
}

/// Two-byte float: sign, 11-bit two's-complement fraction, 4-bit exponent.
/// V = (-1)^s * (M / 2^11) * 2^E
fn read_fshort(cursor: &mut Cursor<'_>) -> Result<f32, DlisError> {
    let raw = cursor.read_u16()?;
    let exponent = i32::from(raw & 0x000F);
    let mut mantissa = (raw & 0x7FF0) >> 4;
    let negative = raw & 0x8000 != 0;
    if negative {
        mantissa = (!mantissa & 0x07FF) + 1;
    }
    let magnitude = f32::from(mantissa) / 2048.0 * 2f32.powi(exponent);
    Ok(if negative { -magnitude } else { magnitude })
}

/// IBM System/360 float: sign, 7-bit excess-64 base-16 exponent, 24-bit
/// fraction. V = (-1)^s * (F / 2^24) * 16^(E - 64)
fn read_isingl(cursor: &mut Cursor<'_>) -> Result<f32, DlisError> {
    let raw = cursor.read_u32()?;
    let exponent = ((raw >> 24) & 0x7F) as i32;
    let fraction = (raw & 0x00FF_FFFF) as f32 / 16_777_216.0;
    let magnitude = fraction * 16f32.powi(exponent - 64);
    Ok(if raw & 0x8000_0000 != 0 {
        -magnitude
    } else {
        magnitude
    })
}

/// VAX F-float. The two 16-bit words sit on the wire in VAX byte order, so
/// the 32-bit pattern is assembled as (b1, b0, b3, b2). Excess-128 exponent
/// with a hidden leading 0.1 bit; a zero exponent means zero.
fn read_vsingl(cursor: &mut Cursor<'_>) -> Result<f32, DlisError> {
    let b = cursor.read_bytes(4)?;
    let v = u32::from(b[1]) << 24 | u32::from(b[0]) << 16 | u32::from(b[3]) << 8 | u32::from(b[2]);
    let exponent = ((v >> 23) & 0xFF) as i32;
    if exponent == 0 {
        return Ok(0.0);
    }
    let fraction = 0.5 + (v & 0x007F_FFFF) as f32 / 16_777_216.0;
    let magnitude = fraction * 2f32.powi(exponent - 128);
    Ok(if v & 0x8000_0000 != 0 {
        -magnitude
    } else {
        magnitude
    })
}
