//! Reference encoder for building DLIS fixtures in tests.
//!
//! The crate itself never writes DLIS; everything here exists so tests can
//! craft byte-exact storage units and round-trip values against the decoder.
#![allow(dead_code)]

use dlis_core::constants::{FORMAT_VERSION, LRSH_LEN, VRH_LEN, VR_PAD_MARKER};
use dlis_core::repcode::RepCode;
use dlis_core::types::{DateTime, ObjectName, TimeZone, Value};

// component descriptor roles
pub const SET: u8 = 0b1110_0000;
pub const RSET: u8 = 0b1100_0000;
pub const RDSET: u8 = 0b1010_0000;
pub const OBJECT: u8 = 0b0110_0000;
pub const ATTRIB: u8 = 0b0010_0000;
pub const INVATR: u8 = 0b0100_0000;
pub const ABSATR: u8 = 0b0000_0000;

// descriptor format bits
pub const SET_HAS_TYPE: u8 = 0x10;
pub const SET_HAS_NAME: u8 = 0x08;
pub const OBJECT_HAS_NAME: u8 = 0x10;
pub const ATTR_HAS_LABEL: u8 = 0x10;
pub const ATTR_HAS_COUNT: u8 = 0x08;
pub const ATTR_HAS_REPRC: u8 = 0x04;
pub const ATTR_HAS_UNITS: u8 = 0x02;
pub const ATTR_HAS_VALUE: u8 = 0x01;

/// 80-byte storage unit label
pub fn sul(sequence: u32, identifier: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(80);
    out.extend_from_slice(format!("{sequence:>4}").as_bytes());
    out.extend_from_slice(b"V1.00");
    out.extend_from_slice(b"RECORD");
    out.extend_from_slice(b" 8192");
    out.extend_from_slice(format!("{identifier:<60}").as_bytes());
    assert_eq!(out.len(), 80);
    out
}

/// One logical record segment: header plus payload
pub fn segment(attrs: u8, record_type: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + LRSH_LEN);
    out.extend_from_slice(&((payload.len() + LRSH_LEN) as u16).to_be_bytes());
    out.push(attrs);
    out.push(record_type);
    out.extend_from_slice(payload);
    out
}

/// One visible record wrapping the given segments
pub fn visible_record(segments: &[Vec<u8>]) -> Vec<u8> {
    let body_len: usize = segments.iter().map(Vec::len).sum();
    let mut out = Vec::with_capacity(body_len + VRH_LEN);
    out.extend_from_slice(&((body_len + VRH_LEN) as u16).to_be_bytes());
    out.push(VR_PAD_MARKER);
    out.push(FORMAT_VERSION);
    for s in segments {
        out.extend_from_slice(s);
    }
    out
}

/// A whole storage unit: label plus one single-segment visible record per
/// `(attributes, type code, body)` triple
pub fn storage_unit(records: &[(u8, u8, Vec<u8>)]) -> Vec<u8> {
    let mut out = sul(1, "Default Storage Set");
    for (attrs, record_type, body) in records {
        out.extend_from_slice(&visible_record(&[segment(*attrs, *record_type, body)]));
    }
    out
}

/// Ones'-complement 16-bit sum matching the decoder's opt-in verification
pub fn checksum(body: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    for chunk in body.chunks(2) {
        let word = if chunk.len() == 2 {
            u16::from_be_bytes([chunk[0], chunk[1]])
        } else {
            u16::from_be_bytes([chunk[0], 0])
        };
        sum += u32::from(word);
    }
    while sum > 0xFFFF {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    sum as u16
}

/// Length-prefixed short string
pub fn ident(s: &str) -> Vec<u8> {
    let mut out = vec![s.len() as u8];
    out.extend_from_slice(s.as_bytes());
    out
}

/// Variable-width unsigned integer, smallest encoding
pub fn uvari(v: u32) -> Vec<u8> {
    if v < 0x80 {
        vec![v as u8]
    } else if v < 0x4000 {
        (0x8000 | v as u16).to_be_bytes().to_vec()
    } else {
        (0xC000_0000 | v).to_be_bytes().to_vec()
    }
}

/// Object identity: origin, copy, identifier
pub fn obname(name: &ObjectName) -> Vec<u8> {
    let mut out = uvari(name.origin);
    out.push(name.copy);
    out.extend_from_slice(&ident(&name.identifier));
    out
}

fn dtime(dt: &DateTime) -> Vec<u8> {
    let tz = match dt.tz {
        TimeZone::Gmt => 0,
        TimeZone::LocalStandard => 1,
        TimeZone::LocalDaylight => 2,
        TimeZone::Other(n) => n,
    };
    let mut out = vec![
        (dt.year - 1900) as u8,
        (tz << 4) | (dt.month & 0x0F),
        dt.day,
        dt.hour,
        dt.minute,
        dt.second,
    ];
    out.extend_from_slice(&dt.millisecond.to_be_bytes());
    out
}

fn fshort(value: f32) -> [u8; 2] {
    if value == 0.0 {
        return [0, 0];
    }
    let negative = value < 0.0;
    let mut magnitude = value.abs();
    let mut exponent = 0u16;
    while magnitude >= 1.0 && exponent < 15 {
        magnitude /= 2.0;
        exponent += 1;
    }
    let mut mantissa = (magnitude * 2048.0).round() as u16;
    if negative {
        mantissa = mantissa.wrapping_neg();
    }
    let raw = (u16::from(negative) << 15) | ((mantissa & 0x07FF) << 4) | (exponent & 0x0F);
    raw.to_be_bytes()
}

fn isingl(value: f32) -> [u8; 4] {
    if value == 0.0 {
        return [0; 4];
    }
    let sign = if value < 0.0 { 0x8000_0000u32 } else { 0 };
    let mut magnitude = value.abs();
    let mut exponent = 64i32;
    while magnitude >= 1.0 {
        magnitude /= 16.0;
        exponent += 1;
    }
    while magnitude < 0.0625 {
        magnitude *= 16.0;
        exponent -= 1;
    }
    let fraction = (magnitude * 16_777_216.0).round() as u32;
    (sign | ((exponent as u32) << 24) | (fraction & 0x00FF_FFFF)).to_be_bytes()
}

fn vsingl(value: f32) -> [u8; 4] {
    if value == 0.0 {
        return [0; 4];
    }
    let sign = if value < 0.0 { 0x8000_0000u32 } else { 0 };
    let mut magnitude = value.abs();
    let mut exponent = 128i32;
    while magnitude >= 1.0 {
        magnitude /= 2.0;
        exponent += 1;
    }
    while magnitude < 0.5 {
        magnitude *= 2.0;
        exponent -= 1;
    }
    let fraction = ((magnitude - 0.5) * 16_777_216.0).round() as u32;
    let v = sign | ((exponent as u32) << 23) | (fraction & 0x007F_FFFF);
    // wire order is the VAX word order (b1, b0, b3, b2)
    [
        (v >> 16) as u8,
        (v >> 24) as u8,
        v as u8,
        (v >> 8) as u8,
    ]
}

/// Encode one value the way the standard lays it out for `code`.
///
/// Panics when the value variant does not belong to the code; fixtures are
/// supposed to be well-formed.
pub fn encode_value(code: RepCode, value: &Value) -> Vec<u8> {
    use RepCode::*;
    match (code, value) {
        (Fshort, Value::F32(v)) => fshort(*v).to_vec(),
        (Fsingl, Value::F32(v)) => v.to_be_bytes().to_vec(),
        (Fsing1, Value::F32Bound(v, a)) => [v.to_be_bytes(), a.to_be_bytes()].concat(),
        (Fsing2, Value::F32Bound2(v, a, b)) => {
            [v.to_be_bytes(), a.to_be_bytes(), b.to_be_bytes()].concat()
        }
        (Isingl, Value::F32(v)) => isingl(*v).to_vec(),
        (Vsingl, Value::F32(v)) => vsingl(*v).to_vec(),
        (Fdoubl, Value::F64(v)) => v.to_be_bytes().to_vec(),
        (Fdoub1, Value::F64Bound(v, a)) => [v.to_be_bytes(), a.to_be_bytes()].concat(),
        (Fdoub2, Value::F64Bound2(v, a, b)) => {
            [v.to_be_bytes(), a.to_be_bytes(), b.to_be_bytes()].concat()
        }
        (Csingl, Value::Complex32(re, im)) => [re.to_be_bytes(), im.to_be_bytes()].concat(),
        (Cdoubl, Value::Complex64(re, im)) => [re.to_be_bytes(), im.to_be_bytes()].concat(),
        (Sshort, Value::I8(v)) => vec![*v as u8],
        (Snorm, Value::I16(v)) => v.to_be_bytes().to_vec(),
        (Slong, Value::I32(v)) => v.to_be_bytes().to_vec(),
        (Ushort, Value::U8(v)) => vec![*v],
        (Unorm, Value::U16(v)) => v.to_be_bytes().to_vec(),
        (Ulong, Value::U32(v)) => v.to_be_bytes().to_vec(),
        (Uvari | Origin, Value::U32(v)) => uvari(*v),
        (Ident | Units, Value::String(s)) => ident(s),
        (Ascii, Value::String(s)) => {
            let mut out = uvari(s.len() as u32);
            out.extend_from_slice(s.as_bytes());
            out
        }
        (Dtime, Value::DateTime(dt)) => dtime(dt),
        (Obname, Value::Name(name)) => obname(name),
        (Objref, Value::ObjectRef(r)) => {
            let mut out = ident(&r.set_type);
            out.extend_from_slice(&obname(&r.name));
            out
        }
        (Attref, Value::AttributeRef(r)) => {
            let mut out = ident(&r.set_type);
            out.extend_from_slice(&obname(&r.name));
            out.extend_from_slice(&ident(&r.label));
            out
        }
        (Status, Value::Status(b)) => vec![u8::from(*b)],
        (code, value) => panic!("value {value:?} does not match code {code:?}"),
    }
}

/// SET component with type and optional name
pub fn set_component(set_type: &str, name: Option<&str>) -> Vec<u8> {
    let mut descriptor = SET | SET_HAS_TYPE;
    if name.is_some() {
        descriptor |= SET_HAS_NAME;
    }
    let mut out = vec![descriptor];
    out.extend_from_slice(&ident(set_type));
    if let Some(name) = name {
        out.extend_from_slice(&ident(name));
    }
    out
}

/// Template ATTRIB component with a label and any of count, repcode, units
pub fn template_attr(
    label: &str,
    count: Option<u32>,
    reprc: Option<RepCode>,
    units: Option<&str>,
) -> Vec<u8> {
    let mut descriptor = ATTRIB | ATTR_HAS_LABEL;
    if count.is_some() {
        descriptor |= ATTR_HAS_COUNT;
    }
    if reprc.is_some() {
        descriptor |= ATTR_HAS_REPRC;
    }
    if units.is_some() {
        descriptor |= ATTR_HAS_UNITS;
    }
    let mut out = vec![descriptor];
    out.extend_from_slice(&ident(label));
    if let Some(count) = count {
        out.extend_from_slice(&uvari(count));
    }
    if let Some(reprc) = reprc {
        out.push(reprc as u8);
    }
    if let Some(units) = units {
        out.extend_from_slice(&ident(units));
    }
    out
}

/// OBJECT component with its name
pub fn object_component(name: &ObjectName) -> Vec<u8> {
    let mut out = vec![OBJECT | OBJECT_HAS_NAME];
    out.extend_from_slice(&obname(name));
    out
}

/// Object ATTRIB cell carrying only a value, pre-encoded
pub fn value_cell(value_bytes: &[u8]) -> Vec<u8> {
    let mut out = vec![ATTRIB | ATTR_HAS_VALUE];
    out.extend_from_slice(value_bytes);
    out
}

/// Object ATTRIB cell overriding count and repcode before its value
pub fn counted_value_cell(count: u32, reprc: RepCode, value_bytes: &[u8]) -> Vec<u8> {
    let mut out = vec![ATTRIB | ATTR_HAS_COUNT | ATTR_HAS_REPRC | ATTR_HAS_VALUE];
    out.extend_from_slice(&uvari(count));
    out.push(reprc as u8);
    out.extend_from_slice(value_bytes);
    out
}

/// Shorthand for an object identity
pub fn name(origin: u32, copy: u8, identifier: &str) -> ObjectName {
    ObjectName {
        origin,
        copy,
        identifier: identifier.into(),
    }
}

/// Frame data body: frame reference, frame number, then raw slot bytes
pub fn fdata_body(frame: &ObjectName, number: u32, slots: &[u8]) -> Vec<u8> {
    let mut out = obname(frame);
    out.extend_from_slice(&uvari(number));
    out.extend_from_slice(slots);
    out
}
