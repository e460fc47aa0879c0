//! Explicitly formatted logical records: sets, templates, objects and
//! attributes
//!
//! An EFLR body is a flat scan of components. One set component opens the
//! record; template attributes accumulate until the first object component;
//! each object decodes its attribute cells positionally against the
//! template, overriding template defaults inline where its descriptors say
//! so.

use crate::cursor::Cursor;
use crate::error::{DlisError, Warning};
use crate::repcode::{self, RepCode};
use crate::types::{ObjectName, Value};
use serde::{Deserialize, Serialize};

/// Role of a component, taken from the top three bits of its descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentRole {
    /// Attribute cell with no value
    AbsentAttribute,
    /// Attribute cell
    Attribute,
    /// Template attribute whose value is fixed for every object
    InvariantAttribute,
    /// Object row
    Object,
    /// Reserved role bits
    Reserved,
    /// Redundant set
    RedundantSet,
    /// Replacement set
    ReplacementSet,
    /// Set
    Set,
}

impl ComponentRole {
    /// Classify a component descriptor byte
    pub fn from_descriptor(descriptor: u8) -> Self {
        match descriptor >> 5 {
            0 => ComponentRole::AbsentAttribute,
            1 => ComponentRole::Attribute,
            2 => ComponentRole::InvariantAttribute,
            3 => ComponentRole::Object,
            4 => ComponentRole::Reserved,
            5 => ComponentRole::RedundantSet,
            6 => ComponentRole::ReplacementSet,
            _ => ComponentRole::Set,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ComponentRole::AbsentAttribute => "ABSATR",
            ComponentRole::Attribute => "ATTRIB",
            ComponentRole::InvariantAttribute => "INVATR",
            ComponentRole::Object => "OBJECT",
            ComponentRole::Reserved => "reserved",
            ComponentRole::RedundantSet => "RDSET",
            ComponentRole::ReplacementSet => "RSET",
            ComponentRole::Set => "SET",
        }
    }
}

// format bits in the low five bits of a descriptor, per role
const SET_HAS_TYPE: u8 = 0x10;
const SET_HAS_NAME: u8 = 0x08;
const OBJECT_HAS_NAME: u8 = 0x10;
const ATTR_HAS_LABEL: u8 = 0x10;
const ATTR_HAS_COUNT: u8 = 0x08;
const ATTR_HAS_REPRC: u8 = 0x04;
const ATTR_HAS_UNITS: u8 = 0x02;
const ATTR_HAS_VALUE: u8 = 0x01;

/// Which flavor of set component opened the record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetRole {
    /// Plain set
    Set,
    /// Redundant copy of an earlier set
    Redundant,
    /// Replacement for an earlier set
    Replacement,
}

/// One attribute cell: a template descriptor, or an object cell positionally
/// aligned to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    /// Label, inherited from the template
    pub label: String,
    /// Number of value elements
    pub count: u32,
    /// Representation code of the value elements
    pub repcode: RepCode,
    /// Units of the value, when declared
    pub units: Option<String>,
    /// Decoded value elements. `None` marks an absent attribute, which is
    /// distinct from any decoded value.
    pub value: Option<Vec<Value>>,
    /// Whether the value is fixed by the template for every object
    pub invariant: bool,
}

impl Default for Attribute {
    fn default() -> Self {
        Self {
            label: String::new(),
            count: 1,
            repcode: RepCode::Ident,
            units: None,
            value: None,
            invariant: false,
        }
    }
}

/// An object row, positionally aligned to its set's template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Object {
    /// Identity of the object
    pub name: ObjectName,
    /// One cell per template slot, in template order
    pub attributes: Vec<Attribute>,
}

impl Object {
    /// Look up an attribute cell by its template label
    pub fn attribute(&self, label: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.label == label)
    }
}

/// A parsed explicitly formatted logical record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSet {
    /// Flavor of the opening set component
    pub role: SetRole,
    /// Set type, e.g. `CHANNEL` or `FRAME`
    pub set_type: String,
    /// Optional set name
    pub name: Option<String>,
    /// Template the objects align to
    pub template: Vec<Attribute>,
    /// Objects in record order
    pub objects: Vec<Object>,
}

/// Parse an EFLR body into a set.
///
/// Recoverable oddities are pushed onto `warnings`; invalid component
/// sequencing is a [`DlisError::MalformedStructure`] scoped to this record.
pub fn parse_eflr(body: &[u8], warnings: &mut Vec<Warning>) -> Result<ObjectSet, DlisError> {
    let mut cursor = Cursor::new(body);
    if cursor.remaining() == 0 {
        return Err(DlisError::MalformedStructure(
            "explicitly formatted record is empty".into(),
        ));
    }

    let descriptor = cursor.read_u8()?;
    let role = match ComponentRole::from_descriptor(descriptor) {
        ComponentRole::Set => SetRole::Set,
        ComponentRole::RedundantSet => SetRole::Redundant,
        ComponentRole::ReplacementSet => SetRole::Replacement,
        other => {
            return Err(DlisError::MalformedStructure(format!(
                "expected SET, RSET or RDSET, was {} ({:#010b})",
                other.name(),
                descriptor
            )))
        }
    };

    if descriptor & SET_HAS_TYPE == 0 {
        // the type is mandatory; assume a corrupted descriptor and read it
        // anyway
        warnings.push(Warning::SetTypeMissing);
    }
    let set_type = repcode::read_ident(&mut cursor)?;
    let name = if descriptor & SET_HAS_NAME != 0 {
        Some(repcode::read_ident(&mut cursor)?)
    } else {
        None
    };

    let template = parse_template(&mut cursor, warnings)?;

    if cursor.remaining() == 0 {
        return Err(DlisError::MalformedStructure(
            "unexpected end-of-record after template".into(),
        ));
    }

    let mut objects = Vec::new();
    while cursor.remaining() > 0 {
        let descriptor = cursor.read_u8()?;
        let role = ComponentRole::from_descriptor(descriptor);
        if role != ComponentRole::Object {
            return Err(DlisError::MalformedStructure(format!(
                "expected OBJECT, was {} ({:#010b})",
                role.name(),
                descriptor
            )));
        }
        if descriptor & OBJECT_HAS_NAME == 0 {
            warnings.push(Warning::ObjectNameMissing);
        }
        let name = repcode::read_obname(&mut cursor)?;
        let attributes = parse_object_row(&mut cursor, &template, warnings)?;
        objects.push(Object { name, attributes });
    }

    Ok(ObjectSet {
        role,
        set_type,
        name,
        template,
        objects,
    })
}

/// Accumulate template attributes until the first object component, which is
/// left unconsumed for the object loop.
fn parse_template(
    cursor: &mut Cursor<'_>,
    warnings: &mut Vec<Warning>,
) -> Result<Vec<Attribute>, DlisError> {
    let mut template = Vec::new();

    loop {
        if cursor.remaining() == 0 {
            return Err(DlisError::MalformedStructure(
                "unexpected end-of-record in template".into(),
            ));
        }

        let at = cursor.position();
        let descriptor = cursor.read_u8()?;
        let role = ComponentRole::from_descriptor(descriptor);
        match role {
            ComponentRole::Object => {
                cursor.seek(at);
                return Ok(template);
            }
            ComponentRole::AbsentAttribute => {
                warnings.push(Warning::AbsentInTemplate);
                continue;
            }
            ComponentRole::Attribute | ComponentRole::InvariantAttribute => {}
            other => {
                return Err(DlisError::MalformedStructure(format!(
                    "expected ATTRIB, INVATR or OBJECT in template, was {} ({:#010b})",
                    other.name(),
                    descriptor
                )))
            }
        }

        if descriptor & ATTR_HAS_LABEL == 0 {
            // labels are mandatory in the template; read one regardless
            warnings.push(Warning::TemplateLabelMissing);
        }
        let mut attr = Attribute {
            label: repcode::read_ident(cursor)?,
            invariant: role == ComponentRole::InvariantAttribute,
            ..Attribute::default()
        };
        if descriptor & ATTR_HAS_COUNT != 0 {
            attr.count = repcode::read_uvari(cursor)?;
        }
        if descriptor & ATTR_HAS_REPRC != 0 {
            attr.repcode = RepCode::try_from(cursor.read_u8()?)?;
        }
        if descriptor & ATTR_HAS_UNITS != 0 {
            attr.units = Some(repcode::read_ident(cursor)?);
        }
        if descriptor & ATTR_HAS_VALUE != 0 {
            attr.value = Some(attr.repcode.decode_array(cursor, attr.count)?);
        }
        template.push(attr);
    }
}

/// Decode one object's cells against the template.
///
/// Invariant slots never consume body bytes. A row cut short by the next
/// object component or by end-of-record falls back to template defaults for
/// its remaining cells.
fn parse_object_row(
    cursor: &mut Cursor<'_>,
    template: &[Attribute],
    warnings: &mut Vec<Warning>,
) -> Result<Vec<Attribute>, DlisError> {
    let mut row = Vec::with_capacity(template.len());
    let mut terminated = false;

    for slot in template {
        if slot.invariant || terminated || cursor.remaining() == 0 {
            row.push(slot.clone());
            continue;
        }

        let at = cursor.position();
        let descriptor = cursor.read_u8()?;
        let role = ComponentRole::from_descriptor(descriptor);

        if role == ComponentRole::Object {
            cursor.seek(at);
            terminated = true;
            row.push(slot.clone());
            continue;
        }
        if role == ComponentRole::AbsentAttribute {
            // no meaning at this position, so unset whatever the template has
            row.push(Attribute {
                value: None,
                ..slot.clone()
            });
            continue;
        }
        if !matches!(
            role,
            ComponentRole::Attribute | ComponentRole::InvariantAttribute
        ) {
            return Err(DlisError::MalformedStructure(format!(
                "expected ATTRIB, INVATR, ABSATR or OBJECT in object row, was {} ({:#010b})",
                role.name(),
                descriptor
            )));
        }

        let mut cell = slot.clone();
        if descriptor & ATTR_HAS_LABEL != 0 {
            // labels live in the template; consume the stray one
            warnings.push(Warning::ObjectLabelSet(repcode::read_ident(cursor)?));
        }
        if descriptor & ATTR_HAS_COUNT != 0 {
            cell.count = repcode::read_uvari(cursor)?;
        }
        if descriptor & ATTR_HAS_REPRC != 0 {
            cell.repcode = RepCode::try_from(cursor.read_u8()?)?;
        }
        if descriptor & ATTR_HAS_UNITS != 0 {
            cell.units = Some(repcode::read_ident(cursor)?);
        }
        if descriptor & ATTR_HAS_VALUE != 0 {
            cell.value = Some(cell.repcode.decode_array(cursor, cell.count)?);
        }
        row.push(cell);
    }

    Ok(row)
}
