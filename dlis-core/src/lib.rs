//! # DLIS Core
//!
//! A decoder for DLIS v1 (RP66) well-log storage units: the byte stream is
//! split into visible records, logical record segments are reassembled into
//! complete logical records, and record bodies are parsed into typed sets,
//! objects, attributes and frame data. A single-pass catalog indexes the
//! whole storage unit for random access and cross-reference resolution.
//!
//! ## Modules
//!
//! - `constants`: physical format constants and segment attribute flags
//! - `cursor`: bounds-checked big-endian reads over a byte range
//! - `repcode`: representation codes and value decoding
//! - `types`: decoded value and record types
//! - `scanner`: visible record walking and logical record reassembly
//! - `eflr`: explicitly formatted records (sets, templates, objects)
//! - `iflr`: indirectly formatted records (frame data)
//! - `catalog`: single-pass index and cross-reference resolution
//! - `error`: error taxonomy and record warnings

#![warn(missing_docs)]

pub mod catalog;
pub mod constants;
pub mod cursor;
pub mod eflr;
pub mod error;
pub mod iflr;
pub mod repcode;
pub mod scanner;
pub mod types;

// Re-export commonly used types
pub use catalog::Catalog;
pub use error::{DlisError, Warning};
pub use repcode::RepCode;
pub use scanner::{parse_sul, DecodeOptions, LogicalRecords};
pub use types::{LogicalRecord, ObjectName, RecordKind, StorageUnitLabel, Value};

/// Result type alias for DLIS decoding operations
pub type Result<T> = core::result::Result<T, DlisError>;
