//! Single-pass index over a storage unit
//!
//! The catalog walks the logical record sequence once, records where every
//! record lives, parses explicit records into object sets, and groups frame
//! data per frame identity. Cross-references between objects are stored as
//! identity keys and resolved at query time, never as ownership pointers.
//! The index is read-only after construction and safe to share.

use crate::eflr::{self, Object, ObjectSet};
use crate::error::{DlisError, Warning};
use crate::iflr::{self, ChannelSpec, FrameTable};
use crate::scanner::{self, DecodeOptions, LogicalRecords};
use crate::types::{
    LogicalRecord, ObjectName, RecordKind, StorageSetLayout, StorageUnitLabel,
};
use bytes::Bytes;
use std::collections::HashMap;

#[cfg(feature = "logging")]
use tracing::{debug, warn};

/// Header facts recorded for every logical record
#[derive(Debug, Clone)]
pub struct RecordEntry {
    /// Byte offset of the record's first segment header
    pub offset: usize,
    /// Body length after trailer stripping
    pub length: usize,
    /// Classification derived from the explicit flag and type code
    pub kind: RecordKind,
    /// Whether the record is explicitly formatted
    pub explicit: bool,
    /// Whether the record was skipped as encrypted
    pub encrypted: bool,
    /// Recoverable conditions attached to this record
    pub warnings: Vec<Warning>,
    residual: usize,
}

/// A scoped failure recorded during the indexing pass
#[derive(Debug, Clone, PartialEq)]
pub struct RecordIssue {
    /// Offset of the record the failure belongs to
    pub offset: usize,
    /// What went wrong
    pub error: DlisError,
}

type ObjectKey = (String, ObjectName);

/// Process-lifetime index over one storage unit.
///
/// Built once per opened file; one bad logical record never aborts indexing
/// of the rest. Only corruption of the framing structure ends the pass, and
/// everything indexed before that point is kept, with the fatal error
/// recorded as the last issue.
#[derive(Debug)]
pub struct Catalog {
    data: Bytes,
    options: DecodeOptions,
    sul: StorageUnitLabel,
    entries: Vec<RecordEntry>,
    sets: Vec<(usize, ObjectSet)>,
    objects: HashMap<ObjectKey, (usize, usize)>,
    fdata: HashMap<ObjectName, Vec<usize>>,
    issues: Vec<RecordIssue>,
    warnings: Vec<Warning>,
}

impl Catalog {
    /// Index a complete storage unit in a single pass.
    ///
    /// Fails only when the storage unit label itself is unusable; every
    /// later failure is scoped and lands in [`Catalog::issues`].
    pub fn build(data: Bytes, options: DecodeOptions) -> Result<Self, DlisError> {
        let sul = scanner::parse_sul(&data)?;

        let mut catalog = Self {
            data: data.clone(),
            options,
            sul,
            entries: Vec::new(),
            sets: Vec::new(),
            objects: HashMap::new(),
            fdata: HashMap::new(),
            issues: Vec::new(),
            warnings: Vec::new(),
        };

        if let StorageSetLayout::Unknown(raw) = &catalog.sul.layout {
            #[cfg(feature = "logging")]
            warn!("unknown storage set layout {:?}, assuming record layout", raw);
            catalog
                .warnings
                .push(Warning::UnknownStorageSetLayout(raw.clone()));
        }

        let mut records = LogicalRecords::new(data, options);
        while let Some(item) = records.next() {
            match item {
                Ok(record) => catalog.index_record(record),
                Err(error) => {
                    let fatal = error.is_fatal();
                    catalog.issues.push(RecordIssue {
                        offset: records.record_offset(),
                        error,
                    });
                    if fatal {
                        break;
                    }
                }
            }
        }

        #[cfg(feature = "logging")]
        debug!(
            "indexed {} records, {} sets, {} issues",
            catalog.entries.len(),
            catalog.sets.len(),
            catalog.issues.len()
        );

        Ok(catalog)
    }

    fn index_record(&mut self, record: LogicalRecord) {
        let entry_index = self.entries.len();
        self.entries.push(RecordEntry {
            offset: record.offset,
            length: record.body.len(),
            kind: record.kind,
            explicit: record.explicit,
            encrypted: record.encrypted,
            warnings: record.warnings,
            residual: record.residual,
        });

        if record.encrypted {
            return;
        }

        if record.explicit {
            let mut warnings = Vec::new();
            match eflr::parse_eflr(&record.body, &mut warnings) {
                Ok(set) => {
                    let set_index = self.sets.len();
                    for (object_index, object) in set.objects.iter().enumerate() {
                        // first definition wins on duplicate identities
                        self.objects
                            .entry((set.set_type.clone(), object.name.clone()))
                            .or_insert((set_index, object_index));
                    }
                    self.sets.push((entry_index, set));
                }
                Err(error) => self.issues.push(RecordIssue {
                    offset: record.offset,
                    error,
                }),
            }
            self.entries[entry_index].warnings.extend(warnings);
        } else if record.kind == RecordKind::FrameData {
            match iflr::peek_frame_name(&record.body) {
                Ok(name) => self.fdata.entry(name).or_default().push(entry_index),
                Err(error) => self.issues.push(RecordIssue {
                    offset: record.offset,
                    error,
                }),
            }
        }
    }

    /// The storage unit label the file opened with
    pub fn sul(&self) -> &StorageUnitLabel {
        &self.sul
    }

    /// Every logical record seen by the indexing pass, in file order
    pub fn records(&self) -> &[RecordEntry] {
        &self.entries
    }

    /// Parsed object sets, in file order
    pub fn sets(&self) -> impl Iterator<Item = &ObjectSet> {
        self.sets.iter().map(|(_, set)| set)
    }

    /// Scoped failures collected during the indexing pass
    pub fn issues(&self) -> &[RecordIssue] {
        &self.issues
    }

    /// File-level warnings, e.g. an unknown storage set layout
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// All objects of the named set type, in file order
    pub fn find_by_type<'a>(&'a self, set_type: &'a str) -> impl Iterator<Item = &'a Object> + 'a {
        self.sets
            .iter()
            .filter(move |(_, set)| set.set_type == set_type)
            .flat_map(|(_, set)| set.objects.iter())
    }

    /// Look up one object by its set type and identity
    pub fn object(&self, set_type: &str, name: &ObjectName) -> Option<&Object> {
        let (set_index, object_index) = self
            .objects
            .get(&(set_type.to_string(), name.clone()))?;
        Some(&self.sets[*set_index].1.objects[*object_index])
    }

    fn frame_object(&self, frame_name: &str) -> Result<&Object, DlisError> {
        self.find_by_type("FRAME")
            .find(|object| object.name.identifier == frame_name)
            .ok_or_else(|| DlisError::UnresolvedReference {
                kind: "frame",
                name: frame_name.to_string(),
            })
    }

    /// Channels of the named frame, in declared order.
    ///
    /// References are resolved here, at query time; a CHANNELS entry that
    /// was never indexed is an [`DlisError::UnresolvedReference`].
    pub fn frame_channels(&self, frame_name: &str) -> Result<Vec<ChannelSpec>, DlisError> {
        let frame = self.frame_object(frame_name)?;
        let mut channels = Vec::new();
        for name in iflr::frame_channel_names(frame) {
            let object =
                self.object("CHANNEL", &name)
                    .ok_or_else(|| DlisError::UnresolvedReference {
                        kind: "channel",
                        name: name.to_string(),
                    })?;
            channels.push(ChannelSpec::from_object(object)?);
        }
        Ok(channels)
    }

    /// Decode every frame data record of the named frame into one table.
    ///
    /// A layout mismatch is fatal to this frame's rows; other frames are
    /// unaffected.
    pub fn read_frame(&self, frame_name: &str) -> Result<FrameTable, DlisError> {
        let channels = self.frame_channels(frame_name)?;
        let frame = self.frame_object(frame_name)?;

        let mut rows = Vec::new();
        if let Some(entry_indices) = self.fdata.get(&frame.name) {
            for &index in entry_indices {
                let entry = &self.entries[index];
                let record =
                    scanner::read_record_at(&self.data, entry.offset, entry.residual, self.options)?;
                rows.push(iflr::parse_fdata(&record.body, &channels)?);
            }
        }

        Ok(FrameTable { channels, rows })
    }

    /// Re-decode the logical record that starts at a recorded offset,
    /// without re-scanning the file.
    pub fn random_access(&self, offset: usize) -> Result<LogicalRecord, DlisError> {
        let entry = self
            .entries
            .iter()
            .find(|entry| entry.offset == offset)
            .ok_or_else(|| DlisError::UnresolvedReference {
                kind: "record offset",
                name: offset.to_string(),
            })?;
        scanner::read_record_at(&self.data, entry.offset, entry.residual, self.options)
    }
}
