//! Cross-batch reference dictionary.
//!
//! Maps numeric surrogate ids to stable, human-readable values:
//!
//! - Datatype, Class, MapType, Source: surrogate id to `name`
//! - ReferenceTerm: surrogate id to `<source name>:<code>`
//!
//! The dictionary is built incrementally while batches are repackaged and
//! then read while concepts are denormalized. Entries are never replaced, so
//! a value observed once stays stable for the rest of the run.
//!
//! Full source records are kept alongside their names so that a later batch
//! can serialize a term whose source was loaded by an earlier one.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{ModelError, Result};
use crate::reference::{MetadataRecord, ReferenceKind, ReferenceMetadata};

#[derive(Debug, Clone, Default)]
pub struct ReferenceDictionary {
    datatypes: BTreeMap<String, String>,
    classes: BTreeMap<String, String>,
    map_types: BTreeMap<String, String>,
    sources: BTreeMap<String, String>,
    terms: BTreeMap<String, String>,
    source_records: BTreeMap<String, MetadataRecord>,
}

impl ReferenceDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self, kind: ReferenceKind) -> &BTreeMap<String, String> {
        match kind {
            ReferenceKind::Datatype => &self.datatypes,
            ReferenceKind::Class => &self.classes,
            ReferenceKind::MapType => &self.map_types,
            ReferenceKind::Source => &self.sources,
            ReferenceKind::Term => &self.terms,
        }
    }

    fn map_mut(&mut self, kind: ReferenceKind) -> &mut BTreeMap<String, String> {
        match kind {
            ReferenceKind::Datatype => &mut self.datatypes,
            ReferenceKind::Class => &mut self.classes,
            ReferenceKind::MapType => &mut self.map_types,
            ReferenceKind::Source => &mut self.sources,
            ReferenceKind::Term => &mut self.terms,
        }
    }

    pub fn contains(&self, kind: ReferenceKind, surrogate_id: &str) -> bool {
        self.map(kind).contains_key(surrogate_id)
    }

    pub fn get(&self, kind: ReferenceKind, surrogate_id: &str) -> Option<&str> {
        self.map(kind).get(surrogate_id).map(String::as_str)
    }

    /// Source record first loaded under `surrogate_id`.
    pub fn source_record(&self, surrogate_id: &str) -> Option<&MetadataRecord> {
        self.source_records.get(surrogate_id)
    }

    /// Resolves a surrogate id, failing with [`ModelError::UnresolvedReference`].
    pub fn resolve(&self, kind: ReferenceKind, surrogate_id: &str) -> Result<&str> {
        self.get(kind, surrogate_id)
            .ok_or_else(|| ModelError::UnresolvedReference {
                kind,
                id: surrogate_id.to_string(),
            })
    }

    pub fn len(&self, kind: ReferenceKind) -> usize {
        self.map(kind).len()
    }

    pub fn is_empty(&self) -> bool {
        ReferenceKind::ALL
            .into_iter()
            .all(|kind| self.map(kind).is_empty())
    }

    /// Merges a batch of reference records into the dictionary.
    ///
    /// Kinds are merged in [`ReferenceKind::ALL`] order so terms can resolve
    /// sources introduced by the same batch. Records whose surrogate id is
    /// already present are skipped.
    ///
    /// Returns the number of entries added.
    ///
    /// # Errors
    ///
    /// Fails when a new term's source is not in the dictionary, or when a
    /// record lacks the `name`/`code` its entry is built from.
    pub fn extend(&mut self, metadata: &ReferenceMetadata) -> Result<usize> {
        let mut added = 0usize;
        for kind in ReferenceKind::ALL {
            for record in metadata.records(kind) {
                if self.contains(kind, &record.surrogate_id) {
                    continue;
                }
                let value = self.entry_value(record)?;
                self.map_mut(kind)
                    .insert(record.surrogate_id.clone(), value);
                if kind == ReferenceKind::Source {
                    self.source_records
                        .insert(record.surrogate_id.clone(), record.clone());
                }
                added += 1;
            }
        }
        debug!(added, "extended reference dictionary");
        Ok(added)
    }

    fn entry_value(&self, record: &MetadataRecord) -> Result<String> {
        match record.kind {
            ReferenceKind::Term => {
                let source_id = record.source_id.as_deref().unwrap_or_default();
                let source = self.resolve(ReferenceKind::Source, source_id)?;
                Ok(format!("{source}:{}", record.require_code()?))
            }
            _ => Ok(record.require_name()?.to_string()),
        }
    }
}
