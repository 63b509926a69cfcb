//! Reference metadata records: datatypes, classes, map types, sources and terms.

use std::fmt;

use crate::attributes::Attributes;
use crate::error::{ModelError, Result};
use crate::table::{Keyed, RecordTable};

/// The five kinds of reference metadata shipped alongside concepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReferenceKind {
    Datatype,
    Class,
    MapType,
    Source,
    Term,
}

impl ReferenceKind {
    /// All kinds, in the order packages list them.
    pub const ALL: [ReferenceKind; 5] = [
        ReferenceKind::Datatype,
        ReferenceKind::Class,
        ReferenceKind::MapType,
        ReferenceKind::Source,
        ReferenceKind::Term,
    ];

    /// Element name used in the flat XML dataset.
    pub const fn element_name(self) -> &'static str {
        match self {
            ReferenceKind::Datatype => "concept_datatype",
            ReferenceKind::Class => "concept_class",
            ReferenceKind::MapType => "concept_map_type",
            ReferenceKind::Source => "concept_reference_source",
            ReferenceKind::Term => "concept_reference_term",
        }
    }

    /// Attribute carrying the numeric surrogate id.
    pub const fn id_attribute(self) -> &'static str {
        match self {
            ReferenceKind::Datatype => "concept_datatype_id",
            ReferenceKind::Class => "concept_class_id",
            ReferenceKind::MapType => "concept_map_type_id",
            ReferenceKind::Source => "concept_source_id",
            ReferenceKind::Term => "concept_reference_term_id",
        }
    }

    /// Simple class name of the matching domain object.
    pub const fn class_name(self) -> &'static str {
        match self {
            ReferenceKind::Datatype => "ConceptDatatype",
            ReferenceKind::Class => "ConceptClass",
            ReferenceKind::MapType => "ConceptMapType",
            ReferenceKind::Source => "ConceptSource",
            ReferenceKind::Term => "ConceptReferenceTerm",
        }
    }

    /// Fully qualified class name, e.g. `org.openmrs.ConceptClass`.
    pub fn qualified_class_name(self) -> String {
        format!("org.openmrs.{}", self.class_name())
    }

    pub const fn label(self) -> &'static str {
        match self {
            ReferenceKind::Datatype => "Datatype",
            ReferenceKind::Class => "Class",
            ReferenceKind::MapType => "MapType",
            ReferenceKind::Source => "Source",
            ReferenceKind::Term => "ReferenceTerm",
        }
    }

    /// Whether records already known from an earlier batch are left out of later packages.
    ///
    /// Sources are re-emitted with every package.
    pub const fn deduplicated_across_batches(self) -> bool {
        !matches!(self, ReferenceKind::Source)
    }

    pub fn from_element_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.element_name() == name)
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One reference metadata element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRecord {
    pub kind: ReferenceKind,
    pub uuid: String,
    pub surrogate_id: String,
    pub name: Option<String>,
    /// Term code (terms only).
    pub code: Option<String>,
    /// Surrogate id of the owning source (terms only).
    pub source_id: Option<String>,
    pub date_created: Option<String>,
    pub date_changed: Option<String>,
    pub retired: Option<String>,
    /// Every attribute of the element, in document order.
    pub attributes: Attributes,
}

impl MetadataRecord {
    pub fn from_attributes(kind: ReferenceKind, attributes: Attributes) -> Result<Self> {
        let element = kind.element_name();
        let source_id = match kind {
            ReferenceKind::Term => Some(attributes.require(element, "concept_source_id")?),
            _ => None,
        };
        Ok(Self {
            kind,
            uuid: attributes.require(element, "uuid")?,
            surrogate_id: attributes.require(element, kind.id_attribute())?,
            name: attributes.get_owned("name"),
            code: attributes.get_owned("code"),
            source_id,
            date_created: attributes.get_owned("date_created"),
            date_changed: attributes.get_owned("date_changed"),
            retired: attributes.get_owned("retired"),
            attributes,
        })
    }

    /// Last modification date, falling back to the creation date.
    pub fn changed_at(&self) -> Option<&str> {
        self.date_changed
            .as_deref()
            .or(self.date_created.as_deref())
    }

    pub(crate) fn require_name(&self) -> Result<&str> {
        self.name
            .as_deref()
            .ok_or_else(|| ModelError::missing(self.kind.element_name(), "name"))
    }

    pub(crate) fn require_code(&self) -> Result<&str> {
        self.code
            .as_deref()
            .ok_or_else(|| ModelError::missing(self.kind.element_name(), "code"))
    }
}

impl Keyed for MetadataRecord {
    fn key(&self) -> &str {
        &self.uuid
    }
}

/// Reference metadata loaded from one batch, grouped by kind.
#[derive(Debug, Clone, Default)]
pub struct ReferenceMetadata {
    datatypes: RecordTable<MetadataRecord>,
    classes: RecordTable<MetadataRecord>,
    map_types: RecordTable<MetadataRecord>,
    sources: RecordTable<MetadataRecord>,
    terms: RecordTable<MetadataRecord>,
}

impl ReferenceMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record to the table of its kind; duplicates by uuid are dropped.
    pub fn insert(&mut self, record: MetadataRecord) -> bool {
        self.table_mut(record.kind).insert(record)
    }

    pub fn records(&self, kind: ReferenceKind) -> &RecordTable<MetadataRecord> {
        match kind {
            ReferenceKind::Datatype => &self.datatypes,
            ReferenceKind::Class => &self.classes,
            ReferenceKind::MapType => &self.map_types,
            ReferenceKind::Source => &self.sources,
            ReferenceKind::Term => &self.terms,
        }
    }

    fn table_mut(&mut self, kind: ReferenceKind) -> &mut RecordTable<MetadataRecord> {
        match kind {
            ReferenceKind::Datatype => &mut self.datatypes,
            ReferenceKind::Class => &mut self.classes,
            ReferenceKind::MapType => &mut self.map_types,
            ReferenceKind::Source => &mut self.sources,
            ReferenceKind::Term => &mut self.terms,
        }
    }

    /// All records, kinds in [`ReferenceKind::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = &MetadataRecord> {
        ReferenceKind::ALL
            .into_iter()
            .flat_map(|kind| self.records(kind).iter())
    }

    /// Finds a source by its surrogate id.
    pub fn source_by_id(&self, surrogate_id: &str) -> Option<&MetadataRecord> {
        self.sources
            .iter()
            .find(|source| source.surrogate_id == surrogate_id)
    }

    pub fn len(&self) -> usize {
        ReferenceKind::ALL
            .into_iter()
            .map(|kind| self.records(kind).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(uuid: &str, id: &str) -> MetadataRecord {
        let attributes: Attributes = [
            ("concept_reference_term_id", id),
            ("concept_source_id", "1"),
            ("code", "A01"),
            ("uuid", uuid),
        ]
        .into_iter()
        .collect();
        MetadataRecord::from_attributes(ReferenceKind::Term, attributes).unwrap()
    }

    #[test]
    fn element_names_round_trip() {
        for kind in ReferenceKind::ALL {
            assert_eq!(ReferenceKind::from_element_name(kind.element_name()), Some(kind));
        }
        assert_eq!(ReferenceKind::from_element_name("concept"), None);
    }

    #[test]
    fn term_requires_source() {
        let attributes: Attributes = [("concept_reference_term_id", "5"), ("uuid", "t")]
            .into_iter()
            .collect();
        let err = MetadataRecord::from_attributes(ReferenceKind::Term, attributes).unwrap_err();
        assert!(matches!(
            err,
            ModelError::MissingAttribute { ref attribute, .. } if attribute == "concept_source_id"
        ));
    }

    #[test]
    fn changed_at_falls_back_to_created() {
        let mut record = term("t1", "5");
        assert_eq!(record.changed_at(), None);
        record.date_created = Some("2010-01-01".to_string());
        assert_eq!(record.changed_at(), Some("2010-01-01"));
        record.date_changed = Some("2012-02-02".to_string());
        assert_eq!(record.changed_at(), Some("2012-02-02"));
    }

    #[test]
    fn metadata_keeps_first_uuid() {
        let mut metadata = ReferenceMetadata::new();
        assert!(metadata.insert(term("t1", "5")));
        assert!(!metadata.insert(term("t1", "6")));
        assert_eq!(metadata.records(ReferenceKind::Term).len(), 1);
        assert_eq!(
            metadata.records(ReferenceKind::Term).get("t1").map(|t| t.surrogate_id.as_str()),
            Some("5")
        );
    }

    #[test]
    fn only_sources_skip_dedup() {
        let skipped: Vec<ReferenceKind> = ReferenceKind::ALL
            .into_iter()
            .filter(|kind| !kind.deduplicated_across_batches())
            .collect();
        assert_eq!(skipped, vec![ReferenceKind::Source]);
    }
}
