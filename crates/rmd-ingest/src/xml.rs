//! Flat XML dataset loading.
//!
//! Concept files are flat datasets: a single root element whose direct
//! children are records, one attribute per column. Children are read in
//! document order and turned into the tagged records of `rmd-model`.

use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::debug;

use rmd_model::{
    Attributes, Concept, ConceptAnswer, ConceptBatch, ConceptDescription, ConceptName,
    ConceptReferenceMap, ConceptSetMember, MetadataRecord, ModelError, NumericConcept,
    ReferenceKind, ReferenceMetadata,
};

use crate::error::{IngestError, Result};

/// One record element of a flat dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlRecord {
    pub element: String,
    pub attributes: Attributes,
}

/// Parses the record elements (direct children of the root) of a dataset.
pub fn parse_records(content: &str, origin: &str) -> Result<Vec<XmlRecord>> {
    parse(content).map_err(|source| IngestError::Xml {
        origin: origin.to_string(),
        source,
    })
}

fn parse(content: &str) -> std::result::Result<Vec<XmlRecord>, quick_xml::Error> {
    let mut reader = Reader::from_str(content);
    let mut records = Vec::new();
    let mut depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => {
                if depth == 1 {
                    records.push(read_record(e)?);
                }
                depth += 1;
            }
            Event::Empty(ref e) => {
                if depth == 1 {
                    records.push(read_record(e)?);
                }
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(records)
}

fn read_record(element: &BytesStart<'_>) -> std::result::Result<XmlRecord, quick_xml::Error> {
    let mut attributes = Attributes::new();
    for attr in element.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attributes.push(key, value);
    }
    Ok(XmlRecord {
        element: String::from_utf8_lossy(element.name().as_ref()).into_owned(),
        attributes,
    })
}

/// Reads and parses a dataset file.
pub fn read_records(path: &Path) -> Result<Vec<XmlRecord>> {
    let content = std::fs::read_to_string(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_records(&content, &path.display().to_string())
}

fn record_error(origin: &str) -> impl Fn(ModelError) -> IngestError + '_ {
    move |source| IngestError::Record {
        origin: origin.to_string(),
        source,
    }
}

/// Collects the reference metadata records of a dataset.
pub fn reference_metadata_from_records(
    records: &[XmlRecord],
    origin: &str,
) -> Result<ReferenceMetadata> {
    let mut metadata = ReferenceMetadata::new();
    for record in records {
        let Some(kind) = ReferenceKind::from_element_name(&record.element) else {
            continue;
        };
        let parsed = MetadataRecord::from_attributes(kind, record.attributes.clone())
            .map_err(record_error(origin))?;
        let uuid = parsed.uuid.clone();
        if !metadata.insert(parsed) {
            debug!(%kind, %uuid, origin, "duplicate reference record ignored");
        }
    }
    Ok(metadata)
}

/// Collects the concept graph records of a dataset.
pub fn concept_batch_from_records(records: &[XmlRecord], origin: &str) -> Result<ConceptBatch> {
    let to_error = record_error(origin);
    let mut batch = ConceptBatch::new();
    for record in records {
        let attributes = &record.attributes;
        let inserted = match record.element.as_str() {
            Concept::ELEMENT => batch
                .concepts
                .insert(Concept::from_attributes(attributes).map_err(&to_error)?),
            ConceptDescription::ELEMENT => batch
                .descriptions
                .insert(ConceptDescription::from_attributes(attributes).map_err(&to_error)?),
            ConceptAnswer::ELEMENT => batch
                .answers
                .insert(ConceptAnswer::from_attributes(attributes).map_err(&to_error)?),
            ConceptName::ELEMENT => batch
                .names
                .insert(ConceptName::from_attributes(attributes).map_err(&to_error)?),
            ConceptReferenceMap::ELEMENT => batch
                .reference_maps
                .insert(ConceptReferenceMap::from_attributes(attributes).map_err(&to_error)?),
            ConceptSetMember::ELEMENT => batch
                .set_members
                .insert(ConceptSetMember::from_attributes(attributes).map_err(&to_error)?),
            _ => continue,
        };
        if !inserted {
            debug!(element = %record.element, origin, "duplicate concept record ignored");
        }
    }
    Ok(batch)
}

/// Collects the `concept_numeric` rows of a dataset.
pub fn numeric_concepts_from_records(
    records: &[XmlRecord],
    origin: &str,
) -> Result<Vec<NumericConcept>> {
    records
        .iter()
        .filter(|record| record.element == NumericConcept::ELEMENT)
        .map(|record| NumericConcept::from_attributes(&record.attributes).map_err(record_error(origin)))
        .collect()
}

pub fn load_reference_metadata(path: &Path) -> Result<ReferenceMetadata> {
    let records = read_records(path)?;
    reference_metadata_from_records(&records, &path.display().to_string())
}

pub fn load_concept_batch(path: &Path) -> Result<ConceptBatch> {
    let records = read_records(path)?;
    concept_batch_from_records(&records, &path.display().to_string())
}

pub fn load_numeric_concepts(path: &Path) -> Result<Vec<NumericConcept>> {
    let records = read_records(path)?;
    numeric_concepts_from_records(&records, &path.display().to_string())
}
