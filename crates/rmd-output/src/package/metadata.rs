//! `metadata.xml` generation.

use std::collections::HashMap;

use anyhow::Result;
use quick_xml::events::BytesStart;

use rmd_model::{MetadataRecord, ModelError, ReferenceDictionary, ReferenceKind, ReferenceMetadata};

use crate::common::{
    ElementIds, XmlWriter, camel_case, end_element, finish_xml, start_element,
    write_text_element, xml_writer,
};

const CONCEPT_SOURCE: &str = "conceptSource";
const SOURCE_ID_ATTRIBUTE: &str = "concept_source_id";

/// Element ids assigned to sources already written in full, by surrogate id.
///
/// Scoped to one document.
#[derive(Debug, Default)]
struct SourceReferences {
    written: HashMap<String, u32>,
}

/// Renders `metadata.xml` with one element per record in `items`.
///
/// Term sources are resolved against the sources of `items` first, then
/// against sources that earlier batches recorded in `known`.
pub fn render_metadata(items: &ReferenceMetadata, known: &ReferenceDictionary) -> Result<String> {
    let mut ids = ElementIds::new();
    let mut sources = SourceReferences::default();
    let mut xml = xml_writer();

    let list_id = ids.next_id().to_string();
    start_element(
        &mut xml,
        BytesStart::new("list").with_attributes([("id", list_id.as_str())]),
    )?;
    for record in items.iter() {
        write_record(&mut xml, &mut ids, &mut sources, items, known, record)?;
    }
    end_element(&mut xml, "list")?;
    finish_xml(xml)
}

fn write_record(
    xml: &mut XmlWriter,
    ids: &mut ElementIds,
    sources: &mut SourceReferences,
    items: &ReferenceMetadata,
    known: &ReferenceDictionary,
    record: &MetadataRecord,
) -> Result<()> {
    let element = record.kind.qualified_class_name();
    let record_id = ids.next_id().to_string();
    start_element(
        xml,
        BytesStart::new(element.as_str())
            .with_attributes([("id", record_id.as_str()), ("uuid", record.uuid.as_str())]),
    )?;

    let is_term = record.kind == ReferenceKind::Term;
    for (name, value) in record.attributes.iter() {
        if is_term && name == "uuid" {
            continue;
        }
        if is_term && name == SOURCE_ID_ATTRIBUTE {
            write_term_source(xml, ids, sources, items, known, value)?;
            continue;
        }
        write_text_element(xml, BytesStart::new(camel_case(name)), value)?;
    }

    end_element(xml, &element)
}

fn write_term_source(
    xml: &mut XmlWriter,
    ids: &mut ElementIds,
    sources: &mut SourceReferences,
    items: &ReferenceMetadata,
    known: &ReferenceDictionary,
    source_id: &str,
) -> Result<()> {
    if let Some(reference) = sources.written.get(source_id) {
        let reference = reference.to_string();
        return write_text_element(
            xml,
            BytesStart::new(CONCEPT_SOURCE).with_attributes([("reference", reference.as_str())]),
            "",
        );
    }

    let source = items
        .source_by_id(source_id)
        .or_else(|| known.source_record(source_id))
        .ok_or_else(|| ModelError::UnresolvedReference {
            kind: ReferenceKind::Source,
            id: source_id.to_string(),
        })?;
    let element_id = ids.next_id();
    sources.written.insert(source_id.to_string(), element_id);

    let element_id = element_id.to_string();
    let resolves_to = ReferenceKind::Source.qualified_class_name();
    start_element(
        xml,
        BytesStart::new(CONCEPT_SOURCE).with_attributes([
            ("id", element_id.as_str()),
            ("resolves-to", resolves_to.as_str()),
            ("uuid", source.uuid.as_str()),
        ]),
    )?;
    for (name, value) in source.attributes.iter() {
        if name == "uuid" {
            continue;
        }
        write_text_element(xml, BytesStart::new(camel_case(name)), value)?;
    }
    end_element(xml, CONCEPT_SOURCE)
}
