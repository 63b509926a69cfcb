//! `header.xml` generation.

use anyhow::Result;
use quick_xml::events::BytesStart;

use rmd_model::{MetadataRecord, ReferenceMetadata};

use crate::common::{
    ElementIds, LINKED_HASH_SET, MODULE_VERSIONS, PACKAGE_ITEM, PLATFORM_VERSION, XmlWriter,
    end_element, finish_xml, start_element, write_text_element, xml_writer,
};

/// Descriptive fields of a generated package.
#[derive(Debug, Clone)]
pub struct PackageHeader {
    pub package_uuid: String,
    pub group_uuid: String,
    pub date_created: String,
    pub name: String,
    pub description: String,
    pub version: String,
}

impl PackageHeader {
    /// Header for a package built from a concept batch named `name`.
    pub fn new(name: &str, version: &str, date_created: String) -> Self {
        Self {
            package_uuid: uuid::Uuid::new_v4().to_string(),
            group_uuid: uuid::Uuid::new_v4().to_string(),
            date_created,
            name: name.to_string(),
            description: format!(
                "Standard set of {name} distributed with the Reference Application"
            ),
            version: version.to_string(),
        }
    }
}

/// Renders `header.xml` listing every record in `items`.
pub fn render_header(header: &PackageHeader, items: &ReferenceMetadata) -> Result<String> {
    let mut ids = ElementIds::new();
    let mut xml = xml_writer();

    let package_id = ids.next_id().to_string();
    start_element(
        &mut xml,
        BytesStart::new("package").with_attributes([
            ("id", package_id.as_str()),
            ("uuid", header.package_uuid.as_str()),
        ]),
    )?;

    let created_id = ids.next_id().to_string();
    write_text_element(
        &mut xml,
        BytesStart::new("dateCreated").with_attributes([("id", created_id.as_str())]),
        &header.date_created,
    )?;
    write_text_element(&mut xml, BytesStart::new("name"), &header.name)?;
    write_text_element(&mut xml, BytesStart::new("description"), &header.description)?;
    write_text_element(&mut xml, BytesStart::new("openmrsVersion"), PLATFORM_VERSION)?;
    write_text_element(&mut xml, BytesStart::new("version"), &header.version)?;
    write_text_element(&mut xml, BytesStart::new("groupUuid"), &header.group_uuid)?;

    let modules_id = ids.next_id().to_string();
    start_element(
        &mut xml,
        BytesStart::new("modules").with_attributes([("id", modules_id.as_str())]),
    )?;
    for (module, version) in MODULE_VERSIONS {
        start_element(&mut xml, BytesStart::new("entry"))?;
        write_text_element(&mut xml, BytesStart::new("string"), module)?;
        write_text_element(&mut xml, BytesStart::new("string"), version)?;
        end_element(&mut xml, "entry")?;
    }
    end_element(&mut xml, "modules")?;

    let items_id = ids.next_id().to_string();
    let items_start = BytesStart::new("items")
        .with_attributes([("class", LINKED_HASH_SET), ("id", items_id.as_str())]);
    if items.is_empty() {
        write_text_element(&mut xml, items_start, "")?;
    } else {
        start_element(&mut xml, items_start)?;
        for record in items.iter() {
            write_item(&mut xml, &mut ids, record)?;
        }
        end_element(&mut xml, "items")?;
    }

    let related_id = ids.next_id().to_string();
    write_text_element(
        &mut xml,
        BytesStart::new("relatedItems")
            .with_attributes([("class", LINKED_HASH_SET), ("id", related_id.as_str())]),
        "",
    )?;

    end_element(&mut xml, "package")?;
    finish_xml(xml)
}

fn write_item(xml: &mut XmlWriter, ids: &mut ElementIds, record: &MetadataRecord) -> Result<()> {
    let item_id = ids.next_id().to_string();
    start_element(
        xml,
        BytesStart::new(PACKAGE_ITEM)
            .with_attributes([("id", item_id.as_str()), ("uuid", record.uuid.as_str())]),
    )?;
    write_text_element(xml, BytesStart::new("id"), &record.surrogate_id)?;
    write_text_element(
        xml,
        BytesStart::new("classname"),
        &record.kind.qualified_class_name(),
    )?;
    let changed_id = ids.next_id().to_string();
    write_text_element(
        xml,
        BytesStart::new("dateChanged").with_attributes([("id", changed_id.as_str())]),
        record.changed_at().unwrap_or_default(),
    )?;
    write_text_element(
        xml,
        BytesStart::new("retired"),
        record.retired.as_deref().unwrap_or_default(),
    )?;
    end_element(xml, PACKAGE_ITEM)
}

#[cfg(test)]
mod tests {
    use rmd_model::{Attributes, ReferenceKind};

    use super::*;

    fn datatype() -> MetadataRecord {
        let attributes: Attributes = [
            ("concept_datatype_id", "1"),
            ("name", "Numeric"),
            ("date_created", "2004-02-02 00:00:00.0"),
            ("retired", "false"),
            ("uuid", "8d4a4488"),
        ]
        .into_iter()
        .collect();
        MetadataRecord::from_attributes(ReferenceKind::Datatype, attributes).unwrap()
    }

    fn header() -> PackageHeader {
        PackageHeader::new("Reference Application Concepts", "20", "2024-01-01 10:00:00".into())
    }

    #[test]
    fn test_header_fields() {
        let header = header();
        assert_eq!(
            header.description,
            "Standard set of Reference Application Concepts distributed with the Reference Application"
        );
        assert_ne!(header.package_uuid, header.group_uuid);
    }

    #[test]
    fn test_render_header_item() {
        let mut items = ReferenceMetadata::new();
        items.insert(datatype());
        let xml = render_header(&header(), &items).unwrap();

        assert!(xml.starts_with("<package id=\"1\" uuid=\""));
        assert!(xml.contains("<dateCreated id=\"2\">2024-01-01 10:00:00</dateCreated>"));
        assert!(xml.contains("<modules id=\"3\">"));
        assert!(xml.contains("<items class=\"linked-hash-set\" id=\"4\">"));
        assert!(xml.contains("<org.openmrs.module.metadatasharing.Item id=\"5\" uuid=\"8d4a4488\">"));
        assert!(xml.contains("<classname>org.openmrs.ConceptDatatype</classname>"));
        assert!(xml.contains("<dateChanged id=\"6\">2004-02-02 00:00:00.0</dateChanged>"));
        assert!(xml.contains("<retired>false</retired>"));
        assert!(xml.contains("<relatedItems class=\"linked-hash-set\" id=\"7\"/>"));
        assert_eq!(xml.matches("<entry>").count(), MODULE_VERSIONS.len());
    }

    #[test]
    fn test_render_header_without_items() {
        let xml = render_header(&header(), &ReferenceMetadata::new()).unwrap();
        assert!(xml.contains("<items class=\"linked-hash-set\" id=\"4\"/>"));
        assert!(!xml.contains("</items>"));
        assert!(xml.contains("<relatedItems class=\"linked-hash-set\" id=\"5\"/>"));
        assert!(!xml.contains(PACKAGE_ITEM));
    }
}
