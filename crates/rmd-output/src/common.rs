//! Shared utilities for package and CSV generation.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

/// Platform version recorded in generated package headers.
pub const PLATFORM_VERSION: &str = "2.1.4  Build 2cb839";

/// Collection class used for item sets in package headers.
pub const LINKED_HASH_SET: &str = "linked-hash-set";

/// Element name of one entry in a package header's item set.
pub const PACKAGE_ITEM: &str = "org.openmrs.module.metadatasharing.Item";

/// Header timestamp format (local time).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Modules (name, version) listed in every generated package header.
pub const MODULE_VERSIONS: [(&str, &str); 41] = [
    ("calculation", "1.2"),
    ("legacyui", "1.5.0"),
    ("referenceapplication", "2.9.0"),
    ("attachments", "2.1.0"),
    ("metadatadeploy", "1.11.0"),
    ("fhir", "1.18.0"),
    ("appointmentscheduling", "1.10.0"),
    ("atlas", "2.2"),
    ("metadatasharing", "1.5.0"),
    ("appointmentschedulingui", "1.7.0"),
    ("allergyui", "1.8.1"),
    ("formentryapp", "1.4.2"),
    ("chartsearch", "2.1.0"),
    ("providermanagement", "2.10.0"),
    ("htmlwidgets", "1.10.0"),
    ("dataexchange", "1.3.3"),
    ("referencedemodata", "1.4.4"),
    ("addresshierarchy", "2.11.0"),
    ("reportingrest", "1.10.0"),
    ("uiframework", "3.15.0"),
    ("reportingui", "1.6.0"),
    ("referencemetadata", "2.9.0"),
    ("event", "2.7.0"),
    ("uicommons", "2.6.1"),
    ("reporting", "1.17.0"),
    ("emrapi", "1.27.0"),
    ("registrationapp", "1.13.0"),
    ("idgen", "4.5.0"),
    ("htmlformentryui", "1.7.0"),
    ("htmlformentry", "3.8.0"),
    ("appframework", "2.13.0"),
    ("reportingcompatibility", "2.0.6"),
    ("uilibrary", "2.0.6"),
    ("webservices.rest", "2.24.0.573609"),
    ("adminui", "1.2.4"),
    ("registrationcore", "1.8.0"),
    ("owa", "1.10.0"),
    ("metadatamapping", "1.3.4"),
    ("coreapps", "1.21.0"),
    ("appui", "1.9.0"),
    ("serialization.xstream", "0.2.14"),
];

/// Converts a column name to a lower-camel-case element name.
///
/// Every run of letters is title-cased (any non-letter, digits included,
/// starts a new run), non-alphanumeric characters are dropped and the first
/// character is lowercased. Total: `""` maps to `""`. A name that is already
/// camel case loses its inner capitals (`conceptClass` becomes
/// `conceptclass`).
pub fn camel_case(name: &str) -> String {
    let mut titled = String::with_capacity(name.len());
    let mut in_word = false;
    for ch in name.chars() {
        if ch.is_alphabetic() {
            if in_word {
                titled.extend(ch.to_lowercase());
            } else {
                titled.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            if ch.is_alphanumeric() {
                titled.push(ch);
            }
            in_word = false;
        }
    }
    let mut chars = titled.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Sequential `id` attribute values for one XML document.
///
/// Starts at 1; each call to [`ElementIds::next_id`] hands out the next value
/// in document order.
#[derive(Debug)]
pub struct ElementIds {
    next: u32,
}

impl Default for ElementIds {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl ElementIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// Pretty-printing XML writer over an in-memory buffer.
pub type XmlWriter = Writer<Vec<u8>>;

pub fn xml_writer() -> XmlWriter {
    Writer::new_with_indent(Vec::new(), b' ', 2)
}

pub fn finish_xml(xml: XmlWriter) -> Result<String> {
    String::from_utf8(xml.into_inner()).context("generated XML is not UTF-8")
}

/// Writes `<name>text</name>`, or `<name/>` for empty text.
pub fn write_text_element(xml: &mut XmlWriter, start: BytesStart<'_>, text: &str) -> Result<()> {
    if text.is_empty() {
        xml.write_event(Event::Empty(start))?;
        return Ok(());
    }
    let end = start.to_end().into_owned();
    xml.write_event(Event::Start(start))?;
    xml.write_event(Event::Text(BytesText::new(text)))?;
    xml.write_event(Event::End(end))?;
    Ok(())
}

pub fn start_element(xml: &mut XmlWriter, start: BytesStart<'_>) -> Result<()> {
    xml.write_event(Event::Start(start))?;
    Ok(())
}

pub fn end_element(xml: &mut XmlWriter, name: &str) -> Result<()> {
    xml.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Ensures the output directory exists.
pub fn ensure_output_dir(dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir.to_path_buf())
}
