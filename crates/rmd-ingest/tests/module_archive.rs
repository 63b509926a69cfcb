//! Reading concept files straight out of a module archive.

use std::fs::File;
use std::io::Write;

use tempfile::TempDir;
use zip::write::SimpleFileOptions;

use rmd_ingest::{
    EntryLayout, ModuleArchive, NumericEra, load_concept_batch, load_numeric_concepts,
    load_reference_metadata, numeric_companion, select_concept_files,
};
use rmd_model::ReferenceKind;

const CONCEPTS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<dataset>
  <concept_class concept_class_id="2" name="Test" retired="false" uuid="cl-test"/>
  <concept concept_id="3" retired="false" class_id="2" uuid="abc-1"/>
  <concept_name concept_id="3" name="Weight" locale="en" uuid="n-1"/>
</dataset>
"#;

const NUMERIC: &str = r#"<dataset><concept_numeric concept_id="3" units="kg"/></dataset>"#;

fn write_module(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("referencemetadata.omod");
    let mut zip = zip::ZipWriter::new(File::create(&path).unwrap());
    for (name, content) in [
        ("Reference_Application_Concepts-20.xml", CONCEPTS),
        ("Reference_Application_Numeric_Concepts-20-2.x.xml", NUMERIC),
        ("Reference_Application_Numeric_Concepts-20-pre2.x.xml", NUMERIC),
        ("messages.properties", "x=y"),
    ] {
        zip.start_file(name, SimpleFileOptions::default()).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
    path
}

#[test]
fn extracted_concept_files_load_into_records() {
    let dir = TempDir::new().unwrap();
    let mut archive = ModuleArchive::open(&write_module(&dir)).unwrap();
    let names = archive.entry_names().unwrap();

    let selected = select_concept_files(names.iter().map(String::as_str), NumericEra::Post2x);
    assert_eq!(
        selected,
        vec![
            "Reference_Application_Concepts-20.xml",
            "Reference_Application_Numeric_Concepts-20-2.x.xml"
        ]
    );

    let scratch = dir.path().join("scratch");
    let main = archive
        .extract_entry(&selected[0], &scratch, EntryLayout::Preserve)
        .unwrap();
    let numeric_name = numeric_companion(&selected).unwrap();
    let numeric = archive
        .extract_entry(numeric_name, &scratch, EntryLayout::Preserve)
        .unwrap();

    let metadata = load_reference_metadata(&main).unwrap();
    assert_eq!(metadata.records(ReferenceKind::Class).len(), 1);

    let mut batch = load_concept_batch(&main).unwrap();
    assert_eq!(batch.concepts.len(), 1);
    assert_eq!(batch.names.len(), 1);

    let rows = load_numeric_concepts(&numeric).unwrap();
    assert_eq!(batch.merge_numeric(&rows).unwrap(), 1);
    assert_eq!(
        batch.concepts.get("3").unwrap().numeric.units.as_deref(),
        Some("kg")
    );
}
