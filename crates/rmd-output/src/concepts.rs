//! Initializer concept CSV generation.
//!
//! A batch's concept graph is flattened into one row per concept. Surrogate
//! ids are replaced with dictionary values or concept uuids so every cell
//! stays meaningful outside the source database.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use tracing::{info, warn};

use rmd_ingest::{BatchName, load_concept_batch, load_numeric_concepts};
use rmd_model::{
    Attributes, Concept, ConceptAnswer, ConceptBatch, ConceptDescription, ConceptName,
    ConceptReferenceMap, ConceptSetMember, NameType, NumericRange, ReferenceDictionary,
    ReferenceKind,
};

use crate::common::ensure_output_dir;

pub const VOID_RETIRE: &str = "Void/Retire";
pub const DATA_TYPE: &str = "Data type";
pub const DATA_CLASS: &str = "Data class";
pub const UUID: &str = "Uuid";
pub const ABSOLUTE_HIGH: &str = "Absolute high";
pub const CRITICAL_HIGH: &str = "Critical high";
pub const NORMAL_HIGH: &str = "Normal high";
pub const ABSOLUTE_LOW: &str = "Absolute low";
pub const CRITICAL_LOW: &str = "Critical low";
pub const NORMAL_LOW: &str = "Normal low";
pub const UNITS: &str = "Units";
pub const ALLOW_DECIMALS: &str = "Allow decimals";
pub const DISPLAY_PRECISION: &str = "Display precision";
pub const ANSWERS: &str = "Answers";
pub const SAME_AS_MAPPINGS: &str = "Same as mappings";
pub const MEMBERS: &str = "Members";

const LIST_SEPARATOR: char = ';';

/// One CSV row: column name to cell value, in first-written order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConceptRow {
    cells: Attributes,
}

impl ConceptRow {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells.get(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(column, _)| column)
    }

    fn set(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.cells.push(column, value);
    }

    fn set_optional(&mut self, column: &str, value: Option<&String>) {
        if let Some(value) = value {
            self.set(column, value.as_str());
        }
    }

    /// Appends to a `;`-separated list cell.
    fn append(&mut self, column: &str, value: &str) {
        let joined = match self.cells.get(column) {
            Some(existing) => format!("{existing}{LIST_SEPARATOR}{value}"),
            None => value.to_string(),
        };
        self.set(column, joined);
    }
}

/// Result of writing one concept CSV.
#[derive(Debug, Clone)]
pub struct CsvSummary {
    pub path: PathBuf,
    pub rows: usize,
    pub columns: usize,
}

/// Flattens `batch` into one row per concept, in concept load order.
///
/// # Errors
///
/// Fails when a datatype, class or reference term is not in `dictionary`, or
/// when a record points at a concept the batch does not contain.
pub fn denormalize(
    batch: &ConceptBatch,
    dictionary: &ReferenceDictionary,
) -> rmd_model::Result<Vec<ConceptRow>> {
    let mut rows = Vec::with_capacity(batch.concepts.len());
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(batch.concepts.len());
    for concept in &batch.concepts {
        index.insert(concept.concept_id.as_str(), rows.len());
        rows.push(base_row(concept, dictionary)?);
    }
    let row_of = |concept_id: &str, referrer: &str| -> rmd_model::Result<usize> {
        let concept = batch.concept(concept_id, referrer)?;
        Ok(index[concept.concept_id.as_str()])
    };

    for description in &batch.descriptions {
        let row = row_of(&description.concept_id, ConceptDescription::ELEMENT)?;
        rows[row].set(
            format!("Description:{}", description.locale),
            description.description.as_str(),
        );
    }

    for answer in &batch.answers {
        let row = row_of(&answer.concept_id, ConceptAnswer::ELEMENT)?;
        let target = batch.concept(&answer.answer_concept, ConceptAnswer::ELEMENT)?;
        rows[row].append(ANSWERS, &target.uuid);
    }

    for name in &batch.names {
        let row = row_of(&name.concept_id, ConceptName::ELEMENT)?;
        let column = match name.name_type {
            NameType::FullySpecified => format!("Fully specified name:{}", name.locale),
            NameType::Short => format!("Short name:{}", name.locale),
        };
        rows[row].set(column, name.name.as_str());
    }

    for mapping in &batch.reference_maps {
        let row = row_of(&mapping.concept_id, ConceptReferenceMap::ELEMENT)?;
        let term = dictionary.resolve(ReferenceKind::Term, &mapping.reference_term_id)?;
        rows[row].append(SAME_AS_MAPPINGS, term);
    }

    for member in &batch.set_members {
        let row = row_of(&member.concept_set, ConceptSetMember::ELEMENT)?;
        let target = batch.concept(&member.concept_id, ConceptSetMember::ELEMENT)?;
        rows[row].append(MEMBERS, &target.uuid);
    }

    Ok(rows)
}

/// Columns follow the concept's attribute order, numeric attributes included.
fn base_row(concept: &Concept, dictionary: &ReferenceDictionary) -> rmd_model::Result<ConceptRow> {
    let mut row = ConceptRow::default();
    for attribute in &concept.attribute_order {
        match attribute.as_str() {
            "retired" => row.set_optional(VOID_RETIRE, concept.retired.as_ref()),
            "datatype_id" => {
                if let Some(datatype_id) = &concept.datatype_id {
                    row.set(DATA_TYPE, dictionary.resolve(ReferenceKind::Datatype, datatype_id)?);
                }
            }
            "class_id" => {
                if let Some(class_id) = &concept.class_id {
                    row.set(DATA_CLASS, dictionary.resolve(ReferenceKind::Class, class_id)?);
                }
            }
            "uuid" => row.set(UUID, concept.uuid.as_str()),
            other => {
                if let Some((column, value)) = numeric_cell(&concept.numeric, other) {
                    row.set_optional(column, value);
                }
            }
        }
    }
    Ok(row)
}

/// Column and value of a numeric attribute. `precise` overrides `allow_decimal`.
fn numeric_cell<'a>(
    numeric: &'a NumericRange,
    attribute: &str,
) -> Option<(&'static str, Option<&'a String>)> {
    let cell = match attribute {
        "hi_absolute" => (ABSOLUTE_HIGH, numeric.hi_absolute.as_ref()),
        "hi_critical" => (CRITICAL_HIGH, numeric.hi_critical.as_ref()),
        "hi_normal" => (NORMAL_HIGH, numeric.hi_normal.as_ref()),
        "low_absolute" => (ABSOLUTE_LOW, numeric.low_absolute.as_ref()),
        "low_critical" => (CRITICAL_LOW, numeric.low_critical.as_ref()),
        "low_normal" => (NORMAL_LOW, numeric.low_normal.as_ref()),
        "units" => (UNITS, numeric.units.as_ref()),
        "allow_decimal" | "precise" => (
            ALLOW_DECIMALS,
            numeric.precise.as_ref().or(numeric.allow_decimal.as_ref()),
        ),
        "display_precision" => (DISPLAY_PRECISION, numeric.display_precision.as_ref()),
        _ => return None,
    };
    Some(cell)
}

/// Column names in first-seen order, followed by the Initializer metadata columns.
pub fn csv_header(rows: &[ConceptRow], version: &str) -> Vec<String> {
    let mut header: Vec<String> = Vec::new();
    for row in rows {
        for column in row.columns() {
            if !header.iter().any(|known| known == column) {
                header.push(column.to_string());
            }
        }
    }
    header.push(format!("_version:{version}"));
    header.push("_order:0".to_string());
    header
}

/// Writes `rows` to `path`. Cells a row does not carry are left empty.
pub fn write_concept_csv(path: &Path, rows: &[ConceptRow], version: &str) -> Result<CsvSummary> {
    if let Some(parent) = path.parent() {
        ensure_output_dir(parent)?;
    }
    let header = csv_header(rows, version);
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::NonNumeric)
        .terminator(Terminator::CRLF)
        .from_path(path)
        .with_context(|| format!("create {}", path.display()))?;

    writer
        .write_record(&header)
        .with_context(|| format!("write header to {}", path.display()))?;
    for row in rows {
        let record = header
            .iter()
            .map(|column| row.get(column).unwrap_or_default());
        writer
            .write_record(record)
            .with_context(|| format!("write row to {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("flush {}", path.display()))?;

    Ok(CsvSummary {
        path: path.to_path_buf(),
        rows: rows.len(),
        columns: header.len(),
    })
}

/// Converts one extracted concept file into `<Name>.csv` under `dest_dir`.
///
/// The main concepts file takes its numeric attributes from `numeric`; when
/// that companion is missing the merge is skipped.
pub fn convert_concept_file(
    source: &Path,
    batch: &BatchName,
    numeric: Option<&Path>,
    dictionary: &ReferenceDictionary,
    dest_dir: &Path,
) -> Result<CsvSummary> {
    let mut concepts = load_concept_batch(source)?;
    if rmd_ingest::is_main_concepts(&source_file_name(source)) {
        match numeric {
            Some(numeric_path) => {
                let rows = load_numeric_concepts(numeric_path)?;
                let merged = concepts
                    .merge_numeric(&rows)
                    .with_context(|| format!("merge {}", numeric_path.display()))?;
                info!(file = %numeric_path.display(), merged, "merged numeric concepts");
            }
            None => warn!(
                file = %source.display(),
                "no numeric concepts file selected; numeric attributes left out"
            ),
        }
    }

    let rows = denormalize(&concepts, dictionary)
        .with_context(|| format!("denormalize {}", source.display()))?;
    let summary = write_concept_csv(&dest_dir.join(batch.csv_file_name()), &rows, &batch.version)?;
    info!(
        csv = %summary.path.display(),
        rows = summary.rows,
        columns = summary.columns,
        "wrote concept CSV"
    );
    Ok(summary)
}

fn source_file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use rmd_model::{MetadataRecord, ReferenceMetadata};

    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> Attributes {
        pairs.iter().copied().collect()
    }

    fn concept(id: &str, uuid: &str) -> Concept {
        Concept::from_attributes(&attrs(&[
            ("concept_id", id),
            ("retired", "false"),
            ("datatype_id", "1"),
            ("class_id", "2"),
            ("uuid", uuid),
        ]))
        .unwrap()
    }

    fn dictionary() -> ReferenceDictionary {
        let mut metadata = ReferenceMetadata::new();
        for (kind, pairs) in [
            (
                ReferenceKind::Datatype,
                &[("concept_datatype_id", "1"), ("name", "Numeric"), ("uuid", "dt")][..],
            ),
            (
                ReferenceKind::Class,
                &[("concept_class_id", "2"), ("name", "Test"), ("uuid", "cl")][..],
            ),
            (
                ReferenceKind::Source,
                &[("concept_source_id", "1"), ("name", "CIEL"), ("uuid", "src")][..],
            ),
            (
                ReferenceKind::Term,
                &[
                    ("concept_reference_term_id", "10"),
                    ("concept_source_id", "1"),
                    ("code", "5089"),
                    ("uuid", "term"),
                ][..],
            ),
        ] {
            metadata.insert(MetadataRecord::from_attributes(kind, attrs(pairs)).unwrap());
        }
        let mut dictionary = ReferenceDictionary::new();
        dictionary.extend(&metadata).unwrap();
        dictionary
    }

    fn single_concept_batch() -> ConceptBatch {
        let mut batch = ConceptBatch::new();
        batch.concepts.insert(concept("3", "abc-1"));
        batch.descriptions.insert(
            ConceptDescription::from_attributes(&attrs(&[
                ("uuid", "d-1"),
                ("concept_id", "3"),
                ("locale", "en"),
                ("description", "desc"),
            ]))
            .unwrap(),
        );
        batch.names.insert(
            ConceptName::from_attributes(&attrs(&[
                ("uuid", "n-1"),
                ("concept_id", "3"),
                ("locale", "en"),
                ("name", "Name"),
                ("concept_name_type", "FULLY_SPECIFIED"),
            ]))
            .unwrap(),
        );
        batch
    }

    #[test]
    fn test_single_concept_row() {
        let rows = denormalize(&single_concept_batch(), &dictionary()).unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.get(DATA_TYPE), Some("Numeric"));
        assert_eq!(row.get(DATA_CLASS), Some("Test"));
        assert_eq!(row.get(UUID), Some("abc-1"));
        assert_eq!(row.get("Description:en"), Some("desc"));
        assert_eq!(row.get("Fully specified name:en"), Some("Name"));

        let columns: Vec<&str> = row.columns().collect();
        assert_eq!(
            columns,
            vec![
                VOID_RETIRE,
                DATA_TYPE,
                DATA_CLASS,
                UUID,
                "Description:en",
                "Fully specified name:en"
            ]
        );
        let header = csv_header(&rows, "20");
        assert_eq!(header[header.len() - 2..], ["_version:20", "_order:0"]);
    }

    #[test]
    fn test_answers_are_joined_in_order() {
        let mut batch = ConceptBatch::new();
        for (id, uuid) in [("1", "q"), ("2", "u1"), ("3", "u2")] {
            batch.concepts.insert(concept(id, uuid));
        }
        for (uuid, answer) in [("a-1", "2"), ("a-2", "3")] {
            batch.answers.insert(
                ConceptAnswer::from_attributes(&attrs(&[
                    ("uuid", uuid),
                    ("concept_id", "1"),
                    ("answer_concept", answer),
                ]))
                .unwrap(),
            );
        }

        let rows = denormalize(&batch, &dictionary()).unwrap();
        assert_eq!(rows[0].get(ANSWERS), Some("u1;u2"));
        assert_eq!(rows[1].get(ANSWERS), None);
    }

    #[test]
    fn test_members_land_on_owner_row() {
        let mut batch = ConceptBatch::new();
        batch.concepts.insert(concept("1", "owner-uuid"));
        batch.concepts.insert(concept("2", "member-uuid"));
        batch.set_members.insert(
            ConceptSetMember::from_attributes(&attrs(&[
                ("uuid", "s-1"),
                ("concept_set", "1"),
                ("concept_id", "2"),
            ]))
            .unwrap(),
        );

        let rows = denormalize(&batch, &dictionary()).unwrap();
        assert_eq!(rows[0].get(MEMBERS), Some("member-uuid"));
        assert_eq!(rows[1].get(MEMBERS), None);
    }

    #[test]
    fn test_mappings_and_short_names() {
        let mut batch = ConceptBatch::new();
        batch.concepts.insert(concept("3", "abc-1"));
        batch.reference_maps.insert(
            ConceptReferenceMap::from_attributes(&attrs(&[
                ("uuid", "m-1"),
                ("concept_id", "3"),
                ("concept_reference_term_id", "10"),
            ]))
            .unwrap(),
        );
        batch.names.insert(
            ConceptName::from_attributes(&attrs(&[
                ("uuid", "n-2"),
                ("concept_id", "3"),
                ("locale", "fr"),
                ("name", "Poids"),
                ("concept_name_type", "SHORT"),
            ]))
            .unwrap(),
        );

        let rows = denormalize(&batch, &dictionary()).unwrap();
        assert_eq!(rows[0].get(SAME_AS_MAPPINGS), Some("CIEL:5089"));
        assert_eq!(rows[0].get("Short name:fr"), Some("Poids"));
    }

    #[test]
    fn test_allow_decimals_prefers_precise() {
        let mut batch = ConceptBatch::new();
        batch.concepts.insert(
            Concept::from_attributes(&attrs(&[
                ("concept_id", "3"),
                ("uuid", "abc-1"),
                ("allow_decimal", "true"),
                ("precise", "false"),
                ("units", "kg"),
            ]))
            .unwrap(),
        );
        let rows = denormalize(&batch, &dictionary()).unwrap();
        assert_eq!(rows[0].get(ALLOW_DECIMALS), Some("false"));
        assert_eq!(rows[0].get(UNITS), Some("kg"));
        assert_eq!(rows[0].get(DATA_TYPE), None);
        let columns: Vec<&str> = rows[0].columns().collect();
        assert_eq!(columns, vec![UUID, ALLOW_DECIMALS, UNITS]);
    }

    #[test]
    fn test_columns_follow_attribute_order() {
        let mut batch = ConceptBatch::new();
        batch.concepts.insert(
            Concept::from_attributes(&attrs(&[
                ("uuid", "abc-1"),
                ("concept_id", "3"),
                ("class_id", "2"),
                ("units", "kg"),
                ("retired", "false"),
            ]))
            .unwrap(),
        );
        let numeric = rmd_model::NumericConcept::from_attributes(&attrs(&[
            ("concept_id", "3"),
            ("hi_normal", "90"),
            ("units", "g"),
        ]))
        .unwrap();
        batch.merge_numeric([&numeric]).unwrap();

        let rows = denormalize(&batch, &dictionary()).unwrap();
        let columns: Vec<&str> = rows[0].columns().collect();
        assert_eq!(columns, vec![UUID, DATA_CLASS, UNITS, VOID_RETIRE, NORMAL_HIGH]);
        assert_eq!(rows[0].get(UNITS), Some("g"));
    }

    #[test]
    fn test_repeated_locale_keeps_last_value_in_first_position() {
        let mut batch = single_concept_batch();
        batch.descriptions.insert(
            ConceptDescription::from_attributes(&attrs(&[
                ("uuid", "d-2"),
                ("concept_id", "3"),
                ("locale", "en"),
                ("description", "newer desc"),
            ]))
            .unwrap(),
        );
        batch.names.insert(
            ConceptName::from_attributes(&attrs(&[
                ("uuid", "n-9"),
                ("concept_id", "3"),
                ("locale", "en"),
                ("name", "Renamed"),
            ]))
            .unwrap(),
        );

        let rows = denormalize(&batch, &dictionary()).unwrap();
        let row = &rows[0];
        assert_eq!(row.get("Description:en"), Some("newer desc"));
        assert_eq!(row.get("Fully specified name:en"), Some("Renamed"));
        let columns: Vec<&str> = row.columns().collect();
        assert_eq!(
            columns,
            vec![
                VOID_RETIRE,
                DATA_TYPE,
                DATA_CLASS,
                UUID,
                "Description:en",
                "Fully specified name:en"
            ]
        );
    }

    #[test]
    fn test_unknown_references_are_fatal() {
        let mut batch = ConceptBatch::new();
        batch.concepts.insert(concept("1", "q"));
        batch.answers.insert(
            ConceptAnswer::from_attributes(&attrs(&[
                ("uuid", "a-1"),
                ("concept_id", "1"),
                ("answer_concept", "404"),
            ]))
            .unwrap(),
        );
        let err = denormalize(&batch, &dictionary()).unwrap_err();
        assert!(matches!(
            err,
            rmd_model::ModelError::UnknownConcept { ref concept_id, .. } if concept_id == "404"
        ));

        let mut batch = ConceptBatch::new();
        batch.concepts.insert(
            Concept::from_attributes(&attrs(&[
                ("concept_id", "1"),
                ("uuid", "q"),
                ("datatype_id", "99"),
            ]))
            .unwrap(),
        );
        assert!(matches!(
            denormalize(&batch, &dictionary()),
            Err(rmd_model::ModelError::UnresolvedReference {
                kind: ReferenceKind::Datatype,
                ..
            })
        ));
    }

    #[test]
    fn test_write_concept_csv() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("Reference_Application_Concepts.csv");
        let rows = denormalize(&single_concept_batch(), &dictionary()).unwrap();

        let summary = write_concept_csv(&path, &rows, "20").unwrap();
        assert_eq!(summary.rows, 1);
        assert_eq!(summary.columns, 8);

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.split("\r\n").collect();
        assert_eq!(
            lines[0],
            "\"Void/Retire\",\"Data type\",\"Data class\",\"Uuid\",\"Description:en\",\
             \"Fully specified name:en\",\"_version:20\",\"_order:0\""
        );
        assert!(lines[1].starts_with(
            "\"false\",\"Numeric\",\"Test\",\"abc-1\",\"desc\",\"Name\","
        ));
        assert_eq!(lines[2], "");
    }
}
