//! Archive entry classification.
//!
//! The Reference Metadata module ships its payload as differently named
//! entries; everything here is pure name matching.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{IngestError, Result};

fn pattern(source: &str) -> Regex {
    Regex::new(source).unwrap_or_else(|err| panic!("invalid built-in pattern {source}: {err}"))
}

static METADATA_PACKAGE: LazyLock<Regex> = LazyLock::new(|| pattern(r".*\.zip$"));
static SUPPORT_LIBRARY: LazyLock<Regex> =
    LazyLock::new(|| pattern(r".*referencemetadata-api-.*\.jar$"));
static CONCEPT_FILE: LazyLock<Regex> = LazyLock::new(|| pattern(r"^Reference_Application_.*\.xml$"));
static PRE_2X_NUMERIC: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"^Reference_Application_Numeric_Concepts-.*-pre2\.x\.xml$")
});
static POST_2X_NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^Reference_Application_Numeric_Concepts-.*-2\.x\.xml$"));
static NUMERIC_CONCEPTS: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^Reference_Application_Numeric_Concepts-.*\.xml$"));
static MAIN_CONCEPTS: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^Reference_Application_Concepts-.*\.xml$"));
static BATCH_NAME: LazyLock<Regex> = LazyLock::new(|| pattern(r"^([A-Za-z_]+)-([0-9]+)\.xml$"));

/// Concept files are converted in this order; anything else follows in archive order.
static PROCESSING_PRIORITY: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        pattern(r"^Reference_Application_Concepts-.*\.xml$"),
        pattern(r"^Reference_Application_Diagnoses-.*\.xml$"),
        pattern(r"^Reference_Application_Order_Entry_.*\.xml$"),
    ]
});

/// Platform era of the numeric-concepts file to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NumericEra {
    /// Platform releases before 2.x.
    Pre2x,
    /// Platform 2.x and later.
    #[default]
    Post2x,
}

impl NumericEra {
    pub fn from_pre_2x_flag(pre_2x: bool) -> Self {
        if pre_2x { Self::Pre2x } else { Self::Post2x }
    }

    /// True when `name` is this era's numeric file.
    pub fn matches(self, name: &str) -> bool {
        match self {
            Self::Pre2x => PRE_2X_NUMERIC.is_match(name),
            Self::Post2x => POST_2X_NUMERIC.is_match(name),
        }
    }

    /// True when `name` is the other era's numeric file.
    pub fn excludes(self, name: &str) -> bool {
        self.other().matches(name)
    }

    pub const fn other(self) -> Self {
        match self {
            Self::Pre2x => Self::Post2x,
            Self::Post2x => Self::Pre2x,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pre2x => "pre-2.x",
            Self::Post2x => "2.x",
        }
    }
}

/// Role an archive entry plays in the conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryRole {
    /// Pre-built metadata-sharing package.
    MetadataPackage,
    /// Java library bundling the pre-built packages.
    SupportLibrary,
    /// The main concepts file.
    MainConcepts,
    /// Numeric attributes for the main concepts, tagged with its era when known.
    NumericConcepts(Option<NumericEra>),
    /// Any other concept record file.
    ConceptRecords,
    Unrecognized,
}

/// Classifies an entry name; the most specific role wins.
pub fn classify(name: &str) -> EntryRole {
    if SUPPORT_LIBRARY.is_match(name) {
        EntryRole::SupportLibrary
    } else if METADATA_PACKAGE.is_match(name) {
        EntryRole::MetadataPackage
    } else if NUMERIC_CONCEPTS.is_match(name) {
        EntryRole::NumericConcepts(numeric_era(name))
    } else if MAIN_CONCEPTS.is_match(name) {
        EntryRole::MainConcepts
    } else if CONCEPT_FILE.is_match(name) {
        EntryRole::ConceptRecords
    } else {
        EntryRole::Unrecognized
    }
}

pub fn is_metadata_package(name: &str) -> bool {
    METADATA_PACKAGE.is_match(name)
}

pub fn is_support_library(name: &str) -> bool {
    SUPPORT_LIBRARY.is_match(name)
}

pub fn is_concept_file(name: &str) -> bool {
    CONCEPT_FILE.is_match(name)
}

pub fn is_numeric_concepts(name: &str) -> bool {
    NUMERIC_CONCEPTS.is_match(name)
}

pub fn is_main_concepts(name: &str) -> bool {
    MAIN_CONCEPTS.is_match(name)
}

pub fn numeric_era(name: &str) -> Option<NumericEra> {
    [NumericEra::Pre2x, NumericEra::Post2x]
        .into_iter()
        .find(|era| era.matches(name))
}

/// Package name and version carried by a concept file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchName {
    /// Name as written in the file name, underscores included.
    pub name: String,
    pub version: String,
}

impl BatchName {
    /// Human-readable name (underscores become spaces).
    pub fn display_name(&self) -> String {
        self.name.replace('_', " ")
    }

    pub fn package_file_name(&self) -> String {
        format!("{}-{}.zip", self.name, self.version)
    }

    pub fn csv_file_name(&self) -> String {
        format!("{}.csv", self.name)
    }
}

/// Extracts `(name, version)` from `Name_With_Underscores-<digits>.xml`.
pub fn parse_batch_name(file_name: &str) -> Option<BatchName> {
    let captures = BATCH_NAME.captures(file_name)?;
    Some(BatchName {
        name: captures[1].to_string(),
        version: captures[2].to_string(),
    })
}

/// Like [`parse_batch_name`], but an unrecognized name is an error.
pub fn require_batch_name(file_name: &str) -> Result<BatchName> {
    parse_batch_name(file_name).ok_or_else(|| IngestError::UnrecognizedBatchName {
        name: file_name.to_string(),
    })
}

/// Concept files to extract, leaving out the other era's numeric file.
pub fn select_concept_files<'a, I>(names: I, era: NumericEra) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    names
        .into_iter()
        .filter(|name| is_concept_file(name) && !era.excludes(name))
        .map(str::to_string)
        .collect()
}

/// Files that become their own batch (everything except numeric files), in archive order.
pub fn batch_files(files: &[String]) -> Vec<&str> {
    files
        .iter()
        .map(String::as_str)
        .filter(|name| !is_numeric_concepts(name))
        .collect()
}

/// Batches in conversion order: concepts, diagnoses, order entry, then the rest.
pub fn processing_order(files: &[String]) -> Vec<&str> {
    let batches = batch_files(files);
    let mut ordered: Vec<&str> = Vec::with_capacity(batches.len());
    for priority in PROCESSING_PRIORITY.iter() {
        let matched: Vec<&str> = batches
            .iter()
            .copied()
            .filter(|name| priority.is_match(name) && !ordered.contains(name))
            .collect();
        ordered.extend(matched);
    }
    let remaining: Vec<&str> = batches
        .iter()
        .copied()
        .filter(|name| !ordered.contains(name))
        .collect();
    ordered.extend(remaining);
    ordered
}

/// The numeric file merged into the main concepts: the first remaining numeric file.
pub fn numeric_companion(files: &[String]) -> Option<&str> {
    files
        .iter()
        .map(String::as_str)
        .find(|name| is_numeric_concepts(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRE: &str = "Reference_Application_Numeric_Concepts-20-pre2.x.xml";
    const POST: &str = "Reference_Application_Numeric_Concepts-20-2.x.xml";

    #[test]
    fn test_classify_roles() {
        assert_eq!(
            classify("lib/referencemetadata-api-2.9.0.jar"),
            EntryRole::SupportLibrary
        );
        assert_eq!(
            classify("metadata/Reference_Application_Locations-1.zip"),
            EntryRole::MetadataPackage
        );
        assert_eq!(
            classify("Reference_Application_Concepts-20.xml"),
            EntryRole::MainConcepts
        );
        assert_eq!(
            classify("Reference_Application_Diagnoses-12.xml"),
            EntryRole::ConceptRecords
        );
        assert_eq!(
            classify(PRE),
            EntryRole::NumericConcepts(Some(NumericEra::Pre2x))
        );
        assert_eq!(
            classify(POST),
            EntryRole::NumericConcepts(Some(NumericEra::Post2x))
        );
        assert_eq!(classify("META-INF/MANIFEST.MF"), EntryRole::Unrecognized);
    }

    #[test]
    fn test_classify_is_stable() {
        for name in [PRE, POST, "Reference_Application_Concepts-20.xml", "x.zip"] {
            assert_eq!(classify(name), classify(name));
        }
    }

    #[test]
    fn test_eras_are_disjoint() {
        assert!(NumericEra::Pre2x.matches(PRE));
        assert!(!NumericEra::Pre2x.matches(POST));
        assert!(NumericEra::Post2x.matches(POST));
        assert!(!NumericEra::Post2x.matches(PRE));
        assert!(NumericEra::Pre2x.excludes(POST));
        assert!(NumericEra::Post2x.excludes(PRE));
    }

    #[test]
    fn test_parse_batch_name() {
        let batch = parse_batch_name("Reference_Application_Order_Entry_and_Allergies_Concepts-4.xml")
            .unwrap();
        assert_eq!(batch.name, "Reference_Application_Order_Entry_and_Allergies_Concepts");
        assert_eq!(batch.version, "4");
        assert_eq!(
            batch.display_name(),
            "Reference Application Order Entry and Allergies Concepts"
        );
        assert_eq!(
            batch.package_file_name(),
            "Reference_Application_Order_Entry_and_Allergies_Concepts-4.zip"
        );
        assert_eq!(parse_batch_name(POST), None);
        assert!(require_batch_name("notes.txt").is_err());
    }

    #[test]
    fn test_select_concept_files_pre_2x() {
        let names = [
            "lib/referencemetadata-api-2.9.0.jar",
            "Reference_Application_Concepts-20.xml",
            PRE,
            POST,
        ];
        let selected = select_concept_files(names, NumericEra::Pre2x);
        assert_eq!(selected, vec!["Reference_Application_Concepts-20.xml", PRE]);
        assert_eq!(numeric_companion(&selected), Some(PRE));
    }

    #[test]
    fn test_processing_order() {
        let files: Vec<String> = [
            "Reference_Application_Order_Entry_and_Allergies_Concepts-4.xml",
            "Reference_Application_Extra-1.xml",
            POST,
            "Reference_Application_Diagnoses-12.xml",
            "Reference_Application_Concepts-20.xml",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        assert_eq!(
            processing_order(&files),
            vec![
                "Reference_Application_Concepts-20.xml",
                "Reference_Application_Diagnoses-12.xml",
                "Reference_Application_Order_Entry_and_Allergies_Concepts-4.xml",
                "Reference_Application_Extra-1.xml",
            ]
        );
        assert_eq!(batch_files(&files).len(), 4);
    }
}
