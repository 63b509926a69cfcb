//! Reference Metadata ingestion.
//!
//! This crate reads the Reference Metadata module archive and turns its
//! payload into `rmd-model` records.
//!
//! # Features
//!
//! - **Classification**: Decide what each archive entry is by name
//! - **Extraction**: Pull concept files and nested packages out of the archive
//! - **XML Loading**: Parse flat XML datasets into concept and reference records
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use rmd_ingest::{ModuleArchive, NumericEra, select_concept_files};
//!
//! let mut archive = ModuleArchive::open(Path::new("referencemetadata-2.9.0.omod"))?;
//! let names = archive.entry_names()?;
//! let files = select_concept_files(names.iter().map(String::as_str), NumericEra::Post2x);
//! ```

mod archive;
mod classify;
mod error;
mod xml;

// === Error Types ===
pub use error::{IngestError, Result};

// === Classification ===
pub use classify::{
    BatchName, EntryRole, NumericEra, batch_files, classify, is_concept_file, is_main_concepts,
    is_metadata_package, is_numeric_concepts, is_support_library, numeric_companion, numeric_era,
    parse_batch_name, processing_order, require_batch_name, select_concept_files,
};

// === Archives ===
pub use archive::{EntryLayout, ModuleArchive, discard_extracted};

// === XML Records ===
pub use xml::{
    XmlRecord, concept_batch_from_records, load_concept_batch, load_numeric_concepts,
    load_reference_metadata, numeric_concepts_from_records, parse_records, read_records,
    reference_metadata_from_records,
};
