//! Reference Metadata output generation.
//!
//! This crate turns loaded batches into the two Initializer inputs:
//!
//! - **Metadata packages**: `header.xml` + `metadata.xml` ZIPs for the
//!   metadata-sharing module
//! - **Concept CSVs**: one flattened row per concept, surrogate ids resolved

mod common;
mod concepts;
pub mod package;

pub use concepts::{
    ABSOLUTE_HIGH, ABSOLUTE_LOW, ALLOW_DECIMALS, ANSWERS, CRITICAL_HIGH, CRITICAL_LOW, ConceptRow,
    CsvSummary, DATA_CLASS, DATA_TYPE, DISPLAY_PRECISION, MEMBERS, NORMAL_HIGH, NORMAL_LOW,
    SAME_AS_MAPPINGS, UNITS, UUID, VOID_RETIRE, convert_concept_file, csv_header, denormalize,
    write_concept_csv,
};
pub use package::{
    HEADER_ENTRY, METADATA_ENTRY, MetadataPackage, PackageHeader, build_package, render_header,
    render_metadata, select_new_items, write_package,
};

pub use common::{MODULE_VERSIONS, PLATFORM_VERSION, camel_case, ensure_output_dir};
