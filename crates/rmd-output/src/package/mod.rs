//! Metadata-sharing package generation.
//!
//! Each concept batch becomes one `<Name>-<version>.zip` package holding a
//! `header.xml` item listing and a `metadata.xml` object graph. Only records
//! not already introduced by an earlier batch are packaged; concept sources
//! are the exception and travel with every package.

mod header;
mod metadata;

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use rmd_ingest::BatchName;
use rmd_model::{ReferenceDictionary, ReferenceMetadata};

use crate::common::{TIMESTAMP_FORMAT, ensure_output_dir};

pub use header::{PackageHeader, render_header};
pub use metadata::render_metadata;

pub const HEADER_ENTRY: &str = "header.xml";
pub const METADATA_ENTRY: &str = "metadata.xml";

/// A rendered package, ready to be written.
#[derive(Debug, Clone)]
pub struct MetadataPackage {
    pub file_name: String,
    pub header_xml: String,
    pub metadata_xml: String,
    /// Number of records listed in the package.
    pub item_count: usize,
}

/// Records of `metadata` that `dictionary` does not know yet.
///
/// Sources are always kept.
pub fn select_new_items(
    metadata: &ReferenceMetadata,
    dictionary: &ReferenceDictionary,
) -> ReferenceMetadata {
    let mut items = ReferenceMetadata::new();
    for record in metadata.iter() {
        let known = dictionary.contains(record.kind, &record.surrogate_id);
        if known && record.kind.deduplicated_across_batches() {
            debug!(
                kind = %record.kind,
                id = %record.surrogate_id,
                "skipping record packaged by an earlier batch"
            );
            continue;
        }
        items.insert(record.clone());
    }
    items
}

/// Builds the package for one batch and records its new items in `dictionary`.
pub fn build_package(
    metadata: &ReferenceMetadata,
    dictionary: &mut ReferenceDictionary,
    batch: &BatchName,
) -> Result<MetadataPackage> {
    let items = select_new_items(metadata, dictionary);

    let date_created = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
    let header = PackageHeader::new(&batch.display_name(), &batch.version, date_created);
    let header_xml = render_header(&header, &items)?;
    let metadata_xml = render_metadata(&items, dictionary)
        .with_context(|| format!("render metadata for {}", batch.name))?;

    // only a fully rendered package may introduce entries
    dictionary
        .extend(&items)
        .with_context(|| format!("extend reference dictionary from {}", batch.name))?;

    Ok(MetadataPackage {
        file_name: batch.package_file_name(),
        header_xml,
        metadata_xml,
        item_count: items.len(),
    })
}

/// Writes `package` into `dir` as a deflated ZIP and returns its path.
pub fn write_package(dir: &Path, package: &MetadataPackage) -> Result<PathBuf> {
    ensure_output_dir(dir)?;
    let path = dir.join(&package.file_name);
    let file = File::create(&path).with_context(|| format!("create {}", path.display()))?;
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (entry, content) in [
        (HEADER_ENTRY, &package.header_xml),
        (METADATA_ENTRY, &package.metadata_xml),
    ] {
        zip.start_file(entry, options)
            .with_context(|| format!("add {entry} to {}", path.display()))?;
        zip.write_all(content.as_bytes())
            .with_context(|| format!("write {entry} to {}", path.display()))?;
    }
    zip.finish()
        .with_context(|| format!("finish {}", path.display()))?;

    info!(
        package = %package.file_name,
        items = package.item_count,
        "wrote metadata package"
    );
    Ok(path)
}
