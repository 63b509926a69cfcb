//! Conversion pipeline: extract, repackage, denormalize.
//!
//! Stages run strictly in sequence. Repackaging every batch first means the
//! reference dictionary is complete before any concept is denormalized.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info, info_span, warn};

use rmd_ingest::{
    EntryLayout, IngestError, ModuleArchive, batch_files, discard_extracted, is_main_concepts,
    is_metadata_package, is_support_library, load_reference_metadata, numeric_companion,
    processing_order, require_batch_name, select_concept_files,
};
use rmd_model::{ReferenceDictionary, ReferenceKind};
use rmd_output::{CsvSummary, build_package, convert_concept_file, write_package};

pub use crate::types::{PackageSummary, PipelineOptions, RunReport};

pub const CONFIGURATION_DIR: &str = "configuration";
pub const METADATASHARING_DIR: &str = "metadatasharing";
pub const CONCEPTS_DIR: &str = "concepts";

/// Output directories of a run.
///
/// The configuration directory doubles as scratch space for extracted files.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    pub configuration: PathBuf,
    pub metadatasharing: PathBuf,
    pub concepts: PathBuf,
}

impl OutputLayout {
    pub fn new(root: &Path) -> Self {
        let configuration = root.join(CONFIGURATION_DIR);
        Self {
            metadatasharing: configuration.join(METADATASHARING_DIR),
            concepts: configuration.join(CONCEPTS_DIR),
            configuration,
        }
    }

    /// Creates the directories. The configuration directory must not exist yet.
    pub fn create(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)
            .with_context(|| format!("create output directory {}", root.display()))?;
        let layout = Self::new(root);
        for dir in [&layout.configuration, &layout.metadatasharing, &layout.concepts] {
            fs::create_dir(dir)
                .with_context(|| format!("create output directory {}", dir.display()))?;
        }
        Ok(layout)
    }
}

/// Runs a full conversion.
pub fn run(options: &PipelineOptions) -> Result<RunReport> {
    let span = info_span!(
        "convert",
        omod = %options.omod.display(),
        era = options.numeric_era.label()
    );
    let _guard = span.enter();

    let layout = OutputLayout::create(&options.output_root)?;
    let mut archive = ModuleArchive::open(&options.omod)
        .with_context(|| format!("open module archive {}", options.omod.display()))?;
    let entry_names = archive.entry_names()?;
    let library = entry_names
        .iter()
        .find(|name| is_support_library(name))
        .ok_or_else(|| IngestError::EntryNotFound {
            what: "referencemetadata-api library".to_string(),
            path: options.omod.clone(),
        })?
        .clone();
    let concept_files =
        select_concept_files(entry_names.iter().map(String::as_str), options.numeric_era);
    info!(
        entries = entry_names.len(),
        concept_files = concept_files.len(),
        "classified module entries"
    );

    let extracted_packages = info_span!("extract_packages")
        .in_scope(|| extract_packages(&mut archive, &library, &layout))?;
    let extracted = info_span!("extract_concepts")
        .in_scope(|| extract_concept_files(&mut archive, &concept_files, &layout))?;

    let mut dictionary = ReferenceDictionary::new();
    let packages = info_span!("repackage").in_scope(|| {
        repackage(&concept_files, &extracted, &mut dictionary, &layout)
    })?;

    let numeric_file = numeric_companion(&concept_files).map(str::to_string);
    let csv_files = info_span!("denormalize").in_scope(|| {
        denormalize(
            &concept_files,
            &extracted,
            numeric_file.as_deref(),
            &dictionary,
            &layout,
        )
    })?;

    let dictionary_sizes = ReferenceKind::ALL
        .into_iter()
        .map(|kind| (kind, dictionary.len(kind)))
        .collect();
    info!(
        packages = packages.len(),
        csv_files = csv_files.len(),
        "conversion complete"
    );

    Ok(RunReport {
        configuration_dir: layout.configuration,
        extracted_packages,
        packages,
        csv_files,
        numeric_file,
        dictionary_sizes,
    })
}

/// Copies the pre-built packages bundled in the support library.
fn extract_packages(
    archive: &mut ModuleArchive,
    library: &str,
    layout: &OutputLayout,
) -> Result<Vec<PathBuf>> {
    let jar_path = archive.extract_entry(library, &layout.configuration, EntryLayout::Preserve)?;
    let packages = {
        let mut jar = ModuleArchive::open(&jar_path)?;
        jar.extract_matching(is_metadata_package, &layout.metadatasharing, EntryLayout::Flatten)?
    };
    discard_extracted(&layout.configuration, &jar_path)?;
    info!(
        library,
        packages = packages.len(),
        "extracted bundled metadata packages"
    );
    Ok(packages)
}

fn extract_concept_files(
    archive: &mut ModuleArchive,
    concept_files: &[String],
    layout: &OutputLayout,
) -> Result<BTreeMap<String, PathBuf>> {
    let mut extracted = BTreeMap::new();
    for name in concept_files {
        let path = archive.extract_entry(name, &layout.configuration, EntryLayout::Preserve)?;
        extracted.insert(name.clone(), path);
    }
    info!(files = extracted.len(), "extracted concept files");
    Ok(extracted)
}

fn extracted_path<'a>(extracted: &'a BTreeMap<String, PathBuf>, name: &str) -> Result<&'a Path> {
    extracted
        .get(name)
        .map(PathBuf::as_path)
        .ok_or_else(|| anyhow!("concept file {name} was not extracted"))
}

fn repackage(
    concept_files: &[String],
    extracted: &BTreeMap<String, PathBuf>,
    dictionary: &mut ReferenceDictionary,
    layout: &OutputLayout,
) -> Result<Vec<PackageSummary>> {
    let mut packages = Vec::new();
    for name in batch_files(concept_files) {
        let batch = require_batch_name(name)?;
        let metadata = load_reference_metadata(extracted_path(extracted, name)?)?;
        let package = build_package(&metadata, dictionary, &batch)
            .with_context(|| format!("build package for {name}"))?;
        let path = write_package(&layout.metadatasharing, &package)?;
        packages.push(PackageSummary {
            path,
            items: package.item_count,
        });
    }
    Ok(packages)
}

fn denormalize(
    concept_files: &[String],
    extracted: &BTreeMap<String, PathBuf>,
    numeric_file: Option<&str>,
    dictionary: &ReferenceDictionary,
    layout: &OutputLayout,
) -> Result<Vec<CsvSummary>> {
    let numeric_path = numeric_file
        .map(|name| extracted_path(extracted, name))
        .transpose()?;

    let mut summaries = Vec::new();
    for name in processing_order(concept_files) {
        let batch = require_batch_name(name)?;
        let source = extracted_path(extracted, name)?;
        let summary = convert_concept_file(source, &batch, numeric_path, dictionary, &layout.concepts)?;
        remove_scratch_file(source)?;
        if is_main_concepts(name)
            && let Some(numeric) = numeric_path
        {
            remove_scratch_file(numeric)?;
        }
        summaries.push(summary);
    }

    if let Some(numeric) = numeric_path
        && numeric.exists()
    {
        warn!(
            file = %numeric.display(),
            "numeric concepts file has no main concepts file to merge into"
        );
        remove_scratch_file(numeric)?;
    }
    Ok(summaries)
}

fn remove_scratch_file(path: &Path) -> Result<()> {
    fs::remove_file(path).with_context(|| format!("remove {}", path.display()))?;
    debug!(file = %path.display(), "removed extracted file");
    Ok(())
}
