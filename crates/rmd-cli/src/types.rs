use std::path::PathBuf;

use rmd_ingest::NumericEra;
use rmd_model::ReferenceKind;
use rmd_output::CsvSummary;

/// Inputs of one conversion run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub omod: PathBuf,
    /// Root that receives the `configuration` directory.
    pub output_root: PathBuf,
    pub numeric_era: NumericEra,
}

#[derive(Debug, Clone)]
pub struct PackageSummary {
    pub path: PathBuf,
    pub items: usize,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub configuration_dir: PathBuf,
    /// Pre-built packages copied out of the support library.
    pub extracted_packages: Vec<PathBuf>,
    /// Packages generated from concept files, in build order.
    pub packages: Vec<PackageSummary>,
    pub csv_files: Vec<CsvSummary>,
    /// Numeric concepts file merged into the main concepts, if any.
    pub numeric_file: Option<String>,
    pub dictionary_sizes: Vec<(ReferenceKind, usize)>,
}
