//! Error types for Reference Metadata ingestion.

use std::path::PathBuf;
use thiserror::Error;

use rmd_model::ModelError;

/// Errors that can occur while reading the module archive and its XML files.
#[derive(Debug, Error)]
pub enum IngestError {
    // === Archive Errors ===
    /// Input archive could not be opened.
    #[error("failed to open archive {path}: {source}")]
    ArchiveOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Archive is not a readable ZIP container or an entry is corrupt.
    #[error("failed to read archive {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// No entry matched a required pattern.
    #[error("no {what} found in {path}")]
    EntryNotFound { what: String, path: PathBuf },

    /// Entry name would escape the extraction directory.
    #[error("refusing to extract unsafe entry name '{name}' from {path}")]
    UnsafeEntryName { name: String, path: PathBuf },

    /// Flattened entry would overwrite a file extracted earlier.
    #[error("entry '{name}' from {path} collides with existing {dest}")]
    EntryCollision {
        name: String,
        path: PathBuf,
        dest: PathBuf,
    },

    // === File System Errors ===
    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write or remove a file.
    #[error("failed to write {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === XML Errors ===
    /// Malformed XML.
    #[error("failed to parse XML {origin}: {source}")]
    Xml {
        origin: String,
        #[source]
        source: quick_xml::Error,
    },

    /// A record in the file is missing data the pipeline depends on.
    #[error("invalid record in {origin}: {source}")]
    Record {
        origin: String,
        #[source]
        source: ModelError,
    },

    /// Concept file name does not have the `Name-<digits>.xml` shape.
    #[error("cannot derive package name and version from '{name}'")]
    UnrecognizedBatchName { name: String },
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
