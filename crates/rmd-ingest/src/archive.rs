//! ZIP container access for the module archive and its support library.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;
use zip::ZipArchive;

use crate::error::{IngestError, Result};

/// Destination layout for extracted entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryLayout {
    /// Keep the entry's directory structure below the destination.
    Preserve,
    /// Write the entry directly into the destination, by file name.
    Flatten,
}

/// An opened ZIP container (`.omod` module or `.jar` library).
pub struct ModuleArchive {
    path: PathBuf,
    archive: ZipArchive<File>,
}

impl ModuleArchive {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| IngestError::ArchiveOpen {
            path: path.to_path_buf(),
            source,
        })?;
        let archive = ZipArchive::new(file).map_err(|source| IngestError::Archive {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            archive,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entry names in central directory order.
    pub fn entry_names(&mut self) -> Result<Vec<String>> {
        let mut names = Vec::with_capacity(self.archive.len());
        for idx in 0..self.archive.len() {
            let entry = self
                .archive
                .by_index(idx)
                .map_err(|source| IngestError::Archive {
                    path: self.path.clone(),
                    source,
                })?;
            names.push(entry.name().to_string());
        }
        Ok(names)
    }

    /// Extracts one entry below `dest_dir` and returns the written path.
    pub fn extract_entry(
        &mut self,
        name: &str,
        dest_dir: &Path,
        layout: EntryLayout,
    ) -> Result<PathBuf> {
        let mut entry = self
            .archive
            .by_name(name)
            .map_err(|source| IngestError::Archive {
                path: self.path.clone(),
                source,
            })?;
        let unsafe_name = || IngestError::UnsafeEntryName {
            name: name.to_string(),
            path: self.path.clone(),
        };
        let relative = entry.enclosed_name().ok_or_else(unsafe_name)?;
        let dest_path = match layout {
            EntryLayout::Preserve => dest_dir.join(&relative),
            EntryLayout::Flatten => dest_dir.join(relative.file_name().ok_or_else(unsafe_name)?),
        };
        if layout == EntryLayout::Flatten && dest_path.exists() {
            return Err(IngestError::EntryCollision {
                name: name.to_string(),
                path: self.path.clone(),
                dest: dest_path,
            });
        }

        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent).map_err(|source| IngestError::FileWrite {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let mut out = File::create(&dest_path).map_err(|source| IngestError::FileWrite {
            path: dest_path.clone(),
            source,
        })?;
        io::copy(&mut entry, &mut out).map_err(|source| IngestError::FileWrite {
            path: dest_path.clone(),
            source,
        })?;
        debug!(entry = name, dest = %dest_path.display(), "extracted archive entry");
        Ok(dest_path)
    }

    /// Extracts every entry whose name satisfies `predicate`.
    pub fn extract_matching<F>(
        &mut self,
        predicate: F,
        dest_dir: &Path,
        layout: EntryLayout,
    ) -> Result<Vec<PathBuf>>
    where
        F: Fn(&str) -> bool,
    {
        let names: Vec<String> = self
            .entry_names()?
            .into_iter()
            .filter(|name| predicate(name))
            .collect();
        names
            .iter()
            .map(|name| self.extract_entry(name, dest_dir, layout))
            .collect()
    }
}

/// Removes an extracted file and the directories it leaves empty, up to `root`.
pub fn discard_extracted(root: &Path, path: &Path) -> Result<()> {
    fs::remove_file(path).map_err(|source| IngestError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;
    let mut current = path.parent();
    while let Some(dir) = current {
        if dir == root || !dir.starts_with(root) {
            break;
        }
        if fs::remove_dir(dir).is_err() {
            break;
        }
        current = dir.parent();
    }
    Ok(())
}
