//! Filesystem access and state persisted between runs.
//!
//! ```text
//! <root>/
//! ├── <output>/                     generated site (emptied before generation)
//! └── .plume/
//!     ├── last-generation           RFC 3339 timestamp of the last successful run
//!     ├── caches/<step>/<file>      step-scoped cache blobs
//!     └── deploy/<name>/            deployment working copies
//! ```

use crate::{error::StorageError, site::RunMode, utils::slug::sanitize_file_name};
use chrono::{DateTime, Utc};
use std::{
    fs, io,
    path::{Component, Path, PathBuf},
};
use walkdir::WalkDir;

/// Name of the folder holding persisted engine state.
pub const INTERNAL_FOLDER: &str = ".plume";
/// Default output folder, relative to the root.
pub const DEFAULT_OUTPUT_FOLDER: &str = "public";

const CACHES_FOLDER: &str = "caches";
const DEPLOY_FOLDER: &str = "deploy";
const LAST_GENERATION_FILE: &str = "last-generation";

/// Storage rooted at a site folder.
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
    output: PathBuf,
    internal: PathBuf,
}

impl Storage {
    pub fn new(root: impl Into<PathBuf>, output_folder: impl AsRef<Path>) -> Self {
        let root = root.into();
        Self {
            output: root.join(output_folder),
            internal: root.join(INTERNAL_FOLDER),
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn output_folder(&self) -> &Path {
        &self.output
    }

    pub fn internal_folder(&self) -> &Path {
        &self.internal
    }

    fn caches_folder(&self) -> PathBuf {
        self.internal.join(CACHES_FOLDER)
    }

    /// Get the folders ready for a run.
    ///
    /// In generation mode the output folder is emptied first, hidden entries
    /// included. Creating folders is idempotent.
    ///
    /// # Errors
    /// [`StorageError::UnsafeOutputFolder`] when the output folder is the root
    /// or contains the internal folder, in every mode.
    pub fn prepare(&self, mode: RunMode) -> Result<(), StorageError> {
        if output_overlaps(&self.root, &self.output, &[&self.internal]) {
            return Err(StorageError::UnsafeOutputFolder(self.output.clone()));
        }
        if mode == RunMode::Generation && self.output.exists() {
            empty_folder(&self.output)?;
        }
        for folder in [self.output.clone(), self.internal.clone(), self.caches_folder()] {
            create_folder(&folder)?;
        }
        Ok(())
    }

    /// Read a text file relative to the root.
    pub fn read_file(&self, path: impl AsRef<Path>) -> Result<String, StorageError> {
        let path = self.root.join(path);
        fs::read_to_string(&path).map_err(|source| read_error(path, source))
    }

    /// Write a file relative to the output folder, creating parent folders.
    pub fn write_output(
        &self,
        path: impl AsRef<Path>,
        contents: impl AsRef<[u8]>,
    ) -> Result<(), StorageError> {
        let path = self.output.join(path);
        if let Some(parent) = path.parent() {
            create_folder(parent)?;
        }
        fs::write(&path, contents).map_err(|source| StorageError::WriteFailed { path, source })
    }

    /// Copy a file from the root into the output folder.
    pub fn copy_file_to_output(
        &self,
        source: impl AsRef<Path>,
        destination: impl AsRef<Path>,
    ) -> Result<(), StorageError> {
        let source = self.root.join(source);
        if !source.is_file() {
            return Err(StorageError::NotFound(source));
        }
        let destination = self.output.join(destination);
        copy_file(&source, &destination)
    }

    /// Copy a folder's contents from the root into the output folder.
    ///
    /// Returns the written paths, relative to the output folder.
    pub fn copy_folder_to_output(
        &self,
        source: impl AsRef<Path>,
        destination: impl AsRef<Path>,
    ) -> Result<Vec<PathBuf>, StorageError> {
        let source = self.root.join(source);
        if !source.is_dir() {
            return Err(StorageError::NotFound(source));
        }

        let destination = destination.as_ref();
        let mut written = Vec::new();
        for entry in WalkDir::new(&source).min_depth(1) {
            let entry = entry.map_err(|e| read_error(source.clone(), e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&source) else {
                continue;
            };
            let target = destination.join(relative);
            copy_file(entry.path(), &self.output.join(&target))?;
            written.push(target);
        }
        Ok(written)
    }

    /// Cache blob written by `step` under `name`, if any.
    pub fn read_cache(&self, step: &str, name: &str) -> Option<Vec<u8>> {
        fs::read(self.cache_path(step, name)).ok()
    }

    pub fn write_cache(&self, step: &str, name: &str, contents: &[u8]) -> Result<(), StorageError> {
        let path = self.cache_path(step, name);
        if let Some(parent) = path.parent() {
            create_folder(parent)?;
        }
        fs::write(&path, contents).map_err(|source| StorageError::WriteFailed { path, source })
    }

    fn cache_path(&self, step: &str, name: &str) -> PathBuf {
        self.caches_folder()
            .join(sanitize_file_name(step))
            .join(sanitize_file_name(name))
    }

    /// Timestamp recorded at the end of the previous run.
    ///
    /// A missing or unreadable marker reads as "never generated".
    pub fn last_generation_date(&self) -> Option<DateTime<Utc>> {
        let text = fs::read_to_string(self.internal.join(LAST_GENERATION_FILE)).ok()?;
        DateTime::parse_from_rfc3339(text.trim())
            .ok()
            .map(|date| date.with_timezone(&Utc))
    }

    pub fn record_generation_date(&self, date: DateTime<Utc>) -> Result<(), StorageError> {
        create_folder(&self.internal)?;
        let path = self.internal.join(LAST_GENERATION_FILE);
        fs::write(&path, date.to_rfc3339())
            .map_err(|source| StorageError::WriteFailed { path, source })
    }

    /// Empty working folder for a deployment target.
    pub fn deployment_folder(&self, name: &str) -> Result<PathBuf, StorageError> {
        let path = self
            .internal
            .join(DEPLOY_FOLDER)
            .join(sanitize_file_name(name));
        let setup_failed = |source: io::Error| StorageError::DeploymentSetupFailed {
            path: path.clone(),
            source: source.into(),
        };
        if path.exists() {
            fs::remove_dir_all(&path).map_err(setup_failed)?;
        }
        fs::create_dir_all(&path).map_err(setup_failed)?;
        Ok(path)
    }
}

fn create_folder(path: &Path) -> Result<(), StorageError> {
    fs::create_dir_all(path).map_err(|source| StorageError::CreationFailed {
        path: path.to_path_buf(),
        source,
    })
}

fn copy_file(source: &Path, destination: &Path) -> Result<(), StorageError> {
    if let Some(parent) = destination.parent() {
        create_folder(parent)?;
    }
    fs::copy(source, destination)
        .map(drop)
        .map_err(|e| StorageError::CopyFailed {
            path: source.to_path_buf(),
            source: e,
        })
}

fn read_error(path: PathBuf, source: io::Error) -> StorageError {
    if source.kind() == io::ErrorKind::NotFound {
        StorageError::NotFound(path)
    } else {
        StorageError::ReadFailed { path, source }
    }
}

/// Remove every entry of a folder, keeping the folder itself.
fn empty_folder(path: &Path) -> Result<(), StorageError> {
    let entries = fs::read_dir(path).map_err(|source| read_error(path.to_path_buf(), source))?;
    for entry in entries {
        let entry = entry.map_err(|source| read_error(path.to_path_buf(), source))?;
        let entry_path = entry.path();
        let removed = if entry_path.is_dir() {
            fs::remove_dir_all(&entry_path)
        } else {
            fs::remove_file(&entry_path)
        };
        removed.map_err(|source| StorageError::WriteFailed {
            path: entry_path,
            source,
        })?;
    }
    Ok(())
}

/// Whether emptying `output` would delete `root` or any of `protected`.
///
/// Paths are compared lexically (`.` dropped, `..` resolved), so the check
/// also holds for folders that do not exist yet.
pub(crate) fn output_overlaps(root: &Path, output: &Path, protected: &[&Path]) -> bool {
    let output = lexical(output);
    std::iter::once(root)
        .chain(protected.iter().copied())
        .any(|path| lexical(path).starts_with(&output))
}

fn lexical(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => normalized.push(component),
            },
            other => normalized.push(other),
        }
    }
    normalized
}
