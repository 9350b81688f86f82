//! Error types.
//!
//! Components raise precise, step-agnostic errors ([`ContentError`],
//! [`StorageError`], [`PodcastError`], [`GenerationError`]). The pipeline is the
//! only place that turns them into a [`PublishingError`] and attaches the name
//! of the step that was running.

use crate::content::SitePath;
use crate::markdown::DecodeError;
use std::{fmt, io, path::PathBuf};
use thiserror::Error;

/// Boxed error from user callbacks (mutations, plugins).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by the content model.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("no item found at `{path}`")]
    ItemNotFound { path: SitePath },

    #[error("no page found at `{path}`")]
    PageNotFound { path: SitePath },

    #[error("section `{id}` is not declared by the site")]
    UnknownSection { id: String },

    #[error("failed to mutate item at `{path}`")]
    ItemMutationFailed {
        path: SitePath,
        #[source]
        source: BoxError,
    },

    #[error("failed to mutate page at `{path}`")]
    PageMutationFailed {
        path: SitePath,
        #[source]
        source: BoxError,
    },

    #[error("failed to decode metadata in `{}`", path.display())]
    MetadataDecodingFailed {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },
}

impl ContentError {
    fn path(&self) -> String {
        match self {
            Self::ItemNotFound { path }
            | Self::PageNotFound { path }
            | Self::ItemMutationFailed { path, .. }
            | Self::PageMutationFailed { path, .. } => path.to_string(),
            Self::UnknownSection { id } => id.clone(),
            Self::MetadataDecodingFailed { path, .. } => path.display().to_string(),
        }
    }
}

/// Errors raised by the storage collaborator.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("`{}` not found", .0.display())]
    NotFound(PathBuf),

    #[error("failed to create `{}`", path.display())]
    CreationFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read `{}`", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write `{}`", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to copy `{}`", path.display())]
    CopyFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("output folder `{}` would contain the site root or its state folder", .0.display())]
    UnsafeOutputFolder(PathBuf),

    #[error("failed to set up deployment folder `{}`", path.display())]
    DeploymentSetupFailed {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
}

impl StorageError {
    fn path(&self) -> &PathBuf {
        match self {
            Self::NotFound(path)
            | Self::UnsafeOutputFolder(path)
            | Self::CreationFailed { path, .. }
            | Self::ReadFailed { path, .. }
            | Self::WriteFailed { path, .. }
            | Self::CopyFailed { path, .. }
            | Self::DeploymentSetupFailed { path, .. } => path,
        }
    }
}

/// Podcast items that cannot be turned into feed entries.
///
/// None of these fields can be defaulted, so generation stops at the first
/// offending item.
#[derive(Debug, Error)]
pub enum PodcastError {
    #[error("item `{path}` has no audio")]
    MissingAudio { path: SitePath },

    #[error("audio of item `{path}` has no duration")]
    MissingAudioDuration { path: SitePath },

    #[error("audio of item `{path}` has no byte size")]
    MissingAudioSize { path: SitePath },

    #[error("item `{path}` has no podcast episode metadata")]
    MissingMetadata { path: SitePath },
}

impl PodcastError {
    fn path(&self) -> &SitePath {
        match self {
            Self::MissingAudio { path }
            | Self::MissingAudioDuration { path }
            | Self::MissingAudioSize { path }
            | Self::MissingMetadata { path } => path,
        }
    }
}

/// Errors raised by the concurrent output phase.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// `path` is the first conflicting path; `others` lists the rest.
    #[error(
        "`{}` is written by more than one generator: {}{}",
        path.display(),
        categories.join(", "),
        more_conflicts(others)
    )]
    PathConflict {
        path: PathBuf,
        categories: Vec<String>,
        others: Vec<PathBuf>,
    },
}

fn more_conflicts(others: &[PathBuf]) -> String {
    if others.is_empty() {
        return String::new();
    }
    let paths: Vec<String> = others.iter().map(|p| format!("`{}`", p.display())).collect();
    format!(" (also conflicting: {})", paths.join(", "))
}

/// The uniform error returned by [`Pipeline::execute`](crate::Pipeline::execute).
///
/// Displays as a multi-line report:
///
/// ```text
/// Publishing error
/// [step] Generate HTML
/// [path] posts/first-post
/// [info] failed to mutate item at `posts/first-post`
/// [underlying] title missing
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishingError {
    pub info: String,
    pub step: Option<String>,
    pub path: Option<String>,
    pub underlying: Option<String>,
}

impl PublishingError {
    pub fn new(info: impl Into<String>) -> Self {
        Self {
            info: info.into(),
            step: None,
            path: None,
            underlying: None,
        }
    }

    pub fn with_path(mut self, path: impl fmt::Display) -> Self {
        self.path = Some(path.to_string());
        self
    }

    pub fn with_underlying(mut self, underlying: impl fmt::Display) -> Self {
        self.underlying = Some(underlying.to_string());
        self
    }

    /// Convert any error raised while a step was running.
    ///
    /// Known error kinds contribute their path; the remaining error chain
    /// becomes the underlying message. An existing step name is kept.
    pub(crate) fn from_step_failure(error: anyhow::Error, step: &str) -> Self {
        if let Some(existing) = error.downcast_ref::<PublishingError>() {
            let mut existing = existing.clone();
            existing.step.get_or_insert_with(|| step.to_owned());
            return existing;
        }

        let mut converted = Self::from(&error);
        converted.step = Some(step.to_owned());
        converted
    }
}

impl From<&anyhow::Error> for PublishingError {
    fn from(error: &anyhow::Error) -> Self {
        let path = if let Some(e) = error.downcast_ref::<ContentError>() {
            Some(e.path())
        } else if let Some(e) = error.downcast_ref::<StorageError>() {
            Some(e.path().display().to_string())
        } else if let Some(e) = error.downcast_ref::<PodcastError>() {
            Some(e.path().to_string())
        } else if let Some(GenerationError::PathConflict { path, .. }) = error.downcast_ref() {
            Some(path.display().to_string())
        } else {
            None
        };

        let underlying: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();

        Self {
            info: error.to_string(),
            step: None,
            path,
            underlying: (!underlying.is_empty()).then(|| underlying.join(": ")),
        }
    }
}

impl From<StorageError> for PublishingError {
    fn from(error: StorageError) -> Self {
        Self::from(&anyhow::Error::from(error))
    }
}

impl fmt::Display for PublishingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Publishing error")?;
        if let Some(step) = &self.step {
            write!(f, "\n[step] {step}")?;
        }
        if let Some(path) = &self.path {
            write!(f, "\n[path] {path}")?;
        }
        write!(f, "\n[info] {}", self.info)?;
        if let Some(underlying) = &self.underlying {
            write!(f, "\n[underlying] {underlying}")?;
        }
        Ok(())
    }
}

impl std::error::Error for PublishingError {}
