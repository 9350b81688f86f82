//! Site-relative locations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A location within the site, without leading or trailing slashes.
///
/// The empty path is the site root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SitePath(String);

impl SitePath {
    pub fn new(path: impl AsRef<str>) -> Self {
        Self(path.as_ref().trim_matches('/').to_owned())
    }

    pub const fn root() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn join(&self, other: impl AsRef<str>) -> Self {
        let other = other.as_ref().trim_matches('/');
        match (self.is_root(), other.is_empty()) {
            (true, _) => Self(other.to_owned()),
            (false, true) => self.clone(),
            (false, false) => Self(format!("{}/{}", self.0, other)),
        }
    }

    /// `/posts/hello`, or `/` for the root.
    pub fn absolute_string(&self) -> String {
        format!("/{}", self.0)
    }

    /// Absolute URL under `base`.
    pub fn url(&self, base: &str) -> String {
        format!("{}{}", base.trim_end_matches('/'), self.absolute_string())
    }

    /// Plain string prefix match, as used by exclusion lists.
    pub fn has_prefix(&self, prefix: &SitePath) -> bool {
        self.0.starts_with(prefix.as_str())
    }
}

impl From<&str> for SitePath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for SitePath {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

impl AsRef<str> for SitePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SitePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
