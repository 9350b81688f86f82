//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#true() -> bool {
    true
}

// ============================================================================
// [site] Section Defaults
// ============================================================================

pub mod site {
    pub fn name() -> String {
        "My Site".into()
    }

    pub fn url() -> String {
        "https://example.com".into()
    }

    pub fn language() -> String {
        "en".into()
    }
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use crate::markdown::DEFAULT_DATE_FORMAT;
    use std::path::PathBuf;

    pub fn content() -> PathBuf {
        "content".into()
    }

    pub fn output() -> PathBuf {
        "public".into()
    }

    pub fn resources() -> PathBuf {
        "resources".into()
    }

    pub fn sections() -> Vec<String> {
        vec!["posts".into()]
    }

    pub fn date_format() -> String {
        DEFAULT_DATE_FORMAT.into()
    }

    pub mod tags {
        pub fn path() -> String {
            "tags".into()
        }
    }
}

// ============================================================================
// [deploy] Section Defaults
// ============================================================================

pub mod deploy {
    use crate::deploy::GITHUB_PAGES_BRANCH;

    pub fn branch() -> String {
        GITHUB_PAGES_BRANCH.into()
    }
}
