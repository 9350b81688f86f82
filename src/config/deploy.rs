//! `[deploy]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// Where `plume deploy` pushes the output folder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    None,
    /// Any git remote.
    Git,
    /// A GitHub repository, pushed to its `gh-pages` branch.
    Github,
}

/// `[deploy]` section in plume.toml.
///
/// # Example
/// ```toml
/// [deploy]
/// provider = "github"
/// remote = "alice/alice.github.io"
/// use_ssh = false
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct DeployConfig {
    pub provider: Provider,

    /// Remote URL for `git`, `owner/name` for `github`.
    pub remote: String,

    /// Target branch of the `git` provider.
    #[serde(default = "defaults::deploy::branch")]
    #[educe(Default = defaults::deploy::branch())]
    pub branch: String,

    /// Push to GitHub over SSH rather than HTTPS.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub use_ssh: bool,
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;
    use super::*;

    #[test]
    fn test_deploy_defaults() {
        let config = SiteConfig::from_str("").unwrap();

        assert_eq!(config.deploy.provider, Provider::None);
        assert_eq!(config.deploy.remote, "");
        assert_eq!(config.deploy.branch, "gh-pages");
        assert!(config.deploy.use_ssh);
    }

    #[test]
    fn test_deploy_git() {
        let config = r#"
            [deploy]
            provider = "git"
            remote = "ssh://git@host/site.git"
            branch = "main"
        "#;
        let config = SiteConfig::from_str(config).unwrap();

        assert_eq!(config.deploy.provider, Provider::Git);
        assert_eq!(config.deploy.remote, "ssh://git@host/site.git");
        assert_eq!(config.deploy.branch, "main");
    }

    #[test]
    fn test_unknown_provider() {
        assert!(SiteConfig::from_str("[deploy]\nprovider = \"ftp\"").is_err());
    }
}
