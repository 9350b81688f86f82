//! Site initialization module.
//!
//! Creates new site structure with default configuration.

use crate::config::SiteConfig;
use anyhow::{Context, Result, bail};
use std::{fs, path::Path};

/// Files to write ignore patterns to
const IGNORE_FILES: &[&str] = &[".gitignore", ".ignore"];

/// Paths every site ignores besides its output folder
const IGNORED_PATHS: &[&str] = &[".plume/"];

/// Starter content, relative to the root
const STARTER_FILES: &[(&str, &str)] = &[
    (
        "content/index.md",
        "---\ntitle: Welcome\ndescription: A site built with plume\n---\n\nHello, world.\n",
    ),
    (
        "content/posts/index.md",
        "---\ntitle: Posts\ndescription: Everything written so far\n---\n",
    ),
    (
        "content/posts/first-post.md",
        "---\ntitle: First post\ndate: 2024-01-01 09:00\ntags: meta\n---\n\nThis is the first post.\n",
    ),
    (
        "content/about.md",
        "# About\n\nA page outside of any section.\n",
    ),
];

/// Create a new site with default structure
pub fn new_site(config: &SiteConfig, has_name: bool) -> Result<()> {
    let root = config.root.as_path();

    // Without a name the site is created in place, which must be empty
    if !has_name && !is_dir_empty(root)? {
        bail!(
            "Current directory is not empty. Use `plume new <SITE_NAME>` to create in a subdirectory."
        );
    }
    if has_name && root.exists() {
        bail!("Path `{}` already exists.", root.display());
    }

    init_site_structure(root, config)?;
    init_default_config(root, config)?;

    let output = format!("{}/", config.build.output.display());
    let ignored: Vec<&str> = std::iter::once(output.as_str())
        .chain(IGNORED_PATHS.iter().copied())
        .collect();
    init_ignored_files(root, &ignored)?;

    crate::log!("new"; "created {}", root.display());
    Ok(())
}

/// Check if a directory is completely empty
fn is_dir_empty(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(true);
    }
    Ok(fs::read_dir(path)?.next().is_none())
}

/// Write default configuration file
fn init_default_config(root: &Path, config: &SiteConfig) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    fs::write(root.join(crate::config::CONFIG_FILE), content)?;
    Ok(())
}

/// Create the resources folder and the starter content
fn init_site_structure(root: &Path, config: &SiteConfig) -> Result<()> {
    let resources = root.join(&config.build.resources);
    fs::create_dir_all(&resources)
        .with_context(|| format!("Failed to create {}", resources.display()))?;

    for (path, contents) in STARTER_FILES {
        let path = root.join(path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(())
}

/// Initialize .gitignore and .ignore files with specified paths
pub fn init_ignored_files(root: &Path, paths: &[&str]) -> Result<()> {
    let content = paths.join("\n");

    for filename in IGNORE_FILES {
        let path = root.join(filename);
        if !path.exists() {
            fs::write(&path, &content)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{configured::ConfiguredSite, site::RunMode};
    use tempfile::TempDir;

    fn config_at(root: &Path) -> SiteConfig {
        SiteConfig {
            root: root.to_path_buf(),
            ..SiteConfig::default()
        }
    }

    #[test]
    fn test_new_site_layout() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("blog");
        new_site(&config_at(&root), true).unwrap();

        assert!(root.join("plume.toml").is_file());
        assert!(root.join("resources").is_dir());
        assert!(root.join("content/posts/first-post.md").is_file());

        let ignore = fs::read_to_string(root.join(".gitignore")).unwrap();
        assert_eq!(ignore, "public/\n.plume/");
    }

    #[test]
    fn test_written_config_round_trips() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("blog");
        new_site(&config_at(&root), true).unwrap();

        let config = SiteConfig::from_path(&root.join("plume.toml")).unwrap();
        assert_eq!(config.site.name, "My Site");
        assert_eq!(config.build.sections, ["posts"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_scaffold_generates() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("blog");
        new_site(&config_at(&root), true).unwrap();

        let mut config = SiteConfig::from_path(&root.join("plume.toml")).unwrap();
        config.root = root.clone();
        let site = ConfiguredSite::new(config);
        let published = site.publish_configured(RunMode::Generation).unwrap();

        assert_eq!(published.section(&"posts".to_owned()).unwrap().len(), 1);
        assert!(root.join("public/posts/first-post/index.html").is_file());
    }

    #[test]
    fn test_existing_name_rejected() {
        let dir = TempDir::new().unwrap();
        assert!(new_site(&config_at(dir.path()), true).is_err());
    }

    #[test]
    fn test_non_empty_directory_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        let err = new_site(&config_at(dir.path()), false).unwrap_err();
        assert!(err.to_string().contains("not empty"));
    }
}
