//! Site deployment.
//!
//! A deployment pushes the contents of the output folder to a git branch,
//! using a scratch repository under `.plume/deploy/<name>`:
//!
//! 1. recreate the scratch folder, `git init`, add the remote
//! 2. fetch the target branch (or start it as an orphan when it does not exist)
//! 3. replace the working tree with the output folder
//! 4. commit and push

use crate::{
    context::Context,
    error::StorageError,
    log,
    site::Website,
    utils::exec::{SILENT_FILTER, exec},
};
use anyhow::Result;
use chrono::Utc;
use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Branch GitHub Pages serves by convention.
pub const GITHUB_PAGES_BRANCH: &str = "gh-pages";

type DeployFn<S> = Box<dyn for<'c> Fn(&Context<'c, S>) -> Result<()> + Send + Sync>;

/// How the generated output is published.
pub struct DeploymentMethod<S: Website> {
    name: String,
    deploy: DeployFn<S>,
}

impl<S: Website> DeploymentMethod<S> {
    /// A custom deployment.
    pub fn new<F>(name: impl Into<String>, deploy: F) -> Self
    where
        F: for<'c> Fn(&Context<'c, S>) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            deploy: Box::new(deploy),
        }
    }

    /// Push the output folder to `branch` of any git remote.
    pub fn git(remote: impl Into<String>, branch: impl Into<String>) -> Self {
        let remote = remote.into();
        let branch = branch.into();
        Self::new(format!("git ({remote})"), move |ctx| {
            push_output(ctx, "git", &remote, &branch)
        })
    }

    /// Push to the `gh-pages` branch of a GitHub repository given as `owner/name`.
    pub fn github(repository: impl Into<String>, use_ssh: bool) -> Self {
        let repository = repository.into();
        let remote = github_remote(&repository, use_ssh);
        Self::new(format!("GitHub ({repository})"), move |ctx| {
            push_output(ctx, "github", &remote, GITHUB_PAGES_BRANCH)
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn deploy(&self, ctx: &Context<'_, S>) -> Result<()> {
        (self.deploy)(ctx)
    }
}

impl<S: Website> fmt::Debug for DeploymentMethod<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeploymentMethod")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

fn github_remote(repository: &str, use_ssh: bool) -> String {
    if use_ssh {
        format!("git@github.com:{repository}.git")
    } else {
        format!("https://github.com/{repository}.git")
    }
}

// ============================================================================
// Git deployment
// ============================================================================

fn push_output<S: Website>(
    ctx: &Context<'_, S>,
    folder_name: &str,
    remote: &str,
    branch: &str,
) -> Result<()> {
    let storage = ctx.storage();
    let repo = storage.deployment_folder(folder_name)?;

    checkout_branch(&repo, remote, branch).map_err(|e| StorageError::DeploymentSetupFailed {
        path: repo.clone(),
        source: e.into(),
    })?;
    replace_contents(storage.output_folder(), &repo)?;

    let message = format!("Plume deploy {}", Utc::now().format("%Y-%m-%d %H:%M"));
    exec!(&repo; ["git"]; "add", "--all")?;
    exec!(&repo; ["git"]; "commit", "--allow-empty", "-m", message)?;
    exec!(&repo; ["git"]; "push", "origin", branch)?;

    log!("deploy"; "pushed to {remote} ({branch})");
    Ok(())
}

fn checkout_branch(repo: &Path, remote: &str, branch: &str) -> Result<()> {
    exec!(repo; ["git"]; "init", "--quiet")?;
    exec!(repo; ["git"]; "remote", "add", "origin", remote)?;

    let fetched =
        exec!(filter=&SILENT_FILTER; repo; ["git"]; "fetch", "--depth", "1", "origin", branch)
            .is_ok();
    if fetched {
        exec!(repo; ["git"]; "checkout", "--quiet", "-B", branch, "FETCH_HEAD")?;
    } else {
        log!("deploy"; "branch {branch} not found on remote, starting it");
        exec!(repo; ["git"]; "checkout", "--quiet", "--orphan", branch)?;
    }
    Ok(())
}

/// Empty `repo` (keeping `.git`) and copy every file of `output` into it.
fn replace_contents(output: &Path, repo: &Path) -> Result<Vec<PathBuf>, StorageError> {
    let setup_failed = |path: &Path, source: io::Error| StorageError::DeploymentSetupFailed {
        path: path.to_path_buf(),
        source: source.into(),
    };

    let entries = fs::read_dir(repo).map_err(|e| setup_failed(repo, e))?;
    for entry in entries {
        let path = entry.map_err(|e| setup_failed(repo, e))?.path();
        if path.file_name().is_some_and(|name| name == ".git") {
            continue;
        }
        let removed = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        removed.map_err(|e| setup_failed(&path, e))?;
    }

    if !output.is_dir() {
        return Err(StorageError::NotFound(output.to_path_buf()));
    }

    let mut copied = Vec::new();
    for entry in WalkDir::new(output).min_depth(1) {
        let entry = entry.map_err(|e| setup_failed(output, e.into()))?;
        let Ok(relative) = entry.path().strip_prefix(output) else {
            continue;
        };
        let target = repo.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|source| StorageError::CreationFailed {
                path: target.clone(),
                source,
            })?;
        } else {
            fs::copy(entry.path(), &target).map_err(|source| StorageError::CopyFailed {
                path: entry.path().to_path_buf(),
                source,
            })?;
            copied.push(relative.to_path_buf());
        }
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::TestSite;
    use tempfile::TempDir;

    #[test]
    fn test_github_remote() {
        assert_eq!(
            github_remote("plume/site", true),
            "git@github.com:plume/site.git"
        );
        assert_eq!(
            github_remote("plume/site", false),
            "https://github.com/plume/site.git"
        );
    }

    #[test]
    fn test_method_names() {
        let git: DeploymentMethod<TestSite> = DeploymentMethod::git("ssh://host/site.git", "main");
        let github: DeploymentMethod<TestSite> = DeploymentMethod::github("plume/site", true);

        assert_eq!(git.name(), "git (ssh://host/site.git)");
        assert_eq!(github.name(), "GitHub (plume/site)");
    }

    #[test]
    fn test_replace_contents_keeps_git_folder() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("public");
        let repo = dir.path().join("repo");
        fs::create_dir_all(output.join("posts")).unwrap();
        fs::write(output.join("index.html"), "new").unwrap();
        fs::write(output.join("posts/a.html"), "a").unwrap();
        fs::create_dir_all(repo.join(".git")).unwrap();
        fs::create_dir_all(repo.join("old")).unwrap();
        fs::write(repo.join("stale.html"), "stale").unwrap();

        let mut copied = replace_contents(&output, &repo).unwrap();
        copied.sort();

        assert_eq!(
            copied,
            [PathBuf::from("index.html"), PathBuf::from("posts/a.html")]
        );
        assert!(repo.join(".git").is_dir());
        assert!(!repo.join("old").exists());
        assert!(!repo.join("stale.html").exists());
        assert_eq!(fs::read_to_string(repo.join("index.html")).unwrap(), "new");
    }

    #[test]
    fn test_replace_contents_requires_output() {
        let dir = TempDir::new().unwrap();
        let repo = dir.path().join("repo");
        fs::create_dir_all(&repo).unwrap();

        let error = replace_contents(&dir.path().join("missing"), &repo).unwrap_err();
        assert!(matches!(error, StorageError::NotFound(_)));
    }

    #[test]
    fn test_custom_method_runs() {
        let dir = TempDir::new().unwrap();
        let site = TestSite;
        let ctx = crate::test_helpers::context(&site, &dir);
        let method: DeploymentMethod<TestSite> = DeploymentMethod::new("touch", |ctx| {
            ctx.write_output_file("deployed", "yes")?;
            Ok(())
        });

        method.deploy(&ctx).unwrap();
        assert!(dir.path().join("public/deployed").is_file());
    }
}
