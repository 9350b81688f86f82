//! Sequential step execution.

use crate::{
    context::{Context, PublishedSite},
    error::PublishingError,
    log,
    site::{RunMode, Website},
    step::Step,
    storage::{DEFAULT_OUTPUT_FOLDER, Storage},
};
use chrono::Utc;
use std::{
    env,
    path::{Path, PathBuf},
};

/// An ordered list of steps run against one [`Context`].
pub struct Pipeline<S: Website> {
    steps: Vec<Step<S>>,
    output_folder: PathBuf,
}

impl<S: Website> Pipeline<S> {
    pub fn new(steps: Vec<Step<S>>) -> Self {
        Self {
            steps,
            output_folder: PathBuf::from(DEFAULT_OUTPUT_FOLDER),
        }
    }

    /// Output folder relative to the root. Defaults to `public`.
    pub fn with_output_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.output_folder = folder.into();
        self
    }

    /// Run every step that applies to `mode`, strictly in order.
    ///
    /// `root` defaults to the current directory. The first failing step
    /// aborts the run; its error carries the step's name.
    pub fn execute(
        &self,
        site: &S,
        root: Option<&Path>,
        mode: RunMode,
    ) -> Result<PublishedSite<S>, PublishingError> {
        let root = match root {
            Some(root) => root.to_path_buf(),
            None => env::current_dir().map_err(|e| {
                PublishingError::new("could not resolve the root folder").with_underlying(e)
            })?,
        };

        let storage = Storage::new(root, &self.output_folder);
        storage.prepare(mode)?;

        let operations: Vec<_> = self
            .steps
            .iter()
            .flat_map(|step| step.runnable(mode))
            .collect();
        let Some(first) = operations.first() else {
            return Err(PublishingError::new(format!(
                "{} has no steps to run in {mode} mode",
                site.name()
            )));
        };

        let mut ctx = Context::new(site, storage, first.name());
        for operation in &operations {
            ctx.set_step_name(operation.name());
            log!("step"; "{}", operation.name());
            operation
                .run(&mut ctx)
                .map_err(|e| PublishingError::from_step_failure(e, operation.name()))?;
        }

        ctx.storage().record_generation_date(Utc::now())?;
        log!("done"; "{} steps for {}", operations.len(), site.name());
        Ok(ctx.into_published())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        step::StepKind,
        test_helpers::{TestSite, item},
    };
    use anyhow::bail;
    use std::{
        fs,
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
    };
    use tempfile::TempDir;

    #[test]
    fn test_no_runnable_steps_names_site_and_mode() {
        let dir = TempDir::new().unwrap();
        let pipeline = Pipeline::new(vec![
            Step::new(StepKind::Generation, "Generate", |_| Ok(())),
            Step::empty(),
        ]);

        let error = pipeline
            .execute(&TestSite, Some(dir.path()), RunMode::Deployment)
            .unwrap_err();

        assert!(error.info.contains("Test Site"));
        assert!(error.info.contains("deployment"));
        assert!(error.step.is_none());
    }

    #[test]
    fn test_failure_aborts_remaining_steps() {
        let dir = TempDir::new().unwrap();
        let ran = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ran);

        let pipeline = Pipeline::new(vec![
            Step::new(StepKind::System, "Fail", |_| bail!("broken")),
            Step::new(StepKind::System, "After", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        ]);
        let error = pipeline
            .execute(&TestSite, Some(dir.path()), RunMode::Generation)
            .unwrap_err();

        assert_eq!(error.step.as_deref(), Some("Fail"));
        assert_eq!(error.info, "broken");
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert!(!dir.path().join(".plume/last-generation").exists());
    }

    #[test]
    fn test_step_name_is_current_while_running() {
        let dir = TempDir::new().unwrap();
        let pipeline = Pipeline::new(vec![
            Step::new(StepKind::System, "First", |ctx: &mut Context<'_, TestSite>| {
                assert_eq!(ctx.step_name(), "First");
                Ok(())
            }),
            Step::new(StepKind::System, "Second", |ctx: &mut Context<'_, TestSite>| {
                assert_eq!(ctx.step_name(), "Second");
                Ok(())
            }),
        ]);

        pipeline
            .execute(&TestSite, Some(dir.path()), RunMode::Generation)
            .unwrap();
    }

    #[test]
    fn test_generation_empties_output_and_records_date() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("site/.git")).unwrap();
        fs::write(dir.path().join("site/stale.html"), "old").unwrap();

        let published = Pipeline::new(vec![Step::add_item(item("posts", "a", &["x"]))])
            .with_output_folder("site")
            .execute(&TestSite, Some(dir.path()), RunMode::Generation)
            .unwrap();

        assert_eq!(fs::read_dir(dir.path().join("site")).unwrap().count(), 0);
        assert!(dir.path().join(".plume/last-generation").is_file());
        assert_eq!(published.section(&"posts".into()).unwrap().len(), 1);
        assert!(published.section(&"projects".into()).unwrap().is_empty());
    }

    #[test]
    fn test_deployment_keeps_output() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("public")).unwrap();
        fs::write(dir.path().join("public/index.html"), "built").unwrap();

        Pipeline::new(vec![Step::new(StepKind::Deployment, "Deploy", |_| Ok(()))])
            .execute(&TestSite, Some(dir.path()), RunMode::Deployment)
            .unwrap();

        assert!(dir.path().join("public/index.html").is_file());
    }

    #[test]
    fn test_previous_run_date_is_visible_to_next_run() {
        let dir = TempDir::new().unwrap();
        let check = |expect_previous: bool| {
            Pipeline::new(vec![Step::new(
                StepKind::System,
                "Check",
                move |ctx: &mut Context<'_, TestSite>| {
                    assert_eq!(ctx.last_generation_date().is_some(), expect_previous);
                    Ok(())
                },
            )])
            .execute(&TestSite, Some(dir.path()), RunMode::Generation)
            .unwrap();
        };

        check(false);
        check(true);
    }

    #[test]
    fn test_output_folder_at_root_leaves_site_untouched() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("content")).unwrap();
        fs::write(dir.path().join("plume.toml"), "").unwrap();

        let error = Pipeline::new(vec![Step::new(StepKind::System, "Nothing", |_| Ok(()))])
            .with_output_folder("")
            .execute(&TestSite, Some(dir.path()), RunMode::Generation)
            .unwrap_err();

        assert!(error.info.contains("would contain the site root"));
        assert!(dir.path().join("content").is_dir());
        assert!(dir.path().join("plume.toml").is_file());
    }
}
