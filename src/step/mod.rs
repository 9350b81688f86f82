//! Pipeline steps.
//!
//! A step has a fixed [`StepKind`] and a body that is empty, a single named
//! operation, or a group of steps. The combinators ([`Step::when`],
//! [`Step::unwrap`], [`Step::optional`]) pick the body while the step list is
//! being built, never while it runs.

mod builtin;

use crate::{context::Context, log, site::RunMode, site::Website};
use std::fmt;

/// Body of a step operation.
pub type StepFn<S> = Box<dyn for<'c> Fn(&mut Context<'c, S>) -> anyhow::Result<()> + Send + Sync>;

/// When a step may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// Runs in every mode.
    System,
    Generation,
    Deployment,
}

impl StepKind {
    pub fn runs_in(self, mode: RunMode) -> bool {
        match self {
            Self::System => true,
            Self::Generation => mode == RunMode::Generation,
            Self::Deployment => mode == RunMode::Deployment,
        }
    }
}

/// One unit of pipeline work.
pub struct Step<S: Website> {
    kind: StepKind,
    body: StepBody<S>,
}

enum StepBody<S: Website> {
    Empty,
    Operation(Operation<S>),
    Group(Vec<Step<S>>),
}

/// A named, runnable step body.
pub(crate) struct Operation<S: Website> {
    name: String,
    run: StepFn<S>,
}

impl<S: Website> Operation<S> {
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn run(&self, ctx: &mut Context<'_, S>) -> anyhow::Result<()> {
        (self.run)(ctx)
    }
}

impl<S: Website> Step<S> {
    pub fn new<F>(kind: StepKind, name: impl Into<String>, run: F) -> Self
    where
        F: for<'c> Fn(&mut Context<'c, S>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            kind,
            body: StepBody::Operation(Operation {
                name: name.into(),
                run: Box::new(run),
            }),
        }
    }

    pub(crate) fn system<F>(name: impl Into<String>, run: F) -> Self
    where
        F: for<'c> Fn(&mut Context<'c, S>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::new(StepKind::System, name, run)
    }

    pub(crate) fn generation<F>(name: impl Into<String>, run: F) -> Self
    where
        F: for<'c> Fn(&mut Context<'c, S>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::new(StepKind::Generation, name, run)
    }

    pub fn empty() -> Self {
        Self {
            kind: StepKind::System,
            body: StepBody::Empty,
        }
    }

    /// A group runs in every mode; its members are filtered by their own kind.
    pub fn group(steps: impl IntoIterator<Item = Step<S>>) -> Self {
        Self {
            kind: StepKind::System,
            body: StepBody::Group(steps.into_iter().collect()),
        }
    }

    /// `step` if `condition` holds, otherwise an empty step.
    pub fn when(condition: bool, step: Step<S>) -> Self {
        if condition { step } else { Self::empty() }
    }

    /// Build a step from `value` if there is one, otherwise an empty step.
    pub fn unwrap<T>(value: Option<T>, make: impl FnOnce(T) -> Step<S>) -> Self {
        value.map_or_else(Self::empty, make)
    }

    /// Make every operation in `step` swallow its own errors.
    ///
    /// Applies recursively to groups. Swallowed errors are logged.
    pub fn optional(step: Step<S>) -> Self {
        let body = match step.body {
            StepBody::Empty => StepBody::Empty,
            StepBody::Group(steps) => {
                StepBody::Group(steps.into_iter().map(Self::optional).collect())
            }
            StepBody::Operation(Operation { name, run }) => {
                let label = name.clone();
                let run: StepFn<S> = Box::new(move |ctx| {
                    if let Err(e) = run(ctx) {
                        log!("warn"; "optional step `{label}` failed: {e:#}");
                    }
                    Ok(())
                });
                StepBody::Operation(Operation { name, run })
            }
        };
        Self {
            kind: step.kind,
            body,
        }
    }

    pub fn kind(&self) -> StepKind {
        self.kind
    }

    /// Name of a single-operation step.
    pub fn name(&self) -> Option<&str> {
        match &self.body {
            StepBody::Operation(operation) => Some(&operation.name),
            _ => None,
        }
    }

    /// Operations runnable in `mode`, in order.
    pub(crate) fn runnable(&self, mode: RunMode) -> Vec<&Operation<S>> {
        let mut operations = Vec::new();
        self.collect_runnable(mode, &mut operations);
        operations
    }

    fn collect_runnable<'s>(&'s self, mode: RunMode, out: &mut Vec<&'s Operation<S>>) {
        if !self.kind.runs_in(mode) {
            return;
        }
        match &self.body {
            StepBody::Empty => {}
            StepBody::Operation(operation) => out.push(operation),
            StepBody::Group(steps) => {
                for step in steps {
                    step.collect_runnable(mode, out);
                }
            }
        }
    }
}

impl<S: Website> fmt::Debug for Step<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Step");
        debug.field("kind", &self.kind);
        match &self.body {
            StepBody::Empty => debug.field("body", &"empty"),
            StepBody::Operation(operation) => debug.field("name", &operation.name),
            StepBody::Group(steps) => debug.field("steps", steps),
        };
        debug.finish()
    }
}

/// A named callback that customises the context, e.g. by adding Markdown
/// modifiers or content.
pub struct Plugin<S: Website> {
    name: String,
    installer: StepFn<S>,
}

impl<S: Website> Plugin<S> {
    pub fn new<F>(name: impl Into<String>, installer: F) -> Self
    where
        F: for<'c> Fn(&mut Context<'c, S>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            installer: Box::new(installer),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn install(&self, ctx: &mut Context<'_, S>) -> anyhow::Result<()> {
        (self.installer)(ctx)
    }
}
