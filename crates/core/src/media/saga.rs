//! Forward steps with compensating undo actions.
//!
//! A [`Saga`] runs steps in order. A step may register an undo action once it
//! has succeeded. When step `k` fails, the undo actions of steps `1..k` run in
//! reverse order; their own failures are logged and collected, never returned
//! in place of the step's error.

use std::future::Future;

use futures::future::BoxFuture;
use tracing::{debug, warn};

use super::error::MediaError;

/// Undo action registered by a completed step.
pub type Compensation<'a> = Box<dyn FnOnce() -> BoxFuture<'a, Result<(), MediaError>> + Send + 'a>;

/// An undo action that failed while unwinding.
#[derive(Debug)]
pub struct CompensationFailure {
    /// Step whose undo failed.
    pub step: &'static str,
    /// Why it failed.
    pub error: MediaError,
}

/// Ordered forward actions, each optionally paired with an undo.
pub struct Saga<'a> {
    name: &'static str,
    completed: Vec<(&'static str, Option<Compensation<'a>>)>,
    failures: Vec<CompensationFailure>,
}

impl std::fmt::Debug for Saga<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Saga")
            .field("name", &self.name)
            .field(
                "completed",
                &self.completed.iter().map(|(s, _)| *s).collect::<Vec<_>>(),
            )
            .field("failures", &self.failures)
            .finish()
    }
}

impl<'a> Saga<'a> {
    /// Start an empty saga.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            completed: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Run a step that has nothing to undo.
    ///
    /// # Errors
    ///
    /// Returns the step's error after unwinding earlier steps.
    pub async fn step<T, F>(&mut self, step: &'static str, forward: F) -> Result<T, MediaError>
    where
        F: Future<Output = Result<T, MediaError>>,
    {
        self.run(step, forward, None).await
    }

    /// Run a step and register `undo` if it succeeds.
    ///
    /// # Errors
    ///
    /// Returns the step's error after unwinding earlier steps.
    pub async fn step_with_undo<T, F, U>(
        &mut self,
        step: &'static str,
        forward: F,
        undo: U,
    ) -> Result<T, MediaError>
    where
        F: Future<Output = Result<T, MediaError>>,
        U: FnOnce() -> BoxFuture<'a, Result<(), MediaError>> + Send + 'a,
    {
        self.run(step, forward, Some(Box::new(undo))).await
    }

    async fn run<T, F>(
        &mut self,
        step: &'static str,
        forward: F,
        undo: Option<Compensation<'a>>,
    ) -> Result<T, MediaError>
    where
        F: Future<Output = Result<T, MediaError>>,
    {
        match forward.await {
            Ok(value) => {
                debug!(saga = self.name, step, "Saga step completed");
                self.completed.push((step, undo));
                Ok(value)
            }
            Err(err) => {
                warn!(saga = self.name, step, error = %err, "Saga step failed, compensating");
                self.compensate().await;
                Err(err)
            }
        }
    }

    /// Undo every completed step, newest first.
    async fn compensate(&mut self) {
        while let Some((step, undo)) = self.completed.pop() {
            let Some(undo) = undo else { continue };
            match undo().await {
                Ok(()) => debug!(saga = self.name, step, "Compensation succeeded"),
                Err(error) => {
                    warn!(saga = self.name, step, error = %error, "Compensation failed");
                    self.failures.push(CompensationFailure { step, error });
                }
            }
        }
    }

    /// Steps completed and not undone, in order.
    #[must_use]
    pub fn completed_steps(&self) -> Vec<&'static str> {
        self.completed.iter().map(|(s, _)| *s).collect()
    }

    /// Undo actions that failed while unwinding.
    #[must_use]
    pub fn compensation_failures(&self) -> &[CompensationFailure] {
        &self.failures
    }
}
