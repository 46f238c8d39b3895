use crate::action::{Action, Announce, ControlStep};
use crate::config::LifecycleConfig;
use crate::control::{ControlCall, InvocationOutcome, Invoker};
use crate::lock::LockMarker;

// ---------------------------------------------------------------------------
// DispatchReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct StepResult {
    pub call: ControlCall,
    pub outcome: InvocationOutcome,
}

/// What happened to each control step of one dispatch, in order.
#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub action: Action,
    /// False when the lock marker could not be created.
    pub marker_ensured: bool,
    pub steps: Vec<StepResult>,
}

impl DispatchReport {
    pub fn first_failure(&self) -> Option<&StepResult> {
        self.steps.iter().find(|s| !s.outcome.is_success())
    }

    /// Process exit code. Failures only count in strict mode: the first
    /// failed step's code, or 1 if only the lock marker failed.
    pub fn exit_code(&self, strict: bool) -> i32 {
        if !strict {
            return 0;
        }
        match self.first_failure() {
            Some(step) => step.outcome.exit_code(),
            None if !self.marker_ensured => 1,
            None => 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

pub struct Dispatcher<I> {
    config: LifecycleConfig,
    invoker: I,
}

impl<I: Invoker> Dispatcher<I> {
    pub fn new(config: LifecycleConfig, invoker: I) -> Self {
        Self { config, invoker }
    }

    /// Ensure the lock marker, then run every step of `action` in order.
    ///
    /// Status lines go to `status`. Nothing aborts the dispatch: a marker
    /// that cannot be created and a failed step are both logged, and the
    /// remaining steps still run.
    pub fn run(&mut self, action: Action, status: &mut dyn FnMut(&str)) -> DispatchReport {
        let marker_ensured = match LockMarker::new(&self.config.lock_file).ensure() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("{e}");
                false
            }
        };

        let mut steps = Vec::with_capacity(action.steps().len());
        for step in action.steps() {
            steps.push(self.run_step(step, status));
        }

        tracing::info!(%action, steps = steps.len(), "dispatch finished");
        DispatchReport {
            action,
            marker_ensured,
            steps,
        }
    }

    fn run_step(&mut self, step: &ControlStep, status: &mut dyn FnMut(&str)) -> StepResult {
        let call = ControlCall::new(&self.config, step.args);

        if step.announce == Announce::Before {
            status(step.status);
        }
        let outcome = self.invoker.invoke(&call);
        if step.announce == Announce::After {
            status(step.status);
        }

        if outcome.is_success() {
            tracing::debug!(%call, %outcome, "control call finished");
        } else {
            tracing::warn!(%call, %outcome, "control call did not succeed");
        }
        StepResult { call, outcome }
    }

    #[cfg(test)]
    fn invoker(&self) -> &I {
        &self.invoker
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
