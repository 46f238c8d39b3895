//! Invocation of the external control binary (`picostk`).
//!
//! Every call is blocking and runs under the configured service identity.
//! Results are reported back as an [`InvocationOutcome`]; this module never
//! turns a failed call into an error, callers decide what a failure means.

use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};

use crate::config::{Deescalation, LifecycleConfig};

// ---------------------------------------------------------------------------
// ControlCall
// ---------------------------------------------------------------------------

/// A fully resolved command line for one control step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlCall {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl ControlCall {
    /// Build the command line for `sub_args` under the configured identity.
    pub fn new(config: &LifecycleConfig, sub_args: &[&str]) -> Self {
        match config.deescalation {
            Deescalation::Sudo => {
                let mut args: Vec<OsString> = vec![
                    "-g".into(),
                    config.group.as_str().into(),
                    "-u".into(),
                    config.user.as_str().into(),
                    config.binary.as_os_str().to_owned(),
                ];
                args.extend(sub_args.iter().map(OsString::from));
                Self {
                    program: config.sudo_path.clone(),
                    args,
                }
            }
            Deescalation::None => Self {
                program: config.binary.clone(),
                args: sub_args.iter().map(OsString::from).collect(),
            },
        }
    }
}

impl fmt::Display for ControlCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// InvocationOutcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationOutcome {
    Exited(i32),
    /// Terminated without an exit code (killed by a signal on Unix).
    Signaled,
    SpawnFailed(String),
}

impl InvocationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, InvocationOutcome::Exited(0))
    }

    /// Exit code to surface for this outcome in strict mode.
    pub fn exit_code(&self) -> i32 {
        match self {
            InvocationOutcome::Exited(code) => *code,
            InvocationOutcome::Signaled | InvocationOutcome::SpawnFailed(_) => 1,
        }
    }

    fn from_status(status: ExitStatus) -> Self {
        match status.code() {
            Some(code) => InvocationOutcome::Exited(code),
            None => InvocationOutcome::Signaled,
        }
    }
}

impl fmt::Display for InvocationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvocationOutcome::Exited(code) => write!(f, "exited with code {code}"),
            InvocationOutcome::Signaled => f.write_str("terminated by signal"),
            InvocationOutcome::SpawnFailed(e) => write!(f, "failed to spawn: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Invoker
// ---------------------------------------------------------------------------

pub trait Invoker {
    /// Run `call` to completion.
    fn invoke(&mut self, call: &ControlCall) -> InvocationOutcome;
}

/// Spawns real processes. stdio is inherited so the control binary's own
/// output reaches the terminal.
#[derive(Debug, Default)]
pub struct ProcessInvoker;

impl ProcessInvoker {
    pub fn new(config: &LifecycleConfig) -> Self {
        if config.deescalation == Deescalation::Sudo && which::which(&config.sudo_path).is_err() {
            tracing::warn!(
                sudo = %config.sudo_path.display(),
                "privilege launcher not found; control calls will fail"
            );
        }
        Self
    }
}

impl Invoker for ProcessInvoker {
    fn invoke(&mut self, call: &ControlCall) -> InvocationOutcome {
        tracing::debug!(%call, "invoking control binary");
        match Command::new(&call.program).args(&call.args).status() {
            Ok(status) => InvocationOutcome::from_status(status),
            Err(e) => InvocationOutcome::SpawnFailed(e.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
