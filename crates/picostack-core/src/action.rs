use std::fmt;

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// A lifecycle action accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Start,
    Stop,
}

/// When a step's status line is printed relative to its control call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Announce {
    Before,
    After,
}

/// One call into the control binary and the status line that goes with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlStep {
    pub args: &'static [&'static str],
    pub status: &'static str,
    pub announce: Announce,
}

const START_STEPS: &[ControlStep] = &[ControlStep {
    args: &["daemon", "start"],
    status: "Starting picostack daemon",
    announce: Announce::Before,
}];

const STOP_STEPS: &[ControlStep] = &[
    ControlStep {
        args: &["clean", "all"],
        status: "Cleaned picostack instances",
        announce: Announce::After,
    },
    ControlStep {
        args: &["daemon", "stop"],
        status: "Stopped picostack daemon",
        announce: Announce::After,
    },
];

pub const USAGE: &str = "Usage: picostack {start|stop}";

impl Action {
    /// Exact, case-sensitive match. Anything else is not an action.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "start" => Some(Action::Start),
            "stop" => Some(Action::Stop),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::Stop => "stop",
        }
    }

    /// Control calls for this action, in execution order.
    pub fn steps(&self) -> &'static [ControlStep] {
        match self {
            Action::Start => START_STEPS,
            Action::Stop => STOP_STEPS,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
