//! Supervision contract for a launched definition
//!
//! [`Supervisor`] is a timer-free model of the startup/watchdog policy a
//! process supervisor enforces for one [`PluginDefinition`]. The caller
//! owns the process and the timers: it feeds output lines and timer
//! expiries in, and acts on the returned [`Action`].
//!
//! ```text
//!            success signal                 silence > watchdogTimeout
//! STARTING ─────────────────► RUNNING ──────────────────────────────► STARTING
//!    │  ▲                        │  ▲
//!    │  │                        │  └─ any other output: re-arm watchdog
//!    │  └─ timeout, retries > 0  └─ error match: Restart ─► STARTING
//!    │                              error match: Fatal   ─► FAILED
//!    └─ timeout, no retries ─► FAILED
//! ```
//!
//! Error detectors are checked before the success signal on every line.
//! While RUNNING, every line that is not an error returns
//! [`Action::ResetWatchdog`]; the caller restarts the watchdog timer so that
//! it only expires after `watchdogTimeout` of silence.
//! Restarts caused by a restartable error while STARTING consume a retry.
//! Leaving RUNNING refills the retry budget.

use regex::Regex;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::definition::{PluginDefinition, SupervisionPolicy};
use crate::detectors::{compile_pattern, DetectorSet, ErrorClass, Severity};
use crate::error::DefinitionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Starting,
    Running,
    Failed,
}

/// Why a definition was declared permanently failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    #[error("no success signal after {attempts} start attempts (timeout {timeout:?})")]
    TimeoutExceeded { attempts: u32, timeout: Duration },

    #[error("{classification} error matched '{pattern}': {line}")]
    ErrorPatternMatch {
        classification: ErrorClass,
        pattern: String,
        line: String,
    },
}

/// What the caller must do after feeding an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Nothing changes
    Continue,
    /// Success signal seen; arm the watchdog timer
    Running,
    /// Output seen while running; re-arm the watchdog timer
    ResetWatchdog,
    /// Kill the process and start it again; arm the startup timer
    Restart,
    /// Kill the process and stop supervising it
    Fail(FailureReason),
}

/// Timer the caller should have armed for the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    Startup(Duration),
    Watchdog(Duration),
}

#[derive(Debug, Clone)]
pub struct Supervisor {
    state: SupervisorState,
    policy: SupervisionPolicy,
    retries_left: u32,
    attempts: u32,
    running_check: Regex,
    detectors: DetectorSet,
    failure: Option<FailureReason>,
}

impl Supervisor {
    /// Compile the definition's patterns; the first attempt starts immediately
    pub fn new(definition: &PluginDefinition) -> Result<Self, DefinitionError> {
        Ok(Self {
            state: SupervisorState::Starting,
            policy: definition.supervision,
            retries_left: definition.supervision.initial_retries,
            attempts: 1,
            running_check: compile_pattern(&definition.running_check)?,
            detectors: DetectorSet::compile(&definition.errors)?,
            failure: None,
        })
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn retries_left(&self) -> u32 {
        self.retries_left
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        self.failure.as_ref()
    }

    pub fn armed_timer(&self) -> Option<Timer> {
        match self.state {
            SupervisorState::Starting => Some(Timer::Startup(self.policy.initial_timeout())),
            SupervisorState::Running => Some(Timer::Watchdog(self.policy.watchdog_timeout())),
            SupervisorState::Failed => None,
        }
    }

    /// Feed one line of process output (stdout or stderr)
    pub fn observe(&mut self, line: &str) -> Action {
        if self.state == SupervisorState::Failed {
            return Action::Continue;
        }

        let matched = self
            .detectors
            .first_match(line)
            .map(|p| (p.classification, p.pattern.clone()));

        if let Some((classification, pattern)) = matched {
            let reason = FailureReason::ErrorPatternMatch {
                classification,
                pattern,
                line: line.to_string(),
            };
            return match (classification.severity(), self.state) {
                (Severity::Fatal, _) => self.fail(reason),
                (Severity::Restart, SupervisorState::Starting) => {
                    debug!("Restartable {classification} error during startup: {line}");
                    self.retry(Some(reason))
                }
                (Severity::Restart, _) => {
                    debug!("Restartable {classification} error while running: {line}");
                    self.restart_from_running()
                }
            };
        }

        match self.state {
            SupervisorState::Running => Action::ResetWatchdog,
            SupervisorState::Starting if self.running_check.is_match(line) => {
                debug!("Success signal after {} attempt(s)", self.attempts);
                self.state = SupervisorState::Running;
                Action::Running
            }
            _ => Action::Continue,
        }
    }

    /// The startup timer expired without a success signal
    pub fn startup_timeout_elapsed(&mut self) -> Action {
        match self.state {
            SupervisorState::Starting => self.retry(None),
            _ => Action::Continue,
        }
    }

    /// The watchdog timer expired with no output from a running process
    ///
    /// Only valid for the timer armed on the most recent [`Action::Running`]
    /// or [`Action::ResetWatchdog`].
    pub fn watchdog_elapsed(&mut self) -> Action {
        match self.state {
            SupervisorState::Running => {
                warn!(
                    "No output for {:?}, treating process as hung",
                    self.policy.watchdog_timeout()
                );
                self.restart_from_running()
            }
            _ => Action::Continue,
        }
    }

    fn retry(&mut self, cause: Option<FailureReason>) -> Action {
        if self.retries_left == 0 {
            let reason = cause.unwrap_or(FailureReason::TimeoutExceeded {
                attempts: self.attempts,
                timeout: self.policy.initial_timeout(),
            });
            return self.fail(reason);
        }

        self.retries_left -= 1;
        self.attempts += 1;
        Action::Restart
    }

    fn restart_from_running(&mut self) -> Action {
        self.state = SupervisorState::Starting;
        self.retries_left = self.policy.initial_retries;
        self.attempts = 1;
        Action::Restart
    }

    fn fail(&mut self, reason: FailureReason) -> Action {
        warn!("Supervision failed: {reason}");
        self.state = SupervisorState::Failed;
        self.failure = Some(reason.clone());
        Action::Fail(reason)
    }
}
