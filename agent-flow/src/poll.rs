use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::error::{AgentError, Result};

/// Outcome of a single readiness probe against the external service.
///
/// `NotReady` is a recoverable, retryable state; `Failed` is a hard stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    Ready,
    NotReady,
    Failed(String),
}

/// States of the bounded polling loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    Submitted,
    Polling { attempt: u32 },
    Ready,
    TimedOut,
    Failed(String),
}

/// Pure transition logic for the polling loop.
///
/// Drivers alternate [`next_attempt`](Self::next_attempt) and
/// [`record`](Self::record); the machine guarantees no more than
/// `max_attempts` probes are ever issued, so the loop cannot spin
/// unboundedly. Keeping the transitions free of time and I/O makes the
/// timeout and failure paths testable on their own.
#[derive(Debug)]
pub struct PollMachine {
    state: PollState,
    max_attempts: u32,
}

impl PollMachine {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            state: PollState::Submitted,
            max_attempts,
        }
    }

    pub fn state(&self) -> &PollState {
        &self.state
    }

    /// Advance into the next polling attempt. Returns the 1-based attempt
    /// number whose probe should now run, or `None` once terminal.
    pub fn next_attempt(&mut self) -> Option<u32> {
        match self.state {
            PollState::Submitted => {
                if self.max_attempts == 0 {
                    self.state = PollState::TimedOut;
                    return None;
                }
                self.state = PollState::Polling { attempt: 1 };
                Some(1)
            }
            PollState::Polling { attempt } => {
                let next = attempt + 1;
                self.state = PollState::Polling { attempt: next };
                Some(next)
            }
            _ => None,
        }
    }

    /// Record the probe outcome for the current attempt.
    pub fn record(&mut self, probe: Probe) {
        if let PollState::Polling { attempt } = self.state {
            match probe {
                Probe::Ready => self.state = PollState::Ready,
                Probe::Failed(reason) => self.state = PollState::Failed(reason),
                Probe::NotReady if attempt >= self.max_attempts => {
                    self.state = PollState::TimedOut;
                }
                Probe::NotReady => {}
            }
        }
    }
}

/// Drives a [`PollMachine`], sleeping a fixed delay between attempts.
pub struct Poller {
    max_attempts: u32,
    delay: Duration,
}

impl Poller {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Probe until the service is ready. `probe` receives the 1-based
    /// attempt number; a probe-level error counts as a hard failure.
    pub async fn run<F, Fut>(&self, mut probe: F) -> Result<()>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = anyhow::Result<Probe>>,
    {
        let mut machine = PollMachine::new(self.max_attempts);
        while let Some(attempt) = machine.next_attempt() {
            if attempt > 1 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let outcome = probe(attempt)
                .await
                .unwrap_or_else(|e| Probe::Failed(e.to_string()));
            debug!(attempt, ?outcome, "poll probe");
            machine.record(outcome);
            match machine.state() {
                PollState::Ready => return Ok(()),
                PollState::Failed(reason) => return Err(AgentError::Fetch(reason.clone())),
                _ => {}
            }
        }
        Err(AgentError::PollingTimeout {
            attempts: self.max_attempts,
        })
    }
}
