use crate::clock::elapsed_since;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateStatus {
    Open,
    Gated,
    /// The fixation period ended on this poll
    JustOpened,
}

/// Mandatory pause after every selection during which no dwell input is
/// processed.
#[derive(Clone, Copy, Debug)]
pub struct FixationGate {
    period: Duration,
    gated_since: Option<Instant>,
}

impl FixationGate {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            gated_since: None,
        }
    }

    pub fn enter(&mut self, now: Instant) {
        self.gated_since = Some(now);
    }

    pub fn is_gated(&self) -> bool {
        self.gated_since.is_some()
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn poll(&mut self, now: Instant) -> GateStatus {
        match self.gated_since {
            None => GateStatus::Open,
            Some(since) if elapsed_since(since, now) >= self.period => {
                self.gated_since = None;
                GateStatus::JustOpened
            }
            Some(_) => GateStatus::Gated,
        }
    }

    pub fn reset(&mut self) {
        self.gated_since = None;
    }
}
