//! Trial state machine phases

use std::fmt;

use serde::{Deserialize, Serialize};

/// Phase of the per-trial state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialPhase {
    /// Concurrent requests in flight
    RunningBurst,
    /// Waiting for downstream effects to land
    Settling,
    /// Atomic read-then-clear of the downstream counter
    ObservingAndResetting,
    /// Appending the trial to the series
    Recording,
}

impl TrialPhase {
    /// Stable lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RunningBurst => "running_burst",
            Self::Settling => "settling",
            Self::ObservingAndResetting => "observing_and_resetting",
            Self::Recording => "recording",
        }
    }
}

impl fmt::Display for TrialPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
