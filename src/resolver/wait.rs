use crate::host::DataModel;
use serde::Serialize;
use std::thread;
use std::time::Duration;

/// How long to keep polling the host's loading flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadyPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for ReadyPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            max_attempts: 50,
        }
    }
}

/// Result of a readiness wait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Readiness {
    pub ready: bool,
    /// Loading-flag polls made
    pub attempts: u32,
}

/// Wait for the model-ready signal, then poll `is_loading` until it clears
/// or the attempts run out. Running out is logged and reported, never fatal.
pub fn wait_for_model<M: DataModel + ?Sized>(model: &M, policy: &ReadyPolicy) -> Readiness {
    model.await_model_ready();

    let mut attempts = 0;
    while attempts < policy.max_attempts {
        attempts += 1;
        if !model.is_loading() {
            return Readiness { ready: true, attempts };
        }
        if attempts < policy.max_attempts && !policy.interval.is_zero() {
            thread::sleep(policy.interval);
        }
    }

    tracing::warn!(attempts, "host still loading, continuing anyway");
    Readiness {
        ready: false,
        attempts,
    }
}
