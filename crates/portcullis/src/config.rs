//! Join orchestration settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How long a caller waits for a join before getting the "continues in
/// the background" answer.
pub const DEFAULT_JOIN_DEADLINE: Duration = Duration::from_secs(20);

/// Configuration for [`JoinOrchestrator`](crate::JoinOrchestrator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinConfig {
    /// Upper bound on how long a join request is held open. The join
    /// itself is never cut short by it.
    pub deadline: Duration,
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self {
            deadline: DEFAULT_JOIN_DEADLINE,
        }
    }
}

impl JoinConfig {
    /// A config with the given deadline.
    pub fn with_deadline(deadline: Duration) -> Self {
        Self { deadline }
    }

    /// Fixes out-of-range values so the config is safe to use.
    ///
    /// A zero deadline would answer every join with "accepted" before
    /// the join had a chance to run, so it is replaced by
    /// [`DEFAULT_JOIN_DEADLINE`].
    pub fn validated(mut self) -> Self {
        if self.deadline.is_zero() {
            tracing::warn!(
                default_secs = DEFAULT_JOIN_DEADLINE.as_secs(),
                "join deadline of zero is not usable, using the default"
            );
            self.deadline = DEFAULT_JOIN_DEADLINE;
        }
        self
    }
}
