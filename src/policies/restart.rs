//! Restart policies for stream actors.
//!
//! [`RestartPolicy`] determines whether a stream actor revives its task
//! after it finishes or fails.
//!
//! Streaming tasks run under [`RestartPolicy::Always`]: a controller state
//! stream is expected to be continuous, so even a clean end is revived.
//! The other variants exist for auxiliary work (one-shot registration
//! probes, test tasks).

/// Policy controlling whether a task is restarted after completion or
/// failure.
#[derive(Clone, Copy, Debug)]
pub enum RestartPolicy {
    /// Never restart: the task runs once and exits permanently.
    Never,
    /// Restart only on failure.
    OnFailure,
    /// Always restart, after success or failure.
    ///   - `interval`: optional delay between successful completions
    ///     (`None` restarts immediately).
    Always {
        /// Delay between successful completions.
        interval: Option<std::time::Duration>,
    },
}

impl Default for RestartPolicy {
    /// Returns [`RestartPolicy::Always`] without an interval.
    fn default() -> Self {
        RestartPolicy::Always { interval: None }
    }
}
