use crate::types::{ApprovalConfig, Outcome, Timestamp};
use serde::{Deserialize, Serialize};

/// History events — the durable audit trail for every workflow instance.
///
/// The log is append-only and is the single replay source: folding these
/// events through the quorum machine reconstructs the instance's state after
/// a crash or restart without re-running any side effect.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum HistoryEvent {
    /// Instance created. `started_at_ms` is the logical start time captured
    /// once by the host; the machine never reads the clock itself.
    InstanceStarted {
        config: ApprovalConfig,
        started_at_ms: Timestamp,
    },
    /// Deadline timer registered for an absolute instant.
    TimerScheduled { fire_at_ms: Timestamp },
    /// An approval/rejection signal was delivered to the wait loop.
    SignalReceived { approver: String, approved: bool },
    /// The deadline timer won the race while the instance was pending.
    TimerFired { fire_at_ms: Timestamp },
    /// The outstanding deadline timer was cancelled. Recorded exactly once
    /// per instance, on every terminal path.
    TimerCancelled,
    /// A signal arrived after the terminal transition and was dropped.
    SignalIgnored { approver: String, reason: String },
    /// Terminal transition. The outcome never changes after this event.
    Completed { outcome: Outcome, at_ms: Timestamp },
}
