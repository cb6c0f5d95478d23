use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ─── Scalar aliases ───────────────────────────────────────────

/// Epoch milliseconds (UTC).
pub type Timestamp = u64;

pub const MS_PER_MINUTE: u64 = 60_000;

// ─── Workflow input ───────────────────────────────────────────

/// Immutable workflow input, set once at start.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalConfig {
    /// Number of approvers the request fans out to.
    pub approver_count: u32,
    /// Distinct approvals needed to reach quorum.
    pub required_approvals: u32,
    /// Deadline, measured from the instance's logical start time.
    pub timeout_minutes: u64,
}

impl ApprovalConfig {
    /// Validate at start. A config where `required_approvals` exceeds
    /// `approver_count` could only ever time out, so it is rejected here
    /// rather than accepted and left to stall.
    pub fn validate(&self) -> Result<(), String> {
        if self.approver_count == 0 {
            return Err("approverCount must be greater than zero".into());
        }
        if self.required_approvals == 0 {
            return Err("requiredApprovals must be greater than zero".into());
        }
        if self.timeout_minutes == 0 {
            return Err("timeoutMinutes must be greater than zero".into());
        }
        if self.required_approvals > self.approver_count {
            return Err(format!(
                "requiredApprovals ({}) cannot exceed approverCount ({})",
                self.required_approvals, self.approver_count
            ));
        }
        Ok(())
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_minutes * MS_PER_MINUTE
    }
}

// ─── Approval signal ──────────────────────────────────────────

/// One approver's vote, delivered to a running instance zero or more times.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalSignal {
    pub approver: String,
    pub approved: bool,
}

impl ApprovalSignal {
    pub fn validate(&self) -> Result<(), String> {
        if self.approver.is_empty() {
            return Err("approver must not be empty".into());
        }
        Ok(())
    }
}

// ─── Outcome ──────────────────────────────────────────────────

/// Terminal result of a workflow instance. Set exactly once, then immutable.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Outcome {
    /// Quorum reached — `count` distinct approvals.
    Approved { count: u32 },
    /// Unconditional veto by a single rejecting approver.
    Rejected { approver: String },
    /// Deadline elapsed with `count` distinct approvals accumulated.
    TimedOut { count: u32 },
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Approved { count } => write!(f, "Approved ({count} approvals received)"),
            Outcome::Rejected { approver } => write!(f, "Rejected by {approver}"),
            Outcome::TimedOut { count } => write!(f, "Timed out with {count} approvals so far"),
        }
    }
}

// ─── Instance ─────────────────────────────────────────────────

/// Top-level instance status as seen by the client facade.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum InstanceStatus {
    Pending,
    Completed { outcome: Outcome },
    /// Fatal invariant violation — the instance was aborted, not completed.
    Failed { message: String },
}

impl InstanceStatus {
    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            InstanceStatus::Completed { .. } | InstanceStatus::Failed { .. }
        )
    }
}

/// A single workflow instance — the top-level execution context.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowInstance {
    pub instance_id: Uuid,
    pub config: ApprovalConfig,
    pub status: InstanceStatus,
    pub created_at: Timestamp,
}

/// Point-in-time view of an instance, returned by signal submission and
/// status queries.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub instance_id: Uuid,
    pub status: InstanceStatus,
    /// Human-readable terminal result, present once the instance completes.
    pub output: Option<String>,
}

impl StatusSnapshot {
    pub fn of(instance: &WorkflowInstance) -> Self {
        let output = match &instance.status {
            InstanceStatus::Pending => None,
            InstanceStatus::Completed { outcome } => Some(outcome.to_string()),
            InstanceStatus::Failed { message } => Some(message.clone()),
        };
        Self {
            instance_id: instance.instance_id,
            status: instance.status.clone(),
            output,
        }
    }
}
