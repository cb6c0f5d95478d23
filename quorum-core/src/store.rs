use crate::events::HistoryEvent;
use crate::types::{InstanceStatus, WorkflowInstance};
use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Persistence trait for workflow instances and their histories.
///
/// The engine operates exclusively through this trait, enabling pluggable
/// backends (MemoryStore for the in-process host, a database for production).
#[async_trait]
pub trait InstanceStore: Send + Sync {
    // ── Instance ──

    async fn save_instance(&self, instance: &WorkflowInstance) -> Result<()>;
    async fn load_instance(&self, id: Uuid) -> Result<Option<WorkflowInstance>>;
    async fn update_instance_status(&self, id: Uuid, status: InstanceStatus) -> Result<()>;

    // ── Event log (append-only) ──

    /// Append an event and return its sequence number (1-based, per instance).
    async fn append_event(&self, instance_id: Uuid, event: &HistoryEvent) -> Result<u64>;
    async fn read_events(
        &self,
        instance_id: Uuid,
        from_seq: u64,
    ) -> Result<Vec<(u64, HistoryEvent)>>;
}
