use crate::events::HistoryEvent;
use crate::store::InstanceStore;
use crate::types::{InstanceStatus, WorkflowInstance};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    instances: BTreeMap<Uuid, WorkflowInstance>,
    events: BTreeMap<Uuid, Vec<HistoryEvent>>,
}

/// In-memory store backing the in-process host and the test suite.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>> {
        self.inner.lock().map_err(|_| anyhow!("memory store lock poisoned"))
    }
}

#[async_trait]
impl InstanceStore for MemoryStore {
    async fn save_instance(&self, instance: &WorkflowInstance) -> Result<()> {
        self.lock()?
            .instances
            .insert(instance.instance_id, instance.clone());
        Ok(())
    }

    async fn load_instance(&self, id: Uuid) -> Result<Option<WorkflowInstance>> {
        Ok(self.lock()?.instances.get(&id).cloned())
    }

    async fn update_instance_status(&self, id: Uuid, status: InstanceStatus) -> Result<()> {
        let mut inner = self.lock()?;
        let instance = inner
            .instances
            .get_mut(&id)
            .ok_or_else(|| anyhow!("update_instance_status: unknown instance {id}"))?;
        instance.status = status;
        Ok(())
    }

    async fn append_event(&self, instance_id: Uuid, event: &HistoryEvent) -> Result<u64> {
        let mut inner = self.lock()?;
        let log = inner.events.entry(instance_id).or_default();
        log.push(event.clone());
        Ok(log.len() as u64)
    }

    async fn read_events(
        &self,
        instance_id: Uuid,
        from_seq: u64,
    ) -> Result<Vec<(u64, HistoryEvent)>> {
        let inner = self.lock()?;
        let log = inner.events.get(&instance_id).map(Vec::as_slice).unwrap_or(&[]);
        Ok(log
            .iter()
            .enumerate()
            .map(|(i, e)| (i as u64 + 1, e.clone()))
            .filter(|(seq, _)| *seq >= from_seq)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ApprovalConfig;

    fn instance(id: Uuid) -> WorkflowInstance {
        WorkflowInstance {
            instance_id: id,
            config: ApprovalConfig {
                approver_count: 3,
                required_approvals: 2,
                timeout_minutes: 10,
            },
            status: InstanceStatus::Pending,
            created_at: 0,
        }
    }

    #[tokio::test]
    async fn event_sequence_numbers_are_monotonic() {
        let store = MemoryStore::new();
        let id = Uuid::now_v7();

        let seq1 = store
            .append_event(id, &HistoryEvent::TimerCancelled)
            .await
            .unwrap();
        let seq2 = store
            .append_event(id, &HistoryEvent::TimerCancelled)
            .await
            .unwrap();
        assert_eq!((seq1, seq2), (1, 2));

        let events = store.read_events(id, 2).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, 2);
    }

    #[tokio::test]
    async fn status_update_round_trips() {
        let store = MemoryStore::new();
        let id = Uuid::now_v7();
        store.save_instance(&instance(id)).await.unwrap();

        store
            .update_instance_status(
                id,
                InstanceStatus::Failed {
                    message: "boom".into(),
                },
            )
            .await
            .unwrap();

        let loaded = store.load_instance(id).await.unwrap().unwrap();
        assert!(loaded.status.is_terminal());
    }

    #[tokio::test]
    async fn unknown_instance_status_update_fails() {
        let store = MemoryStore::new();
        let result = store
            .update_instance_status(Uuid::now_v7(), InstanceStatus::Pending)
            .await;
        assert!(result.is_err());
    }
}
