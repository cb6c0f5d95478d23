use crate::events::HistoryEvent;
use crate::machine::{self, QuorumMachine, Step};
use crate::store::InstanceStore;
use crate::types::{
    ApprovalConfig, ApprovalSignal, InstanceStatus, Outcome, StatusSnapshot, Timestamp,
    WorkflowInstance,
};
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Caller-facing error taxonomy. Validation and unknown-instance errors are
/// local to the caller; `Internal` means an invariant was violated and the
/// instance was aborted.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid approval config: {0}")]
    InvalidConfig(String),
    #[error("invalid approval signal: {0}")]
    InvalidSignal(String),
    #[error("unknown workflow instance {0}")]
    UnknownInstance(Uuid),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

struct InstanceHandle {
    signal_tx: mpsc::UnboundedSender<ApprovalSignal>,
    task: JoinHandle<()>,
}

/// Live-instance registry, shared with the instance tasks so each one can
/// remove its own entry when it reaches a terminal state.
type Registry = Arc<Mutex<HashMap<Uuid, InstanceHandle>>>;

fn lock_registry(registry: &Registry) -> MutexGuard<'_, HashMap<Uuid, InstanceHandle>> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The approval engine — in-process durable host plus client facade.
///
/// One cooperative tokio task per instance; no state is shared between
/// instances. Each task races the cancellable deadline timer against the
/// instance's unbounded signal queue, appends the winning event to history
/// BEFORE applying it to the machine, and exits on the first terminal
/// transition. [`resume`] rebuilds an interrupted instance from its recorded
/// history without re-running any side effect.
///
/// [`resume`]: ApprovalEngine::resume
pub struct ApprovalEngine {
    store: Arc<dyn InstanceStore>,
    instances: Registry,
    /// Serializes check-replay-register across concurrent resume attempts,
    /// so a pending instance never ends up with two live tasks.
    resume_gate: tokio::sync::Mutex<()>,
}

impl ApprovalEngine {
    pub fn new(store: Arc<dyn InstanceStore>) -> Self {
        Self {
            store,
            instances: Arc::new(Mutex::new(HashMap::new())),
            resume_gate: tokio::sync::Mutex::new(()),
        }
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<Uuid, InstanceHandle>> {
        lock_registry(&self.instances)
    }

    /// Number of instances with a live wait loop on this host.
    pub fn active_instances(&self) -> usize {
        self.registry().len()
    }

    /// Start a new workflow instance. Returns its opaque identifier.
    pub async fn start_new(&self, config: ApprovalConfig) -> Result<Uuid, EngineError> {
        config.validate().map_err(EngineError::InvalidConfig)?;

        let instance_id = Uuid::now_v7();
        let started_at = now_ms();
        let machine = QuorumMachine::new(config.clone(), started_at);

        self.store
            .save_instance(&WorkflowInstance {
                instance_id,
                config: config.clone(),
                status: InstanceStatus::Pending,
                created_at: started_at,
            })
            .await?;
        self.store
            .append_event(
                instance_id,
                &HistoryEvent::InstanceStarted {
                    config: config.clone(),
                    started_at_ms: started_at,
                },
            )
            .await?;
        self.store
            .append_event(
                instance_id,
                &HistoryEvent::TimerScheduled {
                    fire_at_ms: machine.deadline_ms(),
                },
            )
            .await?;

        // Notification is a live-only effect: start_new runs once per logical
        // occurrence and is never re-executed during history reconstruction.
        for n in 0..config.approver_count {
            info!(%instance_id, approver = n + 1, "requesting approval");
        }
        info!(
            %instance_id,
            required = config.required_approvals,
            deadline_ms = machine.deadline_ms(),
            "approval workflow started"
        );

        self.spawn_instance(instance_id, machine);
        Ok(instance_id)
    }

    /// Inject one approver's signal. Returns the instance's current status
    /// snapshot. Signals targeting a completed instance are recorded as
    /// ignored and the original terminal outcome is returned untouched.
    pub async fn raise_signal(
        &self,
        instance_id: Uuid,
        signal: ApprovalSignal,
    ) -> Result<StatusSnapshot, EngineError> {
        signal.validate().map_err(EngineError::InvalidSignal)?;

        let instance = self
            .store
            .load_instance(instance_id)
            .await?
            .ok_or(EngineError::UnknownInstance(instance_id))?;

        if instance.status.is_terminal() {
            self.ignore_signal(instance_id, &signal).await?;
            return self.get_status(instance_id).await;
        }

        // Instance is pending but may have no live task (host restarted).
        if !self.registry().contains_key(&instance_id) {
            self.resume(instance_id).await?;
        }

        let delivered = match self.registry().get(&instance_id) {
            Some(handle) => handle.signal_tx.send(signal.clone()).is_ok(),
            None => false,
        };
        if !delivered {
            // The wait loop exited between the status read and the send —
            // the terminal outcome stands and the late signal is dropped.
            self.ignore_signal(instance_id, &signal).await?;
        }

        self.get_status(instance_id).await
    }

    /// Current status of an instance, from the store.
    pub async fn get_status(&self, instance_id: Uuid) -> Result<StatusSnapshot, EngineError> {
        let instance = self
            .store
            .load_instance(instance_id)
            .await?
            .ok_or(EngineError::UnknownInstance(instance_id))?;
        Ok(StatusSnapshot::of(&instance))
    }

    /// Re-hydrate an instance after a host restart: fold its recorded history
    /// through a fresh machine (pure, no side effects), then re-arm the
    /// deadline timer and re-enter the wait loop if still pending. Terminal
    /// histories only get their status record reconciled.
    pub async fn resume(&self, instance_id: Uuid) -> Result<(), EngineError> {
        // One resume at a time: the store reads below suspend, and two
        // callers passing the liveness check together would each spawn a
        // task, the second registration dropping the first task's sender.
        let _gate = self.resume_gate.lock().await;

        let instance = self
            .store
            .load_instance(instance_id)
            .await?
            .ok_or(EngineError::UnknownInstance(instance_id))?;
        if instance.status.is_terminal() || self.registry().contains_key(&instance_id) {
            return Ok(());
        }

        let events = self.store.read_events(instance_id, 1).await?;
        let machine = machine::replay(&events)?;

        if machine.is_terminal() {
            // Crashed between the terminal transition and the bookkeeping
            // writes. Finish the bookkeeping exactly once; re-run nothing.
            let outcome = machine
                .outcome()
                .cloned()
                .ok_or_else(|| anyhow!("terminal machine without outcome"))?;
            if !events
                .iter()
                .any(|(_, e)| matches!(e, HistoryEvent::TimerCancelled))
            {
                self.store
                    .append_event(instance_id, &HistoryEvent::TimerCancelled)
                    .await?;
            }
            if !events
                .iter()
                .any(|(_, e)| matches!(e, HistoryEvent::Completed { .. }))
            {
                self.store
                    .append_event(
                        instance_id,
                        &HistoryEvent::Completed {
                            outcome: outcome.clone(),
                            at_ms: now_ms(),
                        },
                    )
                    .await?;
            }
            self.store
                .update_instance_status(instance_id, InstanceStatus::Completed { outcome })
                .await?;
            return Ok(());
        }

        info!(
            %instance_id,
            approvals = machine.approvals(),
            events = events.len(),
            "resuming instance from recorded history"
        );
        self.spawn_instance(instance_id, machine);
        Ok(())
    }

    async fn ignore_signal(
        &self,
        instance_id: Uuid,
        signal: &ApprovalSignal,
    ) -> Result<(), EngineError> {
        warn!(
            %instance_id,
            approver = %signal.approver,
            "signal ignored, instance already completed"
        );
        self.store
            .append_event(
                instance_id,
                &HistoryEvent::SignalIgnored {
                    approver: signal.approver.clone(),
                    reason: "instance already completed".into(),
                },
            )
            .await?;
        Ok(())
    }

    fn spawn_instance(&self, instance_id: Uuid, machine: QuorumMachine) {
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let store = Arc::clone(&self.store);
        let registry = Arc::clone(&self.instances);
        // Register under the lock before the task can observe the registry,
        // so its terminal-state removal cannot run ahead of the insert.
        let mut guard = self.registry();
        let task = tokio::spawn(run_instance(store, registry, instance_id, machine, signal_rx));
        guard.insert(instance_id, InstanceHandle { signal_tx, task });
    }
}

impl Drop for ApprovalEngine {
    fn drop(&mut self) {
        // Instance tasks belong to this host; a dropped host must not leave
        // them running detached. History survives in the store for resume.
        for (_, handle) in self.registry().drain() {
            handle.task.abort();
        }
    }
}

async fn run_instance(
    store: Arc<dyn InstanceStore>,
    registry: Registry,
    instance_id: Uuid,
    mut machine: QuorumMachine,
    mut signal_rx: mpsc::UnboundedReceiver<ApprovalSignal>,
) {
    if let Err(err) = drive(&*store, instance_id, &mut machine, &mut signal_rx).await {
        // Fatal: the instance must abort, not guess.
        error!(%instance_id, %err, "instance aborted on invariant violation");
        let _ = store
            .update_instance_status(
                instance_id,
                InstanceStatus::Failed {
                    message: err.to_string(),
                },
            )
            .await;
    }
    // Terminal either way — drop this instance's registry entry so a
    // long-lived host does not accumulate one handle per finished workflow.
    lock_registry(&registry).remove(&instance_id);
}

/// The wait loop: one rendezvous per iteration between "next signal" and
/// "deadline fired", exactly one winner processed before the race is
/// re-established. The winning event is appended to history before it is
/// applied, so a crash in between replays to the same state.
async fn drive(
    store: &dyn InstanceStore,
    instance_id: Uuid,
    machine: &mut QuorumMachine,
    signal_rx: &mut mpsc::UnboundedReceiver<ApprovalSignal>,
) -> Result<()> {
    let remaining = machine.deadline_ms().saturating_sub(now_ms());
    let timer = tokio::time::sleep(Duration::from_millis(remaining));
    tokio::pin!(timer);

    let outcome = loop {
        tokio::select! {
            () = &mut timer => {
                store
                    .append_event(
                        instance_id,
                        &HistoryEvent::TimerFired {
                            fire_at_ms: machine.deadline_ms(),
                        },
                    )
                    .await?;
                match machine.on_timer_fired() {
                    Step::Completed(outcome) => {
                        warn!(%instance_id, result = %outcome, "deadline elapsed");
                        break outcome;
                    }
                    Step::Pending => {
                        return Err(anyhow!("timer fired without terminal transition"))
                    }
                }
            }
            received = signal_rx.recv() => {
                let signal = received
                    .ok_or_else(|| anyhow!("signal channel closed while instance pending"))?;
                store
                    .append_event(
                        instance_id,
                        &HistoryEvent::SignalReceived {
                            approver: signal.approver.clone(),
                            approved: signal.approved,
                        },
                    )
                    .await?;
                let before = machine.approvals();
                match machine.on_signal(&signal) {
                    Step::Completed(outcome) => {
                        match &outcome {
                            Outcome::Approved { .. } => {
                                info!(%instance_id, result = %outcome, "quorum reached")
                            }
                            _ => warn!(%instance_id, result = %outcome, "workflow completed"),
                        }
                        break outcome;
                    }
                    Step::Pending if machine.approvals() == before => {
                        info!(
                            %instance_id,
                            approver = %signal.approver,
                            "duplicate approval ignored"
                        );
                    }
                    Step::Pending => {
                        info!(
                            %instance_id,
                            approver = %signal.approver,
                            quorum = machine.approvals(),
                            "approval received"
                        );
                    }
                }
            }
        }
    };

    // Terminal transition: cancel the outstanding deadline timer exactly
    // once, on every exit path, before recording the outcome.
    store
        .append_event(instance_id, &HistoryEvent::TimerCancelled)
        .await?;
    store
        .append_event(
            instance_id,
            &HistoryEvent::Completed {
                outcome: outcome.clone(),
                at_ms: now_ms(),
            },
        )
        .await?;
    store
        .update_instance_status(instance_id, InstanceStatus::Completed { outcome })
        .await?;
    Ok(())
}

fn now_ms() -> Timestamp {
    chrono::Utc::now().timestamp_millis() as Timestamp
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store_memory::MemoryStore;

    fn config(approvers: u32, required: u32, minutes: u64) -> ApprovalConfig {
        ApprovalConfig {
            approver_count: approvers,
            required_approvals: required,
            timeout_minutes: minutes,
        }
    }

    fn approve(name: &str) -> ApprovalSignal {
        ApprovalSignal {
            approver: name.into(),
            approved: true,
        }
    }

    fn reject(name: &str) -> ApprovalSignal {
        ApprovalSignal {
            approver: name.into(),
            approved: false,
        }
    }

    /// Let the spawned instance task process everything already queued.
    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    /// Store whose futures suspend once per operation — surfaces
    /// interleavings that `MemoryStore`'s single-poll futures never hit,
    /// the way a database-backed store would.
    struct YieldingStore(MemoryStore);

    #[async_trait::async_trait]
    impl crate::store::InstanceStore for YieldingStore {
        async fn save_instance(&self, instance: &WorkflowInstance) -> anyhow::Result<()> {
            tokio::task::yield_now().await;
            self.0.save_instance(instance).await
        }

        async fn load_instance(&self, id: Uuid) -> anyhow::Result<Option<WorkflowInstance>> {
            tokio::task::yield_now().await;
            self.0.load_instance(id).await
        }

        async fn update_instance_status(
            &self,
            id: Uuid,
            status: InstanceStatus,
        ) -> anyhow::Result<()> {
            tokio::task::yield_now().await;
            self.0.update_instance_status(id, status).await
        }

        async fn append_event(
            &self,
            instance_id: Uuid,
            event: &HistoryEvent,
        ) -> anyhow::Result<u64> {
            tokio::task::yield_now().await;
            self.0.append_event(instance_id, event).await
        }

        async fn read_events(
            &self,
            instance_id: Uuid,
            from_seq: u64,
        ) -> anyhow::Result<Vec<(u64, HistoryEvent)>> {
            tokio::task::yield_now().await;
            self.0.read_events(instance_id, from_seq).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn approval_path_completes_with_quorum() {
        let store = Arc::new(MemoryStore::new());
        let engine = ApprovalEngine::new(store.clone());

        let id = engine.start_new(config(3, 2, 10)).await.unwrap();
        engine.raise_signal(id, approve("alice")).await.unwrap();
        engine.raise_signal(id, approve("bob")).await.unwrap();
        settle().await;

        let status = engine.get_status(id).await.unwrap();
        assert_eq!(
            status.status,
            InstanceStatus::Completed {
                outcome: Outcome::Approved { count: 2 }
            }
        );
        assert_eq!(status.output.as_deref(), Some("Approved (2 approvals received)"));
    }

    #[tokio::test(start_paused = true)]
    async fn rejection_vetoes_immediately() {
        let store = Arc::new(MemoryStore::new());
        let engine = ApprovalEngine::new(store.clone());

        let id = engine.start_new(config(3, 2, 10)).await.unwrap();
        engine.raise_signal(id, approve("alice")).await.unwrap();
        engine.raise_signal(id, reject("bob")).await.unwrap();
        settle().await;

        let status = engine.get_status(id).await.unwrap();
        assert_eq!(status.output.as_deref(), Some("Rejected by bob"));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_times_out_with_partial_quorum() {
        let store = Arc::new(MemoryStore::new());
        let engine = ApprovalEngine::new(store.clone());

        let id = engine.start_new(config(3, 2, 10)).await.unwrap();
        engine.raise_signal(id, approve("alice")).await.unwrap();
        settle().await;

        tokio::time::advance(Duration::from_secs(10 * 60 + 1)).await;
        settle().await;

        let status = engine.get_status(id).await.unwrap();
        assert_eq!(
            status.output.as_deref(),
            Some("Timed out with 1 approvals so far")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_approvals_do_not_add_quorum() {
        let store = Arc::new(MemoryStore::new());
        let engine = ApprovalEngine::new(store.clone());

        let id = engine.start_new(config(3, 2, 10)).await.unwrap();
        engine.raise_signal(id, approve("alice")).await.unwrap();
        engine.raise_signal(id, approve("alice")).await.unwrap();
        settle().await;

        // Still pending — the duplicate contributed nothing.
        let status = engine.get_status(id).await.unwrap();
        assert_eq!(status.status, InstanceStatus::Pending);

        tokio::time::advance(Duration::from_secs(10 * 60 + 1)).await;
        settle().await;
        let status = engine.get_status(id).await.unwrap();
        assert_eq!(
            status.output.as_deref(),
            Some("Timed out with 1 approvals so far")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn late_signal_does_not_alter_terminal_outcome() {
        let store = Arc::new(MemoryStore::new());
        let engine = ApprovalEngine::new(store.clone());

        let id = engine.start_new(config(3, 1, 10)).await.unwrap();
        engine.raise_signal(id, approve("alice")).await.unwrap();
        settle().await;

        let snapshot = engine.raise_signal(id, reject("bob")).await.unwrap();
        assert_eq!(
            snapshot.output.as_deref(),
            Some("Approved (1 approvals received)")
        );

        let events = store.read_events(id, 1).await.unwrap();
        assert!(events
            .iter()
            .any(|(_, e)| matches!(e, HistoryEvent::SignalIgnored { approver, .. } if approver == "bob")));
    }

    #[tokio::test(start_paused = true)]
    async fn timer_cancelled_exactly_once_per_terminal_path() {
        let store = Arc::new(MemoryStore::new());
        let engine = ApprovalEngine::new(store.clone());

        // Signal-won path.
        let approved = engine.start_new(config(3, 1, 10)).await.unwrap();
        engine.raise_signal(approved, approve("alice")).await.unwrap();
        // Timer-won path.
        let timed_out = engine.start_new(config(3, 1, 10)).await.unwrap();
        settle().await;
        tokio::time::advance(Duration::from_secs(10 * 60 + 1)).await;
        settle().await;

        for id in [approved, timed_out] {
            let events = store.read_events(id, 1).await.unwrap();
            let cancels = events
                .iter()
                .filter(|(_, e)| matches!(e, HistoryEvent::TimerCancelled))
                .count();
            assert_eq!(cancels, 1, "instance {id}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_inputs_are_rejected_before_the_machine() {
        let store = Arc::new(MemoryStore::new());
        let engine = ApprovalEngine::new(store.clone());

        assert!(matches!(
            engine.start_new(config(0, 2, 10)).await,
            Err(EngineError::InvalidConfig(_))
        ));
        assert!(matches!(
            engine.start_new(config(2, 3, 10)).await,
            Err(EngineError::InvalidConfig(_))
        ));

        let id = engine.start_new(config(3, 2, 10)).await.unwrap();
        assert!(matches!(
            engine.raise_signal(id, approve("")).await,
            Err(EngineError::InvalidSignal(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_instance_is_surfaced() {
        let store = Arc::new(MemoryStore::new());
        let engine = ApprovalEngine::new(store.clone());

        let ghost = Uuid::now_v7();
        assert!(matches!(
            engine.get_status(ghost).await,
            Err(EngineError::UnknownInstance(_))
        ));
        assert!(matches!(
            engine.raise_signal(ghost, approve("alice")).await,
            Err(EngineError::UnknownInstance(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn resume_continues_a_partially_approved_instance() {
        let store = Arc::new(MemoryStore::new());

        let id = {
            let engine = ApprovalEngine::new(store.clone());
            let id = engine.start_new(config(3, 2, 10)).await.unwrap();
            engine.raise_signal(id, approve("alice")).await.unwrap();
            settle().await;
            id
            // Engine dropped here — simulated host crash; tasks aborted.
        };

        let engine = ApprovalEngine::new(store.clone());
        engine.resume(id).await.unwrap();
        let status = engine.get_status(id).await.unwrap();
        assert_eq!(status.status, InstanceStatus::Pending);

        engine.raise_signal(id, approve("bob")).await.unwrap();
        settle().await;
        let status = engine.get_status(id).await.unwrap();
        assert_eq!(
            status.output.as_deref(),
            Some("Approved (2 approvals received)")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn resume_of_terminal_history_reconciles_without_side_effects() {
        let store = Arc::new(MemoryStore::new());

        let id = {
            let engine = ApprovalEngine::new(store.clone());
            let id = engine.start_new(config(3, 1, 10)).await.unwrap();
            engine.raise_signal(id, approve("alice")).await.unwrap();
            settle().await;
            id
        };
        let events_before = store.read_events(id, 1).await.unwrap().len();

        let engine = ApprovalEngine::new(store.clone());
        engine.resume(id).await.unwrap();

        // Nothing re-ran: history length unchanged, outcome intact.
        assert_eq!(store.read_events(id, 1).await.unwrap().len(), events_before);
        let status = engine.get_status(id).await.unwrap();
        assert_eq!(
            status.output.as_deref(),
            Some("Approved (1 approvals received)")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn completed_instances_are_pruned_from_the_registry() {
        let store = Arc::new(MemoryStore::new());
        let engine = ApprovalEngine::new(store.clone());

        // Signal-won path.
        let id = engine.start_new(config(3, 1, 10)).await.unwrap();
        assert_eq!(engine.active_instances(), 1);
        engine.raise_signal(id, approve("alice")).await.unwrap();
        settle().await;
        assert_eq!(engine.active_instances(), 0);

        // Timer-won path.
        engine.start_new(config(3, 2, 10)).await.unwrap();
        assert_eq!(engine.active_instances(), 1);
        settle().await;
        tokio::time::advance(Duration::from_secs(10 * 60 + 1)).await;
        settle().await;
        assert_eq!(engine.active_instances(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_revivals_register_exactly_one_task() {
        let store = Arc::new(YieldingStore(MemoryStore::new()));

        let id = {
            let engine = ApprovalEngine::new(store.clone());
            let id = engine.start_new(config(3, 3, 10)).await.unwrap();
            engine.raise_signal(id, approve("alice")).await.unwrap();
            settle().await;
            id
            // Engine dropped here — simulated host crash; tasks aborted.
        };

        // Two submissions race to re-hydrate the same pending instance while
        // the store suspends mid-resume. Only one wait loop may come out of
        // it; the loser of the registration must not have its sender dropped
        // and the instance must never be marked Failed.
        let engine = ApprovalEngine::new(store.clone());
        let (first, second) = tokio::join!(
            engine.raise_signal(id, approve("bob")),
            engine.raise_signal(id, approve("carol")),
        );
        first.unwrap();
        second.unwrap();
        settle().await;

        let status = engine.get_status(id).await.unwrap();
        assert_eq!(
            status.status,
            InstanceStatus::Completed {
                outcome: Outcome::Approved { count: 3 }
            }
        );

        // Exactly one wait loop recorded the terminal transition.
        let events = store.0.read_events(id, 1).await.unwrap();
        let completions = events
            .iter()
            .filter(|(_, e)| matches!(e, HistoryEvent::Completed { .. }))
            .count();
        let cancels = events
            .iter()
            .filter(|(_, e)| matches!(e, HistoryEvent::TimerCancelled))
            .count();
        assert_eq!((completions, cancels), (1, 1));
        assert!(!events
            .iter()
            .any(|(_, e)| matches!(e, HistoryEvent::TimerFired { .. })));
        assert_eq!(engine.active_instances(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn raise_signal_revives_a_resumable_instance() {
        let store = Arc::new(MemoryStore::new());

        let id = {
            let engine = ApprovalEngine::new(store.clone());
            let id = engine.start_new(config(3, 2, 10)).await.unwrap();
            engine.raise_signal(id, approve("alice")).await.unwrap();
            settle().await;
            id
        };

        // No explicit resume: submitting a signal re-hydrates the instance.
        let engine = ApprovalEngine::new(store.clone());
        engine.raise_signal(id, approve("bob")).await.unwrap();
        settle().await;

        let status = engine.get_status(id).await.unwrap();
        assert_eq!(
            status.output.as_deref(),
            Some("Approved (2 approvals received)")
        );
    }
}
