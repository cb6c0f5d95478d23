use crate::events::HistoryEvent;
use crate::types::{ApprovalConfig, ApprovalSignal, Outcome, Timestamp};
use anyhow::{anyhow, Result};
use std::collections::HashSet;

/// Result of feeding one input to the machine.
#[derive(Clone, Debug, PartialEq)]
pub enum Step {
    /// Quorum not yet satisfied — keep waiting.
    Pending,
    /// The machine is terminal (either this input completed it, or it
    /// already was and the input was ignored).
    Completed(Outcome),
}

/// The quorum state machine — the deterministic core of the workflow.
///
/// State is a pure function of (config, logical start time, the ordered
/// signals delivered, at most one timer-fired event). The machine never
/// reads the clock: the host supplies `now_ms` once at construction, which
/// fixes the deadline. Replaying a recorded history through [`apply_event`]
/// therefore reconstructs exactly the state the live run had.
///
/// Transition rules, evaluated per input in delivery order:
/// - timer fired while pending → `TimedOut(k)` with the partial quorum k
/// - `approved = false` while pending → `Rejected(approver)` (veto, not vote)
/// - `approved = true` while pending → set-insert the approver; quorum at
///   `required_approvals` distinct approvers → `Approved(k)`
/// - any input after a terminal outcome → ignored
///
/// [`apply_event`]: QuorumMachine::apply_event
pub struct QuorumMachine {
    config: ApprovalConfig,
    /// Distinct approvers seen so far. Only grows while pending; a repeat
    /// approval from the same identifier never adds quorum.
    approved_by: HashSet<String>,
    deadline_ms: Timestamp,
    outcome: Option<Outcome>,
}

impl QuorumMachine {
    /// `now_ms` is the host-supplied logical start time — the single
    /// non-deterministic input, recorded in history and used only here.
    pub fn new(config: ApprovalConfig, now_ms: Timestamp) -> Self {
        let deadline_ms = now_ms + config.timeout_ms();
        Self {
            config,
            approved_by: HashSet::new(),
            deadline_ms,
            outcome: None,
        }
    }

    pub fn deadline_ms(&self) -> Timestamp {
        self.deadline_ms
    }

    /// Number of distinct approvals accumulated so far.
    pub fn approvals(&self) -> u32 {
        self.approved_by.len() as u32
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome.is_some()
    }

    /// Feed one approval/rejection signal.
    pub fn on_signal(&mut self, signal: &ApprovalSignal) -> Step {
        if let Some(outcome) = &self.outcome {
            return Step::Completed(outcome.clone());
        }

        if !signal.approved {
            let outcome = Outcome::Rejected {
                approver: signal.approver.clone(),
            };
            self.outcome = Some(outcome.clone());
            return Step::Completed(outcome);
        }

        self.approved_by.insert(signal.approver.clone());
        if self.approvals() >= self.config.required_approvals {
            let outcome = Outcome::Approved {
                count: self.approvals(),
            };
            self.outcome = Some(outcome.clone());
            Step::Completed(outcome)
        } else {
            Step::Pending
        }
    }

    /// Feed the (single) deadline-timer firing.
    pub fn on_timer_fired(&mut self) -> Step {
        if let Some(outcome) = &self.outcome {
            return Step::Completed(outcome.clone());
        }
        let outcome = Outcome::TimedOut {
            count: self.approvals(),
        };
        self.outcome = Some(outcome.clone());
        Step::Completed(outcome)
    }

    /// Fold one recorded event into the machine. Pure — safe to re-run any
    /// number of times over the same history prefix order.
    pub fn apply_event(&mut self, event: &HistoryEvent) {
        match event {
            HistoryEvent::SignalReceived { approver, approved } => {
                self.on_signal(&ApprovalSignal {
                    approver: approver.clone(),
                    approved: *approved,
                });
            }
            HistoryEvent::TimerFired { .. } => {
                self.on_timer_fired();
            }
            // Start/schedule are consumed by `replay`; the rest are effects
            // of transitions, not inputs to them.
            HistoryEvent::InstanceStarted { .. }
            | HistoryEvent::TimerScheduled { .. }
            | HistoryEvent::TimerCancelled
            | HistoryEvent::SignalIgnored { .. }
            | HistoryEvent::Completed { .. } => {}
        }
    }
}

/// Rebuild a machine from recorded history. The first event must be
/// `InstanceStarted`; everything else folds through the same transition
/// functions the live run used.
pub fn replay(events: &[(u64, HistoryEvent)]) -> Result<QuorumMachine> {
    let mut machine = match events.first() {
        Some((
            _,
            HistoryEvent::InstanceStarted {
                config,
                started_at_ms,
            },
        )) => QuorumMachine::new(config.clone(), *started_at_ms),
        Some((seq, other)) => {
            return Err(anyhow!("history starts with {other:?} at seq {seq}, expected InstanceStarted"))
        }
        None => return Err(anyhow!("cannot replay an empty history")),
    };
    for (_, event) in &events[1..] {
        machine.apply_event(event);
    }
    Ok(machine)
}
