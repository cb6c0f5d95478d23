//! Quorum-based approval workflow engine.
//!
//! A request fans out to N approvers and completes when enough approvals
//! arrive, a rejection arrives, or a deadline elapses — whichever happens
//! first. The crate is split along the durable-execution seam:
//!
//! - [`machine`] — the pure quorum state machine. A deterministic function of
//!   (config, ordered signals, one timer event); no clock reads, no I/O.
//! - [`events`] — the append-only per-instance history, which is both the
//!   audit trail and the replay source after a restart.
//! - [`store`] / [`store_memory`] — the persistence trait and its in-memory
//!   backend.
//! - [`engine`] — the host side: one cooperative task per instance racing a
//!   cancellable deadline timer against the instance's signal queue, plus the
//!   client facade (start / raise signal / query status / resume).

pub mod engine;
pub mod events;
pub mod machine;
pub mod store;
pub mod store_memory;
pub mod types;
