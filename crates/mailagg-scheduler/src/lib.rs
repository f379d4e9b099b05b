//! Polling and delivery orchestration (components C4 Fetcher and C5
//! Scheduler): drives the IMAP fetch pipeline for each account on its own
//! interval, persists messages exactly once, applies the rule engine, and
//! hands notifications off to the delivery dispatcher.

pub mod error;
pub mod fetcher;
pub mod lock;
pub mod scheduler;

pub use {
    error::{Result, SchedulerError},
    fetcher::{FetchOutcome, Fetcher},
    scheduler::Scheduler,
};
