//! Turnover operations core: calendar-driven job materialization, the job
//! lifecycle state machine, evidence-gated payment settlement, and cleaner
//! payout batches for vacation-rental cleaning.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
