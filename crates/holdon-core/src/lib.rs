#![cfg_attr(test, allow(clippy::unwrap_used))]

//! holdon-core - Blocking-decision engine for the holdon distraction blocker.
//!
//! This library implements the decision core that sits behind the holdon
//! daemon: given a navigation to some hostname, decide whether the
//! destination is blocked, whether a temporary exemption lets it through,
//! and record the outcome so the decision can later be reconciled against
//! what the user did on the friction screen.
//!
//! The engine is deliberately restart-safe: nothing durable lives in
//! memory. Every classification re-reads the persisted exemption list, and
//! every interception writes its log entry before the redirect is issued.
//! The only in-memory state is debugging aids (decision traces) and the
//! per-tab intercept bookkeeping owned by the daemon.
//!
//! # Modules
//!
//! - [`domain`]: hostname normalization, suffix matching, and the blocked
//!   domain set
//! - [`exemption`]: temporary whitelist entries and their durable store
//! - [`access_log`]: interception journal with a strict
//!   `Pending -> {Allowed|Blocked|Closed}` lifecycle
//! - [`classifier`]: the pure blocking decision plus its audit trace
//! - [`trace`]: bounded in-memory buffer of decision traces
//! - [`storage`]: atomic JSON state files backing the durable stores
//! - [`usage`]: daily-usage aggregation over the access log
//! - [`ipc`]: UDS request/response types and frame codec
//! - [`config`]: TOML configuration for the daemon

pub mod access_log;
pub mod classifier;
pub mod config;
pub mod domain;
pub mod exemption;
pub mod ipc;
pub mod storage;
pub mod trace;
pub mod usage;
