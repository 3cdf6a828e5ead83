#![cfg_attr(test, allow(clippy::unwrap_used))]

//! holdon-daemon - Distraction-blocker engine daemon library.
//!
//! The daemon hosts the blocking-decision engine behind a Unix domain
//! socket. Its clients are the browser shim (which forwards navigation
//! starts and tab closures, and applies the redirects the daemon hands
//! back) and the operator CLI. The daemon itself is disposable: every
//! decision re-reads persisted state, so it can be killed and restarted
//! between any two requests without changing a verdict.
//!
//! # Modules
//!
//! - [`state`]: shared daemon state (stores, classifier, transient maps)
//! - [`tracker`]: per-tab intercept bookkeeping for abandonment detection
//! - [`monitor`]: navigation-start handling and the intercept redirect
//! - [`reconciler`]: resolution of pending intercepts into terminal states
//! - [`handlers`]: IPC request dispatch
//! - [`server`]: Unix-socket accept loop and frame codec

pub mod handlers;
pub mod monitor;
pub mod reconciler;
pub mod server;
pub mod state;
pub mod tracker;
