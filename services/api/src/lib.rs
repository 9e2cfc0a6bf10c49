//! Phone Teacher API Library Crate
//!
//! This library contains the web-facing half of the phone teacher service:
//! configuration, application state, the telephony webhooks, the operator
//! panel API, and routing. The `api` binary is a thin wrapper around it.

pub mod config;
pub mod handlers;
pub mod log_file;
pub mod logs;
pub mod models;
pub mod panel;
pub mod router;
pub mod state;
pub mod webhook;
