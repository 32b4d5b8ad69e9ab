// ABOUTME: Library root for otaflow - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod history;
pub mod output;
pub mod registry;
pub mod release;
pub mod rollout;
pub mod service;
pub mod store;
pub mod types;
pub mod validator;
