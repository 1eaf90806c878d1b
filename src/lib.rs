//! The fbcli client library.
//!
//! This crate signs a command line session in to a hosted backend by pairing
//! it with a browser session through a one-time ticket in the backend's
//! realtime database.
//!
//! # Modules
//!
//! - `actions`: Command implementations
//! - `browser`: Launching the system browser
//! - `commands`: CLI command parsing
//! - `configstore`: Persistent key/value store for session state
//! - `configuration`: Configuration management
//! - `credentials`: The stored login credential
//! - `login`: The ticket pairing login flow
//! - `realtime`: Realtime database access

pub mod actions;
pub mod browser;
pub mod commands;
pub mod configstore;
pub mod configuration;
pub mod credentials;
pub mod error;
pub mod exit_codes;
pub mod login;
pub mod realtime;
