//! Business logic and port definitions for Aladin.
//!
//! This crate defines the "ports" (provider, resolver and secret-store traits)
//! that the infrastructure layer implements, plus the usage governor and the
//! chat orchestrator. It depends only on `aladin-types` -- never on
//! `aladin-infra` or any HTTP/keychain crate.

pub mod chat;
pub mod context;
pub mod llm;
pub mod secret;
pub mod usage;
