//! Infrastructure implementations for Aladin.
//!
//! HTTP providers and the provider factory, the credential validator,
//! OS-keychain and environment secret stores, and the config/usage files
//! in the data directory.

pub mod config;
pub mod llm;
pub mod secret;
pub mod usage_store;
pub mod validation;
