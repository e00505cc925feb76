//! Shared domain types for Aladin.
//!
//! Provider families and configuration, chat results, the error taxonomy,
//! daily usage state, and validation verdicts.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod config;
pub mod error;
pub mod llm;
pub mod secret;
pub mod usage;
pub mod validation;
