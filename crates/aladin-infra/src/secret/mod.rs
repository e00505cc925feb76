//! Secret store implementations.
//!
//! - `env`: Environment variable store (read-only, highest priority)
//! - `keychain`: OS keychain store (service `aladin`)
//! - `chain`: Wires the stores together in priority order

pub mod chain;
pub mod env;
pub mod keychain;

pub use chain::build_secret_chain;
pub use env::EnvSecretStore;
pub use keychain::KeychainSecretStore;
