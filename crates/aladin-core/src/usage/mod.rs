//! Daily token budget enforcement.
//!
//! - `estimate`: pure pre-flight token estimate for a message
//! - `clock`: injectable local-date source and midnight arithmetic
//! - `governor`: the `UsageGovernor` owning usage state and its reset task

pub mod clock;
pub mod estimate;
pub mod governor;

pub use clock::{Clock, SystemClock};
pub use estimate::estimate_tokens;
pub use governor::UsageGovernor;
