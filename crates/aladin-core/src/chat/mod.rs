//! Chat request pipeline.

pub mod orchestrator;

pub use orchestrator::ChatOrchestrator;
