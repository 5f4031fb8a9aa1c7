/// Core library for the Lexprep adaptive LSAT practice backend.
///
/// This crate contains all business logic: the domain model, ability
/// tracking, adaptive drill selection, the three-stage LLM generation
/// pipeline, the background generation scheduler, the SQLite storage
/// layer, and configuration management. Outer surfaces (the CLI binary,
/// an HTTP layer) compose the services exposed here.
pub mod ability;
pub mod catalog;
pub mod config;
pub mod error;
pub mod generation;
pub mod llm;
pub mod model;
pub mod scheduler;
pub mod selector;
pub mod startup;
pub mod storage;
pub mod workflow;

pub use error::*;

/// Returns the version of the lexprep-core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
