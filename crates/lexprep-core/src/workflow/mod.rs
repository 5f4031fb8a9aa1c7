//! Request-level orchestration.
//!
//! The operations an outer surface (CLI, HTTP layer) calls: serving drills
//! and grading answers. Each workflow composes the selector, ability
//! tracker, storage, and inventory triggers; the triggers are always
//! fire-and-forget.

pub mod answer;
pub mod drill;

pub use answer::AnswerService;
pub use drill::DrillService;
