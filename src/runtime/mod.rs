//! Runtime orchestration: wake-ups, tick scheduling and the view loop.

pub mod schedule;
pub mod viewer;
pub mod wake;

pub use schedule::{TickDecision, TickSchedule};
pub use viewer::{LoopState, ViewerOptions, ViewerRuntime};
pub use wake::{RuntimeWake, WakeEvents};
