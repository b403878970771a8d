//! Turn entries and the turn scheduler

mod entry;
mod scheduler;

pub use entry::{EntryId, TurnEntry};
pub use scheduler::TurnScheduler;
