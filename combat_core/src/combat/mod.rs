//! Combat resolution - turning a hit into damage, aggro and status rolls

mod resolution;
mod result;

pub use resolution::{calculate_hit, commit_hit, resolve_hit, HitRequest};
pub use result::{HitCalculation, HitOutcome};
