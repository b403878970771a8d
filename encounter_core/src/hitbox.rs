//! Hitbox timelines - placed skills ticking delay -> active -> linger
//!
//! Each placed hitbox runs as its own task in the encounter's `JoinSet`. The
//! task only keeps time; every phase change is sent back to the encounter
//! task as a command so resolution stays serialized with everything else.

use crate::encounter::Command;
use combat_core::hit::HitboxTiming;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{self, MissedTickBehavior};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HitboxId(pub u64);

impl fmt::Display for HitboxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hitbox#{}", self.0)
    }
}

/// Phase transitions reported by a timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitboxPhase {
    /// Delay elapsed; the hit lands now
    Active,
    Lingering,
    Expired,
}

pub(crate) fn spawn_timeline(
    tasks: &mut JoinSet<()>,
    id: HitboxId,
    timing: HitboxTiming,
    tick: Duration,
    commands: mpsc::Sender<Command>,
) {
    tasks.spawn(run_timeline(id, timing, tick, commands));
}

async fn run_timeline(
    id: HitboxId,
    timing: HitboxTiming,
    tick: Duration,
    commands: mpsc::Sender<Command>,
) {
    let mut interval = time::interval(tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately
    interval.tick().await;

    let phases = [
        (timing.delay_ticks, HitboxPhase::Active),
        (timing.active_ticks, HitboxPhase::Lingering),
        (timing.linger_ticks, HitboxPhase::Expired),
    ];
    for (ticks, next) in phases {
        for _ in 0..ticks {
            interval.tick().await;
        }
        trace!(target: "encounter::hitbox", hitbox = %id, phase = ?next, "Hitbox phase");
        if commands.send(Command::Hitbox { id, phase: next }).await.is_err() {
            // Encounter is gone
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_timeline_reports_each_phase() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut tasks = JoinSet::new();
        let start = time::Instant::now();
        spawn_timeline(
            &mut tasks,
            HitboxId(3),
            HitboxTiming::new(2, 1, 1),
            Duration::from_millis(50),
            tx,
        );

        let mut seen = Vec::new();
        while let Some(command) = rx.recv().await {
            if let Command::Hitbox { id, phase } = command {
                assert_eq!(id, HitboxId(3));
                seen.push((phase, start.elapsed()));
            }
        }

        assert_eq!(
            seen,
            vec![
                (HitboxPhase::Active, Duration::from_millis(100)),
                (HitboxPhase::Lingering, Duration::from_millis(150)),
                (HitboxPhase::Expired, Duration::from_millis(200)),
            ]
        );
        assert!(tasks.join_next().await.is_some());
    }
}
