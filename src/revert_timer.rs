use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::record_store::TeamId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ArmedRevert {
    epoch: u64,
    deadline: Instant,
}

/// One-shot "flip the success mark back" timers, at most one per team.
///
/// Timers are polled, not threaded: the UI loop calls [`RevertTimers::take_due`]
/// with the current time and applies whatever fired.
#[derive(Debug, Clone, Default)]
pub struct RevertTimers {
    armed: HashMap<TeamId, ArmedRevert>,
}

impl RevertTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms (or re-arms) the timer for `team_id`. The epoch is handed back when
    /// the timer fires so the tracker can tell whether it is still current.
    pub fn schedule_revert(&mut self, team_id: TeamId, epoch: u64, now: Instant, delay: Duration) {
        self.armed.insert(
            team_id,
            ArmedRevert {
                epoch,
                deadline: now + delay,
            },
        );
    }

    pub fn cancel(&mut self, team_id: TeamId) -> bool {
        self.armed.remove(&team_id).is_some()
    }

    pub fn cancel_all(&mut self) {
        self.armed.clear();
    }

    pub fn deadline(&self, team_id: TeamId) -> Option<Instant> {
        self.armed.get(&team_id).map(|t| t.deadline)
    }

    /// Removes and returns every `(team, epoch)` whose deadline is at or before `now`.
    pub fn take_due(&mut self, now: Instant) -> Vec<(TeamId, u64)> {
        let mut due: Vec<(TeamId, u64)> = self
            .armed
            .iter()
            .filter(|(_, t)| t.deadline <= now)
            .map(|(team_id, t)| (*team_id, t.epoch))
            .collect();
        for (team_id, _) in &due {
            self.armed.remove(team_id);
        }
        due.sort_unstable();
        due
    }
}
