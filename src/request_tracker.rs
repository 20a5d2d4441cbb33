use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::record_store::TeamId;
use crate::revert_timer::RevertTimers;

/// Button state of one team.
///
/// There is no failed state: a rejected request is reported as
/// [`Completion::Failed`] and the team goes straight back to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestState {
    #[default]
    Idle,
    Pending,
    Succeeded,
}

/// Handle for one in-flight scrimmage request.
///
/// Issued by [`RequestTracker::submit`] and handed back with the completion.
/// `session` ties it to the tracker that issued it, `epoch` to the submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTicket {
    pub session: u64,
    pub team_id: TeamId,
    pub epoch: u64,
}

/// What a completion did to the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Team moved to `Succeeded` and its revert timer is armed.
    Succeeded,
    /// Request was rejected; team is back to `Idle`.
    Failed,
    /// Ticket was superseded, or the tracker was disposed. Nothing changed.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TeamEntry {
    epoch: u64,
    state: RequestState,
}

/// Per-team scrimmage request state for one rankings view session.
///
/// Every transition goes through `submit`, `on_complete`, `on_revert`/`tick`
/// and `dispose`; the map is never touched from outside.
#[derive(Debug, Clone)]
pub struct RequestTracker {
    session: u64,
    revert_after: Duration,
    entries: HashMap<TeamId, TeamEntry>,
    timers: RevertTimers,
    disposed: bool,
}

impl RequestTracker {
    pub fn new(session: u64, revert_after: Duration) -> Self {
        Self {
            session,
            revert_after,
            entries: HashMap::with_capacity(16),
            timers: RevertTimers::new(),
            disposed: false,
        }
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn state(&self, team_id: TeamId) -> RequestState {
        self.entries
            .get(&team_id)
            .map(|entry| entry.state)
            .unwrap_or_default()
    }

    pub fn epoch(&self, team_id: TeamId) -> u64 {
        self.entries.get(&team_id).map(|entry| entry.epoch).unwrap_or(0)
    }

    pub fn pending_count(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| entry.state == RequestState::Pending)
            .count()
    }

    pub fn revert_deadline(&self, team_id: TeamId) -> Option<Instant> {
        self.timers.deadline(team_id)
    }

    /// Moves the team to `Pending` and returns the ticket to send along with
    /// the request. `None` when a request for the team is already in flight
    /// or the session is gone.
    pub fn submit(&mut self, team_id: TeamId) -> Option<RequestTicket> {
        if self.disposed {
            return None;
        }
        let entry = self.entries.entry(team_id).or_insert(TeamEntry {
            epoch: 0,
            state: RequestState::Idle,
        });
        if entry.state == RequestState::Pending {
            return None;
        }
        entry.epoch += 1;
        entry.state = RequestState::Pending;
        // A success mark from an earlier request must not flip this one back.
        self.timers.cancel(team_id);
        Some(RequestTicket {
            session: self.session,
            team_id,
            epoch: entry.epoch,
        })
    }

    pub fn on_complete(&mut self, ticket: RequestTicket, success: bool, now: Instant) -> Completion {
        if self.disposed || ticket.session != self.session {
            return Completion::Stale;
        }
        let Some(entry) = self.entries.get_mut(&ticket.team_id) else {
            return Completion::Stale;
        };
        if entry.epoch != ticket.epoch || entry.state != RequestState::Pending {
            return Completion::Stale;
        }

        if success {
            entry.state = RequestState::Succeeded;
            self.timers
                .schedule_revert(ticket.team_id, ticket.epoch, now, self.revert_after);
            Completion::Succeeded
        } else {
            entry.state = RequestState::Idle;
            Completion::Failed
        }
    }

    /// Applies a fired revert timer. Returns whether the team went back to `Idle`.
    pub fn on_revert(&mut self, team_id: TeamId, epoch: u64) -> bool {
        let Some(entry) = self.entries.get_mut(&team_id) else {
            return false;
        };
        if entry.epoch != epoch || entry.state != RequestState::Succeeded {
            return false;
        }
        entry.state = RequestState::Idle;
        true
    }

    /// Fires every due revert timer and returns the teams that were reset.
    pub fn tick(&mut self, now: Instant) -> Vec<TeamId> {
        if self.disposed {
            return Vec::new();
        }
        self.timers
            .take_due(now)
            .into_iter()
            .filter(|(team_id, epoch)| self.on_revert(*team_id, *epoch))
            .map(|(team_id, _)| team_id)
            .collect()
    }

    pub fn dispose(&mut self) {
        self.entries.clear();
        self.timers.cancel_all();
        self.disposed = true;
    }
}
