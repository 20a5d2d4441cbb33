use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

pub type TeamId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrimmageType {
    All,
    Unranked,
    Ranked,
}

impl ScrimmageType {
    pub const ALL: [ScrimmageType; 3] = [
        ScrimmageType::All,
        ScrimmageType::Unranked,
        ScrimmageType::Ranked,
    ];
}

pub fn scrimmage_type_label(kind: ScrimmageType) -> &'static str {
    match kind {
        ScrimmageType::All => "All Scrimmages",
        ScrimmageType::Unranked => "Unranked",
        ScrimmageType::Ranked => "Ranked",
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinLossTie {
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    #[serde(default)]
    pub ties: u32,
}

impl WinLossTie {
    pub fn played(&self) -> u32 {
        self.wins.saturating_add(self.losses).saturating_add(self.ties)
    }
}

/// Scrimmage counters of one team, split by scrimmage type.
///
/// `all` is expected to be the sum of `unranked` and `ranked`; the backend
/// maintains that, the client only checks it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRecord {
    #[serde(rename = "All", default)]
    pub all: WinLossTie,
    #[serde(rename = "Unranked", default)]
    pub unranked: WinLossTie,
    #[serde(rename = "Ranked", default)]
    pub ranked: WinLossTie,
}

impl TeamRecord {
    pub fn bucket(&self, kind: ScrimmageType) -> &WinLossTie {
        match kind {
            ScrimmageType::All => &self.all,
            ScrimmageType::Unranked => &self.unranked,
            ScrimmageType::Ranked => &self.ranked,
        }
    }

    /// Counters come from the backend; a bucket sum that overflows counts as inconsistent.
    pub fn is_consistent(&self) -> bool {
        let sums_to =
            |all: u32, unranked: u32, ranked: u32| unranked.checked_add(ranked) == Some(all);
        sums_to(self.all.wins, self.unranked.wins, self.ranked.wins)
            && sums_to(self.all.losses, self.unranked.losses, self.ranked.losses)
            && sums_to(self.all.ties, self.unranked.ties, self.ranked.ties)
    }
}

#[derive(Debug, Clone)]
struct StoredRecord {
    record: TeamRecord,
    fetched_at: DateTime<Local>,
    stale: bool,
}

/// Read side of the scrimmage records shown by the leaderboard and team views.
///
/// A missing entry means "not loaded yet" (or the last fetch failed), which is
/// not the same as a record with zero games.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: HashMap<TeamId, StoredRecord>,
    loading: HashSet<TeamId>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, team_id: TeamId) -> Option<&TeamRecord> {
        self.records.get(&team_id).map(|stored| &stored.record)
    }

    pub fn fetched_at(&self, team_id: TeamId) -> Option<DateTime<Local>> {
        self.records.get(&team_id).map(|stored| stored.fetched_at)
    }

    pub fn is_stale(&self, team_id: TeamId) -> bool {
        self.records.get(&team_id).is_some_and(|stored| stored.stale)
    }

    pub fn is_loading(&self, team_id: TeamId) -> bool {
        self.loading.contains(&team_id)
    }

    /// Marks a fetch as outstanding. Returns false when one already is, so
    /// callers can skip sending a duplicate fetch.
    pub fn begin_fetch(&mut self, team_id: TeamId) -> bool {
        self.loading.insert(team_id)
    }

    pub fn replace(&mut self, team_id: TeamId, record: TeamRecord) {
        self.loading.remove(&team_id);
        self.records.insert(
            team_id,
            StoredRecord {
                record,
                fetched_at: Local::now(),
                stale: false,
            },
        );
    }

    pub fn mark_failed(&mut self, team_id: TeamId) {
        self.loading.remove(&team_id);
        self.records.remove(&team_id);
    }

    /// Flags the record for refetch; the old counters stay visible meanwhile.
    pub fn invalidate(&mut self, team_id: TeamId) {
        if let Some(stored) = self.records.get_mut(&team_id) {
            stored.stale = true;
        }
    }
}
