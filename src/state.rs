use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::backend::{EpisodeInfo, TeamPage};
use crate::leaderboard::{
    self, ClickTarget, EligibilityCriterion, LeaderboardRow, RowAction, TeamSummary,
};
use crate::record_store::{RecordStore, TeamId, TeamRecord};
use crate::request_tracker::{Completion, RequestTicket, RequestTracker};

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Rankings,
    TeamDetail { team_id: TeamId },
}

#[derive(Debug, Clone)]
pub enum Delta {
    SetEpisode(EpisodeInfo),
    SetTeamPage {
        page: usize,
        page_size: usize,
        team_page: TeamPage,
    },
    TeamPageFailed {
        page: usize,
        error: String,
    },
    SetRecord {
        team_id: TeamId,
        record: TeamRecord,
    },
    RecordFailed {
        team_id: TeamId,
        error: String,
    },
    ScrimmageRequestFinished {
        ticket: RequestTicket,
        result: Result<(), String>,
    },
    Log(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCommand {
    FetchEpisode,
    FetchTeams { page: usize },
    FetchRecord { team_id: TeamId },
    RequestScrimmage { ticket: RequestTicket },
}

pub struct AppState {
    pub screen: Screen,
    pub episode: String,
    pub episode_name: String,
    pub criteria: Vec<EligibilityCriterion>,
    pub teams: Vec<TeamSummary>,
    pub teams_loading: bool,
    pub team_count: usize,
    pub page: usize,
    pub page_size: usize,
    pub selected: usize,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
    pub requests_accepted: usize,
    records: RecordStore,
    tracker: RequestTracker,
    next_session: u64,
    revert_after: Duration,
    outbox: Vec<ProviderCommand>,
}

impl AppState {
    pub fn new(episode: &str, revert_after: Duration) -> Self {
        Self {
            screen: Screen::Rankings,
            episode: episode.to_string(),
            episode_name: String::new(),
            criteria: Vec::new(),
            teams: Vec::with_capacity(16),
            teams_loading: false,
            team_count: 0,
            page: 1,
            page_size: 0,
            selected: 0,
            records: RecordStore::new(),
            logs: VecDeque::with_capacity(MAX_LOGS),
            help_overlay: false,
            requests_accepted: 0,
            tracker: RequestTracker::new(1, revert_after),
            next_session: 2,
            revert_after,
            outbox: Vec::new(),
        }
    }

    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    pub fn tracker(&self) -> &RequestTracker {
        &self.tracker
    }

    /// Commands produced since the last call, in the order they were queued.
    pub fn take_commands(&mut self) -> Vec<ProviderCommand> {
        std::mem::take(&mut self.outbox)
    }

    pub fn start(&mut self) {
        self.outbox.push(ProviderCommand::FetchEpisode);
        self.load_page(self.page);
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn page_count(&self) -> usize {
        if self.page_size == 0 {
            return 1;
        }
        self.team_count.div_ceil(self.page_size).max(1)
    }

    pub fn page_offset(&self) -> usize {
        self.page.saturating_sub(1) * self.page_size
    }

    pub fn rows(&self) -> impl Iterator<Item = LeaderboardRow<'_>> {
        leaderboard::rows(&self.teams, self.page_offset(), &self.records, &self.tracker)
    }

    pub fn team_name(&self, team_id: TeamId) -> String {
        self.teams
            .iter()
            .find(|t| t.id == team_id)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| format!("team #{team_id}"))
    }

    pub fn select_next(&mut self) {
        let total = self.teams.len();
        if total == 0 {
            self.selected = 0;
            return;
        }
        self.selected = (self.selected + 1) % total;
    }

    pub fn select_prev(&mut self) {
        let total = self.teams.len();
        if total == 0 {
            self.selected = 0;
            return;
        }
        if self.selected == 0 {
            self.selected = total - 1;
        } else {
            self.selected -= 1;
        }
    }

    pub fn clamp_selection(&mut self) {
        let total = self.teams.len();
        if total == 0 {
            self.selected = 0;
        } else if self.selected >= total {
            self.selected = total - 1;
        }
    }

    pub fn next_page(&mut self) {
        if self.screen != Screen::Rankings || self.page >= self.page_count() {
            return;
        }
        self.load_page(self.page + 1);
    }

    pub fn prev_page(&mut self) {
        if self.screen != Screen::Rankings || self.page <= 1 {
            return;
        }
        self.load_page(self.page - 1);
    }

    pub fn reload_page(&mut self) {
        self.load_page(self.page);
    }

    fn load_page(&mut self, page: usize) {
        self.page = page.max(1);
        self.teams.clear();
        self.teams_loading = true;
        self.selected = 0;
        self.outbox.push(ProviderCommand::FetchTeams { page: self.page });
    }

    /// Handles a click (or its keyboard equivalent) on row `index` of the current page.
    pub fn activate_row(&mut self, index: usize, target: ClickTarget) {
        if self.screen != Screen::Rankings || self.teams_loading {
            return;
        }
        let Some(action) = self.rows().nth(index).map(|row| row.click(target)) else {
            return;
        };
        self.selected = index;
        match action {
            RowAction::OpenTeam(team_id) => self.open_team(team_id),
            RowAction::RequestScrimmage(team_id) => self.request_scrimmage(team_id),
        }
    }

    pub fn request_scrimmage(&mut self, team_id: TeamId) {
        if self.screen != Screen::Rankings {
            return;
        }
        let Some(ticket) = self.tracker.submit(team_id) else {
            return;
        };
        self.outbox.push(ProviderCommand::RequestScrimmage { ticket });
    }

    /// Leaves the rankings view. Its request session ends here: later
    /// completions for it are dropped and its timers never fire.
    pub fn open_team(&mut self, team_id: TeamId) {
        self.tracker.dispose();
        self.screen = Screen::TeamDetail { team_id };
        self.fetch_record(team_id);
    }

    pub fn back_to_rankings(&mut self) {
        if self.screen == Screen::Rankings {
            return;
        }
        self.screen = Screen::Rankings;
        self.tracker = RequestTracker::new(self.next_session, self.revert_after);
        self.next_session += 1;
    }

    pub fn refresh_detail(&mut self) {
        if let Screen::TeamDetail { team_id } = self.screen {
            self.records.invalidate(team_id);
            self.fetch_record(team_id);
        }
    }

    fn fetch_record(&mut self, team_id: TeamId) {
        if self.records.get(team_id).is_some() && !self.records.is_stale(team_id) {
            return;
        }
        if self.records.begin_fetch(team_id) {
            self.outbox.push(ProviderCommand::FetchRecord { team_id });
        }
    }

    /// Fires due revert timers; called once per frame.
    pub fn tick(&mut self, now: Instant) {
        self.tracker.tick(now);
    }

    fn on_request_succeeded(&mut self, team_id: TeamId) {
        self.requests_accepted += 1;
        let name = self.team_name(team_id);
        self.push_log(format!("[INFO] Scrimmage requested with {name}"));
        self.records.invalidate(team_id);
        if self.records.begin_fetch(team_id) {
            self.outbox.push(ProviderCommand::FetchRecord { team_id });
        }
    }
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    apply_delta_at(state, delta, Instant::now());
}

pub fn apply_delta_at(state: &mut AppState, delta: Delta, now: Instant) {
    match delta {
        Delta::SetEpisode(info) => {
            state.episode_name = info.name_long;
            state.criteria = info.eligibility_criteria;
        }
        Delta::SetTeamPage {
            page,
            page_size,
            team_page,
        } => {
            // Replies for a page the user already paged away from.
            if page != state.page {
                return;
            }
            state.teams = team_page.results;
            state.team_count = team_page.count;
            state.page_size = page_size;
            state.teams_loading = false;
            state.clamp_selection();
        }
        Delta::TeamPageFailed { page, error } => {
            if page == state.page {
                state.teams_loading = false;
                state.teams.clear();
                state.clamp_selection();
            }
            state.push_log(format!("[WARN] Team list fetch error (page {page}): {error}"));
        }
        Delta::SetRecord { team_id, record } => {
            if !record.is_consistent() {
                state.push_log(format!(
                    "[WARN] Record for team {team_id} does not add up across scrimmage types"
                ));
            }
            state.records.replace(team_id, record);
        }
        Delta::RecordFailed { team_id, error } => {
            state.records.mark_failed(team_id);
            state.push_log(format!("[WARN] Record fetch error (team {team_id}): {error}"));
        }
        Delta::ScrimmageRequestFinished { ticket, result } => {
            let success = result.is_ok();
            match state.tracker.on_complete(ticket, success, now) {
                Completion::Succeeded => state.on_request_succeeded(ticket.team_id),
                Completion::Failed => {
                    if let Err(err) = result {
                        let name = state.team_name(ticket.team_id);
                        state.push_log(format!("[INFO] Scrimmage request to {name} not sent: {err}"));
                    }
                }
                Completion::Stale => {}
            }
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}
