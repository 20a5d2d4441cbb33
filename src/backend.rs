use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::leaderboard::{EligibilityCriterion, TeamSummary};
use crate::record_store::{TeamId, TeamRecord};
use crate::state::{Delta, ProviderCommand};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpisodeInfo {
    #[serde(default)]
    pub name_long: String,
    #[serde(default)]
    pub eligibility_criteria: Vec<EligibilityCriterion>,
}

/// One page of the rating-ordered team list, as the server paginates it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamPage {
    pub count: usize,
    #[serde(default)]
    pub results: Vec<TeamSummary>,
}

/// Remote side of the rankings view. Implementations are bound to one episode.
pub trait ScrimmageBackend: Send + Sync {
    fn fetch_episode(&self) -> Result<EpisodeInfo>;

    /// `page` is 1-based.
    fn fetch_team_page(&self, page: usize) -> Result<TeamPage>;

    fn fetch_scrimmage_record(&self, team_id: TeamId) -> Result<TeamRecord>;

    fn request_scrimmage(&self, team_id: TeamId) -> Result<()>;

    fn page_size(&self) -> usize;
}

/// Runs provider commands off the UI thread and reports back through `tx`.
///
/// Each command gets its own thread, so a slow request never holds back the
/// completion of another team's. Every command produces at least one delta.
pub fn spawn_provider(
    backend: Arc<dyn ScrimmageBackend>,
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
) {
    thread::spawn(move || {
        while let Ok(cmd) = cmd_rx.recv() {
            let backend = Arc::clone(&backend);
            let tx = tx.clone();
            thread::spawn(move || {
                let delta = run_command(backend.as_ref(), cmd);
                let _ = tx.send(delta);
            });
        }
    });
}

pub fn run_command(backend: &dyn ScrimmageBackend, cmd: ProviderCommand) -> Delta {
    match cmd {
        ProviderCommand::FetchEpisode => match backend.fetch_episode() {
            Ok(info) => Delta::SetEpisode(info),
            Err(err) => Delta::Log(format!("[WARN] Episode fetch error: {err:#}")),
        },
        ProviderCommand::FetchTeams { page } => match backend.fetch_team_page(page) {
            Ok(team_page) => Delta::SetTeamPage {
                page,
                page_size: backend.page_size(),
                team_page,
            },
            Err(err) => Delta::TeamPageFailed {
                page,
                error: format!("{err:#}"),
            },
        },
        ProviderCommand::FetchRecord { team_id } => match backend.fetch_scrimmage_record(team_id) {
            Ok(record) => Delta::SetRecord { team_id, record },
            Err(err) => Delta::RecordFailed {
                team_id,
                error: format!("{err:#}"),
            },
        },
        ProviderCommand::RequestScrimmage { ticket } => {
            let result = backend
                .request_scrimmage(ticket.team_id)
                .map_err(|err| format!("{err:#}"));
            Delta::ScrimmageRequestFinished { ticket, result }
        }
    }
}
