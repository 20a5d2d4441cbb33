use std::time::{Duration, Instant};

use scrim_board::backend::{EpisodeInfo, TeamPage};
use scrim_board::leaderboard::{ClickTarget, TeamSummary};
use scrim_board::record_store::{TeamRecord, WinLossTie};
use scrim_board::request_tracker::{RequestState, RequestTicket};
use scrim_board::state::{AppState, Delta, ProviderCommand, Screen, apply_delta_at};

const T: Duration = Duration::from_secs(3);

fn team(id: u32, name: &str) -> TeamSummary {
    TeamSummary {
        id,
        name: name.to_string(),
        rating: 1000.0 - id as f64,
        members: Vec::new(),
        quote: String::new(),
        eligible_for: Vec::new(),
        auto_accept_unranked: true,
    }
}

fn loaded_state(now: Instant) -> AppState {
    let mut state = AppState::new("bc24", T);
    state.start();
    let cmds = state.take_commands();
    assert_eq!(
        cmds,
        vec![ProviderCommand::FetchEpisode, ProviderCommand::FetchTeams { page: 1 }]
    );
    apply_delta_at(
        &mut state,
        Delta::SetTeamPage {
            page: 1,
            page_size: 2,
            team_page: TeamPage {
                count: 5,
                results: vec![team(7, "seven"), team(8, "eight")],
            },
        },
        now,
    );
    state
}

fn request_ticket(state: &mut AppState, index: usize) -> RequestTicket {
    state.activate_row(index, ClickTarget::ActionButton);
    match state.take_commands().as_slice() {
        [ProviderCommand::RequestScrimmage { ticket }] => *ticket,
        other => panic!("expected one scrimmage request, got {other:?}"),
    }
}

#[test]
fn team_page_sets_rows_and_page_count() {
    let state = loaded_state(Instant::now());
    assert!(!state.teams_loading);
    assert_eq!(state.page_count(), 3);
    assert_eq!(state.rows().count(), 2);
}

#[test]
fn request_success_notifies_and_refetches_record() {
    let t0 = Instant::now();
    let mut state = loaded_state(t0);
    let ticket = request_ticket(&mut state, 0);
    assert_eq!(ticket.team_id, 7);
    assert_eq!(state.tracker().state(7), RequestState::Pending);
    assert_eq!(state.screen, Screen::Rankings);

    apply_delta_at(
        &mut state,
        Delta::ScrimmageRequestFinished {
            ticket,
            result: Ok(()),
        },
        t0,
    );
    assert_eq!(state.tracker().state(7), RequestState::Succeeded);
    assert_eq!(state.requests_accepted, 1);
    assert_eq!(
        state.take_commands(),
        vec![ProviderCommand::FetchRecord { team_id: 7 }]
    );
    assert!(state.logs.back().is_some_and(|l| l.contains("seven")));

    state.tick(t0 + T);
    assert_eq!(state.tracker().state(7), RequestState::Idle);
}

#[test]
fn request_failure_resets_button_quietly() {
    let t0 = Instant::now();
    let mut state = loaded_state(t0);
    let ticket = request_ticket(&mut state, 1);
    apply_delta_at(
        &mut state,
        Delta::ScrimmageRequestFinished {
            ticket,
            result: Err("http 400".to_string()),
        },
        t0,
    );
    assert_eq!(state.tracker().state(8), RequestState::Idle);
    assert_eq!(state.requests_accepted, 0);
    assert!(state.take_commands().is_empty());
}

#[test]
fn double_request_sends_one_command() {
    let mut state = loaded_state(Instant::now());
    let _ = request_ticket(&mut state, 0);
    state.activate_row(0, ClickTarget::ActionButton);
    assert!(state.take_commands().is_empty());
}

#[test]
fn opening_team_discards_request_session() {
    let t0 = Instant::now();
    let mut state = loaded_state(t0);
    let ticket = request_ticket(&mut state, 0);

    state.activate_row(1, ClickTarget::Row);
    assert_eq!(state.screen, Screen::TeamDetail { team_id: 8 });
    assert_eq!(
        state.take_commands(),
        vec![ProviderCommand::FetchRecord { team_id: 8 }]
    );
    assert!(state.records().is_loading(8));

    state.back_to_rankings();
    assert_eq!(state.tracker().state(7), RequestState::Idle);

    // Completion of the request made before navigating away is ignored.
    apply_delta_at(
        &mut state,
        Delta::ScrimmageRequestFinished {
            ticket,
            result: Ok(()),
        },
        t0,
    );
    assert_eq!(state.tracker().state(7), RequestState::Idle);
    assert_eq!(state.requests_accepted, 0);
}

#[test]
fn record_failure_leaves_team_absent() {
    let mut state = loaded_state(Instant::now());
    state.activate_row(0, ClickTarget::Row);
    let _ = state.take_commands();

    apply_delta_at(
        &mut state,
        Delta::RecordFailed {
            team_id: 7,
            error: "timeout".to_string(),
        },
        Instant::now(),
    );
    assert!(state.records().get(7).is_none());
    assert!(!state.records().is_loading(7));
}

#[test]
fn inconsistent_record_is_kept_and_logged() {
    let mut state = loaded_state(Instant::now());
    let record = TeamRecord {
        all: WinLossTie {
            wins: 9,
            losses: 0,
            ties: 0,
        },
        unranked: WinLossTie::default(),
        ranked: WinLossTie::default(),
    };
    apply_delta_at(&mut state, Delta::SetRecord { team_id: 8, record }, Instant::now());
    assert_eq!(state.records().get(8).map(|r| r.all.wins), Some(9));
    assert!(state.logs.back().is_some_and(|l| l.starts_with("[WARN]")));
}

#[test]
fn overflowing_record_is_logged_not_fatal() {
    let mut state = loaded_state(Instant::now());
    let record = TeamRecord {
        all: WinLossTie::default(),
        unranked: WinLossTie {
            wins: u32::MAX,
            losses: 0,
            ties: 0,
        },
        ranked: WinLossTie {
            wins: 1,
            losses: 0,
            ties: 0,
        },
    };
    apply_delta_at(&mut state, Delta::SetRecord { team_id: 7, record }, Instant::now());
    assert!(state.records().get(7).is_some());
    assert!(state.logs.back().is_some_and(|l| l.starts_with("[WARN]")));
}

#[test]
fn stale_page_reply_is_ignored() {
    let mut state = loaded_state(Instant::now());
    state.next_page();
    assert_eq!(state.page, 2);
    assert_eq!(
        state.take_commands(),
        vec![ProviderCommand::FetchTeams { page: 2 }]
    );
    assert!(state.teams_loading);

    apply_delta_at(
        &mut state,
        Delta::SetTeamPage {
            page: 1,
            page_size: 2,
            team_page: TeamPage {
                count: 5,
                results: vec![team(7, "seven")],
            },
        },
        Instant::now(),
    );
    assert!(state.teams_loading);
    assert!(state.teams.is_empty());
}

#[test]
fn paging_is_clamped() {
    let mut state = loaded_state(Instant::now());
    state.prev_page();
    assert!(state.take_commands().is_empty());

    state.page = 3;
    state.next_page();
    assert!(state.take_commands().is_empty());
}

#[test]
fn episode_sets_criteria() {
    let mut state = AppState::new("bc24", T);
    apply_delta_at(
        &mut state,
        Delta::SetEpisode(EpisodeInfo {
            name_long: "Battlecode 2024".to_string(),
            eligibility_criteria: Vec::new(),
        }),
        Instant::now(),
    );
    assert_eq!(state.episode_name, "Battlecode 2024");
}

#[test]
fn selection_wraps_within_page() {
    let mut state = loaded_state(Instant::now());
    state.select_prev();
    assert_eq!(state.selected, 1);
    state.select_next();
    assert_eq!(state.selected, 0);

    state.next_page();
    assert_eq!(state.take_commands(), vec![ProviderCommand::FetchTeams { page: 2 }]);
    assert_eq!(state.selected, 0);
    state.select_next();
    assert_eq!(state.selected, 0);
}
