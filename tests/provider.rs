use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;

use scrim_board::backend::{run_command, spawn_provider};
use scrim_board::fake_backend::DemoBackend;
use scrim_board::request_tracker::RequestTicket;
use scrim_board::state::{Delta, ProviderCommand};

#[test]
fn every_scrimmage_request_gets_exactly_one_completion() {
    let backend = Arc::new(DemoBackend::with_behavior(Duration::ZERO, 0.5));
    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    spawn_provider(backend, tx, cmd_rx);

    let tickets: Vec<RequestTicket> = (0..6)
        .map(|i| RequestTicket {
            session: 1,
            team_id: 100 + i * 7,
            epoch: 1,
        })
        .collect();
    for ticket in &tickets {
        cmd_tx
            .send(ProviderCommand::RequestScrimmage { ticket: *ticket })
            .unwrap();
    }

    let mut seen = Vec::new();
    for _ in 0..tickets.len() {
        match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            Delta::ScrimmageRequestFinished { ticket, .. } => seen.push(ticket),
            other => panic!("unexpected delta {other:?}"),
        }
    }
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());

    seen.sort_by_key(|t| t.team_id);
    assert_eq!(seen, tickets);
}

#[test]
fn record_fetch_failure_becomes_record_failed() {
    let backend = DemoBackend::with_behavior(Duration::ZERO, 0.0);
    match run_command(&backend, ProviderCommand::FetchRecord { team_id: 1 }) {
        Delta::RecordFailed { team_id, error } => {
            assert_eq!(team_id, 1);
            assert!(error.contains("404"));
        }
        other => panic!("unexpected delta {other:?}"),
    }
}

#[test]
fn team_page_reply_carries_page_and_size() {
    let backend = DemoBackend::with_behavior(Duration::ZERO, 0.0);
    match run_command(&backend, ProviderCommand::FetchTeams { page: 2 }) {
        Delta::SetTeamPage {
            page,
            page_size,
            team_page,
        } => {
            assert_eq!(page, 2);
            assert_eq!(page_size, 10);
            assert_eq!(team_page.results.len(), 10);
        }
        other => panic!("unexpected delta {other:?}"),
    }
}
