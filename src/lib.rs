pub mod api;
pub mod backend;
pub mod config;
pub mod fake_backend;
pub mod http_client;
pub mod leaderboard;
pub mod record_store;
pub mod request_tracker;
pub mod revert_timer;
pub mod state;
