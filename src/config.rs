use std::env;
use std::time::Duration;

const DEFAULT_API_URL: &str = "https://api.battlecode.org";
const DEFAULT_EPISODE: &str = "bc24";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Http,
    Demo,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_url: String,
    pub episode: String,
    pub api_token: Option<String>,
    pub backend: BackendKind,
    pub revert_after: Duration,
    pub http_timeout: Duration,
}

impl Settings {
    /// Reads settings from the process environment. Call after dotenv files are loaded.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_url = lookup("SCRIM_API_URL")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_url = api_url.trim_end_matches('/').to_string();
        let episode = lookup("SCRIM_EPISODE")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_EPISODE.to_string());
        let api_token = lookup("SCRIM_API_TOKEN").and_then(non_empty);

        // Without a token the scrimmage endpoints reject us, so default to the demo data.
        let backend = match lookup("SCRIM_BACKEND")
            .map(|v| v.trim().to_lowercase())
            .as_deref()
        {
            Some("http") => BackendKind::Http,
            Some("demo") => BackendKind::Demo,
            _ if api_token.is_some() => BackendKind::Http,
            _ => BackendKind::Demo,
        };

        let revert_ms = lookup("SCRIM_REVERT_MS")
            .and_then(|val| val.trim().parse::<u64>().ok())
            .unwrap_or(3000)
            .max(250);
        let timeout_secs = lookup("SCRIM_HTTP_TIMEOUT_SECS")
            .and_then(|val| val.trim().parse::<u64>().ok())
            .unwrap_or(10)
            .max(1);

        Self {
            api_url,
            episode,
            api_token,
            backend,
            revert_after: Duration::from_millis(revert_ms),
            http_timeout: Duration::from_secs(timeout_secs),
        }
    }
}

fn non_empty(val: String) -> Option<String> {
    let trimmed = val.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
