use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::blocking::RequestBuilder;
use reqwest::header::AUTHORIZATION;
use serde::Serialize;

use crate::backend::{EpisodeInfo, ScrimmageBackend, TeamPage};
use crate::http_client::http_client;
use crate::leaderboard::TeamSummary;
use crate::record_store::{TeamId, TeamRecord};

// Server-side page size of the team list endpoint.
const TEAM_PAGE_SIZE: usize = 10;

#[derive(Debug, Serialize)]
struct ScrimmageRequestBody<'a> {
    requested_to: TeamId,
    is_ranked: bool,
    player_order: &'a str,
    map_names: Vec<String>,
}

pub struct HttpBackend {
    base_url: String,
    episode: String,
    token: Option<String>,
    timeout: Duration,
}

impl HttpBackend {
    pub fn new(base_url: &str, episode: &str, token: Option<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            episode: episode.to_string(),
            token,
            timeout,
        }
    }

    pub fn episode_url(&self) -> String {
        format!("{}/api/episode/e/{}/", self.base_url, self.episode)
    }

    pub fn team_page_url(&self, page: usize) -> String {
        format!(
            "{}/api/team/{}/t/?ordering=-rating&page={}",
            self.base_url,
            self.episode,
            page.max(1)
        )
    }

    pub fn record_url(&self, team_id: TeamId) -> String {
        format!(
            "{}/api/compete/{}/match/scrimmaging_record/?team_id={team_id}",
            self.base_url, self.episode
        )
    }

    pub fn request_url(&self) -> String {
        format!("{}/api/compete/{}/request/", self.base_url, self.episode)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match self.token.as_deref() {
            Some(token) => req.header(AUTHORIZATION, format!("Bearer {token}")),
            None => req,
        }
    }

    fn get_text(&self, url: &str) -> Result<String> {
        let client = http_client(self.timeout)?;
        let resp = self
            .authorize(client.get(url))
            .send()
            .context("request failed")?;
        let status = resp.status();
        let body = resp.text().context("failed reading body")?;
        if !status.is_success() {
            return Err(anyhow!("http {}: {}", status, body));
        }
        Ok(body)
    }
}

impl ScrimmageBackend for HttpBackend {
    fn fetch_episode(&self) -> Result<EpisodeInfo> {
        let body = self.get_text(&self.episode_url())?;
        serde_json::from_str(body.trim()).context("invalid episode json")
    }

    fn fetch_team_page(&self, page: usize) -> Result<TeamPage> {
        let body = self.get_text(&self.team_page_url(page))?;
        parse_team_page_json(&body)
    }

    fn fetch_scrimmage_record(&self, team_id: TeamId) -> Result<TeamRecord> {
        let body = self.get_text(&self.record_url(team_id))?;
        parse_record_json(&body)
    }

    fn request_scrimmage(&self, team_id: TeamId) -> Result<()> {
        let client = http_client(self.timeout)?;
        let body = ScrimmageRequestBody {
            requested_to: team_id,
            is_ranked: false,
            player_order: "?",
            map_names: Vec::new(),
        };
        let resp = self
            .authorize(client.post(self.request_url()))
            .json(&body)
            .send()
            .context("request failed")?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().unwrap_or_default();
            return Err(anyhow!("http {}: {}", status, text));
        }
        Ok(())
    }

    fn page_size(&self) -> usize {
        TEAM_PAGE_SIZE
    }
}

pub fn parse_record_json(raw: &str) -> Result<TeamRecord> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Err(anyhow!("empty scrimmage record"));
    }
    serde_json::from_str(trimmed).context("invalid scrimmage record json")
}

pub fn parse_team_page_json(raw: &str) -> Result<TeamPage> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(TeamPage::default());
    }
    let root: serde_json::Value = serde_json::from_str(trimmed).context("invalid team list json")?;
    let count = root.get("count").and_then(|v| v.as_u64()).unwrap_or(0) as usize;
    let results = root
        .get("results")
        .and_then(|v| v.as_array())
        .map(|items| items.iter().filter_map(parse_team_value).collect())
        .unwrap_or_default();
    Ok(TeamPage { count, results })
}

// The list endpoint nests rating/quote under `profile` and members as objects.
fn parse_team_value(value: &serde_json::Value) -> Option<TeamSummary> {
    let id = value.get("id")?.as_u64()? as TeamId;
    let name = value.get("name")?.as_str()?.to_string();
    let profile = value.get("profile").unwrap_or(&serde_json::Value::Null);
    let rating = profile
        .get("rating")
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0);
    let quote = profile
        .get("quote")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let eligible_for = profile
        .get("eligible_for")
        .and_then(|v| v.as_array())
        .map(|ids| {
            ids.iter()
                .filter_map(|id| id.as_u64().map(|id| id as u32))
                .collect()
        })
        .unwrap_or_default();
    let members = value
        .get("members")
        .and_then(|v| v.as_array())
        .map(|members| {
            members
                .iter()
                .filter_map(|m| m.get("username").and_then(|u| u.as_str()))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let auto_accept_unranked = value
        .get("auto_accept_unranked")
        .or_else(|| profile.get("auto_accept_unranked"))
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    Some(TeamSummary {
        id,
        name,
        rating,
        members,
        quote,
        eligible_for,
        auto_accept_unranked,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_json_defaults_missing_counters() {
        let raw = r#"{"All": {"wins": 4, "losses": 2, "ties": 1}, "Ranked": {"wins": 1}}"#;
        let rec = parse_record_json(raw).unwrap();
        assert_eq!(rec.all.wins, 4);
        assert_eq!(rec.ranked.wins, 1);
        assert_eq!(rec.ranked.losses, 0);
        assert_eq!(rec.unranked.played(), 0);
    }

    #[test]
    fn record_json_rejects_garbage() {
        assert!(parse_record_json("not json").is_err());
        assert!(parse_record_json("null").is_err());
    }

    #[test]
    fn team_page_reads_nested_profile() {
        let raw = r#"{
            "count": 23,
            "results": [
                {
                    "id": 12,
                    "name": "teh devs",
                    "members": [{"username": "alice"}, {"username": "bob"}],
                    "profile": {"rating": 1612.6, "quote": "gg", "eligible_for": [1, 3], "auto_accept_unranked": true}
                },
                {"name": "missing id"}
            ]
        }"#;
        let page = parse_team_page_json(raw).unwrap();
        assert_eq!(page.count, 23);
        assert_eq!(page.results.len(), 1);
        let team = &page.results[0];
        assert_eq!(team.id, 12);
        assert_eq!(team.members, vec!["alice".to_string(), "bob".to_string()]);
        assert_eq!(team.eligible_for, vec![1, 3]);
        assert!(team.auto_accept_unranked);
        assert!((team.rating - 1612.6).abs() < 1e-9);
    }

    #[test]
    fn urls_are_scoped_to_episode() {
        let backend = HttpBackend::new("http://x/", "bc24", None, Duration::from_secs(1));
        assert_eq!(
            backend.team_page_url(0),
            "http://x/api/team/bc24/t/?ordering=-rating&page=1"
        );
        assert_eq!(
            backend.record_url(7),
            "http://x/api/compete/bc24/match/scrimmaging_record/?team_id=7"
        );
        assert_eq!(backend.request_url(), "http://x/api/compete/bc24/request/");
    }
}
