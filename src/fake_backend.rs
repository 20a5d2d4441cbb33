use std::collections::HashMap;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use anyhow::{Result, anyhow};
use rand::Rng;

use crate::backend::{EpisodeInfo, ScrimmageBackend, TeamPage};
use crate::leaderboard::{EligibilityCriterion, TeamSummary};
use crate::record_store::{TeamId, TeamRecord, WinLossTie};

const DEMO_PAGE_SIZE: usize = 10;

const SEED_NAMES: &[&str] = &[
    "teh devs",
    "Producing Perfection",
    "Bear Market",
    "Super Cow Powers",
    "4 Musketeers",
    "Om Nom",
    "Blue Dragon",
    "XSquare",
    "Nikola",
    "Java Lava",
    "Malott Fat Cats",
    "Confused",
    "Kryptonite",
    "wololo",
    "monky",
    "Dream Team",
    "Nerd Herd",
    "Pathfinders",
    "Snorlax",
    "Duck Army",
    "Hexagons",
    "Ducks in a Row",
    "Byte Me",
    "Segfault",
    "Fourier Lab",
    "Null Island",
    "Rubber Ducks",
    "Wigglers",
    "Overclocked",
    "Bit Flippers",
    "Anti Gravity",
    "Lighthouse",
    "Rat Race",
    "Moonlight",
    "Pi Squared",
    "The Ferns",
    "Cheese Wheel",
];

/// Offline stand-in for the platform API, used when no token is configured.
///
/// Records always satisfy the All = Unranked + Ranked invariant; accepted
/// requests add an unranked game to the opponent's record.
pub struct DemoBackend {
    teams: Vec<TeamSummary>,
    records: Mutex<HashMap<TeamId, TeamRecord>>,
    latency: Duration,
    reject_rate: f64,
}

impl DemoBackend {
    pub fn new() -> Self {
        Self::with_behavior(Duration::from_millis(900), 0.15)
    }

    pub fn with_behavior(latency: Duration, reject_rate: f64) -> Self {
        let teams = seed_teams();
        let records = teams
            .iter()
            .map(|t| (t.id, seed_record(t.id)))
            .collect::<HashMap<_, _>>();
        Self {
            teams,
            records: Mutex::new(records),
            latency,
            reject_rate: reject_rate.clamp(0.0, 1.0),
        }
    }

    fn simulate_latency(&self) {
        if self.latency.is_zero() {
            return;
        }
        let jitter = rand::thread_rng().gen_range(0..=self.latency.as_millis() as u64 / 2);
        thread::sleep(self.latency + Duration::from_millis(jitter));
    }
}

impl Default for DemoBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrimmageBackend for DemoBackend {
    fn fetch_episode(&self) -> Result<EpisodeInfo> {
        Ok(EpisodeInfo {
            name_long: "Demo Episode".to_string(),
            eligibility_criteria: seed_criteria(),
        })
    }

    fn fetch_team_page(&self, page: usize) -> Result<TeamPage> {
        self.simulate_latency();
        let start = page.saturating_sub(1) * DEMO_PAGE_SIZE;
        let results = self
            .teams
            .iter()
            .skip(start)
            .take(DEMO_PAGE_SIZE)
            .cloned()
            .collect();
        Ok(TeamPage {
            count: self.teams.len(),
            results,
        })
    }

    fn fetch_scrimmage_record(&self, team_id: TeamId) -> Result<TeamRecord> {
        self.simulate_latency();
        let records = self
            .records
            .lock()
            .map_err(|_| anyhow!("demo record lock poisoned"))?;
        records
            .get(&team_id)
            .copied()
            .ok_or_else(|| anyhow!("http 404 Not Found: no team {team_id}"))
    }

    fn request_scrimmage(&self, team_id: TeamId) -> Result<()> {
        self.simulate_latency();
        let mut rng = rand::thread_rng();
        if rng.gen_bool(self.reject_rate) {
            return Err(anyhow!("http 400 Bad Request: scrimmage request rejected"));
        }
        let Some(team) = self.teams.iter().find(|t| t.id == team_id) else {
            return Err(anyhow!("http 404 Not Found: no team {team_id}"));
        };
        if !team.auto_accept_unranked {
            return Ok(());
        }

        let mut records = self
            .records
            .lock()
            .map_err(|_| anyhow!("demo record lock poisoned"))?;
        let record = records.entry(team_id).or_default();
        let bump = |wlt: &mut WinLossTie, outcome: u8| match outcome {
            0 => wlt.wins += 1,
            1 => wlt.losses += 1,
            _ => wlt.ties += 1,
        };
        let outcome = rng.gen_range(0..3u8);
        bump(&mut record.unranked, outcome);
        bump(&mut record.all, outcome);
        Ok(())
    }

    fn page_size(&self) -> usize {
        DEMO_PAGE_SIZE
    }
}

fn seed_criteria() -> Vec<EligibilityCriterion> {
    vec![
        EligibilityCriterion {
            id: 1,
            title: "US".to_string(),
            icon: "🇺".to_string(),
        },
        EligibilityCriterion {
            id: 2,
            title: "Newbie".to_string(),
            icon: "🆕".to_string(),
        },
        EligibilityCriterion {
            id: 3,
            title: "High School".to_string(),
            icon: "🎓".to_string(),
        },
    ]
}

fn seed_teams() -> Vec<TeamSummary> {
    SEED_NAMES
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let id = 100 + idx as TeamId * 7;
            let mut eligible_for = Vec::new();
            if idx % 2 == 0 {
                eligible_for.push(1);
            }
            if idx % 5 == 3 {
                eligible_for.push(2);
            }
            if idx % 7 == 6 {
                eligible_for.push(3);
            }
            TeamSummary {
                id,
                name: (*name).to_string(),
                rating: 2100.0 - idx as f64 * 23.4,
                members: (0..(1 + idx % 4))
                    .map(|m| format!("{}{}", handle_stem(name), m + 1))
                    .collect(),
                quote: if idx % 3 == 0 {
                    String::new()
                } else {
                    format!("rank {} or bust", idx + 1)
                },
                eligible_for,
                auto_accept_unranked: idx % 4 != 1,
            }
        })
        .collect()
}

fn handle_stem(name: &str) -> String {
    name.split_whitespace()
        .next()
        .unwrap_or("player")
        .to_lowercase()
}

fn seed_record(team_id: TeamId) -> TeamRecord {
    let k = team_id;
    let unranked = WinLossTie {
        wins: k % 17,
        losses: k % 11,
        ties: k % 3,
    };
    let ranked = WinLossTie {
        wins: k % 7,
        losses: k % 5,
        ties: k % 2,
    };
    TeamRecord {
        all: WinLossTie {
            wins: unranked.wins + ranked.wins,
            losses: unranked.losses + ranked.losses,
            ties: unranked.ties + ranked.ties,
        },
        unranked,
        ranked,
    }
}
