use std::rc::Rc;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use serde::{Deserialize, Serialize};

use crate::record_store::{RecordStore, TeamId, TeamRecord};
use crate::request_tracker::{RequestState, RequestTracker};

pub const REQUEST_LABEL: &str = "Request";
pub const SPINNER_GLYPH: &str = "⟳";
pub const CHECK_GLYPH: &str = "✓";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSummary {
    pub id: TeamId,
    pub name: String,
    pub rating: f64,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub quote: String,
    #[serde(default)]
    pub eligible_for: Vec<u32>,
    #[serde(default)]
    pub auto_accept_unranked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityCriterion {
    pub id: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonLabel {
    Request,
    Spinner,
    Check,
}

impl ButtonLabel {
    pub fn for_state(state: RequestState) -> Self {
        match state {
            RequestState::Pending => ButtonLabel::Spinner,
            RequestState::Succeeded => ButtonLabel::Check,
            RequestState::Idle => ButtonLabel::Request,
        }
    }

    pub fn text(self) -> &'static str {
        match self {
            ButtonLabel::Request => REQUEST_LABEL,
            ButtonLabel::Spinner => SPINNER_GLYPH,
            ButtonLabel::Check => CHECK_GLYPH,
        }
    }
}

/// Where on a row a click landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    Row,
    ActionButton,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    OpenTeam(TeamId),
    RequestScrimmage(TeamId),
}

#[derive(Debug, Clone)]
pub struct LeaderboardRow<'a> {
    pub team: &'a TeamSummary,
    pub rank: usize,
    pub record: Option<&'a TeamRecord>,
    pub request_state: RequestState,
}

impl LeaderboardRow<'_> {
    pub fn button(&self) -> ButtonLabel {
        ButtonLabel::for_state(self.request_state)
    }

    pub fn rating_display(&self) -> String {
        format!("{}", self.team.rating.round() as i64)
    }

    pub fn members_display(&self) -> String {
        self.team.members.join(", ")
    }

    pub fn auto_accept_display(&self) -> &'static str {
        if self.team.auto_accept_unranked { "Yes" } else { "No" }
    }

    pub fn eligibility_display(&self, criteria: &[EligibilityCriterion]) -> String {
        criteria
            .iter()
            .filter(|c| self.team.eligible_for.contains(&c.id))
            .map(|c| c.icon.as_str())
            .collect()
    }

    /// A click on the action button only requests; it never also opens the team.
    pub fn click(&self, target: ClickTarget) -> RowAction {
        match target {
            ClickTarget::ActionButton => RowAction::RequestScrimmage(self.team.id),
            ClickTarget::Row => RowAction::OpenTeam(self.team.id),
        }
    }
}

/// Projects the already rating-ordered `teams` into display rows.
///
/// Order is taken as given. `page_offset` is the number of teams on earlier pages.
pub fn rows<'a>(
    teams: &'a [TeamSummary],
    page_offset: usize,
    records: &'a RecordStore,
    tracker: &'a RequestTracker,
) -> impl Iterator<Item = LeaderboardRow<'a>> + 'a {
    teams.iter().enumerate().map(move |(idx, team)| LeaderboardRow {
        team,
        rank: page_offset + idx + 1,
        record: records.get(team.id),
        request_state: tracker.state(team.id),
    })
}

/// Column layout of a leaderboard row, shared by the renderer and mouse hit-testing.
pub const COLUMN_WIDTHS: [u16; 8] = [5, 7, 22, 26, 24, 8, 7, 9];

pub const COLUMN_TITLES: [&str; 8] = [
    "#",
    "Rating",
    "Team",
    "Members",
    "Quote",
    "Elig.",
    "Auto",
    "",
];

/// Splits a one-line row area into its columns, exactly as they are drawn.
///
/// On narrow terminals the columns shrink, so positions differ from the
/// nominal `COLUMN_WIDTHS` offsets.
pub fn row_columns(row: Rect) -> Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(COLUMN_WIDTHS.map(Constraint::Length))
        .split(row)
}

/// Maps a click at terminal column `x` on the row occupying `row` to the clicked element.
pub fn hit_test(row: Rect, x: u16) -> ClickTarget {
    let cols = row_columns(row);
    let Some(button) = cols.last() else {
        return ClickTarget::Row;
    };
    if x >= button.x && x < button.x.saturating_add(button.width) {
        ClickTarget::ActionButton
    } else {
        ClickTarget::Row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_test_only_claims_button_column() {
        let full: u16 = COLUMN_WIDTHS.iter().sum();
        let start: u16 = COLUMN_WIDTHS[..7].iter().sum();
        let row = Rect::new(0, 0, full, 1);
        assert_eq!(hit_test(row, 0), ClickTarget::Row);
        assert_eq!(hit_test(row, start - 1), ClickTarget::Row);
        assert_eq!(hit_test(row, start), ClickTarget::ActionButton);
        assert_eq!(hit_test(row, full - 1), ClickTarget::ActionButton);
        assert_eq!(hit_test(row, full), ClickTarget::Row);
    }

    #[test]
    fn hit_test_follows_row_origin() {
        let full: u16 = COLUMN_WIDTHS.iter().sum();
        let start: u16 = COLUMN_WIDTHS[..7].iter().sum();
        let row = Rect::new(4, 10, full, 1);
        assert_eq!(hit_test(row, start), ClickTarget::Row);
        assert_eq!(hit_test(row, start + 4), ClickTarget::ActionButton);
    }

    #[test]
    fn labels_follow_request_state() {
        assert_eq!(ButtonLabel::for_state(RequestState::Idle).text(), "Request");
        assert_eq!(ButtonLabel::for_state(RequestState::Pending).text(), SPINNER_GLYPH);
        assert_eq!(ButtonLabel::for_state(RequestState::Succeeded).text(), CHECK_GLYPH);
    }
}
