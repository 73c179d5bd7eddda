use crate::{
    entry::RaceEntry,
    results::RaceResult,
    types::{DriverId, RaceId, UserId},
};

/// Points for an exact-position main podium pick, P1 through P3.
pub const MAIN_POS_PTS: [i32; 3] = [12, 10, 7];
/// Points for an exact-position sprint podium pick, P1 through P3.
pub const SPRINT_POS_PTS: [i32; 3] = [8, 6, 4];
/// Bonus for a wildcard pick landing anywhere on the main podium.
pub const MAIN_WILDCARD_BONUS: i32 = 5;
/// Bonus for the sprint wildcard landing anywhere on the sprint podium.
pub const SPRINT_WILDCARD_BONUS: i32 = 2;
/// Flat penalty for an entry with no main picks.
pub const MAIN_NO_SHOW_PENALTY: i32 = -3;
/// Flat penalty for missing sprint picks on a sprint weekend.
pub const SPRINT_NO_SHOW_PENALTY: i32 = -3;
/// Penalty added once for a past-deadline entry.
pub const LATE_PENALTY: i32 = -3;
/// A main or championship subtotal landing exactly here is settled as
/// [`ROUND_SCORE_VALUE`] and grants one wildcard token.
pub const ROUND_SCORE_TRIGGER: i32 = 29;
/// Settled value of a subtotal caught by [`ROUND_SCORE_TRIGGER`].
pub const ROUND_SCORE_VALUE: i32 = 30;

/// Why a scoring run refused to start. Raised before anything is computed,
/// so a failed run never leaves partial state behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreError {
    /// No official result saved for the race.
    ResultMissing(RaceId),
    /// The main race was cancelled; the weekend is excluded from scoring.
    MainCancelled(RaceId),
    /// The official podium is not fully recorded yet.
    PodiumIncomplete(RaceId),
    /// One or more of the six championship slots is not recorded yet.
    ChampionshipIncomplete,
}

impl std::fmt::Display for ScoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ResultMissing(id) => write!(f, "no official result for race {id}"),
            Self::MainCancelled(id) => write!(f, "race {id} is cancelled"),
            Self::PodiumIncomplete(id) => write!(f, "podium for race {id} is incomplete"),
            Self::ChampionshipIncomplete => write!(f, "championship result is incomplete"),
        }
    }
}

impl std::error::Error for ScoreError {}

/// Settled outcome for one entry: point totals plus any wildcard tokens the
/// round-score rule granted. The caller applies the grant; scoring itself
/// writes nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntryScore {
    /// Main-race points after penalties, round-up, and doubling.
    pub main_pts: i32,
    /// Sprint points after penalties and doubling.
    pub sprint_pts: i32,
    /// Wildcard tokens granted alongside the points.
    pub wildcards_granted: u8,
}

/// Scores every entry against one race's official result.
///
/// Fails fast when the weekend is not scorable: a cancelled main race or a
/// podium that is not fully recorded. Output order follows `entries`.
pub fn score_race(
    result: &RaceResult,
    entries: &[RaceEntry],
) -> Result<Vec<(UserId, EntryScore)>, ScoreError> {
    if result.cancelled_main {
        return Err(ScoreError::MainCancelled(result.race_id));
    }
    let podium = result
        .podium
        .as_ref()
        .ok_or(ScoreError::PodiumIncomplete(result.race_id))?;

    Ok(entries
        .iter()
        .map(|entry| (entry.user_id, score_entry(result, podium, entry)))
        .collect())
}

fn score_entry(result: &RaceResult, podium: &[DriverId; 3], entry: &RaceEntry) -> EntryScore {
    let mut wildcards_granted = 0u8;

    let mut main_pts = match &entry.main_picks {
        None => MAIN_NO_SHOW_PENALTY,
        Some(picks) => {
            let mut pts = position_points(picks, podium, &MAIN_POS_PTS);
            for wildcard in [&entry.wildcard, &entry.wildcard2].into_iter().flatten() {
                if podium.contains(wildcard) {
                    pts += MAIN_WILDCARD_BONUS;
                }
            }
            if entry.is_late {
                pts += LATE_PENALTY;
            }
            pts
        }
    };

    if main_pts == ROUND_SCORE_TRIGGER {
        main_pts = ROUND_SCORE_VALUE;
        wildcards_granted += 1;
    }

    let mut sprint_pts = match &result.sprint_podium {
        Some(sprint_podium) if result.sprint_scorable() => match &entry.sprint_picks {
            None => SPRINT_NO_SHOW_PENALTY,
            Some(picks) => {
                let mut pts = position_points(picks, sprint_podium, &SPRINT_POS_PTS);
                if let Some(wildcard) = &entry.sprint_wildcard {
                    if sprint_podium.contains(wildcard) {
                        pts += SPRINT_WILDCARD_BONUS;
                    }
                }
                pts
            }
        },
        _ => 0,
    };

    if result.double_points {
        main_pts *= 2;
        sprint_pts *= 2;
    }

    EntryScore {
        main_pts,
        sprint_pts,
        wildcards_granted,
    }
}

pub(crate) fn position_points(
    picks: &[DriverId; 3],
    official: &[DriverId; 3],
    table: &[i32; 3],
) -> i32 {
    picks
        .iter()
        .zip(official)
        .zip(table)
        .filter(|((pick, actual), _)| pick == actual)
        .map(|(_, pts)| pts)
        .sum()
}
