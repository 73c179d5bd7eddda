use crate::{
    rank::RankingEntry,
    results::ChampionshipResult,
    scoring::race::{
        position_points, EntryScore, ScoreError, MAIN_POS_PTS, ROUND_SCORE_TRIGGER,
        ROUND_SCORE_VALUE,
    },
    types::UserId,
};

/// Scores every member's pre-season picks against the final championship
/// top threes.
///
/// Uses the main-race position table for both the driver and the
/// constructor side; no wildcard bonuses apply. The round-score rule runs
/// independently on each side's subtotal, so a member can earn up to two
/// wildcard tokens here. Missing picks score as no-match; a missing
/// official slot aborts the whole run.
pub fn score_championship<'a, I>(
    result: &ChampionshipResult,
    members: I,
) -> Result<Vec<(UserId, EntryScore)>, ScoreError>
where
    I: IntoIterator<Item = &'a RankingEntry>,
{
    let (Some(drivers), Some(teams)) = (&result.drivers, &result.teams) else {
        return Err(ScoreError::ChampionshipIncomplete);
    };

    Ok(members
        .into_iter()
        .map(|member| {
            let mut wildcards_granted = 0u8;

            let mut driver_pts = member
                .championship_drivers
                .as_ref()
                .map(|picks| position_points(picks, drivers, &MAIN_POS_PTS))
                .unwrap_or(0);
            if driver_pts == ROUND_SCORE_TRIGGER {
                driver_pts = ROUND_SCORE_VALUE;
                wildcards_granted += 1;
            }

            let mut team_pts = member
                .championship_teams
                .as_ref()
                .map(|picks| position_points(picks, teams, &MAIN_POS_PTS))
                .unwrap_or(0);
            if team_pts == ROUND_SCORE_TRIGGER {
                team_pts = ROUND_SCORE_VALUE;
                wildcards_granted += 1;
            }

            (
                member.user_id,
                EntryScore {
                    main_pts: driver_pts + team_pts,
                    sprint_pts: 0,
                    wildcards_granted,
                },
            )
        })
        .collect())
}
