//! Pick submission records.

use serde::{Deserialize, Serialize};

use crate::types::{DriverId, RaceId, UserId};

/// One member's picks for one race weekend.
///
/// Created or overwritten by the submission front end before the race
/// deadline; settlement reads it and writes back only the cached
/// [`main_pts`](Self::main_pts)/[`sprint_pts`](Self::sprint_pts) totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceEntry {
    /// Race this entry belongs to.
    pub race_id: RaceId,
    /// Member who submitted the entry.
    pub user_id: UserId,
    /// Ordered predicted podium. `None` marks a no-show entry.
    pub main_picks: Option<[DriverId; 3]>,
    /// Bonus pick scored if it lands anywhere on the podium.
    pub wildcard: Option<DriverId>,
    /// Optional second bonus pick, scored independently of the first.
    pub wildcard2: Option<DriverId>,
    /// Ordered predicted sprint podium, present only on sprint weekends.
    pub sprint_picks: Option<[DriverId; 3]>,
    /// Bonus pick against the sprint podium.
    pub sprint_wildcard: Option<DriverId>,
    /// True when the entry came in past the deadline.
    pub is_late: bool,
    /// Main-race total written back by the last settlement.
    pub main_pts: Option<i32>,
    /// Sprint total written back by the last settlement.
    pub sprint_pts: Option<i32>,
}

impl RaceEntry {
    /// Creates an unsettled entry with no picks for `user_id` at `race_id`.
    pub fn blank(race_id: RaceId, user_id: UserId) -> Self {
        Self {
            race_id,
            user_id,
            main_picks: None,
            wildcard: None,
            wildcard2: None,
            sprint_picks: None,
            sprint_wildcard: None,
            is_late: false,
            main_pts: None,
            sprint_pts: None,
        }
    }

    /// True when the entry carries no main podium picks.
    pub fn is_no_show(&self) -> bool {
        self.main_picks.is_none()
    }
}
