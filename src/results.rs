//! Official result records saved by the pool admin.

use serde::{Deserialize, Serialize};

use crate::types::{DriverId, RaceId, TeamId};

/// Authoritative finishing record for one race weekend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceResult {
    /// Race the record belongs to.
    pub race_id: RaceId,
    /// Main-race podium in finishing order. Required for settlement.
    pub podium: Option<[DriverId; 3]>,
    /// Sprint podium, present only when a sprint was run.
    pub sprint_podium: Option<[DriverId; 3]>,
    /// True only for the final race of the season.
    pub double_points: bool,
    /// The main race was called off; the weekend must not settle.
    pub cancelled_main: bool,
    /// The sprint was called off; the sprint segment scores nothing.
    pub cancelled_sprint: bool,
}

impl RaceResult {
    /// Creates a plain result with only the main podium filled in.
    pub fn with_podium(race_id: RaceId, podium: [DriverId; 3]) -> Self {
        Self {
            race_id,
            podium: Some(podium),
            sprint_podium: None,
            double_points: false,
            cancelled_main: false,
            cancelled_sprint: false,
        }
    }

    /// True when the sprint segment should be scored at all.
    pub fn sprint_scorable(&self) -> bool {
        self.sprint_podium.is_some() && !self.cancelled_sprint
    }
}

/// Season-final championship top threes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ChampionshipResult {
    /// Drivers' championship top three in order.
    pub drivers: Option<[DriverId; 3]>,
    /// Constructors' championship top three in order.
    pub teams: Option<[TeamId; 3]>,
}

impl ChampionshipResult {
    /// True when all six official slots are present.
    pub fn is_complete(&self) -> bool {
        self.drivers.is_some() && self.teams.is_some()
    }
}
