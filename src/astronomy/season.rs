//! Meteorological seasons from date and hemisphere.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Winter,
    Spring,
    #[default]
    Summer,
    Autumn,
}

impl Season {
    /// The season half a year away.
    pub fn opposite(self) -> Self {
        match self {
            Season::Winter => Season::Summer,
            Season::Spring => Season::Autumn,
            Season::Summer => Season::Winter,
            Season::Autumn => Season::Spring,
        }
    }
}

/// Meteorological season (Dec–Feb winter in the north), flipped south of the equator.
pub fn season_for(date: NaiveDate, latitude: f32) -> Season {
    let northern = match date.month() {
        12 | 1 | 2 => Season::Winter,
        3..=5 => Season::Spring,
        6..=8 => Season::Summer,
        _ => Season::Autumn,
    };
    if latitude < 0.0 { northern.opposite() } else { northern }
}
