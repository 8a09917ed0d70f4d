use std::fmt;

use serde::{Deserialize, Serialize};

const WEEK_BITS: u32 = 4;
const SEASON_BITS: u32 = 2;
const SEASON_SHIFT: u32 = WEEK_BITS;
const YEAR_SHIFT: u32 = WEEK_BITS + SEASON_BITS;

const WEEK_MASK: u32 = (1 << WEEK_BITS) - 1;
const SEASON_MASK: u32 = (1 << SEASON_BITS) - 1;

pub const WEEKS_PER_SEASON: u32 = 12;
pub const SEASONS_PER_YEAR: u32 = 4;
pub const WEEKS_PER_YEAR: u32 = WEEKS_PER_SEASON * SEASONS_PER_YEAR;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

string_enum!(Season {
    Spring => "spring",
    Summer => "summer",
    Fall => "fall",
    Winter => "winter",
});

impl Season {
    pub fn index(self) -> u32 {
        match self {
            Season::Spring => 0,
            Season::Summer => 1,
            Season::Fall => 2,
            Season::Winter => 3,
        }
    }

    /// # Panics
    /// Panics if `index` is not in `0..4`.
    pub fn from_index(index: u32) -> Self {
        match index {
            0 => Season::Spring,
            1 => Season::Summer,
            2 => Season::Fall,
            3 => Season::Winter,
            other => panic!("Season::from_index: index out of range: {other}"),
        }
    }
}

/// Compact game date encoding year/season/week in a single `u32`.
///
/// Bit layout: `[year:26][season:2][week:4]`
/// - bits 6-31: year (0–67,108,863)
/// - bits 4-5:  season (0=spring .. 3=winter)
/// - bits 0-3:  week of season (1–12)
///
/// Natural `u32` ordering equals chronological ordering, so loan due dates
/// compare directly against the current date.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "DateRepr", from = "DateRepr")]
pub struct GameDate(u32);

#[derive(Serialize, Deserialize)]
struct DateRepr {
    year: u32,
    season: Season,
    week: u32,
}

impl From<GameDate> for DateRepr {
    fn from(date: GameDate) -> Self {
        DateRepr {
            year: date.year(),
            season: date.season(),
            week: date.week(),
        }
    }
}

impl From<DateRepr> for GameDate {
    fn from(repr: DateRepr) -> Self {
        GameDate::new(repr.year, repr.season, repr.week)
    }
}

impl GameDate {
    /// Create a date from year, season, and week-of-season (1–12).
    pub fn new(year: u32, season: Season, week: u32) -> Self {
        assert!(
            (1..=WEEKS_PER_SEASON).contains(&week),
            "week out of range: {week}"
        );
        Self((year << YEAR_SHIFT) | (season.index() << SEASON_SHIFT) | week)
    }

    /// Create a date for the start of a year (spring, week 1).
    pub fn from_year(year: u32) -> Self {
        Self::new(year, Season::Spring, 1)
    }

    /// Create a date from a raw packed `u32`.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn year(self) -> u32 {
        self.0 >> YEAR_SHIFT
    }

    pub fn season(self) -> Season {
        Season::from_index((self.0 >> SEASON_SHIFT) & SEASON_MASK)
    }

    pub fn week(self) -> u32 {
        self.0 & WEEK_MASK
    }

    /// Week 1 of this date's season.
    pub fn season_start(self) -> Self {
        Self::new(self.year(), self.season(), 1)
    }

    pub fn is_season_start(self) -> bool {
        self.week() == 1
    }

    pub fn is_year_start(self) -> bool {
        self.season() == Season::Spring && self.week() == 1
    }

    /// Weeks elapsed since year 0, spring, week 1.
    pub fn absolute_week(self) -> u32 {
        self.year() * WEEKS_PER_YEAR + self.season().index() * WEEKS_PER_SEASON + (self.week() - 1)
    }

    fn from_absolute_week(abs: u32) -> Self {
        let year = abs / WEEKS_PER_YEAR;
        let rem = abs % WEEKS_PER_YEAR;
        let season = Season::from_index(rem / WEEKS_PER_SEASON);
        let week = rem % WEEKS_PER_SEASON + 1;
        Self::new(year, season, week)
    }

    pub fn plus_weeks(self, weeks: u32) -> Self {
        Self::from_absolute_week(self.absolute_week() + weeks)
    }

    /// Same week-of-season, `seasons` seasons later.
    pub fn plus_seasons(self, seasons: u32) -> Self {
        let abs_season = self.year() * SEASONS_PER_YEAR + self.season().index() + seasons;
        Self::new(
            abs_season / SEASONS_PER_YEAR,
            Season::from_index(abs_season % SEASONS_PER_YEAR),
            self.week(),
        )
    }

    pub fn plus_years(self, years: u32) -> Self {
        Self::new(self.year() + years, self.season(), self.week())
    }

    /// Whole weeks between an earlier date and this one (0 if `earlier` is later).
    pub fn weeks_since(self, earlier: GameDate) -> u32 {
        self.absolute_week().saturating_sub(earlier.absolute_week())
    }

    /// Return the raw packed `u32` value.
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl Default for GameDate {
    fn default() -> Self {
        Self::from_year(0)
    }
}

impl fmt::Display for GameDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Y{}.{}.W{}", self.year(), self.season(), self.week())
    }
}
