use serde::{Deserialize, Serialize};
use std::fmt;

const DAYS_IN_YEAR: u32 = 365;
const MONTH_LENGTHS: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// In-game calendar date, counted in days from year 0.
///
/// The calendar has no leap years.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GameDate(pub u32);

impl GameDate {
    /// First day of `year`, or `None` if it does not fit the day counter.
    pub fn from_year(year: u32) -> Option<Self> {
        year.checked_mul(DAYS_IN_YEAR).map(Self)
    }

    pub fn year(self) -> u32 {
        self.0 / DAYS_IN_YEAR
    }

    /// `(year, month 1..=12, day 1..=31)`.
    pub fn ymd(self) -> (u32, u32, u32) {
        let mut rest = self.0 % DAYS_IN_YEAR;
        for (month, len) in MONTH_LENGTHS.iter().enumerate() {
            if rest < *len {
                return (self.year(), month as u32 + 1, rest + 1);
            }
            rest -= len;
        }
        unreachable!("day of year is always below {DAYS_IN_YEAR}")
    }

    pub fn next_day(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for GameDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (y, m, d) = self.ymd();
        write!(f, "{y:04}-{m:02}-{d:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_start() {
        let d = GameDate::from_year(1950).unwrap();
        assert_eq!(d.ymd(), (1950, 1, 1));
        assert_eq!(d.to_string(), "1950-01-01");
    }

    #[test]
    fn month_rollover() {
        let d = GameDate(GameDate::from_year(1950).unwrap().0 + 31 + 27);
        assert_eq!(d.ymd(), (1950, 2, 28));
        assert_eq!(d.next_day().ymd(), (1950, 3, 1));
    }

    #[test]
    fn year_end() {
        let d = GameDate(GameDate::from_year(1951).unwrap().0 - 1);
        assert_eq!(d.ymd(), (1950, 12, 31));
    }

    #[test]
    fn huge_year_is_rejected() {
        assert_eq!(GameDate::from_year(u32::MAX / 365 + 1), None);
        assert!(GameDate::from_year(u32::MAX / 365).is_some());
    }
}
