use std::fmt;

use chrono::NaiveDate;

use crate::error::{Error, Result};

/// One calendar month, the unit of download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(Error::InvalidMonth(format!(
                "month must be 1-12, got {month}"
            )));
        }
        // Both ends of the month must be expressible as calendar dates.
        if NaiveDate::from_ymd_opt(year, month, 1).is_none()
            || NaiveDate::from_ymd_opt(year + 1, 1, 1).is_none()
        {
            return Err(Error::InvalidMonth(format!("year {year} is out of range")));
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).expect("validated in Month::new")
    }

    /// Number of days in the month, leap years included.
    pub fn days(&self) -> u32 {
        let (next_year, next_month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        let next = NaiveDate::from_ymd_opt(next_year, next_month, 1).expect("validated in Month::new");
        (next - self.first_day()).num_days() as u32
    }

    /// Date range string the retrieval request expects:
    /// `YYYY-MM-01/YYYY-MM-<lastday>`.
    pub fn date_range(&self) -> String {
        format!(
            "{y:04}-{m:02}-01/{y:04}-{m:02}-{d:02}",
            y = self.year,
            m = self.month,
            d = self.days()
        )
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Inclusive range of download years, as configured by `forcing_raw_time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    start: i32,
    end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Result<Self> {
        if end < start {
            return Err(Error::InvalidYearRange(format!(
                "end year {end} precedes start year {start}"
            )));
        }
        Month::new(start, 1)?;
        Month::new(end, 12)?;
        Ok(Self { start, end })
    }

    /// Parse a `start,end` pair, e.g. `2008,2013`.
    pub fn parse(s: &str) -> Result<Self> {
        let (start, end) = s.split_once(',').ok_or_else(|| {
            Error::InvalidYearRange(format!("expected `start,end`, got `{s}`"))
        })?;
        let start = start.trim().parse().map_err(|_| {
            Error::InvalidYearRange(format!("cannot parse start year `{}`", start.trim()))
        })?;
        let end = end.trim().parse().map_err(|_| {
            Error::InvalidYearRange(format!("cannot parse end year `{}`", end.trim()))
        })?;
        Self::new(start, end)
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn end(&self) -> i32 {
        self.end
    }

    /// All months of the range in calendar order.
    pub fn months(self) -> impl Iterator<Item = Month> {
        (self.start..=self.end).flat_map(|year| (1..=12).map(move |month| Month { year, month }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leap_year_february_has_29_days() {
        assert_eq!(Month::new(2008, 2).unwrap().days(), 29);
        assert_eq!(Month::new(2009, 2).unwrap().days(), 28);
        // Century years are only leap when divisible by 400.
        assert_eq!(Month::new(2000, 2).unwrap().days(), 29);
        assert_eq!(Month::new(1900, 2).unwrap().days(), 28);
    }

    #[test]
    fn date_range_covers_the_whole_month() {
        assert_eq!(Month::new(2008, 2).unwrap().date_range(), "2008-02-01/2008-02-29");
        assert_eq!(Month::new(2013, 12).unwrap().date_range(), "2013-12-01/2013-12-31");
        assert_eq!(Month::new(2010, 4).unwrap().date_range(), "2010-04-01/2010-04-30");
    }

    #[test]
    fn rejects_month_zero_and_thirteen() {
        assert!(Month::new(2008, 0).is_err());
        assert!(Month::new(2008, 13).is_err());
    }

    #[test]
    fn months_iterates_every_month_of_every_year() {
        let range = YearRange::new(2008, 2009).unwrap();
        let months: Vec<Month> = range.months().collect();
        assert_eq!(months.len(), 24);
        assert_eq!(months[0], Month::new(2008, 1).unwrap());
        assert_eq!(months[11], Month::new(2008, 12).unwrap());
        assert_eq!(months[12], Month::new(2009, 1).unwrap());
        assert_eq!(months[23], Month::new(2009, 12).unwrap());
    }

    #[test]
    fn parses_year_range_setting() {
        let range = YearRange::parse("2008, 2013").unwrap();
        assert_eq!((range.start(), range.end()), (2008, 2013));
        assert!(YearRange::parse("2013,2008").is_err());
        assert!(YearRange::parse("2008").is_err());
        assert!(YearRange::parse("two thousand,2013").is_err());
    }
}
