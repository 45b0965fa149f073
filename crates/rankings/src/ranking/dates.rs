//! Day-by-day iteration over a closed date range.

use std::collections::HashSet;
use std::str::FromStr;

use chrono::NaiveDate;

use super::error::RankingError;

const DAY_FORMAT: &str = "%Y-%m-%d";

/// A closed interval of calendar days, parsed from `YYYY-MM-DD..YYYY-MM-DD`.
///
/// A range whose start is after its end is valid and contains no days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    /// Days in the range, in ascending order.
    pub fn days(&self) -> Days {
        Days {
            cursor: Some(self.start),
            end: self.end,
        }
    }
}

impl FromStr for DateRange {
    type Err = RankingError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (start, end) = input
            .split_once("..")
            .ok_or_else(|| RankingError::invalid_range(input, "expected START..END"))?;

        let parse = |side: &str, which: &str| {
            if !is_day_shaped(side) {
                return Err(RankingError::invalid_range(
                    input,
                    format!("{which} date '{side}': expected YYYY-MM-DD"),
                ));
            }
            NaiveDate::parse_from_str(side, DAY_FORMAT).map_err(|e| {
                RankingError::invalid_range(input, format!("{which} date '{side}': {e}"))
            })
        };

        Ok(Self {
            start: parse(start, "start")?,
            end: parse(end, "end")?,
        })
    }
}

/// Exactly `DDDD-DD-DD`. chrono alone accepts signs, padding and short fields.
fn is_day_shaped(side: &str) -> bool {
    let bytes = side.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Iterator over the days of a [`DateRange`].
#[derive(Debug, Clone)]
pub struct Days {
    cursor: Option<NaiveDate>,
    end: NaiveDate,
}

impl Iterator for Days {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<Self::Item> {
        let day = self.cursor.filter(|day| *day <= self.end)?;
        self.cursor = day.succ_opt();
        Some(day)
    }
}

/// Canonical `YYYY-MM-DD` form used in search queries.
pub fn format_day(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

/// Days already queried during one run.
#[derive(Debug, Default, Clone)]
pub struct ProcessedDays {
    seen: HashSet<String>,
}

impl ProcessedDays {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `day`. Returns `false` if it was already recorded.
    pub fn mark(&mut self, day: &str) -> bool {
        self.seen.insert(day.to_string())
    }

    pub fn contains(&self, day: &str) -> bool {
        self.seen.contains(day)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DAY_FORMAT).unwrap()
    }

    #[test]
    fn test_parse_valid_range() {
        let range: DateRange = "2024-01-30..2024-02-02".parse().unwrap();
        assert_eq!(range.start(), date("2024-01-30"));
        assert_eq!(range.end(), date("2024-02-02"));
        assert!(!range.is_empty());
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        for input in [
            "2024-01-01",
            "2024-01-01...",
            "2024-13-01..2024-01-02",
            "2024-01-01..tomorrow",
            "..2024-01-02",
            "",
            "2024-1-5..2024-1-6",
            " 2024-01-05 .. 2024-01-06 ",
            "2024-01-05 ..2024-01-06",
            "+2024-01-05..2024-01-06",
            "2024-01-05..2024-01-06\n",
        ] {
            let err = input.parse::<DateRange>().expect_err(input);
            assert!(
                matches!(err, RankingError::InvalidDateRange { input: ref i, .. } if i == input),
                "unexpected error for {input:?}: {err:?}"
            );
        }
    }

    #[test]
    fn test_days_cross_month_boundary() {
        let range: DateRange = "2024-02-28..2024-03-01".parse().unwrap();
        let days: Vec<String> = range.days().map(format_day).collect();
        assert_eq!(days, vec!["2024-02-28", "2024-02-29", "2024-03-01"]);
    }

    #[test]
    fn test_single_day_range() {
        let range: DateRange = "2024-05-05..2024-05-05".parse().unwrap();
        assert_eq!(range.days().count(), 1);
    }

    #[test]
    fn test_inverted_range_has_no_days() {
        let range: DateRange = "2024-05-06..2024-05-05".parse().unwrap();
        assert!(range.is_empty());
        assert_eq!(range.days().count(), 0);
    }

    #[test]
    fn test_days_stop_at_max_date() {
        let range = DateRange::new(NaiveDate::MAX, NaiveDate::MAX);
        assert_eq!(range.days().count(), 1);
    }

    #[test]
    fn test_processed_days() {
        let mut processed = ProcessedDays::new();
        assert!(processed.is_empty());
        assert!(processed.mark("2024-01-01"));
        assert!(!processed.mark("2024-01-01"));
        assert!(processed.contains("2024-01-01"));
        assert!(!processed.contains("2024-01-02"));
        assert_eq!(processed.len(), 1);
    }
}
