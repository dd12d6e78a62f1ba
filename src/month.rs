//! A calendar month without a day, used to key ledger entries and invoices.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::{Date, Month, util::days_in_month};

use crate::Error;

/// A year and month, e.g. March 2025.
///
/// The text representation is `YYYY-MM`, which is also how the month is
/// stored in the database and written in URLs. Since the representation is
/// zero padded, ordering the text gives the same order as ordering the months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    /// 1..=12
    month: u8,
}

impl YearMonth {
    /// Create a month.
    ///
    /// # Errors
    /// Returns [Error::InvalidMonth] if `month` is not in 1..=12.
    pub fn new(year: i32, month: u8) -> Result<Self, Error> {
        if !(1..=12).contains(&month) {
            return Err(Error::InvalidMonth(format!("{year}-{month}")));
        }

        Ok(Self { year, month })
    }

    /// The month that `date` falls in.
    pub fn from_date(date: Date) -> Self {
        Self {
            year: date.year(),
            month: date.month() as u8,
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> Month {
        // The invariant on `self.month` makes the conversion infallible.
        Month::try_from(self.month).unwrap_or(Month::January)
    }

    /// The number of days in this month.
    pub fn length(&self) -> u8 {
        days_in_month(self.month(), self.year)
    }

    /// The date for `day` in this month, clamped to the last day of the month.
    ///
    /// For example, day 31 of February 2025 is the 28th of February 2025.
    pub fn day(&self, day: u8) -> Date {
        let day = day.clamp(1, self.length());

        Date::from_calendar_date(self.year, self.month(), day)
            .unwrap_or_else(|_| self.first_day())
    }

    pub fn first_day(&self) -> Date {
        Date::from_calendar_date(self.year, self.month(), 1).unwrap_or(Date::MIN)
    }

    pub fn last_day(&self) -> Date {
        self.day(31)
    }

    pub fn next(&self) -> Self {
        self.add_months(1)
    }

    pub fn prev(&self) -> Self {
        self.add_months(-1)
    }

    /// Move `n` months forwards (or backwards for negative `n`).
    pub fn add_months(&self, n: i32) -> Self {
        let index = self.index() + n;

        Self {
            year: index.div_euclid(12),
            month: (index.rem_euclid(12) + 1) as u8,
        }
    }

    /// The number of months from `other` to `self`.
    ///
    /// Positive when `self` is after `other`.
    pub fn months_since(&self, other: YearMonth) -> i32 {
        self.index() - other.index()
    }

    /// Iterate over the months from `start` to `end`, both inclusive.
    ///
    /// The iterator is empty if `end` is before `start`.
    pub fn range_inclusive(start: YearMonth, end: YearMonth) -> impl Iterator<Item = YearMonth> {
        let count = (end.months_since(start) + 1).max(0);

        (0..count).map(move |offset| start.add_months(offset))
    }

    fn index(&self) -> i32 {
        self.year * 12 + (self.month as i32 - 1)
    }

    /// A human readable label such as "March 2025".
    pub fn label(&self) -> String {
        format!("{} {}", self.month(), self.year)
    }
}

impl Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidMonth(s.to_owned());

        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;

        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }

        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u8>().map_err(|_| invalid())?;

        YearMonth::new(year, month).map_err(|_| invalid())
    }
}

impl Serialize for YearMonth {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

impl ToSql for YearMonth {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for YearMonth {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        text.parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

#[cfg(test)]
mod year_month_tests {
    use time::macros::date;

    use crate::Error;

    use super::YearMonth;

    fn month(text: &str) -> YearMonth {
        text.parse().unwrap()
    }

    #[test]
    fn parses_and_formats() {
        let got = month("2025-03");

        assert_eq!(got, YearMonth::new(2025, 3).unwrap());
        assert_eq!(got.to_string(), "2025-03");
    }

    #[test]
    fn rejects_malformed_text() {
        for text in ["2025-13", "2025-00", "2025-3", "25-03", "2025/03", "", "march"] {
            assert!(
                matches!(text.parse::<YearMonth>(), Err(Error::InvalidMonth(_))),
                "want {text:?} to be rejected"
            );
        }
    }

    #[test]
    fn next_and_prev_wrap_around_the_year() {
        assert_eq!(month("2024-12").next(), month("2025-01"));
        assert_eq!(month("2025-01").prev(), month("2024-12"));
        assert_eq!(month("2025-01").add_months(25), month("2027-02"));
        assert_eq!(month("2025-01").add_months(-13), month("2023-12"));
    }

    #[test]
    fn months_since_counts_whole_months() {
        assert_eq!(month("2025-03").months_since(month("2024-11")), 4);
        assert_eq!(month("2024-11").months_since(month("2025-03")), -4);
        assert_eq!(month("2025-03").months_since(month("2025-03")), 0);
    }

    #[test]
    fn day_is_clamped_to_month_length() {
        assert_eq!(month("2025-02").day(31), date!(2025 - 02 - 28));
        assert_eq!(month("2024-02").day(30), date!(2024 - 02 - 29));
        assert_eq!(month("2025-04").day(31), date!(2025 - 04 - 30));
        assert_eq!(month("2025-01").day(15), date!(2025 - 01 - 15));
        assert_eq!(month("2025-01").last_day(), date!(2025 - 01 - 31));
    }

    #[test]
    fn range_inclusive_includes_both_ends() {
        let got: Vec<_> = YearMonth::range_inclusive(month("2024-11"), month("2025-02")).collect();

        assert_eq!(
            got,
            vec![
                month("2024-11"),
                month("2024-12"),
                month("2025-01"),
                month("2025-02")
            ]
        );
    }

    #[test]
    fn range_inclusive_is_empty_when_end_is_before_start() {
        let got = YearMonth::range_inclusive(month("2025-02"), month("2025-01")).count();

        assert_eq!(got, 0);
    }

    #[test]
    fn text_order_matches_month_order() {
        let earlier = month("2024-12");
        let later = month("2025-01");

        assert!(earlier < later);
        assert!(earlier.to_string() < later.to_string());
    }

    #[test]
    fn from_date_ignores_day() {
        assert_eq!(
            YearMonth::from_date(date!(2025 - 07 - 31)),
            month("2025-07")
        );
    }

    #[test]
    fn deserializes_from_string() {
        let got: YearMonth = serde_json::from_str("\"2025-09\"").unwrap();

        assert_eq!(got, month("2025-09"));
    }
}
