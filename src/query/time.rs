//! Time dimension types: granularity, absolute and relative date ranges

use chrono::{
    DateTime, Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, SubsecRound,
};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::identifier::QualifiedIdentifier;

/// Bucket size for a time dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl Granularity {
    pub const ALL: [Granularity; 8] = [
        Granularity::Second,
        Granularity::Minute,
        Granularity::Hour,
        Granularity::Day,
        Granularity::Week,
        Granularity::Month,
        Granularity::Quarter,
        Granularity::Year,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Second => "second",
            Granularity::Minute => "minute",
            Granularity::Hour => "hour",
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
            Granularity::Quarter => "quarter",
            Granularity::Year => "year",
        }
    }
}

/// Error when a granularity token is not recognized
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unknown granularity '{0}'")]
pub struct ParseGranularityError(pub String);

impl FromStr for Granularity {
    type Err = ParseGranularityError;

    /// Exact, case-sensitive match against the eight lowercase tokens
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Granularity::ALL
            .iter()
            .copied()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| ParseGranularityError(s.to_string()))
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Granularity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One end of an absolute date range.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS[.fff]` (also with a space
/// separator) and RFC 3339 timestamps with an offset, which are converted
/// to UTC. Precision below a millisecond is truncated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateBound {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

impl DateBound {
    pub fn parse(s: &str) -> Option<Self> {
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Some(DateBound::Date(date));
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(DateBound::DateTime(dt.naive_utc().trunc_subsecs(3)));
        }
        DATETIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
            .map(|dt| DateBound::DateTime(dt.trunc_subsecs(3)))
    }

    /// The instant this bound denotes; a bare date is midnight of that day
    pub fn as_datetime(&self) -> NaiveDateTime {
        match self {
            DateBound::Date(d) => d.and_time(NaiveTime::MIN),
            DateBound::DateTime(dt) => *dt,
        }
    }
}

impl fmt::Display for DateBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateBound::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            DateBound::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.3f")),
        }
    }
}

impl Serialize for DateBound {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Unit of a relative range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelativeUnit {
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl RelativeUnit {
    fn as_str(&self) -> &'static str {
        match self {
            RelativeUnit::Minute => "minute",
            RelativeUnit::Hour => "hour",
            RelativeUnit::Day => "day",
            RelativeUnit::Week => "week",
            RelativeUnit::Month => "month",
            RelativeUnit::Quarter => "quarter",
            RelativeUnit::Year => "year",
        }
    }

    /// Units that name a calendar period (`this week`, `last month`, ...)
    fn is_calendar_period(&self) -> bool {
        matches!(
            self,
            RelativeUnit::Week | RelativeUnit::Month | RelativeUnit::Quarter | RelativeUnit::Year
        )
    }

    fn parse(token: &str) -> Option<Self> {
        let singular = token.strip_suffix('s').unwrap_or(token);
        match singular {
            "minute" => Some(RelativeUnit::Minute),
            "hour" => Some(RelativeUnit::Hour),
            "day" => Some(RelativeUnit::Day),
            "week" => Some(RelativeUnit::Week),
            "month" => Some(RelativeUnit::Month),
            "quarter" => Some(RelativeUnit::Quarter),
            "year" => Some(RelativeUnit::Year),
            _ => None,
        }
    }
}

/// A named range relative to the moment the query runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelativeRange {
    Today,
    Yesterday,
    Tomorrow,
    /// `this week|month|quarter|year`
    This(RelativeUnit),
    /// `last week|month|quarter|year` (the previous whole period)
    Last(RelativeUnit),
    /// `next week|month|quarter|year`
    Next(RelativeUnit),
    /// `last N units`
    LastN(u32, RelativeUnit),
    /// `next N units`
    NextN(u32, RelativeUnit),
}

impl RelativeRange {
    /// Parse a relative range token; case-insensitive, any whitespace
    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.to_lowercase();
        let tokens: Vec<&str> = lower.split_whitespace().collect();

        match tokens.as_slice() {
            ["today"] => Some(RelativeRange::Today),
            ["yesterday"] => Some(RelativeRange::Yesterday),
            ["tomorrow"] => Some(RelativeRange::Tomorrow),
            [dir, unit] => {
                // Only the singular form names a calendar period
                let unit = RelativeUnit::parse(unit)
                    .filter(|u| u.is_calendar_period() && u.as_str() == *unit)?;
                match *dir {
                    "this" => Some(RelativeRange::This(unit)),
                    "last" => Some(RelativeRange::Last(unit)),
                    "next" => Some(RelativeRange::Next(unit)),
                    _ => None,
                }
            }
            [dir, count, unit] => {
                let n: u32 = count.parse().ok().filter(|n| *n >= 1)?;
                let unit = RelativeUnit::parse(unit)?;
                match *dir {
                    "last" => Some(RelativeRange::LastN(n, unit)),
                    "next" => Some(RelativeRange::NextN(n, unit)),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Resolve to a concrete inclusive `[start, end]` range.
    ///
    /// Day-or-larger units cover whole calendar periods (weeks start on
    /// Monday) and end on the last millisecond of their final day; `last N
    /// days` ends yesterday. Minute and hour ranges are anchored at `now`.
    /// Returns `None` when the arithmetic leaves chrono's supported range.
    pub fn resolve(&self, now: NaiveDateTime) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let today = now.date();
        match *self {
            RelativeRange::Today => whole_periods(today, RelativeUnit::Day, 0, 1),
            RelativeRange::Yesterday => whole_periods(today, RelativeUnit::Day, -1, 1),
            RelativeRange::Tomorrow => whole_periods(today, RelativeUnit::Day, 1, 1),
            RelativeRange::This(unit) => whole_periods(today, unit, 0, 1),
            RelativeRange::Last(unit) => whole_periods(today, unit, -1, 1),
            RelativeRange::Next(unit) => whole_periods(today, unit, 1, 1),
            RelativeRange::LastN(n, unit) => match sub_day(unit, n) {
                Some(span) => Some((now.checked_sub_signed(span)?, now)),
                None => whole_periods(today, unit, -i64::from(n), n),
            },
            RelativeRange::NextN(n, unit) => match sub_day(unit, n) {
                Some(span) => Some((now, now.checked_add_signed(span)?)),
                None => whole_periods(today, unit, 1, n),
            },
        }
    }
}

fn sub_day(unit: RelativeUnit, n: u32) -> Option<Duration> {
    match unit {
        RelativeUnit::Minute => Some(Duration::minutes(i64::from(n))),
        RelativeUnit::Hour => Some(Duration::hours(i64::from(n))),
        _ => None,
    }
}

/// `count` whole periods starting `offset` periods away from the one holding `today`
fn whole_periods(
    today: NaiveDate,
    unit: RelativeUnit,
    offset: i64,
    count: u32,
) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let current = period_start(today, unit)?;
    let start = shift(current, unit, offset)?;
    let end = shift(start, unit, i64::from(count))?.pred_opt()?;
    let last_ms = NaiveTime::from_hms_milli_opt(23, 59, 59, 999)?;
    Some((start.and_time(NaiveTime::MIN), end.and_time(last_ms)))
}

fn period_start(d: NaiveDate, unit: RelativeUnit) -> Option<NaiveDate> {
    match unit {
        RelativeUnit::Minute | RelativeUnit::Hour | RelativeUnit::Day => Some(d),
        RelativeUnit::Week => {
            d.checked_sub_signed(Duration::days(i64::from(d.weekday().num_days_from_monday())))
        }
        RelativeUnit::Month => d.with_day(1),
        RelativeUnit::Quarter => NaiveDate::from_ymd_opt(d.year(), (d.month0() / 3) * 3 + 1, 1),
        RelativeUnit::Year => NaiveDate::from_ymd_opt(d.year(), 1, 1),
    }
}

fn shift(d: NaiveDate, unit: RelativeUnit, n: i64) -> Option<NaiveDate> {
    let months = |per: i64| -> Option<NaiveDate> {
        let total = n.checked_mul(per)?;
        let m = Months::new(u32::try_from(total.unsigned_abs()).ok()?);
        if total >= 0 {
            d.checked_add_months(m)
        } else {
            d.checked_sub_months(m)
        }
    };
    match unit {
        RelativeUnit::Minute | RelativeUnit::Hour | RelativeUnit::Day => {
            d.checked_add_signed(Duration::days(n))
        }
        RelativeUnit::Week => d.checked_add_signed(Duration::days(n.checked_mul(7)?)),
        RelativeUnit::Month => months(1),
        RelativeUnit::Quarter => months(3),
        RelativeUnit::Year => months(12),
    }
}

impl fmt::Display for RelativeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counted = |f: &mut fmt::Formatter<'_>, dir: &str, n: u32, unit: RelativeUnit| {
            let plural = if n == 1 { "" } else { "s" };
            write!(f, "{} {} {}{}", dir, n, unit.as_str(), plural)
        };
        match *self {
            RelativeRange::Today => f.write_str("today"),
            RelativeRange::Yesterday => f.write_str("yesterday"),
            RelativeRange::Tomorrow => f.write_str("tomorrow"),
            RelativeRange::This(unit) => write!(f, "this {}", unit.as_str()),
            RelativeRange::Last(unit) => write!(f, "last {}", unit.as_str()),
            RelativeRange::Next(unit) => write!(f, "next {}", unit.as_str()),
            RelativeRange::LastN(n, unit) => counted(f, "last", n, unit),
            RelativeRange::NextN(n, unit) => counted(f, "next", n, unit),
        }
    }
}

/// The `dateRange` of a time dimension
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DateRange {
    /// Literal `[start, end]` pair with `start <= end`
    Absolute { start: DateBound, end: DateBound },
    /// Named token such as `last 7 days`
    Relative(RelativeRange),
}

impl Serialize for DateRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DateRange::Absolute { start, end } => [start, end].serialize(serializer),
            DateRange::Relative(range) => serializer.collect_str(range),
        }
    }
}

/// A time dimension entry of a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeDimension {
    pub(crate) dimension: QualifiedIdentifier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) granularity: Option<Granularity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) date_range: Option<DateRange>,
}

impl TimeDimension {
    pub fn dimension(&self) -> &QualifiedIdentifier {
        &self.dimension
    }

    pub fn granularity(&self) -> Option<Granularity> {
        self.granularity
    }

    pub fn date_range(&self) -> Option<&DateRange> {
        self.date_range.as_ref()
    }
}
