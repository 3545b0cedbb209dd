use std::fmt;
use std::sync::LazyLock;

use chrono::{Duration, NaiveDate, NaiveTime, Weekday};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A named attribute on an item. The set of fields an item carries is fixed
/// by its kind (see `ItemKind::steps`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Goal,
    Deadline,
    Duration,
    DateRange,
    Days,
    TimeSlot,
    Recurring,
    Date,
    TimeRange,
    Link,
}

impl Field {
    /// Human label used in prompts and the edit form
    pub fn label(self) -> &'static str {
        match self {
            Field::Name => "Name",
            Field::Goal => "Goal",
            Field::Deadline => "Deadline",
            Field::Duration => "Duration",
            Field::DateRange => "Dates",
            Field::Days => "Days",
            Field::TimeSlot => "Time",
            Field::Recurring => "Recurring",
            Field::Date => "Date",
            Field::TimeRange => "Time",
            Field::Link => "Link",
        }
    }

    /// Text fields take characters directly; everything else goes through a popup.
    pub fn is_text(self) -> bool {
        matches!(self, Field::Name | Field::Link)
    }
}

/// A typed field value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Null,
    Text(String),
    /// Server id of a goal
    Goal(String),
    Minutes(u32),
    Date(NaiveDate),
    DateRange {
        start: NaiveDate,
        end: NaiveDate,
    },
    Days(DaySet),
    TimeSlot {
        start: NaiveTime,
        minutes: u32,
    },
    TimeRange {
        start: NaiveTime,
        end: NaiveTime,
    },
    Flag(bool),
}

impl Value {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Compact display form. Goal references are shown by id; the outline
    /// view resolves them to names itself.
    pub fn display(&self) -> String {
        match self {
            Value::Null => "none".to_string(),
            Value::Text(s) => s.clone(),
            Value::Goal(id) => id.clone(),
            Value::Minutes(m) => format_minutes(*m),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::DateRange { start, end } => {
                format!("{}..{}", start.format("%Y-%m-%d"), end.format("%Y-%m-%d"))
            }
            Value::Days(days) => days.to_string(),
            Value::TimeSlot { start, minutes } => {
                format!("{} +{}", start.format("%H:%M"), format_minutes(*minutes))
            }
            Value::TimeRange { start, end } => {
                format!("{}-{}", start.format("%H:%M"), end.format("%H:%M"))
            }
            Value::Flag(true) => "yes".to_string(),
            Value::Flag(false) => "no".to_string(),
        }
    }

    /// The text a user would type to reproduce this value in an entry popup
    pub fn entry_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::TimeSlot { start, minutes } => {
                format!("{} {}", start.format("%H:%M"), format_minutes(*minutes).replace(' ', ""))
            }
            other => other.display(),
        }
    }
}

// ---------------------------------------------------------------------------
// Day sets
// ---------------------------------------------------------------------------

const DAY_NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// A set of weekdays, Monday first. Serialized as a list like `["mon", "wed"]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "Vec<String>", try_from = "Vec<String>")]
pub struct DaySet(u8);

impl DaySet {
    pub fn empty() -> Self {
        DaySet(0)
    }

    /// `index` is 0 = Monday .. 6 = Sunday
    pub fn contains(self, index: usize) -> bool {
        index < 7 && self.0 & (1 << index) != 0
    }

    pub fn toggle(&mut self, index: usize) {
        if index < 7 {
            self.0 ^= 1 << index;
        }
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= 1 << day.num_days_from_monday();
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn day_name(index: usize) -> &'static str {
        DAY_NAMES.get(index).copied().unwrap_or("?")
    }
}

impl fmt::Display for DaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = (0..7)
            .filter(|i| self.contains(*i))
            .map(DaySet::day_name)
            .collect();
        if names.is_empty() {
            write!(f, "no days")
        } else {
            write!(f, "{}", names.join(" "))
        }
    }
}

impl From<DaySet> for Vec<String> {
    fn from(days: DaySet) -> Self {
        (0..7)
            .filter(|i| days.contains(*i))
            .map(|i| DaySet::day_name(i).to_lowercase())
            .collect()
    }
}

impl TryFrom<Vec<String>> for DaySet {
    type Error = String;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        let mut days = DaySet::empty();
        for name in names {
            let day: Weekday = name
                .parse()
                .map_err(|_| format!("unknown weekday: {}", name))?;
            days.insert(day);
        }
        Ok(days)
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Malformed user input. Rejected locally; nothing is mutated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid duration: {0}")]
    Duration(String),
    #[error("invalid date: {0}")]
    Date(String),
    #[error("invalid time: {0}")]
    Time(String),
    #[error("end must come after start")]
    Order,
    #[error("{0} is required")]
    Required(&'static str),
    #[error("pick at least one day")]
    NoDays,
}

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?P<h>\d+(?:\.\d+)?)\s*h)?\s*(?:(?P<m>\d+)\s*m?)?$")
        .expect("duration pattern is valid")
});

/// Parse `45`, `45m`, `1h`, `1h30m`, `1h30` or `1.5h` into minutes.
pub fn parse_minutes(input: &str) -> Result<u32, ValidationError> {
    let s = input.trim().to_lowercase();
    let err = || ValidationError::Duration(input.trim().to_string());
    let caps = DURATION_RE.captures(&s).ok_or_else(err)?;
    let hours = caps.name("h");
    let minutes = caps.name("m");
    if hours.is_none() && minutes.is_none() {
        return Err(err());
    }
    let mut total = 0u32;
    if let Some(h) = hours {
        let h: f64 = h.as_str().parse().map_err(|_| err())?;
        let from_hours = (h * 60.0).round();
        if !from_hours.is_finite() || from_hours > f64::from(u32::MAX) {
            return Err(err());
        }
        total = from_hours as u32;
    }
    if let Some(m) = minutes {
        let m: u32 = m.as_str().parse().map_err(|_| err())?;
        total = total.checked_add(m).ok_or_else(err)?;
    }
    if total == 0 {
        return Err(err());
    }
    Ok(total)
}

/// `90` → `1h 30m`
pub fn format_minutes(minutes: u32) -> String {
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("{}m", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h {}m", h, m),
    }
}

/// Parse `YYYY-MM-DD`, `today`, `tomorrow` or `+Nd` relative to `today`.
pub fn parse_date(input: &str, today: NaiveDate) -> Result<NaiveDate, ValidationError> {
    let s = input.trim().to_lowercase();
    let err = || ValidationError::Date(input.trim().to_string());
    let offset = match s.as_str() {
        "today" => return Ok(today),
        "tomorrow" => Some(1),
        _ => match s.strip_prefix('+') {
            Some(rest) => Some(rest.trim_end_matches('d').parse::<i64>().map_err(|_| err())?),
            None => None,
        },
    };
    if let Some(n) = offset {
        // Out of chrono's range is bad input, not a crash
        return Duration::try_days(n)
            .and_then(|d| today.checked_add_signed(d))
            .ok_or_else(err);
    }
    NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|_| err())
}

/// Parse `DATE..DATE` (or `DATE to DATE`). The end may equal the start.
pub fn parse_date_range(
    input: &str,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate), ValidationError> {
    let (a, b) = input
        .split_once("..")
        .or_else(|| input.split_once(" to "))
        .ok_or_else(|| ValidationError::Date(input.trim().to_string()))?;
    let start = parse_date(a, today)?;
    let end = parse_date(b, today)?;
    if end < start {
        return Err(ValidationError::Order);
    }
    Ok((start, end))
}

/// Parse `HH:MM` or a bare hour like `9`.
pub fn parse_time(input: &str) -> Result<NaiveTime, ValidationError> {
    let s = input.trim();
    let err = || ValidationError::Time(s.to_string());
    if let Ok(t) = NaiveTime::parse_from_str(s, "%H:%M") {
        return Ok(t);
    }
    let hour: u32 = s.parse().map_err(|_| err())?;
    NaiveTime::from_hms_opt(hour, 0, 0).ok_or_else(err)
}

/// Parse `HH:MM 45m` into a start time and a duration.
pub fn parse_time_slot(input: &str) -> Result<(NaiveTime, u32), ValidationError> {
    let s = input.trim();
    let (time, duration) = s
        .split_once(char::is_whitespace)
        .ok_or_else(|| ValidationError::Duration(s.to_string()))?;
    Ok((parse_time(time)?, parse_minutes(duration)?))
}

/// Parse `HH:MM-HH:MM`. The end must be strictly after the start.
pub fn parse_time_range(input: &str) -> Result<(NaiveTime, NaiveTime), ValidationError> {
    let s = input.trim();
    let (a, b) = s
        .split_once('-')
        .ok_or_else(|| ValidationError::Time(s.to_string()))?;
    let start = parse_time(a)?;
    let end = parse_time(b)?;
    if end <= start {
        return Err(ValidationError::Order);
    }
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[test]
    fn minutes_accepts_common_forms() {
        assert_eq!(parse_minutes("45").unwrap(), 45);
        assert_eq!(parse_minutes("45m").unwrap(), 45);
        assert_eq!(parse_minutes("1h").unwrap(), 60);
        assert_eq!(parse_minutes("1h30m").unwrap(), 90);
        assert_eq!(parse_minutes("1h30").unwrap(), 90);
        assert_eq!(parse_minutes("1.5h").unwrap(), 90);
        assert_eq!(parse_minutes(" 2H ").unwrap(), 120);
    }

    #[test]
    fn minutes_rejects_garbage() {
        assert!(parse_minutes("").is_err());
        assert!(parse_minutes("abc").is_err());
        assert!(parse_minutes("0").is_err());
        assert!(parse_minutes("h").is_err());
    }

    #[test]
    fn minutes_rejects_overflow() {
        assert_eq!(
            parse_minutes("71582789h 5m"),
            Err(ValidationError::Duration("71582789h 5m".into()))
        );
        assert!(parse_minutes("99999999999h").is_err());
        assert!(parse_minutes("99999999999").is_err());
        assert!(parse_time_slot("09:00 71582789h 5m").is_err());
    }

    #[test]
    fn format_minutes_forms() {
        assert_eq!(format_minutes(45), "45m");
        assert_eq!(format_minutes(60), "1h");
        assert_eq!(format_minutes(90), "1h 30m");
    }

    #[test]
    fn dates_relative_and_absolute() {
        assert_eq!(parse_date("today", today()).unwrap(), today());
        assert_eq!(
            parse_date("tomorrow", today()).unwrap(),
            NaiveDate::from_ymd_opt(2026, 10, 20).unwrap()
        );
        assert_eq!(
            parse_date("+3d", today()).unwrap(),
            NaiveDate::from_ymd_opt(2026, 10, 22).unwrap()
        );
        assert_eq!(
            parse_date("2027-01-02", today()).unwrap(),
            NaiveDate::from_ymd_opt(2027, 1, 2).unwrap()
        );
        assert_eq!(
            parse_date("2027-13-02", today()),
            Err(ValidationError::Date("2027-13-02".into()))
        );
    }

    #[test]
    fn dates_past_the_calendar_are_rejected() {
        assert_eq!(
            parse_date("+100000000d", today()),
            Err(ValidationError::Date("+100000000d".into()))
        );
        assert!(parse_date("+-100000000d", today()).is_err());
        assert!(parse_date(&format!("+{}d", i64::MAX), today()).is_err());
        assert!(parse_date_range("today..+100000000d", today()).is_err());
    }

    #[test]
    fn date_range_checks_order() {
        let (start, end) = parse_date_range("2026-11-01..2026-11-30", today()).unwrap();
        assert!(start < end);
        assert_eq!(
            parse_date_range("2026-11-30..2026-11-01", today()),
            Err(ValidationError::Order)
        );
        assert!(parse_date_range("2026-11-01", today()).is_err());
    }

    #[test]
    fn time_slot_and_range() {
        let (t, m) = parse_time_slot("09:15 45m").unwrap();
        assert_eq!(t, NaiveTime::from_hms_opt(9, 15, 0).unwrap());
        assert_eq!(m, 45);
        let (a, b) = parse_time_range("9-10:30").unwrap();
        assert_eq!(a, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(b, NaiveTime::from_hms_opt(10, 30, 0).unwrap());
        assert_eq!(parse_time_range("10:00-09:00"), Err(ValidationError::Order));
        assert!(parse_time("25:00").is_err());
    }

    #[test]
    fn day_set_serializes_as_names() {
        let mut days = DaySet::empty();
        days.toggle(0);
        days.toggle(2);
        let json = serde_json::to_string(&Value::Days(days)).unwrap();
        assert_eq!(json, r#"{"type":"days","value":["mon","wed"]}"#);
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Value::Days(days));
        assert_eq!(days.to_string(), "Mon Wed");
    }
}
