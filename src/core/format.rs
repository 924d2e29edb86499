//! Display formatting for canonical cells. Every function here is pure and
//! total: bad input degrades to the placeholder or to the raw text.

use crate::domain::model::{format_float, CanonicalRow, CellValue, Timezone};
use crate::domain::schema::{FieldKind, ReportSchema};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

pub const PLACEHOLDER: &str = "—";
pub const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y %H:%M";

/// 小於此值的 epoch 視為秒
const EPOCH_SECONDS_THRESHOLD: f64 = 1e11;

static EPOCH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").unwrap());
static ZONED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(Z|[+\-]\d{2}:\d{2})$").unwrap());
static YMD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})-(\d{2})-(\d{2})(?:[ T](\d{2}):(\d{2})(?::(\d{2}))?)?$").unwrap()
});
static DMY_DASH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2})-(\d{2})-(\d{4})(?:[ T](\d{2}):(\d{2})(?::(\d{2}))?)?$").unwrap()
});
static DMY_SLASH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2})/(\d{2})/(\d{4})(?:[ T](\d{2}):(\d{2})(?::(\d{2}))?)?$").unwrap()
});
static CLOCK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+:\d{2}(:\d{2})?$").unwrap());

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellFormatter {
    timezone: Timezone,
}

impl CellFormatter {
    pub fn new(timezone: Timezone) -> Self {
        Self { timezone }
    }

    pub fn timezone(&self) -> Timezone {
        self.timezone
    }

    pub fn format(&self, kind: FieldKind, value: Option<&CellValue>) -> String {
        let value = match value {
            None => return PLACEHOLDER.to_string(),
            Some(CellValue::Text(s)) if s.is_empty() => return PLACEHOLDER.to_string(),
            Some(CellValue::Text(s)) if s == "None" => return "None".to_string(),
            Some(v) => v,
        };

        match kind {
            FieldKind::Duration => format_duration(value),
            FieldKind::DateTime if is_zero(value) => "0".to_string(),
            FieldKind::DateTime => match self.coerce_to_instant(value) {
                Some(instant) => self.display(instant),
                None => value.raw_text(),
            },
            FieldKind::DeviceStatus => match integer_of(value) {
                Some(1) => "Online".to_string(),
                Some(0) => "Offline".to_string(),
                Some(-1) => "Abnormal".to_string(),
                _ => PLACEHOLDER.to_string(),
            },
            FieldKind::YesNo => format_yes_no(value),
            FieldKind::Plain => format_plain(value),
        }
    }

    /// 依欄位類型格式化某一列的某一欄
    pub fn format_column(&self, schema: &ReportSchema, row: &CanonicalRow, key: &str) -> String {
        self.format(schema.kind_of(key), row.get(key))
    }

    /// Accepts epoch seconds/millis, zoned ISO-8601, the three bare formats
    /// (read as wall-clock time in the configured zone) and RFC 2822.
    pub fn coerce_to_instant(&self, value: &CellValue) -> Option<DateTime<Utc>> {
        match value {
            CellValue::Integer(_) | CellValue::Float(_) => epoch_to_instant(value.as_f64()?),
            CellValue::Text(s) => self.parse_date_text(s.trim()),
            CellValue::Bool(_) | CellValue::Opaque(_) => None,
        }
    }

    fn parse_date_text(&self, s: &str) -> Option<DateTime<Utc>> {
        if s.is_empty() || s == "None" {
            return None;
        }

        if EPOCH_RE.is_match(s) {
            return epoch_to_instant(s.parse::<f64>().ok()?);
        }

        if ZONED_RE.is_match(s) {
            return parse_zoned(s);
        }

        if let Some(caps) = YMD_RE.captures(s) {
            return self.wall_clock(&caps, 1, 2, 3);
        }
        if let Some(caps) = DMY_DASH_RE.captures(s) {
            return self.wall_clock(&caps, 3, 2, 1);
        }
        if let Some(caps) = DMY_SLASH_RE.captures(s) {
            return self.wall_clock(&caps, 3, 2, 1);
        }

        DateTime::parse_from_rfc2822(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    fn wall_clock(
        &self,
        caps: &regex::Captures<'_>,
        year: usize,
        month: usize,
        day: usize,
    ) -> Option<DateTime<Utc>> {
        let num = |i: usize| -> Option<u32> {
            match caps.get(i) {
                Some(m) => m.as_str().parse().ok(),
                None => Some(0),
            }
        };
        let date = NaiveDate::from_ymd_opt(num(year)? as i32, num(month)?, num(day)?)?;
        let time = NaiveTime::from_hms_opt(num(4)?, num(5)?, num(6)?)?;
        self.assume_zone(date.and_time(time))
    }

    /// 把無時區的時間套上設定的時區
    pub fn assume_zone(&self, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
        match self.timezone {
            Timezone::Utc => Some(Utc.from_utc_datetime(&naive)),
            Timezone::Local => Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }

    pub fn display(&self, instant: DateTime<Utc>) -> String {
        match self.timezone {
            Timezone::Utc => instant.format(DISPLAY_DATE_FORMAT).to_string(),
            Timezone::Local => instant
                .with_timezone(&Local)
                .format(DISPLAY_DATE_FORMAT)
                .to_string(),
        }
    }
}

fn epoch_to_instant(n: f64) -> Option<DateTime<Utc>> {
    if !n.is_finite() {
        return None;
    }
    let millis = if n < EPOCH_SECONDS_THRESHOLD { n * 1000.0 } else { n };
    DateTime::from_timestamp_millis(millis.floor() as i64)
}

fn parse_zoned(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // 沒有秒數的 ISO 字串，例如 2024-01-15T10:30Z
    let normalized = match s.strip_suffix('Z') {
        Some(rest) => format!("{}+00:00", rest),
        None => s.to_string(),
    };
    ["%Y-%m-%dT%H:%M%:z", "%Y-%m-%d %H:%M%:z", "%Y-%m-%d %H:%M:%S%:z"]
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(&normalized, fmt).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Seconds as `H:MM:SS` when there are hours, otherwise `M:SS`. Negative
/// input clamps to zero; NaN and +inf render as the placeholder.
pub fn format_seconds_hms(seconds: f64) -> String {
    if seconds.is_nan() || seconds == f64::INFINITY {
        return PLACEHOLDER.to_string();
    }
    let total = seconds.max(0.0).floor() as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}

fn format_duration(value: &CellValue) -> String {
    match value {
        CellValue::Integer(_) | CellValue::Float(_) => {
            format_seconds_hms(value.as_f64().unwrap_or(f64::NAN))
        }
        CellValue::Text(s) => {
            let trimmed = s.trim();
            if CLOCK_RE.is_match(trimmed) {
                return trimmed.to_string();
            }
            match trimmed.parse::<f64>() {
                Ok(seconds) => format_seconds_hms(seconds),
                Err(_) => PLACEHOLDER.to_string(),
            }
        }
        CellValue::Bool(_) | CellValue::Opaque(_) => PLACEHOLDER.to_string(),
    }
}

fn format_plain(value: &CellValue) -> String {
    if is_zero(value) {
        return "0".to_string();
    }
    match value {
        CellValue::Float(f) => format_float(*f),
        other => other.raw_text(),
    }
}

fn format_yes_no(value: &CellValue) -> String {
    match value {
        CellValue::Bool(true) => "Yes".to_string(),
        CellValue::Bool(false) => "No".to_string(),
        other => match integer_of(other) {
            Some(1) => "Yes".to_string(),
            Some(0) => "No".to_string(),
            _ => PLACEHOLDER.to_string(),
        },
    }
}

fn is_zero(value: &CellValue) -> bool {
    match value {
        CellValue::Integer(0) => true,
        CellValue::Float(f) => *f == 0.0,
        CellValue::Text(s) => s == "0",
        _ => false,
    }
}

fn integer_of(value: &CellValue) -> Option<i64> {
    match value {
        CellValue::Integer(i) => Some(*i),
        CellValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
        CellValue::Text(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc() -> CellFormatter {
        CellFormatter::new(Timezone::Utc)
    }

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_duration_formatting() {
        let f = utc();
        assert_eq!(f.format(FieldKind::Duration, Some(&CellValue::Integer(0))), "0:00");
        assert_eq!(f.format(FieldKind::Duration, Some(&CellValue::Integer(3661))), "1:01:01");
        assert_eq!(f.format(FieldKind::Duration, Some(&CellValue::Integer(-12))), "0:00");
        assert_eq!(f.format(FieldKind::Duration, Some(&text("125"))), "2:05");
        assert_eq!(f.format(FieldKind::Duration, Some(&text(" 59.9 "))), "0:59");
        assert_eq!(f.format(FieldKind::Duration, Some(&text("0"))), "0:00");
        assert_eq!(f.format(FieldKind::Duration, Some(&text("1:02:03"))), "1:02:03");
        assert_eq!(f.format(FieldKind::Duration, Some(&text("abc"))), PLACEHOLDER);
        assert_eq!(f.format(FieldKind::Duration, None), PLACEHOLDER);
    }

    #[test]
    fn test_format_seconds_hms_edges() {
        assert_eq!(format_seconds_hms(f64::NAN), PLACEHOLDER);
        assert_eq!(format_seconds_hms(f64::NEG_INFINITY), "0:00");
        assert_eq!(format_seconds_hms(36000.0), "10:00:00");
    }

    #[test]
    fn test_epoch_seconds_and_millis() {
        let f = utc();
        let seconds = f.format(FieldKind::DateTime, Some(&CellValue::Integer(1_700_000_000)));
        let millis = f.format(
            FieldKind::DateTime,
            Some(&CellValue::Integer(1_700_000_000_000)),
        );
        assert_eq!(seconds, "14/11/2023 22:13");
        assert_eq!(seconds, millis);
        assert_eq!(f.format(FieldKind::DateTime, Some(&text("1700000000"))), seconds);
    }

    #[test]
    fn test_bare_formats_are_equivalent() {
        let f = utc();
        let expected = "15/01/2024 10:30";
        for input in [
            "2024-01-15 10:30",
            "2024-01-15T10:30:00",
            "15-01-2024 10:30",
            "15/01/2024T10:30",
            "15/01/2024 10:30:45",
        ] {
            assert_eq!(f.format(FieldKind::DateTime, Some(&text(input))), expected, "{}", input);
        }
        assert_eq!(
            f.format(FieldKind::DateTime, Some(&text("2024-01-15"))),
            "15/01/2024 00:00"
        );
    }

    #[test]
    fn test_zoned_iso_is_absolute() {
        let f = utc();
        assert_eq!(
            f.format(FieldKind::DateTime, Some(&text("2024-01-15T10:30:00+02:00"))),
            "15/01/2024 08:30"
        );
        assert_eq!(
            f.format(FieldKind::DateTime, Some(&text("2024-01-15T10:30Z"))),
            "15/01/2024 10:30"
        );
    }

    #[test]
    fn test_local_zone_matches_chrono_local() {
        let f = CellFormatter::new(Timezone::Local);
        let wall = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        let expected = Local
            .from_local_datetime(&wall)
            .earliest()
            .unwrap()
            .format(DISPLAY_DATE_FORMAT)
            .to_string();
        for input in ["2024-01-15 10:30", "15-01-2024 10:30", "15/01/2024 10:30:45"] {
            assert_eq!(f.format(FieldKind::DateTime, Some(&text(input))), expected, "{}", input);
        }

        let epoch = Local
            .timestamp_opt(1_700_000_000, 0)
            .unwrap()
            .format(DISPLAY_DATE_FORMAT)
            .to_string();
        assert_eq!(f.format(FieldKind::DateTime, Some(&CellValue::Integer(1_700_000_000))), epoch);

        let zoned = DateTime::parse_from_rfc3339("2024-01-15T10:30:00+02:00")
            .unwrap()
            .with_timezone(&Local)
            .format(DISPLAY_DATE_FORMAT)
            .to_string();
        assert_eq!(
            f.format(FieldKind::DateTime, Some(&text("2024-01-15T10:30:00+02:00"))),
            zoned
        );
    }

    #[test]
    fn test_unparseable_date_falls_back_to_raw() {
        let f = utc();
        assert_eq!(f.format(FieldKind::DateTime, Some(&text("yesterday"))), "yesterday");
        assert_eq!(f.format(FieldKind::DateTime, Some(&text("32/01/2024 10:00"))), "32/01/2024 10:00");
        assert_eq!(f.format(FieldKind::DateTime, Some(&text("None"))), "None");
        assert_eq!(f.format(FieldKind::DateTime, Some(&CellValue::Integer(0))), "0");
    }

    #[test]
    fn test_plain_formatting() {
        let f = utc();
        assert_eq!(f.format(FieldKind::Plain, None), PLACEHOLDER);
        assert_eq!(f.format(FieldKind::Plain, Some(&text(""))), PLACEHOLDER);
        assert_eq!(f.format(FieldKind::Plain, Some(&text("None"))), "None");
        assert_eq!(f.format(FieldKind::Plain, Some(&CellValue::Integer(0))), "0");
        assert_eq!(f.format(FieldKind::Plain, Some(&CellValue::Float(0.0))), "0");
        assert_eq!(f.format(FieldKind::Plain, Some(&text("ANSWERED"))), "ANSWERED");
        assert_eq!(f.format(FieldKind::Plain, Some(&CellValue::Bool(false))), "false");
    }

    #[test]
    fn test_device_status_and_yes_no() {
        let f = utc();
        assert_eq!(f.format(FieldKind::DeviceStatus, Some(&CellValue::Integer(1))), "Online");
        assert_eq!(f.format(FieldKind::DeviceStatus, Some(&CellValue::Integer(0))), "Offline");
        assert_eq!(f.format(FieldKind::DeviceStatus, Some(&CellValue::Integer(-1))), "Abnormal");
        assert_eq!(f.format(FieldKind::DeviceStatus, Some(&CellValue::Integer(7))), PLACEHOLDER);
        assert_eq!(f.format(FieldKind::YesNo, Some(&CellValue::Bool(true))), "Yes");
        assert_eq!(f.format(FieldKind::YesNo, Some(&text("0"))), "No");
        assert_eq!(f.format(FieldKind::YesNo, Some(&text("maybe"))), PLACEHOLDER);
    }
}
