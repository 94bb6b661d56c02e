//! Check schedule expressed as a five-field cron expression

use std::collections::BTreeSet;
use std::fmt;

/// Default schedule: every two hours on the hour
pub const DEFAULT_CRON: &str = "0 */2 * * *";

/// Errors from parsing a schedule expression
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Cron expression must have 5 fields (minute hour day month weekday), got {0}")]
    FieldCount(usize),

    #[error("Invalid character in cron field '{0}'")]
    InvalidField(String),
}

/// Validated `minute hour day-of-month month day-of-week` expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronSchedule {
    fields: [String; 5],
}

impl CronSchedule {
    pub fn parse(expression: &str) -> Result<Self, ScheduleError> {
        let parts: Vec<&str> = expression.split_whitespace().collect();
        let fields: [&str; 5] = parts
            .as_slice()
            .try_into()
            .map_err(|_| ScheduleError::FieldCount(parts.len()))?;

        for field in fields {
            let valid = field
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '*' | '/' | ',' | '-' | '?'));
            if !valid {
                return Err(ScheduleError::InvalidField(field.to_string()));
            }
        }

        Ok(Self {
            fields: fields.map(String::from),
        })
    }

    /// Six-field form with a leading seconds column for `tokio-cron-scheduler`.
    ///
    /// Its day-of-week runs 1 (Sunday) to 7 (Saturday), so numeric weekdays
    /// are shifted; named weekdays pass through unchanged.
    pub fn with_seconds(&self) -> String {
        let [minute, hour, day, month, weekday] = &self.fields;
        format!(
            "0 {} {} {} {} {}",
            minute,
            hour,
            day,
            month,
            scheduler_weekdays(weekday)
        )
    }
}

/// Rewrite a standard (0 or 7 = Sunday) day-of-week field as an explicit
/// list in the scheduler's 1 = Sunday numbering
fn scheduler_weekdays(field: &str) -> String {
    if field == "*" || field == "?" {
        return field.to_string();
    }

    let mut days = BTreeSet::new();
    for item in field.split(',') {
        match expand_weekdays(item) {
            Some(expanded) => days.extend(expanded),
            None => return field.to_string(),
        }
    }

    days.iter()
        .map(|day| (day + 1).to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Standard weekdays (0-6) selected by one list item, `None` if not numeric
fn expand_weekdays(item: &str) -> Option<Vec<u8>> {
    let (range, step) = match item.split_once('/') {
        Some((range, step)) => (range, Some(step.parse::<usize>().ok()?)),
        None => (item, None),
    };
    let step = step.unwrap_or(1);
    if step == 0 {
        return None;
    }

    let (start, end) = match range.split_once('-') {
        _ if range == "*" => (0, 6),
        Some((start, end)) => (start.parse::<u8>().ok()?, end.parse::<u8>().ok()?),
        None => {
            let start = range.parse::<u8>().ok()?;
            // `n/step` runs to the end of the week
            if item.contains('/') { (start, 6) } else { (start, start) }
        }
    };
    if start > end || end > 7 {
        return None;
    }

    Some((start..=end).step_by(step).map(|day| day % 7).collect())
}

impl Default for CronSchedule {
    fn default() -> Self {
        Self {
            fields: ["0", "*/2", "*", "*", "*"].map(String::from),
        }
    }
}

impl fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fields.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_constant() {
        assert_eq!(CronSchedule::default(), CronSchedule::parse(DEFAULT_CRON).unwrap());
        assert_eq!(CronSchedule::default().to_string(), DEFAULT_CRON);
    }

    #[test]
    fn test_seconds_column_is_prefixed() {
        let schedule = CronSchedule::parse("  30 8  * * MON-FRI ").unwrap();

        assert_eq!(schedule.with_seconds(), "0 30 8 * * MON-FRI");
        assert_eq!(schedule.to_string(), "30 8 * * MON-FRI");
    }

    #[test]
    fn test_default_schedule_keeps_every_weekday() {
        assert_eq!(CronSchedule::default().with_seconds(), "0 0 */2 * * *");
    }

    #[test]
    fn test_numeric_weekdays_shift_to_sunday_first_numbering() {
        let shifted = |expr: &str| CronSchedule::parse(expr).unwrap().with_seconds();

        assert_eq!(shifted("0 9 * * 1"), "0 0 9 * * 2");
        assert_eq!(shifted("0 9 * * 0"), "0 0 9 * * 1");
        assert_eq!(shifted("0 9 * * 7"), "0 0 9 * * 1");
        assert_eq!(shifted("0 9 * * 1-5"), "0 0 9 * * 2,3,4,5,6");
        assert_eq!(shifted("0 9 * * 5-7"), "0 0 9 * * 1,6,7");
        assert_eq!(shifted("0 9 * * 0,3"), "0 0 9 * * 1,4");
        assert_eq!(shifted("0 9 * * */2"), "0 0 9 * * 1,3,5,7");
        assert_eq!(shifted("0 9 * * 1-5/2"), "0 0 9 * * 2,4,6");
    }

    #[test]
    fn test_unrecognized_weekday_field_passes_through() {
        let schedule = CronSchedule::parse("0 9 * * MON,3").unwrap();
        assert_eq!(schedule.with_seconds(), "0 0 9 * * MON,3");
    }

    #[test]
    fn test_wrong_field_count_is_rejected() {
        assert_eq!(
            CronSchedule::parse("0 */2 * *"),
            Err(ScheduleError::FieldCount(4))
        );
        assert_eq!(
            CronSchedule::parse("0 0 */2 * * *"),
            Err(ScheduleError::FieldCount(6))
        );
        assert_eq!(CronSchedule::parse(""), Err(ScheduleError::FieldCount(0)));
    }

    #[test]
    fn test_invalid_characters_are_rejected() {
        assert_eq!(
            CronSchedule::parse("0 */2 * * $"),
            Err(ScheduleError::InvalidField("$".to_string()))
        );
    }
}
