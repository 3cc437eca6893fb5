//! Time logging and the derived project metrics (total hours, progress).

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use std::str::FromStr;

use crate::database::models::Task;

const HOURS_DECIMAL_PLACES: u32 = 2;

/// `logged_hours` is stored as NUMERIC(5,2)
pub fn max_logged_hours() -> Decimal {
    Decimal::new(99_999, 2)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeLogError {
    #[error("Hours must be a number.")]
    Malformed,
    #[error("Hours must be greater than 0")]
    NotPositive,
    #[error("Hours can have at most {places} decimal places.")]
    TooPrecise { places: u32 },
    #[error("Logged hours cannot exceed {max}.")]
    Overflow { max: Decimal },
}

/// Aggregates over every task of every milestone of one project
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub total: i64,
    pub done: i64,
    pub logged_hours: Decimal,
}

impl TaskStats {
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        tasks.into_iter().fold(TaskStats::default(), |mut acc, task| {
            acc.total += 1;
            if task.is_done() {
                acc.done += 1;
            }
            acc.logged_hours += task.logged_hours;
            acc
        })
    }

    pub fn progress_percent(&self) -> f64 {
        progress_percent(self.done, self.total)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectHours {
    pub project_id: uuid::Uuid,
    pub total_hours: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectProgress {
    pub project_id: uuid::Uuid,
    pub progress_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoggedTime {
    pub task_id: uuid::Uuid,
    pub logged_hours: Decimal,
}

/// Interpret the `hours` field of a log-time request. Accepts JSON numbers and numeric strings.
pub fn parse_hours(value: Option<&Value>) -> Result<Decimal, TimeLogError> {
    let raw = match value {
        None | Some(Value::Null) => return Err(TimeLogError::NotPositive),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(_) => return Err(TimeLogError::Malformed),
    };

    let hours = Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .map_err(|_| TimeLogError::Malformed)?;

    if hours <= Decimal::ZERO {
        return Err(TimeLogError::NotPositive);
    }
    if hours.normalize().scale() > HOURS_DECIMAL_PLACES {
        return Err(TimeLogError::TooPrecise { places: HOURS_DECIMAL_PLACES });
    }
    Ok(hours)
}

/// New cumulative value after logging `hours` on top of `current`
pub fn accumulate(current: Decimal, hours: Decimal) -> Result<Decimal, TimeLogError> {
    if hours <= Decimal::ZERO {
        return Err(TimeLogError::NotPositive);
    }
    let max = max_logged_hours();
    match current.checked_add(hours) {
        Some(total) if total <= max => Ok(total),
        _ => Err(TimeLogError::Overflow { max }),
    }
}

/// done / total * 100, rounded to two decimals; 0 for a project without tasks
pub fn progress_percent(done: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let ratio = done as f64 / total as f64 * 100.0;
    (ratio * 100.0).round() / 100.0
}
