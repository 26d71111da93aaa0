//! Turning submitted form fields into store requests.
//!
//! Blank and absent fields mean the same thing. Numbers and dates that are
//! present but malformed fail the whole submission.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::model::{NewTask, TaskUpdate, DEFAULT_PRIORITY, DEFAULT_PROGRESS};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum FormError {
    #[error("{field}: {value:?} is not a YYYY-MM-DD date")]
    InvalidDate { field: &'static str, value: String },
    #[error("{field}: {value:?} is not an integer")]
    InvalidNumber { field: &'static str, value: String },
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateTaskForm {
    pub title: Option<String>,
    pub due_date: Option<String>,
    pub priority: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EditTaskForm {
    pub due_date: Option<String>,
    pub priority: Option<String>,
    pub progress: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportForm {
    pub memo: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub fn parse_date(
    field: &'static str,
    value: &Option<String>,
) -> Result<Option<NaiveDate>, FormError> {
    present(value)
        .map(|v| {
            NaiveDate::parse_from_str(v, DATE_FORMAT).map_err(|_| FormError::InvalidDate {
                field,
                value: v.to_string(),
            })
        })
        .transpose()
}

pub fn parse_number(
    field: &'static str,
    value: &Option<String>,
    default: i64,
) -> Result<i64, FormError> {
    match present(value) {
        None => Ok(default),
        Some(v) => v.parse().map_err(|_| FormError::InvalidNumber {
            field,
            value: v.to_string(),
        }),
    }
}

impl CreateTaskForm {
    /// `Ok(None)` when there is no title, which is not an error: the
    /// submission is just ignored.
    pub fn into_new_task(self) -> Result<Option<NewTask>, FormError> {
        let title = match self.title {
            Some(title) if !title.is_empty() => title,
            _ => return Ok(None),
        };
        let due_date = parse_date("due_date", &self.due_date)?;
        let priority = parse_number("priority", &self.priority, DEFAULT_PRIORITY)?;
        Ok(Some(NewTask {
            title,
            due_date,
            priority,
        }))
    }
}

impl EditTaskForm {
    /// Every field is overwritten. A missing field takes its default, not
    /// the task's previous value.
    pub fn into_update(self) -> Result<TaskUpdate, FormError> {
        Ok(TaskUpdate {
            due_date: parse_date("due_date", &self.due_date)?,
            priority: parse_number("priority", &self.priority, DEFAULT_PRIORITY)?,
            progress: parse_number("progress", &self.progress, DEFAULT_PROGRESS)?,
        })
    }
}

impl ReportForm {
    pub fn memo(&self) -> Option<String> {
        present(&self.memo).map(str::to_string)
    }
}
