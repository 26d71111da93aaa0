use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::Serialize;

/// Priority given to a task when none is submitted.
pub const DEFAULT_PRIORITY: i64 = 3;

/// Progress of a freshly created task, and of an edit that omits it.
pub const DEFAULT_PROGRESS: i64 = 0;

/// A single task, saved as an entry in the tasks table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub created_at: DateTime<Local>,
    pub due_date: Option<NaiveDate>,
    /// Lower numbers are meant to be more urgent.
    pub priority: i64,
    /// Percentage, conceptually 0 to 100. Not enforced.
    pub progress: i64,
}

/// What is needed to create a task. Progress always starts at zero.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub due_date: Option<NaiveDate>,
    pub priority: i64,
}

/// The mutable fields of a task. An edit overwrites all of them.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskUpdate {
    pub due_date: Option<NaiveDate>,
    pub priority: i64,
    pub progress: i64,
}

/// One summary record per calendar date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyLog {
    pub id: i64,
    pub date: NaiveDate,
    pub score: Option<i64>,
    pub rank: Option<Rank>,
    pub memo: Option<String>,
}

/// The content written into a daily log, keyed by its date.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyLogEntry {
    pub date: NaiveDate,
    pub score: Option<i64>,
    pub rank: Option<Rank>,
    pub memo: Option<String>,
}

/// Letter grade of a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Rank {
    A,
    B,
    C,
    D,
}

impl Rank {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rank::A => "A",
            Rank::B => "B",
            Rank::C => "C",
            Rank::D => "D",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown rank {0:?}")]
pub struct UnknownRank(String);

impl FromStr for Rank {
    type Err = UnknownRank;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Rank::A),
            "B" => Ok(Rank::B),
            "C" => Ok(Rank::C),
            "D" => Ok(Rank::D),
            other => Err(UnknownRank(other.to_string())),
        }
    }
}

impl ToSql for Rank {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Rank {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_letters_parse_back() {
        for rank in [Rank::A, Rank::B, Rank::C, Rank::D] {
            assert_eq!(rank.to_string().parse::<Rank>().unwrap(), rank);
        }
        assert!("N/A".parse::<Rank>().is_err());
    }
}
