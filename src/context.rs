use std::sync::Arc;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use serde::Serialize;
use tracing::info;

use crate::model::{DailyLog, DailyLogEntry};
use crate::scoring::{self, Standing};
use crate::store::{DailyLogStore, TaskStore, RECENT_LOGS_LIMIT};

/// Everything a request needs, built once at startup and handed to the
/// HTTP handlers and CLI commands.
#[derive(Clone)]
pub struct AppContext {
    pub tasks: Arc<dyn TaskStore>,
    pub logs: Arc<dyn DailyLogStore>,
    /// Pins "today". Left empty outside tests.
    pub fixed_today: Option<NaiveDate>,
}

/// What the daily report shows.
#[derive(Debug, Serialize)]
pub struct Report {
    pub today: NaiveDate,
    pub todays_log: Option<DailyLog>,
    pub current: Standing,
    pub past_logs: Vec<DailyLog>,
}

impl AppContext {
    pub fn new(tasks: Arc<dyn TaskStore>, logs: Arc<dyn DailyLogStore>) -> Self {
        AppContext {
            tasks,
            logs,
            fixed_today: None,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.fixed_today
            .unwrap_or_else(|| Local::now().date_naive())
    }

    /// Score and rank over the live tasks.
    pub fn standing(&self) -> Result<Standing> {
        Ok(scoring::standing(&self.tasks.list()?))
    }

    pub fn report(&self) -> Result<Report> {
        let today = self.today();
        Ok(Report {
            today,
            todays_log: self.logs.get_by_date(today)?,
            current: self.standing()?,
            past_logs: self.logs.recent_excluding(today, RECENT_LOGS_LIMIT)?,
        })
    }

    /// Save today's live standing and the memo as today's log, replacing
    /// whatever was recorded earlier today.
    pub fn record_today(&self, memo: Option<String>) -> Result<DailyLog> {
        let current = self.standing()?;
        let log = self.logs.upsert(&DailyLogEntry {
            date: self.today(),
            score: Some(current.score),
            rank: Some(current.rank),
            memo,
        })?;
        info!(
            date = %log.date,
            score = current.score,
            rank = %current.rank,
            "recorded daily log"
        );
        Ok(log)
    }
}
