use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDate};

use super::{list_order, DailyLogStore, TaskStore};
use crate::model::{DailyLog, DailyLogEntry, NewTask, Task, TaskUpdate, DEFAULT_PROGRESS};

#[derive(Default)]
struct State {
    tasks: Vec<Task>,
    logs: Vec<DailyLog>,
    last_task_id: i64,
    last_log_id: i64,
}

impl State {
    fn insert_log(&mut self, entry: &DailyLogEntry) -> DailyLog {
        self.last_log_id += 1;
        let log = DailyLog {
            id: self.last_log_id,
            date: entry.date,
            score: entry.score,
            rank: entry.rank,
            memo: entry.memo.clone(),
        };
        self.logs.push(log.clone());
        log
    }
}

/// Volatile store, selected with `DATABASE_URL=memory:`. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("Memory store lock is poisoned."))
    }
}

impl TaskStore for MemoryStore {
    fn create(&self, task: &NewTask) -> Result<Task> {
        let mut state = self.state()?;
        state.last_task_id += 1;
        let task = Task {
            id: state.last_task_id,
            title: task.title.clone(),
            created_at: Local::now(),
            due_date: task.due_date,
            priority: task.priority,
            progress: DEFAULT_PROGRESS,
        };
        state.tasks.push(task.clone());
        Ok(task)
    }

    fn list(&self) -> Result<Vec<Task>> {
        let mut tasks = self.state()?.tasks.clone();
        tasks.sort_by(list_order);
        Ok(tasks)
    }

    fn get(&self, id: i64) -> Result<Option<Task>> {
        Ok(self.state()?.tasks.iter().find(|t| t.id == id).cloned())
    }

    fn update(&self, id: i64, update: &TaskUpdate) -> Result<Option<Task>> {
        let mut state = self.state()?;
        let Some(task) = state.tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        task.due_date = update.due_date;
        task.priority = update.priority;
        task.progress = update.progress;
        Ok(Some(task.clone()))
    }

    fn delete(&self, id: i64) -> Result<bool> {
        let mut state = self.state()?;
        let before = state.tasks.len();
        state.tasks.retain(|t| t.id != id);
        Ok(state.tasks.len() < before)
    }
}

impl DailyLogStore for MemoryStore {
    fn get_by_date(&self, date: NaiveDate) -> Result<Option<DailyLog>> {
        Ok(self.state()?.logs.iter().find(|l| l.date == date).cloned())
    }

    fn upsert(&self, entry: &DailyLogEntry) -> Result<DailyLog> {
        let mut state = self.state()?;
        if let Some(log) = state.logs.iter_mut().find(|l| l.date == entry.date) {
            log.score = entry.score;
            log.rank = entry.rank;
            log.memo = entry.memo.clone();
            return Ok(log.clone());
        }
        Ok(state.insert_log(entry))
    }

    fn recent_excluding(&self, excluded: NaiveDate, limit: usize) -> Result<Vec<DailyLog>> {
        let mut logs: Vec<DailyLog> = self
            .state()?
            .logs
            .iter()
            .filter(|l| l.date != excluded)
            .cloned()
            .collect();
        logs.sort_by(|a, b| b.date.cmp(&a.date));
        logs.truncate(limit);
        Ok(logs)
    }
}
