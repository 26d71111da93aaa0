//! Storage of tasks and daily logs.
//!
//! Handlers only see the [`TaskStore`] and [`DailyLogStore`] traits, so the
//! backend can be swapped without touching them. Two backends exist: SQLite
//! (`sqlite`) and a plain in-memory one (`memory`).

use std::cmp::Ordering;

use anyhow::Result;
use chrono::NaiveDate;

use crate::model::{DailyLog, DailyLogEntry, NewTask, Task, TaskUpdate};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::Database;

/// How many previous daily logs the report shows.
pub const RECENT_LOGS_LIMIT: usize = 30;

pub trait TaskStore: Send + Sync {
    /// Insert a task and return it with its id and creation time.
    fn create(&self, task: &NewTask) -> Result<Task>;

    /// All tasks, by due date (undated last), then priority.
    fn list(&self) -> Result<Vec<Task>>;

    fn get(&self, id: i64) -> Result<Option<Task>>;

    /// Overwrite the mutable fields. `None` if there is no such task.
    fn update(&self, id: i64, update: &TaskUpdate) -> Result<Option<Task>>;

    /// Remove a task. `false` if there was no such task.
    fn delete(&self, id: i64) -> Result<bool>;
}

pub trait DailyLogStore: Send + Sync {
    fn get_by_date(&self, date: NaiveDate) -> Result<Option<DailyLog>>;

    /// Insert the log for the entry's date, or overwrite the existing one.
    /// A date never gets a second log.
    fn upsert(&self, entry: &DailyLogEntry) -> Result<DailyLog>;

    /// Up to `limit` logs, newest first, leaving out `excluded`.
    fn recent_excluding(&self, excluded: NaiveDate, limit: usize) -> Result<Vec<DailyLog>>;
}

/// The order tasks are listed in. Mirrors the `ORDER BY` of the SQLite store.
pub(crate) fn list_order(a: &Task, b: &Task) -> Ordering {
    let by_due = match (a.due_date, b.due_date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_due
        .then(a.priority.cmp(&b.priority))
        .then(a.id.cmp(&b.id))
}

/// Behavior every backend must share. Each backend's test module runs these
/// against a fresh store.
#[cfg(test)]
pub(crate) mod conformance {
    use super::*;
    use crate::model::{Rank, DEFAULT_PRIORITY, DEFAULT_PROGRESS};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn new_task(title: &str, due: Option<&str>, priority: i64) -> NewTask {
        NewTask {
            title: title.to_string(),
            due_date: due.map(date),
            priority,
        }
    }

    pub fn create_assigns_ids_and_zero_progress(store: &dyn TaskStore) {
        let a = store.create(&new_task("write report", None, 2)).unwrap();
        let b = store.create(&new_task("water plants", None, 3)).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.progress, DEFAULT_PROGRESS);
        assert_eq!(store.get(a.id).unwrap().unwrap().title, "write report");
        assert_eq!(store.list().unwrap().len(), 2);
    }

    pub fn list_orders_by_due_date_then_priority(store: &dyn TaskStore) {
        let undated = store.create(&new_task("someday", None, 1)).unwrap();
        let late = store.create(&new_task("late", Some("2025-02-01"), 1)).unwrap();
        let relaxed = store
            .create(&new_task("relaxed", Some("2025-01-15"), 4))
            .unwrap();
        let urgent = store
            .create(&new_task("urgent", Some("2025-01-15"), 2))
            .unwrap();

        let ids: Vec<i64> = store.list().unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![urgent.id, relaxed.id, late.id, undated.id]);
    }

    pub fn update_overwrites_mutable_fields(store: &dyn TaskStore) {
        let task = store
            .create(&new_task("read", Some("2025-01-15"), 1))
            .unwrap();
        let updated = store
            .update(
                task.id,
                &TaskUpdate {
                    due_date: None,
                    priority: DEFAULT_PRIORITY,
                    progress: 60,
                },
            )
            .unwrap()
            .unwrap();

        assert_eq!(updated.title, "read");
        assert_eq!(updated.due_date, None);
        assert_eq!(updated.priority, DEFAULT_PRIORITY);
        assert_eq!(updated.progress, 60);
        assert_eq!(store.get(task.id).unwrap().unwrap(), updated);
    }

    pub fn update_missing_task_is_none(store: &dyn TaskStore) {
        store.create(&new_task("only", None, 3)).unwrap();
        let before = store.list().unwrap();
        let update = TaskUpdate {
            due_date: None,
            priority: 1,
            progress: 100,
        };
        assert!(store.update(9999, &update).unwrap().is_none());
        assert_eq!(store.list().unwrap(), before);
    }

    pub fn delete_twice(store: &dyn TaskStore) {
        let task = store.create(&new_task("gone", None, 3)).unwrap();
        store.create(&new_task("stays", None, 3)).unwrap();
        assert!(store.delete(task.id).unwrap());
        assert!(!store.delete(task.id).unwrap());
        assert_eq!(store.list().unwrap().len(), 1);
        assert!(store.get(task.id).unwrap().is_none());
    }

    fn entry(day: &str, score: i64, memo: Option<&str>) -> DailyLogEntry {
        DailyLogEntry {
            date: date(day),
            score: Some(score),
            rank: Some(crate::scoring::rank_for(score)),
            memo: memo.map(str::to_string),
        }
    }

    pub fn one_log_per_date(store: &dyn DailyLogStore) {
        store.upsert(&entry("2025-01-14", 50, None)).unwrap();
        store.upsert(&entry("2025-01-15", 90, None)).unwrap();
        store.upsert(&entry("2025-01-15", 250, None)).unwrap();

        let log = store.get_by_date(date("2025-01-15")).unwrap().unwrap();
        assert_eq!(log.score, Some(250));
        assert_eq!(log.rank, Some(Rank::B));

        let all = store.recent_excluding(date("2000-01-01"), 30).unwrap();
        let dates: Vec<NaiveDate> = all.iter().map(|l| l.date).collect();
        assert_eq!(dates, vec![date("2025-01-15"), date("2025-01-14")]);
    }

    pub fn upsert_overwrites_in_place(store: &dyn DailyLogStore) {
        let first = store.upsert(&entry("2025-01-15", 100, None)).unwrap();
        let second = store
            .upsert(&entry("2025-01-15", 300, Some("good day")))
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.rank, Some(Rank::A));
        assert_eq!(second.memo.as_deref(), Some("good day"));
        assert_eq!(
            store.recent_excluding(date("2000-01-01"), 30).unwrap().len(),
            1
        );
    }

    pub fn recent_excludes_day_and_limits(store: &dyn DailyLogStore) {
        let start = date("2025-01-01");
        for offset in 0..40 {
            let day = start + chrono::Duration::days(offset);
            store
                .upsert(&DailyLogEntry {
                    date: day,
                    score: Some(offset),
                    rank: None,
                    memo: None,
                })
                .unwrap();
        }
        let today = date("2025-02-09");
        let recent = store.recent_excluding(today, RECENT_LOGS_LIMIT).unwrap();

        assert_eq!(recent.len(), RECENT_LOGS_LIMIT);
        assert!(recent.iter().all(|l| l.date != today));
        assert_eq!(recent[0].date, date("2025-02-08"));
        assert!(recent.windows(2).all(|w| w[0].date > w[1].date));
    }
}
