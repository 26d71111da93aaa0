use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Context, Result};
use chrono::{Local, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use super::{DailyLogStore, TaskStore};
use crate::model::{DailyLog, DailyLogEntry, NewTask, Task, TaskUpdate};

const TASK_COLUMNS: &str = "id, title, created_at, due_date, priority, progress";
const LOG_COLUMNS: &str = "id, date, score, rank, memo";

/// SQLite backed store for both tasks and daily logs. The connection is
/// shared behind a mutex, so operations run one at a time.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the database file and make sure the schema exists.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {}.", path.display()))?;
        debug!(path = %path.display(), "opened sqlite database");
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database.")?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        init_schema(&conn)?;
        Ok(Database {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("Database connection lock is poisoned."))
    }
}

/// Create the tables if they are missing.
pub fn init_schema(db: &Connection) -> Result<()> {
    db.execute(
        "CREATE TABLE IF NOT EXISTS tasks (
                  id          INTEGER PRIMARY KEY AUTOINCREMENT,
                  title       TEXT NOT NULL,
                  created_at  TEXT NOT NULL,
                  due_date    TEXT,
                  priority    INTEGER NOT NULL DEFAULT 3,
                  progress    INTEGER NOT NULL DEFAULT 0
                  )",
        [],
    )
    .context("Failed to create tasks table.")?;

    db.execute(
        "CREATE TABLE IF NOT EXISTS daily_logs (
                  id     INTEGER PRIMARY KEY AUTOINCREMENT,
                  date   TEXT NOT NULL UNIQUE,
                  score  INTEGER,
                  rank   TEXT,
                  memo   TEXT
                  )",
        [],
    )
    .context("Failed to create daily_logs table.")?;

    Ok(())
}

/// Return a task from a row in this order: [id, title, created_at,
/// due_date, priority, progress]
fn task_from_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        created_at: row.get(2)?,
        due_date: row.get(3)?,
        priority: row.get(4)?,
        progress: row.get(5)?,
    })
}

/// Return a log from a row in this order: [id, date, score, rank, memo]
fn log_from_row(row: &Row) -> rusqlite::Result<DailyLog> {
    Ok(DailyLog {
        id: row.get(0)?,
        date: row.get(1)?,
        score: row.get(2)?,
        rank: row.get(3)?,
        memo: row.get(4)?,
    })
}

fn get_task(db: &Connection, id: i64) -> Result<Option<Task>> {
    db.query_row(
        &format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS),
        params![id],
        task_from_row,
    )
    .optional()
    .with_context(|| format!("Failed to get task {} from database.", id))
}

fn get_log(db: &Connection, date: NaiveDate) -> Result<Option<DailyLog>> {
    db.query_row(
        &format!("SELECT {} FROM daily_logs WHERE date = ?1", LOG_COLUMNS),
        params![date],
        log_from_row,
    )
    .optional()
    .with_context(|| format!("Failed to get daily log for {} from database.", date))
}

impl TaskStore for Database {
    fn create(&self, task: &NewTask) -> Result<Task> {
        let db = self.conn()?;
        db.execute(
            "INSERT INTO tasks (title, created_at, due_date, priority, progress)
             VALUES (?1, ?2, ?3, ?4, 0)",
            params![task.title, Local::now(), task.due_date, task.priority],
        )
        .context("Failed to insert task to database.")?;
        let id = db.last_insert_rowid();
        get_task(&db, id)?.ok_or_else(|| anyhow!("Task {} vanished after insert.", id))
    }

    fn list(&self) -> Result<Vec<Task>> {
        let db = self.conn()?;
        let mut stmt = db
            .prepare(&format!(
                "SELECT {} FROM tasks
                 ORDER BY due_date IS NULL, due_date ASC, priority ASC, id ASC",
                TASK_COLUMNS
            ))
            .context("Failed to fetch tasks from database.")?;
        let mapped_rows = stmt
            .query_map([], task_from_row)
            .context("Failed to fetch tasks from database.")?;

        let mut tasks = Vec::new();
        for task in mapped_rows {
            tasks.push(task?);
        }
        Ok(tasks)
    }

    fn get(&self, id: i64) -> Result<Option<Task>> {
        get_task(&*self.conn()?, id)
    }

    fn update(&self, id: i64, update: &TaskUpdate) -> Result<Option<Task>> {
        let db = self.conn()?;
        let changed = db
            .execute(
                "UPDATE tasks SET due_date = ?1, priority = ?2, progress = ?3 WHERE id = ?4",
                params![update.due_date, update.priority, update.progress, id],
            )
            .with_context(|| format!("Failed to update task {} in database.", id))?;
        if changed == 0 {
            return Ok(None);
        }
        get_task(&db, id)
    }

    fn delete(&self, id: i64) -> Result<bool> {
        let changed = self
            .conn()?
            .execute("DELETE FROM tasks WHERE id = ?1", params![id])
            .with_context(|| format!("Failed to remove task {} from database.", id))?;
        Ok(changed > 0)
    }
}

impl DailyLogStore for Database {
    fn get_by_date(&self, date: NaiveDate) -> Result<Option<DailyLog>> {
        get_log(&*self.conn()?, date)
    }

    fn upsert(&self, entry: &DailyLogEntry) -> Result<DailyLog> {
        let db = self.conn()?;
        db.execute(
            "INSERT INTO daily_logs (date, score, rank, memo) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(date) DO UPDATE
             SET score = excluded.score, rank = excluded.rank, memo = excluded.memo",
            params![entry.date, entry.score, entry.rank, entry.memo],
        )
        .context("Failed to write daily log to database.")?;
        get_log(&db, entry.date)?
            .ok_or_else(|| anyhow!("Daily log for {} vanished after write.", entry.date))
    }

    fn recent_excluding(&self, excluded: NaiveDate, limit: usize) -> Result<Vec<DailyLog>> {
        let db = self.conn()?;
        let mut stmt = db
            .prepare(&format!(
                "SELECT {} FROM daily_logs WHERE date != ?1 ORDER BY date DESC LIMIT ?2",
                LOG_COLUMNS
            ))
            .context("Failed to fetch daily logs from database.")?;
        let mapped_rows = stmt
            .query_map(params![excluded, limit as i64], log_from_row)
            .context("Failed to fetch daily logs from database.")?;

        let mut logs = Vec::new();
        for log in mapped_rows {
            logs.push(log?);
        }
        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::conformance;
    use tempfile::TempDir;

    fn store() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn task_conformance() {
        conformance::create_assigns_ids_and_zero_progress(&store());
        conformance::list_orders_by_due_date_then_priority(&store());
        conformance::update_overwrites_mutable_fields(&store());
        conformance::update_missing_task_is_none(&store());
        conformance::delete_twice(&store());
    }

    #[test]
    fn log_conformance() {
        conformance::one_log_per_date(&store());
        conformance::upsert_overwrites_in_place(&store());
        conformance::recent_excludes_day_and_limits(&store());
    }

    #[test]
    fn schema_rejects_a_second_log_for_a_date() {
        let db = store();
        let conn = db.conn().unwrap();
        conn.execute("INSERT INTO daily_logs (date) VALUES ('2025-01-15')", [])
            .unwrap();
        let err = conn
            .execute("INSERT INTO daily_logs (date) VALUES ('2025-01-15')", [])
            .unwrap_err();
        assert_eq!(
            err.sqlite_error_code(),
            Some(rusqlite::ErrorCode::ConstraintViolation)
        );
    }

    #[test]
    fn data_survives_reopening() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tally.db");

        let id = {
            let db = Database::open(&path).unwrap();
            TaskStore::create(
                &db,
                &NewTask {
                    title: "persist me".to_string(),
                    due_date: NaiveDate::from_ymd_opt(2025, 1, 15),
                    priority: 2,
                },
            )
            .unwrap()
            .id
        };

        let db = Database::open(&path).unwrap();
        let task = TaskStore::get(&db, id).unwrap().unwrap();
        assert_eq!(task.title, "persist me");
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2025, 1, 15));
        assert_eq!(task.priority, 2);
    }
}
