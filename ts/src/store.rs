//! SQLite-backed store for tasks and users
//!
//! Timestamps are persisted as Unix milliseconds so range queries compare
//! integers. Every write path validates the task before touching SQL.

use std::path::Path;

use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::query::{TaskQuery, TimeBound};
use crate::task::{Task, TaskStatus};
use crate::user::User;
use crate::{from_ms, to_ms};

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS users (
    id    TEXT PRIMARY KEY,
    email TEXT NOT NULL,
    name  TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS tasks (
    id            TEXT PRIMARY KEY,
    title         TEXT NOT NULL,
    description   TEXT NOT NULL DEFAULT '',
    deadline      INTEGER NOT NULL,
    reminder_time INTEGER NOT NULL,
    status        TEXT NOT NULL,
    priority      TEXT NOT NULL,
    category      TEXT NOT NULL DEFAULT '',
    created_at    INTEGER NOT NULL,
    owner         TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_tasks_status_reminder ON tasks(status, reminder_time);
CREATE INDEX IF NOT EXISTS idx_tasks_status_deadline ON tasks(status, deadline);
CREATE INDEX IF NOT EXISTS idx_tasks_status_created ON tasks(status, created_at);
";

const TASK_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    deadline,
    reminder_time,
    status,
    priority,
    category,
    created_at,
    owner
FROM tasks";

/// Task and user persistence
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (or create) a store at the given database path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        debug!(path = %path.as_ref().display(), "Store::open: called");
        let conn = Connection::open(path.as_ref())?;
        let store = Self::bootstrap(conn)?;
        info!(path = %path.as_ref().display(), "Opened task store");
        Ok(store)
    }

    /// Open a private in-memory store
    pub fn open_in_memory() -> StoreResult<Self> {
        debug!("Store::open_in_memory: called");
        Self::bootstrap(Connection::open_in_memory()?)
    }

    fn bootstrap(conn: Connection) -> StoreResult<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn })
    }

    // === Users ===

    /// Insert a user
    pub fn insert_user(&self, user: &User) -> StoreResult<()> {
        debug!(user_id = %user.id, "Store::insert_user: called");
        self.conn.execute(
            "INSERT INTO users (id, email, name) VALUES (?1, ?2, ?3);",
            params![user.id, user.email, user.name],
        )?;
        Ok(())
    }

    /// Get a user by ID
    pub fn get_user(&self, id: &str) -> StoreResult<Option<User>> {
        debug!(%id, "Store::get_user: called");
        let user = self
            .conn
            .query_row("SELECT id, email, name FROM users WHERE id = ?1;", params![id], |row| {
                Ok(User {
                    id: row.get(0)?,
                    email: row.get(1)?,
                    name: row.get(2)?,
                })
            })
            .optional()?;
        Ok(user)
    }

    /// Resolve the email address of a task's owner
    pub fn owner_email(&self, task: &Task) -> StoreResult<String> {
        debug!(task_id = %task.id, owner = %task.owner, "Store::owner_email: called");
        self.conn
            .query_row("SELECT email FROM users WHERE id = ?1;", params![task.owner], |row| {
                row.get::<_, String>(0)
            })
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("user {}", task.owner)))
    }

    // === Tasks ===

    /// Insert a task after validating it
    pub fn insert_task(&self, task: &Task) -> StoreResult<()> {
        debug!(task_id = %task.id, "Store::insert_task: called");
        task.validate()?;
        self.conn.execute(
            "INSERT INTO tasks (
                id, title, description, deadline, reminder_time,
                status, priority, category, created_at, owner
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                task.id,
                task.title,
                task.description,
                to_ms(task.deadline),
                to_ms(task.reminder_time),
                task.status.to_string(),
                task.priority.to_string(),
                task.category,
                to_ms(task.created_at),
                task.owner,
            ],
        )?;
        Ok(())
    }

    /// Update a task's mutable fields; `created_at` and `owner` never change
    pub fn update_task(&self, task: &Task) -> StoreResult<()> {
        debug!(task_id = %task.id, "Store::update_task: called");
        task.validate()?;
        let changed = self.conn.execute(
            "UPDATE tasks
             SET title = ?1,
                 description = ?2,
                 deadline = ?3,
                 reminder_time = ?4,
                 status = ?5,
                 priority = ?6,
                 category = ?7
             WHERE id = ?8;",
            params![
                task.title,
                task.description,
                to_ms(task.deadline),
                to_ms(task.reminder_time),
                task.status.to_string(),
                task.priority.to_string(),
                task.category,
                task.id,
            ],
        )?;

        if changed == 0 {
            debug!(task_id = %task.id, "Store::update_task: no such task");
            return Err(StoreError::NotFound(format!("task {}", task.id)));
        }
        Ok(())
    }

    /// Set a task's status
    pub fn set_status(&self, id: &str, status: TaskStatus) -> StoreResult<()> {
        debug!(%id, %status, "Store::set_status: called");
        let changed = self.conn.execute(
            "UPDATE tasks SET status = ?1 WHERE id = ?2;",
            params![status.to_string(), id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("task {}", id)));
        }
        Ok(())
    }

    /// Flip a task between Active and Completed, returning the new status
    pub fn toggle_status(&self, id: &str) -> StoreResult<TaskStatus> {
        debug!(%id, "Store::toggle_status: called");
        let task = self
            .get_task(id)?
            .ok_or_else(|| StoreError::NotFound(format!("task {}", id)))?;
        let status = task.status.toggled();
        self.set_status(id, status)?;
        Ok(status)
    }

    /// Delete a task
    pub fn delete_task(&self, id: &str) -> StoreResult<()> {
        debug!(%id, "Store::delete_task: called");
        let changed = self.conn.execute("DELETE FROM tasks WHERE id = ?1;", params![id])?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("task {}", id)));
        }
        Ok(())
    }

    /// Get a task by ID
    pub fn get_task(&self, id: &str) -> StoreResult<Option<Task>> {
        debug!(%id, "Store::get_task: called");
        let mut stmt = self.conn.prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query(params![id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_task_row(row)?)),
            None => Ok(None),
        }
    }

    /// Find tasks by status and an optional range over one time field
    pub fn find_tasks(&self, query: &TaskQuery) -> StoreResult<Vec<Task>> {
        debug!(?query, "Store::find_tasks: called");
        let column = query.field.column();
        let mut sql = format!("{TASK_SELECT_SQL} WHERE status = ?");
        let mut bind_values: Vec<Value> = vec![Value::Text(query.status.to_string())];

        if let Some(TimeBound { at, inclusive }) = query.lower {
            let op = if inclusive { ">=" } else { ">" };
            sql.push_str(&format!(" AND {column} {op} ?"));
            bind_values.push(Value::Integer(to_ms(at)));
        }

        if let Some(TimeBound { at, inclusive }) = query.upper {
            let op = if inclusive { "<=" } else { "<" };
            sql.push_str(&format!(" AND {column} {op} ?"));
            bind_values.push(Value::Integer(to_ms(at)));
        }

        sql.push_str(&format!(" ORDER BY {column} ASC;"));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }

        debug!(count = tasks.len(), "Store::find_tasks: returning");
        Ok(tasks)
    }
}

fn parse_task_row(row: &Row<'_>) -> StoreResult<Task> {
    let id: String = row.get(0)?;
    let status: String = row.get(5)?;
    let priority: String = row.get(6)?;

    let timestamp = |idx: usize, name: &str| -> StoreResult<_> {
        let ms: i64 = row.get(idx)?;
        from_ms(ms).ok_or_else(|| StoreError::InvalidData(format!("task {id}: {name} out of range: {ms}")))
    };

    Ok(Task {
        title: row.get(1)?,
        description: row.get(2)?,
        deadline: timestamp(3, "deadline")?,
        reminder_time: timestamp(4, "reminder_time")?,
        status: status
            .parse()
            .map_err(|e: String| StoreError::InvalidData(format!("task {id}: {e}")))?,
        priority: priority
            .parse()
            .map_err(|e: String| StoreError::InvalidData(format!("task {id}: {e}")))?,
        category: row.get(7)?,
        created_at: timestamp(8, "created_at")?,
        owner: row.get(9)?,
        id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskValidationError;
    use crate::query::TimeField;
    use crate::task::Priority;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 9, 0, 0).unwrap()
    }

    fn seeded() -> Store {
        let store = Store::open_in_memory().unwrap();
        store.insert_user(&User::with_id("u1", "ada@example.com", "Ada")).unwrap();
        store
    }

    fn task(id: &str, reminder_offset_min: i64, deadline_offset_min: i64, created_offset_hours: i64) -> Task {
        Task::with_id(
            id,
            "u1",
            format!("Task {id}"),
            now() + Duration::minutes(deadline_offset_min),
            now() + Duration::minutes(reminder_offset_min),
            now() + Duration::hours(created_offset_hours),
        )
    }

    #[test]
    fn test_insert_and_get_roundtrip() {
        let store = seeded();
        let t = task("t1", 10, 30, -1)
            .with_description("quarterly numbers")
            .with_category("work")
            .with_priority(Priority::High);
        store.insert_task(&t).unwrap();

        let loaded = store.get_task("t1").unwrap().unwrap();
        assert_eq!(loaded, t);
        assert!(store.get_task("missing").unwrap().is_none());
    }

    #[test]
    fn test_insert_rejects_invalid_task() {
        let store = seeded();
        let bad = task("t1", 30, 10, -1);
        let err = store.insert_task(&bad).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(TaskValidationError::ReminderNotBeforeDeadline)
        ));
    }

    #[test]
    fn test_insert_requires_existing_owner() {
        let store = Store::open_in_memory().unwrap();
        assert!(matches!(store.insert_task(&task("t1", 10, 30, -1)), Err(StoreError::Sqlite(_))));
    }

    #[test]
    fn test_owner_email() {
        let store = seeded();
        let t = task("t1", 10, 30, -1);
        store.insert_task(&t).unwrap();
        assert_eq!(store.owner_email(&t).unwrap(), "ada@example.com");

        let mut orphan = t.clone();
        orphan.owner = "ghost".to_string();
        assert!(matches!(store.owner_email(&orphan), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_toggle_and_delete() {
        let store = seeded();
        store.insert_task(&task("t1", 10, 30, -1)).unwrap();

        assert_eq!(store.toggle_status("t1").unwrap(), TaskStatus::Completed);
        assert_eq!(store.get_task("t1").unwrap().unwrap().status, TaskStatus::Completed);
        assert_eq!(store.toggle_status("t1").unwrap(), TaskStatus::Active);

        store.delete_task("t1").unwrap();
        assert!(store.get_task("t1").unwrap().is_none());
        assert!(matches!(store.delete_task("t1"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_update_task() {
        let store = seeded();
        let mut t = task("t1", 10, 30, -1);
        store.insert_task(&t).unwrap();

        t.title = "Renamed".to_string();
        t.deadline = now() + Duration::hours(5);
        store.update_task(&t).unwrap();
        assert_eq!(store.get_task("t1").unwrap().unwrap().title, "Renamed");

        let missing = task("nope", 10, 30, -1);
        assert!(matches!(store.update_task(&missing), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_find_closed_reminder_window() {
        let store = seeded();
        store.insert_task(&task("at-now", 0, 30, -1)).unwrap();
        store.insert_task(&task("at-end", 60, 90, -1)).unwrap();
        store.insert_task(&task("past", -1, 30, -1)).unwrap();
        store.insert_task(&task("later", 61, 90, -1)).unwrap();

        let query = TaskQuery::new(TaskStatus::Active, TimeField::ReminderTime)
            .from(TimeBound::inclusive(now()))
            .until(TimeBound::inclusive(now() + Duration::hours(1)));
        let ids: Vec<_> = store.find_tasks(&query).unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["at-now", "at-end"]);
    }

    #[test]
    fn test_find_filters_status_and_strict_upper() {
        let store = seeded();
        store.insert_task(&task("overdue", -120, -60, -30)).unwrap();
        store.insert_task(&task("due-now", -30, 0, -30)).unwrap();
        store
            .insert_task(&task("done", -120, -60, -30).with_status(TaskStatus::Completed))
            .unwrap();

        let query = TaskQuery::new(TaskStatus::Active, TimeField::Deadline).until(TimeBound::exclusive(now()));
        let ids: Vec<_> = store.find_tasks(&query).unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["overdue"]);
    }

    #[test]
    fn test_find_matches_in_memory_predicate() {
        let store = seeded();
        let tasks = vec![
            task("a", -90, -30, -48),
            task("b", 5, 45, -2),
            task("c", 200, 400, -25),
            task("d", -10, 20, -24),
        ];
        for t in &tasks {
            store.insert_task(t).unwrap();
        }

        let query = TaskQuery::new(TaskStatus::Active, TimeField::CreatedAt)
            .until(TimeBound::exclusive(now() - Duration::hours(24)));
        let mut from_sql: Vec<_> = store.find_tasks(&query).unwrap().into_iter().map(|t| t.id).collect();
        let mut from_mem: Vec<_> = tasks.iter().filter(|t| query.matches(t)).map(|t| t.id.clone()).collect();
        from_sql.sort();
        from_mem.sort();
        assert_eq!(from_sql, from_mem);
        assert_eq!(from_sql, vec!["a", "c"]);
    }

    #[test]
    fn test_open_on_disk_persists() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tasks.db");

        {
            let store = Store::open(&path).unwrap();
            store.insert_user(&User::with_id("u1", "ada@example.com", "Ada")).unwrap();
            store.insert_task(&task("t1", 10, 30, -1)).unwrap();
        }

        let reopened = Store::open(&path).unwrap();
        assert!(reopened.get_task("t1").unwrap().is_some());
        assert_eq!(reopened.get_user("u1").unwrap().unwrap().email, "ada@example.com");
    }
}
