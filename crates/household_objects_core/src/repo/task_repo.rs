//! Task queue repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Enqueue experiment tasks and report their lifecycle.
//! - Hand out each queued task to exactly one worker.
//!
//! # Invariants
//! - Claiming runs inside an `IMMEDIATE` transaction, so claims from separate
//!   connections are serialized by the database write lock.
//! - The claim update is guarded by `task_status = 'TO_RUN'`.
//! - Tasks are claimed oldest first: `created_at ASC, task_id ASC`.
//! - Only the claiming worker can finish a running task.

use super::{ensure_schema_ready, RepoError, RepoResult};
use crate::model::task::{Task, TaskOutcome, TaskStatus};
use crate::model::{require_non_empty, RecordId};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, TransactionBehavior};

const TASK_SELECT_SQL: &str = "SELECT
    task_id,
    task_type,
    task_status,
    task_outcome_name,
    task_outcome_description,
    task_worker,
    created_at,
    started_at,
    finished_at
FROM task";

const NOW_MS_SQL: &str = "(CAST(strftime('%s', 'now') AS INTEGER) * 1000)";

/// Repository interface for the experiment task queue.
pub trait TaskRepository {
    fn enqueue_task(&self, task_type: &str) -> RepoResult<RecordId>;
    fn get_task(&self, id: RecordId) -> RepoResult<Option<Task>>;
    /// Lists tasks in claim order, optionally filtered by status.
    fn list_tasks(&self, status: Option<TaskStatus>) -> RepoResult<Vec<Task>>;
    /// Claims the next `TO_RUN` task for `worker` and marks it `RUNNING`.
    fn acquire_next_task(&mut self, worker: &str) -> RepoResult<Option<Task>>;
    /// Records the final outcome of a task claimed by `worker`.
    fn finish_task(&self, id: RecordId, worker: &str, outcome: &TaskOutcome) -> RepoResult<Task>;
    /// Returns a `RUNNING` task to the queue, e.g. after its worker died.
    fn requeue_task(&self, id: RecordId) -> RepoResult<()>;
}

/// SQLite-backed task queue repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }

    fn require_task(&self, id: RecordId) -> RepoResult<Task> {
        self.get_task(id)?
            .ok_or(RepoError::NotFound { entity: "task", id })
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn enqueue_task(&self, task_type: &str) -> RepoResult<RecordId> {
        require_non_empty("task_type", task_type)?;
        self.conn.execute(
            "INSERT INTO task (task_type, task_status) VALUES (?1, ?2);",
            params![task_type.trim(), TaskStatus::ToRun.as_db_str()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_task(&self, id: RecordId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE task_id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }
        Ok(None)
    }

    fn list_tasks(&self, status: Option<TaskStatus>) -> RepoResult<Vec<Task>> {
        let mut sql = format!("{TASK_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();
        if let Some(status) = status {
            sql.push_str(" AND task_status = ?");
            bind_values.push(Value::Text(status.as_db_str().to_string()));
        }
        sql.push_str(" ORDER BY created_at ASC, task_id ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }

    fn acquire_next_task(&mut self, worker: &str) -> RepoResult<Option<Task>> {
        require_non_empty("worker", worker)?;
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let next_id: Option<RecordId> = tx
            .query_row(
                "SELECT task_id
                 FROM task
                 WHERE task_status = 'TO_RUN'
                 ORDER BY created_at ASC, task_id ASC
                 LIMIT 1;",
                [],
                |row| row.get(0),
            )
            .optional()?;
        let Some(task_id) = next_id else {
            return Ok(None);
        };

        let changed = tx.execute(
            &format!(
                "UPDATE task
                 SET
                    task_status = 'RUNNING',
                    task_worker = ?2,
                    started_at = {NOW_MS_SQL}
                 WHERE task_id = ?1
                   AND task_status = 'TO_RUN';"
            ),
            params![task_id, worker],
        )?;
        if changed != 1 {
            return Err(RepoError::InvalidState(format!(
                "task {task_id} changed state while being claimed"
            )));
        }

        let task = {
            let mut stmt = tx.prepare(&format!("{TASK_SELECT_SQL} WHERE task_id = ?1;"))?;
            let mut rows = stmt.query([task_id])?;
            match rows.next()? {
                Some(row) => parse_task_row(row)?,
                None => return Err(RepoError::NotFound { entity: "task", id: task_id }),
            }
        };
        tx.commit()?;
        Ok(Some(task))
    }

    fn finish_task(&self, id: RecordId, worker: &str, outcome: &TaskOutcome) -> RepoResult<Task> {
        outcome.validate()?;
        if !outcome.status.is_finished() {
            return Err(RepoError::InvalidState(format!(
                "outcome status must be COMPLETED or ERROR, got {}",
                outcome.status.as_db_str()
            )));
        }

        let changed = self.conn.execute(
            &format!(
                "UPDATE task
                 SET
                    task_status = ?3,
                    task_outcome_name = ?4,
                    task_outcome_description = ?5,
                    finished_at = {NOW_MS_SQL}
                 WHERE task_id = ?1
                   AND task_worker = ?2
                   AND task_status = 'RUNNING';"
            ),
            params![
                id,
                worker,
                outcome.status.as_db_str(),
                outcome.name.trim(),
                outcome.description.as_deref(),
            ],
        )?;
        if changed == 0 {
            let task = self.require_task(id)?;
            return Err(RepoError::InvalidState(format!(
                "task {id} is {} and owned by {:?}; `{worker}` cannot finish it",
                task.status.as_db_str(),
                task.worker
            )));
        }

        self.require_task(id)
    }

    fn requeue_task(&self, id: RecordId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE task
             SET
                task_status = 'TO_RUN',
                task_worker = NULL,
                started_at = NULL
             WHERE task_id = ?1
               AND task_status = 'RUNNING';",
            [id],
        )?;
        if changed == 0 {
            let task = self.require_task(id)?;
            return Err(RepoError::InvalidState(format!(
                "task {id} is {}; only RUNNING tasks can be requeued",
                task.status.as_db_str()
            )));
        }
        Ok(())
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let status_text: String = row.get("task_status")?;
    let status = TaskStatus::from_db_str(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid task status `{status_text}` in task.task_status"))
    })?;

    Ok(Task {
        id: row.get("task_id")?,
        task_type: row.get("task_type")?,
        status,
        outcome_name: row.get("task_outcome_name")?,
        outcome_description: row.get("task_outcome_description")?,
        worker: row.get("task_worker")?,
        created_at: row.get("created_at")?,
        started_at: row.get("started_at")?,
        finished_at: row.get("finished_at")?,
    })
}
