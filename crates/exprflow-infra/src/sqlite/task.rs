//! SQLite task store implementation.
//!
//! Implements `TaskStore` / `TaskTransaction` from `exprflow-core`. Every
//! transaction is opened on the single-connection writer pool, so scheduler
//! calls are serialised and a pending task can be claimed by one caller only.

use chrono::Utc;
use exprflow_core::repository::task::{TaskStore, TaskTransaction};
use exprflow_types::error::RepositoryError;
use exprflow_types::expression::{ExpressionId, ExpressionStatus};
use exprflow_types::task::{Operation, Task, TaskId, TaskStatus};
use sqlx::{Row, Sqlite, Transaction};

use super::expression::format_datetime;
use super::pool::DatabasePool;

/// SQLite-backed implementation of `TaskStore`.
#[derive(Clone)]
pub struct SqliteTaskStore {
    pool: DatabasePool,
}

impl SqliteTaskStore {
    /// Create a new store backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain Task.
pub(crate) struct TaskRow {
    id: i64,
    expression_id: i64,
    operation: String,
    arg0: Option<f64>,
    arg1: Option<f64>,
    dep0: Option<i64>,
    dep1: Option<i64>,
    status: String,
    result: Option<f64>,
}

impl TaskRow {
    pub(crate) fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            expression_id: row.try_get("expression_id")?,
            operation: row.try_get("operation")?,
            arg0: row.try_get("arg0")?,
            arg1: row.try_get("arg1")?,
            dep0: row.try_get("dep0")?,
            dep1: row.try_get("dep1")?,
            status: row.try_get("status")?,
            result: row.try_get("result")?,
        })
    }

    pub(crate) fn into_task(self) -> Result<Task, RepositoryError> {
        let operation: Operation = self
            .operation
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        let status: TaskStatus = self
            .status
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(Task {
            id: self.id,
            expression_id: self.expression_id,
            operation,
            args: [self.arg0, self.arg1],
            dependencies: [self.dep0, self.dep1],
            status,
            result: self.result,
        })
    }
}

fn query_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Query(e.to_string())
}

fn map_rows(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<Task>, RepositoryError> {
    rows.iter()
        .map(|row| TaskRow::from_row(row).map_err(query_err)?.into_task())
        .collect()
}

/// An open writer transaction. Dropping it without committing rolls back.
pub struct SqliteTaskTransaction {
    tx: Transaction<'static, Sqlite>,
}

impl TaskStore for SqliteTaskStore {
    type Tx = SqliteTaskTransaction;

    async fn begin(&self) -> Result<SqliteTaskTransaction, RepositoryError> {
        let tx = self.pool.writer.begin().await.map_err(|e| match e {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => RepositoryError::Connection,
            e => query_err(e),
        })?;
        Ok(SqliteTaskTransaction { tx })
    }
}

impl SqliteTaskTransaction {
    async fn touch_expression(
        &mut self,
        expression_id: ExpressionId,
        sql: &str,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(sql)
            .bind(format_datetime(&Utc::now()))
            .bind(expression_id)
            .execute(&mut *self.tx)
            .await
            .map_err(query_err)?;
        Ok(result.rows_affected())
    }
}

impl TaskTransaction for SqliteTaskTransaction {
    async fn pending_tasks(&mut self) -> Result<Vec<Task>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM tasks WHERE status = ? ORDER BY id")
            .bind(TaskStatus::Pending.to_string())
            .fetch_all(&mut *self.tx)
            .await
            .map_err(query_err)?;
        map_rows(&rows)
    }

    async fn get_task(&mut self, id: TaskId) -> Result<Option<Task>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(query_err)?;

        match row {
            Some(row) => Ok(Some(TaskRow::from_row(&row).map_err(query_err)?.into_task()?)),
            None => Ok(None),
        }
    }

    async fn expression_tasks(
        &mut self,
        expression_id: ExpressionId,
    ) -> Result<Vec<Task>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM tasks WHERE expression_id = ? ORDER BY position")
            .bind(expression_id)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(query_err)?;
        map_rows(&rows)
    }

    async fn resolve_operand(
        &mut self,
        id: TaskId,
        slot: usize,
        value: f64,
    ) -> Result<(), RepositoryError> {
        let sql = match slot {
            0 => "UPDATE tasks SET arg0 = ? WHERE id = ?",
            1 => "UPDATE tasks SET arg1 = ? WHERE id = ?",
            _ => return Err(RepositoryError::Query(format!("invalid operand slot {slot}"))),
        };
        let result = sqlx::query(sql)
            .bind(value)
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(query_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn set_task_status(&mut self, id: TaskId, status: TaskStatus) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE tasks SET status = ? WHERE id = ?")
            .bind(status.to_string())
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(query_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn complete_task(&mut self, id: TaskId, result: f64) -> Result<(), RepositoryError> {
        let updated = sqlx::query("UPDATE tasks SET status = ?, result = ? WHERE id = ?")
            .bind(TaskStatus::Completed.to_string())
            .bind(result)
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(query_err)?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete_expression_tasks(
        &mut self,
        expression_id: ExpressionId,
    ) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM tasks WHERE expression_id = ?")
            .bind(expression_id)
            .execute(&mut *self.tx)
            .await
            .map_err(query_err)?;
        Ok(())
    }

    async fn expression_status(
        &mut self,
        expression_id: ExpressionId,
    ) -> Result<Option<ExpressionStatus>, RepositoryError> {
        let status: Option<String> = sqlx::query_scalar("SELECT status FROM expressions WHERE id = ?")
            .bind(expression_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(query_err)?;

        status
            .map(|s| s.parse().map_err(|e: String| RepositoryError::Query(e)))
            .transpose()
    }

    async fn mark_expression_processing(
        &mut self,
        expression_id: ExpressionId,
    ) -> Result<(), RepositoryError> {
        self.touch_expression(
            expression_id,
            "UPDATE expressions SET status = 'processing', updated_at = ?
             WHERE id = ? AND status = 'pending'",
        )
        .await?;
        Ok(())
    }

    async fn complete_expression(
        &mut self,
        expression_id: ExpressionId,
        result: f64,
    ) -> Result<(), RepositoryError> {
        let updated = sqlx::query(
            "UPDATE expressions SET status = 'completed', result = ?, updated_at = ? WHERE id = ?",
        )
        .bind(result)
        .bind(format_datetime(&Utc::now()))
        .bind(expression_id)
        .execute(&mut *self.tx)
        .await
        .map_err(query_err)?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn fail_expression(
        &mut self,
        expression_id: ExpressionId,
        error: &str,
    ) -> Result<(), RepositoryError> {
        let updated = sqlx::query(
            "UPDATE expressions SET status = 'error', error = ?, updated_at = ? WHERE id = ?",
        )
        .bind(error)
        .bind(format_datetime(&Utc::now()))
        .bind(expression_id)
        .execute(&mut *self.tx)
        .await
        .map_err(query_err)?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn commit(self) -> Result<(), RepositoryError> {
        self.tx.commit().await.map_err(query_err)
    }

    async fn rollback(self) -> Result<(), RepositoryError> {
        self.tx.rollback().await.map_err(query_err)
    }
}
