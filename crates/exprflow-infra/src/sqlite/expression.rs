//! SQLite expression repository implementation.
//!
//! Implements `ExpressionRepository` from `exprflow-core` using sqlx with split read/write pools.

use chrono::{DateTime, Utc};
use exprflow_core::compiler::TaskGraph;
use exprflow_core::repository::expression::ExpressionRepository;
use exprflow_types::error::RepositoryError;
use exprflow_types::expression::{Expression, ExpressionId, ExpressionStatus, UserId};
use exprflow_types::task::{Task, TaskId, TaskStatus};
use sqlx::Row;

use super::pool::DatabasePool;
use super::task::TaskRow;

/// SQLite-backed implementation of `ExpressionRepository`.
pub struct SqliteExpressionRepository {
    pool: DatabasePool,
}

impl SqliteExpressionRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain Expression.
struct ExpressionRow {
    id: i64,
    user_id: i64,
    expression_string: String,
    status: String,
    result: Option<f64>,
    error: String,
    created_at: String,
    updated_at: String,
}

impl ExpressionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            expression_string: row.try_get("expression_string")?,
            status: row.try_get("status")?,
            result: row.try_get("result")?,
            error: row.try_get("error")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_expression(self) -> Result<Expression, RepositoryError> {
        let status: ExpressionStatus = self
            .status
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(Expression {
            id: self.id,
            user_id: self.user_id,
            expression: self.expression_string,
            status,
            result: self.result,
            error: self.error,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn query_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Query(e.to_string())
}

impl ExpressionRepository for SqliteExpressionRepository {
    async fn create(
        &self,
        user_id: UserId,
        expression: &str,
        graph: &TaskGraph,
    ) -> Result<Expression, RepositoryError> {
        let now = Utc::now();
        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;

        let inserted = sqlx::query(
            "INSERT INTO expressions (user_id, expression_string, status, error, created_at, updated_at)
             VALUES (?, ?, ?, '', ?, ?)",
        )
        .bind(user_id)
        .bind(expression)
        .bind(ExpressionStatus::Pending.to_string())
        .bind(format_datetime(&now))
        .bind(format_datetime(&now))
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.message().contains("FOREIGN KEY") => {
                RepositoryError::Conflict(format!("user {user_id} does not exist"))
            }
            e => query_err(e),
        })?;
        let expression_id: ExpressionId = inserted.last_insert_rowid();

        // Arena index i becomes ids[i]; dependencies always point backwards.
        let mut ids: Vec<TaskId> = Vec::with_capacity(graph.len());
        for (position, compiled) in graph.tasks().iter().enumerate() {
            let [dep0, dep1] = compiled.dependencies.map(|dep| dep.map(|index| ids[index]));
            let row = sqlx::query(
                "INSERT INTO tasks (expression_id, position, operation, arg0, arg1, dep0, dep1, status)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(expression_id)
            .bind(position as i64)
            .bind(compiled.operation.symbol())
            .bind(compiled.args[0])
            .bind(compiled.args[1])
            .bind(dep0)
            .bind(dep1)
            .bind(TaskStatus::Pending.to_string())
            .execute(&mut *tx)
            .await
            .map_err(query_err)?;
            ids.push(row.last_insert_rowid());
        }

        tx.commit().await.map_err(query_err)?;

        Ok(Expression {
            id: expression_id,
            user_id,
            expression: expression.to_string(),
            status: ExpressionStatus::Pending,
            result: None,
            error: String::new(),
            created_at: now,
            updated_at: now,
        })
    }

    async fn get(
        &self,
        id: ExpressionId,
        user_id: UserId,
    ) -> Result<Option<Expression>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM expressions WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;

        match row {
            Some(row) => {
                let expr_row = ExpressionRow::from_row(&row).map_err(query_err)?;
                Ok(Some(expr_row.into_expression()?))
            }
            None => Ok(None),
        }
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Expression>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM expressions WHERE user_id = ? ORDER BY id DESC")
            .bind(user_id)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_err)?;

        rows.iter()
            .map(|row| {
                ExpressionRow::from_row(row)
                    .map_err(query_err)?
                    .into_expression()
            })
            .collect()
    }

    async fn list_tasks(&self, id: ExpressionId) -> Result<Vec<Task>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM tasks WHERE expression_id = ? ORDER BY position")
            .bind(id)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_err)?;

        rows.iter()
            .map(|row| TaskRow::from_row(row).map_err(query_err)?.into_task())
            .collect()
    }
}
