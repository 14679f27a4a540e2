//! Task repository implementation.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use steward_core::{Error, NewTask, Result, Task, TaskRepository};

/// PostgreSQL implementation of TaskRepository.
#[derive(Clone)]
pub struct PgTaskRepository {
    pool: Pool<Postgres>,
}

impl PgTaskRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn insert(&self, task: NewTask) -> Result<Task> {
        let task = task.into_task(Uuid::now_v7());

        sqlx::query(
            "INSERT INTO task (id, owner, due_date, doc, created_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(task.id)
        .bind(&task.owner)
        .bind(task.due_date)
        .bind(Json(&task))
        .bind(task.created_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        debug!(subsystem = "db", component = "tasks", op = "insert", task_id = %task.id, "Task stored");
        Ok(task)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Task>> {
        let row = sqlx::query("SELECT doc FROM task WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.map(|r| r.get::<Json<Task>, _>("doc").0))
    }

    async fn list_for_owner(&self, owner: &str) -> Result<Vec<Task>> {
        let rows = sqlx::query(
            "SELECT doc FROM task
             WHERE owner = $1
             ORDER BY due_date ASC NULLS LAST, created_at ASC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|r| r.get::<Json<Task>, _>("doc").0)
            .collect())
    }

    async fn toggle(&self, id: Uuid) -> Result<Task> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let row = sqlx::query("SELECT doc FROM task WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(Error::Database)?
            .ok_or_else(|| Error::NotFound(format!("Task {} not found", id)))?;

        let mut task = row.get::<Json<Task>, _>("doc").0;
        task.completed = !task.completed;

        sqlx::query("UPDATE task SET doc = $2 WHERE id = $1")
            .bind(id)
            .bind(Json(&task))
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(task)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM task WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Task {} not found", id)));
        }
        Ok(())
    }
}
