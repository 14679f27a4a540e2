//! Thread and message repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use steward_core::{
    clean_identities, Error, Message, NewThread, Result, Thread, ThreadRepository,
};

/// PostgreSQL implementation of ThreadRepository.
#[derive(Clone)]
pub struct PgThreadRepository {
    pool: Pool<Postgres>,
}

impl PgThreadRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Build a thread and its first message. The sender always participates.
pub(crate) fn open_thread(thread: NewThread) -> (Thread, Message) {
    let now = Utc::now();
    let record = Thread {
        id: Uuid::now_v7(),
        subject: thread.subject.trim().to_string(),
        participants: clean_identities(
            std::iter::once(thread.sender.as_str())
                .chain(thread.participants.iter().map(String::as_str)),
        ),
        created_at: now,
        last_message_at: now,
    };
    let message = Message {
        id: Uuid::now_v7(),
        thread_id: record.id,
        sender: thread.sender,
        text: thread.text,
        sent_at: now,
    };
    (record, message)
}

#[async_trait]
impl ThreadRepository for PgThreadRepository {
    async fn create(&self, thread: NewThread) -> Result<(Thread, Message)> {
        let (record, message) = open_thread(thread);

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        sqlx::query(
            "INSERT INTO thread (id, participants, last_message_at, doc) VALUES ($1, $2, $3, $4)",
        )
        .bind(record.id)
        .bind(&record.participants)
        .bind(record.last_message_at)
        .bind(Json(&record))
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        sqlx::query("INSERT INTO message (id, thread_id, sent_at, doc) VALUES ($1, $2, $3, $4)")
            .bind(message.id)
            .bind(message.thread_id)
            .bind(message.sent_at)
            .bind(Json(&message))
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;
        Ok((record, message))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Thread>> {
        let row = sqlx::query("SELECT doc FROM thread WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.map(|r| r.get::<Json<Thread>, _>("doc").0))
    }

    async fn list_for(&self, identity: &str) -> Result<Vec<Thread>> {
        let rows = sqlx::query(
            "SELECT doc FROM thread
             WHERE $1 = ANY(participants)
             ORDER BY last_message_at DESC",
        )
        .bind(identity)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|r| r.get::<Json<Thread>, _>("doc").0)
            .collect())
    }

    async fn post_message(&self, thread_id: Uuid, sender: &str, text: &str) -> Result<Message> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let row = sqlx::query("SELECT doc FROM thread WHERE id = $1 FOR UPDATE")
            .bind(thread_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(Error::Database)?
            .ok_or_else(|| Error::NotFound(format!("Thread {} not found", thread_id)))?;

        let mut thread = row.get::<Json<Thread>, _>("doc").0;
        let message = Message {
            id: Uuid::now_v7(),
            thread_id,
            sender: sender.to_string(),
            text: text.to_string(),
            sent_at: Utc::now(),
        };
        thread.last_message_at = message.sent_at;

        sqlx::query("INSERT INTO message (id, thread_id, sent_at, doc) VALUES ($1, $2, $3, $4)")
            .bind(message.id)
            .bind(thread_id)
            .bind(message.sent_at)
            .bind(Json(&message))
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        sqlx::query("UPDATE thread SET last_message_at = $2, doc = $3 WHERE id = $1")
            .bind(thread_id)
            .bind(thread.last_message_at)
            .bind(Json(&thread))
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(message)
    }

    async fn messages(&self, thread_id: Uuid) -> Result<Vec<Message>> {
        let rows = sqlx::query(
            "SELECT doc FROM message WHERE thread_id = $1 ORDER BY sent_at ASC, id ASC",
        )
        .bind(thread_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|r| r.get::<Json<Message>, _>("doc").0)
            .collect())
    }
}
