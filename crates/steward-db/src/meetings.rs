//! Meeting repository implementation.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::types::Json;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use steward_core::{Error, Meeting, MeetingRepository, NewMeeting, Result};

/// PostgreSQL implementation of MeetingRepository.
#[derive(Clone)]
pub struct PgMeetingRepository {
    pool: Pool<Postgres>,
}

impl PgMeetingRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn decode(rows: Vec<sqlx::postgres::PgRow>) -> Vec<Meeting> {
    rows.into_iter()
        .map(|r| r.get::<Json<Meeting>, _>("doc").0)
        .collect()
}

#[async_trait]
impl MeetingRepository for PgMeetingRepository {
    async fn insert(&self, meeting: NewMeeting) -> Result<Meeting> {
        let meeting = meeting.into_meeting(Uuid::now_v7());

        sqlx::query(
            "INSERT INTO meeting (id, organizer, participants, time, doc, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(meeting.id)
        .bind(&meeting.organizer)
        .bind(&meeting.participants)
        .bind(meeting.time)
        .bind(Json(&meeting))
        .bind(meeting.created_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(meeting)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Meeting>> {
        let row = sqlx::query("SELECT doc FROM meeting WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.map(|r| r.get::<Json<Meeting>, _>("doc").0))
    }

    async fn update(&self, id: Uuid, meeting: NewMeeting) -> Result<Meeting> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let row = sqlx::query("SELECT doc FROM meeting WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(Error::Database)?
            .ok_or_else(|| Error::NotFound(format!("Meeting {} not found", id)))?;

        let created_at = row.get::<Json<Meeting>, _>("doc").0.created_at;
        let mut updated = meeting.into_meeting(id);
        updated.created_at = created_at;

        sqlx::query(
            "UPDATE meeting SET organizer = $2, participants = $3, time = $4, doc = $5
             WHERE id = $1",
        )
        .bind(id)
        .bind(&updated.organizer)
        .bind(&updated.participants)
        .bind(updated.time)
        .bind(Json(&updated))
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM meeting WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Meeting {} not found", id)));
        }
        Ok(())
    }

    async fn list_upcoming(&self, identity: &str, from: NaiveDateTime) -> Result<Vec<Meeting>> {
        let rows = sqlx::query(
            "SELECT doc FROM meeting
             WHERE time >= $2 AND (organizer = $1 OR $1 = ANY(participants))
             ORDER BY time ASC, created_at ASC",
        )
        .bind(identity)
        .bind(from)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(decode(rows))
    }
}
