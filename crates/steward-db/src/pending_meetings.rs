//! Pending meeting repository implementation.
//!
//! Responses are applied with an optimistic check on the stored response
//! count so two invitees answering at once cannot both decrement from the
//! same value.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{Pool, Postgres, Row};
use tracing::warn;
use uuid::Uuid;

use steward_core::{Error, PendingMeeting, PendingMeetingRepository, Result};

/// PostgreSQL implementation of PendingMeetingRepository.
#[derive(Clone)]
pub struct PgPendingMeetingRepository {
    pool: Pool<Postgres>,
}

impl PgPendingMeetingRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PendingMeetingRepository for PgPendingMeetingRepository {
    async fn insert(&self, pending: PendingMeeting) -> Result<PendingMeeting> {
        sqlx::query(
            "INSERT INTO pending_meeting
                (id, organiser, participants, responded, pending_response, doc, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(pending.id)
        .bind(&pending.organiser)
        .bind(&pending.participants)
        .bind(&pending.responded)
        .bind(pending.pending_response as i32)
        .bind(Json(&pending))
        .bind(pending.created_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(pending)
    }

    async fn get(&self, id: Uuid) -> Result<Option<PendingMeeting>> {
        let row = sqlx::query("SELECT doc FROM pending_meeting WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.map(|r| r.get::<Json<PendingMeeting>, _>("doc").0))
    }

    async fn save(&self, pending: &PendingMeeting, expected_pending: u32) -> Result<()> {
        let result = sqlx::query(
            "UPDATE pending_meeting
             SET responded = $3, pending_response = $4, doc = $5
             WHERE id = $1 AND pending_response = $2",
        )
        .bind(pending.id)
        .bind(expected_pending as i32)
        .bind(&pending.responded)
        .bind(pending.pending_response as i32)
        .bind(Json(pending))
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        let exists = sqlx::query("SELECT 1 FROM pending_meeting WHERE id = $1")
            .bind(pending.id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .is_some();

        if !exists {
            return Err(Error::NotFound(format!(
                "Pending meeting {} not found",
                pending.id
            )));
        }

        warn!(
            subsystem = "db",
            component = "pending_meetings",
            op = "save",
            pending_meeting_id = %pending.id,
            expected_pending,
            "Concurrent response detected"
        );
        Err(Error::Conflict(
            "The invitation changed while you were responding; please retry".to_string(),
        ))
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM pending_meeting WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    async fn list_awaiting(&self, identity: &str) -> Result<Vec<PendingMeeting>> {
        let rows = sqlx::query(
            "SELECT doc FROM pending_meeting
             WHERE $1 = ANY(participants) AND NOT ($1 = ANY(responded))
             ORDER BY created_at ASC",
        )
        .bind(identity)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|r| r.get::<Json<PendingMeeting>, _>("doc").0)
            .collect())
    }
}
