//! User profile repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};

use steward_core::{Error, Result, User, UserRepository};

/// PostgreSQL implementation of UserRepository.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: Pool<Postgres>,
}

impl PgUserRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Escape LIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn upsert(&self, email: &str, name: &str) -> Result<User> {
        let row = sqlx::query(
            "INSERT INTO app_user (email, name, updated_at) VALUES ($1, $2, $3)
             ON CONFLICT (email) DO UPDATE SET name = EXCLUDED.name, updated_at = EXCLUDED.updated_at
             RETURNING email, name, updated_at",
        )
        .bind(email)
        .bind(name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(User {
            email: row.get("email"),
            name: row.get("name"),
            updated_at: row.get("updated_at"),
        })
    }

    async fn search_by_email_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<User>> {
        let pattern = format!("{}%", escape_like(&prefix.to_lowercase()));
        let rows = sqlx::query(
            "SELECT email, name, updated_at FROM app_user
             WHERE lower(email) LIKE $1
             ORDER BY email ASC
             LIMIT $2",
        )
        .bind(pattern)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|r| User {
                email: r.get("email"),
                name: r.get("name"),
                updated_at: r.get("updated_at"),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("a_b%c\\"), "a\\_b\\%c\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }
}
