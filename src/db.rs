use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use crate::session::{SessionData, SessionError, SessionStore, expiry_from};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Sessions in `learning_on.sessions`, shared by every server instance.
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Deletes expired rows, returning how many were removed.
    pub async fn purge_expired(&self) -> Result<u64, SessionError> {
        let result = sqlx::query("DELETE FROM learning_on.sessions WHERE expires_at <= $1")
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn load(&self, id: Uuid) -> Result<Option<SessionData>, SessionError> {
        let row = sqlx::query(
            "SELECT data, expires_at FROM learning_on.sessions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let expires_at: DateTime<Utc> = row.get("expires_at");
        if expires_at <= Utc::now() {
            debug!("Session {id} expired at {expires_at}");
            return Ok(None);
        }

        let data: String = row.get("data");
        Ok(Some(serde_json::from_str(&data)?))
    }

    async fn save(&self, id: Uuid, data: &SessionData) -> Result<(), SessionError> {
        let json = serde_json::to_string(data)?;

        sqlx::query(
            r#"
            INSERT INTO learning_on.sessions (id, data, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
            SET data = EXCLUDED.data, expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(id)
        .bind(json)
        .bind(expiry_from(Utc::now()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn destroy(&self, id: Uuid) -> Result<(), SessionError> {
        sqlx::query("DELETE FROM learning_on.sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
