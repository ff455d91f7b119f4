use sqlx::{PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{PendingReset, Provider, ResetRequest, Role, User};
use crate::error::StoreError;

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, provider, role, must_change_password, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn create(
        db: &PgPool,
        email: &str,
        password_hash: Option<&str>,
        provider: Provider,
        role: Role,
    ) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, provider, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, password_hash, provider, role, must_change_password, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(provider)
        .bind(role)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    pub async fn list_all(db: &PgPool) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, provider, role, must_change_password, created_at
            FROM users
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(users)
    }

    pub async fn update_role(db: &PgPool, id: Uuid, role: Role) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET role = $1 WHERE id = $2")
            .bind(role)
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Replaces the hash and clears `must_change_password` in one statement.
    pub async fn rotate_password(
        db: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $1, must_change_password = FALSE
            WHERE id = $2
            "#,
        )
        .bind(password_hash)
        .bind(id)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Password update scoped to a caller-owned transaction.
    pub async fn update_password_tx(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        password_hash: &str,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}

impl ResetRequest {
    pub async fn insert(
        db: &PgPool,
        user_id: Uuid,
        token_hash: &str,
        created_at: OffsetDateTime,
        expires_at: OffsetDateTime,
    ) -> Result<ResetRequest, StoreError> {
        let request = sqlx::query_as::<_, ResetRequest>(
            r#"
            INSERT INTO password_resets (user_id, token_hash, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, token_hash, created_at, expires_at, used
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(created_at)
        .bind(expires_at)
        .fetch_one(db)
        .await?;
        Ok(request)
    }

    /// Match a digest against a live request. Expiry is judged by the
    /// store's clock, not the caller's.
    pub async fn find_valid_by_token_hash(
        db: &PgPool,
        token_hash: &str,
    ) -> Result<Option<PendingReset>, StoreError> {
        let pending = sqlx::query_as::<_, PendingReset>(
            r#"
            SELECT pr.id AS reset_id, pr.user_id, u.provider
            FROM password_resets pr
            JOIN users u ON u.id = pr.user_id
            WHERE pr.token_hash = $1 AND pr.used = FALSE AND pr.expires_at > now()
            LIMIT 1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(db)
        .await?;
        Ok(pending)
    }

    /// Guarded flip: zero rows affected means another redemption already
    /// claimed this request.
    pub async fn mark_used_tx(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<bool, StoreError> {
        let result =
            sqlx::query("UPDATE password_resets SET used = TRUE WHERE id = $1 AND used = FALSE")
                .bind(id)
                .execute(&mut **tx)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
