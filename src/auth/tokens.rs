use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::auth::repo_types::{PendingReset, ResetRequest, User};
use crate::error::StoreError;

/// 32 bytes from the OS CSPRNG, URL-safe base64 without padding. Safe to
/// embed in a query string as-is.
pub fn generate_reset_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// SHA-256 hex digest of the raw token. This is the only form that touches
/// the store, so a leaked table never yields usable links.
pub fn hash_reset_token(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}

/// Mint a fresh token for `user_id`, persist its digest with a TTL, and
/// return the raw token for the emailed link. Earlier tokens stay valid
/// until they expire or get used.
pub async fn issue(db: &PgPool, user_id: Uuid, ttl_minutes: i64) -> Result<String, StoreError> {
    let raw = generate_reset_token();
    let token_hash = hash_reset_token(&raw);
    let created_at = OffsetDateTime::now_utc();
    let expires_at = created_at + Duration::minutes(ttl_minutes);

    let request = ResetRequest::insert(db, user_id, &token_hash, created_at, expires_at).await?;
    debug!(
        reset_id = %request.id,
        user_id = %request.user_id,
        expires_at = %request.expires_at,
        "reset request stored"
    );
    Ok(raw)
}

/// Look up a presented raw token. Returns the pending reset only when the
/// digest matches a row that is unused and unexpired by the store's clock.
pub async fn redeem(db: &PgPool, raw: &str) -> Result<Option<PendingReset>, StoreError> {
    ResetRequest::find_valid_by_token_hash(db, &hash_reset_token(raw)).await
}

/// Flip the request to used and install the new password hash in one
/// transaction. Returns false when a concurrent redemption already claimed
/// the row; nothing is written in that case.
pub async fn consume(
    db: &PgPool,
    reset_id: Uuid,
    user_id: Uuid,
    new_password_hash: &str,
) -> Result<bool, StoreError> {
    let mut tx = db.begin().await?;

    if !ResetRequest::mark_used_tx(&mut tx, reset_id).await? {
        tx.rollback().await?;
        return Ok(false);
    }

    User::update_password_tx(&mut tx, user_id, new_password_hash).await?;
    tx.commit().await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo_types::{Provider, Role};

    #[test]
    fn raw_tokens_are_43_chars_and_url_safe() {
        let token = generate_reset_token();
        assert_eq!(token.len(), 43);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn raw_tokens_are_unique() {
        let a = generate_reset_token();
        let b = generate_reset_token();
        assert_ne!(a, b);
    }

    #[test]
    fn digest_is_deterministic_hex() {
        let a = hash_reset_token("some-token");
        let b = hash_reset_token("some-token");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn digest_differs_from_raw() {
        let raw = generate_reset_token();
        assert_ne!(hash_reset_token(&raw), raw);
    }

    // The cases below hit a real store. They run only when TEST_DATABASE_URL
    // points at a disposable Postgres and skip silently otherwise.
    async fn test_db() -> Option<PgPool> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        let db = PgPool::connect(&url)
            .await
            .expect("connect to TEST_DATABASE_URL");
        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .expect("apply migrations");
        Some(db)
    }

    async fn seeded_user(db: &PgPool) -> User {
        let email = format!("reset-case-{}@example.com", Uuid::new_v4());
        User::create(db, &email, Some("old-hash"), Provider::Password, Role::User)
            .await
            .expect("seed user")
    }

    #[tokio::test]
    async fn fresh_token_redeems_and_consume_claims_it_once() {
        let Some(db) = test_db().await else { return };
        let user = seeded_user(&db).await;

        let raw = issue(&db, user.id, 30).await.unwrap();
        let pending = redeem(&db, &raw).await.unwrap().expect("fresh token matches");
        assert_eq!(pending.user_id, user.id);
        assert_eq!(pending.provider, Provider::Password);

        let claimed = consume(&db, pending.reset_id, pending.user_id, "new-hash")
            .await
            .unwrap();
        assert!(claimed);

        let reloaded = User::find_by_email(&db, &user.email).await.unwrap().unwrap();
        assert_eq!(reloaded.password_hash.as_deref(), Some("new-hash"));

        // The request is spent: it stops matching and a later claim loses.
        assert!(redeem(&db, &raw).await.unwrap().is_none());
        let reclaimed = consume(&db, pending.reset_id, pending.user_id, "other-hash")
            .await
            .unwrap();
        assert!(!reclaimed);
        let reloaded = User::find_by_email(&db, &user.email).await.unwrap().unwrap();
        assert_eq!(reloaded.password_hash.as_deref(), Some("new-hash"));
    }

    #[tokio::test]
    async fn expired_token_never_redeems() {
        let Some(db) = test_db().await else { return };
        let user = seeded_user(&db).await;

        // Issued already past its deadline.
        let raw = issue(&db, user.id, -5).await.unwrap();
        assert!(redeem(&db, &raw).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_consumers_produce_exactly_one_winner() {
        let Some(db) = test_db().await else { return };
        let user = seeded_user(&db).await;

        let raw = issue(&db, user.id, 30).await.unwrap();
        let pending = redeem(&db, &raw).await.unwrap().expect("fresh token matches");

        let mut claims = Vec::new();
        for n in 0..8 {
            let db = db.clone();
            let reset_id = pending.reset_id;
            let user_id = pending.user_id;
            claims.push(tokio::spawn(async move {
                consume(&db, reset_id, user_id, &format!("hash-{n}")).await.unwrap()
            }));
        }

        let mut winners = 0;
        for claim in claims {
            if claim.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
