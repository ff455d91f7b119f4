use sqlx::PgPool;

use crate::auth::repo_types::Role;
use crate::error::StoreError;

/// Pure precedence rule: the designated admin email wins, then the faculty
/// roster, then USER. Comparison is exact and case-sensitive.
pub fn classify(email: &str, admin_email: &str, on_roster: bool) -> Role {
    if email == admin_email {
        Role::Admin
    } else if on_roster {
        Role::Faculty
    } else {
        Role::User
    }
}

/// Resolve the role for an email, consulting the faculty roster only when
/// the admin check misses.
pub async fn resolve_role(db: &PgPool, admin_email: &str, email: &str) -> Result<Role, StoreError> {
    if email == admin_email {
        return Ok(Role::Admin);
    }

    let on_roster =
        sqlx::query_scalar::<_, i32>("SELECT 1 FROM faculties WHERE email = $1 LIMIT 1")
            .bind(email)
            .fetch_optional(db)
            .await?
            .is_some();

    Ok(classify(email, admin_email, on_roster))
}
