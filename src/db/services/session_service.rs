use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, Insert, QueryFilter, Set,
    sea_query::OnConflict,
};
use uuid::Uuid;

use crate::db::entities::{prelude::*, session};

/// Stores the session, or refreshes owner and expiry when the provider hands
/// out a token that is already stored (a repeated sign-in).
pub async fn create_session(
    db: &DatabaseConnection,
    user_id: Uuid,
    session_token: &str,
    expires_at: DateTime<Utc>,
) -> Result<session::Model, DbErr> {
    upsert_session(user_id, session_token, expires_at)
        .exec_with_returning(db)
        .await
}

fn upsert_session(
    user_id: Uuid,
    session_token: &str,
    expires_at: DateTime<Utc>,
) -> Insert<session::ActiveModel> {
    let new_session = session::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        session_token: Set(session_token.to_string()),
        expires_at: Set(expires_at),
        created_at: Set(Utc::now()),
    };
    Session::insert(new_session).on_conflict(
        OnConflict::column(session::Column::SessionToken)
            .update_columns([session::Column::UserId, session::Column::ExpiresAt])
            .to_owned(),
    )
}

pub async fn find_session_by_token(
    db: &DatabaseConnection,
    session_token: &str,
) -> Result<Option<session::Model>, DbErr> {
    Session::find()
        .filter(session::Column::SessionToken.eq(session_token))
        .one(db)
        .await
}

/// Returns the number of sessions removed.
pub async fn delete_session_by_token(
    db: &DatabaseConnection,
    session_token: &str,
) -> Result<u64, DbErr> {
    let result = Session::delete_many()
        .filter(session::Column::SessionToken.eq(session_token))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

pub fn is_expired(session: &session::Model, now: DateTime<Utc>) -> bool {
    session.expires_at <= now
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sea_orm::{DbBackend, QueryTrait};

    fn session_expiring_at(expires_at: DateTime<Utc>) -> session::Model {
        session::Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            session_token: "tok".into(),
            expires_at,
            created_at: expires_at - Duration::days(7),
        }
    }

    #[test]
    fn session_expires_at_its_deadline() {
        let now = Utc::now();
        assert!(!is_expired(&session_expiring_at(now + Duration::seconds(1)), now));
        assert!(is_expired(&session_expiring_at(now), now));
        assert!(is_expired(&session_expiring_at(now - Duration::days(1)), now));
    }

    #[test]
    fn repeated_token_refreshes_the_existing_session() {
        let sql = upsert_session(Uuid::new_v4(), "tok", Utc::now())
            .build(DbBackend::Postgres)
            .to_string();

        assert!(sql.contains(r#"ON CONFLICT ("session_token") DO UPDATE SET"#));
        assert!(sql.contains(r#""user_id" = "excluded"."user_id""#));
        assert!(sql.contains(r#""expires_at" = "excluded"."expires_at""#));
        assert!(!sql.contains(r#""created_at" = "excluded""#));
    }
}
