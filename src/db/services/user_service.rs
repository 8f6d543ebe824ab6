use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use tracing::info;
use uuid::Uuid;

use crate::db::entities::{prelude::*, user};

pub async fn find_user_by_id(
    db: &DatabaseConnection,
    id: Uuid,
) -> Result<Option<user::Model>, DbErr> {
    User::find_by_id(id).one(db).await
}

pub async fn find_user_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<user::Model>, DbErr> {
    User::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await
}

/// Returns the user registered under `email`, creating it on first sign-in.
///
/// An existing user keeps its stored name and picture.
pub async fn find_or_create_user(
    db: &DatabaseConnection,
    email: &str,
    name: &str,
    picture: Option<&str>,
) -> Result<user::Model, DbErr> {
    if let Some(existing) = find_user_by_email(db, email).await? {
        return Ok(existing);
    }

    let new_user = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        name: Set(name.to_string()),
        picture: Set(picture.map(str::to_string)),
        created_at: Set(Utc::now()),
    };
    let user = new_user.insert(db).await?;
    info!(user_id = %user.id, "Registered new user.");
    Ok(user)
}
