use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use crate::db::entities::{challenge, prelude::*, project};
use crate::db::enums::ChallengeStatus;
use crate::web::models::{CreateChallenge, UpdateChallenge};

/// `start + duration_days`, or no end date for open-ended challenges and
/// durations past the end of the calendar.
pub fn end_date_for(start: DateTime<Utc>, duration_days: Option<i32>) -> Option<DateTime<Utc>> {
    duration_days
        .and_then(|days| Duration::try_days(i64::from(days)))
        .and_then(|duration| start.checked_add_signed(duration))
}

pub async fn create_challenge(
    db: &DatabaseConnection,
    user_id: Uuid,
    data: CreateChallenge,
) -> Result<challenge::Model, DbErr> {
    let now = Utc::now();
    let new_challenge = challenge::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        title: Set(data.title),
        description: Set(data.description),
        goals: Set(data.goals.into()),
        rules: Set(data.rules.into()),
        duration_days: Set(data.duration_days),
        start_date: Set(now),
        end_date: Set(end_date_for(now, data.duration_days)),
        status: Set(ChallengeStatus::Active),
        created_at: Set(now),
        updated_at: Set(now),
    };
    new_challenge.insert(db).await
}

pub async fn get_challenges_by_user_id(
    db: &DatabaseConnection,
    user_id: Uuid,
) -> Result<Vec<challenge::Model>, DbErr> {
    Challenge::find()
        .filter(challenge::Column::UserId.eq(user_id))
        .order_by_asc(challenge::Column::CreatedAt)
        .all(db)
        .await
}

pub async fn get_challenge_for_user(
    db: &DatabaseConnection,
    challenge_id: Uuid,
    user_id: Uuid,
) -> Result<Option<challenge::Model>, DbErr> {
    Challenge::find_by_id(challenge_id)
        .filter(challenge::Column::UserId.eq(user_id))
        .one(db)
        .await
}

/// Replaces the editable fields. The end date is recomputed from the
/// original start date. Returns `None` when the user owns no such challenge.
pub async fn update_challenge(
    db: &DatabaseConnection,
    challenge_id: Uuid,
    user_id: Uuid,
    data: UpdateChallenge,
) -> Result<Option<challenge::Model>, DbErr> {
    let Some(existing) = get_challenge_for_user(db, challenge_id, user_id).await? else {
        return Ok(None);
    };

    let start_date = existing.start_date;
    let mut active = existing.into_active_model();
    active.title = Set(data.title);
    active.description = Set(data.description);
    active.goals = Set(data.goals.into());
    active.rules = Set(data.rules.into());
    active.duration_days = Set(data.duration_days);
    active.end_date = Set(end_date_for(start_date, data.duration_days));
    if let Some(status) = data.status {
        active.status = Set(status);
    }
    active.updated_at = Set(Utc::now());

    active.update(db).await.map(Some)
}

/// Deletes the challenge together with its projects.
/// Returns `false` when the user owns no such challenge.
pub async fn delete_challenge(
    db: &DatabaseConnection,
    challenge_id: Uuid,
    user_id: Uuid,
) -> Result<bool, DbErr> {
    let txn = db.begin().await?;

    let projects_removed = Project::delete_many()
        .filter(project::Column::ChallengeId.eq(challenge_id))
        .filter(project::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?
        .rows_affected;

    let challenges_removed = Challenge::delete_many()
        .filter(challenge::Column::Id.eq(challenge_id))
        .filter(challenge::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?
        .rows_affected;

    if challenges_removed == 0 {
        txn.rollback().await?;
        return Ok(false);
    }

    txn.commit().await?;
    info!(challenge_id = %challenge_id, projects_removed, "Challenge deleted.");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_date_follows_duration() {
        let start = Utc::now();
        assert_eq!(end_date_for(start, None), None);
        assert_eq!(end_date_for(start, Some(30)), Some(start + Duration::days(30)));
    }

    #[test]
    fn out_of_range_duration_has_no_end_date() {
        assert_eq!(end_date_for(Utc::now(), Some(i32::MAX)), None);
    }
}
