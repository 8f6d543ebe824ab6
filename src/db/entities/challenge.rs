use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::db::enums::ChallengeStatus;
use crate::db::models::StringList;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "challenges")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub goals: StringList,
    #[sea_orm(column_type = "JsonBinary")]
    pub rules: StringList,
    pub duration_days: Option<i32>,
    pub start_date: ChronoDateTimeUtc,
    pub end_date: Option<ChronoDateTimeUtc>,
    pub status: ChallengeStatus,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,

    #[sea_orm(has_many = "super::project::Entity")]
    Projects,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Projects.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
