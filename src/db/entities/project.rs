use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::db::enums::ProjectStatus;
use crate::db::models::StringList;
use crate::monitoring::{ProjectUrls, UrlStatusMap};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub challenge_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub repository_url: Option<String>,
    pub demo_url: Option<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub tech_stack: StringList,
    pub status: ProjectStatus,
    pub progress_percentage: i32,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
    // Written only by the URL monitor.
    pub last_url_check: Option<ChronoDateTimeUtc>,
    #[sea_orm(column_type = "JsonBinary")]
    pub url_status: UrlStatusMap,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::challenge::Entity",
        from = "Column::ChallengeId",
        to = "super::challenge::Column::Id",
        on_delete = "Cascade"
    )]
    Challenge,
}

impl Related<super::challenge::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Challenge.def()
    }
}

impl Model {
    pub fn urls(&self) -> ProjectUrls {
        ProjectUrls {
            id: self.id,
            repository_url: self.repository_url.clone(),
            demo_url: self.demo_url.clone(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}
