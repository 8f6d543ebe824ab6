use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text", enum_name = "challenge_status")]
#[serde(rename_all = "snake_case")]
pub enum ChallengeStatus {
    #[default]
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "paused")]
    Paused,
    #[sea_orm(string_value = "completed")]
    Completed,
}

impl fmt::Display for ChallengeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_value())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text", enum_name = "project_status")]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    #[sea_orm(string_value = "planning")]
    Planning,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "deployed")]
    Deployed,
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::Iterable;

    #[test]
    fn wire_and_column_values_agree() {
        for status in ProjectStatus::iter() {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json.as_str().unwrap(), status.to_value());
        }
        for status in ChallengeStatus::iter() {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json.as_str().unwrap(), status.to_value());
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(serde_json::from_str::<ProjectStatus>("\"abandoned\"").is_err());
        assert_eq!(
            serde_json::from_str::<ProjectStatus>("\"in_progress\"").unwrap(),
            ProjectStatus::InProgress
        );
    }
}
