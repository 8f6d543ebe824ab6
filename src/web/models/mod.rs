use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::db::entities::{challenge, project, user};
use crate::db::enums::{ChallengeStatus, ProjectStatus};

/// Struct to hold authenticated user details, to be passed as a request extension.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
    pub session_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            picture: user.picture,
        }
    }
}

impl From<&AuthenticatedUser> for UserResponse {
    fn from(user: &AuthenticatedUser) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            picture: user.picture.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: user::Model,
    pub session_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateChallenge {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub rules: Vec<String>,
    pub duration_days: Option<i32>,
}

/// Full replacement of a challenge's editable fields.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateChallenge {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub rules: Vec<String>,
    pub duration_days: Option<i32>,
    pub status: Option<ChallengeStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProject {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub repository_url: Option<String>,
    pub demo_url: Option<String>,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub status: ProjectStatus,
}

/// Partial project update. Absent keys are left untouched.
///
/// The URL fields keep "absent" apart from an explicit `null`, which clears
/// the stored URL.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProject {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub repository_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub demo_url: Option<Option<String>>,
    pub tech_stack: Option<Vec<String>>,
    pub status: Option<ProjectStatus>,
    pub progress_percentage: Option<i32>,
}

// Any value for the key, `null` included, marks it as present.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_challenges: usize,
    pub active_challenges: usize,
    pub completed_challenges: usize,
    pub total_projects: usize,
    pub completed_projects: usize,
    pub overall_progress: f64,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub user: UserResponse,
    pub stats: DashboardStats,
    pub recent_challenges: Vec<challenge::Model>,
    pub recent_projects: Vec<project::Model>,
    pub tech_stack_distribution: BTreeMap<String, usize>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub database: &'static str,
}
