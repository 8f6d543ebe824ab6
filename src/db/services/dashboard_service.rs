use futures::try_join;
use sea_orm::{DatabaseConnection, DbErr};
use std::collections::BTreeMap;

use super::{get_challenges_by_user_id, get_projects_by_user_id};
use crate::db::entities::{challenge, project};
use crate::db::enums::{ChallengeStatus, ProjectStatus};
use crate::web::models::{AuthenticatedUser, DashboardResponse, DashboardStats};

const RECENT_LIMIT: usize = 5;

pub async fn build_dashboard(
    db: &DatabaseConnection,
    user: &AuthenticatedUser,
) -> Result<DashboardResponse, DbErr> {
    let (challenges, projects) = try_join!(
        get_challenges_by_user_id(db, user.id),
        get_projects_by_user_id(db, user.id)
    )?;
    Ok(summarize(user, challenges, projects))
}

/// Builds the dashboard from the user's challenges and projects, both oldest first.
pub fn summarize(
    user: &AuthenticatedUser,
    challenges: Vec<challenge::Model>,
    projects: Vec<project::Model>,
) -> DashboardResponse {
    let stats = DashboardStats {
        total_challenges: challenges.len(),
        active_challenges: challenges
            .iter()
            .filter(|c| c.status == ChallengeStatus::Active)
            .count(),
        completed_challenges: challenges
            .iter()
            .filter(|c| c.status == ChallengeStatus::Completed)
            .count(),
        total_projects: projects.len(),
        completed_projects: projects
            .iter()
            .filter(|p| p.status == ProjectStatus::Completed)
            .count(),
        overall_progress: overall_progress(&projects),
    };

    let mut tech_stack_distribution: BTreeMap<String, usize> = BTreeMap::new();
    for tech in projects.iter().flat_map(|p| p.tech_stack.iter()) {
        *tech_stack_distribution.entry(tech.clone()).or_default() += 1;
    }

    DashboardResponse {
        user: user.into(),
        stats,
        recent_challenges: last_n(challenges, RECENT_LIMIT),
        recent_projects: last_n(projects, RECENT_LIMIT),
        tech_stack_distribution,
    }
}

// Mean progress rounded to one decimal.
fn overall_progress(projects: &[project::Model]) -> f64 {
    if projects.is_empty() {
        return 0.0;
    }
    let total: i64 = projects
        .iter()
        .map(|p| i64::from(p.progress_percentage))
        .sum();
    let mean = total as f64 / projects.len() as f64;
    (mean * 10.0).round() / 10.0
}

fn last_n<T>(mut items: Vec<T>, n: usize) -> Vec<T> {
    let skip = items.len().saturating_sub(n);
    items.drain(..skip);
    items
}
