pub mod auth_routes;
pub mod challenge_routes;
pub mod dashboard_routes;
pub mod project_routes;
