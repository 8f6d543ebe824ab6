//! Data access for the tracker. Route handlers go through these functions
//! instead of building queries themselves.
//!
//! Every challenge and project lookup here is scoped by the owning user id,
//! except for [`SeaOrmProjectStore`], which serves the background URL monitor.

pub mod challenge_service;
pub mod dashboard_service;
pub mod project_service;
pub mod session_service;
pub mod user_service;

pub use challenge_service::*;
pub use dashboard_service::*;
pub use project_service::*;
pub use session_service::*;
pub use user_service::*;
