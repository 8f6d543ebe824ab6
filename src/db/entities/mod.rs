//! SeaORM entities for the tracker's tables.

pub mod challenge;
pub mod project;
pub mod session;
pub mod user;

pub mod prelude {
    pub use super::user::ActiveModel as UserActiveModel;
    pub use super::user::Column as UserColumn;
    pub use super::user::Entity as User;
    pub use super::user::Model as UserModel;

    pub use super::session::ActiveModel as SessionActiveModel;
    pub use super::session::Column as SessionColumn;
    pub use super::session::Entity as Session;
    pub use super::session::Model as SessionModel;

    pub use super::challenge::ActiveModel as ChallengeActiveModel;
    pub use super::challenge::Column as ChallengeColumn;
    pub use super::challenge::Entity as Challenge;
    pub use super::challenge::Model as ChallengeModel;

    pub use super::project::ActiveModel as ProjectActiveModel;
    pub use super::project::Column as ProjectColumn;
    pub use super::project::Entity as Project;
    pub use super::project::Model as ProjectModel;
}
