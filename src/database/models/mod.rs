pub mod classroom;
pub mod cohort;
pub mod project;
pub mod project_cohort;
pub mod project_member;
pub mod role;
pub mod user;

pub use classroom::Classroom;
pub use cohort::Cohort;
pub use project::Project;
pub use project_cohort::ProjectCohort;
pub use project_member::ProjectMember;
pub use role::Role;
pub use user::{User, UserProfile};

/// A table (or view) readable through [`crate::database::Repository`].
pub trait Table {
    const TABLE: &'static str;
    /// Singular noun used in not-found messages.
    const NOUN: &'static str;
}
