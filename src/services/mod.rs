pub mod cascade;
pub mod classroom_service;
pub mod cohort_service;
pub mod membership_service;
pub mod project_service;
pub mod role_service;
pub mod user_service;
pub mod validation;

use std::collections::HashMap;

use crate::auth::policy::Denied;
use crate::auth::AuthError;
use crate::database::DatabaseError;

pub use cascade::CascadeReport;
pub use classroom_service::ClassroomService;
pub use cohort_service::CohortService;
pub use membership_service::MembershipService;
pub use project_service::ProjectService;
pub use role_service::RoleService;
pub use user_service::UserService;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Validation failed: {0:?}")]
    Validation(HashMap<String, String>),
    #[error(transparent)]
    Database(DatabaseError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl From<DatabaseError> for ServiceError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => ServiceError::NotFound(msg),
            DatabaseError::Conflict(msg) => ServiceError::Conflict(msg),
            other => ServiceError::Database(other),
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        DatabaseError::from(err).into()
    }
}

impl From<Denied> for ServiceError {
    fn from(denied: Denied) -> Self {
        ServiceError::Forbidden(denied.0)
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
