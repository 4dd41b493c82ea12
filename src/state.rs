use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::services::{
    ClassroomService, CohortService, MembershipService, ProjectService, RoleService, UserService,
};

/// Shared by every handler through axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: AppConfig) -> Self {
        Self {
            pool,
            config: Arc::new(config),
        }
    }

    pub fn users(&self) -> UserService {
        UserService::new(
            self.pool.clone(),
            self.config.security.clone(),
            self.config.validation.clone(),
        )
    }

    pub fn roles(&self) -> RoleService {
        RoleService::new(self.pool.clone())
    }

    pub fn projects(&self) -> ProjectService {
        ProjectService::new(self.pool.clone(), self.config.validation.clone())
    }

    pub fn cohorts(&self) -> CohortService {
        CohortService::new(self.pool.clone())
    }

    pub fn classes(&self) -> ClassroomService {
        ClassroomService::new(self.pool.clone())
    }

    pub fn memberships(&self) -> MembershipService {
        MembershipService::new(self.pool.clone())
    }
}
