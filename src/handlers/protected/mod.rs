// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Route Prefix: /api/*
// Middleware: jwt_auth_middleware → validate_user_middleware
//
// Every handler here can read; writes go through the services, which ask
// the policy table whether the current user may perform them.

pub mod auth;
pub mod classes;
pub mod cohorts;
pub mod project_cohorts;
pub mod project_members;
pub mod projects;
pub mod roles;
pub mod users;
