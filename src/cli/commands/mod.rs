pub mod assign;
pub mod auth;
pub mod class;
pub mod cohort;
pub mod member;
pub mod project;
pub mod seed;
pub mod server;
pub mod user;
