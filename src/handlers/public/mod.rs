// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition. Every input is untrusted; validation happens in the
// services before anything touches the database.

pub mod auth;
