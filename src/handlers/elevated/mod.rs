// handlers/elevated/mod.rs - Elevated handlers (admin role required)
//
// Route Prefix: /api/admin/*
// Middleware: jwt_auth_middleware → validate_user_middleware → require_admin_middleware

pub mod admin;
