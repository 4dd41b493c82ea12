// handlers/mod.rs - 3-Tier Handler Architecture
//
// Public (no auth) → Protected (JWT + user validation) → Elevated (admin role)
pub mod elevated; // Tier 3: admin only (/api/admin/*)
pub mod protected; // Tier 2: JWT authentication required (/api/*)
pub mod public; // Tier 1: no authentication (/auth/*)
