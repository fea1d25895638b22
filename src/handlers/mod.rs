// handlers/mod.rs - 2-Tier Handler Architecture
//
// Public (no auth) → Protected (JWT auth)
pub mod protected; // JWT authentication required (/api/*)
pub mod public; // No authentication required (/, /health)
