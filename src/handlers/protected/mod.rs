// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Every route here sits behind `jwt_auth_middleware`; a request without a
// valid token is answered with 401 before a handler runs.
//
// Route Prefix: /api/*

pub mod clients;
pub mod users;
mod utils;
