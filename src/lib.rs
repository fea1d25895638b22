pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod hierarchy;
pub mod middleware;
pub mod models;
pub mod services;
pub mod store;

#[cfg(test)]
pub mod testing;
