pub mod auth;
pub mod config;
pub mod error;
pub mod factory;
pub mod handlers;
pub mod hooks;
pub mod mail;
pub mod middleware;
pub mod models;
pub mod query;
pub mod resources;
pub mod routes;
pub mod state;
pub mod store;
