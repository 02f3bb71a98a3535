pub mod api;
pub mod api_keys;
pub mod auth;
pub mod projects;
pub mod setup;
