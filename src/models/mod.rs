pub mod api_key;
pub mod device;
pub mod project;
pub mod user;
