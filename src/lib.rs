pub mod auth;
pub mod cache;
pub mod config;
pub mod server;
pub mod sheets;
pub mod translations;
