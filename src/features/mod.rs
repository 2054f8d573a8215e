pub mod access;
pub mod config_store;
pub mod keep_alive;
pub mod moderation;
pub mod rate_limiter;
