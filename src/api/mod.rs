// External API clients
pub mod profile;
