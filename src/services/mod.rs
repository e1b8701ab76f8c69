pub mod auth;
pub mod generator;
