pub mod config;
pub mod costs;
pub mod driver;
pub mod engine;
