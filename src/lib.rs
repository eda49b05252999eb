pub mod config;
pub mod core;
pub mod orchestrator;
pub mod types;
pub mod utils;
