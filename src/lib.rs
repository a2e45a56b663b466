pub mod cli;
pub mod commands;
pub mod data;
pub mod discovery;
pub mod evaluation;
pub mod logging;
pub mod math;
pub mod observability;
pub mod strategy;
pub mod types;
