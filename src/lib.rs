pub mod app;
pub mod calendar;
pub mod cli;
pub mod config;
pub mod posts;
pub mod ui;

pub use config::{AppConfig, ConfigLoader, ConfigPaths};
