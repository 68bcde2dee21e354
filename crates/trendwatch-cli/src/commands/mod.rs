pub mod analyze;
pub mod analyze_ui;
pub mod clear;
pub mod config;
pub mod daemon;
pub mod dashboard;
