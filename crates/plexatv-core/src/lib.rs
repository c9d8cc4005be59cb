pub mod config;
pub mod error;
pub mod event_log;
pub mod models;
pub mod summarizer;
