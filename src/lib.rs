pub mod app;
pub mod commands;
pub mod config;
pub mod error;
pub mod journal;
pub mod models;
pub mod news;
pub mod notify;
pub mod scheduler;
pub mod storage;
pub mod store;
pub mod tui;

pub use error::{AdmError, Result};
