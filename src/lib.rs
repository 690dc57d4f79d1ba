// Library surface for headless/integration tests and reuse.
pub mod app;
pub mod app_dirs;
pub mod catalog;
pub mod config;
pub mod error;
pub mod observer;
pub mod progress;
pub mod record;
pub mod review;
pub mod runtime;
pub mod scoring;
pub mod session;
pub mod ui;

pub use app::{App, AppState};
