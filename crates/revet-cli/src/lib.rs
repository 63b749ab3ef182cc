//! revet CLI library

pub mod app;
pub mod args;
pub mod handlers;

pub use app::CliApp;
