//! Encore command-line library manager
//!
//! Library code behind the `encore` binary: configuration, wiring of the
//! storage, importer and playback crates, and the individual commands.

pub mod app;
pub mod commands;
pub mod config;
pub mod output;

pub use app::App;
pub use config::AppConfig;
