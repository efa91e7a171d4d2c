// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod board;
pub mod clock;
pub mod config;
pub mod fixation;
pub mod geometry;
pub mod logging;
pub mod persistence;
pub mod prompt;
pub mod recorder;
pub mod runtime;
pub mod session;
pub mod shape;
pub mod ui;
pub mod view;
