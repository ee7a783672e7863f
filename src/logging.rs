//! Thin wrapper over the `log` facade. Job statefuns log transitions at
//! `trace`/`debug`; this crate installs no sink of its own — the caller
//! wires one up (`env_logger`, `tracing-log`, or anything else that
//! implements `log::Log`), exactly as the `log` crate's model intends.

pub use log::LevelFilter;

/// Sets the process-wide maximum log level. A no-op wrapper kept so
/// callers of this crate don't need a direct `log` dependency just to
/// turn its own diagnostics up or down.
pub fn set_max_level(level: LevelFilter) {
    log::set_max_level(level);
}
