//! Error types for the engine binary.

/// Top-level error for the engine binary.
///
/// Each variant wraps a subsystem error so `main` can propagate
/// everything with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: dominion_core::ConfigError,
    },

    /// World seeding failed.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: dominion_store::StoreError,
    },

    /// A run control operation failed.
    #[error("control error: {source}")]
    Control {
        /// The underlying control error.
        #[from]
        source: dominion_core::ControlError,
    },

    /// The simulation loop failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: dominion_core::RunnerError,
    },
}
