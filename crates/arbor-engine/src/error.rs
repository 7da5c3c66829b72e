//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode during startup and the
//! simulation run so `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: arbor_core::ConfigError,
    },

    /// A zone could not be populated.
    #[error("zone error: {source}")]
    Zone {
        /// The underlying zone error.
        #[from]
        source: arbor_zone::ZoneError,
    },

    /// Agent spawning failed.
    #[error("spawner error: {message}")]
    Spawner {
        /// Description of the spawner failure.
        message: String,
    },

    /// Simulation runner failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: arbor_core::RunnerError,
    },

    /// The debugger server failed to start.
    #[error("observer error: {source}")]
    Observer {
        /// The underlying server error.
        #[from]
        source: arbor_observer::ServerError,
    },
}
