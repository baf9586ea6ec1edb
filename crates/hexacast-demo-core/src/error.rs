use std::path::PathBuf;

use hexacast_core::session::SessionError;

/// Errors that can occur in the headless demo.
#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    /// Failed to load settle settings from the data directory.
    #[error("data load error in {dir}: {source}")]
    DataLoad {
        dir: PathBuf,
        source: hexacast_data::DataLoadError,
    },

    /// The session rejected a command or failed to read a throw.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A throw produced no line within the step budget.
    #[error("throw did not settle within {steps} steps")]
    Stalled { steps: u32 },

    /// The time step must be positive.
    #[error("time step must be positive")]
    ZeroTimestep,

    /// Six lines were thrown but the session reported no result.
    #[error("figure finished without a result")]
    MissingResult,
}
