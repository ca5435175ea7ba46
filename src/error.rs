use std::path::PathBuf;

use thiserror::Error;

use crate::models::State;

#[derive(Debug, Error)]
pub enum SignalDeckError {
    /// The backing CSV for a state is absent. Terminal for that state; there
    /// is no fallback and no partial dataset.
    #[error("no dataset found for {state} (expected {})", path.display())]
    MissingData { state: State, path: PathBuf },

    /// The active filters removed every record. Terminal for the render
    /// cycle; no aggregation or query step runs on an empty set.
    #[error("no investors matched the selected filters")]
    EmptyResult,

    #[error("failed to read dataset: {0}")]
    Csv(#[from] csv::Error),
}
