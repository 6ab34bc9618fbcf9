use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the pipeline.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors raised by the pipeline stages.
///
/// Every failure is fatal for the run: there is no retry or
/// partial-result policy anywhere in this crate.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Corpus or word-index file could not be opened.
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Corpus CSV could not be read into a table.
    #[error("failed to read corpus table from {path}: {message}")]
    CorpusTable { path: PathBuf, message: String },

    /// A single corpus row violated the data contract.
    #[error("bad corpus row {row} in {path}: {message}")]
    CorpusRow {
        path: PathBuf,
        row: usize,
        message: String,
    },

    /// Word-index file did not decode as a word -> id map.
    #[error("failed to decode word index {path}: {message}")]
    WordIndex { path: PathBuf, message: String },

    /// A partition failed its size/balance contract.
    #[error("partition contract violated: {0}")]
    Partition(String),

    /// The optimizer rejected a gradient update.
    #[error("optimizer update failed: {0}")]
    Optimizer(String),

    /// A chart could not be rendered.
    #[error("chart rendering failed: {0}")]
    Render(String),
}
