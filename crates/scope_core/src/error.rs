//! Analyzer Error Types

use thiserror::Error;

/// Errors that can occur in the analysis engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyzerError {
    #[error("Math channel has no combination mode selected")]
    MathModeUnset,

    #[error("Math channel needs at least two physical channels, got {0}")]
    MathChannelUnavailable(usize),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(f64),

    #[error("Channel {channel}: {source}")]
    Channel {
        channel: usize,
        #[source]
        source: scope_dsp::DspError,
    },

    #[error("DSP error: {0}")]
    DspError(#[from] scope_dsp::DspError),

    #[error("Failed to spawn analysis worker: {0}")]
    WorkerSpawnError(String),

    #[error("Channel send error - analysis worker stopped")]
    ChannelSendError,
}

/// Result type alias for analyzer operations
pub type AnalyzerResult<T> = Result<T, AnalyzerError>;
