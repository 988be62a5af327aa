//! Message Types for Thread Communication
//!
//! Jobs flow from the acquisition side -> analysis worker
//! Events flow from the analysis worker -> application

use serde::{Deserialize, Serialize};

use crate::capture::PendingCapture;

/// Work sent to the analysis worker
#[derive(Debug)]
pub(crate) enum Job {
    /// Run one analysis pass over the locked capture
    Analyze(PendingCapture),

    /// Stop the worker
    Shutdown,
}

/// Events sent from the analysis worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Event {
    /// A pass finished and the analyzed data was updated
    PassComplete {
        /// Channel slots in the analysis set
        channels: usize,
        /// Wall time of the pass in microseconds
        duration_us: u64,
    },

    /// A capture arrived while a pass was running and was not analyzed
    CaptureDropped,

    /// A channel could not be analyzed
    Error { message: String },
}

impl Event {
    /// Create an error event from any error type
    pub fn error<E: std::fmt::Display>(err: E) -> Self {
        Event::Error {
            message: err.to_string(),
        }
    }
}
