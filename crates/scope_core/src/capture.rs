//! Capture Handoff
//!
//! The acquisition layer owns its raw sample buffers behind a mutex. A
//! submitted capture keeps that mutex locked until the analysis pass has
//! copied the samples, then releases it so acquisition can refill.

use std::sync::Arc;

use parking_lot::{ArcMutexGuard, Mutex, RawMutex};
use tracing::warn;

/// Raw samples of one acquisition, as delivered by the device layer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCapture {
    /// Sample arrays indexed by physical channel; `None` = no new data
    pub samples: Vec<Option<Vec<f64>>>,
    /// Valid sample count of each array
    pub sample_counts: Vec<usize>,
    /// Sample rate in Hz
    pub sample_rate: f64,
}

/// Raw capture storage shared between acquisition and analysis
pub type CaptureBuffer = Arc<Mutex<RawCapture>>;

impl RawCapture {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            samples: Vec::new(),
            sample_counts: Vec::new(),
            sample_rate,
        }
    }

    /// Wrap into a buffer that can be submitted for analysis
    pub fn into_buffer(self) -> CaptureBuffer {
        Arc::new(Mutex::new(self))
    }

    /// Store the samples of `channel`, growing the channel list as needed
    pub fn set_channel(&mut self, channel: usize, samples: Vec<f64>) {
        if self.samples.len() <= channel {
            self.samples.resize(channel + 1, None);
            self.sample_counts.resize(channel + 1, 0);
        }
        self.sample_counts[channel] = samples.len();
        self.samples[channel] = Some(samples);
    }

    /// Mark `channel` as having no new data
    pub fn clear_channel(&mut self, channel: usize) {
        if let Some(slot) = self.samples.get_mut(channel) {
            *slot = None;
        }
        if let Some(count) = self.sample_counts.get_mut(channel) {
            *count = 0;
        }
    }

    /// Valid samples of `channel`
    ///
    /// `None` if the channel has no data or a count of zero. A count larger
    /// than the array is clamped to the array length.
    pub fn channel_samples(&self, channel: usize) -> Option<&[f64]> {
        let samples = self.samples.get(channel)?.as_deref()?;
        let count = self
            .sample_counts
            .get(channel)
            .copied()
            .unwrap_or(samples.len());

        let count = if count > samples.len() {
            warn!(
                "Channel {} reports {} samples but only {} were delivered",
                channel,
                count,
                samples.len()
            );
            samples.len()
        } else {
            count
        };

        if count == 0 {
            None
        } else {
            Some(&samples[..count])
        }
    }
}

/// A capture locked for one analysis pass
///
/// Holds the acquisition mutex; dropping (or `release`) unlocks it.
pub struct PendingCapture {
    guard: ArcMutexGuard<RawMutex, RawCapture>,
}

impl PendingCapture {
    /// Lock `buffer`, waiting for the acquisition layer if it holds it
    pub fn lock(buffer: &CaptureBuffer) -> Self {
        Self {
            guard: buffer.lock_arc(),
        }
    }

    /// Lock `buffer` only if it is free right now
    pub fn try_lock(buffer: &CaptureBuffer) -> Option<Self> {
        buffer.try_lock_arc().map(|guard| Self { guard })
    }

    pub fn capture(&self) -> &RawCapture {
        &self.guard
    }

    /// Hand the raw buffers back to the acquisition layer
    pub fn release(self) {
        drop(self);
    }
}

impl std::fmt::Debug for PendingCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingCapture")
            .field("channels", &self.guard.samples.len())
            .field("sample_rate", &self.guard.sample_rate)
            .finish()
    }
}
