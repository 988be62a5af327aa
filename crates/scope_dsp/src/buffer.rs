//! Sample Buffer
//!
//! Owned, resizable storage for one domain (time or frequency) of a channel.
//! Resizing is destructive: a buffer whose length changes is released and
//! replaced by a fresh zeroed allocation, prior contents are not carried over.

/// Samples plus the spacing between them
///
/// `interval` is seconds per sample for time-domain data and Hz per bin for
/// frequency-domain data. The stored length is always the live length, there
/// is no separate capacity bookkeeping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleBuffer {
    samples: Vec<f64>,
    /// Distance between two neighbouring samples
    pub interval: f64,
}

impl SampleBuffer {
    /// Create an empty buffer (no samples, interval 0)
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of samples currently held
    #[inline]
    pub fn count(&self) -> usize {
        self.samples.len()
    }

    /// Whether the buffer holds no samples
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [f64] {
        &mut self.samples
    }

    /// Ensure the buffer holds exactly `count` samples
    ///
    /// Returns `true` when a new allocation was made. If the count is
    /// unchanged the existing allocation and its contents are reused.
    pub fn resize_discarding(&mut self, count: usize) -> bool {
        if self.samples.len() == count {
            return false;
        }

        // Release first so old and new allocations never coexist
        self.samples = Vec::new();
        self.samples = vec![0.0; count];
        true
    }

    /// Release the samples and reset the interval
    pub fn clear(&mut self) {
        self.samples = Vec::new();
        self.interval = 0.0;
    }
}
