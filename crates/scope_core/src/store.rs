//! Channel Buffer Store
//!
//! Analyzed data for every channel slot: physical channels first, then the
//! math channel when configured.

use scope_dsp::SampleBuffer;

/// Analysis results of one channel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelAnalysis {
    /// Voltage samples, `interval` in seconds
    pub time_domain: SampleBuffer,
    /// Spectrum in dB, `interval` in Hz per bin
    pub freq_domain: SampleBuffer,
    /// Peak-to-peak voltage
    pub amplitude: f64,
    /// Fundamental frequency in Hz (0 if undetermined)
    pub frequency: f64,
}

impl ChannelAnalysis {
    /// Release the time-domain samples and reset their interval
    pub fn clear_time_domain(&mut self) {
        self.time_domain.clear();
    }

    /// Release the spectrum samples and reset their interval
    pub fn clear_freq_domain(&mut self) {
        self.freq_domain.clear();
    }
}

/// Analyzed data of all channels
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisSet {
    channels: Vec<ChannelAnalysis>,
}

impl AnalysisSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grow or shrink to exactly `count` channel slots
    ///
    /// New slots start zeroed; removed slots are dropped from the end
    /// together with their buffers. Returns `true` if the length changed.
    pub fn adapt(&mut self, count: usize) -> bool {
        let previous = self.channels.len();
        if previous == count {
            return false;
        }

        if count < previous {
            self.channels.truncate(count);
            self.channels.shrink_to_fit();
        } else {
            self.channels.resize_with(count, ChannelAnalysis::default);
        }
        true
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Analysis of channel `index`, `None` when out of range
    pub fn channel(&self, index: usize) -> Option<&ChannelAnalysis> {
        self.channels.get(index)
    }

    pub fn channel_mut(&mut self, index: usize) -> Option<&mut ChannelAnalysis> {
        self.channels.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChannelAnalysis> {
        self.channels.iter()
    }

    pub(crate) fn channels_mut(&mut self) -> &mut [ChannelAnalysis] {
        &mut self.channels
    }
}

impl<'a> IntoIterator for &'a AnalysisSet {
    type Item = &'a ChannelAnalysis;
    type IntoIter = std::slice::Iter<'a, ChannelAnalysis>;

    fn into_iter(self) -> Self::IntoIter {
        self.channels.iter()
    }
}
