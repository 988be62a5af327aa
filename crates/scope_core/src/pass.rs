//! Analysis Pass
//!
//! One run over a locked capture, in two phases:
//!
//! 1. Time domain: adapt the channel slots, copy physical channels, derive
//!    the math channel, then release the capture back to acquisition.
//! 2. Measurements and spectra, which no longer touch acquisition buffers.
//!
//! Failures are isolated per channel and collected in the [`PassReport`];
//! the remaining channels are still analyzed.

use tracing::{debug, warn};

use scope_dsp::{measure, SpectrumPipeline};

use crate::capture::{PendingCapture, RawCapture};
use crate::config::{AnalysisConfig, MathConfig};
use crate::error::{AnalyzerError, AnalyzerResult};
use crate::store::{AnalysisSet, ChannelAnalysis};

/// Outcome of one pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassReport {
    /// Channel slots after the pass
    pub channels: usize,
    /// Per-channel problems; empty on a clean pass
    pub errors: Vec<AnalyzerError>,
    /// Whether the capture was accepted and the set rewritten
    pub updated: bool,
}

impl PassReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Pass state that lives as long as the engine
///
/// Owns the spectrum pipeline, so the window table and transform plan are
/// reused between passes with the same record length.
#[derive(Default)]
pub struct Analyzer {
    spectrum: SpectrumPipeline,
}

impl Analyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spectrum state carried between passes
    pub fn spectrum_pipeline(&self) -> &SpectrumPipeline {
        &self.spectrum
    }

    /// Analyze `capture` into `set`
    ///
    /// The capture is released as soon as its samples are copied.
    pub fn run(
        &mut self,
        set: &mut AnalysisSet,
        capture: PendingCapture,
        config: &AnalysisConfig,
    ) -> PassReport {
        let mut report = PassReport::default();
        if time_domain_phase(set, capture, config, &mut report) {
            self.frequency_phase(set, config, &mut report);
        }
        report
    }

    /// Measurements and spectra over the copied time-domain data
    fn frequency_phase(&mut self, set: &mut AnalysisSet, config: &AnalysisConfig, report: &mut PassReport) {
        measure_channels(set, config);
        self.compute_spectra(set, config, report);
    }

    fn compute_spectra(&mut self, set: &mut AnalysisSet, config: &AnalysisConfig, report: &mut PassReport) {
        let settings = config.spectrum_settings();

        for (index, channel) in set.channels_mut().iter_mut().enumerate() {
            let used = config.channel(index).is_some_and(|c| c.spectrum_used);
            if !used || channel.time_domain.is_empty() {
                if !channel.freq_domain.is_empty() {
                    debug!("Releasing spectrum of channel {}", index);
                }
                channel.clear_freq_domain();
                continue;
            }

            if let Err(source) =
                self.spectrum
                    .compute(&channel.time_domain, &settings, &mut channel.freq_domain)
            {
                warn!("Spectrum of channel {} failed: {}", index, source);
                channel.clear_freq_domain();
                report.errors.push(AnalyzerError::Channel {
                    channel: index,
                    source,
                });
            }
        }
    }
}

/// Adapt the channel slots and copy the capture into them
///
/// Consumes the capture, so it is unlocked before any spectrum work starts.
/// Returns `false` when the capture was rejected and `set` left untouched.
fn time_domain_phase(
    set: &mut AnalysisSet,
    capture: PendingCapture,
    config: &AnalysisConfig,
    report: &mut PassReport,
) -> bool {
    let sample_rate = capture.capture().sample_rate;
    if !(sample_rate > 0.0 && sample_rate.is_finite()) {
        warn!("Discarding capture with invalid sample rate {}", sample_rate);
        report.channels = set.len();
        report.errors.push(AnalyzerError::InvalidSampleRate(sample_rate));
        return false;
    }

    let count = config.channel_count();
    if set.adapt(count) {
        debug!("Analysis set resized to {} channels", count);
    }
    report.channels = set.len();

    populate_time_domain(set, capture.capture(), config, report);
    capture.release();
    debug!("Time-domain data ready, capture released");

    report.updated = true;
    true
}

/// Copy physical channels and derive the math channel
fn populate_time_domain(
    set: &mut AnalysisSet,
    raw: &RawCapture,
    config: &AnalysisConfig,
    report: &mut PassReport,
) {
    let physical = config.physical_channels();
    let interval = 1.0 / raw.sample_rate;
    let channels = set.channels_mut();

    for index in 0..channels.len() {
        if index < physical {
            let time = &mut channels[index].time_domain;
            match raw.channel_samples(index) {
                Some(samples) => {
                    time.interval = interval;
                    time.resize_discarding(samples.len());
                    time.samples_mut().copy_from_slice(samples);
                }
                None => time.clear(),
            }
            continue;
        }

        let derived = match &config.math {
            Some(math) => derive_math_channel(channels, index, math),
            None => Ok(false),
        };
        match derived {
            Ok(true) => {}
            Ok(false) => channels[index].clear_time_domain(),
            Err(err) => {
                warn!("Math channel not computed: {}", err);
                channels[index].clear_time_domain();
                report.errors.push(err);
            }
        }
    }
}

/// Compute the math channel at `index` from the first two channels
///
/// Returns `Ok(false)` when the channel is unused or its sources have no
/// data yet.
fn derive_math_channel(
    channels: &mut [ChannelAnalysis],
    index: usize,
    math: &MathConfig,
) -> AnalyzerResult<bool> {
    if !math.channel.is_used() {
        return Ok(false);
    }
    if index < 2 {
        return Err(AnalyzerError::MathChannelUnavailable(index));
    }
    let mode = math.mode.ok_or(AnalyzerError::MathModeUnset)?;

    let (sources, rest) = channels.split_at_mut(index);
    let a = &sources[0].time_domain;
    let b = &sources[1].time_domain;
    if a.is_empty() || b.is_empty() {
        return Ok(false);
    }

    let target = &mut rest[0].time_domain;
    target.interval = a.interval;
    target.resize_discarding(a.count());
    mode.combine(a.samples(), b.samples(), target.samples_mut())
        .map_err(|source| AnalyzerError::Channel {
            channel: index,
            source,
        })?;
    Ok(true)
}

/// Peak-to-peak and frequency for every channel with its voltage trace on
fn measure_channels(set: &mut AnalysisSet, config: &AnalysisConfig) {
    for (index, channel) in set.channels_mut().iter_mut().enumerate() {
        let Some(channel_config) = config.channel(index) else {
            continue;
        };
        if !channel_config.voltage_used || channel.time_domain.is_empty() {
            continue;
        }

        let result = measure(
            channel.time_domain.samples(),
            channel.time_domain.interval,
            channel_config.trigger_level,
            config.trigger_slope,
        );
        channel.amplitude = result.amplitude;
        channel.frequency = result.frequency;
    }
}
