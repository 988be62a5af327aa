//! Spectrum Pipeline
//!
//! window → half-complex transform → dB conversion → floor clamp
//!
//! The transform needs scratch for the full capture length even though only
//! the first half (`count / 2` bins) is reported.

use crate::buffer::SampleBuffer;
use crate::error::{DspError, DspResult};
use crate::transform::HalfComplexTransform;
use crate::window::{WindowCache, WindowFunction};

/// Calibration and window selection for one pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumSettings {
    pub window: WindowFunction,
    /// dB value mapped to the top of the display
    pub reference_level: f64,
    /// Lowest dB value that is reported
    pub limit_level: f64,
}

impl Default for SpectrumSettings {
    fn default() -> Self {
        Self {
            window: WindowFunction::Rectangular,
            reference_level: 0.0,
            limit_level: -20.0,
        }
    }
}

/// dB offset applied to every bin of a spectrum with `bins` bins
pub fn decibel_offset(reference_level: f64, bins: usize) -> f64 {
    60.0 - reference_level - 20.0 * (bins as f64).sqrt().log10()
}

/// Convert one raw transform value to a calibrated dB value
///
/// `floor` raises values below it, it never lowers anything.
#[inline]
pub fn to_decibels(raw: f64, offset: f64, floor: f64) -> f64 {
    let value = 20.0 * raw.abs().log10() + offset;
    if floor > value {
        floor
    } else {
        value
    }
}

/// Reusable spectrum computation state
///
/// Holds the window table, the cached transform plan and the scratch
/// buffers. One instance serves all channels of a pass in sequence.
pub struct SpectrumPipeline {
    window: WindowCache,
    window_generations: u64,
    transform: HalfComplexTransform,
    windowed: Vec<f64>,
    raw: Vec<f64>,
}

impl SpectrumPipeline {
    pub fn new() -> Self {
        Self {
            window: WindowCache::new(),
            window_generations: 0,
            transform: HalfComplexTransform::new(),
            windowed: Vec::new(),
            raw: Vec::new(),
        }
    }

    /// Compute the spectrum of `time` into `spectrum`
    ///
    /// An empty time-domain buffer clears the spectrum.
    pub fn compute(
        &mut self,
        time: &SampleBuffer,
        settings: &SpectrumSettings,
        spectrum: &mut SampleBuffer,
    ) -> DspResult<()> {
        let n = time.count();
        if n == 0 {
            spectrum.clear();
            return Ok(());
        }
        if !(time.interval > 0.0 && time.interval.is_finite()) {
            return Err(DspError::InvalidSampleInterval(time.interval));
        }

        if self.window.ensure(settings.window, n) {
            self.window_generations += 1;
        }

        spectrum.interval = 1.0 / (time.interval * n as f64);
        spectrum.resize_discarding(n / 2);

        resize_scratch(&mut self.windowed, n);
        resize_scratch(&mut self.raw, n);

        for ((out, &w), &sample) in self
            .windowed
            .iter_mut()
            .zip(self.window.coefficients())
            .zip(time.samples())
        {
            *out = w * sample;
        }

        self.transform.process(&self.windowed, &mut self.raw)?;

        let bins = spectrum.count();
        let offset = decibel_offset(settings.reference_level, bins);
        let floor = settings.limit_level - settings.reference_level;
        for (out, &raw) in spectrum.samples_mut().iter_mut().zip(&self.raw) {
            *out = to_decibels(raw, offset, floor);
        }

        Ok(())
    }

    /// Window table currently cached
    pub fn window(&self) -> &WindowCache {
        &self.window
    }

    /// Number of times the window table has been (re)generated
    pub fn window_generations(&self) -> u64 {
        self.window_generations
    }
}

impl Default for SpectrumPipeline {
    fn default() -> Self {
        Self::new()
    }
}

fn resize_scratch(buffer: &mut Vec<f64>, len: usize) {
    if buffer.len() != len {
        *buffer = Vec::new();
        *buffer = vec![0.0; len];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn time_buffer(samples: &[f64], interval: f64) -> SampleBuffer {
        let mut buffer = SampleBuffer::new();
        buffer.resize_discarding(samples.len());
        buffer.samples_mut().copy_from_slice(samples);
        buffer.interval = interval;
        buffer
    }

    #[test]
    fn test_bin_count_and_interval() {
        let mut pipeline = SpectrumPipeline::new();
        let settings = SpectrumSettings::default();

        for (n, bins) in [(1024, 512), (1023, 511), (2, 1), (1, 0)] {
            let time = time_buffer(&vec![0.5; n], 1e-6);
            let mut spectrum = SampleBuffer::new();
            pipeline.compute(&time, &settings, &mut spectrum).unwrap();

            assert_eq!(spectrum.count(), bins, "n = {}", n);
            let expected_interval = 1.0 / (1e-6 * n as f64);
            assert!((spectrum.interval - expected_interval).abs() < 1e-6);
        }
    }

    #[test]
    fn test_empty_time_clears_spectrum() {
        let mut pipeline = SpectrumPipeline::new();
        let mut spectrum = SampleBuffer::new();
        spectrum.resize_discarding(16);
        spectrum.interval = 10.0;

        pipeline
            .compute(&SampleBuffer::new(), &SpectrumSettings::default(), &mut spectrum)
            .unwrap();
        assert_eq!(spectrum.count(), 0);
        assert_eq!(spectrum.interval, 0.0);
    }

    #[test]
    fn test_invalid_interval() {
        let mut pipeline = SpectrumPipeline::new();
        let time = time_buffer(&[1.0; 8], 0.0);
        let mut spectrum = SampleBuffer::new();

        let err = pipeline
            .compute(&time, &SpectrumSettings::default(), &mut spectrum)
            .unwrap_err();
        assert_eq!(err, DspError::InvalidSampleInterval(0.0));
    }

    #[test]
    fn test_peak_at_signal_bin() {
        // Cosine exactly on bin 32 of a 1024-point transform
        let n = 1024;
        let samples: Vec<f64> = (0..n).map(|i| (2.0 * PI * 32.0 * i as f64 / n as f64).cos()).collect();
        let time = time_buffer(&samples, 1e-3);

        let settings = SpectrumSettings {
            window: WindowFunction::Rectangular,
            reference_level: 0.0,
            limit_level: -200.0,
        };
        let mut pipeline = SpectrumPipeline::new();
        let mut spectrum = SampleBuffer::new();
        pipeline.compute(&time, &settings, &mut spectrum).unwrap();

        let (peak_bin, _) = spectrum
            .samples()
            .iter()
            .enumerate()
            .fold((0, f64::MIN), |best, (i, &v)| if v > best.1 { (i, v) } else { best });
        assert_eq!(peak_bin, 32);

        // |raw| = n/2 at the signal bin
        let expected = 20.0 * (n as f64 / 2.0).log10() + decibel_offset(0.0, n / 2);
        assert!((spectrum.samples()[32] - expected).abs() < 1e-6);
    }

    #[test]
    fn test_floor_raises_low_values() {
        let offset = decibel_offset(0.0, 512);
        let floor = -20.0;

        assert_eq!(to_decibels(0.0, offset, floor), floor);
        assert_eq!(to_decibels(1e-12, offset, floor), floor);

        let loud = to_decibels(1000.0, offset, floor);
        assert!(loud > floor);
        assert!((loud - (60.0 + offset)).abs() < 1e-9);
    }

    #[test]
    fn test_decibels_monotonic() {
        let offset = decibel_offset(-10.0, 256);
        let floor = f64::NEG_INFINITY;
        let mut previous = f64::NEG_INFINITY;
        for step in 1..200 {
            let raw = step as f64 * 0.37;
            let value = to_decibels(raw, offset, floor);
            assert!(value >= previous);
            assert_eq!(value, to_decibels(-raw, offset, floor));
            previous = value;
        }
    }

    #[test]
    fn test_reference_and_limit_shift_output() {
        let samples: Vec<f64> = (0..256).map(|i| (i as f64 * 0.2).sin()).collect();
        let time = time_buffer(&samples, 1e-4);
        let mut pipeline = SpectrumPipeline::new();

        let mut base = SampleBuffer::new();
        let settings = SpectrumSettings {
            window: WindowFunction::Hann,
            reference_level: 0.0,
            limit_level: -1000.0,
        };
        pipeline.compute(&time, &settings, &mut base).unwrap();

        let mut shifted = SampleBuffer::new();
        let settings = SpectrumSettings {
            reference_level: 10.0,
            ..settings
        };
        pipeline.compute(&time, &settings, &mut shifted).unwrap();

        for (a, b) in base.samples().iter().zip(shifted.samples()) {
            assert!((a - b - 10.0).abs() < 1e-9);
        }

        // Limit is relative to the reference level
        let settings = SpectrumSettings {
            reference_level: 5.0,
            limit_level: 25.0,
            ..settings
        };
        pipeline.compute(&time, &settings, &mut shifted).unwrap();
        assert!(shifted.samples().iter().all(|&v| v >= 20.0));
    }

    #[test]
    fn test_window_regenerated_only_on_change() {
        let mut pipeline = SpectrumPipeline::new();
        let time = time_buffer(&[0.25; 128], 1e-3);
        let mut spectrum = SampleBuffer::new();
        let mut settings = SpectrumSettings {
            window: WindowFunction::Blackman,
            ..SpectrumSettings::default()
        };

        pipeline.compute(&time, &settings, &mut spectrum).unwrap();
        pipeline.compute(&time, &settings, &mut spectrum).unwrap();
        assert_eq!(pipeline.window_generations(), 1);

        settings.window = WindowFunction::Nuttall;
        pipeline.compute(&time, &settings, &mut spectrum).unwrap();
        assert_eq!(pipeline.window_generations(), 2);
        assert_eq!(pipeline.window().kind(), Some(WindowFunction::Nuttall));

        let longer = time_buffer(&[0.25; 256], 1e-3);
        pipeline.compute(&longer, &settings, &mut spectrum).unwrap();
        assert_eq!(pipeline.window_generations(), 3);
        assert_eq!(pipeline.window().len(), 256);
    }
}
