//! Trigger-Based Measurements
//!
//! Derives peak-to-peak amplitude and fundamental frequency from a captured
//! waveform by counting trigger crossings in the configured direction.
//!
//! # Algorithm
//!
//! Walking the samples, a change of "sample above trigger level" is a
//! crossing. Only crossings matching the slope are counted edges:
//! - The first counted edge starts the measurement window.
//! - Every further counted edge closes one full period. The swing
//!   (`max - min`) seen since the previous counted edge is accumulated and
//!   the running extrema restart at the edge sample.
//! - Crossings in the other direction flip the state but are folded into
//!   the current half-cycle (the crossing sample is not tracked).
//!
//! With at least one full period the amplitude is the mean swing per period
//! and the frequency is periods per elapsed time. Otherwise the result falls
//! back to the swing of the whole buffer and a frequency of 0.

use serde::{Deserialize, Serialize};

/// Direction of a counted trigger edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Slope {
    #[default]
    Rising,
    Falling,
}

impl Slope {
    /// "Above trigger" state that a counted edge ends in
    #[inline]
    fn ends_above(self) -> bool {
        self == Slope::Rising
    }
}

/// Result of measuring one channel
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Measurement {
    /// Peak-to-peak voltage
    pub amplitude: f64,
    /// Fundamental frequency in Hz (0 when undetermined)
    pub frequency: f64,
}

/// Measure amplitude and frequency of a time-domain buffer
///
/// # Arguments
/// * `samples` - Time-domain samples
/// * `sample_interval` - Seconds between two samples
/// * `trigger_level` - Level a crossing is detected against
/// * `slope` - Direction of the counted edges
pub fn measure(samples: &[f64], sample_interval: f64, trigger_level: f64, slope: Slope) -> Measurement {
    let Some(&first) = samples.first() else {
        return Measurement::default();
    };

    let mut above = first > trigger_level;
    let (mut min, mut max) = (first, first);
    let (mut global_min, mut global_max) = (first, first);

    // Full periods observed; None until the first counted edge
    let mut periods: Option<u32> = None;
    let mut first_edge = 0usize;
    let mut last_edge = 0usize;
    let mut accumulated = 0.0;

    for (position, &sample) in samples.iter().enumerate() {
        global_min = global_min.min(sample);
        global_max = global_max.max(sample);

        let is_above = sample > trigger_level;
        if is_above != above {
            above = is_above;
            if above != slope.ends_above() {
                continue;
            }

            match periods.as_mut() {
                None => {
                    periods = Some(0);
                    first_edge = position;
                }
                Some(count) => {
                    *count += 1;
                    accumulated += max - min;
                }
            }
            min = sample;
            max = sample;
            last_edge = position;
        } else if sample < min {
            min = sample;
        } else if sample > max {
            max = sample;
        }
    }

    match periods {
        Some(count) if count > 0 => {
            let count = f64::from(count);
            let span = last_edge - first_edge;
            let frequency = if span > 0 && sample_interval > 0.0 {
                count / span as f64 / sample_interval
            } else {
                0.0
            };
            Measurement {
                amplitude: accumulated / count,
                frequency,
            }
        }
        _ => Measurement {
            amplitude: global_max - global_min,
            frequency: 0.0,
        },
    }
}
