//! Analysis Configuration
//!
//! Read-only settings snapshot taken at the start of every pass. The
//! settings store itself belongs to the application; this is the subset the
//! analyzer needs.

use serde::{Deserialize, Serialize};

use scope_dsp::{MathMode, Slope, SpectrumSettings, WindowFunction};

use crate::error::{AnalyzerError, AnalyzerResult};

/// Per-channel switches
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Time-domain trace (and its measurements) enabled
    pub voltage_used: bool,
    /// Spectrum trace enabled
    pub spectrum_used: bool,
    /// Trigger level in volts used for the measurements
    #[serde(default)]
    pub trigger_level: f64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            voltage_used: true,
            spectrum_used: false,
            trigger_level: 0.0,
        }
    }
}

impl ChannelConfig {
    /// Whether any trace of this channel is shown
    pub fn is_used(&self) -> bool {
        self.voltage_used || self.spectrum_used
    }
}

/// Math channel settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MathConfig {
    #[serde(flatten)]
    pub channel: ChannelConfig,
    /// Combination rule; `None` is a configuration error once the channel is used
    pub mode: Option<MathMode>,
}

impl Default for MathConfig {
    fn default() -> Self {
        Self {
            channel: ChannelConfig {
                voltage_used: false,
                spectrum_used: false,
                trigger_level: 0.0,
            },
            mode: Some(MathMode::Add),
        }
    }
}

/// Overall analyzer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// One entry per physical channel
    pub channels: Vec<ChannelConfig>,

    /// Derived channel appended after the physical ones
    #[serde(default)]
    pub math: Option<MathConfig>,

    /// Direction of counted trigger edges (shared by all channels)
    #[serde(default)]
    pub trigger_slope: Slope,

    /// Window applied before the spectral transform
    #[serde(default)]
    pub spectrum_window: WindowFunction,

    /// Spectrum reference level in dB
    #[serde(default)]
    pub spectrum_reference: f64,

    /// Spectrum limit (floor) in dB
    #[serde(default = "default_spectrum_limit")]
    pub spectrum_limit: f64,
}

fn default_spectrum_limit() -> f64 {
    -20.0
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            channels: vec![ChannelConfig::default(); 2],
            math: Some(MathConfig::default()),
            trigger_slope: Slope::Rising,
            spectrum_window: WindowFunction::Rectangular,
            spectrum_reference: 0.0,
            spectrum_limit: default_spectrum_limit(),
        }
    }
}

impl AnalysisConfig {
    /// Config with `physical` channels and the math channel present
    pub fn with_channels(physical: usize) -> Self {
        Self {
            channels: vec![ChannelConfig::default(); physical],
            ..Self::default()
        }
    }

    /// Number of physical channels
    pub fn physical_channels(&self) -> usize {
        self.channels.len()
    }

    /// Total channel slots (physical + math when present)
    pub fn channel_count(&self) -> usize {
        self.channels.len() + usize::from(self.math.is_some())
    }

    /// Index of the math channel, if configured
    pub fn math_index(&self) -> Option<usize> {
        self.math.as_ref().map(|_| self.channels.len())
    }

    /// Switches of channel slot `index` (physical or math)
    pub fn channel(&self, index: usize) -> Option<&ChannelConfig> {
        self.channels.get(index).or_else(|| match &self.math {
            Some(math) if index == self.channels.len() => Some(&math.channel),
            _ => None,
        })
    }

    pub fn channel_mut(&mut self, index: usize) -> Option<&mut ChannelConfig> {
        let physical = self.channels.len();
        if index < physical {
            return self.channels.get_mut(index);
        }
        match &mut self.math {
            Some(math) if index == physical => Some(&mut math.channel),
            _ => None,
        }
    }

    /// Spectrum settings shared by every channel of a pass
    pub fn spectrum_settings(&self) -> SpectrumSettings {
        SpectrumSettings {
            window: self.spectrum_window,
            reference_level: self.spectrum_reference,
            limit_level: self.spectrum_limit,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> AnalyzerResult<()> {
        if self.channels.is_empty() {
            return Err(AnalyzerError::ConfigError(
                "At least one physical channel is required".into(),
            ));
        }
        if !self.spectrum_reference.is_finite() {
            return Err(AnalyzerError::ConfigError(format!(
                "Invalid spectrum reference level: {}",
                self.spectrum_reference
            )));
        }
        if !self.spectrum_limit.is_finite() {
            return Err(AnalyzerError::ConfigError(format!(
                "Invalid spectrum limit level: {}",
                self.spectrum_limit
            )));
        }
        for index in 0..self.channel_count() {
            let level = self.channel(index).map_or(0.0, |c| c.trigger_level);
            if !level.is_finite() {
                return Err(AnalyzerError::ConfigError(format!(
                    "Invalid trigger level on channel {}: {}",
                    index, level
                )));
            }
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> AnalyzerResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| AnalyzerError::ConfigError(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> AnalyzerResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| AnalyzerError::ConfigError(format!("Failed to serialize config: {}", e)))
    }
}
