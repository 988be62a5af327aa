//! Window Functions
//!
//! Coefficient tables applied to a capture before the spectral transform to
//! reduce leakage. Every table is generated over `end = length - 1`, so the
//! first and last coefficients sit on the window edges.
//!
//! A single sample has no edges (`end == 0`), which would divide by zero in
//! every tapered formula. That degenerate length always yields `[1.0]`.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Standard deviation of the Gauss window, relative to half the window
const GAUSS_SIGMA: f64 = 0.4;

/// Alpha of the (non-exact) Blackman window
const BLACKMAN_ALPHA: f64 = 0.16;

/// Window function selection for spectrum analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowFunction {
    #[default]
    Rectangular,
    Hamming,
    Hann,
    Cosine,
    Lanczos,
    Bartlett,
    Triangular,
    Gauss,
    BartlettHann,
    Blackman,
    Nuttall,
    BlackmanHarris,
    BlackmanNuttall,
    FlatTop,
}

impl WindowFunction {
    /// Every supported window, in display order
    pub const ALL: [WindowFunction; 14] = [
        WindowFunction::Rectangular,
        WindowFunction::Hamming,
        WindowFunction::Hann,
        WindowFunction::Cosine,
        WindowFunction::Lanczos,
        WindowFunction::Bartlett,
        WindowFunction::Triangular,
        WindowFunction::Gauss,
        WindowFunction::BartlettHann,
        WindowFunction::Blackman,
        WindowFunction::Nuttall,
        WindowFunction::BlackmanHarris,
        WindowFunction::BlackmanNuttall,
        WindowFunction::FlatTop,
    ];

    /// Human-readable name for UI/logging
    pub fn name(self) -> &'static str {
        match self {
            Self::Rectangular => "Rectangular",
            Self::Hamming => "Hamming",
            Self::Hann => "Hann",
            Self::Cosine => "Cosine",
            Self::Lanczos => "Lanczos",
            Self::Bartlett => "Bartlett",
            Self::Triangular => "Triangular",
            Self::Gauss => "Gauss",
            Self::BartlettHann => "Bartlett-Hann",
            Self::Blackman => "Blackman",
            Self::Nuttall => "Nuttall",
            Self::BlackmanHarris => "Blackman-Harris",
            Self::BlackmanNuttall => "Blackman-Nuttall",
            Self::FlatTop => "Flat top",
        }
    }

    /// Generate `length` coefficients for this window
    pub fn coefficients(self, length: usize) -> Vec<f64> {
        let mut coefficients = vec![0.0; length];
        self.fill(&mut coefficients);
        coefficients
    }

    /// Write the coefficients for `out.len()` samples into `out`
    pub fn fill(self, out: &mut [f64]) {
        let length = out.len();
        if length <= 1 {
            out.fill(1.0);
            return;
        }

        for (i, coefficient) in out.iter_mut().enumerate() {
            *coefficient = self.coefficient(i, length);
        }
    }

    /// Coefficient at position `i` of a window with `length >= 2` samples
    fn coefficient(self, i: usize, length: usize) -> f64 {
        let n = length as f64;
        let end = (length - 1) as f64;
        let i = i as f64;
        let phase = 2.0 * PI * i / end;

        match self {
            Self::Rectangular => 1.0,
            Self::Hamming => 0.54 - 0.46 * phase.cos(),
            Self::Hann => 0.5 * (1.0 - phase.cos()),
            Self::Cosine => (PI * i / end).sin(),
            Self::Lanczos => sinc((2.0 * i / end - 1.0) * PI),
            Self::Bartlett => 2.0 / end * (end / 2.0 - (i - end / 2.0).abs()),
            Self::Triangular => 2.0 / n * (n / 2.0 - (i - end / 2.0).abs()),
            Self::Gauss => {
                let x = (i - end / 2.0) / (GAUSS_SIGMA * end / 2.0);
                (-0.5 * x * x).exp()
            }
            Self::BartlettHann => 0.62 - 0.48 * (i / end - 0.5).abs() - 0.38 * phase.cos(),
            Self::Blackman => {
                (1.0 - BLACKMAN_ALPHA) / 2.0 - 0.5 * phase.cos()
                    + BLACKMAN_ALPHA / 2.0 * (2.0 * phase).cos()
            }
            Self::Nuttall => cosine_sum(&[0.355768, 0.487396, 0.144232, 0.012604], phase),
            Self::BlackmanHarris => cosine_sum(&[0.35875, 0.48829, 0.14128, 0.01168], phase),
            Self::BlackmanNuttall => {
                cosine_sum(&[0.3635819, 0.4891775, 0.1365995, 0.0106411], phase)
            }
            Self::FlatTop => cosine_sum(&[1.0, 1.93, 1.29, 0.388, 0.032], phase),
        }
    }
}

impl std::fmt::Display for WindowFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Normalized sinc with `sinc(0) == 1`
fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        x.sin() / x
    }
}

/// a0 - a1·cos(φ) + a2·cos(2φ) - a3·cos(3φ) + ...
fn cosine_sum(terms: &[f64], phase: f64) -> f64 {
    terms
        .iter()
        .enumerate()
        .map(|(k, a)| {
            let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
            sign * a * (k as f64 * phase).cos()
        })
        .sum()
}

/// Coefficient table reused across passes
///
/// Keyed by `(kind, length)`; the table is only regenerated when either
/// differs from the previous request.
#[derive(Debug, Default)]
pub struct WindowCache {
    kind: Option<WindowFunction>,
    coefficients: Vec<f64>,
}

impl WindowCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the cached table match `(kind, length)`
    ///
    /// Returns `true` if the coefficients had to be recomputed.
    pub fn ensure(&mut self, kind: WindowFunction, length: usize) -> bool {
        let length_changed = self.coefficients.len() != length;
        if self.kind == Some(kind) && !length_changed {
            return false;
        }

        if length_changed {
            self.coefficients = Vec::new();
            self.coefficients = vec![0.0; length];
        }
        kind.fill(&mut self.coefficients);
        self.kind = Some(kind);
        true
    }

    /// Window currently held, if any table was generated
    pub fn kind(&self) -> Option<WindowFunction> {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }
}
