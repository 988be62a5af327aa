//! Math Channel
//!
//! Element-wise combination of the first two physical channels.

use serde::{Deserialize, Serialize};

use crate::error::{DspError, DspResult};

/// Combination rule for the math channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MathMode {
    /// CH1 + CH2
    #[serde(rename = "A+B")]
    Add,
    /// CH1 - CH2
    #[serde(rename = "A-B")]
    Subtract,
    /// CH2 - CH1
    #[serde(rename = "B-A")]
    ReverseSubtract,
}

impl MathMode {
    pub const ALL: [MathMode; 3] = [MathMode::Add, MathMode::Subtract, MathMode::ReverseSubtract];

    /// Short label for UI/logging
    pub fn label(self) -> &'static str {
        match self {
            Self::Add => "A+B",
            Self::Subtract => "A-B",
            Self::ReverseSubtract => "B-A",
        }
    }

    #[inline]
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            Self::Add => a + b,
            Self::Subtract => a - b,
            Self::ReverseSubtract => b - a,
        }
    }

    /// Combine `a` and `b` into `out`
    ///
    /// All three slices must have the same length.
    pub fn combine(self, a: &[f64], b: &[f64], out: &mut [f64]) -> DspResult<()> {
        if b.len() != a.len() {
            return Err(DspError::BufferSizeMismatch {
                expected: a.len(),
                got: b.len(),
            });
        }
        if out.len() != a.len() {
            return Err(DspError::BufferSizeMismatch {
                expected: a.len(),
                got: out.len(),
            });
        }

        for ((out, &a), &b) in out.iter_mut().zip(a).zip(b) {
            *out = self.apply(a, b);
        }
        Ok(())
    }
}

impl std::fmt::Display for MathMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
