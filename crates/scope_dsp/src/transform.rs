//! Real to Half-Complex Transform
//!
//! Runs a forward FFT over real input and packs the result into the classic
//! half-complex layout, which has the same length as the input:
//!
//! ```text
//! [ r0, r1, r2, ..., r(n/2), i((n+1)/2 - 1), ..., i2, i1 ]
//! ```
//!
//! `rk`/`ik` are the real and imaginary parts of bin `k`. Magnitude
//! extraction is left to the caller.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::error::{DspError, DspResult};

/// Forward FFT plan for one input length
struct Plan {
    length: usize,
    fft: Arc<dyn Fft<f64>>,
}

/// Half-complex transform with a single cached plan
///
/// The plan and working buffers are kept for the most recent input length and
/// replaced when a different length is requested.
pub struct HalfComplexTransform {
    plan: Option<Plan>,
    /// Working buffer for the complex FFT
    buffer: Vec<Complex<f64>>,
    /// Scratch space required by the plan
    scratch: Vec<Complex<f64>>,
}

impl HalfComplexTransform {
    pub fn new() -> Self {
        Self {
            plan: None,
            buffer: Vec::new(),
            scratch: Vec::new(),
        }
    }

    /// Length the cached plan was built for, if any
    pub fn planned_length(&self) -> Option<usize> {
        self.plan.as_ref().map(|plan| plan.length)
    }

    /// Transform `input` into `output` (both of the same length)
    pub fn process(&mut self, input: &[f64], output: &mut [f64]) -> DspResult<()> {
        let n = input.len();
        if output.len() != n {
            return Err(DspError::BufferSizeMismatch {
                expected: n,
                got: output.len(),
            });
        }
        if n == 0 {
            return Ok(());
        }

        let fft = self.plan_for(n);

        for (slot, &sample) in self.buffer.iter_mut().zip(input) {
            *slot = Complex::new(sample, 0.0);
        }
        fft.process_with_scratch(&mut self.buffer, &mut self.scratch);

        pack_half_complex(&self.buffer, output);
        Ok(())
    }

    fn plan_for(&mut self, length: usize) -> Arc<dyn Fft<f64>> {
        if let Some(plan) = &self.plan {
            if plan.length == length {
                return Arc::clone(&plan.fft);
            }
        }

        // Release the old plan's buffers before building the new one
        self.plan = None;
        self.buffer = Vec::new();
        self.scratch = Vec::new();

        let fft = FftPlanner::<f64>::new().plan_fft_forward(length);
        self.buffer = vec![Complex::new(0.0, 0.0); length];
        self.scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];
        self.plan = Some(Plan {
            length,
            fft: Arc::clone(&fft),
        });
        fft
    }
}

impl Default for HalfComplexTransform {
    fn default() -> Self {
        Self::new()
    }
}

/// Pack a full complex spectrum of real input into half-complex order
fn pack_half_complex(spectrum: &[Complex<f64>], output: &mut [f64]) {
    let n = spectrum.len();

    for k in 0..=n / 2 {
        output[k] = spectrum[k].re;
    }
    for k in 1..(n + 1) / 2 {
        output[n - k] = spectrum[k].im;
    }
}
