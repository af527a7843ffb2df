//! Window Generation and Application

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use thiserror::Error;

/// Standard deviation used for the Gaussian window
const GAUSS_SIGMA: f64 = 0.4;

/// Shape parameter used for the Kaiser window
const KAISER_ALPHA: f64 = 3.0 * PI;

/// Convergence threshold for the Bessel I0 series expansion
const BESSEL_EPSILON: f64 = 1e-21;

/// Errors during window generation and application
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WindowError {
    /// Requested window length is outside the valid domain
    #[error("window length must be at least 1, got {0}")]
    InvalidLength(usize),

    /// Buffer length inconsistent with the window length
    #[error("buffer of length {actual} does not match window length {expected}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Supported window functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowKind {
    /// Gaussian window (sigma = 0.4)
    Gauss,
    /// Hamming window
    Hamming,
    /// Hann window
    Hann,
    /// Bartlett (triangular, zero endpoints) window
    Bartlett,
    /// Triangular (non-zero endpoints) window
    Triangular,
    /// Bartlett-Hann window
    BartlettHann,
    /// Blackman window
    Blackman,
    /// Kaiser window (alpha = 3 pi)
    Kaiser,
    /// 4-term Blackman-Harris window
    BlackmanHarris,
}

/// Immutable coefficient sequence for one window function at one length
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    kind: WindowKind,
    coefficients: Box<[f64]>,
}

impl Window {
    /// Generate a window of the given kind and length
    ///
    /// Coefficients follow the textbook formulas over `len - 1`. A length
    /// of 1 yields the single coefficient `1.0` for every kind.
    pub fn generate(kind: WindowKind, len: usize) -> Result<Self, WindowError> {
        if len == 0 {
            return Err(WindowError::InvalidLength(len));
        }
        if len == 1 {
            return Ok(Self {
                kind,
                coefficients: Box::new([1.0]),
            });
        }

        let coefficients = (0..len)
            .map(|n| coefficient(kind, n, len))
            .collect::<Vec<f64>>()
            .into_boxed_slice();

        Ok(Self { kind, coefficients })
    }

    /// The window function this window was generated from
    pub fn kind(&self) -> WindowKind {
        self.kind
    }

    /// Number of coefficients
    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    /// Always false: zero-length windows cannot be constructed
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The coefficient sequence
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Multiply a frame element-wise by the window, writing into `out`
    ///
    /// Both slices must match the window length exactly.
    pub fn apply(&self, frame: &[f64], out: &mut [f64]) -> Result<(), WindowError> {
        let expected = self.coefficients.len();
        if frame.len() != expected {
            return Err(WindowError::LengthMismatch {
                expected,
                actual: frame.len(),
            });
        }
        if out.len() != expected {
            return Err(WindowError::LengthMismatch {
                expected,
                actual: out.len(),
            });
        }

        for ((o, &x), &w) in out.iter_mut().zip(frame).zip(self.coefficients.iter()) {
            *o = x * w;
        }
        Ok(())
    }
}

/// Coefficient `n` of a length-`len` window, `len >= 2`
fn coefficient(kind: WindowKind, n: usize, len: usize) -> f64 {
    let n = n as f64;
    let big_n = len as f64;
    let m = big_n - 1.0;

    match kind {
        WindowKind::Gauss => {
            let num = n - m / 2.0;
            let den = GAUSS_SIGMA * m / 2.0;
            (-0.5 * (num / den).powi(2)).exp()
        }
        WindowKind::Hamming => 0.53836 - 0.46164 * (2.0 * PI * n / m).cos(),
        WindowKind::Hann => 0.5 * (1.0 - (2.0 * PI * n / m).cos()),
        WindowKind::Bartlett => 2.0 / m * (m / 2.0 - (n - m / 2.0).abs()),
        WindowKind::Triangular => 2.0 / big_n * (big_n / 2.0 - (n - m / 2.0).abs()),
        WindowKind::BartlettHann => {
            0.62 - 0.5 * (n / m - 0.5).abs() - 0.38 * (2.0 * PI * n / m).cos()
        }
        WindowKind::Blackman => {
            0.42 - 0.5 * (2.0 * PI * n / m).cos() + 0.08 * (4.0 * PI * n / m).cos()
        }
        WindowKind::Kaiser => {
            let arg = KAISER_ALPHA * (1.0 - (2.0 * n / m - 1.0).powi(2)).sqrt();
            bessel_i0(arg) / bessel_i0(KAISER_ALPHA)
        }
        WindowKind::BlackmanHarris => {
            0.35875 - 0.48829 * (2.0 * PI * n / m).cos() + 0.14128 * (4.0 * PI * n / m).cos()
                - 0.01168 * (6.0 * PI * n / m).cos()
        }
    }
}

/// Zeroth-order modified Bessel function of the first kind
fn bessel_i0(x: f64) -> f64 {
    let mut sum = 1.0;
    let mut u = 1.0;
    let halfx = x / 2.0;
    let mut n = 1.0;

    loop {
        let temp = halfx / n;
        u *= temp * temp;
        sum += u;
        n += 1.0;
        if u < BESSEL_EPSILON * sum {
            break;
        }
    }
    sum
}
