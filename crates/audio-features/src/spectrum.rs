//! Spectral Transform Engine

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::FeatureError;

/// Sample rate assumed when the argument vector supplies no bin spacing (Hz)
const DEFAULT_SAMPLE_RATE: f64 = 44_100.0;

/// Linear power below this threshold clamps to the decibel floor
const LOG_LIMIT: f64 = 2e-42;

/// Decibel floor for log spectra
const LOG_LIMIT_DB: f64 = -96.0;

/// Offset mapping the decibel floor to zero in scaled log spectra
const DB_SCALE_OFFSET: f64 = 96.0;

/// Per-bin derivation applied to the transform output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpectrumKind {
    /// `sqrt(re^2 + im^2) / N` per bin
    Magnitude,
    /// Natural log of the magnitude, floored and scaled into [0, 1]
    LogMagnitude,
    /// `(re^2 + im^2) / N^2` per bin
    Power,
    /// Natural log of the power, floored and scaled into [0, 1]
    LogPower,
}

/// Cached transform state for one frame length and spectrum kind
struct Plan {
    frame_len: usize,
    kind: SpectrumKind,
    fft: Arc<dyn Fft<f64>>,
    scratch: Vec<Complex<f64>>,
}

/// Computes one-sided spectra from time-domain frames
///
/// The engine starts uninitialised. [`SpectrumEngine::init`] plans the
/// transform for one frame length and caches the twiddle data until the
/// next `init` or [`SpectrumEngine::reset`]. Transform calls accept only
/// frames of the planned length. `init` and `compute` take `&mut self`,
/// so a single engine cannot be used concurrently; independent engines
/// share no state and may run in parallel.
#[derive(Default)]
pub struct SpectrumEngine {
    plan: Option<Plan>,
}

impl SpectrumEngine {
    /// Create an uninitialised engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Plan the transform for frames of length `frame_len`
    ///
    /// Replaces any previous plan. Only power-of-two lengths of at least 2
    /// are supported by the radix-2 transform.
    pub fn init(&mut self, frame_len: usize, kind: SpectrumKind) -> Result<(), FeatureError> {
        if frame_len < 2 {
            return Err(FeatureError::InvalidArgument {
                reason: "transform length must be at least 2",
            });
        }
        if !frame_len.is_power_of_two() {
            return Err(FeatureError::UnsupportedSize { size: frame_len });
        }

        let fft = FftPlanner::new().plan_fft_forward(frame_len);
        let scratch = vec![Complex::new(0.0, 0.0); frame_len];
        self.plan = Some(Plan {
            frame_len,
            kind,
            fft,
            scratch,
        });

        debug!(frame_len, ?kind, "spectrum plan initialised");
        Ok(())
    }

    /// Release the cached plan, returning to the uninitialised state
    pub fn reset(&mut self) {
        self.plan = None;
    }

    /// Whether a plan is cached
    pub fn is_ready(&self) -> bool {
        self.plan.is_some()
    }

    /// Planned frame length, if initialised
    pub fn frame_len(&self) -> Option<usize> {
        self.plan.as_ref().map(|plan| plan.frame_len)
    }

    /// Planned spectrum kind, if initialised
    pub fn kind(&self) -> Option<SpectrumKind> {
        self.plan.as_ref().map(|plan| plan.kind)
    }

    /// Number of one-sided output bins (`frame_len / 2 + 1`), if initialised
    pub fn output_len(&self) -> Option<usize> {
        self.plan.as_ref().map(|plan| plan.frame_len / 2 + 1)
    }

    /// Transform a frame and write its one-sided spectrum into `out`
    ///
    /// Bins are written in ascending frequency order, DC through Nyquist.
    /// `args[0]`, when present and non-zero, is the bin spacing in Hz;
    /// absent or zero falls back to `44100 / N`. The frame must match the
    /// planned length and `out` must hold exactly `frame_len / 2 + 1`
    /// values. Nothing is written on failure.
    pub fn compute(
        &mut self,
        frame: &[f64],
        args: Option<&[f64]>,
        out: &mut [f64],
    ) -> Result<(), FeatureError> {
        let plan = self
            .plan
            .as_mut()
            .ok_or(FeatureError::NotReady {
                requested: frame.len(),
            })?;

        if frame.len() != plan.frame_len {
            return Err(FeatureError::SizeMismatch {
                expected: plan.frame_len,
                actual: frame.len(),
            });
        }
        let bins = plan.frame_len / 2 + 1;
        if out.len() != bins {
            return Err(FeatureError::SizeMismatch {
                expected: bins,
                actual: out.len(),
            });
        }
        bin_spacing(args, plan.frame_len)?;

        for (slot, &sample) in plan.scratch.iter_mut().zip(frame) {
            *slot = Complex::new(sample, 0.0);
        }
        plan.fft.process(&mut plan.scratch);

        let n = plan.frame_len as f64;
        match plan.kind {
            SpectrumKind::Magnitude => {
                for (slot, c) in out.iter_mut().zip(&plan.scratch[..bins]) {
                    *slot = c.norm() / n;
                }
            }
            SpectrumKind::Power => {
                for (slot, c) in out.iter_mut().zip(&plan.scratch[..bins]) {
                    *slot = c.norm_sqr() / (n * n);
                }
            }
            SpectrumKind::LogMagnitude => {
                for (slot, c) in out.iter_mut().zip(&plan.scratch[..bins]) {
                    let power = c.norm_sqr();
                    let db = if power > LOG_LIMIT {
                        (power.sqrt() / n).ln()
                    } else {
                        LOG_LIMIT_DB
                    };
                    *slot = (db + DB_SCALE_OFFSET) / DB_SCALE_OFFSET;
                }
            }
            SpectrumKind::LogPower => {
                for (slot, c) in out.iter_mut().zip(&plan.scratch[..bins]) {
                    let power = c.norm_sqr();
                    let db = if power > LOG_LIMIT {
                        (power / (n * n)).ln()
                    } else {
                        LOG_LIMIT_DB
                    };
                    *slot = (db + DB_SCALE_OFFSET) / DB_SCALE_OFFSET;
                }
            }
        }
        Ok(())
    }

    /// Write the centre frequency of each one-sided bin into `out`
    ///
    /// Uses the same argument-vector convention as [`SpectrumEngine::compute`].
    pub fn bin_frequencies(
        &self,
        args: Option<&[f64]>,
        out: &mut [f64],
    ) -> Result<(), FeatureError> {
        let plan = self
            .plan
            .as_ref()
            .ok_or(FeatureError::NotReady {
                requested: out.len(),
            })?;

        let bins = plan.frame_len / 2 + 1;
        if out.len() != bins {
            return Err(FeatureError::SizeMismatch {
                expected: bins,
                actual: out.len(),
            });
        }
        let spacing = bin_spacing(args, plan.frame_len)?;

        for (bin, slot) in out.iter_mut().enumerate() {
            *slot = bin as f64 * spacing;
        }
        Ok(())
    }
}

/// Effective bin spacing from the argument vector
pub(crate) fn bin_spacing(args: Option<&[f64]>, frame_len: usize) -> Result<f64, FeatureError> {
    let q = args.and_then(|values| values.first().copied()).unwrap_or(0.0);
    if q == 0.0 {
        return Ok(DEFAULT_SAMPLE_RATE / frame_len as f64);
    }
    if !q.is_finite() || q < 0.0 {
        return Err(FeatureError::InvalidArgument {
            reason: "bin spacing must be positive and finite",
        });
    }
    Ok(q)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_engine(frame_len: usize, kind: SpectrumKind) -> SpectrumEngine {
        let mut engine = SpectrumEngine::new();
        engine.init(frame_len, kind).unwrap();
        engine
    }

    #[test]
    fn test_uninitialised_engine_rejects_compute() {
        let mut engine = SpectrumEngine::new();
        let mut out = [0.0; 5];
        let err = engine.compute(&[0.0; 8], None, &mut out).unwrap_err();
        assert_eq!(err, FeatureError::NotReady { requested: 8 });
    }

    #[test]
    fn test_wrong_frame_length_rejected() {
        let mut engine = ready_engine(8, SpectrumKind::Magnitude);
        let mut out = [0.0; 5];
        let err = engine.compute(&[0.0; 16], None, &mut out).unwrap_err();
        assert_eq!(
            err,
            FeatureError::SizeMismatch {
                expected: 8,
                actual: 16
            }
        );
    }

    #[test]
    fn test_undersized_result_buffer_rejected() {
        let mut engine = ready_engine(8, SpectrumKind::Magnitude);
        let mut out = [0.0; 4];
        let err = engine.compute(&[0.0; 8], None, &mut out).unwrap_err();
        assert_eq!(
            err,
            FeatureError::SizeMismatch {
                expected: 5,
                actual: 4
            }
        );
    }

    #[test]
    fn test_non_power_of_two_unsupported() {
        let mut engine = SpectrumEngine::new();
        let err = engine.init(12, SpectrumKind::Magnitude).unwrap_err();
        assert_eq!(err, FeatureError::UnsupportedSize { size: 12 });
        assert!(!engine.is_ready());
    }

    #[test]
    fn test_degenerate_length_rejected() {
        let mut engine = SpectrumEngine::new();
        let err = engine.init(1, SpectrumKind::Magnitude).unwrap_err();
        assert!(matches!(err, FeatureError::InvalidArgument { .. }));
    }

    #[test]
    fn test_zero_frame_has_zero_spectrum() {
        for kind in [SpectrumKind::Magnitude, SpectrumKind::Power] {
            let mut engine = ready_engine(16, kind);
            let mut out = [f64::NAN; 9];
            engine.compute(&[0.0; 16], None, &mut out).unwrap();
            assert!(out.iter().all(|&bin| bin == 0.0));
        }
    }

    #[test]
    fn test_log_spectrum_of_silence_is_scaled_floor() {
        let mut engine = ready_engine(16, SpectrumKind::LogMagnitude);
        let mut out = [f64::NAN; 9];
        engine.compute(&[0.0; 16], None, &mut out).unwrap();
        assert!(out.iter().all(|&bin| bin.abs() < 1e-12));
    }

    #[test]
    fn test_constant_frame_concentrates_in_dc() {
        let mut engine = ready_engine(16, SpectrumKind::Magnitude);
        let mut out = [0.0; 9];
        engine.compute(&[1.0; 16], None, &mut out).unwrap();
        assert!((out[0] - 1.0).abs() < 1e-12);
        for &bin in &out[1..] {
            assert!(bin.abs() < 1e-12);
        }
    }

    #[test]
    fn test_sine_wave_dominant_bin() {
        let mut engine = ready_engine(64, SpectrumKind::Magnitude);
        let frame: Vec<f64> = (0..64)
            .map(|i| (2.0 * std::f64::consts::PI * 8.0 * i as f64 / 64.0).sin())
            .collect();
        let mut out = [0.0; 33];
        engine.compute(&frame, Some(&[1.0]), &mut out).unwrap();

        let dominant = out
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(bin, _)| bin)
            .unwrap();
        assert_eq!(dominant, 8);
    }

    #[test]
    fn test_power_is_squared_magnitude() {
        let frame: Vec<f64> = (0..32).map(|i| ((i * 7 % 13) as f64) - 6.0).collect();
        let mut magnitude = [0.0; 17];
        let mut power = [0.0; 17];

        ready_engine(32, SpectrumKind::Magnitude)
            .compute(&frame, None, &mut magnitude)
            .unwrap();
        ready_engine(32, SpectrumKind::Power)
            .compute(&frame, None, &mut power)
            .unwrap();

        for (m, p) in magnitude.iter().zip(&power) {
            assert!((m * m - p).abs() < 1e-9);
        }
    }

    #[test]
    fn test_reinit_replaces_plan() {
        let mut engine = ready_engine(8, SpectrumKind::Magnitude);
        engine.init(16, SpectrumKind::Power).unwrap();
        assert_eq!(engine.frame_len(), Some(16));
        assert_eq!(engine.kind(), Some(SpectrumKind::Power));
        assert_eq!(engine.output_len(), Some(9));
    }

    #[test]
    fn test_reset_releases_plan() {
        let mut engine = ready_engine(8, SpectrumKind::Magnitude);
        engine.reset();
        assert!(!engine.is_ready());
        let mut out = [0.0; 5];
        assert!(matches!(
            engine.compute(&[0.0; 8], None, &mut out),
            Err(FeatureError::NotReady { .. })
        ));
    }

    #[test]
    fn test_bin_frequencies_use_supplied_spacing() {
        let engine = ready_engine(8, SpectrumKind::Magnitude);
        let mut freqs = [0.0; 5];
        engine.bin_frequencies(Some(&[5512.5]), &mut freqs).unwrap();
        assert_eq!(freqs, [0.0, 5512.5, 11025.0, 16537.5, 22050.0]);
    }

    #[test]
    fn test_bin_spacing_defaults_when_absent() {
        assert_eq!(bin_spacing(None, 8).unwrap(), 44_100.0 / 8.0);
        assert_eq!(bin_spacing(Some(&[0.0]), 8).unwrap(), 44_100.0 / 8.0);
        assert_eq!(bin_spacing(Some(&[100.0]), 8).unwrap(), 100.0);
        assert!(bin_spacing(Some(&[-1.0]), 8).is_err());
        assert!(bin_spacing(Some(&[f64::NAN]), 8).is_err());
    }
}
