//! Subframe Feature Pipeline

use serde::{Deserialize, Serialize};
use tracing::debug;
use windowing::Window;

use crate::error::FeatureError;
use crate::spectrum::{bin_spacing, SpectrumEngine};
use crate::statistics::ScalarFeature;

/// Per-subframe computation applied by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubframeFeature {
    /// The windowed samples themselves (output length = subframe length)
    Windowed,
    /// One-sided spectrum of the windowed subframe (output length = S/2 + 1)
    WindowedSpectrum,
    /// A scalar feature of the windowed subframe (output length = 1)
    Scalar(ScalarFeature),
}

/// Splits a frame into consecutive subframes, windows each, and routes it
/// through the selected feature, concatenating outputs in subframe order
///
/// The subframe length is the window length. Samples beyond the last full
/// subframe are ignored.
#[derive(Debug, Clone)]
pub struct SubframePipeline {
    window: Window,
    feature: SubframeFeature,
}

impl SubframePipeline {
    /// Create a pipeline from a window and a per-subframe feature
    pub fn new(window: Window, feature: SubframeFeature) -> Self {
        Self { window, feature }
    }

    /// Subframe length S, equal to the window length
    pub fn subframe_len(&self) -> usize {
        self.window.len()
    }

    /// Output values produced per subframe
    pub fn output_len_per_subframe(&self) -> usize {
        match self.feature {
            SubframeFeature::Windowed => self.window.len(),
            SubframeFeature::WindowedSpectrum => self.window.len() / 2 + 1,
            SubframeFeature::Scalar(_) => ScalarFeature::OUTPUT_LEN,
        }
    }

    /// Number of full subframes a frame of `frame_len` samples yields
    pub fn subframe_count(&self, frame_len: usize) -> usize {
        frame_len / self.window.len()
    }

    /// Required result-buffer length for a frame of `frame_len` samples
    pub fn output_len(&self, frame_len: usize) -> usize {
        self.subframe_count(frame_len) * self.output_len_per_subframe()
    }

    /// Run the pipeline over `frame`, writing concatenated results to `out`
    ///
    /// For [`SubframeFeature::WindowedSpectrum`] the engine must already be
    /// initialised for the subframe length; the other features leave the
    /// engine untouched. The argument vector is forwarded unchanged to the
    /// selected feature. All validation happens before the first write, so
    /// `out` is never partially populated.
    pub fn process(
        &self,
        engine: &mut SpectrumEngine,
        frame: &[f64],
        args: Option<&[f64]>,
        out: &mut [f64],
    ) -> Result<(), FeatureError> {
        let subframe_len = self.window.len();
        let count = frame.len() / subframe_len;
        if count == 0 {
            return Err(FeatureError::InvalidArgument {
                reason: "frame is shorter than one subframe",
            });
        }

        let per_subframe = self.output_len_per_subframe();
        let expected = count * per_subframe;
        if out.len() != expected {
            return Err(FeatureError::SizeMismatch {
                expected,
                actual: out.len(),
            });
        }

        match self.feature {
            SubframeFeature::WindowedSpectrum => {
                match engine.frame_len() {
                    Some(planned) if planned == subframe_len => {}
                    _ => {
                        return Err(FeatureError::NotReady {
                            requested: subframe_len,
                        })
                    }
                }
                bin_spacing(args, subframe_len)?;
            }
            SubframeFeature::Scalar(feature) => feature.validate_args(args)?,
            SubframeFeature::Windowed => {}
        }

        debug!(
            subframes = count,
            subframe_len,
            ignored = frame.len() - count * subframe_len,
            "processing subframes"
        );

        let mut windowed = vec![0.0; subframe_len];
        for index in 0..count {
            let subframe = &frame[index * subframe_len..(index + 1) * subframe_len];
            self.window.apply(subframe, &mut windowed)?;

            let slot = &mut out[index * per_subframe..(index + 1) * per_subframe];
            match self.feature {
                SubframeFeature::Windowed => slot.copy_from_slice(&windowed),
                SubframeFeature::WindowedSpectrum => engine.compute(&windowed, args, slot)?,
                SubframeFeature::Scalar(feature) => feature.apply(&windowed, args, slot)?,
            }
        }
        Ok(())
    }
}
