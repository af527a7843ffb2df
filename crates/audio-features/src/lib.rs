//! Audio Feature Extraction
//!
//! Provides statistical and spectral feature extraction over fixed-length
//! audio frames: scalar descriptive statistics, one-sided spectra, and
//! windowed subframe analysis.

mod error;
mod pipeline;
mod spectrum;
mod statistics;

pub use error::FeatureError;
pub use pipeline::{SubframeFeature, SubframePipeline};
pub use spectrum::{SpectrumEngine, SpectrumKind};
pub use statistics::{spectral_centroid, spectral_variance, ScalarFeature, StatisticalSummary};
