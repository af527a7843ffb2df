//! Statistical Feature Computation

use serde::{Deserialize, Serialize};

use crate::error::FeatureError;

/// Scalar features computable from a single frame
///
/// Each feature writes one value into a length-1 result buffer. Features
/// marked as requiring auxiliary scalars read them from the argument
/// vector and fail with [`FeatureError::MissingArgument`] when absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarFeature {
    /// Arithmetic mean of the samples
    Mean,
    /// Average squared deviation from a supplied mean (requires `[mean]`)
    Variance,
    /// Square root of a supplied variance (requires `[variance]`)
    StandardDeviation,
    /// Mean absolute deviation from a supplied mean (requires `[mean]`)
    AverageDeviation,
    /// Third standardised moment (requires `[mean, std_dev]`)
    Skewness,
    /// Fourth standardised moment minus 3 (requires `[mean, std_dev]`)
    Kurtosis,
    /// Root mean square of the samples
    Rms,
    /// Sign changes between adjacent samples, divided by the frame length
    ZeroCrossingRate,
}

impl ScalarFeature {
    /// Output cardinality of every scalar feature
    pub const OUTPUT_LEN: usize = 1;

    /// Compute the feature over `frame` and write it to `out[0]`
    ///
    /// `out` must have length exactly 1. The frame must be non-empty.
    /// Nothing is written on failure.
    pub fn apply(
        &self,
        frame: &[f64],
        args: Option<&[f64]>,
        out: &mut [f64],
    ) -> Result<(), FeatureError> {
        if out.len() != Self::OUTPUT_LEN {
            return Err(FeatureError::SizeMismatch {
                expected: Self::OUTPUT_LEN,
                actual: out.len(),
            });
        }
        if frame.is_empty() {
            return Err(FeatureError::InvalidArgument {
                reason: "frame must contain at least one sample",
            });
        }
        self.validate_args(args)?;

        let value = match self {
            ScalarFeature::Mean => mean(frame),
            ScalarFeature::Variance => variance(frame, arg(args, 0)),
            ScalarFeature::StandardDeviation => arg(args, 0).sqrt(),
            ScalarFeature::AverageDeviation => average_deviation(frame, arg(args, 0)),
            ScalarFeature::Skewness => standardised_moment(frame, arg(args, 0), arg(args, 1), 3),
            ScalarFeature::Kurtosis => {
                let std_dev = arg(args, 1);
                if std_dev <= 0.0 {
                    0.0
                } else {
                    standardised_moment(frame, arg(args, 0), std_dev, 4) - 3.0
                }
            }
            ScalarFeature::Rms => rms(frame),
            ScalarFeature::ZeroCrossingRate => zero_crossing_rate(frame),
        };

        out[0] = value;
        Ok(())
    }

    /// Check the argument vector carries what this feature requires
    pub(crate) fn validate_args(&self, args: Option<&[f64]>) -> Result<(), FeatureError> {
        let (feature, expected, count) = match self {
            ScalarFeature::Mean | ScalarFeature::Rms | ScalarFeature::ZeroCrossingRate => {
                return Ok(())
            }
            ScalarFeature::Variance => ("variance", "a precomputed mean", 1),
            ScalarFeature::StandardDeviation => {
                ("standard deviation", "a precomputed variance", 1)
            }
            ScalarFeature::AverageDeviation => ("average deviation", "a precomputed mean", 1),
            ScalarFeature::Skewness => {
                ("skewness", "a precomputed mean and standard deviation", 2)
            }
            ScalarFeature::Kurtosis => {
                ("kurtosis", "a precomputed mean and standard deviation", 2)
            }
        };

        match args {
            Some(values) if values.len() >= count => {
                if *self == ScalarFeature::StandardDeviation && values[0] < 0.0 {
                    return Err(FeatureError::InvalidArgument {
                        reason: "variance must be non-negative",
                    });
                }
                Ok(())
            }
            _ => Err(FeatureError::MissingArgument { feature, expected }),
        }
    }
}

/// Auxiliary scalar `index`; only called after `validate_args` passed
fn arg(args: Option<&[f64]>, index: usize) -> f64 {
    args.map(|values| values[index]).unwrap_or(0.0)
}

fn mean(frame: &[f64]) -> f64 {
    frame.iter().sum::<f64>() / frame.len() as f64
}

fn variance(frame: &[f64], mean: f64) -> f64 {
    let sum: f64 = frame.iter().map(|&x| (x - mean) * (x - mean)).sum();
    sum / frame.len() as f64
}

fn average_deviation(frame: &[f64], mean: f64) -> f64 {
    let sum: f64 = frame.iter().map(|&x| (x - mean).abs()).sum();
    sum / frame.len() as f64
}

/// `order`-th power of standardised deviations, averaged; 0 when the
/// distribution is degenerate (zero spread)
fn standardised_moment(frame: &[f64], mean: f64, std_dev: f64, order: i32) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }
    let sum: f64 = frame
        .iter()
        .map(|&x| ((x - mean) / std_dev).powi(order))
        .sum();
    sum / frame.len() as f64
}

fn rms(frame: &[f64]) -> f64 {
    let sum: f64 = frame.iter().map(|&x| x * x).sum();
    (sum / frame.len() as f64).sqrt()
}

fn zero_crossing_rate(frame: &[f64]) -> f64 {
    let mut crossings = 0usize;
    for pair in frame.windows(2) {
        if pair[0] * pair[1] < 0.0 {
            crossings += 1;
        }
    }
    crossings as f64 / frame.len() as f64
}

/// Descriptive statistics for one frame, computed in a single moment pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatisticalSummary {
    /// Mean value
    pub mean: f64,
    /// Average squared deviation from the mean
    pub variance: f64,
    /// Standard deviation
    pub std_dev: f64,
    /// Mean absolute deviation from the mean
    pub average_deviation: f64,
    /// Skewness (asymmetry)
    pub skewness: f64,
    /// Kurtosis (tailedness, excess)
    pub kurtosis: f64,
    /// Minimum value
    pub min: f64,
    /// Maximum value
    pub max: f64,
    /// Root mean square
    pub rms: f64,
    /// Sign changes per sample
    pub zero_crossing_rate: f64,
}

impl StatisticalSummary {
    /// Compute all summary statistics for a non-empty frame
    pub fn compute(frame: &[f64]) -> Result<Self, FeatureError> {
        if frame.is_empty() {
            return Err(FeatureError::InvalidArgument {
                reason: "frame must contain at least one sample",
            });
        }

        let n = frame.len() as f64;
        let mean = frame.iter().sum::<f64>() / n;

        let min = frame.iter().cloned().fold(f64::MAX, f64::min);
        let max = frame.iter().cloned().fold(f64::MIN, f64::max);

        let mut m2 = 0.0;
        let mut m3 = 0.0;
        let mut m4 = 0.0;
        let mut abs_dev = 0.0;
        let mut square_sum = 0.0;

        for &x in frame {
            let d = x - mean;
            m2 += d * d;
            m3 += d * d * d;
            m4 += d * d * d * d;
            abs_dev += d.abs();
            square_sum += x * x;
        }

        let variance = m2 / n;
        let std_dev = variance.sqrt();

        let skewness = if std_dev > 0.0 {
            (m3 / n) / (std_dev * std_dev * std_dev)
        } else {
            0.0
        };
        let kurtosis = if std_dev > 0.0 {
            (m4 / n) / (variance * variance) - 3.0
        } else {
            0.0
        };

        Ok(Self {
            mean,
            variance,
            std_dev,
            average_deviation: abs_dev / n,
            skewness,
            kurtosis,
            min,
            max,
            rms: (square_sum / n).sqrt(),
            zero_crossing_rate: zero_crossing_rate(frame),
        })
    }
}

/// Amplitude-weighted mean frequency of a one-sided spectrum
///
/// `magnitudes` and `frequencies` must have equal, non-zero length.
/// A spectrum with zero total amplitude has centroid 0.
pub fn spectral_centroid(magnitudes: &[f64], frequencies: &[f64]) -> Result<f64, FeatureError> {
    check_spectrum_pair(magnitudes, frequencies)?;

    let mut weighted = 0.0;
    let mut total = 0.0;
    for (&a, &f) in magnitudes.iter().zip(frequencies) {
        weighted += f * a;
        total += a;
    }

    if total == 0.0 {
        Ok(0.0)
    } else {
        Ok(weighted / total)
    }
}

/// Amplitude-weighted squared deviation of frequency from a supplied centroid
pub fn spectral_variance(
    magnitudes: &[f64],
    frequencies: &[f64],
    centroid: f64,
) -> Result<f64, FeatureError> {
    check_spectrum_pair(magnitudes, frequencies)?;

    let mut weighted = 0.0;
    let mut total = 0.0;
    for (&a, &f) in magnitudes.iter().zip(frequencies) {
        weighted += (f - centroid) * (f - centroid) * a;
        total += a;
    }

    if total == 0.0 {
        Ok(0.0)
    } else {
        Ok(weighted / total)
    }
}

fn check_spectrum_pair(magnitudes: &[f64], frequencies: &[f64]) -> Result<(), FeatureError> {
    if magnitudes.is_empty() {
        return Err(FeatureError::InvalidArgument {
            reason: "spectrum must contain at least one bin",
        });
    }
    if magnitudes.len() != frequencies.len() {
        return Err(FeatureError::SizeMismatch {
            expected: magnitudes.len(),
            actual: frequencies.len(),
        });
    }
    Ok(())
}
