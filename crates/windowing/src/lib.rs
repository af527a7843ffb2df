//! Window Function Generation
//!
//! Provides tapering windows applied to audio frames before spectral analysis.

mod window;

pub use window::{Window, WindowError, WindowKind};
