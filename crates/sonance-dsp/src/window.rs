//! Window functions
//!
//! Symmetric windows evaluated on demand from a handful of derived
//! half-length constants. `hN = (size - 1) / 2` is the window centre and
//! `hL = hN + 1`.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use sonance_core::{Sample, SonanceError, SonanceResult};

/// Default Gaussian width relative to the half length
pub const DEFAULT_GAUSSIAN_SIGMA: f64 = 0.4;

/// Window shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WindowKind {
    /// Flat, no tapering
    Rectangular,
    /// Triangle that stays above zero at the edges
    Triangular,
    /// Triangle reaching zero at the edges
    Bartlett,
    /// Parabolic
    Welch,
    /// Bell curve, width set by sigma
    Gaussian,
    /// Raised cosine
    #[default]
    Hann,
    Hamming,
    Blackman,
    /// Half sine
    Cosine,
}

impl WindowKind {
    /// Smallest size the shape is defined for
    fn min_size(self) -> usize {
        match self {
            Self::Rectangular => 1,
            _ => 2,
        }
    }
}

/// A finite weighting sequence `w[n]`, `0 <= n < size`
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    kind: WindowKind,
    size: usize,
    sigma: f64,
    /// Centre index, `(size - 1) / 2`
    half_n: f64,
    /// `half_n + 1`
    half_l: f64,
    /// `sigma * half_n`
    sigma_half_n: f64,
}

impl Window {
    pub fn new(kind: WindowKind, size: usize) -> SonanceResult<Self> {
        Self::with_sigma(kind, size, DEFAULT_GAUSSIAN_SIGMA)
    }

    /// Gaussian window with an explicit sigma
    pub fn gaussian(size: usize, sigma: f64) -> SonanceResult<Self> {
        Self::with_sigma(WindowKind::Gaussian, size, sigma)
    }

    fn with_sigma(kind: WindowKind, size: usize, sigma: f64) -> SonanceResult<Self> {
        validate_size(kind, size)?;
        validate_sigma(sigma)?;

        let mut window = Self {
            kind,
            size,
            sigma,
            half_n: 0.0,
            half_l: 0.0,
            sigma_half_n: 0.0,
        };
        window.update_constants();
        Ok(window)
    }

    fn update_constants(&mut self) {
        self.half_n = (self.size as f64 - 1.0) * 0.5;
        self.half_l = self.half_n + 1.0;
        self.sigma_half_n = self.sigma * self.half_n;
    }

    #[inline]
    pub fn kind(&self) -> WindowKind {
        self.kind
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Resize, recomputing the half-length constants
    pub fn set_size(&mut self, size: usize) -> SonanceResult<()> {
        validate_size(self.kind, size)?;
        self.size = size;
        self.update_constants();
        Ok(())
    }

    /// Change the Gaussian width. Stored for every kind, only Gaussian reads it.
    pub fn set_sigma(&mut self, sigma: f64) -> SonanceResult<()> {
        validate_sigma(sigma)?;
        self.sigma = sigma;
        self.sigma_half_n = self.sigma * self.half_n;
        Ok(())
    }

    /// Window value at `n`. `n` must be below `size`.
    #[inline]
    pub fn value(&self, n: usize) -> Sample {
        debug_assert!(n < self.size, "window index {n} >= size {}", self.size);

        let x = n as f64;
        // Symmetric cosine forms: span is size - 1 == 2 * half_n
        let span = 2.0 * self.half_n;
        match self.kind {
            WindowKind::Rectangular => 1.0,
            WindowKind::Triangular => 1.0 - (x - self.half_n).abs() / self.half_l,
            WindowKind::Bartlett => 1.0 - (x - self.half_n).abs() / self.half_n,
            WindowKind::Welch => {
                let r = (x - self.half_n) / self.half_n;
                1.0 - r * r
            }
            WindowKind::Gaussian => {
                let r = (x - self.half_n) / self.sigma_half_n;
                (-0.5 * r * r).exp()
            }
            WindowKind::Hann => 0.5 * (1.0 - (2.0 * PI * x / span).cos()),
            WindowKind::Hamming => 0.54 - 0.46 * (2.0 * PI * x / span).cos(),
            WindowKind::Blackman => {
                0.42 - 0.5 * (2.0 * PI * x / span).cos() + 0.08 * (4.0 * PI * x / span).cos()
            }
            WindowKind::Cosine => (PI * x / span).sin(),
        }
    }

    /// Checked access
    #[inline]
    pub fn get(&self, n: usize) -> Option<Sample> {
        (n < self.size).then(|| self.value(n))
    }

    /// Lazily evaluate the whole shape
    pub fn iter(&self) -> impl Iterator<Item = Sample> + '_ {
        (0..self.size).map(move |n| self.value(n))
    }

    /// Materialize the window into a new buffer
    pub fn generate_buffer(&self) -> Vec<Sample> {
        self.iter().collect()
    }
}

fn validate_size(kind: WindowKind, size: usize) -> SonanceResult<()> {
    if size < kind.min_size() {
        return Err(SonanceError::invalid(format!(
            "{kind:?} window needs at least {} samples, got {size}",
            kind.min_size()
        )));
    }
    Ok(())
}

fn validate_sigma(sigma: f64) -> SonanceResult<()> {
    if !(sigma.is_finite() && sigma > 0.0) {
        return Err(SonanceError::invalid(format!(
            "gaussian sigma must be finite and positive, got {sigma}"
        )));
    }
    Ok(())
}
