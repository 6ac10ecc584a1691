//! Closed-form test functions with known Abel projections.

use crate::basis::Direction;
use crate::util::{AbelError, AbelResult};

/// Gaussian `A0 exp(-r² / σ²)` and its projection `σ √π A0 exp(-r² / σ²)`.
#[derive(Clone, Debug)]
pub struct GaussianAnalytical {
    r: Vec<f64>,
    dr: f64,
    func: Vec<f64>,
    abel: Vec<f64>,
    mask_valid: Vec<bool>,
}

impl GaussianAnalytical {
    /// Samples `n` points over `[0, r_max]`, or `[-r_max, r_max]` when
    /// `symmetric` is set.
    ///
    /// The valid mask keeps points where the function exceeds `1e-3 A0`.
    pub fn new(n: usize, r_max: f64, sigma: f64, a0: f64, symmetric: bool) -> AbelResult<Self> {
        if n < 2 {
            return Err(AbelError::InvalidInput("analytical grid needs at least two points"));
        }
        if !(r_max.is_finite() && r_max > 0.0 && sigma.is_finite() && sigma > 0.0) {
            return Err(AbelError::InvalidInput("r_max and sigma must be finite and > 0"));
        }
        let start = if symmetric { -r_max } else { 0.0 };
        let dr = (r_max - start) / (n - 1) as f64;
        let r: Vec<f64> = (0..n).map(|i| start + dr * i as f64).collect();
        let gauss = |r: f64| (-(r * r) / (sigma * sigma)).exp();
        let func: Vec<f64> = r.iter().map(|&r| a0 * gauss(r)).collect();
        let abel = r
            .iter()
            .map(|&r| sigma * std::f64::consts::PI.sqrt() * a0 * gauss(r))
            .collect();
        let mask_valid = func.iter().map(|&f| f > 1e-3 * a0).collect();
        Ok(Self {
            r,
            dr,
            func,
            abel,
            mask_valid,
        })
    }

    pub fn r(&self) -> &[f64] {
        &self.r
    }

    /// Grid spacing.
    pub fn dr(&self) -> f64 {
        self.dr
    }

    /// The radial function.
    pub fn func(&self) -> &[f64] {
        &self.func
    }

    /// Its forward Abel transform.
    pub fn abel(&self) -> &[f64] {
        &self.abel
    }

    pub fn mask_valid(&self) -> &[bool] {
        &self.mask_valid
    }

    fn reference(&self, kind: Direction) -> &[f64] {
        match kind {
            Direction::Inverse => &self.func,
            Direction::Forward => &self.abel,
        }
    }
}

/// Ratios `reference / recon` over the valid mask.
///
/// `kind` selects the reference: [`Direction::Inverse`] compares against the
/// radial function, [`Direction::Forward`] against its projection.
pub fn absolute_ratio_benchmark(
    analytical: &GaussianAnalytical,
    recon: &[f64],
    kind: Direction,
) -> AbelResult<Vec<f64>> {
    let reference = analytical.reference(kind);
    if recon.len() != reference.len() {
        return Err(AbelError::ShapeMismatch {
            expected: reference.len(),
            got: recon.len(),
            context: "reconstruction vs analytical grid",
        });
    }
    Ok(reference
        .iter()
        .zip(recon)
        .zip(analytical.mask_valid())
        .filter(|(_, &valid)| valid)
        .map(|((&f, &g), _)| f / g)
        .collect())
}
