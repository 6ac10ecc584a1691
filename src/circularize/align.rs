//! Per-slice radial scale estimation.

use std::fmt;
use std::str::FromStr;

use crate::fit::{optimize, CubicSpline, LeastSquaresProblem, LmConfig};
use crate::polar::PolarImage;
use crate::trace::{trace_debug, trace_span};
use crate::util::math::{argmax, split_ranges};
use crate::util::{AbelError, AbelResult};

const MIN_SCALE: f64 = 1e-6;

/// Strategy used to compare each slice against the reference.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AlignMethod {
    /// Match the radius of the profile maximum to slice 0's.
    #[default]
    Argmax,
    /// Fit `(scale, amplitude)` of the profile to a running reference.
    Lsq,
}

impl AlignMethod {
    /// Name accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            AlignMethod::Argmax => "argmax",
            AlignMethod::Lsq => "lsq",
        }
    }
}

impl fmt::Display for AlignMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AlignMethod {
    type Err = AbelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "argmax" => Ok(AlignMethod::Argmax),
            "lsq" => Ok(AlignMethod::Lsq),
            other => Err(AbelError::InvalidMethod {
                name: other.to_string(),
            }),
        }
    }
}

/// One angular block of a polar image collapsed to a radial profile.
#[derive(Clone, Debug, PartialEq)]
pub struct AngularSlice {
    /// Mean angle of the block's columns.
    pub angle: f64,
    /// Intensity summed over the block, one entry per radius.
    pub profile: Vec<f64>,
}

/// Splits the angle axis of `polar` into `nslices` contiguous blocks.
///
/// Block sizes differ by at most one column; the first `nt % nslices` blocks
/// are the wider ones.
pub fn angular_slices(polar: &PolarImage, nslices: usize) -> AbelResult<Vec<AngularSlice>> {
    let nt = polar.angles().len();
    if nslices == 0 || nslices > nt {
        return Err(AbelError::InvalidInput(
            "nslices must be in 1..=number of polar angles",
        ));
    }
    let image = polar.image();
    let slices = split_ranges(nt, nslices)
        .into_iter()
        .map(|cols| {
            let angles = &polar.angles()[cols.clone()];
            let angle = angles.iter().sum::<f64>() / angles.len() as f64;
            let profile = image
                .view()
                .rows()
                .map(|row| row[cols.clone()].iter().sum())
                .collect();
            AngularSlice { angle, profile }
        })
        .collect();
    Ok(slices)
}

/// Computes one radial scale factor per slice, in slice order.
///
/// Every profile must have `radial.len()` samples. The first factor is
/// exactly `1.0` for both methods.
pub fn align(
    slices: &[AngularSlice],
    radial: &[f64],
    method: AlignMethod,
    lm: &LmConfig,
    parallel: bool,
) -> AbelResult<Vec<f64>> {
    for slice in slices {
        if slice.profile.len() != radial.len() {
            return Err(AbelError::ShapeMismatch {
                expected: radial.len(),
                got: slice.profile.len(),
                context: "slice profile vs radial grid",
            });
        }
    }
    if slices.is_empty() {
        return Ok(Vec::new());
    }
    let _span = trace_span!("align", method = method.name(), slices = slices.len()).entered();
    match method {
        AlignMethod::Argmax => Ok(align_argmax(slices, radial, parallel)),
        AlignMethod::Lsq => align_lsq(slices, radial, lm),
    }
}

fn peak_radius(profile: &[f64], radial: &[f64]) -> Option<f64> {
    argmax(profile).map(|idx| radial[idx])
}

fn argmax_factor(reference: Option<f64>, radius: Option<f64>) -> f64 {
    match (reference, radius) {
        (Some(r0), Some(rk)) if r0 != 0.0 && rk != 0.0 => r0 / rk,
        _ => 1.0,
    }
}

#[cfg(feature = "rayon")]
fn peak_radii(slices: &[AngularSlice], radial: &[f64], parallel: bool) -> Vec<Option<f64>> {
    use rayon::prelude::*;
    if parallel {
        slices
            .par_iter()
            .map(|s| peak_radius(&s.profile, radial))
            .collect()
    } else {
        slices.iter().map(|s| peak_radius(&s.profile, radial)).collect()
    }
}

#[cfg(not(feature = "rayon"))]
fn peak_radii(slices: &[AngularSlice], radial: &[f64], _parallel: bool) -> Vec<Option<f64>> {
    slices.iter().map(|s| peak_radius(&s.profile, radial)).collect()
}

fn align_argmax(slices: &[AngularSlice], radial: &[f64], parallel: bool) -> Vec<f64> {
    let peaks = peak_radii(slices, radial, parallel);
    let reference = peaks[0];
    let mut factors: Vec<f64> = peaks.iter().map(|&rk| argmax_factor(reference, rk)).collect();
    factors[0] = 1.0;
    factors
}

/// Accumulator of the least-squares fold.
#[derive(Clone, Debug, PartialEq)]
pub struct LsqState {
    /// Running reference profile.
    pub reference: Vec<f64>,
    /// Last fitted `[scale, amplitude]`, used as the next initial guess.
    pub params: [f64; 2],
}

impl LsqState {
    /// Starts the fold from `reference` with the identity guess `[1, 1]`.
    pub fn new(reference: Vec<f64>) -> Self {
        Self {
            reference,
            params: [1.0, 1.0],
        }
    }
}

struct ProfileMatch<'a> {
    radial: &'a [f64],
    profile: &'a [f64],
    reference: &'a [f64],
}

impl ProfileMatch<'_> {
    fn residuals_into(&self, params: &[f64; 2], out: &mut Vec<f64>) {
        out.clear();
        let [scale, amplitude] = *params;
        let knots: Vec<f64> = self.radial.iter().map(|&r| r * scale).collect();
        match CubicSpline::interpolating(&knots, self.profile) {
            Ok(spline) => out.extend(
                self.radial
                    .iter()
                    .zip(self.reference)
                    .map(|(&r, &reference)| spline.eval(r) * amplitude - reference),
            ),
            // a degenerate scale makes the knots non-increasing
            Err(_) => out.extend(std::iter::repeat(f64::INFINITY).take(self.radial.len())),
        }
    }
}

impl LeastSquaresProblem<2> for ProfileMatch<'_> {
    fn residuals(&self, params: &[f64; 2], out: &mut Vec<f64>) {
        self.residuals_into(params, out);
    }

    fn constrain(&self, params: &mut [f64; 2]) {
        params[0] = params[0].max(MIN_SCALE);
    }
}

/// Fits one slice against the running reference and advances the fold.
///
/// Returns the new state together with the fitted radial scale. The
/// reference is updated by adding the residual of the fit, which leaves it
/// equal to the rescaled, amplitude-matched profile of this slice.
pub fn lsq_step(
    state: LsqState,
    profile: &[f64],
    radial: &[f64],
    lm: &LmConfig,
) -> AbelResult<(LsqState, f64)> {
    if profile.len() != radial.len() {
        return Err(AbelError::ShapeMismatch {
            expected: radial.len(),
            got: profile.len(),
            context: "lsq profile vs radial grid",
        });
    }
    if state.reference.len() != radial.len() {
        return Err(AbelError::ShapeMismatch {
            expected: radial.len(),
            got: state.reference.len(),
            context: "lsq reference vs radial grid",
        });
    }
    let LsqState {
        mut reference,
        params,
    } = state;
    let problem = ProfileMatch {
        radial,
        profile,
        reference: &reference,
    };
    let fit = optimize(&problem, params, lm);
    let mut residual = Vec::with_capacity(radial.len());
    problem.residuals_into(&fit.params, &mut residual);
    trace_debug!(
        "lsq_slice",
        scale = fit.params[0],
        amplitude = fit.params[1],
        cost = fit.cost,
        converged = fit.converged
    );
    if residual.iter().all(|r| r.is_finite()) {
        for (r, d) in reference.iter_mut().zip(&residual) {
            *r += d;
        }
    }
    Ok((
        LsqState {
            reference,
            params: fit.params,
        },
        fit.params[0],
    ))
}

fn align_lsq(slices: &[AngularSlice], radial: &[f64], lm: &LmConfig) -> AbelResult<Vec<f64>> {
    let mut factors = Vec::with_capacity(slices.len());
    factors.push(1.0);
    let mut state = LsqState::new(slices[0].profile.clone());
    for slice in &slices[1..] {
        let (next, scale) = lsq_step(state, &slice.profile, radial, lm)?;
        factors.push(scale);
        state = next;
    }
    Ok(factors)
}
