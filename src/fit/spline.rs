//! Natural cubic splines with optional smoothing.
//!
//! The smoothing form follows Reinsch: among all `C²` cubics, pick the one with
//! the least bending energy `∫ g''²` whose residual sum of squares does not
//! exceed the smoothing budget `s`. With `s = 0` this is the natural
//! interpolating spline.
//!
//! Evaluation outside the knot range returns the value at the nearest end
//! knot (flat extrapolation).

use crate::util::{AbelError, AbelResult};
use nalgebra::{DMatrix, DVector};

const BISECTION_STEPS: usize = 80;

/// Piecewise cubic defined by knot values and second derivatives.
#[derive(Clone, Debug, PartialEq)]
pub struct CubicSpline {
    x: Vec<f64>,
    g: Vec<f64>,
    gamma: Vec<f64>,
}

impl CubicSpline {
    /// Builds the natural interpolating spline through `(x, y)`.
    pub fn interpolating(x: &[f64], y: &[f64]) -> AbelResult<Self> {
        validate(x, y)?;
        let gamma = if x.len() < 3 {
            vec![0.0; x.len()]
        } else {
            interpolating_second_derivatives(x, y)
        };
        Ok(Self {
            x: x.to_vec(),
            g: y.to_vec(),
            gamma,
        })
    }

    /// Builds the smoothest spline with `Σ (y_i - g(x_i))² <= smoothing`.
    pub fn smoothing(x: &[f64], y: &[f64], smoothing: f64) -> AbelResult<Self> {
        if !smoothing.is_finite() || smoothing < 0.0 {
            return Err(AbelError::InvalidInput("smoothing must be finite and >= 0"));
        }
        if smoothing == 0.0 || x.len() < 3 {
            return Self::interpolating(x, y);
        }
        validate(x, y)?;

        let system = SmoothingSystem::new(x, y);
        let (line, line_rss) = linear_fit(x, y);
        if smoothing >= line_rss {
            return Ok(Self {
                x: x.to_vec(),
                g: line,
                gamma: vec![0.0; x.len()],
            });
        }

        // Bracket lambda in log space, then bisect keeping the feasible end.
        let h_mean = (x[x.len() - 1] - x[0]) / (x.len() - 1) as f64;
        let mut lo = (1e-12 * h_mean.powi(3)).ln();
        let mut hi = (1e12 * h_mean.powi(3)).ln();
        let mut best = system.solve(0.0)?;
        for _ in 0..BISECTION_STEPS {
            let mid = 0.5 * (lo + hi);
            let fit = system.solve(mid.exp())?;
            if fit.rss <= smoothing {
                lo = mid;
                best = fit;
            } else {
                hi = mid;
            }
        }

        Ok(Self {
            x: x.to_vec(),
            g: best.g,
            gamma: best.gamma,
        })
    }

    /// Knot abscissae.
    pub fn knots(&self) -> &[f64] {
        &self.x
    }

    /// Fitted values at the knots.
    pub fn values(&self) -> &[f64] {
        &self.g
    }

    /// Evaluates the spline with flat extrapolation.
    pub fn eval(&self, t: f64) -> f64 {
        let n = self.x.len();
        if n == 1 || t <= self.x[0] {
            return self.g[0];
        }
        if t >= self.x[n - 1] {
            return self.g[n - 1];
        }
        if t.is_nan() {
            return t;
        }
        // interval [x_i, x_{i+1}) containing t
        let i = self.x.partition_point(|&xk| xk <= t).clamp(1, n - 1) - 1;
        let (x0, x1) = (self.x[i], self.x[i + 1]);
        let h = x1 - x0;
        let a = x1 - t;
        let b = t - x0;
        let (g0, g1) = (self.g[i], self.g[i + 1]);
        let (m0, m1) = (self.gamma[i], self.gamma[i + 1]);
        (m0 * a.powi(3) + m1 * b.powi(3)) / (6.0 * h)
            + (g0 / h - m0 * h / 6.0) * a
            + (g1 / h - m1 * h / 6.0) * b
    }
}

fn validate(x: &[f64], y: &[f64]) -> AbelResult<()> {
    if x.is_empty() {
        return Err(AbelError::InvalidInput("spline needs at least one knot"));
    }
    if x.len() != y.len() {
        return Err(AbelError::ShapeMismatch {
            expected: x.len(),
            got: y.len(),
            context: "spline values vs knots",
        });
    }
    if x.iter().chain(y).any(|v| !v.is_finite()) {
        return Err(AbelError::InvalidInput("spline data must be finite"));
    }
    if x.windows(2).any(|w| w[1] <= w[0]) {
        return Err(AbelError::InvalidInput("spline knots must be strictly increasing"));
    }
    Ok(())
}

/// Solves the tridiagonal system `R γ = Qᵀ y` of the natural spline.
fn interpolating_second_derivatives(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len();
    let m = n - 2;
    let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
    let mut diag = vec![0.0; m];
    let mut upper = vec![0.0; m];
    let mut rhs = vec![0.0; m];
    for k in 0..m {
        diag[k] = (h[k] + h[k + 1]) / 3.0;
        upper[k] = h[k + 1] / 6.0;
        rhs[k] = (y[k + 2] - y[k + 1]) / h[k + 1] - (y[k + 1] - y[k]) / h[k];
    }
    // Thomas algorithm; the matrix is symmetric and diagonally dominant.
    for k in 1..m {
        let w = upper[k - 1] / diag[k - 1];
        diag[k] -= w * upper[k - 1];
        rhs[k] -= w * rhs[k - 1];
    }
    let mut gamma = vec![0.0; n];
    for k in (0..m).rev() {
        let next = if k + 1 < m { gamma[k + 2] } else { 0.0 };
        gamma[k + 1] = (rhs[k] - upper[k] * next) / diag[k];
    }
    gamma
}

fn linear_fit(x: &[f64], y: &[f64]) -> (Vec<f64>, f64) {
    let n = x.len() as f64;
    let mx = x.iter().sum::<f64>() / n;
    let my = y.iter().sum::<f64>() / n;
    let sxx: f64 = x.iter().map(|&v| (v - mx).powi(2)).sum();
    let sxy: f64 = x.iter().zip(y).map(|(&a, &b)| (a - mx) * (b - my)).sum();
    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
    let line: Vec<f64> = x.iter().map(|&v| my + slope * (v - mx)).collect();
    let rss = line.iter().zip(y).map(|(a, b)| (a - b).powi(2)).sum();
    (line, rss)
}

struct SmoothingFit {
    g: Vec<f64>,
    gamma: Vec<f64>,
    rss: f64,
}

/// Dense form of the Reinsch system `(R + λ QᵀQ) γ = Qᵀ y`, `g = y - λ Q γ`.
struct SmoothingSystem {
    y: DVector<f64>,
    q: DMatrix<f64>,
    r: DMatrix<f64>,
    qtq: DMatrix<f64>,
    qty: DVector<f64>,
}

impl SmoothingSystem {
    fn new(x: &[f64], y: &[f64]) -> Self {
        let n = x.len();
        let m = n - 2;
        let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
        let mut q = DMatrix::zeros(n, m);
        let mut r = DMatrix::zeros(m, m);
        for k in 0..m {
            q[(k, k)] = 1.0 / h[k];
            q[(k + 1, k)] = -1.0 / h[k] - 1.0 / h[k + 1];
            q[(k + 2, k)] = 1.0 / h[k + 1];
            r[(k, k)] = (h[k] + h[k + 1]) / 3.0;
            if k + 1 < m {
                r[(k, k + 1)] = h[k + 1] / 6.0;
                r[(k + 1, k)] = h[k + 1] / 6.0;
            }
        }
        let y = DVector::from_column_slice(y);
        let qtq = q.transpose() * &q;
        let qty = q.transpose() * &y;
        Self { y, q, r, qtq, qty }
    }

    fn solve(&self, lambda: f64) -> AbelResult<SmoothingFit> {
        let a = &self.r + &self.qtq * lambda;
        let interior = a
            .lu()
            .solve(&self.qty)
            .ok_or(AbelError::InvalidInput("smoothing spline system is singular"))?;
        let correction = &self.q * &interior * lambda;
        let g = &self.y - &correction;
        let rss = correction.norm_squared();

        let mut gamma = vec![0.0; self.y.len()];
        gamma[1..self.y.len() - 1].copy_from_slice(interior.as_slice());
        Ok(SmoothingFit {
            g: g.as_slice().to_vec(),
            gamma,
            rss,
        })
    }
}
