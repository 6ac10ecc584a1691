//! Levenberg-Marquardt least squares for small fixed-size parameter vectors.
//!
//! The Jacobian is estimated by forward differences, so problems only supply
//! residuals. Normal equations are formed as small `nalgebra` matrices and
//! damped multiplicatively on the diagonal.

use crate::trace::trace_debug;
use nalgebra::{DMatrix, DVector};

/// Configuration for Levenberg-Marquardt optimization.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LmConfig {
    /// Maximum number of outer iterations.
    pub max_iterations: usize,
    /// Stop when the relative cost reduction of an accepted step falls below this.
    pub ftol: f64,
    /// Stop when every parameter step is below `xtol * (|p| + xtol)`.
    pub xtol: f64,
    /// Initial damping factor.
    pub initial_lambda: f64,
    /// Damping multiplier after a rejected step.
    pub lambda_up: f64,
    /// Damping multiplier after an accepted step.
    pub lambda_down: f64,
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            ftol: 1.49012e-8,
            xtol: 1.49012e-8,
            initial_lambda: 1e-3,
            lambda_up: 10.0,
            lambda_down: 0.1,
        }
    }
}

/// A residual function with `N` parameters.
pub trait LeastSquaresProblem<const N: usize> {
    /// Writes the residual vector for `params` into `out` (cleared first).
    fn residuals(&self, params: &[f64; N], out: &mut Vec<f64>);

    /// Projects parameters back into the feasible region after a step.
    fn constrain(&self, _params: &mut [f64; N]) {}
}

/// Outcome of an optimization run.
#[derive(Clone, Copy, Debug)]
pub struct LmResult<const N: usize> {
    pub params: [f64; N],
    /// Sum of squared residuals at `params`.
    pub cost: f64,
    pub converged: bool,
    pub iterations: usize,
}

fn cost_of<const N: usize, P: LeastSquaresProblem<N>>(
    problem: &P,
    params: &[f64; N],
    buf: &mut Vec<f64>,
) -> f64 {
    problem.residuals(params, buf);
    let cost: f64 = buf.iter().map(|r| r * r).sum();
    if cost.is_finite() {
        cost
    } else {
        f64::INFINITY
    }
}

/// Minimizes `Σ r_i(p)²` starting from `initial`.
pub fn optimize<const N: usize, P: LeastSquaresProblem<N>>(
    problem: &P,
    initial: [f64; N],
    cfg: &LmConfig,
) -> LmResult<N> {
    let fd_step = f64::EPSILON.sqrt();
    let mut params = initial;
    problem.constrain(&mut params);

    let mut residuals = Vec::new();
    let mut shifted = Vec::new();
    let mut trial_buf = Vec::new();
    let mut cost = cost_of(problem, &params, &mut residuals);
    let mut lambda = cfg.initial_lambda;
    let mut converged = false;
    let mut iterations = 0;

    let mut jacobian: Vec<[f64; N]> = Vec::new();
    while iterations < cfg.max_iterations {
        iterations += 1;

        problem.residuals(&params, &mut residuals);
        let m = residuals.len();
        jacobian.clear();
        jacobian.resize(m, [0.0; N]);
        for j in 0..N {
            let h = fd_step * params[j].abs().max(1.0);
            let mut p = params;
            p[j] += h;
            problem.residuals(&p, &mut shifted);
            for (row, (&r1, &r0)) in jacobian.iter_mut().zip(shifted.iter().zip(&residuals)) {
                row[j] = (r1 - r0) / h;
            }
        }

        let mut jtj = DMatrix::<f64>::zeros(N, N);
        let mut jtr = DVector::<f64>::zeros(N);
        for (row, &r) in jacobian.iter().zip(&residuals) {
            for a in 0..N {
                jtr[a] -= row[a] * r;
                for b in a..N {
                    jtj[(a, b)] += row[a] * row[b];
                }
            }
        }
        for a in 0..N {
            for b in 0..a {
                jtj[(a, b)] = jtj[(b, a)];
            }
        }

        let mut accepted = false;
        while lambda < 1e16 {
            let mut damped = jtj.clone();
            for a in 0..N {
                damped[(a, a)] *= 1.0 + lambda;
                if damped[(a, a)] == 0.0 {
                    damped[(a, a)] = lambda;
                }
            }
            let Some(delta) = damped.lu().solve(&jtr) else {
                lambda *= cfg.lambda_up;
                continue;
            };

            let mut trial = params;
            for (p, d) in trial.iter_mut().zip(delta.iter()) {
                *p += d;
            }
            problem.constrain(&mut trial);
            let trial_cost = cost_of(problem, &trial, &mut trial_buf);

            if trial_cost.is_finite() && trial_cost <= cost {
                let small_step = (0..N)
                    .all(|a| (trial[a] - params[a]).abs() <= cfg.xtol * (params[a].abs() + cfg.xtol));
                let small_gain = cost.is_finite() && cost - trial_cost <= cfg.ftol * cost;
                params = trial;
                cost = trial_cost;
                lambda = (lambda * cfg.lambda_down).max(1e-12);
                accepted = true;
                converged = small_step || small_gain;
                break;
            }
            lambda *= cfg.lambda_up;
        }

        trace_debug!("lm_iteration", iteration = iterations, cost = cost, lambda = lambda);
        if !accepted {
            // no decreasing step at any damping: a minimum unless the cost blew up
            converged = cost.is_finite();
            break;
        }
        if converged {
            break;
        }
    }

    LmResult {
        params,
        cost,
        converged,
        iterations,
    }
}

#[cfg(test)]
mod tests {
    use super::{optimize, LeastSquaresProblem, LmConfig};

    struct ExpDecay {
        t: Vec<f64>,
        y: Vec<f64>,
    }

    impl LeastSquaresProblem<2> for ExpDecay {
        fn residuals(&self, p: &[f64; 2], out: &mut Vec<f64>) {
            out.clear();
            out.extend(
                self.t
                    .iter()
                    .zip(&self.y)
                    .map(|(&t, &y)| p[0] * (-p[1] * t).exp() - y),
            );
        }
    }

    #[test]
    fn recovers_exponential_parameters() {
        let t: Vec<f64> = (0..30).map(|k| k as f64 * 0.1).collect();
        let y = t.iter().map(|&t| 2.5 * (-1.3 * t).exp()).collect();
        let problem = ExpDecay { t, y };
        let res = optimize(&problem, [1.0, 0.5], &LmConfig::default());
        assert!(res.converged);
        assert!((res.params[0] - 2.5).abs() < 1e-6);
        assert!((res.params[1] - 1.3).abs() < 1e-6);
        assert!(res.cost < 1e-12);
    }

    struct Clamped;

    impl LeastSquaresProblem<1> for Clamped {
        fn residuals(&self, p: &[f64; 1], out: &mut Vec<f64>) {
            out.clear();
            out.push(p[0] + 3.0);
        }

        fn constrain(&self, p: &mut [f64; 1]) {
            p[0] = p[0].max(0.0);
        }
    }

    struct Diverging;

    impl LeastSquaresProblem<1> for Diverging {
        fn residuals(&self, _p: &[f64; 1], out: &mut Vec<f64>) {
            out.clear();
            out.extend([f64::INFINITY, f64::NAN]);
        }
    }

    #[test]
    fn non_finite_cost_is_not_converged() {
        let res = optimize(&Diverging, [1.0], &LmConfig::default());
        assert!(!res.converged);
        assert_eq!(res.cost, f64::INFINITY);
        assert_eq!(res.params, [1.0]);
    }

    #[test]
    fn constraint_is_respected() {
        let res = optimize(&Clamped, [2.0], &LmConfig::default());
        assert!(res.params[0] >= 0.0);
        assert!(res.params[0] < 1e-6);
    }
}
