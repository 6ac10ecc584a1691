//! Curve fitting primitives: splines, Levenberg-Marquardt and peak refinement.

pub mod lm;
pub mod quad1d;
pub mod spline;

pub use lm::{optimize, LeastSquaresProblem, LmConfig, LmResult};
pub use spline::CubicSpline;
