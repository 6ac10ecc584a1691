//! Deconvolution operators for the matrix family of Abel transforms.
//!
//! Every method in this module reduces the Abel integral on a unit-spaced
//! radial grid to a square operator `D` that is applied to each image row
//! (`out[r, :] = in[r, :] · Dᵀ`). Operators depend only on the method, the
//! direction and the number of columns, so they are built once and shared
//! through an explicit [`BasisCache`].

mod onion_peeling;
mod two_point;

pub use onion_peeling::{onion_peeling_forward_operator, onion_peeling_inverse_operator};
pub use two_point::two_point_operator;

use crate::trace::{trace_event, trace_span};
use crate::util::{AbelError, AbelResult};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Direction of an Abel transform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Direction {
    /// Radial distribution to projection.
    Forward,
    /// Projection to radial distribution.
    Inverse,
}

impl Direction {
    /// Returns the lowercase name used in configs and reports.
    pub fn name(self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Inverse => "inverse",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Direction {
    type Err = AbelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forward" => Ok(Direction::Forward),
            "inverse" => Ok(Direction::Inverse),
            _ => Err(AbelError::InvalidInput(
                "direction must be \"forward\" or \"inverse\"",
            )),
        }
    }
}

/// Matrix-deconvolution transform methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Method {
    /// Dasch two-point deconvolution (inverse only).
    TwoPoint,
    /// Dasch onion peeling (forward and inverse).
    OnionPeeling,
}

impl Method {
    /// All registered methods.
    pub const ALL: [Method; 2] = [Method::TwoPoint, Method::OnionPeeling];

    /// Returns the registry name of the method.
    pub fn name(self) -> &'static str {
        match self {
            Method::TwoPoint => "two_point",
            Method::OnionPeeling => "onion_peeling",
        }
    }

    /// Returns the directions this method implements.
    pub fn directions(self) -> &'static [Direction] {
        match self {
            Method::TwoPoint => &[Direction::Inverse],
            Method::OnionPeeling => &[Direction::Forward, Direction::Inverse],
        }
    }

    /// Returns true if the method implements `direction`.
    pub fn supports(self, direction: Direction) -> bool {
        self.directions().contains(&direction)
    }

    /// Fails with `UnsupportedDirection` unless `direction` is implemented.
    pub fn check_direction(self, direction: Direction) -> AbelResult<()> {
        if self.supports(direction) {
            Ok(())
        } else {
            Err(AbelError::UnsupportedDirection {
                method: self.name(),
                direction: direction.name(),
            })
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Method {
    type Err = AbelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| AbelError::InvalidMethod { name: s.to_owned() })
    }
}

/// Square row-major deconvolution operator.
#[derive(Clone, Debug, PartialEq)]
pub struct Operator {
    size: usize,
    data: Vec<f64>,
}

impl Operator {
    pub(crate) fn from_vec(size: usize, data: Vec<f64>) -> Self {
        debug_assert_eq!(data.len(), size * size);
        Self { size, data }
    }

    /// Returns the number of rows (and columns).
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns entry `(i, j)`.
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        if i >= self.size || j >= self.size {
            return None;
        }
        Some(self.data[i * self.size + j])
    }

    /// Returns operator row `i`.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.size..(i + 1) * self.size]
    }

    /// Returns the row-major entries.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

/// Builds the operator for `method` in `direction` over `cols` radial samples.
pub fn build_operator(method: Method, direction: Direction, cols: usize) -> AbelResult<Operator> {
    method.check_direction(direction)?;
    if cols == 0 {
        return Err(AbelError::InvalidInput("operator size must be > 0"));
    }
    let _span = trace_span!("build_operator", method = method.name(), cols = cols).entered();
    match (method, direction) {
        (Method::TwoPoint, Direction::Inverse) => Ok(two_point_operator(cols)),
        (Method::OnionPeeling, Direction::Forward) => Ok(onion_peeling_forward_operator(cols)),
        (Method::OnionPeeling, Direction::Inverse) => onion_peeling_inverse_operator(cols),
        (Method::TwoPoint, Direction::Forward) => Err(AbelError::UnsupportedDirection {
            method: method.name(),
            direction: direction.name(),
        }),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct BasisKey {
    method: Method,
    direction: Direction,
    cols: usize,
}

/// Caller-owned operator cache keyed by method, direction and column count.
///
/// Entries are built on first request and shared as `Arc<Operator>` until
/// [`BasisCache::clear`] is called.
#[derive(Debug, Default)]
pub struct BasisCache {
    entries: HashMap<BasisKey, Arc<Operator>>,
}

impl BasisCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached operator, building and storing it on a miss.
    pub fn get_or_build(
        &mut self,
        method: Method,
        direction: Direction,
        cols: usize,
    ) -> AbelResult<Arc<Operator>> {
        method.check_direction(direction)?;
        let key = BasisKey {
            method,
            direction,
            cols,
        };
        if let Some(op) = self.entries.get(&key) {
            trace_event!("basis_cache_hit", cols = cols);
            return Ok(Arc::clone(op));
        }
        let op = Arc::new(build_operator(method, direction, cols)?);
        self.entries.insert(key, Arc::clone(&op));
        trace_event!("basis_cache_miss", cols = cols, cached = self.entries.len());
        Ok(op)
    }

    /// Returns true if an operator for the key is cached.
    pub fn contains(&self, method: Method, direction: Direction, cols: usize) -> bool {
        self.entries.contains_key(&BasisKey {
            method,
            direction,
            cols,
        })
    }

    /// Number of cached operators.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every cached operator.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
