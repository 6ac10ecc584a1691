//! Timing harness for the matrix transform methods.
//!
//! Each run times operator construction ("basis") and operator application
//! (forward and inverse) on random right-half images of shape
//! `n x (n / 2 + 1)` for every requested `n`.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::basis::{build_operator, BasisCache, Direction, Method};
use crate::image::Image;
use crate::trace::{trace_event, trace_span};
use crate::transform::{apply_operator, TransformOptions};
use crate::util::{AbelError, AbelResult};

/// Benchmark parameters.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BenchmarkConfig {
    /// Image heights to time.
    pub sizes: Vec<usize>,
    /// `["all"]` or inverse-transform names to keep.
    pub select: Vec<String>,
    /// Skip basis-dependent timings above this size.
    pub n_max_bs: usize,
    /// Transform repetitions averaged per timing.
    pub repeat: usize,
    /// Seed of the random input images.
    pub seed: u64,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            sizes: vec![301, 501],
            select: vec!["all".to_string()],
            n_max_bs: 700,
            repeat: 1,
            seed: 0,
        }
    }
}

/// Transform entries retained after selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registry {
    /// Methods whose operator construction is timed.
    pub basis: Vec<Method>,
    /// Methods timed in the forward direction.
    pub forward: Vec<Method>,
    /// Methods timed in the inverse direction.
    pub inverse: Vec<Method>,
}

impl Registry {
    /// Every known entry.
    pub fn full() -> Self {
        let supporting = |direction| {
            Method::ALL
                .into_iter()
                .filter(|m| m.supports(direction))
                .collect::<Vec<_>>()
        };
        Self {
            basis: supporting(Direction::Inverse),
            forward: supporting(Direction::Forward),
            inverse: supporting(Direction::Inverse),
        }
    }

    /// Filters the registry by `select`.
    ///
    /// `"all"` keeps everything. Otherwise every name must be an inverse
    /// transform; entries of all three tables whose method is not named are
    /// dropped.
    pub fn select(select: &[String]) -> AbelResult<Self> {
        let full = Self::full();
        if select.iter().any(|s| s == "all") {
            return Ok(full);
        }
        let mut chosen = Vec::with_capacity(select.len());
        for name in select {
            let method = name
                .parse::<Method>()
                .ok()
                .filter(|m| full.inverse.contains(m))
                .ok_or_else(|| AbelError::InvalidSelection { name: name.clone() })?;
            chosen.push(method);
        }
        let keep = |list: Vec<Method>| -> Vec<Method> {
            list.into_iter().filter(|m| chosen.contains(m)).collect()
        };
        Ok(Self {
            basis: keep(full.basis),
            forward: keep(full.forward),
            inverse: keep(full.inverse),
        })
    }

    /// Registry key of a basis entry, e.g. `two_point_bs`.
    pub fn basis_key(method: Method) -> String {
        format!("{}_bs", method.name())
    }
}

/// Configured benchmark, validated on construction.
#[derive(Clone, Debug)]
pub struct AbelTiming {
    config: BenchmarkConfig,
    registry: Registry,
}

impl AbelTiming {
    /// Validates the selection and sizes; fails with
    /// [`AbelError::InvalidSelection`] for unknown names.
    pub fn new(config: BenchmarkConfig) -> AbelResult<Self> {
        let registry = Registry::select(&config.select)?;
        if config.sizes.iter().any(|&n| n == 0) {
            return Err(AbelError::InvalidInput("benchmark sizes must be > 0"));
        }
        if config.repeat == 0 {
            return Err(AbelError::InvalidInput("repeat must be > 0"));
        }
        Ok(Self { config, registry })
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Runs every timing and collects the results in milliseconds.
    pub fn run(&self) -> AbelResult<BenchmarkReport> {
        let cfg = &self.config;
        let mut rng = StdRng::seed_from_u64(cfg.seed);
        let mut report = BenchmarkReport::empty(&cfg.sizes, &self.registry);
        let opts = TransformOptions::default();

        for &n in &cfg.sizes {
            let _span = trace_span!("benchmark_size", n = n).entered();
            let (h, w) = (n, n / 2 + 1);
            let half_image = Image::from_fn(w, h, |_, _| rng.random::<f64>())?;
            let with_basis = n <= cfg.n_max_bs;

            for &method in &self.registry.basis {
                let time = if with_basis {
                    let start = Instant::now();
                    std::hint::black_box(build_operator(method, Direction::Inverse, w)?);
                    Some(elapsed_ms(start))
                } else {
                    None
                };
                report.push(Table::Basis, Registry::basis_key(method), time);
            }

            let mut cache = BasisCache::new();
            for (table, direction, methods) in [
                (Table::Forward, Direction::Forward, &self.registry.forward),
                (Table::Inverse, Direction::Inverse, &self.registry.inverse),
            ] {
                for &method in methods {
                    let time = if with_basis {
                        let op = cache.get_or_build(method, direction, w)?;
                        let start = Instant::now();
                        for _ in 0..cfg.repeat {
                            std::hint::black_box(apply_operator(half_image.view(), &op, opts)?);
                        }
                        Some(elapsed_ms(start) / cfg.repeat as f64)
                    } else {
                        None
                    };
                    report.push(table, method.name().to_string(), time);
                }
            }
            trace_event!("benchmark_size_done", n = n, cached = cache.len());
        }
        Ok(report)
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[derive(Clone, Copy, Debug)]
enum Table {
    Basis,
    Forward,
    Inverse,
}

/// Timings in milliseconds, one column per size; `None` marks a skipped run.
#[derive(Clone, Debug, Default)]
pub struct BenchmarkReport {
    pub sizes: Vec<usize>,
    pub basis: BTreeMap<String, Vec<Option<f64>>>,
    pub forward: BTreeMap<String, Vec<Option<f64>>>,
    pub inverse: BTreeMap<String, Vec<Option<f64>>>,
}

impl BenchmarkReport {
    fn empty(sizes: &[usize], registry: &Registry) -> Self {
        let rows = |keys: Vec<String>| -> BTreeMap<String, Vec<Option<f64>>> {
            keys.into_iter().map(|k| (k, Vec::new())).collect()
        };
        Self {
            sizes: sizes.to_vec(),
            basis: rows(registry.basis.iter().map(|&m| Registry::basis_key(m)).collect()),
            forward: rows(registry.forward.iter().map(|m| m.name().to_string()).collect()),
            inverse: rows(registry.inverse.iter().map(|m| m.name().to_string()).collect()),
        }
    }

    fn push(&mut self, table: Table, key: String, time: Option<f64>) {
        let map = match table {
            Table::Basis => &mut self.basis,
            Table::Forward => &mut self.forward,
            Table::Inverse => &mut self.inverse,
        };
        map.entry(key).or_default().push(time);
    }

    fn write_table(
        &self,
        f: &mut fmt::Formatter<'_>,
        title: &str,
        rows: &BTreeMap<String, Vec<Option<f64>>>,
    ) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "========= {title:>8} Abel implementations ==========")?;
        if rows.is_empty() {
            return Ok(());
        }
        write!(f, "Implementation  ")?;
        for n in &self.sizes {
            write!(f, "    n = {n:<9} ")?;
        }
        writeln!(f)?;
        writeln!(f, "{}", "-".repeat(22 + 18 * self.sizes.len()))?;
        for (name, times) in rows {
            write!(f, "{name:>16} ")?;
            for t in times {
                match t {
                    Some(ms) => write!(f, " {ms:8.1}         ")?,
                    None => write!(f, " {:>8}         ", "-")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Display for BenchmarkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "time in milliseconds")?;
        self.write_table(f, "Basis", &self.basis)?;
        self.write_table(f, "Forward", &self.forward)?;
        self.write_table(f, "Inverse", &self.inverse)
    }
}

#[cfg(test)]
mod tests {
    use super::{AbelTiming, BenchmarkConfig, Registry};
    use crate::basis::Method;
    use crate::util::AbelError;

    #[test]
    fn full_registry_follows_capabilities() {
        let reg = Registry::full();
        assert_eq!(reg.basis, vec![Method::TwoPoint, Method::OnionPeeling]);
        assert_eq!(reg.forward, vec![Method::OnionPeeling]);
        assert_eq!(reg.inverse, vec![Method::TwoPoint, Method::OnionPeeling]);
    }

    #[test]
    fn small_run_fills_every_cell() {
        let timing = AbelTiming::new(BenchmarkConfig {
            sizes: vec![11, 21],
            n_max_bs: 15,
            ..BenchmarkConfig::default()
        })
        .unwrap();
        let report = timing.run().unwrap();
        let two_point = &report.inverse["two_point"];
        assert_eq!(two_point.len(), 2);
        assert!(two_point[0].is_some());
        assert!(two_point[1].is_none());
        assert_eq!(report.basis["onion_peeling_bs"].len(), 2);
        let text = report.to_string();
        assert!(text.contains("Inverse Abel implementations"));
        assert!(text.contains("two_point_bs"));
    }

    #[test]
    fn zero_repeat_is_rejected() {
        let err = AbelTiming::new(BenchmarkConfig {
            repeat: 0,
            ..BenchmarkConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, AbelError::InvalidInput(_)));
    }
}
