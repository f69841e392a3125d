//! Rounding transformers: fractional points to integer points.
//!
//! Two transformers share the [`Rounder`] contract. [`SimpleRounding`]
//! applies threshold rounding to every integer column; [`PropagatorRounding`]
//! rounds one variable at a time in ranker order, propagating each fixing
//! through the constraints so dependent variables follow automatically.

mod domain;
mod propagate;
mod ranker;

pub use domain::{Domain, DomainSnapshot};
pub use propagate::{PropStatus, PropagationEngine};
pub use ranker::Ranker;

use std::cell::RefCell;
use std::rc::Rc;

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::PumpResult;
use crate::model::{ModelData, VarType};
use crate::settings::{FpSettings, RounderKind};
use crate::util::feq;

/// PRNG shared between the rounders and the pump's perturbation step, so a
/// run is reproducible from the seed alone.
pub type SharedRng = Rc<RefCell<StdRng>>;

/// Create the shared PRNG for a seed.
pub fn shared_rng(seed: u64) -> SharedRng {
    Rc::new(RefCell::new(StdRng::seed_from_u64(seed)))
}

/// Threshold-round `v`: floor when the fractional part is below `t`.
#[inline]
fn round_with_threshold(v: f64, t: f64) -> f64 {
    let fl = v.floor();
    if v - fl < t {
        fl
    } else {
        fl + 1.0
    }
}

/// A rounding transformer.
pub trait Rounder {
    /// Enumerate the integer columns of the model and prepare internal state.
    fn init(&mut self, data: &ModelData, ignore_general_int: bool) -> PumpResult<()>;

    /// Produce `out` from `input` with every tracked integer column at an
    /// integer value inside its bounds; continuous columns pass through.
    fn apply(&mut self, input: &[f64], out: &mut Vec<f64>);

    /// Drop internal state.
    fn clear(&mut self);
}

/// Build the configured rounder.
pub fn make_rounder(settings: &FpSettings, rng: SharedRng) -> Box<dyn Rounder> {
    match settings.rounder {
        RounderKind::Simple => Box::new(SimpleRounding::new(settings.randomized_rounding, rng)),
        RounderKind::Propagating => Box::new(PropagatorRounding::new(
            settings.randomized_rounding,
            settings.ranker,
            settings.filter_constraints,
            rng,
        )),
    }
}

/// Plain threshold rounding.
pub struct SimpleRounding {
    randomized: bool,
    rng: SharedRng,
    binaries: Vec<usize>,
    gintegers: Vec<usize>,
    integers: Vec<usize>,
}

impl SimpleRounding {
    /// Create a simple rounder.
    pub fn new(randomized: bool, rng: SharedRng) -> Self {
        Self {
            randomized,
            rng,
            binaries: Vec::new(),
            gintegers: Vec::new(),
            integers: Vec::new(),
        }
    }

    fn enumerate(&mut self, data: &ModelData, ignore_general_int: bool) {
        self.binaries.clear();
        self.gintegers.clear();
        for j in 0..data.ncols() {
            if feq(data.lb(j), data.ub(j)) {
                continue;
            }
            match data.col_type(j) {
                VarType::Binary => self.binaries.push(j),
                VarType::Integer => self.gintegers.push(j),
                VarType::Continuous => {}
            }
        }
        self.integers = self.binaries.clone();
        if !ignore_general_int {
            self.integers.extend_from_slice(&self.gintegers);
        }
    }

    fn threshold(&mut self) -> f64 {
        if self.randomized {
            self.rng.borrow_mut().gen_range(0.0..1.0)
        } else {
            0.5
        }
    }
}

impl Rounder for SimpleRounding {
    fn init(&mut self, data: &ModelData, ignore_general_int: bool) -> PumpResult<()> {
        self.enumerate(data, ignore_general_int);
        Ok(())
    }

    fn apply(&mut self, input: &[f64], out: &mut Vec<f64>) {
        out.clear();
        out.extend_from_slice(input);
        let t = self.threshold();
        let mut down = 0usize;
        let mut up = 0usize;
        for &j in &self.integers {
            out[j] = round_with_threshold(input[j], t);
            if out[j] < input[j] {
                down += 1;
            } else if out[j] > input[j] {
                up += 1;
            }
        }
        debug!("rounding: thr={:.4} #down={} #up={}", t, down, up);
    }

    fn clear(&mut self) {
        self.binaries.clear();
        self.gintegers.clear();
        self.integers.clear();
    }
}

/// Ranker-ordered rounding with constraint propagation.
pub struct PropagatorRounding {
    randomized: bool,
    ranker_kind: crate::settings::RankerKind,
    filter_constraints: bool,
    rng: SharedRng,
    state: Option<PropState>,
}

struct PropState {
    domain: Domain,
    engine: PropagationEngine,
    ranker: Ranker,
    snapshot: DomainSnapshot,
}

impl PropagatorRounding {
    /// Create a propagating rounder.
    pub fn new(
        randomized: bool,
        ranker_kind: crate::settings::RankerKind,
        filter_constraints: bool,
        rng: SharedRng,
    ) -> Self {
        Self {
            randomized,
            ranker_kind,
            filter_constraints,
            rng,
            state: None,
        }
    }

    fn threshold(&mut self) -> f64 {
        if self.randomized {
            self.rng.borrow_mut().gen_range(0.0..1.0)
        } else {
            0.5
        }
    }
}

impl Rounder for PropagatorRounding {
    fn init(&mut self, data: &ModelData, ignore_general_int: bool) -> PumpResult<()> {
        let domain = Domain::from_model(data);
        let engine = PropagationEngine::from_model(data, self.filter_constraints);
        let mut ranker = Ranker::new(self.ranker_kind);
        ranker.ignore_general_integers(ignore_general_int);
        let snapshot = domain.snapshot();
        self.state = Some(PropState {
            domain,
            engine,
            ranker,
            snapshot,
        });
        Ok(())
    }

    fn apply(&mut self, input: &[f64], out: &mut Vec<f64>) {
        out.clear();
        out.extend_from_slice(input);
        let t = self.threshold();

        let Some(state) = self.state.as_mut() else {
            return;
        };
        state.domain.restore(&state.snapshot);
        state.ranker.set_current_state(input);

        let mut consistent = true;
        while let Some(j) = state.ranker.next(&state.domain) {
            let v = input[j];
            let lb = state.domain.var_lb(j);
            let ub = state.domain.var_ub(j);
            let rounded = match state.domain.var_type(j) {
                VarType::Binary => round_with_threshold(v, t),
                // general integer: honor the tightened domain
                _ => {
                    if v <= lb {
                        lb
                    } else if v >= ub {
                        ub
                    } else {
                        round_with_threshold(v, t)
                    }
                }
            };
            let rounded = rounded.clamp(lb, ub);
            out[j] = rounded;

            if consistent {
                match state.engine.propagate(j, rounded, &mut state.domain) {
                    PropStatus::Consistent => {
                        for &k in state.engine.last_fixed() {
                            out[k] = state.domain.var_lb(k);
                        }
                    }
                    PropStatus::Infeasible => {
                        // the rounding can no longer be completed consistently;
                        // finish with plain threshold rounding
                        consistent = false;
                    }
                }
            } else {
                state.domain.fix(j, rounded);
            }
        }
    }

    fn clear(&mut self) {
        self.state = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModelBuilder, RowSense};

    fn model() -> ModelData {
        // x0 + x1 + x2 = 1 over binaries, one general integer in [0, 4]
        let mut b = ModelBuilder::new("round");
        for name in ["x0", "x1", "x2"] {
            b.add_col(name, VarType::Binary, 0.0, 1.0, 0.0);
        }
        b.add_col("y", VarType::Integer, 0.0, 4.0, 0.0);
        b.add_col("z", VarType::Continuous, 0.0, 1.0, 0.0);
        b.add_row("c", &[(0, 1.0), (1, 1.0), (2, 1.0)], RowSense::Eq, 1.0, 0.0);
        b.build().unwrap()
    }

    #[test]
    fn test_simple_rounding_totality() {
        let data = model();
        let mut rounder = SimpleRounding::new(false, shared_rng(0));
        rounder.init(&data, false).unwrap();

        let input = vec![0.7, 0.2, 0.1, 2.6, 0.33];
        let mut out = Vec::new();
        rounder.apply(&input, &mut out);

        assert_eq!(out[0], 1.0);
        assert_eq!(out[1], 0.0);
        assert_eq!(out[2], 0.0);
        assert_eq!(out[3], 3.0);
        // continuous passes through
        assert!((out[4] - 0.33).abs() < 1e-12);
    }

    #[test]
    fn test_simple_rounding_ignores_gintegers_when_asked() {
        let data = model();
        let mut rounder = SimpleRounding::new(false, shared_rng(0));
        rounder.init(&data, true).unwrap();

        let input = vec![0.7, 0.2, 0.1, 2.6, 0.33];
        let mut out = Vec::new();
        rounder.apply(&input, &mut out);
        assert!((out[3] - 2.6).abs() < 1e-12);
    }

    #[test]
    fn test_randomized_threshold_reproducible() {
        let data = model();
        let input = vec![0.7, 0.2, 0.1, 2.6, 0.33];

        let mut out_a = Vec::new();
        let mut r = SimpleRounding::new(true, shared_rng(42));
        r.init(&data, false).unwrap();
        r.apply(&input, &mut out_a);

        let mut out_b = Vec::new();
        let mut r = SimpleRounding::new(true, shared_rng(42));
        r.init(&data, false).unwrap();
        r.apply(&input, &mut out_b);

        assert_eq!(out_a, out_b);
    }

    #[test]
    fn test_propagator_rounding_follows_fixings() {
        let data = model();
        let mut rounder = PropagatorRounding::new(
            false,
            crate::settings::RankerKind::Frac,
            true,
            shared_rng(0),
        );
        rounder.init(&data, false).unwrap();

        // x0 rounds to 1 first (most fractional is x0 at 0.6), equality then
        // forces x1 = x2 = 0 by propagation.
        let input = vec![0.6, 0.3, 0.1, 1.2, 0.5];
        let mut out = Vec::new();
        rounder.apply(&input, &mut out);

        assert_eq!(out[0], 1.0);
        assert_eq!(out[1], 0.0);
        assert_eq!(out[2], 0.0);
        // general integer rounded within its bounds
        assert_eq!(out[3], 1.0);
        assert!((out[4] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_rounder_totality_in_bounds() {
        let data = model();
        let mut rounder = PropagatorRounding::new(
            true,
            crate::settings::RankerKind::Frac,
            true,
            shared_rng(7),
        );
        rounder.init(&data, false).unwrap();

        let input = vec![0.5, 0.5, 0.5, 3.9, 0.2];
        let mut out = Vec::new();
        rounder.apply(&input, &mut out);

        for j in 0..4 {
            assert!((out[j] - out[j].round()).abs() < 1e-9, "var {} integral", j);
            assert!(out[j] >= data.lb(j) - 1e-9);
            assert!(out[j] <= data.ub(j) + 1e-9);
        }
    }
}
