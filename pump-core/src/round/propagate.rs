//! Bound-consistency propagation over linear rows.
//!
//! Each binding row is analyzed once and turned into the most specific
//! propagator shape available: cardinality rows (unit coefficients over
//! binaries), knapsack rows (positive coefficients over binaries, upper
//! bounded), or the generic linear activity propagator. Rows whose
//! coefficient dynamism exceeds the filter thresholds are skipped for
//! numerical hygiene.

use log::debug;

use super::domain::Domain;
use crate::model::{ModelData, RowSense, VarType};
use crate::util::{fgt, is_unbounded, INF_BOUND};

const TIGHTEN_EPS: f64 = 1e-7;

/// Dynamism limit for rows containing integer variables.
const DYNAMISM_LIMIT: f64 = 1000.0;

/// Dynamism limit for all-continuous rows.
const DYNAMISM_LIMIT_CONT: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PropKind {
    Linear,
    Knapsack,
    Cardinality,
}

#[derive(Debug)]
struct RowProp {
    idx: Vec<usize>,
    coef: Vec<f64>,
    lo: f64,
    hi: f64,
    kind: PropKind,
}

/// Result of one propagation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropStatus {
    /// Reached quiescence with consistent domains.
    Consistent,

    /// Some variable's domain became empty.
    Infeasible,
}

/// The propagation engine: analyzed rows plus the var-to-row index.
#[derive(Debug)]
pub struct PropagationEngine {
    props: Vec<RowProp>,
    var_rows: Vec<Vec<usize>>,
    last_fixed: Vec<usize>,
}

impl PropagationEngine {
    /// Analyze every binding row of the model.
    pub fn from_model(data: &ModelData, filter_constraints: bool) -> Self {
        let n = data.ncols();
        let mut props = Vec::new();
        let mut var_rows = vec![Vec::new(); n];
        let mut filtered_out = 0usize;
        let mut counts = [0usize; 3];

        for i in 0..data.nrows() {
            if data.row_sense(i) == RowSense::Nonbinding {
                continue;
            }
            let entries: Vec<(usize, f64)> = data
                .row_entries(i)
                .into_iter()
                .filter(|(_, c)| c.abs() > 1e-12)
                .collect();
            if entries.is_empty() {
                continue;
            }

            if filter_constraints && Self::filtered(data, &entries) {
                filtered_out += 1;
                continue;
            }

            let (lo, hi) = data.row_bounds(i);
            let prop = Self::analyze(data, entries, lo, hi);
            counts[match prop.kind {
                PropKind::Linear => 0,
                PropKind::Knapsack => 1,
                PropKind::Cardinality => 2,
            }] += 1;
            let prop_index = props.len();
            for &j in &prop.idx {
                var_rows[j].push(prop_index);
            }
            props.push(prop);
        }

        debug!(
            "propagators: linear={} knapsack={} cardinality={} filtered={}",
            counts[0], counts[1], counts[2], filtered_out
        );

        Self {
            props,
            var_rows,
            last_fixed: Vec::new(),
        }
    }

    /// Coefficient dynamism filter.
    fn filtered(data: &ModelData, entries: &[(usize, f64)]) -> bool {
        let mut all_cont = true;
        let mut largest = f64::MIN_POSITIVE;
        let mut smallest = f64::MAX;
        for &(j, c) in entries {
            if data.col_type(j) != VarType::Continuous {
                all_cont = false;
            }
            let a = c.abs();
            largest = largest.max(a);
            smallest = smallest.min(a);
        }
        let dynamism = largest / smallest;
        (all_cont && fgt(dynamism, DYNAMISM_LIMIT_CONT)) || fgt(dynamism, DYNAMISM_LIMIT)
    }

    /// Pick the most specific propagator shape for a row.
    fn analyze(data: &ModelData, entries: Vec<(usize, f64)>, lo: f64, hi: f64) -> RowProp {
        let all_binary = entries
            .iter()
            .all(|&(j, _)| data.col_type(j) == VarType::Binary);
        let all_unit = entries.iter().all(|&(_, c)| (c - 1.0).abs() < 1e-12);
        let all_positive = entries.iter().all(|&(_, c)| c > 0.0);

        let kind = if all_binary && all_unit {
            PropKind::Cardinality
        } else if all_binary && all_positive && !is_unbounded(hi) && is_unbounded(lo) {
            PropKind::Knapsack
        } else {
            PropKind::Linear
        };

        let (idx, coef): (Vec<usize>, Vec<f64>) = entries.into_iter().unzip();
        RowProp {
            idx,
            coef,
            lo,
            hi,
            kind,
        }
    }

    /// Number of analyzed rows.
    pub fn num_props(&self) -> usize {
        self.props.len()
    }

    /// Variables fixed as a consequence of the last `propagate` call, not
    /// including the seed variable.
    pub fn last_fixed(&self) -> &[usize] {
        &self.last_fixed
    }

    /// Fix `x_j := v` and run the affected propagators to quiescence.
    pub fn propagate(&mut self, j: usize, v: f64, domain: &mut Domain) -> PropStatus {
        self.last_fixed.clear();
        let was_fixed: Vec<bool> = (0..domain.size()).map(|k| domain.is_fixed(k)).collect();
        domain.fix(j, v);

        let mut queue: Vec<usize> = self.var_rows[j].clone();
        let mut queued = vec![false; self.props.len()];
        for &p in &queue {
            queued[p] = true;
        }

        while let Some(p) = queue.pop() {
            queued[p] = false;
            let changed = match self.run_prop(p, domain) {
                Ok(changed) => changed,
                Err(()) => return PropStatus::Infeasible,
            };
            for &k in &changed {
                if domain.is_fixed(k) && !was_fixed[k] && k != j {
                    if !self.last_fixed.contains(&k) {
                        self.last_fixed.push(k);
                    }
                }
                for &q in &self.var_rows[k] {
                    if !queued[q] {
                        queued[q] = true;
                        queue.push(q);
                    }
                }
            }
        }
        PropStatus::Consistent
    }

    /// Run a single propagator; returns the variables whose bounds moved.
    fn run_prop(&self, p: usize, domain: &mut Domain) -> Result<Vec<usize>, ()> {
        let prop = &self.props[p];
        match prop.kind {
            PropKind::Cardinality => Self::run_cardinality(prop, domain),
            PropKind::Knapsack => Self::run_knapsack(prop, domain),
            PropKind::Linear => Self::run_linear(prop, domain),
        }
    }

    fn run_cardinality(prop: &RowProp, domain: &mut Domain) -> Result<Vec<usize>, ()> {
        let mut ones_min = 0usize;
        let mut ones_max = 0usize;
        for &j in &prop.idx {
            if domain.var_lb(j) > 0.5 {
                ones_min += 1;
                ones_max += 1;
            } else if domain.var_ub(j) > 0.5 {
                ones_max += 1;
            }
        }
        let lo = prop.lo.max(0.0);
        let hi = prop.hi;
        if (ones_min as f64) > hi + TIGHTEN_EPS || (ones_max as f64) < lo - TIGHTEN_EPS {
            return Err(());
        }

        let mut changed = Vec::new();
        if !is_unbounded(hi) && (ones_min as f64) >= hi - TIGHTEN_EPS {
            // saturated: every undecided variable drops to zero
            for &j in &prop.idx {
                if !domain.is_fixed(j) && domain.var_lb(j) < 0.5 && domain.var_ub(j) > 0.5 {
                    domain.fix(j, 0.0);
                    changed.push(j);
                }
            }
        } else if (ones_max as f64) <= lo + TIGHTEN_EPS {
            // every undecided variable is needed at one
            for &j in &prop.idx {
                if !domain.is_fixed(j) && domain.var_ub(j) > 0.5 && domain.var_lb(j) < 0.5 {
                    domain.fix(j, 1.0);
                    changed.push(j);
                }
            }
        }
        Ok(changed)
    }

    fn run_knapsack(prop: &RowProp, domain: &mut Domain) -> Result<Vec<usize>, ()> {
        let mut base = 0.0;
        for (&j, &a) in prop.idx.iter().zip(prop.coef.iter()) {
            if domain.var_lb(j) > 0.5 {
                base += a;
            }
        }
        if base > prop.hi + TIGHTEN_EPS {
            return Err(());
        }
        let slack = prop.hi - base;
        let mut changed = Vec::new();
        for (&j, &a) in prop.idx.iter().zip(prop.coef.iter()) {
            if !domain.is_fixed(j)
                && domain.var_lb(j) < 0.5
                && domain.var_ub(j) > 0.5
                && a > slack + TIGHTEN_EPS
            {
                domain.fix(j, 0.0);
                changed.push(j);
            }
        }
        Ok(changed)
    }

    fn run_linear(prop: &RowProp, domain: &mut Domain) -> Result<Vec<usize>, ()> {
        // Activity bounds with explicit infinity counting.
        let mut min_sum = 0.0;
        let mut min_inf = 0usize;
        let mut max_sum = 0.0;
        let mut max_inf = 0usize;
        for (&j, &a) in prop.idx.iter().zip(prop.coef.iter()) {
            let (cmin, cmax) = if a > 0.0 {
                (a * domain.var_lb(j), a * domain.var_ub(j))
            } else {
                (a * domain.var_ub(j), a * domain.var_lb(j))
            };
            if cmin <= -INF_BOUND {
                min_inf += 1;
            } else {
                min_sum += cmin;
            }
            if cmax >= INF_BOUND {
                max_inf += 1;
            } else {
                max_sum += cmax;
            }
        }

        if min_inf == 0 && !is_unbounded(prop.hi) && min_sum > prop.hi + TIGHTEN_EPS {
            return Err(());
        }
        if max_inf == 0 && !is_unbounded(prop.lo) && max_sum < prop.lo - TIGHTEN_EPS {
            return Err(());
        }

        let mut changed = Vec::new();
        for (&j, &a) in prop.idx.iter().zip(prop.coef.iter()) {
            if domain.is_fixed(j) {
                continue;
            }
            let (cmin, cmax) = if a > 0.0 {
                (a * domain.var_lb(j), a * domain.var_ub(j))
            } else {
                (a * domain.var_ub(j), a * domain.var_lb(j))
            };

            // a * x_j <= hi - (minact without j)
            if !is_unbounded(prop.hi) {
                let inf_others = min_inf - usize::from(cmin <= -INF_BOUND);
                if inf_others == 0 {
                    let rest = min_sum - if cmin <= -INF_BOUND { 0.0 } else { cmin };
                    let limit = prop.hi - rest;
                    let moved = if a > 0.0 {
                        let mut nb = limit / a;
                        if domain.var_type(j).is_integer() {
                            nb = (nb + TIGHTEN_EPS).floor();
                        }
                        domain.tighten_ub(j, nb)
                    } else {
                        let mut nb = limit / a;
                        if domain.var_type(j).is_integer() {
                            nb = (nb - TIGHTEN_EPS).ceil();
                        }
                        domain.tighten_lb(j, nb)
                    };
                    if moved {
                        changed.push(j);
                    }
                }
            }

            // a * x_j >= lo - (maxact without j)
            if !is_unbounded(prop.lo) {
                let inf_others = max_inf - usize::from(cmax >= INF_BOUND);
                if inf_others == 0 {
                    let rest = max_sum - if cmax >= INF_BOUND { 0.0 } else { cmax };
                    let limit = prop.lo - rest;
                    let moved = if a > 0.0 {
                        let mut nb = limit / a;
                        if domain.var_type(j).is_integer() {
                            nb = (nb - TIGHTEN_EPS).ceil();
                        }
                        domain.tighten_lb(j, nb)
                    } else {
                        let mut nb = limit / a;
                        if domain.var_type(j).is_integer() {
                            nb = (nb + TIGHTEN_EPS).floor();
                        }
                        domain.tighten_ub(j, nb)
                    };
                    if moved {
                        changed.push(j);
                    }
                }
            }

            if domain.is_empty(j) {
                return Err(());
            }
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelBuilder;

    fn build(data: &ModelData) -> (PropagationEngine, Domain) {
        (
            PropagationEngine::from_model(data, true),
            Domain::from_model(data),
        )
    }

    #[test]
    fn test_cardinality_saturation() {
        // x0 + x1 + x2 = 1: fixing x0 = 1 forces the rest to 0.
        let mut b = ModelBuilder::new("card");
        for name in ["x0", "x1", "x2"] {
            b.add_col(name, VarType::Binary, 0.0, 1.0, 0.0);
        }
        b.add_row("c", &[(0, 1.0), (1, 1.0), (2, 1.0)], RowSense::Eq, 1.0, 0.0);
        let data = b.build().unwrap();
        let (mut engine, mut domain) = build(&data);

        assert_eq!(engine.propagate(0, 1.0, &mut domain), PropStatus::Consistent);
        let mut fixed = engine.last_fixed().to_vec();
        fixed.sort_unstable();
        assert_eq!(fixed, vec![1, 2]);
        assert_eq!(domain.var_ub(1), 0.0);
        assert_eq!(domain.var_ub(2), 0.0);
    }

    #[test]
    fn test_cardinality_forcing() {
        // x0 + x1 = 2 with x0 fixed to 1 forces x1 to 1.
        let mut b = ModelBuilder::new("card2");
        b.add_col("x0", VarType::Binary, 0.0, 1.0, 0.0);
        b.add_col("x1", VarType::Binary, 0.0, 1.0, 0.0);
        b.add_row("c", &[(0, 1.0), (1, 1.0)], RowSense::Eq, 2.0, 0.0);
        let data = b.build().unwrap();
        let (mut engine, mut domain) = build(&data);

        assert_eq!(engine.propagate(0, 1.0, &mut domain), PropStatus::Consistent);
        assert_eq!(engine.last_fixed(), &[1]);
        assert_eq!(domain.var_lb(1), 1.0);
    }

    #[test]
    fn test_cardinality_infeasible() {
        // x0 + x1 = 2 with x0 = 0 is infeasible.
        let mut b = ModelBuilder::new("card3");
        b.add_col("x0", VarType::Binary, 0.0, 1.0, 0.0);
        b.add_col("x1", VarType::Binary, 0.0, 1.0, 0.0);
        b.add_row("c", &[(0, 1.0), (1, 1.0)], RowSense::Eq, 2.0, 0.0);
        let data = b.build().unwrap();
        let (mut engine, mut domain) = build(&data);

        assert_eq!(engine.propagate(0, 0.0, &mut domain), PropStatus::Infeasible);
    }

    #[test]
    fn test_knapsack_fixes_heavy_items() {
        // 3 x0 + 2 x1 + 2 x2 <= 4: taking x0 leaves room for nothing of
        // weight > 1.
        let mut b = ModelBuilder::new("kn");
        for name in ["x0", "x1", "x2"] {
            b.add_col(name, VarType::Binary, 0.0, 1.0, 0.0);
        }
        b.add_row(
            "c",
            &[(0, 3.0), (1, 2.0), (2, 2.0)],
            RowSense::Le,
            4.0,
            0.0,
        );
        let data = b.build().unwrap();
        let (mut engine, mut domain) = build(&data);

        assert_eq!(engine.propagate(0, 1.0, &mut domain), PropStatus::Consistent);
        let mut fixed = engine.last_fixed().to_vec();
        fixed.sort_unstable();
        assert_eq!(fixed, vec![1, 2]);
        assert_eq!(domain.var_ub(1), 0.0);
    }

    #[test]
    fn test_linear_tightening_general_integer() {
        // 2 x0 + x1 <= 5 with integer x1 in [0, 10]: x0 = 2 forces x1 <= 1.
        let mut b = ModelBuilder::new("lin");
        b.add_col("x0", VarType::Integer, 0.0, 3.0, 0.0);
        b.add_col("x1", VarType::Integer, 0.0, 10.0, 0.0);
        b.add_row("c", &[(0, 2.0), (1, 1.0)], RowSense::Le, 5.0, 0.0);
        let data = b.build().unwrap();
        let (mut engine, mut domain) = build(&data);

        assert_eq!(engine.propagate(0, 2.0, &mut domain), PropStatus::Consistent);
        assert_eq!(domain.var_ub(1), 1.0);
        // not fixed, only tightened
        assert!(engine.last_fixed().is_empty());
    }

    #[test]
    fn test_restore_after_propagation() {
        let mut b = ModelBuilder::new("restore");
        for name in ["x0", "x1", "x2"] {
            b.add_col(name, VarType::Binary, 0.0, 1.0, 0.0);
        }
        b.add_row("c", &[(0, 1.0), (1, 1.0), (2, 1.0)], RowSense::Eq, 1.0, 0.0);
        let data = b.build().unwrap();
        let (mut engine, mut domain) = build(&data);

        let snap = domain.snapshot();
        engine.propagate(0, 1.0, &mut domain);
        domain.restore(&snap);

        for j in 0..3 {
            assert_eq!(domain.var_lb(j), 0.0);
            assert_eq!(domain.var_ub(j), 1.0);
            assert!(!domain.is_fixed(j));
        }
    }

    #[test]
    fn test_dynamism_filter() {
        // coefficient ratio 2000 > 1000: row is skipped entirely
        let mut b = ModelBuilder::new("dyn");
        b.add_col("x0", VarType::Binary, 0.0, 1.0, 0.0);
        b.add_col("x1", VarType::Binary, 0.0, 1.0, 0.0);
        b.add_row("c", &[(0, 2000.0), (1, 1.0)], RowSense::Le, 1.0, 0.0);
        let data = b.build().unwrap();

        let engine = PropagationEngine::from_model(&data, true);
        assert_eq!(engine.num_props(), 0);

        let engine = PropagationEngine::from_model(&data, false);
        assert_eq!(engine.num_props(), 1);
    }
}
