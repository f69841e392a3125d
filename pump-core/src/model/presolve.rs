//! Presolve reductions and the presolved/original solution mapping.
//!
//! The reductions are deliberately light: integer bound rounding, singleton
//! row tightening, fixed column substitution and empty-row checks. They are
//! enough to shrink pump sub-models (where deactivated binaries are fixed at
//! zero) and to detect trivially infeasible instances.

use super::data::{ModelBuilder, ModelData, RowSense};
use crate::util::{feq, is_unbounded};

/// Mapping between the presolved and the original column spaces.
#[derive(Debug, Clone)]
pub struct PostsolveMap {
    orig_n: usize,

    /// Presolved index -> original index.
    kept: Vec<usize>,

    /// Columns removed by presolve, with their fixed values.
    fixed: Vec<(usize, f64)>,
}

impl PostsolveMap {
    /// Identity mapping over `n` columns.
    pub fn identity(n: usize) -> Self {
        Self {
            orig_n: n,
            kept: (0..n).collect(),
            fixed: Vec::new(),
        }
    }

    /// Number of columns in the original space.
    pub fn orig_n(&self) -> usize {
        self.orig_n
    }

    /// True when presolve removed nothing.
    pub fn is_identity(&self) -> bool {
        self.fixed.is_empty() && self.kept.len() == self.orig_n
    }

    /// Map a presolved-space vector to the original space.
    pub fn recover_x(&self, pre_x: &[f64]) -> Vec<f64> {
        debug_assert_eq!(pre_x.len(), self.kept.len());
        let mut x = vec![0.0; self.orig_n];
        for &(j, v) in &self.fixed {
            x[j] = v;
        }
        for (k, &j) in self.kept.iter().enumerate() {
            x[j] = pre_x[k];
        }
        x
    }

    /// Map an original-space vector to the presolved space.
    pub fn reduce_x(&self, orig_x: &[f64]) -> Vec<f64> {
        debug_assert_eq!(orig_x.len(), self.orig_n);
        self.kept.iter().map(|&j| orig_x[j]).collect()
    }
}

/// Result of running the reductions.
#[derive(Debug)]
pub enum PresolveOutcome {
    /// Reductions applied; a smaller model and its mapping.
    Reduced(ModelData, PostsolveMap),

    /// No reduction was possible.
    Unchanged,

    /// The reductions proved the problem infeasible.
    Infeasible,
}

/// Run the reduction loop on `data`.
pub fn presolve_data(data: &ModelData, eps: f64) -> PresolveOutcome {
    let n = data.ncols();
    let m = data.nrows();

    let mut lb: Vec<f64> = data.lbs().to_vec();
    let mut ub: Vec<f64> = data.ubs().to_vec();
    let mut row_dropped = vec![false; m];
    let mut changed_bounds = false;

    // Nonbinding rows never constrain anything.
    for i in 0..m {
        if data.row_sense(i) == RowSense::Nonbinding {
            row_dropped[i] = true;
        }
    }

    loop {
        let mut round_changed = false;

        // Integer bound rounding.
        for j in 0..n {
            if !data.col_type(j).is_integer() {
                continue;
            }
            if !is_unbounded(lb[j]) {
                let r = (lb[j] - eps).ceil();
                if r > lb[j] + eps {
                    lb[j] = r;
                    round_changed = true;
                }
            }
            if !is_unbounded(ub[j]) {
                let r = (ub[j] + eps).floor();
                if r < ub[j] - eps {
                    ub[j] = r;
                    round_changed = true;
                }
            }
        }

        for j in 0..n {
            if lb[j] > ub[j] + eps {
                return PresolveOutcome::Infeasible;
            }
        }

        // Singleton rows become bound tightenings.
        for i in 0..m {
            if row_dropped[i] {
                continue;
            }
            let entries = data.row_entries(i);
            let live: Vec<&(usize, f64)> =
                entries.iter().filter(|(_, c)| c.abs() > 1e-12).collect();
            if live.len() != 1 {
                continue;
            }
            let &(j, a) = live[0];
            let (lo, hi) = data.row_bounds(i);
            let (mut new_lb, mut new_ub) = if a > 0.0 {
                (lo / a, hi / a)
            } else {
                (hi / a, lo / a)
            };
            if is_unbounded(new_lb) {
                new_lb = f64::NEG_INFINITY;
            }
            if is_unbounded(new_ub) {
                new_ub = f64::INFINITY;
            }
            if new_lb > lb[j] + eps {
                lb[j] = new_lb;
                round_changed = true;
            }
            if new_ub < ub[j] - eps {
                ub[j] = new_ub;
                round_changed = true;
            }
            if lb[j] > ub[j] + eps {
                return PresolveOutcome::Infeasible;
            }
            row_dropped[i] = true;
            round_changed = true;
        }

        if !round_changed {
            break;
        }
        changed_bounds = true;
    }

    // Partition columns into fixed and kept.
    let mut fixed: Vec<(usize, f64)> = Vec::new();
    let mut kept: Vec<usize> = Vec::new();
    let mut new_index = vec![usize::MAX; n];
    for j in 0..n {
        if !is_unbounded(lb[j]) && feq(lb[j], ub[j]) {
            fixed.push((j, lb[j]));
        } else {
            new_index[j] = kept.len();
            kept.push(j);
        }
    }

    let rows_removed = row_dropped.iter().any(|&d| d);
    if fixed.is_empty() && !rows_removed && !changed_bounds {
        return PresolveOutcome::Unchanged;
    }

    // Rebuild the reduced model: fixed columns are substituted into the
    // right-hand sides, dropped rows disappear, empty rows are checked.
    let mut builder = ModelBuilder::new(data.name.clone());
    builder.obj_sense(data.obj_sense());
    let mut offset = data.obj_offset();
    for &(j, v) in &fixed {
        offset += data.obj_coef(j) * v;
    }
    builder.obj_offset(offset);

    for &j in &kept {
        builder.add_col(
            data.col_name(j).to_string(),
            data.col_type(j),
            lb[j],
            ub[j],
            data.obj_coef(j),
        );
    }

    for i in 0..m {
        if row_dropped[i] {
            continue;
        }
        let entries = data.row_entries(i);
        let mut shift = 0.0;
        let mut reduced: Vec<(usize, f64)> = Vec::new();
        for (j, c) in entries {
            if new_index[j] == usize::MAX {
                shift += c * lb[j];
            } else {
                reduced.push((new_index[j], c));
            }
        }
        let rhs = data.row_rhs(i) - shift;
        if reduced.is_empty() {
            let (lo, hi) = match data.row_sense(i) {
                RowSense::Le => (f64::NEG_INFINITY, rhs),
                RowSense::Ge => (rhs, f64::INFINITY),
                RowSense::Eq => (rhs, rhs),
                RowSense::Range => (rhs - data.row_range(i), rhs),
                RowSense::Nonbinding => continue,
            };
            if 0.0 < lo - eps || 0.0 > hi + eps {
                return PresolveOutcome::Infeasible;
            }
            continue;
        }
        builder.add_row(
            data.row_name(i).to_string(),
            &reduced,
            data.row_sense(i),
            rhs,
            data.row_range(i),
        );
    }

    let reduced = match builder.build() {
        Ok(d) => d,
        // the builder only rejects malformed input, which we constructed
        Err(_) => return PresolveOutcome::Unchanged,
    };
    let map = PostsolveMap {
        orig_n: n,
        kept,
        fixed,
    };
    PresolveOutcome::Reduced(reduced, map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::data::{ModelBuilder, VarType};

    #[test]
    fn test_identity_map() {
        let map = PostsolveMap::identity(3);
        assert!(map.is_identity());
        assert_eq!(map.recover_x(&[1.0, 2.0, 3.0]), vec![1.0, 2.0, 3.0]);
        assert_eq!(map.reduce_x(&[1.0, 2.0, 3.0]), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_fixed_column_elimination() {
        // x0 fixed to 1, x1 free in [0, 2]
        // row: x0 + x1 <= 2  =>  x1 <= 1 after substitution
        let mut b = ModelBuilder::new("t");
        b.add_col("x0", VarType::Continuous, 1.0, 1.0, 2.0);
        b.add_col("x1", VarType::Continuous, 0.0, 2.0, 1.0);
        b.add_row("r0", &[(0, 1.0), (1, 1.0)], RowSense::Le, 2.0, 0.0);
        let data = b.build().unwrap();

        match presolve_data(&data, 1e-6) {
            PresolveOutcome::Reduced(red, map) => {
                assert_eq!(red.ncols(), 1);
                assert_eq!(red.nrows(), 1);
                assert_eq!(red.row_rhs(0), 1.0);
                // objective offset picks up 2 * 1
                assert_eq!(red.obj_offset(), 2.0);
                let x = map.recover_x(&[0.5]);
                assert_eq!(x, vec![1.0, 0.5]);
                assert_eq!(map.reduce_x(&x), vec![0.5]);
            }
            other => panic!("expected reduction, got {:?}", other),
        }
    }

    #[test]
    fn test_singleton_row_tightening() {
        // row: 2 x0 <= 1 tightens integer x0 to ub = 0
        let mut b = ModelBuilder::new("t");
        b.add_col("x0", VarType::Binary, 0.0, 1.0, 1.0);
        b.add_col("x1", VarType::Binary, 0.0, 1.0, 1.0);
        b.add_row("r0", &[(0, 2.0)], RowSense::Le, 1.0, 0.0);
        let data = b.build().unwrap();

        match presolve_data(&data, 1e-6) {
            PresolveOutcome::Reduced(red, map) => {
                // x0 fixed to 0 and eliminated, singleton row dropped
                assert_eq!(red.ncols(), 1);
                assert_eq!(red.nrows(), 0);
                assert_eq!(map.recover_x(&[1.0]), vec![0.0, 1.0]);
            }
            other => panic!("expected reduction, got {:?}", other),
        }
    }

    #[test]
    fn test_infeasible_bounds() {
        // x <= 0 and x >= 1 on a binary
        let mut b = ModelBuilder::new("t");
        b.add_col("x", VarType::Binary, 0.0, 1.0, 0.0);
        b.add_row("up", &[(0, 1.0)], RowSense::Le, 0.0, 0.0);
        b.add_row("dn", &[(0, 1.0)], RowSense::Ge, 1.0, 0.0);
        let data = b.build().unwrap();

        assert!(matches!(
            presolve_data(&data, 1e-6),
            PresolveOutcome::Infeasible
        ));
    }

    #[test]
    fn test_unchanged() {
        let mut b = ModelBuilder::new("t");
        b.add_col("x0", VarType::Binary, 0.0, 1.0, 1.0);
        b.add_col("x1", VarType::Binary, 0.0, 1.0, 1.0);
        b.add_row("r0", &[(0, 1.0), (1, 1.0)], RowSense::Ge, 1.0, 0.0);
        let data = b.build().unwrap();

        assert!(matches!(
            presolve_data(&data, 1e-6),
            PresolveOutcome::Unchanged
        ));
    }
}
