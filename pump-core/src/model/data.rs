//! In-memory LP/MIP problem storage.
//!
//! A [`ModelData`] holds columns (type, bounds, objective coefficient) and
//! sparse rows (coefficients, sense, right-hand side, optional range). Ranged
//! rows follow the `[rhs - range, rhs]` convention with `range >= 0`.

use sprs::{CsMat, TriMat};

use crate::error::{PumpError, PumpResult};
use crate::util::{is_unbounded, INF_BOUND};

/// Column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarType {
    /// Binary variable with implicit [0, 1] bounds.
    Binary,

    /// General integer variable.
    Integer,

    /// Continuous variable.
    Continuous,
}

impl VarType {
    /// True for binary and general integer columns.
    pub fn is_integer(&self) -> bool {
        matches!(self, VarType::Binary | VarType::Integer)
    }
}

/// Row sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSense {
    /// `a.x <= rhs`
    Le,

    /// `a.x >= rhs`
    Ge,

    /// `a.x == rhs`
    Eq,

    /// `rhs - range <= a.x <= rhs`
    Range,

    /// Nonbinding (free) row.
    Nonbinding,
}

/// Objective sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjSense {
    /// Minimize the objective.
    #[default]
    Minimize,

    /// Maximize the objective.
    Maximize,
}

impl ObjSense {
    /// Flip the sense.
    pub fn reversed(&self) -> Self {
        match self {
            ObjSense::Minimize => ObjSense::Maximize,
            ObjSense::Maximize => ObjSense::Minimize,
        }
    }
}

/// Immutable-structure problem data with mutable bounds and objective.
#[derive(Debug, Clone)]
pub struct ModelData {
    /// Problem name.
    pub name: String,

    obj_sense: ObjSense,
    obj_offset: f64,

    col_names: Vec<String>,
    col_types: Vec<VarType>,
    lb: Vec<f64>,
    ub: Vec<f64>,
    obj: Vec<f64>,

    /// Row-major coefficient matrix (m x n).
    rows: CsMat<f64>,
    row_names: Vec<String>,
    senses: Vec<RowSense>,
    rhs: Vec<f64>,
    ranges: Vec<f64>,
}

impl ModelData {
    /// Number of columns.
    pub fn ncols(&self) -> usize {
        self.col_types.len()
    }

    /// Number of rows.
    pub fn nrows(&self) -> usize {
        self.senses.len()
    }

    /// Number of structural non-zeros.
    pub fn nnz(&self) -> usize {
        self.rows.nnz()
    }

    /// Objective sense.
    pub fn obj_sense(&self) -> ObjSense {
        self.obj_sense
    }

    /// Set the objective sense.
    pub fn set_obj_sense(&mut self, sense: ObjSense) {
        self.obj_sense = sense;
    }

    /// Constant objective offset.
    pub fn obj_offset(&self) -> f64 {
        self.obj_offset
    }

    /// Set the constant objective offset.
    pub fn set_obj_offset(&mut self, offset: f64) {
        self.obj_offset = offset;
    }

    /// Column type.
    pub fn col_type(&self, j: usize) -> VarType {
        self.col_types[j]
    }

    /// Column name.
    pub fn col_name(&self, j: usize) -> &str {
        &self.col_names[j]
    }

    /// Row name.
    pub fn row_name(&self, i: usize) -> &str {
        &self.row_names[i]
    }

    /// Current lower bound of column `j`.
    pub fn lb(&self, j: usize) -> f64 {
        self.lb[j]
    }

    /// Current upper bound of column `j`.
    pub fn ub(&self, j: usize) -> f64 {
        self.ub[j]
    }

    /// All lower bounds.
    pub fn lbs(&self) -> &[f64] {
        &self.lb
    }

    /// All upper bounds.
    pub fn ubs(&self) -> &[f64] {
        &self.ub
    }

    /// Objective coefficient of column `j`.
    pub fn obj_coef(&self, j: usize) -> f64 {
        self.obj[j]
    }

    /// All objective coefficients.
    pub fn obj_coefs(&self) -> &[f64] {
        &self.obj
    }

    /// Set the lower bound of column `j`.
    pub fn set_lb(&mut self, j: usize, v: f64) {
        self.lb[j] = v;
    }

    /// Set the upper bound of column `j`.
    pub fn set_ub(&mut self, j: usize, v: f64) {
        self.ub[j] = v;
    }

    /// Fix column `j` to `v` (both bounds).
    pub fn fix_col(&mut self, j: usize, v: f64) {
        self.lb[j] = v;
        self.ub[j] = v;
    }

    /// Set the objective coefficient of column `j`.
    pub fn set_obj_coef(&mut self, j: usize, v: f64) {
        self.obj[j] = v;
    }

    /// Replace the whole objective vector.
    pub fn set_obj_coefs(&mut self, coefs: &[f64]) {
        debug_assert_eq!(coefs.len(), self.obj.len());
        self.obj.copy_from_slice(coefs);
    }

    /// Row sense.
    pub fn row_sense(&self, i: usize) -> RowSense {
        self.senses[i]
    }

    /// Row right-hand side.
    pub fn row_rhs(&self, i: usize) -> f64 {
        self.rhs[i]
    }

    /// Row range value (meaningful for `RowSense::Range` only).
    pub fn row_range(&self, i: usize) -> f64 {
        self.ranges[i]
    }

    /// Sparse entries of row `i` as `(column, coefficient)` pairs.
    pub fn row_entries(&self, i: usize) -> Vec<(usize, f64)> {
        match self.rows.outer_view(i) {
            Some(view) => view.iter().map(|(j, &c)| (j, c)).collect(),
            None => Vec::new(),
        }
    }

    /// Activity interval `[lo, hi]` a row's left-hand side must lie in.
    ///
    /// Infinite ends are reported as `-INF_BOUND` / `INF_BOUND`.
    pub fn row_bounds(&self, i: usize) -> (f64, f64) {
        match self.senses[i] {
            RowSense::Le => (-INF_BOUND, self.rhs[i]),
            RowSense::Ge => (self.rhs[i], INF_BOUND),
            RowSense::Eq => (self.rhs[i], self.rhs[i]),
            RowSense::Range => (self.rhs[i] - self.ranges[i], self.rhs[i]),
            RowSense::Nonbinding => (-INF_BOUND, INF_BOUND),
        }
    }

    /// Objective value of a point, including the offset, ignoring the sense.
    pub fn objective_value(&self, x: &[f64]) -> f64 {
        let dot: f64 = self.obj.iter().zip(x.iter()).map(|(c, v)| c * v).sum();
        dot + self.obj_offset
    }

    /// Euclidean norm of the objective vector.
    pub fn obj_norm(&self) -> f64 {
        self.obj.iter().map(|c| c * c).sum::<f64>().sqrt()
    }

    /// Left-hand side activity of row `i` at point `x`.
    pub fn row_activity(&self, i: usize, x: &[f64]) -> f64 {
        match self.rows.outer_view(i) {
            Some(view) => view.iter().map(|(j, &c)| c * x[j]).sum(),
            None => 0.0,
        }
    }

    /// Check whether `x` satisfies every binding row within `tol`.
    pub fn satisfies_rows(&self, x: &[f64], tol: f64) -> bool {
        for i in 0..self.nrows() {
            if self.senses[i] == RowSense::Nonbinding {
                continue;
            }
            let act = self.row_activity(i, x);
            let (lo, hi) = self.row_bounds(i);
            if act < lo - tol || act > hi + tol {
                return false;
            }
        }
        true
    }

    /// Largest violation of any binding row at point `x`.
    pub fn max_row_violation(&self, x: &[f64]) -> f64 {
        let mut worst = 0.0_f64;
        for i in 0..self.nrows() {
            if self.senses[i] == RowSense::Nonbinding {
                continue;
            }
            let act = self.row_activity(i, x);
            let (lo, hi) = self.row_bounds(i);
            worst = worst.max(lo - act).max(act - hi);
        }
        worst
    }

    /// True if column `j` has no finite lower bound.
    pub fn lb_unbounded(&self, j: usize) -> bool {
        is_unbounded(self.lb[j]) && self.lb[j] < 0.0
    }

    /// True if column `j` has no finite upper bound.
    pub fn ub_unbounded(&self, j: usize) -> bool {
        is_unbounded(self.ub[j]) && self.ub[j] > 0.0
    }
}

/// Incremental builder for [`ModelData`].
#[derive(Debug, Default)]
pub struct ModelBuilder {
    name: String,
    obj_sense: ObjSense,
    obj_offset: f64,
    col_names: Vec<String>,
    col_types: Vec<VarType>,
    lb: Vec<f64>,
    ub: Vec<f64>,
    obj: Vec<f64>,
    row_names: Vec<String>,
    senses: Vec<RowSense>,
    rhs: Vec<f64>,
    ranges: Vec<f64>,
    triplets: Vec<(usize, usize, f64)>,
}

impl ModelBuilder {
    /// Create an empty builder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the objective sense.
    pub fn obj_sense(&mut self, sense: ObjSense) -> &mut Self {
        self.obj_sense = sense;
        self
    }

    /// Set the constant objective offset.
    pub fn obj_offset(&mut self, offset: f64) -> &mut Self {
        self.obj_offset = offset;
        self
    }

    /// Add a column; returns its index. Binary columns are clipped to [0, 1].
    pub fn add_col(
        &mut self,
        name: impl Into<String>,
        ty: VarType,
        lb: f64,
        ub: f64,
        obj: f64,
    ) -> usize {
        let j = self.col_types.len();
        let (lb, ub) = match ty {
            VarType::Binary => (lb.max(0.0), ub.min(1.0)),
            _ => (lb, ub),
        };
        self.col_names.push(name.into());
        self.col_types.push(ty);
        self.lb.push(lb);
        self.ub.push(ub);
        self.obj.push(obj);
        j
    }

    /// Add a row; returns its index.
    pub fn add_row(
        &mut self,
        name: impl Into<String>,
        entries: &[(usize, f64)],
        sense: RowSense,
        rhs: f64,
        range: f64,
    ) -> usize {
        let i = self.senses.len();
        self.row_names.push(name.into());
        self.senses.push(sense);
        self.rhs.push(rhs);
        self.ranges.push(range);
        for &(j, c) in entries {
            self.triplets.push((i, j, c));
        }
        i
    }

    /// Finalize into a [`ModelData`].
    pub fn build(self) -> PumpResult<ModelData> {
        let m = self.senses.len();
        let n = self.col_types.len();
        for &(_, j, _) in &self.triplets {
            if j >= n {
                return Err(PumpError::InvalidProblem(format!(
                    "Coefficient for column {} but only {} columns",
                    j, n
                )));
            }
        }
        for (i, &range) in self.ranges.iter().enumerate() {
            if self.senses[i] == RowSense::Range && range < 0.0 {
                return Err(PumpError::InvalidProblem(format!(
                    "Row {} has negative range {}",
                    i, range
                )));
            }
        }

        let mut tri = TriMat::new((m, n));
        for &(i, j, v) in &self.triplets {
            tri.add_triplet(i, j, v);
        }

        Ok(ModelData {
            name: self.name,
            obj_sense: self.obj_sense,
            obj_offset: self.obj_offset,
            col_names: self.col_names,
            col_types: self.col_types,
            lb: self.lb,
            ub: self.ub,
            obj: self.obj,
            rows: tri.to_csr(),
            row_names: self.row_names,
            senses: self.senses,
            rhs: self.rhs,
            ranges: self.ranges,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn knapsack_like() -> ModelData {
        // min x0 + x1 - 2 x2
        // s.t. x0 + x1 + x2 <= 2
        //      1 <= x0 + x2 <= 3  (range row: rhs=3, range=2)
        let mut b = ModelBuilder::new("test");
        let x0 = b.add_col("x0", VarType::Binary, 0.0, 1.0, 1.0);
        let x1 = b.add_col("x1", VarType::Binary, 0.0, 1.0, 1.0);
        let x2 = b.add_col("x2", VarType::Continuous, 0.0, 5.0, -2.0);
        b.add_row("c0", &[(x0, 1.0), (x1, 1.0), (x2, 1.0)], RowSense::Le, 2.0, 0.0);
        b.add_row("c1", &[(x0, 1.0), (x2, 1.0)], RowSense::Range, 3.0, 2.0);
        b.build().unwrap()
    }

    #[test]
    fn test_dimensions() {
        let data = knapsack_like();
        assert_eq!(data.ncols(), 3);
        assert_eq!(data.nrows(), 2);
        assert_eq!(data.nnz(), 5);
    }

    #[test]
    fn test_row_bounds() {
        let data = knapsack_like();
        let (lo, hi) = data.row_bounds(0);
        assert!(lo <= -INF_BOUND);
        assert_eq!(hi, 2.0);

        let (lo, hi) = data.row_bounds(1);
        assert_eq!(lo, 1.0);
        assert_eq!(hi, 3.0);
    }

    #[test]
    fn test_row_replay() {
        let data = knapsack_like();
        assert!(data.satisfies_rows(&[1.0, 0.0, 1.0], 1e-9));
        // c1 activity = 0 < 1
        assert!(!data.satisfies_rows(&[0.0, 1.0, 0.0], 1e-9));
        assert!(data.max_row_violation(&[0.0, 1.0, 0.0]) > 0.9);
    }

    #[test]
    fn test_objective() {
        let mut data = knapsack_like();
        assert_eq!(data.objective_value(&[1.0, 1.0, 1.0]), 0.0);
        data.set_obj_offset(3.0);
        assert_eq!(data.objective_value(&[0.0, 0.0, 0.0]), 3.0);
        assert!((data.obj_norm() - (6.0_f64).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_bad_column_index() {
        let mut b = ModelBuilder::new("bad");
        b.add_col("x", VarType::Continuous, 0.0, 1.0, 0.0);
        b.add_row("r", &[(3, 1.0)], RowSense::Le, 1.0, 0.0);
        assert!(b.build().is_err());
    }
}
