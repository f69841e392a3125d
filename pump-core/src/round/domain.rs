//! Variable domains for constraint propagation.

use crate::model::{ModelData, VarType};
use crate::util::feq;

/// Current bounds and fixed flags of every column.
#[derive(Debug, Clone)]
pub struct Domain {
    lb: Vec<f64>,
    ub: Vec<f64>,
    fixed: Vec<bool>,
    types: Vec<VarType>,
}

/// Saved domain state; restoring it reverts every bound exactly.
#[derive(Debug, Clone)]
pub struct DomainSnapshot {
    lb: Vec<f64>,
    ub: Vec<f64>,
    fixed: Vec<bool>,
}

impl Domain {
    /// Build a domain from the model's current bounds. Columns with
    /// collapsed bounds start out fixed.
    pub fn from_model(data: &ModelData) -> Self {
        let n = data.ncols();
        let mut domain = Self {
            lb: data.lbs().to_vec(),
            ub: data.ubs().to_vec(),
            fixed: vec![false; n],
            types: (0..n).map(|j| data.col_type(j)).collect(),
        };
        for j in 0..n {
            if feq(domain.lb[j], domain.ub[j]) {
                domain.fixed[j] = true;
            }
        }
        domain
    }

    /// Number of variables.
    pub fn size(&self) -> usize {
        self.lb.len()
    }

    /// Lower bound of variable `j`.
    pub fn var_lb(&self, j: usize) -> f64 {
        self.lb[j]
    }

    /// Upper bound of variable `j`.
    pub fn var_ub(&self, j: usize) -> f64 {
        self.ub[j]
    }

    /// Type of variable `j`.
    pub fn var_type(&self, j: usize) -> VarType {
        self.types[j]
    }

    /// True once both bounds collapsed.
    pub fn is_fixed(&self, j: usize) -> bool {
        self.fixed[j]
    }

    /// Fix variable `j` to `v`.
    pub fn fix(&mut self, j: usize, v: f64) {
        self.lb[j] = v;
        self.ub[j] = v;
        self.fixed[j] = true;
    }

    /// Raise the lower bound; returns true if it moved. Marks the variable
    /// fixed when the bounds collapse.
    pub fn tighten_lb(&mut self, j: usize, v: f64) -> bool {
        if v > self.lb[j] + 1e-9 {
            self.lb[j] = v;
            if feq(self.lb[j], self.ub[j]) {
                self.lb[j] = self.ub[j];
                self.fixed[j] = true;
            }
            return true;
        }
        false
    }

    /// Lower the upper bound; returns true if it moved.
    pub fn tighten_ub(&mut self, j: usize, v: f64) -> bool {
        if v < self.ub[j] - 1e-9 {
            self.ub[j] = v;
            if feq(self.lb[j], self.ub[j]) {
                self.ub[j] = self.lb[j];
                self.fixed[j] = true;
            }
            return true;
        }
        false
    }

    /// True if the bounds of variable `j` crossed.
    pub fn is_empty(&self, j: usize) -> bool {
        self.lb[j] > self.ub[j] + 1e-9
    }

    /// Snapshot the full state.
    pub fn snapshot(&self) -> DomainSnapshot {
        DomainSnapshot {
            lb: self.lb.clone(),
            ub: self.ub.clone(),
            fixed: self.fixed.clone(),
        }
    }

    /// Restore a previously taken snapshot.
    pub fn restore(&mut self, snap: &DomainSnapshot) {
        self.lb.copy_from_slice(&snap.lb);
        self.ub.copy_from_slice(&snap.ub);
        self.fixed.copy_from_slice(&snap.fixed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModelBuilder, RowSense};

    fn domain() -> Domain {
        let mut b = ModelBuilder::new("d");
        b.add_col("x0", VarType::Binary, 0.0, 1.0, 0.0);
        b.add_col("x1", VarType::Integer, 0.0, 5.0, 0.0);
        b.add_col("x2", VarType::Continuous, 2.0, 2.0, 0.0);
        b.add_row("r", &[(0, 1.0)], RowSense::Le, 1.0, 0.0);
        Domain::from_model(&b.build().unwrap())
    }

    #[test]
    fn test_initial_fixed() {
        let d = domain();
        assert!(!d.is_fixed(0));
        assert!(!d.is_fixed(1));
        assert!(d.is_fixed(2));
    }

    #[test]
    fn test_snapshot_restore_exact() {
        let mut d = domain();
        let snap = d.snapshot();

        d.fix(0, 1.0);
        d.tighten_ub(1, 3.0);
        d.tighten_lb(1, 2.0);
        assert!(d.is_fixed(0));
        assert_eq!(d.var_ub(1), 3.0);

        d.restore(&snap);
        assert!(!d.is_fixed(0));
        assert_eq!(d.var_lb(0), 0.0);
        assert_eq!(d.var_ub(0), 1.0);
        assert_eq!(d.var_lb(1), 0.0);
        assert_eq!(d.var_ub(1), 5.0);
        assert!(!d.is_fixed(1));
    }

    #[test]
    fn test_tighten_collapse_marks_fixed() {
        let mut d = domain();
        assert!(d.tighten_ub(1, 0.0));
        assert!(d.is_fixed(1));
        assert_eq!(d.var_lb(1), d.var_ub(1));
    }
}
