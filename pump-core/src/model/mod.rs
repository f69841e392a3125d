//! Model facade: a uniform interface to an LP/MIP backend.
//!
//! The heuristics never talk to a solver directly; they see a [`MipModel`],
//! which exposes introspection, bound mutation, LP/MIP solves, presolve with
//! solution mapping in both directions, and conflict refinement. Solve calls
//! never fail on infeasibility or time-outs: they return `false` only on hard
//! backend errors, and the caller inspects [`MipModel::status`].

mod data;
mod presolve;
mod simplex;

pub use data::{ModelBuilder, ModelData, ObjSense, RowSense, VarType};
pub use presolve::PostsolveMap;
pub use simplex::{BackendSettings, SimplexModel};

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use bit_set::BitSet;

use crate::util::feq;

/// LP algorithm selector.
///
/// Backends are free to map several selectors onto the same algorithm; the
/// built-in simplex backend runs its one method for all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LpMethod {
    /// Primal simplex.
    Primal,

    /// Dual simplex.
    #[default]
    Dual,

    /// Barrier / interior point.
    Barrier,

    /// Backend default.
    Auto,

    /// Barrier without crossover (analytic center).
    Analytic,
}

/// Status of the most recent solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolveStatus {
    /// No solve has been attempted yet.
    #[default]
    Unsolved,

    /// Optimal (primal feasible) solution available.
    Optimal,

    /// Problem is infeasible.
    Infeasible,

    /// Problem is unbounded.
    Unbounded,

    /// Time limit reached before convergence.
    TimeLimit,

    /// Iteration limit reached before convergence.
    IterLimit,

    /// Numerical difficulties.
    NumericalError,

    /// Solve interrupted through the abort flag.
    Interrupted,
}

/// Output of conflict refinement.
#[derive(Debug, Clone, Default)]
pub struct ConflictSet {
    /// Rows participating in the conflict.
    pub rows: Vec<usize>,

    /// Columns whose (upper) bounds participate in the conflict.
    pub vars: Vec<usize>,
}

/// Shared, cloneable abort flag polled by the backend during solves.
#[derive(Debug, Clone, Default)]
pub struct AbortFlag(Rc<Cell<bool>>);

impl AbortFlag {
    /// Create a cleared flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request an abort.
    pub fn set(&self) {
        self.0.set(true);
    }

    /// Clear the flag.
    pub fn clear(&self) {
        self.0.set(false);
    }

    /// True if an abort was requested.
    pub fn is_set(&self) -> bool {
        self.0.get()
    }
}

/// Shared handle to a model.
///
/// The kernel pump and the feasibility pump share the model single-threaded:
/// at most one component mutates it at a time (exclusive mutation windows),
/// so a plain `Rc<RefCell<_>>` is the whole synchronization story.
pub type ModelHandle<M> = Rc<RefCell<M>>;

/// Wrap a model into a shared handle.
pub fn share<M: MipModel>(model: M) -> ModelHandle<M> {
    Rc::new(RefCell::new(model))
}

/// Facade contract over an LP/MIP backend.
pub trait MipModel: Sized {
    /// Problem data (read).
    fn data(&self) -> &ModelData;

    /// Problem data (mutate bounds/objective).
    fn data_mut(&mut self) -> &mut ModelData;

    /// Deep copy of the model, including current bounds.
    fn clone_model(&self) -> Self;

    /// Per-call wall-clock limit in seconds for subsequent solves.
    fn set_time_limit(&mut self, secs: f64);

    /// Current per-call time limit.
    fn time_limit(&self) -> f64;

    /// Abort flag shared with whoever drives this model.
    fn abort_flag(&self) -> AbortFlag;

    /// Limit on the number of incumbents `mipopt` searches for
    /// (`None` = no limit).
    fn set_solution_limit(&mut self, limit: Option<usize>);

    /// Solve the LP relaxation.
    ///
    /// Returns `true` when the backend ran to completion (even if the LP is
    /// infeasible; inspect [`MipModel::status`]); `false` on hard failure.
    /// `decrease_tol` permits a looser tolerance after repeated failures;
    /// `initial` marks a from-scratch solve.
    fn lpopt(&mut self, method: LpMethod, decrease_tol: bool, initial: bool) -> bool;

    /// Attempt an integer solve, honoring time and solution limits.
    fn mipopt(&mut self) -> bool;

    /// Status of the last solve.
    fn status(&self) -> SolveStatus;

    /// True when a primal feasible point is available from the last solve.
    fn is_primal_feas(&self) -> bool;

    /// Objective value of the last solve.
    fn objval(&self) -> f64;

    /// Primal values of the last solve.
    fn sol(&self) -> &[f64];

    /// Reduced costs of the last LP solve.
    fn reduced_costs(&self) -> &[f64];

    /// Run presolve reductions in place. Returns `false` if presolve proves
    /// the problem infeasible.
    fn presolve(&mut self) -> bool;

    /// Model in the presolved space, or `None` if presolve made no
    /// reductions (or was never run).
    fn presolved_model(&self) -> Option<Self>;

    /// Map a presolved-space vector back to original column indices.
    fn postsolve_solution(&self, pre_x: &[f64]) -> Vec<f64>;

    /// Map an original-space vector into the presolved space.
    fn presolve_solution(&self, orig_x: &[f64]) -> Vec<f64>;

    /// Conflict refinement over candidate columns (upper bounds only).
    ///
    /// With `optimize = true`, solves a feasibility relaxation minimizing the
    /// total upper-bound violation over `candidates` and reports every
    /// candidate whose bound had to be relaxed. With `optimize = false`,
    /// runs a deletion filter for a minimal set of candidates whose
    /// activation restores feasibility.
    fn find_conflicting_variables(
        &mut self,
        candidates: &BitSet,
        optimize: bool,
        time_limit: f64,
    ) -> ConflictSet;

    /// For each column, the set of columns sharing at least one row with it
    /// (symmetric, reflexive pairs omitted). Computed lazily and cached.
    fn cols_dependency(&mut self) -> &[BitSet];

    /// Treat the model as an LP from now on (integrality dropped).
    fn switch_to_lp(&mut self);

    /// Restore integrality information.
    fn switch_to_mip(&mut self);

    // --- Provided helpers -------------------------------------------------

    /// Number of columns.
    fn ncols(&self) -> usize {
        self.data().ncols()
    }

    /// Number of rows.
    fn nrows(&self) -> usize {
        self.data().nrows()
    }

    /// Number of non-zeros.
    fn nnz(&self) -> usize {
        self.data().nnz()
    }

    /// True if the last solve ended infeasible, timed out, or was aborted.
    fn is_infeasible_or_time_reached(&self) -> bool {
        matches!(
            self.status(),
            SolveStatus::Infeasible | SolveStatus::TimeLimit | SolveStatus::Interrupted
        )
    }

    /// True if an abort was requested.
    fn aborted(&self) -> bool {
        self.abort_flag().is_set()
    }

    /// Set `ub = 1` on every column in `entering` and `ub = 0` on every
    /// column in `leaving`. Idempotent; lower bounds untouched.
    fn update_model_var_bounds(&mut self, entering: Option<&BitSet>, leaving: Option<&BitSet>) {
        let data = self.data_mut();
        if let Some(entering) = entering {
            for j in entering.iter() {
                data.set_ub(j, 1.0);
            }
        }
        if let Some(leaving) = leaving {
            for j in leaving.iter() {
                data.set_ub(j, 0.0);
            }
        }
    }

    /// Bit set of binary columns.
    fn binaries(&self) -> BitSet {
        let data = self.data();
        let mut set = BitSet::with_capacity(data.ncols());
        for j in 0..data.ncols() {
            if data.col_type(j) == VarType::Binary {
                set.insert(j);
            }
        }
        set
    }

    /// Bit set of general integer columns.
    fn gintegers(&self) -> BitSet {
        let data = self.data();
        let mut set = BitSet::with_capacity(data.ncols());
        for j in 0..data.ncols() {
            if data.col_type(j) == VarType::Integer {
                set.insert(j);
            }
        }
        set
    }

    /// Bit set of continuous columns.
    fn continuous(&self) -> BitSet {
        let data = self.data();
        let mut set = BitSet::with_capacity(data.ncols());
        for j in 0..data.ncols() {
            if data.col_type(j) == VarType::Continuous {
                set.insert(j);
            }
        }
        set
    }

    /// Binary columns whose bounds are not collapsed (`lb != ub`).
    fn active_binaries(&self) -> BitSet {
        let data = self.data();
        let mut set = BitSet::with_capacity(data.ncols());
        for j in 0..data.ncols() {
            if data.col_type(j) == VarType::Binary && !feq(data.lb(j), data.ub(j)) {
                set.insert(j);
            }
        }
        set
    }

    /// Number of binary columns.
    fn num_binary_cols(&self) -> usize {
        self.binaries().len()
    }

    /// Number of integer-typed (binary + general integer) columns.
    fn num_integer_cols(&self) -> usize {
        let data = self.data();
        (0..data.ncols())
            .filter(|&j| data.col_type(j).is_integer())
            .count()
    }

    /// Replay every binding row of the model at `x`.
    fn is_solution_feasible(&self, x: &[f64], tol: f64) -> bool {
        self.data().satisfies_rows(x, tol)
    }

    /// Integrality gap of a point and the number of fractional variables.
    ///
    /// For each integer-typed column the per-variable gap is the distance to
    /// the nearest of `{lb, ub}` when the value lies outside `[lb, ub]`, and
    /// `|x_j - round(x_j)|` otherwise. An empty `x` counts a full gap of 1.0
    /// for every integer-typed column. Returns the gap sum and the count of
    /// per-variable gaps exceeding `eps`.
    fn compute_integrality_gap(&self, x: &[f64], eps: f64) -> (f64, usize) {
        let data = self.data();
        let mut gap = 0.0;
        let mut num_frac = 0;
        let mut num_int_vars = 0;
        for j in 0..data.ncols() {
            if !data.col_type(j).is_integer() {
                continue;
            }
            num_int_vars += 1;
            let var_gap = if x.is_empty() {
                1.0
            } else {
                let v = x[j];
                let (lb, ub) = (data.lb(j), data.ub(j));
                if v >= lb - eps && v <= ub + eps {
                    (v - v.round()).abs()
                } else {
                    (v - lb).abs().min((v - ub).abs())
                }
            };
            if var_gap > eps {
                num_frac += 1;
            }
            gap += var_gap;
        }
        if num_int_vars == 0 {
            return (0.0, 0);
        }
        (gap, num_frac)
    }
}
