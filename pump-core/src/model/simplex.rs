//! Built-in LP/MIP backend: dense two-phase simplex plus a small
//! depth-first branch-and-bound for `mipopt`.
//!
//! Every `LpMethod` selector maps onto the same tableau simplex; the method
//! argument exists so callers can express a preference the way they would
//! against an external solver. The implementation favors robustness over
//! speed: Bland's rule throughout, reduced costs recomputed per pivot.

use std::time::Instant;

use bit_set::BitSet;
use log::debug;

use super::data::{ModelData, ObjSense, VarType};
use super::presolve::{presolve_data, PostsolveMap, PresolveOutcome};
use super::{AbortFlag, ConflictSet, LpMethod, MipModel, SolveStatus};
use crate::util::{feq, is_unbounded, INF_BOUND};

/// Tunables of the built-in backend.
#[derive(Debug, Clone)]
pub struct BackendSettings {
    /// Per-call wall-clock limit in seconds.
    pub time_limit: f64,

    /// Simplex pivot limit per LP solve.
    pub iter_limit: usize,

    /// Stop `mipopt` after this many incumbents (`None` = search on).
    pub solution_limit: Option<usize>,

    /// Node limit for `mipopt`.
    pub node_limit: u64,

    /// Primal feasibility tolerance.
    pub feasibility_tol: f64,

    /// Integrality tolerance used by `mipopt`.
    pub integrality_tol: f64,

    /// Accepted for parity with external backends; the built-in simplex is
    /// single-threaded regardless.
    pub multi_threading: bool,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            time_limit: 1e20,
            iter_limit: 50_000,
            solution_limit: None,
            node_limit: 1_000_000,
            feasibility_tol: 1e-7,
            integrality_tol: 1e-6,
            multi_threading: false,
        }
    }
}

/// How an original column maps into the standard-form variable space.
#[derive(Debug, Clone, Copy)]
enum ColMap {
    /// Fixed at a value; not a simplex variable.
    Fixed(f64),

    /// `x = base + y`, `y >= 0`.
    Shift { var: usize, base: f64 },

    /// `x = base - y`, `y >= 0` (finite upper bound, no lower bound).
    Neg { var: usize, base: f64 },

    /// Free column split into `x = y_pos - y_neg`.
    Split { pos: usize, neg: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StdSense {
    Le,
    Ge,
    Eq,
}

#[derive(Debug)]
struct StdRow {
    coefs: Vec<(usize, f64)>,
    sense: StdSense,
    b: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LpOutcome {
    Optimal,
    Infeasible,
    Unbounded,
    IterLimit,
    TimeLimit,
    Interrupted,
    Numerical,
}

const PIVOT_TOL: f64 = 1e-9;
const PHASE1_TOL: f64 = 1e-6;

/// The built-in backend implementing the model facade.
#[derive(Debug, Clone)]
pub struct SimplexModel {
    data: ModelData,
    settings: BackendSettings,
    abort: AbortFlag,
    status: SolveStatus,
    x: Vec<f64>,
    rc: Vec<f64>,
    obj: f64,
    lp_mode: bool,
    presolved: Option<Box<ModelData>>,
    presolve_map: Option<PostsolveMap>,
    dependency: Option<Vec<BitSet>>,
}

impl SimplexModel {
    /// Wrap problem data with default backend settings.
    pub fn new(data: ModelData) -> Self {
        let n = data.ncols();
        Self {
            data,
            settings: BackendSettings::default(),
            abort: AbortFlag::new(),
            status: SolveStatus::Unsolved,
            x: vec![0.0; n],
            rc: vec![0.0; n],
            obj: 0.0,
            lp_mode: false,
            presolved: None,
            presolve_map: None,
            dependency: None,
        }
    }

    /// Wrap problem data with explicit backend settings.
    pub fn with_settings(data: ModelData, settings: BackendSettings) -> Self {
        let mut model = Self::new(data);
        model.settings = settings;
        model
    }

    /// Backend settings (read).
    pub fn settings(&self) -> &BackendSettings {
        &self.settings
    }

    /// Backend settings (mutate).
    pub fn settings_mut(&mut self) -> &mut BackendSettings {
        &mut self.settings
    }

    fn deadline(&self) -> (Instant, f64) {
        (Instant::now(), self.settings.time_limit)
    }

    fn out_of_time(start: Instant, limit: f64) -> bool {
        limit <= 0.0 || start.elapsed().as_secs_f64() > limit
    }

    /// Build the standard form for the current bounds and the given
    /// (already sense-adjusted, minimizing) objective.
    ///
    /// Returns `Err(outcome)` for trivially decided models.
    #[allow(clippy::type_complexity)]
    fn standard_form(
        &self,
        cost_orig: &[f64],
    ) -> Result<(Vec<ColMap>, usize, Vec<StdRow>, Vec<f64>), LpOutcome> {
        let n = self.data.ncols();
        let mut colmap = Vec::with_capacity(n);
        let mut nvars = 0usize;
        let mut ub_rows: Vec<StdRow> = Vec::new();

        for j in 0..n {
            let lb = self.data.lb(j);
            let ub = self.data.ub(j);
            if !is_unbounded(lb) && feq(lb, ub) {
                colmap.push(ColMap::Fixed(lb));
            } else if !is_unbounded(lb) {
                let var = nvars;
                nvars += 1;
                colmap.push(ColMap::Shift { var, base: lb });
                if !is_unbounded(ub) {
                    ub_rows.push(StdRow {
                        coefs: vec![(var, 1.0)],
                        sense: StdSense::Le,
                        b: ub - lb,
                    });
                }
            } else if !is_unbounded(ub) {
                let var = nvars;
                nvars += 1;
                colmap.push(ColMap::Neg { var, base: ub });
            } else {
                let pos = nvars;
                let neg = nvars + 1;
                nvars += 2;
                colmap.push(ColMap::Split { pos, neg });
            }
        }

        let mut rows = Vec::new();
        for i in 0..self.data.nrows() {
            let (lo, hi) = self.data.row_bounds(i);
            if is_unbounded(lo) && is_unbounded(hi) {
                continue;
            }
            let mut shift = 0.0;
            let mut coefs: Vec<(usize, f64)> = Vec::new();
            for (j, a) in self.data.row_entries(i) {
                if a.abs() <= 1e-12 {
                    continue;
                }
                match colmap[j] {
                    ColMap::Fixed(v) => shift += a * v,
                    ColMap::Shift { var, base } => {
                        shift += a * base;
                        coefs.push((var, a));
                    }
                    ColMap::Neg { var, base } => {
                        shift += a * base;
                        coefs.push((var, -a));
                    }
                    ColMap::Split { pos, neg } => {
                        coefs.push((pos, a));
                        coefs.push((neg, -a));
                    }
                }
            }
            let lo = if is_unbounded(lo) { -INF_BOUND } else { lo - shift };
            let hi = if is_unbounded(hi) { INF_BOUND } else { hi - shift };
            if coefs.is_empty() {
                let tol = self.settings.feasibility_tol.max(1e-7);
                if 0.0 < lo - tol || 0.0 > hi + tol {
                    return Err(LpOutcome::Infeasible);
                }
                continue;
            }
            if !is_unbounded(lo) && !is_unbounded(hi) && feq(lo, hi) {
                rows.push(StdRow {
                    coefs,
                    sense: StdSense::Eq,
                    b: lo,
                });
                continue;
            }
            if !is_unbounded(hi) {
                rows.push(StdRow {
                    coefs: coefs.clone(),
                    sense: StdSense::Le,
                    b: hi,
                });
            }
            if !is_unbounded(lo) {
                rows.push(StdRow {
                    coefs,
                    sense: StdSense::Ge,
                    b: lo,
                });
            }
        }
        rows.extend(ub_rows);

        // Normalize b >= 0.
        for row in &mut rows {
            if row.b < 0.0 {
                row.b = -row.b;
                for c in &mut row.coefs {
                    c.1 = -c.1;
                }
                row.sense = match row.sense {
                    StdSense::Le => StdSense::Ge,
                    StdSense::Ge => StdSense::Le,
                    StdSense::Eq => StdSense::Eq,
                };
            }
        }

        // Structural costs in the y-space.
        let mut cost = vec![0.0; nvars];
        for (j, &cj) in cost_orig.iter().enumerate() {
            match colmap[j] {
                ColMap::Fixed(_) => {}
                ColMap::Shift { var, .. } => cost[var] += cj,
                ColMap::Neg { var, .. } => cost[var] -= cj,
                ColMap::Split { pos, neg } => {
                    cost[pos] += cj;
                    cost[neg] -= cj;
                }
            }
        }

        if nvars == 0 {
            // Everything fixed; rows were constant checks handled above.
            return Err(LpOutcome::Optimal);
        }

        Ok((colmap, nvars, rows, cost))
    }

    /// Solve the LP relaxation with the current bounds and objective.
    ///
    /// On `Optimal`, fills `self.x`, `self.rc` and `self.obj`.
    fn solve_lp(&mut self) -> LpOutcome {
        let (start, limit) = self.deadline();
        let n = self.data.ncols();

        // Sense-adjusted objective: internally we always minimize.
        let negate = self.data.obj_sense() == ObjSense::Maximize;
        let cost_orig: Vec<f64> = self
            .data
            .obj_coefs()
            .iter()
            .map(|&c| if negate { -c } else { c })
            .collect();

        let (colmap, nvars, rows, cost) = match self.standard_form(&cost_orig) {
            Ok(parts) => parts,
            Err(LpOutcome::Optimal) => {
                // Fully fixed model.
                for j in 0..n {
                    self.x[j] = self.data.lb(j);
                }
                self.rc = cost_orig
                    .iter()
                    .map(|&c| if negate { -c } else { c })
                    .collect();
                self.obj = self.data.objective_value(&self.x);
                return LpOutcome::Optimal;
            }
            Err(out) => return out,
        };

        let m = rows.len();
        let nslack = rows
            .iter()
            .filter(|r| r.sense != StdSense::Eq)
            .count();
        let nart = rows
            .iter()
            .filter(|r| r.sense != StdSense::Le)
            .count();
        let total = nvars + nslack + nart;

        // Dense tableau plus rhs column and the basis.
        let mut tab = vec![vec![0.0; total]; m];
        let mut b = vec![0.0; m];
        let mut basis = vec![0usize; m];
        let art_start = nvars + nslack;

        let mut slack_idx = nvars;
        let mut art_idx = art_start;
        for (i, row) in rows.iter().enumerate() {
            for &(j, a) in &row.coefs {
                tab[i][j] += a;
            }
            b[i] = row.b;
            match row.sense {
                StdSense::Le => {
                    tab[i][slack_idx] = 1.0;
                    basis[i] = slack_idx;
                    slack_idx += 1;
                }
                StdSense::Ge => {
                    tab[i][slack_idx] = -1.0;
                    slack_idx += 1;
                    tab[i][art_idx] = 1.0;
                    basis[i] = art_idx;
                    art_idx += 1;
                }
                StdSense::Eq => {
                    tab[i][art_idx] = 1.0;
                    basis[i] = art_idx;
                    art_idx += 1;
                }
            }
        }

        // Phase 1: minimize the sum of artificials.
        if nart > 0 {
            let mut phase1 = vec![0.0; total];
            for c in phase1.iter_mut().skip(art_start) {
                *c = 1.0;
            }
            let out = self.iterate(&mut tab, &mut b, &mut basis, &phase1, total, start, limit);
            if out != LpOutcome::Optimal {
                return out;
            }
            let infeas: f64 = basis
                .iter()
                .zip(b.iter())
                .filter(|(&v, _)| v >= art_start)
                .map(|(_, &bv)| bv)
                .sum();
            if infeas > PHASE1_TOL {
                return LpOutcome::Infeasible;
            }

            // Drive artificials out of the basis; drop redundant rows.
            let mut keep = vec![true; tab.len()];
            for r in 0..tab.len() {
                if basis[r] < art_start {
                    continue;
                }
                let pivot_col = (0..art_start).find(|&j| tab[r][j].abs() > 1e-7);
                match pivot_col {
                    Some(j) => Self::pivot(&mut tab, &mut b, &mut basis, r, j),
                    None => keep[r] = false,
                }
            }
            let mut kept_tab = Vec::new();
            let mut kept_b = Vec::new();
            let mut kept_basis = Vec::new();
            for r in 0..tab.len() {
                if keep[r] {
                    let mut row = std::mem::take(&mut tab[r]);
                    row.truncate(art_start);
                    kept_tab.push(row);
                    kept_b.push(b[r]);
                    kept_basis.push(basis[r]);
                }
            }
            tab = kept_tab;
            b = kept_b;
            basis = kept_basis;
        }

        // Phase 2 with the real objective; artificial columns are gone.
        let cols2 = art_start;
        let mut cost2 = vec![0.0; cols2];
        cost2[..nvars].copy_from_slice(&cost);
        let out = self.iterate(&mut tab, &mut b, &mut basis, &cost2, cols2, start, limit);
        if out != LpOutcome::Optimal {
            return out;
        }

        // Recover the point and the reduced costs.
        let mut y = vec![0.0; cols2];
        for (r, &v) in basis.iter().enumerate() {
            y[v] = b[r];
        }
        let z = Self::reduced_costs_row(&tab, &basis, &cost2, cols2);
        for j in 0..n {
            let (xv, rcv) = match colmap[j] {
                ColMap::Fixed(v) => (v, 0.0),
                ColMap::Shift { var, base } => (base + y[var], z[var]),
                ColMap::Neg { var, base } => (base - y[var], -z[var]),
                ColMap::Split { pos, neg } => (y[pos] - y[neg], z[pos]),
            };
            self.x[j] = xv;
            self.rc[j] = if negate { -rcv } else { rcv };
        }
        self.obj = self.data.objective_value(&self.x);
        LpOutcome::Optimal
    }

    fn reduced_costs_row(
        tab: &[Vec<f64>],
        basis: &[usize],
        cost: &[f64],
        ncols: usize,
    ) -> Vec<f64> {
        let mut z = vec![0.0; ncols];
        for j in 0..ncols {
            let mut zj = 0.0;
            for (r, row) in tab.iter().enumerate() {
                zj += cost[basis[r]] * row[j];
            }
            z[j] = cost[j] - zj;
        }
        z
    }

    /// Bland-rule simplex iterations until optimality or a limit.
    #[allow(clippy::too_many_arguments)]
    fn iterate(
        &self,
        tab: &mut [Vec<f64>],
        b: &mut [f64],
        basis: &mut [usize],
        cost: &[f64],
        ncols: usize,
        start: Instant,
        limit: f64,
    ) -> LpOutcome {
        let m = tab.len();
        for _ in 0..self.settings.iter_limit {
            if self.abort.is_set() {
                return LpOutcome::Interrupted;
            }
            if Self::out_of_time(start, limit) {
                return LpOutcome::TimeLimit;
            }

            let z = Self::reduced_costs_row(tab, basis, cost, ncols);
            let entering = (0..ncols).find(|&j| z[j] < -PIVOT_TOL);
            let Some(j) = entering else {
                return LpOutcome::Optimal;
            };

            // Ratio test, Bland tie-break on the leaving basic index.
            let mut leave: Option<(usize, f64)> = None;
            for r in 0..m {
                if tab[r][j] > PIVOT_TOL {
                    let ratio = b[r] / tab[r][j];
                    match leave {
                        None => leave = Some((r, ratio)),
                        Some((lr, lratio)) => {
                            if ratio < lratio - 1e-12
                                || (feq(ratio, lratio) && basis[r] < basis[lr])
                            {
                                leave = Some((r, ratio));
                            }
                        }
                    }
                }
            }
            let Some((r, _)) = leave else {
                return LpOutcome::Unbounded;
            };
            Self::pivot(tab, b, basis, r, j);
        }
        LpOutcome::IterLimit
    }

    fn pivot(tab: &mut [Vec<f64>], b: &mut [f64], basis: &mut [usize], r: usize, j: usize) {
        let piv = tab[r][j];
        debug_assert!(piv.abs() > 1e-12);
        for v in tab[r].iter_mut() {
            *v /= piv;
        }
        b[r] /= piv;
        for i in 0..tab.len() {
            if i == r {
                continue;
            }
            let factor = tab[i][j];
            if factor.abs() <= 1e-14 {
                continue;
            }
            let (head, tail) = if i < r {
                let (a, bb) = tab.split_at_mut(r);
                (&mut a[i], &bb[0])
            } else {
                let (a, bb) = tab.split_at_mut(i);
                (&mut bb[0], &a[r])
            };
            for (hv, tv) in head.iter_mut().zip(tail.iter()) {
                *hv -= factor * tv;
            }
            b[i] -= factor * b[r];
            if b[i].abs() < 1e-12 {
                b[i] = 0.0;
            }
        }
        basis[r] = j;
    }

    fn record_lp_outcome(&mut self, out: LpOutcome) -> bool {
        self.status = match out {
            LpOutcome::Optimal => SolveStatus::Optimal,
            LpOutcome::Infeasible => SolveStatus::Infeasible,
            LpOutcome::Unbounded => SolveStatus::Unbounded,
            LpOutcome::TimeLimit => SolveStatus::TimeLimit,
            LpOutcome::IterLimit => SolveStatus::IterLimit,
            LpOutcome::Interrupted => SolveStatus::Interrupted,
            LpOutcome::Numerical => SolveStatus::NumericalError,
        };
        // Hard failures return false; statuses the caller inspects return true.
        !matches!(out, LpOutcome::IterLimit | LpOutcome::Numerical)
    }

    /// Branch on the most fractional integer column; `None` if integral.
    fn fractional_branch_var(&self, x: &[f64]) -> Option<(usize, f64)> {
        let tol = self.settings.integrality_tol;
        let mut best: Option<(usize, f64, f64)> = None;
        for j in 0..self.data.ncols() {
            if !self.data.col_type(j).is_integer() {
                continue;
            }
            let frac = (x[j] - x[j].round()).abs();
            if frac <= tol {
                continue;
            }
            let score = frac.min(1.0 - frac);
            match best {
                None => best = Some((j, x[j], score)),
                Some((_, _, s)) if score > s => best = Some((j, x[j], score)),
                _ => {}
            }
        }
        best.map(|(j, v, _)| (j, v))
    }
}

impl MipModel for SimplexModel {
    fn data(&self) -> &ModelData {
        &self.data
    }

    fn data_mut(&mut self) -> &mut ModelData {
        &mut self.data
    }

    fn clone_model(&self) -> Self {
        self.clone()
    }

    fn set_time_limit(&mut self, secs: f64) {
        self.settings.time_limit = secs;
    }

    fn time_limit(&self) -> f64 {
        self.settings.time_limit
    }

    fn abort_flag(&self) -> AbortFlag {
        self.abort.clone()
    }

    fn set_solution_limit(&mut self, limit: Option<usize>) {
        self.settings.solution_limit = limit;
    }

    fn lpopt(&mut self, method: LpMethod, decrease_tol: bool, initial: bool) -> bool {
        let _ = (method, decrease_tol, initial);
        let out = self.solve_lp();
        self.record_lp_outcome(out)
    }

    fn mipopt(&mut self) -> bool {
        if self.lp_mode {
            return self.lpopt(LpMethod::Auto, false, true);
        }

        let (start, limit) = self.deadline();
        let saved_lb = self.data.lbs().to_vec();
        let saved_ub = self.data.ubs().to_vec();
        let minimize = self.data.obj_sense() == ObjSense::Minimize;

        let mut incumbent: Option<(Vec<f64>, f64)> = None;
        let mut sols_found = 0usize;
        let mut nodes = 0u64;
        let mut timed_out = false;
        let mut saw_unbounded = false;

        // DFS over bound intervals.
        let mut stack = vec![(saved_lb.clone(), saved_ub.clone())];
        while let Some((lbs, ubs)) = stack.pop() {
            nodes += 1;
            if nodes > self.settings.node_limit || self.abort.is_set() {
                break;
            }
            if Self::out_of_time(start, limit) {
                timed_out = true;
                break;
            }

            for j in 0..self.data.ncols() {
                self.data.set_lb(j, lbs[j]);
                self.data.set_ub(j, ubs[j]);
            }
            let out = self.solve_lp();
            if out != LpOutcome::Optimal {
                if out == LpOutcome::TimeLimit {
                    timed_out = true;
                    break;
                }
                if out == LpOutcome::Unbounded {
                    saw_unbounded = true;
                }
                continue;
            }

            let node_obj = self.obj;
            let node_key = if minimize { node_obj } else { -node_obj };
            if let Some((_, inc_obj)) = &incumbent {
                let inc_key = if minimize { *inc_obj } else { -*inc_obj };
                if node_key >= inc_key - 1e-9 {
                    continue;
                }
            }

            let x_node = self.x.clone();
            match self.fractional_branch_var(&x_node) {
                None => {
                    incumbent = Some((self.x.clone(), node_obj));
                    sols_found += 1;
                    debug!("mipopt incumbent: obj={:.6e}", node_obj);
                    if let Some(lim) = self.settings.solution_limit {
                        if sols_found >= lim {
                            break;
                        }
                    }
                }
                Some((j, v)) => {
                    let mut down = (lbs.clone(), ubs.clone());
                    down.1[j] = v.floor();
                    let mut up = (lbs, ubs);
                    up.0[j] = v.ceil();
                    stack.push(down);
                    stack.push(up);
                }
            }
        }

        for j in 0..self.data.ncols() {
            self.data.set_lb(j, saved_lb[j]);
            self.data.set_ub(j, saved_ub[j]);
        }

        match incumbent {
            Some((x, obj)) => {
                self.x = x;
                self.obj = obj;
                self.status = SolveStatus::Optimal;
            }
            None => {
                self.status = if timed_out {
                    SolveStatus::TimeLimit
                } else if saw_unbounded {
                    SolveStatus::Unbounded
                } else {
                    SolveStatus::Infeasible
                };
            }
        }
        true
    }

    fn status(&self) -> SolveStatus {
        self.status
    }

    fn is_primal_feas(&self) -> bool {
        self.status == SolveStatus::Optimal
    }

    fn objval(&self) -> f64 {
        self.obj
    }

    fn sol(&self) -> &[f64] {
        &self.x
    }

    fn reduced_costs(&self) -> &[f64] {
        &self.rc
    }

    fn presolve(&mut self) -> bool {
        match presolve_data(&self.data, self.settings.integrality_tol) {
            PresolveOutcome::Infeasible => {
                self.status = SolveStatus::Infeasible;
                false
            }
            PresolveOutcome::Unchanged => {
                self.presolved = None;
                self.presolve_map = None;
                true
            }
            PresolveOutcome::Reduced(reduced, map) => {
                self.presolved = Some(Box::new(reduced));
                self.presolve_map = Some(map);
                true
            }
        }
    }

    fn presolved_model(&self) -> Option<Self> {
        self.presolved.as_ref().map(|reduced| {
            let mut model = SimplexModel::with_settings((**reduced).clone(), self.settings.clone());
            model.abort = self.abort.clone();
            model
        })
    }

    fn postsolve_solution(&self, pre_x: &[f64]) -> Vec<f64> {
        match &self.presolve_map {
            Some(map) => map.recover_x(pre_x),
            None => pre_x.to_vec(),
        }
    }

    fn presolve_solution(&self, orig_x: &[f64]) -> Vec<f64> {
        match &self.presolve_map {
            Some(map) => map.reduce_x(orig_x),
            None => orig_x.to_vec(),
        }
    }

    fn find_conflicting_variables(
        &mut self,
        candidates: &BitSet,
        optimize: bool,
        time_limit: f64,
    ) -> ConflictSet {
        let saved_obj = self.data.obj_coefs().to_vec();
        let saved_offset = self.data.obj_offset();
        let saved_sense = self.data.obj_sense();
        let saved_ub: Vec<(usize, f64)> =
            candidates.iter().map(|j| (j, self.data.ub(j))).collect();
        let saved_time = self.settings.time_limit;
        self.settings.time_limit = time_limit;

        let mut vars = Vec::new();
        if optimize {
            // Feasibility relaxation: allow each candidate's upper bound to
            // rise to 1 and minimize the total violation, which for binaries
            // deactivated at zero is exactly the sum of their values.
            let zero = vec![0.0; self.data.ncols()];
            self.data.set_obj_coefs(&zero);
            self.data.set_obj_offset(0.0);
            self.data.set_obj_sense(ObjSense::Minimize);
            for j in candidates.iter() {
                self.data.set_ub(j, 1.0);
                self.data.set_obj_coef(j, 1.0);
            }
            let ok = self.lpopt(LpMethod::Dual, false, true);
            if ok && self.is_primal_feas() {
                let eps = self.settings.feasibility_tol.max(1e-6);
                for j in candidates.iter() {
                    if self.x[j] >= eps {
                        vars.push(j);
                    }
                }
            }
        } else {
            // Deletion filter: activate every candidate, then try to
            // deactivate them one at a time, keeping the ones whose
            // activation is necessary for feasibility.
            let start = Instant::now();
            for j in candidates.iter() {
                self.data.set_ub(j, 1.0);
            }
            let ok = self.lpopt(LpMethod::Dual, false, true);
            if ok && self.is_primal_feas() {
                for j in candidates.iter() {
                    if start.elapsed().as_secs_f64() > time_limit {
                        break;
                    }
                    self.data.set_ub(j, 0.0);
                    let feasible =
                        self.lpopt(LpMethod::Dual, false, false) && self.is_primal_feas();
                    if !feasible {
                        self.data.set_ub(j, 1.0);
                        vars.push(j);
                    }
                }
            }
        }

        // Restore objective and bounds.
        self.data.set_obj_coefs(&saved_obj);
        self.data.set_obj_offset(saved_offset);
        self.data.set_obj_sense(saved_sense);
        for (j, ub) in saved_ub {
            self.data.set_ub(j, ub);
        }
        self.settings.time_limit = saved_time;

        ConflictSet {
            rows: Vec::new(),
            vars,
        }
    }

    fn cols_dependency(&mut self) -> &[BitSet] {
        if self.dependency.is_none() {
            let n = self.data.ncols();
            let mut dep = vec![BitSet::with_capacity(n); n];
            for i in 0..self.data.nrows() {
                let entries = self.data.row_entries(i);
                for (a, &(ja, _)) in entries.iter().enumerate() {
                    for &(jb, _) in entries.iter().skip(a + 1) {
                        dep[ja].insert(jb);
                        dep[jb].insert(ja);
                    }
                }
            }
            self.dependency = Some(dep);
        }
        self.dependency.as_ref().map(|d| d.as_slice()).unwrap_or(&[])
    }

    fn switch_to_lp(&mut self) {
        self.lp_mode = true;
    }

    fn switch_to_mip(&mut self) {
        self.lp_mode = false;
    }
}
