//! The feasibility pump: alternating LP projection and rounding.
//!
//! Stage 0 solves the LP relaxation (original objective, or the blended
//! distance objective when a warm-started reference point exists). The
//! stage-2 loop then minimizes an alpha-blend of the distance to the current
//! rounded point and the original objective, re-rounding after every solve,
//! perturbing on stalls and restarting on longer cycles.

use std::collections::hash_map::DefaultHasher;
use std::collections::VecDeque;
use std::hash::Hasher;
use std::time::Instant;

use bit_set::BitSet;
use log::{debug, info};

use crate::error::{PumpError, PumpResult};
use crate::model::{LpMethod, MipModel, ModelHandle, ObjSense, SolveStatus, VarType};
use crate::round::{make_rounder, shared_rng, Rounder, SharedRng};
use crate::settings::FpSettings;
use crate::util::{approx_eq, feq};

use rand::seq::SliceRandom;
use rand::Rng;

/// Structured outcome of one pump run.
#[derive(Debug, Clone, Copy, Default)]
pub struct PumpOutcome {
    /// An integer feasible point was found.
    pub found_integer: bool,

    /// The pump's LP was feasible at least once (the pump could iterate).
    pub lp_feasible: bool,

    /// The run ended on a hard numerical failure of the backend.
    pub numerical: bool,
}

/// Per-run statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct FpStats {
    /// Iterations of the last run (stage 0 + stage 2).
    pub iterations: usize,

    /// Stage-2 iterations of the last run.
    pub iterations_stage2: usize,

    /// Perturbations triggered by stall detection in the last run.
    pub perturbations_stage2: usize,

    /// Restarts triggered by cycle detection in the last run.
    pub restarts_stage2: usize,
}

/// The feasibility pump.
pub struct FeasibilityPump<M: MipModel> {
    settings: FpSettings,
    rng: SharedRng,
    rounder: Box<dyn Rounder>,

    work: Option<M>,
    mapper: Option<M>,

    active: BitSet,
    active_gints: BitSet,
    nbin_active: usize,
    all_binaries_active: bool,

    orig_obj: Vec<f64>,
    orig_offset: f64,
    orig_sense: ObjSense,
    obj_norm: f64,

    x_frac: Vec<f64>,
    x_round: Vec<f64>,

    closest_frac: Vec<f64>,
    closest_dist: f64,

    found: bool,
    solution: Vec<f64>,
    primal_bound: f64,
    is_infeasible: bool,

    alpha: f64,
    stats: FpStats,
    total_iterations: usize,
    fingerprints: VecDeque<u64>,
}

impl<M: MipModel> FeasibilityPump<M> {
    /// Create a pump with the given settings.
    pub fn new(settings: FpSettings) -> Self {
        let rng = shared_rng(settings.seed);
        let rounder = make_rounder(&settings, rng.clone());
        Self {
            settings,
            rng,
            rounder,
            work: None,
            mapper: None,
            active: BitSet::new(),
            active_gints: BitSet::new(),
            nbin_active: 0,
            all_binaries_active: false,
            orig_obj: Vec::new(),
            orig_offset: 0.0,
            orig_sense: ObjSense::Minimize,
            obj_norm: 0.0,
            x_frac: Vec::new(),
            x_round: Vec::new(),
            closest_frac: Vec::new(),
            closest_dist: f64::INFINITY,
            found: false,
            solution: Vec::new(),
            primal_bound: f64::INFINITY,
            is_infeasible: false,
            alpha: 0.0,
            stats: FpStats::default(),
            total_iterations: 0,
            fingerprints: VecDeque::new(),
        }
    }

    /// LP method preferred for re-optimization solves.
    pub fn reopt_method(&self) -> LpMethod {
        self.settings.reopt_method
    }

    /// Prepare the pump for the model's current bounds.
    ///
    /// The sub-model is cloned and (optionally) presolved. Returns `Ok(false)`
    /// when presolve proves the sub-model infeasible, in which case the caller
    /// skips this sub-run.
    pub fn init(&mut self, model: &ModelHandle<M>) -> PumpResult<bool> {
        let clone = model.borrow().clone_model();
        let num_binaries = clone.num_binary_cols();
        let num_active = clone.active_binaries().len();
        self.all_binaries_active = num_active == num_binaries;

        let mut sub = clone;
        if self.settings.presolve {
            if !sub.presolve() {
                debug!("fp init: sub-model infeasible in presolve");
                if self.all_binaries_active {
                    self.is_infeasible = true;
                }
                return Ok(false);
            }
            match sub.presolved_model() {
                Some(work) => {
                    self.work = Some(work);
                    self.mapper = Some(sub);
                }
                None => {
                    self.work = Some(sub);
                    self.mapper = None;
                }
            }
        } else {
            self.work = Some(sub);
            self.mapper = None;
        }

        let work = self.work.as_ref().ok_or_else(|| {
            PumpError::Internal("feasibility pump work model missing".to_string())
        })?;
        let n = work.ncols();
        self.active = work.active_binaries();
        self.nbin_active = self.active.len();
        self.active_gints = BitSet::with_capacity(n);
        if !self.settings.ignore_general_integers {
            let data = work.data();
            for j in 0..n {
                if data.col_type(j) == VarType::Integer && !feq(data.lb(j), data.ub(j)) {
                    self.active_gints.insert(j);
                }
            }
        }
        self.orig_obj = work.data().obj_coefs().to_vec();
        self.orig_offset = work.data().obj_offset();
        self.orig_sense = work.data().obj_sense();
        self.obj_norm = work.data().obj_norm();

        self.rounder = make_rounder(&self.settings, self.rng.clone());
        self.rounder
            .init(work.data(), self.settings.ignore_general_integers)?;

        self.x_frac = vec![0.0; n];
        self.x_round = vec![0.0; n];
        self.closest_frac.clear();
        self.closest_dist = f64::INFINITY;
        self.found = false;
        self.solution.clear();
        self.primal_bound = f64::INFINITY;
        self.alpha = self.settings.alpha_init;
        self.stats = FpStats::default();
        self.fingerprints.clear();
        Ok(true)
    }

    /// Run the pump.
    ///
    /// `stop_with_no_impr` enables the early stop after a run of stage-2
    /// iterations without closest-point improvement. `warm_start` provides a
    /// fractional point and its distance from a previous sub-run; it seeds
    /// the closest point and the rounded reference, and stage 0 then solves
    /// the blended objective under Minimize instead of the original one.
    pub fn pump(
        &mut self,
        time_limit: f64,
        stop_with_no_impr: bool,
        warm_start: Option<(&[f64], f64)>,
    ) -> PumpResult<PumpOutcome> {
        let Some(mut work) = self.work.take() else {
            return Err(PumpError::Internal(
                "pump called before init".to_string(),
            ));
        };
        let result = self.pump_loop(&mut work, time_limit, stop_with_no_impr, warm_start);
        self.work = Some(work);
        result
    }

    fn pump_loop(
        &mut self,
        work: &mut M,
        time_limit: f64,
        stop_with_no_impr: bool,
        warm_start: Option<(&[f64], f64)>,
    ) -> PumpResult<PumpOutcome> {
        let start = Instant::now();
        let eps = self.settings.integrality_eps;

        // Restore the original objective; a previous run leaves the blended
        // one behind.
        work.data_mut().set_obj_coefs(&self.orig_obj);
        work.data_mut().set_obj_offset(self.orig_offset);
        work.data_mut().set_obj_sense(self.orig_sense);

        let mut have_reference = false;
        if let Some((frac, dist)) = warm_start {
            if !frac.is_empty() {
                let wfrac = self.to_work_space(frac);
                if wfrac.len() == work.ncols() {
                    self.x_frac = wfrac;
                    self.closest_frac = self.x_frac.clone();
                    self.closest_dist = dist;
                    self.rounder.apply(&self.x_frac, &mut self.x_round);
                    have_reference = true;
                }
            }
        }

        // Stage 0: with no reference point, solve the LP with the original
        // objective and sense; a warm-started reference solves the blended
        // objective under Minimize right away.
        if have_reference {
            work.data_mut().set_obj_sense(ObjSense::Minimize);
            self.set_blended_objective(work);
        }
        work.set_time_limit((time_limit - start.elapsed().as_secs_f64()).max(0.0));
        let ok = work.lpopt(LpMethod::Dual, false, true);
        self.stats.iterations += 1;
        self.total_iterations += 1;
        if !ok {
            debug!("fp stage 0: hard LP failure");
            return Ok(PumpOutcome {
                found_integer: false,
                lp_feasible: false,
                numerical: true,
            });
        }
        if !work.is_primal_feas() {
            if work.status() == SolveStatus::Infeasible && self.all_binaries_active {
                self.is_infeasible = true;
            }
            debug!(
                "fp stage 0: no primal feasible point (status {:?}, {} active binaries)",
                work.status(),
                self.nbin_active
            );
            return Ok(PumpOutcome {
                found_integer: false,
                lp_feasible: false,
                numerical: false,
            });
        }
        self.x_frac.copy_from_slice(work.sol());
        self.rounder.apply(&self.x_frac, &mut self.x_round);
        let (integer, gap) = self.measure(eps);
        self.update_closest(gap);
        if integer && self.accept_candidate(work) {
            return Ok(self.success_outcome());
        }

        // Stage 2.
        work.data_mut().set_obj_sense(ObjSense::Minimize);
        let mut iters_since_impr = 0usize;
        loop {
            if self.stats.iterations_stage2 >= self.settings.max_iter_stage2 {
                break;
            }
            if start.elapsed().as_secs_f64() > time_limit || work.aborted() {
                break;
            }

            let alpha_prev = self.alpha;
            self.alpha *= self.settings.alpha_decay;
            self.set_blended_objective(work);

            work.set_time_limit((time_limit - start.elapsed().as_secs_f64()).max(0.0));
            let ok = work.lpopt(self.settings.reopt_method, false, false);
            self.stats.iterations_stage2 += 1;
            self.stats.iterations += 1;
            self.total_iterations += 1;

            if !ok {
                return Ok(PumpOutcome {
                    found_integer: false,
                    lp_feasible: true,
                    numerical: true,
                });
            }
            if !work.is_primal_feas() {
                if work.status() == SolveStatus::Infeasible && self.all_binaries_active {
                    self.is_infeasible = true;
                }
                if work.status() == SolveStatus::TimeLimit
                    || work.status() == SolveStatus::Interrupted
                {
                    break;
                }
                return Ok(PumpOutcome {
                    found_integer: false,
                    lp_feasible: true,
                    numerical: work.status() != SolveStatus::Infeasible,
                });
            }

            self.x_frac.copy_from_slice(work.sol());
            let prev_round = self.x_round.clone();
            self.rounder.apply(&self.x_frac, &mut self.x_round);

            let (integer, gap) = self.measure(eps);
            let improved = self.update_closest(gap);
            if improved {
                iters_since_impr = 0;
            } else {
                iters_since_impr += 1;
            }
            debug!(
                "fp iter {}: alpha={:.4} gap={:.6} integer={}",
                self.stats.iterations_stage2, self.alpha, gap, integer
            );

            if integer && self.accept_candidate(work) {
                return Ok(self.success_outcome());
            }

            // Stall: the reference did not move and alpha has flattened out.
            let stalled = self.stats.iterations_stage2 > 1
                && (self.alpha - alpha_prev).abs() < self.settings.alpha_stall_tol
                && self.same_reference(&prev_round);
            if stalled {
                self.perturb();
                self.stats.perturbations_stage2 += 1;
            } else {
                let fp = self.fingerprint();
                if self.fingerprints.contains(&fp) {
                    self.restart();
                } else {
                    self.fingerprints.push_back(fp);
                    while self.fingerprints.len() > self.settings.fingerprint_window {
                        self.fingerprints.pop_front();
                    }
                }
            }

            if stop_with_no_impr && iters_since_impr > self.settings.no_improvement_patience {
                debug!(
                    "fp: no improvement for {} iterations, giving up early",
                    iters_since_impr
                );
                break;
            }
        }

        if self.settings.verbose {
            info!(
                "fp done: iters={} perturbations={} restarts={} closest={:.6}",
                self.stats.iterations_stage2,
                self.stats.perturbations_stage2,
                self.stats.restarts_stage2,
                self.closest_dist
            );
        }
        Ok(PumpOutcome {
            found_integer: false,
            lp_feasible: true,
            numerical: false,
        })
    }

    /// Per-variable gaps over the active binaries and the integrality test.
    ///
    /// A variable whose fractional value is (near) zero contributes nothing,
    /// whatever its reference bit says.
    fn measure(&self, eps: f64) -> (bool, f64) {
        let mut integer = true;
        let mut gap_sum = 0.0;
        for j in self.active.iter() {
            let v = self.x_frac[j];
            if approx_eq(v, 0.0, eps) {
                continue;
            }
            let g = (v - self.x_round[j]).abs();
            if g >= eps {
                integer = false;
                gap_sum += g;
            }
        }
        let norm = if self.nbin_active > 0 {
            gap_sum / (self.nbin_active as f64).sqrt()
        } else {
            0.0
        };
        (integer, norm)
    }

    /// Keep the fractional point with the smallest normalized gap.
    fn update_closest(&mut self, gap: f64) -> bool {
        if gap < self.closest_dist {
            self.closest_dist = gap;
            self.closest_frac = self.x_frac.clone();
            return true;
        }
        false
    }

    /// Compose and validate the candidate integer point.
    fn accept_candidate(&mut self, work: &M) -> bool {
        let mut candidate = self.x_frac.clone();
        for j in 0..candidate.len() {
            if work.data().col_type(j).is_integer() {
                candidate[j] = self.x_round[j];
            }
        }
        if !work.is_solution_feasible(&candidate, 1e-3) {
            debug!("fp: integer reference rejected by row replay");
            return false;
        }
        let mut value = self.orig_offset;
        for (j, &c) in self.orig_obj.iter().enumerate() {
            value += c * candidate[j];
        }
        self.primal_bound = value;
        self.solution = self.to_source_space(&candidate);
        self.found = true;
        true
    }

    fn success_outcome(&self) -> PumpOutcome {
        PumpOutcome {
            found_integer: true,
            lp_feasible: true,
            numerical: false,
        }
    }

    /// Blended objective: distance to the reference point over the active
    /// binaries (plus bound-sitting general integers), mixed with the
    /// (normalized) original objective.
    fn set_blended_objective(&self, work: &mut M) {
        let n = work.ncols();
        let wd = if self.nbin_active > 0 {
            (1.0 - self.alpha) / (self.nbin_active as f64).sqrt()
        } else {
            0.0
        };
        let wo = if self.obj_norm > 1e-12 {
            self.alpha / self.obj_norm
        } else {
            0.0
        };

        let mut coefs = vec![0.0; n];
        for (j, c) in coefs.iter_mut().enumerate() {
            *c = -wo * self.orig_obj[j];
        }
        let mut offset = 0.0;
        for j in self.active.iter() {
            if self.x_round[j] > 0.5 {
                coefs[j] -= wd;
                offset += wd;
            } else {
                coefs[j] += wd;
            }
        }
        // A general integer whose reference sits on one of its bounds has an
        // exactly linear distance term (x - lb, or ub - x); interior
        // references get no term and are left to the propagation rounding.
        for j in self.active_gints.iter() {
            let lb = work.data().lb(j);
            let ub = work.data().ub(j);
            let reference = self.x_round[j];
            if feq(reference, lb) {
                coefs[j] += wd;
                offset -= wd * lb;
            } else if feq(reference, ub) {
                coefs[j] -= wd;
                offset += wd * ub;
            }
        }
        let data = work.data_mut();
        data.set_obj_coefs(&coefs);
        data.set_obj_offset(offset);
    }

    /// True when the reference point matches `prev` on every active binary.
    fn same_reference(&self, prev: &[f64]) -> bool {
        self.active
            .iter()
            .all(|j| (self.x_round[j] - prev[j]).abs() < 0.5)
    }

    /// Flip reference bits: each active binary with probability 1/2, or a
    /// fixed number of random flips when configured.
    fn perturb(&mut self) {
        let k = self.settings.perturb_flip_count;
        if k > 0 {
            let mut idx: Vec<usize> = self.active.iter().collect();
            idx.shuffle(&mut *self.rng.borrow_mut());
            for &j in idx.iter().take(k) {
                self.x_round[j] = 1.0 - self.x_round[j];
            }
        } else {
            let rng = self.rng.clone();
            let mut rng = rng.borrow_mut();
            for j in self.active.iter() {
                if rng.gen_bool(0.5) {
                    self.x_round[j] = 1.0 - self.x_round[j];
                }
            }
        }
        debug!("fp: perturbed reference point");
    }

    /// Cycle restart: re-randomize alpha and forget the fingerprint window.
    fn restart(&mut self) {
        self.alpha = self.rng.borrow_mut().gen_range(0.0..0.2);
        self.fingerprints.clear();
        self.stats.restarts_stage2 += 1;
        debug!("fp: cycle detected, restarting with alpha={:.4}", self.alpha);
    }

    /// Order-stable fingerprint of the reference bits on the active binaries.
    fn fingerprint(&self) -> u64 {
        let mut h = DefaultHasher::new();
        for j in self.active.iter() {
            h.write_usize(j);
            h.write_u8(u8::from(self.x_round[j] > 0.5));
        }
        h.finish()
    }

    fn to_work_space(&self, x: &[f64]) -> Vec<f64> {
        match &self.mapper {
            Some(mapper) => mapper.presolve_solution(x),
            None => x.to_vec(),
        }
    }

    fn to_source_space(&self, x: &[f64]) -> Vec<f64> {
        match &self.mapper {
            Some(mapper) => mapper.postsolve_solution(x),
            None => x.to_vec(),
        }
    }

    // --- Accessors --------------------------------------------------------

    /// True once a run found an integer feasible point.
    pub fn found_solution(&self) -> bool {
        self.found
    }

    /// The integer feasible point, in the space of the model `init` saw.
    pub fn solution(&self) -> &[f64] {
        &self.solution
    }

    /// Original-objective value of the solution.
    pub fn primal_bound(&self) -> f64 {
        self.primal_bound
    }

    /// Best fractional point of the run, in the space of the model `init`
    /// saw.
    pub fn closest_frac(&self) -> Vec<f64> {
        if self.closest_frac.is_empty() {
            return Vec::new();
        }
        self.to_source_space(&self.closest_frac)
    }

    /// Normalized distance of the best fractional point.
    pub fn closest_dist(&self) -> f64 {
        self.closest_dist
    }

    /// The fully-active model was proved infeasible.
    pub fn is_infeasible(&self) -> bool {
        self.is_infeasible
    }

    /// Statistics of the last run.
    pub fn stats(&self) -> FpStats {
        self.stats
    }

    /// Iterations accumulated across every run since the last reset.
    pub fn total_iterations(&self) -> usize {
        self.total_iterations
    }

    /// Forget accumulated totals.
    pub fn reset_total(&mut self) {
        self.total_iterations = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{share, ModelBuilder, RowSense, SimplexModel, VarType};
    use crate::settings::RounderKind;

    fn fp(settings: FpSettings) -> FeasibilityPump<SimplexModel> {
        FeasibilityPump::new(settings)
    }

    #[test]
    fn test_stage0_integer() {
        // min x + y s.t. x + y >= 1, binaries: the relaxation has an
        // integer vertex optimum.
        let mut b = ModelBuilder::new("easy");
        b.add_col("x", VarType::Binary, 0.0, 1.0, 1.0);
        b.add_col("y", VarType::Binary, 0.0, 1.0, 1.0);
        b.add_row("c", &[(0, 1.0), (1, 1.0)], RowSense::Ge, 1.0, 0.0);
        let model = share(SimplexModel::new(b.build().unwrap()));

        let mut pump = fp(FpSettings::default());
        assert!(pump.init(&model).unwrap());
        let outcome = pump.pump(10.0, false, None).unwrap();

        assert!(outcome.found_integer);
        assert!(outcome.lp_feasible);
        assert_eq!(pump.stats().iterations_stage2, 0);
        assert!((pump.primal_bound() - 1.0).abs() < 1e-6);
        let sol = pump.solution();
        assert!((sol[0] + sol[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_infeasible_full_model_sets_flag() {
        // x <= 0.2 and x >= 0.8 cannot both hold.
        let mut b = ModelBuilder::new("inf");
        b.add_col("x", VarType::Binary, 0.0, 1.0, 1.0);
        b.add_row("up", &[(0, 1.0)], RowSense::Le, 0.2, 0.0);
        b.add_row("dn", &[(0, 1.0)], RowSense::Ge, 0.8, 0.0);
        let model = share(SimplexModel::new(b.build().unwrap()));

        let mut pump = fp(FpSettings::default());
        let initialized = pump.init(&model).unwrap();
        if initialized {
            let outcome = pump.pump(10.0, false, None).unwrap();
            assert!(!outcome.found_integer);
            assert!(!outcome.lp_feasible);
        }
        // presolve or stage 0 must have flagged the full model
        assert!(pump.is_infeasible());
    }

    #[test]
    fn test_submodel_infeasibility_not_flagged() {
        // Same contradiction but with a second, deactivated binary, so the
        // active set is a strict subset.
        let mut b = ModelBuilder::new("sub");
        b.add_col("x", VarType::Binary, 0.0, 1.0, 1.0);
        b.add_col("y", VarType::Binary, 0.0, 0.0, 1.0);
        b.add_row("up", &[(0, 1.0)], RowSense::Le, 0.2, 0.0);
        b.add_row("dn", &[(0, 1.0)], RowSense::Ge, 0.8, 0.0);
        let model = share(SimplexModel::new(b.build().unwrap()));

        let mut pump = fp(FpSettings::default());
        let initialized = pump.init(&model).unwrap();
        if initialized {
            let outcome = pump.pump(10.0, false, None).unwrap();
            assert!(!outcome.found_integer);
        }
        assert!(!pump.is_infeasible());
    }

    #[test]
    fn test_perturbation_on_rigged_cycle() {
        // x0 + x1 = 0.5 admits no binary point; the projection returns the
        // same fractional vertex every iteration, so the pump must stall and
        // perturb before hitting the iteration cap.
        let mut b = ModelBuilder::new("cycle");
        b.add_col("x0", VarType::Binary, 0.0, 1.0, 0.0);
        b.add_col("x1", VarType::Binary, 0.0, 1.0, 0.0);
        b.add_row("c", &[(0, 1.0), (1, 1.0)], RowSense::Eq, 0.5, 0.0);
        let model = share(SimplexModel::new(b.build().unwrap()));

        let mut settings = FpSettings::default();
        settings.max_iter_stage2 = 30;
        settings.randomized_rounding = false;
        settings.rounder = RounderKind::Simple;
        settings.presolve = false;
        settings.seed = 1;

        let mut pump = fp(settings);
        assert!(pump.init(&model).unwrap());
        let outcome = pump.pump(10.0, false, None).unwrap();

        assert!(!outcome.found_integer);
        assert!(outcome.lp_feasible);
        assert!(pump.stats().perturbations_stage2 >= 1);
        assert_eq!(pump.stats().iterations_stage2, 30);
    }

    #[test]
    fn test_closest_dist_monotone() {
        let mut b = ModelBuilder::new("mono");
        for name in ["x0", "x1", "x2"] {
            b.add_col(name, VarType::Binary, 0.0, 1.0, 1.0);
        }
        b.add_row("c0", &[(0, 1.0), (1, 1.0)], RowSense::Ge, 1.0, 0.0);
        b.add_row("c1", &[(1, 1.0), (2, 1.0)], RowSense::Ge, 1.0, 0.0);
        let model = share(SimplexModel::new(b.build().unwrap()));

        let mut pump = fp(FpSettings::default().with_seed(3));
        assert!(pump.init(&model).unwrap());
        let _ = pump.pump(10.0, false, None).unwrap();
        // closest_dist only ever decreases from infinity
        assert!(pump.closest_dist() < f64::INFINITY);
        assert!(pump.closest_dist() >= 0.0);
    }

    #[test]
    fn test_warm_start_stage0_uses_blended_objective() {
        let mut b = ModelBuilder::new("warm");
        b.add_col("x", VarType::Binary, 0.0, 1.0, 1.0);
        b.add_col("y", VarType::Binary, 0.0, 1.0, 1.0);
        b.add_row("c", &[(0, 1.0), (1, 1.0)], RowSense::Ge, 1.0, 0.0);
        let model = share(SimplexModel::new(b.build().unwrap()));

        let mut settings = FpSettings::default();
        settings.presolve = false;
        let mut pump = fp(settings);
        assert!(pump.init(&model).unwrap());

        // The warm point rounds to the reference (1, 0); stage 0 minimizes
        // the blended distance to it and lands on an integer vertex right
        // away, before any stage-2 iteration.
        let warm = vec![1.0, 0.0];
        let outcome = pump.pump(10.0, false, Some((&warm, 0.1))).unwrap();
        assert!(outcome.found_integer);
        assert_eq!(pump.stats().iterations_stage2, 0);
        assert_eq!(pump.stats().iterations, 1);
    }

    #[test]
    fn test_blended_objective_gint_boundary_term() {
        // One active binary (so the distance weight is 1.0) and one general
        // integer whose reference sits on its upper bound.
        let mut b = ModelBuilder::new("gint");
        b.add_col("x", VarType::Binary, 0.0, 1.0, 0.0);
        b.add_col("y", VarType::Integer, 0.0, 3.0, 0.0);
        let model = share(SimplexModel::new(b.build().unwrap()));

        let mut settings = FpSettings::default();
        settings.presolve = false;
        let mut pump = fp(settings);
        assert!(pump.init(&model).unwrap());

        pump.x_round = vec![1.0, 3.0];
        let mut work = pump.work.take().unwrap();
        pump.set_blended_objective(&mut work);

        // binary at 1 contributes (1 - x); y at ub contributes (3 - y)
        let coefs = work.data().obj_coefs();
        assert!((coefs[0] + 1.0).abs() < 1e-9);
        assert!((coefs[1] + 1.0).abs() < 1e-9);
        assert!((work.data().obj_offset() - 4.0).abs() < 1e-9);

        // an interior reference adds no term for the general integer
        pump.x_round = vec![0.0, 2.0];
        pump.set_blended_objective(&mut work);
        let coefs = work.data().obj_coefs();
        assert!((coefs[0] - 1.0).abs() < 1e-9);
        assert!(coefs[1].abs() < 1e-9);
        assert!(work.data().obj_offset().abs() < 1e-9);
    }
}
