//! Configuration settings for the pump heuristics.

use crate::model::LpMethod;

/// Variable ranking strategy used by the propagating rounder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankerKind {
    /// Most fractional first (largest fractional part).
    #[default]
    Frac,

    /// Least fractional first (easiest rounding first).
    LeastFrac,
}

impl RankerKind {
    /// Parse a ranker name as it appears in configuration files.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "FRAC" => Some(RankerKind::Frac),
            "LEASTFRAC" => Some(RankerKind::LeastFrac),
            _ => None,
        }
    }
}

/// Which rounding transformer the pump drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RounderKind {
    /// Plain threshold rounding.
    Simple,

    /// Threshold rounding interleaved with constraint propagation.
    #[default]
    Propagating,
}

/// Objective used for the root LP that orders the kernel/bucket partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KernelObjective {
    /// Keep the original objective.
    #[default]
    Original,

    /// Null objective (pure feasibility LP).
    Null,

    /// Sum of binary variables, minimized.
    SumVars,

    /// Sum of binary variables, maximized.
    SumVarsMax,

    /// Original objective with the sense flipped.
    Reversed,
}

/// Feasibility pump settings.
#[derive(Debug, Clone)]
pub struct FpSettings {
    // === Integrality ===
    /// A variable is integer if |x - round(x)| <= integrality_eps.
    pub integrality_eps: f64,

    // === Stage-2 loop ===
    /// Maximum stage-2 iterations.
    pub max_iter_stage2: usize,

    /// Initial alpha (0.0 = pure distance pump).
    pub alpha_init: f64,

    /// Multiplicative alpha decay per iteration.
    pub alpha_decay: f64,

    /// Stall threshold on |alpha - alpha_prev|.
    pub alpha_stall_tol: f64,

    /// Fixed number of flips per perturbation; 0 selects the
    /// probabilistic variant (each active binary flips with prob. 1/2).
    pub perturb_flip_count: usize,

    /// Window of recent rounded-point fingerprints kept for long-cycle
    /// detection.
    pub fingerprint_window: usize,

    /// Stage-2 iterations without closest-point improvement before giving
    /// up early (only honored when the caller enables the early stop).
    pub no_improvement_patience: usize,

    // === Rounding ===
    /// Rounding transformer.
    pub rounder: RounderKind,

    /// Ranking strategy for the propagating rounder.
    pub ranker: RankerKind,

    /// Draw the rounding threshold uniformly in [0,1] per call instead of
    /// using 0.5.
    pub randomized_rounding: bool,

    /// Skip rows with large coefficient dynamism when building propagators.
    pub filter_constraints: bool,

    /// Restrict the rounder/ranker integer set to binaries.
    pub ignore_general_integers: bool,

    // === Model handling ===
    /// Presolve the sub-model when the pump is (re)initialized.
    pub presolve: bool,

    /// LP method for re-optimization solves.
    pub reopt_method: LpMethod,

    // === Misc ===
    /// PRNG seed; a run is reproducible from this value alone.
    pub seed: u64,

    /// Print progress information.
    pub verbose: bool,
}

impl Default for FpSettings {
    fn default() -> Self {
        Self {
            integrality_eps: 1e-6,
            max_iter_stage2: 200,
            alpha_init: 0.0,
            alpha_decay: 0.9,
            alpha_stall_tol: 5e-3,
            perturb_flip_count: 0,
            fingerprint_window: 32,
            no_improvement_patience: 20,
            rounder: RounderKind::default(),
            ranker: RankerKind::default(),
            randomized_rounding: true,
            filter_constraints: true,
            ignore_general_integers: false,
            presolve: true,
            reopt_method: LpMethod::Dual,
            seed: 0,
            verbose: false,
        }
    }
}

impl FpSettings {
    /// Set the PRNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the stage-2 iteration cap.
    pub fn with_max_iter(mut self, iters: usize) -> Self {
        self.max_iter_stage2 = iters;
        self
    }

    /// Select the rounding transformer.
    pub fn with_rounder(mut self, rounder: RounderKind) -> Self {
        self.rounder = rounder;
        self
    }
}

/// Kernel pump settings.
#[derive(Debug, Clone)]
pub struct KpSettings {
    // === Partition ===
    /// Maximum kernel/bucket size for fixed-size bucketing.
    pub max_bucket_size: usize,

    /// Number of equal-width value layers for layered bucketing.
    pub num_bucket_layers: usize,

    /// Build buckets by relaxation-value layers instead of fixed size.
    pub buckets_by_relaxation_layers: bool,

    /// Sort binaries by the fractional part of their LP value instead of
    /// the value itself.
    pub sort_by_fractional_part: bool,

    /// Pull a placed variable's row neighbours into the same group.
    pub buckets_by_variable_dependency: bool,

    /// Objective used for the root relaxation that orders the variables.
    pub kernel_objective: KernelObjective,

    // === Iteration policy ===
    /// Always grow the permanent kernel by the whole reference set.
    pub force_bucket_vars_into_kernel: bool,

    /// Forget the closest fractional point between pump sub-runs.
    pub reset_fp_basis_at_new_pump: bool,

    /// Repair an LP-infeasible initial kernel through conflict refinement.
    pub try_enforce_feasibility_initial_kernel: bool,

    // === Model handling ===
    /// Presolve the full model once before partitioning.
    pub mip_presolve: bool,

    /// Global wall-clock limit in seconds.
    pub time_limit: f64,

    // === Output ===
    /// Print progress information.
    pub verbose: bool,

    /// Settings forwarded to the inner feasibility pump.
    pub fp: FpSettings,
}

impl Default for KpSettings {
    fn default() -> Self {
        Self {
            max_bucket_size: 100,
            num_bucket_layers: 10,
            buckets_by_relaxation_layers: true,
            sort_by_fractional_part: false,
            buckets_by_variable_dependency: false,
            kernel_objective: KernelObjective::default(),
            force_bucket_vars_into_kernel: false,
            reset_fp_basis_at_new_pump: false,
            try_enforce_feasibility_initial_kernel: false,
            mip_presolve: true,
            time_limit: 1e20,
            verbose: false,
            fp: FpSettings::default(),
        }
    }
}

impl KpSettings {
    /// Set the global time limit in seconds.
    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit = seconds;
        self
    }

    /// Set the PRNG seed of the inner pump.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.fp.seed = seed;
        self
    }

    /// Set the fixed bucket size and disable layered bucketing.
    pub fn with_bucket_size(mut self, size: usize) -> Self {
        self.max_bucket_size = size;
        self.buckets_by_relaxation_layers = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let kp = KpSettings::default();
        assert_eq!(kp.max_bucket_size, 100);
        assert_eq!(kp.num_bucket_layers, 10);
        assert!(kp.buckets_by_relaxation_layers);
        assert_eq!(kp.fp.max_iter_stage2, 200);
        assert!(kp.fp.filter_constraints);
        assert!((kp.fp.alpha_decay - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_ranker_names() {
        assert_eq!(RankerKind::from_name("frac"), Some(RankerKind::Frac));
        assert_eq!(
            RankerKind::from_name("LEASTFRAC"),
            Some(RankerKind::LeastFrac)
        );
        assert_eq!(RankerKind::from_name("nope"), None);
    }

    #[test]
    fn test_builders() {
        let kp = KpSettings::default().with_time_limit(10.0).with_seed(7);
        assert_eq!(kp.time_limit, 10.0);
        assert_eq!(kp.fp.seed, 7);

        let kp = KpSettings::default().with_bucket_size(25);
        assert_eq!(kp.max_bucket_size, 25);
        assert!(!kp.buckets_by_relaxation_layers);
    }
}
