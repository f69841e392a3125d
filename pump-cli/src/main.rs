//! Command line driver for the pump heuristics.
//!
//! Reads an MPS file, runs the selected method (plain backend solve,
//! feasibility pump, or kernel pump), re-optimizes the residual LP of a
//! found solution, and writes the solution record to a text file. The exit
//! code is zero for any completed run - feasible or not; the status lives in
//! the solution file - and non-zero only for I/O or setup failures.

mod mps;
mod report;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Result};
use clap::{ArgAction, Parser, ValueEnum};
use log::{info, warn};

use pump_core::model::{share, BackendSettings, MipModel, ModelHandle, SimplexModel};
use pump_core::pump::{FeasibilityPump, KernelPump};
use pump_core::settings::{KernelObjective, KpSettings, RankerKind, RounderKind};
use pump_core::solution::Solution;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Method {
    /// Hand the MIP to the backend, stopping at the first incumbent.
    Solver,

    /// Feasibility pump on the full model.
    Feaspump,

    /// Kernel pump.
    Kernelpump,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum KernelObjectiveArg {
    Original,
    Null,
    SumVars,
    SumVarsMax,
    Reversed,
}

impl From<KernelObjectiveArg> for KernelObjective {
    fn from(arg: KernelObjectiveArg) -> Self {
        match arg {
            KernelObjectiveArg::Original => KernelObjective::Original,
            KernelObjectiveArg::Null => KernelObjective::Null,
            KernelObjectiveArg::SumVars => KernelObjective::SumVars,
            KernelObjectiveArg::SumVarsMax => KernelObjective::SumVarsMax,
            KernelObjectiveArg::Reversed => KernelObjective::Reversed,
        }
    }
}

#[derive(Parser)]
#[command(name = "kp")]
#[command(about = "Kernel pump heuristic for mixed-integer programs")]
struct Cli {
    /// Problem file in MPS format
    input: PathBuf,

    /// Solution file (defaults to the problem name with a .sol suffix)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Method to run
    #[arg(long, value_enum, default_value = "kernelpump")]
    method: Method,

    /// Backend identifier; only the built-in simplex is compiled in
    #[arg(long, default_value = "simplex")]
    solver: String,

    /// Global wall-clock limit in seconds
    #[arg(long, default_value_t = 1e20)]
    time_limit: f64,

    /// PRNG seed; runs are reproducible from this value alone
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Presolve the model before pumping
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    mip_presolve: bool,

    /// Ask the backend to emphasize feasibility (accepted for parity; the
    /// built-in backend has no emphasis knob)
    #[arg(long)]
    mip_feas_emphasis: bool,

    /// Allow the backend to use multiple threads
    #[arg(long)]
    multi_threading: bool,

    /// Print the non-zero entries of a found solution
    #[arg(long)]
    print_sol: bool,

    // === kernel pump options ===
    /// Kernel/bucket size for fixed-size bucketing
    #[arg(long, default_value_t = 100)]
    kp_max_bucket_size: usize,

    /// Number of value layers for layered bucketing
    #[arg(long, default_value_t = 10)]
    kp_num_bucket_layers: usize,

    /// Build buckets by relaxation-value layers
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    kp_build_buckets_by_relaxation_layers: bool,

    /// Order binaries by the fractional part of their relaxation value
    #[arg(long)]
    kp_sort_by_fractional_part: bool,

    /// Always absorb visited buckets into the kernel
    #[arg(long)]
    kp_force_bucket_vars_into_kernel: bool,

    /// Forget the closest point between pump sub-runs
    #[arg(long)]
    kp_reset_fp_basis_at_new_pump: bool,

    /// Repair an LP-infeasible initial kernel via conflict refinement
    #[arg(long)]
    kp_try_enforce_feasibility_initial_kernel: bool,

    /// Pull row neighbours of placed variables into the same group
    #[arg(long)]
    kp_build_buckets_considering_variable_dependency: bool,

    /// Objective for the root relaxation that orders the variables
    #[arg(long, value_enum, default_value = "original")]
    kp_kernel_objective: KernelObjectiveArg,

    // === feasibility pump options ===
    /// Integrality tolerance
    #[arg(long, default_value_t = 1e-6)]
    fp_integrality_eps: f64,

    /// Ranker for the propagating rounder (FRAC or LEASTFRAC)
    #[arg(long, default_value = "FRAC")]
    fp_ranker: String,

    /// Skip rows with large coefficient dynamism when propagating
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    fp_filter_constraints: bool,

    /// Draw the rounding threshold at random each call
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    fp_randomized_rounding: bool,

    /// Use the plain rounder instead of the propagating one
    #[arg(long)]
    fp_simple_rounding: bool,

    /// Stage-2 iteration cap per pump run
    #[arg(long, default_value_t = 200)]
    fp_max_iter_stage2: usize,
}

impl Cli {
    fn kp_settings(&self) -> Result<KpSettings> {
        let mut kp = KpSettings::default();
        kp.max_bucket_size = self.kp_max_bucket_size;
        kp.num_bucket_layers = self.kp_num_bucket_layers;
        kp.buckets_by_relaxation_layers = self.kp_build_buckets_by_relaxation_layers;
        kp.sort_by_fractional_part = self.kp_sort_by_fractional_part;
        kp.force_bucket_vars_into_kernel = self.kp_force_bucket_vars_into_kernel;
        kp.reset_fp_basis_at_new_pump = self.kp_reset_fp_basis_at_new_pump;
        kp.try_enforce_feasibility_initial_kernel = self.kp_try_enforce_feasibility_initial_kernel;
        kp.buckets_by_variable_dependency = self.kp_build_buckets_considering_variable_dependency;
        kp.kernel_objective = self.kp_kernel_objective.into();
        kp.mip_presolve = self.mip_presolve;
        kp.time_limit = self.time_limit;
        kp.verbose = true;
        kp.fp.verbose = true;

        kp.fp.integrality_eps = self.fp_integrality_eps;
        kp.fp.filter_constraints = self.fp_filter_constraints;
        kp.fp.randomized_rounding = self.fp_randomized_rounding;
        kp.fp.max_iter_stage2 = self.fp_max_iter_stage2;
        kp.fp.seed = self.seed;
        kp.fp.presolve = self.mip_presolve;
        kp.fp.ranker = match RankerKind::from_name(&self.fp_ranker) {
            Some(r) => r,
            None => bail!("unknown ranker {:?}", self.fp_ranker),
        };
        if self.fp_simple_rounding {
            kp.fp.rounder = RounderKind::Simple;
        }
        Ok(kp)
    }

    fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            let stem = self
                .input
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "problem".to_string());
            PathBuf::from(format!("{}.sol", stem))
        })
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.solver.as_str() {
        "simplex" | "builtin" => {}
        "cpx" | "xprs" | "scip" | "pdlp" => {
            bail!("support for solver {:?} is not compiled in", cli.solver)
        }
        other => bail!("unknown solver {:?}", other),
    }

    info!("[config]");
    info!("method = {:?}", cli.method);
    info!("prob = {}", cli.input.display());
    info!("solver = {}", cli.solver);
    info!("presolve = {}", cli.mip_presolve);
    info!("mipFeasEmphasis = {}", cli.mip_feas_emphasis);
    info!("multiThreading = {}", cli.multi_threading);
    info!("timeLimit = {}", cli.time_limit);
    info!("seed = {}", cli.seed);
    if cli.mip_feas_emphasis {
        warn!("feasibility emphasis has no effect on the built-in backend");
    }

    let data = mps::parse_mps(&cli.input)?;
    info!(
        "problem {}: rows={} cols={} nnz={}",
        data.name,
        data.nrows(),
        data.ncols(),
        data.nnz()
    );

    let backend = BackendSettings {
        time_limit: cli.time_limit,
        multi_threading: cli.multi_threading,
        ..BackendSettings::default()
    };
    let model = share(SimplexModel::with_settings(data, backend));

    let watch = Instant::now();
    let mut solution = Solution::default();
    let mut x: Vec<f64> = Vec::new();

    match cli.method {
        Method::Solver => {
            let mut m = model.borrow_mut();
            m.set_solution_limit(Some(1));
            m.set_time_limit((cli.time_limit - watch.elapsed().as_secs_f64()).max(0.0));
            m.mipopt();
            let found = m.is_primal_feas();
            solution.is_feasible = found;
            if found {
                x = m.sol().to_vec();
                solution.real_integrality_gap = 0.0;
                solution.projection_integrality_gap = 0.0;
            } else if m.status() == pump_core::model::SolveStatus::Infeasible {
                solution.is_infeasible = true;
            }
            solution.total_time_spent = watch.elapsed().as_secs_f64();
        }
        Method::Kernelpump => {
            let settings = cli.kp_settings()?;
            let mut kp: KernelPump<SimplexModel> = KernelPump::new(settings);
            if kp.init(model.clone())? {
                kp.run()?;
            }
            let stats = kp.stats();
            solution.is_feasible = stats.found;
            solution.is_infeasible = stats.is_infeasible;
            solution.num_iterations = stats.iterations;
            solution.num_buckets = stats.num_buckets;
            solution.last_bucket_visited = stats.last_bucket_visited;
            solution.first_bucket_to_iter_pump = stats.first_bucket_to_iter_pump;
            solution.projection_integrality_gap = stats.closest_dist;
            solution.num_binary_vars_added = stats.num_vars_in_kernel as i64;
            solution.num_binary_vars_with_value_one = stats.num_binary_vars_with_value_one;
            solution.time_spent_building_kernel_buckets = stats.time_building;

            let gap_point = if stats.found {
                x = kp.solution();
                x.clone()
            } else {
                kp.closest_frac()
            };
            let (gap, num_frac) = model
                .borrow()
                .compute_integrality_gap(&gap_point, 0.001);
            solution.real_integrality_gap = gap;
            solution.num_frac = num_frac;
            solution.total_time_spent = watch.elapsed().as_secs_f64();
            info!("gap = {} | num frac = {}", gap, num_frac);
        }
        Method::Feaspump => {
            let settings = cli.kp_settings()?;
            let mut fp: FeasibilityPump<SimplexModel> = FeasibilityPump::new(settings.fp);
            if fp.init(&model)? {
                let time_left = (cli.time_limit - watch.elapsed().as_secs_f64()).max(0.0);
                fp.pump(time_left, false, None)?;
            }
            solution.is_feasible = fp.found_solution();
            solution.is_infeasible = fp.is_infeasible();
            solution.num_iterations = fp.total_iterations();
            solution.projection_integrality_gap = fp.closest_dist();

            let gap_point = if fp.found_solution() {
                x = fp.solution().to_vec();
                x.clone()
            } else {
                fp.closest_frac()
            };
            let (gap, num_frac) = model
                .borrow()
                .compute_integrality_gap(&gap_point, 0.001);
            solution.real_integrality_gap = gap;
            solution.num_frac = num_frac;
            solution.total_time_spent = watch.elapsed().as_secs_f64();
            info!("gap = {} | num frac = {}", gap, num_frac);
        }
    }

    if solution.is_feasible && !x.is_empty() {
        finish_feasible(&model, &cli, &mut solution, &x)?;
    }

    let out = cli.output_path();
    report::write_solution(&out, &solution)?;
    info!("solution written to {}", out.display());
    Ok(())
}

/// Double-check a found solution, compute its objective, and re-optimize the
/// residual LP with the integers fixed.
fn finish_feasible(
    model: &ModelHandle<SimplexModel>,
    cli: &Cli,
    solution: &mut Solution,
    x: &[f64],
) -> Result<()> {
    let mut m = model.borrow_mut();
    info!("[feasible solution found]");

    let violation = m.data().max_row_violation(x);
    if violation > 1e-3 {
        bail!("solution violates a constraint by {}", violation);
    }
    info!("double check feasibility done");

    let obj_value = m.data().objective_value(x);

    // fix integer variables and re-optimize over the continuous ones
    for j in 0..m.ncols() {
        if m.data().col_type(j).is_integer() {
            let v = x[j].round();
            m.data_mut().fix_col(j, v);
        }
    }
    m.set_time_limit(cli.time_limit);
    m.switch_to_lp();
    let reopt = if m.lpopt(pump_core::model::LpMethod::Auto, false, false) && m.is_primal_feas() {
        m.objval()
    } else {
        obj_value
    };

    info!("obj = {:.6} | reoptimized = {:.6}", obj_value, reopt);
    solution.value = obj_value;
    solution.reopt_value = reopt;

    if cli.print_sol {
        for j in 0..m.ncols() {
            if x[j].abs() > cli.fp_integrality_eps {
                println!("{} {:.15}", m.data().col_name(j), x[j]);
            }
        }
    }
    drop(m);

    // the solution path reports a zero gap; keep the computed one otherwise
    if solution.real_integrality_gap.is_infinite() {
        solution.real_integrality_gap = 0.0;
    }
    Ok(())
}
