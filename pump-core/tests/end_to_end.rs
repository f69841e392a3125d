//! End-to-end scenarios for the pump heuristics on hand-built models.

use pump_core::model::{share, MipModel, ModelBuilder, ModelData, RowSense, SimplexModel, VarType};
use pump_core::pump::{FeasibilityPump, KernelPump};
use pump_core::settings::{FpSettings, KpSettings};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Replay a claimed-feasible solution: every binding row within 1e-3 and
/// every integer variable within 1e-5 of an integer.
fn assert_solution_feasible(data: &ModelData, x: &[f64]) {
    assert_eq!(x.len(), data.ncols());
    assert!(
        data.max_row_violation(x) <= 1e-3,
        "row violation {} too large",
        data.max_row_violation(x)
    );
    for j in 0..data.ncols() {
        if data.col_type(j).is_integer() {
            assert!(
                (x[j] - x[j].round()).abs() <= 1e-5,
                "variable {} fractional: {}",
                j,
                x[j]
            );
        }
    }
}

fn trivial_model() -> ModelData {
    // min x + y  s.t.  x + y >= 1,  x, y binary
    let mut b = ModelBuilder::new("trivial");
    b.add_col("x", VarType::Binary, 0.0, 1.0, 1.0);
    b.add_col("y", VarType::Binary, 0.0, 1.0, 1.0);
    b.add_row("cover", &[(0, 1.0), (1, 1.0)], RowSense::Ge, 1.0, 0.0);
    b.build().unwrap()
}

#[test]
fn trivial_lp_relaxation_is_integer_via_pump() {
    init_logging();
    let data = trivial_model();
    let model = share(SimplexModel::new(data.clone()));

    let mut pump: FeasibilityPump<SimplexModel> = FeasibilityPump::new(FpSettings::default());
    assert!(pump.init(&model).unwrap());
    let outcome = pump.pump(10.0, false, None).unwrap();

    assert!(outcome.found_integer);
    assert_eq!(pump.stats().iterations_stage2, 0);
    assert!((pump.primal_bound() - 1.0).abs() < 1e-6);
    assert_solution_feasible(&data, pump.solution());
}

#[test]
fn trivial_lp_relaxation_is_integer_via_kernel_pump() {
    init_logging();
    let data = trivial_model();
    let model = share(SimplexModel::new(data.clone()));

    let mut kp: KernelPump<SimplexModel> =
        KernelPump::new(KpSettings::default().with_time_limit(10.0));
    assert!(kp.init(model).unwrap());
    assert!(kp.run().unwrap());

    let stats = kp.stats();
    assert!(stats.found);
    assert!(!stats.is_infeasible);
    assert!((kp.primal_bound() - 1.0).abs() < 1e-6);
    assert_solution_feasible(&data, &kp.solution());
}

#[test]
fn sat_like_model_found_within_one_bucket() {
    init_logging();
    // 10 binaries, 5 clauses (some negated literals). All clauses are
    // satisfiable; the pump should succeed at the kernel or the first
    // bucket.
    let mut b = ModelBuilder::new("sat2");
    for j in 0..10 {
        b.add_col(format!("x{}", j), VarType::Binary, 0.0, 1.0, 1.0);
    }
    // x0 or x1
    b.add_row("cl0", &[(0, 1.0), (1, 1.0)], RowSense::Ge, 1.0, 0.0);
    // not x0 or not x2: x0 + x2 <= 1
    b.add_row("cl1", &[(0, 1.0), (2, 1.0)], RowSense::Le, 1.0, 0.0);
    // x2 or x3 or x4
    b.add_row(
        "cl2",
        &[(2, 1.0), (3, 1.0), (4, 1.0)],
        RowSense::Ge,
        1.0,
        0.0,
    );
    // x5 or not x6: x5 - x6 >= 0
    b.add_row("cl3", &[(5, 1.0), (6, -1.0)], RowSense::Ge, 0.0, 0.0);
    // x7 or x8 or x9
    b.add_row(
        "cl4",
        &[(7, 1.0), (8, 1.0), (9, 1.0)],
        RowSense::Ge,
        1.0,
        0.0,
    );
    let data = b.build().unwrap();
    let model = share(SimplexModel::new(data.clone()));

    let mut kp: KernelPump<SimplexModel> =
        KernelPump::new(KpSettings::default().with_seed(11).with_time_limit(30.0));
    assert!(kp.init(model).unwrap());
    assert!(kp.run().unwrap());

    let stats = kp.stats();
    assert!(stats.found);
    assert!(stats.last_bucket_visited <= 1);
    assert_solution_feasible(&data, &kp.solution());
}

#[test]
fn infeasible_problem_is_reported() {
    init_logging();
    // x <= 0 and x >= 1 on a binary
    let mut b = ModelBuilder::new("infeasible");
    b.add_col("x", VarType::Binary, 0.0, 1.0, 1.0);
    b.add_row("up", &[(0, 1.0)], RowSense::Le, 0.0, 0.0);
    b.add_row("dn", &[(0, 1.0)], RowSense::Ge, 1.0, 0.0);
    let model = share(SimplexModel::new(b.build().unwrap()));

    let mut kp: KernelPump<SimplexModel> = KernelPump::new(KpSettings::default());
    let initialized = kp.init(model).unwrap();
    if initialized {
        assert!(!kp.run().unwrap());
    }
    let stats = kp.stats();
    assert!(!stats.found);
    assert!(stats.is_infeasible);
}

#[test]
fn infeasible_without_presolve_detected_by_lp() {
    init_logging();
    // Same contradiction, presolve disabled: stage 0 of the pump must flag it.
    let mut b = ModelBuilder::new("infeasible-lp");
    b.add_col("x", VarType::Binary, 0.0, 1.0, 1.0);
    b.add_row("up", &[(0, 1.0)], RowSense::Le, 0.0, 0.0);
    b.add_row("dn", &[(0, 1.0)], RowSense::Ge, 1.0, 0.0);
    let model = share(SimplexModel::new(b.build().unwrap()));

    let mut settings = FpSettings::default();
    settings.presolve = false;
    let mut pump: FeasibilityPump<SimplexModel> = FeasibilityPump::new(settings);
    assert!(pump.init(&model).unwrap());
    let outcome = pump.pump(10.0, false, None).unwrap();

    assert!(!outcome.found_integer);
    assert!(!outcome.lp_feasible);
    assert!(pump.is_infeasible());
}

#[test]
fn time_limit_is_honored_and_closest_point_kept() {
    init_logging();
    // No integer point exists (the equality forces a half-integral sum), so
    // the run ends on its limits with the best fractional point retained.
    let n = 12;
    let mut b = ModelBuilder::new("hard");
    for j in 0..n {
        b.add_col(format!("x{}", j), VarType::Binary, 0.0, 1.0, 1.0);
    }
    let entries: Vec<(usize, f64)> = (0..n).map(|j| (j, 1.0)).collect();
    b.add_row("half", &entries, RowSense::Eq, 4.5, 0.0);
    let data = b.build().unwrap();
    let model = share(SimplexModel::new(data));

    let mut settings = KpSettings::default().with_seed(3).with_time_limit(1.0);
    settings.mip_presolve = false;
    settings.fp.presolve = false;

    let started = std::time::Instant::now();
    let mut kp: KernelPump<SimplexModel> = KernelPump::new(settings);
    assert!(kp.init(model).unwrap());
    let found = kp.run().unwrap();
    let elapsed = started.elapsed().as_secs_f64();

    assert!(!found);
    // generous single-digit tolerance over the 1s limit
    assert!(elapsed <= 8.0, "run took {:.1}s", elapsed);
    let stats = kp.stats();
    assert!(stats.total_time <= 8.0);
    // the best fractional point survives the failed run
    assert!(!kp.closest_frac().is_empty());
    assert!(stats.closest_dist.is_finite());
}

#[test]
fn closest_dist_monotone_across_sub_runs() {
    init_logging();
    // A chain covering model with an odd cycle keeps the pump busy for a
    // couple of iterations; the projection gap may only improve.
    let n = 9;
    let mut b = ModelBuilder::new("chain");
    for j in 0..n {
        b.add_col(format!("x{}", j), VarType::Binary, 0.0, 1.0, 1.0);
    }
    for j in 0..n {
        let k = (j + 1) % n;
        b.add_row(
            format!("c{}", j),
            &[(j, 1.0), (k, 1.0)],
            RowSense::Ge,
            1.0,
            0.0,
        );
    }
    let data = b.build().unwrap();
    let model = share(SimplexModel::new(data.clone()));

    let mut kp: KernelPump<SimplexModel> =
        KernelPump::new(KpSettings::default().with_seed(7).with_time_limit(20.0));
    assert!(kp.init(model).unwrap());
    let found = kp.run().unwrap();

    let stats = kp.stats();
    if found {
        assert_solution_feasible(&data, &kp.solution());
    } else {
        assert!(stats.closest_dist >= 0.0);
    }
}

#[test]
fn integrality_gap_round_trip() {
    init_logging();
    let data = trivial_model();
    let model = SimplexModel::new(data);

    // integer-feasible point: zero gap, zero fractional count
    let (gap, nfrac) = model.compute_integrality_gap(&[1.0, 0.0], 1e-6);
    assert_eq!(gap, 0.0);
    assert_eq!(nfrac, 0);

    // num_frac counts exactly the variables with contribution above eps
    let (gap, nfrac) = model.compute_integrality_gap(&[0.5, 0.0000001], 1e-6);
    assert!((gap - 0.5000001).abs() < 1e-6);
    assert_eq!(nfrac, 1);
}
