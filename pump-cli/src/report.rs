//! Solution file rendering.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use pump_core::solution::Solution;

/// Render the solution record in the key-value text format, six decimals.
pub fn render(solution: &Solution) -> String {
    let mut out = String::new();
    if solution.is_feasible {
        out.push_str("STATUS: FOUND INTEGER FEASIBLE\n");
    } else {
        out.push_str("STATUS: FAILED TO FIND AN INTEGER FEASIBLE SOLUTION\n");
    }
    let _ = writeln!(
        out,
        "time building kernel and buckets (s): {:.6}",
        solution.time_spent_building_kernel_buckets
    );
    let _ = writeln!(out, "total time (s): {:.6}", solution.total_time_spent);
    let _ = writeln!(out, "# iterations: {}", solution.num_iterations);
    let _ = writeln!(out, "# buckets: {}", solution.num_buckets);
    let _ = writeln!(out, "last bucket visited: {}", solution.last_bucket_visited);
    let _ = writeln!(
        out,
        "first bucket to iter pump: {}",
        solution.first_bucket_to_iter_pump
    );
    let _ = writeln!(out, "value: {:.6}", solution.value);
    let _ = writeln!(out, "reopt value: {:.6}", solution.reopt_value);
    let _ = writeln!(
        out,
        "real integrality gap: {:.6}",
        solution.real_integrality_gap
    );
    let _ = writeln!(
        out,
        "projection integrality gap: {:.6}",
        solution.projection_integrality_gap
    );
    let _ = writeln!(out, "num frac: {}", solution.num_frac);
    if solution.num_binary_vars_added != -1 {
        let _ = writeln!(
            out,
            "num bin vars added: {}",
            solution.num_binary_vars_added
        );
        let _ = writeln!(
            out,
            "num bin vars with value 1: {}",
            solution.num_binary_vars_with_value_one
        );
    }
    out
}

/// Write the rendered solution to a file.
pub fn write_solution<P: AsRef<Path>>(path: P, solution: &Solution) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, render(solution))
        .with_context(|| format!("cannot write solution file {}", path.display()))
}
