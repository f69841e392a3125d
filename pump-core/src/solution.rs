//! Run outcome record.

/// Everything a finished run reports, written once and then read-only.
///
/// Gap fields default to infinity so a run that never produced a point is
/// distinguishable from one that found an exact solution. Bucket fields use
/// `-1` for "not applicable / never happened", matching their textual output.
#[derive(Debug, Clone)]
pub struct Solution {
    /// An integer feasible solution was found.
    pub is_feasible: bool,

    /// The problem was proved infeasible (presolve, or the LP of the fully
    /// active model).
    pub is_infeasible: bool,

    /// Objective value of the solution found.
    pub value: f64,

    /// Objective after fixing the integer variables and re-solving the
    /// residual LP.
    pub reopt_value: f64,

    /// Integrality gap of the reported point on the original model.
    pub real_integrality_gap: f64,

    /// Integrality gap of the best projection (possibly on the presolved
    /// model).
    pub projection_integrality_gap: f64,

    /// Number of integer variables left fractional.
    pub num_frac: usize,

    /// Pump iterations across the whole run.
    pub num_iterations: usize,

    /// Number of buckets built (the initial kernel is not a bucket).
    pub num_buckets: usize,

    /// Last bucket index visited (0 = initial kernel).
    pub last_bucket_visited: i64,

    /// First bucket at which the pump managed to iterate.
    pub first_bucket_to_iter_pump: i64,

    /// Binary variables in the kernel at the end of the run (`-1` when the
    /// kernel pump did not run).
    pub num_binary_vars_added: i64,

    /// Binary variables at value one in the solution (`-1` when unknown).
    pub num_binary_vars_with_value_one: i64,

    /// Seconds spent building the kernel/bucket partition.
    pub time_spent_building_kernel_buckets: f64,

    /// Total wall-clock seconds of the run.
    pub total_time_spent: f64,
}

impl Default for Solution {
    fn default() -> Self {
        Self {
            is_feasible: false,
            is_infeasible: false,
            value: 0.0,
            reopt_value: 0.0,
            real_integrality_gap: f64::INFINITY,
            projection_integrality_gap: f64::INFINITY,
            num_frac: 0,
            num_iterations: 0,
            num_buckets: 0,
            last_bucket_visited: -1,
            first_bucket_to_iter_pump: -1,
            num_binary_vars_added: -1,
            num_binary_vars_with_value_one: -1,
            time_spent_building_kernel_buckets: 0.0,
            total_time_spent: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Solution::default();
        assert!(!s.is_feasible);
        assert!(!s.is_infeasible);
        assert!(s.real_integrality_gap.is_infinite());
        assert_eq!(s.last_bucket_visited, -1);
        assert_eq!(s.num_binary_vars_added, -1);
    }
}
