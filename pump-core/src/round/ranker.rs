//! Next-variable selection for the propagating rounder.

use super::domain::Domain;
use crate::model::VarType;
use crate::settings::RankerKind;

/// Picks the next unfixed integer variable to round.
#[derive(Debug)]
pub struct Ranker {
    kind: RankerKind,
    ignore_gint: bool,
    current: Vec<f64>,
}

impl Ranker {
    /// Create a ranker with the given strategy.
    pub fn new(kind: RankerKind) -> Self {
        Self {
            kind,
            ignore_gint: false,
            current: Vec::new(),
        }
    }

    /// Restrict the candidate set to binaries.
    pub fn ignore_general_integers(&mut self, flag: bool) {
        self.ignore_gint = flag;
    }

    /// Update the fractional point scores are computed against.
    pub fn set_current_state(&mut self, x: &[f64]) {
        self.current.clear();
        self.current.extend_from_slice(x);
    }

    /// Next unfixed integer variable per strategy, or `None` when every
    /// candidate is fixed.
    pub fn next(&self, domain: &Domain) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for j in 0..domain.size() {
            let ty = domain.var_type(j);
            let candidate = match ty {
                VarType::Binary => true,
                VarType::Integer => !self.ignore_gint,
                VarType::Continuous => false,
            };
            if !candidate || domain.is_fixed(j) {
                continue;
            }
            let v = self.current.get(j).copied().unwrap_or(0.0);
            let frac = (v - v.round()).abs();
            let score = match self.kind {
                RankerKind::Frac => frac,
                RankerKind::LeastFrac => -frac,
            };
            match best {
                None => best = Some((j, score)),
                Some((_, s)) if score > s => best = Some((j, score)),
                _ => {}
            }
        }
        best.map(|(j, _)| j)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelBuilder;

    fn domain() -> Domain {
        let mut b = ModelBuilder::new("r");
        b.add_col("x0", VarType::Binary, 0.0, 1.0, 0.0);
        b.add_col("x1", VarType::Binary, 0.0, 1.0, 0.0);
        b.add_col("x2", VarType::Integer, 0.0, 5.0, 0.0);
        b.add_col("x3", VarType::Continuous, 0.0, 1.0, 0.0);
        Domain::from_model(&b.build().unwrap())
    }

    #[test]
    fn test_frac_picks_most_fractional() {
        let domain = domain();
        let mut ranker = Ranker::new(RankerKind::Frac);
        ranker.set_current_state(&[0.1, 0.45, 2.2, 0.5]);
        assert_eq!(ranker.next(&domain), Some(1));
    }

    #[test]
    fn test_least_frac_picks_easiest() {
        let domain = domain();
        let mut ranker = Ranker::new(RankerKind::LeastFrac);
        ranker.set_current_state(&[0.1, 0.45, 2.2, 0.5]);
        assert_eq!(ranker.next(&domain), Some(0));
    }

    #[test]
    fn test_exhaustion_and_gint_scope() {
        let mut domain = domain();
        let mut ranker = Ranker::new(RankerKind::Frac);
        ranker.set_current_state(&[0.1, 0.45, 2.2, 0.5]);

        domain.fix(0, 0.0);
        domain.fix(1, 0.0);
        // only the general integer remains
        assert_eq!(ranker.next(&domain), Some(2));

        ranker.ignore_general_integers(true);
        assert_eq!(ranker.next(&domain), None);

        ranker.ignore_general_integers(false);
        domain.fix(2, 2.0);
        assert_eq!(ranker.next(&domain), None);
    }
}
