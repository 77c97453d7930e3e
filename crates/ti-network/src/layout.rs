//! Position of every unknown in the solution vector.
//!
//! Per time step `t`: `farms` wind deviations, `buses` voltage angles and one
//! generation mismatch; after all steps, one weighted angle difference per
//! step for the line under study.

use nalgebra::DVector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolutionLayout {
    pub farms: usize,
    pub buses: usize,
    pub horizon: usize,
}

/// A solution vector split into its physical parts.
#[derive(Debug, Clone, PartialEq)]
pub struct InstantonProfile {
    /// `[t][farm]`
    pub deviations: Vec<Vec<f64>>,
    /// `[t][bus]`
    pub angles: Vec<Vec<f64>>,
    /// `[t]`
    pub mismatches: Vec<f64>,
    /// `[t]`
    pub angle_diffs: Vec<f64>,
}

impl SolutionLayout {
    pub fn new(farms: usize, buses: usize, horizon: usize) -> Self {
        Self {
            farms,
            buses,
            horizon,
        }
    }

    /// Unknowns per time step.
    pub fn step_len(&self) -> usize {
        self.farms + self.buses + 1
    }

    /// Total number of unknowns.
    pub fn len(&self) -> usize {
        self.horizon * self.step_len() + self.horizon
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn deviation(&self, t: usize, farm: usize) -> usize {
        t * self.step_len() + farm
    }

    pub fn angle(&self, t: usize, bus: usize) -> usize {
        t * self.step_len() + self.farms + bus
    }

    pub fn mismatch(&self, t: usize) -> usize {
        t * self.step_len() + self.farms + self.buses
    }

    pub fn angle_diff(&self, t: usize) -> usize {
        self.horizon * self.step_len() + t
    }

    /// Split `x` into per-step parts. Returns `None` when `x` does not have
    /// exactly [`SolutionLayout::len`] entries.
    pub fn decompose(&self, x: &DVector<f64>) -> Option<InstantonProfile> {
        if x.len() != self.len() {
            return None;
        }
        let steps = 0..self.horizon;
        Some(InstantonProfile {
            deviations: steps
                .clone()
                .map(|t| (0..self.farms).map(|r| x[self.deviation(t, r)]).collect())
                .collect(),
            angles: steps
                .clone()
                .map(|t| (0..self.buses).map(|i| x[self.angle(t, i)]).collect())
                .collect(),
            mismatches: steps.clone().map(|t| x[self.mismatch(t)]).collect(),
            angle_diffs: steps.map(|t| x[self.angle_diff(t)]).collect(),
        })
    }
}

impl InstantonProfile {
    /// Profile with no entries, used when there is no instanton.
    pub fn empty() -> Self {
        Self {
            deviations: Vec::new(),
            angles: Vec::new(),
            mismatches: Vec::new(),
            angle_diffs: Vec::new(),
        }
    }

    /// Total wind deviation per time step.
    pub fn total_deviation(&self) -> Vec<f64> {
        self.deviations.iter().map(|d| d.iter().sum()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_cover_vector_once() {
        let layout = SolutionLayout::new(2, 3, 2);
        let mut seen = vec![false; layout.len()];
        for t in 0..2 {
            for r in 0..2 {
                seen[layout.deviation(t, r)] = true;
            }
            for i in 0..3 {
                seen[layout.angle(t, i)] = true;
            }
            seen[layout.mismatch(t)] = true;
            seen[layout.angle_diff(t)] = true;
        }
        assert!(seen.iter().all(|s| *s));
        assert_eq!(layout.len(), 2 * 6 + 2);
    }

    #[test]
    fn decompose_splits_per_step() {
        let layout = SolutionLayout::new(1, 2, 2);
        let x = DVector::from_vec((0..10).map(|v| v as f64).collect());
        let p = layout.decompose(&x).unwrap();
        assert_eq!(p.deviations, vec![vec![0.0], vec![4.0]]);
        assert_eq!(p.angles, vec![vec![1.0, 2.0], vec![5.0, 6.0]]);
        assert_eq!(p.mismatches, vec![3.0, 7.0]);
        assert_eq!(p.angle_diffs, vec![8.0, 9.0]);
        assert_eq!(p.total_deviation(), vec![0.0, 4.0]);
    }

    #[test]
    fn decompose_rejects_wrong_length() {
        let layout = SolutionLayout::new(1, 2, 2);
        assert!(layout.decompose(&DVector::zeros(0)).is_none());
    }
}
