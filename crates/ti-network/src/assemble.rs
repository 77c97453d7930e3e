//! Assembly of the DC power-balance constraints, the deviation cost and the
//! per-line thermal block.
//!
//! Bus balance at bus `i`, step `t`:
//!
//! ```text
//! Σ_{farms at i} Δ_{r,t} − α_i m_t − Σ_{lines} ±(θ_from,t − θ_to,t)/x
//!     = load_{i,t} − Σ_{farms at i} forecast_{r,t} − Σ_{gens at i} output_{g,t}
//! ```
//!
//! plus `θ_ref,t = 0`. The line block adds, per step,
//! `s_t (θ_from,t − θ_to,t)/x − z_t = 0` with decay weights `s_t`.

use crate::error::NetworkResult;
use crate::layout::SolutionLayout;
use crate::model::{Line, Network};
use crate::thermal::decay_weights;
use nalgebra::{DMatrix, DVector};
use ti_core::units::Time;
use ti_solver::{InstantonProblem, LinearSystem, QuadraticForm};
use tracing::debug;

/// Network-wide matrices shared by every line solve.
#[derive(Debug, Clone)]
pub struct NetworkInstance {
    pub layout: SolutionLayout,
    /// Balance and reference rows
    pub balance: DMatrix<f64>,
    pub balance_rhs: DVector<f64>,
    /// Deviation cost `diag(1/σ²)` on the wind deviation columns
    pub objective: DMatrix<f64>,
    /// Identity on the angle-difference columns
    pub thermal: DMatrix<f64>,
    time_step: Time,
}

impl NetworkInstance {
    /// Assemble the network-wide blocks.
    pub fn assemble(net: &Network) -> Self {
        let layout = SolutionLayout::new(net.farms.len(), net.buses.len(), net.horizon);
        let n = layout.len();
        let rows_per_step = layout.buses + 1;
        let mut balance = DMatrix::zeros(net.horizon * rows_per_step, n);
        let mut rhs = DVector::zeros(net.horizon * rows_per_step);

        for t in 0..net.horizon {
            let row = |bus: usize| t * rows_per_step + bus;

            for bus in &net.buses {
                rhs[row(bus.id.position())] += bus.load[t];
            }
            for (r, farm) in net.farms.iter().enumerate() {
                let i = row(farm.bus.position());
                balance[(i, layout.deviation(t, r))] += 1.0;
                rhs[i] -= farm.forecast[t];
            }
            for generator in &net.generators {
                let i = row(generator.bus.position());
                balance[(i, layout.mismatch(t))] -= generator.participation;
                rhs[i] -= generator.output[t];
            }
            for line in &net.lines {
                let (f, to) = (line.from.position(), line.to.position());
                let b = 1.0 / line.reactance;
                balance[(row(f), layout.angle(t, f))] -= b;
                balance[(row(f), layout.angle(t, to))] += b;
                balance[(row(to), layout.angle(t, f))] += b;
                balance[(row(to), layout.angle(t, to))] -= b;
            }
            let reference = t * rows_per_step + layout.buses;
            balance[(reference, layout.angle(t, net.reference.position()))] = 1.0;
        }

        let mut objective = DMatrix::zeros(n, n);
        for t in 0..net.horizon {
            for (r, farm) in net.farms.iter().enumerate() {
                let j = layout.deviation(t, r);
                objective[(j, j)] = 1.0 / (farm.sigma * farm.sigma);
            }
        }

        let mut thermal = DMatrix::zeros(n, n);
        for t in 0..net.horizon {
            let j = layout.angle_diff(t);
            thermal[(j, j)] = 1.0;
        }

        debug!(
            unknowns = n,
            rows = balance.nrows(),
            buses = layout.buses,
            farms = layout.farms,
            horizon = layout.horizon,
            "network assembled"
        );

        Self {
            layout,
            balance,
            balance_rhs: rhs,
            objective,
            thermal,
            time_step: net.time_step,
        }
    }

    /// The `horizon × n` block tying the line's weighted flow to the
    /// angle-difference unknowns.
    pub fn line_block(&self, line: &Line) -> DMatrix<f64> {
        let layout = &self.layout;
        let weights = decay_weights(line.thermal.decay, self.time_step, layout.horizon);
        let (f, to) = (line.from.position(), line.to.position());
        let mut block = DMatrix::zeros(layout.horizon, layout.len());
        for (t, s) in weights.iter().enumerate() {
            let coeff = s / line.reactance;
            block[(t, layout.angle(t, f))] += coeff;
            block[(t, layout.angle(t, to))] -= coeff;
            block[(t, layout.angle_diff(t))] = -1.0;
        }
        block
    }

    /// Full QCQP for one line.
    pub fn line_problem(&self, line: &Line) -> NetworkResult<InstantonProblem> {
        let block = self.line_block(line);
        let constraints = LinearSystem::stacked(
            &self.balance,
            &self.balance_rhs,
            &block,
            &DVector::zeros(block.nrows()),
        )?;
        let problem = InstantonProblem::new(
            QuadraticForm::pure(self.objective.clone())?,
            QuadraticForm::level_set(self.thermal.clone(), line.thermal.level())?,
            constraints,
            self.layout.horizon,
        )?;
        Ok(problem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::NetworkBuilder;
    use crate::thermal::ThermalParams;
    use ti_core::units::{degc, m, s};

    fn thermal() -> ThermalParams {
        ThermalParams {
            gain: 0.2,
            decay: 0.5,
            forced: degc(73.0),
            limit: degc(75.0),
        }
    }

    fn two_bus() -> Network {
        let mut b = NetworkBuilder::new(2, s(1.0));
        let wind = b.add_bus("wind", vec![0.0, 0.0]);
        let load = b.add_bus("load", vec![1.0, 1.0]);
        b.add_line("tie", wind, load, 1.0, m(1000.0), thermal());
        b.add_wind_farm("farm", wind, vec![1.0, 1.0], 1.0);
        b.add_generator("gen", load, 1.0, vec![0.0, 0.0]);
        b.set_reference(load);
        b.build().unwrap()
    }

    #[test]
    fn two_bus_rows_match_hand_derivation() {
        let inst = NetworkInstance::assemble(&two_bus());
        let l = inst.layout;
        assert_eq!(l.len(), 10);
        assert_eq!(inst.balance.shape(), (6, 10));
        // bus 0: Δ - θ0 + θ1 = -1
        assert_eq!(inst.balance[(0, l.deviation(0, 0))], 1.0);
        assert_eq!(inst.balance[(0, l.angle(0, 0))], -1.0);
        assert_eq!(inst.balance[(0, l.angle(0, 1))], 1.0);
        assert_eq!(inst.balance_rhs[0], -1.0);
        // bus 1: θ0 - θ1 - m = 1
        assert_eq!(inst.balance[(1, l.angle(0, 0))], 1.0);
        assert_eq!(inst.balance[(1, l.mismatch(0))], -1.0);
        assert_eq!(inst.balance_rhs[1], 1.0);
        // reference row
        assert_eq!(inst.balance[(2, l.angle(0, 1))], 1.0);
    }

    #[test]
    fn objective_and_thermal_hit_their_columns() {
        let inst = NetworkInstance::assemble(&two_bus());
        let l = inst.layout;
        assert_eq!(inst.objective[(l.deviation(1, 0), l.deviation(1, 0))], 1.0);
        assert_eq!(inst.objective.iter().filter(|v| **v != 0.0).count(), 2);
        assert_eq!(inst.thermal[(l.angle_diff(0), l.angle_diff(0))], 1.0);
        assert_eq!(inst.thermal.iter().filter(|v| **v != 0.0).count(), 2);
    }

    #[test]
    fn line_problem_is_consistent() {
        let net = two_bus();
        let inst = NetworkInstance::assemble(&net);
        let problem = inst.line_problem(&net.lines()[0]).unwrap();
        assert_eq!(problem.constraints.rows(), 8);
        assert_eq!(problem.horizon, 2);
        assert!((problem.thermal.constant() + 0.8).abs() < 1e-9);
        let block = inst.line_block(&net.lines()[0]);
        assert_eq!(block[(0, inst.layout.angle_diff(0))], -1.0);
        assert!(block[(1, inst.layout.angle(1, 0))] > block[(0, inst.layout.angle(0, 0))]);
    }
}
