//! Conductor thermal parameters and the temperature-decay weights of the
//! per-line constraint block.

use ti_core::units::{Temperature, Time, rise_kelvin, seconds};

/// First-order conductor heating model of one line.
///
/// Temperature relaxes towards the forced component `forced` at rate `decay`
/// (1/s) while squared flow heats it with gain `gain`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermalParams {
    pub gain: f64,
    pub decay: f64,
    pub forced: Temperature,
    pub limit: Temperature,
}

impl ThermalParams {
    /// Thermal constant `(gain / decay) · (limit - forced)` that the weighted
    /// squared flows must reach.
    pub fn level(&self) -> f64 {
        (self.gain / self.decay) * rise_kelvin(self.limit, self.forced)
    }
}

/// Weight `s_t` applied to the flow of step `t`.
///
/// `s_t² = e^{-decay·Δt·(T-1-t)} · (1 - e^{-decay·Δt})` is the share of the
/// heat injected during step `t` that survives to the end of the horizon.
pub fn decay_weights(decay: f64, time_step: Time, horizon: usize) -> Vec<f64> {
    let step = decay * seconds(time_step);
    let injected = 1.0 - (-step).exp();
    (0..horizon)
        .map(|t| {
            let remaining = (horizon - 1 - t) as f64;
            ((-step * remaining).exp() * injected).sqrt()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ti_core::units::{degc, s};

    #[test]
    fn level_scales_rise_by_gain_over_decay() {
        let params = ThermalParams {
            gain: 0.2,
            decay: 0.5,
            forced: degc(73.0),
            limit: degc(75.0),
        };
        assert!((params.level() - 0.8).abs() < 1e-9);
    }

    #[test]
    fn later_steps_weigh_more() {
        let w = decay_weights(0.5, s(1.0), 3);
        assert_eq!(w.len(), 3);
        assert!(w[0] < w[1] && w[1] < w[2]);
        let last = (1.0 - (-0.5f64).exp()).sqrt();
        assert!((w[2] - last).abs() < 1e-12);
    }

    #[test]
    fn weights_telescope_to_total_decay() {
        // Σ s_t² = 1 - e^{-decay·Δt·T}
        let w = decay_weights(0.3, s(2.0), 5);
        let total: f64 = w.iter().map(|v| v * v).sum();
        assert!((total - (1.0 - (-0.3f64 * 2.0 * 5.0).exp())).abs() < 1e-12);
    }
}
