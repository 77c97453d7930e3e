//! Immutable DC network model.

use crate::thermal::ThermalParams;
use ti_core::units::{Length, Time, meters};
use ti_core::{BusId, FarmId, GenId, LineId};

#[derive(Debug, Clone, PartialEq)]
pub struct Bus {
    pub id: BusId,
    pub name: String,
    /// Demand per time step
    pub load: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub id: LineId,
    pub name: String,
    pub from: BusId,
    pub to: BusId,
    pub reactance: f64,
    pub length: Length,
    pub thermal: ThermalParams,
}

impl Line {
    /// Zero-length lines carry no conductor to heat and are not analyzed.
    pub fn is_degenerate(&self) -> bool {
        meters(self.length) == 0.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindFarm {
    pub id: FarmId,
    pub name: String,
    pub bus: BusId,
    /// Forecast output per time step
    pub forecast: Vec<f64>,
    /// Standard deviation of the forecast error
    pub sigma: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Generator {
    pub id: GenId,
    pub name: String,
    pub bus: BusId,
    /// Share of the total wind deviation this unit absorbs
    pub participation: f64,
    /// Scheduled output per time step
    pub output: Vec<f64>,
}

/// Validated network over a fixed horizon.
#[derive(Debug, Clone)]
pub struct Network {
    pub(crate) buses: Vec<Bus>,
    pub(crate) lines: Vec<Line>,
    pub(crate) farms: Vec<WindFarm>,
    pub(crate) generators: Vec<Generator>,
    pub(crate) reference: BusId,
    pub(crate) horizon: usize,
    pub(crate) time_step: Time,
}

impl Network {
    pub fn buses(&self) -> &[Bus] {
        &self.buses
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn farms(&self) -> &[WindFarm] {
        &self.farms
    }

    pub fn generators(&self) -> &[Generator] {
        &self.generators
    }

    pub fn reference(&self) -> BusId {
        self.reference
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn time_step(&self) -> Time {
        self.time_step
    }

    pub fn line(&self, id: LineId) -> Option<&Line> {
        self.lines.get(id.position())
    }
}
