//! Incremental network builder.

use crate::error::NetworkResult;
use crate::model::{Bus, Generator, Line, Network, WindFarm};
use crate::thermal::ThermalParams;
use crate::validate;
use ti_core::units::{Length, Time};
use ti_core::{BusId, FarmId, GenId, LineId};

/// Builder for constructing a network incrementally.
///
/// Ids are handed out in insertion order; `build()` validates references,
/// values and series lengths and freezes the result into a [`Network`].
#[derive(Debug)]
pub struct NetworkBuilder {
    buses: Vec<Bus>,
    lines: Vec<Line>,
    farms: Vec<WindFarm>,
    generators: Vec<Generator>,
    reference: Option<BusId>,
    horizon: usize,
    time_step: Time,
}

impl NetworkBuilder {
    /// Create an empty builder for `horizon` steps of length `time_step`.
    pub fn new(horizon: usize, time_step: Time) -> Self {
        Self {
            buses: Vec::new(),
            lines: Vec::new(),
            farms: Vec::new(),
            generators: Vec::new(),
            reference: None,
            horizon,
            time_step,
        }
    }

    /// Add a bus with its demand series and return its ID.
    pub fn add_bus(&mut self, name: impl Into<String>, load: Vec<f64>) -> BusId {
        let id = BusId::from_position(self.buses.len());
        self.buses.push(Bus {
            id,
            name: name.into(),
            load,
        });
        id
    }

    /// Add a line between two buses and return its ID.
    pub fn add_line(
        &mut self,
        name: impl Into<String>,
        from: BusId,
        to: BusId,
        reactance: f64,
        length: Length,
        thermal: ThermalParams,
    ) -> LineId {
        let id = LineId::from_position(self.lines.len());
        self.lines.push(Line {
            id,
            name: name.into(),
            from,
            to,
            reactance,
            length,
            thermal,
        });
        id
    }

    /// Add a wind farm with its forecast series and error spread.
    pub fn add_wind_farm(
        &mut self,
        name: impl Into<String>,
        bus: BusId,
        forecast: Vec<f64>,
        sigma: f64,
    ) -> FarmId {
        let id = FarmId::from_position(self.farms.len());
        self.farms.push(WindFarm {
            id,
            name: name.into(),
            bus,
            forecast,
            sigma,
        });
        id
    }

    /// Add a dispatchable generator.
    pub fn add_generator(
        &mut self,
        name: impl Into<String>,
        bus: BusId,
        participation: f64,
        output: Vec<f64>,
    ) -> GenId {
        let id = GenId::from_position(self.generators.len());
        self.generators.push(Generator {
            id,
            name: name.into(),
            bus,
            participation,
            output,
        });
        id
    }

    /// Set the angle reference bus (defaults to the first bus).
    pub fn set_reference(&mut self, bus: BusId) {
        self.reference = Some(bus);
    }

    /// Validate and freeze the network.
    pub fn build(self) -> NetworkResult<Network> {
        let reference = self.reference.unwrap_or(BusId::from_index(0));
        let network = Network {
            buses: self.buses,
            lines: self.lines,
            farms: self.farms,
            generators: self.generators,
            reference,
            horizon: self.horizon,
            time_step: self.time_step,
        };
        validate::validate_network(&network)?;
        Ok(network)
    }
}
