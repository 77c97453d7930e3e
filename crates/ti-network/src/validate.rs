//! Structural validation of a network before assembly.

use crate::error::{NetworkError, NetworkResult};
use crate::model::Network;
use ti_core::BusId;
use ti_core::units::{meters, seconds};

const PARTICIPATION_TOL: f64 = 1e-9;

pub(crate) fn validate_network(net: &Network) -> NetworkResult<()> {
    if net.horizon == 0 {
        return Err(NetworkError::Empty { what: "time steps" });
    }
    if net.buses.is_empty() {
        return Err(NetworkError::Empty { what: "buses" });
    }
    if net.farms.is_empty() {
        return Err(NetworkError::Empty { what: "wind farms" });
    }
    if net.generators.is_empty() {
        return Err(NetworkError::Empty { what: "generators" });
    }
    positive("time step", seconds(net.time_step))?;
    check_bus(net, "reference bus".to_string(), net.reference)?;

    for bus in &net.buses {
        check_series(net, format!("load of bus '{}'", bus.name), &bus.load)?;
    }

    for line in &net.lines {
        check_bus(net, format!("line '{}'", line.name), line.from)?;
        check_bus(net, format!("line '{}'", line.name), line.to)?;
        if line.from == line.to {
            return Err(NetworkError::InvalidValue {
                what: format!("line '{}'", line.name),
                reason: "connects a bus to itself".to_string(),
            });
        }
        if line.reactance == 0.0 || !line.reactance.is_finite() {
            return Err(NetworkError::InvalidValue {
                what: format!("reactance of line '{}'", line.name),
                reason: format!("must be finite and nonzero, got {}", line.reactance),
            });
        }
        let length = meters(line.length);
        if length < 0.0 || !length.is_finite() {
            return Err(NetworkError::InvalidValue {
                what: format!("length of line '{}'", line.name),
                reason: format!("must be non-negative, got {length}"),
            });
        }
        positive(&format!("thermal gain of line '{}'", line.name), line.thermal.gain)?;
        positive(&format!("thermal decay of line '{}'", line.name), line.thermal.decay)?;
    }

    for farm in &net.farms {
        check_bus(net, format!("wind farm '{}'", farm.name), farm.bus)?;
        check_series(net, format!("forecast of wind farm '{}'", farm.name), &farm.forecast)?;
        positive(&format!("sigma of wind farm '{}'", farm.name), farm.sigma)?;
    }

    let mut total = 0.0;
    for generator in &net.generators {
        check_bus(net, format!("generator '{}'", generator.name), generator.bus)?;
        check_series(net, format!("output of generator '{}'", generator.name), &generator.output)?;
        if generator.participation < 0.0 || !generator.participation.is_finite() {
            return Err(NetworkError::InvalidValue {
                what: format!("participation of generator '{}'", generator.name),
                reason: format!("must be non-negative, got {}", generator.participation),
            });
        }
        total += generator.participation;
    }
    if (total - 1.0).abs() > PARTICIPATION_TOL {
        return Err(NetworkError::Participation { total });
    }

    Ok(())
}

fn check_bus(net: &Network, what: String, bus: BusId) -> NetworkResult<()> {
    if bus.position() < net.buses.len() {
        Ok(())
    } else {
        Err(NetworkError::InvalidBusRef { what, bus })
    }
}

fn check_series(net: &Network, what: String, series: &[f64]) -> NetworkResult<()> {
    if series.len() != net.horizon {
        return Err(NetworkError::SeriesLength {
            what,
            expected: net.horizon,
            actual: series.len(),
        });
    }
    if let Some(bad) = series.iter().find(|v| !v.is_finite()) {
        return Err(NetworkError::InvalidValue {
            what,
            reason: format!("non-finite entry {bad}"),
        });
    }
    Ok(())
}

fn positive(what: &str, value: f64) -> NetworkResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(NetworkError::InvalidValue {
            what: what.to_string(),
            reason: format!("must be positive, got {value}"),
        })
    }
}
