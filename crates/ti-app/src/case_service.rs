//! Case loading, validation, compilation into a network and introspection.

use std::collections::HashMap;
use std::path::Path;

use ti_case::CaseFile;
use ti_core::units::{degc, m, s};
use ti_core::{BusId, LineId};
use ti_network::{Network, NetworkBuilder, ThermalParams};
use ti_solver::{SolverConfig, StallCriterion};

use crate::error::{AppError, AppResult};

/// Summary of a line for listing.
#[derive(Debug, Clone)]
pub struct LineSummary {
    pub id: String,
    pub name: String,
    pub from: String,
    pub to: String,
    pub length_m: f64,
    /// Thermal constant the weighted squared flows must reach
    pub level: f64,
    /// Zero-length lines are not analyzed
    pub skipped: bool,
}

/// Network compiled from a case, with the case ids of every element in
/// insertion order.
#[derive(Debug, Clone)]
pub struct CompiledCase {
    pub network: Network,
    pub bus_keys: Vec<String>,
    pub line_keys: Vec<String>,
    pub farm_keys: Vec<String>,
}

impl CompiledCase {
    /// Case id of a compiled line.
    pub fn line_key(&self, id: LineId) -> &str {
        self.line_keys
            .get(id.position())
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Compiled id of a case line.
    pub fn find_line(&self, key: &str) -> AppResult<LineId> {
        self.line_keys
            .iter()
            .position(|k| k == key)
            .map(LineId::from_position)
            .ok_or_else(|| AppError::LineNotFound(key.to_string()))
    }
}

/// Load a case from YAML or JSON (by extension) and validate it.
pub fn load_case(path: &Path) -> AppResult<CaseFile> {
    if !path.exists() {
        return Err(AppError::CaseFileRead {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "case file not found"),
        });
    }
    Ok(ti_case::load_case(path)?)
}

/// Validate case structure.
pub fn validate_case(case: &CaseFile) -> AppResult<()> {
    ti_case::validate_case(case).map_err(ti_case::CaseError::from)?;
    Ok(())
}

/// List every line of the case with its thermal level.
pub fn list_lines(case: &CaseFile) -> Vec<LineSummary> {
    case.lines
        .iter()
        .map(|line| LineSummary {
            id: line.id.clone(),
            name: line.name.clone(),
            from: line.from.clone(),
            to: line.to.clone(),
            length_m: line.length_m,
            level: thermal_params(line).level(),
            skipped: line.length_m == 0.0,
        })
        .collect()
}

/// Build the network described by a case.
pub fn compile_case(case: &CaseFile) -> AppResult<CompiledCase> {
    let mut builder = NetworkBuilder::new(case.horizon, s(case.time_step_s));

    let mut buses: HashMap<&str, BusId> = HashMap::new();
    for bus in &case.buses {
        let id = builder.add_bus(&bus.name, bus.load.clone());
        buses.insert(bus.id.as_str(), id);
    }
    let resolve = |key: &str, context: &str| {
        buses.get(key).copied().ok_or_else(|| {
            AppError::Validation(format!("{context} references unknown bus '{key}'"))
        })
    };

    builder.set_reference(resolve(&case.reference_bus, "reference_bus")?);

    for line in &case.lines {
        let context = format!("line '{}'", line.id);
        builder.add_line(
            &line.name,
            resolve(&line.from, &context)?,
            resolve(&line.to, &context)?,
            line.reactance,
            m(line.length_m),
            thermal_params(line),
        );
    }

    for farm in &case.wind_farms {
        let name = farm.name.clone().unwrap_or_else(|| farm.id.clone());
        let bus = resolve(&farm.bus, &format!("wind farm '{}'", farm.id))?;
        builder.add_wind_farm(name, bus, farm.forecast.clone(), farm.sigma);
    }

    for generator in &case.generators {
        let name = generator
            .name
            .clone()
            .unwrap_or_else(|| generator.id.clone());
        let bus = resolve(&generator.bus, &format!("generator '{}'", generator.id))?;
        builder.add_generator(
            name,
            bus,
            generator.participation,
            generator.output.clone(),
        );
    }

    let network = builder.build()?;

    Ok(CompiledCase {
        network,
        bus_keys: case.buses.iter().map(|b| b.id.clone()).collect(),
        line_keys: case.lines.iter().map(|l| l.id.clone()).collect(),
        farm_keys: case.wind_farms.iter().map(|f| f.id.clone()).collect(),
    })
}

/// Solver configuration with the case's overrides applied.
pub fn solver_config(case: &CaseFile) -> AppResult<SolverConfig> {
    let mut config = SolverConfig::default();
    let Some(overrides) = &case.solver else {
        return Ok(config);
    };
    if let Some(tol) = overrides.tolerance {
        config.tolerance = tol;
    }
    if let Some(tol) = overrides.residual_tol {
        config.residual_tol = tol;
    }
    if let Some(tol) = overrides.verify_tol {
        config.verify_tol = tol;
    }
    if let Some(iters) = overrides.max_bisection_iters {
        config.max_bisection_iters = iters;
    }
    if let Some(name) = &overrides.stall_criterion {
        config.stall_criterion = StallCriterion::parse(name).ok_or_else(|| {
            AppError::Validation(format!("Unknown stall criterion '{name}'"))
        })?;
    }
    Ok(config)
}

fn thermal_params(line: &ti_case::LineDef) -> ThermalParams {
    ThermalParams {
        gain: line.thermal.gain,
        decay: line.thermal.decay,
        forced: degc(line.thermal.forced_c),
        limit: degc(line.thermal.limit_c),
    }
}
