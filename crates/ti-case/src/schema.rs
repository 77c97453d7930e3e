//! Case file schema definitions.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseFile {
    pub version: u32,
    pub name: String,
    /// Number of time steps `T`
    pub horizon: usize,
    pub time_step_s: f64,
    pub reference_bus: String,
    #[serde(default)]
    pub buses: Vec<BusDef>,
    #[serde(default)]
    pub lines: Vec<LineDef>,
    #[serde(default)]
    pub wind_farms: Vec<WindFarmDef>,
    #[serde(default)]
    pub generators: Vec<GeneratorDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solver: Option<SolverDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BusDef {
    pub id: String,
    pub name: String,
    /// Demand per time step
    pub load: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineDef {
    pub id: String,
    pub name: String,
    pub from: String,
    pub to: String,
    pub reactance: f64,
    pub length_m: f64,
    pub thermal: ThermalDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThermalDef {
    /// Heating per unit squared flow
    pub gain: f64,
    /// Radiative decay constant, 1/s
    pub decay: f64,
    pub forced_c: f64,
    pub limit_c: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WindFarmDef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub bus: String,
    pub forecast: Vec<f64>,
    pub sigma: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneratorDef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub bus: String,
    pub participation: f64,
    pub output: Vec<f64>,
}

/// Solver overrides; omitted fields keep the solver defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SolverDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub residual_tol: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify_tol: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_bisection_iters: Option<usize>,
    /// `bracket_collapse` or `repeated_residual`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stall_criterion: Option<String>,
}

impl CaseFile {
    pub fn bus(&self, id: &str) -> Option<&BusDef> {
        self.buses.iter().find(|b| b.id == id)
    }

    pub fn line(&self, id: &str) -> Option<&LineDef> {
        self.lines.iter().find(|l| l.id == id)
    }
}
