//! Case validation logic.

use crate::schema::CaseFile;
use std::collections::HashSet;

pub const LATEST_VERSION: u32 = 1;

const PARTICIPATION_TOL: f64 = 1e-9;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_case(case: &CaseFile) -> Result<(), ValidationError> {
    if case.version == 0 || case.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: case.version,
        });
    }
    if case.horizon == 0 {
        return Err(invalid("horizon", 0, "must be at least one step"));
    }
    if !(case.time_step_s > 0.0 && case.time_step_s.is_finite()) {
        return Err(invalid("time_step_s", case.time_step_s, "must be positive"));
    }

    let bus_ids = unique_ids(case.buses.iter().map(|b| &b.id), "buses")?;
    unique_ids(case.lines.iter().map(|l| &l.id), "lines")?;
    unique_ids(case.wind_farms.iter().map(|w| &w.id), "wind_farms")?;
    unique_ids(case.generators.iter().map(|g| &g.id), "generators")?;

    if !bus_ids.contains(&case.reference_bus) {
        return Err(missing(&case.reference_bus, "reference_bus"));
    }
    if case.wind_farms.is_empty() {
        return Err(invalid("wind_farms", 0, "at least one wind farm is required"));
    }
    if case.generators.is_empty() {
        return Err(invalid("generators", 0, "at least one generator is required"));
    }

    for bus in &case.buses {
        check_series(&format!("buses.{}.load", bus.id), &bus.load, case.horizon)?;
    }

    for line in &case.lines {
        let context = format!("lines.{}", line.id);
        for end in [&line.from, &line.to] {
            if !bus_ids.contains(end) {
                return Err(missing(end, &context));
            }
        }
        if line.from == line.to {
            return Err(invalid(&context, &line.from, "line connects a bus to itself"));
        }
        if line.reactance == 0.0 || !line.reactance.is_finite() {
            return Err(invalid(
                &format!("{context}.reactance"),
                line.reactance,
                "must be finite and nonzero",
            ));
        }
        if line.length_m < 0.0 || !line.length_m.is_finite() {
            return Err(invalid(
                &format!("{context}.length_m"),
                line.length_m,
                "must be non-negative",
            ));
        }
        positive(&format!("{context}.thermal.gain"), line.thermal.gain)?;
        positive(&format!("{context}.thermal.decay"), line.thermal.decay)?;
        for (field, value) in [
            ("forced_c", line.thermal.forced_c),
            ("limit_c", line.thermal.limit_c),
        ] {
            if !value.is_finite() {
                return Err(invalid(&format!("{context}.thermal.{field}"), value, "must be finite"));
            }
        }
    }

    for farm in &case.wind_farms {
        let context = format!("wind_farms.{}", farm.id);
        if !bus_ids.contains(&farm.bus) {
            return Err(missing(&farm.bus, &context));
        }
        check_series(&format!("{context}.forecast"), &farm.forecast, case.horizon)?;
        positive(&format!("{context}.sigma"), farm.sigma)?;
    }

    let mut total = 0.0;
    for generator in &case.generators {
        let context = format!("generators.{}", generator.id);
        if !bus_ids.contains(&generator.bus) {
            return Err(missing(&generator.bus, &context));
        }
        check_series(&format!("{context}.output"), &generator.output, case.horizon)?;
        if generator.participation < 0.0 || !generator.participation.is_finite() {
            return Err(invalid(
                &format!("{context}.participation"),
                generator.participation,
                "must be non-negative",
            ));
        }
        total += generator.participation;
    }
    if (total - 1.0).abs() > PARTICIPATION_TOL {
        return Err(invalid("generators.participation", total, "must sum to 1"));
    }

    if let Some(solver) = &case.solver {
        for (field, value) in [
            ("tolerance", solver.tolerance),
            ("residual_tol", solver.residual_tol),
            ("verify_tol", solver.verify_tol),
        ] {
            if let Some(v) = value {
                positive(&format!("solver.{field}"), v)?;
            }
        }
        if solver.max_bisection_iters == Some(0) {
            return Err(invalid("solver.max_bisection_iters", 0, "must be positive"));
        }
        if let Some(name) = &solver.stall_criterion
            && !matches!(
                name.to_ascii_lowercase().as_str(),
                "bracket_collapse" | "bracketcollapse" | "repeated_residual" | "repeatedresidual"
            )
        {
            return Err(invalid(
                "solver.stall_criterion",
                name,
                "expected bracket_collapse or repeated_residual",
            ));
        }
    }

    Ok(())
}

fn unique_ids<'a>(
    ids: impl Iterator<Item = &'a String>,
    context: &str,
) -> Result<HashSet<&'a String>, ValidationError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(ValidationError::DuplicateId {
                id: id.clone(),
                context: context.to_string(),
            });
        }
    }
    Ok(seen)
}

fn check_series(field: &str, series: &[f64], horizon: usize) -> Result<(), ValidationError> {
    if series.len() != horizon {
        return Err(invalid(
            field,
            series.len(),
            &format!("expected {horizon} entries"),
        ));
    }
    if let Some(bad) = series.iter().find(|v| !v.is_finite()) {
        return Err(invalid(field, bad, "entries must be finite"));
    }
    Ok(())
}

fn positive(field: &str, value: f64) -> Result<(), ValidationError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, value, "must be positive"))
    }
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn missing(id: &str, context: &str) -> ValidationError {
    ValidationError::MissingReference {
        id: id.to_string(),
        context: context.to_string(),
    }
}
