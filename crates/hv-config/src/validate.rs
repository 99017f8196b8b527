//! Configuration validation logic.

use crate::schema::{LATEST_VERSION, RigConfig};

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: &str, value: impl ToString, reason: impl ToString) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

pub fn validate_config(config: &RigConfig) -> Result<(), ValidationError> {
    if config.version == 0 || config.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: config.version,
        });
    }

    if config.name.trim().is_empty() {
        return Err(invalid("name", "", "must not be empty"));
    }

    let control = &config.control;
    control
        .cadence()
        .map_err(|e| invalid("control.period_s", control.period_s, e))?;
    control
        .thresholds()
        .map_err(|e| invalid("control.hysteresis/deadband", control.deadband, e))?;
    control
        .rate_policy()
        .map_err(|e| invalid("control.nominal_rate_per_s", control.nominal_rate_per_s, e))?;

    let seq = &config.sequencing;
    seq.timing().map_err(|e| {
        invalid(
            "sequencing",
            format!("{}/{}", seq.fan_lead_in_s, seq.compressor_cooldown_s),
            e,
        )
    })?;

    let sampling = &config.sampling;
    sampling
        .cadence()
        .map_err(|e| invalid("sampling.period_s", sampling.period_s, e))?;
    if sampling.buffer_capacity == 0 {
        return Err(invalid("sampling.buffer_capacity", 0, "must be positive"));
    }
    if sampling.chart_prune_threshold < 2 {
        return Err(invalid(
            "sampling.chart_prune_threshold",
            sampling.chart_prune_threshold,
            "must be at least 2",
        ));
    }

    let sp = &config.setpoint;
    if !(sp.min.is_finite() && sp.max.is_finite()) || sp.min >= sp.max {
        return Err(invalid(
            "setpoint",
            format!("{}..{}", sp.min, sp.max),
            "min must be below max",
        ));
    }
    if !(sp.min..=sp.max).contains(&sp.default) {
        return Err(invalid("setpoint.default", sp.default, "outside min..max"));
    }

    if let Some(persistence) = &config.persistence {
        if persistence.path.trim().is_empty() {
            return Err(invalid("persistence.path", "", "must not be empty"));
        }
    }

    Ok(())
}
