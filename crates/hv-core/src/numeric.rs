use crate::CoreError;

/// Floating point type used for every temperature and humidity value
pub type Real = f64;

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Finite and inside `[min, max]`.
pub fn ensure_in_range(v: Real, min: Real, max: Real, what: &'static str) -> Result<Real, CoreError> {
    let v = ensure_finite(v, what)?;
    if v < min || v > max {
        return Err(CoreError::OutOfRange {
            what,
            value: v,
            min,
            max,
        });
    }
    Ok(v)
}

/// Round to `decimals` places, used for display and status payloads.
pub fn round_to(v: Real, decimals: i32) -> Real {
    let scale = 10f64.powi(decimals);
    (v * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn ensure_in_range_rejects_outside() {
        assert!(ensure_in_range(50.0, 0.0, 100.0, "humidity").is_ok());
        assert!(ensure_in_range(100.5, 0.0, 100.0, "humidity").is_err());
        assert!(ensure_in_range(Real::INFINITY, 0.0, 100.0, "humidity").is_err());
    }

    #[test]
    fn round_to_one_decimal() {
        assert_eq!(round_to(74.96, 1), 75.0);
        assert_eq!(round_to(-0.04, 1), -0.0);
    }
}
