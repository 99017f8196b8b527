//! Apparent temperature ("heat index") transform.
//!
//! Samples are smoothed and controlled on apparent temperature rather than
//! dry-bulb temperature. Below roughly 80°F the simple Steadman fit is used;
//! above it the Rothfusz regression takes over, with the NWS adjustments for
//! very dry and very humid air.

/// Apparent temperature (°F) for dry-bulb `temp_f` (°F) and relative humidity `rh` (%).
pub fn heat_index_f(temp_f: f64, rh: f64) -> f64 {
    let simple = steadman(temp_f, rh);
    if (simple + temp_f) / 2.0 <= 80.0 {
        return simple;
    }

    let mut hi = rothfusz(temp_f, rh);
    if rh < 13.0 && temp_f > 80.0 && temp_f < 112.0 {
        hi -= ((13.0 - rh) / 4.0) * ((17.0 - (temp_f - 95.0).abs()) / 17.0).sqrt();
    } else if rh > 85.0 && temp_f > 80.0 && temp_f < 87.0 {
        hi += ((rh - 85.0) / 10.0) * ((87.0 - temp_f) / 5.0);
    }

    if hi < 80.0 { simple } else { hi }
}

fn steadman(t: f64, rh: f64) -> f64 {
    0.5 * (t + 61.0 + ((t - 68.0) * 1.2) + (rh * 0.094))
}

fn rothfusz(t: f64, rh: f64) -> f64 {
    -42.379 + 2.049_015_23 * t + 10.143_331_27 * rh
        - 0.224_755_41 * t * rh
        - 0.006_837_83 * t * t
        - 0.054_817_17 * rh * rh
        + 0.001_228_74 * t * t * rh
        + 0.000_852_82 * t * rh * rh
        - 0.000_001_99 * t * t * rh * rh
}
