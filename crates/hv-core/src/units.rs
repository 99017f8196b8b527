// hv-core/src/units.rs

use uom::si::f64::ThermodynamicTemperature;
use uom::si::thermodynamic_temperature::{degree_celsius, degree_fahrenheit};

/// Absolute temperature as reported by sensors (SI, f64).
pub type Temperature = ThermodynamicTemperature;

#[inline]
pub fn degc(v: f64) -> Temperature {
    Temperature::new::<degree_celsius>(v)
}

#[inline]
pub fn degf(v: f64) -> Temperature {
    Temperature::new::<degree_fahrenheit>(v)
}

/// Temperature in degrees Fahrenheit, the unit the controller reasons in.
#[inline]
pub fn to_fahrenheit(t: Temperature) -> f64 {
    t.get::<degree_fahrenheit>()
}
