//! Tiered time-based fee calculation.

use crate::lot::VehicleClass;

/// (first hour, each additional hour) in abstract currency units.
fn rates(class: VehicleClass) -> (f64, f64) {
    match class {
        VehicleClass::TwoWheeler => (20.0, 10.0),
        VehicleClass::Standard => (40.0, 20.0),
        VehicleClass::Heavy => (60.0, 30.0),
    }
}

/// Round a duration up to whole billed hours, never below one.
fn billed_hours(duration_min: i64) -> i64 {
    ((duration_min + 59) / 60).max(1)
}

/// Total fee for a visit of the given duration. Defined for every input;
/// zero and negative durations bill the minimum of one hour.
pub fn compute_fee(class: VehicleClass, duration_min: i64) -> f64 {
    let hours = billed_hours(duration_min);
    let (first, additional) = rates(class);
    if hours == 1 {
        first
    } else {
        first + (hours - 1) as f64 * additional
    }
}
