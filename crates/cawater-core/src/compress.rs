//! Compressible-mass approximation.
//!
//! A cell carrying water from above may hold a little more than a full
//! cell's worth. [`compressible_mass`] returns how much of `total` (the mass
//! of a cell plus its neighbour) the lower cell may keep before the rest
//! must move on.

use crate::cell::Mass;
use crate::config::WaterConfig;

/// Capacity of a cell given the combined mass of it and its neighbour.
///
/// - `total <= max` -> `max`
/// - `total < 2 * max + compress` ->
///   `(max^2 + total * compress) / (max + compress)`
/// - otherwise -> `(total + compress) / 2`
///
/// where `compress = config.max_compress()`. Division truncates toward
/// zero, which biases toward under-filling. Intermediate products are
/// computed in `i128`; the result saturates into [`Mass`].
pub fn compressible_mass(total: Mass, config: &WaterConfig) -> Mass {
    let max = i128::from(config.max_mass);
    let compress = i128::from(config.max_compress());
    let total = i128::from(total);

    let capacity = if total <= max {
        max
    } else if total < 2 * max + compress {
        (max * max + total * compress) / (max + compress)
    } else {
        (total + compress) / 2
    };

    capacity.clamp(i128::from(Mass::MIN), i128::from(Mass::MAX)) as Mass
}
