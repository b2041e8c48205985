use itertools::Itertools;
use nalgebra::Vector3;

use crate::error::{Result, ScfError};

/// Electrostatic repulsion between point ions of equal charge `ionic_charge` at the given
/// positions: `sum_{i<j} Z^2 / |r_i - r_j|`.
///
/// Fails if two ions share a position.
pub fn ion_repulsion_energy(coordinates: &[Vector3<f64>], ionic_charge: f64) -> Result<f64> {
    let mut energy = 0.0;

    for ((first, a), (second, b)) in coordinates.iter().enumerate().tuple_combinations() {
        let distance = (b - a).norm();
        if distance == 0.0 {
            return Err(ScfError::CoincidentIons { first, second });
        }
        energy += ionic_charge * ionic_charge / distance;
    }

    log::debug!("ionic repulsion energy: {energy}");
    Ok(energy)
}
