use nalgebra::{DMatrix, Vector3};
use serde::Deserialize;

use crate::{
    chi::ChiTensor,
    error::{Result, ScfError},
    ionic::ion_repulsion_energy,
    occupation::Occupation,
    scf::ScfSolver,
};

/// Represents the fixed inputs of an scf run in a config file. Matrices are row-major
/// nested lists, the chi tensor is nested as `[p][q][t]`.
#[derive(Deserialize)]
pub struct ConfigSystem {
    hamiltonian: Vec<Vec<f64>>,
    interaction: Vec<Vec<f64>>,
    /// the initial density guess
    density: Vec<Vec<f64>>,
    chi: Vec<Vec<Vec<f64>>>,
    occupation: Occupation,
    energy_ion: ConfigIonEnergy,
}

/// Either a precomputed ionic energy or point ions to compute it from.
#[derive(Deserialize)]
#[serde(untagged)]
enum ConfigIonEnergy {
    Value(f64),
    PointCharges {
        coordinates: Vec<[f64; 3]>,
        ionic_charge: f64,
    },
}

impl ConfigIonEnergy {
    fn energy(&self) -> Result<f64> {
        match self {
            ConfigIonEnergy::Value(energy) => Ok(*energy),
            ConfigIonEnergy::PointCharges {
                coordinates,
                ionic_charge,
            } => {
                let coordinates = coordinates
                    .iter()
                    .map(|&[x, y, z]| Vector3::new(x, y, z))
                    .collect::<Vec<_>>();
                ion_repulsion_energy(&coordinates, *ionic_charge)
            }
        }
    }
}

fn matrix(name: &str, rows: &[Vec<f64>]) -> Result<DMatrix<f64>> {
    let n_cols = rows.first().map_or(0, Vec::len);

    if let Some(row) = rows.iter().position(|row| row.len() != n_cols) {
        return Err(ScfError::dimension(format!(
            "row {row} of {name} has {} entries, expected {n_cols}",
            rows[row].len()
        )));
    }

    Ok(DMatrix::from_fn(rows.len(), n_cols, |i, j| rows[i][j]))
}

impl TryFrom<ConfigSystem> for ScfSolver {
    type Error = ScfError;

    fn try_from(value: ConfigSystem) -> Result<Self> {
        ScfSolver::new(
            matrix("hamiltonian", &value.hamiltonian)?,
            matrix("interaction", &value.interaction)?,
            matrix("density", &value.density)?,
            ChiTensor::from_nested(&value.chi)?,
            value.energy_ion.energy()?,
            value.occupation,
        )
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::ConfigSystem;
    use crate::{config::ScfOptions, error::ScfError, scf::ScfSolver};

    const DIMER: &str = r#"{
        "hamiltonian": [[0.0, -1.0], [-1.0, 0.0]],
        "interaction": [[0.5, 0.2], [0.2, 0.5]],
        "density": [[1.0, 0.0], [0.0, 0.0]],
        "chi": [[[1.0, 0.0], [0.0, 0.0]], [[0.0, 0.0], [0.0, 1.0]]],
        "occupation": 1,
        "energy_ion": 0.75
    }"#;

    #[test]
    fn dimer_from_json() {
        let config: ConfigSystem = serde_json::from_str(DIMER).unwrap();
        let mut solver = ScfSolver::try_from(config).unwrap();

        assert_eq!(solver.n_occupied(), 1);
        assert_eq!(solver.chi().shape(), (2, 2, 2));
        assert_relative_eq!(solver.kernel().unwrap(), -0.9, epsilon = 1e-3);
    }

    #[test]
    fn ionic_energy_and_occupation_from_charges() {
        let json = r#"{
            "hamiltonian": [[0.0, -1.0], [-1.0, 0.0]],
            "interaction": [[0.5, 0.2], [0.2, 0.5]],
            "density": [[0.5, 0.0], [0.0, 0.5]],
            "chi": [[[1.0, 0.0], [0.0, 0.0]], [[0.0, 0.0], [0.0, 1.0]]],
            "occupation": { "ionic_charge": 2, "orbitals_per_atom": 2 },
            "energy_ion": { "coordinates": [[0.0, 0.0, 0.0], [0.0, 0.0, 2.0]], "ionic_charge": 1.0 }
        }"#;
        let config: ConfigSystem = serde_json::from_str(json).unwrap();
        let solver = ScfSolver::try_from(config).unwrap();

        assert_eq!(solver.n_occupied(), 1);
        assert_relative_eq!(solver.energy_ion(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn coincident_point_charges_are_rejected() {
        let json = DIMER.replace(
            r#""energy_ion": 0.75"#,
            r#""energy_ion": { "coordinates": [[1.0, 0.0, 0.0], [1.0, 0.0, 0.0]], "ionic_charge": 1.0 }"#,
        );
        let config: ConfigSystem = serde_json::from_str(&json).unwrap();

        assert!(matches!(
            ScfSolver::try_from(config),
            Err(ScfError::CoincidentIons { first: 0, second: 1 })
        ));
    }

    #[test]
    fn ragged_matrix_is_rejected() {
        let json = DIMER.replace("[[0.0, -1.0], [-1.0, 0.0]]", "[[0.0, -1.0], [-1.0]]");
        let config: ConfigSystem = serde_json::from_str(&json).unwrap();

        assert!(matches!(
            ScfSolver::try_from(config),
            Err(ScfError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn options_fall_back_to_defaults() {
        let options: ScfOptions = serde_json::from_str(r#"{ "mixing_fraction": 0.5 }"#).unwrap();

        assert_eq!(
            options,
            ScfOptions {
                mixing_fraction: 0.5,
                ..Default::default()
            }
        );
        assert_eq!(options.max_iterations, 100);
        assert_eq!(options.tolerance, 1e-4);
    }
}
