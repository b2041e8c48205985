pub mod density;
pub mod fock;
pub(super) mod utils;

use std::fmt;

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

pub use density::compute_density_matrix;
pub use fock::compute_fock_matrix;

use crate::{
    chi::ChiTensor,
    error::{Result, ScfError},
    occupation::Occupation,
};

/// Settings of the damped scf iteration.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScfOptions {
    /// the maximum number of Fock builds before giving up
    pub max_iterations: usize,
    /// weight of the new density when mixing it into the old one. `0` keeps the old
    /// density, `1` replaces it outright.
    pub mixing_fraction: f64,
    /// the iteration stops once the Frobenius norm of the density change drops below this
    pub tolerance: f64,
}

impl Default for ScfOptions {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            mixing_fraction: 0.25,
            tolerance: 1e-4,
        }
    }
}

impl ScfOptions {
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(ScfError::InvalidOption(
                "max_iterations must be at least 1".to_owned(),
            ));
        }
        if !(0.0..=1.0).contains(&self.mixing_fraction) {
            return Err(ScfError::InvalidOption(format!(
                "mixing fraction {} is outside of [0, 1]",
                self.mixing_fraction
            )));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(ScfError::InvalidOption(format!(
                "tolerance {} must be positive and finite",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Raised when the scf cycle runs out of iterations. The matrices of the last iteration
/// are still returned alongside it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ConvergenceWarning {
    pub iterations: usize,
    /// density change of the last iteration
    pub density_change: f64,
    pub tolerance: f64,
}

impl fmt::Display for ConvergenceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "scf cycle didn't converge after {} iterations (density change {:1.4e}, tolerance {:1.4e})",
            self.iterations, self.density_change, self.tolerance
        )
    }
}

/// Result of [`ScfSolver::run_scf_cycle`].
#[derive(Clone, Debug, Serialize)]
#[non_exhaustive]
pub struct ScfCycle {
    /// density of the last diagonalization
    pub density: DMatrix<f64>,
    /// the Fock matrix that density was built from
    pub fock: DMatrix<f64>,
    pub converged: bool,
    /// number of Fock builds performed
    pub iterations: usize,
    /// Frobenius norm of the last density change
    pub density_change: f64,
    pub tolerance: f64,
}

impl ScfCycle {
    /// Returns the warning for a cycle that ran out of iterations.
    pub fn convergence_warning(&self) -> Option<ConvergenceWarning> {
        (!self.converged).then_some(ConvergenceWarning {
            iterations: self.iterations,
            density_change: self.density_change,
            tolerance: self.tolerance,
        })
    }
}

/// The output of a full scf calculation
#[derive(Clone, Debug, Serialize)]
#[non_exhaustive]
pub struct ScfOutput {
    /// `sum_pq (H + F)_pq P_pq`
    pub scf_energy: f64,
    pub energy_ion: f64,
    /// orbital energies of the final Fock matrix, ascending
    pub orbital_energies: Vec<f64>,
    pub converged: bool,
    pub iterations: usize,
}

impl ScfOutput {
    pub fn total_energy(&self) -> f64 {
        self.energy_ion + self.scf_energy
    }
}

/// Owns every matrix of one scf run.
#[derive(Clone, Debug)]
pub struct ScfSolver {
    hamiltonian: DMatrix<f64>,
    interaction: DMatrix<f64>,
    density: DMatrix<f64>,
    chi: ChiTensor,
    energy_ion: f64,
    n_occupied: usize,
    /// `None` until the first Fock build
    fock: Option<DMatrix<f64>>,
    orbital_energies: Option<DVector<f64>>,
    converged: bool,
    /// `energy_ion + E_scf` of the last finished [`ScfSolver::kernel`]
    total_energy: Option<f64>,
}

impl ScfSolver {
    /// Creates a solver from its fixed inputs and an initial density guess.
    ///
    /// `hamiltonian` and `density` are `N x N`, `chi` is `N x N x M` and `interaction` is
    /// `M x M`.
    pub fn new(
        hamiltonian: DMatrix<f64>,
        interaction: DMatrix<f64>,
        density: DMatrix<f64>,
        chi: ChiTensor,
        energy_ion: f64,
        occupation: impl Into<Occupation>,
    ) -> Result<Self> {
        fock::check_shapes(&hamiltonian, &interaction, &density, &chi)?;
        let n_occupied = occupation.into().n_occupied(hamiltonian.nrows())?;

        Ok(Self {
            hamiltonian,
            interaction,
            density,
            chi,
            energy_ion,
            n_occupied,
            fock: None,
            orbital_energies: None,
            converged: false,
            total_energy: None,
        })
    }

    /// Replaces the density guess with one Fock build and diagonalization.
    pub fn initialize(&mut self) -> Result<()> {
        let fock = compute_fock_matrix(
            &self.hamiltonian,
            &self.interaction,
            &self.density,
            &self.chi,
        )?;
        log::debug!("initial fock matrix: {fock:0.4}");

        let (density, orbital_energies) = density::occupied_projection(&fock, self.n_occupied)?;

        self.fock = Some(fock);
        self.density = density;
        self.orbital_energies = Some(orbital_energies);
        self.converged = false;
        self.total_energy = None;
        Ok(())
    }

    /// Runs the damped fixed-point iteration, starting from the current density.
    ///
    /// Running out of iterations is not an error: the last density and Fock matrix are
    /// returned with `converged == false` and a [`ConvergenceWarning`] is logged.
    pub fn run_scf_cycle(&mut self, options: &ScfOptions) -> Result<ScfCycle> {
        options.validate()?;
        let alpha = options.mixing_fraction;

        let mut old_density = self.density.clone();
        let mut iterations = 0;
        let mut density_change = f64::INFINITY;
        self.converged = false;
        self.total_energy = None;

        for iteration in 0..options.max_iterations {
            let fock = compute_fock_matrix(
                &self.hamiltonian,
                &self.interaction,
                &old_density,
                &self.chi,
            )?;
            let (new_density, orbital_energies) =
                density::occupied_projection(&fock, self.n_occupied)?;

            density_change = (&old_density - &new_density).norm();
            iterations = iteration + 1;
            log::info!("iteration {iteration:<4} - density change {density_change:1.4e}");

            self.fock = Some(fock);
            self.density = new_density;
            self.orbital_energies = Some(orbital_energies);

            if density_change < options.tolerance {
                self.converged = true;
                break;
            }

            old_density = &self.density * alpha + old_density * (1.0 - alpha);
        }

        let cycle = ScfCycle {
            density: self.density.clone(),
            fock: self.fock()?.clone(),
            converged: self.converged,
            iterations,
            density_change,
            tolerance: options.tolerance,
        };

        if let Some(warning) = cycle.convergence_warning() {
            log::warn!("{warning}");
        }

        Ok(cycle)
    }

    /// `E_scf = sum_pq (H + F)_pq P_pq` for the current Fock and density matrices.
    pub fn total_energy_scf(&self) -> Result<f64> {
        let fock = self.fock()?;
        Ok((&self.hamiltonian + fock).dot(&self.density))
    }

    /// Runs a full calculation with the default options and returns the total energy.
    pub fn kernel(&mut self) -> Result<f64> {
        self.kernel_with(&ScfOptions::default())
            .map(|output| output.total_energy())
    }

    /// Initializes, iterates to self-consistency and evaluates the energy.
    pub fn kernel_with(&mut self, options: &ScfOptions) -> Result<ScfOutput> {
        self.initialize()?;
        let cycle = self.run_scf_cycle(options)?;
        let scf_energy = self.total_energy_scf()?;

        let output = ScfOutput {
            scf_energy,
            energy_ion: self.energy_ion,
            orbital_energies: self
                .orbital_energies
                .as_ref()
                .map(|energies| energies.as_slice().to_vec())
                .unwrap_or_default(),
            converged: cycle.converged,
            iterations: cycle.iterations,
        };

        log::info!(
            "scf energy {scf_energy:1.6}, ionic energy {:1.6}, total energy {:1.6}",
            self.energy_ion,
            output.total_energy()
        );
        self.total_energy = Some(output.total_energy());
        Ok(output)
    }

    pub fn hamiltonian(&self) -> &DMatrix<f64> {
        &self.hamiltonian
    }

    pub fn interaction(&self) -> &DMatrix<f64> {
        &self.interaction
    }

    pub fn chi(&self) -> &ChiTensor {
        &self.chi
    }

    pub fn density(&self) -> &DMatrix<f64> {
        &self.density
    }

    /// The latest Fock matrix. Fails before the first Fock build.
    pub fn fock(&self) -> Result<&DMatrix<f64>> {
        self.fock.as_ref().ok_or(ScfError::State("fock matrix"))
    }

    pub fn orbital_energies(&self) -> Option<&DVector<f64>> {
        self.orbital_energies.as_ref()
    }

    pub fn energy_ion(&self) -> f64 {
        self.energy_ion
    }

    pub fn n_occupied(&self) -> usize {
        self.n_occupied
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    /// The total energy of the last [`ScfSolver::kernel`] run.
    pub fn total_energy(&self) -> Result<f64> {
        self.total_energy.ok_or(ScfError::State("total energy"))
    }
}
