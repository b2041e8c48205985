use nalgebra::{DMatrix, DVector};

use super::utils;
use crate::error::{Result, ScfError};

/// Builds the density matrix `P = C C^T`, where the columns of `C` are the eigenvectors
/// belonging to the `n_occupied` lowest eigenvalues of `fock`.
///
/// The trace of the result is `n_occupied`.
pub fn compute_density_matrix(fock: &DMatrix<f64>, n_occupied: usize) -> Result<DMatrix<f64>> {
    occupied_projection(fock, n_occupied).map(|(density, _)| density)
}

/// Like [`compute_density_matrix`], but also hands back all orbital energies in ascending
/// order.
pub(crate) fn occupied_projection(
    fock: &DMatrix<f64>,
    n_occupied: usize,
) -> Result<(DMatrix<f64>, DVector<f64>)> {
    let n = fock.nrows();
    if fock.ncols() != n {
        return Err(ScfError::dimension(format!(
            "fock matrix must be square, got {}x{}",
            fock.nrows(),
            fock.ncols()
        )));
    }
    check_occupation(n_occupied, n)?;

    let (coefficients, orbital_energies) = utils::sorted_eigs(fock.clone())?;
    let occupied = coefficients.columns(0, n_occupied);

    Ok((&occupied * occupied.transpose(), orbital_energies))
}

pub(crate) fn check_occupation(n_occupied: usize, n_orbitals: usize) -> Result<()> {
    if n_occupied == 0 || n_occupied > n_orbitals {
        return Err(ScfError::dimension(format!(
            "cannot occupy {n_occupied} of {n_orbitals} orbitals"
        )));
    }
    Ok(())
}
