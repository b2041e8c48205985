use nalgebra::{DMatrix, DVector};

use crate::{
    chi::ChiTensor,
    error::{Result, ScfError},
};

/// Builds the Fock matrix `F = H + 2J - K` for the given density.
///
/// With `V` the interaction matrix and `D` the density,
///
/// ```text
/// J[p,q] = sum_{t,u,r,s} chi[p,q,t] chi[r,s,u] V[t,u] D[r,s]
/// K[p,q] = sum_{t,u,r,s} chi[r,q,t] chi[p,s,u] V[t,u] D[r,s]
/// ```
///
/// The result is symmetric as long as `D` and `V` are symmetric and every chi slice is
/// symmetric in its orbital indices.
pub fn compute_fock_matrix(
    hamiltonian: &DMatrix<f64>,
    interaction: &DMatrix<f64>,
    density: &DMatrix<f64>,
    chi: &ChiTensor,
) -> Result<DMatrix<f64>> {
    check_shapes(hamiltonian, interaction, density, chi)?;

    let coulomb = compute_coulomb_matrix(interaction, density, chi);
    let exchange = compute_exchange_matrix(interaction, density, chi);

    Ok(hamiltonian + 2.0 * coulomb - exchange)
}

/// Validates that `H` is `N x N`, `D` is `N x N`, `chi` is `N x N x M` and `V` is `M x M`.
pub(crate) fn check_shapes(
    hamiltonian: &DMatrix<f64>,
    interaction: &DMatrix<f64>,
    density: &DMatrix<f64>,
    chi: &ChiTensor,
) -> Result<()> {
    let n = hamiltonian.nrows();
    if hamiltonian.ncols() != n {
        return Err(ScfError::dimension(format!(
            "hamiltonian must be square, got {}x{}",
            hamiltonian.nrows(),
            hamiltonian.ncols()
        )));
    }
    if density.shape() != (n, n) {
        return Err(ScfError::dimension(format!(
            "density is {}x{}, hamiltonian is {n}x{n}",
            density.nrows(),
            density.ncols()
        )));
    }

    let (chi_p, chi_q, m) = chi.shape();
    if (chi_p, chi_q) != (n, n) {
        return Err(ScfError::dimension(format!(
            "chi tensor is {chi_p}x{chi_q}x{m}, expected {n}x{n}x{m}"
        )));
    }
    if interaction.shape() != (m, m) {
        return Err(ScfError::dimension(format!(
            "interaction is {}x{}, chi tensor has {m} sites",
            interaction.nrows(),
            interaction.ncols()
        )));
    }

    Ok(())
}

/// `n[u] = sum_{r,s} chi[r,s,u] D[r,s]`, the charge the density puts on each site.
pub(crate) fn site_charges(density: &DMatrix<f64>, chi: &ChiTensor) -> DVector<f64> {
    DVector::from_iterator(
        chi.n_sites(),
        chi.slices().iter().map(|slice| slice.dot(density)),
    )
}

/// Coulomb term `J`. Contracting the density first leaves a site potential `w = V n`, so
/// `J = sum_t w[t] chi[:, :, t]`.
pub(crate) fn compute_coulomb_matrix(
    interaction: &DMatrix<f64>,
    density: &DMatrix<f64>,
    chi: &ChiTensor,
) -> DMatrix<f64> {
    let n = chi.n_orbitals();
    let potential = interaction * site_charges(density, chi);
    log::trace!("site potential: {potential:0.6}");

    chi.slices()
        .iter()
        .zip(potential.iter())
        .fold(DMatrix::<f64>::zeros(n, n), |coulomb, (slice, &w)| {
            coulomb + slice * w
        })
}

/// Exchange term `K`. Writing `chi_t` for the orbital slice at site `t`,
/// `K = sum_u chi_u D^T G_u` with `G_u = sum_t V[t,u] chi_t`.
pub(crate) fn compute_exchange_matrix(
    interaction: &DMatrix<f64>,
    density: &DMatrix<f64>,
    chi: &ChiTensor,
) -> DMatrix<f64> {
    let n = chi.n_orbitals();
    let density_t = density.transpose();
    let mut exchange = DMatrix::zeros(n, n);

    for (u, chi_u) in chi.slices().iter().enumerate() {
        let screened = chi
            .slices()
            .iter()
            .enumerate()
            .fold(DMatrix::<f64>::zeros(n, n), |acc, (t, chi_t)| {
                acc + chi_t * interaction[(t, u)]
            });

        exchange += chi_u * (&density_t * screened);
    }

    exchange
}
