use nalgebra::{DMatrix, DVector, SymmetricEigen};

use crate::error::{Result, ScfError};

/// upper bound on the number of QR sweeps of the eigensolver
const MAX_EIGEN_ITERATIONS: usize = 10_000;

pub(super) fn eigs(matrix: DMatrix<f64>) -> Result<(DMatrix<f64>, DVector<f64>)> {
    let size = matrix.nrows();
    let eigs = SymmetricEigen::try_new(matrix, f64::EPSILON, MAX_EIGEN_ITERATIONS)
        .ok_or(ScfError::NonConvergentEigensolver { size })?;
    Ok((eigs.eigenvectors, eigs.eigenvalues))
}

/// Symmetric eigendecomposition with the eigenpairs sorted by ascending eigenvalue.
pub(super) fn sorted_eigs(matrix: DMatrix<f64>) -> Result<(DMatrix<f64>, DVector<f64>)> {
    let size = matrix.nrows();
    if matrix.iter().any(|entry| !entry.is_finite()) {
        return Err(ScfError::NonConvergentEigensolver { size });
    }

    let (eigenvectors, eigenvalues) = eigs(matrix)?;

    let mut val_vec_pairs = eigenvalues
        .iter()
        .copied()
        .zip(eigenvectors.column_iter())
        .collect::<Vec<_>>();

    val_vec_pairs.sort_unstable_by(|(a, _), (b, _)| a.total_cmp(b));

    let (values, vectors): (Vec<_>, Vec<_>) = val_vec_pairs.into_iter().unzip();

    if vectors.is_empty() {
        return Ok((DMatrix::zeros(size, 0), DVector::zeros(0)));
    }

    Ok((
        DMatrix::from_columns(&vectors),
        DVector::from_column_slice(&values),
    ))
}
