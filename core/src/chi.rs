use std::ops::Index;

use nalgebra::DMatrix;

use crate::error::{Result, ScfError};

/// The rank-3 tensor `chi[p, q, t]` that maps a pair of orbitals `(p, q)` onto the
/// interaction site `t`.
///
/// The tensor is stored as one `N x N` orbital matrix per site, so the Fock builder
/// can contract whole slices with matrix products instead of walking the tensor element
/// by element.
#[derive(Clone, Debug, PartialEq)]
pub struct ChiTensor {
    slices: Vec<DMatrix<f64>>,
    /// number of orbitals (first two axes)
    n_orbitals: usize,
}

impl ChiTensor {
    /// Builds a tensor of shape `n_orbitals x n_orbitals x n_sites` by evaluating `func`
    /// at every `(p, q, t)`.
    pub fn from_fn(
        n_orbitals: usize,
        n_sites: usize,
        mut func: impl FnMut(usize, usize, usize) -> f64,
    ) -> Self {
        let slices = (0..n_sites)
            .map(|t| DMatrix::from_fn(n_orbitals, n_orbitals, |p, q| func(p, q, t)))
            .collect();

        Self { slices, n_orbitals }
    }

    pub fn zeros(n_orbitals: usize, n_sites: usize) -> Self {
        Self::from_fn(n_orbitals, n_sites, |_, _, _| 0.0)
    }

    /// Builds a tensor from one `N x N` slice per site. All slices must share the same
    /// square shape.
    pub fn from_slices(slices: Vec<DMatrix<f64>>) -> Result<Self> {
        let n_orbitals = slices.first().map_or(0, |slice| slice.nrows());

        for (site, slice) in slices.iter().enumerate() {
            if slice.shape() != (n_orbitals, n_orbitals) {
                return Err(ScfError::dimension(format!(
                    "chi slice for site {site} is {}x{}, expected {n_orbitals}x{n_orbitals}",
                    slice.nrows(),
                    slice.ncols()
                )));
            }
        }

        Ok(Self { slices, n_orbitals })
    }

    /// Builds a tensor from a row-major `[p][q][t]` nested vector, the layout a
    /// configuration file naturally has.
    pub fn from_nested(nested: &[Vec<Vec<f64>>]) -> Result<Self> {
        let n_orbitals = nested.len();
        let n_sites = nested
            .first()
            .and_then(|row| row.first())
            .map_or(0, Vec::len);

        for (p, row) in nested.iter().enumerate() {
            if row.len() != n_orbitals {
                return Err(ScfError::dimension(format!(
                    "chi row {p} has {} entries, expected {n_orbitals}",
                    row.len()
                )));
            }
            if let Some(q) = row.iter().position(|sites| sites.len() != n_sites) {
                return Err(ScfError::dimension(format!(
                    "chi[{p}][{q}] has {} sites, expected {n_sites}",
                    row[q].len()
                )));
            }
        }

        Ok(Self::from_fn(n_orbitals, n_sites, |p, q, t| nested[p][q][t]))
    }

    /// Returns `(N, N, M)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.n_orbitals, self.n_orbitals, self.slices.len())
    }

    pub fn n_orbitals(&self) -> usize {
        self.n_orbitals
    }

    pub fn n_sites(&self) -> usize {
        self.slices.len()
    }

    /// The orbital matrix `chi[:, :, site]`
    pub fn slice(&self, site: usize) -> &DMatrix<f64> {
        &self.slices[site]
    }

    pub fn slices(&self) -> &[DMatrix<f64>] {
        &self.slices
    }
}

impl Index<(usize, usize, usize)> for ChiTensor {
    type Output = f64;

    fn index(&self, (p, q, t): (usize, usize, usize)) -> &Self::Output {
        &self.slices[t][(p, q)]
    }
}
