use serde::Deserialize;

use crate::{
    error::{Result, ScfError},
    scf::density::check_occupation,
};

/// How many orbitals the density matrix occupies.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Occupation {
    /// A fixed number of occupied orbitals.
    Orbitals(usize),
    /// Every atom contributes `ionic_charge` electrons in pairs, spread over
    /// `orbitals_per_atom` orbitals.
    IonicCharge {
        ionic_charge: usize,
        orbitals_per_atom: usize,
    },
}

impl Occupation {
    /// Returns the number of occupied orbitals for a system with `n_orbitals` orbitals.
    pub fn n_occupied(&self, n_orbitals: usize) -> Result<usize> {
        let n_occupied = match *self {
            Occupation::Orbitals(n_occupied) => n_occupied,
            Occupation::IonicCharge {
                ionic_charge,
                orbitals_per_atom,
            } => {
                if orbitals_per_atom == 0 {
                    0
                } else {
                    (ionic_charge / 2)
                        .checked_mul(n_orbitals)
                        .ok_or_else(|| {
                            ScfError::dimension(format!(
                                "ionic charge {ionic_charge} overflows the occupation of {n_orbitals} orbitals"
                            ))
                        })?
                        / orbitals_per_atom
                }
            }
        };

        check_occupation(n_occupied, n_orbitals)?;
        log::debug!("{n_occupied} of {n_orbitals} orbitals occupied");
        Ok(n_occupied)
    }
}

impl From<usize> for Occupation {
    fn from(n_occupied: usize) -> Self {
        Self::Orbitals(n_occupied)
    }
}
