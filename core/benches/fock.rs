use std::error::Error;

use criterion::{criterion_group, criterion_main, Criterion};
use nalgebra::DMatrix;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tbscf::{
    chi::ChiTensor,
    occupation::Occupation,
    scf::{compute_density_matrix, compute_fock_matrix, ScfOptions, ScfSolver},
};

/// A random system with `n_orbitals` orbitals spread over `n_sites` sites
struct TestInstance {
    name: String,
    hamiltonian: DMatrix<f64>,
    interaction: DMatrix<f64>,
    density: DMatrix<f64>,
    chi: ChiTensor,
}

impl TestInstance {
    fn random(n_orbitals: usize, n_sites: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut symmetric = |n: usize, scale: f64| {
            let m = DMatrix::from_fn(n, n, |_, _| rng.gen_range(-scale..scale));
            (&m + m.transpose()) * 0.5
        };

        let hamiltonian = symmetric(n_orbitals, 1.0);
        let interaction = symmetric(n_sites, 0.1);
        let slices = (0..n_sites).map(|_| symmetric(n_orbitals, 0.5)).collect();
        let density = DMatrix::identity(n_orbitals, n_orbitals) * 0.5;

        Self {
            name: format!("{n_orbitals}x{n_orbitals}x{n_sites}"),
            hamiltonian,
            interaction,
            density,
            chi: ChiTensor::from_slices(slices).expect("slices share one shape"),
        }
    }
}

fn bench_fock(c: &mut Criterion, instances: &[TestInstance]) {
    for instance in instances {
        c.bench_function(&format!("Fock {}", instance.name), |b| {
            b.iter(|| {
                compute_fock_matrix(
                    &instance.hamiltonian,
                    &instance.interaction,
                    &instance.density,
                    &instance.chi,
                )
            })
        });
    }
}

fn bench_density(c: &mut Criterion, instances: &[TestInstance]) {
    for instance in instances {
        let n_occupied = instance.hamiltonian.nrows() / 2;

        c.bench_function(&format!("Density {}", instance.name), |b| {
            b.iter(|| compute_density_matrix(&instance.hamiltonian, n_occupied))
        });
    }
}

fn bench_cycle(c: &mut Criterion, instances: &[TestInstance]) -> Result<(), Box<dyn Error>> {
    let options = ScfOptions {
        max_iterations: 10,
        ..Default::default()
    };

    for instance in instances {
        let solver = ScfSolver::new(
            instance.hamiltonian.clone(),
            instance.interaction.clone(),
            instance.density.clone(),
            instance.chi.clone(),
            0.0,
            Occupation::Orbitals(instance.hamiltonian.nrows() / 2),
        )?;

        c.bench_function(&format!("10 SCF iterations {}", instance.name), |b| {
            b.iter(|| solver.clone().run_scf_cycle(&options))
        });
    }

    Ok(())
}

fn bench_scf(c: &mut Criterion) {
    let instances = [
        TestInstance::random(8, 2, 1),
        TestInstance::random(32, 8, 2),
        TestInstance::random(64, 16, 3),
    ];

    bench_fock(c, &instances);
    bench_density(c, &instances);
    bench_cycle(c, &instances).unwrap();
}

criterion_group!(benches, bench_scf);
criterion_main!(benches);
