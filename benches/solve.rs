//! Solve Benchmarks
//!
//! Measures one full solve call per strategy, from validation to the finished report:
//!
//! - **Fast path**: fully known forces, numeric sums only
//! - **Closed form**: a single unknown force, and an unknown resultant
//! - **General, analytic**: two unknowns without a closed form, which includes JIT
//!   compilation of the residual system used to verify the roots
//! - **General, iterative**: an underdetermined system solved by multi-start Gauss–Newton
//!
//! A second group measures the JIT-compiled residual system alone: compilation time and
//! evaluation of the residuals and the Jacobian.
//!
//! ## Usage
//!
//! Run with: `cargo bench --bench solve`

use std::hint::black_box;

use concurrent_forces::equations::ForceBalance;
use concurrent_forces::prelude::*;
use concurrent_forces::unknowns::UnknownSet;
use concurrent_forces::EquationSystem;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

fn scenarios() -> Vec<(&'static str, Vec<Force>, Option<(Field, Field)>)> {
    vec![
        (
            "fast_path",
            vec![
                Force::known(10.0, 0.0),
                Force::known(10.0, 120.0),
                Force::known(10.0, 240.0),
            ],
            None,
        ),
        (
            "closed_form_force",
            vec![
                Force::known(10.0, 0.0),
                Force::known(10.0, 90.0),
                Force::unknown(),
            ],
            None,
        ),
        (
            "closed_form_resultant",
            vec![Force::known(3.0, 0.0), Force::known(4.0, 90.0)],
            Some((Field::Unknown, Field::Unknown)),
        ),
        (
            "general_two_angles",
            vec![
                Force::known(5.0, 180.0),
                Force::new(3.0, Field::Unknown),
                Force::new(4.0, Field::Unknown),
            ],
            None,
        ),
        (
            "general_underdetermined",
            vec![
                Force::known(10.0, 0.0),
                Force::new(Field::Unknown, 90.0),
                Force::unknown(),
            ],
            None,
        ),
    ]
}

fn benchmark_solve(c: &mut Criterion) {
    let mut group = c.benchmark_group("solve");
    let solver = Solver::default();

    for (name, forces, resultant) in scenarios() {
        group.bench_with_input(BenchmarkId::new("report", name), &forces, |b, forces| {
            b.iter(|| match resultant {
                Some((magnitude, angle)) => {
                    black_box(solver.solve_resultant(black_box(forces), magnitude, angle));
                }
                None => {
                    black_box(solver.solve_equilibrium(black_box(forces)));
                }
            })
        });
    }

    group.finish();
}

fn underdetermined_balance() -> (UnknownSet, ForceBalance) {
    let forces = [
        Force::known(10.0, 0.0),
        Force::new(Field::Unknown, 90.0),
        Force::unknown(),
    ];
    let unknowns = UnknownSet::classify(&forces, None).unwrap();
    let balance = ForceBalance::build(&forces, None, &unknowns);
    (unknowns, balance)
}

fn benchmark_residual_system(c: &mut Criterion) {
    let mut group = c.benchmark_group("residual_system");
    let (unknowns, balance) = underdetermined_balance();
    let residuals = balance.residuals();
    let names = unknowns.names();

    group.bench_function("compile", |b| {
        b.iter(|| black_box(EquationSystem::from_exprs(black_box(&residuals), &names).unwrap()))
    });

    let system = EquationSystem::from_exprs(&residuals, &names).unwrap();
    let point = [5.0, 10.0, 2.5];
    let mut results = vec![0.0; system.num_equations()];

    group.bench_function("eval", |b| {
        b.iter(|| {
            system
                .eval_into(black_box(&point), &mut results)
                .unwrap();
        })
    });

    group.bench_function("jacobian", |b| {
        b.iter(|| black_box(system.jacobian(black_box(&point)).unwrap()))
    });

    group.finish();
}

criterion_group!(benches, benchmark_solve, benchmark_residual_system);
criterion_main!(benches);
