//! Random example datasets for tests and benchmarks.

use itertools::Itertools;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use strata_dtype::Shape;
use strata_error::StrataExpect;
use strata_io::{InMemoryDataset, InMemoryGroup};

use crate::{CscMatrix, DenseArray};

/// A dense `f64` dataset of caller-order `shape` where roughly `density` of the values are
/// non-zero, together with its expected materialization.
///
/// `chunks`, in caller order, declares a chunked layout.
pub fn example_dense(
    shape: &[usize],
    density: f64,
    chunks: Option<&[usize]>,
    seed: u64,
) -> (InMemoryDataset, DenseArray<f64>) {
    let shape = Shape::from(shape);
    let mut rng = StdRng::seed_from_u64(seed);
    let values = (0..shape.len())
        .map(|_| random_value(&mut rng, density))
        .collect_vec();

    // First-axis-fastest in caller order is row-major in disk order.
    let mut dataset = InMemoryDataset::try_new(shape.reversed(), &values)
        .strata_expect("value count matches shape");
    if let Some(chunks) = chunks {
        let disk_chunks = chunks.iter().rev().copied().collect_vec();
        dataset = dataset
            .with_chunks(disk_chunks)
            .strata_expect("chunk shape matches dataset");
    }
    let expected = DenseArray::try_new(shape, values).strata_expect("value count matches shape");
    (dataset, expected)
}

/// A sparse `f64` matrix group of `nrows x ncols` where roughly `density` of the entries are
/// stored, together with its expected materialization.
pub fn example_sparse(
    nrows: usize,
    ncols: usize,
    density: f64,
    seed: u64,
) -> (InMemoryGroup, CscMatrix<f64>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut indptr = vec![0];
    let mut indices = Vec::new();
    let mut data = Vec::new();
    for _ in 0..ncols {
        for row in 0..nrows {
            if rng.random_bool(density) {
                indices.push(row);
                data.push(nonzero(&mut rng));
            }
        }
        indptr.push(data.len());
    }

    let group = InMemoryGroup::from_csc(nrows, ncols, &indptr, &indices, &data);
    let expected = CscMatrix::try_new(nrows, ncols, indptr, indices, data)
        .strata_expect("generated triple is well formed");
    (group, expected)
}

fn random_value(rng: &mut StdRng, density: f64) -> f64 {
    if rng.random_bool(density) {
        nonzero(rng)
    } else {
        0.0
    }
}

fn nonzero(rng: &mut StdRng) -> f64 {
    rng.random_range(0.5..100.0)
}
