#![allow(clippy::unwrap_used)]

use divan::Bencher;
use rand::prelude::StdRng;
use rand::{Rng, SeedableRng};
use strata_array::test_harness::example_dense;
use strata_array::{AxisSelection, BlockPlanner, ExtractOptions, LazyArray, ViewArena};

fn main() {
    divan::main();
}

fn random_positions(len: usize, extent: usize) -> Vec<usize> {
    let mut rng = StdRng::seed_from_u64(0);
    (0..len).map(|_| rng.random_range(0..extent)).collect()
}

#[divan::bench(args = [16, 256, 4096])]
fn plan_scattered_axis(bencher: Bencher, block: usize) {
    let selection = AxisSelection::from(random_positions(10_000, 1_000_000));
    bencher.bench(|| BlockPlanner::plan_axis(&selection, 1_000_000, block));
}

#[divan::bench]
fn plan_contiguous_axis(bencher: Bencher) {
    let selection = AxisSelection::Slice(1_000..900_000);
    bencher.bench(|| BlockPlanner::plan_axis(&selection, 1_000_000, 256));
}

#[divan::bench(args = [8, 64, 512])]
fn extract_dense_view(bencher: Bencher, block: usize) {
    let (ds, _) = example_dense(&[512, 512], 0.5, Some(&[64, 64][..]), 0);
    let mut arena = ViewArena::new(LazyArray::try_new_dense(ds).unwrap());
    let view = arena
        .subset(
            arena.root(),
            &[
                AxisSelection::from(random_positions(200, 512)),
                AxisSelection::Slice(100..400),
            ],
        )
        .unwrap();
    let options = ExtractOptions::default().with_block_shape([block, block]);
    bencher.bench(|| arena.extract_dense::<f64>(view, &options).unwrap());
}
