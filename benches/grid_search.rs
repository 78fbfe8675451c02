//! Benchmarks for cross-validated grid search.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use landfall::model_selection::GridSearchCV;
use landfall::prelude::*;

fn bench_family_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_search");
    group.sample_size(10);

    let dataset = Dataset::synthetic_binary(90, 6, 2).unwrap();
    let x = dataset.features();
    let y = dataset.labels();

    for family in ClassifierFamily::ALL {
        let search = GridSearchCV::new(family.default_grid(), family.default_folds());
        group.bench_with_input(BenchmarkId::from_parameter(family.name()), &family, |b, f| {
            b.iter(|| search.fit(f, black_box(x), black_box(y)).unwrap());
        });
    }

    group.finish();
}

fn bench_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("model_selector");
    group.sample_size(10);

    let dataset = Dataset::synthetic_binary(90, 6, 2).unwrap();
    for parallel in [false, true] {
        let selector = ModelSelector::new(SelectionConfig::default().with_parallel(parallel));
        group.bench_with_input(BenchmarkId::new("parallel", parallel), &parallel, |b, _| {
            b.iter(|| selector.run(black_box(&dataset)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_family_search, bench_selection);
criterion_main!(benches);
