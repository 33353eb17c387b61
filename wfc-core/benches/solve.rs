use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use wfc_core::{GridTopology, IndexPickerKind, PropagatorOptions, TilePropagator};
use wfc_rules::{DirectionSet, OverlappingModel, PatternModel, Sample, TileMapping};

fn sample_model() -> (PatternModel, TileMapping) {
    let sample = Sample::from_rows(&[
        "........",
        ".##..##.",
        ".#....#.",
        "...##...",
        "...##...",
        ".#....#.",
        ".##..##.",
        "........",
    ])
    .unwrap_or_else(|e| panic!("bench sample: {e}"))
    .periodic(true);
    let mut model = OverlappingModel::new(2, DirectionSet::Cartesian2d)
        .unwrap_or_else(|e| panic!("bench model: {e}"));
    model
        .add_sample(&sample)
        .unwrap_or_else(|e| panic!("bench sample: {e}"));
    model.build().unwrap_or_else(|e| panic!("bench build: {e}"))
}

fn bench_solve(c: &mut Criterion) {
    let (model, mapping) = sample_model();
    let mut group = c.benchmark_group("solve");

    for size in [16usize, 32] {
        group.throughput(Throughput::Elements((size * size) as u64));
        for picker in [IndexPickerKind::Entropy, IndexPickerKind::HeapEntropy] {
            group.bench_with_input(
                BenchmarkId::new(format!("{picker:?}"), format!("{size}x{size}")),
                &size,
                |b, &size| {
                    b.iter(|| {
                        let topology = GridTopology::new_2d(DirectionSet::Cartesian2d, size, size)
                            .with_periodicity(true, true, false);
                        let options = PropagatorOptions::builder()
                            .index_picker(picker)
                            .max_backtrack_depth(64)
                            .seed(42)
                            .build();
                        let mut propagator =
                            TilePropagator::new(model.clone(), mapping.clone(), topology, options)
                                .unwrap_or_else(|e| panic!("bench setup: {e}"));
                        black_box(propagator.run(None))
                    });
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_solve);
criterion_main!(benches);
