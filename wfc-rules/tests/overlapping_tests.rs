use proptest::prelude::*;
use wfc_rules::{
    DirectionSet, OverlappingModel, RotationGroup, Sample, Tile, TileRotation,
    TileRotationTreatment,
};

fn assert_symmetric(model: &wfc_rules::PatternModel) {
    let directions = model.directions();
    for p in 0..model.pattern_count() {
        for d in directions.directions() {
            for &q in model.compatible(p, d) {
                assert!(
                    model.is_compatible(q, p, directions.inverse(d)),
                    "{p} -> {q} in {d} without reverse"
                );
            }
        }
    }
}

#[test]
fn stripes_only_continue_stripes() {
    // Vertical stripes: columns alternate between 'a' and 'b'.
    let sample = Sample::from_rows(&["ab", "ab"]).unwrap().periodic(true);
    let mut builder = OverlappingModel::new(2, DirectionSet::Cartesian2d).unwrap();
    builder.add_sample(&sample).unwrap();
    let (model, mapping) = builder.build().unwrap();
    assert_eq!(model.pattern_count(), 2);

    let a = mapping.patterns_of(&Tile::from_char('a')).unwrap().first_one().unwrap();
    let b = mapping.patterns_of(&Tile::from_char('b')).unwrap().first_one().unwrap();
    // Left to right the stripes alternate, top to bottom they repeat.
    assert_eq!(model.compatible(a, 0), &[b]);
    assert_eq!(model.compatible(a, 2), &[a]);
    assert_symmetric(&model);
}

#[test]
fn rotations_add_transposed_patterns() {
    let sample = Sample::from_rows(&["ab", "ab"]).unwrap().periodic(true);
    let rotation = TileRotation::uniform(
        RotationGroup::new(4, false).unwrap(),
        TileRotationTreatment::Unchanged,
    );
    let mut builder = OverlappingModel::new(2, DirectionSet::Cartesian2d)
        .unwrap()
        .with_rotations(rotation)
        .unwrap();
    builder.add_sample(&sample).unwrap();
    // Vertical stripes plus their horizontal counterparts.
    assert_eq!(builder.pattern_count(), 4);
    let (model, _) = builder.build().unwrap();
    assert_symmetric(&model);
}

#[test]
fn missing_rotations_are_skipped() {
    let sample = Sample::from_rows(&["ab", "ab"]).unwrap().periodic(true);
    let rotation = TileRotation::uniform(
        RotationGroup::new(4, false).unwrap(),
        TileRotationTreatment::Missing,
    );
    let mut builder = OverlappingModel::new(2, DirectionSet::Cartesian2d)
        .unwrap()
        .with_rotations(rotation)
        .unwrap();
    builder.add_sample(&sample).unwrap();
    assert_eq!(builder.pattern_count(), 2);
}

#[test]
fn three_dimensional_windows() {
    let layers = vec![
        vec![vec![Tile::Value(0), Tile::Value(1)]],
        vec![vec![Tile::Value(1), Tile::Value(0)]],
    ];
    let sample = Sample::from_layers(layers).unwrap().periodic(true);
    let mut builder = OverlappingModel::new(1, DirectionSet::Cartesian3d).unwrap();
    builder.add_sample(&sample).unwrap();
    let (model, _) = builder.build().unwrap();
    assert_eq!(model.pattern_count(), 2);
    assert_eq!(model.frequencies(), &[2.0, 2.0]);
    // With n = 1 nothing overlaps, so everything is compatible.
    assert_eq!(model.compatible(0, 4), &[0, 1]);
}

fn sample_rows() -> impl Strategy<Value = Vec<String>> {
    (2usize..5, 2usize..5).prop_flat_map(|(w, h)| {
        prop::collection::vec(prop::collection::vec(prop::sample::select(vec!['a', 'b', 'c']), w), h)
            .prop_map(|rows| rows.into_iter().map(|r| r.into_iter().collect()).collect())
    })
}

proptest! {
    #[test]
    fn compatibility_is_always_symmetric(rows in sample_rows(), periodic in any::<bool>(), n in 1usize..3) {
        let sample = Sample::from_rows(&rows).unwrap().periodic(periodic);
        let mut builder = OverlappingModel::new(n, DirectionSet::Cartesian2d).unwrap();
        builder.add_sample(&sample).unwrap();
        let (model, mapping) = builder.build().unwrap();
        prop_assert_eq!(mapping.pattern_count(), model.pattern_count());
        let total: f64 = model.frequencies().iter().sum();
        prop_assert!(total >= 1.0);
        assert_symmetric(&model);
    }
}
