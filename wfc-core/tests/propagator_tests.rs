use wfc_core::{
    GridTopology, PropagatorOptions, Resolution, TilePropagator, WavePropagator,
};
use wfc_rules::{AdjacentModel, DirectionSet, PatternModel, Tile};

fn all_compatible(patterns: usize) -> PatternModel {
    let all: Vec<usize> = (0..patterns).collect();
    let table = (0..patterns).map(|_| vec![all.clone(); 4]).collect();
    PatternModel::new(DirectionSet::Cartesian2d, table, vec![1.0; patterns]).unwrap()
}

/// Patterns 0 and 1 mix freely; pattern 2 only sits next to itself.
fn isolated_third() -> PatternModel {
    let mixed = vec![0, 1];
    let table = vec![
        vec![mixed.clone(); 4],
        vec![mixed; 4],
        vec![vec![2]; 4],
    ];
    PatternModel::new(DirectionSet::Cartesian2d, table, vec![1.0, 1.0, 1.0]).unwrap()
}

/// Horizontal two-colouring: `x` and `y` must alternate along the x axis.
fn alternating() -> PatternModel {
    let table = vec![
        vec![vec![1], vec![1], vec![0, 1], vec![0, 1]],
        vec![vec![0], vec![0], vec![0, 1], vec![0, 1]],
    ];
    PatternModel::new(DirectionSet::Cartesian2d, table, vec![1.0, 1.0]).unwrap()
}

fn assert_counts_match(propagator: &TilePropagator) {
    let wave = propagator.wave();
    for cell in 0..wave.cell_count() {
        assert_eq!(wave.count(cell), wave.possibilities(cell).count_ones());
    }
}

#[test]
fn periodic_square_solves_without_propagated_bans() {
    let topology =
        GridTopology::new_2d(DirectionSet::Cartesian2d, 2, 2).with_periodicity(true, true, false);
    let mut propagator = TilePropagator::from_patterns(
        all_compatible(2),
        topology,
        PropagatorOptions::builder().seed(11).build(),
    )
    .unwrap();
    assert_eq!(propagator.stats().bans, 0);

    assert_eq!(propagator.run(None), Resolution::Decided);
    let stats = propagator.stats();
    assert_eq!(stats.decisions, 4);
    // Each decision bans only the other pattern in its own cell.
    assert_eq!(stats.bans, stats.decisions);
    assert_eq!(stats.backtracks, 0);
    assert_counts_match(&propagator);
}

#[test]
fn selecting_a_pattern_bans_the_isolated_one_from_neighbours() {
    let topology = GridTopology::new_2d(DirectionSet::Cartesian2d, 3, 3);
    let mut propagator =
        WavePropagator::new(isolated_third(), topology, &PropagatorOptions::default()).unwrap();
    let mut only_first = bitvec::bitvec![0; 3];
    only_first.set(0, true);
    assert_eq!(propagator.select(4, &only_first), Resolution::Undecided);
    for neighbour in [1, 3, 5, 7] {
        assert!(!propagator.wave().get(neighbour, 2));
        assert_eq!(propagator.wave().count(neighbour), 2);
    }
    // The closure reaches every cell, not just direct neighbours.
    assert!(!propagator.wave().get(0, 2));
}

#[test]
fn odd_ring_fails_after_backtracking() {
    let topology =
        GridTopology::new_2d(DirectionSet::Cartesian2d, 3, 1).with_periodicity(true, false, false);
    let mut propagator = TilePropagator::from_patterns(
        alternating(),
        topology,
        PropagatorOptions::builder()
            .unbounded_backtracking()
            .seed(3)
            .build(),
    )
    .unwrap();
    assert_eq!(propagator.run(None), Resolution::Contradiction);
    assert_eq!(propagator.stats().backtracks, 1);
    assert_eq!(propagator.contradiction().unwrap().source, "propagator");
}

#[test]
fn odd_ring_fails_immediately_without_backtracking() {
    let topology =
        GridTopology::new_2d(DirectionSet::Cartesian2d, 3, 1).with_periodicity(true, false, false);
    let mut propagator = TilePropagator::from_patterns(
        alternating(),
        topology,
        PropagatorOptions::builder().seed(3).build(),
    )
    .unwrap();
    assert_eq!(propagator.step(), Resolution::Contradiction);
    assert_eq!(propagator.stats().backtracks, 0);
    assert_eq!(propagator.propagator().backtrack_depth(), 0);
}

#[test]
fn even_ring_alternates() {
    let topology =
        GridTopology::new_2d(DirectionSet::Cartesian2d, 6, 2).with_periodicity(true, false, false);
    let mut propagator = TilePropagator::from_patterns(
        alternating(),
        topology,
        PropagatorOptions::builder().seed(5).build(),
    )
    .unwrap();
    assert_eq!(propagator.run(None), Resolution::Decided);
    let grid = propagator.to_tile_array();
    for row in grid.rows(0) {
        for pair in row.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }
}

#[test]
fn masked_cells_stay_undecided() {
    let mut mask = vec![true; 9];
    mask[4] = false;
    let topology = GridTopology::new_2d(DirectionSet::Cartesian2d, 3, 3)
        .with_mask(mask)
        .unwrap();
    let mut propagator = TilePropagator::from_patterns(
        all_compatible(3),
        topology,
        PropagatorOptions::builder().seed(8).build(),
    )
    .unwrap();
    assert_eq!(propagator.run(None), Resolution::Decided);
    assert_eq!(propagator.progress(), (8, 8));
    let grid = propagator.to_tile_array();
    assert_eq!(grid.get(1, 1, 0), Some(&None));
    assert!(grid.get(0, 0, 0).unwrap().is_some());
}

#[test]
fn user_bans_are_not_backtracked() {
    let mut model = AdjacentModel::new(DirectionSet::Cartesian2d);
    let (a, b) = (Tile::from_char('a'), Tile::from_char('b'));
    for direction in 0..4 {
        model.add_adjacency(&a, &a, direction).unwrap();
        model.add_adjacency(&b, &b, direction).unwrap();
    }
    let (model, mapping) = model.build().unwrap();
    let topology = GridTopology::new_2d(DirectionSet::Cartesian2d, 3, 1);
    let mut propagator = TilePropagator::new(
        model,
        mapping,
        topology,
        PropagatorOptions::builder().unbounded_backtracking().build(),
    )
    .unwrap();
    assert_eq!(propagator.select_tile(0, &a).unwrap(), Resolution::Undecided);
    assert_eq!(propagator.possible_tiles(2), vec![a.clone()]);
    assert_eq!(propagator.select_tile(2, &b).unwrap(), Resolution::Contradiction);
    assert_eq!(propagator.stats().backtracks, 0);
    // Contradictions are sticky until the propagator is reinitialized.
    assert_eq!(propagator.step(), Resolution::Contradiction);
    assert_eq!(propagator.initialize().unwrap(), Resolution::Undecided);
    assert_eq!(propagator.possible_tiles(2), vec![a, b]);
}

#[test]
fn reweighting_steers_choices() {
    let topology = GridTopology::new_2d(DirectionSet::Cartesian2d, 4, 4);
    let mut propagator = TilePropagator::from_patterns(
        all_compatible(2),
        topology,
        PropagatorOptions::builder().seed(21).build(),
    )
    .unwrap();
    propagator.reweight_pattern(0, 1e-9).unwrap();
    propagator.reweight_pattern(1, 1e9).unwrap();
    assert!(propagator.reweight_pattern(1, -1.0).is_err());
    assert_eq!(propagator.run(None), Resolution::Decided);
    let ones = (0..16)
        .filter(|&cell| propagator.wave().decided_pattern(cell) == Some(1))
        .count();
    assert_eq!(ones, 16);
}
