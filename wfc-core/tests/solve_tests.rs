use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use wfc_core::{
    run, ChoiceObserver, GridTopology, IndexPickerKind, ProgressInfo, PropagatorOptions,
    Resolution, RunConfig, TilePropagator, WfcError,
};
use wfc_rules::{DirectionSet, OverlappingModel, Sample, Tile};

/// Vertical stripes repeating every three columns.
fn striped(width: usize, picker: IndexPickerKind, seed: u64) -> TilePropagator {
    let sample = Sample::from_rows(&["aab", "aab", "aab"]).unwrap().periodic(true);
    let mut overlapping = OverlappingModel::new(3, DirectionSet::Cartesian2d).unwrap();
    overlapping.add_sample(&sample).unwrap();
    let (model, mapping) = overlapping.build().unwrap();
    let topology = GridTopology::new_2d(DirectionSet::Cartesian2d, width, 4)
        .with_periodicity(true, true, false);
    TilePropagator::new(
        model,
        mapping,
        topology,
        PropagatorOptions::builder()
            .index_picker(picker)
            .unbounded_backtracking()
            .seed(seed)
            .build(),
    )
    .unwrap()
}

fn assert_period_three(propagator: &TilePropagator) {
    let grid = propagator.to_tile_array();
    for row in grid.rows(0) {
        assert!(row.iter().all(Option::is_some));
        for x in 0..row.len() {
            assert_eq!(row[x], row[(x + 3) % row.len()]);
        }
        let bs = row
            .iter()
            .filter(|t| t.as_ref() == Some(&Tile::from_char('b')))
            .count();
        assert_eq!(bs, row.len() / 3);
    }
}

#[test]
fn overlapping_model_reproduces_stripes() {
    for picker in [
        IndexPickerKind::Entropy,
        IndexPickerKind::HeapEntropy,
        IndexPickerKind::Ordered,
    ] {
        let mut propagator = striped(6, picker, 4);
        let report = run(&mut propagator, &RunConfig::default()).unwrap();
        assert_eq!(propagator.status(), Resolution::Decided, "{picker:?}");
        assert!(report.decisions >= 1);
        assert_period_three(&propagator);
    }
}

#[test]
fn incompatible_width_is_reported_as_contradiction() {
    // Stripes of period three cannot wrap around a width of four.
    let mut propagator = striped(4, IndexPickerKind::Entropy, 1);
    let err = run(&mut propagator, &RunConfig::default()).unwrap_err();
    match err {
        WfcError::Contradiction(reason) => assert_eq!(reason.source, "propagator"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn runner_reports_progress_and_stops_on_signal() {
    let mut propagator = striped(6, IndexPickerKind::Entropy, 2);
    let signal = Arc::new(AtomicBool::new(false));
    let stopper = Arc::clone(&signal);
    let config = RunConfig::builder()
        .shutdown_signal(Arc::clone(&signal))
        .progress_callback(Box::new(move |info: &ProgressInfo| {
            assert_eq!(info.total_cells, 24);
            stopper.store(true, Ordering::Relaxed);
            Ok(())
        }))
        .build();
    let err = run(&mut propagator, &config).unwrap_err();
    assert!(matches!(err, WfcError::Interrupted));
    assert!(signal.load(Ordering::Relaxed));
}

struct Counter(Arc<AtomicUsize>);

impl ChoiceObserver for Counter {
    fn make_choice(&mut self, _index: usize, _pattern: usize) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    fn backtrack(&mut self) {}
}

#[test]
fn observers_see_every_decision() {
    let mut propagator = striped(6, IndexPickerKind::Ordered, 9);
    let choices = Arc::new(AtomicUsize::new(0));
    propagator.add_choice_observer(Box::new(Counter(Arc::clone(&choices))));
    let changes = propagator.create_change_tracker();
    assert_eq!(propagator.take_changes(changes).len(), 24);

    assert_eq!(propagator.step(), Resolution::Undecided);
    assert!(!propagator.take_changes(changes).is_empty());
    assert_eq!(propagator.run(None), Resolution::Decided);
    assert_eq!(choices.load(Ordering::Relaxed) as u64, propagator.stats().decisions);
}

#[test]
fn select_random_within_respects_the_tile_set() {
    let mut propagator = striped(6, IndexPickerKind::Entropy, 5);
    let b = Tile::from_char('b');
    let only_b = propagator.tile_set([&b]).unwrap();
    assert_eq!(propagator.select_random_within(0, &only_b), Resolution::Undecided);
    assert_eq!(propagator.decided_tile(0), Some(&b));
    assert_eq!(propagator.decided_tile(3), Some(&b));
    assert_eq!(propagator.stats().decisions, 1);
}
