use std::collections::HashSet;

use countymander::{
    Error, PipelineConfig, Redistricter, UnitRecord, UnitRegistry, Warning, write_assignments_csv,
};

fn redistricter(records: Vec<UnitRecord>, config: PipelineConfig) -> Redistricter {
    let registry = UnitRegistry::from_records(records).unwrap();
    Redistricter::new(registry, config).unwrap()
}

fn config(num_districts: usize) -> PipelineConfig {
    PipelineConfig { time_limit_secs: Some(60.0), ..PipelineConfig::new(num_districts) }
}

/// `rows` x `cols` rook-adjacent grid with unit ids "r{row}c{col}".
fn grid(rows: usize, cols: usize, population: impl Fn(usize, usize) -> i64) -> Vec<UnitRecord> {
    let id = |r: usize, c: usize| format!("r{r}c{c}");
    (0..rows).flat_map(|r| (0..cols).map(move |c| (r, c)))
        .map(|(r, c)| {
            let mut neighbors = Vec::new();
            if r > 0 { neighbors.push(id(r - 1, c)) }
            if r + 1 < rows { neighbors.push(id(r + 1, c)) }
            if c > 0 { neighbors.push(id(r, c - 1)) }
            if c + 1 < cols { neighbors.push(id(r, c + 1)) }
            UnitRecord {
                id: id(r, c),
                name: format!("Unit {r}-{c}"),
                population: population(r, c),
                neighbor_ids: neighbors,
                centroid: None,
            }
        })
        .collect()
}

#[test]
fn triangle_gives_each_unit_its_own_district() {
    let pipeline = redistricter(vec![
        UnitRecord::new("A", "Alpha", 100, &["B", "C"]),
        UnitRecord::new("B", "Beta", 100, &["A", "C"]),
        UnitRecord::new("C", "Gamma", 100, &["A", "B"]),
    ], config(3));

    let outcome = pipeline.run().unwrap();
    let summary = outcome.summary(pipeline.registry());

    assert!(outcome.is_optimal());
    assert_eq!(summary.total_deviation(outcome.bounds.target), 0);
    assert!(summary.districts.iter().all(|d| d.num_members() == 1 && d.total_population == 100));
    assert!(summary.unassigned.is_empty());
}

#[test]
fn line_of_four_splits_in_the_middle() {
    let pipeline = redistricter(vec![
        UnitRecord::new("A", "Alpha", 50, &["B"]),
        UnitRecord::new("B", "Beta", 50, &["A", "C"]),
        UnitRecord::new("C", "Gamma", 50, &["B", "D"]),
        UnitRecord::new("D", "Delta", 50, &["C"]),
    ], config(2));

    let outcome = pipeline.run().unwrap();
    let labels = outcome.assignment().labels();

    assert_eq!(labels[0], labels[1]);
    assert_eq!(labels[2], labels[3]);
    assert_ne!(labels[0], labels[2]);
    assert_eq!(outcome.summary(pipeline.registry()).total_deviation(100), 0);
    assert_eq!(outcome.contiguity.assignment.centers().len(), 2);
}

#[test]
fn dangling_neighbor_is_dropped_with_a_warning() {
    let pipeline = redistricter(vec![
        UnitRecord::new("A", "Alpha", 10, &["B", "ZZZ"]),
        UnitRecord::new("B", "Beta", 10, &["A"]),
    ], config(1));

    assert_eq!(pipeline.graph().dropped_references(), 1);
    assert_eq!(pipeline.graph().edge_count(), 2);

    let outcome = pipeline.run().unwrap();
    assert!(outcome.warnings.contains(&Warning::DanglingNeighbors { count: 1 }));
    assert_eq!(outcome.assignment().labels(), &[Some(1), Some(1)]);
}

#[test]
fn more_districts_than_units_is_infeasible() {
    let pipeline = redistricter(vec![
        UnitRecord::new("A", "Alpha", 10, &["B"]),
        UnitRecord::new("B", "Beta", 10, &["A"]),
    ], config(3));

    let err = pipeline.run().unwrap_err();
    assert!(matches!(err, Error::InfeasibleModel { districts: 3, units: 2, .. }), "{err}");
    assert!(err.is_stage_local());
}

#[test]
fn grid_districts_are_contiguous_and_within_bounds() {
    let pipeline = redistricter(grid(3, 4, |r, c| 10 + ((r * 4 + c) % 3) as i64), config(3));

    let outcome = pipeline.run().unwrap();
    let assignment = outcome.assignment();
    let bounds = outcome.bounds;

    assert!(assignment.is_total());
    for members in assignment.members() {
        assert!(pipeline.graph().is_connected_subset(&members));
    }
    for population in assignment.district_populations(&pipeline.registry().populations()) {
        assert!(bounds.contains(population), "{population} outside [{}, {}]", bounds.lower, bounds.upper);
    }

    let centers = outcome.contiguity.assignment.centers();
    assert_eq!(centers.len(), 3);
    assert_eq!(centers.iter().collect::<HashSet<_>>().len(), 3);
    for (d, &center) in centers.iter().enumerate() {
        assert_eq!(assignment.district(center), Some(d as u32 + 1));
    }

    let summary = outcome.summary(pipeline.registry());
    assert_eq!(summary.total_population(), pipeline.registry().total_population());
}

#[test]
fn report_and_plan_are_written() {
    let pipeline = redistricter(grid(2, 2, |_, _| 25), config(2));
    let outcome = pipeline.run().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let plan = dir.path().join("plan.csv");
    write_assignments_csv(&outcome.unit_exports(pipeline.registry()), &plan).unwrap();

    let text = std::fs::read_to_string(&plan).unwrap();
    assert_eq!(text.lines().count(), 5);
    assert!(text.starts_with("id,name,population,district"));

    let report = serde_json::to_value(outcome.report(pipeline.registry())).unwrap();
    assert_eq!(report["centers"].as_array().unwrap().len(), 2);
    assert_eq!(report["summary"]["districts"][0]["district_number"], 1);
    assert_eq!(report["balance"]["status"], "optimal");
}

#[cfg(feature = "highs")]
#[test]
fn tiny_time_limit_stops_on_the_budget() {
    // 196 units and 8 districts: the contiguity model alone has tens of
    // thousands of binaries, far beyond what 10ms can prove optimal.
    let config = PipelineConfig { time_limit_secs: Some(0.01), ..PipelineConfig::new(8) };
    let pipeline = redistricter(grid(14, 14, |r, c| 100 + ((r * 7 + c * 13) % 50) as i64), config);

    match pipeline.run() {
        Ok(outcome) => {
            assert!(outcome.balance.timed_out() || outcome.contiguity.timed_out());
            assert!(!outcome.is_optimal());
            assert!(outcome.assignment().is_total());
            assert!(outcome.warnings.iter().any(|w| matches!(w, Warning::SolverTimeout { .. })));
        }
        Err(err) => assert!(matches!(err, Error::NoIncumbent { .. }), "{err}"),
    }
}
