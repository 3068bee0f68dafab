//! Integration tests for slipscan-core.
//!
//! These tests exercise the full pipeline:
//! draws → grid → features → simulation → baseline → validation → summary.

use slipscan_core::{
    AnalysisSettings, CancelToken, CorrectionMethod, Draw, FeatureExtractor, FeatureSchema,
    FeatureTable, GridMapper, HypothesisValidator, LotteryConfig, MonteCarloSimulator,
    RawRetention, Registry, SimMeans, SimulationSettings, ValidationInputError, analyze,
    summarize,
};

#[test]
fn worked_draw_on_megasena_slip() {
    let config = LotteryConfig::megasena();
    let grid = GridMapper::new(&config);
    let positions = grid.positions(&[1, 10, 11, 20, 30, 60]).unwrap();
    let coords: Vec<(usize, usize)> = positions.iter().map(|p| (p.row, p.col)).collect();
    assert_eq!(coords, vec![(0, 0), (9, 0), (0, 1), (9, 1), (9, 2), (9, 5)]);

    let v = FeatureExtractor::new(&config, FeatureSchema::Grid)
        .extract(&[1, 10, 11, 20, 30, 60])
        .unwrap();
    assert_eq!(v.get("border_count"), Some(6.0));
    assert_eq!(v.get("corner_count"), Some(3.0));
}

#[test]
fn baseline_is_reproducible_across_execution_modes() {
    let sim = MonteCarloSimulator::new(&LotteryConfig::megasena(), FeatureSchema::Grid);
    let mut settings = SimulationSettings::new(1000, 50, 42);
    settings.retention = RawRetention::None;

    let parallel = summarize(
        &sim.run_with(&settings, &CancelToken::new(), None)
            .unwrap(),
    )
    .unwrap();
    settings.parallel = false;
    let sequential = summarize(
        &sim.run_with(&settings, &CancelToken::new(), None)
            .unwrap(),
    )
    .unwrap();

    for (a, b) in parallel.iter().zip(sequential.iter()) {
        assert_eq!(a.feature, b.feature);
        for (x, y) in [
            (a.mean, b.mean),
            (a.std, b.std),
            (a.p2_5, b.p2_5),
            (a.p50, b.p50),
            (a.p97_5, b.p97_5),
            (a.min, b.min),
            (a.max, b.max),
        ] {
            assert_eq!(x.to_bits(), y.to_bits(), "{} differs", a.feature);
        }
    }
}

#[test]
fn mismatched_feature_sets_are_rejected() {
    let config = LotteryConfig::megasena();
    let observed_vectors = vec![
        FeatureExtractor::new(&config, FeatureSchema::Slip)
            .extract(&[1, 2, 3, 4, 5, 6])
            .unwrap(),
    ];
    let observed = FeatureTable::from_vectors(FeatureSchema::Slip, &observed_vectors).unwrap();
    let runs = MonteCarloSimulator::new(&config, FeatureSchema::Grid)
        .run(5, 5, 1)
        .unwrap();

    let err = HypothesisValidator::new(0.05, CorrectionMethod::BenjaminiHochberg)
        .unwrap()
        .validate(&observed, &runs)
        .unwrap_err();
    match err {
        ValidationInputError::SchemaMismatch {
            only_observed,
            only_simulated,
        } => {
            assert!(only_observed.contains(&"convex_hull_area".to_string()));
            assert!(only_simulated.contains(&"connectivity_4".to_string()));
        }
        other => panic!("expected SchemaMismatch, got {other:?}"),
    }
}

#[test]
fn external_tables_validate_like_simulated_ones() {
    let config = LotteryConfig::lotofacil();
    let sim = MonteCarloSimulator::new(&config, FeatureSchema::Slip);
    let runs = sim.run(60, 20, 7).unwrap();
    let observed_run = sim.run(1, 20, 7_000).unwrap();
    let observed = FeatureTable::from_vectors(FeatureSchema::Slip, &observed_run[0].features).unwrap();

    let validator = HypothesisValidator::new(0.05, CorrectionMethod::Bonferroni).unwrap();
    let direct = validator.validate(&observed, &runs).unwrap();

    let means = SimMeans::from_runs(&runs).unwrap();
    let raw = FeatureTable::from_vectors(
        FeatureSchema::Slip,
        runs.iter().flat_map(|r| r.features.iter()),
    )
    .unwrap();
    let via_tables = validator.validate_tables(&observed, &raw, &means).unwrap();
    assert_eq!(direct, via_tables);
}

#[test]
fn concentrated_draws_stand_out_end_to_end() {
    let registry = Registry::builtin();
    let config = registry.get("lotofacil").unwrap();
    // Always the left three columns plus nothing else: 15 of 25 cells.
    let draws: Vec<Draw> = (1..=30)
        .map(|c| Draw::new(Some(c), (1..=15).collect()))
        .collect();
    let settings = AnalysisSettings {
        n_simulations: 200,
        ..AnalysisSettings::default()
    };
    let report = analyze(config, &draws, &settings, &CancelToken::new()).unwrap();

    assert_eq!(report.results.len(), FeatureSchema::Grid.len());
    assert!(report.summary.significant_count > 0);
    let col_max = report
        .results
        .iter()
        .find(|r| r.feature == "col_max")
        .unwrap();
    assert!(col_max.significant);
    assert_eq!(col_max.observed_mean, 2.0);
    assert_eq!(report.summary.top_by_effect.len(), 5);
    assert!(
        report
            .results
            .windows(2)
            .all(|w| w[0].effect_size >= w[1].effect_size)
    );
}

#[test]
#[ignore] // Run with: cargo test -- --ignored
fn full_scale_analysis_on_megasena() {
    let config = LotteryConfig::megasena();
    let sim = MonteCarloSimulator::new(&config, FeatureSchema::Grid);
    let observed_run = sim.run(1, 2500, 2024).unwrap();
    let draws: Vec<Draw> = observed_run[0]
        .draws
        .iter()
        .enumerate()
        .map(|(i, d)| Draw::new(Some(i as u32 + 1), d.clone()))
        .collect();
    let report = analyze(
        &config,
        &draws,
        &AnalysisSettings::default(),
        &CancelToken::new(),
    )
    .unwrap();
    // Uniform draws: nothing should survive FDR at 5% except by rare chance.
    assert!(
        report.summary.significant_count <= 2,
        "unexpected significant features: {:?}",
        report.summary.significant_features
    );
}
