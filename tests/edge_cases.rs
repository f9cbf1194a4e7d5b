//! Edge cases: too little data, degenerate data and invalid settings.

use tailfit_core::{FitOptions, ModelFamily, ValidationError};
use tailfit_tests::*;

// =============================================================================
// Insufficient Data
// =============================================================================

#[test]
fn when_only_two_prices_exist_processing_stops_before_any_fit() {
    // Given: Two prices, which yield a single return
    let source = source_with(vec![("SPY", prices_from_log_returns(&[0.01]))]);

    // When: The instrument is processed
    let err = default_pipeline()
        .process(&source, &symbol("SPY"))
        .expect_err("one return is not enough");

    // Then: The return stage reports the shortfall
    assert_eq!(
        err,
        AnalysisError::InsufficientData {
            stage: Stage::Returns,
            required: 2,
            actual: 1,
        }
    );
    assert_eq!(err.code(), "analysis.insufficient_data");
}

#[test]
fn when_no_prices_fall_inside_the_range_insufficient_data_is_reported() {
    // Given: Prices that all predate the configured window
    let source = source_with(vec![(
        "TLT",
        prices_from_log_returns(&normal_returns(4, 100, 0.0, 0.01)),
    )]);
    let config = AnalysisConfig {
        start: tailfit_core::TradingDate::parse("2020-01-01").expect("date"),
        ..AnalysisConfig::default()
    };
    let pipeline = TickerPipeline::new(config).expect("pipeline");

    // When: The instrument is processed
    let err = pipeline
        .process(&source, &symbol("TLT"))
        .expect_err("empty window");

    // Then: Zero prices were available
    assert!(matches!(
        err,
        AnalysisError::InsufficientData {
            stage: Stage::Returns,
            actual: 0,
            ..
        }
    ));
}

#[test]
fn when_min_prices_is_raised_short_histories_are_rejected() {
    // Given: 30 prices and a requirement of 60
    let source = source_with(vec![(
        "HYG",
        prices_from_log_returns(&normal_returns(6, 29, 0.0, 0.01)),
    )]);
    let config = AnalysisConfig {
        min_prices: 60,
        ..AnalysisConfig::default()
    };
    let pipeline = TickerPipeline::new(config).expect("pipeline");

    // When / Then: The return stage asks for 60 and reports 30
    let err = pipeline.process(&source, &symbol("HYG")).expect_err("too short");
    assert_eq!(
        err,
        AnalysisError::InsufficientData {
            stage: Stage::Returns,
            required: 60,
            actual: 30,
        }
    );
}

// =============================================================================
// Degenerate Data
// =============================================================================

#[test]
fn when_all_prices_are_identical_the_input_is_degenerate_not_zero_variance() {
    // Given: 50 identical prices
    let source = source_with(vec![("GDX", flat_prices(50, 31.5))]);

    // When: The instrument is processed
    let err = default_pipeline()
        .process(&source, &symbol("GDX"))
        .expect_err("flat prices cannot be fitted");

    // Then: A degenerate-input error is raised instead of std_dev = 0
    assert!(matches!(err, AnalysisError::DegenerateInput { .. }), "{err:?}");
    assert_eq!(err.code(), "analysis.degenerate_input");
}

#[test]
fn when_the_solver_budget_is_one_iteration_a_convergence_error_is_reported() {
    // Given: A Student-t fit allowed a single iteration
    let source = source_with(vec![(
        "EEM",
        prices_from_log_returns(&student_t_returns(13, 2_000, 3.0, 0.01)),
    )]);
    let config = AnalysisConfig {
        models: vec![ModelFamily::StudentT],
        fit: FitOptions {
            max_iterations: 1,
            ..FitOptions::default()
        },
        ..AnalysisConfig::default()
    };
    let pipeline = TickerPipeline::new(config).expect("pipeline");

    // When / Then: The fit fails loudly rather than returning a partial estimate
    let err = pipeline.process(&source, &symbol("EEM")).expect_err("budget");
    assert!(
        matches!(
            err,
            AnalysisError::FitConvergence {
                family: "student_t",
                iterations: 1,
                ..
            }
        ),
        "{err:?}"
    );
    assert_eq!(err.code(), "analysis.fit_convergence");
}

// =============================================================================
// Invalid Settings
// =============================================================================

#[test]
fn when_settings_are_invalid_the_pipeline_is_never_built() {
    let cases = [
        (
            AnalysisConfig {
                bin_count: 0,
                ..AnalysisConfig::default()
            },
            "bin_count",
        ),
        (
            AnalysisConfig {
                models: Vec::new(),
                ..AnalysisConfig::default()
            },
            "models",
        ),
        (
            AnalysisConfig {
                fit: FitOptions {
                    tolerance: -1.0,
                    ..FitOptions::default()
                },
                ..AnalysisConfig::default()
            },
            "tolerance",
        ),
    ];

    for (config, label) in cases {
        let err = TickerPipeline::new(config).expect_err(label);
        assert!(
            matches!(
                err,
                ValidationError::ZeroBinCount
                    | ValidationError::EmptyModelList
                    | ValidationError::InvalidFitOption { .. }
            ),
            "{label}: {err:?}"
        );
    }
}
