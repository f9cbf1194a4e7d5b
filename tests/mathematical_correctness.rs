//! Statistical properties of the fitted models, the histogram and MAPE.

use approx::assert_relative_eq;
use tailfit_core::{DistributionModel, ModelFamily};
use tailfit_tests::*;

// =============================================================================
// Fitting: Location and Scale
// =============================================================================

#[test]
fn when_returns_are_gaussian_both_locations_land_near_the_true_mean() {
    // Given: 10,000 seeded Normal(0, 0.01) log returns
    let prices = prices_from_log_returns(&normal_returns(42, 10_000, 0.0, 0.01));
    let source = source_with(vec![("SPY", prices)]);

    // When: Both models are fitted
    let result = default_pipeline()
        .process(&source, &symbol("SPY"))
        .expect("result");

    // Then: Each location estimate is within 0.0005 of zero
    let normal_mean = result.normal_mean().expect("normal fitted");
    let t_location = result.student_t_location().expect("student t fitted");
    assert!(normal_mean.abs() < 0.0005, "normal mean {normal_mean}");
    assert!(t_location.abs() < 0.0005, "student t location {t_location}");

    // And: The Gaussian sample pushes degrees of freedom high
    let dof = result.student_t_degrees_of_freedom().expect("dof");
    assert!(dof > 10.0, "dof {dof}");
}

#[test]
fn when_the_normal_model_is_fitted_its_parameters_are_the_sample_moments() {
    // Given: A seeded non-constant series
    let draws = normal_returns(8, 2_500, 0.001, 0.02);
    let source = source_with(vec![("IWM", prices_from_log_returns(&draws))]);

    // When: The pipeline fits the Normal model
    let result = default_pipeline()
        .process(&source, &symbol("IWM"))
        .expect("result");

    // Then: Mean is the arithmetic mean and std_dev the population deviation
    let fit = result.fit_for(ModelFamily::Normal).expect("normal fit");
    let DistributionModel::Normal { mean, std_dev } = fit.model else {
        panic!("expected a normal model, got {:?}", fit.model);
    };
    assert_relative_eq!(mean, result.returns.mean(), epsilon = 1e-12);
    assert_relative_eq!(std_dev, result.returns.population_std_dev(), epsilon = 1e-12);
    assert!(std_dev > 0.0);
    assert_eq!(fit.iterations, 0);
}

#[test]
fn when_returns_are_heavy_tailed_student_t_finds_small_dof_and_wins_on_mape() {
    // Given: 10,000 seeded t(3) returns scaled to 1%
    let prices = prices_from_log_returns(&student_t_returns(2024, 10_000, 3.0, 0.01));
    let source = source_with(vec![("IBIT", prices)]);

    // When: Both models are fitted and scored
    let result = default_pipeline()
        .process(&source, &symbol("IBIT"))
        .expect("result");

    // Then: Degrees of freedom stay small and Student-t scores better
    let dof = result.student_t_degrees_of_freedom().expect("dof");
    assert!(dof < 10.0, "dof {dof}");

    let normal = result.fit_for(ModelFamily::Normal).expect("normal").mape;
    let student = result.fit_for(ModelFamily::StudentT).expect("student t").mape;
    assert!(student < normal, "student t {student} vs normal {normal}");
    assert_eq!(result.best_fit().map(|fit| fit.family), Some(ModelFamily::StudentT));

    // And: The Student-t solver also reaches a higher likelihood
    let normal_ll = result.fit_for(ModelFamily::Normal).expect("normal").log_likelihood;
    let student_ll = result
        .fit_for(ModelFamily::StudentT)
        .expect("student t")
        .log_likelihood;
    assert!(student_ll > normal_ll);
}

// =============================================================================
// Histogram and Scoring
// =============================================================================

#[test]
fn when_returns_are_binned_densities_integrate_to_one() {
    // Given: A processed instrument with 37 bins
    let prices = prices_from_log_returns(&student_t_returns(77, 4_000, 5.0, 0.015));
    let source = source_with(vec![("KWEB", prices)]);
    let config = AnalysisConfig {
        bin_count: 37,
        ..AnalysisConfig::default()
    };
    let pipeline = TickerPipeline::new(config).expect("pipeline");

    // When: The histogram is built
    let histogram = pipeline
        .process(&source, &symbol("KWEB"))
        .expect("result")
        .histogram;

    // Then: Counts cover every return and the density integral is one
    assert_eq!(histogram.len(), 37);
    let counted: usize = histogram.bins().iter().map(|bin| bin.count).sum();
    assert_eq!(counted, histogram.total());
    assert!(histogram.bins().iter().all(|bin| bin.density >= 0.0));
    assert_relative_eq!(histogram.integral(), 1.0, epsilon = 1e-6);
}

#[test]
fn when_models_are_scored_mape_is_never_negative() {
    // Given: Several seeded instruments with different tails
    let source = source_with(vec![
        ("SPY", prices_from_log_returns(&normal_returns(100, 1_500, 0.0, 0.01))),
        ("FXI", prices_from_log_returns(&student_t_returns(101, 1_500, 2.5, 0.02))),
        ("LQD", prices_from_log_returns(&normal_returns(102, 300, 0.0002, 0.003))),
    ]);

    // When: They are processed as a batch
    let outcomes =
        default_pipeline().process_batch(&source, &[symbol("SPY"), symbol("FXI"), symbol("LQD")]);

    // Then: Every MAPE is finite and non-negative
    for outcome in outcomes {
        let result = outcome.result.expect("healthy instrument");
        for mape in result.mape_values() {
            assert!(mape.is_finite() && mape >= 0.0, "{}: {mape}", outcome.symbol);
        }
    }
}

#[test]
fn when_simple_returns_are_requested_they_differ_from_log_returns() {
    // Given: One series processed with both return conventions
    let prices = prices_from_log_returns(&normal_returns(55, 400, 0.0, 0.03));
    let source = source_with(vec![("SLV", prices)]);
    let simple_config = AnalysisConfig {
        return_kind: tailfit_core::ReturnKind::Simple,
        ..AnalysisConfig::default()
    };

    // When: The pipeline runs with log and simple returns
    let log = default_pipeline()
        .process(&source, &symbol("SLV"))
        .expect("log");
    let simple = TickerPipeline::new(simple_config)
        .expect("pipeline")
        .process(&source, &symbol("SLV"))
        .expect("simple");

    // Then: Each simple return is exp(log return) - 1
    for (log_point, simple_point) in log.returns.points().iter().zip(simple.returns.points()) {
        assert_eq!(log_point.date, simple_point.date);
        assert_relative_eq!(
            simple_point.value,
            log_point.value.exp_m1(),
            epsilon = 1e-12
        );
    }
}
