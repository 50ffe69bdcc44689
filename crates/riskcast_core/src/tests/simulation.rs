//! Tests for the simulation engine
//!
//! These tests verify:
//! - Annualised statistics are closed-form and trial-count independent
//! - Sharpe ratio policy for zero volatility
//! - VaR lies inside the simulated distribution
//! - Sample paths have the horizon length and compound from a base of 1.0
//! - Invalid parameters and degenerate covariances are reported

use crate::error::ErrorKind;
use crate::model::ReturnModel;
use crate::simulation::{
    ExecutionMode, SimulationConfig, SimulationRun, TRADING_PERIODS_PER_YEAR,
    annualized_statistics, simulate,
};
use crate::stats;

fn two_asset_model() -> ReturnModel {
    ReturnModel::from_rows(
        &["AAA", "BBB"],
        &[0.001, 0.0008],
        &[&[0.0004, 0.0001], &[0.0001, 0.0002]],
    )
    .unwrap()
}

fn config(horizon: i64, trials: i64) -> SimulationConfig {
    SimulationConfig {
        horizon,
        trials,
        ..Default::default()
    }
}

/// Two instruments, weights [0.6, 0.4], horizon 10, 50 trials
#[test]
fn test_two_asset_end_to_end() {
    let model = two_asset_model();
    let result = simulate(&model, &[0.6, 0.4], &config(10, 50)).unwrap();

    let expected_return = (0.6 * 0.001 + 0.4 * 0.0008) * TRADING_PERIODS_PER_YEAR;
    let variance = 0.36 * 0.0004 + 2.0 * 0.24 * 0.0001 + 0.16 * 0.0002;
    let volatility = (variance * TRADING_PERIODS_PER_YEAR).sqrt();

    assert!((result.expected_return - expected_return).abs() < 1e-12);
    assert!((result.volatility - volatility).abs() < 1e-12);
    assert!((result.sharpe_ratio - expected_return / volatility).abs() < 1e-9);

    assert_eq!(result.final_values.len(), 50);
    assert_eq!(result.trials, 50);
    assert_eq!(result.horizon, 10);
    assert!(result.var_95 <= result.mean_final_value());
    assert!(result.expected_shortfall_95 <= result.var_95);
    assert!((0.0..=1.0).contains(&result.probability_of_loss));
}

#[test]
fn test_annualization_ignores_horizon() {
    let model = two_asset_model();
    let short = simulate(&model, &[0.6, 0.4], &config(5, 10)).unwrap();
    let long = simulate(&model, &[0.6, 0.4], &config(500, 10)).unwrap();

    assert_eq!(short.expected_return, long.expected_return);
    assert_eq!(short.volatility, long.volatility);
}

#[test]
fn test_trial_count_does_not_change_closed_form_stats() {
    let model = two_asset_model();
    let small = simulate(&model, &[0.6, 0.4], &config(20, 10)).unwrap();
    let large = simulate(&model, &[0.6, 0.4], &config(20, 2000)).unwrap();

    assert_eq!(small.expected_return, large.expected_return);
    assert_eq!(small.volatility, large.volatility);
    assert_eq!(small.sharpe_ratio, large.sharpe_ratio);
}

#[test]
fn test_zero_volatility_sharpe_is_zero() {
    let model = ReturnModel::from_rows(&["CASH"], &[0.0002], &[&[0.0]]).unwrap();
    let stats = annualized_statistics(&model, &[1.0]).unwrap();
    assert_eq!(stats.volatility, 0.0);
    assert_eq!(stats.sharpe_ratio, 0.0);

    let result = simulate(&model, &[1.0], &config(10, 20)).unwrap();
    assert_eq!(result.sharpe_ratio, 0.0);
    // Every trial is the same deterministic compounding
    let expected = 1.0002f64.powi(10) - 1.0;
    assert!(result.final_values.iter().all(|v| (v - expected).abs() < 1e-12));
    assert!((result.var_95 - expected).abs() < 1e-12);
}

/// A finite model whose annualised moments overflow is an error, not a zero Sharpe
#[test]
fn test_non_finite_annualized_moments_are_rejected() {
    let model = ReturnModel::from_rows(&["HUGE"], &[0.001], &[&[1e307]]).unwrap();
    let err = annualized_statistics(&model, &[1.0]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);

    let model = ReturnModel::from_rows(&["HUGE"], &[1e307], &[&[0.0001]]).unwrap();
    let err = annualized_statistics(&model, &[1.0]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);
}

#[test]
fn test_zero_weight_portfolio_has_zero_sharpe() {
    let model = two_asset_model();
    let stats = annualized_statistics(&model, &[0.0, 0.0]).unwrap();
    assert_eq!(stats.volatility, 0.0);
    assert_eq!(stats.sharpe_ratio, 0.0);
}

#[test]
fn test_sharpe_is_finite_with_positive_volatility() {
    let model = two_asset_model();
    for weights in [[1.0, 0.0], [0.5, 0.5], [0.1, 0.9], [0.7, 0.31]] {
        let stats = annualized_statistics(&model, &weights).unwrap();
        assert!(stats.volatility > 0.0);
        assert!(stats.sharpe_ratio.is_finite());
    }
}

#[test]
fn test_var_within_trial_range() {
    let model = two_asset_model();
    let result = simulate(&model, &[0.5, 0.5], &config(30, 400)).unwrap();

    let min = result
        .final_values
        .iter()
        .copied()
        .fold(f64::INFINITY, f64::min);
    let max = result
        .final_values
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    assert!(result.var_95 >= min && result.var_95 <= max);
    assert_eq!(
        result.var_95,
        stats::percentile(&result.final_values, 0.05).unwrap()
    );
}

#[test]
fn test_sample_paths_shape() {
    let model = two_asset_model();
    let cfg = SimulationConfig {
        horizon: 15,
        trials: 25,
        sample_paths: 7,
        ..Default::default()
    };
    let result = simulate(&model, &[0.6, 0.4], &cfg).unwrap();

    assert_eq!(result.paths_sample.len(), 7);
    for path in &result.paths_sample {
        assert_eq!(path.len(), 15);
        assert!(path.iter().all(|v| *v > 0.0 && v.is_finite()));
    }
    assert_eq!(result.mean_path().len(), 15);
}

#[test]
fn test_default_sample_path_count() {
    let model = two_asset_model();
    let result = simulate(&model, &[0.6, 0.4], &config(3, 5)).unwrap();
    assert_eq!(result.paths_sample.len(), 100);
}

/// Paths are drawn separately from the risk trials, so their end values are
/// not members of the trial array.
#[test]
fn test_sample_paths_are_independent_of_trials() {
    let model = two_asset_model();
    let cfg = SimulationConfig {
        horizon: 12,
        trials: 30,
        sample_paths: 30,
        ..Default::default()
    };
    let result = simulate(&model, &[0.6, 0.4], &cfg).unwrap();

    let path_finals: Vec<f64> = result
        .paths_sample
        .iter()
        .filter_map(|p| p.last().map(|v| v - 1.0))
        .collect();
    assert_ne!(path_finals, result.final_values);
    assert!(
        path_finals
            .iter()
            .any(|p| !result.final_values.iter().any(|f| (f - p).abs() < 1e-15))
    );
}

#[test]
fn test_paths_compound_from_one() {
    let model = ReturnModel::from_rows(&["A", "B"], &[0.001, 0.003], &[&[0.0, 0.0], &[0.0, 0.0]])
        .unwrap();
    let cfg = SimulationConfig {
        horizon: 4,
        trials: 3,
        sample_paths: 2,
        ..Default::default()
    };
    let result = simulate(&model, &[0.5, 0.5], &cfg).unwrap();

    let r = 0.5 * 0.001 + 0.5 * 0.003;
    for path in &result.paths_sample {
        let mut value = 1.0;
        for v in path {
            value *= 1.0 + r;
            assert!((v - value).abs() < 1e-12);
        }
    }
}

#[test]
fn test_invalid_horizon_and_trials() {
    let model = two_asset_model();

    let err = simulate(&model, &[0.6, 0.4], &config(0, 100)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);

    let err = simulate(&model, &[0.6, 0.4], &config(10, -1)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);

    let err = simulate(&model, &[0.6, 0.4], &config(-5, 10)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);

    let err = simulate(&model, &[0.6, 0.4], &config(10, 0)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);
}

#[test]
fn test_weight_length_mismatch() {
    let model = two_asset_model();
    let err = SimulationRun::new(&model, &[1.0], &SimulationConfig::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);

    let err = SimulationRun::new(&model, &[0.5, f64::NAN], &SimulationConfig::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);
}

#[test]
fn test_weights_not_summing_to_one_still_run() {
    let model = two_asset_model();
    let result = simulate(&model, &[0.605, 0.4], &config(10, 20)).unwrap();
    assert_eq!(result.final_values.len(), 20);
}

#[test]
fn test_indefinite_covariance_is_sampling_error() {
    // Symmetric but with a negative eigenvalue
    let model = ReturnModel::from_rows(
        &["A", "B"],
        &[0.001, 0.001],
        &[&[0.0001, 0.0003], &[0.0003, 0.0001]],
    )
    .unwrap();
    let err = simulate(&model, &[0.5, 0.5], &config(10, 10)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Sampling);
}

#[test]
fn test_per_trial_streams_mode() {
    let model = two_asset_model();
    let cfg = SimulationConfig {
        horizon: 20,
        trials: 64,
        sample_paths: 5,
        mode: ExecutionMode::PerTrialStreams,
        ..Default::default()
    };
    let result = simulate(&model, &[0.6, 0.4], &cfg).unwrap();

    assert_eq!(result.final_values.len(), 64);
    assert_eq!(result.paths_sample.len(), 5);
    assert!(result.var_95 <= result.mean_final_value());
}
