//! Integration tests for the estimator and simulation engine
//!
//! Tests are organized by topic:
//! - `estimation` - Alignment, mean and covariance estimation
//! - `simulation` - Closed-form statistics, risk metrics and sample paths
//! - `reproducibility` - Seeding and random stream ordering

mod simulation;
