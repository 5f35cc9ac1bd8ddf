use anyhow::Result;
use linfa::Dataset;
use linfa::prelude::*;
use linfa_linear::LinearRegression;
use ndarray::{Array1, Array2};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::config::{MIN_POINTS, SPLIT_SEED, TRAIN_RATIO};
use crate::data::PricePoint;

/// A fitted linear trend with its held-out evaluation.
#[derive(Clone, Debug)]
pub struct TrendFit {
    pub slope: f64,
    pub intercept: f64,
    /// Mean squared error of the fitted line on the held-out closes.
    pub mse: f64,
    /// Held-out (day index, actual close) pairs, ascending by day.
    pub holdout: Vec<(f64, f64)>,
}

impl TrendFit {
    pub fn predict(&self, day: f64) -> f64 {
        self.slope * day + self.intercept
    }
}

/// Fits an ordinary least-squares line mapping day index to close price.
///
/// The history is shuffled with a fixed seed and split 80/20, so repeated
/// calls over identical points produce the identical split and metric.
pub fn fit_trend(points: &[PricePoint]) -> Result<TrendFit> {
    if points.len() < MIN_POINTS {
        anyhow::bail!(
            "need at least {} observations to fit a trend, got {}",
            MIN_POINTS,
            points.len()
        );
    }

    let records = Array2::from_shape_fn((points.len(), 1), |(i, _)| points[i].day as f64);
    let targets = Array1::from_iter(points.iter().map(|p| p.close));

    let mut rng = StdRng::seed_from_u64(SPLIT_SEED);
    let (train, valid) = Dataset::new(records, targets)
        .shuffle(&mut rng)
        .split_with_ratio(TRAIN_RATIO);

    let model = LinearRegression::default().fit(&train)?;
    let predicted = model.predict(&valid);
    let mse = predicted.mean_squared_error(&valid)?;

    if !mse.is_finite() {
        anyhow::bail!("degenerate fit over {} observations", points.len());
    }

    let mut holdout: Vec<(f64, f64)> = valid
        .records()
        .column(0)
        .iter()
        .copied()
        .zip(valid.targets().iter().copied())
        .collect();
    holdout.sort_by(|a, b| a.0.total_cmp(&b.0));

    Ok(TrendFit {
        slope: model.params()[0],
        intercept: model.intercept(),
        mse,
        holdout,
    })
}
