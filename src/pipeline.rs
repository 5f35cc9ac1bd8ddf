use anyhow::Result;
use tracing::{info, warn};

use crate::config;
use crate::data::{self, PriceHistory};
use crate::model;

/// Chart artifact for one symbol: the held-out scatter plus the fitted
/// trend line over the same day-index range.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartSeries {
    /// (day index, actual close) held-out points, ascending by day.
    pub actual: Vec<[f64; 2]>,
    /// Endpoints of the fitted line across the held-out day range.
    pub fitted: [[f64; 2]; 2],
}

impl ChartSeries {
    /// An empty scatter cannot be drawn; the renderer shows an error row.
    pub fn is_renderable(&self) -> bool {
        !self.actual.is_empty()
    }
}

/// One completed prediction, owned by the result list.
#[derive(Clone, Debug)]
pub struct PredictionResult {
    pub symbol: String,
    pub mse: f64,
    pub chart: ChartSeries,
}

/// Runs the full pipeline for a list of symbols, preserving input order.
///
/// A symbol that fetches no data or fails to fit is logged and skipped;
/// the run always completes for the remaining symbols and returns an
/// empty vector when nothing succeeded.
pub async fn run_predictions(symbols: &[String]) -> Vec<PredictionResult> {
    let delay_ms = config::fetch_delay_ms();
    let mut results = Vec::new();

    for (idx, symbol) in symbols.iter().enumerate() {
        match predict_symbol(symbol).await {
            Ok(Some(result)) => results.push(result),
            Ok(None) => info!("No data for {}, skipping", symbol),
            Err(e) => warn!("Prediction failed for {}: {}", symbol, e),
        }

        if idx + 1 < symbols.len() && delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
        }
    }

    info!(
        "Pipeline produced {} of {} requested predictions",
        results.len(),
        symbols.len()
    );
    results
}

async fn predict_symbol(symbol: &str) -> Result<Option<PredictionResult>> {
    let history = data::fetch_history(symbol).await?;
    outcome_for(&history)
}

/// Fits one fetched history. `Ok(None)` means the provider had nothing
/// for the symbol; `Err` means the series was too short or degenerate.
fn outcome_for(history: &PriceHistory) -> Result<Option<PredictionResult>> {
    if history.points.is_empty() {
        return Ok(None);
    }

    let fit = model::fit_trend(&history.points)?;

    let first_day = fit.holdout.first().map(|p| p.0).unwrap_or(0.0);
    let last_day = fit.holdout.last().map(|p| p.0).unwrap_or(0.0);
    let chart = ChartSeries {
        actual: fit.holdout.iter().map(|&(day, close)| [day, close]).collect(),
        fitted: [
            [first_day, fit.predict(first_day)],
            [last_day, fit.predict(last_day)],
        ],
    };

    Ok(Some(PredictionResult {
        symbol: history.symbol.clone(),
        mse: fit.mse,
        chart,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::PricePoint;

    #[test]
    fn test_outcome_for_healthy_history() {
        let history = PriceHistory::synthetic("NVDA", 200, 3);
        let result = outcome_for(&history).unwrap().unwrap();

        assert_eq!(result.symbol, "NVDA");
        assert!(result.mse.is_finite());
        assert!(result.mse >= 0.0);
        assert!(result.chart.is_renderable());
        assert_eq!(result.chart.actual.len(), 40);
        // The fitted line spans the held-out day range.
        assert_eq!(result.chart.fitted[0][0], result.chart.actual[0][0]);
        assert_eq!(
            result.chart.fitted[1][0],
            result.chart.actual.last().unwrap()[0]
        );
    }

    #[test]
    fn test_outcome_for_empty_history_is_silent_skip() {
        let history = PriceHistory {
            symbol: "NONE".to_string(),
            points: Vec::new(),
        };
        assert!(outcome_for(&history).unwrap().is_none());
    }

    #[test]
    fn test_outcome_for_short_history_is_error() {
        let history = PriceHistory {
            symbol: "SHORT".to_string(),
            points: vec![PricePoint { day: 0, close: 10.0 }],
        };
        assert!(outcome_for(&history).is_err());
    }

    #[test]
    fn test_failed_symbols_drop_out_in_order() {
        let histories = vec![
            PriceHistory::synthetic("AAPL", 150, 1),
            PriceHistory {
                symbol: "SHORT".to_string(),
                points: vec![PricePoint { day: 0, close: 10.0 }],
            },
            PriceHistory::synthetic("MSFT", 150, 2),
        ];

        let results: Vec<PredictionResult> = histories
            .iter()
            .filter_map(|h| outcome_for(h).ok().flatten())
            .collect();

        let symbols: Vec<&str> = results.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, ["AAPL", "MSFT"]);
    }

    #[test]
    fn test_submit_to_results_round_trip() {
        use crate::app::App;

        let mut app = App::new();
        app.input = "AAPL,MSFT".to_string();
        let symbols = app.submit().unwrap();
        assert_eq!(symbols, ["AAPL", "MSFT"]);

        let results: Vec<PredictionResult> = symbols
            .iter()
            .enumerate()
            .map(|(i, symbol)| {
                let history = PriceHistory::synthetic(symbol, 120, i as u64);
                outcome_for(&history).unwrap().unwrap()
            })
            .collect();
        app.complete_run(results);

        assert_eq!(app.status, "Loaded 2 predictions.");
        assert_eq!(app.results.len(), 2);
        assert_eq!(app.results[0].symbol, "AAPL");
        assert_eq!(app.results[1].symbol, "MSFT");
    }

    #[test]
    fn test_outcome_is_reproducible() {
        let history = PriceHistory::synthetic("TSLA", 300, 9);

        let first = outcome_for(&history).unwrap().unwrap();
        let second = outcome_for(&history).unwrap().unwrap();

        assert_eq!(first.mse, second.mse);
        assert_eq!(first.chart, second.chart);
    }
}
