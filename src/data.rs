use anyhow::Result;
use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config;

/// One trading day in the fetched window.
///
/// The zero-based chronological index is the model's only feature;
/// calendar gaps between trading days are deliberately ignored.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PricePoint {
    pub day: usize,
    pub close: f64,
}

/// Daily close history for one symbol, ordered by date ascending.
#[derive(Clone, Debug)]
pub struct PriceHistory {
    pub symbol: String,
    pub points: Vec<PricePoint>,
}

#[derive(Deserialize, Serialize, Debug)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Deserialize, Serialize, Debug)]
struct YahooChart {
    result: Vec<YahooResult>,
}

#[derive(Deserialize, Serialize, Debug)]
struct YahooResult {
    timestamp: Vec<i64>,
    indicators: YahooIndicators,
}

#[derive(Deserialize, Serialize, Debug)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
}

#[derive(Deserialize, Serialize, Debug)]
struct YahooQuote {
    close: Vec<Option<f64>>,
}

/// Fetches the daily close history for `symbol` over the fixed window.
///
/// Responses are cached under `.cache/` for 24 hours. An empty or
/// all-null payload yields an empty history rather than an error.
pub async fn fetch_history(symbol: &str) -> Result<PriceHistory> {
    let cache_dir = config::cache_dir();
    if !cache_dir.exists() {
        std::fs::create_dir(cache_dir)?;
    }

    let cache_file = cache_dir.join(format!("{}_daily.json", symbol));

    let response: YahooChartResponse = if cache_file.exists() {
        let metadata = std::fs::metadata(&cache_file)?;
        let modified = metadata.modified()?;
        let age = std::time::SystemTime::now().duration_since(modified)?;

        if age.as_secs() < 86_400 {
            info!("Loading {} from cache...", symbol);
            let file = std::fs::File::open(&cache_file)?;
            let reader = std::io::BufReader::new(file);
            serde_json::from_reader(reader)?
        } else {
            info!("Cache expired for {}, fetching...", symbol);
            fetch_from_api(symbol, &cache_file).await?
        }
    } else {
        info!("Cache miss for {}, fetching...", symbol);
        fetch_from_api(symbol, &cache_file).await?
    };

    Ok(flatten_chart(symbol, &response))
}

async fn fetch_from_api(
    symbol: &str,
    cache_path: &std::path::Path,
) -> Result<YahooChartResponse> {
    let url = format!(
        "https://query1.finance.yahoo.com/v8/finance/chart/{}?period1={}&period2={}&interval=1d",
        symbol,
        config::HISTORY_PERIOD1,
        config::HISTORY_PERIOD2
    );

    let mut attempts = 0;
    let max_attempts = 3;

    loop {
        attempts += 1;
        match reqwest::Client::new()
            .get(&url)
            .header("User-Agent", "Mozilla/5.0")
            .send()
            .await
        {
            Ok(resp) => {
                match resp.json::<YahooChartResponse>().await {
                    Ok(resp_json) => {
                        // Save to cache
                        let file = std::fs::File::create(cache_path)?;
                        let writer = std::io::BufWriter::new(file);
                        serde_json::to_writer(writer, &resp_json)?;

                        return Ok(resp_json);
                    }
                    Err(e) => {
                        if attempts >= max_attempts {
                            return Err(e.into());
                        }
                        warn!(
                            "Failed to parse JSON for {} (attempt {}/{}): {}",
                            symbol, attempts, max_attempts, e
                        );
                    }
                }
            }
            Err(e) => {
                if attempts >= max_attempts {
                    return Err(e.into());
                }
                warn!(
                    "Failed to fetch data for {} (attempt {}/{}): {}",
                    symbol, attempts, max_attempts, e
                );
            }
        }

        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
    }
}

/// Flattens the chart payload into indexed closes, dropping null entries.
fn flatten_chart(symbol: &str, response: &YahooChartResponse) -> PriceHistory {
    let mut points = Vec::new();
    let mut span: Option<(i64, i64)> = None;

    if let Some(result) = response.chart.result.first() {
        if let Some(quote) = result.indicators.quote.first() {
            for (&ts, close) in result.timestamp.iter().zip(&quote.close) {
                if let Some(close) = *close {
                    if !close.is_finite() || close < 0.0 {
                        continue;
                    }
                    points.push(PricePoint {
                        day: points.len(),
                        close,
                    });
                    span = Some((span.map_or(ts, |(first, _)| first), ts));
                }
            }
        }
    }

    match span {
        Some((first, last)) => info!(
            "{}: {} daily closes ({} to {})",
            symbol,
            points.len(),
            format_date(first),
            format_date(last)
        ),
        None => warn!("{}: no usable closes in provider response", symbol),
    }

    PriceHistory {
        symbol: symbol.to_uppercase(),
        points,
    }
}

fn format_date(ts: i64) -> String {
    Utc.timestamp_opt(ts, 0)
        .single()
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

impl PriceHistory {
    /// Deterministic random-walk history for tests.
    #[cfg(test)]
    pub fn synthetic(symbol: &str, days: usize, seed: u64) -> Self {
        use rand::prelude::*;

        let mut rng = StdRng::seed_from_u64(seed);
        let mut points = Vec::with_capacity(days);
        let mut price: f64 = 100.0;

        for day in 0..days {
            let volatility = 0.02; // 2% daily volatility
            let change_pct: f64 = rng.gen_range(-volatility..volatility);
            price *= 1.0 + change_pct;
            points.push(PricePoint { day, close: price });
        }

        Self {
            symbol: symbol.to_uppercase(),
            points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
        "chart": {
            "result": [{
                "timestamp": [1577923200, 1578009600, 1578268800, 1578355200],
                "indicators": {
                    "quote": [{
                        "close": [300.35, null, 298.29, 303.19]
                    }]
                }
            }]
        }
    }"#;

    #[test]
    fn test_flatten_drops_nulls_and_reindexes() {
        let response: YahooChartResponse = serde_json::from_str(PAYLOAD).unwrap();
        let history = flatten_chart("aapl", &response);

        assert_eq!(history.symbol, "AAPL");
        assert_eq!(history.points.len(), 3);
        // Day indices stay contiguous after the null close is dropped.
        let days: Vec<usize> = history.points.iter().map(|p| p.day).collect();
        assert_eq!(days, [0, 1, 2]);
        assert_eq!(history.points[1].close, 298.29);
    }

    #[test]
    fn test_flatten_empty_result_is_empty_history() {
        let response: YahooChartResponse =
            serde_json::from_str(r#"{"chart": {"result": []}}"#).unwrap();
        let history = flatten_chart("MISSING", &response);
        assert!(history.points.is_empty());
    }

    #[test]
    fn test_synthetic_history_is_deterministic() {
        let a = PriceHistory::synthetic("TEST", 50, 7);
        let b = PriceHistory::synthetic("TEST", 50, 7);

        assert_eq!(a.points.len(), 50);
        assert_eq!(a.points, b.points);
        assert!(a.points.iter().all(|p| p.close > 0.0));
        assert_eq!(a.points.last().unwrap().day, 49);
    }
}
