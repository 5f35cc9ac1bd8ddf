use crate::config::MAX_SCROLL;
use crate::pipeline::PredictionResult;
use crate::symbols::parse_symbols;

pub const EMPTY_INPUT_MSG: &str = "Please enter at least one stock symbol!";
pub const FETCHING_MSG: &str = "Fetching predictions...";
pub const NO_RESULTS_MSG: &str = "No valid predictions found.";

/// Everything the window carries between frames: the typed symbol text,
/// the status line, the scroll position, the latest result list, and the
/// gate that keeps a single pipeline run in flight.
///
/// Mutated only by the event methods below; the renderer reads it.
pub struct App {
    pub input: String,
    pub status: String,
    pub scroll: f32,
    pub results: Vec<PredictionResult>,
    pub running: bool,
}

impl App {
    pub fn new() -> Self {
        Self {
            input: String::new(),
            status: String::new(),
            scroll: 0.0,
            results: Vec::new(),
            running: false,
        }
    }

    /// Handles a Predict submit.
    ///
    /// Returns the parsed symbols when a pipeline run should be
    /// dispatched. `None` means the input failed validation (status set,
    /// results cleared) or a run is already in flight (ignored).
    pub fn submit(&mut self) -> Option<Vec<String>> {
        if self.running {
            return None;
        }

        let symbols = parse_symbols(&self.input);
        if symbols.is_empty() {
            self.status = EMPTY_INPUT_MSG.to_string();
            self.results.clear();
            return None;
        }

        self.status = FETCHING_MSG.to_string();
        self.running = true;
        Some(symbols)
    }

    /// Installs a completed run. The result list is replaced wholesale
    /// and the status set in the same mutation, so the message never
    /// describes a different run than the list shows.
    pub fn complete_run(&mut self, results: Vec<PredictionResult>) {
        self.status = if results.is_empty() {
            NO_RESULTS_MSG.to_string()
        } else {
            format!("Loaded {} predictions.", results.len())
        };
        self.results = results;
        self.running = false;
    }

    /// Shifts the result list by `delta` pixels, clamped to the scroll
    /// range. Positive delta scrolls further down the list.
    pub fn scroll_by(&mut self, delta: f32) {
        self.scroll = (self.scroll + delta).clamp(0.0, MAX_SCROLL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{ChartSeries, PredictionResult};

    fn fake_result(symbol: &str) -> PredictionResult {
        PredictionResult {
            symbol: symbol.to_string(),
            mse: 1.25,
            chart: ChartSeries {
                actual: vec![[0.0, 10.0], [1.0, 11.0]],
                fitted: [[0.0, 10.1], [1.0, 10.9]],
            },
        }
    }

    #[test]
    fn test_submit_empty_input_sets_validation_message() {
        let mut app = App::new();
        app.results = vec![fake_result("OLD")];
        app.input = "  ,  ".to_string();

        assert!(app.submit().is_none());
        assert_eq!(app.status, EMPTY_INPUT_MSG);
        assert!(app.results.is_empty());
        assert!(!app.running);
    }

    #[test]
    fn test_submit_dispatches_normalized_symbols_once() {
        let mut app = App::new();
        app.input = "tsla".to_string();

        assert_eq!(app.submit(), Some(vec!["TSLA".to_string()]));
        assert_eq!(app.status, FETCHING_MSG);
        assert!(app.running);

        // A second submit while the run is in flight is ignored.
        assert!(app.submit().is_none());
        assert_eq!(app.status, FETCHING_MSG);
    }

    #[test]
    fn test_complete_run_replaces_store_and_status_together() {
        let mut app = App::new();
        app.input = "aapl,msft".to_string();
        app.submit();

        app.complete_run(vec![fake_result("AAPL"), fake_result("MSFT")]);

        assert_eq!(app.status, "Loaded 2 predictions.");
        assert_eq!(app.results.len(), 2);
        assert_eq!(app.results[0].symbol, "AAPL");
        assert_eq!(app.results[1].symbol, "MSFT");
        assert!(!app.running);
    }

    #[test]
    fn test_complete_run_with_nothing_found() {
        let mut app = App::new();
        app.input = "zzzz".to_string();
        app.submit();
        app.results = vec![fake_result("STALE")];

        app.complete_run(Vec::new());

        assert_eq!(app.status, NO_RESULTS_MSG);
        assert!(app.results.is_empty());
        assert!(!app.running);
    }

    #[test]
    fn test_scroll_stays_clamped() {
        let mut app = App::new();

        for _ in 0..2_000 {
            app.scroll_by(30.0);
            assert!(app.scroll >= 0.0 && app.scroll <= MAX_SCROLL);
        }
        assert_eq!(app.scroll, MAX_SCROLL);

        for _ in 0..2_000 {
            app.scroll_by(-30.0);
            assert!(app.scroll >= 0.0 && app.scroll <= MAX_SCROLL);
        }
        assert_eq!(app.scroll, 0.0);
    }
}
