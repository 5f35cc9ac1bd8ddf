use std::path::Path;

/// Unix bounds of the fixed daily-close fetch window: 2020-01-01 through
/// 2024-12-31 inclusive. The end bound is the first second of 2025-01-01
/// so the final trading day is covered.
pub const HISTORY_PERIOD1: i64 = 1_577_836_800;
pub const HISTORY_PERIOD2: i64 = 1_735_689_600;

/// Share of each history used to fit the trend line; the rest is held out
/// for the error metric.
pub const TRAIN_RATIO: f32 = 0.8;
/// Seed for the train/held-out shuffle. A rerun over identical data must
/// reproduce the same split and the same error metric.
pub const SPLIT_SEED: u64 = 42;
/// Histories shorter than this cannot be split and fitted.
pub const MIN_POINTS: usize = 2;

/// Upper bound for the result-list scroll offset, in pixels.
pub const MAX_SCROLL: f32 = 10_000.0;

pub fn cache_dir() -> &'static Path {
    Path::new(".cache")
}

/// Pause between symbol fetches in a batch run, to stay polite with the
/// provider. Overridable via TRENDSTOCK_FETCH_DELAY_MS.
pub fn fetch_delay_ms() -> u64 {
    std::env::var("TRENDSTOCK_FETCH_DELAY_MS")
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(|v| v.clamp(0, 5_000))
        .unwrap_or(350)
}
