//! Price series supply
//!
//! Either wraps caller-supplied historical closes verbatim or synthesizes a
//! daily log-return random walk from trend/volatility parameters. Isolated
//! here so the simulator stays series-agnostic.

use chrono::{Duration, NaiveDate};
use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;
use statrs::distribution::Normal;
use tracing::debug;

use crate::config::{SimulationConfig, TrendDirection};
use crate::types::{EngineError, PricePoint};

/// Seed used when the caller does not supply one
pub const DEFAULT_SEED: u64 = 42;

/// Synthetic prices are clamped to this band around base so a long losing
/// streak can never drive them to zero or absurd highs
const MIN_PRICE_FACTOR: f64 = 0.2;
const MAX_PRICE_FACTOR: f64 = 5.0;

/// Build the series for a run: historical closes when supplied, otherwise
/// a seeded synthetic walk from the base price
pub fn build_series(
    base_price: f64,
    cfg: &SimulationConfig,
) -> Result<Vec<PricePoint>, EngineError> {
    match &cfg.historical_closes {
        Some(closes) => historical_series(closes, cfg.days, cfg.start_date),
        None => Ok(synthetic_series(base_price, cfg)),
    }
}

/// Pass-through over caller-supplied closes
///
/// Fails when the history is shorter than the requested window; extra
/// points beyond the window are ignored.
pub fn historical_series(
    closes: &[f64],
    days: usize,
    start_date: NaiveDate,
) -> Result<Vec<PricePoint>, EngineError> {
    if closes.len() < days {
        return Err(EngineError::InsufficientData {
            requested: days,
            available: closes.len(),
        });
    }
    Ok(closes[..days]
        .iter()
        .enumerate()
        .map(|(day, &close)| PricePoint {
            day,
            date: start_date + Duration::days(day as i64),
            close,
        })
        .collect())
}

/// Seeded daily random walk
///
/// Each day's return (percent) = drift + volatility × N(0,1) draw, with
/// drift = ±trend_strength/days by direction. Same (seed, parameters, day
/// count) reproduce an identical series.
pub fn synthetic_series(base_price: f64, cfg: &SimulationConfig) -> Vec<PricePoint> {
    let seed = cfg.seed.unwrap_or(DEFAULT_SEED);
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0).expect("0/1 are valid normal parameters");

    let drift = match cfg.trend {
        TrendDirection::Up => cfg.trend_strength_percent / cfg.days.max(1) as f64,
        TrendDirection::Down => -cfg.trend_strength_percent / cfg.days.max(1) as f64,
        TrendDirection::Neutral => 0.0,
    };

    debug!(
        seed,
        days = cfg.days,
        drift = format!("{:.4}", drift),
        volatility = format!("{:.2}", cfg.volatility_percent),
        "Generating synthetic price series"
    );

    let floor = base_price * MIN_PRICE_FACTOR;
    let ceiling = base_price * MAX_PRICE_FACTOR;

    let mut points = Vec::with_capacity(cfg.days);
    let mut price = base_price;
    for day in 0..cfg.days {
        let return_percent = drift + cfg.volatility_percent * normal.sample(&mut rng);
        price = (price * (1.0 + return_percent / 100.0)).clamp(floor, ceiling);
        points.push(PricePoint {
            day,
            date: cfg.start_date + Duration::days(day as i64),
            close: price,
        });
    }
    points
}
