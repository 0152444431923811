//! Performance analytics over a completed run
//!
//! Pure functions of the trade log, equity curve and realized pairs.
//! Re-running them on the same inputs gives the same metrics, so a stored
//! result can always be re-analyzed without re-simulating.

use std::collections::BTreeMap;

use crate::types::{
    EquityPoint, LevelEfficiency, PerformanceMetrics, RealizedPair, Side, Trade,
};

/// Annualization factor for daily returns (trading days per year)
const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Derive summary metrics for one run
pub fn analyze(
    trades: &[Trade],
    equity_curve: &[EquityPoint],
    pairs: &[RealizedPair],
    initial_capital: f64,
) -> PerformanceMetrics {
    let final_equity = equity_curve
        .last()
        .map(|p| p.total_equity)
        .unwrap_or(initial_capital);
    let total_return_percent = if initial_capital > 0.0 {
        (final_equity - initial_capital) / initial_capital * 100.0
    } else {
        0.0
    };

    let winning = pairs.iter().filter(|p| p.gain > 0.0).count();
    let win_rate = if pairs.is_empty() {
        0.0
    } else {
        winning as f64 / pairs.len() as f64
    };

    let buy_trades = trades.iter().filter(|t| t.side == Side::Buy).count();
    let sell_trades = trades.len() - buy_trades;

    PerformanceMetrics {
        total_return_percent,
        win_rate,
        sharpe_ratio: sharpe_ratio(equity_curve),
        max_drawdown: max_drawdown(equity_curve),
        total_trades: trades.len(),
        buy_trades,
        sell_trades,
        realized_gain: pairs.iter().map(|p| p.gain).sum(),
        total_fees: trades.iter().map(|t| t.fees.total()).sum(),
        level_efficiency: level_efficiency(trades, pairs),
    }
}

/// Annualized Sharpe over daily equity returns, no risk-free leg
///
/// None when fewer than two curve points exist or the return series has
/// zero variance (a flat curve has no meaningful risk-adjusted figure).
pub fn sharpe_ratio(equity_curve: &[EquityPoint]) -> Option<f64> {
    if equity_curve.len() < 2 {
        return None;
    }
    let returns: Vec<f64> = equity_curve
        .windows(2)
        .filter(|w| w[0].total_equity > 0.0)
        .map(|w| (w[1].total_equity - w[0].total_equity) / w[0].total_equity)
        .collect();
    if returns.len() < 2 {
        return None;
    }

    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>()
        / (returns.len() - 1) as f64;
    let std_dev = variance.sqrt();
    if std_dev == 0.0 {
        return None;
    }
    Some(mean / std_dev * TRADING_DAYS_PER_YEAR.sqrt())
}

/// Largest peak-to-trough decline as a fraction of the peak, one pass
pub fn max_drawdown(equity_curve: &[EquityPoint]) -> f64 {
    let mut peak = f64::MIN;
    let mut worst = 0.0f64;
    for point in equity_curve {
        peak = peak.max(point.total_equity);
        if peak > 0.0 {
            worst = worst.max((peak - point.total_equity) / peak);
        }
    }
    worst
}

/// Per-level breakdown: fill counts from the trade log on both sides,
/// realized gain attributed to the level that bought the lot
fn level_efficiency(trades: &[Trade], pairs: &[RealizedPair]) -> Vec<LevelEfficiency> {
    let mut fills: BTreeMap<i32, usize> = BTreeMap::new();
    for trade in trades {
        *fills.entry(trade.level_index).or_insert(0) += 1;
    }
    let mut gains: BTreeMap<i32, f64> = BTreeMap::new();
    for pair in pairs {
        *gains.entry(pair.level_index).or_insert(0.0) += pair.gain;
    }

    let total_fills = trades.len();
    let total_gain: f64 = pairs.iter().map(|p| p.gain).sum();

    let mut indices: Vec<i32> = fills.keys().chain(gains.keys()).copied().collect();
    indices.sort_unstable();
    indices.dedup();

    indices
        .into_iter()
        .map(|level_index| {
            let level_fills = fills.get(&level_index).copied().unwrap_or(0);
            let gain = gains.get(&level_index).copied().unwrap_or(0.0);
            LevelEfficiency {
                level_index,
                fills: level_fills,
                fill_share: if total_fills > 0 {
                    level_fills as f64 / total_fills as f64
                } else {
                    0.0
                },
                gain,
                gain_share: if total_gain.abs() > f64::EPSILON {
                    gain / total_gain
                } else {
                    0.0
                },
            }
        })
        .collect()
}
