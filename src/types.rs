//! Core data types used across the grid engine

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fees::FeeBreakdown;

/// Validation errors for grid parameters
///
/// These are rejected at the boundary, before any ladder is generated or
/// simulation started.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("prices must be positive: base={base}, min={min}, max={max}")]
    NonPositivePrice { base: f64, min: f64, max: f64 },

    #[error("min price ({min}) must be below max price ({max})")]
    MinNotBelowMax { min: f64, max: f64 },

    #[error("base price ({base}) must lie strictly between min ({min}) and max ({max})")]
    BaseOutOfRange { base: f64, min: f64, max: f64 },

    #[error("grid interval ({0}%) must be > 0")]
    NonPositiveInterval(f64),

    #[error("investment amounts must be positive: base={base}, max={max}")]
    NonPositiveInvestment { base: f64, max: f64 },

    #[error("price range and interval produce only {0} level(s); at least 2 required")]
    TooFewLevels(usize),
}

/// Engine-level errors
///
/// Nothing here is retried internally: the engine is deterministic given its
/// inputs, so retry policy belongs to the caller.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("historical series too short: requested {requested} days, got {available}")]
    InsufficientData { requested: usize, available: usize },

    /// Arithmetic or invariant fault during the walk. The run is aborted and
    /// no partial result is returned.
    #[error("simulation fault: {0}")]
    Simulation(String),

    /// Post-condition violation in lot matching. Indicates a simulator bug,
    /// surfaced rather than swallowed.
    #[error("lot pairing fault: {0}")]
    Pairing(String),
}

/// Trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

/// A single day in a price series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Day index within the simulated window, starting at 0
    pub day: usize,
    pub date: NaiveDate,
    pub close: f64,
}

/// Fill state of a grid level
///
/// `Empty` ↔ `Long` ↔ back to `Empty` when the level re-arms, or `Exhausted`
/// when re-arming is disabled. Only the simulator mutates this.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LevelState {
    /// No position held at this level
    Empty,
    /// Position held, bought when price crossed down through this level
    Long { quantity: f64 },
    /// Sold and retired for the rest of the run
    Exhausted,
}

/// A single rung of the grid ladder
///
/// Index 0 is the base price; negative indices sit below base (buy-heavier),
/// positive above. Price is strictly monotonic in the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridLevel {
    pub index: i32,
    pub price: f64,
    /// Target amount to deploy when this level buys
    pub investment: f64,
    pub state: LevelState,
}

impl GridLevel {
    pub fn is_long(&self) -> bool {
        matches!(self.state, LevelState::Long { .. })
    }

    /// Quantity held at this level, 0 unless long
    pub fn held_quantity(&self) -> f64 {
        match self.state {
            LevelState::Long { quantity } => quantity,
            _ => 0.0,
        }
    }
}

/// An executed trade, immutable once created
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    /// Sequence id within the run, in execution order
    pub id: usize,
    /// Ladder index the trade executed at
    pub level_index: i32,
    pub side: Side,
    /// Execution price (the day's close)
    pub price: f64,
    pub quantity: f64,
    /// price × quantity, before fees
    pub gross_amount: f64,
    pub fees: FeeBreakdown,
    pub day: usize,
    pub date: NaiveDate,
}

/// A matched buy/sell (possibly partial on either side), produced by the
/// lot pairing engine. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealizedPair {
    pub buy_trade_id: usize,
    pub sell_trade_id: usize,
    /// Ladder index of the buy lot the gain is attributed to
    pub level_index: i32,
    pub quantity: f64,
    pub buy_price: f64,
    pub sell_price: f64,
    /// (sell_price − buy_price) × quantity
    pub gain: f64,
}

/// Daily mark-to-market snapshot
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EquityPoint {
    pub day: usize,
    pub date: NaiveDate,
    pub position_value: f64,
    pub cash: f64,
    pub total_equity: f64,
}

/// How a simulation run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum EndReason {
    /// Price series exhausted without breaching a bound
    Completed,
    /// Stop-loss or take-profit breached; remaining longs were force-
    /// liquidated at the breach close. Not an error.
    Stopped { day: usize },
}

/// Per-level efficiency breakdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelEfficiency {
    pub level_index: i32,
    /// Trades executed at this level (both sides)
    pub fills: usize,
    /// fills / total fills
    pub fill_share: f64,
    /// Realized gain attributed to this level's buy lots
    pub gain: f64,
    /// gain / total realized gain (0 when total is 0)
    pub gain_share: f64,
}

/// Summary statistics derived from a completed run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// (final equity − initial equity) / initial equity × 100
    pub total_return_percent: f64,
    /// Winning pairs / all pairs, 0 when no pairs closed
    pub win_rate: f64,
    /// mean(daily equity return) / stddev × √252; None when stddev is 0
    pub sharpe_ratio: Option<f64>,
    /// Peak-to-trough decline as a fraction of the peak
    pub max_drawdown: f64,
    pub total_trades: usize,
    pub buy_trades: usize,
    pub sell_trades: usize,
    pub realized_gain: f64,
    pub total_fees: f64,
    pub level_efficiency: Vec<LevelEfficiency>,
}

/// Everything a single simulation run produced
///
/// Returned by value; no shared mutable state survives the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub levels: Vec<GridLevel>,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub pairs: Vec<RealizedPair>,
    pub metrics: PerformanceMetrics,
    pub end_reason: EndReason,
    pub initial_capital: f64,
    pub final_cash: f64,
    /// Shares still held across all levels at the end of the run
    pub final_position: f64,
    pub realized_gain: f64,
    pub unrealized_pnl: f64,
}
