//! Configuration management
//!
//! Grid parameters, simulation settings and JSON file loading for the CLI.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::fees::CommissionPlan;

/// Position sizing across the ladder
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SizingMode {
    /// Same target investment at every level
    Flat,
    /// Investment grows by `increase_percent` per level outward from base,
    /// capped so the ladder total never exceeds `max_investment`
    Progressive { increase_percent: f64 },
}

impl Default for SizingMode {
    fn default() -> Self {
        SizingMode::Flat
    }
}

/// Parameters defining a grid ladder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridParameters {
    /// Reference price the ladder is built outward from
    pub base_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    /// Multiplicative step between adjacent levels, in percent
    pub grid_interval_percent: f64,
    /// Target investment at the base level
    pub base_investment: f64,
    /// Hard cap on the sum of all level investments
    pub max_investment: f64,
    #[serde(default)]
    pub sizing: SizingMode,
}

impl Default for GridParameters {
    fn default() -> Self {
        GridParameters {
            base_price: 100.0,
            min_price: 80.0,
            max_price: 120.0,
            grid_interval_percent: 5.0,
            base_investment: 1_000.0,
            max_investment: 20_000.0,
            sizing: SizingMode::Flat,
        }
    }
}

/// Drift direction for synthetic price generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
    Neutral,
}

impl Default for TrendDirection {
    fn default() -> Self {
        TrendDirection::Neutral
    }
}

/// Settings for a single simulation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of trading days to walk
    pub days: usize,
    /// Daily standard deviation of synthetic returns, in percent
    #[serde(default)]
    pub volatility_percent: f64,
    #[serde(default)]
    pub trend: TrendDirection,
    /// Total drift over the window, in percent, spread across `days`
    #[serde(default)]
    pub trend_strength_percent: f64,
    /// Seed for the synthetic price generator; same seed + parameters
    /// reproduce an identical series
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Percent below base that force-liquidates and stops the run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_loss_percent: Option<f64>,
    /// Percent above base that force-liquidates and stops the run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take_profit_percent: Option<f64>,
    /// Return a sold level to `Empty` so it can buy again (grid semantics).
    /// When false, sold levels are retired for the rest of the run.
    #[serde(default = "default_rearm")]
    pub rearm_on_profit: bool,
    /// Quantities are rounded down to a multiple of this
    #[serde(default = "default_lot_size")]
    pub lot_size: f64,
    /// First calendar day of the window
    #[serde(default = "default_start_date")]
    pub start_date: NaiveDate,
    /// Historical closes to replay instead of generating a synthetic series
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical_closes: Option<Vec<f64>>,
}

fn default_rearm() -> bool {
    true
}

fn default_lot_size() -> f64 {
    1.0
}

fn default_start_date() -> NaiveDate {
    chrono::Local::now().date_naive()
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            days: 30,
            volatility_percent: 2.0,
            trend: TrendDirection::Neutral,
            trend_strength_percent: 0.0,
            seed: None,
            stop_loss_percent: None,
            take_profit_percent: None,
            rearm_on_profit: true,
            lot_size: 1.0,
            start_date: default_start_date(),
            historical_closes: None,
        }
    }
}

/// Value lists for what-if parameter sweeps
///
/// Candidates are the cartesian product of the lists, applied over a base
/// parameter set. Empty lists fall back to the base value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepGrid {
    #[serde(default)]
    pub grid_interval_percent: Vec<f64>,
    #[serde(default)]
    pub base_investment: Vec<f64>,
    #[serde(default)]
    pub increase_percent: Vec<f64>,
}

impl SweepGrid {
    /// Expand into concrete candidate parameter sets
    pub fn expand(&self, base: &GridParameters) -> Vec<GridParameters> {
        use itertools::iproduct;

        let intervals = non_empty_or(&self.grid_interval_percent, base.grid_interval_percent);
        let investments = non_empty_or(&self.base_investment, base.base_investment);
        let increases: Vec<Option<f64>> = if self.increase_percent.is_empty() {
            vec![None]
        } else {
            self.increase_percent.iter().copied().map(Some).collect()
        };

        iproduct!(intervals, investments, increases)
            .map(|(interval, investment, increase)| {
                let mut params = base.clone();
                params.grid_interval_percent = interval;
                params.base_investment = investment;
                if let Some(pct) = increase {
                    params.sizing = SizingMode::Progressive {
                        increase_percent: pct,
                    };
                }
                params
            })
            .collect()
    }

    pub fn total_combinations(&self) -> usize {
        self.grid_interval_percent.len().max(1)
            * self.base_investment.len().max(1)
            * self.increase_percent.len().max(1)
    }
}

fn non_empty_or(values: &[f64], fallback: f64) -> Vec<f64> {
    if values.is_empty() {
        vec![fallback]
    } else {
        values.to_vec()
    }
}

/// Top-level configuration file for the CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub params: GridParameters,
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Funds the validator checks the ladder against
    #[serde(default = "default_available_funds")]
    pub available_funds: f64,
    #[serde(default)]
    pub fees: CommissionPlan,
    /// Sweep value lists for the `sweep` subcommand (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sweep: Option<SweepGrid>,
}

fn default_available_funds() -> f64 {
    100_000.0
}

impl Config {
    /// Load configuration from JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config JSON")?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            params: GridParameters::default(),
            simulation: SimulationConfig::default(),
            available_funds: default_available_funds(),
            fees: CommissionPlan::default(),
            sweep: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_grid_expansion() {
        let sweep = SweepGrid {
            grid_interval_percent: vec![3.0, 5.0],
            base_investment: vec![1_000.0, 2_000.0, 3_000.0],
            increase_percent: vec![],
        };
        let base = GridParameters::default();
        let candidates = sweep.expand(&base);
        assert_eq!(candidates.len(), 6);
        assert_eq!(candidates.len(), sweep.total_combinations());
        assert!(candidates.iter().all(|c| c.sizing == SizingMode::Flat));
    }

    #[test]
    fn test_sweep_grid_empty_lists_use_base() {
        let sweep = SweepGrid::default();
        let base = GridParameters::default();
        let candidates = sweep.expand(&base);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0], base);
    }

    #[test]
    fn test_simulation_config_defaults_from_json() {
        let cfg: SimulationConfig = serde_json::from_str(r#"{ "days": 60 }"#).unwrap();
        assert_eq!(cfg.days, 60);
        assert!(cfg.rearm_on_profit);
        assert_eq!(cfg.lot_size, 1.0);
        assert!(cfg.seed.is_none());
        assert!(cfg.stop_loss_percent.is_none());
    }
}
