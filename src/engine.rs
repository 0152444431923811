//! Engine facade
//!
//! Bundles ladder generation, validation, simulation and analytics behind
//! one entry point holding the fee model. Sweeps fan candidate parameter
//! sets across a rayon pool; everything else is single-threaded and
//! deterministic.

use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::analyzer;
use crate::config::{GridParameters, SimulationConfig};
use crate::fees::{CommissionPlan, FeeCalculator};
use crate::levels::generate_levels;
use crate::simulator::GridSimulator;
use crate::types::{ConfigError, EngineError, GridLevel, PerformanceMetrics, SimulationResult};
use crate::validator::{self, ValidationReport};

/// How a ladder holds up under a hypothetical adverse move
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PressureReport {
    /// Assumed decline from base, in percent
    pub drawdown_percent: f64,
    /// Price after the assumed decline
    pub stressed_price: f64,
    /// Levels at or above the stressed price, all of which would fill
    pub triggered_levels: usize,
    /// Capital those fills would consume
    pub required_capital: f64,
    pub available_funds: f64,
    /// required_capital / available_funds × 100
    pub utilization_percent: f64,
    /// Whether available funds cover every triggered level
    pub feasible: bool,
}

/// One candidate's outcome in a parameter sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepOutcome {
    pub params: GridParameters,
    pub metrics: PerformanceMetrics,
}

/// Facade over the full pipeline, parameterized by fee model
pub struct GridEngine {
    fees: Box<dyn FeeCalculator>,
}

impl GridEngine {
    pub fn new(fees: Box<dyn FeeCalculator>) -> Self {
        GridEngine { fees }
    }

    /// Engine with the default commission plan
    pub fn with_default_fees() -> Self {
        GridEngine::new(Box::new(CommissionPlan::default()))
    }

    /// Generate a ladder and score it against available funds, without
    /// running a simulation
    pub fn preview(
        &self,
        params: &GridParameters,
        available_funds: f64,
    ) -> Result<(Vec<GridLevel>, ValidationReport), ConfigError> {
        let levels = generate_levels(params)?;
        let report = validator::validate(params, &levels, available_funds);
        Ok((levels, report))
    }

    /// Run one full simulation
    pub fn simulate(
        &self,
        params: &GridParameters,
        cfg: &SimulationConfig,
    ) -> Result<SimulationResult, EngineError> {
        GridSimulator::new(params, cfg, self.fees.as_ref()).run()
    }

    /// Re-derive metrics from a stored result. Pure: always matches the
    /// metrics embedded at simulation time.
    pub fn analyze(&self, result: &SimulationResult) -> PerformanceMetrics {
        analyzer::analyze(
            &result.trades,
            &result.equity_curve,
            &result.pairs,
            result.initial_capital,
        )
    }

    /// Stress a ladder against a hypothetical decline from base
    ///
    /// Assumes every level at or above the stressed price fills at its
    /// target investment and reports the capital that would consume.
    pub fn pressure_test(
        &self,
        params: &GridParameters,
        drawdown_percent: f64,
        available_funds: f64,
    ) -> Result<PressureReport, ConfigError> {
        let levels = generate_levels(params)?;
        let stressed_price = params.base_price * (1.0 - drawdown_percent / 100.0);

        let triggered: Vec<&GridLevel> = levels
            .iter()
            .filter(|l| l.price >= stressed_price)
            .collect();
        let required_capital: f64 = triggered.iter().map(|l| l.investment).sum();
        let utilization_percent = if available_funds > 0.0 {
            required_capital / available_funds * 100.0
        } else {
            0.0
        };

        Ok(PressureReport {
            drawdown_percent,
            stressed_price,
            triggered_levels: triggered.len(),
            required_capital,
            available_funds,
            utilization_percent,
            feasible: required_capital <= available_funds,
        })
    }

    /// Simulate every candidate in parallel and rank by Sharpe, best first
    ///
    /// Candidates whose run fails are logged and dropped from the ranking.
    /// Sharpe-less outcomes (flat equity) sort after everything else.
    pub fn sweep(
        &self,
        candidates: &[GridParameters],
        cfg: &SimulationConfig,
    ) -> Vec<SweepOutcome> {
        info!(candidates = candidates.len(), "Starting parameter sweep");

        let progress = ProgressBar::new(candidates.len() as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        let mut outcomes: Vec<SweepOutcome> = candidates
            .par_iter()
            .progress_with(progress)
            .filter_map(|params| {
                match GridSimulator::new(params, cfg, self.fees.as_ref()).run() {
                    Ok(result) => Some(SweepOutcome {
                        params: params.clone(),
                        metrics: result.metrics,
                    }),
                    Err(e) => {
                        warn!(
                            interval = params.grid_interval_percent,
                            investment = params.base_investment,
                            error = %e,
                            "Sweep candidate failed, skipping"
                        );
                        None
                    }
                }
            })
            .collect();

        outcomes.sort_by_key(|o| {
            std::cmp::Reverse(
                o.metrics
                    .sharpe_ratio
                    .map(OrderedFloat)
                    .unwrap_or(OrderedFloat(f64::NEG_INFINITY)),
            )
        });
        info!(ranked = outcomes.len(), "Sweep complete");
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SweepGrid, TrendDirection};
    use crate::fees::NoFees;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn engine() -> GridEngine {
        GridEngine::new(Box::new(NoFees))
    }

    fn params() -> GridParameters {
        GridParameters::default()
    }

    fn sim_cfg() -> SimulationConfig {
        SimulationConfig {
            days: 60,
            volatility_percent: 2.0,
            trend: TrendDirection::Neutral,
            trend_strength_percent: 0.0,
            seed: Some(42),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn test_preview_returns_ladder_and_report() {
        let (levels, report) = engine().preview(&params(), 50_000.0).unwrap();
        assert!(levels.len() >= 2);
        assert_eq!(report.score, 100.0);
    }

    #[test]
    fn test_preview_rejects_bad_params() {
        let mut p = params();
        p.grid_interval_percent = -1.0;
        assert!(engine().preview(&p, 50_000.0).is_err());
    }

    #[test]
    fn test_analyze_matches_embedded_metrics() {
        let e = engine();
        let result = e.simulate(&params(), &sim_cfg()).unwrap();
        let rederived = e.analyze(&result);
        assert_relative_eq!(
            rederived.total_return_percent,
            result.metrics.total_return_percent
        );
        assert_eq!(rederived.total_trades, result.metrics.total_trades);
        assert_eq!(rederived.sharpe_ratio, result.metrics.sharpe_ratio);
    }

    #[test]
    fn test_simulate_is_deterministic_for_seed() {
        let e = engine();
        let a = e.simulate(&params(), &sim_cfg()).unwrap();
        let b = e.simulate(&params(), &sim_cfg()).unwrap();
        assert_eq!(a.trades.len(), b.trades.len());
        assert_eq!(
            a.equity_curve.last().unwrap().total_equity.to_bits(),
            b.equity_curve.last().unwrap().total_equity.to_bits()
        );
    }

    #[test]
    fn test_pressure_test_counts_triggered_levels() {
        // 10% down from 100 stresses to 90; levels at 90.70 and everything
        // above (7 of the 9) would fill
        let report = engine().pressure_test(&params(), 10.0, 50_000.0).unwrap();
        assert_relative_eq!(report.stressed_price, 90.0);
        assert_eq!(report.triggered_levels, 7);
        assert_relative_eq!(report.required_capital, 7_000.0);
        assert!(report.feasible);
    }

    #[test]
    fn test_pressure_test_flags_infeasible() {
        let report = engine().pressure_test(&params(), 20.0, 5_000.0).unwrap();
        assert!(!report.feasible);
        assert!(report.utilization_percent > 100.0);
    }

    #[test]
    fn test_sweep_ranks_by_sharpe() {
        let sweep = SweepGrid {
            grid_interval_percent: vec![3.0, 5.0, 8.0],
            base_investment: vec![1_000.0],
            increase_percent: vec![],
        };
        let candidates = sweep.expand(&params());
        let outcomes = engine().sweep(&candidates, &sim_cfg());
        assert_eq!(outcomes.len(), 3);
        let sharpes: Vec<f64> = outcomes
            .iter()
            .map(|o| o.metrics.sharpe_ratio.unwrap_or(f64::NEG_INFINITY))
            .collect();
        for pair in sharpes.windows(2) {
            assert!(pair[0] >= pair[1]);
        }
    }

    #[test]
    fn test_sweep_skips_failing_candidates() {
        let mut bad = params();
        bad.grid_interval_percent = -2.0;
        let candidates = vec![params(), bad];
        let outcomes = engine().sweep(&candidates, &sim_cfg());
        assert_eq!(outcomes.len(), 1);
    }
}
