//! Grid simulation state machine
//!
//! Walks a price series day by day against the ladder. Each level is a
//! small state machine (`Empty` ↔ `Long` → `Exhausted`) held in an arena;
//! transitions append trades and the equity curve is marked to market once
//! per day whether or not anything traded.

use ordered_float::OrderedFloat;
use tracing::{debug, trace};

use crate::analyzer;
use crate::config::{GridParameters, SimulationConfig};
use crate::fees::FeeCalculator;
use crate::levels::generate_levels;
use crate::pairing::pair_trades;
use crate::series;
use crate::types::{
    EndReason, EngineError, EquityPoint, GridLevel, LevelState, PricePoint, Side,
    SimulationResult, Trade,
};

/// One simulation run over a ladder and a price series
pub struct GridSimulator<'a> {
    params: &'a GridParameters,
    cfg: &'a SimulationConfig,
    fees: &'a dyn FeeCalculator,
}

impl<'a> GridSimulator<'a> {
    pub fn new(
        params: &'a GridParameters,
        cfg: &'a SimulationConfig,
        fees: &'a dyn FeeCalculator,
    ) -> Self {
        GridSimulator { params, cfg, fees }
    }

    /// Generate the ladder and series, walk the series, pair lots and
    /// derive metrics. Returns a self-contained result by value.
    pub fn run(&self) -> Result<SimulationResult, EngineError> {
        let levels = generate_levels(self.params)?;
        let points = series::build_series(self.params.base_price, self.cfg)?;
        self.walk(levels, &points)
    }

    fn walk(
        &self,
        mut levels: Vec<GridLevel>,
        points: &[PricePoint],
    ) -> Result<SimulationResult, EngineError> {
        let initial_capital = self.params.max_investment;
        let mut cash = initial_capital;
        let mut trades: Vec<Trade> = Vec::new();
        let mut equity_curve: Vec<EquityPoint> = Vec::with_capacity(points.len());
        let mut end_reason = EndReason::Completed;

        // Seeding the previous close with the base price makes the first
        // day's crossings behave as if the price had sat at base: levels
        // the opening close already dipped below buy immediately, levels
        // above base stay armed until approached from above.
        let mut prev_close = self.params.base_price;

        let stop_price = self
            .cfg
            .stop_loss_percent
            .map(|p| self.params.base_price * (1.0 - p / 100.0));
        let take_price = self
            .cfg
            .take_profit_percent
            .map(|p| self.params.base_price * (1.0 + p / 100.0));

        // Evaluation order scratch, nearest-to-price levels first
        let mut order: Vec<usize> = (0..levels.len()).collect();

        for point in points {
            let close = point.close;
            if !close.is_finite() || close <= 0.0 {
                return Err(EngineError::Simulation(format!(
                    "non-positive close {} on day {}",
                    close, point.day
                )));
            }

            // A breached bound short-circuits the whole day: remaining longs
            // are liquidated at the breach close and the run ends.
            let breached = stop_price.is_some_and(|p| close <= p)
                || take_price.is_some_and(|p| close >= p);
            if breached {
                debug!(
                    day = point.day,
                    close = format!("{:.4}", close),
                    "Protective bound breached, force-liquidating"
                );
                for level in levels.iter_mut() {
                    if let LevelState::Long { quantity } = level.state {
                        let trade =
                            self.make_trade(trades.len(), level, Side::Sell, close, quantity, point);
                        cash += trade.gross_amount - trade.fees.total();
                        level.state = LevelState::Exhausted;
                        trades.push(trade);
                    }
                }
                equity_curve.push(mark_to_market(&levels, cash, close, point));
                end_reason = EndReason::Stopped { day: point.day };
                break;
            }

            order.sort_by_key(|&i| OrderedFloat((levels[i].price - close).abs()));
            for &i in &order {
                let level_price = levels[i].price;
                match levels[i].state {
                    LevelState::Empty => {
                        let crossed_down = prev_close >= level_price && close < level_price;
                        if crossed_down {
                            if let Some(trade) =
                                self.try_buy(&levels[i], close, cash, trades.len(), point)
                            {
                                cash -= trade.gross_amount + trade.fees.total();
                                levels[i].state = LevelState::Long {
                                    quantity: trade.quantity,
                                };
                                trades.push(trade);
                            }
                        }
                    }
                    LevelState::Long { quantity } => {
                        let crossed_up = prev_close <= level_price && close > level_price;
                        if crossed_up {
                            let trade = self.make_trade(
                                trades.len(),
                                &levels[i],
                                Side::Sell,
                                close,
                                quantity,
                                point,
                            );
                            cash += trade.gross_amount - trade.fees.total();
                            levels[i].state = if self.cfg.rearm_on_profit {
                                LevelState::Empty
                            } else {
                                LevelState::Exhausted
                            };
                            trades.push(trade);
                        }
                    }
                    LevelState::Exhausted => {}
                }
            }

            equity_curve.push(mark_to_market(&levels, cash, close, point));
            prev_close = close;
        }

        let pairs = pair_trades(&trades)?;
        let metrics = analyzer::analyze(&trades, &equity_curve, &pairs, initial_capital);

        let final_position: f64 = levels.iter().map(|l| l.held_quantity()).sum();
        let final_close = points.last().map(|p| p.close).unwrap_or(self.params.base_price);
        let realized_gain: f64 = pairs.iter().map(|p| p.gain).sum();
        let matched_cost: f64 = pairs.iter().map(|p| p.quantity * p.buy_price).sum();
        let total_buy_cost: f64 = trades
            .iter()
            .filter(|t| t.side == Side::Buy)
            .map(|t| t.gross_amount)
            .sum();
        let open_cost = total_buy_cost - matched_cost;
        let unrealized_pnl = if final_position > 0.0 {
            final_position * final_close - open_cost
        } else {
            0.0
        };

        Ok(SimulationResult {
            levels,
            trades,
            equity_curve,
            pairs,
            metrics,
            end_reason,
            initial_capital,
            final_cash: cash,
            final_position,
            realized_gain,
            unrealized_pnl,
        })
    }

    /// Size and cost a buy at the day's close; None when the quantity
    /// rounds to zero lots or cash cannot cover gross plus fees
    fn try_buy(
        &self,
        level: &GridLevel,
        close: f64,
        cash: f64,
        trade_id: usize,
        point: &PricePoint,
    ) -> Option<Trade> {
        let lot = self.cfg.lot_size;
        let quantity = ((level.investment / level.price) / lot).floor() * lot;
        if quantity <= 0.0 {
            trace!(
                level = level.index,
                "Buy skipped: investment too small for one lot"
            );
            return None;
        }
        let trade = self.make_trade(trade_id, level, Side::Buy, close, quantity, point);
        if trade.gross_amount + trade.fees.total() > cash {
            debug!(
                level = level.index,
                needed = format!("{:.2}", trade.gross_amount + trade.fees.total()),
                cash = format!("{:.2}", cash),
                "Buy skipped: insufficient cash"
            );
            return None;
        }
        Some(trade)
    }

    fn make_trade(
        &self,
        id: usize,
        level: &GridLevel,
        side: Side,
        price: f64,
        quantity: f64,
        point: &PricePoint,
    ) -> Trade {
        let gross_amount = price * quantity;
        let fees = self.fees.fees(gross_amount, side);
        trace!(
            level = level.index,
            side = ?side,
            price = format!("{:.4}", price),
            quantity,
            "Grid transition"
        );
        Trade {
            id,
            level_index: level.index,
            side,
            price,
            quantity,
            gross_amount,
            fees,
            day: point.day,
            date: point.date,
        }
    }
}

fn mark_to_market(levels: &[GridLevel], cash: f64, close: f64, point: &PricePoint) -> EquityPoint {
    let position: f64 = levels.iter().map(|l| l.held_quantity()).sum();
    let position_value = position * close;
    EquityPoint {
        day: point.day,
        date: point.date,
        position_value,
        cash,
        total_equity: cash + position_value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SizingMode;
    use crate::fees::NoFees;
    use chrono::NaiveDate;

    fn params() -> GridParameters {
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

    fn cfg_with_history(closes: Vec<f64>) -> SimulationConfig {
        SimulationConfig {
            days: closes.len(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            historical_closes: Some(closes),
            ..SimulationConfig::default()
        }
    }

    fn run(params: &GridParameters, cfg: &SimulationConfig) -> SimulationResult {
        GridSimulator::new(params, cfg, &NoFees).run().unwrap()
    }

    #[test]
    fn test_buy_fires_on_downward_cross() {
        // 100 → 94 crosses the base level (100) and the -1 level (95.24)
        let result = run(&params(), &cfg_with_history(vec![100.0, 94.0, 94.5]));
        assert_eq!(result.trades.len(), 2);
        assert!(result.trades.iter().all(|t| t.side == Side::Buy));
        assert!(result.trades.iter().all(|t| t.day == 1 && t.price == 94.0));
        let mut indices: Vec<i32> = result.trades.iter().map(|t| t.level_index).collect();
        indices.sort_unstable();
        assert_eq!(indices, vec![-1, 0]);
    }

    #[test]
    fn test_buy_quantity_from_level_price_rounded_to_lot() {
        let result = run(&params(), &cfg_with_history(vec![100.0, 94.0]));
        // 1000 / 95.238... = 10.5 shares, floored to whole shares
        assert_eq!(result.trades[0].quantity, 10.0);
    }

    #[test]
    fn test_sell_fires_on_upward_cross_and_rearms() {
        let closes = vec![100.0, 94.0, 96.0, 94.0, 96.5];
        let result = run(&params(), &cfg_with_history(closes));
        // Day 1 buys levels -1 and 0; level -1 then cycles sell/buy/sell as
        // the price oscillates across 95.24, while level 0 stays long
        let sides: Vec<Side> = result.trades.iter().map(|t| t.side).collect();
        assert_eq!(
            sides,
            vec![Side::Buy, Side::Buy, Side::Sell, Side::Buy, Side::Sell]
        );
        assert_eq!(result.pairs.len(), 2);
        assert!(result.pairs.iter().all(|p| p.gain > 0.0));
        let minus_one = result.levels.iter().find(|l| l.index == -1).unwrap();
        assert_eq!(minus_one.state, LevelState::Empty);
    }

    #[test]
    fn test_no_rearm_exhausts_level() {
        let mut cfg = cfg_with_history(vec![100.0, 94.0, 96.0, 94.0, 96.5]);
        cfg.rearm_on_profit = false;
        let result = run(&params(), &cfg);
        // Second dip must not re-buy the retired level: two opening buys
        // plus the single sell
        assert_eq!(result.trades.len(), 3);
        let level = result.levels.iter().find(|l| l.index == -1).unwrap();
        assert_eq!(level.state, LevelState::Exhausted);
    }

    #[test]
    fn test_no_ping_pong_on_single_tick() {
        // Heavy oscillation around a level: every consecutive trade pair at
        // a level must alternate sides
        let closes = vec![100.0, 94.0, 96.0, 94.2, 95.8, 94.1, 96.2, 93.9, 96.1];
        let result = run(&params(), &cfg_with_history(closes));
        let mut per_level: std::collections::HashMap<i32, Vec<Side>> = Default::default();
        for t in &result.trades {
            per_level.entry(t.level_index).or_default().push(t.side);
        }
        for sides in per_level.values() {
            for pair in sides.windows(2) {
                assert_ne!(pair[0], pair[1], "same-side trades without opposite cross");
            }
        }
    }

    #[test]
    fn test_opening_below_base_buys_crossed_levels_once() {
        // The window opens at 90, below the base, -1 and -2 levels; all
        // three buy on day 0 and never again while the price stays put
        let result = run(&params(), &cfg_with_history(vec![90.0, 90.0, 90.0]));
        assert_eq!(result.trades.len(), 3);
        assert!(result.trades.iter().all(|t| t.day == 0));
        let mut indices: Vec<i32> = result.trades.iter().map(|t| t.level_index).collect();
        indices.sort_unstable();
        assert_eq!(indices, vec![-2, -1, 0]);
    }

    #[test]
    fn test_tiny_investment_rounds_to_no_trade() {
        let mut p = params();
        p.max_investment = 500.0; // scaled ladder: ~55 per level, rounds to 0 shares at ~95
        let result = run(&p, &cfg_with_history(vec![100.0, 94.0]));
        assert!(result.trades.is_empty());
    }

    #[test]
    fn test_stop_loss_terminates_early() {
        let closes = vec![100.0, 95.0, 90.0, 84.0, 83.0, 82.0];
        let mut cfg = cfg_with_history(closes);
        cfg.stop_loss_percent = Some(15.0);
        let result = run(&params(), &cfg);
        assert_eq!(result.end_reason, EndReason::Stopped { day: 3 });
        // Walk stopped before the full window
        assert_eq!(result.equity_curve.len(), 4);
        assert_eq!(result.final_position, 0.0);
        // Forced liquidation closed every long level
        assert!(result
            .levels
            .iter()
            .all(|l| !matches!(l.state, LevelState::Long { .. })));
    }

    #[test]
    fn test_take_profit_terminates_early() {
        let closes = vec![100.0, 104.0, 108.0, 111.0, 112.0];
        let mut cfg = cfg_with_history(closes);
        cfg.take_profit_percent = Some(10.0);
        let result = run(&params(), &cfg);
        assert_eq!(result.end_reason, EndReason::Stopped { day: 3 });
    }

    #[test]
    fn test_equity_marked_every_day() {
        let closes = vec![100.0, 99.0, 98.0, 97.0, 96.0];
        let result = run(&params(), &cfg_with_history(closes));
        assert_eq!(result.equity_curve.len(), 5);
        for (day, point) in result.equity_curve.iter().enumerate() {
            assert_eq!(point.day, day);
            assert!((point.total_equity - point.cash - point.position_value).abs() < 1e-9);
        }
    }

    #[test]
    fn test_non_positive_close_aborts_run() {
        let result = GridSimulator::new(
            &params(),
            &cfg_with_history(vec![100.0, 0.0, 95.0]),
            &NoFees,
        )
        .run();
        assert!(matches!(result, Err(EngineError::Simulation(_))));
    }

    #[test]
    fn test_cash_conservation_without_fees() {
        let closes = vec![100.0, 94.0, 96.0, 89.0, 92.0, 96.0];
        let result = run(&params(), &cfg_with_history(closes));
        let spent: f64 = result
            .trades
            .iter()
            .filter(|t| t.side == Side::Buy)
            .map(|t| t.gross_amount)
            .sum();
        let received: f64 = result
            .trades
            .iter()
            .filter(|t| t.side == Side::Sell)
            .map(|t| t.gross_amount)
            .sum();
        assert!(
            (result.final_cash - (result.initial_capital - spent + received)).abs() < 1e-6
        );
    }
}
