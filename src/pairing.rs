//! Lot pairing
//!
//! Matches sell trades to prior buy trades, strict FIFO: the oldest open
//! lot absorbs each sell first, splitting either side when quantities
//! differ. Every sold unit must be attributable to a buy lot; anything
//! else is a simulator invariant violation, not a user error.

use std::collections::VecDeque;

use crate::types::{EngineError, RealizedPair, Side, Trade};

/// A buy trade awaiting pairing; `remaining` shrinks as sells consume it
#[derive(Debug, Clone)]
struct Lot {
    trade_id: usize,
    level_index: i32,
    price: f64,
    remaining: f64,
}

/// Quantities this close to zero count as fully consumed (floating point
/// residue from repeated partial splits)
const QTY_EPSILON: f64 = 1e-9;

/// Pair an ordered trade log into realized buy/sell matches
pub fn pair_trades(trades: &[Trade]) -> Result<Vec<RealizedPair>, EngineError> {
    let mut open: VecDeque<Lot> = VecDeque::new();
    let mut pairs = Vec::new();

    for trade in trades {
        match trade.side {
            Side::Buy => open.push_back(Lot {
                trade_id: trade.id,
                level_index: trade.level_index,
                price: trade.price,
                remaining: trade.quantity,
            }),
            Side::Sell => {
                let mut unmatched = trade.quantity;
                while unmatched > QTY_EPSILON {
                    let lot = open.front_mut().ok_or_else(|| {
                        EngineError::Pairing(format!(
                            "sell trade {} has {} unmatched quantity and no open lots",
                            trade.id, unmatched
                        ))
                    })?;
                    let matched = unmatched.min(lot.remaining);
                    pairs.push(RealizedPair {
                        buy_trade_id: lot.trade_id,
                        sell_trade_id: trade.id,
                        level_index: lot.level_index,
                        quantity: matched,
                        buy_price: lot.price,
                        sell_price: trade.price,
                        gain: (trade.price - lot.price) * matched,
                    });
                    lot.remaining -= matched;
                    unmatched -= matched;
                    if lot.remaining <= QTY_EPSILON {
                        open.pop_front();
                    }
                }
            }
        }
    }

    Ok(pairs)
}
