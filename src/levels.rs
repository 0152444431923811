//! Grid ladder generation
//!
//! Turns `GridParameters` into an ordered ladder of price levels with a
//! target investment per level. Pure: the ladder is generated once per run
//! and only its fill state is mutated afterwards, by the simulator.

use tracing::debug;

use crate::config::{GridParameters, SizingMode};
use crate::types::{ConfigError, GridLevel, LevelState};

/// Reject malformed or impossible parameters before any work happens
pub fn validate_parameters(params: &GridParameters) -> Result<(), ConfigError> {
    if params.base_price <= 0.0 || params.min_price <= 0.0 || params.max_price <= 0.0 {
        return Err(ConfigError::NonPositivePrice {
            base: params.base_price,
            min: params.min_price,
            max: params.max_price,
        });
    }
    if params.min_price >= params.max_price {
        return Err(ConfigError::MinNotBelowMax {
            min: params.min_price,
            max: params.max_price,
        });
    }
    if params.base_price <= params.min_price || params.base_price >= params.max_price {
        return Err(ConfigError::BaseOutOfRange {
            base: params.base_price,
            min: params.min_price,
            max: params.max_price,
        });
    }
    if params.grid_interval_percent <= 0.0 {
        return Err(ConfigError::NonPositiveInterval(params.grid_interval_percent));
    }
    if params.base_investment <= 0.0 || params.max_investment <= 0.0 {
        return Err(ConfigError::NonPositiveInvestment {
            base: params.base_investment,
            max: params.max_investment,
        });
    }
    Ok(())
}

/// Generate the ladder, ascending by price
///
/// Steps outward from base multiplicatively: ×(1 + interval/100) going up,
/// ÷(1 + interval/100) going down. Steps past min/max are discarded; no
/// partial levels. Investments follow the sizing mode, then the whole
/// ladder is scaled down proportionally if it would exceed
/// `max_investment`, preserving relative shape.
pub fn generate_levels(params: &GridParameters) -> Result<Vec<GridLevel>, ConfigError> {
    validate_parameters(params)?;

    let step = 1.0 + params.grid_interval_percent / 100.0;
    let mut levels = Vec::new();

    // Base level and everything above it
    let mut price = params.base_price;
    let mut index = 0i32;
    while price <= params.max_price {
        levels.push(make_level(index, price, params));
        price *= step;
        index += 1;
    }

    // Everything below base
    let mut price = params.base_price / step;
    let mut index = -1i32;
    while price >= params.min_price {
        levels.push(make_level(index, price, params));
        price /= step;
        index -= 1;
    }

    if levels.len() < 2 {
        return Err(ConfigError::TooFewLevels(levels.len()));
    }

    levels.sort_by_key(|l| l.index);

    let total: f64 = levels.iter().map(|l| l.investment).sum();
    if total > params.max_investment {
        let scale = params.max_investment / total;
        for level in &mut levels {
            level.investment *= scale;
        }
        debug!(
            total = format!("{:.2}", total),
            cap = format!("{:.2}", params.max_investment),
            scale = format!("{:.4}", scale),
            "Ladder investment scaled down to fit cap"
        );
    }

    Ok(levels)
}

fn make_level(index: i32, price: f64, params: &GridParameters) -> GridLevel {
    let investment = match params.sizing {
        SizingMode::Flat => params.base_investment,
        SizingMode::Progressive { increase_percent } => {
            params.base_investment * (1.0 + increase_percent / 100.0).powi(index.abs())
        }
    };
    GridLevel {
        index,
        price,
        investment,
        state: LevelState::Empty,
    }
}
