//! Fee calculation collaborator
//!
//! The simulator never computes fee math itself; it calls a `FeeCalculator`
//! per trade. `CommissionPlan` models a brokerage commission scheme
//! (commission with a minimum, transfer fee, stamp tax on sells only).

use serde::{Deserialize, Serialize};

use crate::types::Side;

/// Fee components of a single trade
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub commission: f64,
    pub transfer_fee: f64,
    pub stamp_tax: f64,
}

impl FeeBreakdown {
    pub fn total(&self) -> f64 {
        self.commission + self.transfer_fee + self.stamp_tax
    }
}

/// External fee-calculation seam
///
/// `Send + Sync` so parallel sweeps can share one instance.
pub trait FeeCalculator: Send + Sync {
    /// Fees for a trade of `gross_amount` on the given side
    fn fees(&self, gross_amount: f64, side: Side) -> FeeBreakdown;
}

/// Rate-based commission plan
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommissionPlan {
    /// Commission as a fraction of gross amount
    pub commission_rate: f64,
    /// Floor applied to the commission of every trade
    pub min_commission: f64,
    pub transfer_fee_rate: f64,
    /// Charged on sells only
    pub stamp_tax_rate: f64,
}

impl Default for CommissionPlan {
    fn default() -> Self {
        // Common A-share retail schedule
        CommissionPlan {
            commission_rate: 0.0003,
            min_commission: 5.0,
            transfer_fee_rate: 0.00001,
            stamp_tax_rate: 0.0005,
        }
    }
}

impl FeeCalculator for CommissionPlan {
    fn fees(&self, gross_amount: f64, side: Side) -> FeeBreakdown {
        let commission = (gross_amount * self.commission_rate).max(self.min_commission);
        let transfer_fee = gross_amount * self.transfer_fee_rate;
        let stamp_tax = match side {
            Side::Sell => gross_amount * self.stamp_tax_rate,
            Side::Buy => 0.0,
        };
        FeeBreakdown {
            commission,
            transfer_fee,
            stamp_tax,
        }
    }
}

/// Frictionless plan for tests and what-if comparisons
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFees;

impl FeeCalculator for NoFees {
    fn fees(&self, _gross_amount: f64, _side: Side) -> FeeBreakdown {
        FeeBreakdown::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_commission_minimum_applies() {
        let plan = CommissionPlan::default();
        // 0.03% of 1000 = 0.30, below the 5.00 floor
        let fees = plan.fees(1_000.0, Side::Buy);
        assert_relative_eq!(fees.commission, 5.0);
    }

    #[test]
    fn test_commission_rate_above_minimum() {
        let plan = CommissionPlan::default();
        let fees = plan.fees(100_000.0, Side::Buy);
        assert_relative_eq!(fees.commission, 30.0);
    }

    #[test]
    fn test_stamp_tax_sell_only() {
        let plan = CommissionPlan::default();
        let buy = plan.fees(50_000.0, Side::Buy);
        let sell = plan.fees(50_000.0, Side::Sell);
        assert_eq!(buy.stamp_tax, 0.0);
        assert_relative_eq!(sell.stamp_tax, 25.0);
        assert_relative_eq!(sell.total(), sell.commission + sell.transfer_fee + 25.0);
    }

    #[test]
    fn test_no_fees_is_zero() {
        let fees = NoFees.fees(1_000_000.0, Side::Sell);
        assert_eq!(fees.total(), 0.0);
    }
}
