//! Advisory validation of a generated ladder
//!
//! Produces a scored report with per-level risk zones and structured
//! issues. Nothing here is fatal; the caller decides whether a low score
//! blocks submission.

use serde::{Deserialize, Serialize};

use crate::config::GridParameters;
use crate::types::GridLevel;

/// Interval below which fee drag from excessive trade frequency dominates
const INTERVAL_TIGHT_PERCENT: f64 = 0.5;
/// Interval above which capital sits idle and little movement is captured
const INTERVAL_WIDE_PERCENT: f64 = 15.0;
/// Up-range vs down-range ratio beyond which the range counts as lopsided
pub const DEFAULT_ASYMMETRY_THRESHOLD: f64 = 2.0;

const PENALTY_INSUFFICIENT_FUNDS: f64 = 40.0;
const PENALTY_INTERVAL: f64 = 10.0;
const PENALTY_ASYMMETRY: f64 = 5.0;

/// Risk classification of a price band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    Safe,
    Warning,
    Danger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    InsufficientFunds,
    IntervalTooTight,
    IntervalTooWide,
    AsymmetricRange,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub severity: Severity,
    pub message: String,
}

/// Zone assigned to one ladder level
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LevelZone {
    pub level_index: i32,
    pub price: f64,
    pub zone: Zone,
}

/// Advisory report for a ladder against account constraints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// 0–100, starts at 100 and loses weighted penalties per issue
    pub score: f64,
    pub issues: Vec<ValidationIssue>,
    pub level_zones: Vec<LevelZone>,
    pub total_investment: f64,
    pub available_funds: f64,
    /// total_investment / available_funds × 100
    pub utilization_percent: f64,
}

impl ValidationReport {
    pub fn has_critical_issues(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Critical)
    }
}

/// Validate a ladder with the default asymmetry threshold
pub fn validate(
    params: &GridParameters,
    levels: &[GridLevel],
    available_funds: f64,
) -> ValidationReport {
    validate_with_threshold(params, levels, available_funds, DEFAULT_ASYMMETRY_THRESHOLD)
}

pub fn validate_with_threshold(
    params: &GridParameters,
    levels: &[GridLevel],
    available_funds: f64,
    asymmetry_threshold: f64,
) -> ValidationReport {
    let mut issues = Vec::new();
    let mut penalty = 0.0;

    let total_investment: f64 = levels.iter().map(|l| l.investment).sum();
    let funds_short = total_investment > available_funds;
    if funds_short {
        penalty += PENALTY_INSUFFICIENT_FUNDS;
        issues.push(ValidationIssue {
            kind: IssueKind::InsufficientFunds,
            severity: Severity::Critical,
            message: format!(
                "ladder requires {:.2} but only {:.2} available",
                total_investment, available_funds
            ),
        });
    }

    if params.grid_interval_percent < INTERVAL_TIGHT_PERCENT {
        penalty += PENALTY_INTERVAL;
        issues.push(ValidationIssue {
            kind: IssueKind::IntervalTooTight,
            severity: Severity::Warning,
            message: format!(
                "interval {:.2}% below {:.1}%: expect excessive trade frequency and fee drag",
                params.grid_interval_percent, INTERVAL_TIGHT_PERCENT
            ),
        });
    } else if params.grid_interval_percent > INTERVAL_WIDE_PERCENT {
        penalty += PENALTY_INTERVAL;
        issues.push(ValidationIssue {
            kind: IssueKind::IntervalTooWide,
            severity: Severity::Warning,
            message: format!(
                "interval {:.2}% above {:.1}%: capital sits idle, little movement captured",
                params.grid_interval_percent, INTERVAL_WIDE_PERCENT
            ),
        });
    }

    let up_range = params.max_price - params.base_price;
    let down_range = params.base_price - params.min_price;
    let ratio = up_range.max(down_range) / up_range.min(down_range).max(f64::EPSILON);
    if ratio > asymmetry_threshold {
        penalty += PENALTY_ASYMMETRY;
        issues.push(ValidationIssue {
            kind: IssueKind::AsymmetricRange,
            severity: Severity::Info,
            message: format!(
                "price range is lopsided around base ({:.1}x vs threshold {:.1}x)",
                ratio, asymmetry_threshold
            ),
        });
    }

    let level_zones = classify_zones(params, levels, available_funds, funds_short);

    let utilization_percent = if available_funds > 0.0 {
        total_investment / available_funds * 100.0
    } else {
        0.0
    };

    ValidationReport {
        score: (100.0 - penalty).clamp(0.0, 100.0),
        issues,
        level_zones,
        total_investment,
        available_funds,
        utilization_percent,
    }
}

/// Per-level zones: within one interval of base = safe, outermost third of
/// the per-side range = danger, the band between = warning. Levels the
/// available funds cannot cover (filling base-outward) are forced to danger.
fn classify_zones(
    params: &GridParameters,
    levels: &[GridLevel],
    available_funds: f64,
    funds_short: bool,
) -> Vec<LevelZone> {
    let interval_band = params.base_price * params.grid_interval_percent / 100.0;

    let mut zones: Vec<LevelZone> = levels
        .iter()
        .map(|level| {
            let distance = (level.price - params.base_price).abs();
            let zone = if distance <= interval_band * (1.0 + 1e-9) {
                Zone::Safe
            } else {
                let side_range = if level.price < params.base_price {
                    params.base_price - params.min_price
                } else {
                    params.max_price - params.base_price
                };
                if distance / side_range > 2.0 / 3.0 {
                    Zone::Danger
                } else {
                    Zone::Warning
                }
            };
            LevelZone {
                level_index: level.index,
                price: level.price,
                zone,
            }
        })
        .collect();

    if funds_short {
        // Fill base-outward; everything past the funded prefix is at risk
        let mut order: Vec<usize> = (0..levels.len()).collect();
        order.sort_by_key(|&i| (levels[i].index.abs(), levels[i].index));
        let mut cumulative = 0.0;
        for &i in &order {
            cumulative += levels[i].investment;
            if cumulative > available_funds {
                zones[i].zone = Zone::Danger;
            }
        }
    }

    zones
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SizingMode;
    use crate::levels::generate_levels;

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

    #[test]
    fn test_clean_config_scores_full() {
        let p = params();
        let levels = generate_levels(&p).unwrap();
        let report = validate(&p, &levels, 50_000.0);
        assert_eq!(report.score, 100.0);
        assert!(report.issues.is_empty());
        assert!(!report.has_critical_issues());
    }

    #[test]
    fn test_insufficient_funds_is_critical() {
        let p = params();
        let levels = generate_levels(&p).unwrap();
        // 9 levels × 1000 > 5000
        let report = validate(&p, &levels, 5_000.0);
        assert!(report.has_critical_issues());
        assert_eq!(report.score, 60.0);
        assert!(report
            .issues
            .iter()
            .any(|i| i.kind == IssueKind::InsufficientFunds));
        // Outermost levels become danger regardless of distance
        let outer = report
            .level_zones
            .iter()
            .find(|z| z.level_index == 3)
            .unwrap();
        assert_eq!(outer.zone, Zone::Danger);
    }

    #[test]
    fn test_tight_interval_warns() {
        let mut p = params();
        p.grid_interval_percent = 0.25;
        let levels = generate_levels(&p).unwrap();
        let report = validate(&p, &levels, 1_000_000.0);
        assert!(report
            .issues
            .iter()
            .any(|i| i.kind == IssueKind::IntervalTooTight && i.severity == Severity::Warning));
    }

    #[test]
    fn test_wide_interval_warns() {
        let mut p = params();
        p.grid_interval_percent = 18.0;
        p.min_price = 50.0;
        p.max_price = 200.0;
        let levels = generate_levels(&p).unwrap();
        let report = validate(&p, &levels, 1_000_000.0);
        assert!(report
            .issues
            .iter()
            .any(|i| i.kind == IssueKind::IntervalTooWide));
    }

    #[test]
    fn test_asymmetric_range_is_informational() {
        let mut p = params();
        p.min_price = 95.0; // down range 5, up range 20
        let levels = generate_levels(&p).unwrap();
        let report = validate(&p, &levels, 1_000_000.0);
        let issue = report
            .issues
            .iter()
            .find(|i| i.kind == IssueKind::AsymmetricRange)
            .unwrap();
        assert_eq!(issue.severity, Severity::Info);
        assert_eq!(report.score, 95.0);
    }

    #[test]
    fn test_zone_classification_bands() {
        let p = params();
        let levels = generate_levels(&p).unwrap();
        let report = validate(&p, &levels, 50_000.0);

        let zone_of = |idx: i32| {
            report
                .level_zones
                .iter()
                .find(|z| z.level_index == idx)
                .unwrap()
                .zone
        };
        // Base and its immediate neighbours sit within one interval
        assert_eq!(zone_of(0), Zone::Safe);
        assert_eq!(zone_of(1), Zone::Safe);
        assert_eq!(zone_of(-1), Zone::Safe);
        // -4 is at 82.27, 89% of the way down the 80..100 side
        assert_eq!(zone_of(-4), Zone::Danger);
        // -2 is at 90.70, 47% of the way down
        assert_eq!(zone_of(-2), Zone::Warning);
    }

    #[test]
    fn test_utilization_reported() {
        let p = params();
        let levels = generate_levels(&p).unwrap();
        let report = validate(&p, &levels, 18_000.0);
        assert!((report.utilization_percent - 50.0).abs() < 1e-9);
        assert!((report.total_investment - 9_000.0).abs() < 1e-9);
    }
}
