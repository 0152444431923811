//! Grid Trading Engine
//!
//! Configuration, simulation and analysis for grid trading strategies:
//! ladder generation with risk validation, a day-by-day simulator over
//! synthetic or historical price series, FIFO lot pairing, and performance
//! analytics with parallel parameter sweeps.

pub mod analyzer;
pub mod config;
pub mod data;
pub mod engine;
pub mod fees;
pub mod levels;
pub mod pairing;
pub mod series;
pub mod simulator;
pub mod types;
pub mod validator;

pub use config::{Config, GridParameters, SimulationConfig, SizingMode, TrendDirection};
pub use engine::{GridEngine, PressureReport, SweepOutcome};
pub use fees::{CommissionPlan, FeeCalculator, NoFees};
pub use types::*;
pub use validator::{ValidationReport, Zone};
