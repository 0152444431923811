//! Sweep command implementation

use anyhow::Result;
use grid_engine::{Config, GridEngine, SizingMode};
use tracing::info;

pub fn run(config_path: String, top: usize) -> Result<()> {
    info!("Starting parameter sweep");

    let config = Config::from_file(&config_path)?;
    info!("Loaded configuration from: {}", config_path);

    let sweep = config
        .sweep
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("Config has no sweep section"))?;

    let candidates = sweep.expand(&config.params);
    info!(
        "Expanded {} candidate parameter sets",
        candidates.len()
    );

    let engine = GridEngine::new(Box::new(config.fees));
    let outcomes = engine.sweep(&candidates, &config.simulation);

    if outcomes.is_empty() {
        anyhow::bail!("Every sweep candidate failed");
    }

    println!("\n{}", "=".repeat(78));
    println!("SWEEP RESULTS (top {} of {})", top.min(outcomes.len()), outcomes.len());
    println!("{}", "=".repeat(78));
    println!(
        "{:>4} {:>9} {:>11} {:>12} {:>8} {:>8} {:>9} {:>7}",
        "#", "Interval", "Investment", "Sizing", "Sharpe", "Return", "Drawdown", "Trades"
    );
    for (rank, outcome) in outcomes.iter().take(top).enumerate() {
        let sizing = match outcome.params.sizing {
            SizingMode::Flat => "flat".to_string(),
            SizingMode::Progressive { increase_percent } => {
                format!("prog {:.0}%", increase_percent)
            }
        };
        let sharpe = outcome
            .metrics
            .sharpe_ratio
            .map(|s| format!("{:.2}", s))
            .unwrap_or_else(|| "n/a".to_string());
        println!(
            "{:>4} {:>8.2}% {:>11.0} {:>12} {:>8} {:>7.2}% {:>8.2}% {:>7}",
            rank + 1,
            outcome.params.grid_interval_percent,
            outcome.params.base_investment,
            sizing,
            sharpe,
            outcome.metrics.total_return_percent,
            outcome.metrics.max_drawdown * 100.0,
            outcome.metrics.total_trades
        );
    }
    println!("{}", "=".repeat(78));

    info!("Sweep completed successfully");

    Ok(())
}
