//! Simulate command implementation

use anyhow::Result;
use grid_engine::{data, Config, EndReason, GridEngine};
use tracing::info;

pub fn run(
    config_path: String,
    days_override: Option<usize>,
    seed_override: Option<u64>,
    history_path: Option<String>,
) -> Result<()> {
    info!("Starting grid simulation");

    let mut config = Config::from_file(&config_path)?;
    info!("Loaded configuration from: {}", config_path);

    if let Some(path) = history_path {
        info!("Replaying historical closes from: {}", path);
        let rows = data::load_closes(&path)?;
        config.simulation.start_date = rows[0].date;
        if days_override.is_none() {
            config.simulation.days = rows.len();
        }
        config.simulation.historical_closes = Some(rows.iter().map(|r| r.close).collect());
    }

    if let Some(days) = days_override {
        info!("Overriding simulation days to: {}", days);
        config.simulation.days = days;
    }

    if let Some(seed) = seed_override {
        info!("Overriding seed to: {}", seed);
        config.simulation.seed = Some(seed);
    }

    let engine = GridEngine::new(Box::new(config.fees));

    info!("Running simulation...");
    let result = engine.simulate(&config.params, &config.simulation)?;

    println!("\n{}", "=".repeat(60));
    println!("SIMULATION RESULTS");
    println!("{}", "=".repeat(60));
    match result.end_reason {
        EndReason::Completed => {
            println!("Outcome:            completed {} days", result.equity_curve.len())
        }
        EndReason::Stopped { day } => println!("Outcome:            stopped on day {}", day),
    }
    println!("Initial Capital:    {:.2}", result.initial_capital);
    println!(
        "Final Equity:       {:.2}",
        result
            .equity_curve
            .last()
            .map(|p| p.total_equity)
            .unwrap_or(result.initial_capital)
    );
    println!("Total Return:       {:.2}%", result.metrics.total_return_percent);
    match result.metrics.sharpe_ratio {
        Some(sharpe) => println!("Sharpe Ratio:       {:.2}", sharpe),
        None => println!("Sharpe Ratio:       n/a (flat equity)"),
    }
    println!("Max Drawdown:       {:.2}%", result.metrics.max_drawdown * 100.0);
    println!("Win Rate:           {:.2}%", result.metrics.win_rate * 100.0);
    println!("Total Trades:       {}", result.metrics.total_trades);
    println!("  Buys:             {}", result.metrics.buy_trades);
    println!("  Sells:            {}", result.metrics.sell_trades);
    println!("Realized Gain:      {:.2}", result.realized_gain);
    println!("Unrealized PnL:     {:.2}", result.unrealized_pnl);
    println!("Total Fees:         {:.2}", result.metrics.total_fees);
    println!("Final Position:     {:.0} shares", result.final_position);
    println!("Final Cash:         {:.2}", result.final_cash);

    if !result.metrics.level_efficiency.is_empty() {
        println!("{}", "-".repeat(60));
        println!(
            "{:>6} {:>7} {:>10} {:>12} {:>10}",
            "Level", "Fills", "FillShare", "Gain", "GainShare"
        );
        for entry in &result.metrics.level_efficiency {
            println!(
                "{:>6} {:>7} {:>9.1}% {:>12.2} {:>9.1}%",
                entry.level_index,
                entry.fills,
                entry.fill_share * 100.0,
                entry.gain,
                entry.gain_share * 100.0
            );
        }
    }
    println!("{}", "=".repeat(60));

    info!("Simulation completed successfully");

    Ok(())
}
