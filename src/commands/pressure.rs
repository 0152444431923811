//! Pressure test command implementation

use anyhow::Result;
use grid_engine::{Config, GridEngine};
use tracing::info;

pub fn run(config_path: String, drawdown_percent: f64) -> Result<()> {
    info!("Starting pressure test");

    let config = Config::from_file(&config_path)?;
    info!("Loaded configuration from: {}", config_path);

    let engine = GridEngine::new(Box::new(config.fees));
    let report = engine.pressure_test(&config.params, drawdown_percent, config.available_funds)?;

    println!("\n{}", "=".repeat(60));
    println!("PRESSURE TEST");
    println!("{}", "=".repeat(60));
    println!("Assumed Drawdown:   {:.1}%", report.drawdown_percent);
    println!(
        "Stressed Price:     {:.4} (base {:.4})",
        report.stressed_price, config.params.base_price
    );
    println!("Triggered Levels:   {}", report.triggered_levels);
    println!("Required Capital:   {:.2}", report.required_capital);
    println!("Available Funds:    {:.2}", report.available_funds);
    println!("Utilization:        {:.1}%", report.utilization_percent);
    println!(
        "Feasible:           {}",
        if report.feasible { "yes" } else { "NO" }
    );
    println!("{}", "=".repeat(60));

    info!("Pressure test completed successfully");

    Ok(())
}
