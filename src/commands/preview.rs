//! Preview command implementation

use anyhow::Result;
use grid_engine::{Config, GridEngine, Zone};
use tracing::info;

pub fn run(config_path: String, funds_override: Option<f64>) -> Result<()> {
    info!("Starting ladder preview");

    let mut config = Config::from_file(&config_path)?;
    info!("Loaded configuration from: {}", config_path);

    if let Some(funds) = funds_override {
        info!("Overriding available funds to: {:.2}", funds);
        config.available_funds = funds;
    }

    let engine = GridEngine::new(Box::new(config.fees));
    let (levels, report) = engine.preview(&config.params, config.available_funds)?;

    println!("\n{}", "=".repeat(60));
    println!("GRID LADDER PREVIEW");
    println!("{}", "=".repeat(60));
    println!(
        "Range:              {:.2} .. {:.2} (base {:.2})",
        config.params.min_price, config.params.max_price, config.params.base_price
    );
    println!("Interval:           {:.2}%", config.params.grid_interval_percent);
    println!("Levels:             {}", levels.len());
    println!("Total Investment:   {:.2}", report.total_investment);
    println!("Available Funds:    {:.2}", report.available_funds);
    println!("Utilization:        {:.1}%", report.utilization_percent);
    println!("Score:              {:.0}/100", report.score);
    println!("{}", "-".repeat(60));
    println!("{:>6} {:>12} {:>12}  {}", "Level", "Price", "Investment", "Zone");
    for (level, zone) in levels.iter().zip(&report.level_zones) {
        let marker = match zone.zone {
            Zone::Safe => "safe",
            Zone::Warning => "warning",
            Zone::Danger => "DANGER",
        };
        println!(
            "{:>6} {:>12.4} {:>12.2}  {}",
            level.index, level.price, level.investment, marker
        );
    }

    if !report.issues.is_empty() {
        println!("{}", "-".repeat(60));
        for issue in &report.issues {
            println!("{:?}: {}", issue.severity, issue.message);
        }
    }
    println!("{}", "=".repeat(60));

    if report.has_critical_issues() {
        info!("Preview finished with critical issues");
    } else {
        info!("Preview completed successfully");
    }

    Ok(())
}
