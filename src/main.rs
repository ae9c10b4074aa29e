use anyhow::{Context, Result};

use checkout_referrals::{
    cli::cli_args_from_env, config::Config, logging::init_tracing, scenario::Scenario,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli_args_from_env()?;
    let config = Config::load(&args.config_path)
        .with_context(|| format!("failed to load config from {}", args.config_path.display()))?;
    let logging_guard = init_tracing(&config.logging)?;

    let scenario = Scenario::load(&args.scenario_path)?;
    tracing::info!(
        target: "referrals",
        run_id = logging_guard.run_id(),
        scenario = %args.scenario_path.display(),
        attempts = scenario.attempts.len(),
        "scenario_replay_started"
    );

    let report = scenario.run(config.referrals).await?;
    let rendered =
        serde_json::to_string_pretty(&report).context("failed to serialize scenario report")?;
    println!("{rendered}");

    drop(logging_guard);
    Ok(())
}
