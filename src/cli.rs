use std::path::PathBuf;

use anyhow::{Result, anyhow};

const USAGE: &str = "usage: checkout-referrals [--config <path>] --scenario <path>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub config_path: PathBuf,
    pub scenario_path: PathBuf,
}

pub fn cli_args_from_env() -> Result<CliArgs> {
    parse_cli_args(std::env::args().skip(1))
}

pub fn parse_cli_args(args: impl IntoIterator<Item = String>) -> Result<CliArgs> {
    let mut args = args.into_iter();
    let mut config_path = None;
    let mut scenario_path = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("missing value for --config"))?;
                config_path = Some(PathBuf::from(value));
            }
            "--scenario" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("missing value for --scenario"))?;
                scenario_path = Some(PathBuf::from(value));
            }
            other => {
                return Err(anyhow!("unknown argument: {other}. {USAGE}"));
            }
        }
    }

    Ok(CliArgs {
        config_path: config_path.unwrap_or_else(|| PathBuf::from("./checkout-referrals.jsonc")),
        scenario_path: scenario_path.ok_or_else(|| anyhow!("missing --scenario. {USAGE}"))?,
    })
}
