//! Configuration dump command.

use super::common::EngineArgs;
use clap::Args;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(flatten)]
    engine: EngineArgs,
}

pub fn run(args: ConfigArgs) -> anyhow::Result<()> {
    let config = args.engine.load()?;
    // Reject anything the engine would refuse before printing it
    config.synth_config()?;
    print!("{}", config.to_toml()?);
    Ok(())
}
