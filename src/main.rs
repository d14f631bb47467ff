use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use flycube::controller::Manager;
use flycube::view::{WgpuGraphics, WinitPlatform};
use flycube::{logging, Config};

#[derive(Parser)]
#[command(name = "flycube", about = "Fly around a cube on a plane")]
struct Cli {
    /// TOML config file (defaults to ./flycube.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(if cli.verbose { "debug" } else { "info" });

    if let Err(e) = run(&cli) {
        tracing::error!("fatal: {e:#}");
        return Err(e);
    }
    tracing::info!("exited cleanly");
    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    let platform = WinitPlatform::new(&config.window)?;
    let graphics = WgpuGraphics::new(platform.window())?;

    Manager::new(config, platform, graphics).run()?;
    Ok(())
}
