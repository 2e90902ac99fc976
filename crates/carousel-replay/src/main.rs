use anyhow::Context;
use carousel::Size;
use carousel::config::{self, Configuration};
use carousel_replay::replay::{Replay, ReplaySettings, settings_for};
use carousel_replay::trace;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "carousel-replay", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Trace file, or the name of a trace in the carousel data directory
    trace: Option<String>,

    /// Number of children, unless the trace sets it
    #[arg(short = 'n', long, default_value_t = 5)]
    children: usize,

    /// Container width in points, unless the trace sets it
    #[arg(long, default_value_t = 375.0)]
    width: f64,

    /// Container height in points, unless the trace sets it
    #[arg(long, default_value_t = 200.0)]
    height: f64,

    /// Device pixels per point
    #[arg(long, default_value_t = 2.0)]
    scale: f64,

    /// Configuration file to use instead of the user config
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Upper bound on ticks for each settle
    #[arg(long, default_value_t = 10_000)]
    max_ticks: usize,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Write the default configuration file if none exists.
    InitConfig,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::InitConfig) => {
            let path = config::write_default_config()?;
            println!("{}", path.display());
            Ok(())
        }
        None => {
            if let Some(name) = cli.trace.clone() {
                replay(&name, &cli)
            } else {
                use clap::CommandFactory;
                Cli::command().print_help()?;
                Ok(())
            }
        }
    }
}

fn replay(name: &str, cli: &Cli) -> anyhow::Result<()> {
    let configuration: Configuration = match &cli.config {
        Some(path) => config::load_config_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => config::load_or_default(),
    };

    let trace =
        trace::load_trace(name).with_context(|| format!("Failed to load trace '{}'", name))?;
    let settings = settings_for(
        &trace,
        ReplaySettings {
            children: cli.children,
            bounds: Size::new(cli.width, cli.height),
            screen_scale: cli.scale,
            max_ticks: cli.max_ticks,
        },
    );
    log::info!(
        "Replaying {} events on {} children in {}x{}",
        trace.events.len(),
        settings.children,
        settings.bounds.width,
        settings.bounds.height
    );

    let report = Replay::new(configuration, settings)?.run(trace.events);
    println!("{}", report);
    Ok(())
}
