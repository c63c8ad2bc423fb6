use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use host::config::{load_sim_config, resolve_max_ticks};
use host::{inspect_level, load_level, run, write_demo, write_report, RunOptions};

#[derive(Parser, Debug)]
#[command(name = "atc")]
#[command(about = "Headless airport traffic control sessions over binary level files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a level against a schedule and report the outcome
    Run {
        #[arg(long)]
        level: PathBuf,
        #[arg(long)]
        schedule: PathBuf,
        /// Button script for player 1 (`<tick> BUTTON[+BUTTON]` per line)
        #[arg(long)]
        script: Option<PathBuf>,
        #[arg(long, default_value_t = 1)]
        players: usize,
        /// Defaults to ATC_MAX_TICKS, then 30 minutes of play
        #[arg(long)]
        max_ticks: Option<u32>,
        /// JSON simulation config
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write the full JSON report here
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print a summary of a level file
    InspectLevel { level: PathBuf },
    /// Write the practice level and schedule
    Demo {
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .init();

    match Cli::parse().command {
        Commands::Run {
            level,
            schedule,
            script,
            players,
            max_ticks,
            config,
            output,
        } => {
            let options = RunOptions {
                level,
                schedule,
                script,
                players,
                max_ticks: resolve_max_ticks(max_ticks),
                config: load_sim_config(config.as_deref())?,
            };
            let report = run(&options)?;

            println!("controllers={}", report.controllers.join(","));
            println!("ticks={}", report.ticks);
            println!("outcome={:?}", report.outcome);
            println!("score={}", report.score);
            println!("flights={}", report.flights_total);
            println!("remaining={}", report.flights_remaining);
            println!("successes={}", report.successes);
            println!("losses={}", report.losses);
            for message in &report.messages {
                println!("message={message}");
            }
            if let Some(path) = output {
                write_report(&path, &report)?;
                println!("output={}", path.display());
            }
        }
        Commands::InspectLevel { level } => {
            let level = load_level(&level)?;
            let summary = inspect_level(&level);
            let encoded =
                serde_json::to_string_pretty(&summary).context("failed to serialize summary")?;
            println!("{encoded}");
        }
        Commands::Demo { out_dir } => {
            let (level, schedule) = write_demo(&out_dir)?;
            println!("level={}", level.display());
            println!("schedule={}", schedule.display());
        }
    }

    Ok(())
}
