pub mod config;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use atc_core::demo::{demo_level, DEMO_SCHEDULE};
use atc_core::level::Terrain;
use atc_core::{
    parse_level, parse_schedule, responsibilities_for, run_session, serialize_level, Controller,
    IdleController, Level, Schedule, ScriptedController, SessionReport, SimConfig, Simulation,
};
use serde::Serialize;

pub const DEMO_LEVEL_FILE: &str = "demo.lvl";
pub const DEMO_SCHEDULE_FILE: &str = "demo.sched";

#[derive(Clone, Debug)]
pub struct RunOptions {
    pub level: PathBuf,
    pub schedule: PathBuf,
    /// Drives player 0; every other player idles.
    pub script: Option<PathBuf>,
    pub players: usize,
    pub max_ticks: u32,
    pub config: SimConfig,
}

pub fn load_level(path: &Path) -> Result<Level> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read level: {}", path.display()))?;
    parse_level(&bytes).with_context(|| format!("invalid level file: {}", path.display()))
}

pub fn load_schedule(path: &Path, level: &Level) -> Result<Schedule> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read schedule: {}", path.display()))?;
    parse_schedule(&text, level).with_context(|| format!("invalid schedule: {}", path.display()))
}

pub fn build_controllers(
    script: Option<&Path>,
    players: usize,
) -> Result<Vec<Box<dyn Controller>>> {
    if !(1..=2).contains(&players) {
        return Err(anyhow!("players must be 1 or 2, got {players}"));
    }

    let mut controllers: Vec<Box<dyn Controller>> = Vec::with_capacity(players);
    match script {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read script: {}", path.display()))?;
            let scripted = ScriptedController::parse(&text)
                .with_context(|| format!("invalid script: {}", path.display()))?;
            controllers.push(Box::new(scripted));
        }
        None => controllers.push(Box::new(IdleController)),
    }
    while controllers.len() < players {
        controllers.push(Box::new(IdleController));
    }
    Ok(controllers)
}

pub fn run(options: &RunOptions) -> Result<SessionReport> {
    if options.max_ticks == 0 {
        return Err(anyhow!("max_ticks must be > 0"));
    }

    let level = load_level(&options.level)?;
    let schedule = load_schedule(&options.schedule, &level)?;
    let mut controllers = build_controllers(options.script.as_deref(), options.players)?;

    let mut sim = Simulation::new(
        level,
        schedule,
        &responsibilities_for(options.players),
        options.config.clone(),
    );
    run_session(&mut sim, &mut controllers, options.max_ticks)
        .map_err(|rule| anyhow!("invariant failure at tick {}: {rule}", sim.tick()))
}

pub fn write_report(path: &Path, report: &SessionReport) -> Result<()> {
    let json = serde_json::to_vec_pretty(report).context("failed to serialize run report")?;
    write_file(path, &json)
}

/// Writes the practice field and its schedule; returns both paths.
pub fn write_demo(out_dir: &Path) -> Result<(PathBuf, PathBuf)> {
    let level = demo_level().context("demo level failed to build")?;
    let level_path = out_dir.join(DEMO_LEVEL_FILE);
    let schedule_path = out_dir.join(DEMO_SCHEDULE_FILE);
    write_file(&level_path, &serialize_level(&level))?;
    write_file(&schedule_path, DEMO_SCHEDULE.as_bytes())?;
    Ok((level_path, schedule_path))
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed creating directory {}", parent.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("failed writing {}", path.display()))
}

#[derive(Clone, Debug, Serialize)]
pub struct LevelSummary {
    pub title: String,
    pub columns: u8,
    pub runways: Vec<RunwaySummary>,
    pub parking: Vec<u16>,
    pub holding_points: Vec<u16>,
    pub pathable_tiles: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct RunwaySummary {
    pub header: u16,
    pub length: usize,
    pub exits: Vec<u16>,
}

pub fn inspect_level(level: &Level) -> LevelSummary {
    let tiles_of = |terrain: Terrain| -> Vec<u16> {
        level
            .cells()
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is(terrain))
            .map(|(index, _)| index as u16)
            .collect()
    };

    let runways = level
        .runway_headers()
        .iter()
        .map(|&header| {
            let run = level.runway_run(header).unwrap_or_default();
            RunwaySummary {
                header,
                length: run.len(),
                exits: run
                    .iter()
                    .copied()
                    .filter(|&tile| {
                        level
                            .tile_at(tile)
                            .is_some_and(|cell| cell.is(Terrain::RunwayExit))
                    })
                    .collect(),
            }
        })
        .collect();

    LevelSummary {
        title: level.title().to_string(),
        columns: level.columns(),
        runways,
        parking: tiles_of(Terrain::Parking),
        holding_points: tiles_of(Terrain::HoldingPoint),
        pathable_tiles: level.cells().iter().filter(|cell| cell.is_pathable()).count(),
    }
}
