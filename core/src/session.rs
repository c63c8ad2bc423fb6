use serde::Serialize;

use crate::controller::Controller;
use crate::error::RuleCode;
use crate::player::FrameInput;
use crate::sim::{Outcome, SimEvent, Simulation, WorldSnapshot};

#[derive(Clone, Debug, Serialize)]
pub struct SessionReport {
    pub controllers: Vec<String>,
    pub max_ticks: u32,
    pub ticks: u32,
    pub outcome: Outcome,
    pub score: u32,
    pub flights_total: usize,
    pub flights_remaining: usize,
    pub successes: u32,
    pub losses: u32,
    pub messages: Vec<String>,
    pub final_state: WorldSnapshot,
}

/// Drive `sim` with one controller per player until the level ends or
/// `max_ticks` ticks have run. Invariants are checked after every tick.
pub fn run_session(
    sim: &mut Simulation,
    controllers: &mut [Box<dyn Controller>],
    max_ticks: u32,
) -> Result<SessionReport, RuleCode> {
    for controller in controllers.iter_mut() {
        controller.reset();
    }
    sim.validate_invariants()?;

    let mut successes = 0u32;
    let mut losses = 0u32;
    let mut messages = Vec::new();
    let mut snapshot = sim.snapshot();
    let mut inputs: Vec<FrameInput> = Vec::with_capacity(controllers.len());

    while snapshot.tick < max_ticks && snapshot.outcome == Outcome::Running {
        inputs.clear();
        inputs.extend(
            controllers
                .iter_mut()
                .map(|controller| controller.next_input(&snapshot)),
        );
        sim.step(&inputs);
        sim.validate_invariants()?;

        for event in sim.drain_events() {
            match event {
                SimEvent::Retired { success: true, .. } => successes += 1,
                SimEvent::Retired { success: false, .. } => losses += 1,
                SimEvent::Message { text } => messages.push(text),
                _ => {}
            }
        }
        snapshot = sim.snapshot();
    }

    tracing::info!(
        ticks = snapshot.tick,
        outcome = ?snapshot.outcome,
        score = snapshot.score,
        successes,
        losses,
        "session finished"
    );

    Ok(SessionReport {
        controllers: controllers
            .iter()
            .map(|controller| controller.id().to_string())
            .collect(),
        max_ticks,
        ticks: snapshot.tick,
        outcome: snapshot.outcome,
        score: snapshot.score,
        flights_total: snapshot.flights.len(),
        flights_remaining: snapshot.remaining_aircraft,
        successes,
        losses,
        messages,
        final_state: snapshot,
    })
}
