use std::collections::VecDeque;

use atc_core::demo::{demo_level, DEMO_SCHEDULE};
use atc_core::player::FrameInput;
use atc_core::roster::FlightState;
use atc_core::{
    parse_schedule, responsibilities_for, run_session, Controller, IdleController, Outcome,
    ScriptedController, SimConfig, Simulation, WorldSnapshot,
};

fn demo_simulation(players: usize) -> Simulation {
    let level = demo_level().unwrap();
    let schedule = parse_schedule(DEMO_SCHEDULE, &level).unwrap();
    Simulation::new(
        level,
        schedule,
        &responsibilities_for(players),
        SimConfig::default(),
    )
}

/// Works the demo field through the controller buttons only, releasing
/// every button for a frame between presses.
#[derive(Default)]
struct TowerBot {
    queue: VecDeque<FrameInput>,
    holding: bool,
}

impl TowerBot {
    fn plan(&mut self, world: &WorldSnapshot) {
        let player = &world.players[0];
        let Some(flight) = player.selected_flight else {
            return;
        };
        let state = world.flights[flight as usize].state;

        use FrameInput as B;
        let presses: Vec<FrameInput> = match (player.mode, state) {
            ("idle", FlightState::Approach | FlightState::HoldingRwy) => vec![B::CROSS, B::CROSS],
            // Exit 5 -> taxiway (5,2), then parking (4,3).
            ("idle", FlightState::Landed) => {
                vec![B::CROSS, B::DOWN, B::DOWN, B::CROSS, B::LEFT, B::DOWN, B::CROSS]
            }
            // Parking (3,3) -> taxiway (3,2), then holding point (2,1).
            ("idle", FlightState::Parked) => {
                vec![B::CROSS, B::UP, B::CROSS, B::LEFT, B::UP, B::CROSS]
            }
            ("idle", FlightState::Unboarding | FlightState::ReadyForTakeoff) => vec![B::CROSS],
            ("unboarding", _) => player.unboarding_sequence[player.unboarding_progress..].to_vec(),
            _ => Vec::new(),
        };
        self.queue.extend(presses);
    }
}

impl Controller for TowerBot {
    fn id(&self) -> &'static str {
        "tower-bot"
    }

    fn reset(&mut self) {
        self.queue.clear();
        self.holding = false;
    }

    fn next_input(&mut self, world: &WorldSnapshot) -> FrameInput {
        if self.holding {
            self.holding = false;
            return FrameInput::empty();
        }
        if self.queue.is_empty() {
            self.plan(world);
        }
        let frame = self.queue.pop_front().unwrap_or_default();
        self.holding = !frame.is_empty();
        frame
    }
}

#[test]
fn button_driven_session_clears_the_demo_schedule() {
    let mut sim = demo_simulation(1);
    let mut controllers: Vec<Box<dyn Controller>> = vec![Box::new(TowerBot::default())];

    let report = run_session(&mut sim, &mut controllers, 20_000).expect("invariants must hold");

    assert_eq!(report.outcome, Outcome::LevelComplete);
    assert_eq!(report.successes, 2);
    assert_eq!(report.losses, 0);
    assert_eq!(report.flights_remaining, 0);
    assert_eq!(report.messages, vec!["Tower open, runway 09 in use".to_string()]);
    assert!(report.score > 2 * 200);
    assert_eq!(report.controllers, vec!["tower-bot".to_string()]);
}

#[test]
fn idle_session_loses_every_flight() {
    let mut sim = demo_simulation(2);
    let mut controllers: Vec<Box<dyn Controller>> =
        vec![Box::new(IdleController), Box::new(IdleController)];

    let report = run_session(&mut sim, &mut controllers, 60 * 600).unwrap();

    assert_eq!(report.outcome, Outcome::LevelComplete);
    assert_eq!(report.successes, 0);
    assert_eq!(report.losses, 2);
    assert_eq!(report.score, 0);
    assert!(report.final_state.flights.iter().all(|flight| flight.finished));
}

#[test]
fn session_stops_at_the_tick_limit() {
    let mut sim = demo_simulation(1);
    let mut controllers: Vec<Box<dyn Controller>> = vec![Box::new(IdleController)];

    let report = run_session(&mut sim, &mut controllers, 90).unwrap();

    assert_eq!(report.ticks, 90);
    assert_eq!(report.outcome, Outcome::Running);
    assert_eq!(report.flights_remaining, 2);
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["final_state"]["tick"], 90);
    assert_eq!(json["final_state"]["flights"][1]["state"], "Parked");
}

#[test]
fn scripted_controller_opens_runway_selection() {
    let mut sim = demo_simulation(1);
    let script = ScriptedController::parse("# wait for the approach\n2 CROSS\n").unwrap();
    let mut controllers: Vec<Box<dyn Controller>> = vec![Box::new(script)];

    let report = run_session(&mut sim, &mut controllers, 4).unwrap();

    let player = &report.final_state.players[0];
    assert_eq!(player.selected_flight, Some(0));
    assert_eq!(player.mode, "select_runway");
    assert!(!player.invalid);
}
