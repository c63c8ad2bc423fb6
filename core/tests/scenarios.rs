use atc_core::demo::demo_level;
use atc_core::level::{Level, LevelBuilder, Terrain};
use atc_core::path::{PathDraft, PathGoal};
use atc_core::roster::FlightState;
use atc_core::{
    parse_schedule, responsibilities_for, CommandError, Outcome, SimConfig, Simulation,
};

const STEP_LIMIT: u32 = 5_000;

fn single_runway_field() -> Level {
    LevelBuilder::new("Scenario field", 8)
        .horizontal_runway(0, 0, 7, &[2, 5])
        .tile(5, 1, Terrain::Taxiway)
        .tile(5, 2, Terrain::Parking)
        .build()
        .expect("scenario level must build")
}

fn simulation(level: Level, schedule: &str) -> Simulation {
    let schedule = parse_schedule(schedule, &level).expect("schedule must parse");
    Simulation::new(level, schedule, &responsibilities_for(1), SimConfig::default())
}

fn step_while(sim: &mut Simulation, mut condition: impl FnMut(&Simulation) -> bool) {
    let start = sim.tick();
    while condition(sim) {
        assert!(
            sim.tick() - start < STEP_LIMIT,
            "condition still holds after {STEP_LIMIT} ticks"
        );
        assert_eq!(sim.step(&[]), Outcome::Running);
        sim.validate_invariants()
            .expect("post-step state must satisfy invariants");
    }
}

#[test]
fn arrival_lands_and_releases_its_runway() {
    let mut sim = simulation(
        single_runway_field(),
        "00:00\nARRIVAL; IB3012; 90; 00:00; 0; 120\n",
    );
    assert_eq!(sim.roster().state(0), FlightState::Idle);

    sim.step(&[]);
    assert_eq!(sim.roster().state(0), FlightState::Approach);
    assert!(sim.aircraft(0).is_none());

    sim.assign_runway(0, 0).expect("runway must be free");
    assert_eq!(sim.roster().state(0), FlightState::Final);
    assert!(sim.claims().contains(0));
    let waypoints: Vec<u16> = sim.aircraft(0).unwrap().waypoints.remaining().collect();
    assert_eq!(waypoints, vec![0, 5]);

    step_while(&mut sim, |sim| sim.roster().state(0) == FlightState::Final);

    assert_eq!(sim.roster().state(0), FlightState::Landed);
    assert!(!sim.claims().contains(0));
    assert!(sim.claims().is_empty());
    let aircraft = sim.aircraft(0).unwrap();
    assert_eq!((aircraft.x, aircraft.y), sim.level().tile_center(5));
    assert_eq!(aircraft.z, 0);
    assert!(aircraft.waypoints.is_cleared());
}

#[test]
fn unrouted_departure_is_lost_with_penalty() {
    let schedule = "00:00\nDEPARTURE; DLH7; 80; 00:00; 21; 5\n";

    let mut sim = simulation(single_runway_field(), schedule).with_score(1_000);
    sim.step(&[]);
    assert_eq!(sim.roster().state(0), FlightState::Parked);

    step_while(&mut sim, |sim| sim.tick() < 299);
    assert_eq!(sim.roster().state(0), FlightState::Parked);
    assert_eq!(sim.roster().get(0).unwrap().remaining_secs, 1);

    assert_eq!(sim.step(&[]), Outcome::LevelComplete);
    let flight = sim.roster().get(0).unwrap();
    assert_eq!(flight.state, FlightState::Idle);
    assert!(flight.finished);
    assert_eq!(flight.passengers, 0);
    assert_eq!(sim.score(), 850);
    assert!(sim.aircraft(0).is_none());

    let finished = sim.roster().iter().filter(|(_, f)| f.finished).count();
    assert_eq!(sim.remaining_aircraft() + finished, sim.roster().len());
}

#[test]
fn loss_penalty_floors_at_zero() {
    let mut sim = simulation(
        single_runway_field(),
        "00:00\nDEPARTURE; DLH7; 80; 00:00; 21; 1\n",
    )
    .with_score(100);
    while sim.step(&[]) == Outcome::Running {}
    assert_eq!(sim.score(), 0);
}

#[test]
fn revisiting_a_buffered_tile_is_rejected() {
    let level = demo_level().unwrap();
    let mut sim = simulation(
        level.clone(),
        "08:00\nDEPARTURE; LH0442; 60; 08:00; 27; 300\n",
    );
    sim.step(&[]);
    assert_eq!(sim.roster().state(0), FlightState::Parked);

    // 27 -> 19 -> 20 -> 21 is fine; continuing west to 18 crosses 20 again.
    let mut draft = PathDraft::new(PathGoal::HoldingPoint, 27);
    for cursor in [19, 21] {
        draft.cursor = cursor;
        draft.extend(&level).unwrap();
    }
    draft.cursor = 18;
    assert!(level.tile_at(20).unwrap().is_pathable());
    assert_eq!(draft.candidate(&level), Err(CommandError::InvalidPath));
    assert_eq!(draft.extend(&level), Err(CommandError::InvalidPath));
    assert!(draft.invalid);

    assert_eq!(
        sim.confirm_taxi_path(0, &draft),
        Err(CommandError::InvalidPath)
    );
    assert_eq!(sim.roster().state(0), FlightState::Parked);
    assert!(sim.aircraft(0).unwrap().waypoints.is_cleared());
}

#[test]
fn departure_taxis_enters_runway_and_climbs_out() {
    let level = demo_level().unwrap();
    let mut sim = simulation(
        level.clone(),
        "08:00\nDEPARTURE; LH0442; 60; 08:00; 27; 600\n",
    );
    sim.step(&[]);

    let mut draft = PathDraft::new(PathGoal::HoldingPoint, 27);
    draft.cursor = 19;
    assert_eq!(
        sim.confirm_taxi_path(0, &draft),
        Err(CommandError::NotConfirmable)
    );
    draft.extend(&level).unwrap();
    draft.cursor = 10;
    sim.confirm_taxi_path(0, &draft).unwrap();
    assert_eq!(sim.roster().state(0), FlightState::Taxiing);

    step_while(&mut sim, |sim| sim.roster().state(0) == FlightState::Taxiing);
    assert_eq!(sim.roster().state(0), FlightState::HoldingRwy);
    assert_eq!(
        sim.request_takeoff(0),
        Err(CommandError::WrongState { flight: 0 })
    );

    sim.assign_runway(0, 0).unwrap();
    assert_eq!(sim.roster().state(0), FlightState::EnteringRwy);
    assert!(sim.runway_in_use(7));
    let waypoints: Vec<u16> = sim.aircraft(0).unwrap().waypoints.remaining().collect();
    assert_eq!(waypoints, vec![2, 0]);

    step_while(&mut sim, |sim| sim.roster().state(0) == FlightState::EnteringRwy);
    assert_eq!(sim.roster().state(0), FlightState::ReadyForTakeoff);

    sim.request_takeoff(0).unwrap();
    assert!(sim.claims().is_empty());
    let waypoints: Vec<u16> = sim.aircraft(0).unwrap().waypoints.remaining().collect();
    assert_eq!(waypoints, vec![7]);

    let mut climbed = false;
    loop {
        match sim.step(&[]) {
            Outcome::Running => {
                climbed |= sim.roster().state(0) == FlightState::Climbing;
                sim.validate_invariants().unwrap();
            }
            Outcome::LevelComplete => break,
            other => panic!("unexpected outcome {other:?}"),
        }
    }
    assert!(climbed);
    let flight = sim.roster().get(0).unwrap();
    assert!(flight.finished);
    assert!(sim.score() > 200);
}
