use super::*;
use crate::aircraft::Livery;
use crate::fixed_arrays::RunwayClaim;
use crate::level::Direction;
use crate::path::PathGoal;
use crate::player::{Camera, InteractionMode};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FlightSnapshot {
    pub id: FlightId,
    pub number: String,
    pub direction: FlightDirection,
    pub state: FlightState,
    pub passengers: u16,
    pub scheduled: ClockTime,
    pub remaining_secs: u16,
    pub finished: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AircraftSnapshot {
    pub flight: FlightId,
    pub livery: Livery,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub tile: Option<TileIndex>,
    pub heading: Option<Direction>,
    pub speed: i32,
    pub waypoints: Vec<TileIndex>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlayerSnapshot {
    pub id: u8,
    pub responsibility: Responsibility,
    pub selected_flight: Option<FlightId>,
    pub mode: &'static str,
    pub invalid: bool,
    /// Keys to enter while unboarding, and how many are already matched.
    pub unboarding_sequence: Vec<FrameInput>,
    pub unboarding_progress: usize,
    pub camera: Camera,
}

/// Read-only view of a tick's end state, handed to controllers and
/// written into run reports.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WorldSnapshot {
    pub tick: u32,
    pub clock: ClockTime,
    pub score: u32,
    pub outcome: Outcome,
    pub remaining_aircraft: usize,
    pub active_aircraft: usize,
    pub flights: Vec<FlightSnapshot>,
    pub aircraft: Vec<AircraftSnapshot>,
    pub runway_claims: Vec<RunwayClaim>,
    pub players: Vec<PlayerSnapshot>,
}

impl Simulation {
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            tick: self.tick,
            clock: self.clock,
            score: self.score,
            outcome: self.outcome,
            remaining_aircraft: self.remaining_aircraft,
            active_aircraft: self.active_aircraft,
            flights: self
                .roster
                .iter()
                .map(|(id, flight)| FlightSnapshot {
                    id,
                    number: flight.number.clone(),
                    direction: flight.direction,
                    state: flight.state,
                    passengers: flight.passengers,
                    scheduled: flight.scheduled,
                    remaining_secs: flight.remaining_secs,
                    finished: flight.finished,
                })
                .collect(),
            aircraft: self
                .pool
                .iter()
                .map(|aircraft| AircraftSnapshot {
                    flight: aircraft.flight,
                    livery: aircraft.livery,
                    x: aircraft.x,
                    y: aircraft.y,
                    z: aircraft.z,
                    tile: aircraft.current_tile(&self.level),
                    heading: aircraft.heading,
                    speed: aircraft.speed,
                    waypoints: aircraft.waypoints.remaining().collect(),
                })
                .collect(),
            runway_claims: self.claims.iter().collect(),
            players: self.players.iter().map(Self::player_snapshot).collect(),
        }
    }

    fn player_snapshot(player: &Player) -> PlayerSnapshot {
        let (mode, invalid) = match &player.mode {
            InteractionMode::Idle => ("idle", false),
            InteractionMode::ShowData => ("show_data", false),
            InteractionMode::SelectRunway { invalid, .. } => ("select_runway", *invalid),
            InteractionMode::SelectPath { draft, .. } => match draft.goal {
                PathGoal::HoldingPoint => ("select_taxiway_to_runway", draft.invalid),
                PathGoal::Parking => ("select_taxiway_to_parking", draft.invalid),
            },
            InteractionMode::Unboarding { .. } => ("unboarding", false),
        };
        let (unboarding_sequence, unboarding_progress) = match &player.mode {
            InteractionMode::Unboarding {
                sequence, progress, ..
            } => (sequence.clone(), *progress),
            _ => (Vec::new(), 0),
        };
        PlayerSnapshot {
            id: player.id,
            responsibility: player.responsibility,
            selected_flight: player.selected_flight(),
            mode,
            invalid,
            unboarding_sequence,
            unboarding_progress,
            camera: player.camera,
        }
    }
}
