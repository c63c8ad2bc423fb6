//! Traffic controller
//!
//! `Simulation` owns every piece of mutable level state and advances it one
//! tick at a time in a fixed order: timers and clocks, roster bookkeeping
//! and spawns, messages, aircraft movement, player input.

use serde::{Deserialize, Serialize};

use crate::aircraft::{Aircraft, AircraftEvent, AircraftPool, Livery, TileOccupancy};
use crate::constants::{
    MAX_PLAYERS, MAX_UNBOARDING_SEQUENCE, PASSENGERS_PER_SEQUENCE_DEFAULT, SCORE_LOSS_PENALTY,
    SCORE_SUCCESS_BONUS, SPAWN_TIMEOUT_SECS_DEFAULT, TICKS_PER_SECOND_DEFAULT,
    UNBOARDING_SEQUENCE_LEN_DEFAULT,
};
use crate::error::{CommandError, RuleCode};
use crate::fixed_arrays::RunwayClaims;
use crate::level::{Level, Terrain, TileIndex};
use crate::player::{FrameInput, Player};
use crate::rng::SeededRng;
use crate::roster::{ClockTime, FlightDirection, FlightId, FlightState, Responsibility, Roster};
use crate::schedule::Schedule;
use crate::timer::{TimerKind, Timers};

mod commands;
mod control;
mod snapshot;

pub use snapshot::{AircraftSnapshot, FlightSnapshot, PlayerSnapshot, WorldSnapshot};

/// How a landing aircraft picks the exit it rolls out to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandingExitRule {
    /// Second exit tile along the run. Known to pick a farther exit when a
    /// closer one shadows it on some layouts; kept for level compatibility.
    #[default]
    SecondExit,
    /// First exit tile after the header.
    NearestAfterHeader,
}

impl LandingExitRule {
    pub fn pick(self, level: &Level, run: &[TileIndex]) -> Option<TileIndex> {
        let mut exits = run
            .iter()
            .copied()
            .skip(1)
            .filter(|&tile| level.tile_at(tile).is_some_and(|cell| cell.is(Terrain::RunwayExit)));
        match self {
            LandingExitRule::SecondExit => exits.nth(1),
            LandingExitRule::NearestAfterHeader => exits.next(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub ticks_per_second: u32,
    /// Minimum gap between a retirement and the next spawn.
    pub spawn_timeout_secs: u32,
    pub landing_exit: LandingExitRule,
    pub passengers_per_sequence: u16,
    pub unboarding_sequence_len: usize,
    pub seed: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            ticks_per_second: TICKS_PER_SECOND_DEFAULT,
            spawn_timeout_secs: SPAWN_TIMEOUT_SECS_DEFAULT,
            landing_exit: LandingExitRule::default(),
            passengers_per_sequence: PASSENGERS_PER_SEQUENCE_DEFAULT,
            unboarding_sequence_len: UNBOARDING_SEQUENCE_LEN_DEFAULT,
            seed: 0xA7C0_0001,
        }
    }
}

impl SimConfig {
    fn ticks_per_second(&self) -> u32 {
        self.ticks_per_second.max(1)
    }

    fn sequence_len(&self) -> usize {
        self.unboarding_sequence_len.clamp(1, MAX_UNBOARDING_SEQUENCE)
    }
}

/// Responsibilities for a one- or two-controller session.
pub fn responsibilities_for(players: usize) -> Vec<Responsibility> {
    match players {
        0 | 1 => vec![Responsibility::all()],
        _ => vec![Responsibility::DEPARTURES, Responsibility::ARRIVALS],
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Sound {
    Notification,
    RunwayAssigned,
    Landing,
    Takeoff,
    Success,
    Loss,
    Crash,
    Invalid,
    KeyAccepted,
    KeyRejected,
}

/// One-way notifications for render, audio and logging collaborators.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum SimEvent {
    Spawned { flight: FlightId, state: FlightState },
    RunwayAssigned { flight: FlightId, header: TileIndex },
    TaxiCleared { flight: FlightId, waypoints: usize },
    TakeoffCleared { flight: FlightId },
    StateChanged { flight: FlightId, state: FlightState },
    Unloaded { flight: FlightId, remaining: u16 },
    Retired { flight: FlightId, success: bool, score: u32 },
    Collision { a: FlightId, b: FlightId },
    Message { text: String },
    Sound(Sound),
    LevelComplete,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum Outcome {
    #[default]
    Running,
    LevelComplete,
    GameOver {
        a: FlightId,
        b: FlightId,
    },
}

#[derive(Clone, Debug)]
struct PendingMessage {
    minutes_until: u16,
    text: String,
    posted: bool,
}

pub struct Simulation {
    config: SimConfig,
    level: Level,
    roster: Roster,
    clock: ClockTime,
    messages: Vec<PendingMessage>,
    pool: AircraftPool,
    occupancy: TileOccupancy,
    claims: RunwayClaims,
    timers: Timers,
    players: Vec<Player>,
    rng: SeededRng,
    score: u32,
    tick: u32,
    remaining_aircraft: usize,
    active_aircraft: usize,
    outcome: Outcome,
    events: Vec<SimEvent>,
    retired_this_tick: Vec<FlightId>,
}

impl Simulation {
    pub fn new(
        level: Level,
        schedule: Schedule,
        responsibilities: &[Responsibility],
        config: SimConfig,
    ) -> Self {
        if responsibilities.len() > MAX_PLAYERS {
            tracing::warn!(
                requested = responsibilities.len(),
                max = MAX_PLAYERS,
                "extra players ignored"
            );
        }
        let players = responsibilities
            .iter()
            .take(MAX_PLAYERS)
            .enumerate()
            .map(|(id, &responsibility)| Player::new(id as u8, responsibility))
            .collect();

        let mut timers = Timers::default();
        timers.add(TimerKind::Second, config.ticks_per_second(), true);

        let Schedule {
            clock,
            roster,
            messages,
        } = schedule;

        let mut sim = Self {
            pool: AircraftPool::new(roster.len()),
            rng: SeededRng::new(config.seed),
            config,
            level,
            roster,
            clock,
            messages: messages
                .into_iter()
                .map(|message| PendingMessage {
                    minutes_until: message.minutes_until,
                    text: message.text,
                    posted: false,
                })
                .collect(),
            occupancy: TileOccupancy::default(),
            claims: RunwayClaims::default(),
            timers,
            players,
            score: 0,
            tick: 0,
            remaining_aircraft: 0,
            active_aircraft: 0,
            outcome: Outcome::Running,
            events: Vec::new(),
            retired_this_tick: Vec::new(),
        };
        sim.recount();
        sim.occupancy.rebuild(&sim.level, &sim.pool);

        tracing::info!(
            level = sim.level.title(),
            flights = sim.roster.len(),
            players = sim.players.len(),
            clock = %sim.clock,
            "level loaded"
        );
        sim
    }

    /// Start from a score carried over from a previous level.
    pub fn with_score(mut self, score: u32) -> Self {
        self.score = score;
        self
    }

    /// Advance one tick. `inputs[i]` are the buttons held by player `i`;
    /// missing entries count as no input. Once the level has ended further
    /// calls return the final outcome without touching state.
    pub fn step(&mut self, inputs: &[FrameInput]) -> Outcome {
        if self.outcome != Outcome::Running {
            return self.outcome;
        }
        self.tick += 1;
        self.retired_this_tick.clear();

        let second = self.poll_timers();
        self.update_roster(second);
        if second {
            self.post_due_messages();
        }
        self.move_aircraft();
        if self.outcome != Outcome::Running {
            return self.outcome;
        }
        self.run_players(inputs);

        if self.roster.all_finished() {
            self.outcome = Outcome::LevelComplete;
            self.events.push(SimEvent::LevelComplete);
            tracing::info!(tick = self.tick, score = self.score, "level complete");
        }
        self.outcome
    }

    /// Returns whether the one-second gate fired this tick.
    fn poll_timers(&mut self) -> bool {
        let fired = self.timers.poll();
        let second = fired.contains(&TimerKind::Second);
        if second {
            self.clock.advance_minute();
            self.roster.decrement_clocks_on_second_tick();
        }
        second
    }

    fn update_roster(&mut self, second: bool) {
        for id in self.roster.ids() {
            let Some(flight) = self.roster.get(id) else {
                continue;
            };
            if flight.is_active() && flight.remaining_secs == 0 && second {
                self.retire(id, false);
            } else if flight.is_due() {
                self.try_spawn(id);
            }
        }
        self.recount();
        self.occupancy.rebuild(&self.level, &self.pool);
    }

    fn try_spawn(&mut self, id: FlightId) {
        if self.timers.is_running(TimerKind::SpawnTimeout) {
            return;
        }
        let Some(flight) = self.roster.get(id) else {
            return;
        };

        match flight.direction {
            FlightDirection::Arrival => {
                self.roster.set_state(id, FlightState::Approach);
                tracing::info!(
                    flight = id,
                    number = %flight_number(&self.roster, id),
                    "arrival on approach"
                );
                self.events.push(SimEvent::Spawned {
                    flight: id,
                    state: FlightState::Approach,
                });
                self.events.push(SimEvent::Sound(Sound::Notification));
            }
            FlightDirection::Departure => {
                let Some(parking) = flight.parking else {
                    return;
                };
                let occupied = self
                    .pool
                    .iter()
                    .any(|aircraft| aircraft.current_tile(&self.level) == Some(parking));
                if occupied {
                    return;
                }
                let livery = Livery::from_flight_number(&flight.number);
                let (x, y) = self.level.tile_center(parking);
                if self.pool.spawn(Aircraft::new(id, livery, x, y, 0)).is_none() {
                    tracing::warn!(flight = id, "aircraft pool full, departure spawn deferred");
                    return;
                }
                self.roster.set_state(id, FlightState::Parked);
                tracing::info!(
                    flight = id,
                    number = %flight_number(&self.roster, id),
                    parking,
                    "departure parked"
                );
                self.events.push(SimEvent::Spawned {
                    flight: id,
                    state: FlightState::Parked,
                });
                self.events.push(SimEvent::Sound(Sound::Notification));
            }
        }
    }

    fn post_due_messages(&mut self) {
        for message in self.messages.iter_mut().filter(|message| !message.posted) {
            if message.minutes_until <= 1 {
                message.posted = true;
                tracing::info!(text = %message.text, "message");
                self.events.push(SimEvent::Message {
                    text: message.text.clone(),
                });
            } else {
                message.minutes_until -= 1;
            }
        }
    }

    fn move_aircraft(&mut self) {
        let events = self
            .pool
            .tick(&self.level, &mut self.roster, &self.occupancy);

        for event in events {
            match event {
                AircraftEvent::WaypointsExhausted { flight, state } => {
                    if state == FlightState::Landed {
                        for header in self.claims.release_flight(flight) {
                            tracing::debug!(flight, header, "runway released on landing");
                        }
                        self.events.push(SimEvent::Sound(Sound::Landing));
                    }
                    self.events.push(SimEvent::StateChanged { flight, state });
                }
                AircraftEvent::AutoStopped { flight } => {
                    self.events.push(SimEvent::StateChanged {
                        flight,
                        state: FlightState::AutoStopped,
                    });
                }
                AircraftEvent::Resumed { flight } => {
                    self.events.push(SimEvent::StateChanged {
                        flight,
                        state: FlightState::Taxiing,
                    });
                }
                AircraftEvent::LeftLevel { flight } => self.retire(flight, true),
            }
        }

        if let Some((a, b)) = self.pool.find_collision() {
            tracing::warn!(a, b, tick = self.tick, "collision");
            self.outcome = Outcome::GameOver { a, b };
            self.events.push(SimEvent::Collision { a, b });
            self.events.push(SimEvent::Sound(Sound::Crash));
        }
        self.recount();
    }

    fn run_players(&mut self, inputs: &[FrameInput]) {
        let mut players = std::mem::take(&mut self.players);
        for player in players.iter_mut() {
            let frame = inputs
                .get(player.id as usize)
                .copied()
                .unwrap_or_default();
            player.input.update(frame);
            player.rebuild_filtered(&self.roster);
            self.run_player(player);
        }
        for &flight in &self.retired_this_tick {
            for player in players.iter_mut() {
                player.forget_flight(flight);
            }
        }
        self.players = players;
    }

    /// End a flight's lifecycle, successfully or as a loss.
    fn retire(&mut self, id: FlightId, success: bool) {
        let released = self.claims.release_flight(id);
        for player in self.players.iter_mut() {
            player.forget_flight(id);
        }
        self.pool.free(id);

        let Some(flight) = self.roster.get_mut(id) else {
            return;
        };
        let remaining_secs = flight.remaining_secs;
        flight.finished = true;
        flight.passengers = 0;
        self.roster.set_state(id, FlightState::Idle);

        if success {
            self.score = self
                .score
                .saturating_add(SCORE_SUCCESS_BONUS + remaining_secs as u32);
        } else {
            self.score = self.score.saturating_sub(SCORE_LOSS_PENALTY);
        }

        let timeout = self.config.spawn_timeout_secs * self.config.ticks_per_second();
        self.timers.restart(TimerKind::SpawnTimeout, timeout);
        self.retired_this_tick.push(id);
        self.recount();

        tracing::info!(
            flight = id,
            number = %flight_number(&self.roster, id),
            success,
            score = self.score,
            released = ?released,
            "flight retired"
        );
        self.events.push(SimEvent::Retired {
            flight: id,
            success,
            score: self.score,
        });
        self.events.push(SimEvent::Sound(if success {
            Sound::Success
        } else {
            Sound::Loss
        }));
    }

    fn recount(&mut self) {
        self.active_aircraft = self.roster.active_count();
        self.remaining_aircraft = self.roster.unfinished_count();
    }

    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn aircraft(&self, flight: FlightId) -> Option<&Aircraft> {
        self.pool.get(flight)
    }

    pub fn pool(&self) -> &AircraftPool {
        &self.pool
    }

    pub fn claims(&self) -> &RunwayClaims {
        &self.claims
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn clock(&self) -> ClockTime {
        self.clock
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn remaining_aircraft(&self) -> usize {
        self.remaining_aircraft
    }

    pub fn active_aircraft(&self) -> usize {
        self.active_aircraft
    }

    /// Whether either end of the header's runway is claimed.
    pub fn runway_in_use(&self, header: TileIndex) -> bool {
        if self.claims.contains(header) {
            return true;
        }
        self.level
            .runway_run(header)
            .and_then(|run| run.last().copied())
            .is_some_and(|end| self.claims.contains(end))
    }

    pub fn validate_invariants(&self) -> Result<(), RuleCode> {
        let mut mapped = 0usize;
        for (flight, slot) in self.pool.flight_slots() {
            if let Some(slot) = slot {
                mapped += 1;
                match self.pool.slot(slot) {
                    Some(aircraft) if aircraft.flight == flight => {}
                    _ => return Err(RuleCode::FlightSlotMapping),
                }
            }
        }
        if mapped != self.pool.len() {
            return Err(RuleCode::FlightSlotMapping);
        }

        for (id, flight) in self.roster.iter() {
            let has_aircraft = self.pool.get(id).is_some();
            if flight.state.has_aircraft() && !has_aircraft {
                return Err(RuleCode::ActiveFlightWithoutAircraft);
            }
            if !flight.state.has_aircraft() && has_aircraft {
                return Err(RuleCode::IdleFlightWithAircraft);
            }
            if flight.finished && flight.state != FlightState::Idle {
                return Err(RuleCode::FinishedFlightNotIdle);
            }
        }

        if self.remaining_aircraft != self.roster.unfinished_count() {
            return Err(RuleCode::RemainingCount);
        }

        for claim in self.claims.iter() {
            if self
                .claims
                .iter()
                .filter(|other| other.header == claim.header || other.flight == claim.flight)
                .count()
                != 1
            {
                return Err(RuleCode::RunwayClaimDuplicated);
            }
            let run = self.level.runway_run(claim.header).unwrap_or_default();
            let touches_run = self.pool.get(claim.flight).is_some_and(|aircraft| {
                aircraft.waypoints.remaining().any(|tile| run.contains(&tile))
                    || aircraft
                        .current_tile(&self.level)
                        .is_some_and(|tile| run.contains(&tile))
            });
            if !touches_run {
                return Err(RuleCode::RunwayClaimOrphaned);
            }
        }

        for aircraft in self.pool.iter() {
            if aircraft.waypoints.cursor() > crate::constants::MAX_WAYPOINTS {
                return Err(RuleCode::WaypointCursorRange);
            }
        }

        Ok(())
    }

    fn flight_state(&self, flight: FlightId) -> Result<FlightState, CommandError> {
        self.roster
            .get(flight)
            .map(|entry| entry.state)
            .ok_or(CommandError::UnknownFlight { flight })
    }
}

fn flight_number(roster: &Roster, id: FlightId) -> String {
    roster
        .get(id)
        .map(|flight| flight.number.clone())
        .unwrap_or_default()
}
