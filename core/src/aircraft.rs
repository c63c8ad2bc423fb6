use serde::Serialize;

use crate::constants::{
    CLIMB_RATE, CLIMB_SPEED_Q12_4, FINAL_DESCENT_RATE, MAX_AIRCRAFT, RUNWAY_SPEED_Q12_4,
    TAXI_SPEED_Q12_4,
};
use crate::fixed_arrays::WaypointQueue;
use crate::fixed_point::{displace_q12_4, footprints_overlap, heading_between, step_toward};
use crate::level::{Direction, Level, TileIndex};
use crate::roster::{FlightId, FlightState, Roster};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Livery {
    Generic,
    Iberia,
    Lufthansa,
    AirFrance,
    Ryanair,
}

impl Livery {
    /// Airline from the flight-number prefix (ICAO or IATA designator).
    pub fn from_flight_number(number: &str) -> Self {
        let prefix: String = number
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_uppercase())
            .collect();
        match prefix.as_str() {
            "IB" | "IBE" => Livery::Iberia,
            "LH" | "DLH" => Livery::Lufthansa,
            "AF" | "AFR" => Livery::AirFrance,
            "FR" | "RYR" => Livery::Ryanair,
            _ => Livery::Generic,
        }
    }
}

/// Ground or air speed implied by a lifecycle state, in Q12.4 per tick.
pub fn speed_for_state(state: FlightState) -> i32 {
    match state {
        FlightState::Taxiing | FlightState::EnteringRwy => TAXI_SPEED_Q12_4,
        FlightState::Final | FlightState::Takeoff => RUNWAY_SPEED_Q12_4,
        FlightState::Climbing => CLIMB_SPEED_Q12_4,
        FlightState::Idle
        | FlightState::Parked
        | FlightState::Approach
        | FlightState::Landed
        | FlightState::HoldingRwy
        | FlightState::ReadyForTakeoff
        | FlightState::Unboarding
        | FlightState::UserStopped
        | FlightState::AutoStopped => 0,
    }
}

#[derive(Clone, Debug)]
pub struct Aircraft {
    pub flight: FlightId,
    pub livery: Livery,
    pub x: i32,
    pub y: i32,
    /// Altitude; zero on the ground.
    pub z: i32,
    pub heading: Option<Direction>,
    pub speed: i32,
    pub waypoints: WaypointQueue,
}

impl Aircraft {
    pub fn new(flight: FlightId, livery: Livery, x: i32, y: i32, z: i32) -> Self {
        Self {
            flight,
            livery,
            x,
            y,
            z,
            heading: None,
            speed: 0,
            waypoints: WaypointQueue::default(),
        }
    }

    pub fn current_tile(&self, level: &Level) -> Option<TileIndex> {
        level.tile_at_position(self.x, self.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AircraftEvent {
    WaypointsExhausted { flight: FlightId, state: FlightState },
    AutoStopped { flight: FlightId },
    Resumed { flight: FlightId },
    LeftLevel { flight: FlightId },
}

/// Flights standing on each tile, rebuilt once per tick before movement.
#[derive(Clone, Debug, Default)]
pub struct TileOccupancy {
    buckets: Vec<Vec<FlightId>>,
}

impl TileOccupancy {
    pub fn rebuild(&mut self, level: &Level, pool: &AircraftPool) {
        self.buckets.resize_with(level.tile_count(), Vec::new);
        for bucket in self.buckets.iter_mut() {
            bucket.clear();
        }
        for aircraft in pool.iter() {
            if let Some(tile) = aircraft.current_tile(level) {
                self.buckets[tile as usize].push(aircraft.flight);
            }
        }
    }

    pub fn at(&self, tile: TileIndex) -> &[FlightId] {
        self.buckets
            .get(tile as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn occupied_by_other(&self, tile: TileIndex, flight: FlightId) -> bool {
        self.at(tile).iter().any(|&other| other != flight)
    }
}

/// Fixed-capacity pool of live aircraft with a flight-id → slot lookup.
#[derive(Clone, Debug)]
pub struct AircraftPool {
    slots: Vec<Option<Aircraft>>,
    by_flight: Vec<Option<usize>>,
}

impl AircraftPool {
    pub fn new(flight_count: usize) -> Self {
        Self {
            slots: vec![None; MAX_AIRCRAFT],
            by_flight: vec![None; flight_count],
        }
    }

    /// Place an aircraft in the first free slot. Returns `None` when the pool
    /// is full or the flight already has an aircraft.
    pub fn spawn(&mut self, aircraft: Aircraft) -> Option<usize> {
        let flight = aircraft.flight as usize;
        if flight >= self.by_flight.len() || self.by_flight[flight].is_some() {
            return None;
        }
        let slot = self.slots.iter().position(Option::is_none)?;
        self.slots[slot] = Some(aircraft);
        self.by_flight[flight] = Some(slot);
        Some(slot)
    }

    pub fn free(&mut self, flight: FlightId) -> Option<Aircraft> {
        let slot = self.by_flight.get_mut(flight as usize)?.take()?;
        self.slots[slot].take()
    }

    pub fn slot_of(&self, flight: FlightId) -> Option<usize> {
        self.by_flight.get(flight as usize).copied().flatten()
    }

    pub fn get(&self, flight: FlightId) -> Option<&Aircraft> {
        self.slots[self.slot_of(flight)?].as_ref()
    }

    pub fn get_mut(&mut self, flight: FlightId) -> Option<&mut Aircraft> {
        let slot = self.slot_of(flight)?;
        self.slots[slot].as_mut()
    }

    pub fn slot(&self, slot: usize) -> Option<&Aircraft> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Aircraft> {
        self.slots.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    pub fn flight_slots(&self) -> impl Iterator<Item = (FlightId, Option<usize>)> + '_ {
        self.by_flight
            .iter()
            .enumerate()
            .map(|(flight, slot)| (flight as FlightId, *slot))
    }

    /// Advance every live aircraft by one tick.
    pub fn tick(
        &mut self,
        level: &Level,
        roster: &mut Roster,
        occupancy: &TileOccupancy,
    ) -> Vec<AircraftEvent> {
        let positions: Vec<(FlightId, i32, i32)> = self
            .iter()
            .map(|aircraft| (aircraft.flight, aircraft.x, aircraft.y))
            .collect();
        let mut events = Vec::new();

        for aircraft in self.slots.iter_mut().flatten() {
            let state = roster.state(aircraft.flight);
            if state == FlightState::Climbing {
                climb(level, aircraft, &mut events);
                continue;
            }

            let mut speed = speed_for_state(state);
            if let Some(waypoint) = aircraft.waypoints.current() {
                let target = level.tile_center(waypoint);
                if let Some(heading) = heading_between((aircraft.x, aircraft.y), target) {
                    aircraft.heading = Some(heading);
                }
            }

            match state {
                FlightState::Taxiing => {
                    if soft_conflict(level, roster, occupancy, &positions, aircraft) {
                        roster.set_state(aircraft.flight, FlightState::AutoStopped);
                        events.push(AircraftEvent::AutoStopped {
                            flight: aircraft.flight,
                        });
                        speed = 0;
                    }
                }
                FlightState::AutoStopped => {
                    if !soft_conflict(level, roster, occupancy, &positions, aircraft) {
                        roster.set_state(aircraft.flight, FlightState::Taxiing);
                        events.push(AircraftEvent::Resumed {
                            flight: aircraft.flight,
                        });
                    }
                }
                FlightState::Final => {
                    aircraft.z = (aircraft.z - FINAL_DESCENT_RATE).max(0);
                }
                _ => {}
            }

            aircraft.speed = speed;
            if speed > 0 && traverse(level, aircraft) {
                let next = roster.advance_state_on_waypoints_exhausted(aircraft.flight);
                aircraft.waypoints.clear();
                if next == FlightState::Landed {
                    aircraft.z = 0;
                }
                events.push(AircraftEvent::WaypointsExhausted {
                    flight: aircraft.flight,
                    state: next,
                });
            }
        }

        events
    }

    /// First pair of aircraft with overlapping footprints at equal altitude.
    pub fn find_collision(&self) -> Option<(FlightId, FlightId)> {
        let live: Vec<&Aircraft> = self.iter().collect();
        for (i, a) in live.iter().enumerate() {
            for b in &live[i + 1..] {
                if a.z == b.z && footprints_overlap(a.x, a.y, b.x, b.y) {
                    return Some((a.flight, b.flight));
                }
            }
        }
        None
    }
}

/// Move toward the current waypoint one axis at a time. Returns `true` when
/// the queue became exhausted this tick.
fn traverse(level: &Level, aircraft: &mut Aircraft) -> bool {
    let Some(waypoint) = aircraft.waypoints.current() else {
        return false;
    };
    let (tx, ty) = level.tile_center(waypoint);

    if aircraft.x != tx {
        aircraft.x = step_toward(aircraft.x, tx, aircraft.speed).0;
    } else if aircraft.y != ty {
        aircraft.y = step_toward(aircraft.y, ty, aircraft.speed).0;
    }

    if aircraft.x == tx && aircraft.y == ty {
        return aircraft.waypoints.advance();
    }
    false
}

fn climb(level: &Level, aircraft: &mut Aircraft, events: &mut Vec<AircraftEvent>) {
    aircraft.speed = CLIMB_SPEED_Q12_4;
    aircraft.z += CLIMB_RATE;
    if let Some(heading) = aircraft.heading {
        (aircraft.x, aircraft.y) = displace_q12_4(aircraft.x, aircraft.y, heading, aircraft.speed);
    }
    if !level.contains_position(aircraft.x, aircraft.y) {
        events.push(AircraftEvent::LeftLevel {
            flight: aircraft.flight,
        });
    }
}

/// A taxiing aircraft must hold when a stationary aircraft stands ahead of
/// it on its own tile, or anywhere on the next tile along its heading.
fn soft_conflict(
    level: &Level,
    roster: &Roster,
    occupancy: &TileOccupancy,
    positions: &[(FlightId, i32, i32)],
    aircraft: &Aircraft,
) -> bool {
    let (Some(tile), Some(heading)) = (aircraft.current_tile(level), aircraft.heading) else {
        return false;
    };
    let stationary =
        |other: FlightId| other != aircraft.flight && speed_for_state(roster.state(other)) == 0;
    let (ux, uy) = heading.unit();

    let blocked_here = occupancy.at(tile).iter().any(|&other| {
        stationary(other)
            && positions
                .iter()
                .find(|(flight, _, _)| *flight == other)
                .is_some_and(|&(_, ox, oy)| (ox - aircraft.x) * ux + (oy - aircraft.y) * uy >= 0)
    });
    if blocked_here {
        return true;
    }

    level
        .neighbor(tile, heading)
        .is_some_and(|next| occupancy.at(next).iter().any(|&other| stationary(other)))
}
