use core::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::MINUTES_PER_DAY;
use crate::level::TileIndex;

/// Index of a flight in the roster, stable for the whole level.
pub type FlightId = u8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlightDirection {
    Departure,
    Arrival,
}

bitflags::bitflags! {
    /// Flight directions a controller is responsible for.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Responsibility: u8 {
        const DEPARTURES = 0b01;
        const ARRIVALS   = 0b10;
    }
}

impl Responsibility {
    pub fn covers(self, direction: FlightDirection) -> bool {
        match direction {
            FlightDirection::Departure => self.contains(Responsibility::DEPARTURES),
            FlightDirection::Arrival => self.contains(Responsibility::ARRIVALS),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlightState {
    #[default]
    Idle,
    Parked,
    Approach,
    Final,
    Landed,
    Taxiing,
    HoldingRwy,
    EnteringRwy,
    ReadyForTakeoff,
    Takeoff,
    Climbing,
    Unboarding,
    UserStopped,
    AutoStopped,
}

impl FlightState {
    /// APPROACH is active on the roster but has no aircraft yet.
    #[inline]
    pub fn has_aircraft(self) -> bool {
        !matches!(self, FlightState::Idle | FlightState::Approach)
    }

    /// Next state when the waypoint queue runs out. States that never move
    /// along waypoints map to themselves.
    pub fn on_waypoints_exhausted(self, direction: FlightDirection) -> FlightState {
        match (self, direction) {
            (FlightState::Final, _) => FlightState::Landed,
            (FlightState::Taxiing, FlightDirection::Departure) => FlightState::HoldingRwy,
            (FlightState::Taxiing, FlightDirection::Arrival) => FlightState::Unboarding,
            (FlightState::EnteringRwy, _) => FlightState::ReadyForTakeoff,
            (FlightState::Takeoff, _) => FlightState::Climbing,
            (state, _) => state,
        }
    }
}

impl fmt::Display for FlightState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FlightState::Idle => "IDLE",
            FlightState::Parked => "PARKED",
            FlightState::Approach => "APPROACH",
            FlightState::Final => "FINAL",
            FlightState::Landed => "LANDED",
            FlightState::Taxiing => "TAXIING",
            FlightState::HoldingRwy => "HOLDING_RWY",
            FlightState::EnteringRwy => "ENTERING_RWY",
            FlightState::ReadyForTakeoff => "READY_FOR_TAKEOFF",
            FlightState::Takeoff => "TAKEOFF",
            FlightState::Climbing => "CLIMBING",
            FlightState::Unboarding => "UNBOARDING",
            FlightState::UserStopped => "USER_STOPPED",
            FlightState::AutoStopped => "AUTO_STOPPED",
        };
        f.write_str(label)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClockTime {
    pub hour: u8,
    pub minute: u8,
}

impl ClockTime {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }

    /// Parse `HH:MM`.
    pub fn parse(text: &str) -> Option<Self> {
        let (hour, minute) = text.trim().split_once(':')?;
        Self::new(hour.trim().parse().ok()?, minute.trim().parse().ok()?)
    }

    pub fn advance_minute(&mut self) {
        self.minute += 1;
        if self.minute == 60 {
            self.minute = 0;
            self.hour = (self.hour + 1) % 24;
        }
    }

    #[inline]
    pub fn minutes_of_day(self) -> u16 {
        self.hour as u16 * 60 + self.minute as u16
    }

    /// Minutes from `self` forward to `later`, wrapping past midnight.
    pub fn minutes_until(self, later: ClockTime) -> u16 {
        (later.minutes_of_day() + MINUTES_PER_DAY - self.minutes_of_day()) % MINUTES_PER_DAY
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// One scheduled flight.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Flight {
    pub direction: FlightDirection,
    pub number: String,
    pub passengers: u16,
    pub scheduled: ClockTime,
    /// Game minutes left before the flight becomes due.
    pub minutes_until_scheduled: u16,
    /// Departures only.
    pub parking: Option<TileIndex>,
    pub remaining_secs: u16,
    pub state: FlightState,
    pub finished: bool,
}

impl Flight {
    #[inline]
    pub fn is_due(&self) -> bool {
        self.state == FlightState::Idle && !self.finished && self.minutes_until_scheduled == 0
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.state != FlightState::Idle
    }
}

/// Every flight of the level, indexed by flight id. Entries are never
/// reused or reordered while the level runs.
#[derive(Clone, Debug, Default)]
pub struct Roster {
    flights: Vec<Flight>,
}

impl Roster {
    pub(crate) fn from_flights(flights: Vec<Flight>) -> Self {
        Self { flights }
    }

    pub fn len(&self) -> usize {
        self.flights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flights.is_empty()
    }

    pub fn get(&self, id: FlightId) -> Option<&Flight> {
        self.flights.get(id as usize)
    }

    pub fn get_mut(&mut self, id: FlightId) -> Option<&mut Flight> {
        self.flights.get_mut(id as usize)
    }

    pub fn state(&self, id: FlightId) -> FlightState {
        self.get(id).map_or(FlightState::Idle, |flight| flight.state)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FlightId, &Flight)> {
        self.flights
            .iter()
            .enumerate()
            .map(|(id, flight)| (id as FlightId, flight))
    }

    pub fn ids(&self) -> impl Iterator<Item = FlightId> {
        0..self.flights.len() as FlightId
    }

    /// Remaining time runs down for active flights; idle flights that are
    /// not yet due count down toward their schedule.
    pub fn decrement_clocks_on_second_tick(&mut self) {
        for flight in self.flights.iter_mut() {
            if flight.is_active() {
                flight.remaining_secs = flight.remaining_secs.saturating_sub(1);
            } else if !flight.finished {
                flight.minutes_until_scheduled = flight.minutes_until_scheduled.saturating_sub(1);
            }
        }
    }

    /// Apply the waypoint-exhaustion transition to a flight and return its
    /// new state.
    pub fn advance_state_on_waypoints_exhausted(&mut self, id: FlightId) -> FlightState {
        let Some(flight) = self.get_mut(id) else {
            return FlightState::Idle;
        };
        let next = flight.state.on_waypoints_exhausted(flight.direction);
        if next != flight.state {
            tracing::debug!(flight = id, from = %flight.state, to = %next, "waypoints exhausted");
        }
        flight.state = next;
        next
    }

    pub fn set_state(&mut self, id: FlightId, state: FlightState) {
        if let Some(flight) = self.get_mut(id) {
            if flight.state != state {
                tracing::debug!(flight = id, from = %flight.state, to = %state, "flight state");
                flight.state = state;
            }
        }
    }

    pub fn active_count(&self) -> usize {
        self.flights.iter().filter(|flight| flight.is_active()).count()
    }

    pub fn unfinished_count(&self) -> usize {
        self.flights.iter().filter(|flight| !flight.finished).count()
    }

    pub fn all_finished(&self) -> bool {
        self.flights.iter().all(|flight| flight.finished)
    }
}
