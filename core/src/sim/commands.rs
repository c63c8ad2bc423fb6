use super::*;
use crate::constants::{FINAL_APPROACH_ALTITUDE, FINAL_APPROACH_TILES, TILE_SIZE_Q12_4};
use crate::fixed_point::displace_q12_4;
use crate::level::Direction;
use crate::path::{PathDraft, PathGoal};

impl Simulation {
    /// Clear an APPROACH flight to land on `header`, or send a HOLDING_RWY
    /// flight onto it for departure.
    pub fn assign_runway(
        &mut self,
        flight: FlightId,
        header: TileIndex,
    ) -> Result<(), CommandError> {
        let state = self.flight_state(flight)?;
        if !matches!(state, FlightState::Approach | FlightState::HoldingRwy) {
            return Err(CommandError::WrongState { flight });
        }
        self.check_runway(flight, header)?;

        match state {
            FlightState::Approach => self.clear_to_land(flight, header)?,
            _ => self.clear_to_enter(flight, header)?,
        }

        tracing::debug!(flight, header, "runway claimed");
        self.events.push(SimEvent::RunwayAssigned { flight, header });
        self.events.push(SimEvent::Sound(Sound::RunwayAssigned));
        Ok(())
    }

    /// Validate a runway choice without changing anything.
    pub fn check_runway(&self, flight: FlightId, header: TileIndex) -> Result<(), CommandError> {
        let state = self.flight_state(flight)?;
        if !self.level.runway_headers().contains(&header) {
            return Err(CommandError::InvalidRunway { header });
        }
        if self.runway_in_use(header) {
            return Err(CommandError::RunwayInUse { header });
        }
        if self.claims.len() == crate::constants::MAX_RUNWAY_CLAIMS {
            tracing::warn!(flight, header, "runway claim table full");
            return Err(CommandError::PoolFull);
        }
        match state {
            FlightState::Approach => {
                self.landing_plan(header)?;
                if self.pool.is_full() {
                    return Err(CommandError::PoolFull);
                }
            }
            FlightState::HoldingRwy => {
                self.runway_entry(flight, header)?;
            }
            _ => return Err(CommandError::WrongState { flight }),
        }
        Ok(())
    }

    fn landing_plan(&self, header: TileIndex) -> Result<(Direction, TileIndex), CommandError> {
        let direction = self
            .level
            .tile_at(header)
            .and_then(|cell| cell.runway_direction())
            .ok_or(CommandError::InvalidRunway { header })?;
        let run = self
            .level
            .runway_run(header)
            .ok_or(CommandError::InvalidRunway { header })?;
        let exit = self
            .config
            .landing_exit
            .pick(&self.level, &run)
            .ok_or(CommandError::NoUsableExit { header })?;
        Ok((direction, exit))
    }

    /// Entry tile next to the holding point the aircraft waits on.
    fn runway_entry(
        &self,
        flight: FlightId,
        header: TileIndex,
    ) -> Result<TileIndex, CommandError> {
        let aircraft = self
            .pool
            .get(flight)
            .ok_or(CommandError::UnknownFlight { flight })?;
        let tile = aircraft
            .current_tile(&self.level)
            .ok_or(CommandError::NoUsableExit { header })?;
        let direction = self
            .level
            .tile_at(header)
            .and_then(|cell| cell.runway_direction())
            .ok_or(CommandError::InvalidRunway { header })?;
        let run = self
            .level
            .runway_run(header)
            .ok_or(CommandError::InvalidRunway { header })?;

        Direction::ALL
            .iter()
            .filter_map(|&probe| self.level.neighbor(tile, probe))
            .find(|&candidate| {
                self.level
                    .tile_at(candidate)
                    .is_some_and(|cell| cell.is(Terrain::RunwayExit))
                    && run.contains(&candidate)
                    && self.level.runway_header_behind(candidate, direction) == Some(header)
            })
            .ok_or(CommandError::NoUsableExit { header })
    }

    fn clear_to_land(&mut self, flight: FlightId, header: TileIndex) -> Result<(), CommandError> {
        let (direction, exit) = self.landing_plan(header)?;
        let number = self
            .roster
            .get(flight)
            .map(|entry| entry.number.as_str())
            .unwrap_or_default();

        let (hx, hy) = self.level.tile_center(header);
        let (x, y) = displace_q12_4(
            hx,
            hy,
            direction.opposite(),
            FINAL_APPROACH_TILES * TILE_SIZE_Q12_4,
        );
        let mut aircraft = Aircraft::new(
            flight,
            Livery::from_flight_number(number),
            x,
            y,
            FINAL_APPROACH_ALTITUDE,
        );
        aircraft.heading = Some(direction);
        if !aircraft.waypoints.assign(&[header, exit]) {
            return Err(CommandError::WaypointOverflow);
        }

        self.pool.spawn(aircraft).ok_or(CommandError::PoolFull)?;
        self.claims.claim(header, flight);
        self.roster.set_state(flight, FlightState::Final);
        self.events.push(SimEvent::Spawned {
            flight,
            state: FlightState::Final,
        });
        tracing::info!(flight, header, exit, "cleared to land");
        Ok(())
    }

    fn clear_to_enter(&mut self, flight: FlightId, header: TileIndex) -> Result<(), CommandError> {
        let entry = self.runway_entry(flight, header)?;
        let aircraft = self
            .pool
            .get_mut(flight)
            .ok_or(CommandError::UnknownFlight { flight })?;
        if !aircraft.waypoints.assign(&[entry, header]) {
            return Err(CommandError::WaypointOverflow);
        }
        self.claims.claim(header, flight);
        self.roster.set_state(flight, FlightState::EnteringRwy);
        tracing::info!(flight, header, entry, "cleared onto runway");
        Ok(())
    }

    /// Commit a drafted taxi path. PARKED flights must end on a holding
    /// point, LANDED flights on a free parking tile.
    pub fn confirm_taxi_path(
        &mut self,
        flight: FlightId,
        draft: &PathDraft,
    ) -> Result<(), CommandError> {
        let expected = match self.flight_state(flight)? {
            FlightState::Parked => PathGoal::HoldingPoint,
            FlightState::Landed => PathGoal::Parking,
            _ => return Err(CommandError::WrongState { flight }),
        };
        if draft.goal != expected {
            return Err(CommandError::NotConfirmable);
        }
        let tiles = draft.confirmable(&self.level, &self.occupancy, flight)?;

        let aircraft = self
            .pool
            .get_mut(flight)
            .ok_or(CommandError::UnknownFlight { flight })?;
        if !aircraft.waypoints.assign(&tiles) {
            return Err(CommandError::WaypointOverflow);
        }
        self.roster.set_state(flight, FlightState::Taxiing);
        tracing::debug!(flight, waypoints = tiles.len(), goal = ?expected, "taxi path confirmed");
        self.events.push(SimEvent::TaxiCleared {
            flight,
            waypoints: tiles.len(),
        });
        Ok(())
    }

    /// Send a READY_FOR_TAKEOFF flight down the runway. The runway claim is
    /// released as soon as the takeoff waypoint is set.
    pub fn request_takeoff(&mut self, flight: FlightId) -> Result<(), CommandError> {
        if self.flight_state(flight)? != FlightState::ReadyForTakeoff {
            return Err(CommandError::WrongState { flight });
        }
        let aircraft = self
            .pool
            .get(flight)
            .ok_or(CommandError::UnknownFlight { flight })?;
        let header = aircraft
            .current_tile(&self.level)
            .or_else(|| self.claims.header_of(flight))
            .ok_or(CommandError::WrongState { flight })?;
        let far_end = self
            .level
            .runway_run(header)
            .and_then(|run| run.last().copied())
            .ok_or(CommandError::InvalidRunway { header })?;

        if let Some(aircraft) = self.pool.get_mut(flight) {
            if !aircraft.waypoints.assign(&[far_end]) {
                return Err(CommandError::WaypointOverflow);
            }
        }
        for released in self.claims.release_flight(flight) {
            tracing::debug!(flight, header = released, "runway released on takeoff");
        }
        self.roster.set_state(flight, FlightState::Takeoff);
        tracing::info!(flight, header, far_end, "cleared for takeoff");
        self.events.push(SimEvent::TakeoffCleared { flight });
        self.events.push(SimEvent::Sound(Sound::Takeoff));
        Ok(())
    }

    /// Player hold on a taxiing aircraft.
    pub fn stop_aircraft(&mut self, flight: FlightId) -> Result<(), CommandError> {
        if self.flight_state(flight)? != FlightState::Taxiing {
            return Err(CommandError::WrongState { flight });
        }
        self.roster.set_state(flight, FlightState::UserStopped);
        self.events.push(SimEvent::StateChanged {
            flight,
            state: FlightState::UserStopped,
        });
        Ok(())
    }

    /// Only a player-stopped aircraft can be resumed by the player.
    pub fn resume_aircraft(&mut self, flight: FlightId) -> Result<(), CommandError> {
        if self.flight_state(flight)? != FlightState::UserStopped {
            return Err(CommandError::WrongState { flight });
        }
        self.roster.set_state(flight, FlightState::Taxiing);
        self.events.push(SimEvent::StateChanged {
            flight,
            state: FlightState::Taxiing,
        });
        Ok(())
    }
}
