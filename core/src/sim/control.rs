use super::*;
use crate::level::Direction;
use crate::path::{PathDraft, PathGoal};
use crate::player::{InteractionMode, UNBOARDING_KEYS};

const DPAD: [(FrameInput, Direction); 4] = [
    (FrameInput::UP, Direction::North),
    (FrameInput::DOWN, Direction::South),
    (FrameInput::LEFT, Direction::West),
    (FrameInput::RIGHT, Direction::East),
];

impl Simulation {
    pub(super) fn run_player(&mut self, player: &mut Player) {
        player.highlights.clear();
        let input = player.input;

        if player.mode.flight().is_some_and(|flight| {
            !self.roster.get(flight).is_some_and(|entry| entry.is_active())
        }) {
            player.mode = InteractionMode::Idle;
        }

        // Face buttons belong to the minigame while it runs.
        let in_minigame = matches!(player.mode, InteractionMode::Unboarding { .. });
        if input.single_press(FrameInput::SELECT) {
            player.mode = match player.mode {
                InteractionMode::ShowData => InteractionMode::Idle,
                _ => InteractionMode::ShowData,
            };
        } else if !in_minigame {
            if input.single_press(FrameInput::CIRCLE) {
                player.mode = InteractionMode::Idle;
            } else if input.single_press(FrameInput::TRIANGLE) {
                player.camera.locked = match player.camera.locked {
                    Some(_) => None,
                    None => player.selected_flight(),
                };
            }
        }

        match player.mode {
            InteractionMode::Idle | InteractionMode::ShowData => self.browse(player),
            InteractionMode::SelectRunway { .. } => self.select_runway(player),
            InteractionMode::SelectPath { .. } => self.select_path(player),
            InteractionMode::Unboarding { .. } => self.unboard(player),
        }

        self.follow_camera(player);
    }

    /// Selection cycling, stop/resume and opening a command mode.
    fn browse(&mut self, player: &mut Player) {
        let input = player.input;
        if input.single_press(FrameInput::L1) {
            player.cycle_selection(false);
        }
        if input.single_press(FrameInput::R1) {
            player.cycle_selection(true);
        }
        let Some(flight) = player.selected_flight() else {
            return;
        };
        let state = self.roster.state(flight);

        if input.single_press(FrameInput::SQUARE) {
            let result = match state {
                FlightState::UserStopped => self.resume_aircraft(flight),
                _ => self.stop_aircraft(flight),
            };
            if result.is_err() {
                self.events.push(SimEvent::Sound(Sound::Invalid));
            }
            return;
        }

        if !input.single_press(FrameInput::CROSS) {
            return;
        }
        match state {
            FlightState::Approach | FlightState::HoldingRwy => {
                let choice = 0;
                player.mode = InteractionMode::SelectRunway {
                    flight,
                    choice,
                    invalid: self.runway_choice_invalid(flight, choice),
                };
            }
            FlightState::Parked | FlightState::Landed => {
                let goal = if state == FlightState::Parked {
                    PathGoal::HoldingPoint
                } else {
                    PathGoal::Parking
                };
                match self
                    .pool
                    .get(flight)
                    .and_then(|aircraft| aircraft.current_tile(&self.level))
                {
                    Some(origin) => {
                        player.mode = InteractionMode::SelectPath {
                            flight,
                            draft: PathDraft::new(goal, origin),
                        };
                    }
                    None => self.events.push(SimEvent::Sound(Sound::Invalid)),
                }
            }
            FlightState::ReadyForTakeoff => {
                if self.request_takeoff(flight).is_err() {
                    self.events.push(SimEvent::Sound(Sound::Invalid));
                }
            }
            FlightState::Unboarding => {
                player.mode = InteractionMode::Unboarding {
                    flight,
                    sequence: self.unboarding_sequence(),
                    progress: 0,
                };
            }
            _ => self.events.push(SimEvent::Sound(Sound::Invalid)),
        }
    }

    fn runway_choice_invalid(&self, flight: FlightId, choice: usize) -> bool {
        match self.level.runway_headers().get(choice) {
            Some(&header) => self.check_runway(flight, header).is_err(),
            None => true,
        }
    }

    fn select_runway(&mut self, player: &mut Player) {
        let InteractionMode::SelectRunway { flight, choice, .. } = player.mode else {
            return;
        };
        let headers = self.level.runway_headers().len();
        if headers == 0 {
            player.mode = InteractionMode::Idle;
            self.events.push(SimEvent::Sound(Sound::Invalid));
            return;
        }

        let input = player.input;
        let mut choice = choice % headers;
        if input.single_press(FrameInput::LEFT) || input.single_press(FrameInput::UP) {
            choice = (choice + headers - 1) % headers;
        }
        if input.single_press(FrameInput::RIGHT) || input.single_press(FrameInput::DOWN) {
            choice = (choice + 1) % headers;
        }
        let header = self.level.runway_headers()[choice];
        let mut invalid = self.runway_choice_invalid(flight, choice);

        if input.single_press(FrameInput::CROSS) {
            match self.assign_runway(flight, header) {
                Ok(()) => {
                    player.mode = InteractionMode::Idle;
                    return;
                }
                Err(err) => {
                    tracing::debug!(flight, header, %err, "runway selection rejected");
                    invalid = true;
                    self.events.push(SimEvent::Sound(Sound::Invalid));
                }
            }
        }

        if let Some(run) = self.level.runway_run(header) {
            player.highlights.extend(run);
        }
        player.mode = InteractionMode::SelectRunway {
            flight,
            choice,
            invalid,
        };
    }

    fn select_path(&mut self, player: &mut Player) {
        let InteractionMode::SelectPath { flight, mut draft } =
            std::mem::take(&mut player.mode)
        else {
            return;
        };
        let input = player.input;

        for (button, direction) in DPAD {
            if input.single_press(button) {
                draft.move_cursor(&self.level, direction);
            }
        }

        if input.single_press(FrameInput::CROSS) {
            if draft
                .confirmable(&self.level, &self.occupancy, flight)
                .is_ok()
            {
                match self.confirm_taxi_path(flight, &draft) {
                    Ok(()) => return,
                    Err(err) => {
                        tracing::debug!(flight, %err, "taxi path rejected");
                        draft.invalid = true;
                        self.events.push(SimEvent::Sound(Sound::Invalid));
                    }
                }
            } else if draft.extend(&self.level).is_err() {
                self.events.push(SimEvent::Sound(Sound::Invalid));
            }
        }

        player.highlights.extend(
            draft
                .candidate(&self.level)
                .unwrap_or_else(|_| draft.tiles.clone()),
        );
        player.mode = InteractionMode::SelectPath { flight, draft };
    }

    fn unboard(&mut self, player: &mut Player) {
        let InteractionMode::Unboarding {
            flight,
            mut sequence,
            mut progress,
        } = std::mem::take(&mut player.mode)
        else {
            return;
        };
        if self.roster.state(flight) != FlightState::Unboarding {
            return;
        }

        let fresh = player.input.fresh();
        let pressed: Vec<FrameInput> = UNBOARDING_KEYS
            .iter()
            .copied()
            .filter(|&key| fresh.contains(key))
            .collect();

        if let [key] = pressed.as_slice() {
            if sequence.get(progress) == Some(key) {
                progress += 1;
                self.events.push(SimEvent::Sound(Sound::KeyAccepted));
            } else {
                progress = 0;
                self.events.push(SimEvent::Sound(Sound::KeyRejected));
            }
        }

        if progress >= sequence.len() {
            let per_sequence = self.config.passengers_per_sequence;
            let remaining = match self.roster.get_mut(flight) {
                Some(entry) => {
                    entry.passengers = entry.passengers.saturating_sub(per_sequence);
                    entry.passengers
                }
                None => 0,
            };
            self.events.push(SimEvent::Unloaded { flight, remaining });
            if remaining == 0 {
                self.retire(flight, true);
                return;
            }
            sequence = self.unboarding_sequence();
            progress = 0;
        }

        player.mode = InteractionMode::Unboarding {
            flight,
            sequence,
            progress,
        };
    }

    fn unboarding_sequence(&mut self) -> Vec<FrameInput> {
        (0..self.config.sequence_len())
            .map(|_| UNBOARDING_KEYS[self.rng.next_int(UNBOARDING_KEYS.len() as u32) as usize])
            .collect()
    }

    fn follow_camera(&self, player: &mut Player) {
        let Some(flight) = player.camera.locked else {
            return;
        };
        match self.pool.get(flight) {
            Some(aircraft) => {
                player.camera.x = aircraft.x;
                player.camera.y = aircraft.y;
            }
            None => player.camera.locked = None,
        }
    }
}
