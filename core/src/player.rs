use serde::Serialize;

use crate::level::TileIndex;
use crate::path::PathDraft;
use crate::roster::{FlightId, Responsibility, Roster};

bitflags::bitflags! {
    /// Buttons held during one frame.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
    pub struct FrameInput: u16 {
        const UP       = 1 << 0;
        const DOWN     = 1 << 1;
        const LEFT     = 1 << 2;
        const RIGHT    = 1 << 3;
        const CROSS    = 1 << 4;
        const SQUARE   = 1 << 5;
        const TRIANGLE = 1 << 6;
        const CIRCLE   = 1 << 7;
        const L1       = 1 << 8;
        const R1       = 1 << 9;
        const SELECT   = 1 << 10;
        const START    = 1 << 11;
    }
}

/// Keys the unboarding minigame draws its sequence from.
pub const UNBOARDING_KEYS: [FrameInput; 4] = [
    FrameInput::CROSS,
    FrameInput::SQUARE,
    FrameInput::TRIANGLE,
    FrameInput::CIRCLE,
];

/// Edge detection over consecutive frames.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct InputState {
    current: FrameInput,
    previous: FrameInput,
    last_single_pressed: Option<FrameInput>,
}

impl InputState {
    pub fn update(&mut self, frame: FrameInput) {
        self.previous = self.current;
        self.current = frame;
        let fresh = self.current.difference(self.previous);
        if fresh.bits().count_ones() == 1 {
            self.last_single_pressed = Some(fresh);
        }
    }

    #[inline]
    pub fn pressed(&self, button: FrameInput) -> bool {
        self.current.contains(button)
    }

    /// Down this frame, up the frame before.
    #[inline]
    pub fn single_press(&self, button: FrameInput) -> bool {
        self.current.contains(button) && !self.previous.contains(button)
    }

    #[inline]
    pub fn released(&self, button: FrameInput) -> bool {
        self.previous.contains(button) && !self.current.contains(button)
    }

    /// Buttons that went down this frame.
    #[inline]
    pub fn fresh(&self) -> FrameInput {
        self.current.difference(self.previous)
    }

    pub fn last_single_pressed(&self) -> Option<FrameInput> {
        self.last_single_pressed
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub enum InteractionMode {
    #[default]
    Idle,
    ShowData,
    SelectRunway {
        flight: FlightId,
        /// Index into the level's runway header list.
        choice: usize,
        invalid: bool,
    },
    SelectPath {
        flight: FlightId,
        draft: PathDraft,
    },
    Unboarding {
        flight: FlightId,
        sequence: Vec<FrameInput>,
        progress: usize,
    },
}

impl InteractionMode {
    pub fn flight(&self) -> Option<FlightId> {
        match self {
            InteractionMode::Idle | InteractionMode::ShowData => None,
            InteractionMode::SelectRunway { flight, .. }
            | InteractionMode::SelectPath { flight, .. }
            | InteractionMode::Unboarding { flight, .. } => Some(*flight),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Camera {
    /// Flight the camera follows, if any.
    pub locked: Option<FlightId>,
    pub x: i32,
    pub y: i32,
}

/// View state of one participating controller.
#[derive(Clone, Debug, Serialize)]
pub struct Player {
    pub id: u8,
    pub responsibility: Responsibility,
    /// Active flights this player may command, in roster order.
    pub filtered: Vec<FlightId>,
    pub selected: usize,
    pub mode: InteractionMode,
    pub camera: Camera,
    #[serde(skip)]
    pub input: InputState,
    /// Tiles to highlight this frame; recomputed every tick.
    pub highlights: Vec<TileIndex>,
}

impl Player {
    pub fn new(id: u8, responsibility: Responsibility) -> Self {
        Self {
            id,
            responsibility,
            filtered: Vec::new(),
            selected: 0,
            mode: InteractionMode::Idle,
            camera: Camera::default(),
            input: InputState::default(),
            highlights: Vec::new(),
        }
    }

    pub fn selected_flight(&self) -> Option<FlightId> {
        self.filtered.get(self.selected).copied()
    }

    /// Rebuild the list of commandable flights, keeping the current
    /// selection when it is still present.
    pub fn rebuild_filtered(&mut self, roster: &Roster) {
        let previous = self.selected_flight();
        self.filtered.clear();
        self.filtered.extend(
            roster
                .iter()
                .filter(|(_, flight)| {
                    flight.is_active() && self.responsibility.covers(flight.direction)
                })
                .map(|(id, _)| id),
        );
        self.selected = previous
            .and_then(|flight| self.filtered.iter().position(|&id| id == flight))
            .unwrap_or(0);
    }

    pub fn cycle_selection(&mut self, forward: bool) {
        let len = self.filtered.len();
        if len == 0 {
            self.selected = 0;
            return;
        }
        self.selected = if forward {
            (self.selected + 1) % len
        } else {
            (self.selected + len - 1) % len
        };
    }

    /// Drop any mode or camera lock that refers to a retired flight.
    pub fn forget_flight(&mut self, flight: FlightId) {
        if self.mode.flight() == Some(flight) {
            self.mode = InteractionMode::Idle;
        }
        if self.camera.locked == Some(flight) {
            self.camera.locked = None;
        }
    }
}
