//! Input sources for participating players
//!
//! A controller turns the world snapshot of the previous tick into the
//! buttons its player holds this tick. Controllers are chosen at player
//! setup and driven through dynamic dispatch.

use crate::error::ScriptError;
use crate::player::FrameInput;
use crate::sim::WorldSnapshot;

pub trait Controller {
    fn id(&self) -> &'static str;
    fn reset(&mut self);
    fn next_input(&mut self, world: &WorldSnapshot) -> FrameInput;
}

/// Never presses anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdleController;

impl Controller for IdleController {
    fn id(&self) -> &'static str {
        "idle"
    }

    fn reset(&mut self) {}

    fn next_input(&mut self, _world: &WorldSnapshot) -> FrameInput {
        FrameInput::empty()
    }
}

/// Replays button presses at fixed ticks.
///
/// ```text
/// # tick  buttons
/// 120 R1
/// 121 CROSS
/// 300 UP+CROSS
/// ```
///
/// A listed frame is held for that tick only.
#[derive(Clone, Debug, Default)]
pub struct ScriptedController {
    entries: Vec<(u32, FrameInput)>,
    next: usize,
}

impl ScriptedController {
    pub fn new(entries: Vec<(u32, FrameInput)>) -> Self {
        Self { entries, next: 0 }
    }

    pub fn parse(text: &str) -> Result<Self, ScriptError> {
        let mut entries: Vec<(u32, FrameInput)> = Vec::new();
        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let content = raw.split('#').next().unwrap_or_default().trim();
            if content.is_empty() {
                continue;
            }

            let (tick, buttons) = content
                .split_once(char::is_whitespace)
                .unwrap_or((content, ""));
            let tick: u32 = tick.parse().map_err(|_| ScriptError::InvalidTick { line })?;
            if entries.last().is_some_and(|&(previous, _)| previous > tick) {
                return Err(ScriptError::OutOfOrder { line, tick });
            }

            let mut frame = FrameInput::empty();
            for name in buttons.split('+').map(str::trim).filter(|name| !name.is_empty()) {
                let button = FrameInput::from_name(&name.to_ascii_uppercase()).ok_or_else(|| {
                    ScriptError::UnknownButton {
                        line,
                        name: name.to_string(),
                    }
                })?;
                frame |= button;
            }
            entries.push((tick, frame));
        }
        Ok(Self::new(entries))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Controller for ScriptedController {
    fn id(&self) -> &'static str {
        "scripted"
    }

    fn reset(&mut self) {
        self.next = 0;
    }

    fn next_input(&mut self, world: &WorldSnapshot) -> FrameInput {
        let mut frame = FrameInput::empty();
        while let Some(&(tick, buttons)) = self.entries.get(self.next) {
            if tick > world.tick {
                break;
            }
            if tick == world.tick {
                frame |= buttons;
            }
            self.next += 1;
        }
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scripts_with_comments_and_combos() {
        let script = ScriptedController::parse(
            "# opening\n10 R1\n\n11 cross # confirm\n40 UP+CROSS\n",
        )
        .unwrap();
        assert_eq!(
            script.entries,
            vec![
                (10, FrameInput::R1),
                (11, FrameInput::CROSS),
                (40, FrameInput::UP | FrameInput::CROSS)
            ]
        );
    }

    #[test]
    fn rejects_bad_scripts() {
        assert_eq!(
            ScriptedController::parse("x CROSS").unwrap_err(),
            ScriptError::InvalidTick { line: 1 }
        );
        assert!(matches!(
            ScriptedController::parse("1 CROSS+JUMP"),
            Err(ScriptError::UnknownButton { line: 1, .. })
        ));
        assert_eq!(
            ScriptedController::parse("5 UP\n4 DOWN").unwrap_err(),
            ScriptError::OutOfOrder { line: 2, tick: 4 }
        );
    }
}
