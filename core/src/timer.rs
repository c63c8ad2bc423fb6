use crate::constants::MAX_TIMERS;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerKind {
    /// Repeating gate for the once-per-second clock work.
    Second,
    /// One-shot latch that blocks spawns right after a retirement.
    SpawnTimeout,
}

#[derive(Clone, Copy, Debug)]
struct Timer {
    kind: TimerKind,
    period: u32,
    remaining: u32,
    repeat: bool,
}

/// Cooperative countdown timers, polled once per tick and fired
/// synchronously from inside it.
#[derive(Clone, Debug, Default)]
pub struct Timers {
    slots: [Option<Timer>; MAX_TIMERS],
}

impl Timers {
    /// Returns `false` when every slot is taken.
    pub fn add(&mut self, kind: TimerKind, ticks: u32, repeat: bool) -> bool {
        let ticks = ticks.max(1);
        match self.slots.iter_mut().find(|slot| slot.is_none()) {
            Some(slot) => {
                *slot = Some(Timer {
                    kind,
                    period: ticks,
                    remaining: ticks,
                    repeat,
                });
                true
            }
            None => {
                tracing::warn!(?kind, "no free timer slot");
                false
            }
        }
    }

    pub fn is_running(&self, kind: TimerKind) -> bool {
        self.slots.iter().flatten().any(|timer| timer.kind == kind)
    }

    /// Restart a one-shot timer, or add it when none is running.
    pub fn restart(&mut self, kind: TimerKind, ticks: u32) -> bool {
        for timer in self.slots.iter_mut().flatten() {
            if timer.kind == kind {
                timer.remaining = ticks.max(1);
                timer.period = ticks.max(1);
                return true;
            }
        }
        self.add(kind, ticks, false)
    }

    /// Advance every timer by one tick and return the ones that fired.
    pub fn poll(&mut self) -> Vec<TimerKind> {
        let mut fired = Vec::new();
        for slot in self.slots.iter_mut() {
            let Some(timer) = slot.as_mut() else {
                continue;
            };
            timer.remaining -= 1;
            if timer.remaining == 0 {
                fired.push(timer.kind);
                if timer.repeat {
                    timer.remaining = timer.period;
                } else {
                    *slot = None;
                }
            }
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeating_timer_fires_every_period() {
        let mut timers = Timers::default();
        assert!(timers.add(TimerKind::Second, 3, true));
        let fired: Vec<usize> = (1..=9)
            .filter(|_| timers.poll().contains(&TimerKind::Second))
            .collect();
        assert_eq!(fired.len(), 3);
        assert!(timers.is_running(TimerKind::Second));
    }

    #[test]
    fn one_shot_timer_frees_its_slot() {
        let mut timers = Timers::default();
        assert!(timers.add(TimerKind::SpawnTimeout, 2, false));
        assert!(timers.poll().is_empty());
        assert_eq!(timers.poll(), vec![TimerKind::SpawnTimeout]);
        assert!(!timers.is_running(TimerKind::SpawnTimeout));
    }

    #[test]
    fn full_table_rejects_new_timers() {
        let mut timers = Timers::default();
        for _ in 0..MAX_TIMERS {
            assert!(timers.add(TimerKind::Second, 10, true));
        }
        assert!(!timers.add(TimerKind::SpawnTimeout, 1, false));
        assert!(!timers.restart(TimerKind::SpawnTimeout, 1));
    }
}
