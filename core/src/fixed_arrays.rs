//! Fixed-capacity tables used by the simulation
//!
//! Everything here has a hard upper bound known at level load; a full table
//! rejects the insert instead of growing.

use serde::Serialize;

use crate::constants::{MAX_RUNWAY_CLAIMS, MAX_WAYPOINTS};
use crate::level::TileIndex;
use crate::roster::FlightId;

/// Ordered tiles an aircraft still has to visit, with a cursor on the next
/// one. An empty slot past the cursor means the queue is exhausted.
#[derive(Clone, Debug)]
pub struct WaypointQueue {
    tiles: [Option<TileIndex>; MAX_WAYPOINTS],
    cursor: u8,
}

impl Default for WaypointQueue {
    fn default() -> Self {
        Self {
            tiles: [None; MAX_WAYPOINTS],
            cursor: 0,
        }
    }
}

impl WaypointQueue {
    /// Replace the queue contents. Returns `false` (queue untouched) when the
    /// list does not fit.
    pub fn assign(&mut self, tiles: &[TileIndex]) -> bool {
        if tiles.len() > MAX_WAYPOINTS {
            return false;
        }
        self.clear();
        for (slot, tile) in self.tiles.iter_mut().zip(tiles) {
            *slot = Some(*tile);
        }
        true
    }

    #[inline(always)]
    pub fn current(&self) -> Option<TileIndex> {
        self.tiles.get(self.cursor as usize).copied().flatten()
    }

    /// Move to the next waypoint. Returns `true` once the queue is exhausted.
    #[inline(always)]
    pub fn advance(&mut self) -> bool {
        if (self.cursor as usize) < MAX_WAYPOINTS {
            self.cursor += 1;
        }
        self.current().is_none()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.current().is_none()
    }

    #[inline(always)]
    pub fn cursor(&self) -> usize {
        self.cursor as usize
    }

    /// Waypoints not yet reached, in visiting order.
    pub fn remaining(&self) -> impl Iterator<Item = TileIndex> + '_ {
        self.tiles[(self.cursor as usize).min(MAX_WAYPOINTS)..]
            .iter()
            .map_while(|slot| *slot)
    }

    pub fn last(&self) -> Option<TileIndex> {
        self.remaining().last()
    }

    #[inline(always)]
    pub fn clear(&mut self) {
        self.tiles = [None; MAX_WAYPOINTS];
        self.cursor = 0;
    }

    pub fn is_cleared(&self) -> bool {
        self.cursor == 0 && self.tiles.iter().all(Option::is_none)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RunwayClaim {
    pub header: TileIndex,
    pub flight: FlightId,
}

/// Runway headers currently claimed by a flight.
#[derive(Clone, Debug, Default)]
pub struct RunwayClaims {
    slots: [Option<RunwayClaim>; MAX_RUNWAY_CLAIMS],
}

impl RunwayClaims {
    pub fn contains(&self, header: TileIndex) -> bool {
        self.iter().any(|claim| claim.header == header)
    }

    pub fn header_of(&self, flight: FlightId) -> Option<TileIndex> {
        self.iter()
            .find(|claim| claim.flight == flight)
            .map(|claim| claim.header)
    }

    /// Returns `false` when the header is already claimed or no slot is free.
    pub fn claim(&mut self, header: TileIndex, flight: FlightId) -> bool {
        if self.contains(header) {
            return false;
        }
        match self.slots.iter_mut().find(|slot| slot.is_none()) {
            Some(slot) => {
                *slot = Some(RunwayClaim { header, flight });
                true
            }
            None => false,
        }
    }

    pub fn release(&mut self, header: TileIndex) -> bool {
        let mut released = false;
        for slot in self.slots.iter_mut() {
            if slot.is_some_and(|claim| claim.header == header) {
                *slot = None;
                released = true;
            }
        }
        released
    }

    pub fn release_flight(&mut self, flight: FlightId) -> Vec<TileIndex> {
        let mut released = Vec::new();
        for slot in self.slots.iter_mut() {
            if let Some(claim) = *slot {
                if claim.flight == flight {
                    released.push(claim.header);
                    *slot = None;
                }
            }
        }
        released
    }

    pub fn iter(&self) -> impl Iterator<Item = RunwayClaim> + '_ {
        self.slots.iter().filter_map(|slot| *slot)
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waypoint_queue_exhausts_after_last_tile() {
        let mut queue = WaypointQueue::default();
        assert!(queue.assign(&[4, 5, 6]));
        assert_eq!(queue.current(), Some(4));
        assert!(!queue.advance());
        assert!(!queue.advance());
        assert_eq!(queue.remaining().collect::<Vec<_>>(), vec![6]);
        assert!(queue.advance());
        assert!(queue.is_empty());
        queue.clear();
        assert!(queue.is_cleared());
    }

    #[test]
    fn waypoint_queue_rejects_overflow() {
        let mut queue = WaypointQueue::default();
        assert!(queue.assign(&[1]));
        let too_many: Vec<TileIndex> = (0..=MAX_WAYPOINTS as TileIndex).collect();
        assert!(!queue.assign(&too_many));
        assert_eq!(queue.current(), Some(1));
    }

    #[test]
    fn full_waypoint_queue_exhausts_at_capacity() {
        let mut queue = WaypointQueue::default();
        let full: Vec<TileIndex> = (0..MAX_WAYPOINTS as TileIndex).collect();
        assert!(queue.assign(&full));
        for _ in 0..MAX_WAYPOINTS - 1 {
            assert!(!queue.advance());
        }
        assert!(queue.advance());
        assert_eq!(queue.remaining().count(), 0);
    }

    #[test]
    fn runway_claims_are_exclusive_per_header() {
        let mut claims = RunwayClaims::default();
        assert!(claims.claim(0, 1));
        assert!(!claims.claim(0, 2));
        assert!(claims.claim(7, 2));
        assert_eq!(claims.header_of(2), Some(7));
        assert_eq!(claims.release_flight(1), vec![0]);
        assert!(!claims.contains(0));
        assert!(claims.release(7));
        assert!(claims.is_empty());
    }
}
