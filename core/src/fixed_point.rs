//! Fixed-point world coordinates
//!
//! Q12.4 format: 12 integer bits, 4 fractional bits (positions, speeds).
//! World space is grid aligned; isometric projection happens in the
//! renderer and never feeds back into the simulation.

use crate::constants::{AIRCRAFT_FOOTPRINT_Q12_4, TILE_HALF_Q12_4, TILE_SIZE_Q12_4};
use crate::level::Direction;

/// Centre of a grid column (or row) in Q12.4.
#[inline]
pub fn tile_center_q12_4(coordinate: usize) -> i32 {
    coordinate as i32 * TILE_SIZE_Q12_4 + TILE_HALF_Q12_4
}

/// Grid column (or row) containing a Q12.4 position, if non-negative.
#[inline]
pub fn grid_coordinate_q12_4(position: i32) -> Option<usize> {
    if position < 0 {
        None
    } else {
        Some((position / TILE_SIZE_Q12_4) as usize)
    }
}

/// Move `position` toward `target` by at most `step`.
///
/// Returns the new position and whether the target was reached. Reaching
/// the target snaps exactly onto it; the result never overshoots.
#[inline]
pub fn step_toward(position: i32, target: i32, step: i32) -> (i32, bool) {
    let delta = target - position;
    if delta.abs() <= step {
        (target, true)
    } else if delta > 0 {
        (position + step, false)
    } else {
        (position - step, false)
    }
}

/// Displace a point along a cardinal direction.
#[inline]
pub fn displace_q12_4(x: i32, y: i32, direction: Direction, distance: i32) -> (i32, i32) {
    let (dx, dy) = direction.unit();
    (x + dx * distance, y + dy * distance)
}

/// Axis-aligned footprint test for two aircraft positions.
#[inline]
pub fn footprints_overlap(ax: i32, ay: i32, bx: i32, by: i32) -> bool {
    (ax - bx).abs() < AIRCRAFT_FOOTPRINT_Q12_4 && (ay - by).abs() < AIRCRAFT_FOOTPRINT_Q12_4
}

/// Direction of travel from one point to another when they differ on a
/// single axis. Points differing on both axes resolve the x axis first.
#[inline]
pub fn heading_between(from: (i32, i32), to: (i32, i32)) -> Option<Direction> {
    if to.0 > from.0 {
        Some(Direction::East)
    } else if to.0 < from.0 {
        Some(Direction::West)
    } else if to.1 > from.1 {
        Some(Direction::South)
    } else if to.1 < from.1 {
        Some(Direction::North)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_toward_snaps_without_overshoot() {
        assert_eq!(step_toward(0, 20, 8), (8, false));
        assert_eq!(step_toward(16, 20, 8), (20, true));
        assert_eq!(step_toward(20, 20, 8), (20, true));
        assert_eq!(step_toward(100, 60, 32), (68, false));
        assert_eq!(step_toward(68, 60, 32), (60, true));
    }

    #[test]
    fn step_toward_never_increases_distance() {
        for position in -300..300 {
            for step in [0, 1, 8, 32, 48] {
                let (next, reached) = step_toward(position, 17, step);
                assert!((next - 17).abs() <= (position - 17).abs());
                if reached {
                    assert_eq!(next, 17);
                }
            }
        }
    }

    #[test]
    fn grid_coordinate_rejects_negative_positions() {
        assert_eq!(grid_coordinate_q12_4(-1), None);
        assert_eq!(grid_coordinate_q12_4(0), Some(0));
        assert_eq!(grid_coordinate_q12_4(TILE_SIZE_Q12_4 - 1), Some(0));
        assert_eq!(grid_coordinate_q12_4(tile_center_q12_4(5)), Some(5));
    }

    #[test]
    fn footprint_overlap_is_strict() {
        assert!(footprints_overlap(0, 0, AIRCRAFT_FOOTPRINT_Q12_4 - 1, 0));
        assert!(!footprints_overlap(0, 0, AIRCRAFT_FOOTPRINT_Q12_4, 0));
        assert!(!footprints_overlap(0, 0, 10, AIRCRAFT_FOOTPRINT_Q12_4));
    }
}
