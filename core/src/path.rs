//! Taxi path drafting
//!
//! A draft grows from the aircraft's tile by straight-line segments toward
//! the player's cursor. Each segment walks the larger axis first, one tile
//! per step; revisiting a tile or stepping onto non-pathable terrain makes
//! the whole candidate invalid.

use serde::Serialize;

use crate::aircraft::TileOccupancy;
use crate::constants::MAX_WAYPOINTS;
use crate::error::CommandError;
use crate::level::{Direction, Level, Terrain, TileIndex};
use crate::roster::FlightId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PathGoal {
    /// Departures taxi to a holding point short of a runway.
    HoldingPoint,
    /// Arrivals taxi to a free parking tile.
    Parking,
}

impl PathGoal {
    pub fn terminal(self) -> Terrain {
        match self {
            PathGoal::HoldingPoint => Terrain::HoldingPoint,
            PathGoal::Parking => Terrain::Parking,
        }
    }
}

/// Tiles visited walking from `from` (exclusive) to `to` (inclusive).
///
/// The axis with the larger delta is walked first; on a tie columns go
/// first.
pub fn walk_segment(level: &Level, from: TileIndex, to: TileIndex) -> Vec<TileIndex> {
    let (from_col, from_row) = level.grid_coordinate(from);
    let (to_col, to_row) = level.grid_coordinate(to);
    let dx = to_col as i32 - from_col as i32;
    let dy = to_row as i32 - from_row as i32;

    let horizontal = if dx > 0 { Direction::East } else { Direction::West };
    let vertical = if dy > 0 { Direction::South } else { Direction::North };
    let legs = if dx.abs() >= dy.abs() {
        [(horizontal, dx.unsigned_abs()), (vertical, dy.unsigned_abs())]
    } else {
        [(vertical, dy.unsigned_abs()), (horizontal, dx.unsigned_abs())]
    };

    let mut tiles = Vec::with_capacity((dx.unsigned_abs() + dy.unsigned_abs()) as usize);
    let mut current = from;
    for (direction, steps) in legs {
        for _ in 0..steps {
            match level.neighbor(current, direction) {
                Some(next) => {
                    tiles.push(next);
                    current = next;
                }
                None => return tiles,
            }
        }
    }
    tiles
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PathDraft {
    pub goal: PathGoal,
    /// Tile the aircraft stands on when drafting starts.
    pub origin: TileIndex,
    /// Waypoints accepted so far.
    pub tiles: Vec<TileIndex>,
    pub cursor: TileIndex,
    /// Render hint: the candidate under the cursor cannot be used.
    pub invalid: bool,
}

impl PathDraft {
    pub fn new(goal: PathGoal, origin: TileIndex) -> Self {
        Self {
            goal,
            origin,
            tiles: Vec::new(),
            cursor: origin,
            invalid: false,
        }
    }

    /// Last confirmed waypoint, or the origin when none was accepted yet.
    pub fn anchor(&self) -> TileIndex {
        self.tiles.last().copied().unwrap_or(self.origin)
    }

    /// Accepted waypoints followed by the segment toward the cursor.
    pub fn candidate(&self, level: &Level) -> Result<Vec<TileIndex>, CommandError> {
        let mut tiles = self.tiles.clone();
        for tile in walk_segment(level, self.anchor(), self.cursor) {
            if tile == self.origin || tiles.contains(&tile) {
                return Err(CommandError::InvalidPath);
            }
            if !level.tile_at(tile).is_some_and(|cell| cell.is_pathable()) {
                return Err(CommandError::InvalidPath);
            }
            tiles.push(tile);
        }
        if tiles.len() > MAX_WAYPOINTS {
            return Err(CommandError::WaypointOverflow);
        }
        Ok(tiles)
    }

    pub fn move_cursor(&mut self, level: &Level, direction: Direction) {
        if let Some(next) = level.neighbor(self.cursor, direction) {
            self.cursor = next;
        }
        self.invalid = self.candidate(level).is_err();
    }

    /// Accept the segment toward the cursor as waypoints.
    pub fn extend(&mut self, level: &Level) -> Result<(), CommandError> {
        match self.candidate(level) {
            Ok(tiles) => {
                self.tiles = tiles;
                self.invalid = false;
                Ok(())
            }
            Err(err) => {
                self.invalid = true;
                Err(err)
            }
        }
    }

    /// Full waypoint list when the candidate ends on a usable terminal tile.
    pub fn confirmable(
        &self,
        level: &Level,
        occupancy: &TileOccupancy,
        flight: FlightId,
    ) -> Result<Vec<TileIndex>, CommandError> {
        let tiles = self.candidate(level)?;
        let terminal = *tiles.last().ok_or(CommandError::NotConfirmable)?;
        if !level
            .tile_at(terminal)
            .is_some_and(|cell| cell.is(self.goal.terminal()))
        {
            return Err(CommandError::NotConfirmable);
        }
        if self.goal == PathGoal::Parking && occupancy.occupied_by_other(terminal, flight) {
            return Err(CommandError::ParkingOccupied { tile: terminal });
        }
        Ok(tiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::LevelBuilder;

    // Apron: taxiway row 2 (cols 1..=5), taxiway column 5 (rows 0..=2),
    // parking at (1,3) and (3,3), holding point at (1,1).
    fn apron() -> Level {
        let mut builder = LevelBuilder::new("Apron", 8);
        for column in 1..=5 {
            builder = builder.tile(column, 2, Terrain::Taxiway);
        }
        builder
            .tile(5, 0, Terrain::Taxiway)
            .tile(5, 1, Terrain::Taxiway)
            .tile(1, 1, Terrain::HoldingPoint)
            .tile(1, 3, Terrain::Parking)
            .tile(3, 3, Terrain::Parking)
            .build()
            .unwrap()
    }

    fn tile(level: &Level, column: usize, row: usize) -> TileIndex {
        level.tile_index(column, row).unwrap()
    }

    #[test]
    fn segment_walks_larger_axis_first() {
        let level = apron();
        let from = tile(&level, 5, 0);
        let to = tile(&level, 3, 3);
        let walked: Vec<(usize, usize)> = walk_segment(&level, from, to)
            .into_iter()
            .map(|tile| level.grid_coordinate(tile))
            .collect();
        assert_eq!(walked, vec![(5, 1), (5, 2), (5, 3), (4, 3), (3, 3)]);
    }

    #[test]
    fn segment_breaks_ties_along_columns() {
        let level = apron();
        let walked: Vec<(usize, usize)> =
            walk_segment(&level, tile(&level, 2, 2), tile(&level, 1, 1))
                .into_iter()
                .map(|tile| level.grid_coordinate(tile))
                .collect();
        assert_eq!(walked, vec![(1, 2), (1, 1)]);
    }

    #[test]
    fn draft_confirms_on_goal_terrain_only() {
        let level = apron();
        let occupancy = TileOccupancy::default();
        let mut draft = PathDraft::new(PathGoal::Parking, tile(&level, 5, 0));

        draft.cursor = tile(&level, 5, 2);
        assert_eq!(
            draft.confirmable(&level, &occupancy, 0),
            Err(CommandError::NotConfirmable)
        );
        draft.extend(&level).unwrap();

        draft.cursor = tile(&level, 3, 3);
        // (5,2) -> (3,3): columns first through (4,2), (3,2), then (3,3).
        let tiles = draft.confirmable(&level, &occupancy, 0).unwrap();
        assert_eq!(tiles.len(), 5);
        assert_eq!(*tiles.last().unwrap(), tile(&level, 3, 3));
    }

    #[test]
    fn non_pathable_tiles_invalidate_the_candidate() {
        let level = apron();
        let mut draft = PathDraft::new(PathGoal::HoldingPoint, tile(&level, 3, 3));
        draft.move_cursor(&level, Direction::East);
        assert!(draft.invalid, "(4,3) is grass");
        assert_eq!(draft.extend(&level), Err(CommandError::InvalidPath));
        assert!(draft.tiles.is_empty());
    }

    #[test]
    fn revisiting_a_buffered_tile_is_rejected() {
        let level = apron();
        let mut draft = PathDraft::new(PathGoal::HoldingPoint, tile(&level, 3, 3));
        draft.cursor = tile(&level, 3, 2);
        draft.extend(&level).unwrap();
        draft.cursor = tile(&level, 5, 2);
        draft.extend(&level).unwrap();

        draft.cursor = tile(&level, 4, 2);
        assert_eq!(draft.candidate(&level), Err(CommandError::InvalidPath));
        draft.cursor = tile(&level, 3, 3);
        assert_eq!(draft.candidate(&level), Err(CommandError::InvalidPath));
    }
}
