use serde::{Deserialize, Serialize};

use crate::constants::{
    LEVEL_HEADER_SIZE, LEVEL_MAGIC, LEVEL_MAX_COLUMNS, LEVEL_MIN_COLUMNS, LEVEL_TITLE_OFFSET,
    LEVEL_TITLE_SIZE, TILE_ID_MASK, TILE_MIRROR_FLAG, TILE_SIZE_Q12_4,
};
use crate::error::LevelError;
use crate::fixed_point::{grid_coordinate_q12_4, tile_center_q12_4};

/// Row-major tile index: `row * columns + column`.
pub type TileIndex = u16;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    #[inline]
    pub fn unit(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
        }
    }

    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }
}

/// Terrain ids stored in the low seven bits of a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Terrain {
    Grass = 0,
    Asphalt = 1,
    Water = 2,
    /// Runway end facing east; mirrored, facing west.
    RunwayStartEast = 3,
    /// Runway end facing south; mirrored, facing north.
    RunwayStartSouth = 4,
    RunwayMid = 5,
    RunwayExit = 6,
    Parking = 7,
    HoldingPoint = 8,
    Taxiway = 9,
    TaxiwayCorner = 10,
    TaxiwayCrossing = 11,
}

impl Terrain {
    pub fn from_id(id: u8) -> Option<Self> {
        Some(match id & TILE_ID_MASK {
            0 => Terrain::Grass,
            1 => Terrain::Asphalt,
            2 => Terrain::Water,
            3 => Terrain::RunwayStartEast,
            4 => Terrain::RunwayStartSouth,
            5 => Terrain::RunwayMid,
            6 => Terrain::RunwayExit,
            7 => Terrain::Parking,
            8 => Terrain::HoldingPoint,
            9 => Terrain::Taxiway,
            10 => Terrain::TaxiwayCorner,
            11 => Terrain::TaxiwayCrossing,
            _ => return None,
        })
    }

    #[inline]
    pub fn id(self) -> u8 {
        self as u8
    }

    #[inline]
    pub fn is_runway_start(self) -> bool {
        matches!(self, Terrain::RunwayStartEast | Terrain::RunwayStartSouth)
    }
}

/// Terrain a taxi path may cross.
pub const PATHABLE_TERRAIN: [Terrain; 8] = [
    Terrain::Asphalt,
    Terrain::RunwayMid,
    Terrain::RunwayExit,
    Terrain::Parking,
    Terrain::HoldingPoint,
    Terrain::Taxiway,
    Terrain::TaxiwayCorner,
    Terrain::TaxiwayCrossing,
];

/// One grid cell: building id in the high byte, terrain (plus mirror flag)
/// in the low byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell(u16);

impl Cell {
    #[inline]
    pub fn new(terrain: u8, building: u8) -> Self {
        Cell(((building as u16) << 8) | terrain as u16)
    }

    #[inline]
    pub fn from_raw(raw: u16) -> Self {
        Cell(raw)
    }

    #[inline]
    pub fn raw(self) -> u16 {
        self.0
    }

    /// Terrain byte including the mirror flag.
    #[inline]
    pub fn terrain_byte(self) -> u8 {
        (self.0 & 0xff) as u8
    }

    #[inline]
    pub fn mirrored(self) -> bool {
        self.terrain_byte() & TILE_MIRROR_FLAG != 0
    }

    #[inline]
    pub fn terrain(self) -> Option<Terrain> {
        Terrain::from_id(self.terrain_byte())
    }

    #[inline]
    pub fn is(self, terrain: Terrain) -> bool {
        self.terrain_byte() & TILE_ID_MASK == terrain.id()
    }

    #[inline]
    pub fn building(self) -> Option<u8> {
        match (self.0 >> 8) as u8 {
            0 => None,
            id => Some(id),
        }
    }

    /// Checked against the plain id and its mirrored variant.
    pub fn is_pathable(self) -> bool {
        let byte = self.terrain_byte();
        PATHABLE_TERRAIN
            .iter()
            .any(|terrain| byte == terrain.id() || byte == terrain.id() | TILE_MIRROR_FLAG)
    }

    #[inline]
    pub fn is_runway_start(self) -> bool {
        self.terrain().is_some_and(Terrain::is_runway_start)
    }

    /// Direction a runway extends from this header tile.
    pub fn runway_direction(self) -> Option<Direction> {
        match (self.terrain()?, self.mirrored()) {
            (Terrain::RunwayStartEast, false) => Some(Direction::East),
            (Terrain::RunwayStartEast, true) => Some(Direction::West),
            (Terrain::RunwayStartSouth, false) => Some(Direction::South),
            (Terrain::RunwayStartSouth, true) => Some(Direction::North),
            _ => None,
        }
    }
}

/// Immutable tile grid for one level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Level {
    title: String,
    columns: u8,
    cells: Vec<Cell>,
    runway_headers: Vec<TileIndex>,
}

impl Level {
    pub fn from_cells(title: &str, columns: u8, cells: Vec<Cell>) -> Result<Self, LevelError> {
        if !(LEVEL_MIN_COLUMNS..=LEVEL_MAX_COLUMNS).contains(&columns) {
            return Err(LevelError::ColumnsOutOfRange {
                columns,
                min: LEVEL_MIN_COLUMNS,
                max: LEVEL_MAX_COLUMNS,
            });
        }
        let expected = columns as usize * columns as usize;
        if cells.len() != expected {
            return Err(LevelError::LengthMismatch {
                expected: LEVEL_HEADER_SIZE + expected * 2,
                actual: LEVEL_HEADER_SIZE + cells.len() * 2,
            });
        }

        // Scan order; a header appears once even if listed twice.
        let mut runway_headers: Vec<TileIndex> = Vec::new();
        for (index, cell) in cells.iter().enumerate() {
            let index = index as TileIndex;
            if cell.is_runway_start() && !runway_headers.contains(&index) {
                runway_headers.push(index);
            }
        }

        Ok(Self {
            title: title.to_string(),
            columns,
            cells,
            runway_headers,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn columns(&self) -> u8 {
        self.columns
    }

    pub fn tile_count(&self) -> usize {
        self.cells.len()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    #[inline]
    pub fn tile_at(&self, index: TileIndex) -> Option<Cell> {
        self.cells.get(index as usize).copied()
    }

    #[inline]
    pub fn tile_index(&self, column: usize, row: usize) -> Option<TileIndex> {
        let columns = self.columns as usize;
        if column >= columns || row >= columns {
            return None;
        }
        Some((row * columns + column) as TileIndex)
    }

    /// `(column, row)` of a tile index.
    #[inline]
    pub fn grid_coordinate(&self, index: TileIndex) -> (usize, usize) {
        let columns = self.columns as usize;
        (index as usize % columns, index as usize / columns)
    }

    pub fn neighbor(&self, index: TileIndex, direction: Direction) -> Option<TileIndex> {
        let (column, row) = self.grid_coordinate(index);
        let (dx, dy) = direction.unit();
        let column = column.checked_add_signed(dx as isize)?;
        let row = row.checked_add_signed(dy as isize)?;
        self.tile_index(column, row)
    }

    pub fn runway_headers(&self) -> &[TileIndex] {
        &self.runway_headers
    }

    /// Tiles from `header` to the opposite runway end, inclusive.
    ///
    /// Walks along the header's direction until another runway-start tile is
    /// found. Returns `None` for a non-header tile or a runway that leaves the
    /// grid before reaching its other end.
    pub fn runway_run(&self, header: TileIndex) -> Option<Vec<TileIndex>> {
        let direction = self.tile_at(header)?.runway_direction()?;
        let mut run = vec![header];
        let mut tile = header;

        for _ in 0..self.columns {
            tile = self.neighbor(tile, direction)?;
            run.push(tile);
            if self.tile_at(tile)?.is_runway_start() {
                return Some(run);
            }
        }

        None
    }

    /// Walk backward from `tile` against `run_direction` to the runway end
    /// that owns it.
    pub fn runway_header_behind(
        &self,
        tile: TileIndex,
        run_direction: Direction,
    ) -> Option<TileIndex> {
        let back = run_direction.opposite();
        let mut current = tile;

        for _ in 0..self.columns {
            let cell = self.tile_at(current)?;
            if cell.runway_direction() == Some(run_direction) {
                return Some(current);
            }
            current = self.neighbor(current, back)?;
        }

        None
    }

    /// Q12.4 centre of a tile.
    pub fn tile_center(&self, index: TileIndex) -> (i32, i32) {
        let (column, row) = self.grid_coordinate(index);
        (tile_center_q12_4(column), tile_center_q12_4(row))
    }

    pub fn tile_at_position(&self, x: i32, y: i32) -> Option<TileIndex> {
        let column = grid_coordinate_q12_4(x)?;
        let row = grid_coordinate_q12_4(y)?;
        self.tile_index(column, row)
    }

    pub fn contains_position(&self, x: i32, y: i32) -> bool {
        let extent = self.columns as i32 * TILE_SIZE_Q12_4;
        (0..extent).contains(&x) && (0..extent).contains(&y)
    }

    pub fn parking_tiles(&self) -> impl Iterator<Item = TileIndex> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is(Terrain::Parking))
            .map(|(index, _)| index as TileIndex)
    }
}

pub fn parse_level(bytes: &[u8]) -> Result<Level, LevelError> {
    if bytes.len() < LEVEL_HEADER_SIZE {
        return Err(LevelError::TooShort {
            actual: bytes.len(),
            min: LEVEL_HEADER_SIZE,
        });
    }

    let magic = [bytes[0], bytes[1], bytes[2]];
    if magic != LEVEL_MAGIC {
        return Err(LevelError::InvalidMagic { found: magic });
    }

    let columns = bytes[3];
    if !(LEVEL_MIN_COLUMNS..=LEVEL_MAX_COLUMNS).contains(&columns) {
        return Err(LevelError::ColumnsOutOfRange {
            columns,
            min: LEVEL_MIN_COLUMNS,
            max: LEVEL_MAX_COLUMNS,
        });
    }

    let cell_count = columns as usize * columns as usize;
    let expected_len = LEVEL_HEADER_SIZE + cell_count * 2;
    if bytes.len() != expected_len {
        return Err(LevelError::LengthMismatch {
            expected: expected_len,
            actual: bytes.len(),
        });
    }

    let title_raw = &bytes[LEVEL_TITLE_OFFSET..LEVEL_TITLE_OFFSET + LEVEL_TITLE_SIZE];
    let title_end = title_raw
        .iter()
        .rposition(|&b| b != 0)
        .map(|i| i + 1)
        .unwrap_or(0);
    let title = String::from_utf8_lossy(&title_raw[..title_end]);

    let cells = bytes[LEVEL_HEADER_SIZE..]
        .chunks_exact(2)
        .map(|pair| Cell::from_raw(u16::from_be_bytes([pair[0], pair[1]])))
        .collect();

    Level::from_cells(&title, columns, cells)
}

pub fn serialize_level(level: &Level) -> Vec<u8> {
    let mut data = vec![0u8; LEVEL_HEADER_SIZE + level.tile_count() * 2];

    data[..3].copy_from_slice(&LEVEL_MAGIC);
    data[3] = level.columns();

    let title = level.title().as_bytes();
    let title_len = title.len().min(LEVEL_TITLE_SIZE);
    data[LEVEL_TITLE_OFFSET..LEVEL_TITLE_OFFSET + title_len].copy_from_slice(&title[..title_len]);

    for (index, cell) in level.cells().iter().enumerate() {
        let offset = LEVEL_HEADER_SIZE + index * 2;
        data[offset..offset + 2].copy_from_slice(&cell.raw().to_be_bytes());
    }

    data
}

/// Tile-by-tile level composition for fixtures and demo content.
#[derive(Clone, Debug)]
pub struct LevelBuilder {
    title: String,
    columns: u8,
    cells: Vec<Cell>,
}

impl LevelBuilder {
    pub fn new(title: &str, columns: u8) -> Self {
        let count = columns as usize * columns as usize;
        Self {
            title: title.to_string(),
            columns,
            cells: vec![Cell::new(Terrain::Grass.id(), 0); count],
        }
    }

    pub fn tile(mut self, column: usize, row: usize, terrain: Terrain) -> Self {
        self.put(column, row, terrain.id());
        self
    }

    pub fn mirrored_tile(mut self, column: usize, row: usize, terrain: Terrain) -> Self {
        self.put(column, row, terrain.id() | TILE_MIRROR_FLAG);
        self
    }

    pub fn building(mut self, column: usize, row: usize, building: u8) -> Self {
        if let Some(cell) = self.cell_mut(column, row) {
            *cell = Cell::new(cell.terrain_byte(), building);
        }
        self
    }

    /// East-west runway on `row` spanning `from..=to`, with exit tiles at the
    /// listed columns.
    pub fn horizontal_runway(
        mut self,
        row: usize,
        from: usize,
        to: usize,
        exits: &[usize],
    ) -> Self {
        self.put(from, row, Terrain::RunwayStartEast.id());
        for column in from + 1..to {
            let terrain = if exits.contains(&column) {
                Terrain::RunwayExit
            } else {
                Terrain::RunwayMid
            };
            self.put(column, row, terrain.id());
        }
        self.put(to, row, Terrain::RunwayStartEast.id() | TILE_MIRROR_FLAG);
        self
    }

    /// North-south runway on `column` spanning `from..=to`.
    pub fn vertical_runway(
        mut self,
        column: usize,
        from: usize,
        to: usize,
        exits: &[usize],
    ) -> Self {
        self.put(column, from, Terrain::RunwayStartSouth.id());
        for row in from + 1..to {
            let terrain = if exits.contains(&row) {
                Terrain::RunwayExit
            } else {
                Terrain::RunwayMid
            };
            self.put(column, row, terrain.id());
        }
        self.put(column, to, Terrain::RunwayStartSouth.id() | TILE_MIRROR_FLAG);
        self
    }

    pub fn build(self) -> Result<Level, LevelError> {
        Level::from_cells(&self.title, self.columns, self.cells)
    }

    fn put(&mut self, column: usize, row: usize, terrain: u8) {
        if let Some(cell) = self.cell_mut(column, row) {
            *cell = Cell::new(terrain, cell.building().unwrap_or(0));
        }
    }

    fn cell_mut(&mut self, column: usize, row: usize) -> Option<&mut Cell> {
        let columns = self.columns as usize;
        if column >= columns || row >= columns {
            return None;
        }
        self.cells.get_mut(row * columns + column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_airport() -> Level {
        LevelBuilder::new("Test field", 8)
            .horizontal_runway(0, 0, 7, &[2, 5])
            .vertical_runway(7, 2, 7, &[4])
            .tile(2, 1, Terrain::HoldingPoint)
            .tile(3, 3, Terrain::Parking)
            .build()
            .expect("fixture level must build")
    }

    #[test]
    fn tile_index_round_trips_for_every_tile() {
        let level = small_airport();
        let columns = level.columns() as usize;
        for t in 0..level.tile_count() as TileIndex {
            let (column, row) = level.grid_coordinate(t);
            assert_eq!(column, t as usize % columns);
            assert_eq!(row, t as usize / columns);
            assert_eq!(level.tile_index(column, row), Some(t));
        }
        assert_eq!(level.tile_index(8, 0), None);
        assert_eq!(level.tile_at(64), None);
    }

    #[test]
    fn runway_headers_follow_scan_order() {
        let level = small_airport();
        assert_eq!(level.runway_headers(), &[0, 7, 23, 63]);
    }

    #[test]
    fn runway_runs_terminate_on_runway_start() {
        let level = small_airport();
        for &header in level.runway_headers() {
            let run = level.runway_run(header).expect("header must have a run");
            let last = *run.last().unwrap();
            assert_ne!(last, header);
            assert!(level.tile_at(last).unwrap().is_runway_start());
        }
        assert_eq!(level.runway_run(0).unwrap(), vec![0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(level.runway_run(7).unwrap(), vec![7, 6, 5, 4, 3, 2, 1, 0]);
        assert_eq!(level.runway_run(63).unwrap(), vec![63, 55, 47, 39, 31, 23]);
    }

    #[test]
    fn runway_run_rejects_non_headers_and_open_runways() {
        let level = small_airport();
        assert_eq!(level.runway_run(3), None);

        let open = LevelBuilder::new("Open", 8)
            .tile(2, 2, Terrain::RunwayStartEast)
            .tile(3, 2, Terrain::RunwayMid)
            .build()
            .unwrap();
        assert_eq!(open.runway_run(18), None);
    }

    #[test]
    fn header_behind_walks_against_runway_direction() {
        let level = small_airport();
        assert_eq!(level.runway_header_behind(2, Direction::East), Some(0));
        assert_eq!(level.runway_header_behind(2, Direction::West), Some(7));
        assert_eq!(level.runway_header_behind(39, Direction::South), Some(23));
    }

    #[test]
    fn pathable_accepts_mirrored_variants() {
        assert!(Cell::new(Terrain::Taxiway.id() | TILE_MIRROR_FLAG, 0).is_pathable());
        assert!(Cell::new(Terrain::Parking.id(), 3).is_pathable());
        assert!(!Cell::new(Terrain::Grass.id(), 0).is_pathable());
        assert!(!Cell::new(Terrain::RunwayStartEast.id(), 0).is_pathable());
    }

    #[test]
    fn serialized_level_parses_back() {
        let level = small_airport();
        let bytes = serialize_level(&level);
        assert_eq!(&bytes[..3], b"ATC");
        let parsed = parse_level(&bytes).expect("serialized level must parse");
        assert_eq!(parsed.title(), "Test field");
        assert_eq!(parsed.cells(), level.cells());
        assert_eq!(parsed.runway_headers(), level.runway_headers());
    }

    #[test]
    fn parse_rejects_malformed_headers() {
        let mut bytes = serialize_level(&small_airport());

        assert_eq!(
            parse_level(&bytes[..10]),
            Err(LevelError::TooShort {
                actual: 10,
                min: LEVEL_HEADER_SIZE
            })
        );

        assert!(matches!(
            parse_level(&bytes[..bytes.len() - 2]),
            Err(LevelError::LengthMismatch { .. })
        ));

        bytes[3] = 7;
        assert!(matches!(
            parse_level(&bytes),
            Err(LevelError::ColumnsOutOfRange { columns: 7, .. })
        ));
        bytes[3] = 33;
        assert!(matches!(
            parse_level(&bytes),
            Err(LevelError::ColumnsOutOfRange { columns: 33, .. })
        ));

        bytes[0] = b'X';
        assert_eq!(
            parse_level(&bytes),
            Err(LevelError::InvalidMagic {
                found: [b'X', b'T', b'C']
            })
        );
    }
}
