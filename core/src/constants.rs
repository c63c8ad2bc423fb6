// ---------------------------------------------------------------------------
// Level file format
// ---------------------------------------------------------------------------

pub const LEVEL_MAGIC: [u8; 3] = *b"ATC";
pub const LEVEL_HEADER_SIZE: usize = 64;
pub const LEVEL_TITLE_OFFSET: usize = 4;
pub const LEVEL_TITLE_SIZE: usize = 24;
pub const LEVEL_MIN_COLUMNS: u8 = 8;
pub const LEVEL_MAX_COLUMNS: u8 = 32;
pub const LEVEL_MAX_CELLS: usize = (LEVEL_MAX_COLUMNS as usize) * (LEVEL_MAX_COLUMNS as usize);

/// Bit 7 of the terrain byte mirrors the tile horizontally.
pub const TILE_MIRROR_FLAG: u8 = 0x80;
pub const TILE_ID_MASK: u8 = 0x7f;

// ---------------------------------------------------------------------------
// Fixed-capacity tables
// ---------------------------------------------------------------------------

pub const MAX_FLIGHTS: usize = 64;
pub const MAX_AIRCRAFT: usize = 32;
pub const MAX_WAYPOINTS: usize = 32;
pub const MAX_RUNWAY_CLAIMS: usize = 8;
pub const MAX_TIMERS: usize = 8;
pub const MAX_MESSAGES: usize = 16;
pub const MAX_PLAYERS: usize = 2;
pub const MAX_UNBOARDING_SEQUENCE: usize = 8;

// ---------------------------------------------------------------------------
// Geometry (Q12.4 fixed point, 64 px tiles)
// ---------------------------------------------------------------------------

pub const TILE_SIZE_Q12_4: i32 = 1_024;
pub const TILE_HALF_Q12_4: i32 = TILE_SIZE_Q12_4 / 2;
/// Side of the square collision footprint around an aircraft's position.
pub const AIRCRAFT_FOOTPRINT_Q12_4: i32 = 384;

// ---------------------------------------------------------------------------
// Speeds (units per tick)
// ---------------------------------------------------------------------------

pub const TAXI_SPEED_Q12_4: i32 = 8;
pub const RUNWAY_SPEED_Q12_4: i32 = 32;
pub const CLIMB_SPEED_Q12_4: i32 = 48;
pub const FINAL_DESCENT_RATE: i32 = 2;
pub const CLIMB_RATE: i32 = 4;

pub const FINAL_APPROACH_TILES: i32 = 2;
pub const FINAL_APPROACH_ALTITUDE: i32 =
    FINAL_DESCENT_RATE * (FINAL_APPROACH_TILES * TILE_SIZE_Q12_4 / RUNWAY_SPEED_Q12_4);

// ---------------------------------------------------------------------------
// Clock and scoring
// ---------------------------------------------------------------------------

pub const TICKS_PER_SECOND_DEFAULT: u32 = 60;
pub const SPAWN_TIMEOUT_SECS_DEFAULT: u32 = 2;
pub const MINUTES_PER_DAY: u16 = 24 * 60;

pub const SCORE_SUCCESS_BONUS: u32 = 200;
pub const SCORE_LOSS_PENALTY: u32 = 150;

pub const PASSENGERS_PER_SEQUENCE_DEFAULT: u16 = 20;
pub const UNBOARDING_SEQUENCE_LEN_DEFAULT: usize = 4;
