use core::fmt;

use crate::level::TileIndex;
use crate::roster::FlightId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LevelError {
    TooShort { actual: usize, min: usize },
    InvalidMagic { found: [u8; 3] },
    ColumnsOutOfRange { columns: u8, min: u8, max: u8 },
    LengthMismatch { expected: usize, actual: usize },
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort { actual, min } => {
                write!(f, "level too short: got {actual} bytes, need at least {min}")
            }
            Self::InvalidMagic { found } => write!(
                f,
                "invalid level magic: {:02x} {:02x} {:02x}",
                found[0], found[1], found[2]
            ),
            Self::ColumnsOutOfRange { columns, min, max } => {
                write!(f, "column count out of range: {columns} (allowed {min}..={max})")
            }
            Self::LengthMismatch { expected, actual } => write!(
                f,
                "level length mismatch: expected {expected} bytes, got {actual}"
            ),
        }
    }
}

impl std::error::Error for LevelError {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScheduleError {
    MissingClock,
    InvalidClock { line: usize },
    InvalidRecord { line: usize, reason: &'static str },
    UnknownRecordKind { line: usize, kind: String },
    TooManyFlights { max: usize },
    TooManyMessages { max: usize },
    InvalidParking { line: usize, tile: u32 },
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingClock => write!(f, "schedule has no initial clock line"),
            Self::InvalidClock { line } => write!(f, "line {line}: expected HH:MM"),
            Self::InvalidRecord { line, reason } => write!(f, "line {line}: {reason}"),
            Self::UnknownRecordKind { line, kind } => {
                write!(f, "line {line}: unknown record kind '{kind}'")
            }
            Self::TooManyFlights { max } => write!(f, "schedule exceeds {max} flights"),
            Self::TooManyMessages { max } => write!(f, "schedule exceeds {max} messages"),
            Self::InvalidParking { line, tile } => {
                write!(f, "line {line}: tile {tile} is not a parking tile")
            }
        }
    }
}

impl std::error::Error for ScheduleError {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScriptError {
    InvalidTick { line: usize },
    UnknownButton { line: usize, name: String },
    OutOfOrder { line: usize, tick: u32 },
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTick { line } => write!(f, "line {line}: invalid tick number"),
            Self::UnknownButton { line, name } => write!(f, "line {line}: unknown button '{name}'"),
            Self::OutOfOrder { line, tick } => {
                write!(f, "line {line}: tick {tick} is earlier than the previous entry")
            }
        }
    }
}

impl std::error::Error for ScriptError {}

/// Soft failures returned to the player. A rejected command leaves the
/// simulation untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandError {
    UnknownFlight { flight: FlightId },
    WrongState { flight: FlightId },
    RunwayInUse { header: TileIndex },
    InvalidRunway { header: TileIndex },
    NoUsableExit { header: TileIndex },
    InvalidPath,
    NotConfirmable,
    ParkingOccupied { tile: TileIndex },
    PoolFull,
    WaypointOverflow,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownFlight { flight } => write!(f, "unknown flight {flight}"),
            Self::WrongState { flight } => {
                write!(f, "flight {flight} cannot accept this command in its current state")
            }
            Self::RunwayInUse { header } => write!(f, "runway {header} is in use"),
            Self::InvalidRunway { header } => write!(f, "tile {header} is not a usable runway"),
            Self::NoUsableExit { header } => write!(f, "runway {header} has no usable exit"),
            Self::InvalidPath => write!(f, "path is not valid"),
            Self::NotConfirmable => write!(f, "path does not end on a valid target"),
            Self::ParkingOccupied { tile } => write!(f, "parking {tile} is occupied"),
            Self::PoolFull => write!(f, "aircraft pool is full"),
            Self::WaypointOverflow => write!(f, "too many waypoints"),
        }
    }
}

impl std::error::Error for CommandError {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuleCode {
    FlightSlotMapping,
    ActiveFlightWithoutAircraft,
    IdleFlightWithAircraft,
    FinishedFlightNotIdle,
    RemainingCount,
    RunwayClaimOrphaned,
    RunwayClaimDuplicated,
    WaypointCursorRange,
}

impl fmt::Display for RuleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FlightSlotMapping => write!(f, "FLIGHT_SLOT_MAPPING"),
            Self::ActiveFlightWithoutAircraft => write!(f, "ACTIVE_FLIGHT_WITHOUT_AIRCRAFT"),
            Self::IdleFlightWithAircraft => write!(f, "IDLE_FLIGHT_WITH_AIRCRAFT"),
            Self::FinishedFlightNotIdle => write!(f, "FINISHED_FLIGHT_NOT_IDLE"),
            Self::RemainingCount => write!(f, "REMAINING_COUNT"),
            Self::RunwayClaimOrphaned => write!(f, "RUNWAY_CLAIM_ORPHANED"),
            Self::RunwayClaimDuplicated => write!(f, "RUNWAY_CLAIM_DUPLICATED"),
            Self::WaypointCursorRange => write!(f, "WAYPOINT_CURSOR_RANGE"),
        }
    }
}
