//! Flight schedule text format
//!
//! ```text
//! # comment
//! 08:00
//! DEPARTURE; IB3012; 120; 08:05; 27; 180
//! ARRIVAL;   LH0442;  90; 08:10;  0; 240
//! MESSAGE;   08:02; Runway 09 is now open
//! ```

use crate::constants::{MAX_FLIGHTS, MAX_MESSAGES};
use crate::error::ScheduleError;
use crate::level::{Level, Terrain, TileIndex};
use crate::roster::{ClockTime, Flight, FlightDirection, FlightState, Roster};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduledMessage {
    pub minutes_until: u16,
    pub text: String,
}

#[derive(Clone, Debug)]
pub struct Schedule {
    pub clock: ClockTime,
    pub roster: Roster,
    pub messages: Vec<ScheduledMessage>,
}

pub fn parse_schedule(text: &str, level: &Level) -> Result<Schedule, ScheduleError> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'));

    let (clock_line, clock_text) = lines.next().ok_or(ScheduleError::MissingClock)?;
    let clock =
        ClockTime::parse(clock_text).ok_or(ScheduleError::InvalidClock { line: clock_line })?;

    let mut flights = Vec::new();
    let mut messages = Vec::new();

    for (line, record) in lines {
        let fields: Vec<&str> = record.split(';').map(str::trim).collect();
        match fields[0] {
            "DEPARTURE" | "ARRIVAL" => {
                if flights.len() == MAX_FLIGHTS {
                    return Err(ScheduleError::TooManyFlights { max: MAX_FLIGHTS });
                }
                flights.push(parse_flight(line, &fields, clock, level)?);
            }
            "MESSAGE" => {
                if messages.len() == MAX_MESSAGES {
                    return Err(ScheduleError::TooManyMessages { max: MAX_MESSAGES });
                }
                messages.push(parse_message(line, record, clock)?);
            }
            kind => {
                return Err(ScheduleError::UnknownRecordKind {
                    line,
                    kind: kind.to_string(),
                })
            }
        }
    }

    Ok(Schedule {
        clock,
        roster: Roster::from_flights(flights),
        messages,
    })
}

fn parse_flight(
    line: usize,
    fields: &[&str],
    clock: ClockTime,
    level: &Level,
) -> Result<Flight, ScheduleError> {
    if fields.len() != 6 {
        return Err(ScheduleError::InvalidRecord {
            line,
            reason: "flight records need 6 fields",
        });
    }

    let direction = if fields[0] == "DEPARTURE" {
        FlightDirection::Departure
    } else {
        FlightDirection::Arrival
    };

    let number = fields[1];
    if number.is_empty() {
        return Err(ScheduleError::InvalidRecord {
            line,
            reason: "missing flight number",
        });
    }

    let passengers: u16 = fields[2].parse().map_err(|_| ScheduleError::InvalidRecord {
        line,
        reason: "invalid passenger count",
    })?;
    let scheduled = ClockTime::parse(fields[3]).ok_or(ScheduleError::InvalidClock { line })?;
    let parking_tile: u32 = fields[4].parse().map_err(|_| ScheduleError::InvalidRecord {
        line,
        reason: "invalid parking tile",
    })?;
    let remaining_secs: u16 = fields[5].parse().map_err(|_| ScheduleError::InvalidRecord {
        line,
        reason: "invalid remaining time",
    })?;

    let parking = match direction {
        FlightDirection::Departure => {
            let tile = TileIndex::try_from(parking_tile)
                .ok()
                .filter(|&tile| level.tile_at(tile).is_some_and(|cell| cell.is(Terrain::Parking)))
                .ok_or(ScheduleError::InvalidParking {
                    line,
                    tile: parking_tile,
                })?;
            Some(tile)
        }
        FlightDirection::Arrival => None,
    };

    Ok(Flight {
        direction,
        number: number.to_string(),
        passengers,
        scheduled,
        minutes_until_scheduled: clock.minutes_until(scheduled),
        parking,
        remaining_secs,
        state: FlightState::Idle,
        finished: false,
    })
}

fn parse_message(
    line: usize,
    record: &str,
    clock: ClockTime,
) -> Result<ScheduledMessage, ScheduleError> {
    // The text may itself contain ';'.
    let mut parts = record.splitn(3, ';');
    let (_, Some(time), Some(text)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(ScheduleError::InvalidRecord {
            line,
            reason: "message records need 3 fields",
        });
    };
    let at = ClockTime::parse(time).ok_or(ScheduleError::InvalidClock { line })?;

    Ok(ScheduledMessage {
        minutes_until: clock.minutes_until(at),
        text: text.trim().to_string(),
    })
}
