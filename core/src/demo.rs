//! Built-in practice airfield
//!
//! ```text
//!     0 1 2 3 4 5 6 7
//!  0  > = X = = X = <     runway 09/27, exits at columns 2 and 5
//!  1  . . H . . | . .     H holding point, | taxiway
//!  2  . . - - - - . .     taxiway
//!  3  . . . P P . . .     parking
//! ```

use crate::error::LevelError;
use crate::level::{Level, LevelBuilder, Terrain};

pub const DEMO_SCHEDULE: &str = "\
# Practice shift
08:00
ARRIVAL;   IB3012; 40; 08:00;  0; 240
DEPARTURE; LH0442; 60; 08:01; 27; 300
MESSAGE;   08:01; Tower open, runway 09 in use
";

pub fn demo_level() -> Result<Level, LevelError> {
    let mut builder = LevelBuilder::new("Practice field", 8)
        .horizontal_runway(0, 0, 7, &[2, 5])
        .tile(2, 1, Terrain::HoldingPoint)
        .tile(5, 1, Terrain::Taxiway)
        .tile(3, 3, Terrain::Parking)
        .tile(4, 3, Terrain::Parking)
        .building(6, 3, 1);
    for column in 2..=5 {
        builder = builder.tile(column, 2, Terrain::Taxiway);
    }
    builder.build()
}
