pub mod aircraft;
pub mod constants;
pub mod controller;
pub mod demo;
pub mod error;
pub mod fixed_arrays;
pub mod fixed_point;
pub mod level;
pub mod path;
pub mod player;
pub mod rng;
pub mod roster;
pub mod schedule;
pub mod session;
pub mod sim;
pub mod timer;

pub use controller::{Controller, IdleController, ScriptedController};
pub use error::{CommandError, LevelError, RuleCode, ScheduleError, ScriptError};
pub use level::{parse_level, serialize_level, Level, LevelBuilder};
pub use schedule::{parse_schedule, Schedule};
pub use session::{run_session, SessionReport};
pub use sim::{
    responsibilities_for, LandingExitRule, Outcome, SimConfig, SimEvent, Simulation,
    WorldSnapshot,
};
