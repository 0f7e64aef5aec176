mod schedule;
mod timetable;
mod week_time;

pub use schedule::Schedule;
pub use timetable::{Departure, Stop, StopId, StopTime, Timetable, Trip, TripId};
pub use week_time::{time_of_week, week_diff, WeekTime, DAY, HOUR, MINUTE, WEEK};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("Unknown stop: {0}")]
    UnknownStop(u64),
    #[error("Unknown trip: {0}")]
    UnknownTrip(u64),
    #[error("Duplicate stop: {0}")]
    DuplicateStop(u64),
    #[error("Duplicate trip: {0}")]
    DuplicateTrip(u64),
    #[error("Trip {0} has fewer than two stops")]
    ShortTrip(u64),
    #[error("Trip {0} goes back in time")]
    NonMonotoneTrip(u64),
}
