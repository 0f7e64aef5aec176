use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use network::Point;

use crate::schedule::Schedule;
use crate::week_time::WeekTime;
use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StopId(pub u64);

impl StopId {
    pub fn inner(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for StopId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "stop{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TripId(pub u64);

impl TripId {
    pub fn inner(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TripId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "trip{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: StopId,
    pub name: String,
    pub position: Point,
    /** Minimum seconds between reaching the stop on foot and boarding. */
    pub transfer_time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopTime {
    pub stop: StopId,
    pub arrival: WeekTime,
    pub departure: WeekTime,
}

impl StopTime {
    pub fn new(stop: StopId, arrival: WeekTime, departure: WeekTime) -> Self {
        Self {
            stop,
            arrival,
            departure,
        }
    }

    /** A stop time with no dwell. */
    pub fn at(stop: StopId, time: WeekTime) -> Self {
        Self::new(stop, time, time)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: TripId,
    pub route: String,
    pub stop_times: Vec<StopTime>,
}

impl std::fmt::Display for Trip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.route, self.id)
    }
}

/** A trip leaving a stop: the trip and the position of the stop within it. */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Departure {
    pub trip: TripId,
    pub index: usize,
    pub time: WeekTime,
}

/**
 * Stops and trips of a transit network, already reduced to a single repeating week. Trips are
 * checked on insertion, so every stored trip references known stops and has non-decreasing
 * times.
 */
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "TimetableData", into = "TimetableData")]
pub struct Timetable {
    stops: BTreeMap<StopId, Stop>,
    trips: BTreeMap<TripId, Trip>,
}

/** Serialized form of a timetable. Loading goes through the same checks as insertion. */
#[derive(Serialize, Deserialize)]
struct TimetableData {
    stops: Vec<Stop>,
    trips: Vec<Trip>,
}

impl TryFrom<TimetableData> for Timetable {
    type Error = Error;

    fn try_from(data: TimetableData) -> Result<Self, Self::Error> {
        let mut timetable = Timetable::new();
        for stop in data.stops {
            timetable.add_stop(stop)?;
        }
        for trip in data.trips {
            timetable.add_trip(trip)?;
        }
        Ok(timetable)
    }
}

impl From<Timetable> for TimetableData {
    fn from(timetable: Timetable) -> Self {
        Self {
            stops: timetable.stops.into_values().collect(),
            trips: timetable.trips.into_values().collect(),
        }
    }
}

impl Timetable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }

    pub fn stops(&self) -> &BTreeMap<StopId, Stop> {
        &self.stops
    }

    pub fn trips(&self) -> &BTreeMap<TripId, Trip> {
        &self.trips
    }

    pub fn stop(&self, id: StopId) -> Result<&Stop, Error> {
        self.stops.get(&id).ok_or(Error::UnknownStop(id.0))
    }

    pub fn trip(&self, id: TripId) -> Result<&Trip, Error> {
        self.trips.get(&id).ok_or(Error::UnknownTrip(id.0))
    }

    pub fn add_stop(&mut self, stop: Stop) -> Result<(), Error> {
        if self.stops.contains_key(&stop.id) {
            return Err(Error::DuplicateStop(stop.id.0));
        }
        self.stops.insert(stop.id, stop);
        Ok(())
    }

    pub fn add_trip(&mut self, trip: Trip) -> Result<(), Error> {
        if self.trips.contains_key(&trip.id) {
            return Err(Error::DuplicateTrip(trip.id.0));
        }
        if trip.stop_times.len() < 2 {
            return Err(Error::ShortTrip(trip.id.0));
        }

        let mut last = WeekTime(0);
        for stop_time in trip.stop_times.iter() {
            if !self.stops.contains_key(&stop_time.stop) {
                return Err(Error::UnknownStop(stop_time.stop.0));
            }
            if stop_time.arrival < last || stop_time.departure < stop_time.arrival {
                return Err(Error::NonMonotoneTrip(trip.id.0));
            }
            last = stop_time.departure;
        }

        self.trips.insert(trip.id, trip);
        Ok(())
    }

    /**
     * Every trip leaving `stop`, ordered by time of week. The final stop of a trip is not a
     * departure.
     */
    pub fn departures(&self, stop: StopId) -> Result<Vec<Departure>, Error> {
        self.stop(stop)?;
        let mut departures: Vec<Departure> = self
            .trips
            .values()
            .flat_map(|trip| {
                let boardable = trip.stop_times.len().saturating_sub(1);
                trip.stop_times[..boardable]
                    .iter()
                    .enumerate()
                    .filter(move |(_, stop_time)| stop_time.stop == stop)
                    .map(move |(index, stop_time)| Departure {
                        trip: trip.id,
                        index,
                        time: stop_time.departure,
                    })
            })
            .collect();
        departures.sort_by_key(|departure| (departure.time.time_of_week(), departure.trip));
        Ok(departures)
    }

    pub fn schedule(&self, stop: StopId) -> Result<Schedule, Error> {
        Ok(Schedule::new(
            self.departures(stop)?
                .iter()
                .map(|departure| departure.time.seconds()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Weekday;

    use crate::timetable::*;

    fn stop(id: u64, x: f64) -> Stop {
        Stop {
            id: StopId(id),
            name: format!("stop {}", id),
            position: Point::new(x, 0.0),
            transfer_time: 60.0,
        }
    }

    fn timetable() -> Result<Timetable, Error> {
        let mut timetable = Timetable::new();
        timetable.add_stop(stop(1, 0.0))?;
        timetable.add_stop(stop(2, 1000.0))?;
        for (id, hour) in [(10, 9), (11, 8)] {
            timetable.add_trip(Trip {
                id: TripId(id),
                route: "A".to_owned(),
                stop_times: vec![
                    StopTime::at(StopId(1), WeekTime::hms(Weekday::Mon, hour, 0, 0)),
                    StopTime::at(StopId(2), WeekTime::hms(Weekday::Mon, hour, 5, 0)),
                ],
            })?;
        }
        Ok(timetable)
    }

    #[test]
    fn departures_sorted_by_time() -> Result<(), Error> {
        let timetable = timetable()?;
        let departures = timetable.departures(StopId(1))?;
        assert_eq!(
            departures.iter().map(|d| d.trip).collect::<Vec<_>>(),
            vec![TripId(11), TripId(10)]
        );
        // last stop of every trip
        assert!(timetable.departures(StopId(2))?.is_empty());
        assert_eq!(timetable.departures(StopId(3)), Err(Error::UnknownStop(3)));
        assert_eq!(timetable.schedule(StopId(1))?.len(), 2);
        Ok(())
    }

    #[test]
    fn rejects_bad_trips() -> Result<(), Error> {
        let mut timetable = timetable()?;
        let backwards = Trip {
            id: TripId(20),
            route: "B".to_owned(),
            stop_times: vec![
                StopTime::at(StopId(1), WeekTime::hms(Weekday::Mon, 10, 0, 0)),
                StopTime::at(StopId(2), WeekTime::hms(Weekday::Mon, 9, 0, 0)),
            ],
        };
        assert_eq!(timetable.add_trip(backwards), Err(Error::NonMonotoneTrip(20)));

        let unknown = Trip {
            id: TripId(21),
            route: "B".to_owned(),
            stop_times: vec![
                StopTime::at(StopId(1), WeekTime::hms(Weekday::Mon, 10, 0, 0)),
                StopTime::at(StopId(9), WeekTime::hms(Weekday::Mon, 11, 0, 0)),
            ],
        };
        assert_eq!(timetable.add_trip(unknown), Err(Error::UnknownStop(9)));
        assert_eq!(timetable.add_stop(stop(1, 5.0)), Err(Error::DuplicateStop(1)));
        Ok(())
    }

    #[test]
    fn rejects_empty_trips() -> Result<(), Error> {
        let mut timetable = timetable()?;
        let empty = Trip {
            id: TripId(30),
            route: "C".to_owned(),
            stop_times: Vec::new(),
        };
        assert_eq!(timetable.add_trip(empty), Err(Error::ShortTrip(30)));
        Ok(())
    }

    #[test]
    fn loading_checks_trips() -> Result<(), Box<dyn std::error::Error>> {
        let text = serde_json::to_string(&timetable()?)?;
        let loaded: Timetable = serde_json::from_str(&text)?;
        assert_eq!(loaded.trips().len(), 2);
        assert_eq!(loaded.departures(StopId(1))?.len(), 2);

        let empty = r#"{"stops": [], "trips": [{"id": 5, "route": "C", "stop_times": []}]}"#;
        let error = serde_json::from_str::<Timetable>(empty)
            .expect_err("a trip without stops is rejected");
        assert!(error.to_string().contains("Trip 5 has fewer than two stops"));
        Ok(())
    }
}
