use serde::{Deserialize, Serialize};

use crate::week_time::{time_of_week, WEEK};

/**
 * Departures of one stop over a week, as sorted times of week. The table repeats every week.
 */
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Schedule {
    departures: Vec<u64>,
}

impl Schedule {
    pub fn new<I: IntoIterator<Item = u64>>(departures: I) -> Self {
        let mut departures: Vec<u64> = departures.into_iter().map(|time| time % WEEK).collect();
        departures.sort_unstable();
        Self { departures }
    }

    /** One departure every `period` seconds, the first one at `offset`. */
    pub fn fixed_frequency(period: u64, offset: u64) -> Self {
        assert!(period > 0);
        Self::new((offset % period..WEEK).step_by(period as usize))
    }

    pub fn len(&self) -> usize {
        self.departures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.departures.is_empty()
    }

    pub fn departures(&self) -> &[u64] {
        &self.departures
    }

    /**
     * Given the current time (seconds since the week origin), returns the index of the next
     * departure and its absolute time. A departure at exactly `time` counts. If nothing departs
     * later this week, the first departure of the following week is returned, so the returned
     * time is never before `time`.
     */
    pub fn next_departure_index(&self, time: f64) -> Option<(usize, f64)> {
        let first = *self.departures.first()?;
        let offset = time_of_week(time);
        let week_start = time - offset;
        let index = self
            .departures
            .partition_point(|departure| (*departure as f64) < offset);
        match self.departures.get(index) {
            Some(departure) => Some((index, week_start + *departure as f64)),
            None => Some((0, week_start + WEEK as f64 + first as f64)),
        }
    }

    pub fn next_departure(&self, time: f64) -> Option<f64> {
        self.next_departure_index(time).map(|(_, departure)| departure)
    }

    /**
     * The expected value of the time to wait for the next departure, for a uniformly random
     * arrival.
     */
    pub fn expected_waiting_time(&self) -> Option<f64> {
        if self.departures.is_empty() {
            return None;
        }
        let mut squares = 0.0;
        for (index, departure) in self.departures.iter().enumerate() {
            let next = match self.departures.get(index + 1) {
                Some(next) => *next,
                None => self.departures[0] + WEEK,
            };
            let gap = (next - departure) as f64;
            squares += gap * gap;
        }
        Some(squares / (2.0 * WEEK as f64))
    }
}

#[cfg(test)]
mod tests {
    use crate::schedule::*;
    use crate::week_time::DAY;

    #[test]
    fn fixed_frequency_test() {
        let schedule = Schedule::fixed_frequency(60, 0);
        assert_eq!(schedule.len() as u64, WEEK / 60);
        assert_eq!(schedule.next_departure(0.0), Some(0.0));
        assert_eq!(schedule.next_departure(1.0), Some(60.0));
        assert_eq!(schedule.next_departure(30.0), Some(60.0));
        assert_eq!(schedule.next_departure(59.0), Some(60.0));
        assert_eq!(schedule.next_departure(60.0), Some(60.0));
        assert_eq!(schedule.next_departure(100.0), Some(120.0));
        assert_eq!(schedule.next_departure(200.0), Some(240.0));
        assert_eq!(schedule.expected_waiting_time(), Some(30.0));
    }

    #[test]
    fn week_wraparound() {
        // a single departure on Monday at 06:00
        let schedule = Schedule::new(vec![6 * 3600]);
        let sunday_night = (6 * DAY + 23 * 3600) as f64;
        assert_eq!(
            schedule.next_departure_index(sunday_night),
            Some((0, (WEEK + 6 * 3600) as f64))
        );
        assert_eq!(schedule.next_departure(0.0), Some(6.0 * 3600.0));

        // times past the first week keep their absolute offset
        let second_week = (WEEK + 7 * 3600) as f64;
        assert_eq!(
            schedule.next_departure(second_week),
            Some((2 * WEEK + 6 * 3600) as f64)
        );
    }

    #[test]
    fn departures_are_folded_and_sorted() {
        let schedule = Schedule::new(vec![WEEK + 10, 5, 3 * DAY]);
        assert_eq!(schedule.departures(), &[5, 10, 3 * DAY]);
        assert_eq!(Schedule::new(vec![]).next_departure(10.0), None);
    }
}
