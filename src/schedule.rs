//! Wall-clock hour scheduling.
//!
//! Cycles fire when the hour turns into a configured set. The tick is
//! driven by the command loop's poll cadence, so resolution is well
//! under a minute. Hours missed while a fetch blocked are not caught up.

use chrono::{DateTime, Local, Timelike};

/// Emits each wall-clock hour once, at the transition.
pub struct HourTick {
    last_hour: u32,
}

impl HourTick {
    /// Start at the current hour so nothing fires until the clock next
    /// turns, mirroring an interval timer started at launch.
    pub fn starting_now(now: DateTime<Local>) -> Self {
        Self {
            last_hour: now.hour(),
        }
    }

    /// The new hour, exactly once per transition.
    pub fn turned(&mut self, now: DateTime<Local>) -> Option<u32> {
        let hour = now.hour();
        if hour == self.last_hour {
            return None;
        }
        self.last_hour = hour;
        Some(hour)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2023, 6, 10, hour, minute, 0).unwrap()
    }

    #[test]
    fn nothing_fires_within_the_starting_hour() {
        let mut tick = HourTick::starting_now(at(8, 5));
        assert_eq!(tick.turned(at(8, 30)), None);
        assert_eq!(tick.turned(at(8, 59)), None);
    }

    #[test]
    fn each_transition_fires_once() {
        let mut tick = HourTick::starting_now(at(8, 5));
        assert_eq!(tick.turned(at(9, 0)), Some(9));
        assert_eq!(tick.turned(at(9, 30)), None);
        assert_eq!(tick.turned(at(10, 1)), Some(10));
    }

    #[test]
    fn skipped_hours_are_not_caught_up() {
        let mut tick = HourTick::starting_now(at(8, 5));
        // A fetch blocked through hour 9 entirely.
        assert_eq!(tick.turned(at(10, 2)), Some(10));
        assert_eq!(tick.turned(at(10, 30)), None);
    }
}
