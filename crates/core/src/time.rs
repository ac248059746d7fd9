//! Mapping from wall-clock time to a chapter/verse target.

use crate::model::{ClockTarget, ClockTime};

/// Hour 0 reads as chapter 24; every other hour is its own chapter.
pub fn to_target(hour: u8, minute: u8) -> ClockTarget {
    let chapter = if hour == 0 { 24 } else { u32::from(hour) };
    ClockTarget {
        chapter,
        verse: u32::from(minute),
    }
}

impl From<ClockTime> for ClockTarget {
    fn from(time: ClockTime) -> Self {
        to_target(time.hour, time.minute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midnight_is_chapter_24() {
        for m in 0..60 {
            assert_eq!(to_target(0, m).chapter, 24);
            assert_eq!(to_target(0, m).verse, u32::from(m));
        }
    }

    #[test]
    fn other_hours_map_directly() {
        for h in 1..24 {
            assert_eq!(to_target(h, 17).chapter, u32::from(h));
        }
    }

    #[test]
    fn next_minute_wraps_hour_and_day() {
        let t = ClockTime::new(9, 59).unwrap();
        assert_eq!(t.next_minute(), ClockTime::new(10, 0).unwrap());
        let t = ClockTime::new(23, 59).unwrap();
        assert_eq!(t.next_minute(), ClockTime::new(0, 0).unwrap());
        let t = ClockTime::new(12, 30).unwrap();
        assert_eq!(t.next_minute(), ClockTime::new(12, 31).unwrap());
    }

    #[test]
    fn clock_time_rejects_out_of_range() {
        assert!(ClockTime::new(24, 0).is_none());
        assert!(ClockTime::new(0, 60).is_none());
        assert!(ClockTime::new(23, 59).is_some());
    }
}
