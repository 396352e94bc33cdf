use core::fmt;
use core::sync::atomic::{AtomicU16, AtomicU32, Ordering};

use crate::config::CALIBRATION_DIVISOR;

/// Distance to the reflecting surface, in whole centimeters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Distance(u16);

impl Distance {
    pub const fn from_cm(cm: u16) -> Distance {
        Distance(cm)
    }

    /// Converts an echo length in counter ticks (microseconds) to distance.
    pub const fn from_ticks(ticks: u16) -> Distance {
        Distance(ticks / CALIBRATION_DIVISOR)
    }

    /// Distance from the counter values latched at the rising and falling
    /// edges of the echo. Correct across one counter wrap.
    pub const fn from_echo(rise: u16, fall: u16) -> Distance {
        Distance::from_ticks(fall.wrapping_sub(rise))
    }

    pub const fn cm(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} cm", self.0)
    }
}

const CM_MASK: u32 = 0xffff;
const VALID: u32 = 1 << 16;
const SEQUENCE_SHIFT: u32 = 17;
const SEQUENCE_MASK: u32 = 0x7fff;

/// One consistent view of the shared distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub distance: Option<Distance>,
    /// Bumped on every publish, wraps at 15 bits.
    pub sequence: u16,
}

/// Latest distance, handed from the echo interrupt to the trigger cycle.
///
/// Value, validity and sequence number are packed into a single word so
/// each side touches it with exactly one atomic load or store. A reader
/// preempted by the writer sees either the old word or the new one, never
/// half of each. Only load and store are used, so this also works on cores
/// without compare-and-swap.
///
/// There must be a single writer. `publish` and `record_fault` are not
/// safe to call from two contexts that can preempt each other.
pub struct SharedDistance {
    word: AtomicU32,
    faults: AtomicU16,
}

impl SharedDistance {
    pub const fn new() -> SharedDistance {
        SharedDistance {
            word: AtomicU32::new(0),
            faults: AtomicU16::new(0),
        }
    }

    pub fn publish(&self, distance: Distance) {
        let previous = self.word.load(Ordering::Relaxed);
        let sequence = ((previous >> SEQUENCE_SHIFT) + 1) & SEQUENCE_MASK;
        let word = (sequence << SEQUENCE_SHIFT) | VALID | u32::from(distance.cm());
        self.word.store(word, Ordering::Release);
    }

    pub fn snapshot(&self) -> Snapshot {
        let word = self.word.load(Ordering::Acquire);
        Snapshot {
            distance: if word & VALID != 0 {
                Some(Distance((word & CM_MASK) as u16))
            } else {
                None
            },
            sequence: ((word >> SEQUENCE_SHIFT) & SEQUENCE_MASK) as u16,
        }
    }

    /// Counts an edge event that was rejected by the capture state machine.
    pub fn record_fault(&self) {
        let faults = self.faults.load(Ordering::Relaxed);
        self.faults.store(faults.wrapping_add(1), Ordering::Relaxed);
    }

    pub fn faults(&self) -> u16 {
        self.faults.load(Ordering::Relaxed)
    }
}

impl Default for SharedDistance {
    fn default() -> Self {
        SharedDistance::new()
    }
}

#[cfg(test)]
mod distance_tests {
    use super::*;

    #[test]
    fn can_convert_580_ticks_to_10_cm() {
        assert_eq!(Distance::from_ticks(580).cm(), 10);
        assert_eq!(Distance::from_echo(1_000, 1_580), Distance::from_cm(10));
    }

    #[test]
    fn can_convert_across_counter_wrap() {
        let wrapped = Distance::from_echo(65_500, 44);
        assert_eq!(wrapped, Distance::from_ticks(80));
        assert_eq!(wrapped.cm(), 1);
    }

    #[test]
    fn distance_never_decreases_with_longer_echo() {
        let mut last = Distance::from_ticks(0);
        for ticks in 0..=u16::MAX {
            let next = Distance::from_ticks(ticks);
            assert!(next >= last, "{} ticks gave {:?} after {:?}", ticks, next, last);
            last = next;
        }
    }

    #[test]
    fn wrapped_and_unwrapped_intervals_agree() {
        for rise in [0_u16, 1_000, 40_000, 65_000, 65_535] {
            for ticks in [0_u16, 57, 58, 580, 23_200] {
                assert_eq!(
                    Distance::from_echo(rise, rise.wrapping_add(ticks)),
                    Distance::from_ticks(ticks)
                );
            }
        }
    }

    #[test]
    fn can_display_distance() {
        assert_eq!(Distance::from_cm(42).to_string(), "42 cm");
    }

    #[test]
    fn new_cell_has_no_reading() {
        let shared = SharedDistance::new();
        assert_eq!(
            shared.snapshot(),
            Snapshot {
                distance: None,
                sequence: 0
            }
        );
        assert_eq!(shared.faults(), 0);
    }

    #[test]
    fn can_publish_and_read_back() {
        let shared = SharedDistance::new();
        shared.publish(Distance::from_cm(10));
        let first = shared.snapshot();
        assert_eq!(first.distance, Some(Distance::from_cm(10)));

        shared.publish(Distance::from_cm(u16::MAX));
        let second = shared.snapshot();
        assert_eq!(second.distance, Some(Distance::from_cm(u16::MAX)));
        assert_eq!(second.sequence, first.sequence + 1);
    }

    #[test]
    fn sequence_wraps_without_touching_distance() {
        let shared = SharedDistance::new();
        for _ in 0..=SEQUENCE_MASK {
            shared.publish(Distance::from_cm(7));
        }
        let snapshot = shared.snapshot();
        assert_eq!(snapshot.sequence, 0);
        assert_eq!(snapshot.distance, Some(Distance::from_cm(7)));
    }

    #[test]
    fn can_count_faults() {
        let shared = SharedDistance::new();
        shared.record_fault();
        shared.record_fault();
        assert_eq!(shared.faults(), 2);
        assert_eq!(shared.snapshot().distance, None);
    }
}
