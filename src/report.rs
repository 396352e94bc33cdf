use core::fmt::{self, Write};

use embedded_hal::serial;
use heapless::String;

use crate::distance::Distance;
use crate::error::ReportError;

/// What the trigger cycle hands to the reporter once per cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    /// Measured since the previous cycle.
    Fresh(Distance),
    /// No echo this cycle; last known distance repeated.
    Stale(Distance),
    /// Nothing measured yet.
    Missing,
}

impl Reading {
    pub fn distance(&self) -> Option<Distance> {
        match self {
            Reading::Fresh(d) | Reading::Stale(d) => Some(*d),
            Reading::Missing => None,
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Fresh(d) => write!(f, "{}", d),
            Reading::Stale(d) => write!(f, "{} (stale)", d),
            Reading::Missing => write!(f, "no reading"),
        }
    }
}

pub trait Reporter {
    type Error;

    fn report(&mut self, reading: Reading) -> Result<(), Self::Error>;
}

// "distance: 65535 cm (stale)\r\n"
const LINE_CAPACITY: usize = 28;

fn format_line<const N: usize>(reading: Reading) -> Result<String<N>, fmt::Error> {
    let mut line = String::new();
    write!(line, "distance: {}\r\n", reading)?;
    Ok(line)
}

/// Writes one `distance: ...` line per reading to a serial port.
pub struct SerialReporter<TX> {
    tx: TX,
}

impl<TX: serial::Write<u8>> SerialReporter<TX> {
    pub fn new(tx: TX) -> SerialReporter<TX> {
        SerialReporter { tx }
    }

    pub fn release(self) -> TX {
        self.tx
    }

    fn write_line(&mut self, line: &str) -> Result<(), ReportError<TX::Error>> {
        for byte in line.bytes() {
            nb::block!(self.tx.write(byte)).map_err(ReportError::Serial)?;
        }
        nb::block!(self.tx.flush()).map_err(ReportError::Serial)
    }
}

impl<TX: serial::Write<u8>> Reporter for SerialReporter<TX> {
    type Error = ReportError<TX::Error>;

    fn report(&mut self, reading: Reading) -> Result<(), Self::Error> {
        let line = format_line::<LINE_CAPACITY>(reading).map_err(|_| ReportError::Overflow)?;
        self.write_line(&line)
    }
}

#[cfg(test)]
mod report_tests {
    use super::*;

    #[derive(Default)]
    struct MockSerial {
        written: Vec<u8>,
        flushes: usize,
        busy_polls: usize,
        fail_after: Option<usize>,
    }

    impl serial::Write<u8> for MockSerial {
        type Error = ();

        fn write(&mut self, word: u8) -> nb::Result<(), ()> {
            // report "busy" once per byte to exercise nb::block!
            if self.busy_polls == self.written.len() {
                self.busy_polls += 1;
                return Err(nb::Error::WouldBlock);
            }
            if self.fail_after == Some(self.written.len()) {
                return Err(nb::Error::Other(()));
            }
            self.written.push(word);
            Ok(())
        }

        fn flush(&mut self) -> nb::Result<(), ()> {
            self.flushes += 1;
            Ok(())
        }
    }

    #[test]
    fn can_format_readings() {
        assert_eq!(Reading::Fresh(Distance::from_cm(10)).to_string(), "10 cm");
        assert_eq!(
            Reading::Stale(Distance::from_cm(3)).to_string(),
            "3 cm (stale)"
        );
        assert_eq!(Reading::Missing.to_string(), "no reading");
    }

    #[test]
    fn reading_exposes_distance() {
        assert_eq!(
            Reading::Stale(Distance::from_cm(3)).distance(),
            Some(Distance::from_cm(3))
        );
        assert_eq!(Reading::Missing.distance(), None);
    }

    #[test]
    fn can_write_report_line() {
        let mut reporter = SerialReporter::new(MockSerial::default());
        reporter
            .report(Reading::Fresh(Distance::from_cm(10)))
            .unwrap();
        reporter.report(Reading::Missing).unwrap();

        let serial = reporter.release();
        assert_eq!(
            std::str::from_utf8(&serial.written).unwrap(),
            "distance: 10 cm\r\ndistance: no reading\r\n"
        );
        assert_eq!(serial.flushes, 2);
    }

    #[test]
    fn longest_line_fills_buffer_exactly() {
        let longest = Reading::Stale(Distance::from_cm(u16::MAX));
        let line = format_line::<LINE_CAPACITY>(longest).unwrap();
        assert_eq!(line.len(), LINE_CAPACITY);

        let mut reporter = SerialReporter::new(MockSerial::default());
        assert_eq!(reporter.report(longest), Ok(()));
    }

    #[test]
    fn short_buffer_overflows() {
        let stale = Reading::Stale(Distance::from_cm(u16::MAX));
        let fresh = Reading::Fresh(Distance::from_cm(u16::MAX));
        assert!(format_line::<{ LINE_CAPACITY - 1 }>(stale).is_err());
        assert!(format_line::<{ LINE_CAPACITY - 1 }>(fresh).is_ok());
    }

    #[test]
    fn serial_error_is_propagated() {
        let serial = MockSerial {
            fail_after: Some(4),
            ..MockSerial::default()
        };
        let mut reporter = SerialReporter::new(serial);
        assert_eq!(
            reporter.report(Reading::Missing),
            Err(ReportError::Serial(()))
        );
        assert_eq!(reporter.release().written, b"dist");
    }
}
