use core::fmt;

/// An edge event the capture state machine refused to turn into a distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CaptureError {
    /// Falling edge with no pending rise.
    MissedRise,
    /// Second rising edge before the fall of the first.
    MissedFall,
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::MissedRise => write!(f, "falling edge without a rising edge"),
            CaptureError::MissedFall => write!(f, "rising edge without a falling edge"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReportError<S> {
    Serial(S),
    /// Formatted line did not fit the line buffer.
    Overflow,
}

impl<S: fmt::Debug> fmt::Display for ReportError<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::Serial(e) => write!(f, "serial write failed: {:?}", e),
            ReportError::Overflow => write!(f, "report line overflow"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleError<P, R> {
    Trigger(P),
    Report(R),
}

impl<P: fmt::Debug, R: fmt::Debug> fmt::Display for CycleError<P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleError::Trigger(e) => write!(f, "trigger pin: {:?}", e),
            CycleError::Report(e) => write!(f, "report: {:?}", e),
        }
    }
}
