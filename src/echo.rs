use crate::distance::Distance;
use crate::error::CaptureError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Edge {
    Rising,
    Falling,
}

impl Edge {
    /// Polarity of the edge that just happened, from the line level after it.
    pub fn from_level(is_high: bool) -> Edge {
        if is_high {
            Edge::Rising
        } else {
            Edge::Falling
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeState {
    AwaitingRise,
    AwaitingFall { rise: u16 },
}

/// Pulse-width capture for the echo line.
///
/// Fed every edge of the echo with the free-running counter value latched
/// at that edge. Runs in interrupt context: constant time, no allocation,
/// never blocks.
#[derive(Debug)]
pub struct EchoCapture {
    state: EdgeState,
}

impl EchoCapture {
    pub const fn new() -> EchoCapture {
        EchoCapture {
            state: EdgeState::AwaitingRise,
        }
    }

    pub fn state(&self) -> EdgeState {
        self.state
    }

    /// Advances the state machine by one edge.
    ///
    /// Returns `Ok(Some(_))` when a falling edge completes a pulse. A rising
    /// edge that is still waiting for its fall is replaced by a newer one and
    /// reported as `MissedFall`; a fall with no rise is reported as
    /// `MissedRise`. Neither produces a distance.
    pub fn on_edge(&mut self, edge: Edge, counter: u16) -> Result<Option<Distance>, CaptureError> {
        match (self.state, edge) {
            (EdgeState::AwaitingRise, Edge::Rising) => {
                self.state = EdgeState::AwaitingFall { rise: counter };
                Ok(None)
            }
            (EdgeState::AwaitingFall { .. }, Edge::Rising) => {
                self.state = EdgeState::AwaitingFall { rise: counter };
                Err(CaptureError::MissedFall)
            }
            (EdgeState::AwaitingRise, Edge::Falling) => Err(CaptureError::MissedRise),
            (EdgeState::AwaitingFall { rise }, Edge::Falling) => {
                self.state = EdgeState::AwaitingRise;
                Ok(Some(Distance::from_echo(rise, counter)))
            }
        }
    }
}

impl Default for EchoCapture {
    fn default() -> Self {
        EchoCapture::new()
    }
}
