use embedded_hal::blocking::delay::{DelayMs, DelayUs};
use embedded_hal::digital::v2::OutputPin;

use crate::config::CycleTiming;
use crate::distance::SharedDistance;
use crate::error::CycleError;
use crate::report::{Reading, Reporter};

/// Pings the sensor and collects the distance measured in between.
pub struct TriggerCycle<P> {
    trigger: P,
    timing: CycleTiming,
    last_sequence: Option<u16>,
}

impl<P: OutputPin> TriggerCycle<P> {
    /// Takes the trigger pin and drives it low, so every phase of the cycle
    /// can assume it starts low.
    pub fn new(mut trigger: P, timing: CycleTiming) -> Result<TriggerCycle<P>, P::Error> {
        trigger.set_low()?;
        Ok(TriggerCycle {
            trigger,
            timing,
            last_sequence: None,
        })
    }

    pub fn timing(&self) -> CycleTiming {
        self.timing
    }

    /// Emits one trigger pulse.
    pub fn fire<D: DelayUs<u32>>(&mut self, delay: &mut D) -> Result<(), P::Error> {
        self.trigger.set_high()?;
        delay.delay_us(self.timing.pulse_width_us);
        self.trigger.set_low()
    }

    /// Reads the shared distance and tags it against the previous sample.
    pub fn sample(&mut self, distance: &SharedDistance) -> Reading {
        let snapshot = distance.snapshot();
        let fresh = self.last_sequence != Some(snapshot.sequence);
        self.last_sequence = Some(snapshot.sequence);

        match snapshot.distance {
            None => Reading::Missing,
            Some(d) if fresh => Reading::Fresh(d),
            Some(d) => Reading::Stale(d),
        }
    }

    /// One full measurement cycle: ping, wait out the echo, report.
    ///
    /// Never waits on the echo itself. If nothing came back within the
    /// cycle interval the previous distance is reported as stale.
    ///
    /// The RTIC firmware runs this same sequence split at the interval wait:
    /// `ping` calls `fire` and schedules `pong` on the monotonic, `pong`
    /// calls `sample` and reports. There a report error is logged and the
    /// cycle continues rather than being returned.
    pub fn run_cycle<D, R>(
        &mut self,
        delay: &mut D,
        distance: &SharedDistance,
        reporter: &mut R,
    ) -> Result<Reading, CycleError<P::Error, R::Error>>
    where
        D: DelayUs<u32> + DelayMs<u32>,
        R: Reporter,
    {
        self.fire(delay).map_err(CycleError::Trigger)?;
        delay.delay_ms(self.timing.cycle_interval_ms);

        let reading = self.sample(distance);
        reporter.report(reading).map_err(CycleError::Report)?;
        Ok(reading)
    }

    pub fn release(self) -> P {
        self.trigger
    }
}
