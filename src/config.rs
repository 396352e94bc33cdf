// Round-trip microseconds per centimeter at the speed of sound, STP.
pub const CALIBRATION_DIVISOR: u16 = 58;

// Capture counter runs at 1 MHz, so one tick is one microsecond.
pub const COUNTER_HZ: u32 = 1_000_000;

/// Prescaler that divides `timer_clock` down to `COUNTER_HZ`, if the
/// timer clock is fast enough and the divider fits the 16-bit register.
pub fn capture_prescaler(timer_clock: u32) -> Option<u16> {
    (timer_clock / COUNTER_HZ)
        .checked_sub(1)
        .and_then(|psc| u16::try_from(psc).ok())
}

/// Core cycles to spin for `us` microseconds. Saturates instead of wrapping.
pub fn delay_cycles(system_clock: u32, us: u32) -> u32 {
    us.saturating_mul(system_clock / 1_000_000)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleTiming {
    /// How long the trigger line is held high.
    pub pulse_width_us: u32,
    /// Wait between the end of the trigger pulse and reading the distance.
    /// Must cover the worst case round trip plus settling.
    pub cycle_interval_ms: u32,
}

impl CycleTiming {
    pub const fn new(pulse_width_us: u32, cycle_interval_ms: u32) -> CycleTiming {
        CycleTiming {
            pulse_width_us,
            cycle_interval_ms,
        }
    }
}

impl Default for CycleTiming {
    // HCSR04-23070007.pdf suggests 10uS pulse to trigger system
    fn default() -> Self {
        CycleTiming::new(10, 500)
    }
}
