use crate::{app, DISTANCE};
use embedded_hal::blocking::delay::DelayUs;
use sonar_stm32l433::{config, Edge};
use stm32l4xx_hal::{gpio::ExtiPin, pac::TIM7, prelude::*};
use systick_monotonic::*;

/// TIM7 as a free-running 16-bit counter, one tick per microsecond.
pub struct CaptureClock {
    tim: TIM7,
}

impl CaptureClock {
    /// Expects the TIM7 clock to already be enabled. `None` if `timer_clock`
    /// cannot be divided down to the capture rate.
    pub fn start(tim: TIM7, timer_clock: u32) -> Option<CaptureClock> {
        let prescaler = config::capture_prescaler(timer_clock)?;
        tim.psc.write(|w| unsafe { w.psc().bits(prescaler) });
        tim.arr.write(|w| unsafe { w.arr().bits(u16::MAX) });
        // load the prescaler now rather than at the first overflow
        tim.egr.write(|w| w.ug().set_bit());
        tim.cr1.modify(|_, w| w.cen().set_bit());
        Some(CaptureClock { tim })
    }

    pub fn now(&self) -> u16 {
        self.tim.cnt.read().cnt().bits()
    }
}

/// Busy-wait for pulses too short for the monotonic.
pub struct CycleDelay {
    system_clock: u32,
}

impl CycleDelay {
    pub fn new(system_clock: u32) -> CycleDelay {
        CycleDelay { system_clock }
    }
}

impl DelayUs<u32> for CycleDelay {
    fn delay_us(&mut self, us: u32) {
        cortex_m::asm::delay(config::delay_cycles(self.system_clock, us));
    }
}

// Pings, then pongs once the echo has had time to come back.
pub fn ping(cx: app::ping::Context) {
    let trigger_cycle = cx.shared.trigger_cycle;
    trigger_cycle.fire(cx.local.delay).unwrap();

    let interval = u64::from(trigger_cycle.timing().cycle_interval_ms);
    app::pong::spawn_after(interval.millis()).unwrap();
}

// Timestamps every edge of the echo line; a falling edge completes a
// measurement and publishes it for pong.
pub fn receive_echo(cx: app::receive_echo::Context) {
    let echo = cx.local.echo;
    if !echo.check_interrupt() {
        return;
    }
    echo.clear_interrupt_pending_bit();

    let counter = cx.local.capture_clock.now();
    let edge = Edge::from_level(echo.is_high().unwrap());

    match cx.local.echo_capture.on_edge(edge, counter) {
        Ok(Some(distance)) => DISTANCE.publish(distance),
        Ok(None) => {}
        Err(_) => DISTANCE.record_fault(),
    }
}
