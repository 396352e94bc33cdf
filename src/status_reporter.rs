use crate::{app, DISTANCE};
use rtt_target::rprintln;
use sonar_stm32l433::Reporter;

// Reports the latest distance, then pings again.
pub fn pong(cx: app::pong::Context) {
    let reading = cx.shared.trigger_cycle.sample(&DISTANCE);
    if let Err(e) = cx.local.reporter.report(reading) {
        rprintln!("{}", e);
    }

    let faults = DISTANCE.faults();
    if faults != *cx.local.faults_seen {
        rprintln!("echo capture faults: {}", faults);
        *cx.local.faults_seen = faults;
    }

    app::ping::spawn().unwrap();
}
