#![no_std]
#![no_main]

use panic_halt as _;

use sonar_stm32l433::SharedDistance;

mod range_finder;
mod status_reporter;

const SYSTEM_CLOCK: u32 = 80_000_000;

// Written by the echo interrupt, read once per cycle by pong.
pub static DISTANCE: SharedDistance = SharedDistance::new();

#[rtic::app(device = stm32l4xx_hal::stm32, peripherals = true, dispatchers = [EXTI0])]
mod app {
    use crate::range_finder::{ping, receive_echo, CaptureClock, CycleDelay};
    use crate::status_reporter::pong;
    use crate::SYSTEM_CLOCK;
    use rtt_target::{rprintln, rtt_init_print};
    use sonar_stm32l433::{config::CycleTiming, EchoCapture, SerialReporter, TriggerCycle};
    use stm32l4xx_hal::{
        gpio::{Edge, ExtiPin, Input, Output, PullDown, PushPull, PB1, PB6},
        pac::USART2,
        prelude::*,
        serial::{self, Config, Serial},
    };
    use systick_monotonic::*;

    #[monotonic(binds = SysTick, default = true)]
    type MonoTimer = Systick<1000>;

    #[shared]
    struct Shared {
        #[lock_free]
        trigger_cycle: TriggerCycle<PB1<Output<PushPull>>>,
    }

    #[local]
    struct Local {
        echo: PB6<Input<PullDown>>,
        capture_clock: CaptureClock,
        echo_capture: EchoCapture,
        delay: CycleDelay,
        reporter: SerialReporter<serial::Tx<USART2>>,
        faults_seen: u16,
    }

    #[init]
    fn init(cx: init::Context) -> (Shared, Local, init::Monotonics) {
        rtt_init_print!();
        rprintln!("Configuring sonar range finder...");

        let mut dp = cx.device;

        // Prevent instibility on sleep with Probe-run
        dp.DBGMCU.cr.modify(|_, w| {
            w.dbg_sleep().set_bit();
            w.dbg_standby().set_bit();
            w.dbg_stop().set_bit()
        });

        // TIM7 is not covered by the HAL; gate its clock before RCC is constrained.
        dp.RCC.apb1enr1.modify(|_, w| w.tim7en().set_bit());

        let mut rcc = dp.RCC.constrain();
        let mut flash = dp.FLASH.constrain();
        let mut pwr = dp.PWR.constrain(&mut rcc.apb1r1);
        let clocks = rcc
            .cfgr
            .sysclk(SYSTEM_CLOCK.hz())
            .hclk(SYSTEM_CLOCK.hz())
            .pclk1(SYSTEM_CLOCK.hz())
            .freeze(&mut flash.acr, &mut pwr);

        let mono = Systick::new(cx.core.SYST, SYSTEM_CLOCK);

        // GPIO Bank Initialization
        let mut gpioa = dp.GPIOA.split(&mut rcc.ahb2);
        let mut gpiob = dp.GPIOB.split(&mut rcc.ahb2);

        // Serial Communication with Virtual Comm Port USART 2
        let baudrate = 38_400.bps();

        let tx = gpioa.pa2.into_af7(&mut gpioa.moder, &mut gpioa.afrl);
        let rx = gpioa.pa3.into_af7(&mut gpioa.moder, &mut gpioa.afrl);

        let (tx, _rx) = Serial::usart2(
            dp.USART2,
            (tx, rx),
            Config::default().baudrate(baudrate),
            clocks,
            &mut rcc.apb1r1,
        )
        .split();

        // we need an edge-triggered interrupt that timestamps both edges of the echo.
        let mut echo = gpiob
            .pb6
            .into_pull_down_input(&mut gpiob.moder, &mut gpiob.pupdr);
        echo.make_interrupt_source(&mut dp.SYSCFG, &mut rcc.apb2);
        echo.trigger_on_edge(&mut dp.EXTI, Edge::RISING_FALLING);
        echo.enable_interrupt(&mut dp.EXTI);

        // Free-running 1MHz counter the edges are stamped with.
        let capture_clock = CaptureClock::start(dp.TIM7, SYSTEM_CLOCK).unwrap();

        // and we need a pin to trigger the ping
        let ping_pong_pin = gpiob
            .pb1
            .into_push_pull_output(&mut gpiob.moder, &mut gpiob.otyper);
        let trigger_cycle = TriggerCycle::new(ping_pong_pin, CycleTiming::default()).unwrap();

        rprintln!("{:?}", trigger_cycle.timing());

        // Kick off the sonar ping/pong tasks to trigger range finder
        ping::spawn().unwrap();

        (
            Shared { trigger_cycle },
            Local {
                echo,
                capture_clock,
                echo_capture: EchoCapture::new(),
                delay: CycleDelay::new(SYSTEM_CLOCK),
                reporter: SerialReporter::new(tx),
                faults_seen: 0,
            },
            init::Monotonics(mono),
        )
    }

    extern "Rust" {
        #[task(shared = [trigger_cycle], local = [delay])]
        fn ping(cx: ping::Context);

        #[task(shared = [trigger_cycle], local = [reporter, faults_seen])]
        fn pong(cx: pong::Context);

        // Preempts ping/pong so edges are stamped as they happen.
        #[task(binds = EXTI9_5, priority = 2, local = [echo, capture_clock, echo_capture])]
        fn receive_echo(cx: receive_echo::Context);
    }
}
