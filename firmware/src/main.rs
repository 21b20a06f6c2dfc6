//!
//! MBot firmware.  A periodic timer runs the robot's control loop; the wheel encoders and the
//! link to the Pi are serviced from their own interrupts.
//!

#![no_std]
#![no_main]

use teensy4_panic as _;

use motion::EncoderCounters;

/// Pulses counted by the encoder interrupt and consumed by the control loop
static ENCODER_COUNTERS: EncoderCounters = EncoderCounters::new();

#[rtic::app(device = teensy4_bsp, peripherals = true, dispatchers = [GPIO1_INT0])]
mod app {
    use super::*;

    use bsp::board::{self, Lpi2c1, PERCLK_FREQUENCY};
    use teensy4_bsp as bsp;

    use hal::gpio::Trigger;
    use hal::gpt::Mode;
    use hal::lpuart;
    use hal::pit::Pit;
    use hal::timer::Blocking;
    use teensy4_bsp::hal;

    use rtic_monotonics::systick::*;
    use rtic_sync::{channel::Sender, make_channel};

    use imu::IMU;
    use mbot_firmware::{
        pi_link::{self, PI_RX_CAPACITY},
        GptClock, GyroHeading, ImuTemperature, LeftEncoderA, LeftEncoderB, PiLink, Robot,
        RightEncoderA, RightEncoderB, CONTROL_LOOP_PERIOD_S, CONTROL_LOOP_PERIOD_US,
        GPT_CLOCK_SOURCE, GPT_DIVIDER, GYRO_CALIBRATION_SAMPLES, STARTUP_DELAY_MS,
        WHEEL_BOARD_BAUD,
    };
    use mbot_rustware::{
        drivetrain::PWM_RAMP_STEP, MBot, RobotConfig, UartDrivetrain, ROBOT_ID, SERIAL_BAUD,
    };
    use motion::{QuadratureDecoder, Wheel};

    #[local]
    struct Local {
        robot: Robot,
        poller: imxrt_log::Poller,
        pi_rx: Sender<'static, u8, PI_RX_CAPACITY>,

        // Encoders
        left_a: LeftEncoderA,
        left_b: LeftEncoderB,
        left_decoder: QuadratureDecoder,
        right_a: RightEncoderA,
        right_b: RightEncoderB,
        right_decoder: QuadratureDecoder,
    }

    #[shared]
    struct Shared {
        pit0: Pit<0>,
    }

    #[init]
    fn init(ctx: init::Context) -> (Shared, Local) {
        // Grab the board peripherals
        let board::Resources {
            pins,
            mut gpio4,
            usb,
            lpi2c1,
            mut gpt2,
            pit: (mut pit0, _pit1, pit2, _pit3),
            lpuart4,
            lpuart6,
            lpuart8,
            ..
        } = board::t41(ctx.device);

        let poller = imxrt_log::log::usbd(usb, imxrt_log::Interrupts::Enabled).unwrap();

        // Initialize Timers //

        let systick_token = rtic_monotonics::create_systick_token!();
        Systick::start(ctx.core.SYST, 600_000_000, systick_token);

        // Gpt 2 as the millisecond clock
        gpt2.disable();
        gpt2.set_divider(GPT_DIVIDER);
        gpt2.set_clock_source(GPT_CLOCK_SOURCE);
        gpt2.set_mode(Mode::FreeRunning);
        gpt2.enable();
        let clock = GptClock::new(gpt2);

        let mut pit_delay = Blocking::<_, PERCLK_FREQUENCY>::from_pit(pit2);

        // Pit 0 paces the control loop, started once the robot has settled
        pit0.disable();
        pit0.clear_elapsed();
        pit0.set_load_timer_value(CONTROL_LOOP_PERIOD_US);
        pit0.set_interrupt_enable(true);

        // End Initialize Timers //

        // Initialize Uarts //

        let mut pi_uart = board::lpuart(lpuart6, pins.p1, pins.p0, SERIAL_BAUD);
        pi_uart.disable(|uart| {
            uart.set_parity(None);
            uart.set_interrupts(lpuart::Interrupts::RECEIVE_FULL);
        });
        pi_uart.clear_status(lpuart::Status::W1C);
        pi_link::install(pi_uart);
        let (pi_rx, pi_rx_receiver) = make_channel!(u8, PI_RX_CAPACITY);

        let mut left_uart = board::lpuart(lpuart4, pins.p8, pins.p7, WHEEL_BOARD_BAUD);
        left_uart.disable(|uart| {
            uart.disable_fifo(lpuart::Direction::Tx);
            uart.disable_fifo(lpuart::Direction::Rx);
            uart.set_parity(None);
        });
        left_uart.clear_status(lpuart::Status::W1C);

        let mut right_uart = board::lpuart(lpuart8, pins.p20, pins.p21, WHEEL_BOARD_BAUD);
        right_uart.disable(|uart| {
            uart.disable_fifo(lpuart::Direction::Tx);
            uart.disable_fifo(lpuart::Direction::Rx);
            uart.set_parity(None);
        });
        right_uart.clear_status(lpuart::Status::W1C);

        // End Initialize Uarts //

        // Initialize Encoders //

        let left_a: LeftEncoderA = gpio4.input(pins.p2);
        let left_b: LeftEncoderB = gpio4.input(pins.p3);
        let right_a: RightEncoderA = gpio4.input(pins.p4);
        let right_b: RightEncoderB = gpio4.input(pins.p5);
        let left_decoder = QuadratureDecoder::new(left_a.is_set(), left_b.is_set());
        let right_decoder = QuadratureDecoder::new(right_a.is_set(), right_b.is_set());
        gpio4.set_interrupt(&left_a, Some(Trigger::EitherEdge));
        gpio4.set_interrupt(&right_a, Some(Trigger::EitherEdge));

        // End Initialize Encoders //

        // Initialize IMU //

        let i2c = board::lpi2c(lpi2c1, pins.p19, pins.p18, board::Lpi2cClockSpeed::KHz400);
        let i2c_bus: &'static _ = shared_bus::new_cortexm!(Lpi2c1 = i2c)
            .expect("Failed to initialize shared I2C bus LPI2C1");
        let imu = match IMU::new(i2c_bus.acquire_i2c(), &mut pit_delay) {
            Ok(imu) => imu,
            Err(err) => panic!("IMU failed to start: {:?}", err),
        };
        let mut heading = GyroHeading::new(imu, CONTROL_LOOP_PERIOD_S);
        heading.calibrate(GYRO_CALIBRATION_SAMPLES, &mut pit_delay);
        let temperature = ImuTemperature::new(IMU::attach(i2c_bus.acquire_i2c()));

        // End Initialize IMU //

        #[allow(unused_mut)]
        let mut robot: Robot = MBot::new(
            RobotConfig::default(),
            PiLink::new(pi_rx_receiver),
            UartDrivetrain::new(left_uart, right_uart, PWM_RAMP_STEP),
            heading,
            temperature,
            clock,
            &ENCODER_COUNTERS,
        );

        #[cfg(feature = "square-test")]
        robot.start_square_test();
        #[cfg(feature = "rotation-test")]
        robot.start_rotation_test();
        #[cfg(feature = "move-test")]
        robot.start_move_test();

        log::info!("MBot {} initialized", ROBOT_ID);
        start::spawn().ok();

        (
            Shared { pit0 },
            Local {
                robot,
                poller,
                pi_rx,
                left_a,
                left_b,
                left_decoder,
                right_a,
                right_b,
                right_decoder,
            },
        )
    }

    #[idle]
    fn idle(_: idle::Context) -> ! {
        loop {
            cortex_m::asm::wfi();
        }
    }

    /// Give the wheel boards time to come up, then start the control loop
    #[task(shared = [pit0], priority = 1)]
    async fn start(mut ctx: start::Context) {
        Systick::delay(STARTUP_DELAY_MS.millis()).await;
        ctx.shared.pit0.lock(|pit| pit.enable());
        log::info!("Control loop running");
    }

    /// One pass of the control loop
    #[task(binds = PIT, shared = [pit0], local = [robot], priority = 1)]
    fn control_loop(mut ctx: control_loop::Context) {
        ctx.shared.pit0.lock(|pit| pit.clear_elapsed());
        ctx.local.robot.tick();
    }

    /// Bytes from the Pi
    #[task(binds = LPUART6, local = [pi_rx], priority = 2)]
    fn pi_uart_interrupt(ctx: pi_uart_interrupt::Context) {
        pi_link::on_interrupt(ctx.local.pi_rx);
    }

    /// Edges on either encoder's a channel
    #[task(
        binds = GPIO4_COMBINED_0_15,
        local = [left_a, left_b, left_decoder, right_a, right_b, right_decoder],
        priority = 3
    )]
    fn encoder_interrupt(ctx: encoder_interrupt::Context) {
        let local = ctx.local;

        if local.left_a.is_triggered() {
            local.left_a.clear_triggered();
            let delta = local
                .left_decoder
                .update(local.left_a.is_set(), local.left_b.is_set());
            // The left wheel is mounted mirrored
            ENCODER_COUNTERS.record(Wheel::Left, -delta);
        }

        if local.right_a.is_triggered() {
            local.right_a.clear_triggered();
            let delta = local
                .right_decoder
                .update(local.right_a.is_set(), local.right_b.is_set());
            ENCODER_COUNTERS.record(Wheel::Right, delta);
        }
    }

    /// This task runs when the USB1 interrupt activates.
    /// Simply poll the logger to control the logging process.
    #[task(binds = USB_OTG1, local = [poller])]
    fn usb_interrupt(cx: usb_interrupt::Context) {
        cx.local.poller.poll();
    }
}
