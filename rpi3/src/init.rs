use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

use embedded_hal::blocking::i2c::Write;
use embedded_hal::digital::v2;
use parking_lot::Mutex;
use rppal::gpio::{Gpio, InputPin, OutputPin};
use rppal::hal::Delay;
use rppal::i2c::I2c;
use tracing::{info, warn};

use trach::conf::Conf;
use trach::device::button::Button;
use trach::device::buzzer::Buzzer;
use trach::device::distance::DistanceSensor;
use trach::device::ht16k33::Ht16k33;
use trach::device::led::Led;
use trach::device::servo::Servo;
use trach::device::vl6180x::Vl6180x;

use crate::error::BenchError;
use crate::hardware::{self, PwmChannel};

pub type Tof = DistanceSensor<I2c, Delay>;
pub type BenchMutex = Arc<Mutex<Bench>>;

/// Every peripheral on the board, owned.
pub struct Bench {
    pub conf: Conf,
    /// `None` when the range sensor did not answer at startup.
    pub tof: Option<Tof>,
    pub display: Ht16k33<I2c>,
    pub leds: BTreeMap<String, Led<OutputPin>>,
    pub start: Button<InputPin>,
    pub ems: Button<InputPin>,
    pub hall: Button<InputPin>,
    pub heartbeat: Buzzer<PwmChannel>,
    pub alarm: Buzzer<PwmChannel>,
    pub servo: Servo<PwmChannel>,
    pub delay: Delay,
}

pub fn hardware_init(conf: &Conf) -> Result<Bench, BenchError> {
    let gpio = Gpio::new()?;

    let tof = match tof_init(conf) {
        Ok(tof) => Some(tof),
        Err(e) => {
            warn!("Range sensor unavailable: {}", e);
            None
        }
    };

    let mut display = Ht16k33::new(I2c::with_bus(conf.i2c_bus)?, conf.display.address)?;
    display.set_brightness(conf.display.brightness)?;
    info!("Display initialized at {:#04x}", conf.display.address);

    let mut leds = BTreeMap::new();
    for (name, pin) in &conf.leds {
        leds.insert(name.clone(), Led::new(hardware::output(&gpio, *pin)?)?);
    }
    info!("LED pins initialized: {:?}", conf.leds.keys().collect::<Vec<_>>());

    let start = Button::new(hardware::input(&gpio, conf.buttons.start)?);
    let ems = Button::new(hardware::input(&gpio, conf.buttons.ems)?);
    let hall = Button::new(hardware::input(&gpio, conf.buttons.hall)?);
    info!("Button pins initialized");

    let heartbeat = Buzzer::new(PwmChannel::open(conf.heartbeat_buzzer, &gpio)?)?;
    let alarm = Buzzer::new(PwmChannel::open(conf.alarm_buzzer, &gpio)?)?;
    let servo = Servo::new(PwmChannel::open(conf.servo, &gpio)?, 0)?;
    info!("PWM outputs initialized");

    Ok(Bench {
        conf: conf.clone(),
        tof,
        display,
        leds,
        start,
        ems,
        hall,
        heartbeat,
        alarm,
        servo,
        delay: Delay::new(),
    })
}

fn tof_init(conf: &Conf) -> Result<Tof, BenchError> {
    let sensor = Vl6180x::new(I2c::with_bus(conf.i2c_bus)?, Delay::new())
        .with_address(conf.tof.address)
        .with_poll_policy(conf.tof.poll);
    let tof = DistanceSensor::new(sensor)?;
    let report = tof.report();
    info!(
        "Range sensor at {:#04x}: model id {:#04x}, tuned: {}",
        conf.tof.address, report.model_id, report.tuned
    );
    Ok(tof)
}

/// Colon and every segment dark, the given LEDs off. Keeps going past
/// failures and returns the last one.
pub fn lights_out<'a, I2C, P>(
    display: &mut Ht16k33<I2C>,
    leds: impl IntoIterator<Item = &'a mut Led<P>>,
) -> Result<(), BenchError>
where
    I2C: Write,
    I2C::Error: Debug,
    P: v2::OutputPin + 'a,
    P::Error: Debug,
{
    let mut result = display.blank().map_err(BenchError::from);
    for led in leds {
        if let Err(e) = led.off() {
            result = Err(e.into());
        }
    }
    result
}

impl Bench {
    /// Leaves the board dark and quiet. Keeps going past failures and
    /// returns the last one.
    pub fn shutdown(&mut self) -> Result<(), BenchError> {
        let mut result = Ok(());
        let mut keep = |r: Result<(), BenchError>| {
            if let Err(e) = r {
                warn!("Cleanup: {}", e);
                result = Err(e);
            }
        };
        keep(lights_out(&mut self.display, self.leds.values_mut()));
        keep(self.heartbeat.off().map_err(BenchError::from));
        keep(self.alarm.off().map_err(BenchError::from));
        keep(self.servo.stop().map_err(BenchError::from));
        result
    }
}
