#![deny(unsafe_code)]

//! PCA9685 backend built on the `pwm-pca9685` register driver.

use crate::pwm::{PwmController, PwmProvider};

use embedded_hal::blocking::i2c::{Write, WriteRead};
use log::info;
use pwm_pca9685::{Address, Channel, Error, Pca9685};

/// Internal oscillator frequency in Hz.
pub const OSCILLATOR_FREQUENCY: f64 = 25_000_000.0;

/// Counter steps per PWM period.
const STEPS: f64 = 4096.0;

// The chip rejects prescale values below 3.
pub const MIN_PRESCALE: u8 = 3;
pub const MAX_PRESCALE: u8 = 255;

// Prescale after power-on reset (200 Hz).
const RESET_PRESCALE: u8 = 0x1e;

/// Prescale register value closest to a frequency, clamped to what the chip accepts.
pub fn prescale_for(frequency: f64) -> u8 {
    let prescale = (OSCILLATOR_FREQUENCY / (STEPS * frequency)).round() - 1.0;
    if prescale.is_nan() {
        return MAX_PRESCALE;
    }
    prescale.clamp(f64::from(MIN_PRESCALE), f64::from(MAX_PRESCALE)) as u8
}

pub fn frequency_for(prescale: u8) -> f64 {
    OSCILLATOR_FREQUENCY / (STEPS * (f64::from(prescale) + 1.0))
}

/// How a duty cycle maps onto the ON/OFF counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Output {
    FullOff,
    FullOn,
    /// Turns on at count 0 and off at the given count.
    OffAt(u16),
}

impl Output {
    pub fn for_duty_cycle(duty_cycle: f64) -> Self {
        if !(duty_cycle > 0.0) {
            Output::FullOff
        } else if duty_cycle >= 1.0 {
            Output::FullOn
        } else {
            let count = (duty_cycle * STEPS).round().clamp(1.0, STEPS - 1.0);
            Output::OffAt(count as u16)
        }
    }
}

fn channel(pin: u8) -> Option<Channel> {
    Some(match pin {
        0 => Channel::C0,
        1 => Channel::C1,
        2 => Channel::C2,
        3 => Channel::C3,
        4 => Channel::C4,
        5 => Channel::C5,
        6 => Channel::C6,
        7 => Channel::C7,
        8 => Channel::C8,
        9 => Channel::C9,
        10 => Channel::C10,
        11 => Channel::C11,
        12 => Channel::C12,
        13 => Channel::C13,
        14 => Channel::C14,
        15 => Channel::C15,
        _ => return None,
    })
}

pub struct Pca9685Controller<I2C> {
    driver: Pca9685<I2C>,
    prescale: u8,
}

impl<I2C, E> Pca9685Controller<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
{
    pub fn new(i2c: I2C, address: u8) -> Result<Self, Error<E>> {
        let mut driver = Pca9685::new(i2c, Address::from(address))?;
        driver.enable()?;

        Ok(Pca9685Controller {
            driver,
            prescale: RESET_PRESCALE,
        })
    }

    pub fn prescale(&self) -> u8 {
        self.prescale
    }

    /// Give back the I2C bus.
    pub fn destroy(self) -> I2C {
        self.driver.destroy()
    }
}

impl<I2C, E> PwmController for Pca9685Controller<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
{
    type Error = Error<E>;

    fn min_frequency(&self) -> f64 {
        frequency_for(MAX_PRESCALE)
    }

    fn max_frequency(&self) -> f64 {
        frequency_for(MIN_PRESCALE)
    }

    fn frequency(&self) -> f64 {
        frequency_for(self.prescale)
    }

    fn set_frequency(&mut self, frequency: f64) -> Result<f64, Error<E>> {
        let prescale = prescale_for(frequency);
        self.driver.set_prescale(prescale)?;
        self.prescale = prescale;

        let actual = frequency_for(prescale);
        info!("PCA9685 prescale {} ({} Hz)", prescale, actual);
        Ok(actual)
    }

    fn set_duty_cycle(&mut self, pin: u8, duty_cycle: f64) -> Result<(), Error<E>> {
        let channel = channel(pin).ok_or(Error::InvalidInputData)?;

        match Output::for_duty_cycle(duty_cycle) {
            Output::FullOff => self.driver.set_channel_full_off(channel),
            // Full off wins over full on, so its bit is cleared after setting full on.
            Output::FullOn => {
                self.driver.set_channel_full_on(channel, 0)?;
                self.driver.set_channel_off(channel, 0)
            }
            Output::OffAt(count) => self.driver.set_channel_on_off(channel, 0, count),
        }
    }
}

/// Yields the PCA9685 on an I2C bus. The bus is handed over on first open.
pub struct Pca9685Provider<I2C> {
    i2c: Option<I2C>,
}

impl<I2C> Pca9685Provider<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Pca9685Provider { i2c: Some(i2c) }
    }
}

impl<I2C, E> PwmProvider for Pca9685Provider<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
{
    type Controller = Pca9685Controller<I2C>;

    fn open(&mut self, address: u8) -> Result<Option<Pca9685Controller<I2C>>, Error<E>> {
        let Some(i2c) = self.i2c.take() else {
            return Ok(None);
        };

        Pca9685Controller::new(i2c, address).map(Some)
    }
}
