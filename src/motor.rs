#![deny(unsafe_code)]

use crate::channel::Channel;
use crate::direction::Direction;
use crate::error::Error;
use crate::pwm::{PwmController, PwmPin};

use log::debug;

/// A DC motor: one PWM output for speed plus a direction mechanism.
pub struct Motor<C: PwmController, D: Direction> {
    channel: Channel,
    pwm: PwmPin<C>,
    direction: D,
    speed: f64,
    disposed: bool,
}

impl<C: PwmController, D: Direction> Motor<C, D> {
    /// `pwm` is expected to be started already.
    pub fn new(channel: Channel, pwm: PwmPin<C>, direction: D) -> Self {
        Motor {
            channel,
            pwm,
            direction,
            speed: 0.0,
            disposed: false,
        }
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn pwm_pin(&self) -> u8 {
        self.pwm.pin()
    }

    pub fn direction(&self) -> &D {
        &self.direction
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Last speed set. The sign is the direction, the magnitude the duty cycle.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f64) -> Result<(), Error<C::Error, D::Error>> {
        if self.disposed {
            return Err(Error::Released);
        }
        if !(-1.0..=1.0).contains(&speed) {
            return Err(Error::OutOfRange);
        }

        // Output off while the direction lines change.
        self.pwm.write(0.0).map_err(Error::Pwm)?;
        self.direction
            .set_direction(speed)
            .map_err(Error::Direction)?;
        self.pwm.write(speed.abs()).map_err(Error::Pwm)?;

        self.speed = speed;
        debug!("motor {} speed {}", self.channel, speed);
        Ok(())
    }

    /// Stops the motor and releases its pins. Calling this again does nothing.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }

        self.pwm.release();
        self.direction.release();
        self.disposed = true;
    }
}
