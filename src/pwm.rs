#![deny(unsafe_code)]

use crate::error::Error;

use core::cell::RefCell;
use log::warn;
use std::rc::Rc;

/// Controller handle shared by the hat and every channel opened on it.
pub type Shared<C> = Rc<RefCell<C>>;

/// A multi-channel PWM chip. All channels run at one common frequency.
pub trait PwmController {
    type Error;

    fn min_frequency(&self) -> f64;
    fn max_frequency(&self) -> f64;

    /// Frequency currently programmed, in Hz.
    fn frequency(&self) -> f64;

    /// Programs the frequency closest to the request and returns it.
    fn set_frequency(&mut self, frequency: f64) -> Result<f64, Self::Error>;

    /// Sets the active duty cycle of one output, as a fraction in [0, 1].
    fn set_duty_cycle(&mut self, pin: u8, duty_cycle: f64) -> Result<(), Self::Error>;
}

/// Finds the PWM controller at an I2C address.
pub trait PwmProvider {
    type Controller: PwmController;

    /// Returns `None` when no controller is present.
    fn open(
        &mut self,
        address: u8,
    ) -> Result<Option<Self::Controller>, <Self::Controller as PwmController>::Error>;
}

/// One output of a shared PWM controller.
///
/// The duty cycle can be set while the pin is stopped; it is written to the
/// controller when the pin is started.
pub struct PwmPin<C: PwmController> {
    controller: Shared<C>,
    pin: u8,
    duty_cycle: f64,
    started: bool,
    released: bool,
}

impl<C: PwmController> PwmPin<C> {
    pub fn open(controller: Shared<C>, pin: u8) -> Self {
        PwmPin {
            controller,
            pin,
            duty_cycle: 0.0,
            started: false,
            released: false,
        }
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }

    pub fn duty_cycle(&self) -> f64 {
        self.duty_cycle
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn controller(&self) -> &Shared<C> {
        &self.controller
    }

    pub fn start(&mut self) -> Result<(), Error<C::Error>> {
        self.check_released()?;
        self.begin().map_err(Error::Pwm)
    }

    pub fn stop(&mut self) -> Result<(), Error<C::Error>> {
        self.check_released()?;
        self.halt().map_err(Error::Pwm)
    }

    pub fn set_duty_cycle(&mut self, duty_cycle: f64) -> Result<(), Error<C::Error>> {
        self.check_released()?;
        if !(0.0..=1.0).contains(&duty_cycle) {
            return Err(Error::OutOfRange);
        }

        if self.started {
            self.write(duty_cycle).map_err(Error::Pwm)?;
        } else {
            self.duty_cycle = duty_cycle;
        }

        Ok(())
    }

    /// Stops the output and gives up the pin. Calling this again does nothing.
    pub fn release(&mut self) {
        if self.released {
            return;
        }

        if self.started && self.halt().is_err() {
            warn!("failed to stop PWM pin {}", self.pin);
        }

        self.started = false;
        self.released = true;
    }

    pub(crate) fn begin(&mut self) -> Result<(), C::Error> {
        self.write(self.duty_cycle)?;
        self.started = true;
        Ok(())
    }

    fn halt(&mut self) -> Result<(), C::Error> {
        self.controller.borrow_mut().set_duty_cycle(self.pin, 0.0)?;
        self.started = false;
        Ok(())
    }

    // Unchecked write; callers validate the value.
    pub(crate) fn write(&mut self, duty_cycle: f64) -> Result<(), C::Error> {
        self.controller
            .borrow_mut()
            .set_duty_cycle(self.pin, duty_cycle)?;
        self.duty_cycle = duty_cycle;
        Ok(())
    }

    fn check_released(&self) -> Result<(), Error<C::Error>> {
        if self.released {
            Err(Error::Released)
        } else {
            Ok(())
        }
    }
}

impl<C: PwmController> servo::PulseOutput for PwmPin<C> {
    type Error = Error<C::Error>;

    fn enable(&mut self) -> Result<(), Self::Error> {
        self.start()
    }

    fn disable(&mut self) -> Result<(), Self::Error> {
        self.stop()
    }

    fn set_duty_cycle(&mut self, duty_cycle: f64) -> Result<(), Self::Error> {
        PwmPin::set_duty_cycle(self, duty_cycle)
    }

    fn frequency(&self) -> f64 {
        self.controller.borrow().frequency()
    }

    fn set_frequency(&mut self, frequency: f64) -> Result<(), Self::Error> {
        self.check_released()?;
        let mut controller = self.controller.borrow_mut();
        let frequency = frequency.clamp(controller.min_frequency(), controller.max_frequency());
        controller.set_frequency(frequency).map_err(Error::Pwm)?;
        Ok(())
    }
}
