#![deny(unsafe_code)]

use crate::gpio::GpioController;
use crate::pwm::{PwmController, PwmPin, Shared};

use embedded_hal::digital::v2::OutputPin;
use log::warn;
use std::rc::Rc;

/// Selects which way current flows through a motor's H-bridge.
pub trait Direction {
    type Error;

    /// Only the sign of `value` matters.
    fn set_direction(&mut self, value: f64) -> Result<(), Self::Error>;

    /// Gives up the direction lines. Never fails; errors are logged.
    fn release(&mut self);
}

/// Direction lines driven by two PWM outputs held at 0% or 100%.
pub struct PwmDirection<C: PwmController> {
    a: PwmPin<C>,
    b: PwmPin<C>,
}

impl<C: PwmController> PwmDirection<C> {
    pub fn new(a: PwmPin<C>, b: PwmPin<C>) -> Self {
        PwmDirection { a, b }
    }

    pub fn pins(&self) -> (u8, u8) {
        (self.a.pin(), self.b.pin())
    }
}

impl<C: PwmController> Direction for PwmDirection<C> {
    type Error = C::Error;

    // Zero drives the reverse pattern rather than letting the motor coast.
    fn set_direction(&mut self, value: f64) -> Result<(), C::Error> {
        if value > 0.0 {
            self.a.write(1.0)?;
            self.b.write(0.0)?;
        } else {
            self.a.write(0.0)?;
            self.b.write(1.0)?;
        }
        Ok(())
    }

    fn release(&mut self) {
        self.a.release();
        self.b.release();
    }
}

/// Direction lines driven by two GPIO outputs. Both low means coast.
pub struct GpioDirection<P: OutputPin> {
    a: P,
    b: P,
    released: bool,
}

impl<P: OutputPin> GpioDirection<P> {
    pub fn new(a: P, b: P) -> Self {
        GpioDirection {
            a,
            b,
            released: false,
        }
    }
}

impl<P: OutputPin> Direction for GpioDirection<P> {
    type Error = P::Error;

    fn set_direction(&mut self, value: f64) -> Result<(), P::Error> {
        if value > 0.0 {
            self.a.set_high()?;
        } else {
            self.a.set_low()?;
        }

        if value < 0.0 {
            self.b.set_high()?;
        } else {
            self.b.set_low()?;
        }

        Ok(())
    }

    fn release(&mut self) {
        if self.released {
            return;
        }

        let a = self.a.set_low();
        let b = self.b.set_low();
        if a.is_err() || b.is_err() {
            warn!("failed to drive direction pins low");
        }
        self.released = true;
    }
}

/// Builds the direction mechanism for a motor from its two direction pin numbers.
pub trait Wiring<C: PwmController> {
    type Direction: Direction;

    fn attach(
        &mut self,
        controller: &Shared<C>,
        pin_a: u8,
        pin_b: u8,
    ) -> Result<Self::Direction, <Self::Direction as Direction>::Error>;
}

/// Direction pins are PCA9685 outputs, as on the stock board.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PwmWiring;

impl<C: PwmController> Wiring<C> for PwmWiring {
    type Direction = PwmDirection<C>;

    fn attach(
        &mut self,
        controller: &Shared<C>,
        pin_a: u8,
        pin_b: u8,
    ) -> Result<PwmDirection<C>, C::Error> {
        let mut a = PwmPin::open(Rc::clone(controller), pin_a);
        let mut b = PwmPin::open(Rc::clone(controller), pin_b);

        a.begin()?;
        if let Err(error) = b.begin() {
            a.release();
            return Err(error);
        }

        Ok(PwmDirection::new(a, b))
    }
}

/// Direction pins are GPIO lines with the same numbers.
pub struct GpioWiring<G: GpioController> {
    gpio: G,
}

impl<G: GpioController> GpioWiring<G> {
    pub fn new(gpio: G) -> Self {
        GpioWiring { gpio }
    }

    pub fn gpio(&self) -> &G {
        &self.gpio
    }
}

impl<C: PwmController, G: GpioController> Wiring<C> for GpioWiring<G> {
    type Direction = GpioDirection<G::Pin>;

    fn attach(
        &mut self,
        _controller: &Shared<C>,
        pin_a: u8,
        pin_b: u8,
    ) -> Result<GpioDirection<G::Pin>, G::Error> {
        let mut a = self.gpio.open_output(pin_a)?;
        let mut b = self.gpio.open_output(pin_b)?;
        a.set_low()?;
        b.set_low()?;

        Ok(GpioDirection::new(a, b))
    }
}
