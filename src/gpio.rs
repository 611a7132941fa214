#![deny(unsafe_code)]

use embedded_hal::digital::v2::OutputPin;

/// Hands out GPIO lines by number, already configured as outputs.
pub trait GpioController {
    type Error;
    type Pin: OutputPin<Error = Self::Error>;

    fn open_output(&mut self, pin: u8) -> Result<Self::Pin, Self::Error>;
}

#[cfg(feature = "rpi")]
pub use self::rpi::{RppalGpio, RppalPin};

#[cfg(feature = "rpi")]
mod rpi {
    use super::GpioController;

    use embedded_hal::digital::v2::OutputPin;
    use rppal::gpio::{Error, Gpio};

    /// Raspberry Pi GPIO through rppal. Pin numbers are BCM numbers.
    pub struct RppalGpio {
        gpio: Gpio,
    }

    impl RppalGpio {
        pub fn new() -> Result<Self, Error> {
            Ok(RppalGpio { gpio: Gpio::new()? })
        }
    }

    impl GpioController for RppalGpio {
        type Error = Error;
        type Pin = RppalPin;

        fn open_output(&mut self, pin: u8) -> Result<RppalPin, Error> {
            let mut output = self.gpio.get(pin)?.into_output();
            output.set_low();
            Ok(RppalPin(output))
        }
    }

    /// rppal resets the pin mode when this is dropped.
    pub struct RppalPin(rppal::gpio::OutputPin);

    impl OutputPin for RppalPin {
        type Error = Error;

        fn set_low(&mut self) -> Result<(), Error> {
            self.0.set_low();
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Error> {
            self.0.set_high();
            Ok(())
        }
    }
}
