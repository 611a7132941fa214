//! Driver for the Raspberry Pi DC & stepper motor HAT.
//!
//! The board carries a PCA9685 16-channel PWM controller on I2C. Twelve of its
//! outputs feed four H-bridges (motors M1 to M4), the other four are spare and
//! can drive servos or anything else that takes a PWM signal.
//!
//! ```no_run
//! # #[cfg(feature = "rpi")]
//! # fn main() {
//! use linux_embedded_hal::I2cdev;
//! use motor_hat::{MotorHat, Pca9685Provider};
//!
//! let i2c = I2cdev::new("/dev/i2c-1").unwrap();
//! let mut hat = MotorHat::new(Pca9685Provider::new(i2c));
//!
//! hat.create_dc_motor(1).unwrap().set_speed(0.5).unwrap();
//! hat.dispose();
//! # }
//! # #[cfg(not(feature = "rpi"))]
//! # fn main() {}
//! ```

#![deny(unsafe_code)]

mod channel;
mod direction;
mod error;
mod gpio;
mod hat;
mod motor;
pub mod pca9685;
mod pwm;

#[cfg(test)]
mod mock;

pub use crate::channel::{Channel, MotorPins, NUM_CHANNELS};
pub use crate::direction::{Direction, GpioDirection, GpioWiring, PwmDirection, PwmWiring, Wiring};
pub use crate::error::Error;
pub use crate::gpio::GpioController;
#[cfg(feature = "rpi")]
pub use crate::gpio::{RppalGpio, RppalPin};
pub use crate::hat::{
    ControllerOf, HatError, HatMotor, MotorHat, MotorHatConfig, PinError, DEFAULT_ADDRESS,
    DEFAULT_FREQUENCY,
};
pub use crate::motor::Motor;
pub use crate::pca9685::{Pca9685Controller, Pca9685Provider};
pub use crate::pwm::{PwmController, PwmPin, PwmProvider, Shared};

pub use servo::{Limits, PulseOutput, Servo, SERVO_FREQUENCY};
