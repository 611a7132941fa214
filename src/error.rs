#![deny(unsafe_code)]

use crate::channel::Channel;
use core::convert::Infallible;
use core::fmt::{self, Debug, Display};

/// The error type used by this library.
///
/// Wraps errors from the PWM controller and from the motor direction
/// mechanism, and adds its own usage errors on top of that.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Error<PwmError, DirectionError = Infallible> {
    /// The PWM controller failed.
    Pwm(PwmError),

    /// The direction lines of a motor could not be driven.
    Direction(DirectionError),

    /// Channel number outside 1..=4.
    InvalidChannel(u8),

    /// The motor channel was already handed out.
    ChannelAlreadyAssigned(Channel),

    /// Speed or duty cycle outside its domain.
    OutOfRange,

    /// The PWM provider did not yield a controller.
    NullDependency,

    /// The motor, pin or hat has been disposed.
    Released,
}

impl<P> Error<P, Infallible> {
    pub(crate) fn widen<D>(self) -> Error<P, D> {
        match self {
            Error::Pwm(error) => Error::Pwm(error),
            Error::Direction(never) => match never {},
            Error::InvalidChannel(channel) => Error::InvalidChannel(channel),
            Error::ChannelAlreadyAssigned(channel) => Error::ChannelAlreadyAssigned(channel),
            Error::OutOfRange => Error::OutOfRange,
            Error::NullDependency => Error::NullDependency,
            Error::Released => Error::Released,
        }
    }
}

impl<P: Debug, D: Debug> Debug for Error<P, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Pwm(pwm) => write!(f, "Error::Pwm({:?})", pwm),
            Error::Direction(direction) => write!(f, "Error::Direction({:?})", direction),
            Error::InvalidChannel(channel) => write!(f, "Error::InvalidChannel({})", channel),
            Error::ChannelAlreadyAssigned(channel) => {
                write!(f, "Error::ChannelAlreadyAssigned({})", channel)
            }
            Error::OutOfRange => f.write_str("Error::OutOfRange"),
            Error::NullDependency => f.write_str("Error::NullDependency"),
            Error::Released => f.write_str("Error::Released"),
        }
    }
}

impl<P: Display, D: Display> Display for Error<P, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Pwm(pwm) => write!(f, "PWM error: {}", pwm),
            Error::Direction(direction) => write!(f, "direction error: {}", direction),
            Error::InvalidChannel(channel) => {
                write!(f, "channel {} is not between 1 and 4", channel)
            }
            Error::ChannelAlreadyAssigned(channel) => {
                write!(f, "channel {} already assigned", channel)
            }
            Error::OutOfRange => f.write_str("value out of range"),
            Error::NullDependency => f.write_str("no PWM controller available"),
            Error::Released => f.write_str("already disposed"),
        }
    }
}

impl<P, D> std::error::Error for Error<P, D>
where
    P: Debug + Display,
    D: Debug + Display,
{
}
