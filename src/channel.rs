#![deny(unsafe_code)]

use core::fmt::{Display, Formatter};

/// Number of motor slots, and of auxiliary PWM slots, on the board.
pub const NUM_CHANNELS: usize = 4;

/// PCA9685 outputs wired to one motor driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MotorPins {
    pub pwm: u8,
    pub direction_a: u8,
    pub direction_b: u8,
}

// Board wiring, M1..M4.
const MOTOR_PINS: [MotorPins; NUM_CHANNELS] = [
    MotorPins {
        pwm: 8,
        direction_a: 10,
        direction_b: 9,
    },
    MotorPins {
        pwm: 13,
        direction_a: 11,
        direction_b: 12,
    },
    MotorPins {
        pwm: 2,
        direction_a: 4,
        direction_b: 3,
    },
    MotorPins {
        pwm: 7,
        direction_a: 5,
        direction_b: 6,
    },
];

// PCA9685 outputs not used by the motor drivers.
const AUX_PWM_PINS: [u8; NUM_CHANNELS] = [0, 1, 14, 15];

/// Logical channel 1..=4 as printed on the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Channel(u8);

impl Channel {
    pub fn new(number: u8) -> Option<Self> {
        if (1..=NUM_CHANNELS as u8).contains(&number) {
            Some(Channel(number))
        } else {
            None
        }
    }

    pub fn all() -> impl Iterator<Item = Channel> {
        (1..=NUM_CHANNELS as u8).map(Channel)
    }

    pub fn number(self) -> u8 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        usize::from(self.0 - 1)
    }

    pub fn motor_pins(self) -> MotorPins {
        MOTOR_PINS[self.index()]
    }

    pub fn aux_pwm_pin(self) -> u8 {
        AUX_PWM_PINS[self.index()]
    }
}

impl TryFrom<u8> for Channel {
    type Error = u8;

    fn try_from(number: u8) -> Result<Self, u8> {
        Channel::new(number).ok_or(number)
    }
}

impl Display for Channel {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}
