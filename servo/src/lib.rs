#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

use core::fmt::Display;

use log::debug;

/// Pulse rate expected by analog hobby servos.
pub const SERVO_FREQUENCY: f64 = 50.0;

/// Largest offset from `SERVO_FREQUENCY` still accepted as servo rate. A
/// PCA9685 lands at 50.03 Hz; its neighbouring settings are 0.4 Hz away.
pub const FREQUENCY_TOLERANCE: f64 = 0.1;

/// A PWM output a servo can be driven through.
///
/// The frequency belongs to the controller behind the output, so changing it
/// affects every other channel on the same chip.
pub trait PulseOutput {
    type Error;

    fn enable(&mut self) -> Result<(), Self::Error>;
    fn disable(&mut self) -> Result<(), Self::Error>;

    /// Active duty cycle as a fraction in [0, 1].
    fn set_duty_cycle(&mut self, duty_cycle: f64) -> Result<(), Self::Error>;

    fn frequency(&self) -> f64;
    fn set_frequency(&mut self, frequency: f64) -> Result<(), Self::Error>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Error<E> {
    InvalidArgument,
    OutOfRange,
    NotReady,
    Output(E),
}

impl<E> From<E> for Error<E> {
    fn from(output_error: E) -> Self {
        Error::Output(output_error)
    }
}

impl<E: Display> Display for Error<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::InvalidArgument => f.pad("invalid servo limits"),
            Error::OutOfRange => f.pad("position out of range"),
            Error::NotReady => f.pad("servo limits not set"),
            Error::Output(error) => error.fmt(f),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Limits {
    pub min_angle: f64,
    pub max_angle: f64,
    scale: f64,
    offset: f64,
}

impl Display for Limits {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "Limits({}..{}, scale {}, offset {})",
            self.min_angle, self.max_angle, self.scale, self.offset
        )
    }
}

impl Limits {
    /// Linear map from [min_angle, max_angle] onto [min_duty_cycle, max_duty_cycle].
    pub fn new(
        min_duty_cycle: f64,
        max_duty_cycle: f64,
        min_angle: f64,
        max_angle: f64,
    ) -> Option<Self> {
        // Negated comparisons so that NaN is rejected as well.
        if !(min_duty_cycle >= 0.0 && max_duty_cycle >= 0.0) {
            return None;
        }
        if !(min_duty_cycle < max_duty_cycle) {
            return None;
        }
        if !(min_angle >= 0.0 && max_angle >= 0.0) {
            return None;
        }
        if !(min_angle < max_angle) {
            return None;
        }

        Some(Self {
            min_angle,
            max_angle,
            scale: (max_duty_cycle - min_duty_cycle) / (max_angle - min_angle),
            offset: min_duty_cycle,
        })
    }

    pub fn contains(&self, angle: f64) -> bool {
        angle >= self.min_angle && angle <= self.max_angle
    }

    /// Duty cycle for an angle, rounded to two decimal places.
    pub fn duty_cycle(&self, angle: f64) -> f64 {
        libm::round((self.scale * angle + self.offset) * 100.0) / 100.0
    }
}

pub struct Servo<PWM: PulseOutput> {
    pwm: PWM,
    limits: Option<Limits>,
    position: f64,
}

impl<PWM: PulseOutput> Servo<PWM> {
    pub fn new(pwm: PWM) -> Self {
        Servo {
            pwm,
            limits: None,
            position: 0.0,
        }
    }

    pub fn enable(&mut self) -> Result<(), Error<PWM::Error>> {
        self.pwm.enable()?;
        Ok(())
    }

    pub fn disable(&mut self) -> Result<(), Error<PWM::Error>> {
        self.pwm.disable()?;
        Ok(())
    }

    pub fn release(self) -> PWM {
        self.pwm
    }

    pub fn limits(&self) -> Option<&Limits> {
        self.limits.as_ref()
    }

    pub fn set_limits(
        &mut self,
        min_duty_cycle: f64,
        max_duty_cycle: f64,
        min_angle: f64,
        max_angle: f64,
    ) -> Result<(), Error<PWM::Error>> {
        let limits = Limits::new(min_duty_cycle, max_duty_cycle, min_angle, max_angle)
            .ok_or(Error::InvalidArgument)?;

        // Shared with every other channel on the controller.
        if !(libm::fabs(self.pwm.frequency() - SERVO_FREQUENCY) <= FREQUENCY_TOLERANCE) {
            self.pwm.set_frequency(SERVO_FREQUENCY)?;
        }

        self.limits = Some(limits);
        Ok(())
    }

    pub fn position(&self) -> Result<f64, Error<PWM::Error>> {
        self.limits.ok_or(Error::NotReady)?;
        Ok(self.position)
    }

    pub fn set_position(&mut self, angle: f64) -> Result<(), Error<PWM::Error>> {
        let limits = self.limits.ok_or(Error::NotReady)?;
        if !limits.contains(angle) {
            return Err(Error::OutOfRange);
        }

        let duty_cycle = limits.duty_cycle(angle);
        self.pwm.set_duty_cycle(duty_cycle)?;
        debug!("servo duty cycle {}", duty_cycle);

        self.position = angle;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct TestPwmPin {
        enabled: bool,
        duty_cycle: f64,
        frequency: f64,
        frequency_writes: usize,
    }

    impl TestPwmPin {
        fn new(frequency: f64) -> Self {
            TestPwmPin {
                enabled: false,
                duty_cycle: 0.0,
                frequency,
                frequency_writes: 0,
            }
        }
    }

    impl PulseOutput for TestPwmPin {
        type Error = ();

        fn enable(&mut self) -> Result<(), ()> {
            self.enabled = true;
            Ok(())
        }
        fn disable(&mut self) -> Result<(), ()> {
            self.enabled = false;
            Ok(())
        }
        fn set_duty_cycle(&mut self, duty_cycle: f64) -> Result<(), ()> {
            self.duty_cycle = duty_cycle;
            Ok(())
        }
        fn frequency(&self) -> f64 {
            self.frequency
        }
        fn set_frequency(&mut self, frequency: f64) -> Result<(), ()> {
            self.frequency = frequency;
            self.frequency_writes += 1;
            Ok(())
        }
    }

    struct FailingPin;

    impl PulseOutput for FailingPin {
        type Error = &'static str;

        fn enable(&mut self) -> Result<(), Self::Error> {
            Err("bus")
        }
        fn disable(&mut self) -> Result<(), Self::Error> {
            Err("bus")
        }
        fn set_duty_cycle(&mut self, _: f64) -> Result<(), Self::Error> {
            Err("bus")
        }
        fn frequency(&self) -> f64 {
            SERVO_FREQUENCY
        }
        fn set_frequency(&mut self, _: f64) -> Result<(), Self::Error> {
            Err("bus")
        }
    }

    fn limited_servo() -> Servo<TestPwmPin> {
        let mut servo = Servo::new(TestPwmPin::new(1600.0));
        servo.set_limits(0.05, 0.10, 0.0, 180.0).unwrap();
        servo
    }

    #[test]
    fn test_invalid_limits() {
        let mut servo = Servo::new(TestPwmPin::new(50.0));

        assert_eq!(servo.set_limits(-0.1, 0.1, 0.0, 180.0), Err(Error::InvalidArgument));
        assert_eq!(servo.set_limits(0.05, -0.1, 0.0, 180.0), Err(Error::InvalidArgument));
        assert_eq!(servo.set_limits(0.10, 0.05, 0.0, 180.0), Err(Error::InvalidArgument));
        assert_eq!(servo.set_limits(0.05, 0.05, 0.0, 180.0), Err(Error::InvalidArgument));
        assert_eq!(servo.set_limits(0.05, 0.10, -1.0, 180.0), Err(Error::InvalidArgument));
        assert_eq!(servo.set_limits(0.05, 0.10, 0.0, -180.0), Err(Error::InvalidArgument));
        assert_eq!(servo.set_limits(0.05, 0.10, 90.0, 90.0), Err(Error::InvalidArgument));
        assert_eq!(servo.set_limits(f64::NAN, 0.10, 0.0, 180.0), Err(Error::InvalidArgument));
        assert!(servo.limits().is_none());
    }

    #[test]
    fn test_not_ready() {
        let mut servo = Servo::new(TestPwmPin::new(50.0));

        assert_eq!(servo.position(), Err(Error::NotReady));
        assert_eq!(servo.set_position(10.0), Err(Error::NotReady));
        assert_eq!(servo.release().duty_cycle, 0.0);
    }

    #[test]
    fn test_limits_force_servo_frequency() {
        let servo = limited_servo();
        let pin = servo.release();

        assert_eq!(pin.frequency, SERVO_FREQUENCY);
        assert_eq!(pin.frequency_writes, 1);
    }

    #[test]
    fn test_limits_keep_servo_frequency() {
        let mut servo = Servo::new(TestPwmPin::new(SERVO_FREQUENCY));
        servo.set_limits(0.05, 0.10, 0.0, 180.0).unwrap();

        assert_eq!(servo.release().frequency_writes, 0);
    }

    #[test]
    fn test_limits_accept_nearest_hardware_rate() {
        let mut servo = Servo::new(TestPwmPin::new(50.03));
        servo.set_limits(0.05, 0.10, 0.0, 180.0).unwrap();
        assert_eq!(servo.release().frequency_writes, 0);

        let mut servo = Servo::new(TestPwmPin::new(50.44));
        servo.set_limits(0.05, 0.10, 0.0, 180.0).unwrap();
        let pin = servo.release();
        assert_eq!(pin.frequency_writes, 1);
        assert_eq!(pin.frequency, SERVO_FREQUENCY);
    }

    #[test]
    fn test_midpoint() {
        let mut servo = limited_servo();
        assert_eq!(servo.position(), Ok(0.0));

        servo.set_position(90.0).unwrap();

        let scale = (0.10 - 0.05) / (180.0 - 0.0);
        let expected = libm::round((scale * 90.0 + 0.05) * 100.0) / 100.0;
        assert_eq!(servo.position(), Ok(90.0));
        assert_eq!(servo.release().duty_cycle, expected);
    }

    #[test]
    fn test_out_of_range() {
        let mut servo = limited_servo();
        servo.set_position(45.0).unwrap();

        assert_eq!(servo.set_position(-1.0), Err(Error::OutOfRange));
        assert_eq!(servo.set_position(181.0), Err(Error::OutOfRange));
        assert_eq!(servo.set_position(f64::NAN), Err(Error::OutOfRange));
        assert_eq!(servo.position(), Ok(45.0));
    }

    #[test]
    fn test_full_range() {
        let mut servo = limited_servo();

        for angle in 0..=180 {
            servo.set_position(angle as f64).unwrap();
            let duty_cycle = servo.pwm.duty_cycle;
            assert!((0.05..=0.10).contains(&duty_cycle), "{} -> {}", angle, duty_cycle);
            assert_eq!(duty_cycle, libm::round(duty_cycle * 100.0) / 100.0);
        }

        assert_eq!(servo.pwm.duty_cycle, 0.10);
    }

    #[test]
    fn test_enable_disable() {
        let mut servo = Servo::new(TestPwmPin::new(50.0));

        servo.enable().unwrap();
        assert!(servo.pwm.enabled);
        servo.disable().unwrap();
        assert!(!servo.pwm.enabled);
    }

    #[test]
    fn test_output_error() {
        let mut servo = Servo::new(FailingPin);
        servo.set_limits(0.05, 0.10, 0.0, 180.0).unwrap();

        assert_eq!(servo.set_position(90.0), Err(Error::Output("bus")));
        assert_eq!(servo.position(), Ok(0.0));
    }
}
