#![deny(unsafe_code)]

use crate::channel::{Channel, NUM_CHANNELS};
use crate::direction::{Direction, GpioWiring, PwmWiring, Wiring};
use crate::error::Error;
use crate::gpio::GpioController;
use crate::motor::Motor;
use crate::pwm::{PwmController, PwmPin, PwmProvider, Shared};

use core::cell::RefCell;
use log::{debug, info};
use servo::Servo;
use std::rc::Rc;

/// I2C address of the PCA9685 with no address jumpers closed.
pub const DEFAULT_ADDRESS: u8 = 0x60;

/// PWM frequency requested for the motor drivers, in Hz.
pub const DEFAULT_FREQUENCY: f64 = 1600.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotorHatConfig {
    pub address: u8,
    pub frequency: f64,
}

impl Default for MotorHatConfig {
    fn default() -> Self {
        MotorHatConfig {
            address: DEFAULT_ADDRESS,
            frequency: DEFAULT_FREQUENCY,
        }
    }
}

pub type ControllerOf<P> = <P as PwmProvider>::Controller;

/// Motor type handed out by a `MotorHat<P, W>`.
pub type HatMotor<P, W> = Motor<ControllerOf<P>, <W as Wiring<ControllerOf<P>>>::Direction>;

/// Error for operations that may touch the direction lines.
pub type HatError<P, W> = Error<
    <ControllerOf<P> as PwmController>::Error,
    <<W as Wiring<ControllerOf<P>>>::Direction as Direction>::Error,
>;

/// Error for operations that only touch the PWM controller.
pub type PinError<P> = Error<<ControllerOf<P> as PwmController>::Error>;

enum State<C> {
    Uninitialized,
    Ready(Shared<C>),
}

/// The board: a PCA9685 driving four H-bridge motor slots, with the four
/// remaining outputs usable as plain PWM.
///
/// The controller is opened on first use. Everything created through the hat
/// is owned by it until `dispose`.
pub struct MotorHat<P: PwmProvider, W: Wiring<P::Controller> = PwmWiring> {
    config: MotorHatConfig,
    provider: P,
    wiring: W,
    state: State<P::Controller>,
    motors: [Option<HatMotor<P, W>>; NUM_CHANNELS],
    motor_order: Vec<Channel>,
    pins: Vec<PwmPin<P::Controller>>,
    pwm_channels_used: [bool; NUM_CHANNELS],
    disposed: bool,
}

impl<P: PwmProvider> MotorHat<P, PwmWiring> {
    pub fn new(provider: P) -> Self {
        Self::with_config(provider, MotorHatConfig::default())
    }

    pub fn with_config(provider: P, config: MotorHatConfig) -> Self {
        Self::with_wiring(provider, PwmWiring, config)
    }
}

impl<P: PwmProvider, G: GpioController> MotorHat<P, GpioWiring<G>> {
    /// Motor direction lines are driven through `gpio` instead of the PCA9685.
    pub fn with_gpio(provider: P, gpio: G) -> Self {
        Self::with_gpio_config(provider, gpio, MotorHatConfig::default())
    }

    pub fn with_gpio_config(provider: P, gpio: G, config: MotorHatConfig) -> Self {
        Self::with_wiring(provider, GpioWiring::new(gpio), config)
    }
}

impl<P: PwmProvider, W: Wiring<P::Controller>> MotorHat<P, W> {
    pub fn with_wiring(provider: P, wiring: W, config: MotorHatConfig) -> Self {
        MotorHat {
            config,
            provider,
            wiring,
            state: State::Uninitialized,
            motors: core::array::from_fn(|_| None),
            motor_order: Vec::new(),
            pins: Vec::new(),
            pwm_channels_used: [false; NUM_CHANNELS],
            disposed: false,
        }
    }

    pub fn config(&self) -> &MotorHatConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn wiring(&self) -> &W {
        &self.wiring
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, State::Ready(_))
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn create_dc_motor(&mut self, channel: u8) -> Result<&mut HatMotor<P, W>, HatError<P, W>> {
        if self.disposed {
            return Err(Error::Released);
        }
        let channel = Channel::new(channel).ok_or(Error::InvalidChannel(channel))?;
        if self.motors[channel.index()].is_some() {
            return Err(Error::ChannelAlreadyAssigned(channel));
        }

        let controller = self.ensure_ready().map_err(|error| error.widen())?;
        let pins = channel.motor_pins();

        let mut pwm = PwmPin::open(Rc::clone(&controller), pins.pwm);
        pwm.begin().map_err(Error::Pwm)?;

        let direction = match self
            .wiring
            .attach(&controller, pins.direction_a, pins.direction_b)
        {
            Ok(direction) => direction,
            Err(error) => {
                pwm.release();
                return Err(Error::Direction(error));
            }
        };

        debug!(
            "motor {} on pins {}, {}, {}",
            channel, pins.pwm, pins.direction_a, pins.direction_b
        );
        self.motor_order.push(channel);
        Ok(self.motors[channel.index()].insert(Motor::new(channel, pwm, direction)))
    }

    /// Opens one of the spare outputs. Asking for the same channel twice gives
    /// two handles on the same output.
    pub fn create_pwm(&mut self, channel: u8) -> Result<&mut PwmPin<P::Controller>, PinError<P>> {
        let (channel, pin) = self.open_aux_pin(channel)?;
        self.pwm_channels_used[channel.index()] = true;

        let index = self.pins.len();
        self.pins.push(pin);
        Ok(&mut self.pins[index])
    }

    /// Opens a spare output for a servo. The servo belongs to the caller.
    pub fn create_servo(&mut self, channel: u8) -> Result<Servo<PwmPin<P::Controller>>, PinError<P>> {
        let (_, pin) = self.open_aux_pin(channel)?;
        Ok(Servo::new(pin))
    }

    /// Motors in creation order.
    pub fn motors(&mut self) -> Result<impl Iterator<Item = &HatMotor<P, W>> + '_, HatError<P, W>> {
        self.ensure_ready().map_err(|error| error.widen())?;

        let motors = &self.motors;
        Ok(self
            .motor_order
            .iter()
            .filter_map(move |channel| motors[channel.index()].as_ref()))
    }

    pub fn motor(&self, channel: u8) -> Option<&HatMotor<P, W>> {
        let channel = Channel::new(channel)?;
        self.motors[channel.index()].as_ref()
    }

    pub fn motor_mut(&mut self, channel: u8) -> Option<&mut HatMotor<P, W>> {
        let channel = Channel::new(channel)?;
        self.motors[channel.index()].as_mut()
    }

    pub fn pwm_pins(&mut self) -> Result<&[PwmPin<P::Controller>], PinError<P>> {
        self.ensure_ready()?;
        Ok(&self.pins)
    }

    pub fn pwm_pins_mut(&mut self) -> Result<&mut [PwmPin<P::Controller>], PinError<P>> {
        self.ensure_ready()?;
        Ok(&mut self.pins)
    }

    pub fn is_motor_channel_used(&self, channel: u8) -> bool {
        self.motor(channel).is_some()
    }

    pub fn is_pwm_channel_used(&self, channel: u8) -> bool {
        Channel::new(channel).map_or(false, |channel| self.pwm_channels_used[channel.index()])
    }

    pub fn controller(&mut self) -> Result<Shared<P::Controller>, PinError<P>> {
        self.ensure_ready()
    }

    pub fn frequency(&mut self) -> Result<f64, PinError<P>> {
        let controller = self.ensure_ready()?;
        let frequency = controller.borrow().frequency();
        Ok(frequency)
    }

    /// Reprograms the frequency shared by every output. Returns what the
    /// controller actually runs at.
    pub fn set_frequency(&mut self, frequency: f64) -> Result<f64, PinError<P>> {
        if frequency.is_nan() {
            return Err(Error::OutOfRange);
        }

        let controller = self.ensure_ready()?;
        let mut controller = controller.borrow_mut();
        let requested = frequency.clamp(controller.min_frequency(), controller.max_frequency());
        let actual = controller.set_frequency(requested).map_err(Error::Pwm)?;

        info!("PWM frequency {} Hz", actual);
        Ok(actual)
    }

    /// Stops and releases every motor, then every spare output, newest first.
    /// Calling this again does nothing.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }

        for channel in self.motor_order.drain(..).rev() {
            if let Some(mut motor) = self.motors[channel.index()].take() {
                motor.dispose();
            }
        }
        for mut pin in self.pins.drain(..).rev() {
            pin.release();
        }

        self.pwm_channels_used = [false; NUM_CHANNELS];
        self.state = State::Uninitialized;
        self.disposed = true;
        info!("motor hat disposed");
    }

    fn open_aux_pin(&mut self, channel: u8) -> Result<(Channel, PwmPin<P::Controller>), PinError<P>> {
        if self.disposed {
            return Err(Error::Released);
        }
        let channel = Channel::new(channel).ok_or(Error::InvalidChannel(channel))?;

        let controller = self.ensure_ready()?;
        let mut pin = PwmPin::open(controller, channel.aux_pwm_pin());
        pin.begin().map_err(Error::Pwm)?;

        debug!("PWM {} on pin {}", channel, pin.pin());
        Ok((channel, pin))
    }

    fn ensure_ready(&mut self) -> Result<Shared<P::Controller>, PinError<P>> {
        if self.disposed {
            return Err(Error::Released);
        }
        if let State::Ready(controller) = &self.state {
            return Ok(Rc::clone(controller));
        }

        // State stays Uninitialized on any failure below.
        let controller = self
            .provider
            .open(self.config.address)
            .map_err(Error::Pwm)?
            .ok_or(Error::NullDependency)?;
        let controller = Rc::new(RefCell::new(controller));

        let requested = self
            .config
            .frequency
            .min(controller.borrow().max_frequency());
        let actual = controller
            .borrow_mut()
            .set_frequency(requested)
            .map_err(Error::Pwm)?;

        info!(
            "PWM controller at {:#04x} ready, {} Hz",
            self.config.address, actual
        );
        self.state = State::Ready(Rc::clone(&controller));
        Ok(controller)
    }
}
