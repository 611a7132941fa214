// Recording fakes for the PWM and GPIO capabilities.

use crate::gpio::GpioController;
use crate::pwm::{PwmController, PwmProvider, Shared};

use core::cell::RefCell;
use embedded_hal::digital::v2::OutputPin;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BusError;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Write {
    Frequency(f64),
    Duty(u8, f64),
}

#[derive(Debug)]
pub struct MockController {
    pub min_frequency: f64,
    pub max_frequency: f64,
    pub frequency: f64,
    pub duty_cycles: [f64; 16],
    pub log: Vec<Write>,
    pub fail: bool,
}

impl MockController {
    pub fn new() -> Self {
        Self::with_max_frequency(1600.0)
    }

    pub fn with_max_frequency(max_frequency: f64) -> Self {
        MockController {
            min_frequency: 24.0,
            max_frequency,
            frequency: 200.0,
            duty_cycles: [0.0; 16],
            log: Vec::new(),
            fail: false,
        }
    }

    pub fn duty_writes(&self) -> Vec<(u8, f64)> {
        self.log
            .iter()
            .filter_map(|write| match *write {
                Write::Duty(pin, duty_cycle) => Some((pin, duty_cycle)),
                Write::Frequency(_) => None,
            })
            .collect()
    }
}

impl PwmController for MockController {
    type Error = BusError;

    fn min_frequency(&self) -> f64 {
        self.min_frequency
    }

    fn max_frequency(&self) -> f64 {
        self.max_frequency
    }

    fn frequency(&self) -> f64 {
        self.frequency
    }

    fn set_frequency(&mut self, frequency: f64) -> Result<f64, BusError> {
        if self.fail {
            return Err(BusError);
        }
        self.log.push(Write::Frequency(frequency));
        self.frequency = frequency;
        Ok(frequency)
    }

    fn set_duty_cycle(&mut self, pin: u8, duty_cycle: f64) -> Result<(), BusError> {
        if self.fail {
            return Err(BusError);
        }
        self.log.push(Write::Duty(pin, duty_cycle));
        self.duty_cycles[pin as usize] = duty_cycle;
        Ok(())
    }
}

pub fn shared(controller: MockController) -> Shared<MockController> {
    Rc::new(RefCell::new(controller))
}

pub struct MockProvider {
    pub controller: Option<MockController>,
    pub opened_at: Vec<u8>,
}

impl MockProvider {
    pub fn new(controller: MockController) -> Self {
        MockProvider {
            controller: Some(controller),
            opened_at: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        MockProvider {
            controller: None,
            opened_at: Vec::new(),
        }
    }
}

impl PwmProvider for MockProvider {
    type Controller = MockController;

    fn open(&mut self, address: u8) -> Result<Option<MockController>, BusError> {
        self.opened_at.push(address);
        Ok(self.controller.take())
    }
}

/// Pin levels by GPIO number; `true` is High.
pub type Levels = Rc<RefCell<HashMap<u8, bool>>>;

#[derive(Default)]
pub struct MockGpio {
    pub levels: Levels,
    /// Pins whose writes fail from now on.
    pub failing: Rc<RefCell<HashSet<u8>>>,
    pub fail: bool,
}

impl MockGpio {
    pub fn level(&self, pin: u8) -> Option<bool> {
        self.levels.borrow().get(&pin).copied()
    }
}

impl GpioController for MockGpio {
    type Error = BusError;
    type Pin = MockPin;

    fn open_output(&mut self, pin: u8) -> Result<MockPin, BusError> {
        if self.fail {
            return Err(BusError);
        }
        self.levels.borrow_mut().insert(pin, false);
        Ok(MockPin {
            pin,
            levels: self.levels.clone(),
            failing: self.failing.clone(),
        })
    }
}

pub struct MockPin {
    pin: u8,
    levels: Levels,
    failing: Rc<RefCell<HashSet<u8>>>,
}

impl MockPin {
    fn drive(&mut self, high: bool) -> Result<(), BusError> {
        if self.failing.borrow().contains(&self.pin) {
            return Err(BusError);
        }
        self.levels.borrow_mut().insert(self.pin, high);
        Ok(())
    }
}

impl OutputPin for MockPin {
    type Error = BusError;

    fn set_low(&mut self) -> Result<(), BusError> {
        self.drive(false)
    }

    fn set_high(&mut self) -> Result<(), BusError> {
        self.drive(true)
    }
}
