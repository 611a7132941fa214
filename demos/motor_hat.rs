#![deny(unsafe_code)]

use std::fmt::Debug;
use std::thread::sleep;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::Parser;
use linux_embedded_hal::I2cdev;
use motor_hat::{
    Direction, MotorHat, MotorHatConfig, Pca9685Controller, Pca9685Provider, RppalGpio, Wiring,
    DEFAULT_ADDRESS, DEFAULT_FREQUENCY,
};

type Provider = Pca9685Provider<I2cdev>;

/// Spin a DC motor both ways, then sweep a servo
#[derive(Parser, Debug)]
#[command(about)]
struct Args {
    /// I2C bus the hat sits on
    #[arg(short, long, default_value = "/dev/i2c-1")]
    bus: std::path::PathBuf,
    /// PCA9685 address
    #[arg(short, long, default_value_t = DEFAULT_ADDRESS)]
    address: u8,
    /// Motor PWM frequency in Hz
    #[arg(short, long, default_value_t = DEFAULT_FREQUENCY)]
    frequency: f64,
    /// Motor channel, 1 to 4
    #[arg(short, long, default_value_t = 1)]
    motor: u8,
    /// Spare PWM channel the servo is plugged into, 1 to 4
    #[arg(short, long, default_value_t = 1)]
    servo: u8,
    /// Drive the direction lines from Raspberry Pi GPIO
    #[arg(long)]
    gpio: bool,
}

// The PCA9685 driver errors carry no Display impl.
fn debug_error<E: Debug>(error: E) -> anyhow::Error {
    anyhow!("{:?}", error)
}

fn run<W>(hat: &mut MotorHat<Provider, W>, args: &Args) -> Result<()>
where
    W: Wiring<Pca9685Controller<I2cdev>>,
    <W::Direction as Direction>::Error: Debug,
{
    let motor = hat.create_dc_motor(args.motor).map_err(debug_error)?;
    println!("Motor {} on PWM pin {}", motor.channel(), motor.pwm_pin());

    let ramp = (0..=10).chain((0..10).rev()).map(|step| f64::from(step) / 10.0);
    for sign in [1.0, -1.0] {
        for speed in ramp.clone() {
            motor.set_speed(sign * speed).map_err(debug_error)?;
            sleep(Duration::from_millis(100));
        }
    }
    motor.set_speed(0.0).map_err(debug_error)?;

    // Switches the whole controller to 50 Hz.
    let mut servo = hat.create_servo(args.servo).map_err(debug_error)?;
    servo.set_limits(0.05, 0.1, 0.0, 180.0).map_err(debug_error)?;
    if let Some(limits) = servo.limits() {
        println!("Servo limits: {}", limits);
    }

    for angle in (0..=180).step_by(30).chain((0..180).step_by(30).rev()) {
        servo.set_position(f64::from(angle)).map_err(debug_error)?;
        println!("Servo at {} degrees", angle);
        sleep(Duration::from_millis(500));
    }

    let mut pin = servo.release();
    pin.release();

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = MotorHatConfig {
        address: args.address,
        frequency: args.frequency,
    };
    let provider = Pca9685Provider::new(I2cdev::new(&args.bus)?);

    println!("Opening PCA9685 at {:#04x} on {}", config.address, args.bus.display());
    if args.gpio {
        let mut hat = MotorHat::with_gpio_config(provider, RppalGpio::new()?, config);
        let result = run(&mut hat, &args);
        hat.dispose();
        result
    } else {
        let mut hat = MotorHat::with_config(provider, config);
        let result = run(&mut hat, &args);
        hat.dispose();
        result
    }
}
