use core::convert::Infallible;

use embedded_hal::{
    delay::DelayNs,
    digital::{ErrorType, InputPin, OutputPin},
};

use crate::capture::{CaptureTimer, EdgeInterrupt};
use crate::config::Config;
use crate::decode::RawFrame;
use crate::error::DhtError;
use crate::interrupt::{Acquisition, ActiveSlot};
use crate::polling;

/// Idle level hold before the wake pulse.
const IDLE_HIGH_MS: u32 = 10;

/// Length of the wake pulse.
const WAKE_LOW_MS: u32 = 1;

/// Released-line window before the sensor answers.
const REQUEST_HIGH_US: u32 = 30;

/// Reading returned by the DHT22 sensor.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reading {
    /// Temperature in degrees Celsius, without sign.
    pub temperature: f32,
    /// Relative humidity in percent.
    pub relative_humidity: f32,
}

/// How pulses are captured, fixed when the driver is built.
enum Strategy<'a, T, I> {
    /// Edge interrupts timestamped by a capture timer. `resources` is `None`
    /// while they are lent to the slot under `ticket`.
    TimerDriven {
        slot: &'a ActiveSlot<T, I>,
        resources: Option<(T, I)>,
        ticket: u32,
    },
    /// Busy polling on the calling thread.
    Polling,
}

/// Driver for the DHT22 temperature and humidity sensor.
///
/// Holds the result of the latest read. A failed read leaves the driver
/// ready for the next one.
pub struct Dht22<'a, PIN, DELAY, T = Infallible, I = Infallible>
where
    PIN: ErrorType,
{
    pin: PIN,
    delay: DELAY,
    strategy: Strategy<'a, T, I>,
    config: Config,
    in_progress: bool,
    error: Option<DhtError<PIN::Error>>,
    frame: RawFrame,
}

impl<PIN, DELAY, E> Dht22<'static, PIN, DELAY>
where
    PIN: InputPin<Error = E> + OutputPin<Error = E>,
    DELAY: DelayNs,
{
    /// Creates a driver that captures pulses by busy polling.
    ///
    /// # Arguments
    ///
    /// * `pin` - The GPIO pin connected to the DHT22 data line. Must support both input and output.
    /// * `delay` - A delay provider implementing the `DelayNs` trait.
    pub fn new(pin: PIN, delay: DELAY) -> Self {
        Self::build(pin, delay, Strategy::Polling)
    }
}

impl<'a, PIN, DELAY, T, I, E> Dht22<'a, PIN, DELAY, T, I>
where
    PIN: InputPin<Error = E> + OutputPin<Error = E>,
    DELAY: DelayNs,
    T: CaptureTimer,
    I: EdgeInterrupt,
{
    /// Creates a driver that captures pulses with edge interrupts and a timer.
    ///
    /// # Arguments
    ///
    /// * `pin` - The GPIO pin connected to the DHT22 data line.
    /// * `delay` - Delay provider used for the handshake.
    /// * `timer` - Capture timer running the timeout.
    /// * `irq` - Falling-edge interrupt on `pin`.
    /// * `slot` - Slot whose `on_edge`/`on_timeout` the platform's handlers call.
    pub fn with_timer(pin: PIN, delay: DELAY, timer: T, irq: I, slot: &'a ActiveSlot<T, I>) -> Self {
        Self::build(
            pin,
            delay,
            Strategy::TimerDriven {
                slot,
                resources: Some((timer, irq)),
                ticket: 0,
            },
        )
    }

    fn build(pin: PIN, delay: DELAY, strategy: Strategy<'a, T, I>) -> Self {
        Dht22 {
            pin,
            delay,
            strategy,
            config: Config::default(),
            in_progress: false,
            error: None,
            frame: RawFrame::default(),
        }
    }

    /// Replaces the calibration values.
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// The calibration values in use.
    pub fn config(&self) -> Config {
        self.config
    }

    /// True when pulses are captured by interrupts rather than polling.
    pub fn is_timer_driven(&self) -> bool {
        matches!(self.strategy, Strategy::TimerDriven { .. })
    }

    /// Starts a measurement.
    ///
    /// Timer-driven reads return right after the handshake and finish in
    /// interrupt context; poll [`is_in_progress`](Self::is_in_progress) or
    /// use [`read_wait`](Self::read_wait). Polling reads are done when this
    /// returns. A request made while this driver's previous read is still
    /// running is ignored.
    ///
    /// Errors are not returned but stored; check [`is_ok`](Self::is_ok).
    pub fn read(&mut self) {
        if self.is_in_progress() {
            debug!("DHT22 read already running");
            return;
        }

        self.in_progress = true;
        self.error = None;

        match self.start() {
            Ok(pending) => self.in_progress = pending,
            Err(err) => {
                self.error = Some(err);
                self.in_progress = false;
            }
        }
    }

    /// Starts a measurement and spins until it has finished.
    ///
    /// Bounded by the configured timeout or polling budget.
    pub fn read_wait(&mut self) {
        self.read();
        while self.is_in_progress() {
            core::hint::spin_loop();
        }
    }

    /// Returns `true` until the latest read has finished.
    ///
    /// For timer-driven reads this also takes the finished acquisition's
    /// result and resources back from the slot.
    pub fn is_in_progress(&mut self) -> bool {
        if self.in_progress {
            self.collect();
        }
        self.in_progress
    }

    /// Returns `true` if the latest read produced a valid measurement.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Error of the latest read.
    pub fn error(&self) -> Option<&DhtError<E>> {
        self.error.as_ref()
    }

    /// Temperature in degrees Celsius from the latest decoded frame.
    ///
    /// Only meaningful when [`is_ok`](Self::is_ok) returns `true`.
    pub fn temperature(&self) -> f32 {
        self.frame.temperature()
    }

    /// Relative humidity in percent from the latest decoded frame.
    ///
    /// Only meaningful when [`is_ok`](Self::is_ok) returns `true`.
    pub fn humidity(&self) -> f32 {
        self.frame.relative_humidity()
    }

    /// The latest decoded bytes, valid or not.
    pub fn frame(&self) -> RawFrame {
        self.frame
    }

    /// The latest measurement, or the error that prevented it.
    pub fn reading(&self) -> Result<Reading, &DhtError<E>> {
        match &self.error {
            Some(err) => Err(err),
            None => Ok(Reading {
                temperature: self.temperature(),
                relative_humidity: self.humidity(),
            }),
        }
    }

    /// Gives back the pin, the delay and, for timer-driven drivers, the
    /// timer and edge interrupt. A read still in flight is stopped.
    pub fn release(self) -> (PIN, DELAY, Option<(T, I)>) {
        let resources = match self.strategy {
            Strategy::TimerDriven {
                slot,
                resources,
                ticket,
            } => resources.or_else(|| slot.cancel(ticket)),
            Strategy::Polling => None,
        };
        (self.pin, self.delay, resources)
    }

    /// Runs the handshake and the selected capture strategy.
    ///
    /// Returns `true` if the read continues in interrupt context.
    fn start(&mut self) -> Result<bool, DhtError<E>> {
        let logic_one = self.config.logic_one_threshold;

        match &mut self.strategy {
            Strategy::Polling => {
                if self.config.poll_budget == 0 {
                    return Err(DhtError::Config);
                }
                handshake(&mut self.pin, &mut self.delay)?;
                let pulses = polling::acquire(&mut self.pin, &mut self.delay, self.config.poll_budget)?;

                // Short captures are decoded as well.
                self.frame = RawFrame::decode(&pulses, logic_one);

                if !pulses.is_complete() {
                    error!("DHT22 timeout after {} pulses", pulses.len());
                    return Err(DhtError::Timeout);
                }
                if !self.frame.is_valid() {
                    debug!(
                        "DHT22 checksum {} != {}",
                        self.frame.checksum,
                        self.frame.expected_checksum()
                    );
                    return Err(DhtError::ChecksumMismatch);
                }
                Ok(false)
            }
            Strategy::TimerDriven {
                slot,
                resources,
                ticket,
            } => {
                let slot = *slot;
                let timeout_ticks = self.config.timeout_ticks().ok_or(DhtError::Config)?;
                let Some((timer, irq)) = resources.take() else {
                    return Err(DhtError::Busy);
                };

                // The timer is set up before the handshake so that its setup
                // time does not eat into the sensor's response window.
                let acquisition = match Acquisition::arm(timer, irq, timeout_ticks, logic_one) {
                    Ok(acquisition) => acquisition,
                    Err(parts) => {
                        *resources = Some(parts);
                        return Err(DhtError::NoTimer);
                    }
                };
                *ticket = match slot.claim(acquisition) {
                    Ok(ticket) => ticket,
                    Err(acquisition) => {
                        debug!("DHT22 capture slot busy");
                        *resources = Some(acquisition.cancel());
                        return Err(DhtError::Busy);
                    }
                };

                if let Err(err) = handshake(&mut self.pin, &mut self.delay) {
                    *resources = slot.cancel(*ticket);
                    return Err(err);
                }

                slot.listen();
                Ok(true)
            }
        }
    }

    /// Adopts the slot's finished acquisition, if it is ours and done.
    fn collect(&mut self) {
        let Strategy::TimerDriven {
            slot,
            resources,
            ticket,
        } = &mut self.strategy
        else {
            return;
        };
        if resources.is_some() {
            return;
        }

        if let Some(finished) = slot.collect(*ticket) {
            *resources = Some((finished.timer, finished.irq));
            if let Some(frame) = finished.frame {
                self.frame = frame;
            }
            self.error = finished.error.map(|err| err.widen());
            self.in_progress = false;
        }
    }
}

/// Sends the wake-up sequence on the data line.
///
/// Holds the line high for 10 ms, pulls it low for 1 ms, then releases it
/// high for 30 µs. The sensor's timing is fixed, so the order and holds are
/// too.
fn handshake<PIN, DELAY, E>(pin: &mut PIN, delay: &mut DELAY) -> Result<(), DhtError<E>>
where
    PIN: OutputPin<Error = E>,
    DELAY: DelayNs,
{
    pin.set_high()?;
    delay.delay_ms(IDLE_HIGH_MS);

    // MCU sends start request
    pin.set_low()?;
    delay.delay_ms(WAKE_LOW_MS);
    pin.set_high()?;
    delay.delay_us(REQUEST_HIGH_US);
    Ok(())
}
