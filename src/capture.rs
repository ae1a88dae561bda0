//! Timer and edge interrupt capabilities used by the interrupt-driven strategy.
//!
//! `embedded-hal` has no traits for capture timers or pin interrupts, so the
//! platform implements these two. Its interrupt handlers must forward to
//! [`ActiveSlot::on_timeout`] (timer compare match) and
//! [`ActiveSlot::on_edge`] (pin edge).
//!
//! [`ActiveSlot::on_timeout`]: crate::interrupt::ActiveSlot::on_timeout
//! [`ActiveSlot::on_edge`]: crate::interrupt::ActiveSlot::on_edge

use core::convert::Infallible;

use crate::config::TIMER_FREQUENCY_HZ;

/// Counter width of a capture timer.
///
/// The driver itself asks for [`BitWidth::Bits16`]; the other widths are
/// listed so a platform can map the whole range of its timer hardware.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BitWidth {
    /// Wraps after 256 ticks.
    Bits8,
    /// Wraps after 65 536 ticks.
    Bits16,
    /// Wraps after 2^24 ticks.
    Bits24,
    /// Wraps after 2^32 ticks.
    Bits32,
}

/// Settings a capture timer is initialized with.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerConfig {
    /// Counter tick rate.
    pub frequency_hz: u32,
    /// Counter width; captured values wrap at this width.
    pub bit_width: BitWidth,
}

impl TimerConfig {
    /// 250 kHz on a 16-bit counter, the rate the logic-1 threshold is calibrated for.
    pub const DHT22: TimerConfig = TimerConfig {
        frequency_hz: TIMER_FREQUENCY_HZ,
        bit_width: BitWidth::Bits16,
    };
}

/// Pin transition an edge interrupt fires on.
///
/// Widths are measured between falling edges, so the driver registers
/// [`Edge::Falling`]. The other polarities complete the set a platform's
/// [`EdgeInterrupt`] may be asked for.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    /// Low-to-high transitions.
    Rising,
    /// High-to-low transitions.
    Falling,
    /// Both directions.
    Any,
}

/// A hardware timer with a compare-match timeout and on-demand capture.
pub trait CaptureTimer {
    type Error;

    /// Claims and configures the timer. Its compare-match interrupt must
    /// call [`ActiveSlot::on_timeout`](crate::interrupt::ActiveSlot::on_timeout).
    fn init(&mut self, config: TimerConfig) -> Result<(), Self::Error>;

    /// Loads a compare match `ticks` after start that stops the timer and
    /// raises its interrupt.
    fn schedule_timeout(&mut self, ticks: u32);

    /// Starts the counter.
    fn enable(&mut self);

    /// Returns the current counter value.
    fn capture(&mut self) -> u32;

    /// Stops the counter and masks its compare-match interrupt.
    fn disable(&mut self);

    /// Gives the timer back to the platform. Called once after [`disable`](Self::disable).
    fn release(&mut self);
}

/// An edge-triggered interrupt registration on the sensor's data pin.
pub trait EdgeInterrupt {
    type Error;

    /// Registers and enables the interrupt. Its handler must call
    /// [`ActiveSlot::on_edge`](crate::interrupt::ActiveSlot::on_edge).
    fn listen(&mut self, edge: Edge) -> Result<(), Self::Error>;

    /// Masks the interrupt so no further edges reach the handler.
    fn disable(&mut self);

    /// Drops the registration. Called once after [`disable`](Self::disable).
    fn release(&mut self);
}

// Stand-ins for instances that only ever poll. They cannot be constructed.

impl CaptureTimer for Infallible {
    type Error = Infallible;

    fn init(&mut self, _config: TimerConfig) -> Result<(), Self::Error> {
        match *self {}
    }

    fn schedule_timeout(&mut self, _ticks: u32) {
        match *self {}
    }

    fn enable(&mut self) {
        match *self {}
    }

    fn capture(&mut self) -> u32 {
        match *self {}
    }

    fn disable(&mut self) {
        match *self {}
    }

    fn release(&mut self) {
        match *self {}
    }
}

impl EdgeInterrupt for Infallible {
    type Error = Infallible;

    fn listen(&mut self, _edge: Edge) -> Result<(), Self::Error> {
        match *self {}
    }

    fn disable(&mut self) {
        match *self {}
    }

    fn release(&mut self) {
        match *self {}
    }
}
