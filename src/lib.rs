//! DHT22 Sensor Driver for Embedded Rust
//!
//! This crate provides a platform-agnostic driver for the DHT22 (AM2302) temperature
//! and humidity sensor, built on top of the [`embedded-hal`] traits.
//!
//! The sensor answers a wake-up handshake with 40 bits, each encoded in the
//! width of a pulse. The driver measures those widths in one of two ways and
//! decodes them the same way:
//!
//! - **Interrupt-driven**: a falling-edge interrupt timestamps every pulse
//!   with a capture timer, bounded by a timer timeout. [`Dht22::read`]
//!   returns right after the handshake and the read finishes in interrupt
//!   context. Reads sharing an [`ActiveSlot`] run one at a time.
//! - **Polling**: the pin is sampled every microsecond with a fixed iteration
//!   budget. [`Dht22::read`] returns when the read is done.
//!
//! # Features
//! - Designed for `no_std` environments
//! - Errors are stored on the driver and checked with [`Dht22::is_ok`]
//! - Optional logging support via `defmt`
//!
//! # Dependencies
//! This driver depends on the following `embedded-hal` traits:
//! - [`InputPin`] and [`OutputPin`] for GPIO access
//! - [`DelayNs`] for accurate timing
//!
//! The interrupt-driven strategy additionally needs the platform to implement
//! [`CaptureTimer`] and [`EdgeInterrupt`] and a `critical-section`
//! implementation.
//!
//! # Example
//!
//! ```ignore
//! static SLOT: ActiveSlot<Timer2, PinEdge> = ActiveSlot::new();
//!
//! #[interrupt]
//! fn TIMER2() {
//!     SLOT.on_timeout();
//! }
//!
//! #[interrupt]
//! fn GPIOTE() {
//!     SLOT.on_edge();
//! }
//!
//! let mut dht = Dht22::with_timer(pin, delay, timer2, pin_edge, &SLOT);
//! loop {
//!     dht.read_wait();
//!     match dht.reading() {
//!         Ok(reading) => defmt::info!("{}", reading),
//!         Err(err) => defmt::warn!("{}", err),
//!     }
//!     delay.delay_ms(2000);
//! }
//! ```
//!
//! # Optional Features
//! - `defmt`: Implements `defmt::Format` and logs captured pulses and failures
//!
//! [`embedded-hal`]: https://docs.rs/embedded-hal
//! [`InputPin`]: embedded_hal::digital::InputPin
//! [`OutputPin`]: embedded_hal::digital::OutputPin
//! [`DelayNs`]: embedded_hal::delay::DelayNs

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod capture;
pub mod config;
pub mod decode;
pub mod dht22;
pub mod error;
pub mod interrupt;
mod polling;
pub mod pulse;

#[cfg(test)]
mod testing;

pub use capture::{CaptureTimer, Edge, EdgeInterrupt, TimerConfig};
pub use config::Config;
pub use decode::RawFrame;
pub use dht22::{Dht22, Reading};
pub use error::DhtError;
pub use interrupt::{ActiveSlot, Phase};
