//! Calibration values for a DHT22 instance.
//!
//! The logic-1 threshold is shared by both strategies, so it only means
//! something while the capture timer ticks at [`TIMER_FREQUENCY_HZ`] and one
//! polling iteration costs about 1 µs. Changing either rate requires a new
//! threshold.

/// Tick rate the capture timer is configured for.
pub const TIMER_FREQUENCY_HZ: u32 = 250_000;

/// Width above which a pulse is a `1`. At 250 kHz a `0` spans about 19 ticks
/// and a `1` about 30.
pub const DEFAULT_LOGIC_ONE: u16 = 25;

/// Polling iterations before a read times out.
pub const DEFAULT_POLL_BUDGET: u32 = 10_000;

/// Timer-driven read timeout, counted from before the handshake.
pub const DEFAULT_TIMEOUT_MS: u32 = 20;

/// Sensor calibration and timeouts.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Pulses wider than this are classified as `1`.
    pub logic_one_threshold: u16,
    /// Iterations the polling strategy may spend.
    pub poll_budget: u32,
    /// Compare-match timeout of the interrupt strategy, in milliseconds.
    pub timeout_ms: u32,
}

impl Config {
    /// Values calibrated for a 250 kHz timer and a 1 µs polling iteration.
    pub const fn new() -> Self {
        Config {
            logic_one_threshold: DEFAULT_LOGIC_ONE,
            poll_budget: DEFAULT_POLL_BUDGET,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Sets the width above which a pulse reads as `1`.
    #[must_use]
    pub const fn with_logic_one_threshold(mut self, threshold: u16) -> Self {
        self.logic_one_threshold = threshold;
        self
    }

    /// Sets how many iterations a polling read may take.
    #[must_use]
    pub const fn with_poll_budget(mut self, budget: u32) -> Self {
        self.poll_budget = budget;
        self
    }

    /// Sets the timer-driven read timeout.
    #[must_use]
    pub const fn with_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// The timeout expressed in capture timer ticks.
    ///
    /// `None` when it is zero or does not fit the 16-bit counter.
    pub fn timeout_ticks(&self) -> Option<u32> {
        let ticks = self
            .timeout_ms
            .checked_mul(TIMER_FREQUENCY_HZ / 1000)?;
        (1..=u32::from(u16::MAX)).contains(&ticks).then_some(ticks)
    }

    /// Returns `true` when every value is usable by both strategies.
    ///
    /// A read only checks the values its own strategy uses.
    pub fn is_valid(&self) -> bool {
        self.poll_budget > 0 && self.timeout_ticks().is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
