use core::convert::Infallible;

/// Possible errors from the DHT22 driver.
///
/// The latest read stores at most one of these on the sensor instance.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DhtError<E> {
    /// The configuration is unusable, or the edge interrupt could not be registered.
    Config,
    /// Fewer than 40 data pulses arrived before the timeout or polling budget ran out.
    Timeout,
    /// Checksum did not match the received data.
    ChecksumMismatch,
    /// The capture timer could not be initialized.
    NoTimer,
    /// Another interrupt-driven read owns the capture slot.
    Busy,
    /// Error from the GPIO pin (input/output).
    PinError(E),
}

impl<E> From<E> for DhtError<E> {
    fn from(value: E) -> Self {
        Self::PinError(value)
    }
}

impl DhtError<Infallible> {
    /// Lifts an error raised in interrupt context, where no pin is touched,
    /// into the pin error type of the sensor instance.
    pub(crate) fn widen<E>(self) -> DhtError<E> {
        match self {
            Self::Config => DhtError::Config,
            Self::Timeout => DhtError::Timeout,
            Self::ChecksumMismatch => DhtError::ChecksumMismatch,
            Self::NoTimer => DhtError::NoTimer,
            Self::Busy => DhtError::Busy,
            Self::PinError(never) => match never {},
        }
    }
}
