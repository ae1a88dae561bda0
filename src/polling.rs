//! Busy-polling pulse capture.
//!
//! The pin is sampled every microsecond and each high phase is measured in
//! loop iterations. The sampler never yields, so no slot is needed and any
//! number of sensors can be polled one after the other.

use embedded_hal::{delay::DelayNs, digital::InputPin};

use crate::pulse::PulseBuffer;

/// Spacing between two pin samples.
const POLL_INTERVAL_US: u32 = 1;

/// Samples the released data line for at most `budget` iterations.
///
/// Every high-to-low transition stores the length of the high phase that
/// just ended. Stops early once the lead-in pulse and all 40 data bits are
/// stored; otherwise the returned buffer is short and the caller treats the
/// read as timed out.
pub(crate) fn acquire<PIN, DELAY, E>(
    pin: &mut PIN,
    delay: &mut DELAY,
    budget: u32,
) -> Result<PulseBuffer, E>
where
    PIN: InputPin<Error = E>,
    DELAY: DelayNs,
{
    let mut pulses = PulseBuffer::new();
    let mut high: u16 = 0;

    for _ in 0..budget {
        if pin.is_high()? {
            high = high.saturating_add(1);
        } else if high > 0 {
            debug!("dly {} -> {}", pulses.len(), high);
            pulses.push(high);
            high = 0;
        }

        if pulses.is_complete() {
            break;
        }

        delay.delay_us(POLL_INTERVAL_US);
    }

    debug!("{} samples", pulses.len());
    Ok(pulses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pulse::FRAME_PULSES;
    use crate::testing::{frame_widths, polled_levels};
    use embedded_hal_mock::eh1::delay::{CheckedDelay, NoopDelay, Transaction as DelayTx};
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTx,
    };

    #[test]
    fn measures_high_phases() {
        let mut pin = PinMock::new(&[
            PinTx::get(PinState::Low),
            PinTx::get(PinState::High),
            PinTx::get(PinState::High),
            PinTx::get(PinState::Low),
            PinTx::get(PinState::High),
        ]);
        let delay_expects = vec![DelayTx::delay_us(1); 5];
        let mut delay = CheckedDelay::new(&delay_expects);

        let pulses = acquire(&mut pin.clone(), &mut delay, 5).unwrap();

        assert_eq!(pulses.as_slice(), &[2]);
        assert!(!pulses.is_complete());

        pin.done();
        delay.done();
    }

    #[test]
    fn stops_after_full_frame() {
        let widths = frame_widths([0x01, 0x90, 0x00, 0xC8, 0x59]);
        let mut pin = PinMock::new(&polled_levels(&widths));

        let pulses = acquire(&mut pin.clone(), &mut NoopDelay, 10_000).unwrap();

        assert_eq!(pulses.len(), FRAME_PULSES);
        assert_eq!(pulses.as_slice(), widths.as_slice());

        pin.done();
    }

    #[test]
    fn budget_bounds_the_loop() {
        let widths = [12, 30, 19];
        let mut levels = polled_levels(&widths);
        let used = levels.len();
        levels.extend(std::iter::repeat_n(PinTx::get(PinState::Low), 200 - used));
        let mut pin = PinMock::new(&levels);

        let pulses = acquire(&mut pin.clone(), &mut NoopDelay, 200).unwrap();

        assert_eq!(pulses.as_slice(), &widths);

        pin.done();
    }
}
