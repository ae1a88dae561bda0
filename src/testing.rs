//! Test doubles for the capture capabilities.

use std::sync::{Arc, Mutex, MutexGuard};

use embedded_hal_mock::eh1::digital::{State as PinState, Transaction as PinTx};

use crate::capture::{CaptureTimer, Edge, EdgeInterrupt, TimerConfig};

#[derive(Debug, Default)]
pub struct TimerState {
    pub counter: u32,
    pub config: Option<TimerConfig>,
    pub timeout: Option<u32>,
    pub enabled: bool,
    pub releases: u32,
    pub fail_init: bool,
}

/// A timer whose counter the test moves forward by hand.
#[derive(Clone, Debug, Default)]
pub struct MockTimer(Arc<Mutex<TimerState>>);

impl MockTimer {
    pub fn failing() -> Self {
        let timer = MockTimer::default();
        timer.state().fail_init = true;
        timer
    }

    pub fn state(&self) -> MutexGuard<'_, TimerState> {
        self.0.lock().unwrap()
    }

    pub fn set_counter(&self, value: u32) {
        self.state().counter = value;
    }

    /// Moves the 16-bit counter forward.
    pub fn advance(&self, ticks: u32) {
        let mut state = self.state();
        state.counter = state.counter.wrapping_add(ticks) & 0xFFFF;
    }
}

impl CaptureTimer for MockTimer {
    type Error = ();

    fn init(&mut self, config: TimerConfig) -> Result<(), Self::Error> {
        let mut state = self.state();
        if state.fail_init {
            return Err(());
        }
        state.config = Some(config);
        Ok(())
    }

    fn schedule_timeout(&mut self, ticks: u32) {
        self.state().timeout = Some(ticks);
    }

    fn enable(&mut self) {
        self.state().enabled = true;
    }

    fn capture(&mut self) -> u32 {
        self.state().counter
    }

    fn disable(&mut self) {
        self.state().enabled = false;
    }

    fn release(&mut self) {
        let mut state = self.state();
        state.config = None;
        state.releases += 1;
    }
}

#[derive(Debug, Default)]
pub struct IrqState {
    pub edge: Option<Edge>,
    pub enabled: bool,
    pub releases: u32,
    pub fail_listen: bool,
}

/// An edge interrupt registration that records what the driver did with it.
#[derive(Clone, Debug, Default)]
pub struct MockIrq(Arc<Mutex<IrqState>>);

impl MockIrq {
    pub fn failing() -> Self {
        let irq = MockIrq::default();
        irq.state().fail_listen = true;
        irq
    }

    pub fn state(&self) -> MutexGuard<'_, IrqState> {
        self.0.lock().unwrap()
    }
}

impl EdgeInterrupt for MockIrq {
    type Error = ();

    fn listen(&mut self, edge: Edge) -> Result<(), Self::Error> {
        let mut state = self.state();
        if state.fail_listen {
            return Err(());
        }
        state.edge = Some(edge);
        state.enabled = true;
        Ok(())
    }

    fn disable(&mut self) {
        self.state().enabled = false;
    }

    fn release(&mut self) {
        self.state().releases += 1;
    }
}

/// Pulse widths at 250 kHz for one transmission: the lead-in pulse, then
/// 19 ticks per `0` bit and 30 ticks per `1` bit, MSB first.
pub fn frame_widths(bytes: [u8; 5]) -> Vec<u16> {
    let mut widths = Vec::with_capacity(41);
    widths.push(40);
    for byte in bytes {
        for i in 0..8 {
            let bit = (byte >> (7 - i)) & 1;
            widths.push(if bit == 1 { 30 } else { 19 });
        }
    }
    widths
}

/// Pin reads the polling sampler sees for `widths`: each pulse is that many
/// high reads followed by one low read.
pub fn polled_levels(widths: &[u16]) -> Vec<PinTx> {
    widths
        .iter()
        .flat_map(|&width| {
            core::iter::repeat_n(PinTx::get(PinState::High), usize::from(width))
                .chain(core::iter::once(PinTx::get(PinState::Low)))
        })
        .collect()
}
