//! Interrupt-driven pulse capture.
//!
//! One [`ActiveSlot`] stands for one multiplexed capture resource. It holds
//! at most one in-flight acquisition, so interrupt-driven reads sharing a
//! slot are serialised: a second read is rejected with
//! [`DhtError::Busy`](crate::DhtError::Busy) while the first one is armed or
//! sampling. The finish routine frees the slot; the result waits in a
//! separate cell until the sensor that started the read collects it.
//!
//! The acquisition moves through [`Phase::Armed`], [`Phase::Sampling`] and one
//! terminal phase. The edge and timeout interrupts both end in the same finish
//! routine, which only runs while the phase is not terminal yet. Whichever
//! interrupt gets there first tears the timer and edge registration down,
//! the other one finds a finished acquisition and returns.

use core::cell::RefCell;
use core::convert::Infallible;

use critical_section::Mutex;

use crate::capture::{CaptureTimer, Edge, EdgeInterrupt, TimerConfig};
use crate::decode::RawFrame;
use crate::error::DhtError;
use crate::pulse::PulseBuffer;

/// Progress of an interrupt-driven acquisition.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Timer running with the timeout loaded, handshake in progress.
    Armed,
    /// Edge interrupt registered, widths are being captured.
    Sampling,
    /// All 41 pulses captured and decoded.
    Complete,
    /// The timeout fired first.
    TimedOut,
    /// The edge interrupt could not be registered.
    Aborted,
}

impl Phase {
    /// True for the phases the finish routine leaves behind.
    pub fn is_finished(self) -> bool {
        matches!(self, Phase::Complete | Phase::TimedOut | Phase::Aborted)
    }
}

/// Outcome of a finished acquisition, handed back to the sensor.
pub(crate) struct Finished<T, I> {
    pub ticket: u32,
    pub timer: T,
    pub irq: I,
    /// `None` when the acquisition failed before decoding.
    pub frame: Option<RawFrame>,
    pub error: Option<DhtError<Infallible>>,
}

/// State of one interrupt-driven read.
pub(crate) struct Acquisition<T, I> {
    ticket: u32,
    timer: T,
    irq: I,
    pulses: PulseBuffer,
    reference: u32,
    phase: Phase,
    listening: bool,
    logic_one: u16,
    frame: Option<RawFrame>,
    error: Option<DhtError<Infallible>>,
}

impl<T, I> Acquisition<T, I>
where
    T: CaptureTimer,
    I: EdgeInterrupt,
{
    /// Initializes the timer and starts the timeout.
    ///
    /// Hands the resources back when the timer cannot be claimed.
    pub fn arm(mut timer: T, irq: I, timeout_ticks: u32, logic_one: u16) -> Result<Self, (T, I)> {
        if timer.init(TimerConfig::DHT22).is_err() {
            error!("DHT22 capture timer unavailable");
            return Err((timer, irq));
        }
        timer.schedule_timeout(timeout_ticks);
        timer.enable();

        Ok(Acquisition {
            ticket: 0,
            timer,
            irq,
            pulses: PulseBuffer::new(),
            reference: 0,
            phase: Phase::Armed,
            listening: false,
            logic_one,
            frame: None,
            error: None,
        })
    }

    /// Registers the falling-edge interrupt and takes the first reference.
    fn listen(&mut self) {
        if self.phase != Phase::Armed {
            return;
        }

        if self.irq.listen(Edge::Falling).is_err() {
            error!("DHT22 edge interrupt unavailable");
            self.error = Some(DhtError::Config);
            self.finish(Phase::Aborted);
            return;
        }
        self.listening = true;
        self.reference = self.timer.capture();
        self.phase = Phase::Sampling;
    }

    fn on_edge(&mut self) {
        if self.phase != Phase::Sampling {
            return;
        }

        let now = self.timer.capture();
        // The counter is 16 bits wide.
        let width = now.wrapping_sub(self.reference) as u16;
        self.reference = now;

        debug!("int {} -> {}", self.pulses.len(), width);
        self.pulses.push(width);

        if self.pulses.is_complete() {
            self.finish(Phase::Complete);
        }
    }

    fn on_timeout(&mut self) {
        if self.phase.is_finished() {
            return;
        }

        error!("DHT22 timeout after {} pulses", self.pulses.len());
        self.error = Some(DhtError::Timeout);
        self.finish(Phase::TimedOut);
    }

    fn finish(&mut self, phase: Phase) {
        if self.phase.is_finished() {
            return;
        }

        self.teardown();

        if self.error.is_none() {
            let frame = RawFrame::decode(&self.pulses, self.logic_one);
            if !frame.is_valid() {
                debug!(
                    "DHT22 checksum {} != {}",
                    frame.checksum,
                    frame.expected_checksum()
                );
                self.error = Some(DhtError::ChecksumMismatch);
            }
            self.frame = Some(frame);
        }

        self.phase = phase;
    }

    fn teardown(&mut self) {
        self.timer.disable();
        self.timer.release();

        if self.listening {
            self.irq.disable();
            self.irq.release();
            self.listening = false;
        }
    }

    /// Stops an unfinished acquisition without decoding and returns its resources.
    pub fn cancel(mut self) -> (T, I) {
        if !self.phase.is_finished() {
            self.teardown();
        }
        (self.timer, self.irq)
    }

    fn into_finished(self) -> Finished<T, I> {
        Finished {
            ticket: self.ticket,
            timer: self.timer,
            irq: self.irq,
            frame: self.frame,
            error: self.error,
        }
    }
}

/// Process-wide owner of the in-flight interrupt-driven acquisition.
///
/// Place one in a `static` per capture timer and call [`on_edge`] and
/// [`on_timeout`] from the platform's interrupt handlers.
///
/// [`on_edge`]: ActiveSlot::on_edge
/// [`on_timeout`]: ActiveSlot::on_timeout
pub struct ActiveSlot<T, I> {
    inner: Mutex<RefCell<Inner<T, I>>>,
}

struct Inner<T, I> {
    /// The acquisition the interrupts are routed to.
    active: Option<Acquisition<T, I>>,
    /// A finished acquisition waiting for its sensor.
    done: Option<Finished<T, I>>,
    next_ticket: u32,
}

impl<T, I> Inner<T, I>
where
    T: CaptureTimer,
    I: EdgeInterrupt,
{
    /// Moves a finished acquisition out of the way of new claims.
    ///
    /// While an earlier result is still uncollected the finished
    /// acquisition stays active, and the slot stays taken, until the
    /// earlier one is picked up.
    fn retire(&mut self) {
        let finished = self
            .active
            .as_ref()
            .is_some_and(|acquisition| acquisition.phase.is_finished());

        if finished && self.done.is_none() {
            self.done = self.active.take().map(Acquisition::into_finished);
        }
    }
}

impl<T, I> ActiveSlot<T, I> {
    /// Creates an empty slot.
    pub const fn new() -> Self {
        ActiveSlot {
            inner: Mutex::new(RefCell::new(Inner {
                active: None,
                done: None,
                next_ticket: 0,
            })),
        }
    }

    /// True while an acquisition is armed or sampling.
    pub fn is_occupied(&self) -> bool {
        critical_section::with(|cs| self.inner.borrow_ref(cs).active.is_some())
    }

    /// Phase of the acquisition the interrupts are routed to, if any.
    pub fn phase(&self) -> Option<Phase> {
        critical_section::with(|cs| {
            self.inner
                .borrow_ref(cs)
                .active
                .as_ref()
                .map(|acquisition| acquisition.phase)
        })
    }

    /// True while a finished read waits for its sensor to collect it.
    pub fn has_result(&self) -> bool {
        critical_section::with(|cs| self.inner.borrow_ref(cs).done.is_some())
    }
}

impl<T, I> ActiveSlot<T, I>
where
    T: CaptureTimer,
    I: EdgeInterrupt,
{
    /// Edge interrupt handler entry point.
    pub fn on_edge(&self) {
        self.with_active(Acquisition::on_edge);
    }

    /// Timer compare-match handler entry point.
    pub fn on_timeout(&self) {
        self.with_active(Acquisition::on_timeout);
    }

    /// Puts an armed acquisition in the slot and returns the ticket its
    /// result is collected with, or gives it back if the slot is taken.
    pub(crate) fn claim(
        &self,
        mut acquisition: Acquisition<T, I>,
    ) -> Result<u32, Acquisition<T, I>> {
        critical_section::with(|cs| {
            let mut inner = self.inner.borrow_ref_mut(cs);
            if inner.active.is_some() {
                return Err(acquisition);
            }
            let ticket = inner.next_ticket;
            inner.next_ticket = ticket.wrapping_add(1);
            acquisition.ticket = ticket;
            inner.active = Some(acquisition);
            Ok(ticket)
        })
    }

    /// Starts sampling once the handshake is done.
    pub(crate) fn listen(&self) {
        self.with_active(Acquisition::listen);
    }

    /// Takes the result of the read holding `ticket`, once it has finished.
    pub(crate) fn collect(&self, ticket: u32) -> Option<Finished<T, I>> {
        critical_section::with(|cs| {
            let mut guard = self.inner.borrow_ref_mut(cs);
            let inner = &mut *guard;

            let finished = if inner.done.as_ref().is_some_and(|done| done.ticket == ticket) {
                inner.done.take()
            } else if inner.active.as_ref().is_some_and(|active| {
                active.ticket == ticket && active.phase.is_finished()
            }) {
                inner.active.take().map(Acquisition::into_finished)
            } else {
                None
            };

            inner.retire();
            finished
        })
    }

    /// Removes the read holding `ticket` whatever its phase, releasing
    /// unfinished resources.
    pub(crate) fn cancel(&self, ticket: u32) -> Option<(T, I)> {
        let (active, done) = critical_section::with(|cs| {
            let mut guard = self.inner.borrow_ref_mut(cs);
            let inner = &mut *guard;

            let active = if inner.active.as_ref().is_some_and(|active| active.ticket == ticket) {
                inner.active.take()
            } else {
                None
            };
            let done = if inner.done.as_ref().is_some_and(|done| done.ticket == ticket) {
                inner.done.take()
            } else {
                None
            };

            inner.retire();
            (active, done)
        });

        active
            .map(Acquisition::cancel)
            .or_else(|| done.map(|finished| (finished.timer, finished.irq)))
    }

    fn with_active(&self, f: impl FnOnce(&mut Acquisition<T, I>)) {
        critical_section::with(|cs| {
            let mut inner = self.inner.borrow_ref_mut(cs);
            if let Some(acquisition) = inner.active.as_mut() {
                f(acquisition);
            }
            inner.retire();
        });
    }
}

impl<T, I> Default for ActiveSlot<T, I> {
    fn default() -> Self {
        Self::new()
    }
}
